//! Transport-facing action and response types.
//!
//! The transport layer (bot webhook / HTTP router, out of scope here)
//! deserializes inbound game actions into [`Action`] and renders the
//! structured responses back out as bot messages or HTTP bodies. Business
//! rejections are response variants; only persistence failures surface as
//! errors.

use serde::{Deserialize, Serialize};

use crate::account::{AccountId, Tier};
use crate::catalog::{BundleId, SkinKind};

/// One inbound game action.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    Spin {
        account: AccountId,
        turbo: u32,
    },
    ReferralClaim {
        account: AccountId,
        code: String,
    },
    PreCheckout {
        claimed_amount: u64,
        payload: String,
    },
    PaymentConfirmed {
        charge_id: String,
        payload: String,
        amount_paid: u64,
    },
    GrantBundle {
        account: AccountId,
        bundle: BundleId,
    },
    GrantReward {
        account: AccountId,
        coins: u64,
        spins: u32,
        tickets: u32,
    },
    UnlockInventory {
        account: AccountId,
        kind: SkinKind,
        item: u32,
    },
    SetTier {
        account: AccountId,
        tier: Tier,
    },
    SyncProfile {
        account: AccountId,
        username: Option<String>,
        display_name: Option<String>,
        photo_ref: Option<String>,
    },
}

/// Why a purchase step was rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    InvalidPurchasePayload,
    PriceMismatch,
    UnknownCatalogItem,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SpinResponse {
    Spun {
        segment: u8,
        base_prize: u64,
        final_prize: u64,
        balance: u64,
        spins_left: u32,
    },
    NoSpins {
        spins_left: u32,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ReferralResponse {
    /// Both sides credited and the referrer's invite count bumped.
    Credited { referrer: AccountId },
    /// Bad code, self-referral, or an already-counted pair. Deliberately
    /// indistinct: a claim failure must never break onboarding.
    Ignored,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PreCheckoutResponse {
    Approved,
    Rejected { reason: RejectReason },
}

/// What a confirmed payment actually granted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "grant", rename_all = "snake_case")]
pub enum AppliedGrant {
    Tier {
        tier: Tier,
    },
    Skin {
        kind: SkinKind,
        item: u32,
        already_owned: bool,
    },
    Bundle {
        coins: u64,
        spins: u32,
        tickets: u32,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PaymentResponse {
    Applied { grant: AppliedGrant },
    /// Charge id already processed; acknowledged without re-granting.
    Duplicate,
    Rejected { reason: RejectReason },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BundleGrantResponse {
    pub coins: u64,
    /// Spins actually credited after the capacity clamp.
    pub spins: u32,
    pub tickets: u32,
    pub balance: u64,
    pub spins_left: u32,
    pub golden_tickets: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RewardResponse {
    pub balance: u64,
    pub spins_left: u32,
    pub golden_tickets: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UnlockResponse {
    pub already_owned: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SetTierResponse {
    pub tier: Tier,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SyncProfileResponse {
    /// Whether this sync lazily created the account.
    pub created: bool,
}

/// Uniform envelope for the one-call dispatch surface.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Response {
    Spin(SpinResponse),
    Referral(ReferralResponse),
    PreCheckout(PreCheckoutResponse),
    Payment(PaymentResponse),
    Bundle(BundleGrantResponse),
    Reward(RewardResponse),
    Unlock(UnlockResponse),
    Tier(SetTierResponse),
    Profile(SyncProfileResponse),
}
