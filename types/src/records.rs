use serde::{Deserialize, Serialize};

use crate::account::AccountId;
use crate::catalog::SkinKind;

/// A completed referral. One row per ordered `(referrer, referred)` pair,
/// append-only; the row's existence is the idempotency guard for reward
/// crediting.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferralRecord {
    pub referrer: AccountId,
    pub referred: AccountId,
    pub created_at: u64,
}

/// A cosmetic the owner has unlocked. One row per `(owner, kind, item)`,
/// append-only; never removed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub owner: AccountId,
    pub kind: SkinKind,
    pub item: u32,
    pub granted_at: u64,
}

/// A provider confirmation we have already applied, keyed by the provider's
/// charge identifier. Kept for reconciliation audits.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub buyer: AccountId,
    pub payload: String,
    pub amount_paid: u64,
    pub processed_at: u64,
}
