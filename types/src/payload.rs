//! Purchase payloads round-tripped through the payment provider.
//!
//! The provider treats the payload as opaque text; we encode it as
//! `buyer:kind:item` (for example `42:tier:plus`, `42:skin_wheel:3`,
//! `42:bundle:maxi`) and decode it back into a closed tagged variant.
//! Unrecognized tags are rejected, never defaulted.

use thiserror::Error as ThisError;

use crate::account::{AccountId, Tier};
use crate::catalog::BundleId;

#[derive(Debug, ThisError, PartialEq, Eq)]
pub enum PayloadError {
    #[error("malformed purchase payload: {payload:?}")]
    Malformed { payload: String },
    #[error("unknown purchase kind: {kind:?}")]
    UnknownKind { kind: String },
    #[error("unknown tier: {tier:?}")]
    UnknownTier { tier: String },
    #[error("unknown bundle: {bundle:?}")]
    UnknownBundle { bundle: String },
    #[error("bad item id: {item:?}")]
    BadItemId { item: String },
    #[error("bad buyer id: {buyer:?}")]
    BadBuyer { buyer: String },
}

impl PayloadError {
    /// Whether the payload named a shape we understand but an item we do not
    /// sell (as opposed to being undecodable).
    pub fn is_unknown_item(&self) -> bool {
        matches!(
            self,
            PayloadError::UnknownTier { .. } | PayloadError::UnknownBundle { .. }
        )
    }
}

/// What a pending purchase is for. One variant per sellable thing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PurchasePayload {
    Tier(Tier),
    WheelSkin(u32),
    Background(u32),
    Bundle(BundleId),
}

impl PurchasePayload {
    pub fn encode(&self) -> String {
        match self {
            PurchasePayload::Tier(tier) => format!("tier:{}", tier.as_str()),
            PurchasePayload::WheelSkin(id) => format!("skin_wheel:{id}"),
            PurchasePayload::Background(id) => format!("skin_bg:{id}"),
            PurchasePayload::Bundle(id) => format!("bundle:{}", id.as_str()),
        }
    }

    pub fn decode(payload: &str) -> Result<Self, PayloadError> {
        let (kind, item) = payload.split_once(':').ok_or_else(|| PayloadError::Malformed {
            payload: payload.to_string(),
        })?;
        match kind {
            "tier" => Tier::parse(item)
                .map(PurchasePayload::Tier)
                .ok_or_else(|| PayloadError::UnknownTier {
                    tier: item.to_string(),
                }),
            "skin_wheel" => parse_item_id(item).map(PurchasePayload::WheelSkin),
            "skin_bg" => parse_item_id(item).map(PurchasePayload::Background),
            "bundle" => BundleId::parse(item)
                .map(PurchasePayload::Bundle)
                .ok_or_else(|| PayloadError::UnknownBundle {
                    bundle: item.to_string(),
                }),
            _ => Err(PayloadError::UnknownKind {
                kind: kind.to_string(),
            }),
        }
    }
}

fn parse_item_id(item: &str) -> Result<u32, PayloadError> {
    item.parse::<u32>().map_err(|_| PayloadError::BadItemId {
        item: item.to_string(),
    })
}

/// A pending purchase as reconstructed from the provider round-trip: who is
/// buying, and what.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingPurchase {
    pub buyer: AccountId,
    pub item: PurchasePayload,
}

impl PendingPurchase {
    pub fn encode(&self) -> String {
        format!("{}:{}", self.buyer, self.item.encode())
    }

    pub fn decode(payload: &str) -> Result<Self, PayloadError> {
        let (buyer, rest) = payload.split_once(':').ok_or_else(|| PayloadError::Malformed {
            payload: payload.to_string(),
        })?;
        let buyer: AccountId = buyer
            .parse()
            .ok()
            .filter(|id| *id > 0)
            .ok_or_else(|| PayloadError::BadBuyer {
                buyer: buyer.to_string(),
            })?;
        Ok(Self {
            buyer,
            item: PurchasePayload::decode(rest)?,
        })
    }
}
