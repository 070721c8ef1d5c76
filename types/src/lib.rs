//! Domain types for the wheelhouse game economy.
//!
//! Defines account/tier/catalog/payload state shared by the transaction
//! engine and its transports. This crate performs no I/O.

pub mod account;
pub mod api;
pub mod catalog;
pub mod payload;
pub mod records;

pub use account::{Account, AccountId, Delta, Profile, Tier};
pub use catalog::{
    Bundle, BundleId, Catalog, SkinKind, TierParams, PAYOUT_TABLE, REFERRAL_COIN_REWARD,
    REFERRAL_SPIN_REWARD, SEGMENT_COUNT, STARTING_SPINS, TURBO_VALUES,
};
pub use payload::{PayloadError, PendingPurchase, PurchasePayload};
pub use records::{InventoryItem, PaymentRecord, ReferralRecord};
