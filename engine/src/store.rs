//! The seam between the engine and whatever account store backs it.
//!
//! The store is treated as a generic external collaborator offering
//! single-row point reads, single-row writes, and uniqueness-constrained
//! inserts. No multi-statement transactions are assumed; everything that
//! needs cross-call consistency is serialized above this trait by the
//! ledger.

use std::future::Future;

use anyhow::Result;
use thiserror::Error as ThisError;
use wheelhouse_types::{
    Account, AccountId, InventoryItem, PaymentRecord, ReferralRecord, SkinKind,
};

/// Row address in the account store.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    Account(AccountId),
    Referral {
        referrer: AccountId,
        referred: AccountId,
    },
    Inventory {
        owner: AccountId,
        kind: SkinKind,
        item: u32,
    },
    ProcessedPayment(String),
}

/// Row contents. Each key variant maps to the matching value variant; the
/// store itself is shape-agnostic.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Account(Account),
    Referral(ReferralRecord),
    Inventory(InventoryItem),
    ProcessedPayment(PaymentRecord),
}

/// Errors the engine reports to its callers.
///
/// Business rejections (no spins, duplicate referral, price mismatch, ...)
/// are response variants, never errors; this is only for failures of the
/// store underneath, the one class that warrants a "please retry" signal.
#[derive(Debug, ThisError)]
pub enum EngineError {
    #[error("store operation failed")]
    Persistence(#[source] anyhow::Error),
}

pub trait Store: Send + Sync + 'static {
    /// Point read.
    fn get(&self, key: &Key) -> impl Future<Output = Result<Option<Value>>> + Send;

    /// Write a row, creating or replacing it. Account rows are only written
    /// under the ledger's per-account serialization.
    fn put(&self, key: Key, value: Value) -> impl Future<Output = Result<()>> + Send;

    /// Uniqueness-constrained insert: returns `false` and writes nothing if
    /// the key already exists. This is the idempotency primitive backing
    /// account creation, referral records, inventory rows, and the
    /// processed-payment set.
    fn insert(&self, key: Key, value: Value) -> impl Future<Output = Result<bool>> + Send;

    /// Remove a row. Used only to compensate a guard row whose follow-up
    /// grant failed to persist.
    fn delete(&self, key: &Key) -> impl Future<Output = Result<()>> + Send;
}
