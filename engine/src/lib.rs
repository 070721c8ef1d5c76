//! Wheelhouse transaction engine.
//!
//! This crate contains the game-economy core behind the spin-the-wheel
//! mini-game: the wheel resolver, the account ledger, the referral engine,
//! the payment reconciler, and the inventory store. Transports (bot webhook,
//! HTTP router) and the persistence backend live elsewhere; they meet this
//! crate at [`wheelhouse_types::api::Action`] on one side and the [`Store`]
//! trait on the other.
//!
//! ## Correctness requirements
//! - Account mutations go through the [`Ledger`], which serializes
//!   read-modify-writes per account; nothing else writes account rows.
//! - Every idempotency guard (account creation, referral pairs, inventory
//!   rows, processed charges) rides on the store's uniqueness-constrained
//!   insert, not on a read-then-write.
//! - No result is reported to a caller unless the backing write persisted.
//!
//! The primary entrypoint is [`Engine`].

pub mod engine;
pub mod inventory;
pub mod ledger;
pub mod payment;
pub mod referral;
pub mod store;
pub mod wheel;

#[cfg(any(test, feature = "mocks"))]
pub mod mocks;

#[cfg(test)]
mod integration_tests;

pub use engine::Engine;
pub use ledger::Ledger;
pub use referral::{decode_referral_code, encode_referral_code};
pub use store::{EngineError, Key, Store, Value};
pub use wheel::{coerce_turbo, prize_for, resolve_spin, ResolvedSpin};

#[cfg(any(test, feature = "mocks"))]
pub use mocks::{Faulty, Memory};
