//! Wheel resolver.
//!
//! A spin draws one segment uniformly from the 25-segment wheel and prices
//! it through the payout table, the account's tier multiplier, and the
//! requested turbo multiplier. One draw stands for all `turbo` spins: the
//! single outcome is replayed N times rather than drawn N times. That is a
//! deliberate fidelity trade-off the presentation layer relies on.
//!
//! Draws come from a caller-supplied `Rng + CryptoRng` source, so a
//! non-cryptographic generator cannot be plugged in by accident: the client
//! must not be able to predict the outcome before the request completes.

use rand::{rngs::OsRng, CryptoRng, Rng};
use tracing::info;
use wheelhouse_types::api::SpinResponse;
use wheelhouse_types::{AccountId, Catalog, Delta, Tier, SEGMENT_COUNT, TURBO_VALUES};

use crate::engine::{unix_now, Engine};
use crate::store::{EngineError, Store};

/// Coerce the requested turbo multiplier to a supported value. Invalid
/// input degrades to a single spin instead of failing the request.
pub fn coerce_turbo(turbo: u32) -> u32 {
    if TURBO_VALUES.contains(&turbo) {
        turbo
    } else {
        1
    }
}

/// Final prize for a known segment: base × tier multiplier × turbo.
pub fn prize_for(catalog: &Catalog, segment: u8, tier: Tier, turbo: u32) -> u64 {
    catalog.payout(segment) * catalog.multiplier(tier) * turbo as u64
}

/// One resolved draw, before settlement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResolvedSpin {
    pub segment: u8,
    pub base_prize: u64,
    pub final_prize: u64,
}

/// Draw a segment and price it.
pub fn resolve_spin<R: Rng + CryptoRng>(
    catalog: &Catalog,
    tier: Tier,
    turbo: u32,
    rng: &mut R,
) -> ResolvedSpin {
    let segment = rng.gen_range(0..SEGMENT_COUNT) as u8;
    ResolvedSpin {
        segment,
        base_prize: catalog.payout(segment),
        final_prize: prize_for(catalog, segment, tier, turbo),
    }
}

impl<S: Store> Engine<S> {
    /// Resolve a spin against the OS entropy pool.
    pub async fn spin(
        &self,
        account: AccountId,
        turbo: u32,
    ) -> Result<SpinResponse, EngineError> {
        self.spin_with_rng(account, turbo, &mut OsRng).await
    }

    /// Resolve a spin with a caller-supplied randomness source. Tests inject
    /// a seeded ChaCha to make outcomes reproducible.
    pub async fn spin_with_rng<R: Rng + CryptoRng>(
        &self,
        account: AccountId,
        turbo: u32,
        rng: &mut R,
    ) -> Result<SpinResponse, EngineError> {
        let turbo = coerce_turbo(turbo);
        let now = unix_now();

        // The credit check and the settlement must share one serialization
        // window, or two concurrent spins could both pass the check against
        // the same credits.
        let _guard = self.ledger().guard(account).await;
        let current = self.ledger().get_or_create(account, now).await?;
        if current.spins_left < turbo {
            return Ok(SpinResponse::NoSpins {
                spins_left: current.spins_left,
            });
        }

        let resolved = resolve_spin(self.catalog(), current.tier, turbo, rng);
        // The prize exists only once the settlement persists; a failed write
        // discards the draw and the caller sees the failure, never the prize.
        let updated = self
            .ledger()
            .apply_locked(
                account,
                &Delta::spin_settlement(resolved.final_prize, turbo),
                now,
            )
            .await?;
        info!(
            account,
            segment = resolved.segment,
            turbo,
            final_prize = resolved.final_prize,
            "spin settled"
        );
        Ok(SpinResponse::Spun {
            segment: resolved.segment,
            base_prize: resolved.base_prize,
            final_prize: resolved.final_prize,
            balance: updated.balance,
            spins_left: updated.spins_left,
        })
    }
}
