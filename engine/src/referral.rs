//! Referral engine.
//!
//! A referral code is the referrer's account id in base-36, issued by the
//! bot front end. Claiming one credits both sides exactly once per ordered
//! `(referrer, referred)` pair; the persisted referral record is the
//! idempotency guard. Claim failures are deliberately quiet: onboarding must
//! never break because a code was stale or mistyped.

use futures::join;
use tracing::{debug, error, info};
use wheelhouse_types::api::ReferralResponse;
use wheelhouse_types::{
    AccountId, Delta, ReferralRecord, REFERRAL_COIN_REWARD, REFERRAL_SPIN_REWARD,
};

use crate::engine::{unix_now, Engine};
use crate::store::{EngineError, Key, Store, Value};

const CODE_DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Decode a referral code into the issuing account id. `None` for anything
/// that is not a positive base-36 number.
pub fn decode_referral_code(code: &str) -> Option<AccountId> {
    AccountId::from_str_radix(code, 36).ok().filter(|id| *id > 0)
}

/// The agreed encoding, issuer side. Kept next to the decoder so the two
/// cannot drift.
pub fn encode_referral_code(id: AccountId) -> String {
    if id <= 0 {
        return String::new();
    }
    let mut value = id as u64;
    let mut code = String::new();
    while value > 0 {
        code.insert(0, CODE_DIGITS[(value % 36) as usize] as char);
        value /= 36;
    }
    code
}

impl<S: Store> Engine<S> {
    pub async fn claim_referral(
        &self,
        code: &str,
        referred: AccountId,
    ) -> Result<ReferralResponse, EngineError> {
        let now = unix_now();
        let Some(referrer) = decode_referral_code(code) else {
            debug!(code, referred, "referral code did not decode; ignoring");
            return Ok(ReferralResponse::Ignored);
        };
        if referrer == referred {
            debug!(referrer, "self-referral ignored");
            return Ok(ReferralResponse::Ignored);
        }

        // The unique insert either brings the pair's record into existence
        // or tells us the claim was already counted.
        let record = ReferralRecord {
            referrer,
            referred,
            created_at: now,
        };
        let inserted = self
            .ledger()
            .store()
            .insert(Key::Referral { referrer, referred }, Value::Referral(record))
            .await
            .map_err(EngineError::Persistence)?;
        if !inserted {
            debug!(referrer, referred, "referral already counted; ignoring");
            return Ok(ReferralResponse::Ignored);
        }

        let referrer_delta = Delta {
            invites: 1,
            ..Delta::grant(REFERRAL_COIN_REWARD, REFERRAL_SPIN_REWARD, 0)
        };
        let referred_delta = Delta::grant(REFERRAL_COIN_REWARD, REFERRAL_SPIN_REWARD, 0);
        let (referrer_credit, referred_credit) = join!(
            self.credit_with_retry(referrer, &referrer_delta, now),
            self.credit_with_retry(referred, &referred_delta, now),
        );

        // The record now exists, so a side left uncredited cannot be healed
        // by replaying the claim. Roll-forward already retried; what is left
        // is an audit signal for reconciliation.
        match (referrer_credit, referred_credit) {
            (Ok(()), Ok(())) => {
                info!(referrer, referred, "referral credited");
                Ok(ReferralResponse::Credited { referrer })
            }
            (Err(err), Ok(())) => {
                error!(
                    referrer,
                    referred,
                    uncredited = "referrer",
                    "referral reward partially applied; manual reconciliation required"
                );
                Err(err)
            }
            (Ok(()), Err(err)) => {
                error!(
                    referrer,
                    referred,
                    uncredited = "referred",
                    "referral reward partially applied; manual reconciliation required"
                );
                Err(err)
            }
            (Err(err), Err(_)) => {
                error!(
                    referrer,
                    referred,
                    uncredited = "both",
                    "referral reward not applied after record insert; manual reconciliation required"
                );
                Err(err)
            }
        }
    }

    async fn credit_with_retry(
        &self,
        account: AccountId,
        delta: &Delta,
        now: u64,
    ) -> Result<(), EngineError> {
        if self.ledger().apply(account, delta, now).await.is_ok() {
            return Ok(());
        }
        self.ledger().apply(account, delta, now).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::{Faulty, Memory};
    use wheelhouse_types::{Catalog, STARTING_SPINS};

    fn engine() -> Engine<Memory> {
        Engine::new(Memory::default(), Catalog::default())
    }

    #[test]
    fn code_round_trip() {
        for id in [1, 35, 36, 42, 1_000_000, 7_451_930_242] {
            assert_eq!(decode_referral_code(&encode_referral_code(id)), Some(id));
        }
        assert_eq!(encode_referral_code(42), "16");
        assert_eq!(decode_referral_code("zz"), Some(35 * 36 + 35));
    }

    #[test]
    fn code_rejects_garbage() {
        for code in ["", "hello world", "-16", "0", "!!!"] {
            assert_eq!(decode_referral_code(code), None, "code {code:?}");
        }
    }

    #[tokio::test]
    async fn claim_credits_both_sides_once() {
        let engine = engine();
        let code = encode_referral_code(100);
        let response = engine.claim_referral(&code, 200).await.unwrap();
        assert_eq!(response, ReferralResponse::Credited { referrer: 100 });

        let referrer = engine.ledger().read(100).await.unwrap().unwrap();
        assert_eq!(referrer.balance, REFERRAL_COIN_REWARD);
        assert_eq!(referrer.spins_left, STARTING_SPINS + REFERRAL_SPIN_REWARD);
        assert_eq!(referrer.invites, 1);

        let referred = engine.ledger().read(200).await.unwrap().unwrap();
        assert_eq!(referred.balance, REFERRAL_COIN_REWARD);
        assert_eq!(referred.spins_left, STARTING_SPINS + REFERRAL_SPIN_REWARD);
        assert_eq!(referred.invites, 0);
    }

    #[tokio::test]
    async fn replayed_claim_is_ignored() {
        let engine = engine();
        let code = encode_referral_code(100);
        engine.claim_referral(&code, 200).await.unwrap();
        let response = engine.claim_referral(&code, 200).await.unwrap();
        assert_eq!(response, ReferralResponse::Ignored);

        let referrer = engine.ledger().read(100).await.unwrap().unwrap();
        assert_eq!(referrer.balance, REFERRAL_COIN_REWARD);
        assert_eq!(referrer.invites, 1);
    }

    #[tokio::test]
    async fn self_referral_is_rejected_with_no_side_effects() {
        let engine = engine();
        let code = encode_referral_code(100);
        let response = engine.claim_referral(&code, 100).await.unwrap();
        assert_eq!(response, ReferralResponse::Ignored);
        // No record, no accounts.
        assert_eq!(engine.ledger().store().row_count(), 0);
    }

    #[tokio::test]
    async fn bad_code_aborts_silently() {
        let engine = engine();
        let response = engine.claim_referral("???", 200).await.unwrap();
        assert_eq!(response, ReferralResponse::Ignored);
        assert_eq!(engine.ledger().store().row_count(), 0);
    }

    #[tokio::test]
    async fn transient_credit_failure_rolls_forward() {
        let engine = Engine::new(Faulty::new(Memory::default()), Catalog::default());
        // Pre-create both rows so the credits go through `put`.
        engine.ledger().get_or_create(100, 0).await.unwrap();
        engine.ledger().get_or_create(200, 0).await.unwrap();
        engine.ledger().store().fail_next_puts(1);

        let code = encode_referral_code(100);
        let response = engine.claim_referral(&code, 200).await.unwrap();
        assert_eq!(response, ReferralResponse::Credited { referrer: 100 });
        let referrer = engine.ledger().read(100).await.unwrap().unwrap();
        let referred = engine.ledger().read(200).await.unwrap().unwrap();
        assert_eq!(referrer.balance, REFERRAL_COIN_REWARD);
        assert_eq!(referred.balance, REFERRAL_COIN_REWARD);
    }

    #[tokio::test]
    async fn persistent_credit_failure_surfaces_after_record_insert() {
        let engine = Engine::new(Faulty::new(Memory::default()), Catalog::default());
        engine.ledger().get_or_create(100, 0).await.unwrap();
        engine.ledger().get_or_create(200, 0).await.unwrap();
        engine.ledger().store().fail_puts(true);

        let code = encode_referral_code(100);
        let result = engine.claim_referral(&code, 200).await;
        assert!(matches!(result, Err(EngineError::Persistence(_))));

        // The record exists (the guard fired) but neither side was credited:
        // exactly the state the audit signal reports.
        engine.ledger().store().fail_puts(false);
        let record = engine
            .ledger()
            .store()
            .inner()
            .row(&Key::Referral {
                referrer: 100,
                referred: 200,
            });
        assert!(record.is_some());
        let referrer = engine.ledger().read(100).await.unwrap().unwrap();
        assert_eq!(referrer.balance, 0);
    }
}
