//! Payment reconciler.
//!
//! Purchases run the provider's two-phase flow: a pre-checkout query we must
//! answer exactly once, then a pushed confirmation event. Pre-checkout
//! approves only when the claimed amount matches the catalog price for a
//! decodable payload; an undecodable payload is rejected, not waved
//! through. Confirmations are idempotent on the provider's charge id: the
//! persisted processed-charge row is inserted before the grant, and removed
//! again if the grant fails to persist so the provider's retry can re-apply.

use tracing::{error, info, warn};
use wheelhouse_types::api::{AppliedGrant, PaymentResponse, PreCheckoutResponse, RejectReason};
use wheelhouse_types::{
    Delta, PaymentRecord, PayloadError, PendingPurchase, PurchasePayload, SkinKind,
};

use crate::engine::{unix_now, Engine};
use crate::store::{EngineError, Key, Store, Value};

fn reject_reason(err: &PayloadError) -> RejectReason {
    if err.is_unknown_item() {
        RejectReason::UnknownCatalogItem
    } else {
        RejectReason::InvalidPurchasePayload
    }
}

impl<S: Store> Engine<S> {
    /// Catalog price for a purchasable item. `None` when we do not sell it.
    pub fn price_of(&self, item: PurchasePayload) -> Option<u64> {
        match item {
            PurchasePayload::Tier(tier) => self.catalog().tier_price(tier),
            PurchasePayload::WheelSkin(id) => self.catalog().skin_price(SkinKind::Wheel, id),
            PurchasePayload::Background(id) => {
                self.catalog().skin_price(SkinKind::Background, id)
            }
            PurchasePayload::Bundle(id) => Some(self.catalog().bundle(id).price),
        }
    }

    /// Answer the provider's pre-checkout query. Pure validation, no state.
    pub fn pre_checkout(&self, claimed_amount: u64, payload: &str) -> PreCheckoutResponse {
        let pending = match PendingPurchase::decode(payload) {
            Ok(pending) => pending,
            Err(err) => {
                warn!(payload, %err, "pre-checkout rejected: bad payload");
                return PreCheckoutResponse::Rejected {
                    reason: reject_reason(&err),
                };
            }
        };
        let Some(expected) = self.price_of(pending.item) else {
            warn!(payload, "pre-checkout rejected: item not in catalog");
            return PreCheckoutResponse::Rejected {
                reason: RejectReason::UnknownCatalogItem,
            };
        };
        if claimed_amount != expected {
            warn!(
                payload,
                claimed_amount, expected, "pre-checkout rejected: price mismatch"
            );
            return PreCheckoutResponse::Rejected {
                reason: RejectReason::PriceMismatch,
            };
        }
        PreCheckoutResponse::Approved
    }

    /// Reconcile a provider-pushed confirmation into account state.
    ///
    /// Every confirmation gets a definite answer; a rejected or duplicate
    /// one is still acknowledged, which is not the same thing as the grant
    /// having been applied.
    pub async fn confirm_payment(
        &self,
        charge_id: &str,
        payload: &str,
        amount_paid: u64,
    ) -> Result<PaymentResponse, EngineError> {
        let now = unix_now();
        let pending = match PendingPurchase::decode(payload) {
            Ok(pending) => pending,
            Err(err) => {
                warn!(charge_id, payload, %err, "confirmed payment with bad payload");
                return Ok(PaymentResponse::Rejected {
                    reason: reject_reason(&err),
                });
            }
        };
        // Confirmations arrive on a separate path from pre-checkout, so the
        // catalog check is repeated here.
        if self.price_of(pending.item).is_none() {
            warn!(charge_id, payload, "confirmed payment for unknown item");
            return Ok(PaymentResponse::Rejected {
                reason: RejectReason::UnknownCatalogItem,
            });
        }

        let guard_key = Key::ProcessedPayment(charge_id.to_string());
        let record = PaymentRecord {
            buyer: pending.buyer,
            payload: payload.to_string(),
            amount_paid,
            processed_at: now,
        };
        let inserted = self
            .ledger()
            .store()
            .insert(guard_key.clone(), Value::ProcessedPayment(record))
            .await
            .map_err(EngineError::Persistence)?;
        if !inserted {
            info!(charge_id, "confirmation replayed; grant already applied");
            return Ok(PaymentResponse::Duplicate);
        }

        match self.apply_grant(&pending, now).await {
            Ok(grant) => {
                info!(
                    charge_id,
                    buyer = pending.buyer,
                    amount_paid,
                    "payment reconciled"
                );
                Ok(PaymentResponse::Applied { grant })
            }
            Err(err) => {
                // Unwind the guard so the provider's retry can re-apply. If
                // even that fails, the charge is marked processed without a
                // grant: reconciliation territory.
                if let Err(unwind) = self.ledger().store().delete(&guard_key).await {
                    error!(
                        charge_id,
                        buyer = pending.buyer,
                        error = %unwind,
                        "grant failed and processed-charge guard could not be unwound; manual reconciliation required"
                    );
                }
                Err(err)
            }
        }
    }

    async fn apply_grant(
        &self,
        pending: &PendingPurchase,
        now: u64,
    ) -> Result<AppliedGrant, EngineError> {
        match pending.item {
            PurchasePayload::Tier(tier) => {
                self.ledger()
                    .apply(pending.buyer, &Delta::tier(tier), now)
                    .await?;
                Ok(AppliedGrant::Tier { tier })
            }
            PurchasePayload::WheelSkin(id) => {
                let unlock = self.unlock(pending.buyer, SkinKind::Wheel, id).await?;
                Ok(AppliedGrant::Skin {
                    kind: SkinKind::Wheel,
                    item: id,
                    already_owned: unlock.already_owned,
                })
            }
            PurchasePayload::Background(id) => {
                let unlock = self.unlock(pending.buyer, SkinKind::Background, id).await?;
                Ok(AppliedGrant::Skin {
                    kind: SkinKind::Background,
                    item: id,
                    already_owned: unlock.already_owned,
                })
            }
            PurchasePayload::Bundle(id) => {
                let granted = self.grant_bundle(pending.buyer, id).await?;
                Ok(AppliedGrant::Bundle {
                    coins: granted.coins,
                    spins: granted.spins,
                    tickets: granted.tickets,
                })
            }
        }
    }
}
