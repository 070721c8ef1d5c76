//! The engine proper: one value owning the ledger and the injected catalog,
//! with handler methods spread across the component modules and a single
//! [`Engine::handle`] dispatch for transports that prefer one call site.

use std::time::{SystemTime, UNIX_EPOCH};

use tracing::info;
use wheelhouse_types::api::{
    Action, BundleGrantResponse, Response, RewardResponse, SetTierResponse, SyncProfileResponse,
};
use wheelhouse_types::{AccountId, BundleId, Catalog, Delta, Profile, Tier};

use crate::ledger::Ledger;
use crate::store::{EngineError, Store};

pub struct Engine<S: Store> {
    ledger: Ledger<S>,
    catalog: Catalog,
}

impl<S: Store> Engine<S> {
    pub fn new(store: S, catalog: Catalog) -> Self {
        Self {
            ledger: Ledger::new(store),
            catalog,
        }
    }

    pub fn ledger(&self) -> &Ledger<S> {
        &self.ledger
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Dispatch one inbound action to its handler.
    pub async fn handle(&self, action: Action) -> Result<Response, EngineError> {
        match action {
            Action::Spin { account, turbo } => {
                self.spin(account, turbo).await.map(Response::Spin)
            }
            Action::ReferralClaim { account, code } => self
                .claim_referral(&code, account)
                .await
                .map(Response::Referral),
            Action::PreCheckout {
                claimed_amount,
                payload,
            } => Ok(Response::PreCheckout(
                self.pre_checkout(claimed_amount, &payload),
            )),
            Action::PaymentConfirmed {
                charge_id,
                payload,
                amount_paid,
            } => self
                .confirm_payment(&charge_id, &payload, amount_paid)
                .await
                .map(Response::Payment),
            Action::GrantBundle { account, bundle } => self
                .grant_bundle(account, bundle)
                .await
                .map(Response::Bundle),
            Action::GrantReward {
                account,
                coins,
                spins,
                tickets,
            } => self
                .grant_reward(account, coins, spins, tickets)
                .await
                .map(Response::Reward),
            Action::UnlockInventory {
                account,
                kind,
                item,
            } => self.unlock(account, kind, item).await.map(Response::Unlock),
            Action::SetTier { account, tier } => {
                self.set_tier(account, tier).await.map(Response::Tier)
            }
            Action::SyncProfile {
                account,
                username,
                display_name,
                photo_ref,
            } => self
                .sync_profile(
                    account,
                    Profile {
                        username,
                        display_name,
                        photo_ref,
                    },
                )
                .await
                .map(Response::Profile),
        }
    }

    /// Generic reward credit: promo drops, daily gifts, compensation.
    /// Deliberately uncapped; only bundle grants respect the tier cap.
    pub async fn grant_reward(
        &self,
        account: AccountId,
        coins: u64,
        spins: u32,
        tickets: u32,
    ) -> Result<RewardResponse, EngineError> {
        let updated = self
            .ledger
            .apply(account, &Delta::grant(coins, spins, tickets), unix_now())
            .await?;
        info!(account, coins, spins, tickets, "reward granted");
        Ok(RewardResponse {
            balance: updated.balance,
            spins_left: updated.spins_left,
            golden_tickets: updated.golden_tickets,
        })
    }

    /// Grant a bundle's contents as one delta. Shared by the payment
    /// reconciler and the operator grant path, so the capacity clamp is
    /// applied identically in both.
    pub async fn grant_bundle(
        &self,
        account: AccountId,
        bundle: BundleId,
    ) -> Result<BundleGrantResponse, EngineError> {
        let now = unix_now();
        // The clamp depends on the current row, so the read and the grant
        // must share one serialization window.
        let _guard = self.ledger.guard(account).await;
        let current = self.ledger.get_or_create(account, now).await?;
        let contents = self.catalog.bundle(bundle);
        let spins = self
            .catalog
            .clamp_spin_grant(current.tier, current.spins_left, contents.spins);
        let updated = self
            .ledger
            .apply_locked(
                account,
                &Delta::grant(contents.coins, spins, contents.tickets),
                now,
            )
            .await?;
        info!(
            account,
            bundle = bundle.as_str(),
            coins = contents.coins,
            spins,
            tickets = contents.tickets,
            "bundle granted"
        );
        Ok(BundleGrantResponse {
            coins: contents.coins,
            spins,
            tickets: contents.tickets,
            balance: updated.balance,
            spins_left: updated.spins_left,
            golden_tickets: updated.golden_tickets,
        })
    }

    /// Operator tier set. The payment path funnels through the same delta
    /// shape; neither protects against downgrades.
    pub async fn set_tier(
        &self,
        account: AccountId,
        tier: Tier,
    ) -> Result<SetTierResponse, EngineError> {
        let updated = self
            .ledger
            .apply(account, &Delta::tier(tier), unix_now())
            .await?;
        info!(account, tier = tier.as_str(), "tier set");
        Ok(SetTierResponse { tier: updated.tier })
    }

    /// Refresh the cached profile fields, lazily creating the account on
    /// first contact.
    pub async fn sync_profile(
        &self,
        account: AccountId,
        patch: Profile,
    ) -> Result<SyncProfileResponse, EngineError> {
        let now = unix_now();
        let _guard = self.ledger.guard(account).await;
        let created = self.ledger.read(account).await?.is_none();
        self.ledger
            .apply_locked(account, &Delta::profile(patch), now)
            .await?;
        Ok(SyncProfileResponse { created })
    }
}

/// Wall-clock seconds for `last_seen` stamps. A clock before the epoch
/// degrades to zero rather than failing an economy operation.
pub(crate) fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0)
}
