//! Inventory store: which cosmetics an account owns.
//!
//! Rows are append-only and unique per `(owner, kind, item)`. The unlock
//! path checks first for the common re-grant case, but the store's
//! uniqueness constraint is the guard that actually holds under races.

use tracing::info;
use wheelhouse_types::api::UnlockResponse;
use wheelhouse_types::{AccountId, InventoryItem, SkinKind};

use crate::engine::{unix_now, Engine};
use crate::store::{EngineError, Key, Store, Value};

impl<S: Store> Engine<S> {
    pub async fn unlock(
        &self,
        account: AccountId,
        kind: SkinKind,
        item: u32,
    ) -> Result<UnlockResponse, EngineError> {
        let key = Key::Inventory {
            owner: account,
            kind,
            item,
        };
        let store = self.ledger().store();
        if store
            .get(&key)
            .await
            .map_err(EngineError::Persistence)?
            .is_some()
        {
            return Ok(UnlockResponse {
                already_owned: true,
            });
        }

        let row = InventoryItem {
            owner: account,
            kind,
            item,
            granted_at: unix_now(),
        };
        let inserted = store
            .insert(key, Value::Inventory(row))
            .await
            .map_err(EngineError::Persistence)?;
        if !inserted {
            // Lost a race with a concurrent unlock of the same item.
            return Ok(UnlockResponse {
                already_owned: true,
            });
        }
        info!(account, kind = kind.as_str(), item, "inventory unlocked");
        Ok(UnlockResponse {
            already_owned: false,
        })
    }
}
