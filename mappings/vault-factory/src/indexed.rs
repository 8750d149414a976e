// ─────────────────────────────────────────────────────────────────────────────
// Entity store rebuilt from the substreams store modules
// ─────────────────────────────────────────────────────────────────────────────

use crate::config::MappingConfig;
use crate::constants::{zero_bi, LAST_SNAPSHOT_TIMESTAMP_ID};
use crate::error::StoreError;
use crate::handlers::BlockInfo;
use crate::pb::vaults::v1::factory_event::Type;
use crate::pb::vaults::v1::{
    Factory, FactoryEvents, LastSnapshotTimestamp, SnapshotWindow, Vault, VaultRegistration,
};
use crate::ports::{Entity, EntityStore};
use crate::store::decode;
use crate::stores::factory_fields::{
    split_tokens, ACCESS_MANAGER, FEES_MANAGER, HARVESTER, SWAP_ADAPTER, SWAP_PROXY, SWAP_ROUTER,
    TOKENS,
};
use crate::stores::{vault_key, BOOTSTRAP_KEY};
use prost::Message;
use std::collections::BTreeMap;
use vault_common::format_bigint;

/// Read access to the store modules, as of the end of the current block.
pub trait IndexedState {
    /// `store_vault_registry` value at `key`
    fn registration(&self, key: &str) -> Option<VaultRegistration>;

    /// `store_vault_count` total
    fn vault_count(&self) -> i64;

    /// `store_factory_fields` value of `field`
    fn factory_field(&self, field: &str) -> Option<String>;

    /// `store_snapshot_windows` opener of `window`
    fn snapshot_window(&self, window: u64) -> Option<SnapshotWindow>;
}

/// A write made during the block
#[derive(Debug, Clone)]
pub struct StagedEntity {
    pub entity: &'static str,
    pub id: String,
    /// The entity did not exist before this block
    pub created: bool,
    pub bytes: Vec<u8>,
}

/// [`EntityStore`] over the state of the previous block.
///
/// The store modules hold end-of-block values, so entities are rebuilt as
/// they were before the block:
/// - Factory exists once the bootstrapping vault was created in an earlier
///   block. Its vault count excludes this block's creations. The remaining
///   fields only change through handlers that save the Factory, so their
///   end-of-block values are the ones written.
/// - Vault exists once registered in an earlier block. Only its identity,
///   creator and zeroed accumulators are known; every write path re-reads
///   the chain state first.
/// - LastSnapshotTimestamp follows the window throttle: the opener of the
///   latest window with a pass, or the bootstrap block.
/// - VaultSnapshot ids carry the block number, so none predates the block.
///
/// Writes are staged and turned into entity changes by `graph_out`.
pub struct IndexedStore<'a, V> {
    state: &'a V,
    config: &'a MappingConfig,
    block: BlockInfo,
    window: u64,
    created_in_block: i64,
    staged: BTreeMap<(&'static str, String), StagedEntity>,
}

impl<'a, V: IndexedState> IndexedStore<'a, V> {
    pub fn new(state: &'a V, config: &'a MappingConfig, events: &FactoryEvents) -> Self {
        let created_in_block = events
            .events
            .iter()
            .filter(|event| matches!(event.r#type, Some(Type::VaultCreated(_))))
            .count() as i64;

        Self {
            state,
            config,
            block: BlockInfo {
                number: events.block_number,
                timestamp: events.block_timestamp,
            },
            window: events.snapshot_window,
            created_in_block,
            staged: BTreeMap::new(),
        }
    }

    /// Writes of the block, ordered by entity name and id
    pub fn staged(&self) -> impl Iterator<Item = &StagedEntity> {
        self.staged.values()
    }

    fn bootstrap(&self) -> Option<VaultRegistration> {
        self.state
            .registration(BOOTSTRAP_KEY)
            .filter(|registration| registration.block_number < self.block.number)
    }

    fn factory(&self) -> Option<Factory> {
        self.bootstrap()?;
        let field = |name: &str| self.state.factory_field(name).unwrap_or_default();
        let vault_count = self.state.vault_count() - self.created_in_block;

        Some(Factory {
            id: self.config.factory.clone(),
            vault_count: i32::try_from(vault_count).unwrap_or(i32::MAX),
            tokens: split_tokens(&field(TOKENS)),
            fees_manager: field(FEES_MANAGER),
            access_manager: field(ACCESS_MANAGER),
            harvester: field(HARVESTER),
            swap_router: field(SWAP_ROUTER),
            swap_proxy: field(SWAP_PROXY),
            swap_adapter: field(SWAP_ADAPTER),
        })
    }

    fn vault(&self, id: &str) -> Option<Vault> {
        let registration = self
            .state
            .registration(&vault_key(id))
            .filter(|registration| registration.block_number < self.block.number)?;
        let zero = format_bigint(&zero_bi());

        Some(Vault {
            id: registration.vault.clone(),
            factory: self.config.factory.clone(),
            vault: registration.vault,
            creator: registration.creator,
            acc_management_fees_to_dao: zero.clone(),
            acc_performance_fees_to_dao: zero.clone(),
            acc_management_fees_to_strategists: zero.clone(),
            acc_performance_fees_to_strategists: zero,
            ..Default::default()
        })
    }

    fn last_snapshot(&self) -> Option<LastSnapshotTimestamp> {
        let bootstrap = self.bootstrap()?;
        let opener = self
            .state
            .snapshot_window(self.window)
            .filter(|opener| opener.block_number < self.block.number);

        // A pass ran on the opener of the latest window that started after
        // the bootstrap block
        let latest = match opener {
            Some(opener) => Some(opener),
            None => self
                .window
                .checked_sub(1)
                .and_then(|previous| self.state.snapshot_window(previous)),
        };
        let timestamp = latest.map_or(bootstrap.timestamp, |opener| {
            opener.timestamp.max(bootstrap.timestamp)
        });

        Some(LastSnapshotTimestamp::singleton(timestamp))
    }

    /// Encoded entity as it was before the block
    fn indexed(&self, entity: &str, id: &str) -> Option<Vec<u8>> {
        if entity == Factory::NAME && id == self.config.factory {
            self.factory().map(|factory| factory.encode_to_vec())
        } else if entity == Vault::NAME {
            self.vault(id).map(|vault| vault.encode_to_vec())
        } else if entity == LastSnapshotTimestamp::NAME && id == LAST_SNAPSHOT_TIMESTAMP_ID {
            self.last_snapshot().map(|last| last.encode_to_vec())
        } else {
            None
        }
    }

    fn exists(&self, entity: &'static str, id: &str) -> bool {
        self.staged.contains_key(&(entity, id.to_string())) || self.indexed(entity, id).is_some()
    }

    fn stage<E: Entity>(&mut self, entity: &E, created: bool) {
        let id = entity.id().to_string();
        self.staged.insert(
            (E::NAME, id.clone()),
            StagedEntity {
                entity: E::NAME,
                id,
                created,
                bytes: entity.encode_to_vec(),
            },
        );
    }
}

impl<'a, V: IndexedState> EntityStore for IndexedStore<'a, V> {
    fn load<E: Entity>(&self, id: &str) -> Result<Option<E>, StoreError> {
        if let Some(staged) = self.staged.get(&(E::NAME, id.to_string())) {
            return decode::<E>(id, &staged.bytes).map(Some);
        }

        self.indexed(E::NAME, id)
            .map(|bytes| decode::<E>(id, &bytes))
            .transpose()
    }

    fn save<E: Entity>(&mut self, entity: &E) -> Result<(), StoreError> {
        let created = match self.staged.get(&(E::NAME, entity.id().to_string())) {
            Some(staged) => staged.created,
            None => self.indexed(E::NAME, entity.id()).is_none(),
        };
        self.stage(entity, created);
        Ok(())
    }

    fn create<E: Entity>(&mut self, entity: &E) -> Result<(), StoreError> {
        if self.exists(E::NAME, entity.id()) {
            return Err(StoreError::DuplicateKey {
                entity: E::NAME,
                id: entity.id().to_string(),
            });
        }
        self.stage(entity, true);
        Ok(())
    }

    /// `store_vault_registry` already routes new vaults
    fn register_vault_source(&mut self, _address: &str) -> Result<(), StoreError> {
        Ok(())
    }
}
