// ─────────────────────────────────────────────────────────────────────────────
// In-memory entity store with all-or-nothing units of work
// ─────────────────────────────────────────────────────────────────────────────

use crate::error::{MappingResult, StoreError};
use crate::ports::{Entity, EntityStore};
use prost::Message;
use std::collections::BTreeMap;

/// Entity name used to record dynamic vault source registrations
const VAULT_SOURCE: &str = "VaultSource";

type Key = (&'static str, String);

/// Prost-encoded entities keyed by (entity name, id).
///
/// Writes land in a staging area first. [`MemoryStore::atomically`] commits
/// them when the unit of work succeeds and drops them when it fails.
#[derive(Debug, Default)]
pub struct MemoryStore {
    committed: BTreeMap<Key, Vec<u8>>,
    staged: BTreeMap<Key, Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run one unit of work (one event or one block).
    pub fn atomically<T, F>(&mut self, work: F) -> MappingResult<T>
    where
        F: FnOnce(&mut Self) -> MappingResult<T>,
    {
        match work(self) {
            Ok(value) => {
                self.commit();
                Ok(value)
            }
            Err(err) => {
                self.discard();
                Err(err)
            }
        }
    }

    pub fn commit(&mut self) {
        let staged = std::mem::take(&mut self.staged);
        self.committed.extend(staged);
    }

    pub fn discard(&mut self) {
        self.staged.clear();
    }

    /// Number of committed entities of kind `E`
    pub fn count<E: Entity>(&self) -> usize {
        self.committed.keys().filter(|(name, _)| *name == E::NAME).count()
    }

    /// Committed entities of kind `E`, ordered by id
    pub fn all<E: Entity>(&self) -> Result<Vec<E>, StoreError> {
        self.committed
            .iter()
            .filter(|((name, _), _)| *name == E::NAME)
            .map(|((_, id), bytes)| decode::<E>(id, bytes))
            .collect()
    }

    /// Committed vault source registrations, ordered by address
    pub fn vault_sources(&self) -> Vec<String> {
        self.committed
            .keys()
            .filter(|(name, _)| *name == VAULT_SOURCE)
            .map(|(_, id)| id.clone())
            .collect()
    }

    fn get(&self, key: &Key) -> Option<&Vec<u8>> {
        self.staged.get(key).or_else(|| self.committed.get(key))
    }
}

pub(crate) fn decode<E: Entity>(id: &str, bytes: &[u8]) -> Result<E, StoreError> {
    E::decode(bytes).map_err(|source| StoreError::Decode {
        entity: E::NAME,
        id: id.to_string(),
        source,
    })
}

impl EntityStore for MemoryStore {
    fn load<E: Entity>(&self, id: &str) -> Result<Option<E>, StoreError> {
        self.get(&(E::NAME, id.to_string()))
            .map(|bytes| decode::<E>(id, bytes))
            .transpose()
    }

    fn save<E: Entity>(&mut self, entity: &E) -> Result<(), StoreError> {
        self.staged
            .insert((E::NAME, entity.id().to_string()), entity.encode_to_vec());
        Ok(())
    }

    fn create<E: Entity>(&mut self, entity: &E) -> Result<(), StoreError> {
        let key = (E::NAME, entity.id().to_string());
        if self.get(&key).is_some() {
            return Err(StoreError::DuplicateKey {
                entity: E::NAME,
                id: key.1,
            });
        }
        self.staged.insert(key, entity.encode_to_vec());
        Ok(())
    }

    fn register_vault_source(&mut self, address: &str) -> Result<(), StoreError> {
        self.staged.insert((VAULT_SOURCE, address.to_string()), Vec::new());
        Ok(())
    }
}
