//! Boundaries between the mappings and their host.
//!
//! The host owns persistence ([`EntityStore`]) and chain access
//! ([`FactoryReader`], [`VaultReader`]). Contract reads come back as named
//! records rather than positional tuples.

use crate::constants::LAST_SNAPSHOT_TIMESTAMP_ID;
use crate::error::{CallError, StoreError};
use crate::pb::vaults::v1::{Factory, LastSnapshotTimestamp, Vault, VaultSnapshot};
use substreams::scalar::BigInt;

// =============================================================================
// Persistence
// =============================================================================

/// A persisted record, identified by its entity name and id.
pub trait Entity: prost::Message + Default {
    const NAME: &'static str;

    fn id(&self) -> &str;
}

impl Entity for Factory {
    const NAME: &'static str = "Factory";

    fn id(&self) -> &str {
        &self.id
    }
}

impl Entity for Vault {
    const NAME: &'static str = "Vault";

    fn id(&self) -> &str {
        &self.id
    }
}

impl Entity for VaultSnapshot {
    const NAME: &'static str = "VaultSnapshot";

    fn id(&self) -> &str {
        &self.id
    }
}

impl Entity for LastSnapshotTimestamp {
    const NAME: &'static str = "LastSnapshotTimestamp";

    fn id(&self) -> &str {
        &self.id
    }
}

impl LastSnapshotTimestamp {
    pub fn singleton(timestamp: u64) -> Self {
        Self {
            id: LAST_SNAPSHOT_TIMESTAMP_ID.to_string(),
            timestamp,
        }
    }
}

/// Entity persistence provided by the host.
pub trait EntityStore {
    fn load<E: Entity>(&self, id: &str) -> Result<Option<E>, StoreError>;

    /// Insert or overwrite.
    fn save<E: Entity>(&mut self, entity: &E) -> Result<(), StoreError>;

    /// Insert only; an existing id is a [`StoreError::DuplicateKey`].
    fn create<E: Entity>(&mut self, entity: &E) -> Result<(), StoreError>;

    /// Start routing events emitted by `address` to the vault handlers.
    fn register_vault_source(&mut self, address: &str) -> Result<(), StoreError>;
}

// =============================================================================
// Chain reads
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FactoryManagers {
    pub fees_manager: String,
    pub access_manager: String,
    pub harvester: String,
    pub swap_router: String,
    pub swap_proxy: String,
    pub swap_adapter: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VaultRoles {
    pub admins: Vec<String>,
    pub strategists: Vec<String>,
    pub harvesters: Vec<String>,
}

/// Aggregate vault state as reported by the factory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultState {
    pub balances: Vec<BigInt>,
    pub positions: Vec<BigInt>,
    pub tvl: BigInt,
    pub share_price: BigInt,
    pub ongoing_management_fees: BigInt,
    pub ongoing_performance_fees: BigInt,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenData {
    pub token: String,
    pub price_feed: String,
    pub precision: BigInt,
    pub denominator: BigInt,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConfigProps {
    pub paused: bool,
    pub verified: bool,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstantProps {
    pub factory: String,
    pub created_at: BigInt,
    pub share: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeesProps {
    pub beneficiary: String,
    pub exit_fees: BigInt,
    pub management_fees_rate: BigInt,
    pub management_fees_to_strategist: BigInt,
    pub performance_fees_rate: BigInt,
    pub performance_fees_to_strategist: BigInt,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryProps {
    pub high_water_mark: BigInt,
    pub prev_rebalance_signals: Vec<BigInt>,
    pub prev_swap: BigInt,
    pub prev_mng_harvest: BigInt,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityProps {
    pub max_aum: BigInt,
    pub max_loss_swap: BigInt,
    pub min_amount_deposit: BigInt,
    pub max_amount_deposit: BigInt,
    pub min_frequency_swap: BigInt,
    pub min_security_time: BigInt,
    pub min_harvest_threshold: BigInt,
}

/// Aggregate vault status as reported by the vault itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultStatus {
    pub positions: Vec<BigInt>,
    pub tvl: BigInt,
    pub share_price: BigInt,
}

/// Read-only views of the factory contract.
pub trait FactoryReader {
    fn whitelisted_tokens(&self, factory: &str) -> Result<Vec<String>, CallError>;

    fn managers(&self, factory: &str) -> Result<FactoryManagers, CallError>;

    fn roles_per_vault(&self, factory: &str, vault: &str) -> Result<VaultRoles, CallError>;

    fn vault_state(&self, factory: &str, vault: &str) -> Result<VaultState, CallError>;

    /// Every vault deployed by the factory, in deployment order.
    fn vaults(&self, factory: &str) -> Result<Vec<String>, CallError>;
}

/// Read-only views of a vault contract.
pub trait VaultReader {
    fn tokens_length(&self, vault: &str) -> Result<u64, CallError>;

    fn token(&self, vault: &str, index: u64) -> Result<TokenData, CallError>;

    fn config_props(&self, vault: &str) -> Result<ConfigProps, CallError>;

    fn constant_props(&self, vault: &str) -> Result<ConstantProps, CallError>;

    fn fees_props(&self, vault: &str) -> Result<FeesProps, CallError>;

    fn history_props(&self, vault: &str) -> Result<HistoryProps, CallError>;

    fn security_props(&self, vault: &str) -> Result<SecurityProps, CallError>;

    fn vault_status(&self, vault: &str) -> Result<VaultStatus, CallError>;

    fn vault_balances(&self, vault: &str) -> Result<Vec<BigInt>, CallError>;

    fn latest_price(&self, vault: &str, price_feed: &str) -> Result<BigInt, CallError>;

    fn pending_management_fees(&self, vault: &str) -> Result<BigInt, CallError>;

    fn pending_performance_fees(&self, vault: &str) -> Result<BigInt, CallError>;
}

/// Everything the mappings read from the chain.
pub trait Chain: FactoryReader + VaultReader {}

impl<T: FactoryReader + VaultReader> Chain for T {}
