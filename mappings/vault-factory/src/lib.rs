// Vault Factory Mappings
//
// Indexes a vault factory and every vault it deploys:
// - Factory: singleton registry (whitelisted tokens, managers, swap contracts)
// - Vault: one record per deployed vault mirroring its on-chain configuration
// - VaultSnapshot: immutable per-block captures of balances, prices and fees
// - LastSnapshotTimestamp: throttles the periodic snapshot pass
//
// `map_factory_events` decodes factory logs out of raw blocks. The handlers in
// `handlers` run against a host-provided entity store and chain reader, see
// `ports`. `rpc::RpcChain` reads through eth_call.
//
// Module graph:
// - map_factory_events -> store_vault_registry, store_vault_count,
//   store_snapshot_windows
// - map_factory_changes -> store_factory_fields
// - graph_out runs the handlers over `indexed::IndexedStore`, rebuilt from
//   those stores, and emits EntityChanges
//
// `store::MemoryStore` is an in-memory store with all-or-nothing units of
// work, for running the handlers outside a substreams pipeline.

mod abi;
pub mod config;
pub mod constants;
pub mod error;
pub mod events;
pub mod handlers;
pub mod indexed;
pub mod mappers;
pub mod pb;
pub mod ports;
pub mod rpc;
pub mod store;
pub mod stores;

#[cfg(test)]
mod testing;

pub use config::MappingConfig;
pub use error::{CallError, MappingError, MappingResult, StoreError};
pub use events::map_factory_events;
pub use handlers::{BlockInfo, EventContext, Mappings, Outcome, SkipReason, SnapshotPass};
pub use mappers::{graph_out, map_factory_changes};
pub use stores::{
    store_factory_fields, store_snapshot_windows, store_vault_count, store_vault_registry,
};

substreams_ethereum::init!();
