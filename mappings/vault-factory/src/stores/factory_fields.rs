// ─────────────────────────────────────────────────────────────────────────────
// Latest value of every Factory field that comes from the chain
// ─────────────────────────────────────────────────────────────────────────────

use crate::pb::vaults::v1::FactoryFieldChanges;
use substreams::store::{StoreNew, StoreSet, StoreSetString};

pub const TOKENS: &str = "tokens";
pub const FEES_MANAGER: &str = "fees_manager";
pub const ACCESS_MANAGER: &str = "access_manager";
pub const HARVESTER: &str = "harvester";
pub const SWAP_ROUTER: &str = "swap_router";
pub const SWAP_PROXY: &str = "swap_proxy";
pub const SWAP_ADAPTER: &str = "swap_adapter";

/// Token lists are stored comma separated
pub fn join_tokens(tokens: &[String]) -> String {
    tokens.join(",")
}

pub fn split_tokens(value: &str) -> Vec<String> {
    value
        .split(',')
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

/// Store handler that applies the field changes of `map_factory_changes`
#[substreams::handlers::store]
pub fn store_factory_fields(changes: FactoryFieldChanges, store: StoreSetString) {
    for change in changes.changes {
        store.set(change.ordinal, &change.field, &change.value);
    }
}
