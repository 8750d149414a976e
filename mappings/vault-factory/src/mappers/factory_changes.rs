// ─────────────────────────────────────────────────────────────────────────────
// Factory field changes, read from the chain where events do not carry them
// ─────────────────────────────────────────────────────────────────────────────

use crate::config::MappingConfig;
use crate::error::CallError;
use crate::pb::vaults::v1::factory_event::Type;
use crate::pb::vaults::v1::{
    FactoryEvents, FactoryFieldChange, FactoryFieldChanges, VaultRegistration,
};
use crate::ports::FactoryReader;
use crate::rpc::RpcChain;
use crate::stores::factory_fields::{
    join_tokens, ACCESS_MANAGER, FEES_MANAGER, HARVESTER, SWAP_ADAPTER, SWAP_PROXY, SWAP_ROUTER,
    TOKENS,
};
use crate::stores::BOOTSTRAP_KEY;
use substreams::store::{StoreGet, StoreGetProto};

/// Map handler feeding `store_factory_fields`
#[substreams::handlers::map]
pub fn map_factory_changes(
    params: String,
    events: FactoryEvents,
    registry: StoreGetProto<VaultRegistration>,
) -> Result<FactoryFieldChanges, substreams::errors::Error> {
    let config = MappingConfig::parse(&params)?;
    let bootstrap = registry.get_last(BOOTSTRAP_KEY);

    let changes = factory_field_changes(&RpcChain, &config, &events, bootstrap.as_ref())?;
    Ok(FactoryFieldChanges { changes })
}

/// Field writes the factory handlers make in this block, in log order.
///
/// The bootstrapping `VaultCreated` sets every field from the chain.
/// Administrative events only count once the Factory exists, that is after
/// the bootstrap event.
pub fn factory_field_changes<C: FactoryReader>(
    chain: &C,
    config: &MappingConfig,
    events: &FactoryEvents,
    bootstrap: Option<&VaultRegistration>,
) -> Result<Vec<FactoryFieldChange>, CallError> {
    let Some(bootstrap) = bootstrap else {
        return Ok(vec![]);
    };
    let bootstrapped_at = (bootstrap.block_number, bootstrap.log_index);

    let mut changes = vec![];
    for event in &events.events {
        let Some(event_type) = &event.r#type else {
            continue;
        };
        let at = (events.block_number, event.log_index);
        let ordinal = event.log_index as u64;
        let mut set = |field: &str, value: String| {
            changes.push(FactoryFieldChange {
                ordinal,
                field: field.to_string(),
                value,
            })
        };

        if at == bootstrapped_at {
            let managers = chain.managers(&config.factory)?;
            set(TOKENS, join_tokens(&chain.whitelisted_tokens(&config.factory)?));
            set(FEES_MANAGER, managers.fees_manager);
            set(ACCESS_MANAGER, managers.access_manager);
            set(HARVESTER, managers.harvester);
            set(SWAP_ROUTER, managers.swap_router);
            set(SWAP_PROXY, managers.swap_proxy);
            set(SWAP_ADAPTER, managers.swap_adapter);
            continue;
        }
        if at < bootstrapped_at {
            continue;
        }

        match event_type {
            Type::VaultCreated(_) => {}
            Type::AccessManagerChanged(changed) => {
                set(ACCESS_MANAGER, changed.new_access_manager.clone())
            }
            Type::FeesManagerChanged(changed) => set(FEES_MANAGER, changed.new_fees_manager.clone()),
            Type::HarvesterChanged(changed) => set(HARVESTER, changed.new_harvester.clone()),
            Type::SwapContractsChanged(changed) => {
                set(SWAP_ROUTER, changed.new_swap_router.clone());
                set(SWAP_PROXY, changed.new_swap_proxy.clone());
            }
            Type::SwapAdapterChanged(changed) => set(SWAP_ADAPTER, changed.new_swap_adapter.clone()),
            Type::TokensAdded(_) | Type::TokensRemoved(_) => {
                set(TOKENS, join_tokens(&chain.whitelisted_tokens(&config.factory)?))
            }
        }
    }

    Ok(changes)
}
