// ─────────────────────────────────────────────────────────────────────────────
// Factory log decoding
// ─────────────────────────────────────────────────────────────────────────────

use crate::abi::factory::events;
use crate::config::MappingConfig;
use crate::error::{MappingError, MappingResult};
use crate::pb::vaults::v1::factory_event::Type;
use crate::pb::vaults::v1::{
    AccessManagerChanged, FactoryEvent, FactoryEvents, FeesManagerChanged, HarvesterChanged,
    SwapAdapterChanged, SwapContractsChanged, TokensAdded, TokensRemoved, VaultCreated,
};
use substreams_ethereum::pb::eth::v2 as eth;
use substreams_ethereum::Event;
use vault_common::{format_address, format_addresses};

/// Map handler that decodes every factory event of the block, in log order
#[substreams::handlers::map]
pub fn map_factory_events(
    params: String,
    block: eth::Block,
) -> Result<FactoryEvents, substreams::errors::Error> {
    let config = MappingConfig::parse(&params)?;
    Ok(factory_events(&config, &block)?)
}

/// Collect the factory's events from the successful transactions of `block`
pub fn factory_events(config: &MappingConfig, block: &eth::Block) -> MappingResult<FactoryEvents> {
    let block_timestamp = block
        .header
        .as_ref()
        .and_then(|header| header.timestamp.as_ref())
        .map(|timestamp| timestamp.seconds as u64)
        .ok_or(MappingError::MissingTimestamp {
            block: block.number,
        })?;

    let mut factory_events = vec![];

    // receipts() only yields successful transactions
    for view in block.receipts() {
        for log in view
            .receipt
            .logs
            .iter()
            .filter(|log| log.address == config.factory_bytes)
        {
            if let Some(event) = decode_factory_log(log) {
                factory_events.push(FactoryEvent {
                    tx_hash: format!("0x{}", hex::encode(&view.transaction.hash)),
                    tx_from: format_address(&view.transaction.from),
                    log_index: log.block_index,
                    r#type: Some(event),
                });
            }
        }
    }

    if !factory_events.is_empty() {
        substreams::log::debug!(
            "block {}: {} factory events",
            block.number,
            factory_events.len()
        );
    }

    Ok(FactoryEvents {
        block_number: block.number,
        block_timestamp,
        snapshot_window: block_timestamp / config.snapshot_timeframe,
        events: factory_events,
    })
}

/// Decode a single factory log, `None` for events the mappings do not handle
pub fn decode_factory_log(log: &eth::Log) -> Option<Type> {
    if let Some(event) = events::VaultCreated::match_and_decode(log) {
        return Some(Type::VaultCreated(VaultCreated {
            vault: format_address(&event.vault),
            creator: format_address(&event.creator),
        }));
    }
    if let Some(event) = events::SetAccessManager::match_and_decode(log) {
        return Some(Type::AccessManagerChanged(AccessManagerChanged {
            new_access_manager: format_address(&event.new_access_manager),
        }));
    }
    if let Some(event) = events::SetFeesManager::match_and_decode(log) {
        return Some(Type::FeesManagerChanged(FeesManagerChanged {
            new_fees_manager: format_address(&event.new_fees_manager),
        }));
    }
    if let Some(event) = events::SetHarvester::match_and_decode(log) {
        return Some(Type::HarvesterChanged(HarvesterChanged {
            new_harvester: format_address(&event.new_harvester),
        }));
    }
    if let Some(event) = events::SetSwapContracts::match_and_decode(log) {
        return Some(Type::SwapContractsChanged(SwapContractsChanged {
            new_swap_router: format_address(&event.new_swap_router),
            new_swap_proxy: format_address(&event.new_swap_proxy),
        }));
    }
    if let Some(event) = events::SetSwapAdapter::match_and_decode(log) {
        return Some(Type::SwapAdapterChanged(SwapAdapterChanged {
            new_swap_adapter: format_address(&event.new_swap_adapter),
        }));
    }
    if let Some(event) = events::AddTokensAndPriceFeeds::match_and_decode(log) {
        return Some(Type::TokensAdded(TokensAdded {
            tokens: format_addresses(&event.tokens),
            price_feeds: format_addresses(&event.price_feeds),
        }));
    }
    if let Some(event) = events::RemoveTokensAndPriceFeeds::match_and_decode(log) {
        return Some(Type::TokensRemoved(TokensRemoved {
            tokens: format_addresses(&event.tokens),
        }));
    }

    None
}
