//! Event and block handlers.
//!
//! A [`Mappings`] value is built for one unit of work (one event or one
//! block). It borrows the host's store and chain handles and never caches
//! anything across units: singletons are re-read at the start of every
//! handler.

mod factory;
mod snapshot;
mod vault;

pub use snapshot::{snapshot_id, SnapshotPass};
pub use vault::sync_vault;

use crate::config::MappingConfig;
use crate::error::MappingResult;
use crate::pb::vaults::v1::factory_event::Type;
use crate::pb::vaults::v1::{FactoryEvent, FactoryEvents};
use crate::ports::{Chain, EntityStore};

/// Block number and timestamp (seconds) of the unit being processed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockInfo {
    pub number: u64,
    pub timestamp: u64,
}

/// Where an event was emitted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventContext {
    pub block: BlockInfo,
    pub tx_hash: String,
    pub tx_from: String,
    pub log_index: u32,
}

/// Result of a handler that may legitimately find nothing to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    Skipped(SkipReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No vault has been created yet, so the Factory does not exist.
    FactoryMissing,
    VaultMissing,
}

pub struct Mappings<'a, S, C> {
    store: &'a mut S,
    chain: &'a C,
    config: &'a MappingConfig,
}

impl<'a, S: EntityStore, C: Chain> Mappings<'a, S, C> {
    pub fn new(store: &'a mut S, chain: &'a C, config: &'a MappingConfig) -> Self {
        Self {
            store,
            chain,
            config,
        }
    }

    /// Route one decoded factory event to its handler
    pub fn handle_event(&mut self, event: &FactoryEvent, block: BlockInfo) -> MappingResult<()> {
        let ctx = EventContext {
            block,
            tx_hash: event.tx_hash.clone(),
            tx_from: event.tx_from.clone(),
            log_index: event.log_index,
        };

        let Some(event_type) = &event.r#type else {
            return Ok(());
        };

        match event_type {
            Type::VaultCreated(created) => {
                self.handle_create_vault(created, &ctx)?;
            }
            Type::AccessManagerChanged(changed) => {
                self.handle_access_manager_changed(changed)?;
            }
            Type::FeesManagerChanged(changed) => {
                self.handle_fees_manager_changed(changed)?;
            }
            Type::HarvesterChanged(changed) => {
                self.handle_harvester_changed(changed)?;
            }
            Type::SwapContractsChanged(changed) => {
                self.handle_swap_contracts_changed(changed)?;
            }
            Type::SwapAdapterChanged(changed) => {
                self.handle_swap_adapter_changed(changed)?;
            }
            Type::TokensAdded(added) => {
                self.handle_tokens_added(added)?;
            }
            Type::TokensRemoved(removed) => {
                self.handle_tokens_removed(removed)?;
            }
        }

        Ok(())
    }

    /// Process a decoded block: its factory events in log order, then the
    /// block handler
    pub fn handle_events(&mut self, events: &FactoryEvents) -> MappingResult<SnapshotPass> {
        let block = BlockInfo {
            number: events.block_number,
            timestamp: events.block_timestamp,
        };

        for event in &events.events {
            self.handle_event(event, block)?;
        }

        self.handle_new_block(block)
    }
}
