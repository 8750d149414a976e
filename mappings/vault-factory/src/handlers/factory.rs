// ─────────────────────────────────────────────────────────────────────────────
// Factory bootstrap and factory-level administrative events
// ─────────────────────────────────────────────────────────────────────────────

use super::{BlockInfo, Mappings, Outcome, SkipReason};
use crate::error::MappingResult;
use crate::pb::vaults::v1::{
    AccessManagerChanged, Factory, FeesManagerChanged, HarvesterChanged, LastSnapshotTimestamp,
    SwapAdapterChanged, SwapContractsChanged, TokensAdded, TokensRemoved,
};
use crate::ports::{Chain, EntityStore};

impl<'a, S: EntityStore, C: Chain> Mappings<'a, S, C> {
    /// Create the Factory and LastSnapshotTimestamp singletons.
    ///
    /// Called on the first vault creation. Both records are created with
    /// insert semantics, so a second bootstrap fails instead of resetting
    /// them.
    pub(crate) fn create_factory(&mut self, block: BlockInfo) -> MappingResult<Factory> {
        let factory_address = self.config.factory.as_str();

        let tokens = self.chain.whitelisted_tokens(factory_address)?;
        let managers = self.chain.managers(factory_address)?;

        let factory = Factory {
            id: factory_address.to_string(),
            vault_count: 0,
            tokens,
            fees_manager: managers.fees_manager,
            access_manager: managers.access_manager,
            harvester: managers.harvester,
            swap_router: managers.swap_router,
            swap_proxy: managers.swap_proxy,
            swap_adapter: managers.swap_adapter,
        };
        self.store.create(&factory)?;
        self.store
            .create(&LastSnapshotTimestamp::singleton(block.timestamp))?;

        substreams::log::info!(
            "Factory {} bootstrapped at block {} with {} whitelisted tokens",
            factory.id,
            block.number,
            factory.tokens.len()
        );

        Ok(factory)
    }

    pub(crate) fn load_factory(&self) -> MappingResult<Option<Factory>> {
        Ok(self.store.load::<Factory>(&self.config.factory)?)
    }

    /// Load the Factory, apply `update` and save it back
    fn update_factory<F>(&mut self, event_name: &str, update: F) -> MappingResult<Outcome>
    where
        F: FnOnce(&mut Factory),
    {
        let Some(mut factory) = self.load_factory()? else {
            substreams::log::debug!("{event_name}: factory {} not found, skipping", self.config.factory);
            return Ok(Outcome::Skipped(SkipReason::FactoryMissing));
        };

        update(&mut factory);
        self.store.save(&factory)?;

        Ok(Outcome::Applied)
    }

    pub fn handle_access_manager_changed(
        &mut self,
        event: &AccessManagerChanged,
    ) -> MappingResult<Outcome> {
        self.update_factory("SetAccessManager", |factory| {
            factory.access_manager = event.new_access_manager.clone();
        })
    }

    pub fn handle_fees_manager_changed(
        &mut self,
        event: &FeesManagerChanged,
    ) -> MappingResult<Outcome> {
        self.update_factory("SetFeesManager", |factory| {
            factory.fees_manager = event.new_fees_manager.clone();
        })
    }

    pub fn handle_harvester_changed(&mut self, event: &HarvesterChanged) -> MappingResult<Outcome> {
        self.update_factory("SetHarvester", |factory| {
            factory.harvester = event.new_harvester.clone();
        })
    }

    pub fn handle_swap_contracts_changed(
        &mut self,
        event: &SwapContractsChanged,
    ) -> MappingResult<Outcome> {
        self.update_factory("SetSwapContracts", |factory| {
            factory.swap_proxy = event.new_swap_proxy.clone();
            factory.swap_router = event.new_swap_router.clone();
        })
    }

    pub fn handle_swap_adapter_changed(
        &mut self,
        event: &SwapAdapterChanged,
    ) -> MappingResult<Outcome> {
        self.update_factory("SetSwapAdapter", |factory| {
            factory.swap_adapter = event.new_swap_adapter.clone();
        })
    }

    /// The event's token list is not trusted; the whitelist is re-read
    pub fn handle_tokens_added(&mut self, _event: &TokensAdded) -> MappingResult<Outcome> {
        self.refresh_whitelist("AddTokensAndPriceFeeds")
    }

    pub fn handle_tokens_removed(&mut self, _event: &TokensRemoved) -> MappingResult<Outcome> {
        self.refresh_whitelist("RemoveTokensAndPriceFeeds")
    }

    /// Overwrite the Factory's whitelist with the contract's current one
    fn refresh_whitelist(&mut self, event_name: &str) -> MappingResult<Outcome> {
        let Some(mut factory) = self.load_factory()? else {
            substreams::log::debug!("{event_name}: factory {} not found, skipping", self.config.factory);
            return Ok(Outcome::Skipped(SkipReason::FactoryMissing));
        };

        factory.tokens = self.chain.whitelisted_tokens(&self.config.factory)?;
        self.store.save(&factory)?;

        substreams::log::debug!(
            "{event_name}: whitelist refreshed, {} tokens",
            factory.tokens.len()
        );

        Ok(Outcome::Applied)
    }
}
