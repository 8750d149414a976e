// ─────────────────────────────────────────────────────────────────────────────
// Entity changes for the subgraph sink
// ─────────────────────────────────────────────────────────────────────────────

use crate::config::{MappingConfig, ThrottlePolicy};
use crate::error::{MappingResult, StoreError};
use crate::handlers::Mappings;
use crate::indexed::{IndexedState, IndexedStore, StagedEntity};
use crate::pb::vaults::v1::{
    Factory, FactoryEvents, LastSnapshotTimestamp, SnapshotWindow, Vault, VaultRegistration,
    VaultSnapshot,
};
use crate::ports::{Chain, Entity};
use crate::rpc::RpcChain;
use crate::store::decode;
use crate::stores::{window_key, VAULT_COUNT_KEY};
use substreams::store::{StoreGet, StoreGetInt64, StoreGetProto, StoreGetString};
use substreams_entity_change::pb::entity::EntityChanges;
use substreams_entity_change::tables::{Row, Tables};

/// The store modules `graph_out` reads
pub struct SubstreamsState {
    pub registry: StoreGetProto<VaultRegistration>,
    pub vault_count: StoreGetInt64,
    pub factory_fields: StoreGetString,
    pub windows: StoreGetProto<SnapshotWindow>,
}

impl IndexedState for SubstreamsState {
    fn registration(&self, key: &str) -> Option<VaultRegistration> {
        self.registry.get_last(key)
    }

    fn vault_count(&self) -> i64 {
        self.vault_count.get_last(VAULT_COUNT_KEY).unwrap_or_default()
    }

    fn factory_field(&self, field: &str) -> Option<String> {
        self.factory_fields.get_last(field)
    }

    fn snapshot_window(&self, window: u64) -> Option<SnapshotWindow> {
        self.windows.get_last(window_key(window))
    }
}

/// Map handler that runs the factory handlers over the block and emits the
/// resulting entity changes
#[substreams::handlers::map]
pub fn graph_out(
    params: String,
    events: FactoryEvents,
    registry: StoreGetProto<VaultRegistration>,
    vault_count: StoreGetInt64,
    factory_fields: StoreGetString,
    windows: StoreGetProto<SnapshotWindow>,
) -> Result<EntityChanges, substreams::errors::Error> {
    let mut config = MappingConfig::parse(&params)?;
    // The last pass is only known down to its window
    config.throttle = ThrottlePolicy::Window;

    let state = SubstreamsState {
        registry,
        vault_count,
        factory_fields,
        windows,
    };

    Ok(entity_changes(&state, &RpcChain, &config, &events)?)
}

/// Handle the block's events and the block handler, then turn every write
/// into one create or update row
pub fn entity_changes<V: IndexedState, C: Chain>(
    state: &V,
    chain: &C,
    config: &MappingConfig,
    events: &FactoryEvents,
) -> MappingResult<EntityChanges> {
    let mut store = IndexedStore::new(state, config, events);
    Mappings::new(&mut store, chain, config).handle_events(events)?;

    let mut tables = Tables::new();
    for staged in store.staged() {
        write_row(&mut tables, staged)?;
    }

    Ok(tables.to_entity_changes())
}

fn write_row(tables: &mut Tables, staged: &StagedEntity) -> Result<(), StoreError> {
    let row = if staged.created {
        tables.create_row(staged.entity, &staged.id)
    } else {
        tables.update_row(staged.entity, &staged.id)
    };

    if staged.entity == Factory::NAME {
        factory_row(row, &decode(&staged.id, &staged.bytes)?);
    } else if staged.entity == Vault::NAME {
        vault_row(row, &decode(&staged.id, &staged.bytes)?);
    } else if staged.entity == VaultSnapshot::NAME {
        snapshot_row(row, &decode(&staged.id, &staged.bytes)?);
    } else if staged.entity == LastSnapshotTimestamp::NAME {
        let last: LastSnapshotTimestamp = decode(&staged.id, &staged.bytes)?;
        row.set_bigint("timestamp", &last.timestamp.to_string());
    }

    Ok(())
}

fn factory_row(row: &mut Row, factory: &Factory) {
    row.set("vaultCount", factory.vault_count)
        .set("tokens", factory.tokens.clone())
        .set("feesManager", &factory.fees_manager)
        .set("accessManager", &factory.access_manager)
        .set("harvester", &factory.harvester)
        .set("swapRouter", &factory.swap_router)
        .set("swapProxy", &factory.swap_proxy)
        .set("swapAdapter", &factory.swap_adapter);
}

fn vault_row(row: &mut Row, vault: &Vault) {
    row.set("factory", &vault.factory)
        .set("vault", &vault.vault)
        .set("creator", &vault.creator)
        .set_bigint("accManagementFeesToDAO", &vault.acc_management_fees_to_dao)
        .set_bigint("accPerformanceFeesToDAO", &vault.acc_performance_fees_to_dao)
        .set_bigint(
            "accManagementFeesToStrategists",
            &vault.acc_management_fees_to_strategists,
        )
        .set_bigint(
            "accPerformanceFeesToStrategists",
            &vault.acc_performance_fees_to_strategists,
        )
        .set("depositsCount", vault.deposits_count)
        .set("rebalancesCount", vault.rebalances_count)
        .set("redemptionsCount", vault.redemptions_count);

    // Tokens
    row.set("tokens", vault.tokens.clone())
        .set("tokensPriceFeedAddress", vault.tokens_price_feed_address.clone())
        .set("tokensPriceFeedPrecision", vault.tokens_price_feed_precision.clone())
        .set("tokensDenominator", vault.tokens_denominator.clone());

    // Roles
    row.set("admins", vault.admins.clone())
        .set("strategists", vault.strategists.clone())
        .set("harvesters", vault.harvesters.clone());

    // Config and constants
    row.set("paused", vault.paused)
        .set("verified", vault.verified)
        .set("name", &vault.name)
        .set("description", &vault.description)
        .set("factoryAddress", &vault.factory_address)
        .set_bigint("createdAt", &vault.created_at)
        .set("share", &vault.share)
        .set("shareTransferability", vault.share_transferability);

    // Fees
    row.set("beneficiary", &vault.beneficiary)
        .set_bigint("exitFees", &vault.exit_fees)
        .set_bigint("managementFeesRate", &vault.management_fees_rate)
        .set_bigint("managementFeesToStrategist", &vault.management_fees_to_strategist)
        .set_bigint("performanceFeesRate", &vault.performance_fees_rate)
        .set_bigint("performanceFeesToStrategist", &vault.performance_fees_to_strategist);

    // History
    row.set_bigint("highWaterMark", &vault.high_water_mark)
        .set("prevRebalanceSignals", vault.prev_rebalance_signals.clone())
        .set_bigint("prevSwap", &vault.prev_swap)
        .set_bigint("prevMngHarvest", &vault.prev_mng_harvest);

    // Security
    row.set_bigint("maxAUM", &vault.max_aum)
        .set_bigint("maxLossSwap", &vault.max_loss_swap)
        .set_bigint("minAmountDeposit", &vault.min_amount_deposit)
        .set_bigint("maxAmountDeposit", &vault.max_amount_deposit)
        .set_bigint("minFrequencySwap", &vault.min_frequency_swap)
        .set_bigint("minSecurityTime", &vault.min_security_time)
        .set_bigint("minHarvestThreshold", &vault.min_harvest_threshold);

    // State
    row.set("balances", vault.balances.clone())
        .set("positions", vault.positions.clone())
        .set_bigint("tvl", &vault.tvl)
        .set_bigint("sharePrice", &vault.share_price)
        .set_bigint("ongoingManagementFees", &vault.ongoing_management_fees)
        .set_bigint("ongoingPerformanceFees", &vault.ongoing_performance_fees);
}

fn snapshot_row(row: &mut Row, snapshot: &VaultSnapshot) {
    row.set("factory", &snapshot.factory)
        .set("vault", &snapshot.vault)
        .set("assetsBalances", snapshot.assets_balances.clone())
        .set("assetsPrices", snapshot.assets_prices.clone())
        .set("tokens", snapshot.tokens.clone())
        .set("positions", snapshot.positions.clone())
        .set_bigint("tvl", &snapshot.tvl)
        .set_bigint("sharePrice", &snapshot.share_price)
        .set_bigint("pendingPerfFees", &snapshot.pending_perf_fees)
        .set_bigint("pendingMngFees", &snapshot.pending_mng_fees)
        .set_bigint("timestamp", &snapshot.timestamp.to_string())
        .set_bigint("blockNumber", &snapshot.block_number.to_string())
        .set("triggeredByEvent", snapshot.triggered_by_event);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{FACTORY_ADDRESS, LAST_SNAPSHOT_TIMESTAMP_ID};
    use crate::handlers::snapshot_id;
    use crate::indexed::tests::{FakeState, BOOTSTRAP_BLOCK, BOOTSTRAP_TS};
    use crate::pb::vaults::v1::factory_event::Type;
    use crate::pb::vaults::v1::{FactoryEvent, HarvesterChanged, VaultCreated};
    use crate::stores::factory_fields::{
        ACCESS_MANAGER, FEES_MANAGER, HARVESTER, SWAP_ADAPTER, SWAP_PROXY, SWAP_ROUTER, TOKENS,
    };
    use crate::testing::{addr, FakeChain, FakeVault};
    use substreams_entity_change::pb::entity::entity_change::Operation;

    fn window_config() -> MappingConfig {
        MappingConfig {
            throttle: ThrottlePolicy::Window,
            ..MappingConfig::default()
        }
    }

    fn block_events(
        block_number: u64,
        timestamp: u64,
        events: Vec<FactoryEvent>,
    ) -> FactoryEvents {
        FactoryEvents {
            block_number,
            block_timestamp: timestamp,
            snapshot_window: timestamp / 3600,
            events,
        }
    }

    fn event(log_index: u32, r#type: Type) -> FactoryEvent {
        FactoryEvent {
            tx_hash: format!("0x{}", "ab".repeat(32)),
            tx_from: addr(0x99),
            log_index,
            r#type: Some(r#type),
        }
    }

    /// Store values at the end of the bootstrap block
    fn bootstrapped(chain: &FakeChain) -> FakeState {
        let mut state = FakeState::default();
        state.register(&addr(0x11), BOOTSTRAP_BLOCK, BOOTSTRAP_TS);
        state.open_window(BOOTSTRAP_BLOCK, BOOTSTRAP_TS, 3600);
        state.set_field(TOKENS, &chain.whitelist.borrow().join(","));
        state.set_field(FEES_MANAGER, &chain.managers.fees_manager);
        state.set_field(ACCESS_MANAGER, &chain.managers.access_manager);
        state.set_field(HARVESTER, &chain.managers.harvester);
        state.set_field(SWAP_ROUTER, &chain.managers.swap_router);
        state.set_field(SWAP_PROXY, &chain.managers.swap_proxy);
        state.set_field(SWAP_ADAPTER, &chain.managers.swap_adapter);
        state
    }

    fn chain() -> FakeChain {
        let chain = FakeChain::new();
        chain.deploy(&addr(0x11), FakeVault::sample(1));
        chain
    }

    fn rows(changes: &EntityChanges) -> Vec<(String, String, Operation)> {
        let mut rows: Vec<_> = changes
            .entity_changes
            .iter()
            .map(|change| {
                let operation = if change.operation == Operation::Create as i32 {
                    Operation::Create
                } else {
                    Operation::Update
                };
                (change.entity.clone(), change.id.clone(), operation)
            })
            .collect();
        rows.sort_by(|a, b| (&a.0, &a.1).cmp(&(&b.0, &b.1)));
        rows
    }

    fn row(entity: &str, id: &str, operation: Operation) -> (String, String, Operation) {
        (entity.to_string(), id.to_string(), operation)
    }

    fn has_field(changes: &EntityChanges, entity: &str, field: &str) -> bool {
        changes
            .entity_changes
            .iter()
            .filter(|change| change.entity == entity)
            .any(|change| change.fields.iter().any(|f| f.name == field))
    }

    #[test]
    fn bootstrap_block_creates_singletons_and_vault() {
        let chain = chain();
        let state = bootstrapped(&chain);
        let events = block_events(
            BOOTSTRAP_BLOCK,
            BOOTSTRAP_TS,
            vec![event(
                0,
                Type::VaultCreated(VaultCreated {
                    vault: addr(0x11),
                    creator: addr(0x01),
                }),
            )],
        );

        let changes = entity_changes(&state, &chain, &window_config(), &events).unwrap();

        assert_eq!(
            rows(&changes),
            vec![
                row("Factory", FACTORY_ADDRESS, Operation::Create),
                row("LastSnapshotTimestamp", LAST_SNAPSHOT_TIMESTAMP_ID, Operation::Create),
                row("Vault", &addr(0x11), Operation::Create),
            ]
        );
        assert!(has_field(&changes, "Factory", "vaultCount"));
        assert!(has_field(&changes, "Vault", "sharePrice"));
    }

    #[test]
    fn window_opener_takes_snapshots() {
        let chain = chain();
        let mut state = bootstrapped(&chain);
        let next = (BOOTSTRAP_TS / 3600 + 1) * 3600;
        state.open_window(180, next + 2, 3600);

        let events = block_events(180, next + 2, vec![]);
        let changes = entity_changes(&state, &chain, &window_config(), &events).unwrap();

        assert_eq!(
            rows(&changes),
            vec![
                row("LastSnapshotTimestamp", LAST_SNAPSHOT_TIMESTAMP_ID, Operation::Update),
                row(
                    "VaultSnapshot",
                    &snapshot_id(FACTORY_ADDRESS, &addr(0x11), 180),
                    Operation::Create
                ),
            ]
        );
        assert!(has_field(&changes, "VaultSnapshot", "triggeredByEvent"));
    }

    #[test]
    fn later_blocks_of_a_window_emit_nothing() {
        let chain = chain();
        let mut state = bootstrapped(&chain);
        let next = (BOOTSTRAP_TS / 3600 + 1) * 3600;
        state.open_window(180, next + 2, 3600);

        let events = block_events(181, next + 14, vec![]);
        let changes = entity_changes(&state, &chain, &window_config(), &events).unwrap();

        assert!(changes.entity_changes.is_empty());
    }

    #[test]
    fn admin_events_update_the_factory() {
        let chain = chain();
        let state = bootstrapped(&chain);
        let events = block_events(
            101,
            BOOTSTRAP_TS + 12,
            vec![event(
                3,
                Type::HarvesterChanged(HarvesterChanged {
                    new_harvester: addr(0x31),
                }),
            )],
        );

        let changes = entity_changes(&state, &chain, &window_config(), &events).unwrap();

        assert_eq!(
            rows(&changes),
            vec![row("Factory", FACTORY_ADDRESS, Operation::Update)]
        );
        assert!(has_field(&changes, "Factory", "harvester"));
    }

    #[test]
    fn failed_calls_fail_the_block() {
        let chain = chain().failing_on("getWhitelistedTokens");
        let state = FakeState::default();
        let events = block_events(
            BOOTSTRAP_BLOCK,
            BOOTSTRAP_TS,
            vec![event(
                0,
                Type::VaultCreated(VaultCreated {
                    vault: addr(0x11),
                    creator: addr(0x01),
                }),
            )],
        );

        assert!(entity_changes(&state, &chain, &window_config(), &events).is_err());
    }
}
