// ─────────────────────────────────────────────────────────────────────────────
// Vault snapshots and the throttled periodic snapshot pass
// ─────────────────────────────────────────────────────────────────────────────

use super::{BlockInfo, Mappings};
use crate::constants::LAST_SNAPSHOT_TIMESTAMP_ID;
use crate::error::{MappingError, MappingResult};
use crate::pb::vaults::v1::{Factory, LastSnapshotTimestamp, Vault, VaultSnapshot};
use crate::ports::{Chain, Entity, EntityStore};
use vault_common::{format_bigint, format_bigints};

/// What the block handler did for a given block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotPass {
    /// No vault exists yet; nothing was read or written.
    NotBootstrapped,
    /// Less than the snapshot timeframe elapsed since the last pass.
    Throttled { elapsed: u64 },
    Completed { snapshots: usize },
}

/// Snapshot entity id: `{factory}-{vault}-{block_number}`
pub fn snapshot_id(factory: &str, vault: &str, block_number: u64) -> String {
    format!("{factory}-{vault}-{block_number}")
}

impl<'a, S: EntityStore, C: Chain> Mappings<'a, S, C> {
    /// Capture a vault's balances, prices and fees at `block`.
    ///
    /// Snapshots are immutable: building one twice for the same factory,
    /// vault and block fails with a duplicate key error.
    pub fn build_vault_snapshot(
        &mut self,
        factory: &Factory,
        vault_address: &str,
        block: BlockInfo,
        triggered_by_event: bool,
    ) -> MappingResult<VaultSnapshot> {
        let status = self.chain.vault_status(vault_address)?;

        let tokens_length = self.chain.tokens_length(vault_address)?;
        let mut tokens = Vec::new();
        let mut prices = Vec::new();
        for index in 0..tokens_length {
            let token = self.chain.token(vault_address, index)?;
            let price = self.chain.latest_price(vault_address, &token.price_feed)?;
            tokens.push(token.token);
            prices.push(format_bigint(&price));
        }

        let balances = self.chain.vault_balances(vault_address)?;
        let pending_perf_fees = self.chain.pending_performance_fees(vault_address)?;
        let pending_mng_fees = self.chain.pending_management_fees(vault_address)?;

        let snapshot = VaultSnapshot {
            id: snapshot_id(&factory.id, vault_address, block.number),
            factory: factory.id.clone(),
            vault: vault_address.to_string(),
            assets_balances: format_bigints(&balances),
            assets_prices: prices,
            tokens,
            positions: format_bigints(&status.positions),
            tvl: format_bigint(&status.tvl),
            share_price: format_bigint(&status.share_price),
            pending_perf_fees: format_bigint(&pending_perf_fees),
            pending_mng_fees: format_bigint(&pending_mng_fees),
            timestamp: block.timestamp,
            block_number: block.number,
            triggered_by_event,
        };
        self.store.create(&snapshot)?;

        Ok(snapshot)
    }

    /// Block handler: snapshot every vault at most once per timeframe.
    ///
    /// Whether the pass is due is decided by the configured
    /// [`ThrottlePolicy`](crate::config::ThrottlePolicy). The stored
    /// timestamp then moves to this block, so a late block never causes
    /// passes to be lost. Vaults the factory reports but that have no Vault
    /// record are skipped.
    pub fn handle_new_block(&mut self, block: BlockInfo) -> MappingResult<SnapshotPass> {
        let Some(factory) = self.load_factory()? else {
            return Ok(SnapshotPass::NotBootstrapped);
        };

        let mut last_snapshot = self
            .store
            .load::<LastSnapshotTimestamp>(LAST_SNAPSHOT_TIMESTAMP_ID)?
            .ok_or_else(|| MappingError::MissingEntity {
                entity: LastSnapshotTimestamp::NAME,
                id: LAST_SNAPSHOT_TIMESTAMP_ID.to_string(),
            })?;

        let elapsed = block.timestamp.saturating_sub(last_snapshot.timestamp);
        let due = self.config.throttle.is_due(
            last_snapshot.timestamp,
            block.timestamp,
            self.config.snapshot_timeframe,
        );
        if !due {
            return Ok(SnapshotPass::Throttled { elapsed });
        }

        last_snapshot.timestamp = block.timestamp;
        self.store.save(&last_snapshot)?;

        let mut snapshots = 0;
        for vault_address in self.chain.vaults(&factory.id)? {
            if self.store.load::<Vault>(&vault_address)?.is_none() {
                substreams::log::debug!("Vault {} has no record, no snapshot", vault_address);
                continue;
            }

            self.build_vault_snapshot(&factory, &vault_address, block, false)?;
            snapshots += 1;
            if self.config.refresh_vaults_on_snapshot {
                self.refresh_vault(&vault_address)?;
            }
        }

        substreams::log::info!(
            "Snapshot pass at block {} (timestamp {}): {} vaults",
            block.number,
            block.timestamp,
            snapshots
        );

        Ok(SnapshotPass::Completed { snapshots })
    }
}
