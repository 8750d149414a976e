// ─────────────────────────────────────────────────────────────────────────────
// Vault creation and on-chain state synchronisation
// ─────────────────────────────────────────────────────────────────────────────

use super::{EventContext, Mappings, Outcome, SkipReason};
use crate::constants::zero_bi;
use crate::error::MappingResult;
use crate::pb::vaults::v1::{Vault, VaultCreated};
use crate::ports::{Chain, EntityStore};
use vault_common::{format_bigint, format_bigints, normalize_address};

/// Overwrite every chain-mirrored field of `vault` with the contract's
/// current state.
///
/// Accumulators, counters and identity fields are left alone. The record is
/// not persisted here.
pub fn sync_vault<C: Chain>(
    chain: &C,
    factory: &str,
    vault_address: &str,
    mut vault: Vault,
) -> MappingResult<Vault> {
    // Tokens and their price feeds
    let tokens_length = chain.tokens_length(vault_address)?;
    let mut tokens = Vec::new();
    let mut price_feeds = Vec::new();
    let mut precisions = Vec::new();
    let mut denominators = Vec::new();
    for index in 0..tokens_length {
        let token = chain.token(vault_address, index)?;
        tokens.push(token.token);
        price_feeds.push(token.price_feed);
        precisions.push(format_bigint(&token.precision));
        denominators.push(format_bigint(&token.denominator));
    }
    vault.tokens = tokens;
    vault.tokens_price_feed_address = price_feeds;
    vault.tokens_price_feed_precision = precisions;
    vault.tokens_denominator = denominators;

    // Roles
    let roles = chain.roles_per_vault(factory, vault_address)?;
    vault.admins = roles.admins;
    vault.strategists = roles.strategists;
    vault.harvesters = roles.harvesters;

    let config = chain.config_props(vault_address)?;
    vault.paused = config.paused;
    vault.verified = config.verified;
    vault.name = config.name;
    vault.description = config.description;

    let constants = chain.constant_props(vault_address)?;
    vault.factory_address = constants.factory;
    vault.created_at = format_bigint(&constants.created_at);
    vault.share = constants.share;

    let fees = chain.fees_props(vault_address)?;
    vault.beneficiary = fees.beneficiary;
    vault.exit_fees = format_bigint(&fees.exit_fees);
    vault.management_fees_rate = format_bigint(&fees.management_fees_rate);
    vault.management_fees_to_strategist = format_bigint(&fees.management_fees_to_strategist);
    vault.performance_fees_rate = format_bigint(&fees.performance_fees_rate);
    vault.performance_fees_to_strategist = format_bigint(&fees.performance_fees_to_strategist);

    let history = chain.history_props(vault_address)?;
    vault.high_water_mark = format_bigint(&history.high_water_mark);
    vault.prev_rebalance_signals = format_bigints(&history.prev_rebalance_signals);
    vault.prev_swap = format_bigint(&history.prev_swap);
    vault.prev_mng_harvest = format_bigint(&history.prev_mng_harvest);

    let security = chain.security_props(vault_address)?;
    vault.max_aum = format_bigint(&security.max_aum);
    vault.max_loss_swap = format_bigint(&security.max_loss_swap);
    vault.min_amount_deposit = format_bigint(&security.min_amount_deposit);
    vault.max_amount_deposit = format_bigint(&security.max_amount_deposit);
    vault.min_frequency_swap = format_bigint(&security.min_frequency_swap);
    vault.min_security_time = format_bigint(&security.min_security_time);
    vault.min_harvest_threshold = format_bigint(&security.min_harvest_threshold);

    let state = chain.vault_state(factory, vault_address)?;
    vault.balances = format_bigints(&state.balances);
    vault.positions = format_bigints(&state.positions);
    vault.tvl = format_bigint(&state.tvl);
    vault.share_price = format_bigint(&state.share_price);
    vault.ongoing_management_fees = format_bigint(&state.ongoing_management_fees);
    vault.ongoing_performance_fees = format_bigint(&state.ongoing_performance_fees);

    vault.share_transferability = false;

    Ok(vault)
}

impl<'a, S: EntityStore, C: Chain> Mappings<'a, S, C> {
    /// Handle a `VaultCreated` factory event.
    ///
    /// Bootstraps the Factory on the first vault, bumps its vault count,
    /// creates the Vault and registers the vault address as a new source.
    pub fn handle_create_vault(
        &mut self,
        event: &VaultCreated,
        ctx: &EventContext,
    ) -> MappingResult<Vault> {
        let mut factory = match self.load_factory()? {
            Some(factory) => factory,
            None => self.create_factory(ctx.block)?,
        };
        factory.vault_count += 1;
        self.store.save(&factory)?;

        let address = normalize_address(&event.vault);
        let zero = format_bigint(&zero_bi());
        let vault = Vault {
            id: address.clone(),
            factory: factory.id.clone(),
            vault: address.clone(),
            creator: ctx.tx_from.clone(),
            acc_management_fees_to_dao: zero.clone(),
            acc_performance_fees_to_dao: zero.clone(),
            acc_management_fees_to_strategists: zero.clone(),
            acc_performance_fees_to_strategists: zero,
            deposits_count: 0,
            rebalances_count: 0,
            redemptions_count: 0,
            ..Default::default()
        };
        let vault = sync_vault(self.chain, &factory.id, &address, vault)?;

        self.store.create(&vault)?;
        self.store.register_vault_source(&address)?;

        substreams::log::info!(
            "Vault {} created by {} (tx {}, block {}), factory now has {} vaults",
            vault.id,
            vault.creator,
            ctx.tx_hash,
            ctx.block.number,
            factory.vault_count
        );

        Ok(vault)
    }

    /// Re-read the chain state of an existing vault and save it
    pub fn refresh_vault(&mut self, vault_address: &str) -> MappingResult<Outcome> {
        let Some(vault) = self.store.load::<Vault>(vault_address)? else {
            substreams::log::debug!("refresh: vault {vault_address} not indexed, skipping");
            return Ok(Outcome::Skipped(SkipReason::VaultMissing));
        };

        let vault = sync_vault(self.chain, &self.config.factory, vault_address, vault)?;
        self.store.save(&vault)?;

        Ok(Outcome::Applied)
    }
}
