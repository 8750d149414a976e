// ─────────────────────────────────────────────────────────────────────────────
// eth_call-backed contract reads through the generated ABI bindings
// ─────────────────────────────────────────────────────────────────────────────

use crate::abi::{factory, vault};
use crate::error::CallError;
use crate::ports::{
    ConfigProps, ConstantProps, FactoryManagers, FactoryReader, FeesProps, HistoryProps,
    SecurityProps, TokenData, VaultReader, VaultRoles, VaultState, VaultStatus,
};
use substreams::scalar::BigInt;
use substreams_ethereum::Function;
use vault_common::{decode_address, format_address, format_addresses};

/// Reads contract state at the block being processed.
///
/// Every view returns `None` from the generated bindings when the call
/// reverts or its output does not decode; both surface as
/// [`CallError::Failed`].
#[derive(Debug, Default, Clone, Copy)]
pub struct RpcChain;

fn target(address: &str) -> Result<Vec<u8>, CallError> {
    decode_address(address).ok_or_else(|| CallError::InvalidAddress(address.to_string()))
}

/// Split `ongoingFees` into `(management, performance)`.
fn split_ongoing_fees(fees: Vec<BigInt>) -> Option<(BigInt, BigInt)> {
    let mut fees = fees.into_iter();
    Some((fees.next()?, fees.next()?))
}

/// `None` when the value is negative or does not fit in a u64
fn checked_u64(value: &BigInt) -> Option<u64> {
    u64::try_from(value).ok()
}

impl FactoryReader for RpcChain {
    fn whitelisted_tokens(&self, factory: &str) -> Result<Vec<String>, CallError> {
        let tokens = factory::functions::GetWhitelistedTokens {}
            .call(target(factory)?)
            .ok_or_else(|| {
                CallError::failed(factory, factory::functions::GetWhitelistedTokens::NAME)
            })?;

        Ok(format_addresses(&tokens))
    }

    fn managers(&self, factory: &str) -> Result<FactoryManagers, CallError> {
        let address = target(factory)?;
        let fees_manager = factory::functions::FeesManager {}
            .call(address.clone())
            .ok_or_else(|| CallError::failed(factory, factory::functions::FeesManager::NAME))?;
        let access_manager = factory::functions::AccessManager {}
            .call(address.clone())
            .ok_or_else(|| CallError::failed(factory, factory::functions::AccessManager::NAME))?;
        let harvester = factory::functions::Harvester {}
            .call(address.clone())
            .ok_or_else(|| CallError::failed(factory, factory::functions::Harvester::NAME))?;
        let swap_router = factory::functions::SwapRouter {}
            .call(address.clone())
            .ok_or_else(|| CallError::failed(factory, factory::functions::SwapRouter::NAME))?;
        let swap_proxy = factory::functions::SwapProxy {}
            .call(address.clone())
            .ok_or_else(|| CallError::failed(factory, factory::functions::SwapProxy::NAME))?;
        let swap_adapter = factory::functions::SwapAdapter {}
            .call(address)
            .ok_or_else(|| CallError::failed(factory, factory::functions::SwapAdapter::NAME))?;

        Ok(FactoryManagers {
            fees_manager: format_address(&fees_manager),
            access_manager: format_address(&access_manager),
            harvester: format_address(&harvester),
            swap_router: format_address(&swap_router),
            swap_proxy: format_address(&swap_proxy),
            swap_adapter: format_address(&swap_adapter),
        })
    }

    fn roles_per_vault(&self, factory: &str, vault: &str) -> Result<VaultRoles, CallError> {
        let (_owner, admins, strategists, harvesters) = factory::functions::GetRolesPerVault {
            vault: target(vault)?,
        }
        .call(target(factory)?)
        .ok_or_else(|| CallError::failed(factory, factory::functions::GetRolesPerVault::NAME))?;

        Ok(VaultRoles {
            admins: format_addresses(&admins),
            strategists: format_addresses(&strategists),
            harvesters: format_addresses(&harvesters),
        })
    }

    fn vault_state(&self, factory: &str, vault: &str) -> Result<VaultState, CallError> {
        let (
            _paused,
            _verified,
            _name,
            _description,
            _tokens,
            _share,
            balances,
            positions,
            tvl,
            share_price,
            ongoing_fees,
        ) = factory::functions::GetVaultState {
            vault: target(vault)?,
        }
        .call(target(factory)?)
        .ok_or_else(|| CallError::failed(factory, factory::functions::GetVaultState::NAME))?;

        let (ongoing_management_fees, ongoing_performance_fees) =
            split_ongoing_fees(ongoing_fees).ok_or_else(|| {
                CallError::failed(factory, factory::functions::GetVaultState::NAME)
            })?;

        Ok(VaultState {
            balances,
            positions,
            tvl,
            share_price,
            ongoing_management_fees,
            ongoing_performance_fees,
        })
    }

    fn vaults(&self, factory: &str) -> Result<Vec<String>, CallError> {
        let (vaults, _whitelisted_tokens) = factory::functions::GetFactoryState {}
            .call(target(factory)?)
            .ok_or_else(|| CallError::failed(factory, factory::functions::GetFactoryState::NAME))?;

        Ok(format_addresses(&vaults))
    }
}

impl VaultReader for RpcChain {
    fn tokens_length(&self, vault: &str) -> Result<u64, CallError> {
        let length = vault::functions::TokensLength {}
            .call(target(vault)?)
            .ok_or_else(|| CallError::failed(vault, vault::functions::TokensLength::NAME))?;

        checked_u64(&length)
            .ok_or_else(|| CallError::failed(vault, vault::functions::TokensLength::NAME))
    }

    fn token(&self, vault: &str, index: u64) -> Result<TokenData, CallError> {
        let (token, price_feed, precision, denominator) = vault::functions::Tokens {
            index: BigInt::from(index),
        }
        .call(target(vault)?)
        .ok_or_else(|| CallError::failed(vault, vault::functions::Tokens::NAME))?;

        Ok(TokenData {
            token: format_address(&token),
            price_feed: format_address(&price_feed),
            precision,
            denominator,
        })
    }

    fn config_props(&self, vault: &str) -> Result<ConfigProps, CallError> {
        let (paused, verified, name, description) = vault::functions::GetConfigProps {}
            .call(target(vault)?)
            .ok_or_else(|| CallError::failed(vault, vault::functions::GetConfigProps::NAME))?;

        Ok(ConfigProps {
            paused,
            verified,
            name,
            description,
        })
    }

    fn constant_props(&self, vault: &str) -> Result<ConstantProps, CallError> {
        let (factory, created_at, share) = vault::functions::GetConstantProps {}
            .call(target(vault)?)
            .ok_or_else(|| CallError::failed(vault, vault::functions::GetConstantProps::NAME))?;

        Ok(ConstantProps {
            factory: format_address(&factory),
            created_at,
            share: format_address(&share),
        })
    }

    fn fees_props(&self, vault: &str) -> Result<FeesProps, CallError> {
        let (
            beneficiary,
            exit_fees,
            management_fees_rate,
            management_fees_to_strategist,
            performance_fees_rate,
            performance_fees_to_strategist,
        ) = vault::functions::GetFeesProps {}
            .call(target(vault)?)
            .ok_or_else(|| CallError::failed(vault, vault::functions::GetFeesProps::NAME))?;

        Ok(FeesProps {
            beneficiary: format_address(&beneficiary),
            exit_fees,
            management_fees_rate,
            management_fees_to_strategist,
            performance_fees_rate,
            performance_fees_to_strategist,
        })
    }

    fn history_props(&self, vault: &str) -> Result<HistoryProps, CallError> {
        let (high_water_mark, prev_rebalance_signals, prev_swap, prev_mng_harvest) =
            vault::functions::GetHistoryProps {}
                .call(target(vault)?)
                .ok_or_else(|| CallError::failed(vault, vault::functions::GetHistoryProps::NAME))?;

        Ok(HistoryProps {
            high_water_mark,
            prev_rebalance_signals,
            prev_swap,
            prev_mng_harvest,
        })
    }

    fn security_props(&self, vault: &str) -> Result<SecurityProps, CallError> {
        let (
            max_aum,
            max_loss_swap,
            min_amount_deposit,
            max_amount_deposit,
            min_frequency_swap,
            min_security_time,
            min_harvest_threshold,
        ) = vault::functions::GetSecurityProps {}
            .call(target(vault)?)
            .ok_or_else(|| CallError::failed(vault, vault::functions::GetSecurityProps::NAME))?;

        Ok(SecurityProps {
            max_aum,
            max_loss_swap,
            min_amount_deposit,
            max_amount_deposit,
            min_frequency_swap,
            min_security_time,
            min_harvest_threshold,
        })
    }

    fn vault_status(&self, vault: &str) -> Result<VaultStatus, CallError> {
        let (positions, tvl, share_price) = vault::functions::GetVaultStatus {}
            .call(target(vault)?)
            .ok_or_else(|| CallError::failed(vault, vault::functions::GetVaultStatus::NAME))?;

        Ok(VaultStatus {
            positions,
            tvl,
            share_price,
        })
    }

    fn vault_balances(&self, vault: &str) -> Result<Vec<BigInt>, CallError> {
        vault::functions::GetVaultBalances {}
            .call(target(vault)?)
            .ok_or_else(|| CallError::failed(vault, vault::functions::GetVaultBalances::NAME))
    }

    fn latest_price(&self, vault: &str, price_feed: &str) -> Result<BigInt, CallError> {
        vault::functions::GetLatestPrice {
            price_feed: target(price_feed)?,
        }
        .call(target(vault)?)
        .ok_or_else(|| CallError::failed(vault, vault::functions::GetLatestPrice::NAME))
    }

    fn pending_management_fees(&self, vault: &str) -> Result<BigInt, CallError> {
        let (pending, _to_strategists) = vault::functions::GetManagementFees {}
            .call(target(vault)?)
            .ok_or_else(|| CallError::failed(vault, vault::functions::GetManagementFees::NAME))?;

        Ok(pending)
    }

    fn pending_performance_fees(&self, vault: &str) -> Result<BigInt, CallError> {
        let (pending, _to_strategists) = vault::functions::GetPerformanceFees {}
            .call(target(vault)?)
            .ok_or_else(|| CallError::failed(vault, vault::functions::GetPerformanceFees::NAME))?;

        Ok(pending)
    }
}
