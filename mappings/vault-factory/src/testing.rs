//! In-memory chain fixtures for handler tests.

use crate::error::CallError;
use crate::ports::{
    ConfigProps, ConstantProps, FactoryManagers, FactoryReader, FeesProps, HistoryProps,
    SecurityProps, TokenData, VaultReader, VaultRoles, VaultState, VaultStatus,
};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use substreams::scalar::BigInt;

pub fn addr(byte: u8) -> String {
    format!("0x{}", format!("{byte:02x}").repeat(20))
}

fn bi(value: u64) -> BigInt {
    BigInt::from(value)
}

#[derive(Debug, Clone)]
pub struct FakeVault {
    pub tokens: Vec<TokenData>,
    pub prices: HashMap<String, BigInt>,
    pub roles: VaultRoles,
    pub config: ConfigProps,
    pub constants: ConstantProps,
    pub fees: FeesProps,
    pub history: HistoryProps,
    pub security: SecurityProps,
    pub state: VaultState,
    pub status: VaultStatus,
    pub balances: Vec<BigInt>,
    pub pending_management_fees: BigInt,
    pub pending_performance_fees: BigInt,
}

impl FakeVault {
    /// A two-token vault whose numbers are derived from `seed`
    pub fn sample(seed: u64) -> Self {
        let usdc = TokenData {
            token: addr(0xa1),
            price_feed: addr(0xf1),
            precision: bi(8),
            denominator: bi(1_000_000),
        };
        let weth = TokenData {
            token: addr(0xa2),
            price_feed: addr(0xf2),
            precision: bi(8),
            denominator: bi(1_000_000_000_000_000_000),
        };
        let prices = HashMap::from([
            (usdc.price_feed.clone(), bi(100_000_000)),
            (weth.price_feed.clone(), bi(300_000_000_000 + seed)),
        ]);

        Self {
            tokens: vec![usdc, weth],
            prices,
            roles: VaultRoles {
                admins: vec![addr(0xd1)],
                strategists: vec![addr(0xd2), addr(0xd3)],
                harvesters: vec![addr(0xd4)],
            },
            config: ConfigProps {
                paused: false,
                verified: true,
                name: format!("Vault {seed}"),
                description: "Balanced ETH/USDC".into(),
            },
            constants: ConstantProps {
                factory: addr(0xc0),
                created_at: bi(1_650_000_000),
                share: addr(0x5e),
            },
            fees: FeesProps {
                beneficiary: addr(0xbe),
                exit_fees: bi(50),
                management_fees_rate: bi(200),
                management_fees_to_strategist: bi(5000),
                performance_fees_rate: bi(2000),
                performance_fees_to_strategist: bi(5000),
            },
            history: HistoryProps {
                high_water_mark: bi(1_000_000),
                prev_rebalance_signals: vec![bi(6000), bi(4000)],
                prev_swap: bi(1_650_000_100),
                prev_mng_harvest: bi(1_650_000_200),
            },
            security: SecurityProps {
                max_aum: bi(10_000_000),
                max_loss_swap: bi(100),
                min_amount_deposit: bi(1),
                max_amount_deposit: bi(1_000_000),
                min_frequency_swap: bi(3600),
                min_security_time: bi(60),
                min_harvest_threshold: bi(1000),
            },
            state: VaultState {
                balances: vec![bi(500 + seed), bi(2)],
                positions: vec![bi(6000), bi(4000)],
                tvl: bi(1_100 + seed),
                share_price: bi(1_010_000),
                ongoing_management_fees: bi(7),
                ongoing_performance_fees: bi(9),
            },
            status: VaultStatus {
                positions: vec![bi(6000), bi(4000)],
                tvl: bi(1_100 + seed),
                share_price: bi(1_010_000),
            },
            balances: vec![bi(500 + seed), bi(2)],
            pending_management_fees: bi(11),
            pending_performance_fees: bi(13),
        }
    }
}

/// Chain double backed by fixtures. Counts every call and can be told to
/// fail a given method.
#[derive(Debug, Default)]
pub struct FakeChain {
    pub whitelist: RefCell<Vec<String>>,
    pub managers: FactoryManagers,
    pub vaults: RefCell<Vec<(String, FakeVault)>>,
    pub failing_method: Option<&'static str>,
    calls: Cell<usize>,
}

impl FakeChain {
    pub fn new() -> Self {
        Self {
            whitelist: RefCell::new(vec![addr(0xa1), addr(0xa2)]),
            managers: FactoryManagers {
                fees_manager: addr(0xe1),
                access_manager: addr(0xe2),
                harvester: addr(0xe3),
                swap_router: addr(0xe4),
                swap_proxy: addr(0xe5),
                swap_adapter: addr(0xe6),
            },
            ..Default::default()
        }
    }

    /// Make every call to `method` fail
    pub fn failing_on(mut self, method: &'static str) -> Self {
        self.failing_method = Some(method);
        self
    }

    /// Deploy a vault on the fake chain
    pub fn deploy(&self, address: &str, vault: FakeVault) {
        self.vaults.borrow_mut().push((address.to_string(), vault));
    }

    pub fn set_whitelist(&self, tokens: Vec<String>) {
        *self.whitelist.borrow_mut() = tokens;
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }

    fn record(&self, contract: &str, method: &'static str) -> Result<(), CallError> {
        self.calls.set(self.calls.get() + 1);
        match self.failing_method {
            Some(failing) if failing == method => Err(CallError::failed(contract, method)),
            _ => Ok(()),
        }
    }

    fn vault<T>(
        &self,
        address: &str,
        method: &'static str,
        read: impl FnOnce(&FakeVault) -> T,
    ) -> Result<T, CallError> {
        self.record(address, method)?;
        self.vaults
            .borrow()
            .iter()
            .find(|(deployed, _)| deployed == address)
            .map(|(_, vault)| read(vault))
            .ok_or_else(|| CallError::failed(address, method))
    }
}

impl FactoryReader for FakeChain {
    fn whitelisted_tokens(&self, factory: &str) -> Result<Vec<String>, CallError> {
        self.record(factory, "getWhitelistedTokens")?;
        Ok(self.whitelist.borrow().clone())
    }

    fn managers(&self, factory: &str) -> Result<FactoryManagers, CallError> {
        self.record(factory, "managers")?;
        Ok(self.managers.clone())
    }

    fn roles_per_vault(&self, _factory: &str, vault: &str) -> Result<VaultRoles, CallError> {
        self.vault(vault, "getRolesPerVault", |v| v.roles.clone())
    }

    fn vault_state(&self, _factory: &str, vault: &str) -> Result<VaultState, CallError> {
        self.vault(vault, "getVaultState", |v| v.state.clone())
    }

    fn vaults(&self, factory: &str) -> Result<Vec<String>, CallError> {
        self.record(factory, "getFactoryState")?;
        Ok(self
            .vaults
            .borrow()
            .iter()
            .map(|(address, _)| address.clone())
            .collect())
    }
}

impl VaultReader for FakeChain {
    fn tokens_length(&self, vault: &str) -> Result<u64, CallError> {
        self.vault(vault, "tokensLength", |v| v.tokens.len() as u64)
    }

    fn token(&self, vault: &str, index: u64) -> Result<TokenData, CallError> {
        self.vault(vault, "tokens", |v| v.tokens.get(index as usize).cloned())?
            .ok_or_else(|| CallError::failed(vault, "tokens"))
    }

    fn config_props(&self, vault: &str) -> Result<ConfigProps, CallError> {
        self.vault(vault, "getConfigProps", |v| v.config.clone())
    }

    fn constant_props(&self, vault: &str) -> Result<ConstantProps, CallError> {
        self.vault(vault, "getConstantProps", |v| v.constants.clone())
    }

    fn fees_props(&self, vault: &str) -> Result<FeesProps, CallError> {
        self.vault(vault, "getFeesProps", |v| v.fees.clone())
    }

    fn history_props(&self, vault: &str) -> Result<HistoryProps, CallError> {
        self.vault(vault, "getHistoryProps", |v| v.history.clone())
    }

    fn security_props(&self, vault: &str) -> Result<SecurityProps, CallError> {
        self.vault(vault, "getSecurityProps", |v| v.security.clone())
    }

    fn vault_status(&self, vault: &str) -> Result<VaultStatus, CallError> {
        self.vault(vault, "getVaultStatus", |v| v.status.clone())
    }

    fn vault_balances(&self, vault: &str) -> Result<Vec<BigInt>, CallError> {
        self.vault(vault, "getVaultBalances", |v| v.balances.clone())
    }

    fn latest_price(&self, vault: &str, price_feed: &str) -> Result<BigInt, CallError> {
        self.vault(vault, "getLatestPrice", |v| v.prices.get(price_feed).cloned())?
            .ok_or_else(|| CallError::failed(vault, "getLatestPrice"))
    }

    fn pending_management_fees(&self, vault: &str) -> Result<BigInt, CallError> {
        self.vault(vault, "getManagementFees", |v| v.pending_management_fees.clone())
    }

    fn pending_performance_fees(&self, vault: &str) -> Result<BigInt, CallError> {
        self.vault(vault, "getPerformanceFees", |v| v.pending_performance_fees.clone())
    }
}
