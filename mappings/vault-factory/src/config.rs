// ─────────────────────────────────────────────────────────────────────────────
// Module params
// ─────────────────────────────────────────────────────────────────────────────

use crate::constants::{ADDRESS_ZERO, FACTORY_ADDRESS, SNAPSHOT_TIMEFRAME};
use crate::error::{MappingError, MappingResult};
use serde::Deserialize;
use vault_common::{decode_address, normalize_address};

/// Raw params as they appear in the substreams manifest, e.g.
/// `factory=0xc04e...&snapshot_timeframe=3600&refresh_vaults_on_snapshot=true`
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct StringParams {
    factory: Option<String>,
    snapshot_timeframe: Option<u64>,
    refresh_vaults_on_snapshot: Option<bool>,
    throttle: Option<ThrottlePolicy>,
}

/// When the periodic snapshot pass is due
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThrottlePolicy {
    /// Strictly more than `snapshot_timeframe` seconds since the last pass.
    #[default]
    Elapsed,
    /// The block falls in a later `snapshot_timeframe` window than the last
    /// pass. Windows are `timestamp / snapshot_timeframe`.
    Window,
}

impl ThrottlePolicy {
    pub fn is_due(self, last: u64, now: u64, timeframe: u64) -> bool {
        match self {
            ThrottlePolicy::Elapsed => now.saturating_sub(last) > timeframe,
            ThrottlePolicy::Window => now / timeframe > last / timeframe,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingConfig {
    /// Lowercase factory address, also the Factory entity id
    pub factory: String,
    /// Raw factory address bytes, matched against log emitters
    pub factory_bytes: Vec<u8>,
    /// Seconds that must elapse before the next periodic snapshot pass
    pub snapshot_timeframe: u64,
    /// Re-synchronise every known vault during a periodic snapshot pass
    pub refresh_vaults_on_snapshot: bool,
    pub throttle: ThrottlePolicy,
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            factory: FACTORY_ADDRESS.to_string(),
            factory_bytes: crate::constants::FACTORY_ADDRESS_BYTES.to_vec(),
            snapshot_timeframe: SNAPSHOT_TIMEFRAME,
            refresh_vaults_on_snapshot: false,
            throttle: ThrottlePolicy::Elapsed,
        }
    }
}

impl MappingConfig {
    pub fn parse(input: &str) -> MappingResult<Self> {
        let params: StringParams = serde_qs::from_str(input.trim())
            .map_err(|e| MappingError::Config(format!("failed to parse params: {e}")))?;

        let mut config = Self::default();

        if let Some(factory) = params.factory {
            let factory = normalize_address(&factory);
            if factory == ADDRESS_ZERO {
                return Err(MappingError::Config("factory cannot be the zero address".into()));
            }
            config.factory_bytes = decode_address(&factory).ok_or_else(|| {
                MappingError::Config(format!("factory must be a 20 byte address, got `{factory}`"))
            })?;
            config.factory = factory;
        }
        if let Some(timeframe) = params.snapshot_timeframe {
            if timeframe == 0 {
                return Err(MappingError::Config("snapshot_timeframe must be positive".into()));
            }
            config.snapshot_timeframe = timeframe;
        }
        if let Some(refresh) = params.refresh_vaults_on_snapshot {
            config.refresh_vaults_on_snapshot = refresh;
        }
        if let Some(throttle) = params.throttle {
            config.throttle = throttle;
        }

        Ok(config)
    }
}
