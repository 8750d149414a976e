// ─────────────────────────────────────────────────────────────────────────────
// Constants and configuration defaults for the vault factory mappings
// ─────────────────────────────────────────────────────────────────────────────

use substreams::scalar::BigInt;

/// Vault factory contract address on Polygon (lowercase, entity id of the Factory)
pub const FACTORY_ADDRESS: &str = "0xc04ed88c05fcde0f94305598eb14f1624b091a5c";

/// Raw bytes of [`FACTORY_ADDRESS`], for log filtering
pub const FACTORY_ADDRESS_BYTES: [u8; 20] =
    hex_literal::hex!("c04ed88c05fcde0f94305598eb14f1624b091a5c");

pub const ADDRESS_ZERO: &str = "0x0000000000000000000000000000000000000000";

/// Entity id of the LastSnapshotTimestamp singleton
pub const LAST_SNAPSHOT_TIMESTAMP_ID: &str = "last-snapshot-timestamp";

/// Minimum time between two periodic snapshot passes, in seconds (1 hour)
pub const SNAPSHOT_TIMEFRAME: u64 = 3600;

#[inline]
pub fn zero_bi() -> BigInt {
    BigInt::zero()
}
