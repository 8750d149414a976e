// ─────────────────────────────────────────────────────────────────────────────
// Store handlers module
// ─────────────────────────────────────────────────────────────────────────────

pub mod factory_fields;
pub mod snapshot_windows;
pub mod vault_registry;

pub use factory_fields::store_factory_fields;
pub use snapshot_windows::store_snapshot_windows;
pub use vault_registry::{store_vault_count, store_vault_registry};

/// Registry key of the first vault ever created
pub const BOOTSTRAP_KEY: &str = "bootstrap";

/// Vault count store key
pub const VAULT_COUNT_KEY: &str = "vault_count";

pub fn vault_key(vault: &str) -> String {
    format!("vault:{vault}")
}

pub fn window_key(window: u64) -> String {
    format!("window:{window}")
}
