// ─────────────────────────────────────────────────────────────────────────────
// Contract bindings generated by build.rs from abi/*.json
// ─────────────────────────────────────────────────────────────────────────────

#[allow(clippy::all, dead_code, unused_imports, unused_variables)]
pub mod factory {
    include!(concat!(env!("OUT_DIR"), "/factory.rs"));
}

#[allow(clippy::all, dead_code, unused_imports, unused_variables)]
pub mod vault {
    include!(concat!(env!("OUT_DIR"), "/vault.rs"));
}
