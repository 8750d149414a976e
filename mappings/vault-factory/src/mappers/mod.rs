// ─────────────────────────────────────────────────────────────────────────────
// Map handlers module
// ─────────────────────────────────────────────────────────────────────────────

pub mod factory_changes;
pub mod graph_out;

pub use factory_changes::map_factory_changes;
pub use graph_out::graph_out;
