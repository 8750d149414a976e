// ─────────────────────────────────────────────────────────────────────────────
// First block of every snapshot window
// ─────────────────────────────────────────────────────────────────────────────

use super::window_key;
use crate::pb::vaults::v1::{FactoryEvents, SnapshotWindow};
use substreams::store::{StoreNew, StoreSetIfNotExists, StoreSetIfNotExistsProto};

/// Store handler that keeps the first block of each snapshot window.
///
/// Under the window throttle, a snapshot pass can only run on such a block.
#[substreams::handlers::store]
pub fn store_snapshot_windows(
    events: FactoryEvents,
    store: StoreSetIfNotExistsProto<SnapshotWindow>,
) {
    store.set_if_not_exists(
        0,
        window_key(events.snapshot_window),
        &SnapshotWindow {
            window: events.snapshot_window,
            block_number: events.block_number,
            timestamp: events.block_timestamp,
        },
    );
}
