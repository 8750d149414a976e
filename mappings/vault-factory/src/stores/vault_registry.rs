// ─────────────────────────────────────────────────────────────────────────────
// Vault registrations and the running vault count
// ─────────────────────────────────────────────────────────────────────────────

use super::{vault_key, BOOTSTRAP_KEY, VAULT_COUNT_KEY};
use crate::pb::vaults::v1::factory_event::Type;
use crate::pb::vaults::v1::{FactoryEvents, VaultRegistration};
use substreams::store::{
    StoreAdd, StoreAddInt64, StoreNew, StoreSetIfNotExists, StoreSetIfNotExistsProto,
};
use vault_common::normalize_address;

/// Registrations of this block's `VaultCreated` events, in log order
pub fn registrations(events: &FactoryEvents) -> Vec<VaultRegistration> {
    events
        .events
        .iter()
        .filter_map(|event| match &event.r#type {
            Some(Type::VaultCreated(created)) => Some(VaultRegistration {
                vault: normalize_address(&created.vault),
                creator: event.tx_from.clone(),
                block_number: events.block_number,
                timestamp: events.block_timestamp,
                log_index: event.log_index,
            }),
            _ => None,
        })
        .collect()
}

/// Store handler that remembers where every vault was created.
///
/// The first registration is also kept under [`BOOTSTRAP_KEY`]: it is the
/// event that bootstraps the Factory.
#[substreams::handlers::store]
pub fn store_vault_registry(
    events: FactoryEvents,
    store: StoreSetIfNotExistsProto<VaultRegistration>,
) {
    for registration in registrations(&events) {
        let ordinal = registration.log_index as u64;
        store.set_if_not_exists(ordinal, BOOTSTRAP_KEY, &registration);
        store.set_if_not_exists(ordinal, vault_key(&registration.vault), &registration);
    }
}

/// Store handler that counts `VaultCreated` events
#[substreams::handlers::store]
pub fn store_vault_count(events: FactoryEvents, store: StoreAddInt64) {
    for registration in registrations(&events) {
        store.add(registration.log_index as u64, VAULT_COUNT_KEY, 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pb::vaults::v1::{FactoryEvent, SwapAdapterChanged, VaultCreated};
    use crate::testing::addr;

    #[test]
    fn registrations_follow_vault_creations_only() {
        let events = FactoryEvents {
            block_number: 7,
            block_timestamp: 70,
            snapshot_window: 0,
            events: vec![
                FactoryEvent {
                    tx_from: addr(0x99),
                    log_index: 2,
                    r#type: Some(Type::SwapAdapterChanged(SwapAdapterChanged {
                        new_swap_adapter: addr(0x51),
                    })),
                    ..Default::default()
                },
                FactoryEvent {
                    tx_from: addr(0x98),
                    log_index: 5,
                    r#type: Some(Type::VaultCreated(VaultCreated {
                        vault: "0xABCDEFABCDEFABCDEFABCDEFABCDEFABCDEFABCD".into(),
                        creator: addr(0x01),
                    })),
                    ..Default::default()
                },
            ],
        };

        let registrations = registrations(&events);
        assert_eq!(registrations.len(), 1);
        assert_eq!(registrations[0].vault, "0xabcdefabcdefabcdefabcdefabcdefabcdefabcd");
        // The transaction sender, as on the Vault record
        assert_eq!(registrations[0].creator, addr(0x98));
        assert_eq!(registrations[0].block_number, 7);
        assert_eq!(registrations[0].timestamp, 70);
        assert_eq!(registrations[0].log_index, 5);
    }
}
