//! Station availability aggregate
//!
//! The only writer of `Station.availableSlots`. The count is always derived
//! from slot statuses, either from the registry or from a fresh store query.

use std::sync::Arc;

use tracing::debug;

use super::registry::{SlotRegistry, SLOT_LOAD_LIMIT};
use crate::config::CollectionIds;
use crate::domain::{DocumentStore, DomainResult, Filter, Slot, SlotStatus, Station};
use crate::support::time::Clock;

pub struct AggregateUpdater {
    store: Arc<dyn DocumentStore>,
    collections: CollectionIds,
    clock: Arc<dyn Clock>,
}

impl AggregateUpdater {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        collections: CollectionIds,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            collections,
            clock,
        }
    }

    /// Recount from the registry, write the result, mirror it locally
    pub async fn recompute(&self, registry: &mut SlotRegistry, station_id: &str) -> DomainResult<u32> {
        let available = registry.available_count(station_id);
        self.write(station_id, available).await?;
        registry.set_available_slots(station_id, available);
        Ok(available)
    }

    /// Recount from the store, for when the registry may be stale.
    ///
    /// Reads at most as many slots as [`SlotRegistry::load`] does.
    pub async fn recompute_from_store(&self, station_id: &str) -> DomainResult<u32> {
        let filter = Filter::equal("stationId", station_id);
        let docs = self
            .store
            .list(&self.collections.slots, Some(&filter), Some(SLOT_LOAD_LIMIT))
            .await?;

        let mut available = 0;
        for doc in &docs {
            match Slot::from_document(&self.collections.slots, doc) {
                Ok(slot) if slot.status == SlotStatus::Available => available += 1,
                Ok(_) => {}
                Err(e) => debug!(error = %e, "Ignoring undecodable slot in recount"),
            }
        }

        self.write(station_id, available).await?;
        Ok(available)
    }

    async fn write(&self, station_id: &str, available: u32) -> DomainResult<()> {
        self.store
            .update(
                &self.collections.stations,
                station_id,
                Station::availability_fields(available, self.clock.now_utc()),
            )
            .await?;
        debug!(station_id, available, "Station availability updated");
        Ok(())
    }
}
