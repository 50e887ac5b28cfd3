//! In-memory mirror of stations and slots
//!
//! Owned by the running driver; nothing else mutates it. Local changes are
//! applied only after the store confirmed the write.

use std::collections::HashMap;

use tracing::{info, warn};

use crate::config::CollectionIds;
use crate::domain::{DocumentStore, DomainResult, Slot, SlotChange, SlotStatus, Station};

/// Upper bound of stations fetched by [`SlotRegistry::load`]
pub const STATION_LOAD_LIMIT: usize = 100;
/// Upper bound of slots fetched by [`SlotRegistry::load`]
pub const SLOT_LOAD_LIMIT: usize = 1000;

#[derive(Debug, Default, Clone)]
pub struct SlotRegistry {
    stations: Vec<Station>,
    slots: Vec<Slot>,
    slot_index: HashMap<String, usize>,
}

impl SlotRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from already decoded records
    pub fn from_parts(stations: Vec<Station>, slots: Vec<Slot>) -> Self {
        let mut registry = Self {
            stations,
            slots,
            slot_index: HashMap::new(),
        };
        registry.reindex();
        registry
    }

    /// Replace the in-memory set with a fresh fetch from `store`.
    ///
    /// Documents that fail validation are skipped with a warning.
    pub async fn load(
        &mut self,
        store: &dyn DocumentStore,
        collections: &CollectionIds,
    ) -> DomainResult<()> {
        let station_docs = store
            .list(&collections.stations, None, Some(STATION_LOAD_LIMIT))
            .await?;
        let slot_docs = store
            .list(&collections.slots, None, Some(SLOT_LOAD_LIMIT))
            .await?;

        let stations: Vec<Station> = station_docs
            .iter()
            .filter_map(|doc| match Station::from_document(&collections.stations, doc) {
                Ok(station) => Some(station),
                Err(e) => {
                    warn!(error = %e, "Skipping station document");
                    None
                }
            })
            .collect();

        let mut slots: Vec<Slot> = slot_docs
            .iter()
            .filter_map(|doc| match Slot::from_document(&collections.slots, doc) {
                Ok(slot) => Some(slot),
                Err(e) => {
                    warn!(error = %e, "Skipping slot document");
                    None
                }
            })
            .collect();
        slots.sort_by(|a, b| {
            a.station_id
                .cmp(&b.station_id)
                .then(a.slot_index.cmp(&b.slot_index))
        });

        info!(
            stations = stations.len(),
            slots = slots.len(),
            "📦 Registry loaded"
        );

        self.stations = stations;
        self.slots = slots;
        self.reindex();
        Ok(())
    }

    fn reindex(&mut self) {
        self.slot_index = self
            .slots
            .iter()
            .enumerate()
            .map(|(i, slot)| (slot.id.clone(), i))
            .collect();
    }

    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn station(&self, id: &str) -> Option<&Station> {
        self.stations.iter().find(|s| s.id == id)
    }

    pub fn slot(&self, id: &str) -> Option<&Slot> {
        self.slot_index.get(id).map(|&i| &self.slots[i])
    }

    pub fn get_slots_by_station(&self, station_id: &str) -> Vec<&Slot> {
        self.slots
            .iter()
            .filter(|s| s.station_id == station_id)
            .collect()
    }

    pub fn get_by_status(&self, status: SlotStatus) -> Vec<&Slot> {
        self.slots.iter().filter(|s| s.status == status).collect()
    }

    /// Slots satisfying `predicate`, in registry order
    pub fn candidates(&self, predicate: impl Fn(&Slot) -> bool) -> Vec<&Slot> {
        self.slots.iter().filter(|s| predicate(s)).collect()
    }

    /// Count of `station_id`'s slots currently `available`
    pub fn available_count(&self, station_id: &str) -> u32 {
        self.slots
            .iter()
            .filter(|s| s.station_id == station_id && s.status == SlotStatus::Available)
            .count() as u32
    }

    /// Record a change the store has already accepted.
    ///
    /// Returns `false` if the slot is unknown.
    pub fn apply_local(&mut self, slot_id: &str, change: &SlotChange) -> bool {
        match self.slot_index.get(slot_id) {
            Some(&i) => {
                self.slots[i].apply(change);
                true
            }
            None => false,
        }
    }

    pub fn set_available_slots(&mut self, station_id: &str, available: u32) {
        if let Some(station) = self.stations.iter_mut().find(|s| s.id == station_id) {
            station.available_slots = available;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BatteryStatus, DocumentId, SlotKind, StationKind};
    use crate::infrastructure::InMemoryStore;
    use chrono::Utc;
    use serde_json::{json, Value};

    fn sample() -> SlotRegistry {
        SlotRegistry::from_parts(
            vec![Station::new("st1", "Hub", StationKind::Hybrid, 3)],
            vec![
                Slot::new("a", "st1", 1, SlotKind::ParkingSpace, SlotStatus::Available, None),
                Slot::new(
                    "b",
                    "st1",
                    2,
                    SlotKind::ChargingPad,
                    SlotStatus::Occupied,
                    Some(BatteryStatus::Charging),
                ),
                Slot::new("c", "st2", 1, SlotKind::ParkingSpace, SlotStatus::Available, None),
            ],
        )
    }

    #[test]
    fn queries_by_station_and_status() {
        let r = sample();
        assert_eq!(r.get_slots_by_station("st1").len(), 2);
        assert_eq!(r.get_by_status(SlotStatus::Available).len(), 2);
        assert_eq!(r.available_count("st1"), 1);
        assert!(r.slot("b").is_some());
        assert!(r.slot("zzz").is_none());
    }

    #[test]
    fn apply_local_updates_slot() {
        let mut r = sample();
        let change = r.slot("a").unwrap().change(SlotStatus::Occupied, None, Utc::now());
        assert!(r.apply_local("a", &change));
        assert_eq!(r.slot("a").unwrap().status, SlotStatus::Occupied);
        assert_eq!(r.available_count("st1"), 0);
        assert!(!r.apply_local("missing", &change));
    }

    #[tokio::test]
    async fn load_skips_invalid_documents() {
        let store = InMemoryStore::new();
        let collections = CollectionIds::default();
        let put = |value: Value| {
            let Value::Object(map) = value else { unreachable!() };
            map
        };
        store
            .create(
                "stations",
                DocumentId::Custom("st1".into()),
                put(json!({"name": "Hub", "type": "parking", "totalSlots": 2})),
            )
            .await
            .unwrap();
        store
            .create(
                "slots",
                DocumentId::Custom("s2".into()),
                put(json!({"stationId": "st1", "slotIndex": 2, "type": "parking_space", "status": "available"})),
            )
            .await
            .unwrap();
        store
            .create(
                "slots",
                DocumentId::Custom("s1".into()),
                put(json!({"stationId": "st1", "slotIndex": 1, "type": "parking_space", "status": "occupied"})),
            )
            .await
            .unwrap();
        store
            .create(
                "slots",
                DocumentId::Custom("bad".into()),
                put(json!({"stationId": "st1", "type": "parking_space", "status": "exploded"})),
            )
            .await
            .unwrap();

        let mut registry = SlotRegistry::new();
        registry.load(&store, &collections).await.unwrap();

        assert_eq!(registry.stations().len(), 1);
        let ids: Vec<_> = registry.slots().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["s1", "s2"]);
        assert_eq!(registry.slot("s2").unwrap().status, SlotStatus::Available);
    }

    async fn store_with(slot_ids: &[&str]) -> InMemoryStore {
        let store = InMemoryStore::new();
        let now = Utc::now();
        let station = Station::new("st1", "Hub", StationKind::Parking, slot_ids.len() as u32);
        store
            .create("stations", DocumentId::Custom("st1".into()), station.to_fields(now))
            .await
            .unwrap();
        for (i, id) in slot_ids.iter().enumerate() {
            let slot = Slot::new(*id, "st1", i as u32 + 1, SlotKind::ParkingSpace, SlotStatus::Available, None);
            store
                .create("slots", DocumentId::Custom(slot.id.clone()), slot.to_fields(now))
                .await
                .unwrap();
        }
        store
    }

    #[tokio::test]
    async fn reload_replaces_previous_contents() {
        let collections = CollectionIds::default();
        let mut registry = sample();

        registry.load(&store_with(&["s1", "s2", "s3"]).await, &collections).await.unwrap();
        assert_eq!(registry.slots().len(), 3);
        assert!(registry.slot("a").is_none());
        assert!(registry.station("st1").is_some());

        // s2 and s3 were removed from the store in the meantime
        registry.load(&store_with(&["s1"]).await, &collections).await.unwrap();
        let ids: Vec<_> = registry.slots().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["s1"]);
        assert!(registry.slot("s2").is_none());
        assert!(registry.slot("s3").is_none());
        assert_eq!(registry.get_slots_by_station("st1").len(), 1);
        assert_eq!(registry.available_count("st1"), 1);
    }
}
