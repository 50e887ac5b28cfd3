//! Shared plumbing for every driver
//!
//! Owns the registry, the store handle, the clock and the random source,
//! and implements the write path: remote update first, local apply on
//! success, then the aggregate update when availability may have changed.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use super::aggregate::AggregateUpdater;
use super::policy::{self, Transition, TransitionContext};
use super::registry::SlotRegistry;
use crate::config::CollectionIds;
use crate::domain::{
    BatteryStatus, DocumentStore, DomainError, DomainResult, Slot, SlotChange, SlotStatus,
};
use crate::support::random::RandomSource;
use crate::support::time::Clock;

/// A slot change the store accepted
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedChange {
    pub slot_id: String,
    pub station_id: String,
    pub slot_index: u32,
    pub from: SlotStatus,
    pub to: SlotStatus,
    pub battery: Option<BatteryStatus>,
    /// New station count when the aggregate was refreshed
    pub available_slots: Option<u32>,
}

pub struct SimulationContext {
    registry: SlotRegistry,
    store: Arc<dyn DocumentStore>,
    collections: CollectionIds,
    aggregates: AggregateUpdater,
    clock: Arc<dyn Clock>,
    rng: Box<dyn RandomSource>,
}

impl SimulationContext {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        collections: CollectionIds,
        clock: Arc<dyn Clock>,
        rng: Box<dyn RandomSource>,
    ) -> Self {
        let aggregates = AggregateUpdater::new(store.clone(), collections.clone(), clock.clone());
        Self {
            registry: SlotRegistry::new(),
            store,
            collections,
            aggregates,
            clock,
            rng,
        }
    }

    /// Use an already populated registry instead of loading one
    pub fn with_registry(mut self, registry: SlotRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Fetch the initial data set; an empty slot set is fatal
    pub async fn load(&mut self) -> DomainResult<()> {
        self.registry
            .load(self.store.as_ref(), &self.collections)
            .await?;
        if self.registry.is_empty() {
            return Err(DomainError::MissingData(format!(
                "collection '{}' has no slots, run `seed` first",
                self.collections.slots
            )));
        }
        Ok(())
    }

    pub fn registry(&self) -> &SlotRegistry {
        &self.registry
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    pub fn collections(&self) -> &CollectionIds {
        &self.collections
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now_utc()
    }

    pub fn roll(&mut self, p: f64) -> bool {
        self.rng.roll(p)
    }

    /// Uniform pause in `[low, high]` time units
    pub fn pause(&mut self, low: f64, high: f64, unit: Duration) -> Duration {
        unit.mul_f64(self.rng.uniform(low, high))
    }

    /// Uniformly pick one slot matching `predicate`
    pub fn pick_slot(&mut self, predicate: impl Fn(&Slot) -> bool) -> Option<Slot> {
        let candidates = self.registry.candidates(predicate);
        if candidates.is_empty() {
            return None;
        }
        let i = self.rng.index(candidates.len());
        Some(candidates[i].clone())
    }

    fn known_slot(&self, slot_id: &str) -> DomainResult<Slot> {
        self.registry
            .slot(slot_id)
            .cloned()
            .ok_or_else(|| DomainError::not_found(&self.collections.slots, slot_id))
    }

    /// Move a slot along one edge: `target` if given, otherwise a random edge
    pub async fn transition(
        &mut self,
        slot_id: &str,
        target: Option<SlotStatus>,
    ) -> DomainResult<AppliedChange> {
        let slot = self.known_slot(slot_id)?;
        let context = match target {
            Some(to) => TransitionContext::Target(to),
            None => TransitionContext::Random(self.rng.as_mut()),
        };
        let decided = policy::decide_for(&slot, context)?;
        let change = slot.change(decided.to, decided.battery, self.now());
        self.commit(&slot, change).await
    }

    /// Toggle the battery of an occupied charging pad
    pub async fn swap_battery(&mut self, slot_id: &str) -> DomainResult<AppliedChange> {
        let slot = self.known_slot(slot_id)?;
        let battery = policy::battery_swap(&slot).ok_or_else(|| {
            DomainError::NoCandidates(format!("slot {slot_id} is not an occupied charging pad"))
        })?;
        let change = slot.change(slot.status, Some(battery), self.now());
        self.commit(&slot, change).await
    }

    /// Write `change` for `slot` remotely, then locally, then settle the
    /// station aggregate if the available count may have moved.
    pub async fn commit(&mut self, slot: &Slot, change: SlotChange) -> DomainResult<AppliedChange> {
        self.store
            .update(&self.collections.slots, &slot.id, change.to_fields())
            .await?;
        self.registry.apply_local(&slot.id, &change);

        let mut applied = AppliedChange {
            slot_id: slot.id.clone(),
            station_id: slot.station_id.clone(),
            slot_index: slot.slot_index,
            from: slot.status,
            to: change.status,
            battery: change.battery_status,
            available_slots: None,
        };

        info!(
            slot_id = %applied.slot_id,
            station_id = %applied.station_id,
            from = %applied.from,
            to = %applied.to,
            battery = applied.battery.map(|b| b.as_str()).unwrap_or("-"),
            "🔄 Slot updated"
        );

        let transition = Transition {
            from: applied.from,
            to: applied.to,
            battery: applied.battery,
        };
        if transition.affects_availability() {
            let outcome = self
                .aggregates
                .recompute(&mut self.registry, &slot.station_id)
                .await;
            match outcome {
                Ok(count) => applied.available_slots = Some(count),
                Err(e) => warn!(
                    station_id = %applied.station_id,
                    error = %e,
                    "Station availability left stale"
                ),
            }
        }

        Ok(applied)
    }
}

/// Log a per-iteration error the way every driver does
pub(crate) fn report(action: &str, error: &DomainError) {
    match error {
        DomainError::NoCandidates(reason) => {
            tracing::debug!(action, reason = %reason, "Nothing to do")
        }
        DomainError::NotFound { .. } => warn!(action, error = %error, "Skipping vanished document"),
        _ => warn!(action, error = %error, "Slot update failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{SlotKind, Station, StationKind};
    use crate::infrastructure::InMemoryStore;
    use crate::support::random::ScriptedRandom;
    use crate::domain::DocumentId;
    use crate::support::time::SystemClock;

    async fn context_with(slots: Vec<Slot>) -> (Arc<InMemoryStore>, SimulationContext) {
        let store = Arc::new(InMemoryStore::new());
        let now = Utc::now();
        let station = Station::new("st1", "Hub", StationKind::Hybrid, slots.len() as u32);
        store
            .create("stations", DocumentId::Custom("st1".into()), station.to_fields(now))
            .await
            .unwrap();
        for slot in &slots {
            store
                .create("slots", DocumentId::Custom(slot.id.clone()), slot.to_fields(now))
                .await
                .unwrap();
        }
        let mut ctx = SimulationContext::new(
            store.clone(),
            CollectionIds::default(),
            Arc::new(SystemClock),
            Box::new(ScriptedRandom::new()),
        );
        ctx.load().await.unwrap();
        (store, ctx)
    }

    #[tokio::test]
    async fn load_without_slots_is_missing_data() {
        let store: Arc<dyn DocumentStore> = Arc::new(InMemoryStore::new());
        let mut ctx = SimulationContext::new(
            store,
            CollectionIds::default(),
            Arc::new(SystemClock),
            Box::new(ScriptedRandom::new()),
        );
        assert!(matches!(ctx.load().await, Err(DomainError::MissingData(_))));
    }

    #[tokio::test]
    async fn transition_updates_store_registry_and_aggregate() {
        let (store, mut ctx) = context_with(vec![Slot::new(
            "s1",
            "st1",
            1,
            SlotKind::ChargingPad,
            SlotStatus::Available,
            Some(BatteryStatus::Charged),
        )])
        .await;

        let applied = ctx.transition("s1", Some(SlotStatus::Occupied)).await.unwrap();
        assert_eq!(applied.battery, Some(BatteryStatus::Charging));
        assert_eq!(applied.available_slots, Some(0));

        let doc = store.get("slots", "s1").await.unwrap();
        assert_eq!(doc.get_str("status"), Some("occupied"));
        assert_eq!(ctx.registry().slot("s1").unwrap().status, SlotStatus::Occupied);
        let station = store.get("stations", "st1").await.unwrap();
        assert_eq!(station.fields["availableSlots"], serde_json::json!(0));
    }

    #[tokio::test]
    async fn reserved_to_occupied_skips_aggregate() {
        let (_store, mut ctx) = context_with(vec![Slot::new(
            "s1",
            "st1",
            1,
            SlotKind::ParkingSpace,
            SlotStatus::Reserved,
            None,
        )])
        .await;
        let applied = ctx.transition("s1", Some(SlotStatus::Occupied)).await.unwrap();
        assert_eq!(applied.available_slots, None);
    }

    #[tokio::test]
    async fn unknown_slot_is_not_found() {
        let (_store, mut ctx) = context_with(vec![Slot::new(
            "s1",
            "st1",
            1,
            SlotKind::ParkingSpace,
            SlotStatus::Available,
            None,
        )])
        .await;
        let err = ctx.transition("nope", None).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }

    #[tokio::test]
    async fn swap_on_parking_space_has_no_candidate() {
        let (_store, mut ctx) = context_with(vec![Slot::new(
            "s1",
            "st1",
            1,
            SlotKind::ParkingSpace,
            SlotStatus::Occupied,
            None,
        )])
        .await;
        let err = ctx.swap_battery("s1").await.unwrap_err();
        assert!(matches!(err, DomainError::NoCandidates(_)));
    }

    #[tokio::test]
    async fn transition_into_available_clears_reservation() {
        let mut slot = Slot::new("s1", "st1", 1, SlotKind::ParkingSpace, SlotStatus::Reserved, None);
        slot.reservation = Some(crate::domain::Reservation {
            user_id: "u1".into(),
            until: Utc::now(),
        });
        let (store, mut ctx) = context_with(vec![slot]).await;

        ctx.transition("s1", Some(SlotStatus::Available)).await.unwrap();
        assert!(ctx.registry().slot("s1").unwrap().reservation.is_none());
        let doc = store.get("slots", "s1").await.unwrap();
        assert_eq!(doc.fields["reservedByUserId"], serde_json::Value::Null);
    }
}
