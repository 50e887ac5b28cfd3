//! Booking lifecycle on top of the simulation write path
//!
//! A booking holds one slot: `reserve` puts the slot on hold for a user,
//! `occupy` starts the stay, `complete` or `cancel` releases the slot.

use std::time::Duration;

use chrono::Duration as ChronoDuration;
use tracing::{info, warn};

use crate::application::simulation::policy::{self, TransitionContext};
use crate::application::simulation::{AppliedChange, SimulationContext};
use crate::domain::{Booking, DocumentId, DomainError, DomainResult, Reservation, SlotStatus};

/// How long a reservation holds the slot
pub const RESERVATION_HOLD_MINUTES: i64 = 15;

/// Booked duration for flows started from the CLI
pub const DEFAULT_DURATION_HOURS: u32 = 1;

/// Fallback user when the store has no users
pub const DEMO_USER_ID: &str = "demo_user_1";

/// A booking created by [`BookingFlow::reserve`]
#[derive(Debug, Clone, PartialEq)]
pub struct BookingHandle {
    pub booking: Booking,
}

impl BookingHandle {
    pub fn booking_id(&self) -> &str {
        &self.booking.id
    }

    pub fn slot_id(&self) -> &str {
        &self.booking.slot_id
    }
}

pub struct BookingFlow {
    ctx: SimulationContext,
}

impl BookingFlow {
    pub fn new(ctx: SimulationContext) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &SimulationContext {
        &self.ctx
    }

    /// First user in the store, or the demo fallback
    pub async fn default_user(&self) -> String {
        match self
            .ctx
            .store()
            .list(&self.ctx.collections().users, None, Some(1))
            .await
        {
            Ok(users) => users
                .into_iter()
                .next()
                .map(|doc| doc.id)
                .unwrap_or_else(|| DEMO_USER_ID.to_string()),
            Err(e) => {
                warn!(error = %e, "Could not list users");
                DEMO_USER_ID.to_string()
            }
        }
    }

    /// Hold a random available slot for `user_id`
    pub async fn reserve(&mut self, user_id: &str) -> DomainResult<BookingHandle> {
        let slot = self
            .ctx
            .pick_slot(|s| s.status == SlotStatus::Available)
            .ok_or_else(|| DomainError::NoCandidates("no available slot to reserve".into()))?;
        let price = self
            .ctx
            .registry()
            .station(&slot.station_id)
            .map(|s| s.price_per_hour)
            .unwrap_or_default();

        let now = self.ctx.now();
        let mut booking = Booking::new(
            user_id,
            slot.station_id.clone(),
            slot.id.clone(),
            price,
            DEFAULT_DURATION_HOURS,
            now,
        );
        let doc = self
            .ctx
            .store()
            .create(&self.ctx.collections().bookings, DocumentId::Unique, booking.to_fields())
            .await?;
        booking.id = doc.id;

        let decided = policy::decide_for(&slot, TransitionContext::Target(SlotStatus::Reserved))?;
        let change = slot
            .change(decided.to, decided.battery, now)
            .with_reservation(Some(Reservation {
                user_id: user_id.to_string(),
                until: now + ChronoDuration::minutes(RESERVATION_HOLD_MINUTES),
            }));

        if let Err(e) = self.ctx.commit(&slot, change).await {
            booking.cancel("slot could not be reserved", self.ctx.now());
            self.write_status(&booking).await;
            return Err(e);
        }

        info!(
            booking_id = %booking.id,
            user_id,
            slot_id = %slot.id,
            station_id = %slot.station_id,
            total_price = booking.total_price,
            "🎫 Slot reserved"
        );
        Ok(BookingHandle { booking })
    }

    /// The holder arrives: `reserved -> occupied`
    pub async fn occupy(&mut self, handle: &BookingHandle) -> DomainResult<AppliedChange> {
        self.ensure_active(handle)?;
        self.ctx
            .transition(handle.slot_id(), Some(SlotStatus::Occupied))
            .await
    }

    /// The holder leaves: slot back to available, booking completed
    pub async fn complete(&mut self, handle: &mut BookingHandle) -> DomainResult<AppliedChange> {
        self.ensure_active(handle)?;
        let applied = self
            .ctx
            .transition(handle.slot_id(), Some(SlotStatus::Available))
            .await?;
        handle.booking.complete(self.ctx.now());
        self.update_booking(&handle.booking).await?;
        info!(booking_id = %handle.booking_id(), "✅ Booking completed");
        Ok(applied)
    }

    /// Release a reservation that was never used
    pub async fn cancel(
        &mut self,
        handle: &mut BookingHandle,
        reason: &str,
    ) -> DomainResult<AppliedChange> {
        self.ensure_active(handle)?;
        let slot_status = self
            .ctx
            .registry()
            .slot(handle.slot_id())
            .map(|s| s.status)
            .ok_or_else(|| DomainError::not_found(&self.ctx.collections().slots, handle.slot_id()))?;
        if slot_status != SlotStatus::Reserved {
            return Err(DomainError::InvalidTransition {
                from: slot_status,
                to: SlotStatus::Available,
            });
        }

        let applied = self
            .ctx
            .transition(handle.slot_id(), Some(SlotStatus::Available))
            .await?;
        handle.booking.cancel(reason, self.ctx.now());
        self.update_booking(&handle.booking).await?;
        info!(booking_id = %handle.booking_id(), reason, "🚫 Booking cancelled");
        Ok(applied)
    }

    /// reserve, wait, occupy, wait, complete
    pub async fn run_cycle(&mut self, user_id: &str, pause: Duration) -> DomainResult<BookingHandle> {
        let mut handle = self.reserve(user_id).await?;
        tokio::time::sleep(pause).await;
        self.occupy(&handle).await?;
        tokio::time::sleep(pause).await;
        self.complete(&mut handle).await?;
        Ok(handle)
    }

    fn ensure_active(&self, handle: &BookingHandle) -> DomainResult<()> {
        if handle.booking.is_active() {
            return Ok(());
        }
        Err(DomainError::invalid_document(
            &self.ctx.collections().bookings,
            handle.booking_id(),
            format!("booking is {}", handle.booking.status),
        ))
    }

    async fn update_booking(&self, booking: &Booking) -> DomainResult<()> {
        self.ctx
            .store()
            .update(&self.ctx.collections().bookings, &booking.id, booking.status_fields())
            .await?;
        Ok(())
    }

    async fn write_status(&self, booking: &Booking) {
        if let Err(e) = self.update_booking(booking).await {
            warn!(booking_id = %booking.id, error = %e, "Failed to update booking");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;

    use super::*;
    use crate::application::simulation::SlotRegistry;
    use crate::config::CollectionIds;
    use crate::domain::{
        BatteryStatus, BookingStatus, DocumentStore, Slot, SlotKind, Station, StationKind,
    };
    use crate::infrastructure::InMemoryStore;
    use crate::support::random::ScriptedRandom;
    use crate::support::time::SystemClock;

    async fn flow() -> (Arc<InMemoryStore>, BookingFlow) {
        let store = Arc::new(InMemoryStore::new());
        let now = Utc::now();
        let mut station = Station::new("st1", "Hub", StationKind::Hybrid, 2);
        station.price_per_hour = 50.0;
        station.available_slots = 2;
        store
            .create("stations", DocumentId::Custom("st1".into()), station.to_fields(now))
            .await
            .unwrap();
        let slots = vec![
            Slot::new("s1", "st1", 1, SlotKind::ParkingSpace, SlotStatus::Available, None),
            Slot::new("p1", "st1", 2, SlotKind::ChargingPad, SlotStatus::Available, Some(BatteryStatus::Charged)),
        ];
        for slot in &slots {
            store
                .create("slots", DocumentId::Custom(slot.id.clone()), slot.to_fields(now))
                .await
                .unwrap();
        }
        let ctx = SimulationContext::new(
            store.clone(),
            CollectionIds::default(),
            Arc::new(SystemClock),
            Box::new(ScriptedRandom::new().with_indices([1])),
        )
        .with_registry(SlotRegistry::from_parts(vec![station], slots));
        (store, BookingFlow::new(ctx))
    }

    #[tokio::test]
    async fn reserve_holds_slot_and_creates_booking() {
        let (store, mut flow) = flow().await;
        let handle = flow.reserve("u1").await.unwrap();

        assert_eq!(handle.slot_id(), "p1");
        assert_eq!(handle.booking.total_price, 50.0);
        let slot = flow.context().registry().slot("p1").unwrap();
        assert_eq!(slot.status, SlotStatus::Reserved);
        assert_eq!(slot.reservation.as_ref().unwrap().user_id, "u1");

        let doc = store.get("slots", "p1").await.unwrap();
        assert_eq!(doc.get_str("reservedByUserId"), Some("u1"));
        let booking = store.get("bookings", handle.booking_id()).await.unwrap();
        assert_eq!(booking.get_str("status"), Some("active"));
        let station = store.get("stations", "st1").await.unwrap();
        assert_eq!(station.fields["availableSlots"], serde_json::json!(1));
    }

    #[tokio::test]
    async fn full_cycle_completes_booking_and_frees_slot() {
        let (store, mut flow) = flow().await;
        let mut handle = flow.reserve("u1").await.unwrap();

        flow.occupy(&handle).await.unwrap();
        let slot = flow.context().registry().slot("p1").unwrap();
        assert_eq!(slot.status, SlotStatus::Occupied);
        assert_eq!(slot.battery_status, Some(BatteryStatus::Charging));
        assert!(slot.reservation.is_some());

        flow.complete(&mut handle).await.unwrap();
        let slot = flow.context().registry().slot("p1").unwrap();
        assert_eq!(slot.status, SlotStatus::Available);
        assert!(slot.reservation.is_none());

        let booking = Booking::from_document(
            "bookings",
            &store.get("bookings", handle.booking_id()).await.unwrap(),
        )
        .unwrap();
        assert_eq!(booking.status, BookingStatus::Completed);
        assert!(booking.end_time.is_some());
        let doc = store.get("slots", "p1").await.unwrap();
        assert_eq!(doc.fields["reservedByUserId"], serde_json::Value::Null);
    }

    #[tokio::test]
    async fn cancel_releases_reserved_slot() {
        let (store, mut flow) = flow().await;
        let mut handle = flow.reserve("u1").await.unwrap();

        flow.cancel(&mut handle, "changed plans").await.unwrap();
        assert_eq!(
            flow.context().registry().slot("p1").unwrap().status,
            SlotStatus::Available
        );
        let booking = store.get("bookings", handle.booking_id()).await.unwrap();
        assert_eq!(booking.get_str("status"), Some("cancelled"));
        assert_eq!(booking.get_str("cancellationReason"), Some("changed plans"));
    }

    #[tokio::test]
    async fn cancel_after_occupy_is_rejected() {
        let (_store, mut flow) = flow().await;
        let mut handle = flow.reserve("u1").await.unwrap();
        flow.occupy(&handle).await.unwrap();

        let err = flow.cancel(&mut handle, "too late").await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn completed_booking_cannot_be_reused() {
        let (_store, mut flow) = flow().await;
        let mut handle = flow.reserve("u1").await.unwrap();
        flow.occupy(&handle).await.unwrap();
        flow.complete(&mut handle).await.unwrap();

        assert!(flow.occupy(&handle).await.is_err());
    }

    #[tokio::test]
    async fn default_user_falls_back_without_users() {
        let (_store, flow) = flow().await;
        assert_eq!(flow.default_user().await, DEMO_USER_ID);
    }
}
