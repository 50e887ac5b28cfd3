//! Sample data seeding
//!
//! Writes the demo catalog (stations, their slots, users, a handful of
//! bookings) and then settles every station's availability from the store.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::application::simulation::AggregateUpdater;
use crate::config::CollectionIds;
use crate::domain::{
    BatteryStatus, Booking, BookingStatus, DocumentId, DocumentStore, Slot, SlotKind, SlotStatus,
    Station, StationKind, User,
};
use crate::support::time::Clock;

/// Maximum number of demo bookings created
pub const SAMPLE_BOOKINGS: usize = 5;

/// What a seeding run created
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub stations: usize,
    pub slots: usize,
    pub users: usize,
    pub bookings: usize,
    /// Sum of the settled `availableSlots` across created stations
    pub available_slots: u32,
}

#[allow(clippy::too_many_arguments)]
fn station(
    name: &str,
    address: &str,
    (latitude, longitude): (f64, f64),
    kind: StationKind,
    total_slots: u32,
    price_per_hour: f64,
    battery_swap: bool,
    amenities: &[&str],
) -> Station {
    let mut station = Station::new(String::new(), name, kind, total_slots);
    station.address = Some(address.to_string());
    station.latitude = Some(latitude);
    station.longitude = Some(longitude);
    station.price_per_hour = price_per_hour;
    station.battery_swap = battery_swap;
    station.amenities = amenities.iter().map(|a| a.to_string()).collect();
    station
}

/// The demo station catalog
pub fn sample_stations() -> Vec<Station> {
    vec![
        station(
            "MG Road Charging Hub",
            "MG Road, Bangalore, Karnataka 560001",
            (12.9716, 77.5946),
            StationKind::Hybrid,
            20,
            50.0,
            true,
            &["WiFi", "Restroom", "Café", "24/7 Access"],
        ),
        station(
            "Koramangala Tech Park",
            "Koramangala, Bangalore, Karnataka 560034",
            (12.9352, 77.6245),
            StationKind::Hybrid,
            30,
            45.0,
            false,
            &["WiFi", "Restroom", "Security"],
        ),
        station(
            "Whitefield Mall Station",
            "Whitefield, Bangalore, Karnataka 560066",
            (12.9698, 77.7500),
            StationKind::Charging,
            15,
            60.0,
            true,
            &["WiFi", "Shopping Mall", "Food Court"],
        ),
        station(
            "Indiranagar Metro Station",
            "Indiranagar, Bangalore, Karnataka 560038",
            (12.9719, 77.6412),
            StationKind::Parking,
            50,
            30.0,
            false,
            &["Metro Access", "WiFi", "Security"],
        ),
        station(
            "Electronic City Hub",
            "Electronic City, Bangalore, Karnataka 560100",
            (12.8456, 77.6603),
            StationKind::Hybrid,
            25,
            40.0,
            true,
            &["WiFi", "Restroom", "Café", "24/7 Access"],
        ),
    ]
}

/// The demo user accounts
pub fn sample_users() -> Vec<User> {
    let user = |email: &str, name: &str, phone: &str, bookings: u32, hours: f64, points: u32| User {
        email: email.to_string(),
        name: name.to_string(),
        phone_number: Some(phone.to_string()),
        total_bookings: bookings,
        total_hours_parked: hours,
        loyalty_points: points,
        preferences: r#"{"notifications": true, "darkMode": false}"#.to_string(),
    };
    vec![
        user("john.doe@example.com", "John Doe", "+91 9876543210", 24, 156.5, 2450),
        user("jane.smith@example.com", "Jane Smith", "+91 9876543211", 18, 98.0, 1800),
        user("mike.wilson@example.com", "Mike Wilson", "+91 9876543212", 32, 210.0, 3200),
    ]
}

/// Seeded status of the slot at 0-based `index`: the first 80% are
/// available, the next 15% occupied, the rest under maintenance
pub fn initial_status(index: u32, total: u32) -> SlotStatus {
    let scaled = u64::from(index) * 100;
    let total = u64::from(total);
    if scaled < total * 80 {
        SlotStatus::Available
    } else if scaled < total * 95 {
        SlotStatus::Occupied
    } else {
        SlotStatus::Maintenance
    }
}

/// Seeded battery for a slot of `kind` in `status`
pub fn initial_battery(kind: SlotKind, status: SlotStatus) -> Option<BatteryStatus> {
    if !kind.has_battery() {
        return None;
    }
    Some(match status {
        SlotStatus::Available => BatteryStatus::Charged,
        SlotStatus::Occupied => BatteryStatus::Charging,
        SlotStatus::Reserved | SlotStatus::Maintenance => BatteryStatus::Empty,
    })
}

pub struct Seeder {
    store: Arc<dyn DocumentStore>,
    collections: CollectionIds,
    clock: Arc<dyn Clock>,
}

impl Seeder {
    pub fn new(store: Arc<dyn DocumentStore>, collections: CollectionIds, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            collections,
            clock,
        }
    }

    /// Create the whole catalog; individual failures are logged and skipped
    pub async fn run(&self) -> SeedReport {
        info!("🌱 Seeding sample data");
        let now = self.clock.now_utc();
        let mut report = SeedReport::default();

        let stations = self.create_stations(now).await;
        report.stations = stations.len();

        let mut slots = Vec::new();
        for station in &stations {
            slots.extend(self.create_slots(station, now).await);
        }
        report.slots = slots.len();

        let user_ids = self.create_users(now).await;
        report.users = user_ids.len();

        report.bookings = self.create_bookings(&stations, &slots, &user_ids, now).await;

        let aggregates = AggregateUpdater::new(
            self.store.clone(),
            self.collections.clone(),
            self.clock.clone(),
        );
        for station in &stations {
            match aggregates.recompute_from_store(&station.id).await {
                Ok(available) => report.available_slots += available,
                Err(e) => warn!(station_id = %station.id, error = %e, "Failed to settle station"),
            }
        }

        info!(
            stations = report.stations,
            slots = report.slots,
            users = report.users,
            bookings = report.bookings,
            available_slots = report.available_slots,
            "✅ Seeding complete"
        );
        report
    }

    async fn create_stations(&self, now: DateTime<Utc>) -> Vec<Station> {
        let mut created = Vec::new();
        for mut station in sample_stations() {
            match self
                .store
                .create(&self.collections.stations, DocumentId::Unique, station.to_fields(now))
                .await
            {
                Ok(doc) => {
                    info!(station_id = %doc.id, name = %station.name, "Created station");
                    station.id = doc.id;
                    created.push(station);
                }
                Err(e) => warn!(name = %station.name, error = %e, "Failed to create station"),
            }
        }
        created
    }

    async fn create_slots(&self, station: &Station, now: DateTime<Utc>) -> Vec<Slot> {
        let mut created = Vec::new();
        for i in 0..station.total_slots {
            let kind = SlotKind::for_station(station.kind, i as usize);
            let status = initial_status(i, station.total_slots);
            let mut slot = Slot::new(
                String::new(),
                station.id.clone(),
                i + 1,
                kind,
                status,
                initial_battery(kind, status),
            );
            match self
                .store
                .create(&self.collections.slots, DocumentId::Unique, slot.to_fields(now))
                .await
            {
                Ok(doc) => {
                    slot.id = doc.id;
                    created.push(slot);
                }
                Err(e) => warn!(
                    station_id = %station.id,
                    slot_index = i + 1,
                    error = %e,
                    "Failed to create slot"
                ),
            }
        }
        info!(station_id = %station.id, slots = created.len(), "Created slots");
        created
    }

    async fn create_users(&self, now: DateTime<Utc>) -> Vec<String> {
        let mut created = Vec::new();
        for user in sample_users() {
            match self
                .store
                .create(&self.collections.users, DocumentId::Unique, user.to_fields(now))
                .await
            {
                Ok(doc) => {
                    info!(user_id = %doc.id, name = %user.name, "Created user");
                    created.push(doc.id);
                }
                Err(e) => warn!(name = %user.name, error = %e, "Failed to create user"),
            }
        }
        created
    }

    /// Bookings against the first slots, alternating completed and active
    async fn create_bookings(
        &self,
        stations: &[Station],
        slots: &[Slot],
        user_ids: &[String],
        now: DateTime<Utc>,
    ) -> usize {
        if user_ids.is_empty() {
            return 0;
        }

        let mut created = 0;
        for (i, slot) in slots.iter().take(SAMPLE_BOOKINGS).enumerate() {
            let price = stations
                .iter()
                .find(|s| s.id == slot.station_id)
                .map(|s| s.price_per_hour)
                .unwrap_or_default();
            let mut booking = Booking::new(
                user_ids[i % user_ids.len()].clone(),
                slot.station_id.clone(),
                slot.id.clone(),
                price,
                1,
                now,
            );
            if sample_booking_status(i) == BookingStatus::Completed {
                booking.complete(now);
            }

            match self
                .store
                .create(&self.collections.bookings, DocumentId::Unique, booking.to_fields())
                .await
            {
                Ok(doc) => {
                    info!(
                        booking_id = %doc.id,
                        status = %booking.status,
                        "Created booking"
                    );
                    created += 1;
                }
                Err(e) => warn!(slot_id = %slot.id, error = %e, "Failed to create booking"),
            }
        }
        created
    }
}

/// Status of the demo booking at position `i`
pub fn sample_booking_status(i: usize) -> BookingStatus {
    if i % 2 == 0 {
        BookingStatus::Completed
    } else {
        BookingStatus::Active
    }
}
