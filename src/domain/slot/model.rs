//! Slot domain entity

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::warn;

use crate::domain::station::StationKind;
use crate::domain::{Document, DomainError, DomainResult, Fields};

/// Physical kind of a slot, fixed at creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotKind {
    ChargingPad,
    ParkingSpace,
}

impl SlotKind {
    /// Kind of the slot at zero-based `index` of a station of `station_kind`.
    ///
    /// Hybrid stations alternate, starting with a parking space.
    pub fn for_station(station_kind: StationKind, index: usize) -> Self {
        match station_kind {
            StationKind::Charging => Self::ChargingPad,
            StationKind::Parking => Self::ParkingSpace,
            StationKind::Hybrid => {
                if index % 2 == 0 {
                    Self::ParkingSpace
                } else {
                    Self::ChargingPad
                }
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ChargingPad => "charging_pad",
            Self::ParkingSpace => "parking_space",
        }
    }

    pub fn has_battery(&self) -> bool {
        matches!(self, Self::ChargingPad)
    }
}

/// Occupancy status of a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotStatus {
    Available,
    Occupied,
    Reserved,
    Maintenance,
}

impl SlotStatus {
    pub const ALL: [SlotStatus; 4] = [
        Self::Available,
        Self::Occupied,
        Self::Reserved,
        Self::Maintenance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Occupied => "occupied",
            Self::Reserved => "reserved",
            Self::Maintenance => "maintenance",
        }
    }

    /// Whether a slot in this status may carry a reservation holder
    pub fn holds_reservation(&self) -> bool {
        matches!(self, Self::Reserved | Self::Occupied)
    }
}

impl fmt::Display for SlotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SlotStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown slot status '{s}'"))
    }
}

/// Battery sub-state of a charging pad
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatteryStatus {
    Charged,
    Charging,
    Empty,
    Swapped,
}

impl BatteryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Charged => "charged",
            Self::Charging => "charging",
            Self::Empty => "empty",
            Self::Swapped => "swapped",
        }
    }
}

impl fmt::Display for BatteryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Booking-driven hold on a slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reservation {
    pub user_id: String,
    pub until: DateTime<Utc>,
}

/// Parking space or charging pad belonging to a station
#[derive(Debug, Clone, PartialEq)]
pub struct Slot {
    pub id: String,
    pub station_id: String,
    /// 1-based position inside the station
    pub slot_index: u32,
    pub kind: SlotKind,
    pub status: SlotStatus,
    /// Present iff `kind` is a charging pad
    pub battery_status: Option<BatteryStatus>,
    pub last_updated: Option<DateTime<Utc>>,
    pub reservation: Option<Reservation>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SlotRecord {
    station_id: String,
    #[serde(default)]
    slot_index: u32,
    #[serde(rename = "type")]
    kind: SlotKind,
    status: SlotStatus,
    #[serde(default)]
    battery_status: Option<BatteryStatus>,
    #[serde(default)]
    last_updated: Option<DateTime<Utc>>,
    #[serde(default)]
    reserved_by_user_id: Option<String>,
    #[serde(default)]
    reserved_until: Option<DateTime<Utc>>,
}

impl Slot {
    pub fn new(
        id: impl Into<String>,
        station_id: impl Into<String>,
        slot_index: u32,
        kind: SlotKind,
        status: SlotStatus,
        battery_status: Option<BatteryStatus>,
    ) -> Self {
        let mut slot = Self {
            id: id.into(),
            station_id: station_id.into(),
            slot_index,
            kind,
            status,
            battery_status,
            last_updated: None,
            reservation: None,
        };
        slot.normalize_battery();
        slot
    }

    /// Decode a slot document, enforcing the battery invariant
    pub fn from_document(collection: &str, doc: &Document) -> DomainResult<Self> {
        let record: SlotRecord = serde_json::from_value(doc.to_value())
            .map_err(|e| DomainError::invalid_document(collection, &doc.id, e))?;

        let reservation = match (record.reserved_by_user_id, record.reserved_until) {
            (Some(user_id), Some(until)) if record.status.holds_reservation() => {
                Some(Reservation { user_id, until })
            }
            _ => None,
        };

        let mut slot = Self {
            id: doc.id.clone(),
            station_id: record.station_id,
            slot_index: record.slot_index,
            kind: record.kind,
            status: record.status,
            battery_status: record.battery_status,
            last_updated: record.last_updated,
            reservation,
        };
        if slot.normalize_battery() {
            warn!(
                slot_id = %slot.id,
                kind = slot.kind.as_str(),
                "Slot battery status did not match its kind, normalised"
            );
        }
        Ok(slot)
    }

    /// Fields written when the slot is first created
    pub fn to_fields(&self, now: DateTime<Utc>) -> Fields {
        let mut fields = self.change(self.status, self.battery_status, now).to_fields();
        fields.insert("stationId".into(), json!(self.station_id));
        fields.insert("slotIndex".into(), json!(self.slot_index));
        fields.insert("type".into(), json!(self.kind.as_str()));
        fields
    }

    /// Build the change moving this slot to `status`, carrying the
    /// reservation only while the new status can hold one
    pub fn change(
        &self,
        status: SlotStatus,
        battery_status: Option<BatteryStatus>,
        now: DateTime<Utc>,
    ) -> SlotChange {
        SlotChange {
            status,
            battery_status,
            reservation: self
                .reservation
                .clone()
                .filter(|_| status.holds_reservation()),
            last_updated: now,
        }
    }

    /// Apply a confirmed change to this local copy
    pub fn apply(&mut self, change: &SlotChange) {
        self.status = change.status;
        self.battery_status = change.battery_status;
        self.reservation = change.reservation.clone();
        self.last_updated = Some(change.last_updated);
        self.normalize_battery();
    }

    pub fn is_charging_pad(&self) -> bool {
        self.kind == SlotKind::ChargingPad
    }

    /// Returns true when the battery field had to be corrected
    fn normalize_battery(&mut self) -> bool {
        match (self.kind.has_battery(), self.battery_status) {
            (true, None) => {
                self.battery_status = Some(BatteryStatus::Charged);
                true
            }
            (false, Some(_)) => {
                self.battery_status = None;
                true
            }
            _ => false,
        }
    }
}

/// Mutable slot state written on every transition
#[derive(Debug, Clone, PartialEq)]
pub struct SlotChange {
    pub status: SlotStatus,
    pub battery_status: Option<BatteryStatus>,
    pub reservation: Option<Reservation>,
    pub last_updated: DateTime<Utc>,
}

impl SlotChange {
    pub fn with_reservation(mut self, reservation: Option<Reservation>) -> Self {
        self.reservation = reservation;
        self
    }

    /// Partial update payload; absent optionals are written as null
    pub fn to_fields(&self) -> Fields {
        let mut fields = Fields::new();
        fields.insert("status".into(), json!(self.status.as_str()));
        fields.insert(
            "batteryStatus".into(),
            self.battery_status
                .map(|b| json!(b.as_str()))
                .unwrap_or(Value::Null),
        );
        fields.insert("lastUpdated".into(), json!(timestamp(self.last_updated)));
        match &self.reservation {
            Some(r) => {
                fields.insert("reservedByUserId".into(), json!(r.user_id));
                fields.insert("reservedUntil".into(), json!(timestamp(r.until)));
            }
            None => {
                fields.insert("reservedByUserId".into(), Value::Null);
                fields.insert("reservedUntil".into(), Value::Null);
            }
        }
        fields
    }
}

/// RFC 3339 with millisecond precision and a `Z` suffix
pub fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

// ── Tests ──────────────────────────────────────────────────────
