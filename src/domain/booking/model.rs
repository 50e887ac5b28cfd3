//! Booking domain entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::domain::slot::timestamp;
use crate::domain::{Document, DomainError, DomainResult, Fields};

/// Booking status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    /// Slot is held or in use
    Active,
    /// Vehicle left, booking closed
    Completed,
    /// Reservation released before use
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A user's booking of exactly one slot
///
/// Encoded by hand in [`Booking::to_fields`]; decoding goes through serde.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    #[serde(rename = "$id", default)]
    pub id: String,
    pub user_id: String,
    pub station_id: String,
    pub slot_id: String,
    pub status: BookingStatus,
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    pub price_per_hour: f64,
    pub duration_hours: u32,
    pub total_price: f64,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub cancelled_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub cancellation_reason: Option<String>,
}

impl Booking {
    pub fn new(
        user_id: impl Into<String>,
        station_id: impl Into<String>,
        slot_id: impl Into<String>,
        price_per_hour: f64,
        duration_hours: u32,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: String::new(),
            user_id: user_id.into(),
            station_id: station_id.into(),
            slot_id: slot_id.into(),
            status: BookingStatus::Active,
            start_time: now,
            end_time: None,
            price_per_hour,
            duration_hours,
            total_price: price_per_hour * f64::from(duration_hours),
            created_at: now,
            cancelled_at: None,
            cancellation_reason: None,
        }
    }

    pub fn from_document(collection: &str, doc: &Document) -> DomainResult<Self> {
        serde_json::from_value(doc.to_value())
            .map_err(|e| DomainError::invalid_document(collection, &doc.id, e))
    }

    pub fn is_active(&self) -> bool {
        self.status == BookingStatus::Active
    }

    /// Close the booking after the vehicle left
    pub fn complete(&mut self, now: DateTime<Utc>) {
        self.status = BookingStatus::Completed;
        self.end_time = Some(now);
    }

    /// Release the booking before use
    pub fn cancel(&mut self, reason: impl Into<String>, now: DateTime<Utc>) {
        self.status = BookingStatus::Cancelled;
        self.cancelled_at = Some(now);
        self.cancellation_reason = Some(reason.into());
    }

    pub fn to_fields(&self) -> Fields {
        let mut fields = Fields::new();
        fields.insert("userId".into(), json!(self.user_id));
        fields.insert("stationId".into(), json!(self.station_id));
        fields.insert("slotId".into(), json!(self.slot_id));
        fields.insert("startTime".into(), json!(timestamp(self.start_time)));
        fields.insert("pricePerHour".into(), json!(self.price_per_hour));
        fields.insert("durationHours".into(), json!(self.duration_hours));
        fields.insert("totalPrice".into(), json!(self.total_price));
        fields.insert("createdAt".into(), json!(timestamp(self.created_at)));
        fields.extend(self.status_fields());
        fields
    }

    /// Fields touched by status changes
    pub fn status_fields(&self) -> Fields {
        let opt_ts = |t: Option<DateTime<Utc>>| t.map(|t| json!(timestamp(t))).unwrap_or(Value::Null);
        let mut fields = Fields::new();
        fields.insert("status".into(), json!(self.status.as_str()));
        fields.insert("endTime".into(), opt_ts(self.end_time));
        fields.insert("cancelledAt".into(), opt_ts(self.cancelled_at));
        fields.insert(
            "cancellationReason".into(),
            self.cancellation_reason
                .as_ref()
                .map(|r| json!(r))
                .unwrap_or(Value::Null),
        );
        fields
    }
}

// ── Tests ──────────────────────────────────────────────────────
