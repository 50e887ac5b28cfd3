//! Station domain entity

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::domain::slot::timestamp;
use crate::domain::{Document, DomainError, DomainResult, Fields};

/// What a station offers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StationKind {
    Charging,
    Parking,
    Hybrid,
}

impl StationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Charging => "charging",
            Self::Parking => "parking",
            Self::Hybrid => "hybrid",
        }
    }
}

impl fmt::Display for StationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Physical site aggregating slots
#[derive(Debug, Clone, PartialEq)]
pub struct Station {
    pub id: String,
    pub name: String,
    pub kind: StationKind,
    pub total_slots: u32,
    /// Cached count of available slots, owned by the aggregate updater
    pub available_slots: u32,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub price_per_hour: f64,
    pub battery_swap: bool,
    pub amenities: Vec<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StationRecord {
    #[serde(default)]
    name: String,
    #[serde(rename = "type")]
    kind: StationKind,
    total_slots: u32,
    #[serde(default)]
    available_slots: u32,
    #[serde(default)]
    address: Option<String>,
    #[serde(default)]
    latitude: Option<f64>,
    #[serde(default)]
    longitude: Option<f64>,
    #[serde(default)]
    price_per_hour: f64,
    #[serde(default)]
    battery_swap: bool,
    #[serde(default)]
    amenities: Option<String>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
}

impl Station {
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: StationKind, total_slots: u32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            total_slots,
            available_slots: 0,
            address: None,
            latitude: None,
            longitude: None,
            price_per_hour: 0.0,
            battery_swap: false,
            amenities: Vec::new(),
            created_at: None,
            updated_at: None,
        }
    }

    pub fn from_document(collection: &str, doc: &Document) -> DomainResult<Self> {
        let record: StationRecord = serde_json::from_value(doc.to_value())
            .map_err(|e| DomainError::invalid_document(collection, &doc.id, e))?;

        Ok(Self {
            id: doc.id.clone(),
            name: record.name,
            kind: record.kind,
            total_slots: record.total_slots,
            available_slots: record.available_slots,
            address: record.address,
            latitude: record.latitude,
            longitude: record.longitude,
            price_per_hour: record.price_per_hour,
            battery_swap: record.battery_swap,
            amenities: record
                .amenities
                .map(|a| {
                    a.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default(),
            created_at: record.created_at,
            updated_at: record.updated_at,
        })
    }

    /// Fields written when the station is created
    pub fn to_fields(&self, now: DateTime<Utc>) -> Fields {
        let mut fields = Fields::new();
        fields.insert("name".into(), json!(self.name));
        fields.insert("type".into(), json!(self.kind.as_str()));
        fields.insert("totalSlots".into(), json!(self.total_slots));
        fields.insert("availableSlots".into(), json!(self.available_slots));
        if let Some(address) = &self.address {
            fields.insert("address".into(), json!(address));
        }
        if let (Some(lat), Some(lon)) = (self.latitude, self.longitude) {
            fields.insert("latitude".into(), json!(lat));
            fields.insert("longitude".into(), json!(lon));
        }
        fields.insert("pricePerHour".into(), json!(self.price_per_hour));
        fields.insert("batterySwap".into(), json!(self.battery_swap));
        fields.insert("amenities".into(), json!(self.amenities.join(",")));
        fields.insert("createdAt".into(), json!(timestamp(now)));
        fields.insert("updatedAt".into(), json!(timestamp(now)));
        fields
    }

    /// Partial update carrying a freshly derived availability count
    pub fn availability_fields(available_slots: u32, now: DateTime<Utc>) -> Fields {
        let mut fields = Fields::new();
        fields.insert("availableSlots".into(), json!(available_slots));
        fields.insert("updatedAt".into(), json!(timestamp(now)));
        fields
    }
}
