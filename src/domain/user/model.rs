//! User profile entity (seeded demo accounts)

use chrono::{DateTime, Utc};
use serde_json::json;

use crate::domain::slot::timestamp;
use crate::domain::Fields;

/// App user profile
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub email: String,
    pub name: String,
    pub phone_number: Option<String>,
    pub total_bookings: u32,
    pub total_hours_parked: f64,
    pub loyalty_points: u32,
    /// String-encoded JSON preferences blob
    pub preferences: String,
}

impl User {
    pub fn to_fields(&self, now: DateTime<Utc>) -> Fields {
        let mut fields = Fields::new();
        fields.insert("email".into(), json!(self.email));
        fields.insert("name".into(), json!(self.name));
        if let Some(phone) = &self.phone_number {
            fields.insert("phoneNumber".into(), json!(phone));
        }
        fields.insert("totalBookings".into(), json!(self.total_bookings));
        fields.insert("totalHoursParked".into(), json!(self.total_hours_parked));
        fields.insert("loyaltyPoints".into(), json!(self.loyalty_points));
        fields.insert("preferences".into(), json!(self.preferences));
        fields.insert("createdAt".into(), json!(timestamp(now)));
        fields.insert("updatedAt".into(), json!(timestamp(now)));
        fields
    }
}
