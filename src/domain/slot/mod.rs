//! Slot aggregate
//!
//! Contains the Slot entity, its kind/status enums and the change record
//! written on every transition.

pub mod model;

pub use model::{timestamp, BatteryStatus, Reservation, Slot, SlotChange, SlotKind, SlotStatus};
