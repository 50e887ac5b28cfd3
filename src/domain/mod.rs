pub mod booking;
pub mod document;
pub mod slot;
pub mod station;
pub mod user;

// Re-export commonly used types
pub use booking::{Booking, BookingStatus};
pub use document::{Document, DocumentId, DocumentStore, Fields, Filter};
pub use slot::{BatteryStatus, Reservation, Slot, SlotChange, SlotKind, SlotStatus};
pub use station::{Station, StationKind};
pub use user::User;

// Re-export errors from support for convenience
pub use crate::support::errors::{DomainError, DomainResult};
