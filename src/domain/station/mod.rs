//! Station aggregate

pub mod model;

pub use model::{Station, StationKind};
