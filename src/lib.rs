//! # ParkCharge Simulator
//!
//! Seeds the ParkCharge demo catalog and drives live slot status changes
//! against an Appwrite document database, keeping every station's
//! `availableSlots` consistent with its slots.
//!
//! ## Architecture
//!
//! - **domain**: Stations, slots, bookings and the document store contract
//! - **application**: Transition policy, slot registry, drivers, seeding and bookings
//! - **infrastructure**: Appwrite REST and in-memory document stores
//! - **support**: Errors, randomness, clock and shutdown plumbing
//! - **runner**: Wires configuration and components into a runnable task

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod runner;
pub mod support;

pub use config::{default_config_path, resolve_config_path, AppConfig};

// Re-export the runtime entry points
pub use runner::{init_tracing, run, RunOptions, StoreKind, Task};

pub use support::errors::AppError;
pub use support::shutdown::ShutdownSignal;
