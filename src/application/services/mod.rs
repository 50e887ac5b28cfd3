//! Application services

mod booking_flow;
mod seeding;

pub use booking_flow::{BookingFlow, BookingHandle, DEMO_USER_ID, RESERVATION_HOLD_MINUTES};
pub use seeding::{sample_stations, sample_users, SeedReport, Seeder};
