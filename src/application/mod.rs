pub mod services;
pub mod simulation;

// Re-export key types for convenience
pub use services::{BookingFlow, BookingHandle, SeedReport, Seeder};
pub use simulation::{
    run_timed, AppliedChange, InteractiveDriver, RandomDriver, RealisticDriver, SimulationContext,
    SimulationMode, SlotRegistry, TimedDriver,
};
