//! Slot status simulation
//!
//! Policy decides, the context writes, drivers schedule.

pub mod aggregate;
pub mod context;
pub mod drivers;
pub mod policy;
pub mod registry;

pub use aggregate::AggregateUpdater;
pub use context::{AppliedChange, SimulationContext};
pub use drivers::{
    run_timed, Command, DemandProfile, InteractiveDriver, RandomDriver, RealisticDriver,
    SimulationMode, TimedDriver,
};
pub use policy::{Transition, TransitionContext};
pub use registry::SlotRegistry;
