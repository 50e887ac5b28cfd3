//! Realistic driver
//!
//! Arrivals and departures follow a time-of-day demand profile. Each
//! iteration rolls three independent events: an arrival at a random
//! available slot, a departure from a random occupied slot, and a battery
//! swap at a random occupied charging pad.

use std::time::Duration;

use async_trait::async_trait;

use super::TimedDriver;
use crate::application::simulation::context::{report, AppliedChange, SimulationContext};
use crate::application::simulation::policy;
use crate::domain::{DomainResult, SlotStatus};

/// Half-open local-hour windows `[start, end)` with peak demand
pub const PEAK_WINDOWS: [(u32, u32); 2] = [(8, 10), (18, 20)];

/// Per-iteration chance of a battery swap, regardless of the hour
pub const SWAP_PROBABILITY: f64 = 0.1;

/// Sleep range between iterations, in time units
pub const PAUSE_UNITS: (f64, f64) = (2.0, 6.0);

pub fn is_peak_hour(hour: u32) -> bool {
    PEAK_WINDOWS
        .iter()
        .any(|&(start, end)| (start..end).contains(&hour))
}

/// Arrival and departure probabilities for one iteration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DemandProfile {
    pub arrival: f64,
    pub departure: f64,
}

impl DemandProfile {
    pub const PEAK: DemandProfile = DemandProfile {
        arrival: 0.7,
        departure: 0.3,
    };

    pub const OFF_PEAK: DemandProfile = DemandProfile {
        arrival: 0.3,
        departure: 0.2,
    };

    pub fn for_hour(hour: u32) -> Self {
        if is_peak_hour(hour) {
            Self::PEAK
        } else {
            Self::OFF_PEAK
        }
    }
}

pub struct RealisticDriver {
    ctx: SimulationContext,
    time_unit: Duration,
}

impl RealisticDriver {
    pub fn new(ctx: SimulationContext, time_unit: Duration) -> Self {
        Self { ctx, time_unit }
    }

    pub fn context(&self) -> &SimulationContext {
        &self.ctx
    }

    async fn arrive(&mut self) -> Option<AppliedChange> {
        let Some(slot) = self.ctx.pick_slot(|s| s.status == SlotStatus::Available) else {
            tracing::debug!("No available slot for arrival");
            return None;
        };
        let outcome = self.ctx.transition(&slot.id, Some(SlotStatus::Occupied)).await;
        settle("arrival", outcome)
    }

    async fn depart(&mut self) -> Option<AppliedChange> {
        let Some(slot) = self.ctx.pick_slot(|s| s.status == SlotStatus::Occupied) else {
            tracing::debug!("No occupied slot for departure");
            return None;
        };
        let outcome = self.ctx.transition(&slot.id, Some(SlotStatus::Available)).await;
        settle("departure", outcome)
    }

    async fn swap(&mut self) -> Option<AppliedChange> {
        let Some(slot) = self.ctx.pick_slot(policy::can_swap) else {
            tracing::debug!("No occupied charging pad for swap");
            return None;
        };
        let outcome = self.ctx.swap_battery(&slot.id).await;
        settle("swap", outcome)
    }
}

fn settle(action: &str, outcome: DomainResult<AppliedChange>) -> Option<AppliedChange> {
    match outcome {
        Ok(applied) => Some(applied),
        Err(e) => {
            report(action, &e);
            None
        }
    }
}

#[async_trait]
impl TimedDriver for RealisticDriver {
    fn name(&self) -> &'static str {
        "realistic"
    }

    async fn step(&mut self) -> Vec<AppliedChange> {
        let hour = self.ctx.clock().local_hour();
        let demand = DemandProfile::for_hour(hour);
        let mut applied = Vec::new();

        if self.ctx.roll(demand.arrival) {
            applied.extend(self.arrive().await);
        }
        if self.ctx.roll(demand.departure) {
            applied.extend(self.depart().await);
        }
        if self.ctx.roll(SWAP_PROBABILITY) {
            applied.extend(self.swap().await);
        }
        applied
    }

    fn next_delay(&mut self) -> Duration {
        self.ctx.pause(PAUSE_UNITS.0, PAUSE_UNITS.1, self.time_unit)
    }
}
