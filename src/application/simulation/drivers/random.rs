//! Random driver: any slot, any allowed edge, every 3-8 time units

use std::time::Duration;

use async_trait::async_trait;

use super::TimedDriver;
use crate::application::simulation::context::{report, AppliedChange, SimulationContext};

/// Sleep range between iterations, in time units
pub const PAUSE_UNITS: (f64, f64) = (3.0, 8.0);

pub struct RandomDriver {
    ctx: SimulationContext,
    time_unit: Duration,
}

impl RandomDriver {
    pub fn new(ctx: SimulationContext, time_unit: Duration) -> Self {
        Self { ctx, time_unit }
    }

    pub fn context(&self) -> &SimulationContext {
        &self.ctx
    }
}

#[async_trait]
impl TimedDriver for RandomDriver {
    fn name(&self) -> &'static str {
        "random"
    }

    async fn step(&mut self) -> Vec<AppliedChange> {
        let Some(slot) = self.ctx.pick_slot(|_| true) else {
            return Vec::new();
        };
        match self.ctx.transition(&slot.id, None).await {
            Ok(applied) => vec![applied],
            Err(e) => {
                report("random", &e);
                Vec::new()
            }
        }
    }

    fn next_delay(&mut self) -> Duration {
        self.ctx.pause(PAUSE_UNITS.0, PAUSE_UNITS.1, self.time_unit)
    }
}
