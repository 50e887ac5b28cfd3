//! Simulation drivers
//!
//! A driver decides which slot changes next and when. The random and
//! realistic drivers are timed loops sharing [`run_timed`]; the
//! interactive driver is paced by operator input instead.

pub mod interactive;
pub mod random;
pub mod realistic;

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};

use super::context::AppliedChange;
use crate::support::shutdown::ShutdownSignal;

pub use interactive::{Command, InteractiveDriver};
pub use random::RandomDriver;
pub use realistic::{DemandProfile, RealisticDriver};

/// Which driver to run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationMode {
    Random,
    Realistic,
    Interactive,
}

impl SimulationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Random => "random",
            Self::Realistic => "realistic",
            Self::Interactive => "interactive",
        }
    }
}

impl fmt::Display for SimulationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A driver that runs one iteration, then sleeps
#[async_trait]
pub trait TimedDriver: Send {
    fn name(&self) -> &'static str;

    /// Run one iteration; recoverable errors are logged, never returned
    async fn step(&mut self) -> Vec<AppliedChange>;

    /// Pause before the next iteration
    fn next_delay(&mut self) -> Duration;
}

/// Drive `driver` until shutdown or until `max_iterations` have run.
///
/// Returns the number of iterations executed.
pub async fn run_timed(
    driver: &mut dyn TimedDriver,
    shutdown: &ShutdownSignal,
    max_iterations: Option<u64>,
) -> u64 {
    info!(
        driver = driver.name(),
        max_iterations = ?max_iterations,
        "▶️ Simulation started"
    );

    let mut iterations = 0u64;
    loop {
        if shutdown.is_triggered() {
            break;
        }

        let applied = driver.step().await;
        iterations += 1;
        debug!(iteration = iterations, changes = applied.len(), "Iteration finished");

        if max_iterations.is_some_and(|max| iterations >= max) {
            break;
        }

        let delay = driver.next_delay();
        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = shutdown.stopped() => break,
        }
    }

    info!(driver = driver.name(), iterations, "⏹️ Simulation stopped");
    iterations
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Counting {
        steps: u64,
        stop_after: Option<(u64, ShutdownSignal)>,
    }

    #[async_trait]
    impl TimedDriver for Counting {
        fn name(&self) -> &'static str {
            "counting"
        }

        async fn step(&mut self) -> Vec<AppliedChange> {
            self.steps += 1;
            if let Some((n, signal)) = &self.stop_after {
                if self.steps >= *n {
                    signal.trigger();
                }
            }
            Vec::new()
        }

        fn next_delay(&mut self) -> Duration {
            Duration::ZERO
        }
    }

    #[tokio::test]
    async fn stops_at_iteration_limit() {
        let mut driver = Counting { steps: 0, stop_after: None };
        let shutdown = ShutdownSignal::new();
        assert_eq!(run_timed(&mut driver, &shutdown, Some(5)).await, 5);
        assert_eq!(driver.steps, 5);
    }

    #[tokio::test]
    async fn stops_after_current_iteration_on_shutdown() {
        let shutdown = ShutdownSignal::new();
        let mut driver = Counting {
            steps: 0,
            stop_after: Some((3, shutdown.clone())),
        };
        assert_eq!(run_timed(&mut driver, &shutdown, None).await, 3);
    }

    #[tokio::test]
    async fn already_cancelled_runs_nothing() {
        let shutdown = ShutdownSignal::new();
        shutdown.trigger();
        let mut driver = Counting { steps: 0, stop_after: None };
        assert_eq!(run_timed(&mut driver, &shutdown, None).await, 0);
    }
}
