//! Simulator runtime
//!
//! Wires configuration, the document store, the clock and the random
//! source into whichever task the operator asked for. The binary only
//! parses arguments and hands a [`RunOptions`] to [`run`].

use std::fmt;
use std::sync::Arc;

use tokio::io::BufReader;
use tracing::info;

use crate::application::services::{BookingFlow, Seeder};
use crate::application::simulation::{
    run_timed, InteractiveDriver, RandomDriver, RealisticDriver, SimulationContext, SimulationMode,
};
use crate::config::{AppConfig, LogFormat, LoggingConfig};
use crate::domain::DocumentStore;
use crate::infrastructure::{AppwriteStore, InMemoryStore};
use crate::support::errors::AppError;
use crate::support::random::SeededRandom;
use crate::support::shutdown::ShutdownSignal;
use crate::support::time::{Clock, SystemClock};

// ── Options ────────────────────────────────────────────────────────

/// Backend holding the documents
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StoreKind {
    #[default]
    Appwrite,
    /// Process-local store, seeded on startup
    Memory,
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Appwrite => "appwrite",
            Self::Memory => "memory",
        })
    }
}

/// What to do once the store is ready
#[derive(Debug, Clone, PartialEq)]
pub enum Task {
    Seed,
    Simulate {
        mode: SimulationMode,
        iterations: Option<u64>,
    },
    Book {
        user: Option<String>,
    },
}

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub config: AppConfig,
    pub store: StoreKind,
    /// Overrides `simulation.seed`
    pub seed: Option<u64>,
    pub task: Task,
}

// ── Bootstrap ──────────────────────────────────────────────────────

/// Install the global subscriber; `RUST_LOG` wins over `logging.level`.
///
/// Logs go to stderr so the interactive prompt keeps stdout to itself.
pub fn init_tracing(config: &LoggingConfig) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.level));

    match config.format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}

/// Open the configured backend
pub fn build_store(kind: StoreKind, config: &AppConfig) -> Result<Arc<dyn DocumentStore>, AppError> {
    match kind {
        StoreKind::Appwrite => {
            config.validate_remote()?;
            info!(
                endpoint = %config.appwrite.endpoint,
                database_id = %config.appwrite.database_id,
                "🔌 Using Appwrite store"
            );
            Ok(Arc::new(AppwriteStore::new(&config.appwrite)?))
        }
        StoreKind::Memory => {
            info!("🧠 Using in-memory store");
            Ok(Arc::new(InMemoryStore::new()))
        }
    }
}

// ── Run ────────────────────────────────────────────────────────────

/// Run `opts.task` to completion or until `shutdown` fires
pub async fn run(opts: RunOptions, shutdown: ShutdownSignal) -> Result<(), AppError> {
    let RunOptions {
        config,
        store: kind,
        seed,
        task,
    } = opts;
    let store = build_store(kind, &config)?;
    let collections = config.appwrite.collections.clone();
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let seeder = Seeder::new(store.clone(), collections.clone(), clock.clone());

    if kind == StoreKind::Memory && task != Task::Seed {
        seeder.run().await;
    }

    let seed = seed.or(config.simulation.seed);
    if let Some(seed) = seed {
        info!(seed, "🎲 Reproducible random source");
    }
    let mut ctx = SimulationContext::new(
        store,
        collections,
        clock,
        Box::new(SeededRandom::new(seed)),
    );
    let time_unit = config.simulation.time_unit();

    match task {
        Task::Seed => {
            let report = seeder.run().await;
            println!(
                "Created {} stations, {} slots, {} users, {} bookings ({} slots available)",
                report.stations, report.slots, report.users, report.bookings, report.available_slots
            );
        }
        Task::Simulate { mode, iterations } => {
            ctx.load().await?;
            info!(mode = %mode, store = %kind, "🚦 Starting simulation");
            match mode {
                SimulationMode::Random => {
                    let mut driver = RandomDriver::new(ctx, time_unit);
                    run_timed(&mut driver, &shutdown, iterations).await;
                }
                SimulationMode::Realistic => {
                    let mut driver = RealisticDriver::new(ctx, time_unit);
                    run_timed(&mut driver, &shutdown, iterations).await;
                }
                SimulationMode::Interactive => {
                    let mut driver = InteractiveDriver::new(ctx);
                    let input = BufReader::new(tokio::io::stdin());
                    let mut output = tokio::io::stdout();
                    driver.run(input, &mut output, &shutdown).await?;
                }
            }
        }
        Task::Book { user } => {
            ctx.load().await?;
            let mut flow = BookingFlow::new(ctx);
            let user = match user {
                Some(user) => user,
                None => flow.default_user().await,
            };
            let handle = flow.run_cycle(&user, time_unit * 2).await?;
            println!(
                "Booking {} for {} on slot {} is {} (total {:.2})",
                handle.booking_id(),
                handle.booking.user_id,
                handle.slot_id(),
                handle.booking.status,
                handle.booking.total_price
            );
        }
    }

    info!("👋 ParkCharge simulator finished");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appwrite_store_requires_credentials() {
        let config = AppConfig::default();
        let err = build_store(StoreKind::Appwrite, &config).err().unwrap();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[tokio::test]
    async fn memory_simulation_runs_bounded() {
        let mut config = AppConfig::default();
        config.simulation.time_unit_ms = 1;
        let opts = RunOptions {
            config,
            store: StoreKind::Memory,
            seed: Some(7),
            task: Task::Simulate {
                mode: SimulationMode::Random,
                iterations: Some(3),
            },
        };
        run(opts, ShutdownSignal::new()).await.unwrap();
    }

    #[tokio::test]
    async fn empty_store_is_fatal() {
        let store: Arc<dyn DocumentStore> = Arc::new(InMemoryStore::new());
        let mut ctx = SimulationContext::new(
            store,
            AppConfig::default().appwrite.collections,
            Arc::new(SystemClock),
            Box::new(SeededRandom::from_seed(1)),
        );
        let err: AppError = ctx.load().await.unwrap_err().into();
        assert!(matches!(
            err,
            AppError::Domain(crate::domain::DomainError::MissingData(_))
        ));
    }
}
