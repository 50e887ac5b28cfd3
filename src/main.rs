//! ParkCharge simulator CLI
//!
//! ```sh
//! # Write the demo catalog to Appwrite
//! parkcharge-sim seed
//!
//! # Live simulation against a throwaway in-memory store
//! parkcharge-sim --store memory simulate --mode realistic --iterations 20
//!
//! # Drive slots by hand
//! parkcharge-sim simulate --mode interactive
//! ```

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use tracing::{error, info};

use parkcharge_sim::application::simulation::SimulationMode;
use parkcharge_sim::support::shutdown::start_signal_listener;
use parkcharge_sim::{
    init_tracing, resolve_config_path, run, AppConfig, RunOptions, ShutdownSignal, StoreKind, Task,
};

/// Demo data seeder and live slot simulator for ParkCharge.
#[derive(Parser, Debug)]
#[command(
    name = "parkcharge-sim",
    version,
    about = "Seed and simulate ParkCharge station slots",
    long_about = "Seeds the ParkCharge demo catalog and simulates live slot \
                  status changes against Appwrite.\n\n\
                  Default config: ~/.config/parkcharge/config.toml"
)]
struct Cli {
    /// Path to the configuration file (TOML).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Document store backend.
    #[arg(long, value_enum, default_value_t = StoreArg::Appwrite, global = true)]
    store: StoreArg,

    /// Seed for a reproducible random sequence.
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand, Debug)]
enum CliCommand {
    /// Write sample stations, slots, users and bookings.
    Seed,

    /// Run a simulation driver.
    Simulate {
        #[arg(short, long, value_enum, default_value_t = ModeArg::Random)]
        mode: ModeArg,

        /// Stop after this many iterations (timed modes only).
        #[arg(short = 'n', long)]
        iterations: Option<u64>,
    },

    /// Run one reserve, occupy, complete booking cycle.
    Book {
        /// User ID to book for; defaults to the first stored user.
        #[arg(short, long)]
        user: Option<String>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum StoreArg {
    Appwrite,
    Memory,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ModeArg {
    Random,
    Realistic,
    Interactive,
}

impl From<StoreArg> for StoreKind {
    fn from(arg: StoreArg) -> Self {
        match arg {
            StoreArg::Appwrite => StoreKind::Appwrite,
            StoreArg::Memory => StoreKind::Memory,
        }
    }
}

impl From<ModeArg> for SimulationMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Random => SimulationMode::Random,
            ModeArg::Realistic => SimulationMode::Realistic,
            ModeArg::Interactive => SimulationMode::Interactive,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    // ── Load configuration ─────────────────────────────────────
    let config_path = resolve_config_path(cli.config);
    let loaded = AppConfig::load(&config_path);
    let mut config = match loaded {
        Ok(cfg) => {
            init_tracing(&cfg.logging);
            info!("Configuration loaded from {}", config_path.display());
            cfg
        }
        Err(e) => {
            let cfg = AppConfig::default();
            init_tracing(&cfg.logging);
            error!("Failed to load config: {}", e);
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };
    config.apply_env();

    let task = match cli.command {
        CliCommand::Seed => Task::Seed,
        CliCommand::Simulate { mode, iterations } => Task::Simulate {
            mode: mode.into(),
            iterations,
        },
        CliCommand::Book { user } => Task::Book { user },
    };
    let opts = RunOptions {
        config,
        store: cli.store.into(),
        seed: cli.seed,
        task,
    };

    // ── Runtime ────────────────────────────────────────────────
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to start runtime: {}", e);
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let outcome = runtime.block_on(async {
        let shutdown = ShutdownSignal::new();
        start_signal_listener(&shutdown);
        run(opts, shutdown).await
    });

    // A pending stdin read would otherwise keep the runtime alive
    runtime.shutdown_timeout(Duration::from_millis(200));

    if let Err(e) = outcome {
        error!("{}", e);
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
