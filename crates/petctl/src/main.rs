// Pet control CLI
// Simulate learning pets and inspect what they learned

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "petctl")]
#[command(about = "Virtual pet simulation CLI", version)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a pet for a number of ticks
    Simulate {
        /// Pet name
        #[arg(short, long, default_value = "Buddy")]
        name: String,

        /// Pet species
        #[arg(long, default_value = "dog")]
        species: String,

        /// Number of ticks to simulate
        #[arg(short, long, default_value = "500")]
        ticks: u32,

        /// Seed for reproducible runs
        #[arg(long)]
        seed: Option<u64>,

        /// JSON config file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Pet save file; resumed if present and written afterwards
        #[arg(short, long)]
        save: Option<PathBuf>,

        /// Policy choosing autonomous actions
        #[arg(short, long, value_enum, default_value = "learned")]
        policy: PolicyKind,

        /// Simulated seconds per tick
        #[arg(long, default_value = "600")]
        tick_seconds: u64,
    },

    /// Show learning stats for a saved pet
    Inspect {
        /// Pet save file
        #[arg(short, long)]
        save: PathBuf,

        /// Number of learned states to list
        #[arg(short = 'n', long, default_value = "10")]
        states: usize,
    },

    /// Print the default behavior tree as JSON
    Tree,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum PolicyKind {
    /// Double Q-learning
    Learned,
    /// Uniform random baseline
    Random,
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Simulate {
            name,
            species,
            ticks,
            seed,
            config,
            save,
            policy,
            tick_seconds,
        } => {
            let options = commands::SimulateOptions {
                name,
                species,
                ticks,
                seed,
                config,
                save,
                random_policy: policy == PolicyKind::Random,
                tick_seconds,
            };
            commands::simulate(options).await?;
        }

        Commands::Inspect { save, states } => {
            commands::inspect(&save, states).await?;
        }

        Commands::Tree => {
            commands::print_tree()?;
        }
    }

    Ok(())
}
