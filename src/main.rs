//! Atomgraph CLI entry point

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

/// Environment variable holding a full `tracing` filter, overriding `--verbose`.
const LOG_ENV: &str = "ATOMGRAPH_LOG";

#[derive(Parser)]
#[command(name = "atomgraph")]
#[command(
    about = "Integrity checks and conflict resolution for atom documentation stores",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Store root path (defaults to current directory)
    #[arg(short, long, default_value = ".", global = true)]
    root: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Check the atom graph for broken, inconsistent and circular links
    Check {
        /// Print the report but always exit successfully
        #[arg(long)]
        report_only: bool,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Merge three versions of an atom record and print the result as JSON
    Merge {
        /// Common ancestor version
        #[arg(long)]
        base: PathBuf,

        /// Locally edited version
        #[arg(long)]
        local: PathBuf,

        /// Remotely edited version
        #[arg(long)]
        remote: PathBuf,

        /// last_write_wins, field_level or three_way (defaults to the store config)
        #[arg(short, long)]
        strategy: Option<String>,

        /// ISO-8601 modification time of the local version
        #[arg(long)]
        local_timestamp: Option<String>,

        /// ISO-8601 modification time of the remote version
        #[arg(long)]
        remote_timestamp: Option<String>,
    },
    /// List every atom upstream and downstream of an atom
    Impact {
        /// Atom id
        atom_id: String,
    },
    /// Show version
    Version,
}

fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    let filter = std::env::var(LOG_ENV).unwrap_or_else(|_| {
        format!(
            "atomgraph={0},atomgraph_core={0},atomgraph_loader={0},atomgraph_merge={0}",
            log_level
        )
    });
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(filter))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::debug!("Atomgraph v{}", env!("CARGO_PKG_VERSION"));
    tracing::debug!("Store root: {}", cli.root.display());

    match cli.command {
        Commands::Check { report_only, json } => commands::check(&cli.root, report_only, json),
        Commands::Merge {
            base,
            local,
            remote,
            strategy,
            local_timestamp,
            remote_timestamp,
        } => commands::merge(
            &cli.root,
            commands::MergeFiles {
                base,
                local,
                remote,
            },
            strategy,
            local_timestamp,
            remote_timestamp,
        ),
        Commands::Impact { atom_id } => commands::impact(&cli.root, &atom_id),
        Commands::Version => {
            println!("Atomgraph v{}", env!("CARGO_PKG_VERSION"));
            Ok(ExitCode::SUCCESS)
        }
    }
}
