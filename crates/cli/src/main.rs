//! Settle CLI - settle command

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;
use watcher::config::MAX_DEBOUNCE_MS;

mod cmd;

/// Settle - report file changes once they have stopped changing
#[derive(Parser)]
#[command(name = "settle")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch directories and print settled events until Ctrl-C
    Watch {
        /// Directories (or files) to watch, non-recursively
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Quiet period in milliseconds (overrides the config file)
        #[arg(short, long, value_parser = clap::value_parser!(u64).range(1..=MAX_DEBOUNCE_MS))]
        debounce_ms: Option<u64>,

        /// Report files that were created and removed within one window
        #[arg(long)]
        keep_temporary: bool,

        /// TOML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Print one JSON object per event
        #[arg(long)]
        json: bool,
    },
    /// Print the effective configuration as TOML
    Config {
        /// TOML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays machine-readable
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Watch {
            paths,
            debounce_ms,
            keep_temporary,
            config,
            json,
        } => {
            let options = cmd::watch::WatchOptions {
                debounce_ms,
                keep_temporary,
                config,
                json,
            };
            cmd::watch::run(&paths, options).await
        }
        Commands::Config { config } => cmd::config::run(config.as_deref()).await,
    }
}
