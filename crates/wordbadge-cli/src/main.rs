//! # Wordbadge CLI
//!
//! Command-line interface for the Wordbadge word membership store.
//!
//! ## Commands
//!
//! - `wordbadge init` - Open the store, building it if missing or stale
//! - `wordbadge rebuild` - Rebuild if the selected edition changed
//! - `wordbadge lookup <words>...` - Show which lists contain each word
//! - `wordbadge status` - Show store status and statistics
//! - `wordbadge edition [<id>]` - Show or change the scrabble edition
//! - `wordbadge clear` - Delete the store
//!
//! ## Example Usage
//!
//! ```bash
//! # Build the store from the word lists in the resource directory
//! wordbadge init
//!
//! # Look up a few words
//! wordbadge lookup apple tree zebra
//!
//! # Switch to Collins and rebuild
//! wordbadge edition collins2019
//! ```

mod app;
mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Wordbadge - Which word lists contain a word
#[derive(Parser)]
#[command(name = "wordbadge")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, env = "WORDBADGE_CONFIG")]
    config: Option<PathBuf>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the store, building it if missing or stale
    Init,

    /// Rebuild the store if the selected edition or schema changed
    Rebuild,

    /// Show which lists contain each word
    #[command(alias = "l")]
    Lookup {
        /// Words to look up (case-insensitive)
        #[arg(required = true)]
        words: Vec<String>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        output: OutputFormat,
    },

    /// Show store status and statistics
    Status,

    /// Show the selected scrabble edition, or select a new one
    Edition {
        /// Edition id to select (e.g. nwl2023, nwl2020, collins2019)
        id: Option<String>,
    },

    /// Delete the store
    Clear {
        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Clone, Debug, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = match &cli.config {
        Some(path) => wordbadge_core::Config::load_from(path)?,
        None => wordbadge_core::Config::load()?,
    };

    // Setup logging
    let log_level = if cli.quiet {
        "error".to_string()
    } else {
        match cli.verbose {
            0 => config.general.log_level.clone(),
            1 => "debug".to_string(),
            _ => "trace".to_string(),
        }
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_level)))
        .init();

    // Execute command
    match cli.command {
        Commands::Init => commands::init::run(config),
        Commands::Rebuild => commands::rebuild::run(config),
        Commands::Lookup { words, output } => commands::lookup::run(config, &words, output),
        Commands::Status => commands::status::run(config),
        Commands::Edition { id } => commands::edition::run(config, id.as_deref()),
        Commands::Clear { yes } => commands::clear::run(config, yes),
    }
}
