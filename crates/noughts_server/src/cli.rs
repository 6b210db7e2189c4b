//! Command-line interface for the noughts server.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Noughts - two-player match server
#[derive(Parser, Debug)]
#[command(name = "noughts")]
#[command(about = "Two-player noughts match server", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "noughts.toml", global = true)]
    pub config: PathBuf,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP game server
    Serve {
        /// Port to bind to (overrides config)
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Path to the database file (overrides config)
        #[arg(long)]
        db_path: Option<String>,
    },

    /// Apply pending database migrations and exit
    Migrate {
        /// Path to the database file (overrides config)
        #[arg(long)]
        db_path: Option<String>,
    },

    /// Print win/draw counts of stored games
    Stats {
        /// Path to the database file (overrides config)
        #[arg(long)]
        db_path: Option<String>,
    },
}
