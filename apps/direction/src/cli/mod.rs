//! # Direction Companion CLI Module
//!
//! ## Available Commands
//!
//! - `server` - Start the HTTP server
//! - `init` - Initialize a new database
//! - `create` - Create a reflection from a JSON file
//! - `show` - Print a stored reflection
//! - `email` - Record a (simulated) email target
//! - `export` - Write a PDF or XLSX summary to disk
//! - `status` - Store diagnostics (default)

mod commands;

use crate::config::{AppConfig, StorageConfig};
use clap::{Parser, Subcommand};
use direction_core::DirectionError;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Direction Companion
///
/// Turns a five-question reflection into distilled guidance, and keeps it
/// for later reading, emailing or export.
#[derive(Parser, Debug)]
#[command(name = "direction")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the reflection database (overrides the config file)
    #[arg(short = 'D', long, global = true)]
    pub database: Option<PathBuf>,

    /// Storage backend: "redb" (persistent) or "memory" (volatile)
    #[arg(short = 'B', long, global = true)]
    pub backend: Option<String>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start HTTP server
    Server {
        /// Host to bind to (overrides the config file)
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to (overrides the config file)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Initialize a new empty database
    Init {
        /// Force initialization even if database exists
        #[arg(short, long)]
        force: bool,
    },

    /// Create a reflection from a JSON file with the five answers
    Create {
        /// Path to the input file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Print a stored reflection
    Show {
        /// Reflection identifier (24 hex characters)
        id: String,
    },

    /// Record an email target for a reflection (nothing is sent)
    Email {
        /// Reflection identifier
        id: String,

        /// Destination address
        address: String,
    },

    /// Export a reflection summary
    Export {
        /// Reflection identifier
        id: String,

        /// Export format (pdf, xlsx)
        #[arg(short = 't', long, default_value = "pdf")]
        format: String,

        /// Output file path (defaults to the suggested download name)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show store diagnostics
    Status,
}

impl Cli {
    /// Storage settings after applying `-D` and `-B` over the config file.
    #[must_use]
    pub fn storage_config(&self, config: &AppConfig) -> StorageConfig {
        let mut storage = config.storage.clone();
        if let Some(path) = &self.database {
            storage.path = path.clone();
        }
        if let Some(backend) = &self.backend {
            storage.backend = backend.clone();
        }
        storage
    }
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), DirectionError> {
    let config = AppConfig::load(cli.config.as_deref())?;
    let storage = cli.storage_config(&config);
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Server { host, port }) => {
            let mut server = config.server.clone();
            if let Some(host) = host {
                server.host = host;
            }
            if let Some(port) = port {
                server.port = port;
            }
            let security = config.security.clone().with_env_overrides();
            cmd_server(&storage, &server, &security).await
        }
        Some(Commands::Init { force }) => cmd_init(&storage, force),
        Some(Commands::Create { file }) => cmd_create(&storage, json_mode, &file),
        Some(Commands::Show { id }) => cmd_show(&storage, json_mode, &id),
        Some(Commands::Email { id, address }) => cmd_email(&storage, json_mode, &id, &address),
        Some(Commands::Export { id, format, output }) => {
            cmd_export(&storage, &id, &format, output.as_deref())
        }
        Some(Commands::Status) | None => cmd_status(&storage, json_mode),
    }
}

// =============================================================================
// TESTS
// =============================================================================
