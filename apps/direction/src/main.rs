//! # Direction Companion Server
//!
//! The main binary for the Direction Companion reflection service.
//!
//! This application provides:
//! - HTTP REST API server (axum-based)
//! - CLI interface for reflection operations
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────┐
//! │             apps/direction (THE BINARY)           │
//! │                                                   │
//! │   ┌─────────────┐   ┌─────────────┐   ┌────────┐  │
//! │   │   CLI       │   │  HTTP API   │   │ Config │  │
//! │   │  (clap)     │   │  (axum)     │   │ (toml) │  │
//! │   └──────┬──────┘   └──────┬──────┘   └───┬────┘  │
//! │          └─────────────────┼──────────────┘       │
//! │                            ▼                      │
//! │                   ┌────────────────┐              │
//! │                   │ direction-core │              │
//! │                   │  (THE LOGIC)   │              │
//! │                   └────────────────┘              │
//! └───────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Start the HTTP server
//! direction server --host 0.0.0.0 --port 8000
//!
//! # CLI operations
//! direction status
//! direction create -f answers.json
//! direction export 6530f1c2000000000000002a -t xlsx
//! ```

use clap::Parser;
use direction::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    let cli = cli::Cli::parse();

    init_tracing(cli.verbose);

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Install the global subscriber. `DIRECTION_LOG_FORMAT=json` switches to
/// machine-parseable output; `RUST_LOG` overrides the filter.
fn init_tracing(verbose: bool) {
    let log_format = std::env::var("DIRECTION_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let default_filter = if verbose {
        "direction=debug,tower_http=debug"
    } else {
        "direction=info,tower_http=debug"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }
}

/// Print the startup banner.
fn print_banner() {
    println!(
        r#"
  ┌┬┐┬┬─┐┌─┐┌─┐┌┬┐┬┌─┐┌┐┌
   │││├┬┘├┤ │   │ ││ ││││
  ─┴┘┴┴└─└─┘└─┘ ┴ ┴└─┘┘└┘

  Direction Companion v{}

  Reflect • Distill • Act
"#,
        env!("CARGO_PKG_VERSION")
    );
}
