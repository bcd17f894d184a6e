//! # cymod - Cypher Model Loader
//!
//! The command-line front end of the cymod translator.
//!
//! ## Usage
//!
//! ```bash
//! # Show the load order of a model directory
//! cymod plan --dir model/
//!
//! # Print the query stream with parameters inlined
//! cymod render --dir model/ --globals globals.yaml --inline
//!
//! # Load a transition table into a journal
//! cymod load --table transitions.csv --start-col from --end-col to
//!
//! # Run a whole load plan
//! cymod load --config cymod.toml
//! ```

use clap::Parser;
use cymod::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

fn main() {
    let cli = cli::Cli::parse();

    // CYMOD_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("CYMOD_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let default_filter = if cli.verbose {
        "cymod=debug,cymod_core=debug"
    } else {
        "cymod=info,cymod_core=info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    // Logs go to stderr; stdout carries command output.
    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    if !cli.quiet && !cli.json_mode {
        eprintln!("cymod v{}", env!("CARGO_PKG_VERSION"));
    }

    if let Err(e) = cli::execute(cli) {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}
