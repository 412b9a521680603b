//! # Storefront - Hierarchical Catalog Server
//!
//! The main binary for the Storefront product catalog.
//!
//! This application provides:
//! - HTTP REST API server (axum-based)
//! - CLI interface for catalog operations
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                apps/storefront (THE BINARY)              │
//! │                                                          │
//! │   ┌─────────────┐   ┌─────────────┐   ┌──────────────┐   │
//! │   │    CLI      │   │  HTTP API   │   │  Media host  │   │
//! │   │   (clap)    │   │   (axum)    │   │  (cleanup)   │   │
//! │   └──────┬──────┘   └──────┬──────┘   └──────┬───────┘   │
//! │          └─────────────────┼─────────────────┘           │
//! │                            ▼                             │
//! │                  ┌──────────────────┐                    │
//! │                  │ storefront-core  │                    │
//! │                  │  (THE CATALOG)   │                    │
//! │                  └──────────────────┘                    │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Start the HTTP server
//! storefront server --host 0.0.0.0 --port 8080 --config storefront.toml
//!
//! # CLI operations
//! storefront import-categories -f categories.json
//! storefront tree
//! storefront descendants --id 3
//! ```

use clap::Parser;
use storefront::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // STOREFRONT_LOG_FORMAT=json enables machine-parseable output.
    let log_format =
        std::env::var("STOREFRONT_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "storefront=info,tower_http=debug".into());

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

    let cli = cli::Cli::parse();

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the Storefront startup banner.
fn print_banner() {
    println!(
        r#"
  ┌─┐┌┬┐┌─┐┬─┐┌─┐┌─┐┬─┐┌─┐┌┐┌┌┬┐
  └─┐ │ │ │├┬┘├┤ ├┤ ├┬┘│ ││││ │
  └─┘ ┴ └─┘┴└─└─┘└  ┴└─└─┘┘└┘ ┴

  Hierarchical Catalog Server v{}
"#,
        env!("CARGO_PKG_VERSION")
    );
}
