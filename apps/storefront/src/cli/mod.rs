//! # Storefront CLI Module
//!
//! This module implements the CLI interface for Storefront.
//!
//! ## Available Commands
//!
//! - `init` - Initialize a new catalog database
//! - `server` - Start the HTTP server
//! - `status` - Show catalog counts and forest shape
//! - `tree` - Print the category tree
//! - `audit` - Report category data-integrity issues
//! - `descendants` - List a category and everything below it
//! - `import-categories` - Bulk-create categories from a JSON file
//! - `export` - Export the catalog to a snapshot file
//! - `import` - Import a snapshot into an empty catalog

mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use std::fmt;
use std::path::PathBuf;
use storefront_core::StoreError;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Storefront - hierarchical product catalog server
///
/// Categories form a forest through parent references; every tree view is
/// derived from the stored records on demand.
#[derive(Parser, Debug)]
#[command(name = "storefront")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the catalog database
    #[arg(short = 'D', long, global = true, default_value = "storefront.db")]
    pub database: PathBuf,

    /// Storage backend
    #[arg(short = 'B', long, global = true, value_enum, default_value_t = Backend::Redb)]
    pub backend: Backend,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Server configuration file (TOML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Storage backend of the catalog database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// ACID database (redb)
    Redb,
    /// Whole-catalog snapshot file, rewritten after every change
    File,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Redb => write!(f, "redb"),
            Self::File => write!(f, "file"),
        }
    }
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start HTTP server
    Server {
        /// Host to bind to
        #[arg(short = 'H', long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },

    /// Show catalog status
    Status,

    /// Print the category tree
    Tree,

    /// Report dangling parents, cycles and duplicate ids
    Audit,

    /// List a category and all its descendants
    Descendants {
        /// Category id
        #[arg(short, long)]
        id: u64,
    },

    /// Bulk-create categories from a JSON file
    ImportCategories {
        /// Path to the JSON file (`{"categories": [...]}` or a bare array)
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Export the catalog as a snapshot file
    Export {
        /// Output file path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Import a snapshot file into an empty catalog
    Import {
        /// Input file path
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Initialize a new empty database
    Init {
        /// Force initialization even if database exists
        #[arg(short, long)]
        force: bool,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), StoreError> {
    let db = cli.database.as_path();
    let backend = cli.backend;
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Server { host, port }) => {
            cmd_server(db, backend, cli.config.as_deref(), &host, port).await
        }
        Some(Commands::Status) => cmd_status(db, backend, json_mode),
        Some(Commands::Tree) => cmd_tree(db, backend, json_mode),
        Some(Commands::Audit) => cmd_audit(db, backend, json_mode),
        Some(Commands::Descendants { id }) => cmd_descendants(db, backend, json_mode, id),
        Some(Commands::ImportCategories { file }) => {
            cmd_import_categories(db, backend, json_mode, &file)
        }
        Some(Commands::Export { output }) => cmd_export(db, backend, &output),
        Some(Commands::Import { input }) => cmd_import(db, backend, &input),
        Some(Commands::Init { force }) => cmd_init(db, backend, force),
        None => {
            // No subcommand - show status by default
            cmd_status(db, backend, json_mode)
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
