//! # Persistent Storage
//!
//! Disk-backed catalog storage built on redb.

mod redb_catalog;

pub use redb_catalog::RedbCatalog;
