//! # Formats
//!
//! On-disk representations of the catalog.

pub mod snapshot;

pub use snapshot::{CatalogSnapshot, MAX_SNAPSHOT_SIZE, SnapshotHeader, checksum};

#[cfg(feature = "crypto-hash")]
pub use snapshot::crypto_hash;
