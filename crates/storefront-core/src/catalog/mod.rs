//! # Catalog
//!
//! The write and read API of the Storefront catalog, on top of a
//! [`CatalogStore`] backend.
//!
//! The catalog owns every rule the store does not: validation, uniqueness,
//! parent and category references, the delete guards and cycle rejection on
//! parent reassignment. Tree views and listings are derived from a fresh
//! snapshot of the store on every call.
//!
//! ## Storage Backends
//!
//! - `InMemory`: [`MemoryCatalog`] (fast, volatile unless exported)
//! - `Persistent`: [`RedbCatalog`] (disk-backed ACID storage)

mod categories;
mod products;

pub use categories::{BulkCategoryOutcome, ImageReplacement};
pub use products::VariantImagesOutcome;

use crate::formats::CatalogSnapshot;
use crate::memory::MemoryCatalog;
use crate::stats::CatalogStats;
use crate::storage::RedbCatalog;
use crate::store::CatalogStore;
use crate::StoreError;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds since the Unix epoch, 0 if the clock is before it.
fn system_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Storage backend for a catalog.
#[derive(Debug)]
pub enum StorageBackend {
    /// In-memory maps (fast, volatile).
    InMemory(MemoryCatalog),
    /// Disk-backed store using redb (ACID, persistent).
    Persistent(RedbCatalog),
}

impl Default for StorageBackend {
    fn default() -> Self {
        Self::InMemory(MemoryCatalog::new())
    }
}

/// The catalog service.
#[derive(Debug)]
pub struct Catalog {
    backend: StorageBackend,
    clock: fn() -> u64,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::with_backend(StorageBackend::default())
    }
}

impl Catalog {
    /// Create an empty in-memory catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_backend(backend: StorageBackend) -> Self {
        Self {
            backend,
            clock: system_millis,
        }
    }

    /// Open or create a persistent catalog at the given path.
    pub fn with_redb(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        Ok(Self::with_backend(StorageBackend::Persistent(
            RedbCatalog::open(path)?,
        )))
    }

    /// Load a snapshot into a fresh in-memory catalog.
    pub fn from_snapshot(snapshot: CatalogSnapshot) -> Result<Self, StoreError> {
        let mut catalog = Self::new();
        catalog.import_snapshot(snapshot)?;
        Ok(catalog)
    }

    /// Replace the timestamp source. Timestamps are Unix milliseconds.
    #[must_use]
    pub fn with_clock(mut self, clock: fn() -> u64) -> Self {
        self.clock = clock;
        self
    }

    /// Check if this catalog uses persistent storage.
    #[must_use]
    pub fn is_persistent(&self) -> bool {
        matches!(self.backend, StorageBackend::Persistent(_))
    }

    #[must_use]
    pub fn backend(&self) -> &StorageBackend {
        &self.backend
    }

    /// Read access to the underlying store.
    #[must_use]
    pub fn store(&self) -> &dyn CatalogStore {
        match &self.backend {
            StorageBackend::InMemory(store) => store,
            StorageBackend::Persistent(store) => store,
        }
    }

    fn store_mut(&mut self) -> &mut dyn CatalogStore {
        match &mut self.backend {
            StorageBackend::InMemory(store) => store,
            StorageBackend::Persistent(store) => store,
        }
    }

    fn now(&self) -> u64 {
        (self.clock)()
    }

    // =========================================================================
    // SNAPSHOTS
    // =========================================================================

    /// Copy every record and both id counters into a snapshot.
    pub fn snapshot(&self) -> Result<CatalogSnapshot, StoreError> {
        let store = self.store();
        Ok(CatalogSnapshot {
            categories: store.categories()?,
            products: store.products()?,
            next_category_id: store.next_category_id(),
            next_product_id: store.next_product_id(),
        })
    }

    /// Load a snapshot into this catalog. The catalog must be empty.
    pub fn import_snapshot(&mut self, snapshot: CatalogSnapshot) -> Result<(), StoreError> {
        let store = self.store_mut();
        if store.category_count()? > 0 || store.product_count()? > 0 {
            return Err(StoreError::Conflict(
                "import requires an empty catalog".to_string(),
            ));
        }
        store.put_categories(&snapshot.categories)?;
        store.put_products(&snapshot.products)?;
        store.reserve_ids(snapshot.next_category_id, snapshot.next_product_id)
    }

    /// Replace every record of an in-memory catalog with a snapshot.
    ///
    /// Used to undo a change whose snapshot file could not be written. The
    /// clock is kept; a persistent catalog is left untouched.
    pub fn restore_snapshot(&mut self, snapshot: CatalogSnapshot) -> Result<(), StoreError> {
        if self.is_persistent() {
            return Err(StoreError::Conflict(
                "restore requires an in-memory catalog".to_string(),
            ));
        }
        self.backend = StorageBackend::default();
        self.import_snapshot(snapshot)
    }

    /// Record counts and hierarchy shape.
    pub fn stats(&self) -> Result<CatalogStats, StoreError> {
        let categories = self.store().categories()?;
        let products = self.store().products()?;
        Ok(CatalogStats::compute(&categories, &products))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{NewCategory, NewProduct};

    #[test]
    fn new_catalog_is_in_memory_and_empty() {
        let catalog = Catalog::new();
        assert!(!catalog.is_persistent());
        assert_eq!(catalog.store().category_count().expect("count"), 0);
    }

    #[test]
    fn snapshot_roundtrip_keeps_counters() {
        let mut catalog = Catalog::new().with_clock(|| 42);
        let root = catalog
            .create_category(NewCategory::new("Fashion", "fashion"))
            .expect("create");
        let temp = catalog
            .create_category(NewCategory::new("Temp", "temp"))
            .expect("create");
        catalog.delete_category(temp.id).expect("delete");
        catalog
            .create_product(NewProduct::new("Tee", "Acme", root.id, 1_000))
            .expect("create");

        let snapshot = catalog.snapshot().expect("snapshot");
        assert_eq!(snapshot.next_category_id, 3);

        let mut restored = Catalog::from_snapshot(snapshot.clone())
            .expect("restore")
            .with_clock(|| 7);
        assert_eq!(restored.snapshot().expect("snapshot"), snapshot);

        let next = restored
            .create_category(NewCategory::new("Home", "home"))
            .expect("create");
        assert_eq!(next.id.0, 3);
        assert_eq!(next.created_at, 7);
    }

    #[test]
    fn import_requires_empty_catalog() {
        let mut catalog = Catalog::new();
        catalog
            .create_category(NewCategory::new("Fashion", "fashion"))
            .expect("create");
        let snapshot = catalog.snapshot().expect("snapshot");
        assert!(matches!(
            catalog.import_snapshot(snapshot),
            Err(StoreError::Conflict(_))
        ));
    }

    #[test]
    fn restore_snapshot_undoes_later_changes() {
        let mut catalog = Catalog::new().with_clock(|| 9);
        catalog
            .create_category(NewCategory::new("Fashion", "fashion"))
            .expect("create");
        let before = catalog.snapshot().expect("snapshot");

        catalog
            .create_category(NewCategory::new("Garden", "garden"))
            .expect("create");
        catalog.restore_snapshot(before.clone()).expect("restore");
        assert_eq!(catalog.snapshot().expect("snapshot"), before);

        // Same name is free again, and the id counter was rewound.
        let garden = catalog
            .create_category(NewCategory::new("Garden", "garden"))
            .expect("create");
        assert_eq!(garden.id.0, 2);
        assert_eq!(garden.created_at, 9);
    }

    #[test]
    fn restore_snapshot_refuses_persistent_catalog() {
        let temp = tempfile::tempdir().expect("temp dir");
        let mut catalog = Catalog::with_redb(temp.path().join("catalog.redb")).expect("open");
        assert!(matches!(
            catalog.restore_snapshot(CatalogSnapshot::default()),
            Err(StoreError::Conflict(_))
        ));
    }

    #[test]
    fn redb_backend_persists_across_reopen() {
        let temp = tempfile::tempdir().expect("temp dir");
        let path = temp.path().join("catalog.redb");
        {
            let mut catalog = Catalog::with_redb(&path).expect("open");
            assert!(catalog.is_persistent());
            catalog
                .create_category(NewCategory::new("Fashion", "fashion"))
                .expect("create");
        }
        let catalog = Catalog::with_redb(&path).expect("reopen");
        assert_eq!(catalog.store().category_count().expect("count"), 1);
    }
}
