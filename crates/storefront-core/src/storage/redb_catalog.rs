//! # redb-backed Catalog Storage
//!
//! A disk-backed [`CatalogStore`] on the redb embedded database, giving the
//! catalog ACID transactions and crash safety without a database server.
//!
//! Records are postcard-encoded and keyed by their numeric id. The id
//! counters live in a small metadata table so that ids are never reused
//! across restarts.

use crate::store::CatalogStore;
use crate::{Category, CategoryId, Product, ProductId, StoreError};
use redb::{Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;

/// Table for categories: CategoryId(u64) -> serialized Category bytes
const CATEGORIES: TableDefinition<u64, &[u8]> = TableDefinition::new("categories");

/// Table for products: ProductId(u64) -> serialized Product bytes
const PRODUCTS: TableDefinition<u64, &[u8]> = TableDefinition::new("products");

/// Table for metadata: key string -> value u64
const METADATA: TableDefinition<&str, u64> = TableDefinition::new("metadata");

const NEXT_CATEGORY_KEY: &str = "next_category_id";
const NEXT_PRODUCT_KEY: &str = "next_product_id";

/// First id handed out by a fresh database.
const FIRST_ID: u64 = 1;

fn io_err(e: impl std::fmt::Display) -> StoreError {
    StoreError::IoError(e.to_string())
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, StoreError> {
    postcard::to_allocvec(value).map_err(|e| StoreError::SerializationError(e.to_string()))
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, StoreError> {
    postcard::from_bytes(bytes).map_err(|e| StoreError::DeserializationError(e.to_string()))
}

/// A disk-backed catalog store using redb.
///
/// Id counters are cached in memory and written through on every insert.
pub struct RedbCatalog {
    db: Database,
    next_category_id: u64,
    next_product_id: u64,
}

impl std::fmt::Debug for RedbCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbCatalog")
            .field("next_category_id", &self.next_category_id)
            .field("next_product_id", &self.next_product_id)
            .finish_non_exhaustive()
    }
}

impl RedbCatalog {
    /// Open or create a catalog database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let db = Database::create(path.as_ref()).map_err(io_err)?;

        // Initialize tables if they don't exist
        {
            let write_txn = db.begin_write().map_err(io_err)?;
            let _ = write_txn.open_table(CATEGORIES).map_err(io_err)?;
            let _ = write_txn.open_table(PRODUCTS).map_err(io_err)?;
            let _ = write_txn.open_table(METADATA).map_err(io_err)?;
            write_txn.commit().map_err(io_err)?;
        }

        let (next_category_id, next_product_id) = {
            let read_txn = db.begin_read().map_err(io_err)?;
            let table = read_txn.open_table(METADATA).map_err(io_err)?;
            let read = |key: &str| -> Result<u64, StoreError> {
                Ok(table
                    .get(key)
                    .map_err(io_err)?
                    .map(|v| v.value())
                    .unwrap_or(FIRST_ID))
            };
            (read(NEXT_CATEGORY_KEY)?, read(NEXT_PRODUCT_KEY)?)
        };

        Ok(Self {
            db,
            next_category_id,
            next_product_id,
        })
    }

    /// Compact the database file.
    pub fn compact(&mut self) -> Result<(), StoreError> {
        self.db.compact().map_err(io_err)?;
        Ok(())
    }

    /// Write rows and the matching id counter in one transaction.
    fn write_rows(
        &self,
        table_def: TableDefinition<u64, &[u8]>,
        rows: &[(u64, Vec<u8>)],
        counter: (&str, u64),
    ) -> Result<(), StoreError> {
        let write_txn = self.db.begin_write().map_err(io_err)?;
        {
            let mut table = write_txn.open_table(table_def).map_err(io_err)?;
            for (key, bytes) in rows {
                table.insert(*key, bytes.as_slice()).map_err(io_err)?;
            }
        }
        {
            let mut meta = write_txn.open_table(METADATA).map_err(io_err)?;
            meta.insert(counter.0, counter.1).map_err(io_err)?;
        }
        write_txn.commit().map_err(io_err)?;
        Ok(())
    }

    fn write_counters(&self) -> Result<(), StoreError> {
        let write_txn = self.db.begin_write().map_err(io_err)?;
        {
            let mut meta = write_txn.open_table(METADATA).map_err(io_err)?;
            meta.insert(NEXT_CATEGORY_KEY, self.next_category_id)
                .map_err(io_err)?;
            meta.insert(NEXT_PRODUCT_KEY, self.next_product_id)
                .map_err(io_err)?;
        }
        write_txn.commit().map_err(io_err)?;
        Ok(())
    }

    fn read_row<T: DeserializeOwned>(
        &self,
        table_def: TableDefinition<u64, &[u8]>,
        key: u64,
    ) -> Result<Option<T>, StoreError> {
        let read_txn = self.db.begin_read().map_err(io_err)?;
        let table = read_txn.open_table(table_def).map_err(io_err)?;
        let row = match table.get(key).map_err(io_err)? {
            Some(guard) => Some(decode(guard.value())?),
            None => None,
        };
        Ok(row)
    }

    fn remove_row<T: DeserializeOwned>(
        &self,
        table_def: TableDefinition<u64, &[u8]>,
        key: u64,
    ) -> Result<Option<T>, StoreError> {
        let write_txn = self.db.begin_write().map_err(io_err)?;
        let removed = {
            let mut table = write_txn.open_table(table_def).map_err(io_err)?;
            let old = table.remove(key).map_err(io_err)?;
            match old {
                Some(guard) => Some(decode(guard.value())?),
                None => None,
            }
        };
        write_txn.commit().map_err(io_err)?;
        Ok(removed)
    }

    fn read_all<T: DeserializeOwned>(
        &self,
        table_def: TableDefinition<u64, &[u8]>,
    ) -> Result<Vec<T>, StoreError> {
        let read_txn = self.db.begin_read().map_err(io_err)?;
        let table = read_txn.open_table(table_def).map_err(io_err)?;
        let mut out = Vec::new();
        for entry in table.iter().map_err(io_err)? {
            let (_, value) = entry.map_err(io_err)?;
            out.push(decode(value.value())?);
        }
        Ok(out)
    }

    fn row_count(&self, table_def: TableDefinition<u64, &[u8]>) -> Result<usize, StoreError> {
        let read_txn = self.db.begin_read().map_err(io_err)?;
        let table = read_txn.open_table(table_def).map_err(io_err)?;
        let len = table.len().map_err(io_err)?;
        Ok(len as usize)
    }
}

impl CatalogStore for RedbCatalog {
    fn allocate_category_id(&mut self) -> Result<CategoryId, StoreError> {
        let id = CategoryId(self.next_category_id);
        self.next_category_id = self.next_category_id.saturating_add(1);
        Ok(id)
    }

    fn allocate_product_id(&mut self) -> Result<ProductId, StoreError> {
        let id = ProductId(self.next_product_id);
        self.next_product_id = self.next_product_id.saturating_add(1);
        Ok(id)
    }

    fn next_category_id(&self) -> u64 {
        self.next_category_id
    }

    fn next_product_id(&self) -> u64 {
        self.next_product_id
    }

    fn reserve_ids(&mut self, next_category: u64, next_product: u64) -> Result<(), StoreError> {
        self.next_category_id = self.next_category_id.max(next_category);
        self.next_product_id = self.next_product_id.max(next_product);
        self.write_counters()
    }

    fn put_category(&mut self, category: &Category) -> Result<(), StoreError> {
        self.put_categories(std::slice::from_ref(category))
    }

    fn put_categories(&mut self, categories: &[Category]) -> Result<(), StoreError> {
        let mut rows = Vec::with_capacity(categories.len());
        let mut next = self.next_category_id;
        for category in categories {
            rows.push((category.id.0, encode(category)?));
            next = next.max(category.id.0.saturating_add(1));
        }
        self.write_rows(CATEGORIES, &rows, (NEXT_CATEGORY_KEY, next))?;
        self.next_category_id = next;
        Ok(())
    }

    fn get_category(&self, id: CategoryId) -> Result<Option<Category>, StoreError> {
        self.read_row(CATEGORIES, id.0)
    }

    fn remove_category(&mut self, id: CategoryId) -> Result<Option<Category>, StoreError> {
        self.remove_row(CATEGORIES, id.0)
    }

    fn categories(&self) -> Result<Vec<Category>, StoreError> {
        self.read_all(CATEGORIES)
    }

    fn category_count(&self) -> Result<usize, StoreError> {
        self.row_count(CATEGORIES)
    }

    fn put_product(&mut self, product: &Product) -> Result<(), StoreError> {
        self.put_products(std::slice::from_ref(product))
    }

    fn put_products(&mut self, products: &[Product]) -> Result<(), StoreError> {
        let mut rows = Vec::with_capacity(products.len());
        let mut next = self.next_product_id;
        for product in products {
            rows.push((product.id.0, encode(product)?));
            next = next.max(product.id.0.saturating_add(1));
        }
        self.write_rows(PRODUCTS, &rows, (NEXT_PRODUCT_KEY, next))?;
        self.next_product_id = next;
        Ok(())
    }

    fn get_product(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        self.read_row(PRODUCTS, id.0)
    }

    fn remove_product(&mut self, id: ProductId) -> Result<Option<Product>, StoreError> {
        self.remove_row(PRODUCTS, id.0)
    }

    fn products(&self) -> Result<Vec<Product>, StoreError> {
        self.read_all(PRODUCTS)
    }

    fn product_count(&self) -> Result<usize, StoreError> {
        self.row_count(PRODUCTS)
    }
}
