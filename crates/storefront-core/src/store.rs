//! # Catalog Store
//!
//! The storage seam of the catalog. Both the in-memory [`MemoryCatalog`] and
//! the disk-backed [`RedbCatalog`] implement [`CatalogStore`], so every
//! catalog operation works unchanged on either backend.
//!
//! Stores are dumb record containers: they never validate, never derive the
//! hierarchy and never check references. That is the job of
//! [`Catalog`](crate::catalog::Catalog).
//!
//! [`MemoryCatalog`]: crate::memory::MemoryCatalog
//! [`RedbCatalog`]: crate::storage::RedbCatalog

use crate::{Category, CategoryId, Product, ProductId, StoreError};

/// Record storage shared by all catalog backends.
///
/// Listing methods return records in ascending id order.
pub trait CatalogStore {
    /// Reserve the next category id.
    ///
    /// Ids are never reused, even after the record is removed.
    fn allocate_category_id(&mut self) -> Result<CategoryId, StoreError>;

    /// Reserve the next product id.
    fn allocate_product_id(&mut self) -> Result<ProductId, StoreError>;

    /// The id the next `allocate_category_id` call will hand out.
    fn next_category_id(&self) -> u64;

    /// The id the next `allocate_product_id` call will hand out.
    fn next_product_id(&self) -> u64;

    /// Raise both id counters to at least the given values.
    fn reserve_ids(&mut self, next_category: u64, next_product: u64) -> Result<(), StoreError>;

    /// Insert or replace a category.
    fn put_category(&mut self, category: &Category) -> Result<(), StoreError>;

    /// Insert or replace many categories at once.
    ///
    /// Backends with transactions write the whole batch atomically.
    fn put_categories(&mut self, categories: &[Category]) -> Result<(), StoreError> {
        for category in categories {
            self.put_category(category)?;
        }
        Ok(())
    }

    /// Lookup a category by id.
    fn get_category(&self, id: CategoryId) -> Result<Option<Category>, StoreError>;

    /// Remove a category, returning the removed record.
    fn remove_category(&mut self, id: CategoryId) -> Result<Option<Category>, StoreError>;

    /// Snapshot of every category.
    fn categories(&self) -> Result<Vec<Category>, StoreError>;

    /// Number of stored categories.
    fn category_count(&self) -> Result<usize, StoreError>;

    /// Insert or replace a product.
    fn put_product(&mut self, product: &Product) -> Result<(), StoreError>;

    /// Insert or replace many products at once.
    fn put_products(&mut self, products: &[Product]) -> Result<(), StoreError> {
        for product in products {
            self.put_product(product)?;
        }
        Ok(())
    }

    /// Lookup a product by id.
    fn get_product(&self, id: ProductId) -> Result<Option<Product>, StoreError>;

    /// Remove a product, returning the removed record.
    fn remove_product(&mut self, id: ProductId) -> Result<Option<Product>, StoreError>;

    /// Snapshot of every product.
    fn products(&self) -> Result<Vec<Product>, StoreError>;

    /// Number of stored products.
    fn product_count(&self) -> Result<usize, StoreError>;
}
