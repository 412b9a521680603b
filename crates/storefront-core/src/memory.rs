//! # In-Memory Catalog
//!
//! BTreeMap-backed [`CatalogStore`]. Fast and volatile: contents survive a
//! restart only when exported to a snapshot file.

use crate::store::CatalogStore;
use crate::{Category, CategoryId, Product, ProductId, StoreError};
use std::collections::BTreeMap;

/// First id handed out by a fresh store.
const FIRST_ID: u64 = 1;

/// In-memory catalog storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryCatalog {
    categories: BTreeMap<CategoryId, Category>,
    products: BTreeMap<ProductId, Product>,
    next_category_id: u64,
    next_product_id: u64,
}

impl Default for MemoryCatalog {
    fn default() -> Self {
        Self {
            categories: BTreeMap::new(),
            products: BTreeMap::new(),
            next_category_id: FIRST_ID,
            next_product_id: FIRST_ID,
        }
    }
}

impl MemoryCatalog {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl CatalogStore for MemoryCatalog {
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
        Ok(())
    }

    fn put_category(&mut self, category: &Category) -> Result<(), StoreError> {
        self.next_category_id = self.next_category_id.max(category.id.0.saturating_add(1));
        self.categories.insert(category.id, category.clone());
        Ok(())
    }

    fn get_category(&self, id: CategoryId) -> Result<Option<Category>, StoreError> {
        Ok(self.categories.get(&id).cloned())
    }

    fn remove_category(&mut self, id: CategoryId) -> Result<Option<Category>, StoreError> {
        Ok(self.categories.remove(&id))
    }

    fn categories(&self) -> Result<Vec<Category>, StoreError> {
        Ok(self.categories.values().cloned().collect())
    }

    fn category_count(&self) -> Result<usize, StoreError> {
        Ok(self.categories.len())
    }

    fn put_product(&mut self, product: &Product) -> Result<(), StoreError> {
        self.next_product_id = self.next_product_id.max(product.id.0.saturating_add(1));
        self.products.insert(product.id, product.clone());
        Ok(())
    }

    fn get_product(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        Ok(self.products.get(&id).cloned())
    }

    fn remove_product(&mut self, id: ProductId) -> Result<Option<Product>, StoreError> {
        Ok(self.products.remove(&id))
    }

    fn products(&self) -> Result<Vec<Product>, StoreError> {
        Ok(self.products.values().cloned().collect())
    }

    fn product_count(&self) -> Result<usize, StoreError> {
        Ok(self.products.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category(id: u64) -> Category {
        Category {
            id: CategoryId(id),
            name: format!("C{id}"),
            slug: format!("c{id}"),
            parent: None,
            description: String::new(),
            icon: None,
            banner: None,
            is_active: true,
            is_featured: false,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn ids_start_at_one_and_never_repeat() {
        let mut store = MemoryCatalog::new();
        let a = store.allocate_category_id().expect("alloc");
        let b = store.allocate_category_id().expect("alloc");
        assert_eq!(a, CategoryId(1));
        assert_eq!(b, CategoryId(2));

        store.put_category(&category(b.0)).expect("put");
        store.remove_category(b).expect("remove");
        assert_eq!(store.allocate_category_id().expect("alloc"), CategoryId(3));
    }

    #[test]
    fn put_raises_counter_past_explicit_id() {
        let mut store = MemoryCatalog::new();
        store.put_category(&category(10)).expect("put");
        assert_eq!(store.next_category_id(), 11);
    }

    #[test]
    fn reserve_never_lowers_counters() {
        let mut store = MemoryCatalog::new();
        store.reserve_ids(50, 7).expect("reserve");
        store.reserve_ids(3, 3).expect("reserve");
        assert_eq!(store.next_category_id(), 50);
        assert_eq!(store.next_product_id(), 7);
    }

    #[test]
    fn listing_is_ordered_by_id() {
        let mut store = MemoryCatalog::new();
        store
            .put_categories(&[category(3), category(1), category(2)])
            .expect("put");
        let ids: Vec<u64> = store
            .categories()
            .expect("list")
            .iter()
            .map(|c| c.id.0)
            .collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(store.category_count().expect("count"), 3);
    }
}
