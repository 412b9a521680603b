//! Product operations of the catalog.

use super::Catalog;
use crate::input::{
    BulkProduct, NewProduct, ProductPatch, VariantImageInput, VariantPatch, check_batch_size,
    validate_variant_images,
};
use crate::media::extract_public_id;
use crate::query::{self, Page, ProductListing, ProductQuery};
use crate::{
    Category, CategoryId, Product, ProductId, Rating, StoreError, Variant, VariantImage,
    discounted_price,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Result of replacing the images of one variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantImagesOutcome {
    pub product: Product,
    /// Handles of replaced or dropped images, to be destroyed on the media
    /// host.
    pub removed_public_ids: Vec<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Trim variant fields and fill in missing image `public_id`s.
fn resolve_variants(variants: Vec<Variant>) -> Vec<Variant> {
    variants
        .into_iter()
        .map(|variant| Variant {
            color_name: variant.color_name.trim().to_string(),
            color_code: non_empty(variant.color_code),
            images: variant
                .images
                .into_iter()
                .map(|image| {
                    let url = image.url.trim().to_string();
                    let public_id = match image.public_id.trim() {
                        "" => extract_public_id(&url),
                        given => given.to_string(),
                    };
                    VariantImage {
                        url,
                        public_id,
                        position: image.position,
                    }
                })
                .collect(),
            stock: variant.stock,
        })
        .collect()
}

fn check_category_exists(categories: &[Category], id: CategoryId) -> Result<(), StoreError> {
    if categories.iter().any(|c| c.id == id) {
        Ok(())
    } else {
        Err(StoreError::InvalidInput(format!(
            "category {id} does not exist"
        )))
    }
}

impl Catalog {
    /// Create one product.
    pub fn create_product(&mut self, input: NewProduct) -> Result<Product, StoreError> {
        input.validate()?;
        check_category_exists(&self.store().categories()?, input.category)?;

        let now = self.now();
        let id = self.store_mut().allocate_product_id()?;
        let product = Product {
            id,
            title: input.title.trim().to_string(),
            brand: input.brand.trim().to_string(),
            category: input.category,
            description: input.description,
            price: input.price,
            discount_percentage: input.discount_percentage,
            discounted_price: discounted_price(input.price, input.discount_percentage),
            variants: resolve_variants(input.variants),
            rating: Rating::default(),
            is_featured: input.is_featured,
            is_active: input.is_active,
            created_at: now,
            updated_at: now,
        };
        self.store_mut().put_product(&product)?;
        Ok(product)
    }

    /// Create many products with categories referenced by name.
    ///
    /// Bulk-created products start inactive and not featured. The whole
    /// batch is rejected if any row is invalid or names an unknown category.
    pub fn bulk_upload_products(&mut self, rows: Vec<BulkProduct>) -> Result<Vec<Product>, StoreError> {
        check_batch_size(rows.len())?;
        for row in &rows {
            row.validate()?;
        }

        let ids_by_name: BTreeMap<String, CategoryId> = self
            .store()
            .categories()?
            .into_iter()
            .map(|c| (c.name, c.id))
            .collect();
        let mut resolved = Vec::with_capacity(rows.len());
        for row in rows {
            let category_name = row.category_name.trim();
            let Some(&category) = ids_by_name.get(category_name) else {
                return Err(StoreError::InvalidInput(format!(
                    "invalid category_name \"{}\" for product \"{}\"",
                    category_name, row.title
                )));
            };
            resolved.push((category, row));
        }

        let now = self.now();
        let mut products = Vec::with_capacity(resolved.len());
        for (category, row) in resolved {
            let id = self.store_mut().allocate_product_id()?;
            let description = row.description();
            products.push(Product {
                id,
                title: row.title.trim().to_string(),
                brand: row.brand.trim().to_string(),
                category,
                description,
                price: row.price,
                discount_percentage: row.discount_percentage,
                discounted_price: discounted_price(row.price, row.discount_percentage),
                variants: resolve_variants(row.variants),
                rating: Rating::default(),
                is_featured: false,
                is_active: false,
                created_at: now,
                updated_at: now,
            });
        }

        self.store_mut().put_products(&products)?;
        Ok(products)
    }

    pub fn get_product(&self, id: ProductId) -> Result<Product, StoreError> {
        self.store()
            .get_product(id)?
            .ok_or(StoreError::ProductNotFound(id))
    }

    /// A product with its stock total and category summary.
    pub fn get_product_listing(&self, id: ProductId) -> Result<ProductListing, StoreError> {
        let product = self.get_product(id)?;
        Ok(ProductListing::new(product, &self.store().categories()?))
    }

    /// Filtered, sorted, paginated product list.
    pub fn list_products(&self, query: &ProductQuery) -> Result<Page<ProductListing>, StoreError> {
        let store = self.store();
        query::list_products(&store.products()?, &store.categories()?, query)
    }

    /// Update a product's own fields. The discounted price follows any
    /// change to price or discount.
    pub fn update_product(&mut self, id: ProductId, patch: ProductPatch) -> Result<Product, StoreError> {
        patch.validate()?;
        let mut product = self.get_product(id)?;

        if let Some(category) = patch.category {
            check_category_exists(&self.store().categories()?, category)?;
            product.category = category;
        }
        if let Some(title) = patch.title {
            product.title = title.trim().to_string();
        }
        if let Some(brand) = patch.brand {
            product.brand = brand.trim().to_string();
        }
        if let Some(description) = patch.description {
            product.description = description;
        }
        if let Some(price) = patch.price {
            product.price = price;
        }
        if let Some(discount) = patch.discount_percentage {
            product.discount_percentage = discount;
        }
        if let Some(is_active) = patch.is_active {
            product.is_active = is_active;
        }
        if let Some(is_featured) = patch.is_featured {
            product.is_featured = is_featured;
        }

        product.reprice();
        product.updated_at = self.now();
        self.store_mut().put_product(&product)?;
        Ok(product)
    }

    /// Update color and stock of variants by index. Images are untouched.
    pub fn update_variants(
        &mut self,
        id: ProductId,
        patches: Vec<VariantPatch>,
    ) -> Result<Product, StoreError> {
        let mut product = self.get_product(id)?;
        for patch in &patches {
            patch.validate()?;
            if patch.index >= product.variants.len() {
                return Err(StoreError::InvalidInput(format!(
                    "variant index {} out of range (product has {})",
                    patch.index,
                    product.variants.len()
                )));
            }
        }

        for patch in patches {
            let variant = &mut product.variants[patch.index];
            if let Some(color_name) = patch.color_name {
                variant.color_name = color_name.trim().to_string();
            }
            if let Some(color_code) = patch.color_code {
                variant.color_code = non_empty(Some(color_code));
            }
            if let Some(stock) = patch.stock {
                variant.stock = stock;
            }
        }

        product.updated_at = self.now();
        self.store_mut().put_product(&product)?;
        Ok(product)
    }

    /// Replace the images of one variant, slot by slot.
    ///
    /// For each listed position: a new URL replaces the image there (or adds
    /// one), the same URL or no URL keeps it. Positions that are not listed
    /// are dropped. Replaced and dropped images are reported for deletion.
    pub fn replace_variant_images(
        &mut self,
        id: ProductId,
        variant_index: usize,
        images: Vec<VariantImageInput>,
    ) -> Result<VariantImagesOutcome, StoreError> {
        validate_variant_images(&images)?;
        let mut product = self.get_product(id)?;
        let variant_count = product.variants.len();
        let variant = product.variants.get_mut(variant_index).ok_or_else(|| {
            StoreError::InvalidInput(format!(
                "variant index {variant_index} out of range (product has {variant_count})"
            ))
        })?;

        let mut previous: BTreeMap<u32, VariantImage> = variant
            .images
            .drain(..)
            .map(|image| (image.position, image))
            .collect();
        let mut removed = Vec::new();
        let mut updated = Vec::with_capacity(images.len());

        for incoming in images {
            let old = previous.remove(&incoming.position);
            let Some(url) = non_empty(incoming.url) else {
                updated.extend(old);
                continue;
            };
            match old {
                Some(old) if old.url == url => updated.push(old),
                old => {
                    removed.extend(old.map(|o| o.public_id));
                    let public_id =
                        non_empty(incoming.public_id).unwrap_or_else(|| extract_public_id(&url));
                    updated.push(VariantImage {
                        url,
                        public_id,
                        position: incoming.position,
                    });
                }
            }
        }
        removed.extend(previous.into_values().map(|image| image.public_id));
        removed.retain(|public_id| !public_id.is_empty());

        updated.sort_by_key(|image| image.position);
        variant.images = updated;

        product.updated_at = self.now();
        self.store_mut().put_product(&product)?;
        Ok(VariantImagesOutcome {
            product,
            removed_public_ids: removed,
        })
    }

    /// Delete a product, returning the public ids of all its variant images.
    pub fn delete_product(&mut self, id: ProductId) -> Result<Vec<String>, StoreError> {
        let product = self
            .store_mut()
            .remove_product(id)?
            .ok_or(StoreError::ProductNotFound(id))?;
        Ok(product.image_public_ids())
    }
}

// =============================================================================
// TESTS
// =============================================================================
