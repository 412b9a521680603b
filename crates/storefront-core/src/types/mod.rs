//! # Core Type Definitions
//!
//! This module contains the record types of the Storefront catalog:
//! - Identifiers (`CategoryId`, `ProductId`)
//! - Hosted media references (`ImageAsset`)
//! - Catalog records (`Category`, `Product` and its parts)
//! - Error types (`StoreError`)
//!
//! ## Determinism Guarantees
//!
//! All types in this module:
//! - Use integer arithmetic only (prices are minor units, ratings are hundredths)
//! - Implement `Ord` on identifiers for deterministic ordering in `BTreeMap`/`BTreeSet`
//! - Serialize identically through JSON (API) and postcard (storage)

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Unique identifier of a category.
/// Assigned by the store at creation and never changed afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CategoryId(pub u64);

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier of a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProductId(pub u64);

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// MEDIA
// =============================================================================

/// An image stored on the external media host.
///
/// `public_id` is the handle the host needs to destroy the asset later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageAsset {
    pub url: String,
    pub public_id: String,
}

impl ImageAsset {
    /// Create a new image reference.
    #[must_use]
    pub fn new(url: impl Into<String>, public_id: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            public_id: public_id.into(),
        }
    }
}

// =============================================================================
// CATEGORY
// =============================================================================

/// A node of the category forest.
///
/// Only the parent reference is stored. Children are derived on demand by
/// the hierarchy engine from a full snapshot of the collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    /// Display label, unique across the collection.
    pub name: String,
    /// URL-safe label, unique across the collection.
    pub slug: String,
    /// Parent category, `None` for a root.
    pub parent: Option<CategoryId>,
    pub description: String,
    pub icon: Option<ImageAsset>,
    pub banner: Option<ImageAsset>,
    pub is_active: bool,
    pub is_featured: bool,
    /// Unix time in milliseconds.
    pub created_at: u64,
    /// Unix time in milliseconds.
    pub updated_at: u64,
}

impl Category {
    /// Check if this category is a root (no parent reference).
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Public ids of every image attached to this category.
    #[must_use]
    pub fn image_public_ids(&self) -> Vec<String> {
        [&self.icon, &self.banner]
            .into_iter()
            .flatten()
            .filter(|image| !image.public_id.is_empty())
            .map(|image| image.public_id.clone())
            .collect()
    }
}

// =============================================================================
// PRODUCT
// =============================================================================

/// Long-form product description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProductDescription {
    #[serde(default)]
    pub paragraph: String,
    #[serde(default)]
    pub points: Vec<String>,
    #[serde(default)]
    pub specs: BTreeMap<String, String>,
}

/// One image of a variant, ordered by `position`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantImage {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub public_id: String,
    pub position: u32,
}

/// A purchasable variant of a product (one color).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    pub color_name: String,
    #[serde(default)]
    pub color_code: Option<String>,
    #[serde(default)]
    pub images: Vec<VariantImage>,
    pub stock: u64,
}

/// Aggregated review score.
///
/// `average_hundredths` is the mean rating multiplied by 100 (a 4.25 average
/// is stored as 425).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Rating {
    pub average_hundredths: u32,
    pub count: u64,
}

/// A product of the hierarchical catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub brand: String,
    pub category: CategoryId,
    pub description: ProductDescription,
    /// List price in minor currency units.
    pub price: u64,
    pub discount_percentage: u8,
    /// `price` with `discount_percentage` applied, in minor currency units.
    pub discounted_price: u64,
    pub variants: Vec<Variant>,
    pub rating: Rating,
    pub is_featured: bool,
    pub is_active: bool,
    pub created_at: u64,
    pub updated_at: u64,
}

impl Product {
    /// Sum of the stock of every variant (saturating).
    #[must_use]
    pub fn total_stock(&self) -> u64 {
        self.variants
            .iter()
            .fold(0u64, |sum, variant| sum.saturating_add(variant.stock))
    }

    /// Public ids of every variant image.
    #[must_use]
    pub fn image_public_ids(&self) -> Vec<String> {
        self.variants
            .iter()
            .flat_map(|variant| variant.images.iter())
            .filter(|image| !image.public_id.is_empty())
            .map(|image| image.public_id.clone())
            .collect()
    }

    /// Recompute `discounted_price` from `price` and `discount_percentage`.
    pub fn reprice(&mut self) {
        self.discounted_price = discounted_price(self.price, self.discount_percentage);
    }
}

/// Apply a percentage discount to a price in minor units.
///
/// Integer arithmetic only: the discount amount is rounded down, so the
/// customer never pays less than the exact discounted price rounded up.
#[must_use]
pub fn discounted_price(price: u64, discount_percentage: u8) -> u64 {
    let percent = u128::from(discount_percentage.min(100));
    let discount = u128::from(price) * percent / 100;
    price.saturating_sub(discount as u64)
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the Storefront catalog.
///
/// - No silent failures
/// - Use `Result<T, StoreError>` for fallible operations
/// - The core never panics; all errors are recoverable
#[derive(Debug, Error)]
pub enum StoreError {
    /// The requested category does not exist.
    #[error("Category not found: {0}")]
    CategoryNotFound(CategoryId),

    /// The requested product does not exist.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// The input failed validation.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A unique field (name, slug) is already taken.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The category still has subcategories.
    #[error("Category {0} has subcategories. Remove children first.")]
    HasChildren(CategoryId),

    /// The category is still referenced by products.
    #[error("Category {0} is referenced by {1} product(s)")]
    HasProducts(CategoryId, usize),

    /// Reassigning the parent would make a category its own ancestor.
    #[error("Setting parent of {id} to {parent} would create a cycle")]
    CycleDetected { id: CategoryId, parent: CategoryId },

    /// A serialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// A deserialization error occurred.
    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    /// An I/O or storage engine error occurred.
    #[error("I/O error: {0}")]
    IoError(String),
}

// =============================================================================
// TESTS
// =============================================================================
