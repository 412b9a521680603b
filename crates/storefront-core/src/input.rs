//! # Catalog Input
//!
//! Write-side payloads accepted by the catalog, and their validation.
//!
//! - Validate every payload before any record is touched
//! - Reject malformed input with `StoreError::InvalidInput`
//! - Uniqueness and reference checks need the store and live in
//!   [`Catalog`](crate::catalog::Catalog)

use crate::primitives::{
    MAX_BULK_ITEMS, MAX_DESCRIPTION_LENGTH, MAX_DISCOUNT_PERCENTAGE, MAX_NAME_LENGTH,
    MAX_SLUG_LENGTH, MAX_VARIANT_IMAGES, MAX_VARIANTS,
};
use crate::{CategoryId, ImageAsset, ProductDescription, StoreError, Variant};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// PARENT REFERENCES
// =============================================================================

/// A parent reference as clients send it: a number, a numeric string, an
/// empty string or null.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawParent {
    Id(u64),
    Text(String),
}

/// Deserialize a parent reference. `""` and `null` both mean "root".
fn deserialize_parent<'de, D>(deserializer: D) -> Result<Option<CategoryId>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<RawParent>::deserialize(deserializer)? {
        None => Ok(None),
        Some(RawParent::Id(id)) => Ok(Some(CategoryId(id))),
        Some(RawParent::Text(text)) => {
            let text = text.trim();
            if text.is_empty() {
                return Ok(None);
            }
            text.parse::<u64>()
                .map(|id| Some(CategoryId(id)))
                .map_err(|_| D::Error::custom(format!("invalid parent id: {text}")))
        }
    }
}

/// Like [`deserialize_parent`], but keeps "absent" apart from "set to root".
fn deserialize_parent_patch<'de, D>(deserializer: D) -> Result<Option<Option<CategoryId>>, D::Error>
where
    D: Deserializer<'de>,
{
    deserialize_parent(deserializer).map(Some)
}

fn default_true() -> bool {
    true
}

// =============================================================================
// FIELD RULES
// =============================================================================

/// Build a slug from a display name: trimmed, lowercased, whitespace runs
/// replaced by a single `-`.
#[must_use]
pub fn slugify(name: &str) -> String {
    name.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

fn check_label(field: &str, value: &str) -> Result<(), StoreError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(StoreError::InvalidInput(format!("{field} is required")));
    }
    if trimmed.len() > MAX_NAME_LENGTH {
        return Err(StoreError::InvalidInput(format!(
            "{field} exceeds {MAX_NAME_LENGTH} bytes"
        )));
    }
    Ok(())
}

fn check_slug(slug: &str) -> Result<(), StoreError> {
    let slug = slug.trim();
    if slug.is_empty() {
        return Err(StoreError::InvalidInput("slug is required".to_string()));
    }
    if slug.len() > MAX_SLUG_LENGTH {
        return Err(StoreError::InvalidInput(format!(
            "slug exceeds {MAX_SLUG_LENGTH} bytes"
        )));
    }
    if slug.chars().any(|c| c.is_whitespace() || c == '/' || c == '?' || c == '#') {
        return Err(StoreError::InvalidInput(format!(
            "slug contains reserved characters: {slug}"
        )));
    }
    Ok(())
}

fn check_description(description: &str) -> Result<(), StoreError> {
    if description.len() > MAX_DESCRIPTION_LENGTH {
        return Err(StoreError::InvalidInput(format!(
            "description exceeds {MAX_DESCRIPTION_LENGTH} bytes"
        )));
    }
    Ok(())
}

fn check_image(image: &ImageAsset) -> Result<(), StoreError> {
    if image.url.trim().is_empty() {
        return Err(StoreError::InvalidInput("image url is required".to_string()));
    }
    Ok(())
}

fn check_discount(discount_percentage: u8) -> Result<(), StoreError> {
    if discount_percentage > MAX_DISCOUNT_PERCENTAGE {
        return Err(StoreError::InvalidInput(format!(
            "discount_percentage must be between 0 and {MAX_DISCOUNT_PERCENTAGE}"
        )));
    }
    Ok(())
}

fn check_product_description(description: &ProductDescription) -> Result<(), StoreError> {
    let total = description.paragraph.len()
        + description.points.iter().map(String::len).sum::<usize>()
        + description
            .specs
            .iter()
            .map(|(k, v)| k.len() + v.len())
            .sum::<usize>();
    if total > MAX_DESCRIPTION_LENGTH {
        return Err(StoreError::InvalidInput(format!(
            "description exceeds {MAX_DESCRIPTION_LENGTH} bytes"
        )));
    }
    Ok(())
}

fn check_variants(variants: &[Variant]) -> Result<(), StoreError> {
    if variants.len() > MAX_VARIANTS {
        return Err(StoreError::InvalidInput(format!(
            "a product may have at most {MAX_VARIANTS} variants"
        )));
    }
    for variant in variants {
        check_label("color_name", &variant.color_name)?;
        if variant.images.len() > MAX_VARIANT_IMAGES {
            return Err(StoreError::InvalidInput(format!(
                "a variant may have at most {MAX_VARIANT_IMAGES} images"
            )));
        }
        if variant.images.iter().any(|image| image.url.trim().is_empty()) {
            return Err(StoreError::InvalidInput(
                "variant image url is required".to_string(),
            ));
        }
    }
    Ok(())
}

/// Reject empty batches and batches above `MAX_BULK_ITEMS`.
pub fn check_batch_size(len: usize) -> Result<(), StoreError> {
    if len == 0 {
        return Err(StoreError::InvalidInput("no items received".to_string()));
    }
    if len > MAX_BULK_ITEMS {
        return Err(StoreError::InvalidInput(format!(
            "a batch may hold at most {MAX_BULK_ITEMS} items"
        )));
    }
    Ok(())
}

// =============================================================================
// CATEGORY PAYLOADS
// =============================================================================

/// Payload for creating one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCategory {
    pub name: String,
    pub slug: String,
    #[serde(default, deserialize_with = "deserialize_parent")]
    pub parent: Option<CategoryId>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: Option<ImageAsset>,
    #[serde(default)]
    pub banner: Option<ImageAsset>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_featured: bool,
}

impl NewCategory {
    /// Create a payload with only the required fields set.
    #[must_use]
    pub fn new(name: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            slug: slug.into(),
            parent: None,
            description: String::new(),
            icon: None,
            banner: None,
            is_active: true,
            is_featured: false,
        }
    }

    /// Builder-style parent assignment.
    #[must_use]
    pub fn with_parent(mut self, parent: CategoryId) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn validate(&self) -> Result<(), StoreError> {
        check_label("name", &self.name)?;
        check_slug(&self.slug)?;
        check_description(&self.description)?;
        if let Some(icon) = &self.icon {
            check_image(icon)?;
        }
        if let Some(banner) = &self.banner {
            check_image(banner)?;
        }
        Ok(())
    }
}

/// Partial update of a category's own fields.
///
/// Images are not part of the patch; they change through
/// [`ImageSlot`] replacement only. Unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// `None`: unchanged. `Some(None)`: move to root.
    #[serde(default, deserialize_with = "deserialize_parent_patch")]
    pub parent: Option<Option<CategoryId>>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub is_featured: Option<bool>,
}

impl CategoryPatch {
    pub fn validate(&self) -> Result<(), StoreError> {
        if let Some(name) = &self.name {
            check_label("name", name)?;
        }
        if let Some(slug) = &self.slug {
            check_slug(slug)?;
        }
        if let Some(description) = &self.description {
            check_description(description)?;
        }
        Ok(())
    }

    /// Check if the patch changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.slug.is_none()
            && self.description.is_none()
            && self.parent.is_none()
            && self.is_active.is_none()
            && self.is_featured.is_none()
    }
}

/// One row of a category bulk upload.
///
/// The parent is given by name and images by URL; the catalog resolves both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkCategory {
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub banner: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub is_featured: Option<bool>,
}

impl BulkCategory {
    pub fn validate(&self) -> Result<(), StoreError> {
        check_label("name", &self.name)?;
        check_slug(&self.slug)?;
        if let Some(parent) = &self.parent {
            if !parent.trim().is_empty() {
                check_label("parent", parent)?;
                check_slug(&slugify(parent))?;
            }
        }
        if let Some(description) = &self.description {
            check_description(description)?;
        }
        Ok(())
    }
}

/// Which image of a category to replace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageSlot {
    Banner,
    Icon,
}

impl std::fmt::Display for ImageSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Banner => write!(f, "banner"),
            Self::Icon => write!(f, "icon"),
        }
    }
}

// =============================================================================
// PRODUCT PAYLOADS
// =============================================================================

/// Payload for creating one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub title: String,
    pub brand: String,
    pub category: CategoryId,
    #[serde(default)]
    pub description: ProductDescription,
    /// List price in minor currency units.
    pub price: u64,
    #[serde(default)]
    pub discount_percentage: u8,
    #[serde(default)]
    pub variants: Vec<Variant>,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl NewProduct {
    /// Create a payload with only the required fields set.
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        brand: impl Into<String>,
        category: CategoryId,
        price: u64,
    ) -> Self {
        Self {
            title: title.into(),
            brand: brand.into(),
            category,
            description: ProductDescription::default(),
            price,
            discount_percentage: 0,
            variants: Vec::new(),
            is_featured: false,
            is_active: true,
        }
    }

    pub fn validate(&self) -> Result<(), StoreError> {
        check_label("title", &self.title)?;
        check_label("brand", &self.brand)?;
        check_product_description(&self.description)?;
        check_discount(self.discount_percentage)?;
        check_variants(&self.variants)
    }
}

/// Partial update of a product's own fields. Variants are not touched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub category: Option<CategoryId>,
    #[serde(default)]
    pub description: Option<ProductDescription>,
    #[serde(default)]
    pub price: Option<u64>,
    #[serde(default)]
    pub discount_percentage: Option<u8>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub is_featured: Option<bool>,
}

impl ProductPatch {
    pub fn validate(&self) -> Result<(), StoreError> {
        if let Some(title) = &self.title {
            check_label("title", title)?;
        }
        if let Some(brand) = &self.brand {
            check_label("brand", brand)?;
        }
        if let Some(description) = &self.description {
            check_product_description(description)?;
        }
        if let Some(discount) = self.discount_percentage {
            check_discount(discount)?;
        }
        Ok(())
    }
}

/// Update of one variant's color and stock, addressed by position in the
/// product's variant list. Images are left alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantPatch {
    pub index: usize,
    #[serde(default)]
    pub color_name: Option<String>,
    #[serde(default)]
    pub color_code: Option<String>,
    #[serde(default)]
    pub stock: Option<u64>,
}

impl VariantPatch {
    pub fn validate(&self) -> Result<(), StoreError> {
        if let Some(color_name) = &self.color_name {
            check_label("color_name", color_name)?;
        }
        Ok(())
    }
}

/// One image slot of a variant image replacement.
///
/// A slot with a URL replaces (or adds) the image at `position`; a slot
/// without one keeps the current image. Positions not listed are dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantImageInput {
    pub position: u32,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub public_id: Option<String>,
}

/// Validate a full variant image replacement list.
pub fn validate_variant_images(images: &[VariantImageInput]) -> Result<(), StoreError> {
    if images.len() > MAX_VARIANT_IMAGES {
        return Err(StoreError::InvalidInput(format!(
            "a variant may have at most {MAX_VARIANT_IMAGES} images"
        )));
    }
    let mut seen = std::collections::BTreeSet::new();
    for image in images {
        if !seen.insert(image.position) {
            return Err(StoreError::InvalidInput(format!(
                "duplicate image position {}",
                image.position
            )));
        }
    }
    Ok(())
}

/// One row of a product bulk upload. The category is given by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkProduct {
    pub title: String,
    pub brand: String,
    pub category_name: String,
    pub price: u64,
    #[serde(default)]
    pub discount_percentage: u8,
    #[serde(default)]
    pub description_paragraph: String,
    #[serde(default)]
    pub description_points: Vec<String>,
    #[serde(default)]
    pub specs: BTreeMap<String, String>,
    #[serde(default)]
    pub variants: Vec<Variant>,
}

impl BulkProduct {
    pub fn validate(&self) -> Result<(), StoreError> {
        check_label("title", &self.title)?;
        check_label("brand", &self.brand)?;
        if self.category_name.trim().is_empty() {
            return Err(StoreError::InvalidInput(format!(
                "category_name missing for product {}",
                self.title
            )));
        }
        check_product_description(&self.description())?;
        check_discount(self.discount_percentage)?;
        check_variants(&self.variants)
    }

    /// The description assembled from the flat bulk columns.
    #[must_use]
    pub fn description(&self) -> ProductDescription {
        ProductDescription {
            paragraph: self.description_paragraph.clone(),
            points: self.description_points.clone(),
            specs: self.specs.clone(),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
