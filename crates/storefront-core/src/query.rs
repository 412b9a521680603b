//! # Listing Queries
//!
//! Filtering, sorting and pagination of catalog listings.
//!
//! Listings are evaluated over a full snapshot of the records, the same way
//! the hierarchy engine works: the caller reads the collection once and the
//! query derives a page from it. Category filters on products are widened
//! to the whole subtree with
//! [`collect_descendant_ids`](crate::hierarchy::collect_descendant_ids).
//!
//! Search is a literal, case-insensitive substring match.

use crate::hierarchy::collect_descendant_ids;
use crate::primitives::{DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT, MAX_SEARCH_LENGTH};
use crate::{Category, CategoryId, Product, StoreError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// PAGINATION
// =============================================================================

/// A 1-based page request, clamped to sane bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: usize,
    pub limit: usize,
}

impl PageRequest {
    /// Create a page request. Page 0 becomes 1, a zero limit becomes the
    /// default and large limits are capped.
    #[must_use]
    pub fn new(page: Option<usize>, limit: Option<usize>) -> Self {
        let limit = match limit {
            None | Some(0) => DEFAULT_PAGE_LIMIT,
            Some(limit) => limit.min(MAX_PAGE_LIMIT),
        };
        Self {
            page: page.unwrap_or(1).max(1),
            limit,
        }
    }

    /// Number of items skipped before this page.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }

    /// Cut this page out of a fully filtered and sorted result.
    #[must_use]
    pub fn slice<T>(&self, items: Vec<T>) -> Page<T> {
        let total = items.len();
        let items = items
            .into_iter()
            .skip(self.offset())
            .take(self.limit)
            .collect();
        Page {
            page: self.page,
            limit: self.limit,
            total,
            total_pages: total.div_ceil(self.limit),
            items,
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// One page of a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub page: usize,
    pub limit: usize,
    /// Matching items across all pages.
    pub total: usize,
    pub total_pages: usize,
    pub items: Vec<T>,
}

// =============================================================================
// SEARCH
// =============================================================================

/// A normalized search term.
struct Needle(String);

impl Needle {
    fn parse(search: Option<&str>) -> Result<Option<Self>, StoreError> {
        let Some(term) = search.map(str::trim).filter(|t| !t.is_empty()) else {
            return Ok(None);
        };
        if term.len() > MAX_SEARCH_LENGTH {
            return Err(StoreError::InvalidInput(format!(
                "search exceeds {MAX_SEARCH_LENGTH} bytes"
            )));
        }
        Ok(Some(Self(term.to_lowercase())))
    }

    fn found_in(&self, haystack: &str) -> bool {
        haystack.to_lowercase().contains(&self.0)
    }
}

// =============================================================================
// CATEGORY LISTING
// =============================================================================

/// Filters for the category list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryQuery {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub active: Option<bool>,
    #[serde(default)]
    pub featured: Option<bool>,
    #[serde(default)]
    pub page: Option<usize>,
    #[serde(default)]
    pub limit: Option<usize>,
}

/// A category list item with its parent's name resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryListing {
    #[serde(flatten)]
    pub category: Category,
    pub parent_name: Option<String>,
}

/// Filter and paginate categories, in id (creation) order.
///
/// The search term matches name, slug, description and the parent's name.
pub fn list_categories(
    records: &[Category],
    query: &CategoryQuery,
) -> Result<Page<CategoryListing>, StoreError> {
    let needle = Needle::parse(query.search.as_deref())?;
    let names: BTreeMap<CategoryId, &str> =
        records.iter().map(|c| (c.id, c.name.as_str())).collect();

    let mut matches: Vec<CategoryListing> = records
        .iter()
        .filter(|c| query.active.is_none_or(|want| c.is_active == want))
        .filter(|c| query.featured.is_none_or(|want| c.is_featured == want))
        .filter_map(|c| {
            let parent_name = c.parent.and_then(|p| names.get(&p).copied());
            let hit = needle.as_ref().is_none_or(|n| {
                n.found_in(&c.name)
                    || n.found_in(&c.slug)
                    || n.found_in(&c.description)
                    || parent_name.is_some_and(|p| n.found_in(p))
            });
            hit.then(|| CategoryListing {
                category: c.clone(),
                parent_name: parent_name.map(str::to_string),
            })
        })
        .collect();
    matches.sort_by_key(|item| item.category.id);

    Ok(PageRequest::new(query.page, query.limit).slice(matches))
}

// =============================================================================
// PRODUCT LISTING
// =============================================================================

/// Sort order of the product list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductSort {
    PriceLowHigh,
    PriceHighLow,
    #[default]
    Newest,
    Oldest,
    Rating,
}

/// Filters for the product list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductQuery {
    /// Matches title or brand.
    #[serde(default)]
    pub search: Option<String>,
    /// Category id; products of every subcategory match as well.
    #[serde(default)]
    pub category: Option<u64>,
    /// Exact brand, ignoring case.
    #[serde(default)]
    pub brand: Option<String>,
    /// Inclusive lower bound on the list price, in minor units.
    #[serde(default)]
    pub min_price: Option<u64>,
    /// Inclusive upper bound on the list price, in minor units.
    #[serde(default)]
    pub max_price: Option<u64>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub is_featured: Option<bool>,
    #[serde(default)]
    pub sort: ProductSort,
    #[serde(default)]
    pub page: Option<usize>,
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Name and slug of a product's category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySummary {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
}

impl From<&Category> for CategorySummary {
    fn from(category: &Category) -> Self {
        Self {
            id: category.id,
            name: category.name.clone(),
            slug: category.slug.clone(),
        }
    }
}

/// A product list item with derived fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductListing {
    #[serde(flatten)]
    pub product: Product,
    pub total_stock: u64,
    /// `None` when the product references a category that no longer exists.
    pub category_info: Option<CategorySummary>,
}

impl ProductListing {
    /// Attach derived fields to a product.
    #[must_use]
    pub fn new(product: Product, categories: &[Category]) -> Self {
        let category_info = categories
            .iter()
            .find(|c| c.id == product.category)
            .map(CategorySummary::from);
        Self::with_summary(product, category_info)
    }

    fn with_summary(product: Product, category_info: Option<CategorySummary>) -> Self {
        Self {
            total_stock: product.total_stock(),
            product,
            category_info,
        }
    }
}

/// Filter, sort and paginate products.
///
/// Ties are broken by id, newest first, so every order is total.
pub fn list_products(
    products: &[Product],
    categories: &[Category],
    query: &ProductQuery,
) -> Result<Page<ProductListing>, StoreError> {
    if let (Some(min), Some(max)) = (query.min_price, query.max_price) {
        if min > max {
            return Err(StoreError::InvalidInput(
                "min_price must not exceed max_price".to_string(),
            ));
        }
    }

    let needle = Needle::parse(query.search.as_deref())?;
    let brand = query
        .brand
        .as_deref()
        .map(str::trim)
        .filter(|b| !b.is_empty())
        .map(str::to_lowercase);
    let scope = query
        .category
        .map(|id| collect_descendant_ids(CategoryId(id), categories));

    let mut matches: Vec<&Product> = products
        .iter()
        .filter(|p| query.is_active.is_none_or(|want| p.is_active == want))
        .filter(|p| query.is_featured.is_none_or(|want| p.is_featured == want))
        .filter(|p| scope.as_ref().is_none_or(|ids| ids.contains(&p.category)))
        .filter(|p| brand.as_ref().is_none_or(|b| p.brand.to_lowercase() == *b))
        .filter(|p| query.min_price.is_none_or(|min| p.price >= min))
        .filter(|p| query.max_price.is_none_or(|max| p.price <= max))
        .filter(|p| {
            needle
                .as_ref()
                .is_none_or(|n| n.found_in(&p.title) || n.found_in(&p.brand))
        })
        .collect();

    match query.sort {
        ProductSort::PriceLowHigh => {
            matches.sort_by(|a, b| a.price.cmp(&b.price).then(b.id.cmp(&a.id)));
        }
        ProductSort::PriceHighLow => {
            matches.sort_by(|a, b| b.price.cmp(&a.price).then(b.id.cmp(&a.id)));
        }
        ProductSort::Newest => matches.sort_by(|a, b| b.id.cmp(&a.id)),
        ProductSort::Oldest => matches.sort_by_key(|p| p.id),
        ProductSort::Rating => matches.sort_by(|a, b| {
            b.rating
                .average_hundredths
                .cmp(&a.rating.average_hundredths)
                .then(b.id.cmp(&a.id))
        }),
    }

    let summaries: BTreeMap<CategoryId, CategorySummary> = categories
        .iter()
        .map(|c| (c.id, CategorySummary::from(c)))
        .collect();

    let page = PageRequest::new(query.page, query.limit).slice(matches);
    Ok(Page {
        page: page.page,
        limit: page.limit,
        total: page.total,
        total_pages: page.total_pages,
        items: page
            .items
            .into_iter()
            .map(|p| ProductListing::with_summary(p.clone(), summaries.get(&p.category).cloned()))
            .collect(),
    })
}

// =============================================================================
// TESTS
// =============================================================================
