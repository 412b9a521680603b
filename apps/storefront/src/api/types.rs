//! # API Request/Response Types
//!
//! This module defines the JSON structures for the HTTP API. Catalog
//! records are serialized as they are in the core; these types add the
//! `success` envelope and the request bodies that wrap core payloads.

use serde::{Deserialize, Serialize};
use storefront_core::{
    BulkCategory, BulkProduct, Category, CategoryId, CategoryNode, CatalogStats, ImageAsset, Page,
    VariantImageInput, VariantPatch,
};

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// =============================================================================
// STATUS RESPONSE
// =============================================================================

/// Catalog status response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    /// `"in-memory"` or `"redb"`.
    pub backend: String,
    #[serde(flatten)]
    pub stats: CatalogStats,
}

// =============================================================================
// ENVELOPES
// =============================================================================

/// Error body shared by every failing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            error: msg.into(),
        }
    }
}

/// A successful response carrying one value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> DataResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Pagination block of a list response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: usize,
    pub limit: usize,
    pub total: usize,
    pub total_pages: usize,
}

/// A successful response carrying one page of a list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListResponse<T> {
    pub success: bool,
    pub data: Vec<T>,
    pub pagination: Pagination,
}

impl<T> From<Page<T>> for ListResponse<T> {
    fn from(page: Page<T>) -> Self {
        Self {
            success: true,
            pagination: Pagination {
                page: page.page,
                limit: page.limit,
                total: page.total,
                total_pages: page.total_pages,
            },
            data: page.items,
        }
    }
}

// =============================================================================
// CATEGORY RESPONSES
// =============================================================================

/// The category forest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeResponse {
    pub success: bool,
    pub data: Vec<CategoryNode>,
    /// Categories left out because of a dangling parent or a cycle.
    pub excluded: Vec<CategoryId>,
}

/// A category and everything below it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DescendantsResponse {
    pub success: bool,
    pub category: CategoryId,
    /// Ascending ids, `category` included.
    pub data: Vec<CategoryId>,
}

/// Body of `POST /categories/bulk-upload`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkCategoriesRequest {
    pub categories: Vec<BulkCategory>,
}

/// Result of a category bulk upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkCategoriesResponse {
    pub success: bool,
    pub message: String,
    pub data: Vec<Category>,
    /// Slugs of rows that already existed.
    pub skipped: Vec<String>,
}

/// Body of `PUT /categories/{id}/banner` and `/icon`.
///
/// The image is already uploaded; an empty `public_id` is derived from the URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageRequest {
    pub url: String,
    #[serde(default)]
    pub public_id: String,
}

impl From<ImageRequest> for ImageAsset {
    fn from(request: ImageRequest) -> Self {
        ImageAsset::new(request.url, request.public_id)
    }
}

// =============================================================================
// PRODUCT REQUESTS
// =============================================================================

/// Body of `POST /products/bulk-upload`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkProductsRequest {
    pub products: Vec<BulkProduct>,
}

/// Body of `PATCH /products/{id}/variants`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantsRequest {
    pub variants: Vec<VariantPatch>,
}

/// Body of `PUT /products/{id}/variants/{index}/images`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantImagesRequest {
    pub images: Vec<VariantImageInput>,
}

// =============================================================================
// DELETE / EXPORT RESPONSES
// =============================================================================

/// Result of a delete or image replacement that released media.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
    /// Media files removed from the media host.
    pub media_removed: usize,
}

/// Catalog export in snapshot format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportResponse {
    pub success: bool,
    pub data: Option<String>, // Base64 encoded
    pub checksum: Option<u64>,
    /// BLAKE3 hex digest of the snapshot bytes.
    pub hash: Option<String>,
    pub error: Option<String>,
}

impl ExportResponse {
    pub fn success(data: &[u8], checksum: u64, hash: String) -> Self {
        Self {
            success: true,
            data: Some(base64::Engine::encode(
                &base64::engine::general_purpose::STANDARD,
                data,
            )),
            checksum: Some(checksum),
            hash: Some(hash),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            checksum: None,
            hash: None,
            error: Some(msg.into()),
        }
    }
}
