//! # API Endpoint Handlers
//!
//! This module implements the actual HTTP endpoint handlers.
//!
//! Readers take the catalog read lock. Writers go through `AppState::commit`,
//! which holds the write lock for the change and the snapshot write (file
//! backend) and releases it before media cleanup.

use super::{
    AppState,
    error::ApiError,
    types::{
        BulkCategoriesRequest, BulkCategoriesResponse, BulkProductsRequest, DataResponse,
        DeleteResponse, DescendantsResponse, ExportResponse, HealthResponse, ImageRequest,
        ListResponse, StatusResponse, TreeResponse, VariantImagesRequest, VariantsRequest,
    },
};
use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    response::IntoResponse,
};
use storefront_core::{
    Catalog, Category, CategoryId, CategoryListing, CategoryPatch, CategoryQuery, ImageSlot,
    IntegrityReport, NewCategory, NewProduct, Product, ProductId, ProductListing, ProductPatch,
    ProductQuery,
    formats::{checksum, crypto_hash},
};

type JsonBody<T> = Result<Json<T>, JsonRejection>;
type IdPath = Result<Path<u64>, PathRejection>;

/// Backend label for status output.
pub(crate) fn backend_name(catalog: &Catalog) -> &'static str {
    if catalog.is_persistent() {
        "redb"
    } else {
        "in-memory"
    }
}

// =============================================================================
// HEALTH / STATUS
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

/// Catalog counts and forest shape.
pub async fn status_handler(
    State(state): State<AppState>,
) -> Result<Json<StatusResponse>, ApiError> {
    let catalog = state.catalog.read().await;
    let stats = catalog.stats()?;

    Ok(Json(StatusResponse {
        backend: backend_name(&catalog).to_string(),
        stats,
    }))
}

// =============================================================================
// CATEGORY READ HANDLERS
// =============================================================================

/// List categories with search, filters and pagination.
pub async fn list_categories_handler(
    State(state): State<AppState>,
    query: Result<Query<CategoryQuery>, QueryRejection>,
) -> Result<Json<ListResponse<CategoryListing>>, ApiError> {
    let Query(query) = query?;
    let catalog = state.catalog.read().await;
    Ok(Json(catalog.list_categories(&query)?.into()))
}

/// The full category forest.
///
/// Records that cannot be placed are left out and logged.
pub async fn category_tree_handler(
    State(state): State<AppState>,
) -> Result<Json<TreeResponse>, ApiError> {
    let catalog = state.catalog.read().await;
    let (forest, report) = catalog.category_tree()?;

    if !report.is_complete() {
        tracing::warn!(
            event = "category_tree_incomplete",
            excluded = ?report.excluded,
            "{} categories excluded from the tree (dangling parent or cycle)",
            report.excluded.len()
        );
    }

    Ok(Json(TreeResponse {
        success: true,
        data: forest,
        excluded: report.excluded,
    }))
}

/// One category.
pub async fn get_category_handler(
    State(state): State<AppState>,
    path: IdPath,
) -> Result<Json<DataResponse<Category>>, ApiError> {
    let Path(id) = path?;
    let catalog = state.catalog.read().await;
    Ok(Json(DataResponse::new(catalog.get_category(CategoryId(id))?)))
}

/// Ids of a category and all its descendants.
pub async fn category_descendants_handler(
    State(state): State<AppState>,
    path: IdPath,
) -> Result<Json<DescendantsResponse>, ApiError> {
    let Path(id) = path?;
    let catalog = state.catalog.read().await;
    let ids = catalog.category_descendants(CategoryId(id))?;

    Ok(Json(DescendantsResponse {
        success: true,
        category: CategoryId(id),
        data: ids.into_iter().collect(),
    }))
}

/// Data-integrity findings for the category collection.
pub async fn category_audit_handler(
    State(state): State<AppState>,
) -> Result<Json<DataResponse<IntegrityReport>>, ApiError> {
    let catalog = state.catalog.read().await;
    let report = catalog.audit_categories()?;

    if !report.is_clean() {
        tracing::warn!(
            event = "category_integrity_issues",
            issues = report.issue_count(),
            "Category audit found {} issue(s)",
            report.issue_count()
        );
    }

    Ok(Json(DataResponse::new(report)))
}

// =============================================================================
// CATEGORY WRITE HANDLERS
// =============================================================================

/// Create one category.
pub async fn create_category_handler(
    State(state): State<AppState>,
    payload: JsonBody<NewCategory>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(input) = payload?;
    let category = state
        .commit(|catalog| catalog.create_category(input))
        .await?;

    tracing::info!(event = "category_created", id = %category.id, slug = %category.slug);
    Ok((StatusCode::CREATED, Json(DataResponse::new(category))))
}

/// Create many categories, parents referenced by name.
pub async fn bulk_upload_categories_handler(
    State(state): State<AppState>,
    payload: JsonBody<BulkCategoriesRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload?;
    let outcome = state
        .commit(|catalog| catalog.bulk_upload_categories(request.categories))
        .await?;

    tracing::info!(
        event = "categories_bulk_uploaded",
        created = outcome.created.len(),
        skipped = outcome.skipped.len()
    );
    Ok((
        StatusCode::CREATED,
        Json(BulkCategoriesResponse {
            success: true,
            message: "Bulk upload completed".to_string(),
            data: outcome.created,
            skipped: outcome.skipped,
        }),
    ))
}

/// Update a category's own fields.
pub async fn update_category_handler(
    State(state): State<AppState>,
    path: IdPath,
    payload: JsonBody<CategoryPatch>,
) -> Result<Json<DataResponse<Category>>, ApiError> {
    let Path(id) = path?;
    let Json(patch) = payload?;
    if patch.is_empty() {
        return Err(ApiError::BadRequest(
            "No updatable fields provided".to_string(),
        ));
    }

    let category = state
        .commit(|catalog| catalog.update_category(CategoryId(id), patch))
        .await?;
    Ok(Json(DataResponse::new(category)))
}

/// Replace the banner image.
pub async fn set_banner_handler(
    State(state): State<AppState>,
    path: IdPath,
    payload: JsonBody<ImageRequest>,
) -> Result<Json<DataResponse<Category>>, ApiError> {
    replace_image(state, path?, ImageSlot::Banner, payload?).await
}

/// Replace the icon image.
pub async fn set_icon_handler(
    State(state): State<AppState>,
    path: IdPath,
    payload: JsonBody<ImageRequest>,
) -> Result<Json<DataResponse<Category>>, ApiError> {
    replace_image(state, path?, ImageSlot::Icon, payload?).await
}

async fn replace_image(
    state: AppState,
    Path(id): Path<u64>,
    slot: ImageSlot,
    Json(request): Json<ImageRequest>,
) -> Result<Json<DataResponse<Category>>, ApiError> {
    let replacement = state
        .commit(|catalog| catalog.replace_category_image(CategoryId(id), slot, request.into()))
        .await?;

    let stale: Vec<String> = replacement.replaced_public_id.into_iter().collect();
    state.release_media(stale).await;
    Ok(Json(DataResponse::new(replacement.category)))
}

/// Delete a leaf category that no product references.
pub async fn delete_category_handler(
    State(state): State<AppState>,
    path: IdPath,
) -> Result<Json<DeleteResponse>, ApiError> {
    let Path(id) = path?;
    let public_ids = state
        .commit(|catalog| catalog.delete_category(CategoryId(id)))
        .await?;

    tracing::info!(event = "category_deleted", id);
    let media_removed = state.release_media(public_ids).await;
    Ok(Json(DeleteResponse {
        success: true,
        message: "Category deleted successfully".to_string(),
        media_removed,
    }))
}

// =============================================================================
// PRODUCT READ HANDLERS
// =============================================================================

/// List products; the category filter includes every subcategory.
pub async fn list_products_handler(
    State(state): State<AppState>,
    query: Result<Query<ProductQuery>, QueryRejection>,
) -> Result<Json<ListResponse<ProductListing>>, ApiError> {
    let Query(query) = query?;
    let catalog = state.catalog.read().await;
    Ok(Json(catalog.list_products(&query)?.into()))
}

/// One product with its derived fields.
pub async fn get_product_handler(
    State(state): State<AppState>,
    path: IdPath,
) -> Result<Json<DataResponse<ProductListing>>, ApiError> {
    let Path(id) = path?;
    let catalog = state.catalog.read().await;
    Ok(Json(DataResponse::new(
        catalog.get_product_listing(ProductId(id))?,
    )))
}

// =============================================================================
// PRODUCT WRITE HANDLERS
// =============================================================================

/// Create one product.
pub async fn create_product_handler(
    State(state): State<AppState>,
    payload: JsonBody<NewProduct>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(input) = payload?;
    let product = state
        .commit(|catalog| catalog.create_product(input))
        .await?;

    tracing::info!(event = "product_created", id = %product.id);
    Ok((StatusCode::CREATED, Json(DataResponse::new(product))))
}

/// Create many inactive products, categories referenced by name.
pub async fn bulk_upload_products_handler(
    State(state): State<AppState>,
    payload: JsonBody<BulkProductsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload?;
    let products = state
        .commit(|catalog| catalog.bulk_upload_products(request.products))
        .await?;

    tracing::info!(event = "products_bulk_uploaded", created = products.len());
    Ok((StatusCode::CREATED, Json(DataResponse::new(products))))
}

/// Update a product's own fields.
pub async fn update_product_handler(
    State(state): State<AppState>,
    path: IdPath,
    payload: JsonBody<ProductPatch>,
) -> Result<Json<DataResponse<Product>>, ApiError> {
    let Path(id) = path?;
    let Json(patch) = payload?;
    let product = state
        .commit(|catalog| catalog.update_product(ProductId(id), patch))
        .await?;
    Ok(Json(DataResponse::new(product)))
}

/// Update color and stock of variants by index.
pub async fn update_variants_handler(
    State(state): State<AppState>,
    path: IdPath,
    payload: JsonBody<VariantsRequest>,
) -> Result<Json<DataResponse<Product>>, ApiError> {
    let Path(id) = path?;
    let Json(request) = payload?;
    let product = state
        .commit(|catalog| catalog.update_variants(ProductId(id), request.variants))
        .await?;
    Ok(Json(DataResponse::new(product)))
}

/// Replace the images of one variant, slot by slot.
pub async fn replace_variant_images_handler(
    State(state): State<AppState>,
    path: Result<Path<(u64, usize)>, PathRejection>,
    payload: JsonBody<VariantImagesRequest>,
) -> Result<Json<DataResponse<Product>>, ApiError> {
    let Path((id, index)) = path?;
    let Json(request) = payload?;
    let outcome = state
        .commit(|catalog| catalog.replace_variant_images(ProductId(id), index, request.images))
        .await?;

    state.release_media(outcome.removed_public_ids).await;
    Ok(Json(DataResponse::new(outcome.product)))
}

/// Delete a product and its variant images.
pub async fn delete_product_handler(
    State(state): State<AppState>,
    path: IdPath,
) -> Result<Json<DeleteResponse>, ApiError> {
    let Path(id) = path?;
    let public_ids = state
        .commit(|catalog| catalog.delete_product(ProductId(id)))
        .await?;

    tracing::info!(event = "product_deleted", id);
    let media_removed = state.release_media(public_ids).await;
    Ok(Json(DeleteResponse {
        success: true,
        message: "Product deleted successfully".to_string(),
        media_removed,
    }))
}

// =============================================================================
// EXPORT HANDLER
// =============================================================================

/// Export the whole catalog as a base64 snapshot with its checksums.
pub async fn export_handler(State(state): State<AppState>) -> impl IntoResponse {
    let catalog = state.catalog.read().await;

    let bytes = match catalog.snapshot().and_then(|snapshot| snapshot.to_bytes()) {
        Ok(bytes) => bytes,
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ExportResponse::error(format!("Export failed: {}", e))),
            );
        }
    };

    (
        StatusCode::OK,
        Json(ExportResponse::success(
            &bytes,
            checksum(&bytes),
            crypto_hash(&bytes),
        )),
    )
}
