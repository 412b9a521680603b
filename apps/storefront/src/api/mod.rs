//! # Storefront HTTP API Module
//!
//! This module implements the HTTP REST API server using axum.
//!
//! ## Public Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /status` - Catalog counts and forest shape
//! - `GET /categories` - List categories (search, filters, pagination)
//! - `GET /categories/tree` - Category forest
//! - `GET /categories/{id}` - One category
//! - `GET /categories/{id}/descendants` - Ids of a category and its subtree
//! - `GET /products` - List products (category filter includes subcategories)
//! - `GET /products/{id}` - One product
//!
//! ## Admin Endpoints (Bearer API key)
//!
//! - `GET /categories/audit` - Data-integrity report
//! - `POST /categories`, `POST /categories/bulk-upload`
//! - `PATCH /categories/{id}`, `DELETE /categories/{id}`
//! - `PUT /categories/{id}/banner`, `PUT /categories/{id}/icon`
//! - `POST /products`, `POST /products/bulk-upload`
//! - `PATCH /products/{id}`, `DELETE /products/{id}`
//! - `PATCH /products/{id}/variants`
//! - `PUT /products/{id}/variants/{index}/images`
//! - `POST /export` - Export the catalog snapshot
//!
//! ## Security Configuration
//!
//! See [`ServerConfig`]: API key, CORS origins, rate limit and body limit.

mod auth;
mod error;
mod handlers;
mod middleware;
mod types;

pub use error::ApiError;
pub use middleware::create_rate_limiter;
// Re-export handlers and types for integration tests (via `storefront::api::*`)
pub use handlers::{
    bulk_upload_categories_handler, bulk_upload_products_handler, category_audit_handler,
    category_descendants_handler, category_tree_handler, create_category_handler,
    create_product_handler, delete_category_handler, delete_product_handler, export_handler,
    get_category_handler, get_product_handler, health_handler, list_categories_handler,
    list_products_handler, replace_variant_images_handler, set_banner_handler, set_icon_handler,
    status_handler, update_category_handler, update_product_handler, update_variants_handler,
};
pub use types::{
    BulkCategoriesRequest, BulkCategoriesResponse, BulkProductsRequest, DataResponse,
    DeleteResponse, DescendantsResponse, ErrorResponse, ExportResponse, HealthResponse,
    ImageRequest, ListResponse, Pagination, StatusResponse, TreeResponse, VariantImagesRequest,
    VariantsRequest,
};

use crate::config::ServerConfig;
use crate::media::{self, DisabledMediaHost, MediaHost};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, header},
    middleware as axum_middleware,
    routing::{get, patch, post, put},
};
use std::path::PathBuf;
use std::sync::Arc;
use storefront_core::{Catalog, StoreError};
use tokio::sync::RwLock;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state.
#[derive(Clone)]
pub struct AppState {
    /// The catalog service.
    pub catalog: Arc<RwLock<Catalog>>,
    /// Where released images are destroyed.
    pub media: Arc<dyn MediaHost>,
    pub config: Arc<ServerConfig>,
    /// Snapshot file rewritten after every change (file backend only).
    snapshot_file: Option<Arc<PathBuf>>,
}

impl AppState {
    /// Create app state with default configuration and no media host.
    #[must_use]
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog: Arc::new(RwLock::new(catalog)),
            media: Arc::new(DisabledMediaHost),
            config: Arc::new(ServerConfig::default()),
            snapshot_file: None,
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: ServerConfig) -> Self {
        self.config = Arc::new(config);
        self
    }

    #[must_use]
    pub fn with_media(mut self, media: Arc<dyn MediaHost>) -> Self {
        self.media = media;
        self
    }

    /// Persist an in-memory catalog to `path` after every change.
    #[must_use]
    pub fn with_snapshot_file(mut self, path: PathBuf) -> Self {
        self.snapshot_file = Some(Arc::new(path));
        self
    }

    /// Apply one change under the write lock.
    ///
    /// With a snapshot file (and an in-memory catalog) the file is rewritten
    /// after the change; if that write fails the change is rolled back, so a
    /// failed request never leaves memory ahead of the file.
    async fn commit<T>(
        &self,
        change: impl FnOnce(&mut Catalog) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut catalog = self.catalog.write().await;
        let path = match self.snapshot_file.as_deref() {
            Some(path) if !catalog.is_persistent() => path,
            _ => return change(&mut catalog),
        };

        let before = catalog.snapshot()?;
        let value = change(&mut catalog)?;
        if let Err(e) = write_snapshot(path, &catalog).await {
            tracing::error!(
                event = "snapshot_write_failed",
                path = %path.display(),
                error = %e,
                "Rolling back catalog change"
            );
            catalog.restore_snapshot(before)?;
            return Err(e);
        }
        Ok(value)
    }

    /// Hand released images to the media host.
    async fn release_media(&self, public_ids: Vec<String>) -> usize {
        media::destroy_all(Arc::clone(&self.media), public_ids).await
    }
}

async fn write_snapshot(path: &std::path::Path, catalog: &Catalog) -> Result<(), StoreError> {
    let bytes = catalog.snapshot()?.to_bytes()?;
    tokio::fs::write(path, &bytes)
        .await
        .map_err(|e| StoreError::IoError(format!("Write snapshot '{}': {}", path.display(), e)))
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

const CORS_METHODS: [Method; 6] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::PATCH,
    Method::DELETE,
    Method::OPTIONS,
];

/// Build the CORS layer from the configured origins.
///
/// - `None`: localhost only (restrictive default)
/// - containing `"*"`: all origins, with a warning
/// - otherwise: the listed origins; invalid entries are skipped
fn build_cors_layer(origins: Option<&[String]>) -> CorsLayer {
    let Some(origins) = origins else {
        tracing::info!("CORS: No origins configured, defaulting to localhost only");
        return build_localhost_cors();
    };

    if origins.iter().any(|o| o == "*") {
        tracing::warn!("CORS: Allowing ALL origins. This is insecure for production!");
        return CorsLayer::permissive();
    }

    let allowed_origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(hv) => {
                tracing::info!("CORS: Allowing origin: {}", origin);
                Some(hv)
            }
            Err(e) => {
                tracing::warn!("CORS: Invalid origin '{}': {}", origin, e);
                None
            }
        })
        .collect();

    if allowed_origins.is_empty() {
        tracing::warn!("CORS: No valid origins configured, defaulting to localhost only");
        return build_localhost_cors();
    }

    CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods(CORS_METHODS)
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

/// Build a restrictive CORS layer that only allows localhost origins.
fn build_localhost_cors() -> CorsLayer {
    let origins: Vec<HeaderValue> = [
        "http://localhost:3000",
        "http://localhost:8080",
        "http://127.0.0.1:3000",
        "http://127.0.0.1:8080",
    ]
    .into_iter()
    .filter_map(|origin| origin.parse::<HeaderValue>().ok())
    .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(CORS_METHODS)
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/status", get(handlers::status_handler))
        .route("/categories", get(handlers::list_categories_handler))
        .route("/categories/tree", get(handlers::category_tree_handler))
        .route("/categories/{id}", get(handlers::get_category_handler))
        .route(
            "/categories/{id}/descendants",
            get(handlers::category_descendants_handler),
        )
        .route("/products", get(handlers::list_products_handler))
        .route("/products/{id}", get(handlers::get_product_handler))
}

fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/categories/audit", get(handlers::category_audit_handler))
        .route("/categories", post(handlers::create_category_handler))
        .route(
            "/categories/bulk-upload",
            post(handlers::bulk_upload_categories_handler),
        )
        .route(
            "/categories/{id}",
            patch(handlers::update_category_handler).delete(handlers::delete_category_handler),
        )
        .route("/categories/{id}/banner", put(handlers::set_banner_handler))
        .route("/categories/{id}/icon", put(handlers::set_icon_handler))
        .route("/products", post(handlers::create_product_handler))
        .route(
            "/products/bulk-upload",
            post(handlers::bulk_upload_products_handler),
        )
        .route(
            "/products/{id}",
            patch(handlers::update_product_handler).delete(handlers::delete_product_handler),
        )
        .route(
            "/products/{id}/variants",
            patch(handlers::update_variants_handler),
        )
        .route(
            "/products/{id}/variants/{index}/images",
            put(handlers::replace_variant_images_handler),
        )
        .route("/export", post(handlers::export_handler))
}

/// Create the axum router with all endpoints and middleware.
///
/// Middleware stack (outer to inner):
/// 1. Tracing - logs all requests
/// 2. CORS - handles preflight requests
/// 3. Body limit
/// 4. Rate Limiting - global, if enabled
/// 5. Authentication - admin routes only, if a key is configured
pub fn create_router(state: AppState) -> Router {
    let config = Arc::clone(&state.config);

    let mut admin = admin_routes();
    match config.api_key.as_deref() {
        Some(key) => {
            tracing::info!("API key authentication enabled for admin routes");
            let key: auth::ApiKey = Arc::from(key);
            admin = admin.route_layer(axum_middleware::from_fn_with_state(
                key,
                auth::api_key_auth_middleware,
            ));
        }
        None => {
            tracing::warn!(
                "⚠️  API key authentication DISABLED - admin routes are publicly accessible! \
                 Set STOREFRONT_API_KEY to enable authentication."
            );
        }
    }

    let mut router = public_routes().merge(admin);

    if config.rate_limit > 0 {
        tracing::info!("Rate limiting enabled: {} requests/second", config.rate_limit);
        router = router.layer(axum_middleware::from_fn_with_state(
            create_rate_limiter(config.rate_limit),
            middleware::rate_limit_middleware,
        ));
    } else {
        tracing::info!("Rate limiting disabled");
    }

    router
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors_layer(config.cors_origins.as_deref()))
                .layer(DefaultBodyLimit::max(config.body_limit)),
        )
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Start the HTTP server.
pub async fn run_server(addr: &str, state: AppState) -> Result<(), StoreError> {
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| StoreError::IoError(format!("Bind failed: {}", e)))?;

    tracing::info!("Storefront HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| StoreError::IoError(format!("Server error: {}", e)))
}

/// Resolve on Ctrl+C.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Cannot listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, stopping server");
}
