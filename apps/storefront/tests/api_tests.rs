//! Integration tests for the Storefront HTTP API.
//!
//! Uses axum-test to test the API handlers without starting a real server.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use axum::http::{HeaderValue, StatusCode, header};
use axum_test::TestServer;
use serde_json::{Value, json};
use std::sync::Arc;
use storefront::api::{
    AppState, BulkCategoriesResponse, DataResponse, DeleteResponse, DescendantsResponse,
    ErrorResponse, ExportResponse, HealthResponse, ListResponse, StatusResponse, TreeResponse,
    create_router,
};
use storefront::config::ServerConfig;
use storefront::media::DirectoryMediaHost;
use storefront_core::{
    Catalog, Category, CategoryId, CategoryListing, CatalogSnapshot, IntegrityReport, NewCategory,
    NewProduct, Product, ProductListing, Variant, VariantImage,
};

const API_KEY: &str = "test-admin-key";

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Configuration without rate limiting, so tests never hit 429.
fn test_config() -> ServerConfig {
    ServerConfig {
        rate_limit: 0,
        ..ServerConfig::default()
    }
}

fn server_for(state: AppState) -> TestServer {
    TestServer::new(create_router(state)).unwrap()
}

/// Create a test server with an empty in-memory catalog and no API key.
fn create_test_server() -> TestServer {
    server_for(AppState::new(Catalog::new()).with_config(test_config()))
}

/// Fashion(1) > Men(2) > Sneakers(3), Fashion > Women(4), Home(5);
/// products: Runner in Sneakers, Dress in Women, Lamp in Home.
fn populated_catalog() -> Catalog {
    let mut catalog = Catalog::new();
    let fashion = catalog
        .create_category(NewCategory::new("Fashion", "fashion"))
        .unwrap()
        .id;
    let men = catalog
        .create_category(NewCategory::new("Men", "men").with_parent(fashion))
        .unwrap()
        .id;
    let sneakers = catalog
        .create_category(NewCategory::new("Sneakers", "sneakers").with_parent(men))
        .unwrap()
        .id;
    let women = catalog
        .create_category(NewCategory::new("Women", "women").with_parent(fashion))
        .unwrap()
        .id;
    let home = catalog
        .create_category(NewCategory::new("Home", "home"))
        .unwrap()
        .id;

    for (title, category, price) in [
        ("Runner", sneakers, 8_000),
        ("Dress", women, 6_000),
        ("Lamp", home, 3_000),
    ] {
        catalog
            .create_product(NewProduct::new(title, "Acme", category, price))
            .unwrap();
    }
    catalog
}

fn create_populated_test_server() -> TestServer {
    server_for(AppState::new(populated_catalog()).with_config(test_config()))
}

/// Server with admin routes behind `API_KEY`.
fn create_authenticated_test_server() -> TestServer {
    let config = ServerConfig {
        api_key: Some(API_KEY.to_string()),
        ..test_config()
    };
    server_for(AppState::new(populated_catalog()).with_config(config))
}

fn bearer(key: &str) -> HeaderValue {
    format!("Bearer {}", key).parse::<HeaderValue>().unwrap()
}

fn titles(page: &ListResponse<ProductListing>) -> Vec<String> {
    page.data.iter().map(|p| p.product.title.clone()).collect()
}

// =============================================================================
// HEALTH / STATUS ENDPOINT TESTS
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let server = create_test_server();

    let response = server.get("/health").await;

    response.assert_status_ok();
    let health: HealthResponse = response.json();
    assert_eq!(health.status, "ok");
    assert_eq!(health.version, env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_status_reports_shape() {
    let server = create_populated_test_server();

    let response = server.get("/status").await;

    response.assert_status_ok();
    let status: StatusResponse = response.json();
    assert_eq!(status.backend, "in-memory");
    assert_eq!(status.stats.category_count, 5);
    assert_eq!(status.stats.root_count, 2);
    assert_eq!(status.stats.max_depth, 3);
    assert_eq!(status.stats.product_count, 3);
    assert_eq!(status.stats.integrity_issues, 0);
}

// =============================================================================
// CATEGORY READ TESTS
// =============================================================================

#[tokio::test]
async fn test_tree_nests_children_in_creation_order() {
    let server = create_populated_test_server();

    let response = server.get("/categories/tree").await;

    response.assert_status_ok();
    let tree: TreeResponse = response.json();
    assert!(tree.success);
    assert!(tree.excluded.is_empty());

    let roots: Vec<&str> = tree.data.iter().map(|n| n.category.name.as_str()).collect();
    assert_eq!(roots, vec!["Fashion", "Home"]);
    let fashion_children: Vec<&str> = tree.data[0]
        .children
        .iter()
        .map(|n| n.category.name.as_str())
        .collect();
    assert_eq!(fashion_children, vec!["Men", "Women"]);
    assert_eq!(tree.data[0].children[0].children[0].category.slug, "sneakers");
}

#[tokio::test]
async fn test_tree_json_flattens_category_fields() {
    let server = create_populated_test_server();

    let body: Value = server.get("/categories/tree").await.json();

    let root = &body["data"][0];
    assert_eq!(root["name"], "Fashion");
    assert_eq!(root["parent"], Value::Null);
    assert!(root["children"].is_array());
    assert!(root.get("category").is_none());
}

#[tokio::test]
async fn test_empty_tree() {
    let server = create_test_server();

    let tree: TreeResponse = server.get("/categories/tree").await.json();
    assert!(tree.data.is_empty());
}

#[tokio::test]
async fn test_tree_excludes_dangling_parent() {
    let mut snapshot = populated_catalog().snapshot().unwrap();
    snapshot.categories[4].parent = Some(CategoryId(99));
    let server = server_for(
        AppState::new(Catalog::from_snapshot(snapshot).unwrap()).with_config(test_config()),
    );

    let tree: TreeResponse = server.get("/categories/tree").await.json();
    assert_eq!(tree.data.len(), 1);
    assert_eq!(tree.excluded, vec![CategoryId(5)]);

    let audit: DataResponse<IntegrityReport> = server.get("/categories/audit").await.json();
    assert_eq!(audit.data.dangling.len(), 1);
    assert_eq!(audit.data.dangling[0].parent, CategoryId(99));
}

#[tokio::test]
async fn test_descendants() {
    let server = create_populated_test_server();

    let response = server.get("/categories/1/descendants").await;

    response.assert_status_ok();
    let body: DescendantsResponse = response.json();
    assert_eq!(body.category, CategoryId(1));
    assert_eq!(
        body.data,
        vec![CategoryId(1), CategoryId(2), CategoryId(3), CategoryId(4)]
    );

    let leaf: DescendantsResponse = server.get("/categories/3/descendants").await.json();
    assert_eq!(leaf.data, vec![CategoryId(3)]);
}

#[tokio::test]
async fn test_descendants_unknown_category() {
    let server = create_populated_test_server();

    let response = server.get("/categories/42/descendants").await;

    response.assert_status_not_found();
    let body: ErrorResponse = response.json();
    assert!(!body.success);
    assert!(body.error.contains("42"));
}

#[tokio::test]
async fn test_get_category() {
    let server = create_populated_test_server();

    let response = server.get("/categories/2").await;
    response.assert_status_ok();
    let body: DataResponse<Category> = response.json();
    assert_eq!(body.data.name, "Men");
    assert_eq!(body.data.parent, Some(CategoryId(1)));

    server.get("/categories/77").await.assert_status_not_found();
}

#[tokio::test]
async fn test_non_numeric_id_is_bad_request() {
    let server = create_populated_test_server();

    let response = server.get("/categories/abc").await;

    response.assert_status_bad_request();
    let body: ErrorResponse = response.json();
    assert!(!body.success);
}

#[tokio::test]
async fn test_list_categories_search_and_pagination() {
    let server = create_populated_test_server();

    // Matches by parent name: Men and Women sit under Fashion.
    let page: ListResponse<CategoryListing> =
        server.get("/categories?search=fash").await.json();
    let names: Vec<&str> = page.data.iter().map(|c| c.category.name.as_str()).collect();
    assert_eq!(names, vec!["Fashion", "Men", "Women"]);
    assert_eq!(page.data[1].parent_name.as_deref(), Some("Fashion"));

    let page: ListResponse<CategoryListing> =
        server.get("/categories?page=2&limit=2").await.json();
    assert_eq!(page.pagination.total, 5);
    assert_eq!(page.pagination.total_pages, 3);
    assert_eq!(page.data[0].category.name, "Sneakers");
}

#[tokio::test]
async fn test_list_categories_bad_query() {
    let server = create_populated_test_server();

    let response = server.get("/categories?active=maybe").await;

    response.assert_status_bad_request();
}

// =============================================================================
// CATEGORY WRITE TESTS
// =============================================================================

#[tokio::test]
async fn test_create_category_under_parent() {
    let server = create_populated_test_server();

    let response = server
        .post("/categories")
        .json(&json!({ "name": "Kids", "slug": "kids", "parent": "1" }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let body: DataResponse<Category> = response.json();
    assert_eq!(body.data.id, CategoryId(6));
    assert_eq!(body.data.parent, Some(CategoryId(1)));
    assert!(body.data.is_active);

    let tree: TreeResponse = server.get("/categories/tree").await.json();
    assert_eq!(tree.data[0].children.len(), 3);
}

#[tokio::test]
async fn test_create_category_duplicate_slug_conflicts() {
    let server = create_populated_test_server();

    let response = server
        .post("/categories")
        .json(&json!({ "name": "Fashion 2", "slug": "fashion" }))
        .await;

    response.assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_create_category_unknown_parent() {
    let server = create_populated_test_server();

    let response = server
        .post("/categories")
        .json(&json!({ "name": "Orphan", "slug": "orphan", "parent": 404 }))
        .await;

    response.assert_status_bad_request();
}

#[tokio::test]
async fn test_create_category_malformed_body() {
    let server = create_test_server();

    let response = server
        .post("/categories")
        .json(&json!({ "slug": "no-name" }))
        .await;

    response.assert_status_bad_request();
    let body: ErrorResponse = response.json();
    assert!(body.error.starts_with("Invalid JSON body"));
}

#[tokio::test]
async fn test_bulk_upload_creates_missing_parents_and_skips_existing() {
    let server = create_populated_test_server();

    let response = server
        .post("/categories/bulk-upload")
        .json(&json!({
            "categories": [
                { "name": "Boots", "slug": "boots", "parent": "Men" },
                { "name": "Chairs", "slug": "chairs", "parent": "Living Room" },
                { "name": "Home", "slug": "home" }
            ]
        }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let body: BulkCategoriesResponse = response.json();
    let created: Vec<&str> = body.data.iter().map(|c| c.slug.as_str()).collect();
    assert!(created.contains(&"boots"));
    assert!(created.contains(&"living-room"));
    assert!(created.contains(&"chairs"));
    assert_eq!(body.skipped, vec!["home".to_string()]);

    let living_room = body.data.iter().find(|c| c.slug == "living-room").unwrap();
    assert!(living_room.parent.is_none());
    assert!(living_room.is_active);
    assert!(!living_room.is_featured);
}

#[tokio::test]
async fn test_update_category_reparent_and_cycle() {
    let server = create_populated_test_server();

    let response = server
        .patch("/categories/2")
        .json(&json!({ "parent": 5 }))
        .await;
    response.assert_status_ok();

    let home: DescendantsResponse = server.get("/categories/5/descendants").await.json();
    assert_eq!(home.data, vec![CategoryId(2), CategoryId(3), CategoryId(5)]);

    let cycle = server
        .patch("/categories/5")
        .json(&json!({ "parent": 3 }))
        .await;
    cycle.assert_status_bad_request();
    let body: ErrorResponse = cycle.json();
    assert!(body.error.contains("cycle"));

    let to_root = server
        .patch("/categories/2")
        .json(&json!({ "parent": "" }))
        .await;
    to_root.assert_status_ok();
    let body: DataResponse<Category> = to_root.json();
    assert!(body.data.parent.is_none());
}

#[tokio::test]
async fn test_update_category_empty_patch() {
    let server = create_populated_test_server();

    let response = server.patch("/categories/1").json(&json!({})).await;

    response.assert_status_bad_request();
}

#[tokio::test]
async fn test_delete_category_guards() {
    let server = create_populated_test_server();

    let with_children = server.delete("/categories/1").await;
    with_children.assert_status_bad_request();
    let body: ErrorResponse = with_children.json();
    assert!(body.error.contains("subcategories"));

    server.delete("/categories/5").await.assert_status_bad_request();

    server.delete("/products/3").await.assert_status_ok();
    let response = server.delete("/categories/5").await;
    response.assert_status_ok();
    let body: DeleteResponse = response.json();
    assert!(body.success);

    server.get("/categories/5").await.assert_status_not_found();
}

#[tokio::test]
async fn test_banner_replacement_destroys_old_media() {
    let media_dir = tempfile::tempdir().unwrap();
    let banner_dir = media_dir.path().join("category/banner");
    std::fs::create_dir_all(&banner_dir).unwrap();
    std::fs::write(banner_dir.join("old.jpg"), b"old").unwrap();
    std::fs::write(banner_dir.join("new.jpg"), b"new").unwrap();

    let state = AppState::new(populated_catalog())
        .with_config(test_config())
        .with_media(Arc::new(DirectoryMediaHost::new(media_dir.path())));
    let server = server_for(state);

    let first = server
        .put("/categories/1/banner")
        .json(&json!({ "url": "https://cdn.example/image/upload/v17/category/banner/old.jpg" }))
        .await;
    first.assert_status_ok();
    let body: DataResponse<Category> = first.json();
    assert_eq!(
        body.data.banner.as_ref().map(|b| b.public_id.as_str()),
        Some("category/banner/old")
    );
    assert!(banner_dir.join("old.jpg").exists());

    server
        .put("/categories/1/banner")
        .json(&json!({ "url": "https://cdn.example/image/upload/category/banner/new.jpg" }))
        .await
        .assert_status_ok();

    assert!(!banner_dir.join("old.jpg").exists());
    assert!(banner_dir.join("new.jpg").exists());
}

#[tokio::test]
async fn test_icon_requires_url() {
    let server = create_populated_test_server();

    let response = server
        .put("/categories/1/icon")
        .json(&json!({ "url": "  " }))
        .await;

    response.assert_status_bad_request();
}

// =============================================================================
// PRODUCT TESTS
// =============================================================================

#[tokio::test]
async fn test_products_filtered_by_parent_category_include_subcategories() {
    let server = create_populated_test_server();

    let fashion: ListResponse<ProductListing> =
        server.get("/products?category=1").await.json();
    assert_eq!(titles(&fashion), vec!["Dress", "Runner"]);

    let men: ListResponse<ProductListing> = server.get("/products?category=2").await.json();
    assert_eq!(titles(&men), vec!["Runner"]);
    assert_eq!(
        men.data[0].category_info.as_ref().map(|c| c.slug.as_str()),
        Some("sneakers")
    );
}

#[tokio::test]
async fn test_products_unknown_category_matches_nothing() {
    let server = create_populated_test_server();

    let response = server.get("/products?category=99").await;

    response.assert_status_ok();
    let page: ListResponse<ProductListing> = response.json();
    assert!(page.data.is_empty());
    assert_eq!(page.pagination.total, 0);
}

#[tokio::test]
async fn test_products_sort_and_price_range() {
    let server = create_populated_test_server();

    let page: ListResponse<ProductListing> = server
        .get("/products?sort=price_low_high&min_price=3000&max_price=6000")
        .await
        .json();
    assert_eq!(titles(&page), vec!["Lamp", "Dress"]);

    server
        .get("/products?min_price=9000&max_price=10")
        .await
        .assert_status_bad_request();
}

#[tokio::test]
async fn test_create_update_and_get_product() {
    let server = create_populated_test_server();

    let created = server
        .post("/products")
        .json(&json!({
            "title": "Trail Runner",
            "brand": "Acme",
            "category": 3,
            "price": 10000,
            "discount_percentage": 15,
            "variants": [{ "color_name": "Red", "stock": 4 }]
        }))
        .await;
    created.assert_status(StatusCode::CREATED);
    let product: DataResponse<Product> = created.json();
    assert_eq!(product.data.discounted_price, 8500);

    let id = product.data.id.0;
    let updated = server
        .patch(&format!("/products/{id}"))
        .json(&json!({ "price": 20000 }))
        .await;
    updated.assert_status_ok();
    let product: DataResponse<Product> = updated.json();
    assert_eq!(product.data.discounted_price, 17000);

    let listing: DataResponse<ProductListing> =
        server.get(&format!("/products/{id}")).await.json();
    assert_eq!(listing.data.total_stock, 4);
}

#[tokio::test]
async fn test_create_product_unknown_category() {
    let server = create_populated_test_server();

    let response = server
        .post("/products")
        .json(&json!({ "title": "Ghost", "brand": "Acme", "category": 404, "price": 1 }))
        .await;

    response.assert_status_bad_request();
}

#[tokio::test]
async fn test_bulk_upload_products_inactive() {
    let server = create_populated_test_server();

    let response = server
        .post("/products/bulk-upload")
        .json(&json!({
            "products": [
                { "title": "Sofa", "brand": "Comfy", "category_name": "Home", "price": 50000 }
            ]
        }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let body: DataResponse<Vec<Product>> = response.json();
    assert_eq!(body.data.len(), 1);
    assert!(!body.data[0].is_active);
    assert!(!body.data[0].is_featured);
}

#[tokio::test]
async fn test_variant_stock_and_images() {
    let mut catalog = populated_catalog();
    let mut input = NewProduct::new("Cap", "Acme", CategoryId(3), 2_000);
    input.variants = vec![Variant {
        color_name: "Blue".to_string(),
        color_code: None,
        images: vec![
            VariantImage {
                url: "https://cdn.example/upload/p/cap-front.jpg".to_string(),
                public_id: "p/cap-front".to_string(),
                position: 0,
            },
            VariantImage {
                url: "https://cdn.example/upload/p/cap-back.jpg".to_string(),
                public_id: "p/cap-back".to_string(),
                position: 1,
            },
        ],
        stock: 1,
    }];
    let cap = catalog.create_product(input).unwrap().id.0;
    let server = server_for(AppState::new(catalog).with_config(test_config()));

    let stock = server
        .patch(&format!("/products/{cap}/variants"))
        .json(&json!({ "variants": [{ "index": 0, "stock": 9 }] }))
        .await;
    stock.assert_status_ok();
    let body: DataResponse<Product> = stock.json();
    assert_eq!(body.data.variants[0].stock, 9);
    assert_eq!(body.data.variants[0].images.len(), 2);

    let images = server
        .put(&format!("/products/{cap}/variants/0/images"))
        .json(&json!({
            "images": [
                { "position": 0 },
                { "position": 2, "url": "https://cdn.example/upload/p/cap-side.jpg" }
            ]
        }))
        .await;
    images.assert_status_ok();
    let body: DataResponse<Product> = images.json();
    let public_ids: Vec<&str> = body.data.variants[0]
        .images
        .iter()
        .map(|i| i.public_id.as_str())
        .collect();
    assert_eq!(public_ids, vec!["p/cap-front", "p/cap-side"]);

    server
        .put(&format!("/products/{cap}/variants/5/images"))
        .json(&json!({ "images": [] }))
        .await
        .assert_status_bad_request();
}

// =============================================================================
// EXPORT TESTS
// =============================================================================

#[tokio::test]
async fn test_export_decodes_to_same_catalog() {
    let server = create_populated_test_server();

    let response = server.post("/export").await;

    response.assert_status_ok();
    let body: ExportResponse = response.json();
    assert!(body.success);
    assert_eq!(body.hash.as_deref().map(str::len), Some(64));

    let bytes = base64::Engine::decode(
        &base64::engine::general_purpose::STANDARD,
        body.data.unwrap(),
    )
    .unwrap();
    assert_eq!(
        body.checksum,
        Some(storefront_core::formats::checksum(&bytes))
    );
    let snapshot = CatalogSnapshot::from_bytes(&bytes).unwrap();
    assert_eq!(snapshot.categories.len(), 5);
    assert_eq!(snapshot.products.len(), 3);
    assert_eq!(snapshot.next_category_id, 6);
}

// =============================================================================
// FILE BACKEND PERSISTENCE TESTS
// =============================================================================

#[tokio::test]
async fn test_snapshot_file_rewritten_after_change() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("catalog.sfct");
    let state = AppState::new(Catalog::new())
        .with_config(test_config())
        .with_snapshot_file(path.clone());
    let server = server_for(state);

    server
        .post("/categories")
        .json(&json!({ "name": "Garden", "slug": "garden" }))
        .await
        .assert_status(StatusCode::CREATED);

    let snapshot = CatalogSnapshot::from_bytes(&std::fs::read(&path).unwrap()).unwrap();
    assert_eq!(snapshot.categories.len(), 1);
    assert_eq!(snapshot.categories[0].slug, "garden");
}

#[tokio::test]
async fn test_failed_snapshot_write_rolls_back_change() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing-dir").join("catalog.sfct");
    let state = AppState::new(Catalog::new())
        .with_config(test_config())
        .with_snapshot_file(path.clone());
    let server = server_for(state);

    let first = server
        .post("/categories")
        .json(&json!({ "name": "Garden", "slug": "garden" }))
        .await;
    first.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: ErrorResponse = first.json();
    assert!(body.error.contains("Write snapshot"));

    let page: ListResponse<CategoryListing> = server.get("/categories").await.json();
    assert!(page.data.is_empty());

    // Retrying hits the same write error, not a duplicate-name conflict.
    server
        .post("/categories")
        .json(&json!({ "name": "Garden", "slug": "garden" }))
        .await
        .assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!path.exists());
}

#[tokio::test]
async fn test_failed_snapshot_write_keeps_deleted_product_and_media() {
    let media_dir = tempfile::tempdir().unwrap();
    let product_dir = media_dir.path().join("p");
    std::fs::create_dir_all(&product_dir).unwrap();
    std::fs::write(product_dir.join("mug.jpg"), b"mug").unwrap();

    let mut catalog = populated_catalog();
    let mut input = NewProduct::new("Mug", "Acme", CategoryId(5), 1_500);
    input.variants = vec![Variant {
        color_name: "White".to_string(),
        color_code: None,
        images: vec![VariantImage {
            url: "https://cdn.example/upload/p/mug.jpg".to_string(),
            public_id: "p/mug".to_string(),
            position: 0,
        }],
        stock: 2,
    }];
    let mug = catalog.create_product(input).unwrap().id.0;

    let unwritable = media_dir.path().join("no-such-dir").join("catalog.sfct");
    let state = AppState::new(catalog)
        .with_config(test_config())
        .with_media(Arc::new(DirectoryMediaHost::new(media_dir.path())))
        .with_snapshot_file(unwritable);
    let server = server_for(state);

    server
        .delete(&format!("/products/{mug}"))
        .await
        .assert_status(StatusCode::INTERNAL_SERVER_ERROR);

    server.get(&format!("/products/{mug}")).await.assert_status_ok();
    assert!(product_dir.join("mug.jpg").exists());
}

// =============================================================================
// AUTHENTICATION TESTS
// =============================================================================

#[tokio::test]
async fn test_public_routes_need_no_key() {
    let server = create_authenticated_test_server();

    server.get("/health").await.assert_status_ok();
    server.get("/categories").await.assert_status_ok();
    server.get("/categories/tree").await.assert_status_ok();
    server.get("/categories/1").await.assert_status_ok();
    server.get("/products").await.assert_status_ok();
}

#[tokio::test]
async fn test_admin_routes_reject_missing_or_wrong_key() {
    let server = create_authenticated_test_server();

    server
        .post("/categories")
        .json(&json!({ "name": "Kids", "slug": "kids" }))
        .await
        .assert_status_unauthorized();
    server.get("/categories/audit").await.assert_status_unauthorized();
    server
        .delete("/products/1")
        .add_header(header::AUTHORIZATION, bearer("wrong-key"))
        .await
        .assert_status_unauthorized();
    server.post("/export").await.assert_status_unauthorized();

    // Nothing was deleted.
    server.get("/products/1").await.assert_status_ok();
}

#[tokio::test]
async fn test_admin_routes_accept_bearer_and_raw_key() {
    let server = create_authenticated_test_server();

    server
        .post("/categories")
        .add_header(header::AUTHORIZATION, bearer(API_KEY))
        .json(&json!({ "name": "Kids", "slug": "kids" }))
        .await
        .assert_status(StatusCode::CREATED);

    server
        .get("/categories/audit")
        .add_header(header::AUTHORIZATION, API_KEY.parse::<HeaderValue>().unwrap())
        .await
        .assert_status_ok();
}

// =============================================================================
// RATE LIMIT / BODY LIMIT TESTS
// =============================================================================

#[tokio::test]
async fn test_rate_limit_returns_429() {
    let config = ServerConfig {
        rate_limit: 1,
        ..ServerConfig::default()
    };
    let server = server_for(AppState::new(Catalog::new()).with_config(config));

    server.get("/health").await.assert_status_ok();
    server
        .get("/health")
        .await
        .assert_status(StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_zero_rate_limit_disables_limiter() {
    let server = create_test_server();

    // More than the default burst of 100.
    for _ in 0..120 {
        server.get("/health").await.assert_status_ok();
    }
}

#[tokio::test]
async fn test_body_limit() {
    let config = ServerConfig {
        body_limit: 64,
        ..test_config()
    };
    let server = server_for(AppState::new(Catalog::new()).with_config(config));

    let response = server
        .post("/categories")
        .json(&json!({ "name": "x".repeat(200), "slug": "long" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}
