//! # storefront-core
//!
//! The catalog engine of Storefront.
//!
//! This crate holds everything about the hierarchical product catalog that
//! does not need a network: the category hierarchy engine, the record types,
//! input validation, listing queries, storage backends and the snapshot
//! format. The HTTP server and CLI live in the `storefront` app crate.
//!
//! ## Architectural Constraints
//!
//! - No async, no network dependencies
//! - Deterministic: `BTreeMap`/`BTreeSet` only, integer money, no floats
//! - Category children are never stored; every tree view is derived from a
//!   fresh snapshot of the parent references

// =============================================================================
// MODULES
// =============================================================================

pub mod catalog;
pub mod formats;
pub mod hierarchy;
pub mod input;
pub mod media;
pub mod memory;
pub mod primitives;
pub mod query;
pub mod stats;
pub mod storage;
pub mod store;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types
// =============================================================================

pub use types::{
    Category, CategoryId, ImageAsset, Product, ProductDescription, ProductId, Rating, StoreError,
    Variant, VariantImage, discounted_price,
};

// =============================================================================
// RE-EXPORTS: Hierarchy Engine
// =============================================================================

pub use hierarchy::{
    CategoryNode, DanglingParent, IntegrityReport, TreeReport, audit, build_tree,
    build_tree_with_report, collect_descendant_ids, flatten, would_create_cycle,
};

// =============================================================================
// RE-EXPORTS: Catalog and Storage
// =============================================================================

pub use catalog::{
    BulkCategoryOutcome, Catalog, ImageReplacement, StorageBackend, VariantImagesOutcome,
};
pub use formats::CatalogSnapshot;
pub use input::{
    BulkCategory, BulkProduct, CategoryPatch, ImageSlot, NewCategory, NewProduct, ProductPatch,
    VariantImageInput, VariantPatch,
};
pub use memory::MemoryCatalog;
pub use query::{
    CategoryListing, CategoryQuery, CategorySummary, Page, ProductListing, ProductQuery,
    ProductSort,
};
pub use stats::CatalogStats;
pub use storage::RedbCatalog;
pub use store::CatalogStore;
