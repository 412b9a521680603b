//! # Catalog Primitives
//!
//! Compiled-in limits and constants for the Storefront catalog.
//!
//! These are immutable at runtime. Input that exceeds them is rejected at
//! the catalog boundary, before any record is written.

/// Magic bytes for the snapshot file header.
pub const MAGIC_BYTES: &[u8; 4] = b"SFCT";

/// Current snapshot format version.
///
/// Increment this when making breaking changes to the snapshot layout.
pub const FORMAT_VERSION: u8 = 1;

// =============================================================================
// INPUT VALIDATION LIMITS
// =============================================================================

/// Maximum length of a category name or product title, in bytes.
pub const MAX_NAME_LENGTH: usize = 200;

/// Maximum length of a slug, in bytes.
pub const MAX_SLUG_LENGTH: usize = 200;

/// Maximum length of a free-text description, in bytes.
pub const MAX_DESCRIPTION_LENGTH: usize = 16_384;

/// Maximum length of a search term, in bytes.
pub const MAX_SEARCH_LENGTH: usize = 256;

/// Maximum number of items accepted by a single bulk upload.
pub const MAX_BULK_ITEMS: usize = 5_000;

/// Maximum number of variants on one product.
pub const MAX_VARIANTS: usize = 64;

/// Maximum number of images on one variant.
pub const MAX_VARIANT_IMAGES: usize = 32;

/// Highest accepted discount percentage.
pub const MAX_DISCOUNT_PERCENTAGE: u8 = 100;

// =============================================================================
// PAGINATION
// =============================================================================

/// Page size used when a listing request does not specify one.
pub const DEFAULT_PAGE_LIMIT: usize = 20;

/// Upper bound on the page size of any listing.
pub const MAX_PAGE_LIMIT: usize = 100;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn magic_bytes_correct() {
        assert_eq!(MAGIC_BYTES, b"SFCT");
    }

    #[test]
    fn default_page_within_bounds() {
        assert!(DEFAULT_PAGE_LIMIT <= MAX_PAGE_LIMIT);
    }
}
