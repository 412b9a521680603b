//! # Snapshot Format
//!
//! Binary serialization of a whole catalog, used by the `file` backend and
//! by export/import.
//!
//! Format: Header (5 bytes) + postcard-serialized [`CatalogSnapshot`].
//! - 4 bytes: Magic ("SFCT")
//! - 1 byte: Version
//!
//! Size and header are validated before the payload is decoded. File I/O
//! lives in the app layer.

use crate::primitives::{FORMAT_VERSION, MAGIC_BYTES};
use crate::{Category, Product, StoreError};
use serde::{Deserialize, Serialize};

/// Maximum accepted snapshot size, header included.
pub const MAX_SNAPSHOT_SIZE: usize = 256 * 1024 * 1024;

const HEADER_LEN: usize = 5;

// =============================================================================
// FILE HEADER
// =============================================================================

/// The header that precedes every snapshot payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotHeader {
    pub magic: [u8; 4],
    pub version: u8,
}

impl SnapshotHeader {
    /// Create a header with the current format version.
    #[must_use]
    pub fn new() -> Self {
        Self {
            magic: *MAGIC_BYTES,
            version: FORMAT_VERSION,
        }
    }

    pub fn validate(&self) -> Result<(), StoreError> {
        if &self.magic != MAGIC_BYTES {
            return Err(StoreError::DeserializationError(
                "Invalid magic bytes".to_string(),
            ));
        }
        if self.version != FORMAT_VERSION {
            return Err(StoreError::DeserializationError(format!(
                "Unsupported version: {} (expected {})",
                self.version, FORMAT_VERSION
            )));
        }
        Ok(())
    }

    #[must_use]
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut bytes = [0u8; HEADER_LEN];
        bytes[0..4].copy_from_slice(&self.magic);
        bytes[4] = self.version;
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, StoreError> {
        if bytes.len() < HEADER_LEN {
            return Err(StoreError::DeserializationError(
                "Header too short".to_string(),
            ));
        }
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&bytes[0..4]);
        Ok(Self {
            magic,
            version: bytes[4],
        })
    }
}

impl Default for SnapshotHeader {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// SNAPSHOT
// =============================================================================

/// Every record of a catalog plus its id counters.
///
/// Records are kept in ascending id order so that equal catalogs encode to
/// identical bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    pub categories: Vec<Category>,
    pub products: Vec<Product>,
    pub next_category_id: u64,
    pub next_product_id: u64,
}

impl CatalogSnapshot {
    /// Serialize to bytes (header + payload).
    pub fn to_bytes(&self) -> Result<Vec<u8>, StoreError> {
        let payload = postcard::to_stdvec(self)
            .map_err(|e| StoreError::SerializationError(e.to_string()))?;

        let mut out = Vec::with_capacity(HEADER_LEN + payload.len());
        out.extend_from_slice(&SnapshotHeader::new().to_bytes());
        out.extend_from_slice(&payload);
        Ok(out)
    }

    /// Deserialize from bytes, validating size and header first.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, StoreError> {
        if bytes.len() < HEADER_LEN {
            return Err(StoreError::DeserializationError(format!(
                "Data too short: minimum {HEADER_LEN} bytes required"
            )));
        }
        if bytes.len() > MAX_SNAPSHOT_SIZE {
            return Err(StoreError::DeserializationError(format!(
                "Data size {} bytes exceeds maximum allowed {} bytes",
                bytes.len(),
                MAX_SNAPSHOT_SIZE
            )));
        }

        SnapshotHeader::from_bytes(bytes)?.validate()?;

        postcard::from_bytes(&bytes[HEADER_LEN..]).map_err(|e| {
            StoreError::DeserializationError(format!("Failed to decode snapshot: {e}"))
        })
    }
}

// =============================================================================
// CHECKSUMS
// =============================================================================

/// 64-bit FNV-1a checksum of encoded snapshot bytes.
///
/// Fast corruption check, not collision resistant.
#[must_use]
pub fn checksum(bytes: &[u8]) -> u64 {
    const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    bytes.iter().fold(OFFSET_BASIS, |hash, byte| {
        (hash ^ u64::from(*byte)).wrapping_mul(PRIME)
    })
}

/// BLAKE3 digest of encoded snapshot bytes, as 64 hex characters.
#[cfg(feature = "crypto-hash")]
#[must_use]
pub fn crypto_hash(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CategoryId, ProductDescription, ProductId, Rating};

    fn snapshot() -> CatalogSnapshot {
        let category = Category {
            id: CategoryId(1),
            name: "Fashion".to_string(),
            slug: "fashion".to_string(),
            parent: None,
            description: String::new(),
            icon: None,
            banner: None,
            is_active: true,
            is_featured: false,
            created_at: 1,
            updated_at: 1,
        };
        let product = Product {
            id: ProductId(1),
            title: "Tee".to_string(),
            brand: "Acme".to_string(),
            category: CategoryId(1),
            description: ProductDescription::default(),
            price: 1_999,
            discount_percentage: 0,
            discounted_price: 1_999,
            variants: Vec::new(),
            rating: Rating::default(),
            is_featured: false,
            is_active: true,
            created_at: 1,
            updated_at: 1,
        };
        CatalogSnapshot {
            categories: vec![category],
            products: vec![product],
            next_category_id: 4,
            next_product_id: 2,
        }
    }

    #[test]
    fn header_layout() {
        let bytes = SnapshotHeader::new().to_bytes();
        assert_eq!(&bytes[0..4], b"SFCT");
        assert_eq!(bytes[4], FORMAT_VERSION);
    }

    #[test]
    fn bytes_roundtrip() {
        let original = snapshot();
        let bytes = original.to_bytes().expect("encode");
        assert_eq!(CatalogSnapshot::from_bytes(&bytes).expect("decode"), original);
    }

    #[test]
    fn encoding_is_deterministic() {
        let a = snapshot().to_bytes().expect("encode");
        let b = snapshot().to_bytes().expect("encode");
        assert_eq!(a, b);
        assert_eq!(checksum(&a), checksum(&b));
    }

    #[test]
    fn rejects_bad_magic() {
        let mut bytes = snapshot().to_bytes().expect("encode");
        bytes[0] = b'X';
        assert!(CatalogSnapshot::from_bytes(&bytes).is_err());
    }

    #[test]
    fn rejects_future_version() {
        let mut bytes = snapshot().to_bytes().expect("encode");
        bytes[4] = FORMAT_VERSION + 1;
        assert!(CatalogSnapshot::from_bytes(&bytes).is_err());
    }

    #[test]
    fn rejects_short_and_truncated_input() {
        assert!(CatalogSnapshot::from_bytes(b"SFC").is_err());
        let bytes = snapshot().to_bytes().expect("encode");
        assert!(CatalogSnapshot::from_bytes(&bytes[..bytes.len() - 3]).is_err());
    }

    #[test]
    fn checksum_detects_change() {
        let mut bytes = snapshot().to_bytes().expect("encode");
        let before = checksum(&bytes);
        let last = bytes.len() - 1;
        bytes[last] ^= 1;
        assert_ne!(before, checksum(&bytes));
    }

    #[test]
    fn fnv_reference_values() {
        assert_eq!(checksum(b""), 0xcbf2_9ce4_8422_2325);
        assert_eq!(checksum(b"a"), 0xaf63_dc4c_8601_ec8c);
    }

    #[cfg(feature = "crypto-hash")]
    #[test]
    fn crypto_hash_is_hex() {
        let hash = crypto_hash(b"storefront");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
