//! # Catalog Statistics
//!
//! Record counts and the shape of the category forest, for `status` output.

use crate::hierarchy::{audit, build_tree_with_report, max_depth};
use crate::{Category, Product};
use serde::{Deserialize, Serialize};

/// Summary of a catalog snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogStats {
    pub category_count: usize,
    pub root_count: usize,
    /// Depth of the deepest category reachable from a root.
    pub max_depth: usize,
    pub product_count: usize,
    pub active_product_count: usize,
    /// Sum of all variant stock (saturating).
    pub total_stock: u64,
    /// Findings reported by the integrity audit.
    pub integrity_issues: usize,
}

impl CatalogStats {
    #[must_use]
    pub fn compute(categories: &[Category], products: &[Product]) -> Self {
        let (forest, _) = build_tree_with_report(categories);
        Self {
            category_count: categories.len(),
            root_count: forest.len(),
            max_depth: max_depth(&forest),
            product_count: products.len(),
            active_product_count: products.iter().filter(|p| p.is_active).count(),
            total_stock: products
                .iter()
                .fold(0u64, |sum, p| sum.saturating_add(p.total_stock())),
            integrity_issues: audit(categories).issue_count(),
        }
    }
}
