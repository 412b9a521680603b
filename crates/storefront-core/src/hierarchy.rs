//! # Category Hierarchy Engine
//!
//! Derives tree views from a flat snapshot of category records, where each
//! record only knows the id of its parent.
//!
//! - `build_tree`: nests every record under its parent, roots at the top
//! - `collect_descendant_ids`: a category plus everything below it
//! - `audit`: data-integrity findings (dangling parents, cycles)
//!
//! The engine never mutates records and keeps no state between calls. Every
//! call builds its own adjacency structure from the snapshot it is given.
//!
//! ## Integrity Policy
//!
//! A record whose parent id does not exist in the snapshot is excluded from
//! the forest. It is not promoted to a root. The same applies to members of
//! a parent cycle and to every descendant of an excluded record. Excluded
//! ids are returned in a [`TreeReport`] so callers can log and surface them.
//!
//! All traversals are iterative with visited tracking, so unbounded depth
//! and cyclic input cannot overflow the stack or loop forever.

use crate::{Category, CategoryId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

// =============================================================================
// TREE TYPES
// =============================================================================

/// A category with its nested subtree.
///
/// Serializes as the category's own fields plus a `children` array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryNode {
    #[serde(flatten)]
    pub category: Category,
    pub children: Vec<CategoryNode>,
}

/// Records that `build_tree_with_report` could not place in the forest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeReport {
    /// Ids of excluded records, in input order.
    pub excluded: Vec<CategoryId>,
}

impl TreeReport {
    /// Check if every record was placed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.excluded.is_empty()
    }
}

// =============================================================================
// TREE CONSTRUCTION
// =============================================================================

/// Build the category forest from a snapshot.
///
/// Roots and siblings keep their input order.
#[must_use]
pub fn build_tree(records: &[Category]) -> Vec<CategoryNode> {
    build_tree_with_report(records).0
}

/// Build the category forest and report the records left out of it.
///
/// Runs in O(n): one pass indexes ids, one pass attaches every record to its
/// parent's child list, then the nested nodes are assembled bottom-up from an
/// explicit stack.
#[must_use]
pub fn build_tree_with_report(records: &[Category]) -> (Vec<CategoryNode>, TreeReport) {
    // Pass 1: id -> position. The first occurrence wins on duplicate ids.
    let mut index: BTreeMap<CategoryId, usize> = BTreeMap::new();
    for (pos, record) in records.iter().enumerate() {
        index.entry(record.id).or_insert(pos);
    }

    // Pass 2: child lists by position. Dangling parents attach nowhere.
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); records.len()];
    let mut roots = Vec::new();
    for (pos, record) in records.iter().enumerate() {
        match record.parent {
            None => roots.push(pos),
            Some(parent) => {
                if let Some(&parent_pos) = index.get(&parent) {
                    children[parent_pos].push(pos);
                }
            }
        }
    }

    // Pre-order walk from the roots. Anything not reached is excluded.
    let mut placed = vec![false; records.len()];
    let mut order = Vec::with_capacity(records.len());
    let mut stack: Vec<usize> = roots.iter().rev().copied().collect();
    while let Some(pos) = stack.pop() {
        if placed[pos] {
            continue;
        }
        placed[pos] = true;
        order.push(pos);
        stack.extend(children[pos].iter().rev().copied());
    }

    // Reverse pre-order visits every child before its parent.
    let mut built: Vec<Option<CategoryNode>> = (0..records.len()).map(|_| None).collect();
    for &pos in order.iter().rev() {
        let nested = children[pos]
            .iter()
            .filter_map(|&child| built[child].take())
            .collect();
        built[pos] = Some(CategoryNode {
            category: records[pos].clone(),
            children: nested,
        });
    }

    let forest = roots
        .iter()
        .filter_map(|&pos| built[pos].take())
        .collect();

    let excluded = records
        .iter()
        .zip(&placed)
        .filter(|(_, placed)| !**placed)
        .map(|(record, _)| record.id)
        .collect();

    (forest, TreeReport { excluded })
}

/// Flatten a forest back into its records, in pre-order.
#[must_use]
pub fn flatten(forest: &[CategoryNode]) -> Vec<&Category> {
    let mut out = Vec::new();
    let mut stack: Vec<&CategoryNode> = forest.iter().rev().collect();
    while let Some(node) = stack.pop() {
        out.push(&node.category);
        stack.extend(node.children.iter().rev());
    }
    out
}

/// Depth of the deepest node in a forest. A lone root has depth 1.
#[must_use]
pub fn max_depth(forest: &[CategoryNode]) -> usize {
    let mut deepest = 0;
    let mut stack: Vec<(&CategoryNode, usize)> = forest.iter().map(|n| (n, 1)).collect();
    while let Some((node, depth)) = stack.pop() {
        deepest = deepest.max(depth);
        stack.extend(node.children.iter().map(|c| (c, depth.saturating_add(1))));
    }
    deepest
}

// =============================================================================
// DESCENDANT EXPANSION
// =============================================================================

/// Group category ids by their parent id.
///
/// Roots and dangling references are keyed like any other parent; lookups
/// only ever start from ids that exist.
#[must_use]
pub fn child_map(records: &[Category]) -> BTreeMap<CategoryId, Vec<CategoryId>> {
    let mut map: BTreeMap<CategoryId, Vec<CategoryId>> = BTreeMap::new();
    for record in records {
        if let Some(parent) = record.parent {
            map.entry(parent).or_default().push(record.id);
        }
    }
    map
}

/// Collect `root` and the id of every category transitively below it.
///
/// `root` is always part of the result, even when it is not in `records`.
/// The visited set is what terminates the walk on cyclic input.
#[must_use]
pub fn collect_descendant_ids(root: CategoryId, records: &[Category]) -> BTreeSet<CategoryId> {
    let adjacency = child_map(records);
    let mut visited = BTreeSet::new();
    let mut stack = vec![root];

    while let Some(current) = stack.pop() {
        if !visited.insert(current) {
            continue;
        }
        if let Some(kids) = adjacency.get(&current) {
            stack.extend(kids.iter().filter(|kid| !visited.contains(*kid)).copied());
        }
    }

    visited
}

/// Check whether making `new_parent` the parent of `id` would close a cycle.
#[must_use]
pub fn would_create_cycle(id: CategoryId, new_parent: CategoryId, records: &[Category]) -> bool {
    new_parent == id || collect_descendant_ids(id, records).contains(&new_parent)
}

// =============================================================================
// INTEGRITY AUDIT
// =============================================================================

/// A parent reference that points at no existing category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DanglingParent {
    pub id: CategoryId,
    pub parent: CategoryId,
}

/// Data-integrity findings for a category snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrityReport {
    /// Records whose parent does not exist.
    pub dangling: Vec<DanglingParent>,
    /// Records that are part of a parent cycle, sorted.
    pub cycles: Vec<CategoryId>,
    /// Records that are fine themselves but sit below a dangling or cyclic
    /// record, so they never reach a root. Sorted.
    pub detached: Vec<CategoryId>,
    /// Ids that occur more than once, sorted.
    pub duplicate_ids: Vec<CategoryId>,
}

impl IntegrityReport {
    /// Check if the snapshot forms a clean forest.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.dangling.is_empty()
            && self.cycles.is_empty()
            && self.detached.is_empty()
            && self.duplicate_ids.is_empty()
    }

    /// Total number of findings.
    #[must_use]
    pub fn issue_count(&self) -> usize {
        self.dangling.len() + self.cycles.len() + self.detached.len() + self.duplicate_ids.len()
    }
}

/// Audit a snapshot for dangling parents, cycles and duplicate ids.
#[must_use]
pub fn audit(records: &[Category]) -> IntegrityReport {
    let mut parent_of: BTreeMap<CategoryId, Option<CategoryId>> = BTreeMap::new();
    let mut duplicates = BTreeSet::new();
    for record in records {
        if parent_of.contains_key(&record.id) {
            duplicates.insert(record.id);
        } else {
            parent_of.insert(record.id, record.parent);
        }
    }

    let dangling: Vec<DanglingParent> = records
        .iter()
        .filter_map(|record| {
            let parent = record.parent?;
            (!parent_of.contains_key(&parent)).then_some(DanglingParent {
                id: record.id,
                parent,
            })
        })
        .collect();

    let cycles = find_cycles(&parent_of);

    let (_, tree_report) = build_tree_with_report(records);
    let flagged: BTreeSet<CategoryId> = dangling
        .iter()
        .map(|d| d.id)
        .chain(cycles.iter().copied())
        .collect();
    let detached: BTreeSet<CategoryId> = tree_report
        .excluded
        .into_iter()
        .filter(|id| !flagged.contains(id))
        .collect();

    IntegrityReport {
        dangling,
        cycles,
        detached: detached.into_iter().collect(),
        duplicate_ids: duplicates.into_iter().collect(),
    }
}

/// Find every id that lies on a parent cycle.
///
/// Each id has at most one parent, so following parent links from any start
/// either ends at a root, at a dangling reference, at an already resolved id,
/// or runs into the current walk. Only the last case is a cycle.
fn find_cycles(parent_of: &BTreeMap<CategoryId, Option<CategoryId>>) -> Vec<CategoryId> {
    #[derive(Clone, Copy, PartialEq, Eq)]
    enum Mark {
        OnPath,
        Done,
    }

    let mut marks: BTreeMap<CategoryId, Mark> = BTreeMap::new();
    let mut on_cycle = BTreeSet::new();

    for &start in parent_of.keys() {
        if marks.contains_key(&start) {
            continue;
        }

        let mut path = Vec::new();
        let mut current = Some(start);
        while let Some(id) = current {
            match marks.get(&id) {
                Some(Mark::Done) => break,
                Some(Mark::OnPath) => {
                    // Everything from the first visit of `id` onwards loops.
                    if let Some(first) = path.iter().position(|p| *p == id) {
                        on_cycle.extend(path[first..].iter().copied());
                    }
                    break;
                }
                None => {}
            }
            marks.insert(id, Mark::OnPath);
            path.push(id);
            current = parent_of.get(&id).copied().flatten();
            if let Some(next) = current {
                if !parent_of.contains_key(&next) {
                    break;
                }
            }
        }

        for id in path {
            marks.insert(id, Mark::Done);
        }
    }

    on_cycle.into_iter().collect()
}

// =============================================================================
// TESTS
// =============================================================================
