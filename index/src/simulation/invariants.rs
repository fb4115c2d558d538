//! Invariant checking for deterministic simulation testing.
//!
//! This module verifies the structural invariants of a `BTree` after each
//! operation and compares its contents against a reference model.

use std::collections::BTreeMap;

use crate::btree::{BTree, Node, NodeLayout};

/// An invariant violation detected during simulation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantViolation {
    /// Description of the violation.
    pub description: String,
    /// Operation index where it was detected.
    pub operation_index: usize,
    /// Additional context.
    pub context: String,
}

/// Structural summary gathered while checking a tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TreeShape {
    /// Number of entries reachable from the root.
    pub entries: usize,
    /// Number of nodes reachable from the root.
    pub nodes: usize,
    /// Depth of the leaves, 0 for a rootless tree.
    pub height: usize,
}

/// Bounds and bookkeeping threaded through the recursive walk.
struct Walk<'a> {
    layout: &'a NodeLayout,
    operation_index: usize,
    leaf_depth: Option<usize>,
    shape: TreeShape,
}

/// Checker for B-tree invariants.
pub struct InvariantChecker {
    /// Detected violations.
    violations: Vec<InvariantViolation>,
}

impl Default for InvariantChecker {
    fn default() -> Self {
        Self::new()
    }
}

impl InvariantChecker {
    /// Create a new invariant checker.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            violations: Vec::new(),
        }
    }

    /// Get all violations.
    #[must_use]
    pub fn violations(&self) -> &[InvariantViolation] {
        &self.violations
    }

    /// Check if any violations were detected.
    #[must_use]
    pub const fn has_violations(&self) -> bool {
        !self.violations.is_empty()
    }

    /// Clear all recorded violations.
    pub fn clear(&mut self) {
        self.violations.clear();
    }

    /// Add a violation.
    pub fn add_violation(&mut self, violation: InvariantViolation) {
        self.violations.push(violation);
    }

    fn violation(&mut self, description: &str, operation_index: usize, context: String) {
        self.violations.push(InvariantViolation {
            description: description.to_string(),
            operation_index,
            context,
        });
    }

    /// Check every structural invariant of `tree`.
    ///
    /// - entry counts within `[min_entries, max_entries]` (root: `[1, max_entries]`)
    /// - child count is 0 or entries + 1
    /// - keys strictly increasing and within the separator bounds of the parent
    /// - all leaves at the same depth
    /// - `len()` and `height()` agree with the walk
    pub fn check_tree(&mut self, tree: &BTree, operation_index: usize) -> TreeShape {
        let mut walk = Walk {
            layout: tree.layout(),
            operation_index,
            leaf_depth: None,
            shape: TreeShape::default(),
        };

        if let Some(root) = tree.root() {
            if root.entries().is_empty() {
                self.violation(
                    "Root has no entries",
                    operation_index,
                    format!("children: {}", root.children().len()),
                );
            }
            self.check_node(root, true, 1, None, None, &mut walk);
        }

        walk.shape.height = walk.leaf_depth.unwrap_or(0);

        if walk.shape.entries != tree.len() {
            self.violation(
                "Entry count does not match len()",
                operation_index,
                format!("walked {}, len() {}", walk.shape.entries, tree.len()),
            );
        }

        if walk.shape.height != tree.height() {
            self.violation(
                "Leaf depth does not match height()",
                operation_index,
                format!("walked {}, height() {}", walk.shape.height, tree.height()),
            );
        }

        walk.shape
    }

    fn check_node(
        &mut self,
        node: &Node,
        is_root: bool,
        depth: usize,
        lower: Option<&[u8]>,
        upper: Option<&[u8]>,
        walk: &mut Walk<'_>,
    ) {
        let entries = node.entries();
        let children = node.children();
        let operation_index = walk.operation_index;

        walk.shape.nodes += 1;
        walk.shape.entries += entries.len();

        if entries.len() > walk.layout.max_entries {
            self.violation(
                "Node exceeds max_entries",
                operation_index,
                format!("depth {depth}: {} > {}", entries.len(), walk.layout.max_entries),
            );
        }

        if !is_root && entries.len() < walk.layout.min_entries {
            self.violation(
                "Node below min_entries",
                operation_index,
                format!("depth {depth}: {} < {}", entries.len(), walk.layout.min_entries),
            );
        }

        if !children.is_empty() && children.len() != entries.len() + 1 {
            self.violation(
                "Internal node has wrong child count",
                operation_index,
                format!(
                    "depth {depth}: {} children for {} entries",
                    children.len(),
                    entries.len()
                ),
            );
        }

        for pair in entries.windows(2) {
            if pair[0].key >= pair[1].key {
                self.violation(
                    "Entries not strictly increasing",
                    operation_index,
                    format!("depth {depth}: {:?} >= {:?}", pair[0].key, pair[1].key),
                );
            }
        }

        for entry in entries {
            let key = entry.key.as_slice();
            let above_lower = lower.is_none_or(|bound| key > bound);
            let below_upper = upper.is_none_or(|bound| key < bound);
            if !above_lower || !below_upper {
                self.violation(
                    "Key outside parent separator bounds",
                    operation_index,
                    format!("depth {depth}: {key:?} not in ({lower:?}, {upper:?})"),
                );
            }
        }

        if children.is_empty() {
            match walk.leaf_depth {
                None => walk.leaf_depth = Some(depth),
                Some(expected) if expected != depth => self.violation(
                    "Leaves at different depths",
                    operation_index,
                    format!("expected {expected}, found {depth}"),
                ),
                Some(_) => {}
            }
            return;
        }

        for (i, child) in children.iter().enumerate() {
            let child_lower = if i == 0 {
                lower
            } else {
                entries.get(i - 1).map(|e| e.key.as_slice())
            };
            let child_upper = entries.get(i).map_or(upper, |e| Some(e.key.as_slice()));
            self.check_node(child, false, depth + 1, child_lower, child_upper, walk);
        }
    }

    /// Check that the tree holds exactly the contents of the reference model.
    pub fn check_matches_model(
        &mut self,
        tree: &BTree,
        model: &BTreeMap<Vec<u8>, Vec<u8>>,
        operation_index: usize,
    ) {
        if tree.len() != model.len() {
            self.violation(
                "Tree and model sizes differ",
                operation_index,
                format!("tree {}, model {}", tree.len(), model.len()),
            );
        }

        for (key, expected) in model {
            match tree.find(key) {
                Ok(actual) if actual == expected.as_slice() => {}
                Ok(actual) => self.violation(
                    "Tree value differs from model",
                    operation_index,
                    format!("key {key:?}: tree {actual:?}, model {expected:?}"),
                ),
                Err(e) => self.violation(
                    "Model key missing from tree",
                    operation_index,
                    format!("key {key:?}: {e}"),
                ),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(i: u32) -> Vec<u8> {
        i.to_be_bytes().to_vec()
    }

    #[test]
    fn test_empty_tree_has_no_violations() {
        let mut checker = InvariantChecker::new();
        let tree = BTree::new();

        let shape = checker.check_tree(&tree, 0);

        assert!(!checker.has_violations());
        assert_eq!(shape, TreeShape::default());
    }

    #[test]
    fn test_valid_tree_shape() {
        let mut checker = InvariantChecker::new();
        let mut tree = BTree::new();
        for i in 0..100 {
            tree.insert(key(i), vec![1]);
        }

        let shape = checker.check_tree(&tree, 0);

        assert!(!checker.has_violations(), "{:?}", checker.violations());
        assert_eq!(shape.entries, 100);
        assert_eq!(shape.height, tree.height());
        assert!(shape.nodes > 1);
    }

    #[test]
    fn test_model_mismatch_detected() {
        let mut checker = InvariantChecker::new();
        let mut tree = BTree::new();
        tree.insert(key(1), b"a".to_vec());

        let mut model = BTreeMap::new();
        model.insert(key(1), b"b".to_vec());
        model.insert(key(2), b"c".to_vec());

        checker.check_matches_model(&tree, &model, 3);

        let descriptions: Vec<&str> = checker
            .violations()
            .iter()
            .map(|v| v.description.as_str())
            .collect();
        assert!(descriptions.contains(&"Tree and model sizes differ"));
        assert!(descriptions.contains(&"Tree value differs from model"));
        assert!(descriptions.contains(&"Model key missing from tree"));
        assert!(checker.violations().iter().all(|v| v.operation_index == 3));
    }

    #[test]
    fn test_clear() {
        let mut checker = InvariantChecker::new();
        checker.add_violation(InvariantViolation {
            description: "test".to_string(),
            operation_index: 0,
            context: String::new(),
        });
        assert!(checker.has_violations());

        checker.clear();
        assert!(!checker.has_violations());
    }
}
