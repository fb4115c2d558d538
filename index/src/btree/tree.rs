//! In-memory B-tree over byte-sequence keys and values.
//!
//! Keys are ordered byte-lexicographically and are unique within a tree.
//! Insertion splits full nodes on the way down; deletion repairs underflowing
//! nodes on the way back up. Both keep every leaf at the same depth.

use crate::btree::node::{Entry, Node, NodeLayout};
use crate::config::TreeConfig;

/// An ordered key-value index.
#[derive(Debug)]
pub struct BTree {
    root: Option<Node>,
    layout: NodeLayout,
    len: usize,
}

impl Default for BTree {
    fn default() -> Self {
        Self::new()
    }
}

impl BTree {
    /// Create an empty tree with the default degree.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            root: None,
            layout: NodeLayout::for_degree(TreeConfig::DEFAULT_DEGREE),
            len: 0,
        }
    }

    /// Create an empty tree with the given degree.
    ///
    /// # Errors
    ///
    /// Returns `BTreeError::InvalidDegree` if `degree` is less than 2.
    pub fn with_degree(degree: usize) -> Result<Self, BTreeError> {
        Self::with_config(&TreeConfig::new(degree))
    }

    /// Create an empty tree from a configuration.
    ///
    /// # Errors
    ///
    /// Returns `BTreeError::InvalidDegree` if the configured degree is too small.
    pub fn with_config(config: &TreeConfig) -> Result<Self, BTreeError> {
        config
            .validate()
            .map_err(|_| BTreeError::InvalidDegree(config.degree))?;

        let layout = NodeLayout::for_degree(config.degree);
        tracing::debug!(
            degree = layout.degree,
            max_entries = layout.max_entries,
            min_entries = layout.min_entries,
            "created b-tree"
        );

        Ok(Self {
            root: None,
            layout,
            len: 0,
        })
    }

    /// The configured degree.
    #[must_use]
    pub const fn degree(&self) -> usize {
        self.layout.degree
    }

    /// The node capacity limits in effect.
    #[must_use]
    pub const fn layout(&self) -> &NodeLayout {
        &self.layout
    }

    /// Number of entries in the tree.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Check if the tree holds no entries.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of node levels, 0 for a tree without a root.
    #[must_use]
    pub fn height(&self) -> usize {
        let mut height = 0;
        let mut next = self.root.as_ref();

        while let Some(node) = next {
            height += 1;
            next = node.children().first();
        }

        height
    }

    /// The root node, if one has been allocated.
    #[must_use]
    pub const fn root(&self) -> Option<&Node> {
        self.root.as_ref()
    }

    /// Look up a value by key.
    ///
    /// # Errors
    ///
    /// Returns `BTreeError::NotFound` if the key is absent or the tree is empty.
    pub fn find(&self, key: &[u8]) -> Result<&[u8], BTreeError> {
        self.root
            .as_ref()
            .and_then(|root| root.find(key))
            .ok_or(BTreeError::NotFound)
    }

    /// Check if a key is present.
    #[must_use]
    pub fn contains_key(&self, key: &[u8]) -> bool {
        self.find(key).is_ok()
    }

    /// Insert or update a key-value pair.
    pub fn insert(&mut self, key: Vec<u8>, value: Vec<u8>) {
        let layout = self.layout;
        let mut root = self
            .root
            .take()
            .unwrap_or_else(|| Node::leaf(&layout));

        if root.is_full(&layout) {
            root = Self::split_root(root, &layout);
        }

        if root.insert(Entry::new(key, value), &layout) {
            self.len += 1;
        }

        self.root = Some(root);
    }

    /// Delete a key.
    ///
    /// Returns true if the key was present and has been removed.
    pub fn delete(&mut self, key: &[u8]) -> bool {
        self.remove(key).is_some()
    }

    /// Remove a key, returning its value if it was present.
    pub fn remove(&mut self, key: &[u8]) -> Option<Vec<u8>> {
        let mut root = self.root.take()?;

        let removed = root.delete(key, false, &self.layout);

        self.root = if !root.entries().is_empty() {
            Some(root)
        } else if root.is_leaf() {
            tracing::trace!("removed last entry, tree is empty");
            None
        } else {
            tracing::trace!("collapsed root");
            root.children.pop()
        };

        let removed = removed?;
        self.len -= 1;
        Some(removed.value)
    }

    /// Grow the tree by one level around a full root.
    fn split_root(mut old_root: Node, layout: &NodeLayout) -> Node {
        let (middle, sibling) = old_root.split(layout);

        let mut new_root = Node::internal(layout);
        new_root.entries.push(middle);
        new_root.children.push(old_root);
        new_root.children.push(sibling);

        tracing::trace!("split root");
        new_root
    }
}

/// Errors that can occur during B-tree operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BTreeError {
    /// The key is not present in the tree.
    NotFound,
    /// The configured degree is below the minimum.
    InvalidDegree(usize),
}

impl std::fmt::Display for BTreeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound => write!(f, "key not found"),
            Self::InvalidDegree(degree) => write!(
                f,
                "invalid degree: {degree} (min {})",
                TreeConfig::MIN_DEGREE
            ),
        }
    }
}

impl std::error::Error for BTreeError {}
