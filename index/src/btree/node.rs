//! B-tree node types and structural operations.
//!
//! Every node reserves its maximum entry and child capacity when it is
//! allocated and never grows past it:
//! - Leaf nodes: store up to `max_entries` sorted entries and no children
//! - Internal nodes: additionally store `entries.len() + 1` owned children

use std::cmp::Ordering;

/// Capacity limits derived from the tree degree `d`.
///
/// - `max_entries = 2d - 1`
/// - `min_entries = d - 1` (non-root nodes only)
/// - `max_children = 2d`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeLayout {
    pub degree: usize,
    pub max_entries: usize,
    pub min_entries: usize,
    pub max_children: usize,
}

impl NodeLayout {
    /// Derive the layout for a degree that has already been validated.
    #[must_use]
    pub const fn for_degree(degree: usize) -> Self {
        Self {
            degree,
            max_entries: 2 * degree - 1,
            min_entries: degree - 1,
            max_children: 2 * degree,
        }
    }
}

/// A key-value pair stored in a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub key: Vec<u8>,
    pub value: Vec<u8>,
}

impl Entry {
    #[must_use]
    pub const fn new(key: Vec<u8>, value: Vec<u8>) -> Self {
        Self { key, value }
    }
}

/// A B-tree node.
///
/// `children.len()` is 0 for leaves and `entries.len() + 1` otherwise.
/// `Child[i]` holds keys < `Entry[i].key`, `Child[i+1]` holds keys > `Entry[i].key`.
#[derive(Debug)]
pub struct Node {
    /// Entries in strictly increasing key order.
    pub(crate) entries: Vec<Entry>,
    /// Owned child nodes, empty for leaves.
    pub(crate) children: Vec<Self>,
}

impl Node {
    /// Create an empty leaf node.
    #[must_use]
    pub fn leaf(layout: &NodeLayout) -> Self {
        Self {
            entries: Vec::with_capacity(layout.max_entries),
            children: Vec::new(),
        }
    }

    /// Create an empty internal node.
    #[must_use]
    pub fn internal(layout: &NodeLayout) -> Self {
        Self {
            entries: Vec::with_capacity(layout.max_entries),
            children: Vec::with_capacity(layout.max_children),
        }
    }

    /// Entries in key order.
    #[must_use]
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Child nodes, empty for leaves.
    #[must_use]
    pub fn children(&self) -> &[Self] {
        &self.children
    }

    #[must_use]
    #[allow(clippy::missing_const_for_fn)] // Vec::is_empty() is not const-stable
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    #[must_use]
    #[allow(clippy::missing_const_for_fn)] // Vec::len() is not const-stable
    pub fn is_full(&self, layout: &NodeLayout) -> bool {
        self.entries.len() >= layout.max_entries
    }

    /// Binary search for `key`.
    ///
    /// Returns `(index, true)` on a match. Otherwise returns the index of the
    /// first entry greater than `key`, which is also the index of the child
    /// subtree that would contain it.
    #[must_use]
    pub fn search(&self, key: &[u8]) -> (usize, bool) {
        match self
            .entries
            .binary_search_by(|e| e.key.as_slice().cmp(key))
        {
            Ok(i) => (i, true),
            Err(i) => (i, false),
        }
    }

    /// Look up a value in the subtree rooted at this node.
    #[must_use]
    pub fn find(&self, key: &[u8]) -> Option<&[u8]> {
        let mut next = Some(self);

        while let Some(node) = next {
            let (pos, found) = node.search(key);
            if found {
                return Some(node.entries[pos].value.as_slice());
            }
            next = node.children.get(pos);
        }

        None
    }

    /// Split a full node around its middle entry.
    ///
    /// Entries `0..d-1` stay, entry `d-1` is returned for promotion, and
    /// entries `d..2d-1` move to the returned right sibling together with
    /// children `d..2d`.
    #[must_use]
    pub fn split(&mut self, layout: &NodeLayout) -> (Entry, Self) {
        debug_assert!(self.is_full(layout), "only full nodes are split");

        let mid = layout.min_entries;

        let mut right = if self.is_leaf() {
            Self::leaf(layout)
        } else {
            Self::internal(layout)
        };

        right.entries.extend(self.entries.drain(mid + 1..));
        let middle = self.entries.remove(mid);

        if !self.is_leaf() {
            // min_entries + 1 == degree, so both halves keep `degree` children
            right.children.extend(self.children.drain(mid + 1..));
        }

        (middle, right)
    }

    /// Insert or update an entry in the subtree rooted at this non-full node.
    ///
    /// Full children are split before descending, so one downward pass is
    /// enough. Returns true if a new entry was created, false if an existing
    /// value was overwritten.
    pub fn insert(&mut self, entry: Entry, layout: &NodeLayout) -> bool {
        debug_assert!(!self.is_full(layout), "insert descends into non-full nodes only");

        let (mut pos, found) = self.search(&entry.key);

        if found {
            self.entries[pos].value = entry.value;
            return false;
        }

        if self.is_leaf() {
            self.entries.insert(pos, entry);
            return true;
        }

        if self.children[pos].is_full(layout) {
            let (middle, sibling) = self.children[pos].split(layout);
            self.entries.insert(pos, middle);
            self.children.insert(pos + 1, sibling);

            // The promoted entry may redirect the descent
            match entry.key.as_slice().cmp(&self.entries[pos].key) {
                Ordering::Less => {}
                Ordering::Greater => pos += 1,
                Ordering::Equal => {
                    self.entries[pos].value = entry.value;
                    return false;
                }
            }
        }

        self.children[pos].insert(entry, layout)
    }

    /// Delete `key` from the subtree rooted at this node.
    ///
    /// With `seeking_successor` set, the smallest entry of the subtree is
    /// removed instead. Children that underflow on the way back up are
    /// repaired before returning. Returns the removed entry.
    pub fn delete(
        &mut self,
        key: &[u8],
        seeking_successor: bool,
        layout: &NodeLayout,
    ) -> Option<Entry> {
        let (pos, found) = self.search(key);

        if self.is_leaf() {
            if found {
                return Some(self.entries.remove(pos));
            }
            if seeking_successor && !self.entries.is_empty() {
                return Some(self.entries.remove(0));
            }
            return None;
        }

        // An internal match is replaced by its inorder successor, the
        // smallest entry of the right subtree.
        let (child_pos, seeking_successor) = if found {
            (pos + 1, true)
        } else {
            (pos, seeking_successor)
        };

        let removed = self.children[child_pos].delete(key, seeking_successor, layout)?;

        let removed = if found {
            std::mem::replace(&mut self.entries[pos], removed)
        } else {
            removed
        };

        if self.children[child_pos].entries.len() < layout.min_entries {
            self.fill_child_at(child_pos, layout);
        }

        Some(removed)
    }

    /// Repair the underflowing child at `pos`.
    ///
    /// Tries borrowing from the left sibling, then from the right sibling,
    /// and merges with a neighbour otherwise. Only the merge shrinks this node.
    pub fn fill_child_at(&mut self, pos: usize, layout: &NodeLayout) {
        let last = self.children.len() - 1;

        if pos > 0 && self.children[pos - 1].entries.len() > layout.min_entries {
            self.borrow_from_left(pos);
        } else if pos < last && self.children[pos + 1].entries.len() > layout.min_entries {
            self.borrow_from_right(pos);
        } else {
            // Merge with the right neighbour except at the rightmost child
            let left = if pos < last { pos } else { pos - 1 };
            self.merge_children(left, layout);
        }
    }

    /// Rotate the left sibling's last entry through the separator at `pos - 1`.
    fn borrow_from_left(&mut self, pos: usize) {
        let (front, back) = self.children.split_at_mut(pos);
        let left = &mut front[pos - 1];
        let child = &mut back[0];

        let Some(borrowed) = left.entries.pop() else {
            return;
        };
        let separator = std::mem::replace(&mut self.entries[pos - 1], borrowed);
        child.entries.insert(0, separator);

        if let Some(grandchild) = left.children.pop() {
            child.children.insert(0, grandchild);
        }

        tracing::trace!(pos, "borrowed entry from left sibling");
    }

    /// Rotate the right sibling's first entry through the separator at `pos`.
    fn borrow_from_right(&mut self, pos: usize) {
        let (front, back) = self.children.split_at_mut(pos + 1);
        let child = &mut front[pos];
        let right = &mut back[0];

        let borrowed = right.entries.remove(0);
        let separator = std::mem::replace(&mut self.entries[pos], borrowed);
        child.entries.push(separator);

        if !right.is_leaf() {
            child.children.push(right.children.remove(0));
        }

        tracing::trace!(pos, "borrowed entry from right sibling");
    }

    /// Merge `children[left + 1]` and the separator `entries[left]` into
    /// `children[left]`.
    fn merge_children(&mut self, left: usize, layout: &NodeLayout) {
        let right = self.children.remove(left + 1);
        let separator = self.entries.remove(left);

        let node = &mut self.children[left];
        node.entries.push(separator);
        node.entries.extend(right.entries);
        node.children.extend(right.children);
        debug_assert!(
            node.entries.len() <= layout.max_entries
                && node.children.len() <= layout.max_children,
            "merged node exceeds its capacity"
        );

        tracing::trace!(left, remaining = self.entries.len(), "merged siblings");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LAYOUT: NodeLayout = NodeLayout::for_degree(5);

    fn key(i: u32) -> Vec<u8> {
        i.to_be_bytes().to_vec()
    }

    fn entry(i: u32) -> Entry {
        Entry::new(key(i), format!("v{i}").into_bytes())
    }

    fn leaf_with(keys: impl IntoIterator<Item = u32>) -> Node {
        let mut node = Node::leaf(&LAYOUT);
        node.entries.extend(keys.into_iter().map(entry));
        node
    }

    fn keys_of(node: &Node) -> Vec<u32> {
        node.entries
            .iter()
            .map(|e| u32::from_be_bytes([e.key[0], e.key[1], e.key[2], e.key[3]]))
            .collect()
    }

    /// Build a two-level node: one separator per gap between leaf groups.
    fn two_level(separators: &[u32], leaves: Vec<Vec<u32>>) -> Node {
        let mut node = Node::internal(&LAYOUT);
        node.entries.extend(separators.iter().copied().map(entry));
        node.children.extend(leaves.into_iter().map(leaf_with));
        node
    }

    #[test]
    fn test_layout_for_degree() {
        assert_eq!(LAYOUT.max_entries, 9);
        assert_eq!(LAYOUT.min_entries, 4);
        assert_eq!(LAYOUT.max_children, 10);
        assert_eq!(LAYOUT.min_entries + 1, LAYOUT.degree);

        let smallest = NodeLayout::for_degree(2);
        assert_eq!(smallest.max_entries, 3);
        assert_eq!(smallest.min_entries, 1);
    }

    #[test]
    fn test_search() {
        let node = leaf_with([10, 20, 30]);

        assert_eq!(node.search(&key(10)), (0, true));
        assert_eq!(node.search(&key(30)), (2, true));
        assert_eq!(node.search(&key(5)), (0, false));
        assert_eq!(node.search(&key(15)), (1, false));
        assert_eq!(node.search(&key(35)), (3, false));
    }

    #[test]
    fn test_search_empty_node() {
        let node = Node::leaf(&LAYOUT);
        assert_eq!(node.search(b"anything"), (0, false));
        assert_eq!(node.search(b""), (0, false));
    }

    #[test]
    fn test_search_byte_order() {
        let mut node = Node::leaf(&LAYOUT);
        node.entries.push(Entry::new(Vec::new(), b"empty".to_vec()));
        node.entries.push(Entry::new(b"a".to_vec(), b"1".to_vec()));
        node.entries.push(Entry::new(b"ab".to_vec(), b"2".to_vec()));
        node.entries.push(Entry::new(b"b".to_vec(), b"3".to_vec()));

        assert_eq!(node.search(b""), (0, true));
        assert_eq!(node.search(b"aa"), (2, false));
        assert_eq!(node.search(b"ab"), (2, true));
        assert_eq!(node.search(b"abc"), (3, false));
    }

    #[test]
    fn test_split_leaf() {
        let mut node = leaf_with(0..9);

        let (middle, right) = node.split(&LAYOUT);

        assert_eq!(middle.key, key(4));
        assert_eq!(keys_of(&node), vec![0, 1, 2, 3]);
        assert_eq!(keys_of(&right), vec![5, 6, 7, 8]);
        assert!(node.is_leaf());
        assert!(right.is_leaf());
        assert!(right.entries.capacity() >= LAYOUT.max_entries);
    }

    #[test]
    fn test_split_internal() {
        let mut node = Node::internal(&LAYOUT);
        node.entries.extend((0..9).map(|i| entry(i * 10 + 5)));
        node.children
            .extend((0..10).map(|i| leaf_with([i * 10, i * 10 + 1])));

        let (middle, right) = node.split(&LAYOUT);

        assert_eq!(middle.key, key(45));
        assert_eq!(node.entries.len(), 4);
        assert_eq!(node.children.len(), LAYOUT.degree);
        assert_eq!(right.entries.len(), 4);
        assert_eq!(right.children.len(), LAYOUT.degree);
        assert_eq!(keys_of(&right.children[0]), vec![50, 51]);
        assert_eq!(keys_of(&node.children[4]), vec![40, 41]);
    }

    #[test]
    fn test_insert_into_leaf_keeps_order() {
        let mut node = Node::leaf(&LAYOUT);
        for i in [5, 1, 8, 3] {
            assert!(node.insert(entry(i), &LAYOUT));
        }
        assert_eq!(keys_of(&node), vec![1, 3, 5, 8]);
    }

    #[test]
    fn test_insert_existing_key_overwrites() {
        let mut node = leaf_with([1, 2, 3]);

        let created = node.insert(Entry::new(key(2), b"new".to_vec()), &LAYOUT);

        assert!(!created);
        assert_eq!(node.entries.len(), 3);
        assert_eq!(node.find(&key(2)), Some(b"new".as_slice()));
    }

    #[test]
    fn test_insert_splits_full_child() {
        let full: Vec<u32> = (0..9).map(|i| i * 2).collect();
        let mut node = two_level(&[100], vec![full, vec![101, 102, 103, 104]]);

        assert!(node.insert(entry(11), &LAYOUT));

        assert_eq!(keys_of(&node), vec![8, 100]);
        assert_eq!(node.children.len(), 3);
        assert_eq!(keys_of(&node.children[0]), vec![0, 2, 4, 6]);
        assert_eq!(keys_of(&node.children[1]), vec![10, 11, 12, 14, 16]);
        assert_eq!(keys_of(&node.children[2]), vec![101, 102, 103, 104]);
    }

    #[test]
    fn test_insert_matching_promoted_entry_overwrites() {
        let mut node = two_level(&[100], vec![(0..9).collect(), vec![101, 102, 103, 104]]);

        let created = node.insert(Entry::new(key(4), b"promoted".to_vec()), &LAYOUT);

        assert!(!created);
        assert_eq!(keys_of(&node), vec![4, 100]);
        assert_eq!(node.entries[0].value, b"promoted".to_vec());
    }

    #[test]
    fn test_delete_from_leaf() {
        let mut node = leaf_with(0..9);

        let removed = node.delete(&key(5), false, &LAYOUT);

        assert_eq!(removed, Some(entry(5)));
        assert_eq!(keys_of(&node), vec![0, 1, 2, 3, 4, 6, 7, 8]);
    }

    #[test]
    fn test_delete_missing_key() {
        let mut node = two_level(&[10], vec![vec![1, 2, 3, 4], vec![11, 12, 13, 14]]);

        assert_eq!(node.delete(&key(5), false, &LAYOUT), None);
        assert_eq!(keys_of(&node), vec![10]);
        assert_eq!(keys_of(&node.children[0]), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_delete_borrows_from_left() {
        let mut node = two_level(
            &[10, 20],
            vec![vec![1, 2, 3, 4], vec![11, 12, 13, 14, 15, 16], vec![21, 22, 23, 24]],
        );

        let removed = node.delete(&key(22), false, &LAYOUT);

        assert_eq!(removed, Some(entry(22)));
        // separator 20 moved down, 16 moved up
        assert_eq!(keys_of(&node), vec![10, 16]);
        assert_eq!(keys_of(&node.children[1]), vec![11, 12, 13, 14, 15]);
        assert_eq!(keys_of(&node.children[2]), vec![20, 21, 23, 24]);
    }

    #[test]
    fn test_delete_borrows_from_right() {
        let mut node = two_level(
            &[10],
            vec![vec![1, 2, 3, 4], vec![11, 12, 13, 14, 15, 16]],
        );

        node.delete(&key(2), false, &LAYOUT);

        assert_eq!(keys_of(&node), vec![11]);
        assert_eq!(keys_of(&node.children[0]), vec![1, 3, 4, 10]);
        assert_eq!(keys_of(&node.children[1]), vec![12, 13, 14, 15, 16]);
    }

    #[test]
    fn test_delete_merges_with_right() {
        let mut node = two_level(
            &[10, 20],
            vec![vec![1, 2, 3, 4], vec![11, 12, 13, 14], vec![21, 22, 23, 24]],
        );

        node.delete(&key(3), false, &LAYOUT);

        assert_eq!(keys_of(&node), vec![20]);
        assert_eq!(node.children.len(), 2);
        assert_eq!(keys_of(&node.children[0]), vec![1, 2, 4, 10, 11, 12, 13, 14]);
        assert_eq!(keys_of(&node.children[1]), vec![21, 22, 23, 24]);
    }

    #[test]
    fn test_delete_rightmost_merges_with_left() {
        let mut node = two_level(
            &[10, 20],
            vec![vec![1, 2, 3, 4], vec![11, 12, 13, 14], vec![21, 22, 23, 24]],
        );

        node.delete(&key(24), false, &LAYOUT);

        assert_eq!(keys_of(&node), vec![10]);
        assert_eq!(node.children.len(), 2);
        assert_eq!(keys_of(&node.children[0]), vec![1, 2, 3, 4]);
        assert_eq!(keys_of(&node.children[1]), vec![11, 12, 13, 14, 20, 21, 22, 23]);
    }

    #[test]
    fn test_delete_internal_uses_successor() {
        let mut node = two_level(
            &[10],
            vec![vec![1, 2, 3, 4], vec![11, 12, 13, 14, 15]],
        );

        let removed = node.delete(&key(10), false, &LAYOUT);

        assert_eq!(removed, Some(entry(10)));
        assert_eq!(node.entries[0], entry(11));
        assert_eq!(keys_of(&node.children[1]), vec![12, 13, 14, 15]);
    }

    #[test]
    fn test_seeking_successor_removes_smallest() {
        let mut node = leaf_with([5, 6, 7, 8, 9]);

        let removed = node.delete(&key(1), true, &LAYOUT);

        assert_eq!(removed, Some(entry(5)));
        assert_eq!(keys_of(&node), vec![6, 7, 8, 9]);
    }

    #[test]
    fn test_borrow_moves_grandchildren() {
        // Internal children with leaf grandchildren, degree 2 to keep it small
        let layout = NodeLayout::for_degree(2);
        let leaf = |keys: &[u32]| {
            let mut n = Node::leaf(&layout);
            n.entries.extend(keys.iter().copied().map(entry));
            n
        };

        let mut left = Node::internal(&layout);
        left.entries.extend([entry(10), entry(20)]);
        left.children.extend([leaf(&[1]), leaf(&[11]), leaf(&[21])]);

        let mut right = Node::internal(&layout);
        right.entries.push(entry(40));
        right.children.extend([leaf(&[31]), leaf(&[41])]);

        let mut parent = Node::internal(&layout);
        parent.entries.push(entry(30));
        parent.children.extend([left, right]);

        parent.delete(&key(41), false, &layout);

        assert_eq!(keys_of(&parent), vec![20]);
        let left = &parent.children[0];
        let right = &parent.children[1];
        assert_eq!(keys_of(left), vec![10]);
        assert_eq!(left.children.len(), 2);
        assert_eq!(keys_of(right), vec![30]);
        assert_eq!(right.children.len(), 2);
        assert_eq!(keys_of(&right.children[0]), vec![21]);
        assert_eq!(keys_of(&right.children[1]), vec![31, 40]);
    }

    #[test]
    fn test_merge_fills_node_without_growing_capacity() {
        let mut node = two_level(
            &[10],
            vec![vec![1, 2, 3, 4], vec![11, 12, 13, 14]],
        );
        let capacity = node.children[0].entries.capacity();

        node.delete(&key(4), false, &LAYOUT);

        assert!(node.entries.is_empty());
        assert_eq!(node.children.len(), 1);
        let merged = &node.children[0];
        assert_eq!(merged.entries.len(), LAYOUT.max_entries - 1);
        assert_eq!(keys_of(merged), vec![1, 2, 3, 10, 11, 12, 13, 14]);
        assert_eq!(merged.entries.capacity(), capacity);
    }

    #[test]
    fn test_borrow_from_right_moves_first_grandchild() {
        let layout = NodeLayout::for_degree(2);
        let leaf = |keys: &[u32]| {
            let mut n = Node::leaf(&layout);
            n.entries.extend(keys.iter().copied().map(entry));
            n
        };

        let mut left = Node::internal(&layout);
        left.entries.push(entry(10));
        left.children.extend([leaf(&[1]), leaf(&[11])]);

        let mut right = Node::internal(&layout);
        right.entries.extend([entry(30), entry(40)]);
        right.children.extend([leaf(&[21]), leaf(&[31]), leaf(&[41])]);

        let mut parent = Node::internal(&layout);
        parent.entries.push(entry(20));
        parent.children.extend([left, right]);

        // [1] empties and merges into [10, 11], leaving the left child empty
        parent.delete(&key(1), false, &layout);

        assert_eq!(keys_of(&parent), vec![30]);
        let left = &parent.children[0];
        let right = &parent.children[1];
        assert_eq!(keys_of(left), vec![20]);
        assert_eq!(left.children.len(), 2);
        assert_eq!(keys_of(&left.children[0]), vec![10, 11]);
        assert_eq!(keys_of(&left.children[1]), vec![21]);
        assert_eq!(keys_of(right), vec![40]);
        assert_eq!(right.children.len(), 2);
        assert_eq!(keys_of(&right.children[0]), vec![31]);
        assert_eq!(keys_of(&right.children[1]), vec![41]);
    }
}
