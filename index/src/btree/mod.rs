//! In-memory B-tree index.
//!
//! # Structure
//!
//! The B-tree consists of nodes of fixed capacity derived from the degree `d`:
//! - Every node holds at most `2d - 1` entries sorted by key
//! - Internal nodes hold one more child than entries
//! - Non-root nodes hold at least `d - 1` entries
//! - All leaves sit at the same depth
//!
//! # Usage
//!
//! ```
//! use index::btree::{BTree, BTreeError};
//!
//! let mut tree = BTree::new();
//! tree.insert(b"apple".to_vec(), b"red".to_vec());
//! tree.insert(b"banana".to_vec(), b"yellow".to_vec());
//!
//! assert_eq!(tree.find(b"apple"), Ok(b"red".as_slice()));
//! assert!(tree.delete(b"apple"));
//! assert_eq!(tree.find(b"apple"), Err(BTreeError::NotFound));
//! ```

mod node;
mod tree;

pub use node::{Entry, Node, NodeLayout};
pub use tree::{BTree, BTreeError};
