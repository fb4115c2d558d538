#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]
// In-memory ordered index over byte-sequence keys.
//
// Components:
//  - btree: the B-tree itself (find / insert / delete with rebalancing)
//  - config: tree degree and workload settings, loadable from the environment
//  - simulation: seeded workloads checked against a reference model

pub mod btree;
pub mod config;
pub mod simulation;

pub use btree::{BTree, BTreeError};
pub use config::{ConfigError, TreeConfig, WorkloadConfig};
