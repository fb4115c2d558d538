//! Main simulator harness for deterministic simulation testing.
//!
//! Applies a generated workload to a `BTree` and to a `BTreeMap` reference
//! model side by side, comparing every result and checking invariants after
//! every operation.

use std::collections::BTreeMap;

use super::invariants::{InvariantChecker, InvariantViolation, TreeShape};
use super::workload::{Operation, WorkloadGenerator};
use crate::btree::{BTree, BTreeError};
use crate::config::{TreeConfig, WorkloadConfig};

/// Configuration for the simulator.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatorConfig {
    /// Tree configuration.
    pub tree: TreeConfig,
    /// Workload configuration (including the seed).
    pub workload: WorkloadConfig,
    /// Run the structural check every this many operations (1 = always).
    pub check_interval: usize,
}

impl SimulatorConfig {
    /// Create a new simulator config with the given seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            tree: TreeConfig::default(),
            workload: WorkloadConfig::new(seed),
            check_interval: 1,
        }
    }

    /// Set the tree degree.
    #[must_use]
    pub const fn with_degree(mut self, degree: usize) -> Self {
        self.tree.degree = degree;
        self
    }

    /// Set the workload configuration.
    #[must_use]
    pub fn with_workload(mut self, workload: WorkloadConfig) -> Self {
        self.workload = workload;
        self
    }

    /// Set how often the structural check runs.
    #[must_use]
    pub const fn with_check_interval(mut self, interval: usize) -> Self {
        self.check_interval = interval;
        self
    }
}

/// Results from a simulation run.
#[derive(Debug, Clone)]
pub struct SimulationResult {
    /// The seed used for this simulation.
    pub seed: u64,
    /// Operation counters.
    pub stats: SimulatorStats,
    /// Shape of the tree after the last operation.
    pub final_shape: TreeShape,
    /// Invariant violations detected.
    pub invariant_violations: Vec<InvariantViolation>,
}

impl SimulationResult {
    /// Check if the simulation passed (no invariant violations).
    #[must_use]
    #[allow(clippy::missing_const_for_fn)] // Vec::is_empty() is not const-stable
    pub fn passed(&self) -> bool {
        self.invariant_violations.is_empty()
    }
}

/// Statistics about the simulation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimulatorStats {
    /// Number of operations processed.
    pub operations: usize,
    /// Inserts that created a new entry.
    pub inserts: u64,
    /// Inserts that overwrote an existing value.
    pub updates: u64,
    /// Finds that returned a value.
    pub finds_hit: u64,
    /// Finds that returned `NotFound`.
    pub finds_missed: u64,
    /// Deletes that removed an entry.
    pub deletes_hit: u64,
    /// Deletes of absent keys.
    pub deletes_missed: u64,
}

/// The main simulator harness.
pub struct Simulator {
    config: SimulatorConfig,
    tree: BTree,
    model: BTreeMap<Vec<u8>, Vec<u8>>,
    generator: WorkloadGenerator,
    checker: InvariantChecker,
    stats: SimulatorStats,
}

impl Simulator {
    /// Create a new simulator with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the tree configuration is invalid.
    pub fn new(config: SimulatorConfig) -> Result<Self, BTreeError> {
        let tree = BTree::with_config(&config.tree)?;
        let generator = WorkloadGenerator::with_config(config.workload.clone());

        Ok(Self {
            config,
            tree,
            model: BTreeMap::new(),
            generator,
            checker: InvariantChecker::new(),
            stats: SimulatorStats::default(),
        })
    }

    /// Run the simulation for the given number of operations.
    pub fn run(&mut self, operation_count: usize) -> SimulationResult {
        let interval = self.config.check_interval.max(1);

        for _ in 0..operation_count {
            let operation = self.generator.next_operation();
            let index = self.stats.operations;
            self.apply(operation, index);

            if (index + 1) % interval == 0 {
                self.checker.check_tree(&self.tree, index);
            }
        }

        let last_index = self.stats.operations;
        let seed = self.generator.config().seed;
        let final_shape = self.checker.check_tree(&self.tree, last_index);
        self.checker
            .check_matches_model(&self.tree, &self.model, last_index);

        tracing::debug!(
            seed,
            operations = self.stats.operations,
            entries = final_shape.entries,
            height = final_shape.height,
            violations = self.checker.violations().len(),
            "simulation finished"
        );

        SimulationResult {
            seed,
            stats: self.stats,
            final_shape,
            invariant_violations: self.checker.violations().to_vec(),
        }
    }

    /// Apply one operation to the tree and the model and compare outcomes.
    fn apply(&mut self, operation: Operation, index: usize) {
        self.stats.operations += 1;
        tracing::trace!(index, key = ?operation.key(), "applying operation");

        match operation {
            Operation::Insert { key, value } => {
                let len_before = self.tree.len();
                let existed = self.model.insert(key.clone(), value.clone()).is_some();
                self.tree.insert(key, value);

                if existed {
                    self.stats.updates += 1;
                } else {
                    self.stats.inserts += 1;
                }

                let expected_len = len_before + usize::from(!existed);
                if self.tree.len() != expected_len {
                    self.checker.add_violation(InvariantViolation {
                        description: "Insert changed len() unexpectedly".to_string(),
                        operation_index: index,
                        context: format!("expected {expected_len}, got {}", self.tree.len()),
                    });
                }
            }
            Operation::Find { key } => {
                let expected = self.model.get(&key).map(Vec::as_slice);
                let actual = self.tree.find(&key).ok();

                match (actual, expected) {
                    (Some(_), Some(_)) => self.stats.finds_hit += 1,
                    (None, None) => self.stats.finds_missed += 1,
                    _ => {}
                }

                if actual != expected {
                    self.checker.add_violation(InvariantViolation {
                        description: "Find disagrees with model".to_string(),
                        operation_index: index,
                        context: format!("key {key:?}: tree {actual:?}, model {expected:?}"),
                    });
                }
            }
            Operation::Delete { key } => {
                let expected = self.model.remove(&key).is_some();
                let removed = self.tree.delete(&key);

                if removed {
                    self.stats.deletes_hit += 1;
                } else {
                    self.stats.deletes_missed += 1;
                }

                if removed != expected {
                    self.checker.add_violation(InvariantViolation {
                        description: "Delete disagrees with model".to_string(),
                        operation_index: index,
                        context: format!("key {key:?}: tree {removed}, model {expected}"),
                    });
                }

                if self.tree.contains_key(&key) {
                    self.checker.add_violation(InvariantViolation {
                        description: "Deleted key still present".to_string(),
                        operation_index: index,
                        context: format!("key {key:?}"),
                    });
                }
            }
        }
    }

    /// The tree under test.
    #[must_use]
    pub const fn tree(&self) -> &BTree {
        &self.tree
    }

    /// Get the invariant checker.
    #[must_use]
    pub const fn checker(&self) -> &InvariantChecker {
        &self.checker
    }

    /// Get statistics about the simulation.
    #[must_use]
    pub const fn stats(&self) -> SimulatorStats {
        self.stats
    }
}
