//! Deterministic Simulation Testing (DST) infrastructure.
//!
//! This module provides tools for testing the B-tree with:
//! - Reproducible random workloads over a bounded key space
//! - A `BTreeMap` reference model run side by side with the tree
//! - Structural invariant checking after each operation
//!
//! Given the same seed and configuration, execution is identical.
//!
//! # Usage
//!
//! ```
//! use index::simulation::{Simulator, SimulatorConfig};
//!
//! let config = SimulatorConfig::new(12345).with_degree(3);
//! let mut sim = Simulator::new(config).expect("valid degree");
//! let result = sim.run(1000);
//!
//! assert!(result.invariant_violations.is_empty());
//! ```

mod invariants;
mod simulator;
mod workload;

pub use invariants::{InvariantChecker, InvariantViolation, TreeShape};
pub use simulator::{SimulationResult, Simulator, SimulatorConfig, SimulatorStats};
pub use workload::{Operation, WorkloadGenerator, key_for_slot};
