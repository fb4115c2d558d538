//! Workload generator for deterministic simulation testing.
//!
//! This module generates random but reproducible operation sequences over a
//! bounded key space, so inserts regularly hit present keys (upserts) and
//! deletes regularly hit both present and absent keys.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::WorkloadConfig;

/// A single operation against the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Insert or update a key.
    Insert { key: Vec<u8>, value: Vec<u8> },
    /// Look up a key.
    Find { key: Vec<u8> },
    /// Delete a key.
    Delete { key: Vec<u8> },
}

impl Operation {
    /// The key this operation targets.
    #[must_use]
    pub fn key(&self) -> &[u8] {
        match self {
            Self::Insert { key, .. } | Self::Find { key } | Self::Delete { key } => key,
        }
    }
}

/// Generator for random `Operation` instances.
///
/// Produces the same sequence for the same seed and configuration.
pub struct WorkloadGenerator {
    rng: StdRng,
    config: WorkloadConfig,
}

impl WorkloadGenerator {
    /// Create a new generator with the given seed and default configuration.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self::with_config(WorkloadConfig::new(seed))
    }

    /// Create a new generator with custom configuration.
    #[must_use]
    pub fn with_config(config: WorkloadConfig) -> Self {
        Self {
            rng: StdRng::seed_from_u64(config.seed),
            config,
        }
    }

    /// Get the configuration.
    #[must_use]
    pub const fn config(&self) -> &WorkloadConfig {
        &self.config
    }

    /// Generate the next operation.
    pub fn next_operation(&mut self) -> Operation {
        let key = self.random_key();
        let roll: f64 = self.rng.random();

        if roll < self.config.delete_rate {
            Operation::Delete { key }
        } else if roll < self.config.delete_rate + self.config.find_rate {
            Operation::Find { key }
        } else {
            let value = self.random_value();
            Operation::Insert { key, value }
        }
    }

    /// Pick a key from the key space.
    ///
    /// Slot 0 maps to the empty key; the rest are decimal strings, so byte
    /// order differs from numeric order ("k10" < "k9").
    fn random_key(&mut self) -> Vec<u8> {
        let slot = self.rng.random_range(0..self.config.key_space.max(1));
        key_for_slot(slot)
    }

    fn random_value(&mut self) -> Vec<u8> {
        let len = self.rng.random_range(0..=self.config.max_value_len);
        let mut value = vec![0u8; len];
        self.rng.fill(value.as_mut_slice());
        value
    }
}

impl Iterator for WorkloadGenerator {
    type Item = Operation;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.next_operation())
    }
}

/// Map a key-space slot to its key bytes.
#[must_use]
pub fn key_for_slot(slot: u32) -> Vec<u8> {
    if slot == 0 {
        Vec::new()
    } else {
        format!("k{slot}").into_bytes()
    }
}
