use std::num::ParseIntError;

/// B-tree configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeConfig {
    /// Fanout parameter: nodes hold at most `2 * degree - 1` entries.
    pub degree: usize,
}

/// Workload driver configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkloadConfig {
    /// Random seed for reproducibility.
    pub seed: u64,
    /// Number of operations to run.
    pub operations: usize,
    /// Number of distinct keys the workload draws from.
    pub key_space: u32,
    /// Probability of a delete (0.0 - 1.0).
    pub delete_rate: f64,
    /// Probability of a find (0.0 - 1.0).
    pub find_rate: f64,
    /// Maximum value length in bytes.
    pub max_value_len: usize,
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Degree below `TreeConfig::MIN_DEGREE`.
    InvalidDegree(usize),
    /// An environment variable has an invalid value.
    InvalidValue { name: String, message: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidDegree(degree) => {
                write!(
                    f,
                    "invalid degree: {degree} (min {})",
                    TreeConfig::MIN_DEGREE
                )
            }
            Self::InvalidValue { name, message } => {
                write!(f, "invalid value for {name}: {message}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl Default for TreeConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_DEGREE)
    }
}

impl TreeConfig {
    /// Default degree.
    pub const DEFAULT_DEGREE: usize = 5;
    /// Smallest degree that keeps `min_entries` at 1 or more.
    pub const MIN_DEGREE: usize = 2;

    #[must_use]
    pub const fn new(degree: usize) -> Self {
        Self { degree }
    }

    /// Check the degree against `MIN_DEGREE`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidDegree` if the degree is too small.
    pub const fn validate(&self) -> Result<(), ConfigError> {
        if self.degree < Self::MIN_DEGREE {
            return Err(ConfigError::InvalidDegree(self.degree));
        }
        Ok(())
    }

    /// Load configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `BTREE_DEGREE`: Tree degree (default: `5`, minimum: `2`)
    ///
    /// # Errors
    ///
    /// Returns an error if `BTREE_DEGREE` is set but not a number, or is
    /// below the minimum degree.
    pub fn from_env() -> Result<Self, ConfigError> {
        let degree = load_var("BTREE_DEGREE", Self::DEFAULT_DEGREE)?;
        let config = Self::new(degree);
        config.validate()?;
        Ok(config)
    }
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self {
            seed: Self::DEFAULT_SEED,
            operations: Self::DEFAULT_OPERATIONS,
            key_space: Self::DEFAULT_KEY_SPACE,
            delete_rate: 0.3,
            find_rate: 0.3,
            max_value_len: 32,
        }
    }
}

impl WorkloadConfig {
    /// Default random seed.
    pub const DEFAULT_SEED: u64 = 12345;
    /// Default number of operations.
    pub const DEFAULT_OPERATIONS: usize = 10_000;
    /// Default key space size.
    pub const DEFAULT_KEY_SPACE: u32 = 1_000;

    /// Create a workload config with the given seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    /// Set the number of operations.
    #[must_use]
    pub const fn with_operations(mut self, operations: usize) -> Self {
        self.operations = operations;
        self
    }

    /// Set the key space size.
    #[must_use]
    pub const fn with_key_space(mut self, key_space: u32) -> Self {
        self.key_space = key_space;
        self
    }

    /// Set the delete and find rates. The remainder are inserts.
    #[must_use]
    pub const fn with_rates(mut self, delete_rate: f64, find_rate: f64) -> Self {
        self.delete_rate = delete_rate;
        self.find_rate = find_rate;
        self
    }

    /// Load configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `BTREE_SEED`: Random seed (default: `12345`)
    /// - `BTREE_OPERATIONS`: Number of operations (default: `10000`)
    /// - `BTREE_KEY_SPACE`: Number of distinct keys, at least 1 (default: `1000`)
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set but not a number, or if the key
    /// space is zero.
    pub fn from_env() -> Result<Self, ConfigError> {
        let seed = load_var("BTREE_SEED", Self::DEFAULT_SEED)?;
        let operations = load_var("BTREE_OPERATIONS", Self::DEFAULT_OPERATIONS)?;
        let key_space = load_var("BTREE_KEY_SPACE", Self::DEFAULT_KEY_SPACE)?;

        if key_space == 0 {
            return Err(ConfigError::InvalidValue {
                name: "BTREE_KEY_SPACE".to_string(),
                message: "must be at least 1".to_string(),
            });
        }

        Ok(Self {
            seed,
            operations,
            key_space,
            ..Self::default()
        })
    }
}

/// Load a numeric environment variable.
///
/// Returns the default if not set.
fn load_var<T>(name: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr<Err = ParseIntError>,
{
    match std::env::var(name) {
        Ok(value) => parse_var(name, &value),
        Err(_) => Ok(default),
    }
}

fn parse_var<T>(name: &str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr<Err = ParseIntError>,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidValue {
            name: name.to_string(),
            message: format!("'{value}' is not a valid number: {e}"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        assert_eq!(TreeConfig::default().degree, 5);
        assert_eq!(TreeConfig::MIN_DEGREE, 2);

        let workload = WorkloadConfig::default();
        assert_eq!(workload.seed, 12345);
        assert_eq!(workload.operations, 10_000);
        assert_eq!(workload.key_space, 1_000);
    }

    #[test]
    fn test_validate_degree() {
        assert!(TreeConfig::new(2).validate().is_ok());
        assert!(TreeConfig::new(64).validate().is_ok());
        assert_eq!(
            TreeConfig::new(1).validate(),
            Err(ConfigError::InvalidDegree(1))
        );
        assert_eq!(
            TreeConfig::new(0).validate(),
            Err(ConfigError::InvalidDegree(0))
        );
    }

    #[test]
    fn test_parse_var() {
        assert_eq!(parse_var::<usize>("BTREE_DEGREE", " 7 "), Ok(7));

        let error = parse_var::<usize>("BTREE_DEGREE", "seven");
        assert!(matches!(
            error,
            Err(ConfigError::InvalidValue { ref name, .. }) if name == "BTREE_DEGREE"
        ));

        assert!(parse_var::<u32>("BTREE_KEY_SPACE", "-1").is_err());
    }

    #[test]
    fn test_workload_builders() {
        let config = WorkloadConfig::new(7)
            .with_operations(50)
            .with_key_space(10)
            .with_rates(0.5, 0.0);

        assert_eq!(config.seed, 7);
        assert_eq!(config.operations, 50);
        assert_eq!(config.key_space, 10);
        assert!((config.delete_rate - 0.5).abs() < f64::EPSILON);
        assert!(config.find_rate.abs() < f64::EPSILON);
    }

    #[test]
    fn test_config_error_display_invalid_degree() {
        let error = ConfigError::InvalidDegree(1);
        assert_eq!(error.to_string(), "invalid degree: 1 (min 2)");
    }

    #[test]
    fn test_config_error_display_invalid() {
        let error = ConfigError::InvalidValue {
            name: "TEST_VAR".to_string(),
            message: "bad value".to_string(),
        };
        assert_eq!(error.to_string(), "invalid value for TEST_VAR: bad value");
    }
}
