//! Driver configuration module.
//!
//! This module loads the settings of the `steptree` driver binary from
//! environment variables.
//!
//! # Environment Variables
//!
//! - `STEPTREE_ORDER`: Maximum keys per node (default: `3`, at least `3`)
//! - `STEPTREE_VARIANT`: `b` or `bplus` (default: `bplus`)
//! - `STEPTREE_VALUE_DOMAIN`: `number` or `text` (default: `number`)
//! - `STEPTREE_STEP_DELAY_MS`: Pause between steps in milliseconds (default: `0`)

use std::time::Duration;

use crate::tree::Tree;
use crate::types::{ValueDomain, Variant};

/// Driver configuration.
///
/// # Post-conditions
///
/// When constructed via `from_env()`, `order` is at least [`Tree::MIN_ORDER`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverConfig {
    /// Maximum keys per node of the tree the driver starts with.
    pub order: usize,
    pub variant: Variant,
    pub domain: ValueDomain,
    /// Pause between steps. Zero steps as fast as possible.
    pub step_delay: Duration,
}

/// Error returned when loading configuration fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable has an invalid value.
    InvalidValue { name: String, message: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { name, message } => {
                write!(f, "invalid value for {name}: {message}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            order: Self::DEFAULT_ORDER,
            variant: Self::DEFAULT_VARIANT,
            domain: Self::DEFAULT_DOMAIN,
            step_delay: Duration::from_millis(Self::DEFAULT_STEP_DELAY_MS),
        }
    }
}

impl DriverConfig {
    pub const DEFAULT_ORDER: usize = 3;
    pub const DEFAULT_VARIANT: Variant = Variant::BPlus;
    pub const DEFAULT_DOMAIN: ValueDomain = ValueDomain::Numeric;
    pub const DEFAULT_STEP_DELAY_MS: u64 = 0;

    /// Load configuration from environment variables.
    ///
    /// Unset variables fall back to their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set but does not parse, or if
    /// `STEPTREE_ORDER` is below 3.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let order = Self::load_order(lookup("STEPTREE_ORDER"))?;
        let variant = Self::load_parsed("STEPTREE_VARIANT", lookup("STEPTREE_VARIANT"))?
            .unwrap_or(Self::DEFAULT_VARIANT);
        let domain = Self::load_parsed("STEPTREE_VALUE_DOMAIN", lookup("STEPTREE_VALUE_DOMAIN"))?
            .unwrap_or(Self::DEFAULT_DOMAIN);
        let step_delay = Self::load_step_delay(lookup("STEPTREE_STEP_DELAY_MS"))?;

        Ok(Self {
            order,
            variant,
            domain,
            step_delay,
        })
    }

    /// Load the tree order.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not a whole number of at least 3.
    fn load_order(raw: Option<String>) -> Result<usize, ConfigError> {
        let Some(value) = raw else {
            return Ok(Self::DEFAULT_ORDER);
        };
        let invalid = || ConfigError::InvalidValue {
            name: "STEPTREE_ORDER".to_string(),
            message: format!(
                "'{value}' is not a valid order (must be a whole number >= {})",
                Tree::MIN_ORDER
            ),
        };
        let order = value.parse::<usize>().map_err(|_| invalid())?;
        if order < Tree::MIN_ORDER {
            return Err(invalid());
        }
        Ok(order)
    }

    fn load_parsed<T>(name: &str, raw: Option<String>) -> Result<Option<T>, ConfigError>
    where
        T: std::str::FromStr<Err = String>,
    {
        raw.map(|value| {
            value.parse::<T>().map_err(|message| ConfigError::InvalidValue {
                name: name.to_string(),
                message,
            })
        })
        .transpose()
    }

    fn load_step_delay(raw: Option<String>) -> Result<Duration, ConfigError> {
        match raw {
            Some(value) => value
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|_| ConfigError::InvalidValue {
                    name: "STEPTREE_STEP_DELAY_MS".to_string(),
                    message: format!("'{value}' is not a valid number of milliseconds"),
                }),
            None => Ok(Duration::from_millis(Self::DEFAULT_STEP_DELAY_MS)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<DriverConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        DriverConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_default_values() {
        assert_eq!(DriverConfig::DEFAULT_ORDER, 3);
        assert_eq!(load(&[]), Ok(DriverConfig::default()));
        assert_eq!(DriverConfig::default().variant, Variant::BPlus);
        assert_eq!(DriverConfig::default().step_delay, Duration::ZERO);
    }

    #[test]
    fn test_all_values_set() {
        let config = load(&[
            ("STEPTREE_ORDER", "5"),
            ("STEPTREE_VARIANT", "b"),
            ("STEPTREE_VALUE_DOMAIN", "text"),
            ("STEPTREE_STEP_DELAY_MS", "250"),
        ])
        .expect("valid configuration");

        assert_eq!(config.order, 5);
        assert_eq!(config.variant, Variant::B);
        assert_eq!(config.domain, ValueDomain::Lexical);
        assert_eq!(config.step_delay, Duration::from_millis(250));
    }

    #[test]
    fn test_order_below_minimum() {
        let err = load(&[("STEPTREE_ORDER", "2")]).expect_err("order too small");
        assert!(matches!(err, ConfigError::InvalidValue { ref name, .. } if name == "STEPTREE_ORDER"));

        assert!(load(&[("STEPTREE_ORDER", "three")]).is_err());
    }

    #[test]
    fn test_unknown_variant() {
        let err = load(&[("STEPTREE_VARIANT", "avl")]).expect_err("unknown variant");
        assert_eq!(
            err.to_string(),
            "invalid value for STEPTREE_VARIANT: unknown tree variant 'avl' (expected b or bplus)"
        );
    }

    #[test]
    fn test_bad_step_delay() {
        assert!(load(&[("STEPTREE_STEP_DELAY_MS", "-1")]).is_err());
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
