//! Global configuration for Courier.
//!
//! All configuration is driven by environment variables. Channel-specific
//! settings live next to their signers (`SesConfig`, `ApnsConfig`); this
//! module holds the settings every binary shares.

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

/// Global configuration for Courier binaries.
///
/// # Examples
///
/// ```
/// use courier_core::CourierConfig;
///
/// let config = CourierConfig::default();
/// assert_eq!(config.log_level, "info");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct CourierConfig {
    /// Log level filter string (e.g. `"info"`, `"debug"`).
    #[builder(default = String::from("info"))]
    pub log_level: String,
}

impl Default for CourierConfig {
    fn default() -> Self {
        Self {
            log_level: String::from("info"),
        }
    }
}

impl CourierConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `LOG_LEVEL` | `info` |
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// [`CourierConfig::from_env`] is this function backed by the process
    /// environment.
    #[must_use]
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(v) = lookup("LOG_LEVEL") {
            config.log_level = v;
        }

        config
    }
}

/// Parse a string as a boolean, accepting `"1"` and `"true"` (case-insensitive).
///
/// # Examples
///
/// ```
/// use courier_core::parse_bool;
///
/// assert!(parse_bool("TRUE"));
/// assert!(parse_bool("1"));
/// assert!(!parse_bool("yes"));
/// ```
#[must_use]
pub fn parse_bool(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn test_should_create_default_config() {
        let config = CourierConfig::default();
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_should_load_from_vars() {
        let vars = HashMap::from([("LOG_LEVEL", "debug")]);
        let config = CourierConfig::from_vars(|k| vars.get(k).map(|v| (*v).to_owned()));
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_should_load_from_env() {
        let config = CourierConfig::from_env();
        assert!(!config.log_level.is_empty());
    }

    #[test]
    fn test_should_build_with_typed_builder() {
        let config = CourierConfig::builder().log_level("trace".into()).build();
        assert_eq!(config.log_level, "trace");
    }

    #[test]
    fn test_should_serialize_to_camel_case_json() {
        let json = serde_json::to_string(&CourierConfig::default()).expect("test serialization");
        assert!(json.contains("logLevel"));
    }
}
