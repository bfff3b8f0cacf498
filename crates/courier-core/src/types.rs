//! Common AWS type definitions.

use std::fmt;

use crate::error::{CourierError, CourierResult};

/// AWS Region identifier (e.g. `eu-west-1`).
///
/// Regions end up in the endpoint host name and in the SigV4 credential
/// scope, so construction rejects anything that is not a plain
/// `[a-z0-9-]+` identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AwsRegion(String);

impl AwsRegion {
    /// Default region used by the SES transports.
    pub const DEFAULT: &str = "eu-west-1";

    /// Create a new region.
    ///
    /// # Errors
    /// Returns [`CourierError::InvalidRegion`] if the region is empty or holds
    /// characters other than ASCII lowercase letters, digits and `-`.
    ///
    /// # Examples
    ///
    /// ```
    /// use courier_core::AwsRegion;
    ///
    /// assert_eq!(AwsRegion::new("us-east-1").unwrap().as_str(), "us-east-1");
    /// assert!(AwsRegion::new("").is_err());
    /// assert!(AwsRegion::new("us east/1").is_err());
    /// ```
    pub fn new(region: impl Into<String>) -> CourierResult<Self> {
        let region = region.into();
        let valid = !region.is_empty()
            && region
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
        if !valid {
            return Err(CourierError::InvalidRegion(region));
        }
        Ok(Self(region))
    }

    /// Get the region as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for AwsRegion {
    fn default() -> Self {
        Self(Self::DEFAULT.to_owned())
    }
}

impl fmt::Display for AwsRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for AwsRegion {
    type Error = CourierError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<AwsRegion> for String {
    fn from(region: AwsRegion) -> Self {
        region.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_create_region() {
        let region = AwsRegion::new("eu-west-1").unwrap();
        assert_eq!(region.as_str(), "eu-west-1");
        assert_eq!(region.to_string(), "eu-west-1");
    }

    #[test]
    fn test_should_use_default_region() {
        let region = AwsRegion::default();
        assert_eq!(region.as_str(), "eu-west-1");
    }

    #[test]
    fn test_should_reject_empty_region() {
        assert!(matches!(
            AwsRegion::new(""),
            Err(CourierError::InvalidRegion(_))
        ));
    }

    #[test]
    fn test_should_reject_region_with_separators() {
        assert!(AwsRegion::new("us-east-1/evil").is_err());
        assert!(AwsRegion::new("US-EAST-1").is_err());
        assert!(AwsRegion::new("us east 1").is_err());
    }

    #[test]
    fn test_should_validate_region_on_deserialize() {
        let ok: AwsRegion = serde_json::from_str("\"ap-south-1\"").unwrap();
        assert_eq!(ok.as_str(), "ap-south-1");
        assert!(serde_json::from_str::<AwsRegion>("\"\"").is_err());
    }
}
