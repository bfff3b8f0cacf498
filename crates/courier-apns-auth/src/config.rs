//! APNs-specific configuration.
//!
//! Provides [`ApnsConfig`], loaded from `APNS_*` environment variables, and
//! the selection of an authenticator from those settings.

use courier_core::parse_bool;
use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::cert::CertAuthenticator;
use crate::error::ApnsError;
use crate::provider::ApnsAuthenticator;
use crate::request::ApnsEnvironment;
use crate::token::{TokenAuthenticator, TokenFormat};

/// APNs authentication configuration.
///
/// Passphrases are never serialized.
///
/// # Examples
///
/// ```
/// use courier_apns_auth::ApnsConfig;
///
/// let config = ApnsConfig::default();
/// assert!(!config.production);
/// assert!(config.authenticator().is_err());
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct ApnsConfig {
    /// Use the production gateway instead of the development one.
    #[builder(default = false)]
    pub production: bool,

    /// Key id (`kid`) of the provider token signing key.
    #[builder(default, setter(strip_option, into))]
    pub key_id: Option<String>,

    /// Team id (`iss`).
    #[builder(default, setter(strip_option, into))]
    pub team_id: Option<String>,

    /// Path of the `.p8` signing key.
    #[builder(default, setter(strip_option, into))]
    pub private_key_path: Option<String>,

    /// Passphrase of an encrypted signing key.
    #[serde(skip_serializing)]
    #[builder(default, setter(strip_option, into))]
    pub private_key_passphrase: Option<String>,

    /// Path of the TLS client certificate.
    #[builder(default, setter(strip_option, into))]
    pub cert_path: Option<String>,

    /// Passphrase of the client certificate.
    #[serde(skip_serializing)]
    #[builder(default, setter(strip_option, into))]
    pub cert_passphrase: Option<String>,

    /// Provider token layout.
    #[builder(default)]
    pub token_format: TokenFormat,
}

impl ApnsConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `APNS_PRODUCTION` | `false` |
    /// | `APNS_KEY_ID` | unset |
    /// | `APNS_TEAM_ID` | unset |
    /// | `APNS_PRIVATE_KEY_PATH` | unset |
    /// | `APNS_PRIVATE_KEY_PASSPHRASE` | unset |
    /// | `APNS_CERT_PATH` | unset |
    /// | `APNS_CERT_PASSPHRASE` | unset |
    /// | `APNS_TOKEN_FORMAT` | `split` |
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    #[must_use]
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.is_empty());
        let mut config = Self::default();

        if let Some(v) = non_empty("APNS_PRODUCTION") {
            config.production = parse_bool(&v);
        }
        config.key_id = non_empty("APNS_KEY_ID");
        config.team_id = non_empty("APNS_TEAM_ID");
        config.private_key_path = non_empty("APNS_PRIVATE_KEY_PATH");
        config.private_key_passphrase = non_empty("APNS_PRIVATE_KEY_PASSPHRASE");
        config.cert_path = non_empty("APNS_CERT_PATH");
        config.cert_passphrase = non_empty("APNS_CERT_PASSPHRASE");
        if let Some(format) = non_empty("APNS_TOKEN_FORMAT").and_then(|v| v.parse().ok()) {
            config.token_format = format;
        }

        config
    }

    /// The gateway selected by [`ApnsConfig::production`].
    #[must_use]
    pub fn environment(&self) -> ApnsEnvironment {
        ApnsEnvironment::from_production(self.production)
    }

    /// Build the authenticator these settings describe.
    ///
    /// Token auth is chosen when key id, team id, and key path are all set;
    /// otherwise certificate auth when a certificate path is set.
    ///
    /// # Errors
    ///
    /// Returns [`ApnsError::UnsupportedAuthSettings`] when neither set of
    /// settings is complete, and any construction error of the chosen
    /// authenticator.
    pub fn authenticator(&self) -> Result<ApnsAuthenticator, ApnsError> {
        if let (Some(key_id), Some(team_id), Some(key_path)) =
            (&self.key_id, &self.team_id, &self.private_key_path)
        {
            let auth = TokenAuthenticator::from_file(
                key_id.as_str(),
                team_id.as_str(),
                key_path,
                self.private_key_passphrase.as_deref(),
            )?
            .with_format(self.token_format);
            return Ok(auth.into());
        }

        if let Some(cert_path) = &self.cert_path {
            let auth = CertAuthenticator::new(cert_path, self.cert_passphrase.as_deref())?;
            return Ok(auth.into());
        }

        let missing: Vec<&str> = [
            ("APNS_KEY_ID", self.key_id.is_none()),
            ("APNS_TEAM_ID", self.team_id.is_none()),
            ("APNS_PRIVATE_KEY_PATH", self.private_key_path.is_none()),
        ]
        .into_iter()
        .filter_map(|(name, is_missing)| is_missing.then_some(name))
        .collect();

        Err(ApnsError::UnsupportedAuthSettings(format!(
            "token auth needs {} (missing {}); certificate auth needs APNS_CERT_PATH",
            "APNS_KEY_ID, APNS_TEAM_ID and APNS_PRIVATE_KEY_PATH",
            missing.join(", ")
        )))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    const KEY_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/AuthKey_TEST.p8");
    const CERT_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/apns_cert.pem");

    fn from_map(vars: &[(&str, &str)]) -> ApnsConfig {
        let vars: HashMap<&str, &str> = vars.iter().copied().collect();
        ApnsConfig::from_vars(|k| vars.get(k).map(|v| (*v).to_owned()))
    }

    #[test]
    fn test_should_create_default_config() {
        let config = ApnsConfig::default();
        assert!(!config.production);
        assert_eq!(config.token_format, TokenFormat::Split);
        assert_eq!(config.environment(), ApnsEnvironment::Development);
    }

    #[test]
    fn test_should_load_from_env() {
        let config = ApnsConfig::from_env();
        assert!(config.key_id.as_deref() != Some(""));
    }

    #[test]
    fn test_should_load_from_vars() {
        let config = from_map(&[
            ("APNS_PRODUCTION", "true"),
            ("APNS_KEY_ID", "ABC123DEFG"),
            ("APNS_TEAM_ID", "DEF123GHIJ"),
            ("APNS_PRIVATE_KEY_PATH", KEY_PATH),
            ("APNS_TOKEN_FORMAT", "compact"),
        ]);
        assert!(config.production);
        assert_eq!(config.environment(), ApnsEnvironment::Production);
        assert_eq!(config.token_format, TokenFormat::Compact);
        assert_eq!(config.key_id.as_deref(), Some("ABC123DEFG"));
    }

    #[test]
    fn test_should_select_token_auth() {
        let config = from_map(&[
            ("APNS_KEY_ID", "ABC123DEFG"),
            ("APNS_TEAM_ID", "DEF123GHIJ"),
            ("APNS_PRIVATE_KEY_PATH", KEY_PATH),
            ("APNS_CERT_PATH", CERT_PATH),
        ]);
        assert!(matches!(
            config.authenticator(),
            Ok(ApnsAuthenticator::Token(auth)) if auth.key_id() == "ABC123DEFG"
        ));
    }

    #[test]
    fn test_should_fall_back_to_cert_auth() {
        let config = from_map(&[("APNS_KEY_ID", "ABC123DEFG"), ("APNS_CERT_PATH", CERT_PATH)]);
        assert!(matches!(
            config.authenticator(),
            Ok(ApnsAuthenticator::Cert(_))
        ));
    }

    #[test]
    fn test_should_explain_unsupported_settings() {
        let config = from_map(&[("APNS_KEY_ID", "ABC123DEFG")]);
        let Err(ApnsError::UnsupportedAuthSettings(message)) = config.authenticator() else {
            panic!("expected UnsupportedAuthSettings");
        };
        assert!(message.contains("missing APNS_TEAM_ID, APNS_PRIVATE_KEY_PATH"));
        assert!(message.contains("APNS_CERT_PATH"));
    }

    #[test]
    fn test_should_surface_missing_certificate() {
        let config = from_map(&[("APNS_CERT_PATH", "/nonexistent/cert.pem")]);
        assert!(matches!(
            config.authenticator(),
            Err(ApnsError::CertificateNotFound(_))
        ));
    }

    #[test]
    fn test_should_serialize_without_passphrases() {
        let config = ApnsConfig::builder()
            .key_id("ABC123DEFG")
            .private_key_passphrase("p8-secret")
            .cert_passphrase("cert-secret")
            .build();
        let json = serde_json::to_string(&config).expect("test serialization");
        assert!(json.contains("keyId"));
        assert!(json.contains("tokenFormat"));
        assert!(!json.contains("p8-secret"));
        assert!(!json.contains("cert-secret"));
    }
}
