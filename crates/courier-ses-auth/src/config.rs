//! SES-specific configuration.
//!
//! Provides [`SesConfig`], loaded from `SES_*` environment variables, and the
//! resolution of those variables into a [`Credential`].

use courier_core::AwsRegion;
use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::credentials::{ApiKeyCredential, BasicCredential, Credential};
use crate::error::SigningError;
use crate::request::{SesRequest, SesRequestMode};

/// SES signing configuration.
///
/// Secrets are never serialized.
///
/// # Examples
///
/// ```
/// use courier_ses_auth::config::SesConfig;
///
/// let config = SesConfig::default();
/// assert_eq!(config.region, "eu-west-1");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct SesConfig {
    /// Region requests are signed for.
    #[builder(default = String::from(AwsRegion::DEFAULT))]
    pub region: String,

    /// API or plain HTTP request mode.
    #[builder(default)]
    pub request_mode: SesRequestMode,

    /// Explicit credential kind (`api` or `basic`). Inferred when unset.
    #[builder(default, setter(strip_option, into))]
    pub credential_kind: Option<String>,

    /// Access key ID.
    #[builder(default, setter(strip_option, into))]
    pub access_key: Option<String>,

    /// Secret access key.
    #[serde(skip_serializing)]
    #[builder(default, setter(strip_option, into))]
    pub secret_key: Option<String>,

    /// STS session token.
    #[serde(skip_serializing)]
    #[builder(default, setter(strip_option, into))]
    pub session_token: Option<String>,

    /// SMTP username.
    #[builder(default, setter(strip_option, into))]
    pub username: Option<String>,

    /// SMTP password.
    #[serde(skip_serializing)]
    #[builder(default, setter(strip_option, into))]
    pub password: Option<String>,
}

impl Default for SesConfig {
    fn default() -> Self {
        Self {
            region: String::from(AwsRegion::DEFAULT),
            request_mode: SesRequestMode::default(),
            credential_kind: None,
            access_key: None,
            secret_key: None,
            session_token: None,
            username: None,
            password: None,
        }
    }
}

impl SesConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `SES_REGION` | `eu-west-1` |
    /// | `SES_REQUEST_MODE` | `api` |
    /// | `SES_CREDENTIAL_KIND` | inferred |
    /// | `SES_ACCESS_KEY` | unset |
    /// | `SES_SECRET_KEY` | unset |
    /// | `SES_SESSION_TOKEN` | unset |
    /// | `SES_USERNAME` | unset |
    /// | `SES_PASSWORD` | unset |
    ///
    /// Unparseable values fall back to the default; empty values count as
    /// unset.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    #[must_use]
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.is_empty());
        let mut config = Self::default();

        if let Some(v) = non_empty("SES_REGION") {
            config.region = v;
        }
        if let Some(mode) = non_empty("SES_REQUEST_MODE").and_then(|v| v.parse().ok()) {
            config.request_mode = mode;
        }
        config.credential_kind = non_empty("SES_CREDENTIAL_KIND");
        config.access_key = non_empty("SES_ACCESS_KEY");
        config.secret_key = non_empty("SES_SECRET_KEY");
        config.session_token = non_empty("SES_SESSION_TOKEN");
        config.username = non_empty("SES_USERNAME");
        config.password = non_empty("SES_PASSWORD");

        config
    }

    /// Validated region.
    ///
    /// # Errors
    ///
    /// Returns [`SigningError::InvalidRegion`] if the region is malformed.
    pub fn aws_region(&self) -> Result<AwsRegion, SigningError> {
        AwsRegion::new(self.region.as_str())
            .map_err(|_| SigningError::InvalidRegion(self.region.clone()))
    }

    /// Resolve the configured credential.
    ///
    /// With an explicit kind, only that kind's variables are consulted.
    /// Without one, an access key pair wins over a username/password pair.
    ///
    /// # Errors
    ///
    /// Returns [`SigningError::UnsupportedCredentialKind`] for a kind other
    /// than `api` or `basic`, and [`SigningError::MissingCredential`] when the
    /// variables for the selected kind are not all set. Empty values count as
    /// unset.
    pub fn credential(&self) -> Result<Credential, SigningError> {
        match self.credential_kind.as_deref().map(str::trim) {
            Some(kind) if kind.eq_ignore_ascii_case("api") => self.api_credential(),
            Some(kind) if kind.eq_ignore_ascii_case("basic") => self.basic_credential(),
            Some(kind) => Err(SigningError::UnsupportedCredentialKind(kind.to_owned())),
            None if present(self.access_key.as_deref()).is_some() => self.api_credential(),
            None if present(self.username.as_deref()).is_some() => self.basic_credential(),
            None => Err(SigningError::MissingCredential(
                "set SES_ACCESS_KEY and SES_SECRET_KEY, or SES_USERNAME and SES_PASSWORD"
                    .to_owned(),
            )),
        }
    }

    /// Build an [`SesRequest`] from this configuration.
    ///
    /// # Errors
    ///
    /// Propagates region and credential resolution errors.
    pub fn ses_request(&self) -> Result<SesRequest, SigningError> {
        Ok(SesRequest::new(
            self.aws_region()?,
            self.request_mode,
            self.credential()?,
        ))
    }

    fn api_credential(&self) -> Result<Credential, SigningError> {
        let (Some(access_key), Some(secret_key)) = (
            present(self.access_key.as_deref()),
            present(self.secret_key.as_deref()),
        ) else {
            return Err(SigningError::MissingCredential(
                "SES_ACCESS_KEY and SES_SECRET_KEY are required for api credentials".to_owned(),
            ));
        };
        let mut credential = ApiKeyCredential::new(access_key, secret_key);
        if let Some(token) = present(self.session_token.as_deref()) {
            credential = credential.with_session_token(token);
        }
        Ok(credential.into())
    }

    fn basic_credential(&self) -> Result<Credential, SigningError> {
        let (Some(username), Some(password)) = (
            present(self.username.as_deref()),
            present(self.password.as_deref()),
        ) else {
            return Err(SigningError::MissingCredential(
                "SES_USERNAME and SES_PASSWORD are required for basic credentials".to_owned(),
            ));
        };
        Ok(BasicCredential::new(username, password).into())
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
