//! Outbound APNs requests.

use std::fmt;

use http::header::CONTENT_TYPE;
use http::{HeaderMap, HeaderValue, Method};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde_json::Value;
use tracing::debug;

use crate::cert::CertCredential;
use crate::error::ApnsError;
use crate::options::ApnsOptions;
use crate::provider::ApnsAuthenticationProvider;

/// APNs HTTPS port.
pub const APNS_PORT: u16 = 443;

/// Everything but unreserved characters is escaped in the device path segment.
const DEVICE_TOKEN_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Which APNs gateway to talk to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ApnsEnvironment {
    /// `api.push.apple.com`
    Production,
    /// `api.development.push.apple.com`
    #[default]
    Development,
}

impl ApnsEnvironment {
    /// Pick the environment from a "production" flag.
    #[must_use]
    pub fn from_production(production: bool) -> Self {
        if production {
            Self::Production
        } else {
            Self::Development
        }
    }

    /// Gateway host.
    #[must_use]
    pub fn host(self) -> &'static str {
        match self {
            Self::Production => "api.push.apple.com",
            Self::Development => "api.development.push.apple.com",
        }
    }

    /// Gateway port.
    #[must_use]
    pub fn port(self) -> u16 {
        APNS_PORT
    }
}

impl fmt::Display for ApnsEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host(), self.port())
    }
}

/// A notification request ready for the HTTP/2 client.
///
/// Authenticators add to it in place: token auth sets `Authorization`,
/// certificate auth fills [`ApnsRequest::tls`].
#[derive(Debug, Clone)]
pub struct ApnsRequest {
    /// Target gateway.
    pub environment: ApnsEnvironment,
    /// HTTP method.
    pub method: Method,
    /// Request path, e.g. `/3/device/<token>`.
    pub path: String,
    /// Request headers.
    pub headers: HeaderMap,
    /// JSON body.
    pub payload: Value,
    /// Client certificate for the TLS handshake, when using certificate auth.
    pub tls: Option<CertCredential>,
}

impl ApnsRequest {
    /// An empty request.
    #[must_use]
    pub fn new(environment: ApnsEnvironment, method: Method, path: impl Into<String>) -> Self {
        Self {
            environment,
            method,
            path: path.into(),
            headers: HeaderMap::new(),
            payload: Value::Null,
            tls: None,
        }
    }

    /// Build `POST /3/device/<recipient>` from notification options. The
    /// recipient is percent-encoded as a single path segment.
    ///
    /// When the payload's alert is a plain string (no [`crate::AlertOptions`]
    /// were given) it is replaced by `subject`.
    ///
    /// # Errors
    ///
    /// Propagates header errors from [`ApnsOptions::headers`].
    ///
    /// # Examples
    ///
    /// ```
    /// use courier_apns_auth::{ApnsEnvironment, ApnsOptions, ApnsRequest};
    ///
    /// let options = ApnsOptions::new("device-token");
    /// let request = ApnsRequest::from_options(ApnsEnvironment::Production, &options, "Hello").unwrap();
    /// assert_eq!(request.url(), "https://api.push.apple.com/3/device/device-token");
    /// assert_eq!(request.payload, serde_json::json!({"aps": {"alert": "Hello"}}));
    /// ```
    pub fn from_options(
        environment: ApnsEnvironment,
        options: &ApnsOptions,
        subject: &str,
    ) -> Result<Self, ApnsError> {
        let mut payload = options.payload();
        if let Some(alert) = payload
            .get_mut("aps")
            .and_then(|aps| aps.get_mut("alert"))
            .filter(|alert| alert.is_string())
        {
            *alert = Value::String(subject.to_owned());
        }

        let mut headers = options.headers()?;
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        Ok(Self {
            environment,
            method: Method::POST,
            path: format!(
                "/3/device/{}",
                utf8_percent_encode(options.recipient(), DEVICE_TOKEN_ENCODE_SET)
            ),
            headers,
            payload,
            tls: None,
        })
    }

    /// Run `provider` over this request.
    ///
    /// # Errors
    ///
    /// Propagates the provider's error.
    pub fn authenticate_with(
        mut self,
        provider: &dyn ApnsAuthenticationProvider,
    ) -> Result<Self, ApnsError> {
        provider.authenticate(&mut self)?;
        debug!(
            gateway = %self.environment,
            path = %self.path,
            tls = self.tls.is_some(),
            "Authenticated APNs request"
        );
        Ok(self)
    }

    /// Full request URL.
    #[must_use]
    pub fn url(&self) -> String {
        format!("https://{}{}", self.environment.host(), self.path)
    }

    /// Serialized JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`ApnsError::Serialization`] if the payload cannot be encoded.
    pub fn body(&self) -> Result<Vec<u8>, ApnsError> {
        Ok(serde_json::to_vec(&self.payload)?)
    }
}
