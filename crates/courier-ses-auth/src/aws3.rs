//! Legacy `AWS3-HTTPS` signing.
//!
//! The older SES HTTPS scheme signs nothing but the request date:
//!
//! ```text
//! Date: <RFC 1123 date>
//! X-Amzn-Authorization: AWS3-HTTPS AWSAccessKeyId=<id>,Algorithm=HmacSHA256,Signature=<base64(HMAC-SHA256(secret, date))>
//! ```
//!
//! It ignores region, method, body, and every other header.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use courier_core::RequestDescriptor;
use http::header::DATE;
use http::{HeaderMap, HeaderName};
use tracing::debug;

use crate::credentials::Credential;
use crate::error::SigningError;
use crate::sigv4::{X_AMZ_SECURITY_TOKEN, header_value, hmac_sha256};

/// The `X-Amzn-Authorization` header.
pub const X_AMZN_AUTHORIZATION: HeaderName = HeaderName::from_static("x-amzn-authorization");

const DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S UTC";

/// Format a timestamp as the `Date` header value, e.g.
/// `Thu, 01 Jan 2015 00:00:00 UTC`.
#[must_use]
pub fn format_date(timestamp: DateTime<Utc>) -> String {
    timestamp.format(DATE_FORMAT).to_string()
}

/// Base64 HMAC-SHA256 of `date` keyed by `secret`.
#[must_use]
pub fn compute_signature(secret: &str, date: &str) -> String {
    STANDARD.encode(&*hmac_sha256(secret.as_bytes(), date.as_bytes()))
}

/// Format the `X-Amzn-Authorization` header value.
#[must_use]
pub fn format_authorization(identity: &str, signature: &str) -> String {
    format!("AWS3-HTTPS AWSAccessKeyId={identity},Algorithm=HmacSHA256,Signature={signature}")
}

/// Signs SES requests with the legacy `AWS3-HTTPS` scheme.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use courier_core::RequestDescriptor;
/// use courier_ses_auth::aws3::Aws3Signer;
/// use courier_ses_auth::credentials::{ApiKeyCredential, Credential};
///
/// let request = RequestDescriptor::new(http::Method::POST, "email.us-east-1.amazonaws.com");
/// let credential: Credential =
///     ApiKeyCredential::new("AKIDEXAMPLE", "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY").into();
/// let at = Utc.with_ymd_and_hms(2015, 1, 1, 0, 0, 0).unwrap();
///
/// let headers = Aws3Signer::new().sign_at(&request, &credential, at).unwrap();
/// assert_eq!(headers["date"], "Thu, 01 Jan 2015 00:00:00 UTC");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Aws3Signer;

impl Aws3Signer {
    /// Create a signer.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Sign with the current time.
    ///
    /// # Errors
    ///
    /// Returns [`SigningError::InvalidHeaderValue`] if the identity or session
    /// token cannot be carried in an HTTP header.
    pub fn sign(
        &self,
        request: &RequestDescriptor,
        credential: &Credential,
    ) -> Result<HeaderMap, SigningError> {
        self.sign_at(request, credential, Utc::now())
    }

    /// Sign as of `timestamp`.
    ///
    /// `request` is accepted for symmetry with the SigV4 signer; nothing in it
    /// is covered by the signature.
    ///
    /// # Errors
    ///
    /// Returns [`SigningError::InvalidHeaderValue`] if the identity or session
    /// token cannot be carried in an HTTP header.
    pub fn sign_at(
        &self,
        request: &RequestDescriptor,
        credential: &Credential,
        timestamp: DateTime<Utc>,
    ) -> Result<HeaderMap, SigningError> {
        let date = format_date(timestamp);
        let signature = compute_signature(credential.secret(), &date);
        let authorization = format_authorization(credential.identity(), &signature);

        let mut headers = HeaderMap::with_capacity(3);
        headers.insert(DATE, header_value(&DATE, &date)?);
        headers.insert(
            X_AMZN_AUTHORIZATION,
            header_value(&X_AMZN_AUTHORIZATION, &authorization)?,
        );
        if let Some(token) = credential.session_token() {
            headers.insert(
                X_AMZ_SECURITY_TOKEN,
                header_value(&X_AMZ_SECURITY_TOKEN, token)?,
            );
        }

        debug!(
            host = %request.host,
            identity = %credential.identity(),
            date,
            "Signed SES request with AWS3-HTTPS"
        );

        Ok(headers)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use http::Method;

    use super::*;
    use crate::credentials::{ApiKeyCredential, BasicCredential};

    const TEST_SECRET_KEY: &str = "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY";

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2015, 1, 1, 0, 0, 0).unwrap()
    }

    fn request() -> RequestDescriptor {
        RequestDescriptor::new(Method::POST, "email.us-east-1.amazonaws.com")
            .with_param("Action", "SendRawEmail")
    }

    #[test]
    fn test_should_format_rfc1123_style_date() {
        assert_eq!(format_date(at()), "Thu, 01 Jan 2015 00:00:00 UTC");
    }

    #[test]
    fn test_should_sign_date_with_known_vector() {
        let credential: Credential = ApiKeyCredential::new("AKIDEXAMPLE", TEST_SECRET_KEY).into();
        let headers = Aws3Signer::new().sign_at(&request(), &credential, at()).unwrap();

        assert_eq!(headers[DATE], "Thu, 01 Jan 2015 00:00:00 UTC");
        assert_eq!(
            headers[X_AMZN_AUTHORIZATION],
            "AWS3-HTTPS AWSAccessKeyId=AKIDEXAMPLE,Algorithm=HmacSHA256,\
             Signature=IGVtyRu0quaUuEHQaZkCxBVgs4fczhGpF5tlXj4m/ts="
        );
        assert!(!headers.contains_key(X_AMZ_SECURITY_TOKEN));
    }

    #[test]
    fn test_should_add_session_token_header() {
        let credential: Credential = ApiKeyCredential::new("AKIDEXAMPLE", TEST_SECRET_KEY)
            .with_session_token("session-token")
            .into();
        let headers = Aws3Signer::new().sign_at(&request(), &credential, at()).unwrap();
        assert_eq!(headers[X_AMZ_SECURITY_TOKEN], "session-token");
    }

    #[test]
    fn test_should_use_username_for_basic_credential() {
        let credential: Credential = BasicCredential::new("smtp-user", TEST_SECRET_KEY).into();
        let headers = Aws3Signer::new().sign_at(&request(), &credential, at()).unwrap();
        let value = headers[X_AMZN_AUTHORIZATION].to_str().unwrap();
        assert!(value.starts_with("AWS3-HTTPS AWSAccessKeyId=smtp-user,"));
        // Same secret and date, same signature.
        assert!(value.ends_with("Signature=IGVtyRu0quaUuEHQaZkCxBVgs4fczhGpF5tlXj4m/ts="));
    }

    #[test]
    fn test_should_ignore_request_contents() {
        let credential: Credential = ApiKeyCredential::new("AKIDEXAMPLE", TEST_SECRET_KEY).into();
        let signer = Aws3Signer::new();
        let a = signer.sign_at(&request(), &credential, at()).unwrap();
        let b = signer
            .sign_at(
                &RequestDescriptor::new(Method::GET, "other.example.com"),
                &credential,
                at(),
            )
            .unwrap();
        assert_eq!(a, b);
    }
}
