//! AWS Signature Version 4 signing for SES.
//!
//! Signing is a straight pipeline over an immutable [`SigningContext`]:
//!
//! 1. Assemble the headers to sign (`Content-Type` in API mode, `Host`,
//!    `X-Amz-Date`, and `X-Amz-Security-Token` when the credential has one).
//! 2. Build the canonical request and hash it.
//! 3. Build the string to sign from the timestamp, credential scope, and
//!    canonical request hash.
//! 4. Derive the signing key with the HMAC-SHA256 chain.
//! 5. Compute the signature and format the `Authorization` header.
//!
//! The main entry point is [`Sigv4Signer::sign`].

use chrono::{DateTime, NaiveDateTime, Utc};
use courier_core::{AwsRegion, RequestDescriptor};
use hmac::{Hmac, KeyInit, Mac};
use http::header::{AUTHORIZATION, CONTENT_TYPE, HOST};
use http::{HeaderMap, HeaderName, HeaderValue};
use sha2::Sha256;
use tracing::debug;
use zeroize::Zeroizing;

use crate::canonical::{
    build_canonical_headers, build_canonical_request, build_signed_headers_string, hash_payload,
};
use crate::credentials::Credential;
use crate::error::SigningError;
use crate::request::SesRequestMode;

/// The signing algorithm name.
const ALGORITHM: &str = "AWS4-HMAC-SHA256";

/// The service name in the credential scope.
pub const SERVICE_NAME: &str = "ses";

/// `Content-Type` sent (and signed) in API mode.
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// The `X-Amz-Date` header.
pub const X_AMZ_DATE: HeaderName = HeaderName::from_static("x-amz-date");

/// The `X-Amz-Security-Token` header.
pub const X_AMZ_SECURITY_TOKEN: HeaderName = HeaderName::from_static("x-amz-security-token");

const AMZ_DATE_FORMAT: &str = "%Y%m%dT%H%M%SZ";
const DATE_STAMP_FORMAT: &str = "%Y%m%d";

type HmacSha256 = Hmac<Sha256>;

/// Everything a single signature is bound to besides the request and
/// credential. Built fresh for every signing call.
#[derive(Debug, Clone)]
pub struct SigningContext {
    timestamp: DateTime<Utc>,
    region: AwsRegion,
    service: &'static str,
}

impl SigningContext {
    /// Create a context for `region` at `timestamp`.
    ///
    /// # Errors
    ///
    /// Returns [`SigningError::InvalidRegion`] if the region is empty or malformed.
    pub fn new(region: &str, timestamp: DateTime<Utc>) -> Result<Self, SigningError> {
        let region =
            AwsRegion::new(region).map_err(|_| SigningError::InvalidRegion(region.to_owned()))?;
        Ok(Self {
            timestamp,
            region,
            service: SERVICE_NAME,
        })
    }

    /// Create a context for `region` at the current time.
    ///
    /// # Errors
    ///
    /// Returns [`SigningError::InvalidRegion`] if the region is empty or malformed.
    pub fn now(region: &str) -> Result<Self, SigningError> {
        Self::new(region, Utc::now())
    }

    /// Create a context from a textual timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`SigningError::InvalidTimestamp`] if the timestamp is empty or
    /// unparseable, and [`SigningError::InvalidRegion`] for a bad region.
    ///
    /// # Examples
    ///
    /// ```
    /// use courier_ses_auth::sigv4::SigningContext;
    ///
    /// let ctx = SigningContext::parse("us-east-1", "20150101T000000Z").unwrap();
    /// assert_eq!(ctx.credential_scope(), "20150101/us-east-1/ses/aws4_request");
    /// ```
    pub fn parse(region: &str, timestamp: &str) -> Result<Self, SigningError> {
        Self::new(region, parse_timestamp(timestamp)?)
    }

    /// The signing instant.
    #[must_use]
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// The region.
    #[must_use]
    pub fn region(&self) -> &AwsRegion {
        &self.region
    }

    /// The service name (always `ses`).
    #[must_use]
    pub fn service(&self) -> &'static str {
        self.service
    }

    /// `X-Amz-Date` value: `YYYYMMDDTHHMMSSZ`.
    #[must_use]
    pub fn amz_date(&self) -> String {
        self.timestamp.format(AMZ_DATE_FORMAT).to_string()
    }

    /// Date-only stamp: `YYYYMMDD`.
    #[must_use]
    pub fn date_stamp(&self) -> String {
        self.timestamp.format(DATE_STAMP_FORMAT).to_string()
    }

    /// Credential scope: `YYYYMMDD/region/ses/aws4_request`.
    #[must_use]
    pub fn credential_scope(&self) -> String {
        format!(
            "{}/{}/{}/aws4_request",
            self.date_stamp(),
            self.region,
            self.service
        )
    }
}

/// Parse an RFC 3339 or `YYYYMMDDTHHMMSSZ` timestamp as UTC.
///
/// # Errors
///
/// Returns [`SigningError::InvalidTimestamp`] if the value is empty or matches
/// neither format.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, SigningError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(SigningError::InvalidTimestamp(value.to_owned()));
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(trimmed, AMZ_DATE_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|_| SigningError::InvalidTimestamp(value.to_owned()))
}

/// Build the SigV4 string to sign.
///
/// Format:
/// ```text
/// AWS4-HMAC-SHA256\n
/// <ISO8601 timestamp>\n
/// <credential_scope>\n
/// <hex(SHA256(canonical_request))>
/// ```
///
/// # Examples
///
/// ```
/// use courier_ses_auth::sigv4::build_string_to_sign;
///
/// let sts = build_string_to_sign(
///     "20150101T000000Z",
///     "20150101/us-east-1/ses/aws4_request",
///     "77f731852181ec6c0c7803745ef66f0f6fb545e423ebe1df0d7b6ecca34fee1c",
/// );
/// assert!(sts.starts_with("AWS4-HMAC-SHA256\n20150101T000000Z\n"));
/// ```
#[must_use]
pub fn build_string_to_sign(
    timestamp: &str,
    credential_scope: &str,
    canonical_request_hash: &str,
) -> String {
    format!("{ALGORITHM}\n{timestamp}\n{credential_scope}\n{canonical_request_hash}")
}

/// Derive the SigV4 signing key using HMAC-SHA256 chain.
///
/// ```text
/// DateKey              = HMAC-SHA256("AWS4" + secret_key, date)
/// DateRegionKey        = HMAC-SHA256(DateKey, region)
/// DateRegionServiceKey = HMAC-SHA256(DateRegionKey, service)
/// SigningKey           = HMAC-SHA256(DateRegionServiceKey, "aws4_request")
/// ```
///
/// # Examples
///
/// ```
/// use courier_ses_auth::sigv4::derive_signing_key;
///
/// let key = derive_signing_key(
///     "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY",
///     "20150830",
///     "us-east-1",
///     "iam",
/// );
/// assert_eq!(
///     hex::encode(&*key),
///     "c4afb1cc5771d871763a393e44b703571b55cc28424d1a5e86da6ed3c154a4b9"
/// );
/// ```
#[must_use]
pub fn derive_signing_key(
    secret_key: &str,
    date: &str,
    region: &str,
    service: &str,
) -> Zeroizing<Vec<u8>> {
    let seed = Zeroizing::new(format!("AWS4{secret_key}"));
    let date_key = hmac_sha256(seed.as_bytes(), date.as_bytes());
    let date_region_key = hmac_sha256(&date_key, region.as_bytes());
    let date_region_service_key = hmac_sha256(&date_region_key, service.as_bytes());
    hmac_sha256(&date_region_service_key, b"aws4_request")
}

/// Compute the HMAC-SHA256 signature of `data` using the given `signing_key`.
///
/// Returns the hex-encoded signature.
#[must_use]
pub fn compute_signature(signing_key: &[u8], data: &str) -> String {
    let sig = hmac_sha256(signing_key, data.as_bytes());
    hex::encode(&*sig)
}

/// Format the `Authorization` header value.
#[must_use]
pub fn format_authorization(
    identity: &str,
    credential_scope: &str,
    signed_headers: &str,
    signature: &str,
) -> String {
    format!(
        "{ALGORITHM} Credential={identity}/{credential_scope}, SignedHeaders={signed_headers}, Signature={signature}"
    )
}

/// Signs SES requests with AWS Signature Version 4.
///
/// The signer holds no key material; every call is a pure function of the
/// request, the credential, and the signing context, so one signer can be
/// shared freely across threads.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use courier_core::RequestDescriptor;
/// use courier_ses_auth::credentials::{ApiKeyCredential, Credential};
/// use courier_ses_auth::sigv4::Sigv4Signer;
///
/// let request = RequestDescriptor::new(http::Method::POST, "email.us-east-1.amazonaws.com")
///     .with_param("Action", "SendRawEmail")
///     .with_param("RawMessage.Data", "SGVsbG8=");
/// let credential: Credential =
///     ApiKeyCredential::new("AKIDEXAMPLE", "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY").into();
/// let timestamp = Utc.with_ymd_and_hms(2015, 1, 1, 0, 0, 0).unwrap();
///
/// let headers = Sigv4Signer::default()
///     .sign(&request, &credential, "us-east-1", timestamp)
///     .unwrap();
/// assert_eq!(headers["x-amz-date"], "20150101T000000Z");
/// assert!(headers["authorization"]
///     .to_str()
///     .unwrap()
///     .starts_with("AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/20150101/us-east-1/ses/aws4_request"));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Sigv4Signer {
    mode: SesRequestMode,
}

impl Sigv4Signer {
    /// Create a signer for the given request mode.
    #[must_use]
    pub fn new(mode: SesRequestMode) -> Self {
        Self { mode }
    }

    /// The request mode this signer was built for.
    #[must_use]
    pub fn mode(&self) -> SesRequestMode {
        self.mode
    }

    /// Sign `request` for `region` at `timestamp`.
    ///
    /// Returns the headers to merge into the outbound request: every signed
    /// header plus `Authorization`. The caller's descriptor is not modified.
    ///
    /// # Errors
    ///
    /// Returns [`SigningError::InvalidRegion`] for an empty or malformed region
    /// and [`SigningError::InvalidHeaderValue`] if the host or session token
    /// cannot be carried in an HTTP header.
    pub fn sign(
        &self,
        request: &RequestDescriptor,
        credential: &Credential,
        region: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<HeaderMap, SigningError> {
        let context = SigningContext::new(region, timestamp)?;
        self.sign_with_context(request, credential, &context)
    }

    /// Sign `request` for `region` with a fresh read of the system clock.
    ///
    /// # Errors
    ///
    /// Same as [`Sigv4Signer::sign`].
    pub fn sign_now(
        &self,
        request: &RequestDescriptor,
        credential: &Credential,
        region: &str,
    ) -> Result<HeaderMap, SigningError> {
        self.sign(request, credential, region, Utc::now())
    }

    /// Sign `request` with a prepared [`SigningContext`].
    ///
    /// # Errors
    ///
    /// Returns [`SigningError::InvalidHeaderValue`] if a signed header value
    /// cannot be carried in an HTTP header.
    pub fn sign_with_context(
        &self,
        request: &RequestDescriptor,
        credential: &Credential,
        context: &SigningContext,
    ) -> Result<HeaderMap, SigningError> {
        let amz_date = context.amz_date();
        let to_sign = self.headers_to_sign(request, credential, &amz_date);

        let pairs: Vec<(&str, &str)> = to_sign
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
            .collect();
        let canonical_headers = build_canonical_headers(&pairs);
        let signed_headers = build_signed_headers_string(&pairs);
        let payload_hash = hash_payload(request.encoded_body().as_bytes());

        let canonical_request = build_canonical_request(
            request.method.as_str(),
            &request.path,
            &canonical_headers,
            &signed_headers,
            &payload_hash,
        );
        let canonical_hash = hash_payload(canonical_request.as_bytes());

        debug!(signed_headers, payload_hash, canonical_hash, "Built canonical request");

        let credential_scope = context.credential_scope();
        let string_to_sign = build_string_to_sign(&amz_date, &credential_scope, &canonical_hash);

        debug!(string_to_sign, "Built string to sign");

        let signing_key = derive_signing_key(
            credential.secret(),
            &context.date_stamp(),
            context.region().as_str(),
            context.service(),
        );
        let signature = compute_signature(&signing_key, &string_to_sign);
        let authorization = format_authorization(
            credential.identity(),
            &credential_scope,
            &signed_headers,
            &signature,
        );

        let mut headers = HeaderMap::with_capacity(to_sign.len() + 1);
        for (name, value) in &to_sign {
            headers.insert(name.clone(), header_value(name, value)?);
        }
        headers.insert(AUTHORIZATION, header_value(&AUTHORIZATION, &authorization)?);

        debug!(
            identity = %credential.identity(),
            credential_scope,
            "Signed SES request"
        );

        Ok(headers)
    }

    /// The header set covered by the signature, in insertion order.
    fn headers_to_sign(
        &self,
        request: &RequestDescriptor,
        credential: &Credential,
        amz_date: &str,
    ) -> Vec<(HeaderName, String)> {
        let mut headers = Vec::with_capacity(4);
        if self.mode == SesRequestMode::Api {
            headers.push((CONTENT_TYPE, FORM_CONTENT_TYPE.to_owned()));
        }
        headers.push((HOST, request.host.clone()));
        headers.push((X_AMZ_DATE, amz_date.to_owned()));
        if let Some(token) = credential.session_token() {
            headers.push((X_AMZ_SECURITY_TOKEN, token.to_owned()));
        }
        headers
    }
}

/// Convert a computed value into a [`HeaderValue`].
pub(crate) fn header_value(name: &HeaderName, value: &str) -> Result<HeaderValue, SigningError> {
    HeaderValue::from_str(value).map_err(|_| SigningError::InvalidHeaderValue(name.to_string()))
}

/// Compute HMAC-SHA256 and return the raw bytes.
pub(crate) fn hmac_sha256(key: &[u8], data: &[u8]) -> Zeroizing<Vec<u8>> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can accept keys of any length");
    mac.update(data);
    Zeroizing::new(mac.finalize().into_bytes().to_vec())
}
