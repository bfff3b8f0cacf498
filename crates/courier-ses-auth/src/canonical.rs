//! Canonical request construction for AWS Signature Version 4.
//!
//! SES requests are form posts with no query string, so the canonical
//! request reduces to:
//!
//! ```text
//! HTTPRequestMethod\n
//! CanonicalURI\n
//! \n
//! CanonicalHeaders\n\n
//! SignedHeaders\n
//! HashedPayload
//! ```
//!
//! Each component is normalized so that the signature is a pure function of
//! the request, credential, region, and timestamp.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use sha2::{Digest, Sha256};

/// The set of characters that must be percent-encoded in URI path segments.
///
/// For AWS SigV4, all characters except unreserved characters
/// (A-Z, a-z, 0-9, `-`, `_`, `.`, `~`) must be encoded.
/// Forward slashes in the path are preserved (not encoded).
const URI_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Build the full canonical request string from its components.
///
/// `canonical_headers` is the output of [`build_canonical_headers`] and
/// carries no trailing newline; the blank separator line is added here.
///
/// # Examples
///
/// ```
/// use courier_ses_auth::canonical::build_canonical_request;
///
/// let canonical = build_canonical_request(
///     "POST",
///     "/",
///     "host:email.us-east-1.amazonaws.com\nx-amz-date:20150101T000000Z",
///     "host;x-amz-date",
///     "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855",
/// );
/// assert!(canonical.starts_with("POST\n/\n\nhost:"));
/// ```
#[must_use]
pub fn build_canonical_request(
    method: &str,
    path: &str,
    canonical_headers: &str,
    signed_headers: &str,
    payload_hash: &str,
) -> String {
    let canonical_uri = build_canonical_uri(path);

    format!("{method}\n{canonical_uri}\n\n{canonical_headers}\n\n{signed_headers}\n{payload_hash}")
}

/// Build the canonical URI by URI-encoding each path segment individually.
///
/// Forward slashes (`/`) are preserved. Empty paths are normalized to `/`.
///
/// # Examples
///
/// ```
/// use courier_ses_auth::canonical::build_canonical_uri;
///
/// assert_eq!(build_canonical_uri("/"), "/");
/// assert_eq!(build_canonical_uri(""), "/");
/// ```
#[must_use]
pub fn build_canonical_uri(path: &str) -> String {
    if path.is_empty() || path == "/" {
        return "/".to_owned();
    }

    path.split('/')
        .map(|segment| {
            // Decode first so an already-encoded path is not double-encoded.
            let decoded = percent_decode_str(segment).decode_utf8_lossy();
            utf8_percent_encode(&decoded, URI_ENCODE_SET).to_string()
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Sort header pairs by lowercased name, ascending.
///
/// The sort is stable and case-insensitive, so `X-Amz-Date` and `host`
/// order the same way regardless of how the caller cased them.
fn sorted_by_lowercase_name<'a>(headers: &[(&'a str, &'a str)]) -> Vec<(String, &'a str)> {
    let mut sorted: Vec<(String, &str)> = headers
        .iter()
        .map(|(name, value)| (name.to_ascii_lowercase(), *value))
        .collect();
    sorted.sort_by(|a, b| a.0.cmp(&b.0));
    sorted
}

/// Build the canonical headers string: `lowercase(name):value` lines joined
/// with `\n`, sorted by lowercased name.
///
/// Values are used verbatim. The result does NOT include a trailing newline;
/// [`build_canonical_request`] adds the separator.
///
/// # Examples
///
/// ```
/// use courier_ses_auth::canonical::build_canonical_headers;
///
/// let result = build_canonical_headers(&[
///     ("X-Amz-Date", "20150101T000000Z"),
///     ("host", "email.us-east-1.amazonaws.com"),
/// ]);
/// assert_eq!(
///     result,
///     "host:email.us-east-1.amazonaws.com\nx-amz-date:20150101T000000Z"
/// );
/// ```
#[must_use]
pub fn build_canonical_headers(headers: &[(&str, &str)]) -> String {
    sorted_by_lowercase_name(headers)
        .iter()
        .map(|(name, value)| format!("{name}:{value}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Build the signed headers string as a semicolon-separated list of
/// lowercase header names, in the same order as [`build_canonical_headers`].
///
/// # Examples
///
/// ```
/// use courier_ses_auth::canonical::build_signed_headers_string;
///
/// assert_eq!(
///     build_signed_headers_string(&[("X-Amz-Date", ""), ("Host", "")]),
///     "host;x-amz-date"
/// );
/// ```
#[must_use]
pub fn build_signed_headers_string(headers: &[(&str, &str)]) -> String {
    sorted_by_lowercase_name(headers)
        .iter()
        .map(|(name, _)| name.as_str())
        .collect::<Vec<_>>()
        .join(";")
}

/// Compute the SHA-256 hash of the given payload and return it as a hex string.
///
/// # Examples
///
/// ```
/// use courier_ses_auth::canonical::hash_payload;
///
/// // SHA-256 of empty payload
/// assert_eq!(
///     hash_payload(b""),
///     "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
/// );
/// ```
#[must_use]
pub fn hash_payload(payload: &[u8]) -> String {
    hex::encode(Sha256::digest(payload))
}
