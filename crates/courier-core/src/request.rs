//! Caller-owned request descriptors.
//!
//! A [`RequestDescriptor`] is what the (external) transport hands to a
//! signer: method, host, path, headers, and form body parameters. Signers
//! only read it and hand back a fresh [`HeaderMap`] to merge, so the
//! caller's copy is never mutated behind its back.

use http::{HeaderMap, HeaderName, HeaderValue, Method};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// Characters escaped when form-encoding body parameters.
///
/// Everything except RFC 3986 unreserved characters
/// (A-Z, a-z, 0-9, `-`, `_`, `.`, `~`). `~` in particular must stay literal:
/// AWS canonicalizes it unescaped and a `%7E` would change the payload hash.
const FORM_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Percent-encode a form key or value per RFC 3986.
///
/// # Examples
///
/// ```
/// use courier_core::form_encode;
///
/// assert_eq!(form_encode("a~b c/d"), "a~b%20c%2Fd");
/// ```
#[must_use]
pub fn form_encode(input: &str) -> String {
    utf8_percent_encode(input, FORM_ENCODE_SET).to_string()
}

/// A single body parameter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    /// A scalar value.
    Single(String),
    /// A list of values, expanded as `key.1`, `key.2`, ... when encoded.
    List(Vec<String>),
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Single(value.to_owned())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Single(value)
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(values: Vec<String>) -> Self {
        Self::List(values)
    }
}

impl From<Vec<&str>> for ParamValue {
    fn from(values: Vec<&str>) -> Self {
        Self::List(values.into_iter().map(ToOwned::to_owned).collect())
    }
}

/// Ordered form body parameters.
///
/// Parameters keep the order in which they were first inserted; inserting an
/// existing key replaces its value in place. The order is significant: the
/// SigV4 payload hash covers the encoded body exactly as the caller laid it
/// out, without re-sorting.
///
/// # Examples
///
/// ```
/// use courier_core::BodyParams;
///
/// let params = BodyParams::new()
///     .with("Action", "SendEmail")
///     .with("Destination.ToAddresses.member", vec!["a@example.com", "b@example.com"]);
/// assert_eq!(
///     params.to_form_string(),
///     "Action=SendEmail\
///      &Destination.ToAddresses.member.1=a%40example.com\
///      &Destination.ToAddresses.member.2=b%40example.com"
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BodyParams {
    entries: Vec<(String, ParamValue)>,
}

impl BodyParams {
    /// Create an empty parameter list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a parameter, replacing the value of an existing key in place.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter().position(|(k, _)| *k == key) {
            Some(pos) => self.entries[pos].1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Builder-style [`BodyParams::insert`].
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Look up a parameter by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Number of distinct keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no parameters have been set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over the parameters in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Flatten into `(key, value)` pairs, expanding lists with 1-based
    /// member indices.
    #[must_use]
    pub fn pairs(&self) -> Vec<(String, &str)> {
        let mut pairs = Vec::with_capacity(self.entries.len());
        for (key, value) in &self.entries {
            match value {
                ParamValue::Single(v) => pairs.push((key.clone(), v.as_str())),
                ParamValue::List(values) => {
                    for (i, v) in values.iter().enumerate() {
                        pairs.push((format!("{key}.{}", i + 1), v.as_str()));
                    }
                }
            }
        }
        pairs
    }

    /// Encode as an `application/x-www-form-urlencoded` string in insertion order.
    #[must_use]
    pub fn to_form_string(&self) -> String {
        self.pairs()
            .iter()
            .map(|(k, v)| format!("{}={}", form_encode(k), form_encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

impl<K, V> FromIterator<(K, V)> for BodyParams
where
    K: Into<String>,
    V: Into<ParamValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (k, v) in iter {
            params.insert(k, v);
        }
        params
    }
}

/// An outbound HTTP request as described by the caller.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    /// HTTP method.
    pub method: Method,
    /// Target host (no scheme, no port).
    pub host: String,
    /// Request path, `/` by default.
    pub path: String,
    /// Caller-supplied headers. Names are case-insensitive.
    pub headers: HeaderMap,
    /// Form body parameters.
    pub body_params: BodyParams,
}

impl RequestDescriptor {
    /// Create a descriptor for `method` against `host` with path `/`.
    #[must_use]
    pub fn new(method: Method, host: impl Into<String>) -> Self {
        Self {
            method,
            host: host.into(),
            path: "/".to_owned(),
            headers: HeaderMap::new(),
            body_params: BodyParams::new(),
        }
    }

    /// Set the request path.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Add a caller header.
    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Add a body parameter.
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.body_params.insert(key, value);
        self
    }

    /// The exact body bytes to send, which are also what the payload hash covers.
    #[must_use]
    pub fn encoded_body(&self) -> String {
        self.body_params.to_form_string()
    }

    /// Merge signer output over a copy of the caller's headers.
    ///
    /// Signed headers win over caller headers of the same name.
    #[must_use]
    pub fn merged_headers(&self, signed: &HeaderMap) -> HeaderMap {
        let mut merged = self.headers.clone();
        for (name, value) in signed {
            merged.insert(name.clone(), value.clone());
        }
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_leave_tilde_unescaped() {
        assert_eq!(form_encode("~user"), "~user");
        assert!(!form_encode("a~b").contains("%7E"));
    }

    #[test]
    fn test_should_escape_reserved_characters() {
        assert_eq!(form_encode("a b+c=d&e/f"), "a%20b%2Bc%3Dd%26e%2Ff");
        assert_eq!(form_encode("SGVsbG8="), "SGVsbG8%3D");
    }

    #[test]
    fn test_should_encode_utf8_bytes() {
        assert_eq!(form_encode("é"), "%C3%A9");
    }

    #[test]
    fn test_should_keep_insertion_order() {
        let params = BodyParams::new().with("b", "2").with("a", "1");
        assert_eq!(params.to_form_string(), "b=2&a=1");
    }

    #[test]
    fn test_should_replace_existing_key_in_place() {
        let params = BodyParams::new()
            .with("first", "1")
            .with("second", "2")
            .with("first", "overridden");
        assert_eq!(params.len(), 2);
        assert_eq!(params.to_form_string(), "first=overridden&second=2");
    }

    #[test]
    fn test_should_expand_lists_with_member_indices() {
        let params = BodyParams::new().with("Destination.ToAddresses.member", vec!["x", "y"]);
        assert_eq!(
            params.to_form_string(),
            "Destination.ToAddresses.member.1=x&Destination.ToAddresses.member.2=y"
        );
    }

    #[test]
    fn test_should_encode_empty_params_as_empty_string() {
        assert_eq!(BodyParams::new().to_form_string(), "");
        assert!(BodyParams::new().is_empty());
    }

    #[test]
    fn test_should_collect_from_iterator() {
        let params: BodyParams = [("Action", "SendRawEmail"), ("Version", "2010-12-01")]
            .into_iter()
            .collect();
        assert_eq!(
            params.get("Version"),
            Some(&ParamValue::Single("2010-12-01".to_owned()))
        );
    }

    #[test]
    fn test_should_default_path_to_root() {
        let request = RequestDescriptor::new(Method::POST, "email.eu-west-1.amazonaws.com");
        assert_eq!(request.path, "/");
        assert!(request.headers.is_empty());
    }

    #[test]
    fn test_should_merge_signed_headers_over_caller_headers() {
        let request = RequestDescriptor::new(Method::POST, "example.com")
            .with_header(
                HeaderName::from_static("x-custom"),
                HeaderValue::from_static("keep"),
            )
            .with_header(http::header::HOST, HeaderValue::from_static("stale"));

        let mut signed = HeaderMap::new();
        signed.insert(http::header::HOST, HeaderValue::from_static("example.com"));

        let merged = request.merged_headers(&signed);
        assert_eq!(merged["x-custom"], "keep");
        assert_eq!(merged[http::header::HOST], "example.com");
        // The caller's copy is untouched.
        assert_eq!(request.headers[http::header::HOST], "stale");
    }
}
