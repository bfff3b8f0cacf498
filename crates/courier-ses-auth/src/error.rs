//! Error types for SES request signing.
//!
//! All signing failures are represented by [`SigningError`]. Every variant is
//! a deterministic function of the caller's input; none is retried here.

/// Errors that can occur while signing an SES request.
#[derive(Debug, thiserror::Error)]
pub enum SigningError {
    /// The configured credential kind is neither an API key nor a
    /// username/password pair.
    #[error("unsupported credential kind: {0:?} (expected \"api\" or \"basic\")")]
    UnsupportedCredentialKind(String),

    /// The region is empty or not a valid region identifier.
    #[error("invalid region: {0:?}")]
    InvalidRegion(String),

    /// The timestamp is empty or could not be parsed.
    #[error("invalid timestamp: {0:?} (expected RFC 3339 or YYYYMMDDTHHMMSSZ)")]
    InvalidTimestamp(String),

    /// No usable credential could be assembled from the configuration.
    #[error("missing credential: {0}")]
    MissingCredential(String),

    /// A value destined for a header contains characters HTTP does not allow.
    #[error("invalid value for header {0}")]
    InvalidHeaderValue(String),
}

