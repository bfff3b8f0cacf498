//! Error types for APNs authentication.

use std::path::PathBuf;

/// Errors raised while loading APNs credentials or building APNs requests.
///
/// Key and certificate errors surface at construction, so a bad credential
/// fails before the first notification is sent.
#[derive(Debug, thiserror::Error)]
pub enum ApnsError {
    /// The private key could not be read, decoded, or decrypted.
    #[error("invalid APNs private key: {0}")]
    InvalidKeyMaterial(String),

    /// The private key parsed but is not a P-256 EC key.
    #[error("unsupported APNs private key type: {0} (ES256 requires an EC P-256 key)")]
    UnsupportedKeyType(String),

    /// The client certificate path does not name a readable file.
    #[error("certificate file not found at path {}", .0.display())]
    CertificateNotFound(PathBuf),

    /// Priority other than 5 or 10.
    #[error("invalid APNs priority {0}: must be 5 (low) or 10 (immediate)")]
    InvalidPriority(u8),

    /// Neither token nor certificate settings are complete.
    #[error("unsupported APNs authentication settings: {0}")]
    UnsupportedAuthSettings(String),

    /// A value destined for a header contains characters HTTP does not allow.
    #[error("invalid value for header {0}")]
    InvalidHeaderValue(String),

    /// The compact provider token could not be signed.
    #[error("failed to sign APNs provider token: {0}")]
    TokenSigning(#[from] jsonwebtoken::errors::Error),

    /// JSON encoding of a token segment or payload failed.
    #[error("failed to serialize APNs JSON: {0}")]
    Serialization(#[from] serde_json::Error),
}
