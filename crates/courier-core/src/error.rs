//! Error types for the Courier core.

/// Core error type for Courier infrastructure.
#[derive(Debug, thiserror::Error)]
pub enum CourierError {
    /// The AWS region is empty or contains characters that cannot appear in
    /// a region identifier.
    #[error("invalid AWS region: {0:?} (expected lowercase letters, digits and dashes)")]
    InvalidRegion(String),
}

/// Convenience result type for Courier core operations.
pub type CourierResult<T> = Result<T, CourierError>;
