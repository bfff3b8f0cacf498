//! Request signing for Amazon SES.
//!
//! Two schemes are supported:
//!
//! - [`sigv4::Sigv4Signer`]: AWS Signature Version 4 over the canonical
//!   request (`Content-Type` in API mode, `Host`, `X-Amz-Date`, and the
//!   session token when present).
//! - [`aws3::Aws3Signer`]: the legacy `AWS3-HTTPS` scheme, an HMAC over the
//!   request date only.
//!
//! Both take a [`credentials::Credential`] and a caller-owned
//! [`courier_core::RequestDescriptor`] and return the headers to merge. The
//! descriptor is never mutated and no state is shared between calls, so
//! signers can be used from any number of threads at once.

pub mod aws3;
pub mod canonical;
pub mod config;
pub mod credentials;
pub mod error;
pub mod request;
pub mod sigv4;

pub use aws3::Aws3Signer;
pub use config::SesConfig;
pub use credentials::{ApiKeyCredential, BasicCredential, Credential};
pub use error::SigningError;
pub use request::{SendEmailParams, SesRequest, SesRequestMode, endpoint_host};
pub use sigv4::{Sigv4Signer, SigningContext};
