//! Authentication and request building for Apple Push Notification service.
//!
//! APNs accepts two kinds of provider authentication:
//!
//! - [`token::TokenAuthenticator`]: an ES256 provider token signed with the
//!   team's P-256 key, sent as `Authorization: bearer <token>`.
//! - [`cert::CertAuthenticator`]: a TLS client certificate presented during
//!   the handshake.
//!
//! Both implement [`provider::ApnsAuthenticationProvider`], which decorates
//! an [`request::ApnsRequest`] built from [`options::ApnsOptions`].
//! [`config::ApnsConfig`] picks one of them from `APNS_*` settings.

pub mod alert;
pub mod cert;
pub mod config;
pub mod error;
pub mod key;
pub mod options;
pub mod provider;
pub mod request;
pub mod token;

pub use alert::AlertOptions;
pub use cert::{CertAuthenticator, CertCredential};
pub use config::ApnsConfig;
pub use error::ApnsError;
pub use key::EcPrivateKey;
pub use options::{ApnsOptions, PRIORITY_IMMEDIATE, PRIORITY_LOW, PushType};
pub use provider::{ApnsAuthenticationProvider, ApnsAuthenticator};
pub use request::{ApnsEnvironment, ApnsRequest};
pub use token::{TokenAuthenticator, TokenFormat};
