//! The authentication seam between request building and transport.

use crate::cert::CertAuthenticator;
use crate::error::ApnsError;
use crate::request::ApnsRequest;
use crate::token::TokenAuthenticator;

/// Something that can authenticate an outbound APNs request.
///
/// Implementations hold only immutable credential material, so they must be
/// shareable across threads.
pub trait ApnsAuthenticationProvider: Send + Sync {
    /// Add authentication to `request`: a header, TLS client material, or both.
    ///
    /// # Errors
    ///
    /// Returns an [`ApnsError`] if the credential cannot be rendered onto the
    /// request.
    fn authenticate(&self, request: &mut ApnsRequest) -> Result<(), ApnsError>;
}

/// Either of the two built-in authenticators.
#[derive(Debug)]
pub enum ApnsAuthenticator {
    /// ES256 provider token.
    Token(TokenAuthenticator),
    /// TLS client certificate.
    Cert(CertAuthenticator),
}

impl ApnsAuthenticationProvider for ApnsAuthenticator {
    fn authenticate(&self, request: &mut ApnsRequest) -> Result<(), ApnsError> {
        match self {
            Self::Token(auth) => auth.authenticate(request),
            Self::Cert(auth) => auth.authenticate(request),
        }
    }
}

impl From<TokenAuthenticator> for ApnsAuthenticator {
    fn from(auth: TokenAuthenticator) -> Self {
        Self::Token(auth)
    }
}

impl From<CertAuthenticator> for ApnsAuthenticator {
    fn from(auth: CertAuthenticator) -> Self {
        Self::Cert(auth)
    }
}
