//! TLS client-certificate authentication.
//!
//! Nothing is signed here: the authenticator checks the certificate file once
//! and then hands its path and passphrase to whatever TLS stack sends the
//! request.

use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};

use tracing::debug;
use zeroize::Zeroizing;

use crate::error::ApnsError;
use crate::provider::ApnsAuthenticationProvider;
use crate::request::ApnsRequest;

/// Client certificate location and passphrase, for the HTTP client's TLS layer.
#[derive(Clone)]
pub struct CertCredential {
    certificate_path: PathBuf,
    passphrase: Option<Zeroizing<String>>,
}

impl CertCredential {
    /// Path of the certificate (PEM, optionally bundling the private key).
    #[must_use]
    pub fn certificate_path(&self) -> &Path {
        &self.certificate_path
    }

    /// Passphrase protecting the certificate's private key, if any.
    #[must_use]
    pub fn passphrase(&self) -> Option<&str> {
        self.passphrase.as_deref().map(String::as_str)
    }
}

impl fmt::Debug for CertCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CertCredential")
            .field("certificate_path", &self.certificate_path)
            .field("passphrase", &self.passphrase.as_ref().map(|_| "***"))
            .finish()
    }
}

/// Attaches a client certificate to APNs requests.
///
/// # Examples
///
/// ```no_run
/// use courier_apns_auth::{ApnsAuthenticationProvider, ApnsEnvironment, ApnsRequest, CertAuthenticator};
///
/// let auth = CertAuthenticator::new("/etc/apns/push.pem", Some("secret")).unwrap();
/// let mut request = ApnsRequest::new(ApnsEnvironment::Production, http::Method::POST, "/3/device/abc");
/// auth.authenticate(&mut request).unwrap();
/// assert!(request.tls.is_some());
/// ```
#[derive(Debug, Clone)]
pub struct CertAuthenticator {
    credential: CertCredential,
}

impl CertAuthenticator {
    /// Create an authenticator for the certificate at `certificate_path`.
    ///
    /// This is the only place the filesystem is touched.
    ///
    /// # Errors
    ///
    /// Returns [`ApnsError::CertificateNotFound`] unless the path names a
    /// regular file that can be opened for reading.
    pub fn new(
        certificate_path: impl Into<PathBuf>,
        passphrase: Option<&str>,
    ) -> Result<Self, ApnsError> {
        let certificate_path = certificate_path.into();
        if !certificate_path.is_file() || File::open(&certificate_path).is_err() {
            return Err(ApnsError::CertificateNotFound(certificate_path));
        }

        debug!(path = %certificate_path.display(), "Loaded APNs client certificate");

        Ok(Self {
            credential: CertCredential {
                certificate_path,
                passphrase: passphrase.map(|p| Zeroizing::new(p.to_owned())),
            },
        })
    }

    /// The certificate handed to the TLS layer.
    #[must_use]
    pub fn credential(&self) -> &CertCredential {
        &self.credential
    }
}

impl ApnsAuthenticationProvider for CertAuthenticator {
    fn authenticate(&self, request: &mut ApnsRequest) -> Result<(), ApnsError> {
        request.tls = Some(self.credential.clone());
        Ok(())
    }
}
