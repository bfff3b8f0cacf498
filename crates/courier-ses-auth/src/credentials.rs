//! Credentials accepted by the SES signers.
//!
//! A [`Credential`] is a closed sum type: either an AWS access key pair
//! (optionally with an STS session token) or an SES SMTP-style
//! username/password pair. Signers match on it exhaustively, so adding a
//! variant is a compile error in every signer until it is handled.

use std::fmt;

use zeroize::Zeroizing;

/// An access-key/secret-key pair with an optional session token.
#[derive(Clone)]
pub struct ApiKeyCredential {
    access_key: String,
    secret_key: Zeroizing<String>,
    session_token: Option<Zeroizing<String>>,
}

impl ApiKeyCredential {
    /// Create a long-term API key credential.
    pub fn new(access_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            access_key: access_key.into(),
            secret_key: Zeroizing::new(secret_key.into()),
            session_token: None,
        }
    }

    /// Attach an STS session token.
    #[must_use]
    pub fn with_session_token(mut self, token: impl Into<String>) -> Self {
        self.session_token = Some(Zeroizing::new(token.into()));
        self
    }

    /// The access key ID.
    #[must_use]
    pub fn access_key(&self) -> &str {
        &self.access_key
    }

    /// The secret access key.
    #[must_use]
    pub fn secret_key(&self) -> &str {
        &self.secret_key
    }

    /// The session token, if any.
    #[must_use]
    pub fn session_token(&self) -> Option<&str> {
        self.session_token.as_deref().map(String::as_str)
    }
}

impl fmt::Debug for ApiKeyCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiKeyCredential")
            .field("access_key", &self.access_key)
            .field("secret_key", &"***")
            .field("session_token", &self.session_token.as_ref().map(|_| "***"))
            .finish()
    }
}

/// A username/password pair (SES SMTP credentials).
#[derive(Clone)]
pub struct BasicCredential {
    username: String,
    password: Zeroizing<String>,
}

impl BasicCredential {
    /// Create a username/password credential.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: Zeroizing::new(password.into()),
        }
    }

    /// The username.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// The password.
    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for BasicCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicCredential")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// A credential for signing SES requests.
///
/// # Examples
///
/// ```
/// use courier_ses_auth::credentials::{ApiKeyCredential, BasicCredential, Credential};
///
/// let api = Credential::from(ApiKeyCredential::new("AKIDEXAMPLE", "secret"));
/// assert_eq!(api.identity(), "AKIDEXAMPLE");
///
/// let basic = Credential::from(BasicCredential::new("smtp-user", "smtp-password"));
/// assert_eq!(basic.secret(), "smtp-password");
/// assert_eq!(basic.session_token(), None);
/// ```
#[derive(Debug, Clone)]
pub enum Credential {
    /// Access key, secret key, optional session token.
    ApiKey(ApiKeyCredential),
    /// Username and password.
    Basic(BasicCredential),
}

impl Credential {
    /// The identity placed in `Credential=` / `AWSAccessKeyId=`: the access
    /// key for API keys, the username for basic credentials.
    #[must_use]
    pub fn identity(&self) -> &str {
        match self {
            Self::ApiKey(c) => c.access_key(),
            Self::Basic(c) => c.username(),
        }
    }

    /// The secret that seeds the HMAC chain: secret key or password.
    #[must_use]
    pub fn secret(&self) -> &str {
        match self {
            Self::ApiKey(c) => c.secret_key(),
            Self::Basic(c) => c.password(),
        }
    }

    /// The session token. Only API key credentials can carry one.
    #[must_use]
    pub fn session_token(&self) -> Option<&str> {
        match self {
            Self::ApiKey(c) => c.session_token(),
            Self::Basic(_) => None,
        }
    }

    /// Short name of the variant, as used by `SES_CREDENTIAL_KIND`.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ApiKey(_) => "api",
            Self::Basic(_) => "basic",
        }
    }
}

impl From<ApiKeyCredential> for Credential {
    fn from(c: ApiKeyCredential) -> Self {
        Self::ApiKey(c)
    }
}

impl From<BasicCredential> for Credential {
    fn from(c: BasicCredential) -> Self {
        Self::Basic(c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_expose_api_key_parts() {
        let credential: Credential = ApiKeyCredential::new("AKID", "secret")
            .with_session_token("token")
            .into();
        assert_eq!(credential.identity(), "AKID");
        assert_eq!(credential.secret(), "secret");
        assert_eq!(credential.session_token(), Some("token"));
        assert_eq!(credential.kind(), "api");
    }

    #[test]
    fn test_should_expose_basic_parts() {
        let credential: Credential = BasicCredential::new("user", "pass").into();
        assert_eq!(credential.identity(), "user");
        assert_eq!(credential.secret(), "pass");
        assert_eq!(credential.session_token(), None);
        assert_eq!(credential.kind(), "basic");
    }

    #[test]
    fn test_should_redact_secrets_in_debug_output() {
        let api: Credential = ApiKeyCredential::new("AKID", "super-secret")
            .with_session_token("session-secret")
            .into();
        let basic: Credential = BasicCredential::new("user", "hunter2").into();

        let rendered = format!("{api:?} {basic:?}");
        assert!(rendered.contains("AKID"));
        assert!(rendered.contains("user"));
        assert!(!rendered.contains("super-secret"));
        assert!(!rendered.contains("session-secret"));
        assert!(!rendered.contains("hunter2"));
    }
}
