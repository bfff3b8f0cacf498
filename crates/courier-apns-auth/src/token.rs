//! ES256 provider-token authentication.
//!
//! A provider token binds a key id (`kid`) and a team id (`iss`) to an issue
//! time (`iat`), signed with the team's P-256 key. Two token layouts are
//! available, see [`TokenFormat`].

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use http::HeaderValue;
use http::header::AUTHORIZATION;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tracing::debug;
use zeroize::Zeroizing;

use crate::error::ApnsError;
use crate::key::EcPrivateKey;
use crate::provider::ApnsAuthenticationProvider;
use crate::request::ApnsRequest;

/// JOSE algorithm name.
pub const ALGORITHM: &str = "ES256";

/// How the signed token is laid out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenFormat {
    /// `base64url(sig(header_segment)).base64url(sig(claims_segment))`: the
    /// header segment and the claims segment are each signed on their own and
    /// only the two DER signatures are sent.
    #[default]
    Split,
    /// Standard JWS compact serialization:
    /// `header_segment.claims_segment.base64url(r || s)`, with one signature
    /// over `header_segment.claims_segment`, produced by `jsonwebtoken`.
    Compact,
}

impl TokenFormat {
    /// Lowercase name, as accepted by `APNS_TOKEN_FORMAT`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Split => "split",
            Self::Compact => "compact",
        }
    }
}

impl fmt::Display for TokenFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TokenFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "split" => Ok(Self::Split),
            "compact" | "jws" => Ok(Self::Compact),
            other => Err(format!("unknown APNs token format: {other:?}")),
        }
    }
}

/// JOSE header.
#[derive(Debug, Serialize)]
struct JwtHeader<'a> {
    alg: &'static str,
    kid: &'a str,
}

/// Token claims.
#[derive(Debug, Serialize)]
struct JwtClaims<'a> {
    iss: &'a str,
    iat: i64,
}

/// Issues ES256 provider tokens and sets `Authorization: bearer <token>`.
///
/// The key is parsed and validated once, at construction, and wiped when the
/// authenticator is dropped. Signing only reads it, so one authenticator can
/// serve any number of threads.
pub struct TokenAuthenticator {
    key_id: String,
    team_id: String,
    key: EcPrivateKey,
    encoding_key: EncodingKey,
    format: TokenFormat,
}

impl TokenAuthenticator {
    /// Create an authenticator from PEM key text.
    ///
    /// `passphrase` is only consulted for encrypted PKCS#8 keys.
    ///
    /// # Errors
    ///
    /// Returns [`ApnsError::InvalidKeyMaterial`] if the key cannot be parsed
    /// and [`ApnsError::UnsupportedKeyType`] if it is not a P-256 EC key.
    pub fn new(
        key_id: impl Into<String>,
        team_id: impl Into<String>,
        private_key: &str,
        passphrase: Option<&str>,
    ) -> Result<Self, ApnsError> {
        let key = EcPrivateKey::from_pem(private_key, passphrase)?;
        let encoding_key = EncodingKey::from_ec_der(key.pkcs8_der());
        let authenticator = Self {
            key_id: key_id.into(),
            team_id: team_id.into(),
            key,
            encoding_key,
            format: TokenFormat::default(),
        };

        debug!(
            key_id = %authenticator.key_id,
            team_id = %authenticator.team_id,
            "Loaded APNs signing key"
        );

        Ok(authenticator)
    }

    /// Create an authenticator from a key file such as `AuthKey_<kid>.p8`.
    ///
    /// # Errors
    ///
    /// Returns [`ApnsError::InvalidKeyMaterial`] if the file cannot be read,
    /// plus every error of [`TokenAuthenticator::new`].
    pub fn from_file(
        key_id: impl Into<String>,
        team_id: impl Into<String>,
        path: impl AsRef<Path>,
        passphrase: Option<&str>,
    ) -> Result<Self, ApnsError> {
        let path = path.as_ref();
        let pem = Zeroizing::new(std::fs::read_to_string(path).map_err(|e| {
            ApnsError::InvalidKeyMaterial(format!(
                "cannot read private key {}: {e}",
                path.display()
            ))
        })?);
        Self::new(key_id, team_id, &pem, passphrase)
    }

    /// Select the token layout.
    #[must_use]
    pub fn with_format(mut self, format: TokenFormat) -> Self {
        self.format = format;
        self
    }

    /// The key id (`kid`).
    #[must_use]
    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    /// The team id (`iss`).
    #[must_use]
    pub fn team_id(&self) -> &str {
        &self.team_id
    }

    /// The token layout.
    #[must_use]
    pub fn format(&self) -> TokenFormat {
        self.format
    }

    /// The signing key.
    #[must_use]
    pub fn key(&self) -> &EcPrivateKey {
        &self.key
    }

    /// Issue a token stamped with the current time.
    ///
    /// Tokens carry no expiry of their own; how often to mint a new one is
    /// up to the caller.
    ///
    /// # Errors
    ///
    /// Returns [`ApnsError::Serialization`] if a JSON segment cannot be encoded
    /// and [`ApnsError::TokenSigning`] if a compact token cannot be signed.
    pub fn sign(&self) -> Result<String, ApnsError> {
        self.sign_at(Utc::now())
    }

    /// Issue a token stamped with `issued_at`.
    ///
    /// Split tokens use RFC 6979 nonces, so the same key, ids, and instant
    /// always produce the same token. Compact tokens use random nonces.
    ///
    /// # Errors
    ///
    /// Returns [`ApnsError::Serialization`] if a JSON segment cannot be encoded
    /// and [`ApnsError::TokenSigning`] if a compact token cannot be signed.
    pub fn sign_at(&self, issued_at: DateTime<Utc>) -> Result<String, ApnsError> {
        let claims = JwtClaims {
            iss: &self.team_id,
            iat: issued_at.timestamp(),
        };

        let token = match self.format {
            TokenFormat::Split => {
                let header_segment = encode_segment(&JwtHeader {
                    alg: ALGORITHM,
                    kid: &self.key_id,
                })?;
                let claims_segment = encode_segment(&claims)?;
                let header_signature = self.key.sign_der(header_segment.as_bytes());
                let claims_signature = self.key.sign_der(claims_segment.as_bytes());
                format!(
                    "{}.{}",
                    URL_SAFE_NO_PAD.encode(header_signature),
                    URL_SAFE_NO_PAD.encode(claims_signature)
                )
            }
            TokenFormat::Compact => {
                let header = Header {
                    typ: None,
                    alg: Algorithm::ES256,
                    kid: Some(self.key_id.clone()),
                    ..Default::default()
                };
                jsonwebtoken::encode(&header, &claims, &self.encoding_key)?
            }
        };

        debug!(
            key_id = %self.key_id,
            format = %self.format,
            iat = issued_at.timestamp(),
            "Issued APNs provider token"
        );

        Ok(token)
    }
}

impl ApnsAuthenticationProvider for TokenAuthenticator {
    fn authenticate(&self, request: &mut ApnsRequest) -> Result<(), ApnsError> {
        let token = self.sign()?;
        let value = HeaderValue::from_str(&format!("bearer {token}"))
            .map_err(|_| ApnsError::InvalidHeaderValue(AUTHORIZATION.to_string()))?;
        request.headers.insert(AUTHORIZATION, value);
        Ok(())
    }
}

impl fmt::Debug for TokenAuthenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenAuthenticator")
            .field("key_id", &self.key_id)
            .field("team_id", &self.team_id)
            .field("format", &self.format)
            .finish_non_exhaustive()
    }
}

fn encode_segment<T: Serialize>(value: &T) -> Result<String, ApnsError> {
    Ok(URL_SAFE_NO_PAD.encode(serde_json::to_vec(value)?))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use http::Method;
    use p256::ecdsa::signature::Verifier;
    use p256::ecdsa::{DerSignature, Signature};

    use super::*;
    use crate::request::ApnsEnvironment;

    const PKCS8: &str = include_str!(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/tests/fixtures/AuthKey_TEST.p8"
    ));
    const RSA_PKCS8: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/rsa.pem"));

    // {"alg":"ES256","kid":"ABC123DEFG"}
    const HEADER_SEGMENT: &str = "eyJhbGciOiJFUzI1NiIsImtpZCI6IkFCQzEyM0RFRkcifQ";
    // {"iss":"DEF123GHIJ","iat":1420070400}
    const CLAIMS_SEGMENT: &str = "eyJpc3MiOiJERUYxMjNHSElKIiwiaWF0IjoxNDIwMDcwNDAwfQ";

    fn authenticator() -> TokenAuthenticator {
        TokenAuthenticator::new("ABC123DEFG", "DEF123GHIJ", PKCS8, None).unwrap()
    }

    fn issued_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2015, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_should_encode_header_and_claims_segments() {
        let header = encode_segment(&JwtHeader {
            alg: ALGORITHM,
            kid: "ABC123DEFG",
        })
        .unwrap();
        let claims = encode_segment(&JwtClaims {
            iss: "DEF123GHIJ",
            iat: issued_at().timestamp(),
        })
        .unwrap();
        assert_eq!(header, HEADER_SEGMENT);
        assert_eq!(claims, CLAIMS_SEGMENT);
    }

    #[test]
    fn test_should_sign_segments_independently_in_split_format() {
        let auth = authenticator();
        let token = auth.sign_at(issued_at()).unwrap();

        let (header_part, claims_part) = token.split_once('.').unwrap();
        assert!(!claims_part.contains('.'));

        let header_der = URL_SAFE_NO_PAD.decode(header_part).unwrap();
        let claims_der = URL_SAFE_NO_PAD.decode(claims_part).unwrap();
        let header_sig = DerSignature::try_from(header_der.as_slice()).unwrap();
        let claims_sig = DerSignature::try_from(claims_der.as_slice()).unwrap();

        let verifying_key = auth.key().verifying_key();
        assert!(verifying_key.verify(HEADER_SEGMENT.as_bytes(), &header_sig).is_ok());
        assert!(verifying_key.verify(CLAIMS_SEGMENT.as_bytes(), &claims_sig).is_ok());
        assert!(verifying_key.verify(CLAIMS_SEGMENT.as_bytes(), &header_sig).is_err());
    }

    #[test]
    fn test_should_emit_standard_jws_in_compact_format() {
        let auth = authenticator().with_format(TokenFormat::Compact);
        let token = auth.sign_at(issued_at()).unwrap();

        let parts: Vec<&str> = token.split('.').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], HEADER_SEGMENT);
        assert_eq!(parts[1], CLAIMS_SEGMENT);

        let raw = URL_SAFE_NO_PAD.decode(parts[2]).unwrap();
        assert_eq!(raw.len(), 64);
        let signature = Signature::from_slice(&raw).unwrap();
        let signing_input = format!("{}.{}", parts[0], parts[1]);
        assert!(
            auth.key()
                .verifying_key()
                .verify(signing_input.as_bytes(), &signature)
                .is_ok()
        );
    }

    #[test]
    fn test_should_sign_compact_token_with_encrypted_key() {
        let encrypted = include_str!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/tests/fixtures/encrypted.p8"
        ));
        let auth = TokenAuthenticator::new("ABC123DEFG", "DEF123GHIJ", encrypted, Some("correct-horse"))
            .unwrap()
            .with_format(TokenFormat::Compact);
        let token = auth.sign_at(issued_at()).unwrap();

        let (signing_input, signature) = token.rsplit_once('.').unwrap();
        let raw = URL_SAFE_NO_PAD.decode(signature).unwrap();
        let signature = Signature::from_slice(&raw).unwrap();
        assert!(
            authenticator()
                .key()
                .verifying_key()
                .verify(signing_input.as_bytes(), &signature)
                .is_ok()
        );
    }

    #[test]
    fn test_should_be_deterministic_for_same_instant() {
        let auth = authenticator();
        assert_eq!(
            auth.sign_at(issued_at()).unwrap(),
            auth.sign_at(issued_at()).unwrap()
        );
        assert_ne!(
            auth.sign_at(issued_at()).unwrap(),
            auth.sign_at(issued_at() + chrono::Duration::seconds(1)).unwrap()
        );
    }

    #[test]
    fn test_should_reject_non_ec_key_at_construction() {
        assert!(matches!(
            TokenAuthenticator::new("kid", "team", RSA_PKCS8, None),
            Err(ApnsError::UnsupportedKeyType(_))
        ));
    }

    #[test]
    fn test_should_report_unreadable_key_file() {
        let result = TokenAuthenticator::from_file("kid", "team", "/nonexistent/AuthKey.p8", None);
        assert!(matches!(result, Err(ApnsError::InvalidKeyMaterial(_))));
    }

    #[test]
    fn test_should_load_key_from_file() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/AuthKey_TEST.p8");
        let auth = TokenAuthenticator::from_file("kid", "team", path, None).unwrap();
        assert_eq!(auth.key_id(), "kid");
        assert_eq!(auth.team_id(), "team");
        assert_eq!(auth.format(), TokenFormat::Split);
    }

    #[test]
    fn test_should_set_bearer_authorization() {
        let mut request = ApnsRequest::new(ApnsEnvironment::Development, Method::POST, "/3/device/abc");
        authenticator().authenticate(&mut request).unwrap();

        let value = request.headers[AUTHORIZATION].to_str().unwrap();
        let token = value.strip_prefix("bearer ").unwrap();
        assert_eq!(token.split('.').count(), 2);
    }

    #[test]
    fn test_should_parse_token_format() {
        assert_eq!("split".parse::<TokenFormat>(), Ok(TokenFormat::Split));
        assert_eq!("Compact".parse::<TokenFormat>(), Ok(TokenFormat::Compact));
        assert!("jwt2".parse::<TokenFormat>().is_err());
    }

    #[test]
    fn test_should_not_leak_key_in_debug_output() {
        let rendered = format!("{:?}", authenticator());
        assert!(rendered.contains("ABC123DEFG"));
        assert!(!rendered.contains("BEGIN"));
    }
}
