//! EC private key loading for ES256.
//!
//! Accepted inputs are PEM-encoded P-256 keys in any of the three common
//! containers:
//!
//! - `PRIVATE KEY`: unencrypted PKCS#8 (the `AuthKey_XXXXXXXXXX.p8` files
//!   Apple issues)
//! - `ENCRYPTED PRIVATE KEY`: PKCS#8 protected by a passphrase
//! - `EC PRIVATE KEY`: SEC1
//!
//! Anything else is rejected at load time: RSA, DSA and Ed25519 keys, and EC
//! keys on other curves, with [`ApnsError::UnsupportedKeyType`]; unparseable
//! input with [`ApnsError::InvalidKeyMaterial`].

use std::fmt;

use p256::SecretKey;
use p256::ecdsa::signature::Signer;
use p256::ecdsa::{Signature, SigningKey, VerifyingKey};
use p256::pkcs8::{DecodePrivateKey, EncodePrivateKey};
use pkcs8::{EncryptedPrivateKeyInfo, ObjectIdentifier, PrivateKeyInfo, SecretDocument};
use zeroize::Zeroizing;

use crate::error::ApnsError;

const ID_EC_PUBLIC_KEY: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.2.1");
const SECP256R1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.3.1.7");
const SECP384R1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.132.0.34");
const SECP521R1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.132.0.35");
const RSA_ENCRYPTION: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.1");
const ID_DSA: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10040.4.1");
const ID_ED25519: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.101.112");

const TAG_PKCS8: &str = "PRIVATE KEY";
const TAG_PKCS8_ENCRYPTED: &str = "ENCRYPTED PRIVATE KEY";
const TAG_SEC1: &str = "EC PRIVATE KEY";
const TAG_RSA: &str = "RSA PRIVATE KEY";
const TAG_DSA: &str = "DSA PRIVATE KEY";

/// A parsed P-256 private key.
///
/// The scalar and its PKCS#8 re-encoding are wiped when the key is dropped.
pub struct EcPrivateKey {
    signing_key: SigningKey,
    pkcs8: SecretDocument,
}

impl EcPrivateKey {
    /// Parse a PEM-encoded private key, decrypting it with `passphrase` when
    /// it is an encrypted PKCS#8 key.
    ///
    /// # Errors
    ///
    /// Returns [`ApnsError::UnsupportedKeyType`] for keys that are not P-256
    /// EC keys and [`ApnsError::InvalidKeyMaterial`] for input that cannot be
    /// decoded or decrypted.
    pub fn from_pem(pem_text: &str, passphrase: Option<&str>) -> Result<Self, ApnsError> {
        let block = pem::parse(pem_text)
            .map_err(|e| ApnsError::InvalidKeyMaterial(format!("not a PEM document: {e}")))?;
        let tag = block.tag().to_owned();
        let der = Zeroizing::new(block.into_contents());

        let secret_key = match tag.as_str() {
            TAG_PKCS8 => decode_pkcs8(&der)?,
            TAG_PKCS8_ENCRYPTED => {
                let passphrase = passphrase.filter(|p| !p.is_empty()).ok_or_else(|| {
                    ApnsError::InvalidKeyMaterial(
                        "encrypted private key requires a passphrase".to_owned(),
                    )
                })?;
                let info = EncryptedPrivateKeyInfo::try_from(der.as_slice()).map_err(|e| {
                    ApnsError::InvalidKeyMaterial(format!("malformed encrypted PKCS#8 key: {e}"))
                })?;
                let document = info.decrypt(passphrase).map_err(|e| {
                    ApnsError::InvalidKeyMaterial(format!("failed to decrypt private key: {e}"))
                })?;
                decode_pkcs8(document.as_bytes())?
            }
            TAG_SEC1 => SecretKey::from_sec1_der(&der).map_err(|e| {
                ApnsError::InvalidKeyMaterial(format!("malformed or non-P-256 SEC1 EC key: {e}"))
            })?,
            TAG_RSA => return Err(ApnsError::UnsupportedKeyType("RSA".to_owned())),
            TAG_DSA => return Err(ApnsError::UnsupportedKeyType("DSA".to_owned())),
            other => {
                return Err(ApnsError::InvalidKeyMaterial(format!(
                    "expected a private key, found PEM block {other:?}"
                )));
            }
        };

        let pkcs8 = secret_key.to_pkcs8_der().map_err(|e| {
            ApnsError::InvalidKeyMaterial(format!("cannot re-encode key as PKCS#8: {e}"))
        })?;

        Ok(Self {
            signing_key: SigningKey::from(secret_key),
            pkcs8,
        })
    }

    /// ECDSA-SHA256 signature over `message`, DER-encoded.
    #[must_use]
    pub fn sign_der(&self, message: &[u8]) -> Vec<u8> {
        let signature: Signature = self.signing_key.sign(message);
        signature.to_der().as_bytes().to_vec()
    }

    /// The key as unencrypted PKCS#8 DER, whatever container it was loaded
    /// from.
    #[must_use]
    pub fn pkcs8_der(&self) -> &[u8] {
        self.pkcs8.as_bytes()
    }

    /// The matching public key.
    #[must_use]
    pub fn verifying_key(&self) -> &VerifyingKey {
        self.signing_key.verifying_key()
    }
}

impl fmt::Debug for EcPrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EcPrivateKey")
            .field("curve", &"P-256")
            .finish_non_exhaustive()
    }
}

/// Check the algorithm and curve of a PKCS#8 document, then decode it.
fn decode_pkcs8(der: &[u8]) -> Result<SecretKey, ApnsError> {
    let info = PrivateKeyInfo::try_from(der)
        .map_err(|e| ApnsError::InvalidKeyMaterial(format!("malformed PKCS#8 key: {e}")))?;

    let algorithm = info.algorithm.oid;
    if algorithm != ID_EC_PUBLIC_KEY {
        return Err(ApnsError::UnsupportedKeyType(algorithm_name(algorithm)));
    }

    let curve = info.algorithm.parameters_oid().map_err(|e| {
        ApnsError::InvalidKeyMaterial(format!("EC key without a named curve: {e}"))
    })?;
    if curve != SECP256R1 {
        return Err(ApnsError::UnsupportedKeyType(format!(
            "EC key on curve {}",
            curve_name(curve)
        )));
    }

    SecretKey::from_pkcs8_der(der)
        .map_err(|e| ApnsError::InvalidKeyMaterial(format!("malformed P-256 key: {e}")))
}

fn algorithm_name(oid: ObjectIdentifier) -> String {
    if oid == RSA_ENCRYPTION {
        "RSA".to_owned()
    } else if oid == ID_DSA {
        "DSA".to_owned()
    } else if oid == ID_ED25519 {
        "Ed25519".to_owned()
    } else {
        format!("algorithm {oid}")
    }
}

fn curve_name(oid: ObjectIdentifier) -> String {
    if oid == SECP384R1 {
        "P-384".to_owned()
    } else if oid == SECP521R1 {
        "P-521".to_owned()
    } else {
        oid.to_string()
    }
}
