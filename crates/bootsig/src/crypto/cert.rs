//! Certificate and private key handling for boot image signing.
//!
//! This module loads an RSA signing identity from PEM or DER encoded
//! certificate and private key material, and extracts RSA public keys from
//! certificates embedded in boot signatures.
//!
//! # Supported Formats
//!
//! - **Certificate**: X.509 in PEM or DER form
//! - **Private key**: unencrypted PKCS#8 (PEM or DER) or PKCS#1 PEM
//!
//! # Examples
//!
//! ```no_run
//! use bootsig::{HashAlgorithm, RsaSigningIdentity};
//!
//! let cert_pem = std::fs::read("releasekey.x509.pem")?;
//! let key_pem = std::fs::read("releasekey.pk8.pem")?;
//! let identity = RsaSigningIdentity::from_pem(&cert_pem, &key_pem, HashAlgorithm::Sha256)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use p256::ecdsa::SigningKey as EcdsaSigningKey;
use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey};
use rsa::{Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey};
use sha2::{Sha256, Sha512};
use x509_certificate::{CapturedX509Certificate, KeyAlgorithm as X509KeyAlgorithm};

use super::identity::SigningIdentity;
use crate::{Error, HashAlgorithm, KeyAlgorithm, Result};

/// Parse a DER certificate, keeping its original encoding.
pub fn parse_certificate(der: &[u8]) -> Result<CapturedX509Certificate> {
    CapturedX509Certificate::from_der(der.to_vec())
        .map_err(|e| Error::Certificate(e.to_string()))
}

/// Parse a certificate given in either PEM or DER form.
pub fn parse_certificate_any(data: &[u8]) -> Result<CapturedX509Certificate> {
    if data.starts_with(b"-----BEGIN") {
        CapturedX509Certificate::from_pem(data).map_err(|e| Error::Certificate(e.to_string()))
    } else {
        parse_certificate(data)
    }
}

/// Extract the RSA public key of a certificate.
///
/// # Errors
///
/// Returns [`Error::UnsupportedPublicKeyAlgorithm`] if the certificate key is
/// not RSA, and [`Error::Certificate`] if the key bits cannot be decoded.
pub fn rsa_public_key(cert: &CapturedX509Certificate) -> Result<RsaPublicKey> {
    match cert.key_algorithm() {
        Some(X509KeyAlgorithm::Rsa) => {}
        Some(other) => return Err(Error::UnsupportedPublicKeyAlgorithm(format!("{:?}", other))),
        None => {
            return Err(Error::UnsupportedPublicKeyAlgorithm(
                "unrecognized key algorithm".into(),
            ))
        }
    }

    RsaPublicKey::from_pkcs1_der(&cert.public_key_data())
        .map_err(|e| Error::Certificate(format!("Invalid RSA public key: {}", e)))
}

/// PKCS#1 v1.5 padding scheme carrying the DigestInfo prefix for `hash`.
pub fn pkcs1v15(hash: HashAlgorithm) -> Pkcs1v15Sign {
    match hash {
        HashAlgorithm::Sha256 => Pkcs1v15Sign::new::<Sha256>(),
        HashAlgorithm::Sha512 => Pkcs1v15Sign::new::<Sha512>(),
    }
}

/// An RSA private key and certificate held in memory.
///
/// Signs with RSA PKCS#1 v1.5 over SHA-256 or SHA-512.
///
/// # Security
///
/// There is no `Debug` implementation, so the RSA key never reaches log
/// output. The key is held unencrypted until the identity is dropped.
pub struct RsaSigningIdentity {
    certificate: CapturedX509Certificate,
    signing_key: RsaPrivateKey,
    hash: HashAlgorithm,
    resolved: bool,
}

impl RsaSigningIdentity {
    /// Load an identity from a PEM certificate and a PEM private key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Certificate`] if either PEM is malformed, and
    /// [`Error::UnsupportedKeyAlgorithm`] if the key is a valid ECDSA key.
    pub fn from_pem(cert_pem: &[u8], key_pem: &[u8], hash: HashAlgorithm) -> Result<Self> {
        use pkcs8::DecodePrivateKey;

        let certificate = CapturedX509Certificate::from_pem(cert_pem)
            .map_err(|e| Error::Certificate(format!("Failed to parse certificate PEM: {}", e)))?;

        let key_str = std::str::from_utf8(key_pem)
            .map_err(|e| Error::Certificate(format!("Invalid UTF-8 in key PEM: {}", e)))?;

        let signing_key = if let Ok(rsa_key) = RsaPrivateKey::from_pkcs8_pem(key_str) {
            rsa_key
        } else if let Ok(rsa_key) = RsaPrivateKey::from_pkcs1_pem(key_str) {
            rsa_key
        } else if EcdsaSigningKey::from_pkcs8_pem(key_str).is_ok() {
            return Err(Error::UnsupportedKeyAlgorithm(KeyAlgorithm::Ec.to_string()));
        } else {
            return Err(Error::Certificate("Failed to parse private key as RSA".into()));
        };

        Ok(Self::new(certificate, signing_key, hash))
    }

    /// Load an identity from a DER certificate and a PKCS#8 DER private key.
    pub fn from_der(cert_der: &[u8], key_der: &[u8], hash: HashAlgorithm) -> Result<Self> {
        use pkcs8::DecodePrivateKey;

        let certificate = parse_certificate(cert_der)?;

        let signing_key = match RsaPrivateKey::from_pkcs8_der(key_der) {
            Ok(key) => key,
            Err(_) if EcdsaSigningKey::from_pkcs8_der(key_der).is_ok() => {
                return Err(Error::UnsupportedKeyAlgorithm(KeyAlgorithm::Ec.to_string()));
            }
            Err(e) => {
                return Err(Error::Certificate(format!(
                    "Failed to parse private key DER: {}",
                    e
                )))
            }
        };

        Ok(Self::new(certificate, signing_key, hash))
    }

    /// Build an identity from already parsed parts.
    pub fn new(
        certificate: CapturedX509Certificate,
        signing_key: RsaPrivateKey,
        hash: HashAlgorithm,
    ) -> Self {
        Self {
            certificate,
            signing_key,
            hash,
            resolved: false,
        }
    }

    /// Change the hash algorithm used for new signatures.
    pub fn with_hash(mut self, hash: HashAlgorithm) -> Self {
        self.hash = hash;
        self
    }

    pub fn certificate(&self) -> &CapturedX509Certificate {
        &self.certificate
    }

    pub fn key_algorithm(&self) -> KeyAlgorithm {
        KeyAlgorithm::Rsa
    }

    /// Validate that the private key matches the certificate's public key
    fn validate_key_pair(&self) -> Result<()> {
        let cert_public_key = rsa_public_key(&self.certificate)?;

        if self.signing_key.to_public_key() != cert_public_key {
            return Err(Error::Certificate(
                "Private key does not match certificate public key".into(),
            ));
        }

        Ok(())
    }
}

impl SigningIdentity for RsaSigningIdentity {
    fn resolve(&mut self) -> Result<()> {
        if !self.resolved {
            self.validate_key_pair()?;
            self.resolved = true;
        }
        Ok(())
    }

    fn certificate_der(&self) -> &[u8] {
        self.certificate.constructed_data()
    }

    fn hash_algorithm(&self) -> HashAlgorithm {
        self.hash
    }

    fn sign(&self, data: &[u8], hash: HashAlgorithm) -> Result<Vec<u8>> {
        if !self.resolved {
            return Err(Error::Signing("signing identity has not been resolved".into()));
        }

        let digest = hash.digest(data);

        self.signing_key
            .sign(pkcs1v15(hash), &digest)
            .map_err(|e| Error::Signing(format!("RSA signing failed: {}", e)))
    }
}
