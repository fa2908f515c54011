//! Key and hash algorithm names.
//!
//! These enums map strings found in configuration or on the command line to
//! the algorithms this crate understands. Parsing is fallible: an unknown name
//! is an error, never a panic.

use std::fmt;
use std::str::FromStr;

use crate::codesign::constants::{RSA_SHA256_OID, RSA_SHA512_OID};
use crate::codesign::der::oid_to_string;
use crate::Error;

/// Hash function applied to the signed bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashAlgorithm {
    Sha256,
    Sha512,
}

impl HashAlgorithm {
    pub fn name(&self) -> &'static str {
        match self {
            HashAlgorithm::Sha256 => "SHA256",
            HashAlgorithm::Sha512 => "SHA512",
        }
    }

    /// Digest `data` with this algorithm.
    pub fn digest(&self, data: &[u8]) -> Vec<u8> {
        use sha2::{Digest, Sha256, Sha512};

        match self {
            HashAlgorithm::Sha256 => Sha256::digest(data).to_vec(),
            HashAlgorithm::Sha512 => Sha512::digest(data).to_vec(),
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HashAlgorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().replace('-', "").as_str() {
            "SHA256" => Ok(HashAlgorithm::Sha256),
            "SHA512" => Ok(HashAlgorithm::Sha512),
            _ => Err(Error::UnsupportedHashAlgorithm(s.to_string())),
        }
    }
}

/// Public key algorithm of a signing identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyAlgorithm {
    Rsa,
    RsaPss,
    Ec,
    Dsa,
}

impl KeyAlgorithm {
    pub fn name(&self) -> &'static str {
        match self {
            KeyAlgorithm::Rsa => "RSA",
            KeyAlgorithm::RsaPss => "RSAPSS",
            KeyAlgorithm::Ec => "EC",
            KeyAlgorithm::Dsa => "DSA",
        }
    }
}

impl fmt::Display for KeyAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for KeyAlgorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "RSA" => Ok(KeyAlgorithm::Rsa),
            "RSAPSS" | "RSA-PSS" => Ok(KeyAlgorithm::RsaPss),
            "EC" | "ECDSA" => Ok(KeyAlgorithm::Ec),
            "DSA" => Ok(KeyAlgorithm::Dsa),
            _ => Err(Error::UnsupportedKeyAlgorithm(s.to_string())),
        }
    }
}

/// A signature algorithm a boot signature may name.
///
/// Only RSA with SHA-256 or SHA-512 exists; anything else is rejected when
/// resolving an algorithm identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignatureAlgorithm {
    RsaSha256,
    RsaSha512,
}

impl SignatureAlgorithm {
    /// Resolve the algorithm named by OBJECT IDENTIFIER content bytes.
    pub fn from_oid(oid: &[u8]) -> crate::Result<Self> {
        if oid == RSA_SHA256_OID {
            Ok(SignatureAlgorithm::RsaSha256)
        } else if oid == RSA_SHA512_OID {
            Ok(SignatureAlgorithm::RsaSha512)
        } else {
            Err(Error::UnsupportedAlgorithm(oid_to_string(oid)))
        }
    }

    /// RSA signature algorithm using the given hash.
    pub fn for_hash(hash: HashAlgorithm) -> Self {
        match hash {
            HashAlgorithm::Sha256 => SignatureAlgorithm::RsaSha256,
            HashAlgorithm::Sha512 => SignatureAlgorithm::RsaSha512,
        }
    }

    pub fn oid(&self) -> &'static [u8] {
        match self {
            SignatureAlgorithm::RsaSha256 => RSA_SHA256_OID,
            SignatureAlgorithm::RsaSha512 => RSA_SHA512_OID,
        }
    }

    pub fn hash(&self) -> HashAlgorithm {
        match self {
            SignatureAlgorithm::RsaSha256 => HashAlgorithm::Sha256,
            SignatureAlgorithm::RsaSha512 => HashAlgorithm::Sha512,
        }
    }
}

impl fmt::Display for SignatureAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignatureAlgorithm::RsaSha256 => f.write_str("sha256WithRSAEncryption"),
            SignatureAlgorithm::RsaSha512 => f.write_str("sha512WithRSAEncryption"),
        }
    }
}
