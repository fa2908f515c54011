//! Android Verified Boot 1.0 boot image signatures.
//!
//! Computes the signable prefix of an Android boot image from its header,
//! appends a DER boot signature to it, and verifies such signatures,
//! optionally pinning the expected signer certificate.

pub mod algorithms;
pub mod codesign;
pub mod crypto;
pub mod error;
pub mod image;

pub use algorithms::{HashAlgorithm, KeyAlgorithm, SignatureAlgorithm};
pub use codesign::{AlgorithmIdentifier, AuthenticatedAttributes, BootSignature, VerifiedSignature};
pub use crypto::{RsaSigningIdentity, SigningIdentity};
pub use error::Error;
pub use image::{compute_signable_length, BootImage, BootImageHeader};

pub type Result<T> = std::result::Result<T, Error>;
