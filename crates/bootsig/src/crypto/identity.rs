//! The signing identity seam.
//!
//! Key management lives outside this crate. Anything that can hand over a
//! DER certificate and produce a signature over a byte string can sign boot
//! images by implementing [`SigningIdentity`]. [`super::RsaSigningIdentity`]
//! is the in-memory implementation shipped with the crate.

use crate::{HashAlgorithm, Result};

/// A private key plus certificate able to produce boot signatures.
///
/// Implementations that wrap an external service should report their
/// failures as [`crate::Error::Identity`] so the original error is preserved.
pub trait SigningIdentity {
    /// Acquire key material. Called once before any other method is used
    /// for signing; errors are propagated to the caller unchanged.
    fn resolve(&mut self) -> Result<()>;

    /// DER encoding of the signing certificate.
    fn certificate_der(&self) -> &[u8];

    /// Hash algorithm the identity is configured to sign with.
    fn hash_algorithm(&self) -> HashAlgorithm;

    /// Sign `data`, hashing it with `hash` first.
    fn sign(&self, data: &[u8], hash: HashAlgorithm) -> Result<Vec<u8>>;
}
