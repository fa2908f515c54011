//! Error types for boot image signing operations.
//!
//! This module defines the [`enum@Error`] enum covering all failure cases
//! when parsing boot images, decoding boot signatures, and signing or
//! verifying them.
//!
//! Variants fall into four groups:
//! - format errors (bad magic, malformed header, malformed DER)
//! - cryptographic errors (certificate, algorithm, signature failures)
//! - consistency errors (length or signer mismatch after a valid signature)
//! - collaborator errors raised by a [`crate::SigningIdentity`]
//!
//! # See Also
//!
//! - [`crate::Result`] - Convenience type alias using this error

use thiserror::Error;

/// Error type for boot signature operations.
///
/// All public functions in this crate return [`crate::Result<T>`], which uses this error type.
///
/// # Examples
///
/// ```no_run
/// use bootsig::{BootImage, Error};
///
/// let data = std::fs::read("boot.img")?;
/// let mut image = BootImage::new(&data)?;
/// match image.verify(None) {
///     Ok(verified) => println!("Signed for {}", verified.target),
///     Err(Error::NotSigned) => eprintln!("Image carries no signature"),
///     Err(Error::BadSignature) => eprintln!("Signature does not verify"),
///     Err(e) => eprintln!("Other error: {e}"),
/// }
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Error)]
pub enum Error {
    /// The buffer does not start with `ANDROID!`.
    #[error("image lacks Android boot image magic")]
    BadMagic,

    /// The boot image header is malformed.
    ///
    /// Covers short buffers, a zero page size, arithmetic overflow and a
    /// computed signable length outside `[page_size, image length]`.
    #[error("image has invalid header: {0}")]
    InvalidHeader(String),

    /// The header describes more data than the image contains.
    #[error("truncated image: header describes {signable} bytes but image has {actual}")]
    TruncatedImage { signable: usize, actual: usize },

    /// No boot signature is appended to the image.
    #[error("boot image is not signed")]
    NotSigned,

    /// Malformed DER in the boot signature.
    #[error("DER error: {0}")]
    Der(String),

    /// Bytes remain after the top-level boot signature sequence.
    #[error("boot signature has {0} excess bytes")]
    TrailingBytes(usize),

    /// The boot signature carries no signature bytes.
    #[error("missing actual signature")]
    MissingSignature,

    /// The boot signature version is not 1.
    #[error("unsupported boot signature version {0}")]
    UnsupportedVersion(i64),

    /// The embedded or supplied certificate could not be parsed.
    #[error("error parsing signer certificate: {0}")]
    Certificate(String),

    /// The certificate's public key is not RSA.
    #[error("unsupported public key algorithm: {0}")]
    UnsupportedPublicKeyAlgorithm(String),

    /// The algorithm identifier is neither RSA+SHA-256 nor RSA+SHA-512.
    #[error("unsupported algorithm ID {0}")]
    UnsupportedAlgorithm(String),

    /// The requested hash algorithm cannot be used for boot signatures.
    #[error("unsupported hash algorithm: {0}")]
    UnsupportedHashAlgorithm(String),

    /// The requested key algorithm cannot be used for boot signatures.
    #[error("unsupported key algorithm: {0}")]
    UnsupportedKeyAlgorithm(String),

    /// RSA PKCS#1 v1.5 verification failed.
    #[error("signature fails to RSA verify")]
    BadSignature,

    /// The signature is valid but covers a different image length.
    #[error("authenticated length {authenticated} does not match actual image length {actual}")]
    LengthMismatch { authenticated: i64, actual: usize },

    /// The signature is valid but was made with a different certificate.
    #[error("boot image signature is good but was not signed by the provided cert")]
    CertificateMismatch,

    /// Signing failed inside this crate or a bundled signing identity.
    #[error("Signing failed: {0}")]
    Signing(String),

    /// A foreign signing identity failed; the source is kept unchanged.
    #[error("signing identity error")]
    Identity(#[source] Box<dyn std::error::Error + Send + Sync>),
}
