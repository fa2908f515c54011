//! Boot image signing and verification
//!
//! A [`BootImage`] owns a copy of the image bytes. The signable prefix is
//! derived from the header; a signed image carries a DER boot signature
//! directly after that prefix and nothing else.
//!
//! ```text
//! ┌──────────────────────────────┐ 0
//! │ header page                  │
//! ├──────────────────────────────┤ page_size
//! │ kernel (page aligned)        │
//! ├──────────────────────────────┤
//! │ ramdisk (page aligned)       │
//! ├──────────────────────────────┤
//! │ second stage (page aligned)  │
//! ├──────────────────────────────┤ signable length
//! │ boot signature (DER)         │
//! └──────────────────────────────┘
//! ```

use log::{debug, info};
use sha2::{Digest, Sha256};

use super::header::{compute_signable_length, has_boot_magic, BootImageHeader};
use crate::codesign::{BootSignature, VerifiedSignature};
use crate::crypto::SigningIdentity;
use crate::{Error, Result};

/// An Android boot image held in memory.
///
/// # Examples
///
/// ```no_run
/// use bootsig::{BootImage, HashAlgorithm, RsaSigningIdentity};
///
/// let mut identity = RsaSigningIdentity::from_pem(
///     &std::fs::read("cert.pem")?,
///     &std::fs::read("key.pem")?,
///     HashAlgorithm::Sha256,
/// )?;
///
/// let mut image = BootImage::new(&std::fs::read("boot.img")?)?;
/// image.sign("/boot", &mut identity)?;
/// std::fs::write("boot-signed.img", image.marshal().unwrap_or_default())?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
pub struct BootImage {
    raw: Vec<u8>,
    header: BootImageHeader,
    signature: Option<BootSignature>,
    signed: Option<Vec<u8>>,
}

impl BootImage {
    /// Copy `data` and validate its header.
    ///
    /// # Errors
    ///
    /// - [`Error::BadMagic`] if `data` does not start with `ANDROID!`
    /// - [`Error::InvalidHeader`] or [`Error::TruncatedImage`] if the header
    ///   does not describe a signable prefix of `data`
    pub fn new(data: &[u8]) -> Result<Self> {
        if !has_boot_magic(data) {
            return Err(Error::BadMagic);
        }

        let header = BootImageHeader::parse(data)?;
        let length = compute_signable_length(data)?;
        debug!(
            "boot image: {} bytes, signable length {}, page size {}",
            data.len(),
            length,
            header.page_size
        );

        Ok(Self {
            raw: data.to_vec(),
            header,
            signature: None,
            signed: None,
        })
    }

    pub fn header(&self) -> &BootImageHeader {
        &self.header
    }

    /// The image bytes as supplied to [`BootImage::new`].
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// Length of the prefix covered by a boot signature.
    pub fn signable_length(&self) -> Result<usize> {
        compute_signable_length(&self.raw)
    }

    pub fn signable_bytes(&self) -> Result<&[u8]> {
        let length = self.signable_length()?;
        Ok(&self.raw[..length])
    }

    /// Decode the boot signature trailing the signable prefix, if any.
    ///
    /// Any failure simply means there is no signature.
    pub fn detect_signature(&self) -> Option<BootSignature> {
        let length = match self.signable_length() {
            Ok(length) => length,
            Err(e) => {
                debug!("cannot locate boot signature: {}", e);
                return None;
            }
        };

        if length >= self.raw.len() {
            debug!("no bytes after signable length {}", length);
            return None;
        }

        match BootSignature::parse(&self.raw[length..]) {
            Ok(signature) => Some(signature),
            Err(e) => {
                debug!(
                    "{} trailing bytes are not a boot signature: {}",
                    self.raw.len() - length,
                    e
                );
                None
            }
        }
    }

    /// Whether the image carries a boot signature.
    ///
    /// A detected or freshly created signature is cached and reused by
    /// [`BootImage::verify`]. This never fails; an undecodable trailer
    /// counts as unsigned.
    pub fn is_signed(&mut self) -> bool {
        if self.signature.is_none() {
            self.signature = self.detect_signature();
        }
        self.signature.is_some()
    }

    /// The cached boot signature, if one was detected or created.
    pub fn signature(&self) -> Option<&BootSignature> {
        self.signature.as_ref()
    }

    /// Sign the signable prefix for `target`.
    ///
    /// Any bytes past the signable prefix, including an existing signature,
    /// are dropped from the output. On failure the image is left unchanged.
    pub fn sign<I>(&mut self, target: &str, identity: &mut I) -> Result<()>
    where
        I: SigningIdentity + ?Sized,
    {
        let header_length = self.header.signable_length()?;
        if usize::try_from(header_length).map_or(true, |l| l > self.raw.len()) {
            return Err(Error::TruncatedImage {
                signable: usize::try_from(header_length).unwrap_or(usize::MAX),
                actual: self.raw.len(),
            });
        }

        let signable = self.signable_bytes()?;
        let signature = BootSignature::sign(target, signable, identity)?;
        let encoded = signature
            .marshal()
            .ok_or_else(|| Error::Signing("failed to encode boot signature".into()))?;

        let mut output = Vec::with_capacity(signable.len() + encoded.len());
        output.extend_from_slice(signable);
        output.extend_from_slice(&encoded);

        info!(
            "signed boot image for {}: {} signable bytes, {} byte signature",
            target,
            signable.len(),
            encoded.len()
        );

        self.signature = Some(signature);
        self.signed = Some(output);
        Ok(())
    }

    /// Verify the boot signature over the signable prefix.
    ///
    /// With `expected_certificate` (DER), the signer must also be exactly that
    /// certificate; a genuine signature from anyone else is
    /// [`Error::CertificateMismatch`].
    pub fn verify(&mut self, expected_certificate: Option<&[u8]>) -> Result<VerifiedSignature> {
        if !self.is_signed() {
            return Err(Error::NotSigned);
        }
        let signature = self.signature.as_ref().ok_or(Error::NotSigned)?;

        let length = compute_signable_length(&self.raw)?;
        let verified = signature.verify(&self.raw[..length])?;

        if let Some(expected) = expected_certificate {
            let wanted = Sha256::digest(expected);
            let found = Sha256::digest(signature.certificate_der());
            if wanted != found {
                return Err(Error::CertificateMismatch);
            }
        }

        Ok(verified)
    }

    /// A copy of the signed image, or `None` before a successful
    /// [`BootImage::sign`].
    pub fn marshal(&self) -> Option<Vec<u8>> {
        self.signed.clone()
    }

    /// The signed image without copying.
    pub fn signed_bytes(&self) -> Option<&[u8]> {
        self.signed.as_deref()
    }
}
