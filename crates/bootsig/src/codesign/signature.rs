//! Boot signature record
//!
//! The boot signature is a DER structure appended to the signable part of a
//! boot image:
//!
//! ```text
//! AndroidVerifiedBootSignature ::= SEQUENCE {
//!     formatVersion          INTEGER,
//!     certificate            Certificate,
//!     algorithmIdentifier    SEQUENCE {
//!         algorithm          OBJECT IDENTIFIER,
//!         parameters         ANY DEFINED BY algorithm OPTIONAL
//!     },
//!     authenticatedAttributes SEQUENCE {
//!         target             PrintableString,
//!         length             INTEGER
//!     },
//!     signature              OCTET STRING
//! }
//! ```
//!
//! The signed message is the signable image bytes followed by the DER
//! encoding of `authenticatedAttributes`, so the target label and the length
//! are covered by the signature as well.

use log::debug;
use x509_certificate::CapturedX509Certificate;

use super::constants::*;
use super::der::{self, DerReader};
use crate::crypto::cert::{parse_certificate, pkcs1v15, rsa_public_key};
use crate::crypto::SigningIdentity;
use crate::{Error, Result, SignatureAlgorithm};

/// Algorithm identifier naming the signature algorithm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlgorithmIdentifier {
    /// OBJECT IDENTIFIER content bytes
    pub algorithm: Vec<u8>,
    /// Complete DER element of the parameters, if present
    pub parameters: Option<Vec<u8>>,
}

impl AlgorithmIdentifier {
    pub fn new(algorithm: SignatureAlgorithm) -> Self {
        Self {
            algorithm: algorithm.oid().to_vec(),
            parameters: None,
        }
    }

    /// Resolve to one of the supported signature algorithms.
    pub fn resolve(&self) -> Result<SignatureAlgorithm> {
        SignatureAlgorithm::from_oid(&self.algorithm)
    }

    fn encode(&self, output: &mut Vec<u8>) -> Result<()> {
        let mut content = Vec::new();
        der::encode_oid(&mut content, &self.algorithm);
        if let Some(parameters) = &self.parameters {
            check_single_element(parameters, "algorithm parameters")?;
            content.extend_from_slice(parameters);
        }
        der::encode_sequence(output, &content);
        Ok(())
    }

    fn decode(reader: &mut DerReader<'_>) -> Result<Self> {
        let mut seq = reader.read_sequence()?;
        let algorithm = seq.read_oid()?.to_vec();
        let parameters = if seq.is_empty() {
            None
        } else {
            Some(seq.read_tlv()?.raw.to_vec())
        };
        seq.finish()?;

        Ok(Self {
            algorithm,
            parameters,
        })
    }
}

/// Signed metadata appended to the image bytes before hashing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedAttributes {
    /// Partition the image is meant for, e.g. `/boot`
    pub target: String,
    /// Length of the signable image bytes
    pub length: i64,
}

impl AuthenticatedAttributes {
    /// Canonical DER encoding; this is what gets hashed.
    pub fn to_der(&self) -> Vec<u8> {
        let mut content = Vec::new();
        der::encode_string(&mut content, &self.target);
        der::encode_integer(&mut content, self.length);

        let mut output = Vec::with_capacity(content.len() + 4);
        der::encode_sequence(&mut output, &content);
        output
    }

    fn decode(reader: &mut DerReader<'_>) -> Result<Self> {
        let mut seq = reader.read_sequence()?;
        let target = seq.read_string()?;
        let length = seq.read_integer()?;
        seq.finish()?;

        Ok(Self { target, length })
    }
}

/// Outcome of a successful verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedSignature {
    /// Target label the signer authenticated
    pub target: String,
    /// Algorithm the signature was made with
    pub algorithm: SignatureAlgorithm,
    /// Number of image bytes covered
    pub length: usize,
}

/// A decoded or freshly created boot signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootSignature {
    version: i64,
    certificate: Vec<u8>,
    algorithm: AlgorithmIdentifier,
    attributes: AuthenticatedAttributes,
    signature: Vec<u8>,
}

impl BootSignature {
    /// Decode a boot signature occupying all of `data`.
    ///
    /// # Errors
    ///
    /// - [`Error::Der`] if the structure is malformed
    /// - [`Error::TrailingBytes`] if anything follows the top-level sequence
    /// - [`Error::MissingSignature`] if the signature field is absent or empty
    /// - [`Error::UnsupportedVersion`] if the format version is not 1
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut outer = DerReader::new(data);
        let mut seq = outer.read_sequence()?;
        if !outer.is_empty() {
            return Err(Error::TrailingBytes(outer.remaining().len()));
        }

        let version = seq.read_integer()?;
        let certificate = seq.read_tlv()?.raw.to_vec();
        let algorithm = AlgorithmIdentifier::decode(&mut seq)?;
        let attributes = AuthenticatedAttributes::decode(&mut seq)?;
        if seq.is_empty() {
            return Err(Error::MissingSignature);
        }
        let signature = seq.read_octet_string()?.to_vec();
        seq.finish()?;

        if signature.is_empty() {
            return Err(Error::MissingSignature);
        }
        if version != BOOT_SIGNATURE_VERSION {
            return Err(Error::UnsupportedVersion(version));
        }

        Ok(Self {
            version,
            certificate,
            algorithm,
            attributes,
            signature,
        })
    }

    /// Assemble a version 1 record from its parts without signing anything.
    pub fn from_parts(
        certificate: Vec<u8>,
        algorithm: AlgorithmIdentifier,
        attributes: AuthenticatedAttributes,
        signature: Vec<u8>,
    ) -> Self {
        Self {
            version: BOOT_SIGNATURE_VERSION,
            certificate,
            algorithm,
            attributes,
            signature,
        }
    }

    /// Sign `payload` for `target` and return the resulting record.
    ///
    /// The identity is resolved first; its errors are returned unchanged.
    /// Nothing is returned unless every step succeeds.
    pub fn sign<I>(target: &str, payload: &[u8], identity: &mut I) -> Result<Self>
    where
        I: SigningIdentity + ?Sized,
    {
        identity.resolve()?;

        let hash = identity.hash_algorithm();
        let algorithm = SignatureAlgorithm::for_hash(hash);

        let attributes = AuthenticatedAttributes {
            target: target.to_string(),
            length: i64::try_from(payload.len()).map_err(|_| {
                Error::Signing(format!("payload of {} bytes is too large", payload.len()))
            })?,
        };

        let message = signed_message(payload, &attributes);
        let signature = identity.sign(&message, hash)?;

        Ok(Self {
            version: BOOT_SIGNATURE_VERSION,
            certificate: identity.certificate_der().to_vec(),
            algorithm: AlgorithmIdentifier::new(algorithm),
            attributes,
            signature,
        })
    }

    /// Verify this signature over `signable`.
    ///
    /// The cryptographic check runs first. The authenticated length is only
    /// compared once the signature is known to be genuine.
    pub fn verify(&self, signable: &[u8]) -> Result<VerifiedSignature> {
        let certificate = self.signer()?;
        let public_key = rsa_public_key(&certificate)?;
        let algorithm = self.algorithm.resolve()?;

        let message = signed_message(signable, &self.attributes);
        let hashed = algorithm.hash().digest(&message);

        public_key
            .verify(pkcs1v15(algorithm.hash()), &hashed, &self.signature)
            .map_err(|_| Error::BadSignature)?;

        if i64::try_from(signable.len()).ok() != Some(self.attributes.length) {
            return Err(Error::LengthMismatch {
                authenticated: self.attributes.length,
                actual: signable.len(),
            });
        }

        Ok(VerifiedSignature {
            target: self.attributes.target.clone(),
            algorithm,
            length: signable.len(),
        })
    }

    /// Encode the record as DER.
    pub fn to_der(&self) -> Result<Vec<u8>> {
        check_single_element(&self.certificate, "certificate")?;
        if self.signature.is_empty() {
            return Err(Error::MissingSignature);
        }

        let mut content = Vec::new();
        der::encode_integer(&mut content, self.version);
        content.extend_from_slice(&self.certificate);
        self.algorithm.encode(&mut content)?;
        content.extend_from_slice(&self.attributes.to_der());
        der::encode_octet_string(&mut content, &self.signature);

        let mut output = Vec::with_capacity(content.len() + 4);
        der::encode_sequence(&mut output, &content);
        Ok(output)
    }

    /// Encode the record as DER, or `None` if it cannot be encoded.
    pub fn marshal(&self) -> Option<Vec<u8>> {
        match self.to_der() {
            Ok(der) => Some(der),
            Err(e) => {
                debug!("error marshaling boot signature to DER: {}", e);
                None
            }
        }
    }

    /// Parse the embedded signer certificate.
    pub fn signer(&self) -> Result<CapturedX509Certificate> {
        parse_certificate(&self.certificate)
    }

    pub fn version(&self) -> i64 {
        self.version
    }

    /// DER bytes of the embedded certificate exactly as stored.
    pub fn certificate_der(&self) -> &[u8] {
        &self.certificate
    }

    pub fn algorithm(&self) -> &AlgorithmIdentifier {
        &self.algorithm
    }

    pub fn attributes(&self) -> &AuthenticatedAttributes {
        &self.attributes
    }

    /// Target label claimed by the authenticated attributes.
    ///
    /// Only trustworthy after [`BootSignature::verify`] succeeded.
    pub fn target(&self) -> &str {
        &self.attributes.target
    }

    pub fn authenticated_length(&self) -> i64 {
        self.attributes.length
    }

    pub fn signature_bytes(&self) -> &[u8] {
        &self.signature
    }
}

/// Bytes covered by the signature: the payload followed by the attributes.
pub fn signed_message(payload: &[u8], attributes: &AuthenticatedAttributes) -> Vec<u8> {
    let attrs = attributes.to_der();
    let mut message = Vec::with_capacity(payload.len() + attrs.len());
    message.extend_from_slice(payload);
    message.extend_from_slice(&attrs);
    message
}

fn check_single_element(data: &[u8], what: &str) -> Result<()> {
    let mut reader = DerReader::new(data);
    reader
        .read_tlv()
        .and_then(|_| reader.finish())
        .map_err(|e| Error::Der(format!("{} is not a single DER element: {}", what, e)))
}
