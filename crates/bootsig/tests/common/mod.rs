//! Shared fixtures: RSA signers with self-signed certificates and synthetic
//! boot images.

#![allow(dead_code)]

use std::sync::OnceLock;

use bootsig::{HashAlgorithm, RsaSigningIdentity};
use rsa::pkcs8::{EncodePrivateKey, LineEnding};
use rsa::RsaPrivateKey;

/// PEM material for one signer.
pub struct Signer {
    pub cert_pem: String,
    pub cert_der: Vec<u8>,
    pub key_pem: String,
}

impl Signer {
    pub fn identity(&self, hash: HashAlgorithm) -> RsaSigningIdentity {
        RsaSigningIdentity::from_pem(self.cert_pem.as_bytes(), self.key_pem.as_bytes(), hash)
            .unwrap()
    }
}

fn generate_signer(common_name: &str) -> Signer {
    let key = RsaPrivateKey::new(&mut rand::thread_rng(), 2048).unwrap();
    let key_pem = key.to_pkcs8_pem(LineEnding::LF).unwrap().to_string();

    let key_pair = rcgen::KeyPair::from_pem_and_sign_algo(&key_pem, &rcgen::PKCS_RSA_SHA256).unwrap();
    let mut params = rcgen::CertificateParams::new(vec![format!("{}.example", common_name)]).unwrap();
    params
        .distinguished_name
        .push(rcgen::DnType::CommonName, common_name);
    let cert = params.self_signed(&key_pair).unwrap();

    Signer {
        cert_pem: cert.pem(),
        cert_der: cert.der().to_vec(),
        key_pem,
    }
}

/// First test signer, generated once per test binary.
pub fn signer_a() -> &'static Signer {
    static SIGNER: OnceLock<Signer> = OnceLock::new();
    SIGNER.get_or_init(|| generate_signer("Boot Signer A"))
}

/// Second, unrelated test signer.
pub fn signer_b() -> &'static Signer {
    static SIGNER: OnceLock<Signer> = OnceLock::new();
    SIGNER.get_or_init(|| generate_signer("Boot Signer B"))
}

/// A self-signed P-256 certificate and its PKCS#8 key.
pub fn ec_signer() -> (Vec<u8>, String) {
    let rcgen::CertifiedKey { cert, key_pair } =
        rcgen::generate_simple_self_signed(vec!["ec.example".to_string()]).unwrap();
    (cert.der().to_vec(), key_pair.serialize_pem())
}

/// Build a boot image with the given section sizes, padded to `total` bytes.
///
/// Payload bytes follow a simple pattern so tampering is always a change.
pub fn boot_image(kernel: u32, ramdisk: u32, second: u32, page: u32, total: usize) -> Vec<u8> {
    let mut data = b"ANDROID!".to_vec();
    for field in [kernel, 0x1000_8000, ramdisk, 0x1100_0000, second, 0x10f0_0000, 0x1000_0100, page] {
        data.extend_from_slice(&field.to_le_bytes());
    }
    let header_len = data.len();
    data.extend((header_len..total).map(|i| (i % 251) as u8));
    data
}

/// kernel 10000, ramdisk 3000, page 4096: signable length 20480.
pub fn standard_image() -> Vec<u8> {
    boot_image(10000, 3000, 0, 4096, 20480)
}
