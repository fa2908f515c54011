//! End-to-end signing and verification of synthetic boot images.

mod common;

use bootsig::codesign::signature::signed_message;
use bootsig::{
    compute_signable_length, AlgorithmIdentifier, AuthenticatedAttributes, BootImage,
    BootSignature, Error, HashAlgorithm, SignatureAlgorithm, SigningIdentity,
};
use common::{boot_image, signer_a, signer_b, standard_image};

fn sign_standard(hash: HashAlgorithm) -> Vec<u8> {
    let mut identity = signer_a().identity(hash);
    let mut image = BootImage::new(&standard_image()).unwrap();
    image.sign("/boot", &mut identity).unwrap();
    image.marshal().unwrap()
}

/// Append a hand-made record to the standard image.
fn with_record(record: &BootSignature) -> Vec<u8> {
    let mut data = standard_image();
    data.extend_from_slice(&record.to_der().unwrap());
    data
}

/// A record over the standard image whose fields are chosen by the caller
/// but whose signature is genuine for those fields.
fn forged_record(algorithm: &[u8], length: i64) -> BootSignature {
    let mut identity = signer_a().identity(HashAlgorithm::Sha256);
    identity.resolve().unwrap();

    let attributes = AuthenticatedAttributes {
        target: "/boot".into(),
        length,
    };
    let message = signed_message(&standard_image(), &attributes);
    let signature = identity.sign(&message, HashAlgorithm::Sha256).unwrap();

    BootSignature::from_parts(
        signer_a().cert_der.clone(),
        AlgorithmIdentifier {
            algorithm: algorithm.to_vec(),
            parameters: None,
        },
        attributes,
        signature,
    )
}

#[test]
fn test_signable_length_matches_header_arithmetic() {
    assert_eq!(compute_signable_length(&standard_image()).unwrap(), 20480);

    let image = BootImage::new(&standard_image()).unwrap();
    assert_eq!(image.signable_length().unwrap(), 20480);
    assert_eq!(image.header().kernel_size, 10000);
    assert_eq!(image.header().ramdisk_size, 3000);
}

#[test]
fn test_sign_then_verify_sha256() {
    let signed = sign_standard(HashAlgorithm::Sha256);
    assert_eq!(&signed[..20480], standard_image().as_slice());
    assert!(signed.len() > 20480);

    let mut image = BootImage::new(&signed).unwrap();
    assert!(image.is_signed());

    let verified = image.verify(None).unwrap();
    assert_eq!(verified.target, "/boot");
    assert_eq!(verified.algorithm, SignatureAlgorithm::RsaSha256);
    assert_eq!(verified.length, 20480);

    let signature = image.signature().unwrap();
    assert_eq!(signature.certificate_der(), signer_a().cert_der.as_slice());
    assert_eq!(signature.authenticated_length(), 20480);
}

#[test]
fn test_sign_then_verify_sha512() {
    let signed = sign_standard(HashAlgorithm::Sha512);

    let mut image = BootImage::new(&signed).unwrap();
    let verified = image.verify(None).unwrap();
    assert_eq!(verified.algorithm, SignatureAlgorithm::RsaSha512);
}

#[test]
fn test_signed_image_verifies_in_place() {
    let mut identity = signer_a().identity(HashAlgorithm::Sha256);
    let mut image = BootImage::new(&standard_image()).unwrap();
    assert!(!image.is_signed());

    image.sign("/recovery", &mut identity).unwrap();
    assert!(image.is_signed());
    assert_eq!(image.verify(None).unwrap().target, "/recovery");
}

#[test]
fn test_utf8_targets_round_trip() {
    for target in ["boot_a", "a*b", "/boot/ä"] {
        let mut identity = signer_a().identity(HashAlgorithm::Sha256);
        let mut image = BootImage::new(&standard_image()).unwrap();
        image.sign(target, &mut identity).unwrap();

        // UTF8String tag leads the attributes sequence content
        let attrs = image.signature().unwrap().attributes().to_der();
        assert_eq!(attrs[2], 0x0c, "target {:?}", target);

        let mut image = BootImage::new(&image.marshal().unwrap()).unwrap();
        assert!(image.is_signed());
        assert_eq!(image.verify(None).unwrap().target, target);
    }
}

#[test]
fn test_signer_certificate_is_embedded() {
    let signed = sign_standard(HashAlgorithm::Sha256);
    let mut image = BootImage::new(&signed).unwrap();
    assert!(image.is_signed());

    let cert = image.signature().unwrap().signer().unwrap();
    assert_eq!(cert.subject_common_name().as_deref(), Some("Boot Signer A"));
}

#[test]
fn test_tampered_payload_fails_cryptographically() {
    let signed = sign_standard(HashAlgorithm::Sha256);

    for offset in [100, 4096, 12345, 20479] {
        let mut tampered = signed.clone();
        tampered[offset] ^= 0x01;

        let mut image = BootImage::new(&tampered).unwrap();
        assert!(image.is_signed());
        assert!(
            matches!(image.verify(None), Err(Error::BadSignature)),
            "offset {} should break the signature",
            offset
        );
    }
}

#[test]
fn test_tampered_signature_fails() {
    let signed = sign_standard(HashAlgorithm::Sha256);
    let mut tampered = signed.clone();
    let last = tampered.len() - 1;
    tampered[last] ^= 0xFF;

    let mut image = BootImage::new(&tampered).unwrap();
    assert!(matches!(image.verify(None), Err(Error::BadSignature)));
}

#[test]
fn test_lying_length_is_rejected_after_valid_signature() {
    let record = forged_record(SignatureAlgorithm::RsaSha256.oid(), 20480 + 4096);
    let mut image = BootImage::new(&with_record(&record)).unwrap();

    match image.verify(None) {
        Err(Error::LengthMismatch {
            authenticated,
            actual,
        }) => {
            assert_eq!(authenticated, 24576);
            assert_eq!(actual, 20480);
        }
        other => panic!("expected length mismatch, got {:?}", other),
    }
}

#[test]
fn test_honest_forged_record_verifies() {
    let record = forged_record(SignatureAlgorithm::RsaSha256.oid(), 20480);
    let mut image = BootImage::new(&with_record(&record)).unwrap();
    assert!(image.verify(None).is_ok());
}

#[test]
fn test_unsupported_algorithm_is_rejected() {
    // sha1WithRSAEncryption
    let sha1_rsa = [0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x01, 0x05];
    let record = forged_record(&sha1_rsa, 20480);
    let mut image = BootImage::new(&with_record(&record)).unwrap();

    assert!(image.is_signed());
    assert!(matches!(
        image.verify(None),
        Err(Error::UnsupportedAlgorithm(ref oid)) if oid == "1.2.840.113549.1.1.5"
    ));
}

#[test]
fn test_expected_certificate_must_match() {
    let signed = sign_standard(HashAlgorithm::Sha256);

    let mut image = BootImage::new(&signed).unwrap();
    assert!(image.verify(Some(&signer_a().cert_der)).is_ok());

    let mut image = BootImage::new(&signed).unwrap();
    assert!(matches!(
        image.verify(Some(&signer_b().cert_der)),
        Err(Error::CertificateMismatch)
    ));
}

#[test]
fn test_resigning_replaces_signature() {
    let signed = sign_standard(HashAlgorithm::Sha256);

    let mut identity = signer_b().identity(HashAlgorithm::Sha512);
    let mut image = BootImage::new(&signed).unwrap();
    image.sign("/boot", &mut identity).unwrap();
    let resigned = image.marshal().unwrap();

    let record_len = image.signature().unwrap().to_der().unwrap().len();
    assert_eq!(resigned.len(), 20480 + record_len);

    let mut image = BootImage::new(&resigned).unwrap();
    assert!(image.verify(Some(&signer_b().cert_der)).is_ok());
    assert!(matches!(
        image.verify(Some(&signer_a().cert_der)),
        Err(Error::CertificateMismatch)
    ));
}

#[test]
fn test_is_signed_is_false_for_unsigned_images() {
    let mut image = BootImage::new(&standard_image()).unwrap();
    assert!(!image.is_signed());
    assert!(matches!(image.verify(None), Err(Error::NotSigned)));

    let mut data = standard_image();
    data.extend_from_slice(b"this is not a boot signature");
    let mut image = BootImage::new(&data).unwrap();
    assert!(!image.is_signed());
}

#[test]
fn test_is_signed_is_false_for_truncated_or_padded_signature() {
    let signed = sign_standard(HashAlgorithm::Sha256);

    let mut image = BootImage::new(&signed[..signed.len() - 10]).unwrap();
    assert!(!image.is_signed());

    let mut padded = signed.clone();
    padded.extend_from_slice(&[0u8; 16]);
    let mut image = BootImage::new(&padded).unwrap();
    assert!(!image.is_signed());
}

#[test]
fn test_bad_magic_is_rejected() {
    let mut data = standard_image();
    data[..8].copy_from_slice(b"ANDROID?");
    assert!(matches!(BootImage::new(&data), Err(Error::BadMagic)));
}

#[test]
fn test_header_longer_than_image_is_rejected() {
    let data = boot_image(10000, 3000, 0, 4096, 20000);
    assert!(matches!(
        BootImage::new(&data),
        Err(Error::TruncatedImage {
            signable: 20480,
            actual: 20000
        })
    ));
}

#[test]
fn test_non_rsa_certificate_is_rejected() {
    let (ec_cert, _) = common::ec_signer();
    let mut record = forged_record(SignatureAlgorithm::RsaSha256.oid(), 20480);
    record = BootSignature::from_parts(
        ec_cert,
        record.algorithm().clone(),
        record.attributes().clone(),
        record.signature_bytes().to_vec(),
    );

    let mut image = BootImage::new(&with_record(&record)).unwrap();
    assert!(matches!(
        image.verify(None),
        Err(Error::UnsupportedPublicKeyAlgorithm(_))
    ));
}

#[test]
fn test_garbage_certificate_is_rejected() {
    let record = forged_record(SignatureAlgorithm::RsaSha256.oid(), 20480);
    let record = BootSignature::from_parts(
        vec![0x30, 0x03, 0x02, 0x01, 0x01],
        record.algorithm().clone(),
        record.attributes().clone(),
        record.signature_bytes().to_vec(),
    );

    let mut image = BootImage::new(&with_record(&record)).unwrap();
    assert!(matches!(image.verify(None), Err(Error::Certificate(_))));
}
