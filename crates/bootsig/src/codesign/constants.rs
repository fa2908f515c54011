//! Verified boot constants: header magic, DER tags and algorithm OIDs.
//!
//! These constants define the on-disk layout of an Android boot image header
//! and the ASN.1 building blocks of the boot signature appended to it.

// =============================================================================
// Boot Image Header
// =============================================================================

/// Magic string at offset 0 of every boot image
pub const BOOT_MAGIC: &[u8; 8] = b"ANDROID!";

/// Size of the magic in bytes
pub const BOOT_MAGIC_SIZE: usize = 8;

/// Number of little-endian u32 fields following the magic
pub const BOOT_HEADER_FIELD_COUNT: usize = 8;

/// Bytes of the header consumed when computing the signable length
pub const BOOT_HEADER_SIZE: usize = BOOT_MAGIC_SIZE + BOOT_HEADER_FIELD_COUNT * 4;

// =============================================================================
// Boot Signature
// =============================================================================

/// The only boot signature format version
pub const BOOT_SIGNATURE_VERSION: i64 = 1;

// =============================================================================
// DER Tags
// =============================================================================

/// DER tag for INTEGER
pub const DER_TAG_INTEGER: u8 = 0x02;

/// DER tag for OCTET STRING
pub const DER_TAG_OCTET_STRING: u8 = 0x04;

/// DER tag for NULL
pub const DER_TAG_NULL: u8 = 0x05;

/// DER tag for OBJECT IDENTIFIER
pub const DER_TAG_OID: u8 = 0x06;

/// DER tag for UTF8String
pub const DER_TAG_UTF8STRING: u8 = 0x0c;

/// DER tag for PrintableString
pub const DER_TAG_PRINTABLESTRING: u8 = 0x13;

/// DER tag for IA5String
pub const DER_TAG_IA5STRING: u8 = 0x16;

/// DER tag for SEQUENCE (constructed)
pub const DER_TAG_SEQUENCE: u8 = 0x30;

// =============================================================================
// Algorithm Identifiers
// =============================================================================

/// sha256WithRSAEncryption OID: 1.2.840.113549.1.1.11
pub const RSA_SHA256_OID: &[u8] = &[0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x01, 0x0b];

/// sha512WithRSAEncryption OID: 1.2.840.113549.1.1.13
pub const RSA_SHA512_OID: &[u8] = &[0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x01, 0x0d];
