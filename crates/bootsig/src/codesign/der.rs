//! DER (Distinguished Encoding Rules) codec for boot signatures
//!
//! The boot signature covers re-encoded authenticated attributes, so every
//! value must encode to exactly one byte sequence. This module implements the
//! small subset of ASN.1 DER the signature block uses:
//! - 0x02: INTEGER
//! - 0x04: OCTET STRING
//! - 0x06: OBJECT IDENTIFIER
//! - 0x0c / 0x13 / 0x16: UTF8String, PrintableString, IA5String
//! - 0x30: SEQUENCE
//!
//! Only the low-tag-number form is supported. Decoding rejects indefinite and
//! non-minimal lengths as well as non-minimal integers.

use super::constants::*;
use crate::{Error, Result};

/// Encode a length value in DER format.
///
/// For lengths < 128, uses short form (1 byte).
/// For lengths >= 128, uses long form (1 + n bytes).
pub fn encode_length(output: &mut Vec<u8>, length: usize) {
    if length < 128 {
        output.push(length as u8);
    } else {
        let bytes_needed = (64 - (length as u64).leading_zeros() as usize).div_ceil(8);

        output.push(0x80 | bytes_needed as u8);

        for i in (0..bytes_needed).rev() {
            output.push(((length >> (i * 8)) & 0xFF) as u8);
        }
    }
}

/// Encode a complete tag-length-value element.
pub fn encode_tlv(output: &mut Vec<u8>, tag: u8, content: &[u8]) {
    output.push(tag);
    encode_length(output, content.len());
    output.extend_from_slice(content);
}

/// Encode an INTEGER using the minimal two's complement form.
pub fn encode_integer(output: &mut Vec<u8>, value: i64) {
    let bytes = value.to_be_bytes();

    // Drop leading bytes that only repeat the sign of the following byte
    let mut start = 0;
    while start < bytes.len() - 1 {
        let redundant = (bytes[start] == 0x00 && bytes[start + 1] & 0x80 == 0)
            || (bytes[start] == 0xFF && bytes[start + 1] & 0x80 != 0);
        if !redundant {
            break;
        }
        start += 1;
    }

    encode_tlv(output, DER_TAG_INTEGER, &bytes[start..]);
}

/// Encode an OCTET STRING.
pub fn encode_octet_string(output: &mut Vec<u8>, data: &[u8]) {
    encode_tlv(output, DER_TAG_OCTET_STRING, data);
}

/// Encode an OBJECT IDENTIFIER from its already-encoded content bytes.
pub fn encode_oid(output: &mut Vec<u8>, oid: &[u8]) {
    encode_tlv(output, DER_TAG_OID, oid);
}

/// Encode a string as PrintableString when possible, UTF8String otherwise.
pub fn encode_string(output: &mut Vec<u8>, value: &str) {
    let tag = if value.bytes().all(is_printable) {
        DER_TAG_PRINTABLESTRING
    } else {
        DER_TAG_UTF8STRING
    };
    encode_tlv(output, tag, value.as_bytes());
}

/// Encode a SEQUENCE around already-encoded content.
pub fn encode_sequence(output: &mut Vec<u8>, content: &[u8]) {
    encode_tlv(output, DER_TAG_SEQUENCE, content);
}

/// Whether a byte belongs to the PrintableString alphabet.
pub fn is_printable(b: u8) -> bool {
    b.is_ascii_alphanumeric()
        || matches!(
            b,
            b' ' | b'\'' | b'(' | b')' | b'+' | b',' | b'-' | b'.' | b'/' | b':' | b'=' | b'?'
        )
}

/// Like [`is_printable`], but also accepts `*`, which shows up in received
/// PrintableStrings even though it is never emitted.
fn is_printable_lenient(b: u8) -> bool {
    is_printable(b) || b == b'*'
}

/// Render OBJECT IDENTIFIER content bytes in dotted decimal form.
pub fn oid_to_string(oid: &[u8]) -> String {
    let mut arcs: Vec<u64> = Vec::new();
    let mut current: u64 = 0;

    for &b in oid {
        current = match current.checked_mul(128) {
            Some(v) => v | u64::from(b & 0x7f),
            None => return format!("<oid {}>", hex_string(oid)),
        };
        if b & 0x80 == 0 {
            if arcs.is_empty() {
                let (first, second) = match current {
                    0..=39 => (0, current),
                    40..=79 => (1, current - 40),
                    _ => (2, current - 80),
                };
                arcs.push(first);
                arcs.push(second);
            } else {
                arcs.push(current);
            }
            current = 0;
        }
    }

    if arcs.is_empty() {
        return "<empty oid>".into();
    }

    arcs.iter()
        .map(|a| a.to_string())
        .collect::<Vec<_>>()
        .join(".")
}

fn hex_string(data: &[u8]) -> String {
    data.iter().map(|b| format!("{:02x}", b)).collect()
}

/// A decoded tag-length-value element borrowing from the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tlv<'a> {
    /// Identifier octet
    pub tag: u8,
    /// Content octets
    pub content: &'a [u8],
    /// The complete element, header included
    pub raw: &'a [u8],
}

/// Sequential reader over a run of DER elements.
#[derive(Debug, Clone)]
pub struct DerReader<'a> {
    data: &'a [u8],
}

impl<'a> DerReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> &'a [u8] {
        self.data
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Tag of the next element without consuming it.
    pub fn peek_tag(&self) -> Option<u8> {
        self.data.first().copied()
    }

    /// Read the next element of any type.
    pub fn read_tlv(&mut self) -> Result<Tlv<'a>> {
        let data = self.data;
        let tag = *data
            .first()
            .ok_or_else(|| Error::Der("unexpected end of data".into()))?;
        if tag & 0x1f == 0x1f {
            return Err(Error::Der("high-tag-number form is not supported".into()));
        }

        let (length, header_len) = decode_length(&data[1..])?;
        let header_len = header_len + 1;
        let end = header_len
            .checked_add(length)
            .filter(|&end| end <= data.len())
            .ok_or_else(|| {
                Error::Der(format!(
                    "element length {} exceeds {} available bytes",
                    length,
                    data.len() - header_len
                ))
            })?;

        self.data = &data[end..];
        Ok(Tlv {
            tag,
            content: &data[header_len..end],
            raw: &data[..end],
        })
    }

    /// Read the next element, requiring a specific tag.
    pub fn read_expected(&mut self, tag: u8) -> Result<Tlv<'a>> {
        let tlv = self.read_tlv()?;
        if tlv.tag != tag {
            return Err(Error::Der(format!(
                "expected tag 0x{:02x}, found 0x{:02x}",
                tag, tlv.tag
            )));
        }
        Ok(tlv)
    }

    /// Read a SEQUENCE and return a reader over its content.
    pub fn read_sequence(&mut self) -> Result<DerReader<'a>> {
        let tlv = self.read_expected(DER_TAG_SEQUENCE)?;
        Ok(DerReader::new(tlv.content))
    }

    /// Read an INTEGER that fits in 64 bits.
    pub fn read_integer(&mut self) -> Result<i64> {
        let tlv = self.read_expected(DER_TAG_INTEGER)?;
        decode_integer(tlv.content)
    }

    pub fn read_octet_string(&mut self) -> Result<&'a [u8]> {
        Ok(self.read_expected(DER_TAG_OCTET_STRING)?.content)
    }

    /// Read an OBJECT IDENTIFIER, returning its content bytes.
    pub fn read_oid(&mut self) -> Result<&'a [u8]> {
        let content = self.read_expected(DER_TAG_OID)?.content;
        match content.last() {
            None => Err(Error::Der("empty object identifier".into())),
            Some(last) if last & 0x80 != 0 => {
                Err(Error::Der("truncated object identifier".into()))
            }
            Some(_) => Ok(content),
        }
    }

    /// Read a PrintableString, UTF8String or IA5String.
    pub fn read_string(&mut self) -> Result<String> {
        let tlv = self.read_tlv()?;
        let valid = match tlv.tag {
            DER_TAG_PRINTABLESTRING => tlv.content.iter().copied().all(is_printable_lenient),
            DER_TAG_IA5STRING => tlv.content.is_ascii(),
            DER_TAG_UTF8STRING => true,
            other => {
                return Err(Error::Der(format!(
                    "expected string, found tag 0x{:02x}",
                    other
                )))
            }
        };
        if !valid {
            return Err(Error::Der(format!(
                "invalid characters in string with tag 0x{:02x}",
                tlv.tag
            )));
        }
        String::from_utf8(tlv.content.to_vec())
            .map_err(|e| Error::Der(format!("invalid UTF-8 in string: {}", e)))
    }

    /// Require that every element has been consumed.
    pub fn finish(&self) -> Result<()> {
        if self.data.is_empty() {
            Ok(())
        } else {
            Err(Error::Der(format!(
                "{} unexpected bytes after last element",
                self.data.len()
            )))
        }
    }
}

/// Decode a DER length, returning the length and the number of bytes it used.
fn decode_length(data: &[u8]) -> Result<(usize, usize)> {
    let first = *data
        .first()
        .ok_or_else(|| Error::Der("missing length".into()))?;

    if first < 0x80 {
        return Ok((first as usize, 1));
    }
    if first == 0x80 {
        return Err(Error::Der("indefinite length is not allowed in DER".into()));
    }

    let count = (first & 0x7f) as usize;
    if count > std::mem::size_of::<usize>() {
        return Err(Error::Der(format!("length uses {} bytes", count)));
    }
    let bytes = data
        .get(1..1 + count)
        .ok_or_else(|| Error::Der("truncated length".into()))?;
    if bytes[0] == 0 {
        return Err(Error::Der("length is not minimally encoded".into()));
    }

    let length = bytes
        .iter()
        .fold(0usize, |acc, &b| (acc << 8) | b as usize);
    if length < 128 {
        return Err(Error::Der("length is not minimally encoded".into()));
    }

    Ok((length, 1 + count))
}

fn decode_integer(content: &[u8]) -> Result<i64> {
    if content.is_empty() {
        return Err(Error::Der("empty integer".into()));
    }
    if content.len() > 1
        && ((content[0] == 0x00 && content[1] & 0x80 == 0)
            || (content[0] == 0xFF && content[1] & 0x80 != 0))
    {
        return Err(Error::Der("integer is not minimally encoded".into()));
    }
    if content.len() > 8 {
        return Err(Error::Der("integer too large".into()));
    }

    // Sign-extend from the first content byte
    let init: i64 = if content[0] & 0x80 != 0 { -1 } else { 0 };
    Ok(content
        .iter()
        .fold(init, |acc, &b| (acc << 8) | i64::from(b)))
}
