//! Android boot image header parsing
//!
//! ```text
//! offset  size  field
//! 0       8     magic "ANDROID!"
//! 8       4     kernel size
//! 12      4     kernel load address
//! 16      4     ramdisk size
//! 20      4     ramdisk load address
//! 24      4     second stage size
//! 28      4     second stage load address
//! 32      4     tags address
//! 36      4     page size
//! ```
//!
//! All fields are little-endian. The header occupies one page and each of
//! kernel, ramdisk and second stage is padded to a page boundary; the sum of
//! those pages is the signable length of the image.

use crate::codesign::constants::*;
use crate::{Error, Result};

/// The fixed fields of a boot image header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BootImageHeader {
    pub kernel_size: u32,
    pub kernel_addr: u32,
    pub ramdisk_size: u32,
    pub ramdisk_addr: u32,
    pub second_size: u32,
    pub second_addr: u32,
    pub tags_addr: u32,
    pub page_size: u32,
}

impl BootImageHeader {
    /// Parse the header at the start of `data`.
    ///
    /// # Errors
    ///
    /// - [`Error::BadMagic`] if `data` does not start with `ANDROID!`
    /// - [`Error::InvalidHeader`] if `data` is shorter than the header
    pub fn parse(data: &[u8]) -> Result<Self> {
        if !has_boot_magic(data) {
            return Err(Error::BadMagic);
        }
        if data.len() < BOOT_HEADER_SIZE {
            return Err(Error::InvalidHeader(format!(
                "{} bytes is shorter than the {} byte header",
                data.len(),
                BOOT_HEADER_SIZE
            )));
        }

        let mut fields = [0u32; BOOT_HEADER_FIELD_COUNT];
        for (i, field) in fields.iter_mut().enumerate() {
            *field = read_u32_le(data, BOOT_MAGIC_SIZE + i * 4)
                .ok_or_else(|| Error::InvalidHeader("truncated header".into()))?;
        }
        let [kernel_size, kernel_addr, ramdisk_size, ramdisk_addr, second_size, second_addr, tags_addr, page_size] =
            fields;

        Ok(Self {
            kernel_size,
            kernel_addr,
            ramdisk_size,
            ramdisk_addr,
            second_size,
            second_addr,
            tags_addr,
            page_size,
        })
    }

    /// Header page plus the page-aligned kernel, ramdisk and second stage.
    ///
    /// This is a pure function of the header fields; it does not know how
    /// long the image actually is.
    pub fn signable_length(&self) -> Result<u64> {
        if self.page_size == 0 {
            return Err(Error::InvalidHeader("page size is zero".into()));
        }
        let page = u64::from(self.page_size);
        let overflow = || Error::InvalidHeader("image size overflows".into());

        let mut length = page;
        for size in [self.kernel_size, self.ramdisk_size, self.second_size] {
            length = length
                .checked_add(round_up(u64::from(size), page).ok_or_else(overflow)?)
                .ok_or_else(overflow)?;
        }

        // Already page aligned; kept so the arithmetic matches mkbootimg's
        round_up(length, page).ok_or_else(overflow)
    }
}

/// Whether `data` begins with the boot image magic.
pub fn has_boot_magic(data: &[u8]) -> bool {
    data.starts_with(BOOT_MAGIC)
}

/// Compute the signable length of a boot image.
///
/// The result is guaranteed to lie in `[page_size, data.len()]`.
///
/// # Errors
///
/// - [`Error::BadMagic`] / [`Error::InvalidHeader`] from header parsing
/// - [`Error::TruncatedImage`] if the header describes more than `data` holds
/// - [`Error::InvalidHeader`] if the length is below one page
pub fn compute_signable_length(data: &[u8]) -> Result<usize> {
    let header = BootImageHeader::parse(data)?;
    let length = header.signable_length()?;

    if length < u64::from(header.page_size) {
        return Err(Error::InvalidHeader(format!(
            "signable length {} is smaller than page size {}",
            length, header.page_size
        )));
    }

    match usize::try_from(length) {
        Ok(length) if length <= data.len() => Ok(length),
        _ => Err(Error::TruncatedImage {
            signable: usize::try_from(length).unwrap_or(usize::MAX),
            actual: data.len(),
        }),
    }
}

/// Rounds a value up to the next multiple of `page`.
fn round_up(value: u64, page: u64) -> Option<u64> {
    value.checked_add(page - 1).map(|v| v / page * page)
}

/// Reads a little-endian u32 at the given offset.
fn read_u32_le(data: &[u8], offset: usize) -> Option<u32> {
    let bytes: [u8; 4] = data.get(offset..offset + 4)?.try_into().ok()?;
    Some(u32::from_le_bytes(bytes))
}
