//! Android boot image layout and signing

pub mod boot;
pub mod header;

pub use boot::BootImage;
pub use header::{compute_signable_length, BootImageHeader};
