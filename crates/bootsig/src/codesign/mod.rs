//! Boot signature structures, DER codec and constants

pub mod constants;
pub mod der;
pub mod signature;

pub use signature::{AlgorithmIdentifier, AuthenticatedAttributes, BootSignature, VerifiedSignature};
