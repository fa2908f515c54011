pub mod cert;
pub mod identity;

pub use cert::RsaSigningIdentity;
pub use identity::SigningIdentity;
