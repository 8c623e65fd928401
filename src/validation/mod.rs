pub mod expiry;
pub mod signature;
pub mod trust_store;

pub use expiry::ExpiryValidator;
pub use signature::SignatureVerifier;
pub use trust_store::CertificateTrustStore;
