use log::{debug, warn};
use rsa::pkcs1v15::{Signature, VerifyingKey};
use rsa::signature::Verifier;
use rsa::RsaPublicKey;
use sha2::Sha256;
use std::sync::Arc;

use crate::utils::{DocumentError, Result};
use crate::validation::trust_store::CertificateTrustStore;

/// Outcome of a best-effort signature check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureCheck {
    /// Identifier the key was looked up under, when one could be determined.
    pub certificate_id: Option<String>,
    /// True only after a verification that ran and passed.
    pub valid: bool,
}

/// Checks SHA256withRSA (PKCS#1 v1.5) signatures against a trust store.
#[derive(Debug, Clone)]
pub struct SignatureVerifier {
    trust_store: Arc<CertificateTrustStore>,
}

impl SignatureVerifier {
    pub fn new(trust_store: Arc<CertificateTrustStore>) -> Self {
        SignatureVerifier { trust_store }
    }

    pub fn trust_store(&self) -> &CertificateTrustStore {
        &self.trust_store
    }

    /// Never errors: a lookup miss, a missing or malformed signature, or a
    /// failed check all come back as `valid == false`.
    pub fn check(
        &self,
        certificate_id: Option<&str>,
        signed_data: &[u8],
        signature: Option<&[u8]>,
    ) -> SignatureCheck {
        let resolved_id = certificate_id
            .or_else(|| self.trust_store.default_id())
            .map(str::to_string);

        let Some(signature) = signature else {
            debug!("Payload carries no signature; verification skipped");
            return SignatureCheck { certificate_id: resolved_id, valid: false };
        };
        let Some((id, key)) = self.trust_store.resolve(certificate_id) else {
            debug!("No certificate for {:?}; verification skipped", resolved_id);
            return SignatureCheck { certificate_id: resolved_id, valid: false };
        };

        let valid = match verify_with_key(key, signed_data, signature) {
            Ok(()) => true,
            Err(err) => {
                warn!("Signature check against {} failed: {}", id, err);
                false
            }
        };
        SignatureCheck { certificate_id: Some(id.to_string()), valid }
    }
}

pub fn verify_with_key(key: &RsaPublicKey, data: &[u8], signature: &[u8]) -> Result<()> {
    let verifying_key = VerifyingKey::<Sha256>::new(key.clone());
    let signature =
        Signature::try_from(signature).map_err(|e| DocumentError::Signature(e.to_string()))?;
    verifying_key
        .verify(data, &signature)
        .map_err(|e| DocumentError::Signature(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rsa::pkcs1v15::SigningKey;
    use rsa::signature::{SignatureEncoding, Signer};
    use rsa::RsaPrivateKey;

    fn key_pair() -> (RsaPrivateKey, RsaPublicKey) {
        let private = RsaPrivateKey::new(&mut rand::thread_rng(), 1024).unwrap();
        let public = RsaPublicKey::from(&private);
        (private, public)
    }

    fn sign(private: &RsaPrivateKey, data: &[u8]) -> Vec<u8> {
        SigningKey::<Sha256>::new(private.clone()).sign(data).to_vec()
    }

    #[test]
    fn test_valid_signature() {
        let (private, public) = key_pair();
        let data = b"payload";
        let signature = sign(&private, data);
        assert!(verify_with_key(&public, data, &signature).is_ok());

        let store = CertificateTrustStore::from_keys([("current".to_string(), public)]);
        let verifier = SignatureVerifier::new(Arc::new(store));
        let check = verifier.check(None, data, Some(signature.as_slice()));
        assert!(check.valid);
        assert_eq!(check.certificate_id.as_deref(), Some("current"));
    }

    #[test]
    fn test_tampered_data_fails() {
        let (private, public) = key_pair();
        let signature = sign(&private, b"payload");
        assert!(verify_with_key(&public, b"payloaD", &signature).is_err());
        assert!(verify_with_key(&public, b"payload", &signature[1..]).is_err());
    }

    #[test]
    fn test_misses_are_false_not_errors() {
        let (private, public) = key_pair();
        let signature = sign(&private, b"payload");
        let verifier = SignatureVerifier::new(Arc::new(CertificateTrustStore::from_keys([(
            "current".to_string(),
            public,
        )])));

        let check = verifier.check(Some("other"), b"payload", Some(signature.as_slice()));
        assert!(!check.valid);
        assert_eq!(check.certificate_id.as_deref(), Some("other"));

        assert!(!verifier.check(None, b"payload", None).valid);
        assert!(!verifier.check(None, b"payload", Some(&b"short"[..])).valid);

        let empty = SignatureVerifier::new(Arc::new(CertificateTrustStore::empty()));
        let check = empty.check(None, b"payload", Some(signature.as_slice()));
        assert_eq!(check, SignatureCheck { certificate_id: None, valid: false });
    }
}
