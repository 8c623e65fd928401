use log::{debug, info, warn};
use rsa::pkcs1::DecodeRsaPublicKey;
use rsa::pkcs8::DecodePublicKey;
use rsa::RsaPublicKey;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use x509_parser::pem::parse_x509_pem;

use crate::utils::{DocumentError, Result};

/// Public keys of the issuing authority, keyed by certificate identifier.
///
/// Populated once and read-only afterwards, so one store can be shared by
/// any number of decoders.
#[derive(Debug, Clone, Default)]
pub struct CertificateTrustStore {
    keys: BTreeMap<String, RsaPublicKey>,
    default_id: Option<String>,
}

impl CertificateTrustStore {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_keys<I>(keys: I) -> Self
    where
        I: IntoIterator<Item = (String, RsaPublicKey)>,
    {
        CertificateTrustStore {
            keys: keys.into_iter().collect(),
            default_id: None,
        }
    }

    /// Loads every certificate file in `dir`, keyed by file stem.
    ///
    /// A missing directory or an unreadable file only shrinks the store.
    pub fn load_dir(dir: &Path) -> Self {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(err) => {
                warn!("Trust store directory {:?} unavailable: {}", dir, err);
                return Self::empty();
            }
        };

        let mut paths: Vec<_> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file())
            .collect();
        paths.sort();

        let mut keys = BTreeMap::new();
        for path in paths {
            let Some(id) = path.file_stem().map(|s| s.to_string_lossy().into_owned()) else {
                continue;
            };
            match fs::read(&path)
                .map_err(DocumentError::from)
                .and_then(|data| parse_public_key(&data))
            {
                Ok(key) => {
                    debug!("Loaded certificate {} from {:?}", id, path);
                    keys.insert(id, key);
                }
                Err(err) => warn!("Skipping certificate {:?}: {}", path, err),
            }
        }

        info!("Trust store loaded {} certificate(s) from {:?}", keys.len(), dir);
        Self::from_keys(keys)
    }

    /// Identifier used when a payload names no certificate.
    pub fn with_default_id(mut self, id: impl Into<String>) -> Self {
        self.default_id = Some(id.into());
        self
    }

    /// The configured default, otherwise the greatest identifier (the latest
    /// under date-suffixed file naming).
    pub fn default_id(&self) -> Option<&str> {
        self.default_id
            .as_deref()
            .or_else(|| self.keys.keys().next_back().map(String::as_str))
    }

    /// Looks up `id`, or the default identifier when `id` is `None`.
    pub fn resolve<'a>(&'a self, id: Option<&'a str>) -> Option<(&'a str, &'a RsaPublicKey)> {
        let id = id.or_else(|| self.default_id())?;
        self.keys.get(id).map(|key| (id, key))
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.keys.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Reads an RSA public key from an X.509 certificate (PEM or DER), a
/// SubjectPublicKeyInfo PEM, or a PKCS#1 public key PEM.
pub fn parse_public_key(data: &[u8]) -> Result<RsaPublicKey> {
    if let Ok(text) = std::str::from_utf8(data) {
        if text.contains("-----BEGIN CERTIFICATE-----") {
            let (_, pem) = parse_x509_pem(data)
                .map_err(|e| DocumentError::Certificate(format!("bad PEM: {:?}", e)))?;
            let cert = pem
                .parse_x509()
                .map_err(|e| DocumentError::Certificate(format!("bad certificate: {:?}", e)))?;
            debug!("Certificate subject {} valid until {}", cert.subject(), cert.validity().not_after);
            return key_from_spki(cert.public_key().raw);
        }
        if text.contains("-----BEGIN PUBLIC KEY-----") {
            return RsaPublicKey::from_public_key_pem(text.trim())
                .map_err(|e| DocumentError::Certificate(e.to_string()));
        }
        if text.contains("-----BEGIN RSA PUBLIC KEY-----") {
            return RsaPublicKey::from_pkcs1_pem(text.trim())
                .map_err(|e| DocumentError::Certificate(e.to_string()));
        }
    }

    match x509_parser::parse_x509_certificate(data) {
        Ok((_, cert)) => key_from_spki(cert.public_key().raw),
        Err(_) => key_from_spki(data),
    }
}

fn key_from_spki(der: &[u8]) -> Result<RsaPublicKey> {
    RsaPublicKey::from_public_key_der(der).map_err(|e| DocumentError::Certificate(e.to_string()))
}
