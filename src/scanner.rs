use chrono::NaiveDate;
use log::info;
use std::sync::Arc;

use crate::config::ScannerConfig;
use crate::models::{DriverLicenseRecord, IdentityRecord};
use crate::processing::aamva::AamvaParser;
use crate::processing::date_normalizer::DateNormalizer;
use crate::processing::secure_qr::SecureQrDecoder;
use crate::utils::Result;
use crate::validation::expiry::{ExpiryValidationResult, ExpiryValidator};
use crate::validation::trust_store::CertificateTrustStore;

/// Entry point wiring configuration, the trust store and the parsers.
pub struct DocumentScanner {
    config: ScannerConfig,
    qr_decoder: SecureQrDecoder,
    aamva_parser: AamvaParser,
}

impl DocumentScanner {
    /// Reads the trust store directory once; a missing directory leaves it empty.
    pub fn new(config: ScannerConfig) -> Self {
        let store = match &config.trust_store_dir {
            Some(dir) => CertificateTrustStore::load_dir(dir),
            None => {
                info!("No trust store configured; QR signatures will not be verified");
                CertificateTrustStore::empty()
            }
        };
        Self::with_trust_store(config, store)
    }

    pub fn with_trust_store(config: ScannerConfig, store: CertificateTrustStore) -> Self {
        let store = match &config.default_certificate_id {
            Some(id) => store.with_default_id(id.clone()),
            None => store,
        };
        let qr_decoder = SecureQrDecoder::new(Arc::new(store))
            .with_max_decompressed(config.max_decompressed_bytes);

        DocumentScanner {
            config,
            qr_decoder,
            aamva_parser: AamvaParser::new(),
        }
    }

    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    pub fn decode_qr(&self, raw: &str) -> IdentityRecord {
        self.qr_decoder.decode(raw)
    }

    pub fn parse_license(&self, raw: &str) -> DriverLicenseRecord {
        self.aamva_parser.parse(raw)
    }

    /// Strict normalization with the configured date format.
    pub fn normalize_date(&self, raw: &str) -> Result<String> {
        DateNormalizer::normalize(raw, self.config.date_format)
    }

    pub fn check_license_expiry(
        &self,
        record: &DriverLicenseRecord,
        today: NaiveDate,
    ) -> ExpiryValidationResult {
        ExpiryValidator::validate_license(record, today)
    }
}
