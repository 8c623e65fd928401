use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::models::DateFormat;
use crate::processing::secure_qr::DEFAULT_MAX_DECOMPRESSED;
use crate::utils::{DocumentError, Result};

fn default_max_decompressed_bytes() -> usize {
    DEFAULT_MAX_DECOMPRESSED
}

/// Scanner settings, read from a JSON file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// Directory of certificate files; none means signatures are never verified.
    #[serde(default)]
    pub trust_store_dir: Option<PathBuf>,
    /// Certificate used for payloads that carry no identifier.
    #[serde(default)]
    pub default_certificate_id: Option<String>,
    #[serde(default)]
    pub date_format: DateFormat,
    #[serde(default = "default_max_decompressed_bytes")]
    pub max_decompressed_bytes: usize,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        ScannerConfig {
            trust_store_dir: None,
            default_certificate_id: None,
            date_format: DateFormat::default(),
            max_decompressed_bytes: DEFAULT_MAX_DECOMPRESSED,
        }
    }
}

impl ScannerConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        let config: ScannerConfig = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_decompressed_bytes == 0 {
            return Err(DocumentError::Config(
                "max_decompressed_bytes must be greater than zero".to_string(),
            ));
        }
        if let Some(id) = &self.default_certificate_id {
            if id.trim().is_empty() {
                return Err(DocumentError::Config(
                    "default_certificate_id must not be blank".to_string(),
                ));
            }
        }
        Ok(())
    }
}
