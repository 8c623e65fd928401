use chrono::NaiveDate;

use crate::models::{DateFormat, DriverLicenseRecord, NormalizedDate};
use crate::processing::date_normalizer::DateNormalizer;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpiryValidationResult {
    pub is_valid: bool,
    pub not_expired: bool,
    pub issues: Vec<String>,
}

pub struct ExpiryValidator;

impl ExpiryValidator {
    /// A document stays valid through its expiry day.
    pub fn is_expired(expiry: &NormalizedDate, today: NaiveDate) -> bool {
        expiry.as_naive() < today
    }

    pub fn validate(expiry_raw: &str, hint: DateFormat, today: NaiveDate) -> ExpiryValidationResult {
        let mut issues = Vec::new();
        let mut not_expired = false;

        match DateNormalizer::normalize_date(expiry_raw, hint) {
            Ok(date) => {
                not_expired = !Self::is_expired(&date, today);
                if !not_expired {
                    issues.push(format!("Document expired on {}", date));
                }
            }
            Err(err) => issues.push(format!("Invalid expiry date: {}", err)),
        }

        ExpiryValidationResult {
            is_valid: not_expired,
            not_expired,
            issues,
        }
    }

    /// Checks the license expiry as rendered by the barcode parser.
    pub fn validate_license(record: &DriverLicenseRecord, today: NaiveDate) -> ExpiryValidationResult {
        let hint = match record.country.as_deref() {
            Some("CAN") => DateFormat::Generic,
            _ => DateFormat::Usa,
        };
        match &record.expiry_date {
            Some(expiry) => Self::validate(expiry, hint, today),
            None => ExpiryValidationResult {
                is_valid: false,
                not_expired: false,
                issues: vec!["Expiry date is missing".to_string()],
            },
        }
    }
}
