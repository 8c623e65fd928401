use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::utils::{DocumentError, Result};

/// Convention used to read (and render) numeric day/month order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateFormat {
    /// Month first, `/` or `-` separated.
    Usa,
    /// Day first, `/` or `-` separated.
    India,
    /// Day first, any of `/ - .` or spaces as separators.
    #[default]
    Generic,
}

impl FromStr for DateFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "usa" | "us" => Ok(DateFormat::Usa),
            "india" | "in" => Ok(DateFormat::India),
            "generic" => Ok(DateFormat::Generic),
            other => Err(format!("unknown date format: {}", other)),
        }
    }
}

/// A calendar date inside the plausible document window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NormalizedDate {
    date: NaiveDate,
}

impl NormalizedDate {
    pub const MIN_YEAR: i32 = 1900;
    pub const MAX_YEAR: i32 = 2100;

    /// Rejects months outside 1-12, days past the month length (leap years
    /// honored) and years outside the plausibility window.
    pub fn new(year: i32, month: u32, day: u32) -> Result<Self> {
        if !(Self::MIN_YEAR..=Self::MAX_YEAR).contains(&year) {
            return Err(DocumentError::InvalidDate(format!(
                "year {} outside {}-{}",
                year,
                Self::MIN_YEAR,
                Self::MAX_YEAR
            )));
        }
        NaiveDate::from_ymd_opt(year, month, day)
            .map(|date| NormalizedDate { date })
            .ok_or_else(|| {
                DocumentError::InvalidDate(format!("{:02}/{:02}/{:04}", day, month, year))
            })
    }

    pub fn year(&self) -> i32 {
        self.date.year()
    }

    pub fn month(&self) -> u32 {
        self.date.month()
    }

    pub fn day(&self) -> u32 {
        self.date.day()
    }

    pub fn as_naive(&self) -> NaiveDate {
        self.date
    }

    /// Both components fit in 1-12, so the opposite convention also reads as a date.
    pub fn is_ambiguous(&self) -> bool {
        self.day() <= 12 && self.month() <= 12
    }

    /// Renders in the display convention of `format`.
    pub fn render(&self, format: DateFormat) -> String {
        match format {
            DateFormat::Usa => format!("{:02}/{:02}/{:04}", self.month(), self.day(), self.year()),
            DateFormat::India | DateFormat::Generic => self.to_string(),
        }
    }
}

impl fmt::Display for NormalizedDate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:02}/{:02}/{:04}", self.day(), self.month(), self.year())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "form", content = "value", rename_all = "lowercase")]
pub enum UniqueIdentifier {
    /// The complete 12 digit number.
    Full(String),
    /// Only the trailing 4 digits are carried.
    Reference(String),
}

impl UniqueIdentifier {
    pub fn last_digits(&self) -> &str {
        match self {
            UniqueIdentifier::Full(value) => &value[value.len().saturating_sub(4)..],
            UniqueIdentifier::Reference(value) => value,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AddressParts {
    pub house: Option<String>,
    pub street: Option<String>,
    pub landmark: Option<String>,
    pub location: Option<String>,
    pub vtc: Option<String>,
    pub post_office: Option<String>,
    pub sub_district: Option<String>,
    pub district: Option<String>,
    pub state: Option<String>,
}

impl AddressParts {
    /// Joins the non-empty components, leading with the care-of line when given.
    pub fn compose(&self, care_of: Option<&str>) -> Option<String> {
        let parts: Vec<&str> = [
            care_of,
            self.house.as_deref(),
            self.street.as_deref(),
            self.landmark.as_deref(),
            self.location.as_deref(),
            self.vtc.as_deref(),
            self.post_office.as_deref(),
            self.sub_district.as_deref(),
            self.district.as_deref(),
            self.state.as_deref(),
        ]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect();

        if parts.is_empty() {
            None
        } else {
            Some(parts.join(", "))
        }
    }
}

/// Result of decoding a Secure QR payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IdentityRecord {
    /// Verbatim caller input, populated on every path.
    pub raw_qr_data: String,
    pub version: Option<String>,
    pub name: Option<String>,
    pub date_of_birth: Option<String>,
    pub gender: Option<String>,
    pub care_of: Option<String>,
    pub address: Option<String>,
    pub address_parts: AddressParts,
    pub postal_code: Option<String>,
    pub masked_document_number: Option<String>,
    pub unique_identifier: Option<UniqueIdentifier>,
    pub enrollment_reference: Option<String>,
    pub mobile_last_digits: Option<String>,
    #[serde(serialize_with = "serialize_timestamp")]
    pub issued_at: Option<NaiveDateTime>,
    #[serde(serialize_with = "serialize_base64")]
    pub photo: Option<Vec<u8>>,
    #[serde(serialize_with = "serialize_base64")]
    pub email_hash: Option<Vec<u8>>,
    #[serde(serialize_with = "serialize_base64")]
    pub mobile_hash: Option<Vec<u8>>,
    #[serde(serialize_with = "serialize_base64")]
    pub signature: Option<Vec<u8>>,
    pub certificate_id: Option<String>,
    pub signature_valid: bool,
}

impl IdentityRecord {
    /// Record carrying only the caller's input; every structured field empty.
    pub fn raw_only(raw: &str) -> Self {
        IdentityRecord {
            raw_qr_data: raw.to_string(),
            ..Default::default()
        }
    }

    pub fn has_fields(&self) -> bool {
        self.name.is_some() || self.enrollment_reference.is_some()
    }

    /// Checks a mobile number against the embedded hash.
    pub fn matches_mobile(&self, mobile: &str) -> bool {
        match &self.mobile_hash {
            Some(hash) => self.contact_digest(mobile.trim()).as_deref() == Some(hash.as_slice()),
            None => false,
        }
    }

    /// Checks an email address against the embedded hash.
    pub fn matches_email(&self, email: &str) -> bool {
        match &self.email_hash {
            Some(hash) => self.contact_digest(email.trim()).as_deref() == Some(hash.as_slice()),
            None => false,
        }
    }

    // SHA-256 applied as many times as the last document digit, at least once.
    fn contact_digest(&self, value: &str) -> Option<Vec<u8>> {
        let last = self
            .unique_identifier
            .as_ref()?
            .last_digits()
            .chars()
            .last()?
            .to_digit(10)?;
        let rounds = last.max(1);

        let mut digest = Sha256::digest(value.as_bytes()).to_vec();
        for _ in 1..rounds {
            digest = Sha256::digest(hex(&digest).as_bytes()).to_vec();
        }
        Some(digest)
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

fn serialize_base64<S: Serializer>(
    value: &Option<Vec<u8>>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    match value {
        Some(bytes) => serializer.serialize_some(&STANDARD.encode(bytes)),
        None => serializer.serialize_none(),
    }
}

fn serialize_timestamp<S: Serializer>(
    value: &Option<NaiveDateTime>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    match value {
        Some(ts) => serializer.serialize_some(&ts.format("%Y-%m-%dT%H:%M:%S%.3f").to_string()),
        None => serializer.serialize_none(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Sex {
    Male,
    Female,
    NotSpecified,
    Other(String),
}

impl Sex {
    /// AAMVA `DBC` encoding.
    pub fn from_aamva(code: &str) -> Self {
        match code.trim() {
            "1" | "M" => Sex::Male,
            "2" | "F" => Sex::Female,
            "9" | "X" => Sex::NotSpecified,
            other => Sex::Other(other.to_string()),
        }
    }
}

/// Result of parsing an AAMVA barcode payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DriverLicenseRecord {
    pub raw_text: String,
    pub full_name: String,
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub date_of_birth: Option<String>,
    pub issue_date: Option<String>,
    pub expiry_date: Option<String>,
    pub document_number: Option<String>,
    pub sex: Option<Sex>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub fields: BTreeMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_out_of_range_components() {
        assert!(NormalizedDate::new(1979, 13, 1).is_err());
        assert!(NormalizedDate::new(1979, 4, 31).is_err());
        assert!(NormalizedDate::new(1899, 1, 1).is_err());
        assert!(NormalizedDate::new(2023, 2, 29).is_err());
        assert!(NormalizedDate::new(2024, 2, 29).is_ok());
    }

    #[test]
    fn test_render_follows_convention() {
        let date = NormalizedDate::new(1979, 5, 22).unwrap();
        assert_eq!(date.to_string(), "22/05/1979");
        assert_eq!(date.render(DateFormat::Usa), "05/22/1979");
        assert_eq!(date.render(DateFormat::India), "22/05/1979");
        assert!(!date.is_ambiguous());
        assert!(NormalizedDate::new(1979, 6, 5).unwrap().is_ambiguous());
    }

    #[test]
    fn test_address_skips_empty_parts() {
        let parts = AddressParts {
            house: Some("12".to_string()),
            street: Some("".to_string()),
            district: Some("Pune".to_string()),
            state: Some("Maharashtra".to_string()),
            ..Default::default()
        };
        assert_eq!(
            parts.compose(Some("S/O Ram")),
            Some("S/O Ram, 12, Pune, Maharashtra".to_string())
        );
        assert_eq!(AddressParts::default().compose(None), None);
    }

    #[test]
    fn test_mobile_hash_rounds_follow_last_digit() {
        let mobile = "9800000000";
        let first = Sha256::digest(mobile.as_bytes()).to_vec();
        let second = Sha256::digest(hex(&first).as_bytes()).to_vec();

        let record = IdentityRecord {
            unique_identifier: Some(UniqueIdentifier::Reference("1232".to_string())),
            mobile_hash: Some(second),
            ..Default::default()
        };
        assert!(record.matches_mobile(mobile));
        assert!(!record.matches_mobile("9811111111"));
        assert!(!record.matches_email("someone@example.com"));
    }

    #[test]
    fn test_sex_codes() {
        assert_eq!(Sex::from_aamva("1"), Sex::Male);
        assert_eq!(Sex::from_aamva("2"), Sex::Female);
        assert_eq!(Sex::from_aamva("9"), Sex::NotSpecified);
        assert_eq!(Sex::from_aamva("U"), Sex::Other("U".to_string()));
    }
}
