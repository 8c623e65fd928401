use log::debug;

use crate::models::{DateFormat, DriverLicenseRecord, Sex};
use crate::processing::date_normalizer::DateNormalizer;
use crate::processing::tag_extractor::{at_field_boundary, TagExtractor};

pub const AUXILIARY_TAG: &str = "ANS";
pub const DOCUMENT_NUMBER_TAG: &str = "DAQ";

// Data element identifiers from the AAMVA DL/ID card design standard,
// including the pre-2009 name elements.
const AAMVA_TAGS: &[&str] = &[
    "DAA", "DAB", "DAC", "DAD", "DAE", "DAF", "DAG", "DAH", "DAI", "DAJ", "DAK", "DAL", "DAM",
    "DAN", "DAO", "DAP", "DAQ", "DAR", "DAS", "DAT", "DAU", "DAV", "DAW", "DAX", "DAY", "DAZ",
    "DBA", "DBB", "DBC", "DBD", "DBE", "DBF", "DBG", "DBH", "DBI", "DBJ", "DBK", "DBL", "DBM",
    "DBN", "DBO", "DBP", "DBQ", "DBR", "DBS", "DCA", "DCB", "DCD", "DCE", "DCF", "DCG", "DCH",
    "DCI", "DCJ", "DCK", "DCL", "DCM", "DCN", "DCO", "DCP", "DCQ", "DCR", "DCS", "DCT", "DCU",
    "DDA", "DDB", "DDC", "DDD", "DDE", "DDF", "DDG", "DDH", "DDI", "DDJ", "DDK", "DDL",
    AUXILIARY_TAG,
];

// Placeholders jurisdictions write for absent name components.
const ABSENT_MARKERS: &[&str] = &["NONE", "UNAVL", "UNAVAILABLE"];

/// Parses decoded PDF417 driver-license text.
#[derive(Debug, Clone)]
pub struct AamvaParser {
    extractor: TagExtractor,
}

impl Default for AamvaParser {
    fn default() -> Self {
        Self::new()
    }
}

impl AamvaParser {
    pub fn new() -> Self {
        AamvaParser {
            extractor: TagExtractor::new(AAMVA_TAGS.iter().copied()).with_jurisdiction_prefix('Z'),
        }
    }

    /// Never fails: fields that cannot be read are left empty, dates that
    /// cannot be normalized keep their raw value.
    pub fn parse(&self, raw: &str) -> DriverLicenseRecord {
        let top_level = mask_auxiliary(raw);
        let mut fields = self.extractor.extract_all(&top_level);
        fields.remove(AUXILIARY_TAG);

        let document_number = match fields.get(DOCUMENT_NUMBER_TAG) {
            Some(number) => Some(number.clone()),
            None => self.embedded_document_number(raw),
        };

        let field = |tag: &str| fields.get(tag).cloned();
        let name_part = |tag: &str| fields.get(tag).and_then(|v| present(v));

        let mut first_name = name_part("DAC");
        let mut middle_name = name_part("DAD");
        let mut last_name = name_part("DCS");

        if first_name.is_none() {
            if let Some(given) = name_part("DCT") {
                let given = given.replace(',', " ");
                let mut parts = given.split_whitespace();
                first_name = parts.next().map(str::to_string);
                if middle_name.is_none() {
                    let rest: Vec<&str> = parts.collect();
                    if !rest.is_empty() {
                        middle_name = Some(rest.join(" "));
                    }
                }
            }
        }

        let mut full_name = None;
        if first_name.is_none() && middle_name.is_none() && last_name.is_none() {
            if let Some(legacy) = name_part("DAA") {
                if legacy.contains(',') {
                    let mut parts = legacy.split(',').map(present);
                    last_name = parts.next().flatten();
                    first_name = parts.next().flatten();
                    middle_name = parts.next().flatten();
                } else {
                    full_name = Some(legacy);
                }
            }
        }

        let full_name = full_name.unwrap_or_else(|| {
            [&first_name, &middle_name, &last_name]
                .into_iter()
                .flatten()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(" ")
        });

        let country = field("DCG");
        let hint = match country.as_deref() {
            Some("CAN") => DateFormat::Generic,
            _ => DateFormat::Usa,
        };
        let date = |tag: &str| {
            fields.get(tag).map(|value| {
                DateNormalizer::normalize_lenient(value, hint).unwrap_or_else(|| {
                    debug!("Keeping raw {} value {:?}", tag, value);
                    value.clone()
                })
            })
        };

        DriverLicenseRecord {
            raw_text: raw.to_string(),
            full_name,
            first_name,
            middle_name,
            last_name,
            date_of_birth: date("DBB"),
            issue_date: date("DBD"),
            expiry_date: date("DBA"),
            document_number,
            sex: fields.get("DBC").map(|code| Sex::from_aamva(code)),
            street: field("DAG"),
            city: field("DAI"),
            state: field("DAJ"),
            postal_code: field("DAK"),
            country,
            fields,
        }
    }

    // Document number nested in an auxiliary subfield, searched only after the marker.
    fn embedded_document_number(&self, raw: &str) -> Option<String> {
        auxiliary_positions(raw).find_map(|pos| {
            let nested = &raw[pos + AUXILIARY_TAG.len()..];
            self.extractor.extract(nested, DOCUMENT_NUMBER_TAG)
        })
    }
}

fn present(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty()
        || ABSENT_MARKERS
            .iter()
            .any(|marker| value.eq_ignore_ascii_case(marker))
    {
        None
    } else {
        Some(value.to_string())
    }
}

// Starts of auxiliary subfields; the marker only counts where a field begins.
fn auxiliary_positions(raw: &str) -> impl Iterator<Item = usize> + '_ {
    raw.match_indices(AUXILIARY_TAG)
        .map(|(pos, _)| pos)
        .filter(move |&pos| at_field_boundary(raw, pos))
}

// Blanks each auxiliary subfield token so nested tags are not read as top-level.
fn mask_auxiliary(raw: &str) -> String {
    let mut masked = String::with_capacity(raw.len());
    let mut copied = 0;

    for pos in auxiliary_positions(raw) {
        if pos < copied {
            continue;
        }
        masked.push_str(&raw[copied..pos]);
        let token = &raw[pos..];
        let end = token
            .char_indices()
            .find(|(_, c)| c.is_whitespace())
            .map_or(token.len(), |(i, _)| i);
        masked.push(' ');
        copied = pos + end;
    }
    masked.push_str(&raw[copied..]);

    masked
}
