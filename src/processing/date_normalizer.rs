use lazy_static::lazy_static;
use log::debug;
use regex::Regex;

use crate::models::{DateFormat, NormalizedDate};
use crate::processing::text_correction::correct_date_text;
use crate::utils::{DocumentError, Result};

lazy_static! {
    static ref NUMERIC_DATE: Regex =
        Regex::new(r"^([0-9]{1,4})([/\-. ]+)([0-9]{1,2})([/\-. ]+)([0-9]{1,4})$").unwrap();
    static ref COMPACT_DATE: Regex = Regex::new(r"^[0-9]{8}$").unwrap();
    static ref STRICT_DATE: Regex = Regex::new(r"^([0-9]{2})/([0-9]{2})/([0-9]{4})$").unwrap();
    static ref YEAR_FIRST_PAIR: Regex =
        Regex::new(r"(?:^|[^0-9])[0-9]{4}[/\-. ]+([0-9]{1,2})[/\-. ]+([0-9]{1,2})(?:[^0-9]|$)").unwrap();
    static ref LEADING_PAIR: Regex =
        Regex::new(r"(?:^|[^0-9])([0-9]{1,2})[/\-. ]+([0-9]{1,2})[/\-. ]+[0-9]{2,4}(?:[^0-9]|$)").unwrap();
    static ref ORDINAL_DAY: Regex = Regex::new(r"^([0-9]{1,2})(?:st|nd|rd|th)?$").unwrap();
}

/// Turns raw, possibly OCR-damaged date tokens into calendar dates.
pub struct DateNormalizer;

impl DateNormalizer {
    /// Normalizes `raw` and renders it in the display convention of `hint`.
    ///
    /// Fails with [`DocumentError::InvalidDate`] when no reading allowed by
    /// the hint gives a calendar-valid date.
    pub fn normalize(raw: &str, hint: DateFormat) -> Result<String> {
        Self::normalize_date(raw, hint).map(|date| date.render(hint))
    }

    /// Best-effort variant for scanned payloads: `None` instead of an error.
    pub fn normalize_lenient(raw: &str, hint: DateFormat) -> Option<String> {
        match Self::normalize(raw, hint) {
            Ok(date) => Some(date),
            Err(err) => {
                debug!("Lenient date normalization failed: {}", err);
                None
            }
        }
    }

    /// Accepts only canonical `DD/MM/YYYY`; anything else is `None`.
    pub fn parse_strict(raw: &str) -> Option<NormalizedDate> {
        let caps = STRICT_DATE.captures(raw)?;
        let day = caps[1].parse().ok()?;
        let month = caps[2].parse().ok()?;
        let year = caps[3].parse().ok()?;
        NormalizedDate::new(year, month, day).ok()
    }

    /// True when the day and month groups are both 12 or less.
    pub fn is_ambiguous(raw: &str) -> bool {
        let corrected = correct_date_text(raw.trim());
        let caps = YEAR_FIRST_PAIR
            .captures(&corrected)
            .or_else(|| LEADING_PAIR.captures(&corrected));

        match caps {
            Some(caps) => {
                let first: u32 = caps[1].parse().unwrap_or(u32::MAX);
                let second: u32 = caps[2].parse().unwrap_or(u32::MAX);
                first <= 12 && second <= 12
            }
            None => false,
        }
    }

    pub fn normalize_date(raw: &str, hint: DateFormat) -> Result<NormalizedDate> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(DocumentError::InvalidDate("empty date".to_string()));
        }

        let corrected = correct_date_text(trimmed);
        let result = if has_month_name(&corrected) {
            Self::parse_textual(&corrected)
        } else if COMPACT_DATE.is_match(&corrected) {
            Self::parse_compact(&corrected, hint)
        } else {
            Self::parse_numeric(&corrected, hint)
        };

        result.ok_or_else(|| DocumentError::InvalidDate(raw.to_string()))
    }

    // Day and year around an English month name, in either order.
    fn parse_textual(text: &str) -> Option<NormalizedDate> {
        let mut month = None;
        let mut numbers = Vec::new();

        for token in text
            .split(|c: char| !c.is_ascii_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            if let Some(m) = month_from_name(token) {
                if month.replace(m).is_some() {
                    return None;
                }
            } else {
                numbers.push(token);
            }
        }

        let month = month?;
        if numbers.len() != 2 {
            return None;
        }

        let (day_token, year_token) = if numbers[0].len() == 4 {
            (numbers[1], numbers[0])
        } else {
            (numbers[0], numbers[1])
        };
        let day: u32 = ORDINAL_DAY.captures(day_token)?[1].parse().ok()?;
        if year_token.len() != 4 {
            return None;
        }
        let year: i32 = year_token.parse().ok()?;

        NormalizedDate::new(year, month, day).ok()
    }

    fn parse_numeric(text: &str, hint: DateFormat) -> Option<NormalizedDate> {
        let caps = NUMERIC_DATE.captures(text)?;
        if !separators_allowed(&caps[2], &caps[4], hint) {
            return None;
        }

        let first = &caps[1];
        let second: u32 = caps[3].parse().ok()?;
        let third = &caps[5];

        if first.len() == 4 {
            let year: i32 = first.parse().ok()?;
            let last: u32 = third.parse().ok()?;
            if third.len() > 2 {
                return None;
            }
            let (month, day) = match hint {
                DateFormat::India => (last, second),
                DateFormat::Usa | DateFormat::Generic => (second, last),
            };
            return NormalizedDate::new(year, month, day)
                .or_else(|_| NormalizedDate::new(year, day, month))
                .ok();
        }

        if first.len() > 2 || third.len() != 4 {
            return None;
        }
        let lead: u32 = first.parse().ok()?;
        let year: i32 = third.parse().ok()?;
        let (month, day) = match hint {
            DateFormat::Usa => (lead, second),
            DateFormat::India | DateFormat::Generic => (second, lead),
        };
        NormalizedDate::new(year, month, day).ok()
    }

    // MMDDYYYY or DDMMYYYY per hint, then YYYYMMDD.
    fn parse_compact(text: &str, hint: DateFormat) -> Option<NormalizedDate> {
        let a: u32 = text[0..2].parse().ok()?;
        let b: u32 = text[2..4].parse().ok()?;
        let tail_year: i32 = text[4..8].parse().ok()?;

        let (month, day) = match hint {
            DateFormat::Usa => (a, b),
            DateFormat::India | DateFormat::Generic => (b, a),
        };
        NormalizedDate::new(tail_year, month, day)
            .or_else(|_| {
                let year: i32 = text[0..4].parse().unwrap_or_default();
                let month: u32 = text[4..6].parse().unwrap_or_default();
                let day: u32 = text[6..8].parse().unwrap_or_default();
                NormalizedDate::new(year, month, day)
            })
            .ok()
    }
}

fn separators_allowed(first: &str, second: &str, hint: DateFormat) -> bool {
    match hint {
        DateFormat::Usa | DateFormat::India => {
            first == second && (first == "/" || first == "-")
        }
        DateFormat::Generic => true,
    }
}

fn has_month_name(text: &str) -> bool {
    text.split(|c: char| !c.is_ascii_alphanumeric())
        .any(|token| month_from_name(token).is_some())
}

fn month_from_name(token: &str) -> Option<u32> {
    let month = match token.to_lowercase().as_str() {
        "jan" | "january" => 1,
        "feb" | "february" => 2,
        "mar" | "march" => 3,
        "apr" | "april" => 4,
        "may" => 5,
        "jun" | "june" => 6,
        "jul" | "july" => 7,
        "aug" | "august" => 8,
        "sep" | "sept" | "september" => 9,
        "oct" | "october" => 10,
        "nov" | "november" => 11,
        "dec" | "december" => 12,
        _ => return None,
    };
    Some(month)
}
