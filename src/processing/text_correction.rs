// OCR character correction for numeric fields
// Scanned dates routinely come back with letters that look like digits

use lazy_static::lazy_static;
use std::collections::HashMap;

lazy_static! {
    // Letters the recognizer confuses with digits, mapped to the digit they stand for
    pub static ref DIGIT_CONFUSIONS: HashMap<char, char> = {
        let mut m = HashMap::new();
        m.insert('O', '0');
        m.insert('o', '0');
        m.insert('D', '0');
        m.insert('Q', '0');
        m.insert('I', '1');
        m.insert('l', '1');
        m.insert('i', '1');
        m.insert('|', '1');
        m.insert('Z', '2');
        m.insert('z', '2');
        m.insert('S', '5');
        m.insert('s', '5');
        m.insert('G', '6');
        m.insert('b', '6');
        m.insert('B', '8');
        m.insert('g', '9');
        m.insert('q', '9');
        m
    };
}

/// Replaces confusable letters with digits when the token is a numeric group.
///
/// A token qualifies when every character is a digit or a known confusion and
/// at least one character is an actual digit, or when it is made only of
/// confusions and is at least two characters long (e.g. "OI" read from "01").
/// Anything else is returned unchanged.
pub fn correct_numeric_token(token: &str) -> String {
    let all_candidates = !token.is_empty()
        && token
            .chars()
            .all(|c| c.is_ascii_digit() || DIGIT_CONFUSIONS.contains_key(&c));
    if !all_candidates {
        return token.to_string();
    }

    let digit_count = token.chars().filter(|c| c.is_ascii_digit()).count();
    if digit_count == 0 && token.chars().count() < 2 {
        return token.to_string();
    }

    token
        .chars()
        .map(|c| *DIGIT_CONFUSIONS.get(&c).unwrap_or(&c))
        .collect()
}

/// Applies [`correct_numeric_token`] to each alphanumeric run, keeping separators.
pub fn correct_date_text(text: &str) -> String {
    let mut corrected = String::with_capacity(text.len());
    let mut token = String::new();

    for c in text.chars() {
        if c.is_ascii_alphanumeric() || c == '|' {
            token.push(c);
        } else {
            corrected.push_str(&correct_numeric_token(&token));
            token.clear();
            corrected.push(c);
        }
    }
    corrected.push_str(&correct_numeric_token(&token));

    corrected
}
