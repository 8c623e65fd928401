use std::collections::{BTreeMap, BTreeSet};

/// Scans flat text for fixed-width uppercase tags followed by a value.
///
/// A value runs from the end of its tag up to the first whitespace, the start
/// of another recognized tag, or the end of the text. Punctuation inside a
/// value is kept. Inside a value a tag only starts after a non-letter, so
/// names such as "MIDDLE" are not cut at an embedded tag.
#[derive(Debug, Clone)]
pub struct TagExtractor {
    tags: BTreeSet<String>,
    jurisdiction_prefix: Option<char>,
}

pub const TAG_LEN: usize = 3;

/// True at the start of `text` or right after whitespace or a control character.
pub fn at_field_boundary(text: &str, pos: usize) -> bool {
    text.get(..pos)
        .map_or(false, |head| {
            head.chars()
                .next_back()
                .map_or(true, |c| c.is_whitespace() || c.is_control())
        })
}

impl TagExtractor {
    pub fn new<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        TagExtractor {
            tags: tags.into_iter().map(Into::into).collect(),
            jurisdiction_prefix: None,
        }
    }

    /// Also treat any tag starting with `prefix` as recognized.
    pub fn with_jurisdiction_prefix(mut self, prefix: char) -> Self {
        self.jurisdiction_prefix = Some(prefix);
        self
    }

    pub fn is_recognized(&self, candidate: &str) -> bool {
        if candidate.len() != TAG_LEN || !candidate.bytes().all(|b| b.is_ascii_uppercase()) {
            return false;
        }
        self.tags.contains(candidate)
            || self
                .jurisdiction_prefix
                .map_or(false, |prefix| candidate.starts_with(prefix))
    }

    /// True when a recognized tag starts at byte `pos` and is followed by a value character.
    pub fn is_tag_at(&self, text: &str, pos: usize) -> bool {
        let Some(candidate) = text.get(pos..pos + TAG_LEN) else {
            return false;
        };
        if !self.is_recognized(candidate) {
            return false;
        }
        text[pos + TAG_LEN..]
            .chars()
            .next()
            .map_or(false, |c| !c.is_whitespace())
    }

    /// Value following the first occurrence of `tag`.
    ///
    /// Occurrences at a field boundary (start of text or after whitespace) are
    /// preferred over ones embedded in other text. Empty values are skipped.
    pub fn extract(&self, text: &str, tag: &str) -> Option<String> {
        if tag.is_empty() {
            return None;
        }
        let positions: Vec<usize> = text.match_indices(tag).map(|(pos, _)| pos).collect();

        positions
            .iter()
            .filter(|&&pos| at_field_boundary(text, pos))
            .chain(positions.iter().filter(|&&pos| !at_field_boundary(text, pos)))
            .find_map(|&pos| self.value_at(text, pos + tag.len()))
    }

    /// Runs [`extract`](Self::extract) for every recognized tag and keeps the hits.
    pub fn extract_all(&self, text: &str) -> BTreeMap<String, String> {
        self.tags
            .iter()
            .filter_map(|tag| self.extract(text, tag).map(|value| (tag.clone(), value)))
            .collect()
    }

    fn value_at(&self, text: &str, start: usize) -> Option<String> {
        let rest = text.get(start..)?;
        let mut end = rest.len();
        let mut prev: Option<char> = None;

        for (offset, c) in rest.char_indices() {
            if c.is_whitespace() {
                end = offset;
                break;
            }
            let after_letter = prev.map_or(false, |p| p.is_alphabetic());
            if offset > 0 && !after_letter && self.is_tag_at(text, start + offset) {
                end = offset;
                break;
            }
            prev = Some(c);
        }

        let value = &rest[..end];
        if value.is_empty() {
            None
        } else {
            Some(value.to_string())
        }
    }
}
