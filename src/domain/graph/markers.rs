use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::RelationType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerKind {
    Note,
    Citation,
    CrossReference,
}

impl MarkerKind {
    pub fn relation_type(&self) -> RelationType {
        match self {
            MarkerKind::Note => RelationType::ReferencesNote,
            MarkerKind::Citation => RelationType::ReferencesCitation,
            MarkerKind::CrossReference => RelationType::CrossReferences,
        }
    }
}

/// A reference marker found in node text.
///
/// `text` is what gets persisted as `marker_text`; `key` is the normalized form used to match
/// references against definitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    pub kind: MarkerKind,
    pub text: String,
    pub key: String,
}

impl Marker {
    pub fn new(kind: MarkerKind, text: &str) -> Self {
        let text = match kind {
            MarkerKind::Note => superscript_to_ascii(text.trim()),
            MarkerKind::Citation | MarkerKind::CrossReference => text.trim().to_string(),
        };
        Self {
            kind,
            key: normalize_key(kind, &text),
            text,
        }
    }
}

pub fn normalize_key(kind: MarkerKind, text: &str) -> String {
    let collapsed = text
        .trim()
        .trim_matches(|c| matches!(c, '[' | ']' | '(' | ')'))
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();

    match kind {
        MarkerKind::Note => superscript_to_ascii(&collapsed),
        MarkerKind::CrossReference => collapsed,
        MarkerKind::Citation => {
            if collapsed.chars().all(|c| c.is_ascii_digit()) {
                return collapsed;
            }
            let surname = collapsed
                .split(|c: char| !(c.is_alphabetic() || c == '\'' || c == '-'))
                .find(|word| !word.is_empty());
            let year = collapsed
                .split(|c: char| c.is_whitespace() || c == ',')
                .filter(|token| token.chars().take(4).filter(|c| c.is_ascii_digit()).count() == 4)
                .next_back();
            match (surname, year) {
                (Some(surname), Some(year)) => format!("{}, {}", surname, year),
                _ => collapsed,
            }
        }
    }
}

pub fn superscript_to_ascii(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '⁰' => '0',
            '¹' => '1',
            '²' => '2',
            '³' => '3',
            '⁴' => '4',
            '⁵' => '5',
            '⁶' => '6',
            '⁷' => '7',
            '⁸' => '8',
            '⁹' => '9',
            other => other,
        })
        .collect()
}

/// Compiled patterns for reference markers, note prefixes and definition labels.
#[derive(Debug, Clone)]
pub struct MarkerScanner {
    superscript: Regex,
    numeric_citation: Regex,
    author_year: Regex,
    cross_reference: Regex,
    note_prefix: Regex,
    numbered_entry: Regex,
    author_year_entry: Regex,
    leading_label: Regex,
}

impl MarkerScanner {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            // Group 1 catches a length unit right before the digits: "50 km²" is an exponent.
            superscript: Regex::new(r"((?:\b|\d)(?:[kcdm]?m|ft|yd|mi))?([⁰¹²³⁴⁵⁶⁷⁸⁹]+)")?,
            numeric_citation: Regex::new(r"\[(\d+)\]")?,
            author_year: Regex::new(
                r"\(([A-Z][A-Za-z'\-]+(?:\s+et\s+al\.)?(?:\s+(?:and|&)\s+[A-Z][A-Za-z'\-]+)?,?\s+\d{4}[a-z]?)\)",
            )?,
            cross_reference: Regex::new(r"\b(?:Table|Figure|Box|Section)\s+\d+(?:\.\d+)*")?,
            note_prefix: Regex::new(r"(?s)^\s*([0-9]+|[⁰¹²³⁴⁵⁶⁷⁸⁹]+)\s*[:.)]?\s+(.+)$")?,
            numbered_entry: Regex::new(r"^\s*(?:\[(\d+)\]|(\d+)\.\s)")?,
            author_year_entry: Regex::new(r"^\s*([A-Z][A-Za-z'\-]+)[^()]*?\((\d{4}[a-z]?)\)")?,
            leading_label: Regex::new(r"^\s*((?:Table|Figure|Box|Section)\s+\d+(?:\.\d+)*)")?,
        })
    }

    /// Markers in order of appearance.
    pub fn scan(&self, text: &str) -> Vec<Marker> {
        let mut found: Vec<(usize, Marker)> = Vec::new();

        for caps in self.superscript.captures_iter(text) {
            if caps.get(1).is_some() {
                continue;
            }
            if let Some(m) = caps.get(2) {
                found.push((m.start(), Marker::new(MarkerKind::Note, m.as_str())));
            }
        }
        for caps in self.numeric_citation.captures_iter(text) {
            if let (Some(whole), Some(number)) = (caps.get(0), caps.get(1)) {
                found.push((whole.start(), Marker::new(MarkerKind::Citation, number.as_str())));
            }
        }
        for caps in self.author_year.captures_iter(text) {
            if let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) {
                found.push((whole.start(), Marker::new(MarkerKind::Citation, inner.as_str())));
            }
        }
        for m in self.cross_reference.find_iter(text) {
            found.push((m.start(), Marker::new(MarkerKind::CrossReference, m.as_str())));
        }

        found.sort_by_key(|(offset, _)| *offset);
        found.into_iter().map(|(_, marker)| marker).collect()
    }

    /// Splits "1: source note" into the note marker and its body.
    pub fn split_note_prefix(&self, text: &str) -> Option<(String, String)> {
        let caps = self.note_prefix.captures(text)?;
        let marker = superscript_to_ascii(caps.get(1)?.as_str());
        let body = caps.get(2)?.as_str().trim().to_string();
        Some((marker, body))
    }

    /// Citation key a bibliography entry defines: "[12] ..." or "12. ..." or "Smith, J. (2025) ...".
    pub fn bibliography_key(&self, text: &str) -> Option<String> {
        if let Some(caps) = self.numbered_entry.captures(text) {
            return caps.get(1).or_else(|| caps.get(2)).map(|m| m.as_str().to_string());
        }
        let caps = self.author_year_entry.captures(text)?;
        Some(format!("{}, {}", caps.get(1)?.as_str(), caps.get(2)?.as_str()))
    }

    /// "Table 3" from "Table 3: Emissions by sector".
    pub fn leading_label(&self, text: &str) -> Option<String> {
        self.leading_label
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().split_whitespace().collect::<Vec<_>>().join(" "))
    }
}
