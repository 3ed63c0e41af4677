//! Keyword vocabulary for recognizing diagram roles in free text.
//!
//! Entries are `(pattern, canonical label, geometry)` triples. When several
//! patterns match, the longest literal pattern wins; adding vocabulary is a
//! matter of adding a row.

use crate::element::GeometryKind;
use once_cell::sync::Lazy;
use regex::Regex;

/// One row of the vocabulary table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VocabularyEntry {
    pub pattern: &'static str,
    pub label: &'static str,
    pub geometry: GeometryKind,
}

const fn entry(
    pattern: &'static str,
    label: &'static str,
    geometry: GeometryKind,
) -> VocabularyEntry {
    VocabularyEntry {
        pattern,
        label,
        geometry,
    }
}

/// Built-in vocabulary.
pub const DEFAULT_ENTRIES: &[VocabularyEntry] = &[
    entry("user", "User", GeometryKind::Rectangle),
    entry("client", "User", GeometryKind::Rectangle),
    entry("customer", "User", GeometryKind::Rectangle),
    entry("load balancer", "Load Balancer", GeometryKind::Diamond),
    entry("backend server", "Backend Server", GeometryKind::Rectangle),
    entry("server", "Backend Server", GeometryKind::Rectangle),
    entry("blob storage", "Blob Storage", GeometryKind::Rectangle),
    entry("object storage", "Blob Storage", GeometryKind::Rectangle),
    entry("storage", "Blob Storage", GeometryKind::Rectangle),
    entry("upload service", "Upload Service", GeometryKind::Rectangle),
    entry("upload", "Upload Service", GeometryKind::Rectangle),
    entry("api gateway", "API Gateway", GeometryKind::Rectangle),
    entry("database", "Database", GeometryKind::Ellipse),
    entry("db", "Database", GeometryKind::Ellipse),
    entry("cache", "Cache", GeometryKind::Rectangle),
    entry("message queue", "Message Queue", GeometryKind::Rectangle),
    entry("queue", "Message Queue", GeometryKind::Rectangle),
    entry("cdn", "CDN", GeometryKind::Rectangle),
    entry("auth service", "Auth Service", GeometryKind::Rectangle),
    entry("authentication", "Auth Service", GeometryKind::Rectangle),
    entry("notification service", "Notification Service", GeometryKind::Rectangle),
    entry("web app", "Web App", GeometryKind::Rectangle),
    entry("frontend", "Web App", GeometryKind::Rectangle),
    entry("dropbox", "Dropbox", GeometryKind::Rectangle),
];

/// Verb forms only: "connection pool" or "connections" are not instructions.
static CONNECTOR_LANGUAGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:connect(?:s|ed|ing)?|link(?:s|ed|ing)?|arrows?)\b|\bfrom\b.+\bto\b|->|→",
    )
    .expect("connector language pattern is valid")
});

/// A keyword found in a piece of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeywordMatch {
    pub entry: VocabularyEntry,
    /// Byte offset of the match in the searched text.
    pub start: usize,
    pub end: usize,
}

/// A compiled vocabulary table.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    entries: Vec<(VocabularyEntry, Regex)>,
}

impl Vocabulary {
    pub fn new(entries: &[VocabularyEntry]) -> Self {
        let entries = entries
            .iter()
            .map(|entry| {
                let pattern = format!(r"(?i)\b{}(?:s|es)?\b", regex::escape(entry.pattern));
                let regex = Regex::new(&pattern).expect("escaped vocabulary pattern is valid");
                (*entry, regex)
            })
            .collect();
        Self { entries }
    }

    /// Whether `text` talks about connecting things.
    pub fn mentions_connection(text: &str) -> bool {
        CONNECTOR_LANGUAGE.is_match(text)
    }

    /// The most specific entry matching `text`, if any.
    ///
    /// The longest pattern wins; among equally long patterns the earlier row
    /// wins. Inputs where different labels match are logged as ambiguous.
    pub fn classify(&self, text: &str) -> Option<VocabularyEntry> {
        let matched: Vec<VocabularyEntry> = self
            .entries
            .iter()
            .filter(|(_, regex)| regex.is_match(text))
            .map(|(entry, _)| *entry)
            .collect();

        let best = matched
            .iter()
            .copied()
            .reduce(|best, candidate| {
                if candidate.pattern.len() > best.pattern.len() {
                    candidate
                } else {
                    best
                }
            })?;

        if matched.iter().any(|entry| entry.label != best.label) {
            tracing::warn!(
                "[Vocabulary] Ambiguous input {:?}: {:?} chosen over {:?}",
                text,
                best.label,
                matched
                    .iter()
                    .filter(|entry| entry.label != best.label)
                    .map(|entry| entry.label)
                    .collect::<Vec<_>>()
            );
        }
        Some(best)
    }

    /// Non-overlapping keyword matches in order of appearance.
    ///
    /// Where matches overlap, the longer one is kept.
    pub fn find_in_order(&self, text: &str) -> Vec<KeywordMatch> {
        let mut found: Vec<KeywordMatch> = self
            .entries
            .iter()
            .flat_map(|(entry, regex)| {
                regex.find_iter(text).map(move |m| KeywordMatch {
                    entry: *entry,
                    start: m.start(),
                    end: m.end(),
                })
            })
            .collect();
        found.sort_by(|a, b| a.start.cmp(&b.start).then((b.end - b.start).cmp(&(a.end - a.start))));

        let mut kept: Vec<KeywordMatch> = Vec::new();
        for candidate in found {
            match kept.last() {
                Some(last) if candidate.start < last.end => {}
                _ => kept.push(candidate),
            }
        }
        kept
    }
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self::new(DEFAULT_ENTRIES)
    }
}
