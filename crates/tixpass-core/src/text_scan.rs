//! Barcode-like strings in extracted document text.
//!
//! The last-resort strategy when no symbol decodes. Matches are only guesses
//! at what a printed code would contain, so every candidate is tagged
//! [`DetectionMethod::TextPattern`] and scored below any visual decode.

use std::sync::LazyLock;

use regex::Regex;

use crate::candidate::{BarcodeCandidate, DetectionMethod};
use crate::geometry::BBox;
use crate::hints::ContextHints;
use crate::symbology::Symbology;

/// Patterns tried in order against each page's text.
const PATTERNS: &[&str] = &[
    r"\b[0-9]{8,20}\b",
    r"\b[A-Z0-9]{10,30}\b",
    r"\b[0-9]{3}-[0-9]{3}-[0-9]{6}\b",
    r"\b[A-Z]{2}[0-9]{6,12}\b",
    r"\b[0-9A-F]{8}-[0-9A-F]{4}-[0-9A-F]{4}-[0-9A-F]{4}-[0-9A-F]{12}\b",
];

const MIN_LEN: usize = 6;

/// Words that look like codes in some layouts but never are.
const STOP_WORDS: &[&str] = &["page", "total", "amount", "price", "date", "time"];

static COMPILED: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    PATTERNS
        .iter()
        .filter_map(|p| Regex::new(p).ok())
        .collect()
});

static NUMERIC: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"^[0-9]+$").ok());
static UPPER_ALNUM: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"^[A-Z0-9]+$").ok());

fn is_numeric(s: &str) -> bool {
    NUMERIC.as_ref().is_some_and(|re| re.is_match(s))
}

fn is_upper_alnum(s: &str) -> bool {
    UPPER_ALNUM.as_ref().is_some_and(|re| re.is_match(s))
}

/// Scan page texts for barcode-like strings.
///
/// `pages` pairs a 1-based page number with that page's text. Each distinct
/// string is reported once, on the first page it appears, and results are
/// ordered by confidence, highest first.
pub fn scan_text(pages: &[(usize, &str)], hints: &ContextHints) -> Vec<BarcodeCandidate> {
    let mut found: Vec<BarcodeCandidate> = Vec::new();
    for &(page, text) in pages {
        for re in COMPILED.iter() {
            for m in re.find_iter(text) {
                let data = m.as_str().trim();
                if data.len() < MIN_LEN || STOP_WORDS.contains(&data.to_lowercase().as_str()) {
                    continue;
                }
                if found.iter().any(|c| c.text == data) {
                    continue;
                }
                found.push(BarcodeCandidate::new(
                    guess_symbology(data, hints),
                    data.as_bytes().to_vec(),
                    BBox::default(),
                    text_confidence(data),
                    DetectionMethod::TextPattern,
                    page,
                    0,
                ));
            }
        }
    }
    found.sort_by(|a, b| b.confidence.cmp(&a.confidence));
    found
}

/// Guess which symbology would print `data`.
///
/// A filename that names Data Matrix overrides the content-based guess.
pub fn guess_symbology(data: &str, hints: &ContextHints) -> Symbology {
    let filename = hints.filename();
    if filename.contains("datamatrix") || filename.contains("data_matrix") {
        return Symbology::DataMatrix;
    }
    if is_numeric(data) {
        return match data.len() {
            13 => Symbology::Ean13,
            12 => Symbology::UpcA,
            8 => Symbology::Ean8,
            _ => Symbology::Code128,
        };
    }
    if is_upper_alnum(data) {
        return Symbology::Code39;
    }
    if data.contains('-') || data.chars().any(char::is_lowercase) {
        return Symbology::QrCode;
    }
    Symbology::Code128
}

/// Confidence for a text match, capped at 95.
pub fn text_confidence(data: &str) -> u8 {
    let mut confidence: u8 = 50;
    let len = data.chars().count();
    if len > 15 {
        confidence += 20;
    } else if len > 10 {
        confidence += 10;
    }
    if data.contains('-') || data.chars().any(char::is_lowercase) {
        confidence += 15;
    }
    if is_numeric(data) {
        confidence += 10;
    }
    confidence.min(95)
}
