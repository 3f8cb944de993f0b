//! Merging raw detections into canonical barcodes.
//!
//! Candidates are keyed by their exact payload bytes, never by decoded text,
//! so two decoders reporting different character sets for the same symbol
//! still collapse together. Before grouping, two conflicts are resolved:
//! text-pattern hits are dropped whenever any visual hit exists, and an
//! Aztec/QR clash is settled by context or area. After grouping, text-only
//! over-segmentation of one code is collapsed, and symbologies the wallet
//! cannot show are split off into a single warning each.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::candidate::{BarcodeCandidate, decode_payload_text};
use crate::error::{PassWarning, PassWarningCode, push_unique};
use crate::geometry::BBox;
use crate::hints::ContextHints;
use crate::symbology::{PassBarcodeFormat, Symbology};

/// Encoding name written to pass.json for every barcode message.
pub const MESSAGE_ENCODING: &str = "iso-8859-1";

/// One barcode after merging every detection of the same payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsolidatedBarcode {
    pub payload: Vec<u8>,
    pub text: String,
    pub symbology: Symbology,
    /// Wallet format, or `None` when the symbology cannot be embedded.
    pub format: Option<PassBarcodeFormat>,
    pub detection_count: usize,
    pub pages_found: BTreeSet<usize>,
    pub methods_used: BTreeSet<String>,
    pub confidence: u8,
    pub bbox: BBox,
    pub visual: bool,
}

impl ConsolidatedBarcode {
    fn from_candidate(candidate: &BarcodeCandidate) -> Self {
        Self {
            payload: candidate.payload.clone(),
            text: candidate.text.clone(),
            symbology: candidate.symbology,
            format: candidate.symbology.pass_format(),
            detection_count: 1,
            pages_found: BTreeSet::from([candidate.page]),
            methods_used: BTreeSet::from([candidate.method.tag()]),
            confidence: candidate.confidence,
            bbox: candidate.bbox,
            visual: candidate.is_visual(),
        }
    }

    /// Fold another detection of the same code into this one.
    fn absorb(&mut self, other: ConsolidatedBarcode) {
        self.detection_count += other.detection_count;
        self.pages_found.extend(other.pages_found);
        self.methods_used.extend(other.methods_used);
        self.visual |= other.visual;
    }

    /// The pass.json message: payload bytes mapped one-to-one onto
    /// ISO-8859-1 characters, so a wallet encoding it with
    /// [`MESSAGE_ENCODING`] reproduces the original bytes exactly.
    pub fn pass_message(&self) -> String {
        self.payload.iter().map(|&b| char::from(b)).collect()
    }

    pub fn message_encoding(&self) -> &'static str {
        MESSAGE_ENCODING
    }

    pub fn is_supported(&self) -> bool {
        self.format.is_some()
    }
}

/// Output of [`consolidate`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Consolidation {
    /// Embeddable barcodes, best confidence first. One ticket per entry.
    pub barcodes: Vec<ConsolidatedBarcode>,
    /// Barcodes found in symbologies the wallet cannot display.
    pub unsupported: Vec<ConsolidatedBarcode>,
    pub warnings: Vec<PassWarning>,
}

/// Merge raw candidates into canonical barcodes.
pub fn consolidate(candidates: &[BarcodeCandidate], hints: &ContextHints) -> Consolidation {
    let kept = prefer_visual(candidates);
    let kept = resolve_aztec_qr(kept, hints);
    let groups = group_by_payload(&kept);
    let groups = collapse_text_segments(groups, hints);

    let mut result = Consolidation::default();
    for group in groups {
        if group.is_supported() {
            result.barcodes.push(group);
        } else {
            push_unique(
                &mut result.warnings,
                PassWarning::with_code(
                    PassWarningCode::UnsupportedSymbology,
                    unsupported_warning(group.symbology),
                ),
            );
            result.unsupported.push(group);
        }
    }
    result
        .barcodes
        .sort_by(|a, b| b.confidence.cmp(&a.confidence));
    result
}

/// User-facing warning for a symbology the wallet cannot display.
pub fn unsupported_warning(symbology: Symbology) -> String {
    format!(
        "This PDF contains a {} code, which is not supported by Apple Wallet. \
         The pass has been saved without a barcode.",
        symbology.display_name()
    )
}

/// Drop text-pattern candidates when any visual candidate exists.
pub fn prefer_visual(candidates: &[BarcodeCandidate]) -> Vec<&BarcodeCandidate> {
    let any_visual = candidates.iter().any(BarcodeCandidate::is_visual);
    candidates
        .iter()
        .filter(|c| !any_visual || c.is_visual())
        .collect()
}

/// Settle a clash between Aztec and QR candidates.
///
/// The clash is scoped to one detection pass: `candidates` must all come
/// from the single strategy that won for the document, so codes found by
/// different strategies never compete here.
///
/// With a ticket hint Aztec is kept. Otherwise the type with the strictly
/// larger bounding box wins and an exact tie goes to Aztec. Other
/// symbologies pass through, and input holding only one of the two types is
/// returned unchanged.
pub fn resolve_aztec_qr<'a>(
    candidates: Vec<&'a BarcodeCandidate>,
    hints: &ContextHints,
) -> Vec<&'a BarcodeCandidate> {
    let largest = |s: Symbology| {
        candidates
            .iter()
            .filter(|c| c.symbology == s)
            .map(|c| c.area())
            .reduce(f64::max)
    };
    let (Some(aztec_area), Some(qr_area)) = (largest(Symbology::Aztec), largest(Symbology::QrCode))
    else {
        return candidates;
    };

    let dropped = if hints.suggests_ticket() || aztec_area >= qr_area {
        Symbology::QrCode
    } else {
        Symbology::Aztec
    };
    candidates
        .into_iter()
        .filter(|c| c.symbology != dropped)
        .collect()
}

/// Group candidates by exact payload bytes, keeping first-seen order.
///
/// Each group carries the attributes of its most confident member; ties go
/// to the earliest.
pub fn group_by_payload(candidates: &[&BarcodeCandidate]) -> Vec<ConsolidatedBarcode> {
    let mut groups: Vec<ConsolidatedBarcode> = Vec::new();
    for candidate in candidates {
        let incoming = ConsolidatedBarcode::from_candidate(candidate);
        match groups.iter_mut().find(|g| g.payload == candidate.payload) {
            Some(group) => {
                if candidate.confidence > group.confidence {
                    group.symbology = candidate.symbology;
                    group.format = candidate.symbology.pass_format();
                    group.confidence = candidate.confidence;
                    group.bbox = candidate.bbox;
                    group.text = candidate.text.clone();
                }
                group.absorb(incoming);
            }
            None => groups.push(incoming),
        }
    }
    groups
}

/// Collapse several text-derived payloads that are really one code.
///
/// Applies only when every group came from text matching and there are at
/// least two. The groups collapse when their trimmed payloads are identical,
/// or when all are Data Matrix and the filename suggests a single pass.
pub fn collapse_text_segments(
    groups: Vec<ConsolidatedBarcode>,
    hints: &ContextHints,
) -> Vec<ConsolidatedBarcode> {
    if groups.len() < 2 || groups.iter().any(|g| g.visual) {
        return groups;
    }

    let first = groups[0].payload.trim_ascii();
    let identical = groups.iter().all(|g| g.payload.trim_ascii() == first);
    let single_data_matrix = hints.suggests_single_ticket()
        && groups.iter().all(|g| g.symbology == Symbology::DataMatrix);
    if !identical && !single_data_matrix {
        return groups;
    }

    let mut remaining = groups.into_iter();
    let Some(mut best) = remaining.next() else {
        return Vec::new();
    };
    for group in remaining {
        let longer = group.payload.len() > best.payload.len()
            || (group.payload.len() == best.payload.len() && group.confidence > best.confidence);
        if longer {
            let mut merged = group;
            merged.absorb(best);
            best = merged;
        } else {
            best.absorb(group);
        }
    }
    if identical {
        best.payload = best.payload.trim_ascii().to_vec();
        best.text = decode_payload_text(&best.payload);
    }
    vec![best]
}
