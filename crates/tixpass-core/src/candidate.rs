//! Raw barcode detections.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geometry::BBox;
use crate::symbology::Symbology;

/// Image enhancement applied before a decode attempt.
///
/// Listed in the order the enhanced strategy tries them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Enhancement {
    Contrast,
    Sharpen,
    AdaptiveThreshold,
    MorphClose,
    Blur,
    Deskew,
}

impl Enhancement {
    pub const ALL: [Enhancement; 6] = [
        Enhancement::Contrast,
        Enhancement::Sharpen,
        Enhancement::AdaptiveThreshold,
        Enhancement::MorphClose,
        Enhancement::Blur,
        Enhancement::Deskew,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Enhancement::Contrast => "contrast",
            Enhancement::Sharpen => "sharpen",
            Enhancement::AdaptiveThreshold => "threshold",
            Enhancement::MorphClose => "morph_close",
            Enhancement::Blur => "blur",
            Enhancement::Deskew => "deskew",
        }
    }
}

/// How a candidate was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DetectionMethod {
    /// Decoded from an image embedded in the document.
    EmbeddedImage,
    /// Decoded from a page rendered at `dpi`.
    Raster { dpi: u32 },
    /// Decoded from a page rendered at `dpi` after an enhancement.
    Enhanced { dpi: u32, enhancement: Enhancement },
    /// Matched by a pattern in the document's extracted text.
    TextPattern,
}

impl DetectionMethod {
    /// Whether the candidate came from decoding pixels rather than text.
    pub fn is_visual(&self) -> bool {
        !matches!(self, DetectionMethod::TextPattern)
    }

    /// Short tag such as `raster_300dpi` or `enhanced_600dpi_sharpen`.
    pub fn tag(&self) -> String {
        match self {
            DetectionMethod::EmbeddedImage => "embedded".to_string(),
            DetectionMethod::Raster { dpi } => format!("raster_{dpi}dpi"),
            DetectionMethod::Enhanced { dpi, enhancement } => {
                format!("enhanced_{dpi}dpi_{}", enhancement.as_str())
            }
            DetectionMethod::TextPattern => "text_pattern".to_string(),
        }
    }
}

impl fmt::Display for DetectionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tag())
    }
}

/// One raw detection of a barcode.
///
/// `payload` holds the exact bytes the decoder produced; `text` is a
/// best-effort decoding of them kept only for display and heuristics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarcodeCandidate {
    pub symbology: Symbology,
    pub payload: Vec<u8>,
    pub text: String,
    pub bbox: BBox,
    /// Confidence score in `0..=100`.
    pub confidence: u8,
    pub method: DetectionMethod,
    /// 1-based page number the candidate was found on.
    pub page: usize,
    /// Resolution of the bitmap the candidate was decoded from; 0 for text.
    pub dpi: u32,
}

impl BarcodeCandidate {
    /// Create a candidate, deriving `text` from `payload`.
    pub fn new(
        symbology: Symbology,
        payload: Vec<u8>,
        bbox: BBox,
        confidence: u8,
        method: DetectionMethod,
        page: usize,
        dpi: u32,
    ) -> Self {
        let text = decode_payload_text(&payload);
        Self {
            symbology,
            payload,
            text,
            bbox,
            confidence: confidence.min(100),
            method,
            page,
            dpi,
        }
    }

    /// Pixel area of the bounding box.
    pub fn area(&self) -> f64 {
        self.bbox.area()
    }

    pub fn is_visual(&self) -> bool {
        self.method.is_visual()
    }
}

/// Decode payload bytes as UTF-8, falling back to ISO-8859-1.
///
/// Latin-1 maps every byte to the code point of the same value, so the
/// fallback never fails and never loses bytes.
pub fn decode_payload_text(payload: &[u8]) -> String {
    match std::str::from_utf8(payload) {
        Ok(s) => s.to_string(),
        Err(_) => payload.iter().map(|&b| char::from(b)).collect(),
    }
}

/// Encode text as ISO-8859-1, or `None` if any character is outside it.
pub fn encode_latin1(text: &str) -> Option<Vec<u8>> {
    text.chars()
        .map(|c| u8::try_from(u32::from(c)).ok())
        .collect()
}

/// Heuristic confidence for a visually decoded symbol.
///
/// Decoders do not report a score, so this favours the symbologies tickets
/// actually use and longer payloads.
pub fn decode_confidence(symbology: Symbology, payload_len: usize) -> u8 {
    let mut confidence: u32 = 70;
    if matches!(
        symbology,
        Symbology::QrCode | Symbology::Pdf417 | Symbology::Code128 | Symbology::Aztec
    ) {
        confidence += 20;
    }
    if payload_len > 20 {
        confidence += 10;
    }
    confidence.min(100) as u8
}
