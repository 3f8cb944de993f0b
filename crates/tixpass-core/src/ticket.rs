//! Ticket metadata and pass colors supplied by the caller.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Kind of document the ticket was extracted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    EventTicket,
    BoardingPass,
    Transit,
    Hotel,
    #[default]
    #[serde(other)]
    Generic,
}

impl DocumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::EventTicket => "event_ticket",
            DocumentType::BoardingPass => "boarding_pass",
            DocumentType::Transit => "transit",
            DocumentType::Hotel => "hotel",
            DocumentType::Generic => "generic",
        }
    }

    /// Header label shown on the pass front.
    pub fn label(&self) -> &'static str {
        match self {
            DocumentType::EventTicket => "EVENT",
            DocumentType::BoardingPass => "BOARDING",
            DocumentType::Transit => "TRANSIT",
            DocumentType::Hotel => "HOTEL",
            DocumentType::Generic => "DOCUMENT",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "event_ticket" | "event" => Ok(DocumentType::EventTicket),
            "boarding_pass" | "boarding" => Ok(DocumentType::BoardingPass),
            "transit" => Ok(DocumentType::Transit),
            "hotel" => Ok(DocumentType::Hotel),
            "generic" => Ok(DocumentType::Generic),
            _ => Err(format!("unknown document type: {s}")),
        }
    }
}

/// Structured metadata describing one ticket document.
///
/// Produced outside this crate (typically by a language model) and consumed
/// as JSON. Every field except `document_type` and `title` is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TicketExtraction {
    pub document_type: DocumentType,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub venue_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub venue_address: Option<String>,
    /// Event date, ideally `YYYY-MM-DD`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// Event time, ideally `HH:MM`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seat_info: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gate_info: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmation_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub performer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    /// Extraction confidence in `0..=100`.
    pub confidence: u8,
}

impl TicketExtraction {
    /// Metadata with only a title.
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

/// Trimmed, non-empty value of an optional field.
pub(crate) fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

static RGB_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^rgb\(\s*(\d{1,3})\s*,\s*(\d{1,3})\s*,\s*(\d{1,3})\s*\)$").ok()
});

/// Parse an `rgb(r, g, b)` string, rejecting channels above 255.
pub fn parse_rgb_string(value: &str) -> Option<(u8, u8, u8)> {
    let caps = RGB_PATTERN.as_ref()?.captures(value)?;
    let channel = |i: usize| caps.get(i)?.as_str().parse::<u8>().ok();
    Some((channel(1)?, channel(2)?, channel(3)?))
}

/// An opaque RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({}, {}, {})", self.r, self.g, self.b)
    }
}

impl FromStr for Rgb {
    type Err = String;

    /// Accepts `rgb(r, g, b)` and `#rrggbb`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(hex) = s.strip_prefix('#') {
            if hex.len() == 6 && hex.is_ascii() {
                let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
                if let (Some(r), Some(g), Some(b)) = (channel(0), channel(2), channel(4)) {
                    return Ok(Rgb::new(r, g, b));
                }
            }
            return Err(format!("invalid hex color: {s}"));
        }
        parse_rgb_string(s)
            .map(|(r, g, b)| Rgb::new(r, g, b))
            .ok_or_else(|| format!("invalid rgb color: {s}"))
    }
}

impl Serialize for Rgb {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Rgb {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Background, foreground and label colors of a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassColors {
    pub background: Rgb,
    pub foreground: Rgb,
    pub label: Rgb,
}

impl Default for PassColors {
    fn default() -> Self {
        Self {
            background: Rgb::new(0, 122, 255),
            foreground: Rgb::WHITE,
            label: Rgb::WHITE,
        }
    }
}
