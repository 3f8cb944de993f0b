//! The pass.json document model.
//!
//! Field names follow the wallet schema (camelCase) and absent optionals are
//! omitted on serialization, so `serde_json::to_vec(&definition)` is the
//! exact pass.json written into a bundle.

use serde::{Deserialize, Serialize};

use crate::symbology::PassBarcodeFormat;

/// A single label/value entry on the pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PassField {
    pub key: String,
    #[serde(default)]
    pub label: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_alignment: Option<String>,
}

impl PassField {
    pub fn new(key: impl Into<String>, label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            value: value.into(),
            ..Self::default()
        }
    }
}

/// Field arrays of one pass style section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PassStructure {
    pub header_fields: Vec<PassField>,
    pub primary_fields: Vec<PassField>,
    pub secondary_fields: Vec<PassField>,
    pub auxiliary_fields: Vec<PassField>,
    pub back_fields: Vec<PassField>,
    /// Required on boarding passes, absent elsewhere.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transit_type: Option<String>,
}

impl PassStructure {
    /// Field arrays paired with their pass.json names.
    pub fn field_arrays(&self) -> [(&'static str, &[PassField]); 5] {
        [
            ("headerFields", &self.header_fields),
            ("primaryFields", &self.primary_fields),
            ("secondaryFields", &self.secondary_fields),
            ("auxiliaryFields", &self.auxiliary_fields),
            ("backFields", &self.back_fields),
        ]
    }
}

/// Barcode entry as written to pass.json.
///
/// `format` stays a string so that documents read back from disk with an
/// unknown format can still be loaded and reported by the validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PassBarcode {
    pub format: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub message_encoding: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt_text: Option<String>,
}

impl PassBarcode {
    pub fn new(format: PassBarcodeFormat, message: impl Into<String>) -> Self {
        Self {
            format: format.as_str().to_string(),
            message: message.into(),
            message_encoding: crate::consolidate::MESSAGE_ENCODING.to_string(),
            alt_text: None,
        }
    }

    pub fn parsed_format(&self) -> Option<PassBarcodeFormat> {
        PassBarcodeFormat::from_tag(&self.format)
    }
}

/// Pass style section names, in pass.json order.
pub const PASS_STYLES: [&str; 5] = ["eventTicket", "generic", "boardingPass", "coupon", "storeCard"];

/// The complete pass.json document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PassDefinition {
    /// Always 1. Missing on input reads as 0 so the validator can report it.
    #[serde(default)]
    pub format_version: u32,
    #[serde(default)]
    pub pass_type_identifier: String,
    #[serde(default)]
    pub serial_number: String,
    #[serde(default)]
    pub team_identifier: String,
    #[serde(default)]
    pub organization_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreground_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_ticket: Option<PassStructure>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generic: Option<PassStructure>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boarding_pass: Option<PassStructure>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coupon: Option<PassStructure>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_card: Option<PassStructure>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub barcode: Option<PassBarcode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub barcodes: Option<Vec<PassBarcode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relevant_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub associated_store_identifiers: Option<Vec<u64>>,
}

impl Default for PassDefinition {
    fn default() -> Self {
        Self {
            format_version: 1,
            pass_type_identifier: String::new(),
            serial_number: String::new(),
            team_identifier: String::new(),
            organization_name: String::new(),
            description: String::new(),
            logo_text: None,
            foreground_color: None,
            background_color: None,
            label_color: None,
            event_ticket: None,
            generic: None,
            boarding_pass: None,
            coupon: None,
            store_card: None,
            barcode: None,
            barcodes: None,
            expiration_date: None,
            relevant_date: None,
            associated_store_identifiers: None,
        }
    }
}

impl PassDefinition {
    /// Every style section paired with its name, set or not.
    pub fn styles(&self) -> [(&'static str, Option<&PassStructure>); 5] {
        [
            (PASS_STYLES[0], self.event_ticket.as_ref()),
            (PASS_STYLES[1], self.generic.as_ref()),
            (PASS_STYLES[2], self.boarding_pass.as_ref()),
            (PASS_STYLES[3], self.coupon.as_ref()),
            (PASS_STYLES[4], self.store_card.as_ref()),
        ]
    }

    /// Names of the style sections that are set.
    pub fn set_styles(&self) -> Vec<&'static str> {
        self.styles()
            .into_iter()
            .filter_map(|(name, s)| s.map(|_| name))
            .collect()
    }

    /// The single set style section, if exactly one is set.
    pub fn structure(&self) -> Option<(&'static str, &PassStructure)> {
        let mut set = self
            .styles()
            .into_iter()
            .filter_map(|(name, s)| s.map(|s| (name, s)));
        let first = set.next()?;
        set.next().is_none().then_some(first)
    }
}
