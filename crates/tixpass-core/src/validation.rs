//! Structural validation of pass definitions before signing.
//!
//! Provides [`ValidationIssue`] for reporting problems, [`Severity`] for
//! classifying them, and [`validate_pass`] which checks a
//! [`PassDefinition`] against the wallet's pass.json rules.

use std::collections::HashSet;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::pass::{PassBarcode, PassDefinition};
use crate::symbology::PassBarcodeFormat;
use crate::ticket::parse_rgb_string;

/// Severity of a validation issue.
///
/// Errors make the pass unusable in a wallet; warnings flag content that
/// will display poorly but still installs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// The wallet will reject the pass.
    Error,
    /// The pass installs but may be truncated or odd-looking.
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// A validation issue found in a pass definition.
///
/// Describes one rule violation, including its severity, an identifying
/// code, a human-readable message, and an optional pass.json path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    /// Severity of the issue.
    pub severity: Severity,
    /// Machine-readable issue code (e.g., "MISSING_FIELD", "BAD_COLOR").
    pub code: String,
    /// Human-readable description of the issue.
    pub message: String,
    /// Optional location within pass.json (e.g., "barcodes[1].format").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl ValidationIssue {
    /// Create a new validation issue.
    pub fn new(severity: Severity, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity,
            code: code.into(),
            message: message.into(),
            location: None,
        }
    }

    /// Create a new validation issue with a location.
    pub fn with_location(
        severity: Severity,
        code: impl Into<String>,
        message: impl Into<String>,
        location: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            code: code.into(),
            message: message.into(),
            location: Some(location.into()),
        }
    }

    /// Returns `true` if the issue is an error.
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Returns `true` if the issue is a warning.
    pub fn is_warning(&self) -> bool {
        self.severity == Severity::Warning
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.code, self.message)?;
        if let Some(ref loc) = self.location {
            write!(f, " (at {loc})")?;
        }
        Ok(())
    }
}

/// Returns `true` when no issue is an error.
pub fn is_valid(issues: &[ValidationIssue]) -> bool {
    !issues.iter().any(ValidationIssue::is_error)
}

/// Messages of the error-severity issues, in order.
pub fn error_messages(issues: &[ValidationIssue]) -> Vec<String> {
    issues
        .iter()
        .filter(|i| i.is_error())
        .map(|i| i.message.clone())
        .collect()
}

const TRANSIT_TYPES: [&str; 5] = [
    "PKTransitTypeAir",
    "PKTransitTypeBoat",
    "PKTransitTypeBus",
    "PKTransitTypeGeneric",
    "PKTransitTypeTrain",
];

const MAX_DESCRIPTION: usize = 120;
const MAX_LOGO_TEXT: usize = 20;

static ISO8601: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}(T\d{2}:\d{2}(:\d{2})?(\.\d+)?(Z|[+-]\d{2}:\d{2})?)?$").ok()
});

/// Whether `value` is an ISO-8601 date or date-time.
pub fn is_iso8601(value: &str) -> bool {
    ISO8601.as_ref().is_some_and(|re| re.is_match(value))
}

/// Check a pass definition.
///
/// Returns every issue found; an empty list means the pass is valid. Use
/// [`is_valid`] to ignore warnings.
pub fn validate_pass(def: &PassDefinition) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    let mut error = |code: &str, message: String, location: &str| {
        issues.push(ValidationIssue::with_location(
            Severity::Error,
            code,
            message,
            location,
        ));
    };

    for (name, value) in [
        ("passTypeIdentifier", &def.pass_type_identifier),
        ("serialNumber", &def.serial_number),
        ("teamIdentifier", &def.team_identifier),
        ("organizationName", &def.organization_name),
        ("description", &def.description),
    ] {
        if value.trim().is_empty() {
            error("MISSING_FIELD", format!("{name} is required"), name);
        }
    }

    if def.format_version != 1 {
        error(
            "BAD_FORMAT_VERSION",
            format!("formatVersion must be 1, got {}", def.format_version),
            "formatVersion",
        );
    }

    let set_styles = def.set_styles();
    if set_styles.len() != 1 {
        error(
            "PASS_STYLE",
            format!(
                "Exactly one pass style must be set; found {}",
                set_styles.len()
            ),
            "style",
        );
    }

    if let Some(boarding) = &def.boarding_pass {
        match boarding.transit_type.as_deref() {
            None | Some("") => error(
                "MISSING_TRANSIT_TYPE",
                "boardingPass requires transitType".to_string(),
                "boardingPass.transitType",
            ),
            Some(t) if !TRANSIT_TYPES.contains(&t) => error(
                "BAD_TRANSIT_TYPE",
                format!("boardingPass.transitType '{t}' is not valid"),
                "boardingPass.transitType",
            ),
            Some(_) => {}
        }
    }

    for (name, value) in [
        ("foregroundColor", &def.foreground_color),
        ("backgroundColor", &def.background_color),
        ("labelColor", &def.label_color),
    ] {
        if let Some(v) = value {
            if parse_rgb_string(v).is_none() {
                error(
                    "BAD_COLOR",
                    format!("{name} '{v}' is not a valid rgb(r,g,b) string"),
                    name,
                );
            }
        }
    }

    if let Some(barcode) = &def.barcode {
        for (code, message) in barcode_problems(barcode) {
            error(code, format!("barcode.{message}"), "barcode");
        }
    }
    for (i, barcode) in def.barcodes.iter().flatten().enumerate() {
        let location = format!("barcodes[{i}]");
        for (code, message) in barcode_problems(barcode) {
            error(code, format!("{location}.{message}"), location.as_str());
        }
    }

    for (style, structure) in def.styles() {
        let Some(structure) = structure else {
            continue;
        };
        for (array, fields) in structure.field_arrays() {
            let location = format!("{style}.{array}");
            let mut seen = HashSet::new();
            for field in fields {
                if !seen.insert(field.key.as_str()) {
                    error(
                        "DUPLICATE_KEY",
                        format!("{location} has duplicate key '{}'", field.key),
                        location.as_str(),
                    );
                }
                if field.date_style.is_some() && !is_iso8601(&field.value) {
                    error(
                        "BAD_DATE",
                        format!(
                            "{location}.{} '{}' is not a valid ISO 8601 date string",
                            field.key, field.value
                        ),
                        location.as_str(),
                    );
                }
            }
        }
    }

    for (name, value) in [
        ("expirationDate", &def.expiration_date),
        ("relevantDate", &def.relevant_date),
    ] {
        if let Some(v) = value {
            if !is_iso8601(v) {
                error(
                    "BAD_DATE",
                    format!("{name} '{v}' is not a valid ISO 8601 date string"),
                    name,
                );
            }
        }
    }

    if def.description.chars().count() > MAX_DESCRIPTION {
        issues.push(ValidationIssue::with_location(
            Severity::Warning,
            "LONG_DESCRIPTION",
            format!("description is longer than {MAX_DESCRIPTION} characters"),
            "description",
        ));
    }
    if let Some(logo) = &def.logo_text {
        if logo.chars().count() > MAX_LOGO_TEXT {
            issues.push(ValidationIssue::with_location(
                Severity::Warning,
                "LONG_LOGO_TEXT",
                format!("logoText is longer than {MAX_LOGO_TEXT} characters"),
                "logoText",
            ));
        }
    }

    issues
}

fn barcode_problems(barcode: &PassBarcode) -> Vec<(&'static str, String)> {
    let mut problems = Vec::new();
    if barcode.parsed_format().is_none() {
        problems.push((
            "BAD_BARCODE_FORMAT",
            format!(
                "format '{}' is not a valid PKBarcodeFormat (expected one of {})",
                barcode.format,
                PassBarcodeFormat::ALL
                    .iter()
                    .map(PassBarcodeFormat::as_str)
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        ));
    }
    if barcode.message.is_empty() {
        problems.push(("EMPTY_BARCODE", "message must not be empty".to_string()));
    }
    if barcode.message_encoding.trim().is_empty() {
        problems.push((
            "MISSING_ENCODING",
            "messageEncoding must not be empty".to_string(),
        ));
    }
    problems
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pass::{PassField, PassStructure};

    fn valid() -> PassDefinition {
        PassDefinition {
            pass_type_identifier: "pass.com.example.tickets".into(),
            serial_number: "0001".into(),
            team_identifier: "ABCDE12345".into(),
            organization_name: "Example".into(),
            description: "Concert".into(),
            logo_text: Some("Concert".into()),
            background_color: Some("rgb(0, 122, 255)".into()),
            foreground_color: Some("rgb(255,255,255)".into()),
            event_ticket: Some(PassStructure {
                primary_fields: vec![PassField::new("title", "", "Concert")],
                ..PassStructure::default()
            }),
            barcode: Some(PassBarcode::new(PassBarcodeFormat::Qr, "ABC")),
            barcodes: Some(vec![PassBarcode::new(PassBarcodeFormat::Qr, "ABC")]),
            expiration_date: Some("2026-03-15T03:00:00Z".into()),
            ..PassDefinition::default()
        }
    }

    fn codes(issues: &[ValidationIssue]) -> Vec<&str> {
        issues.iter().map(|i| i.code.as_str()).collect()
    }

    #[test]
    fn severity_display() {
        assert_eq!(Severity::Error.to_string(), "error");
        assert_eq!(Severity::Warning.to_string(), "warning");
    }

    #[test]
    fn issue_display_with_location() {
        let issue = ValidationIssue::with_location(
            Severity::Error,
            "BAD_COLOR",
            "labelColor 'red' is not a valid rgb(r,g,b) string",
            "labelColor",
        );
        assert_eq!(
            issue.to_string(),
            "[error] BAD_COLOR: labelColor 'red' is not a valid rgb(r,g,b) string (at labelColor)"
        );
        assert!(issue.is_error());
        assert!(!issue.is_warning());
    }

    #[test]
    fn valid_pass_has_no_issues() {
        let issues = validate_pass(&valid());
        assert!(issues.is_empty(), "{issues:?}");
        assert!(is_valid(&issues));
    }

    #[test]
    fn two_styles_is_invalid() {
        let mut def = valid();
        def.generic = Some(PassStructure::default());
        let issues = validate_pass(&def);
        assert!(!is_valid(&issues));
        assert_eq!(
            error_messages(&issues),
            vec!["Exactly one pass style must be set; found 2"]
        );
    }

    #[test]
    fn no_style_is_invalid() {
        let mut def = valid();
        def.event_ticket = None;
        let messages = error_messages(&validate_pass(&def));
        assert_eq!(messages, vec!["Exactly one pass style must be set; found 0"]);
    }

    #[test]
    fn required_identifiers() {
        let mut def = valid();
        def.team_identifier.clear();
        def.serial_number = "  ".into();
        let messages = error_messages(&validate_pass(&def));
        assert!(messages.contains(&"teamIdentifier is required".to_string()));
        assert!(messages.contains(&"serialNumber is required".to_string()));
    }

    #[test]
    fn format_version_must_be_one() {
        let mut def = valid();
        def.format_version = 2;
        assert_eq!(codes(&validate_pass(&def)), vec!["BAD_FORMAT_VERSION"]);
    }

    #[test]
    fn color_channels_checked() {
        let mut def = valid();
        def.label_color = Some("rgb(300, 0, 0)".into());
        def.foreground_color = Some("#ffffff".into());
        let issues = validate_pass(&def);
        assert_eq!(codes(&issues), vec!["BAD_COLOR", "BAD_COLOR"]);
    }

    #[test]
    fn barcode_checks() {
        let mut def = valid();
        def.barcode = Some(PassBarcode {
            format: "PKBarcodeFormatDataMatrix".into(),
            message: String::new(),
            message_encoding: String::new(),
            alt_text: None,
        });
        let issues = validate_pass(&def);
        assert_eq!(
            codes(&issues),
            vec!["BAD_BARCODE_FORMAT", "EMPTY_BARCODE", "MISSING_ENCODING"]
        );
        assert!(issues[1].message.starts_with("barcode.message"));
    }

    #[test]
    fn barcodes_array_locations() {
        let mut def = valid();
        let mut bad = PassBarcode::new(PassBarcodeFormat::Aztec, "");
        bad.message_encoding = "iso-8859-1".into();
        def.barcodes = Some(vec![PassBarcode::new(PassBarcodeFormat::Qr, "ok"), bad]);
        let issues = validate_pass(&def);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].location.as_deref(), Some("barcodes[1]"));
        assert_eq!(issues[0].message, "barcodes[1].message must not be empty");
    }

    #[test]
    fn duplicate_keys() {
        let mut def = valid();
        if let Some(s) = def.event_ticket.as_mut() {
            s.auxiliary_fields = vec![
                PassField::new("seat", "Seat", "1"),
                PassField::new("seat", "Seat", "2"),
            ];
        }
        let messages = error_messages(&validate_pass(&def));
        assert_eq!(
            messages,
            vec!["eventTicket.auxiliaryFields has duplicate key 'seat'"]
        );
    }

    #[test]
    fn same_key_in_different_arrays_is_fine() {
        let mut def = valid();
        if let Some(s) = def.event_ticket.as_mut() {
            s.back_fields = vec![PassField::new("title", "Title", "x")];
        }
        assert!(validate_pass(&def).is_empty());
    }

    #[test]
    fn boarding_pass_transit_type() {
        let mut def = valid();
        def.boarding_pass = def.event_ticket.take();
        assert_eq!(codes(&validate_pass(&def)), vec!["MISSING_TRANSIT_TYPE"]);
        if let Some(s) = def.boarding_pass.as_mut() {
            s.transit_type = Some("PKTransitTypeRocket".into());
        }
        assert_eq!(codes(&validate_pass(&def)), vec!["BAD_TRANSIT_TYPE"]);
        if let Some(s) = def.boarding_pass.as_mut() {
            s.transit_type = Some("PKTransitTypeTrain".into());
        }
        assert!(validate_pass(&def).is_empty());
    }

    #[test]
    fn dates_checked() {
        let mut def = valid();
        def.relevant_date = Some("14/03/2026".into());
        if let Some(s) = def.event_ticket.as_mut() {
            let mut field = PassField::new("when", "When", "tomorrow");
            field.date_style = Some("PKDateStyleShort".into());
            s.secondary_fields.push(field);
        }
        let issues = validate_pass(&def);
        assert_eq!(codes(&issues), vec!["BAD_DATE", "BAD_DATE"]);
    }

    #[test]
    fn iso_shapes() {
        assert!(is_iso8601("2026-03-14"));
        assert!(is_iso8601("2026-03-14T20:00"));
        assert!(is_iso8601("2026-03-14T20:00:00.123+01:00"));
        assert!(is_iso8601("2026-03-14T20:00:00Z"));
        assert!(!is_iso8601("2026-3-14"));
        assert!(!is_iso8601("20:00"));
    }

    #[test]
    fn warnings_do_not_invalidate() {
        let mut def = valid();
        def.description = "d".repeat(121);
        def.logo_text = Some("A very long logo text here".into());
        let issues = validate_pass(&def);
        assert_eq!(codes(&issues), vec!["LONG_DESCRIPTION", "LONG_LOGO_TEXT"]);
        assert!(issues.iter().all(ValidationIssue::is_warning));
        assert!(is_valid(&issues));
    }
}
