//! Serde serialization/deserialization round-trip tests.
//!
//! These tests verify that the JSON-facing data types survive a trip
//! through serde_json and keep the wire names other tools depend on.

use tixpass_core::*;

/// Helper: serialize to JSON string, deserialize back, assert equality.
fn roundtrip<T>(value: &T) -> String
where
    T: serde::Serialize + serde::de::DeserializeOwned + PartialEq + std::fmt::Debug,
{
    let json = serde_json::to_string(value).expect("serialize failed");
    let restored: T = serde_json::from_str(&json).expect("deserialize failed");
    assert_eq!(*value, restored, "round-trip mismatch for JSON: {json}");
    json
}

#[test]
fn test_serde_candidate() {
    let candidate = BarcodeCandidate::new(
        Symbology::Pdf417,
        vec![0x4D, 0x31, 0xE9, 0x00],
        BBox::new(10.0, 20.0, 300.0, 80.0),
        90,
        DetectionMethod::Enhanced {
            dpi: 600,
            enhancement: Enhancement::MorphClose,
        },
        2,
        600,
    );
    let json = roundtrip(&candidate);
    assert!(json.contains("\"symbology\":\"PDF417\""));
    assert!(json.contains("\"kind\":\"enhanced\""));
    assert!(json.contains("\"enhancement\":\"morph_close\""));
}

#[test]
fn test_serde_detection_methods() {
    for method in [
        DetectionMethod::EmbeddedImage,
        DetectionMethod::Raster { dpi: 144 },
        DetectionMethod::TextPattern,
    ] {
        roundtrip(&method);
    }
}

#[test]
fn test_serde_ticket_extraction() {
    let ticket = TicketExtraction {
        document_type: DocumentType::Transit,
        title: "Paris to Lyon".to_string(),
        organization: Some("SNCF".to_string()),
        date: Some("2026-05-02".to_string()),
        time: Some("07:58".to_string()),
        seat_info: Some("Coach 14 Seat 61".to_string()),
        confidence: 77,
        ..TicketExtraction::default()
    };
    let json = roundtrip(&ticket);
    assert!(json.contains("\"document_type\":\"transit\""));
}

#[test]
fn test_serde_colors() {
    let colors = PassColors {
        background: Rgb::new(12, 34, 56),
        foreground: Rgb::new(250, 250, 250),
        label: Rgb::new(200, 200, 0),
    };
    let json = roundtrip(&colors);
    assert!(json.contains("\"rgb(12, 34, 56)\""));
}

#[test]
fn test_serde_pass_definition() {
    let mut def = PassDefinition {
        pass_type_identifier: "pass.com.example.tickets".to_string(),
        serial_number: "9f1c".to_string(),
        team_identifier: "ABCDE12345".to_string(),
        organization_name: "Example".to_string(),
        description: "Train".to_string(),
        boarding_pass: Some(PassStructure {
            transit_type: Some("PKTransitTypeTrain".to_string()),
            header_fields: vec![PassField::new("header", "TRANSIT", "Paris to Lyon")],
            ..PassStructure::default()
        }),
        expiration_date: Some("2026-05-03T03:00:00Z".to_string()),
        associated_store_identifiers: Some(vec![6448263945]),
        ..PassDefinition::default()
    };
    def.barcode = Some(PassBarcode::new(PassBarcodeFormat::Aztec, "PNR ABC123"));
    def.barcodes = def.barcode.clone().map(|b| vec![b]);
    let json = roundtrip(&def);
    assert!(json.contains("\"boardingPass\""));
    assert!(json.contains("\"transitType\":\"PKTransitTypeTrain\""));
    assert!(json.contains("\"associatedStoreIdentifiers\":[6448263945]"));
    assert!(!json.contains("null"));
}

#[test]
fn test_serde_symbology_tags() {
    for s in Symbology::ALL {
        let json = roundtrip(&s);
        assert_eq!(json, format!("\"{}\"", s.as_str()));
    }
    for f in PassBarcodeFormat::ALL {
        let json = roundtrip(&f);
        assert_eq!(json, format!("\"{}\"", f.as_str()));
    }
}

#[test]
fn test_serialize_validation_issue() {
    let issues = validate_pass(&PassDefinition::default());
    let value = serde_json::to_value(&issues).expect("serialize failed");
    let first = &value[0];
    assert_eq!(first["severity"], "error");
    assert_eq!(first["code"], "MISSING_FIELD");
    assert_eq!(first["location"], "passTypeIdentifier");
}
