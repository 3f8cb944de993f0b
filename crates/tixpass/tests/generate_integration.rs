//! End-to-end generation from a PDF carrying a real QR code.

use std::sync::Arc;

use lopdf::{Document, Object, Stream, dictionary};
use rxing::{BarcodeFormat, MultiFormatWriter, Writer};
use tixpass::manifest::{MANIFEST_FILE, SIGNATURE_FILE};
use tixpass::{
    DocumentType, GeneratorOptions, PassBundle, PassColors, PassDefinition, PassGenerator, RxingDecoder,
    SigningIdentity, TicketExtraction, manifest,
};

const PASS_PEM: &str = include_str!("fixtures/pass.pem");
const KEY_PEM: &str = include_str!("fixtures/key.pem");
const WWDR_PEM: &str = include_str!("fixtures/wwdr.pem");

/// A 200x100 pt page with `text` drawn as a vector QR code.
fn qr_pdf(text: &str) -> Vec<u8> {
    let matrix = MultiFormatWriter
        .encode(text, &BarcodeFormat::QR_CODE, 0, 0)
        .expect("encode QR");
    let mut content = b"q 3 0 0 -3 20 95 cm\n".to_vec();
    for y in 0..matrix.getHeight() {
        for x in 0..matrix.getWidth() {
            if matrix.get(x, y) {
                content.extend_from_slice(format!("{x} {y} 1 1 re\n").as_bytes());
            }
        }
    }
    content.extend_from_slice(b"f Q");

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let content_id = doc.add_object(Stream::new(dictionary! {}, content));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => dictionary! {},
        "MediaBox" => vec![0.into(), 0.into(), 200.into(), 100.into()],
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}

fn ticket() -> TicketExtraction {
    TicketExtraction {
        document_type: DocumentType::BoardingPass,
        title: "Lisbon to Porto".to_string(),
        date: Some("2026-12-03".to_string()),
        time: Some("07:45".to_string()),
        seat_info: Some("14C".to_string()),
        ..TicketExtraction::default()
    }
}

#[test]
fn qr_ticket_becomes_signed_pass() {
    let identity = SigningIdentity::from_pem(PASS_PEM, KEY_PEM, WWDR_PEM).unwrap();
    let generator = PassGenerator::new(
        GeneratorOptions::default(),
        Some(Arc::new(identity)),
        Box::new(RxingDecoder::new()),
    );
    let report = generator
        .generate(&qr_pdf("M1DOE/JANE EABC123 LISOPO 1234"), "boarding.pdf", &ticket(), &PassColors::default())
        .unwrap();

    assert_eq!(report.strategy, Some("raster"));
    assert_eq!(report.passes.len(), 1);
    let pass = &report.passes[0];
    assert!(pass.signed);

    let bundle = PassBundle::from_pkpass(&pass.bytes).unwrap();
    assert!(bundle.contains(SIGNATURE_FILE));
    let mismatches = manifest::verify(bundle.get(MANIFEST_FILE).unwrap(), bundle.files()).unwrap();
    assert!(mismatches.is_empty(), "{mismatches:?}");

    let def: PassDefinition = serde_json::from_slice(bundle.get("pass.json").unwrap()).unwrap();
    let barcode = def.barcode.expect("barcode");
    assert_eq!(barcode.format, "PKBarcodeFormatQR");
    assert_eq!(barcode.message, "M1DOE/JANE EABC123 LISOPO 1234");
    assert_eq!(barcode.message_encoding, "iso-8859-1");
    let boarding = def.boarding_pass.expect("boarding pass style");
    assert_eq!(boarding.transit_type.as_deref(), Some("PKTransitTypeAir"));
    assert_eq!(def.expiration_date.as_deref(), Some("2026-12-04T03:00:00Z"));
}

#[test]
fn detection_report_without_generation() {
    let generator = PassGenerator::new(GeneratorOptions::default(), None, Box::new(RxingDecoder::new()));
    let report = generator.detect(&qr_pdf("EVT-7781-GA-0042"), "event.pdf").unwrap();
    assert_eq!(report.barcodes.len(), 1);
    assert_eq!(report.barcodes[0].text, "EVT-7781-GA-0042");
    assert!(report.warnings.is_empty());
}
