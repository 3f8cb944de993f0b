//! End-to-end decoding of barcodes drawn into real PDF documents.

use image::{GrayImage, Luma};
use lopdf::{Document, Object, Stream, dictionary};
use rxing::common::BitMatrix;
use rxing::{BarcodeFormat, MultiFormatWriter, Writer};
use tixpass_core::{DetectOptions, DetectionMethod, Symbology};
use tixpass_scan::{LopdfBackend, PdfBackend, RxingDecoder, detect_in_image, page_images, render_page};

fn qr_matrix(text: &str) -> BitMatrix {
    MultiFormatWriter
        .encode(text, &BarcodeFormat::QR_CODE, 0, 0)
        .expect("encode QR")
}

/// Single 200x100 pt page with the given content and resources.
fn one_page_pdf(content: Vec<u8>, resources: impl FnOnce(&mut Document) -> lopdf::Dictionary) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let resources = resources(&mut doc);
    let content_id = doc.add_object(Stream::new(dictionary! {}, content));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => resources,
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

#[test]
fn vector_qr_is_decoded_from_rendered_page() {
    let matrix = qr_matrix("PNR:XK42LM;SEAT:12A");
    let mut content = b"q 3 0 0 -3 20 95 cm\n".to_vec();
    for y in 0..matrix.getHeight() {
        for x in 0..matrix.getWidth() {
            if matrix.get(x, y) {
                content.extend_from_slice(format!("{x} {y} 1 1 re\n").as_bytes());
            }
        }
    }
    content.extend_from_slice(b"f Q");
    let bytes = one_page_pdf(content, |_| lopdf::Dictionary::new());

    let doc = LopdfBackend::open(&bytes).unwrap();
    let page = LopdfBackend::get_page(&doc, 0).unwrap();
    let rendered = render_page(&doc, &page, 144, &DetectOptions::default()).unwrap();
    assert_eq!(rendered.image.dimensions(), (400, 200));

    let method = DetectionMethod::Raster { dpi: rendered.dpi };
    let found = detect_in_image(&RxingDecoder::new(), &rendered.image, 1, method, rendered.dpi)
        .expect("QR should decode");
    assert_eq!(found.symbology, Symbology::QrCode);
    assert_eq!(found.text, "PNR:XK42LM;SEAT:12A");
    assert_eq!(found.dpi, 144);
}

#[test]
fn embedded_qr_image_is_decoded() {
    let matrix = qr_matrix("EVT-7781-GA-0042");
    let scale = 4;
    let qr = GrayImage::from_fn(matrix.getWidth() * scale, matrix.getHeight() * scale, |x, y| {
        if matrix.get(x / scale, y / scale) { Luma([0]) } else { Luma([255]) }
    });
    let (w, h) = qr.dimensions();
    let bytes = one_page_pdf(b"q 90 0 0 90 55 5 cm /Im0 Do Q".to_vec(), |doc| {
        let image_id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => i64::from(w),
                "Height" => i64::from(h),
                "ColorSpace" => "DeviceGray",
                "BitsPerComponent" => 8,
            },
            qr.into_raw(),
        ));
        dictionary! { "XObject" => dictionary! { "Im0" => image_id } }
    });

    let doc = LopdfBackend::open(&bytes).unwrap();
    let page = LopdfBackend::get_page(&doc, 0).unwrap();
    let images = page_images(&doc, &page, &DetectOptions::default()).unwrap();
    assert_eq!(images.len(), 1);

    let found = detect_in_image(
        &RxingDecoder::new(),
        &images[0].image,
        1,
        DetectionMethod::EmbeddedImage,
        images[0].dpi,
    )
    .expect("QR should decode");
    assert_eq!(found.payload, b"EVT-7781-GA-0042");
    assert_eq!(found.method, DetectionMethod::EmbeddedImage);
}

#[test]
fn page_without_barcode_yields_nothing() {
    let bytes = one_page_pdf(b"0 0 50 50 re f".to_vec(), |_| lopdf::Dictionary::new());
    let doc = LopdfBackend::open(&bytes).unwrap();
    let page = LopdfBackend::get_page(&doc, 0).unwrap();
    let rendered = render_page(&doc, &page, 72, &DetectOptions::default()).unwrap();
    let found = detect_in_image(
        &RxingDecoder::new(),
        &rendered.image,
        1,
        DetectionMethod::Raster { dpi: 72 },
        72,
    );
    assert!(found.is_none());
}
