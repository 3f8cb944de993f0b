//! Per-image barcode detection and embedded image collection.

use image::GrayImage;
use tiny_skia::Transform;
use tixpass_core::candidate::decode_confidence;
use tixpass_core::{BarcodeCandidate, DetectOptions, DetectionMethod, detect_by_precedence};
use tracing::{debug, trace};

use crate::backend::PdfBackend;
use crate::decoder::BarcodeDecoder;
use crate::error::ScanError;
use crate::handler::{ContentHandler, ImageEvent};
use crate::lopdf_backend::{LopdfBackend, LopdfDocument, LopdfPage};

/// Decode the single best barcode in one bitmap.
///
/// Symbology groups are tried in precedence order and the first group with
/// any hit wins; within it the best candidate is kept.
pub fn detect_in_image(
    decoder: &dyn BarcodeDecoder,
    image: &GrayImage,
    page: usize,
    method: DetectionMethod,
    dpi: u32,
) -> Option<BarcodeCandidate> {
    let center = (f64::from(image.width()) / 2.0, f64::from(image.height()) / 2.0);
    let best = detect_by_precedence(center, |group| {
        let hits: Vec<BarcodeCandidate> = decoder
            .decode(image, group.symbologies())
            .into_iter()
            .map(|symbol| {
                let confidence = decode_confidence(symbol.symbology, symbol.payload.len());
                BarcodeCandidate::new(
                    symbol.symbology,
                    symbol.payload,
                    symbol.bbox,
                    confidence,
                    method,
                    page,
                    dpi,
                )
            })
            .collect();
        trace!(page, group = group.as_str(), hits = hits.len(), "decoded group");
        hits
    });
    if let Some(candidate) = &best {
        debug!(
            page,
            method = %method,
            symbology = %candidate.symbology,
            confidence = candidate.confidence,
            "barcode found"
        );
    }
    best
}

/// An image drawn on a page, decoded to grayscale.
#[derive(Debug, Clone)]
pub struct EmbeddedImage {
    pub name: String,
    pub image: GrayImage,
    /// Effective resolution of the image as placed on the page.
    pub dpi: u32,
}

/// Collects placed images at least `min_side` pixels on both sides.
struct ImageCollector {
    min_side: u32,
    max_pixels: u64,
    images: Vec<EmbeddedImage>,
}

/// Resolution of an image of `pixels` spread across `extent_pt` points.
fn placed_dpi(pixels: u32, extent_pt: f32) -> u32 {
    if extent_pt <= f32::EPSILON {
        return 0;
    }
    (pixels as f32 * 72.0 / extent_pt).round() as u32
}

impl ContentHandler for ImageCollector {
    fn on_image(&mut self, event: ImageEvent) {
        let (w, h) = event.image.dimensions();
        if w < self.min_side || h < self.min_side {
            trace!(xobject = %event.name, width = w, height = h, "skipping small image");
            return;
        }
        // The unit square's x axis maps to the image width on the page.
        let placed_width = event.ctm.sx.hypot(event.ctm.ky);
        self.images.push(EmbeddedImage {
            dpi: placed_dpi(w, placed_width),
            name: event.name,
            image: event.image,
        });
    }

    fn max_image_pixels(&self) -> u64 {
        self.max_pixels
    }

    fn wants_paths(&self) -> bool {
        false
    }
}

/// Decode every image drawn on a page, including those inside forms.
///
/// # Errors
///
/// Returns an error if the page content cannot be read.
pub fn page_images(
    doc: &LopdfDocument,
    page: &LopdfPage,
    options: &DetectOptions,
) -> Result<Vec<EmbeddedImage>, ScanError> {
    let mut collector = ImageCollector {
        min_side: options.min_image_side,
        max_pixels: options.max_raster_pixels,
        images: Vec::new(),
    };
    LopdfBackend::interpret_page(
        doc,
        page,
        &mut collector,
        Transform::identity(),
        options.max_form_depth,
    )?;
    debug!(page = page.number(), images = collector.images.len(), "collected images");
    Ok(collector.images)
}
