//! Barcode decoding on grayscale bitmaps.
//!
//! [`BarcodeDecoder`] is the seam between detection and any concrete
//! decoding library. [`RxingDecoder`] implements it with rxing, which reads
//! every symbology tickets use (Aztec and PDF417 included).

use std::collections::HashSet;

use image::GrayImage;
use rxing::{BarcodeFormat, DecodeHints, RXingResult, RXingResultMetadataType, RXingResultMetadataValue};
use tixpass_core::candidate::decode_payload_text;
use tixpass_core::{BBox, Symbology};
use tracing::trace;

/// One symbol found in a bitmap.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedSymbol {
    pub symbology: Symbology,
    /// Exact message bytes.
    pub payload: Vec<u8>,
    /// Bounding box in bitmap pixels.
    pub bbox: BBox,
}

/// Decodes barcodes in a grayscale image.
pub trait BarcodeDecoder: Send + Sync {
    /// Return every symbol of the given symbologies found in `image`.
    ///
    /// Decoding failures are not errors: an image without a readable code
    /// yields an empty list.
    fn decode(&self, image: &GrayImage, formats: &[Symbology]) -> Vec<DecodedSymbol>;
}

/// [`BarcodeDecoder`] backed by rxing's multi-symbol reader.
#[derive(Debug, Clone, Copy, Default)]
pub struct RxingDecoder {
    /// Also try the inverted image (light modules on a dark background).
    pub also_inverted: bool,
}

impl RxingDecoder {
    pub fn new() -> Self {
        Self::default()
    }
}

fn to_rxing(symbology: Symbology) -> BarcodeFormat {
    match symbology {
        Symbology::Aztec => BarcodeFormat::AZTEC,
        Symbology::Pdf417 => BarcodeFormat::PDF_417,
        Symbology::QrCode => BarcodeFormat::QR_CODE,
        Symbology::DataMatrix => BarcodeFormat::DATA_MATRIX,
        Symbology::Code128 => BarcodeFormat::CODE_128,
        Symbology::Code39 => BarcodeFormat::CODE_39,
        Symbology::Code93 => BarcodeFormat::CODE_93,
        Symbology::Ean13 => BarcodeFormat::EAN_13,
        Symbology::Ean8 => BarcodeFormat::EAN_8,
        Symbology::UpcA => BarcodeFormat::UPC_A,
        Symbology::UpcE => BarcodeFormat::UPC_E,
        Symbology::Codabar => BarcodeFormat::CODABAR,
        Symbology::Itf => BarcodeFormat::ITF,
    }
}

fn from_rxing(format: &BarcodeFormat) -> Option<Symbology> {
    Some(match format {
        BarcodeFormat::AZTEC => Symbology::Aztec,
        BarcodeFormat::PDF_417 => Symbology::Pdf417,
        BarcodeFormat::QR_CODE => Symbology::QrCode,
        BarcodeFormat::DATA_MATRIX => Symbology::DataMatrix,
        BarcodeFormat::CODE_128 => Symbology::Code128,
        BarcodeFormat::CODE_39 => Symbology::Code39,
        BarcodeFormat::CODE_93 => Symbology::Code93,
        BarcodeFormat::EAN_13 => Symbology::Ean13,
        BarcodeFormat::EAN_8 => Symbology::Ean8,
        BarcodeFormat::UPC_A => Symbology::UpcA,
        BarcodeFormat::UPC_E => Symbology::UpcE,
        BarcodeFormat::CODABAR => Symbology::Codabar,
        BarcodeFormat::ITF => Symbology::Itf,
        _ => return None,
    })
}

/// Recover the message bytes of a result.
///
/// Byte-mode segments carry the original bytes; they are used when they
/// account for the whole text. Otherwise the text is re-encoded as UTF-8.
fn payload_bytes(result: &RXingResult) -> Vec<u8> {
    let text = result.getText();
    if let Some(RXingResultMetadataValue::ByteSegments(segments)) = result
        .getRXingResultMetadata()
        .get(&RXingResultMetadataType::BYTE_SEGMENTS)
    {
        let joined: Vec<u8> = segments.concat();
        if !joined.is_empty() && decode_payload_text(&joined) == text {
            return joined;
        }
    }
    text.as_bytes().to_vec()
}

fn symbol_bbox(result: &RXingResult, image: &GrayImage) -> BBox {
    let points: Vec<(f64, f64)> = result
        .getPoints()
        .iter()
        .map(|p| (f64::from(p.x), f64::from(p.y)))
        .collect();
    BBox::from_points(&points).unwrap_or_else(|| {
        BBox::from_xywh(0.0, 0.0, f64::from(image.width()), f64::from(image.height()))
    })
}

impl BarcodeDecoder for RxingDecoder {
    fn decode(&self, image: &GrayImage, formats: &[Symbology]) -> Vec<DecodedSymbol> {
        if formats.is_empty() || image.width() == 0 || image.height() == 0 {
            return Vec::new();
        }
        let possible: HashSet<BarcodeFormat> = formats.iter().map(|&s| to_rxing(s)).collect();
        let mut hints = DecodeHints {
            PossibleFormats: Some(possible),
            TryHarder: Some(true),
            ..DecodeHints::default()
        };
        if self.also_inverted {
            hints.AlsoInverted = Some(true);
        }

        let results = match rxing::helpers::detect_multiple_in_luma_with_hints(
            image.as_raw().clone(),
            image.width(),
            image.height(),
            &mut hints,
        ) {
            Ok(results) => results,
            Err(e) => {
                trace!(error = %e, width = image.width(), height = image.height(), "no symbols decoded");
                return Vec::new();
            }
        };

        results
            .iter()
            .filter_map(|result| {
                let Some(symbology) = from_rxing(result.getBarcodeFormat()) else {
                    trace!(format = %result.getBarcodeFormat(), "ignoring unmapped format");
                    return None;
                };
                if !formats.contains(&symbology) {
                    return None;
                }
                Some(DecodedSymbol {
                    symbology,
                    payload: payload_bytes(result),
                    bbox: symbol_bbox(result, image),
                })
            })
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod test_codes {
    //! Synthetic barcode bitmaps drawn with rxing's writers.

    use image::{GrayImage, Luma};
    use rxing::{BarcodeFormat, MultiFormatWriter, Writer};

    /// Render `text` as `format` into a `width` x `height` bitmap.
    pub fn render(text: &str, format: BarcodeFormat, width: u32, height: u32) -> GrayImage {
        let matrix = MultiFormatWriter
            .encode(text, &format, width as i32, height as i32)
            .expect("failed to encode test barcode");
        GrayImage::from_fn(matrix.getWidth(), matrix.getHeight(), |x, y| {
            if matrix.get(x, y) { Luma([0]) } else { Luma([255]) }
        })
    }

    /// Place `code` in the middle of a white canvas of the given size.
    pub fn on_canvas(code: &GrayImage, width: u32, height: u32) -> GrayImage {
        let mut canvas = GrayImage::from_pixel(width, height, Luma([255]));
        let x = i64::from(width.saturating_sub(code.width()) / 2);
        let y = i64::from(height.saturating_sub(code.height()) / 2);
        image::imageops::overlay(&mut canvas, code, x, y);
        canvas
    }
}
