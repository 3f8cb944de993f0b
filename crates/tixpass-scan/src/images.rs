//! Image XObject and inline image decoding.
//!
//! Turns PDF image data into an 8-bit grayscale [`GrayImage`], which is all
//! the barcode decoder needs. Supported: DCT (JPEG) through the `image`
//! crate, and uncompressed, Flate, LZW or ASCII85 samples in DeviceGray,
//! DeviceRGB or DeviceCMYK at 8 bits per component, plus 1-bit gray and
//! image masks. Indexed, JPX, CCITT and JBIG2 images are reported as
//! [`ScanError::Image`] and skipped by callers.

use image::{GrayImage, ImageFormat};
use lopdf::{Dictionary, Object, Stream};

use crate::error::ScanError;
use crate::tokenizer::{InlineImageData, Operand};

/// Color model of raw image samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorModel {
    Gray,
    Rgb,
    Cmyk,
}

impl ColorModel {
    pub fn components(self) -> usize {
        match self {
            ColorModel::Gray => 1,
            ColorModel::Rgb => 3,
            ColorModel::Cmyk => 4,
        }
    }

    fn from_name(name: &[u8]) -> Option<Self> {
        match name {
            b"DeviceGray" | b"CalGray" | b"G" => Some(ColorModel::Gray),
            b"DeviceRGB" | b"CalRGB" | b"RGB" => Some(ColorModel::Rgb),
            b"DeviceCMYK" | b"CMYK" => Some(ColorModel::Cmyk),
            _ => None,
        }
    }

    fn from_component_count(n: i64) -> Option<Self> {
        match n {
            1 => Some(ColorModel::Gray),
            3 => Some(ColorModel::Rgb),
            4 => Some(ColorModel::Cmyk),
            _ => None,
        }
    }
}

/// Layout of raw (non-JPEG) image samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleLayout {
    pub width: u32,
    pub height: u32,
    pub bits_per_component: u32,
    pub color: ColorModel,
    /// `/Decode [1 0]`. Image masks read like 1-bit gray: 0 paints black.
    pub inverted: bool,
}

/// Width and height declared in an image XObject dictionary.
pub fn declared_size(dict: &Dictionary) -> (u32, u32) {
    let dim = |key: &[u8]| {
        dict.get(key)
            .and_then(Object::as_i64)
            .map(|v| v.clamp(0, i64::from(u32::MAX)) as u32)
            .unwrap_or(0)
    };
    (dim(b"Width"), dim(b"Height"))
}

/// Decode an image XObject stream to grayscale.
///
/// # Errors
///
/// Returns [`ScanError::Image`] for unsupported encodings or malformed data.
pub fn decode_image_xobject(doc: &lopdf::Document, stream: &Stream) -> Result<GrayImage, ScanError> {
    let filters: Vec<&[u8]> = stream.filters().unwrap_or_default();
    if filters.last() == Some(&&b"DCTDecode"[..]) {
        let jpeg = if filters.len() == 1 {
            stream.content.clone()
        } else {
            // Leading filters (usually ASCII85 or Flate) wrap the JPEG bytes.
            let mut dict = Dictionary::new();
            let leading: Vec<Object> = filters[..filters.len() - 1]
                .iter()
                .map(|f| Object::Name(f.to_vec()))
                .collect();
            dict.set("Filter", Object::Array(leading));
            Stream::new(dict, stream.content.clone())
                .decompressed_content()
                .map_err(|e| ScanError::Image(format!("failed to unwrap JPEG data: {e}")))?
        };
        return decode_jpeg(&jpeg);
    }
    if let Some(unsupported) = filters.iter().find(|f| {
        matches!(
            **f,
            b"JPXDecode" | b"CCITTFaxDecode" | b"JBIG2Decode" | b"RunLengthDecode"
        )
    }) {
        return Err(ScanError::Image(format!(
            "unsupported image filter {}",
            String::from_utf8_lossy(unsupported)
        )));
    }

    let samples = if filters.is_empty() {
        stream.content.clone()
    } else {
        stream
            .decompressed_content()
            .map_err(|e| ScanError::Image(format!("failed to decompress image: {e}")))?
    };

    let layout = xobject_layout(doc, &stream.dict)?;
    samples_to_gray(&samples, &layout)
}

/// Decode an inline image (`BI`/`ID`/`EI`) to grayscale.
///
/// # Errors
///
/// Returns [`ScanError::Image`] for unsupported encodings or malformed data.
pub fn decode_inline_image(inline: &InlineImageData) -> Result<GrayImage, ScanError> {
    let filters: Vec<Vec<u8>> = match inline.get("Filter", "F") {
        Some(Operand::Name(n)) => vec![expand_filter(n).to_vec()],
        Some(Operand::Array(items)) => items
            .iter()
            .filter_map(Operand::as_name)
            .map(|n| expand_filter(n).to_vec())
            .collect(),
        _ => Vec::new(),
    };
    if filters.last().is_some_and(|f| f == b"DCTDecode") {
        return decode_jpeg(&inline.data);
    }

    let samples = if filters.is_empty() {
        inline.data.clone()
    } else {
        let mut dict = Dictionary::new();
        dict.set(
            "Filter",
            Object::Array(filters.into_iter().map(Object::Name).collect()),
        );
        Stream::new(dict, inline.data.clone())
            .decompressed_content()
            .map_err(|e| ScanError::Image(format!("failed to decompress inline image: {e}")))?
    };

    let number = |full: &str, short: &str| {
        inline
            .get(full, short)
            .and_then(Operand::as_f64)
            .map(|v| v.max(0.0) as u32)
    };
    let image_mask = matches!(inline.get("ImageMask", "IM"), Some(Operand::Boolean(true)));
    let color = if image_mask {
        ColorModel::Gray
    } else {
        match inline.get("ColorSpace", "CS") {
            Some(Operand::Name(n)) => ColorModel::from_name(n.as_bytes()).ok_or_else(|| {
                ScanError::Image(format!("unsupported inline image color space {n}"))
            })?,
            _ => ColorModel::Gray,
        }
    };
    let decode_inverted = match inline.get("Decode", "D") {
        Some(Operand::Array(items)) => {
            items.first().and_then(Operand::as_f64) == Some(1.0)
                && items.get(1).and_then(Operand::as_f64) == Some(0.0)
        }
        _ => false,
    };
    let layout = SampleLayout {
        width: number("Width", "W").unwrap_or(0),
        height: number("Height", "H").unwrap_or(0),
        bits_per_component: if image_mask {
            1
        } else {
            number("BitsPerComponent", "BPC").unwrap_or(8)
        },
        color,
        inverted: decode_inverted,
    };
    samples_to_gray(&samples, &layout)
}

fn expand_filter(name: &str) -> &[u8] {
    match name {
        "AHx" => b"ASCIIHexDecode",
        "A85" => b"ASCII85Decode",
        "LZW" => b"LZWDecode",
        "Fl" => b"FlateDecode",
        "RL" => b"RunLengthDecode",
        "CCF" => b"CCITTFaxDecode",
        "DCT" => b"DCTDecode",
        other => other.as_bytes(),
    }
}

fn decode_jpeg(data: &[u8]) -> Result<GrayImage, ScanError> {
    Ok(image::load_from_memory_with_format(data, ImageFormat::Jpeg)?.to_luma8())
}

/// Read the sample layout from an image XObject dictionary.
fn xobject_layout(doc: &lopdf::Document, dict: &Dictionary) -> Result<SampleLayout, ScanError> {
    let (width, height) = declared_size(dict);
    let image_mask = dict
        .get(b"ImageMask")
        .and_then(Object::as_bool)
        .unwrap_or(false);
    let bits_per_component = if image_mask {
        1
    } else {
        dict.get(b"BitsPerComponent")
            .and_then(Object::as_i64)
            .unwrap_or(8)
            .clamp(0, 32) as u32
    };
    let color = if image_mask {
        ColorModel::Gray
    } else {
        match dict.get(b"ColorSpace") {
            Ok(obj) => resolve_color_model(doc, obj)?,
            Err(_) => ColorModel::Gray,
        }
    };
    let decode_inverted = dict
        .get(b"Decode")
        .and_then(Object::as_array)
        .map(|arr| {
            let first = arr.first().and_then(|o| o.as_float().ok());
            let second = arr.get(1).and_then(|o| o.as_float().ok());
            first == Some(1.0) && second == Some(0.0)
        })
        .unwrap_or(false);
    Ok(SampleLayout {
        width,
        height,
        bits_per_component,
        color,
        inverted: decode_inverted,
    })
}

/// Resolve a `/ColorSpace` entry to a color model.
///
/// Handles device names, `[/ICCBased stream]` (by `/N`), and the
/// `[/CalGray ...]`/`[/CalRGB ...]` array forms.
fn resolve_color_model(doc: &lopdf::Document, obj: &Object) -> Result<ColorModel, ScanError> {
    let obj = doc
        .dereference(obj)
        .map(|(_, o)| o)
        .map_err(|e| ScanError::Image(format!("failed to resolve color space: {e}")))?;
    match obj {
        Object::Name(name) => ColorModel::from_name(name).ok_or_else(|| unsupported(name)),
        Object::Array(items) => {
            let family = items
                .first()
                .and_then(|o| o.as_name().ok())
                .ok_or_else(|| unsupported(b"(empty array)"))?;
            match family {
                b"ICCBased" => {
                    let n = items
                        .get(1)
                        .and_then(|o| doc.dereference(o).ok())
                        .and_then(|(_, o)| o.as_stream().ok())
                        .and_then(|s| s.dict.get(b"N").and_then(Object::as_i64).ok())
                        .unwrap_or(3);
                    ColorModel::from_component_count(n).ok_or_else(|| unsupported(b"ICCBased"))
                }
                other => ColorModel::from_name(other).ok_or_else(|| unsupported(other)),
            }
        }
        _ => Err(unsupported(b"(not a name or array)")),
    }
}

fn unsupported(what: &[u8]) -> ScanError {
    ScanError::Image(format!(
        "unsupported color space {}",
        String::from_utf8_lossy(what)
    ))
}

/// Whether a `width` x `height` image fits within `max_pixels`.
pub fn within_pixel_budget(width: u32, height: u32, max_pixels: u64) -> bool {
    u64::from(width) * u64::from(height) <= max_pixels
}

fn sample_count(w: usize, h: usize, n: usize) -> Result<usize, ScanError> {
    w.checked_mul(h)
        .and_then(|wh| wh.checked_mul(n))
        .ok_or_else(|| ScanError::Image(format!("image too large: {w}x{h}x{n}")))
}

/// Convert raw samples to 8-bit gray.
///
/// # Errors
///
/// Returns [`ScanError::Image`] when the layout is unsupported, the declared
/// dimensions overflow, or the data is shorter than they require.
pub fn samples_to_gray(data: &[u8], layout: &SampleLayout) -> Result<GrayImage, ScanError> {
    let SampleLayout {
        width,
        height,
        bits_per_component,
        color,
        inverted,
    } = *layout;
    if width == 0 || height == 0 {
        return Err(ScanError::Image("image has zero size".to_string()));
    }
    let (w, h) = (width as usize, height as usize);

    let pixels: Vec<u8> = match (bits_per_component, color) {
        (8, _) => {
            let n = color.components();
            let needed = sample_count(w, h, n)?;
            if data.len() < needed {
                return Err(ScanError::Image(format!(
                    "image data too short: {} bytes for {width}x{height}x{n}",
                    data.len()
                )));
            }
            data[..needed]
                .chunks_exact(n)
                .map(|px| match color {
                    ColorModel::Gray => px[0],
                    ColorModel::Rgb => rgb_to_gray(px[0], px[1], px[2]),
                    ColorModel::Cmyk => {
                        let k = 255 - u16::from(px[3]);
                        let ch = |c: u8| ((255 - u16::from(c)) * k / 255) as u8;
                        rgb_to_gray(ch(px[0]), ch(px[1]), ch(px[2]))
                    }
                })
                .collect()
        }
        (1, ColorModel::Gray) => {
            let row_bytes = w.div_ceil(8);
            let pixel_count = sample_count(w, h, 1)?;
            if data.len() < sample_count(row_bytes, h, 1)? {
                return Err(ScanError::Image(format!(
                    "bitmap data too short: {} bytes for {width}x{height}",
                    data.len()
                )));
            }
            let mut out = Vec::with_capacity(pixel_count);
            for row in data.chunks_exact(row_bytes).take(h) {
                for x in 0..w {
                    let bit = (row[x / 8] >> (7 - (x % 8))) & 1;
                    out.push(if bit == 1 { 255 } else { 0 });
                }
            }
            out
        }
        (bpc, color) => {
            return Err(ScanError::Image(format!(
                "unsupported sample layout: {bpc} bpc {color:?}"
            )));
        }
    };

    let pixels = if inverted {
        pixels.into_iter().map(|p| 255 - p).collect()
    } else {
        pixels
    };
    GrayImage::from_raw(width, height, pixels)
        .ok_or_else(|| ScanError::Image("pixel buffer does not match dimensions".to_string()))
}

fn rgb_to_gray(r: u8, g: u8, b: u8) -> u8 {
    ((299 * u32::from(r) + 587 * u32::from(g) + 114 * u32::from(b) + 500) / 1000) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;

    fn layout(width: u32, height: u32, bpc: u32, color: ColorModel) -> SampleLayout {
        SampleLayout {
            width,
            height,
            bits_per_component: bpc,
            color,
            inverted: false,
        }
    }

    #[test]
    fn gray_samples_pass_through() {
        let img = samples_to_gray(&[0, 128, 255, 7], &layout(2, 2, 8, ColorModel::Gray)).unwrap();
        assert_eq!(img.as_raw(), &vec![0, 128, 255, 7]);
    }

    #[test]
    fn rgb_samples_reduce_to_luma() {
        let img = samples_to_gray(
            &[255, 255, 255, 0, 0, 0, 255, 0, 0],
            &layout(3, 1, 8, ColorModel::Rgb),
        )
        .unwrap();
        assert_eq!(img.get_pixel(0, 0).0[0], 255);
        assert_eq!(img.get_pixel(1, 0).0[0], 0);
        assert_eq!(img.get_pixel(2, 0).0[0], 76);
    }

    #[test]
    fn cmyk_samples_reduce_to_luma() {
        let img = samples_to_gray(&[0, 0, 0, 0, 0, 0, 0, 255], &layout(2, 1, 8, ColorModel::Cmyk))
            .unwrap();
        assert_eq!(img.get_pixel(0, 0).0[0], 255);
        assert_eq!(img.get_pixel(1, 0).0[0], 0);
    }

    #[test]
    fn one_bit_rows_are_byte_padded() {
        // 10 px wide: two bytes per row.
        let data = [0b1010_0000, 0b0100_0000, 0xFF, 0xC0];
        let img = samples_to_gray(&data, &layout(10, 2, 1, ColorModel::Gray)).unwrap();
        assert_eq!(img.get_pixel(0, 0).0[0], 255);
        assert_eq!(img.get_pixel(1, 0).0[0], 0);
        assert_eq!(img.get_pixel(9, 0).0[0], 255);
        assert_eq!(img.get_pixel(9, 1).0[0], 255);
    }

    #[test]
    fn inverted_layout_flips_values() {
        let mut l = layout(2, 1, 8, ColorModel::Gray);
        l.inverted = true;
        let img = samples_to_gray(&[0, 200], &l).unwrap();
        assert_eq!(img.as_raw(), &vec![255, 55]);
    }

    #[test]
    fn short_data_is_an_error() {
        assert!(samples_to_gray(&[0, 1, 2], &layout(2, 2, 8, ColorModel::Gray)).is_err());
        assert!(samples_to_gray(&[], &layout(0, 2, 8, ColorModel::Gray)).is_err());
        assert!(samples_to_gray(&[0; 16], &layout(2, 2, 16, ColorModel::Gray)).is_err());
    }

    #[test]
    fn huge_declared_dimensions_are_errors() {
        for (bpc, color) in [(8, ColorModel::Rgb), (8, ColorModel::Gray), (1, ColorModel::Gray)] {
            let err = samples_to_gray(&[0; 16], &layout(u32::MAX, u32::MAX, bpc, color)).unwrap_err();
            assert!(matches!(err, ScanError::Image(_)), "{err:?}");
        }
    }

    #[test]
    fn pixel_budget_is_inclusive() {
        assert!(within_pixel_budget(200, 200, 40_000));
        assert!(!within_pixel_budget(201, 200, 40_000));
        assert!(within_pixel_budget(u32::MAX, u32::MAX, u64::MAX));
    }

    #[test]
    fn decodes_raw_xobject() {
        let doc = lopdf::Document::with_version("1.5");
        let stream = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => 2,
                "Height" => 1,
                "ColorSpace" => "DeviceGray",
                "BitsPerComponent" => 8,
            },
            vec![10, 20],
        );
        let img = decode_image_xobject(&doc, &stream).unwrap();
        assert_eq!(img.dimensions(), (2, 1));
        assert_eq!(img.as_raw(), &vec![10, 20]);
    }

    #[test]
    fn decodes_flate_xobject() {
        let doc = lopdf::Document::with_version("1.5");
        let mut stream = Stream::new(
            dictionary! {
                "Subtype" => "Image",
                "Width" => 4,
                "Height" => 4,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
            },
            vec![255; 4 * 4 * 3],
        );
        stream.compress().unwrap();
        assert!(stream.dict.get(b"Filter").is_ok());
        let img = decode_image_xobject(&doc, &stream).unwrap();
        assert!(img.pixels().all(|p| p.0[0] == 255));
    }

    #[test]
    fn decodes_jpeg_xobject() {
        let mut jpeg = Vec::new();
        let source = GrayImage::from_fn(16, 16, |x, _| image::Luma([if x < 8 { 0 } else { 255 }]));
        image::DynamicImage::ImageLuma8(source)
            .write_to(&mut std::io::Cursor::new(&mut jpeg), ImageFormat::Jpeg)
            .unwrap();
        let doc = lopdf::Document::with_version("1.5");
        let stream = Stream::new(
            dictionary! {
                "Subtype" => "Image",
                "Width" => 16,
                "Height" => 16,
                "ColorSpace" => "DeviceGray",
                "BitsPerComponent" => 8,
                "Filter" => "DCTDecode",
            },
            jpeg,
        );
        let img = decode_image_xobject(&doc, &stream).unwrap();
        assert_eq!(img.dimensions(), (16, 16));
        assert!(img.get_pixel(1, 8).0[0] < 64);
        assert!(img.get_pixel(14, 8).0[0] > 192);
    }

    #[test]
    fn image_mask_paints_zero_bits_black() {
        let doc = lopdf::Document::with_version("1.5");
        let stream = Stream::new(
            dictionary! {
                "Subtype" => "Image",
                "Width" => 8,
                "Height" => 1,
                "ImageMask" => true,
            },
            vec![0b0000_1111],
        );
        let img = decode_image_xobject(&doc, &stream).unwrap();
        assert_eq!(img.get_pixel(0, 0).0[0], 0);
        assert_eq!(img.get_pixel(7, 0).0[0], 255);
    }

    #[test]
    fn rejects_unsupported_filters_and_spaces() {
        let doc = lopdf::Document::with_version("1.5");
        let jbig2 = Stream::new(
            dictionary! { "Width" => 1, "Height" => 1, "Filter" => "JBIG2Decode" },
            vec![0],
        );
        assert!(matches!(
            decode_image_xobject(&doc, &jbig2),
            Err(ScanError::Image(_))
        ));
        let indexed = Stream::new(
            dictionary! {
                "Width" => 1,
                "Height" => 1,
                "BitsPerComponent" => 8,
                "ColorSpace" => vec![Object::Name(b"Indexed".to_vec())],
            },
            vec![0],
        );
        assert!(decode_image_xobject(&doc, &indexed).is_err());
    }

    #[test]
    fn decodes_inline_gray_image() {
        let inline = InlineImageData {
            dict: vec![
                ("W".to_string(), Operand::Integer(2)),
                ("H".to_string(), Operand::Integer(1)),
                ("CS".to_string(), Operand::Name("G".to_string())),
                ("BPC".to_string(), Operand::Integer(8)),
            ],
            data: vec![0, 255],
        };
        let img = decode_inline_image(&inline).unwrap();
        assert_eq!(img.as_raw(), &vec![0, 255]);
    }

    #[test]
    fn declared_size_reads_dimensions() {
        let dict = dictionary! { "Width" => 640, "Height" => 480 };
        assert_eq!(declared_size(&dict), (640, 480));
        assert_eq!(declared_size(&Dictionary::new()), (0, 0));
    }
}
