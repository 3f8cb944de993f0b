//! Pass images: category icons and a first-page thumbnail.

use std::io::Cursor;

use image::{DynamicImage, ImageFormat};
use tiny_skia::{Color, FillRule, Paint, PathBuilder, Pixmap, Rect, Transform};
use tixpass_core::{DocumentType, PassError, Rgb};
use tracing::debug;

use crate::document::TicketDocument;

/// Icon file names with their pixel size.
pub const ICONS: [(&str, u32); 3] = [("icon.png", 29), ("icon@2x.png", 58), ("icon@3x.png", 87)];
pub const THUMBNAIL_FILE: &str = "thumbnail.png";
/// Thumbnails are rendered at 1.5x the PDF point size.
pub const THUMBNAIL_DPI: u32 = 108;
pub const THUMBNAIL_MAX_SIDE: u32 = 180;

const GLYPH_W: usize = 5;
const GLYPH_H: usize = 7;

/// 5x7 bitmap rows, most significant bit on the left.
fn glyph(c: char) -> [u8; GLYPH_H] {
    match c {
        'A' => [0x0E, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'F' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x10],
        'H' => [0x11, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'I' => [0x0E, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E],
        'K' => [0x11, 0x12, 0x14, 0x18, 0x14, 0x12, 0x11],
        'L' => [0x10, 0x10, 0x10, 0x10, 0x10, 0x10, 0x1F],
        'M' => [0x11, 0x1B, 0x15, 0x15, 0x11, 0x11, 0x11],
        'O' => [0x0E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'P' => [0x1E, 0x11, 0x11, 0x1E, 0x10, 0x10, 0x10],
        'R' => [0x1E, 0x11, 0x11, 0x1E, 0x14, 0x12, 0x11],
        'S' => [0x0F, 0x10, 0x10, 0x0E, 0x01, 0x01, 0x1E],
        'T' => [0x1F, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04],
        'U' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'V' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x0A, 0x04],
        'Y' => [0x11, 0x11, 0x0A, 0x04, 0x04, 0x04, 0x04],
        _ => [0; GLYPH_H],
    }
}

/// Short category label drawn on the icon.
pub fn abbreviation(document_type: DocumentType, title: &str) -> &'static str {
    let title = title.to_lowercase();
    let has = |words: &[&str]| words.iter().any(|w| title.contains(w));
    match document_type {
        DocumentType::BoardingPass => "FLY",
        _ if has(&["air"]) => "FLY",
        DocumentType::Transit => "RAIL",
        _ if has(&["train", "rail"]) => "RAIL",
        DocumentType::Hotel => "HTL",
        DocumentType::EventTicket => "MUS",
        _ if has(&["concert", "music", "show"]) => "MUS",
        _ if has(&["sport", "stadium"]) => "SPT",
        _ if has(&["movie", "theater"]) => "MOV",
        _ => "TKT",
    }
}

fn color(rgb: Rgb) -> Color {
    Color::from_rgba8(rgb.r, rgb.g, rgb.b, 255)
}

/// Draw one square icon: `label` centered in `foreground` on `background`.
pub fn render_icon(size: u32, label: &str, background: Rgb, foreground: Rgb) -> Result<Pixmap, PassError> {
    let mut pixmap = Pixmap::new(size, size)
        .ok_or_else(|| PassError::Other(format!("cannot allocate {size}px icon")))?;
    pixmap.fill(color(background));

    let glyphs: Vec<[u8; GLYPH_H]> = label.chars().map(glyph).collect();
    if glyphs.is_empty() {
        return Ok(pixmap);
    }
    let cols = glyphs.len() * (GLYPH_W + 1) - 1;
    let side = size as f32;
    let cell = (side * 0.8 / cols as f32).min(side * 0.42 / GLYPH_H as f32);
    let origin_x = (side - cell * cols as f32) / 2.0;
    let origin_y = (side - cell * GLYPH_H as f32) / 2.0;

    let mut pb = PathBuilder::new();
    for (i, rows) in glyphs.iter().enumerate() {
        let left = origin_x + (i * (GLYPH_W + 1)) as f32 * cell;
        for (row, bits) in rows.iter().enumerate() {
            for col in 0..GLYPH_W {
                if bits & (1 << (GLYPH_W - 1 - col)) != 0 {
                    if let Some(rect) = Rect::from_xywh(
                        left + col as f32 * cell,
                        origin_y + row as f32 * cell,
                        cell,
                        cell,
                    ) {
                        pb.push_rect(rect);
                    }
                }
            }
        }
    }
    if let Some(path) = pb.finish() {
        let mut paint = Paint::default();
        paint.set_color(color(foreground));
        pixmap.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
    }
    Ok(pixmap)
}

/// PNG-encoded icons at 1x, 2x and 3x.
///
/// # Errors
///
/// Returns [`PassError::Package`] if PNG encoding fails.
pub fn icon_files(
    document_type: DocumentType,
    title: &str,
    background: Rgb,
    foreground: Rgb,
) -> Result<Vec<(&'static str, Vec<u8>)>, PassError> {
    let label = abbreviation(document_type, title);
    ICONS
        .iter()
        .map(|&(name, size)| {
            let png = render_icon(size, label, background, foreground)?
                .encode_png()
                .map_err(|e| PassError::Package(format!("{name}: {e}")))?;
            Ok((name, png))
        })
        .collect()
}

/// First page rendered at [`THUMBNAIL_DPI`] and scaled to fit a
/// [`THUMBNAIL_MAX_SIDE`] square, PNG-encoded.
pub fn thumbnail(doc: &TicketDocument) -> Result<Vec<u8>, PassError> {
    let page = doc.page(0)?;
    let rendered = doc.render(&page, THUMBNAIL_DPI)?;
    let image = DynamicImage::ImageLuma8(rendered.image).thumbnail(THUMBNAIL_MAX_SIDE, THUMBNAIL_MAX_SIDE);
    debug!(width = image.width(), height = image.height(), "rendered thumbnail");

    let mut png = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|e| PassError::Package(format!("{THUMBNAIL_FILE}: {e}")))?;
    Ok(png)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLUE: Rgb = Rgb::new(0, 122, 255);

    #[test]
    fn abbreviations_follow_document_type_then_title() {
        assert_eq!(abbreviation(DocumentType::BoardingPass, ""), "FLY");
        assert_eq!(abbreviation(DocumentType::Transit, "Paris - Lyon"), "RAIL");
        assert_eq!(abbreviation(DocumentType::Generic, "Night train to Vienna"), "RAIL");
        assert_eq!(abbreviation(DocumentType::Hotel, ""), "HTL");
        assert_eq!(abbreviation(DocumentType::EventTicket, "Stadium tour"), "MUS");
        assert_eq!(abbreviation(DocumentType::Generic, "Stadium tour"), "SPT");
        assert_eq!(abbreviation(DocumentType::Generic, "Movie night"), "MOV");
        assert_eq!(abbreviation(DocumentType::Generic, "Parking"), "TKT");
    }

    #[test]
    fn icon_has_background_corners_and_foreground_center() {
        let pixmap = render_icon(87, "TKT", BLUE, Rgb::WHITE).unwrap();
        let at = |x: u32, y: u32| pixmap.pixel(x, y).unwrap();
        assert_eq!(at(0, 0).blue(), 255);
        assert_eq!(at(0, 0).red(), 0);
        // Middle of the stem of the center 'K' is lit.
        let lit = (0..87).any(|x| at(x, 43).red() == 255);
        assert!(lit);
    }

    #[test]
    fn icons_are_png_at_three_scales() {
        let files = icon_files(DocumentType::Hotel, "", BLUE, Rgb::WHITE).unwrap();
        let names: Vec<_> = files.iter().map(|(n, _)| *n).collect();
        assert_eq!(names, ["icon.png", "icon@2x.png", "icon@3x.png"]);
        for ((_, png), (_, size)) in files.iter().zip(ICONS) {
            let decoded = image::load_from_memory_with_format(png, ImageFormat::Png).unwrap();
            assert_eq!((decoded.width(), decoded.height()), (size, size));
        }
    }

    #[test]
    fn thumbnail_fits_box_and_keeps_aspect() {
        let bytes = crate::document::test_pdf::pages(&[b"0 0 100 100 re f"]);
        let doc = TicketDocument::open(&bytes, Default::default()).unwrap();
        let png = thumbnail(&doc).unwrap();
        let decoded = image::load_from_memory_with_format(&png, ImageFormat::Png).unwrap();
        // 200x100 pt at 108 dpi is 300x150 px.
        assert_eq!((decoded.width(), decoded.height()), (180, 90));
    }
}
