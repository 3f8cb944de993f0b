//! Page rasterization.
//!
//! Renders a page's vector paths and images to a grayscale bitmap with
//! tiny-skia. Text is not drawn: barcodes are painted as paths or images,
//! and glyphs would only add noise for the decoder.

use image::GrayImage;
use tiny_skia::{Color, Paint, Pixmap, PixmapPaint, Stroke, Transform};
use tixpass_core::DetectOptions;
use tracing::{debug, trace};

use crate::backend::{PageBox, PdfBackend};
use crate::error::ScanError;
use crate::handler::{ContentHandler, FillRule, ImageEvent, PaintOp, PathEvent};
use crate::lopdf_backend::{LopdfBackend, LopdfDocument, LopdfPage};

/// A rendered page.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub image: GrayImage,
    /// Resolution actually used, after the pixel budget was applied.
    pub dpi: u32,
}

/// Transform from PDF user space to device pixels at `dpi`.
///
/// Device space has its origin at the top-left of `page_box` with y down.
pub fn page_transform(page_box: &PageBox, dpi: u32) -> Transform {
    let s = dpi as f32 / 72.0;
    Transform::from_row(
        s,
        0.0,
        0.0,
        -s,
        -s * page_box.llx as f32,
        s * page_box.ury as f32,
    )
}

/// Render one page at `dpi`, capped to the pixel budget in `options`.
///
/// # Errors
///
/// Returns an error if the page cannot be read or the bitmap cannot be
/// allocated.
pub fn render_page(
    doc: &LopdfDocument,
    page: &LopdfPage,
    dpi: u32,
    options: &DetectOptions,
) -> Result<RenderedPage, ScanError> {
    let page_box = LopdfBackend::page_media_box(doc, page)?;
    let dpi = options.effective_dpi(dpi, page_box.width(), page_box.height());
    let scale = f64::from(dpi) / 72.0;
    let width = ((page_box.width() * scale).ceil() as u32).max(1);
    let height = ((page_box.height() * scale).ceil() as u32).max(1);

    let mut rasterizer = Rasterizer::new(width, height)?;
    rasterizer.max_image_pixels = options.max_raster_pixels;
    LopdfBackend::interpret_page(
        doc,
        page,
        &mut rasterizer,
        page_transform(&page_box, dpi),
        options.max_form_depth,
    )?;
    debug!(
        page = page.number(),
        dpi,
        width,
        height,
        paths = rasterizer.paths,
        images = rasterizer.images,
        "rendered page"
    );
    Ok(RenderedPage {
        image: rasterizer.into_gray(),
        dpi,
    })
}

/// A [`ContentHandler`] that paints onto a white pixmap.
pub struct Rasterizer {
    pixmap: Pixmap,
    paths: usize,
    images: usize,
    max_image_pixels: u64,
}

impl Rasterizer {
    /// Create a white canvas of `width` x `height` pixels.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::Raster`] if either side is zero or the canvas is
    /// too large to allocate.
    pub fn new(width: u32, height: u32) -> Result<Self, ScanError> {
        let mut pixmap = Pixmap::new(width, height).ok_or_else(|| {
            ScanError::Raster(format!("cannot allocate {width}x{height} pixmap"))
        })?;
        pixmap.fill(Color::WHITE);
        Ok(Self {
            pixmap,
            paths: 0,
            images: 0,
            max_image_pixels: u64::MAX,
        })
    }

    /// Finish rendering and return the canvas as grayscale.
    pub fn into_gray(self) -> GrayImage {
        let (w, h) = (self.pixmap.width(), self.pixmap.height());
        // The canvas is opaque, so premultiplied red equals gray.
        let data: Vec<u8> = self.pixmap.pixels().iter().map(|p| p.red()).collect();
        GrayImage::from_raw(w, h, data).unwrap_or_else(|| GrayImage::new(w, h))
    }
}

fn gray_paint(gray: f32) -> Paint<'static> {
    let v = (gray.clamp(0.0, 1.0) * 255.0).round() as u8;
    let mut paint = Paint::default();
    paint.set_color_rgba8(v, v, v, 255);
    paint
}

/// Convert a grayscale image to an opaque pixmap.
fn gray_to_pixmap(image: &GrayImage) -> Option<Pixmap> {
    let mut pixmap = Pixmap::new(image.width(), image.height())?;
    for (dst, &g) in pixmap.data_mut().chunks_exact_mut(4).zip(image.as_raw()) {
        dst.copy_from_slice(&[g, g, g, 255]);
    }
    Some(pixmap)
}

impl ContentHandler for Rasterizer {
    fn on_path_painted(&mut self, event: PathEvent) {
        self.paths += 1;
        let fill_rule = match event.fill_rule {
            FillRule::NonZeroWinding => tiny_skia::FillRule::Winding,
            FillRule::EvenOdd => tiny_skia::FillRule::EvenOdd,
        };
        if matches!(event.paint_op, PaintOp::Fill | PaintOp::FillAndStroke) {
            self.pixmap.fill_path(
                &event.path,
                &gray_paint(event.fill_gray),
                fill_rule,
                event.ctm,
                None,
            );
        }
        if matches!(event.paint_op, PaintOp::Stroke | PaintOp::FillAndStroke) {
            // Width 0 strokes as a one-pixel hairline.
            let stroke = Stroke {
                width: event.line_width.max(0.0),
                ..Stroke::default()
            };
            self.pixmap.stroke_path(
                &event.path,
                &gray_paint(event.stroke_gray),
                &stroke,
                event.ctm,
                None,
            );
        }
    }

    fn on_image(&mut self, event: ImageEvent) {
        let (w, h) = event.image.dimensions();
        let Some(source) = gray_to_pixmap(&event.image) else {
            trace!(xobject = %event.name, "skipping empty image");
            return;
        };
        self.images += 1;
        let to_unit = Transform::from_row(1.0 / w as f32, 0.0, 0.0, -1.0 / h as f32, 0.0, 1.0);
        self.pixmap.draw_pixmap(
            0,
            0,
            source.as_ref(),
            &PixmapPaint::default(),
            event.ctm.pre_concat(to_unit),
            None,
        );
    }

    fn max_image_pixels(&self) -> u64 {
        self.max_image_pixels
    }
}
