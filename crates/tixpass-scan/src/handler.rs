//! Content handler callback trait for content stream interpretation.
//!
//! Defines the [`ContentHandler`] trait that bridges the content stream
//! interpreter and its consumers (the page rasterizer and the embedded
//! image collector). The interpreter calls handler methods as it paints.

use image::GrayImage;
use tiny_skia::{Path, Transform};

/// The type of paint operation applied to a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaintOp {
    Stroke,
    Fill,
    FillAndStroke,
}

/// Winding rule for filled paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillRule {
    NonZeroWinding,
    EvenOdd,
}

/// A painted path, in user space, with the state needed to draw it.
#[derive(Debug, Clone)]
pub struct PathEvent {
    pub path: Path,
    pub paint_op: PaintOp,
    pub fill_rule: FillRule,
    /// CTM at the time of painting.
    pub ctm: Transform,
    pub line_width: f32,
    /// Fill luminance in `0.0..=1.0`.
    pub fill_gray: f32,
    /// Stroke luminance in `0.0..=1.0`.
    pub stroke_gray: f32,
}

/// A placed image, already decoded to grayscale.
///
/// The image occupies the unit square of the CTM's user space, with its
/// first row at the top (y = 1).
#[derive(Debug, Clone)]
pub struct ImageEvent {
    /// XObject name (e.g. `"Im0"`), or `"inline"` for `BI` images.
    pub name: String,
    pub ctm: Transform,
    pub image: GrayImage,
}

/// Callback handler for content stream interpretation.
///
/// All methods have default no-op implementations, allowing handlers to
/// subscribe only to the event types they care about.
pub trait ContentHandler {
    /// Called when a path is painted (stroked, filled, or both).
    fn on_path_painted(&mut self, _event: PathEvent) {}

    /// Called when an image XObject or inline image is placed on the page.
    fn on_image(&mut self, _event: ImageEvent) {}

    /// Whether image events are wanted. Returning `false` lets the
    /// interpreter skip decoding image data entirely.
    fn wants_images(&self) -> bool {
        true
    }

    /// Largest image, in pixels, worth decoding. Bigger images are skipped
    /// before their data is decompressed.
    fn max_image_pixels(&self) -> u64 {
        u64::MAX
    }

    /// Whether path events are wanted.
    fn wants_paths(&self) -> bool {
        true
    }
}
