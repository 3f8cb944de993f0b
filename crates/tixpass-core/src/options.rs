//! Detection options.

use crate::candidate::Enhancement;

/// Options controlling the barcode detection ladder.
///
/// Limits bound the work done on hostile or oversized documents; they do not
/// change which barcodes are found on well-formed ones.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectOptions {
    /// Resolutions tried in order by the raster strategy. Default: `[144, 300]`.
    pub raster_dpis: Vec<u32>,
    /// Resolution for the enhancement strategy. Default: 600.
    pub enhance_dpi: u32,
    /// Enhancements tried in order at `enhance_dpi`. Default: all of them.
    pub enhancements: Vec<Enhancement>,
    /// Embedded images smaller than this on either side are skipped. Default: 32.
    pub min_image_side: u32,
    /// Pixel budget per rendered page. Pages that would exceed it are
    /// rendered at the largest resolution that fits. Default: 40 million.
    pub max_raster_pixels: u64,
    /// Maximum nesting of form XObjects. Default: 10.
    pub max_form_depth: usize,
    /// Fall back to matching barcode-like strings in the page text.
    /// Default: false.
    pub text_fallback: bool,
}

impl Default for DetectOptions {
    fn default() -> Self {
        Self {
            raster_dpis: vec![144, 300],
            enhance_dpi: 600,
            enhancements: Enhancement::ALL.to_vec(),
            min_image_side: 32,
            max_raster_pixels: 40_000_000,
            max_form_depth: 10,
            text_fallback: false,
        }
    }
}

impl DetectOptions {
    /// Resolution that keeps a page of `width_pt` x `height_pt` points within
    /// `max_raster_pixels` at no more than `dpi`. Never below 1.
    pub fn effective_dpi(&self, dpi: u32, width_pt: f64, height_pt: f64) -> u32 {
        let pixels_at = |d: f64| (width_pt * d / 72.0).ceil() * (height_pt * d / 72.0).ceil();
        let requested = f64::from(dpi);
        if width_pt <= 0.0 || height_pt <= 0.0 || pixels_at(requested) <= self.max_raster_pixels as f64 {
            return dpi;
        }
        let area_in = (width_pt / 72.0) * (height_pt / 72.0);
        let mut fit = (self.max_raster_pixels as f64 / area_in).sqrt().floor();
        while fit > 1.0 && pixels_at(fit) > self.max_raster_pixels as f64 {
            fit -= 1.0;
        }
        (fit as u32).clamp(1, dpi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let opts = DetectOptions::default();
        assert_eq!(opts.raster_dpis, vec![144, 300]);
        assert_eq!(opts.enhance_dpi, 600);
        assert_eq!(opts.enhancements.len(), 6);
        assert_eq!(opts.enhancements[0], Enhancement::Contrast);
        assert_eq!(opts.enhancements[5], Enhancement::Deskew);
        assert_eq!(opts.min_image_side, 32);
        assert_eq!(opts.max_raster_pixels, 40_000_000);
        assert_eq!(opts.max_form_depth, 10);
        assert!(!opts.text_fallback);
    }

    #[test]
    fn small_page_keeps_requested_dpi() {
        let opts = DetectOptions::default();
        assert_eq!(opts.effective_dpi(600, 612.0, 792.0), 600);
    }

    #[test]
    fn large_page_is_capped() {
        let opts = DetectOptions {
            max_raster_pixels: 1_000_000,
            ..DetectOptions::default()
        };
        let dpi = opts.effective_dpi(600, 612.0, 792.0);
        assert!(dpi < 600);
        let w = (612.0 * f64::from(dpi) / 72.0).ceil();
        let h = (792.0 * f64::from(dpi) / 72.0).ceil();
        assert!(w * h <= 1_000_000.0);
    }

    #[test]
    fn degenerate_page_keeps_dpi() {
        let opts = DetectOptions::default();
        assert_eq!(opts.effective_dpi(300, 0.0, 792.0), 300);
    }
}
