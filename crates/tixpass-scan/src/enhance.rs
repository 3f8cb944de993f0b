//! Image enhancements tried before re-decoding a hard page.
//!
//! Every transform takes and returns an 8-bit grayscale image of the same
//! size. Dark pixels are barcode modules, white is background.

use image::{GrayImage, Luma, imageops};
use tixpass_core::Enhancement;
use tracing::trace;

/// Apply one enhancement.
pub fn apply(enhancement: Enhancement, image: &GrayImage) -> GrayImage {
    if image.width() == 0 || image.height() == 0 {
        return image.clone();
    }
    match enhancement {
        Enhancement::Contrast => contrast(image, 1.5),
        Enhancement::Sharpen => sharpen(image),
        Enhancement::AdaptiveThreshold => adaptive_threshold(image, 11, 2.0),
        Enhancement::MorphClose => morph_close(image),
        Enhancement::Blur => imageops::blur(image, 0.8),
        Enhancement::Deskew => deskew(image),
    }
}

/// Scale every sample by `alpha`, saturating at white.
pub fn contrast(image: &GrayImage, alpha: f32) -> GrayImage {
    let mut out = image.clone();
    for p in out.pixels_mut() {
        p.0[0] = (f32::from(p.0[0]) * alpha).round().clamp(0.0, 255.0) as u8;
    }
    out
}

/// 3x3 sharpen: center 9, ring -1.
pub fn sharpen(image: &GrayImage) -> GrayImage {
    convolve3x3(image, &[-1.0, -1.0, -1.0, -1.0, 9.0, -1.0, -1.0, -1.0, -1.0])
}

/// 3x3 convolution with replicated borders.
///
/// `imageops::filter3x3` leaves the outermost ring black, which reads as a
/// frame of dark modules, so edges are clamped here instead.
fn convolve3x3(image: &GrayImage, kernel: &[f32; 9]) -> GrayImage {
    let (w, h) = image.dimensions();
    let mut out = GrayImage::new(w, h);
    for y in 0..h {
        for x in 0..w {
            let mut acc = 0.0f32;
            for (i, k) in kernel.iter().enumerate() {
                let dx = (i % 3) as i64 - 1;
                let dy = (i / 3) as i64 - 1;
                let sx = (i64::from(x) + dx).clamp(0, i64::from(w) - 1) as u32;
                let sy = (i64::from(y) + dy).clamp(0, i64::from(h) - 1) as u32;
                acc += f32::from(image.get_pixel(sx, sy).0[0]) * k;
            }
            out.put_pixel(x, y, Luma([acc.round().clamp(0.0, 255.0) as u8]));
        }
    }
    out
}

/// Binarize against a Gaussian-weighted local mean.
///
/// A pixel turns white when it is brighter than the mean of its `block`
/// neighbourhood minus `c`, and black otherwise.
pub fn adaptive_threshold(image: &GrayImage, block: u32, c: f32) -> GrayImage {
    // Sigma for a Gaussian window of `block` pixels.
    let sigma = 0.3 * ((block as f32 - 1.0) * 0.5 - 1.0) + 0.8;
    let mean = imageops::blur(image, sigma);
    let mut out = GrayImage::new(image.width(), image.height());
    for ((dst, src), m) in out.pixels_mut().zip(image.pixels()).zip(mean.pixels()) {
        let threshold = f32::from(m.0[0]) - c;
        dst.0[0] = if f32::from(src.0[0]) > threshold { 255 } else { 0 };
    }
    out
}

/// Morphological close with a 3x3 square: dilate, then erode.
pub fn morph_close(image: &GrayImage) -> GrayImage {
    let dilated = rank3x3(image, u8::max);
    rank3x3(&dilated, u8::min)
}

/// Replace each pixel with `pick` folded over its 3x3 neighbourhood.
fn rank3x3(image: &GrayImage, pick: fn(u8, u8) -> u8) -> GrayImage {
    let (w, h) = image.dimensions();
    let mut out = GrayImage::new(w, h);
    for y in 0..h {
        for x in 0..w {
            let mut v = image.get_pixel(x, y).0[0];
            for sy in y.saturating_sub(1)..=(y + 1).min(h - 1) {
                for sx in x.saturating_sub(1)..=(x + 1).min(w - 1) {
                    v = pick(v, image.get_pixel(sx, sy).0[0]);
                }
            }
            out.put_pixel(x, y, Luma([v]));
        }
    }
    out
}

const INK: u8 = 128;
const MAX_SKEW_DEG: f32 = 10.0;
const SKEW_STEP_DEG: f32 = 0.5;

/// Rotate the image so its dominant rows are horizontal.
///
/// Returns an unchanged copy when the estimated skew is below one step.
pub fn deskew(image: &GrayImage) -> GrayImage {
    let angle = estimate_skew(image);
    if angle.abs() < SKEW_STEP_DEG {
        return image.clone();
    }
    trace!(angle, "deskewing");
    rotate(image, angle)
}

/// Estimate skew in degrees within ±10°, positive when content slopes
/// down to the right.
///
/// For each candidate angle, dark pixels are projected onto the axis
/// perpendicular to that slope. The angle whose projection has the sharpest
/// bin-to-bin transitions wins.
pub fn estimate_skew(image: &GrayImage) -> f32 {
    let (w, h) = image.dimensions();
    let step = (w.max(h) / 800).max(1);
    let mut ink: Vec<(f32, f32)> = Vec::new();
    for y in (0..h).step_by(step as usize) {
        for x in (0..w).step_by(step as usize) {
            if image.get_pixel(x, y).0[0] < INK {
                ink.push((x as f32, y as f32));
            }
        }
    }
    if ink.is_empty() {
        return 0.0;
    }

    let bins = (w as f32 * MAX_SKEW_DEG.to_radians().tan() + h as f32).ceil() as usize + 2;
    let offset = w as f32 * MAX_SKEW_DEG.to_radians().tan();
    let steps = (MAX_SKEW_DEG / SKEW_STEP_DEG) as i32;

    let mut best = (0.0f32, f64::NEG_INFINITY);
    let mut histogram = vec![0u32; bins];
    for i in -steps..=steps {
        let angle = i as f32 * SKEW_STEP_DEG;
        let tan = angle.to_radians().tan();
        histogram.iter_mut().for_each(|b| *b = 0);
        for &(x, y) in &ink {
            let bin = (y - x * tan + offset).round();
            if bin >= 0.0 && (bin as usize) < bins {
                histogram[bin as usize] += 1;
            }
        }
        let score: f64 = histogram
            .windows(2)
            .map(|pair| {
                let d = f64::from(pair[1]) - f64::from(pair[0]);
                d * d
            })
            .sum();
        // Ties go to the smaller rotation.
        if score > best.1 || (score == best.1 && angle.abs() < best.0.abs()) {
            best = (angle, score);
        }
    }
    best.0
}

/// Rotate about the image center by `angle_deg`, sampling nearest
/// neighbours and filling uncovered pixels with white.
///
/// Content that slopes down to the right by `angle_deg` comes out level.
pub fn rotate(image: &GrayImage, angle_deg: f32) -> GrayImage {
    let (w, h) = image.dimensions();
    let (sin, cos) = angle_deg.to_radians().sin_cos();
    let (cx, cy) = (w as f32 / 2.0, h as f32 / 2.0);
    let mut out = GrayImage::from_pixel(w, h, Luma([255]));
    for yo in 0..h {
        for xo in 0..w {
            let dx = xo as f32 + 0.5 - cx;
            let dy = yo as f32 + 0.5 - cy;
            let xs = (cx + dx * cos - dy * sin).floor();
            let ys = (cy + dx * sin + dy * cos).floor();
            if xs >= 0.0 && ys >= 0.0 && (xs as u32) < w && (ys as u32) < h {
                out.put_pixel(xo, yo, *image.get_pixel(xs as u32, ys as u32));
            }
        }
    }
    out
}
