//! Multi-source barcode detection.
//!
//! A document is scanned by an ordered list of [`DetectionStrategy`] objects.
//! The first strategy that yields any candidate ends the search; later, more
//! expensive strategies never run.

use tixpass_core::{BarcodeCandidate, ContextHints, DetectOptions, DetectionMethod, Enhancement, PassError, scan_text};
use tixpass_scan::{BarcodeDecoder, detect_in_image, enhance};
use tracing::{debug, info, warn};

use crate::document::TicketDocument;

/// One way of finding barcodes in a document.
pub trait DetectionStrategy: Send + Sync {
    /// Short name used in logs and reports.
    fn name(&self) -> &'static str;

    /// Scan the whole document.
    ///
    /// Finding nothing is `Ok(vec![])`. Errors are reserved for failures
    /// that make the strategy unable to run at all.
    fn detect(
        &self,
        doc: &TicketDocument,
        decoder: &dyn BarcodeDecoder,
        hints: &ContextHints,
    ) -> Result<Vec<BarcodeCandidate>, PassError>;
}

/// Decode every sufficiently large image placed on each page.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedImages;

impl DetectionStrategy for EmbeddedImages {
    fn name(&self) -> &'static str {
        "embedded_images"
    }

    fn detect(
        &self,
        doc: &TicketDocument,
        decoder: &dyn BarcodeDecoder,
        _hints: &ContextHints,
    ) -> Result<Vec<BarcodeCandidate>, PassError> {
        let mut found = Vec::new();
        for page in doc.pages() {
            let page = page?;
            let images = match doc.images(&page) {
                Ok(images) => images,
                Err(err) => {
                    debug!(page = page.number(), error = %err, "skipping page images");
                    continue;
                }
            };
            for image in images {
                if let Some(candidate) = detect_in_image(
                    decoder,
                    &image.image,
                    page.number(),
                    DetectionMethod::EmbeddedImage,
                    image.dpi,
                ) {
                    debug!(page = page.number(), xobject = %image.name, "decoded embedded image");
                    found.push(candidate);
                }
            }
        }
        Ok(found)
    }
}

/// Render every page at increasing resolutions.
///
/// The ladder stops at the first resolution where any page decodes.
#[derive(Debug, Clone)]
pub struct RasterLadder {
    pub dpis: Vec<u32>,
}

impl DetectionStrategy for RasterLadder {
    fn name(&self) -> &'static str {
        "raster"
    }

    fn detect(
        &self,
        doc: &TicketDocument,
        decoder: &dyn BarcodeDecoder,
        _hints: &ContextHints,
    ) -> Result<Vec<BarcodeCandidate>, PassError> {
        for &dpi in &self.dpis {
            let mut found = Vec::new();
            for page in doc.pages() {
                let page = page?;
                let rendered = match doc.render(&page, dpi) {
                    Ok(rendered) => rendered,
                    Err(err) => {
                        debug!(page = page.number(), dpi, error = %err, "render failed");
                        continue;
                    }
                };
                let method = DetectionMethod::Raster { dpi: rendered.dpi };
                found.extend(detect_in_image(decoder, &rendered.image, page.number(), method, rendered.dpi));
            }
            if !found.is_empty() {
                return Ok(found);
            }
            debug!(dpi, "nothing decoded");
        }
        Ok(Vec::new())
    }
}

/// Render each page once at high resolution and retry the decoder on
/// enhanced copies of it.
///
/// Each enhancement is applied to the plain render, never chained. A page
/// stops at the first enhancement that decodes.
#[derive(Debug, Clone)]
pub struct Enhanced {
    pub dpi: u32,
    pub enhancements: Vec<Enhancement>,
}

impl DetectionStrategy for Enhanced {
    fn name(&self) -> &'static str {
        "enhanced"
    }

    fn detect(
        &self,
        doc: &TicketDocument,
        decoder: &dyn BarcodeDecoder,
        _hints: &ContextHints,
    ) -> Result<Vec<BarcodeCandidate>, PassError> {
        if self.enhancements.is_empty() {
            return Ok(Vec::new());
        }
        let mut found = Vec::new();
        for page in doc.pages() {
            let page = page?;
            let rendered = match doc.render(&page, self.dpi) {
                Ok(rendered) => rendered,
                Err(err) => {
                    debug!(page = page.number(), dpi = self.dpi, error = %err, "render failed");
                    continue;
                }
            };
            for &enhancement in &self.enhancements {
                let image = enhance::apply(enhancement, &rendered.image);
                let method = DetectionMethod::Enhanced {
                    dpi: rendered.dpi,
                    enhancement,
                };
                if let Some(candidate) = detect_in_image(decoder, &image, page.number(), method, rendered.dpi) {
                    debug!(page = page.number(), enhancement = enhancement.as_str(), "decoded");
                    found.push(candidate);
                    break;
                }
            }
        }
        Ok(found)
    }
}

/// Match barcode-like strings in the extracted page text.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextPatterns;

impl DetectionStrategy for TextPatterns {
    fn name(&self) -> &'static str {
        "text_patterns"
    }

    fn detect(
        &self,
        doc: &TicketDocument,
        _decoder: &dyn BarcodeDecoder,
        hints: &ContextHints,
    ) -> Result<Vec<BarcodeCandidate>, PassError> {
        let texts = doc.page_texts();
        let pages: Vec<(usize, &str)> = texts.iter().map(|(n, t)| (*n, t.as_str())).collect();
        Ok(scan_text(&pages, hints))
    }
}

/// Candidates found by the orchestrator and the strategy that found them.
#[derive(Debug, Clone, Default)]
pub struct DetectionOutcome {
    pub candidates: Vec<BarcodeCandidate>,
    /// `None` when every strategy came back empty.
    pub strategy: Option<&'static str>,
}

/// Runs detection strategies in order until one succeeds.
pub struct Orchestrator {
    strategies: Vec<Box<dyn DetectionStrategy>>,
}

impl Orchestrator {
    /// The standard ladder: embedded images, rendered pages, enhanced
    /// renders, and text patterns when `text_fallback` is set.
    pub fn from_options(options: &DetectOptions) -> Self {
        let mut strategies: Vec<Box<dyn DetectionStrategy>> = vec![
            Box::new(EmbeddedImages),
            Box::new(RasterLadder {
                dpis: options.raster_dpis.clone(),
            }),
            Box::new(Enhanced {
                dpi: options.enhance_dpi,
                enhancements: options.enhancements.clone(),
            }),
        ];
        if options.text_fallback {
            strategies.push(Box::new(TextPatterns));
        }
        Self { strategies }
    }

    pub fn with_strategies(strategies: Vec<Box<dyn DetectionStrategy>>) -> Self {
        Self { strategies }
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Run the strategies in order, stopping at the first non-empty result.
    ///
    /// A strategy that fails is logged and skipped.
    pub fn run(
        &self,
        doc: &TicketDocument,
        decoder: &dyn BarcodeDecoder,
        hints: &ContextHints,
    ) -> DetectionOutcome {
        for strategy in &self.strategies {
            match strategy.detect(doc, decoder, hints) {
                Ok(candidates) if !candidates.is_empty() => {
                    info!(strategy = strategy.name(), found = candidates.len(), "barcodes detected");
                    return DetectionOutcome {
                        candidates,
                        strategy: Some(strategy.name()),
                    };
                }
                Ok(_) => debug!(strategy = strategy.name(), "no barcodes"),
                Err(err) => warn!(strategy = strategy.name(), error = %err, "strategy failed"),
            }
        }
        info!("no barcodes detected");
        DetectionOutcome::default()
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("strategies", &self.strategy_names())
            .finish()
    }
}
