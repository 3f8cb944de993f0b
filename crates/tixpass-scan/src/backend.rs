//! PDF document backend trait.
//!
//! Defines the [`PdfBackend`] trait that abstracts the document operations
//! the scanner needs: opening, page access, page geometry, page text, and
//! content stream interpretation.

use tiny_skia::Transform;
use tixpass_core::PassError;

use crate::handler::ContentHandler;

/// A page rectangle in PDF user space (origin bottom-left, y up).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageBox {
    pub llx: f64,
    pub lly: f64,
    pub urx: f64,
    pub ury: f64,
}

impl PageBox {
    /// Build from two corners in any order.
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self {
            llx: x0.min(x1),
            lly: y0.min(y1),
            urx: x0.max(x1),
            ury: y0.max(y1),
        }
    }

    pub fn width(&self) -> f64 {
        self.urx - self.llx
    }

    pub fn height(&self) -> f64 {
        self.ury - self.lly
    }
}

/// Trait abstracting PDF parsing operations.
///
/// # Associated Types
///
/// - `Document`: The parsed PDF document representation.
/// - `Page`: A reference to a single page within a document.
/// - `Error`: Backend-specific error type, convertible to [`PassError`].
///
/// # Usage
///
/// ```ignore
/// let doc = MyBackend::open(pdf_bytes)?;
/// let page = MyBackend::get_page(&doc, 0)?;
/// let media_box = MyBackend::page_media_box(&doc, &page)?;
/// MyBackend::interpret_page(&doc, &page, &mut handler, base, 10)?;
/// ```
pub trait PdfBackend {
    /// The parsed PDF document type.
    type Document;

    /// A reference to a single page within a document.
    type Page;

    /// Backend-specific error type, convertible to [`PassError`].
    type Error: std::error::Error + Into<PassError>;

    /// Parse PDF bytes into a document.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not a readable, unencrypted PDF.
    fn open(bytes: &[u8]) -> Result<Self::Document, Self::Error>;

    /// Return the number of pages in the document.
    fn page_count(doc: &Self::Document) -> usize;

    /// Access a page by 0-based index.
    ///
    /// # Errors
    ///
    /// Returns an error if the index is out of range.
    fn get_page(doc: &Self::Document, index: usize) -> Result<Self::Page, Self::Error>;

    /// Get the MediaBox for a page, inherited through the page tree.
    ///
    /// # Errors
    ///
    /// Returns an error if no MediaBox is found or it is malformed.
    fn page_media_box(doc: &Self::Document, page: &Self::Page) -> Result<PageBox, Self::Error>;

    /// Extract the page's raw text, in content order.
    ///
    /// # Errors
    ///
    /// Returns an error if the page text cannot be decoded.
    fn page_text(doc: &Self::Document, page: &Self::Page) -> Result<String, Self::Error>;

    /// Interpret the page's content stream, calling back into the handler.
    ///
    /// `base` maps PDF user space to the handler's device space.
    /// `max_form_depth` bounds Form XObject nesting.
    ///
    /// # Errors
    ///
    /// Returns an error if the content stream cannot be read or tokenized.
    fn interpret_page(
        doc: &Self::Document,
        page: &Self::Page,
        handler: &mut dyn ContentHandler,
        base: Transform,
        max_form_depth: usize,
    ) -> Result<(), Self::Error>;
}
