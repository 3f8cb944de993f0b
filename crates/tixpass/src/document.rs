//! Ticket documents opened for barcode detection.

use tixpass_core::{DetectOptions, PassError};
use tixpass_scan::{
    EmbeddedImage, LopdfBackend, LopdfDocument, LopdfPage, PdfBackend, RenderedPage, page_images,
    render_page,
};

/// Iterator over the pages of a [`TicketDocument`].
///
/// Created by [`TicketDocument::pages()`]. Each item is the page handle or
/// the error that prevented resolving it.
pub struct Pages<'a> {
    doc: &'a TicketDocument,
    current: usize,
    count: usize,
}

impl Iterator for Pages<'_> {
    type Item = Result<LopdfPage, PassError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current >= self.count {
            return None;
        }
        let result = self.doc.page(self.current);
        self.current += 1;
        Some(result)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.count - self.current;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Pages<'_> {}

/// A PDF ticket opened for scanning.
///
/// Wraps the parsed document together with the [`DetectOptions`] that bound
/// rendering and image extraction.
///
/// # Example
///
/// ```ignore
/// let doc = TicketDocument::open(&bytes, DetectOptions::default())?;
/// let first = doc.page(0)?;
/// let rendered = doc.render(&first, 144)?;
/// ```
pub struct TicketDocument {
    doc: LopdfDocument,
    options: DetectOptions,
}

impl TicketDocument {
    /// Open a document from bytes.
    ///
    /// # Errors
    ///
    /// Returns [`PassError::Document`] if the bytes are not a readable,
    /// unencrypted PDF or contain no pages.
    pub fn open(bytes: &[u8], options: DetectOptions) -> Result<Self, PassError> {
        let doc = LopdfBackend::open(bytes)?;
        if LopdfBackend::page_count(&doc) == 0 {
            return Err(PassError::Document("document has no pages".to_string()));
        }
        Ok(Self { doc, options })
    }

    /// Read and open a document from disk.
    pub fn open_file(path: impl AsRef<std::path::Path>, options: DetectOptions) -> Result<Self, PassError> {
        let bytes = std::fs::read(path.as_ref())?;
        Self::open(&bytes, options)
    }

    pub fn options(&self) -> &DetectOptions {
        &self.options
    }

    pub fn page_count(&self) -> usize {
        LopdfBackend::page_count(&self.doc)
    }

    /// Page by 0-based index.
    pub fn page(&self, index: usize) -> Result<LopdfPage, PassError> {
        Ok(LopdfBackend::get_page(&self.doc, index)?)
    }

    pub fn pages(&self) -> Pages<'_> {
        Pages {
            doc: self,
            current: 0,
            count: self.page_count(),
        }
    }

    /// Extracted text of every page, paired with its 1-based number.
    ///
    /// Pages whose text cannot be extracted contribute an empty string.
    pub fn page_texts(&self) -> Vec<(usize, String)> {
        self.pages()
            .enumerate()
            .map(|(index, page)| {
                let text = page
                    .and_then(|page| Ok(LopdfBackend::page_text(&self.doc, &page)?))
                    .unwrap_or_else(|err| {
                        tracing::debug!(page = index + 1, error = %err, "text extraction failed");
                        String::new()
                    });
                (index + 1, text)
            })
            .collect()
    }

    /// Render a page to grayscale at `dpi`, capped by the pixel budget.
    pub fn render(&self, page: &LopdfPage, dpi: u32) -> Result<RenderedPage, PassError> {
        Ok(render_page(&self.doc, page, dpi, &self.options)?)
    }

    /// Raster images painted on a page, decoded to grayscale.
    pub fn images(&self, page: &LopdfPage) -> Result<Vec<EmbeddedImage>, PassError> {
        Ok(page_images(&self.doc, page, &self.options)?)
    }
}

impl std::fmt::Debug for TicketDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TicketDocument")
            .field("pages", &self.page_count())
            .finish_non_exhaustive()
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;

    #[test]
    fn counts_and_iterates_pages() {
        let bytes = test_pdf::pages(&[b"", b""]);
        let doc = TicketDocument::open(&bytes, DetectOptions::default()).unwrap();
        assert_eq!(doc.page_count(), 2);
        let pages: Vec<_> = doc.pages().collect::<Result<_, _>>().unwrap();
        assert_eq!(pages[1].number(), 2);
        assert_eq!(doc.pages().len(), 2);
    }

    #[test]
    fn texts_are_numbered_from_one() {
        let bytes = test_pdf::with_resources(
            &[b"BT /F1 12 Tf 10 50 Td (PNR XK42LM) Tj ET"],
            |doc| {
                let font = doc.add_object(dictionary! {
                    "Type" => "Font",
                    "Subtype" => "Type1",
                    "BaseFont" => "Helvetica",
                });
                dictionary! { "Font" => dictionary! { "F1" => font } }
            },
        );
        let doc = TicketDocument::open(&bytes, DetectOptions::default()).unwrap();
        let texts = doc.page_texts();
        assert_eq!(texts.len(), 1);
        assert_eq!(texts[0].0, 1);
        assert!(texts[0].1.contains("XK42LM"), "{:?}", texts[0].1);
    }

    #[test]
    fn render_uses_requested_dpi() {
        let bytes = test_pdf::pages(&[b"0 0 10 10 re f"]);
        let doc = TicketDocument::open(&bytes, DetectOptions::default()).unwrap();
        let page = doc.page(0).unwrap();
        let rendered = doc.render(&page, 144).unwrap();
        assert_eq!(rendered.image.dimensions(), (400, 200));
    }

    #[test]
    fn garbage_is_a_document_error() {
        let err = TicketDocument::open(b"%PDF-nope", DetectOptions::default()).unwrap_err();
        assert!(matches!(err, PassError::Document(_)));
    }
}
