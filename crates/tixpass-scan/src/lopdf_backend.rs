//! lopdf-based PDF parsing backend.
//!
//! Implements [`PdfBackend`] using the [lopdf](https://crates.io/crates/lopdf)
//! crate for PDF document parsing.

use tiny_skia::Transform;
use tracing::debug;

use crate::backend::{PageBox, PdfBackend};
use crate::error::ScanError;
use crate::handler::ContentHandler;
use crate::interpreter::{decode_stream, interpret_content_stream};
use crate::interpreter_state::InterpreterState;
use crate::tokenizer::{Operand, tokenize};

/// A parsed PDF document backed by lopdf.
pub struct LopdfDocument {
    /// The underlying lopdf document.
    inner: lopdf::Document,
    /// Cached ordered list of page ObjectIds (indexed by 0-based page number).
    page_ids: Vec<lopdf::ObjectId>,
}

impl LopdfDocument {
    /// Access the underlying lopdf document.
    pub fn inner(&self) -> &lopdf::Document {
        &self.inner
    }
}

impl std::fmt::Debug for LopdfDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LopdfDocument")
            .field("page_count", &self.page_ids.len())
            .finish_non_exhaustive()
    }
}

/// A reference to a single page within a [`LopdfDocument`].
#[derive(Debug, Clone, Copy)]
pub struct LopdfPage {
    /// The lopdf object ID for this page.
    pub object_id: lopdf::ObjectId,
    /// The 0-based page index.
    pub index: usize,
}

impl LopdfPage {
    /// 1-based page number, as reported on candidates.
    pub fn number(&self) -> usize {
        self.index + 1
    }
}

/// The lopdf-based PDF backend.
///
/// # Example
///
/// ```ignore
/// use tixpass_scan::{LopdfBackend, PdfBackend};
///
/// let doc = LopdfBackend::open(pdf_bytes)?;
/// let count = LopdfBackend::page_count(&doc);
/// let page = LopdfBackend::get_page(&doc, 0)?;
/// ```
pub struct LopdfBackend;

/// Extract a [`PageBox`] from a lopdf array of 4 numbers `[x0, y0, x1, y1]`.
fn extract_box_from_array(array: &[lopdf::Object]) -> Result<PageBox, ScanError> {
    if array.len() != 4 {
        return Err(ScanError::Parse(format!(
            "expected 4-element array for box, got {}",
            array.len()
        )));
    }
    let x0 = object_to_f64(&array[0])?;
    let y0 = object_to_f64(&array[1])?;
    let x1 = object_to_f64(&array[2])?;
    let y1 = object_to_f64(&array[3])?;
    Ok(PageBox::new(x0, y0, x1, y1))
}

/// Convert a lopdf numeric object (Integer or Real) to f64.
pub(crate) fn object_to_f64(obj: &lopdf::Object) -> Result<f64, ScanError> {
    match obj {
        lopdf::Object::Integer(i) => Ok(*i as f64),
        lopdf::Object::Real(f) => Ok(f64::from(*f)),
        _ => Err(ScanError::Parse(format!("expected number, got {obj:?}"))),
    }
}

/// Look up a key in the page dictionary, walking up the page tree
/// (via /Parent) if the key is not found on the page itself.
///
/// Returns `None` if the key is not found anywhere in the tree.
fn resolve_inherited<'a>(
    doc: &'a lopdf::Document,
    page_id: lopdf::ObjectId,
    key: &[u8],
) -> Result<Option<&'a lopdf::Object>, ScanError> {
    let mut current_id = page_id;
    // Bounded walk: malformed trees can contain /Parent cycles.
    for _ in 0..64 {
        let dict = doc
            .get_object(current_id)
            .and_then(|o| o.as_dict())
            .map_err(|e| ScanError::Parse(format!("failed to get page dictionary: {e}")))?;

        if let Ok(value) = dict.get(key) {
            let (_, value) = doc
                .dereference(value)
                .map_err(|e| ScanError::Parse(format!("failed to resolve /{}: {e}", String::from_utf8_lossy(key))))?;
            return Ok(Some(value));
        }

        match dict.get(b"Parent") {
            Ok(parent_obj) => {
                current_id = parent_obj
                    .as_reference()
                    .map_err(|e| ScanError::Parse(format!("invalid /Parent reference: {e}")))?;
            }
            Err(_) => return Ok(None),
        }
    }
    Err(ScanError::Parse("page tree /Parent chain too deep".to_string()))
}

impl PdfBackend for LopdfBackend {
    type Document = LopdfDocument;
    type Page = LopdfPage;
    type Error = ScanError;

    fn open(bytes: &[u8]) -> Result<Self::Document, Self::Error> {
        let inner = lopdf::Document::load_mem(bytes)
            .map_err(|e| ScanError::Parse(format!("failed to parse PDF: {e}")))?;

        if inner.is_encrypted() {
            return Err(ScanError::Parse(
                "document is encrypted and cannot be read".to_string(),
            ));
        }

        // get_pages returns BTreeMap<u32, ObjectId> with 1-based keys
        let page_ids: Vec<lopdf::ObjectId> = inner.get_pages().values().copied().collect();
        debug!(pages = page_ids.len(), "opened PDF");

        Ok(LopdfDocument { inner, page_ids })
    }

    fn page_count(doc: &Self::Document) -> usize {
        doc.page_ids.len()
    }

    fn get_page(doc: &Self::Document, index: usize) -> Result<Self::Page, Self::Error> {
        let object_id = doc.page_ids.get(index).copied().ok_or_else(|| {
            ScanError::Parse(format!(
                "page index {index} out of range (0..{})",
                doc.page_ids.len()
            ))
        })?;
        Ok(LopdfPage { object_id, index })
    }

    fn page_media_box(doc: &Self::Document, page: &Self::Page) -> Result<PageBox, Self::Error> {
        let obj = resolve_inherited(&doc.inner, page.object_id, b"MediaBox")?
            .ok_or_else(|| ScanError::Parse("MediaBox not found on page or ancestors".into()))?;
        let array = obj
            .as_array()
            .map_err(|e| ScanError::Parse(format!("MediaBox is not an array: {e}")))?;
        extract_box_from_array(array)
    }

    fn page_text(doc: &Self::Document, page: &Self::Page) -> Result<String, Self::Error> {
        let number = u32::try_from(page.number())
            .map_err(|_| ScanError::Parse(format!("page number {} too large", page.number())))?;
        match doc.inner.extract_text(&[number]) {
            Ok(text) if !text.trim().is_empty() => return Ok(text),
            Ok(_) => {}
            Err(e) => debug!(page = number, error = %e, "font-aware text extraction failed"),
        }
        // lopdf finds no fonts when /Resources is inherited inline from /Pages.
        let page_dict = doc
            .inner
            .get_object(page.object_id)
            .and_then(|o| o.as_dict())
            .map_err(|e| ScanError::Parse(format!("failed to get page dictionary: {e}")))?;
        let content = get_page_content_bytes(&doc.inner, page_dict)?;
        shown_text(&content)
    }

    fn interpret_page(
        doc: &Self::Document,
        page: &Self::Page,
        handler: &mut dyn ContentHandler,
        base: Transform,
        max_form_depth: usize,
    ) -> Result<(), Self::Error> {
        let inner = &doc.inner;
        let page_dict = inner
            .get_object(page.object_id)
            .and_then(|o| o.as_dict())
            .map_err(|e| ScanError::Parse(format!("failed to get page dictionary: {e}")))?;

        let content = get_page_content_bytes(inner, page_dict)?;
        let resources = get_page_resources(inner, page.object_id)?;

        let mut state = InterpreterState::with_base(base);
        interpret_content_stream(
            inner,
            &content,
            resources,
            handler,
            max_form_depth,
            0,
            &mut state,
        )
    }
}

/// Get the content stream bytes from a page dictionary.
///
/// Handles both single stream references and arrays of stream references.
fn get_page_content_bytes(
    doc: &lopdf::Document,
    page_dict: &lopdf::Dictionary,
) -> Result<Vec<u8>, ScanError> {
    let contents_obj = match page_dict.get(b"Contents") {
        Ok(obj) => obj,
        Err(_) => return Ok(Vec::new()), // Page with no content
    };
    let (_, contents_obj) = doc
        .dereference(contents_obj)
        .map_err(|e| ScanError::Parse(format!("failed to resolve /Contents: {e}")))?;

    match contents_obj {
        lopdf::Object::Stream(stream) => decode_stream(stream),
        lopdf::Object::Array(arr) => {
            let mut content = Vec::new();
            for item in arr {
                let (_, obj) = doc.dereference(item).map_err(|e| {
                    ScanError::Parse(format!("failed to resolve /Contents stream: {e}"))
                })?;
                let stream = obj.as_stream().map_err(|e| {
                    ScanError::Parse(format!("/Contents array item is not a stream: {e}"))
                })?;
                let bytes = decode_stream(stream)?;
                if !content.is_empty() {
                    content.push(b' ');
                }
                content.extend_from_slice(&bytes);
            }
            Ok(content)
        }
        _ => Err(ScanError::Parse(
            "/Contents is not a stream or array".to_string(),
        )),
    }
}

/// Strings shown by text operators, decoded as single-byte text.
///
/// Used when font-aware extraction yields nothing. Each text object ends a
/// line, as do `T*`, `'`, `"` and vertical `Td`/`TD` moves.
fn shown_text(content: &[u8]) -> Result<String, ScanError> {
    fn push_bytes(out: &mut String, bytes: &[u8]) {
        out.extend(bytes.iter().map(|&b| char::from(b)).filter(|c| !c.is_control()));
    }
    fn new_line(out: &mut String) {
        if !out.is_empty() && !out.ends_with('\n') {
            out.push('\n');
        }
    }

    let mut out = String::new();
    for op in tokenize(content)? {
        match op.name.as_str() {
            "Tj" => {
                if let Some(Operand::String(bytes)) = op.operands.last() {
                    push_bytes(&mut out, bytes);
                }
            }
            "'" | "\"" => {
                new_line(&mut out);
                if let Some(Operand::String(bytes)) = op.operands.last() {
                    push_bytes(&mut out, bytes);
                }
            }
            "TJ" => {
                if let Some(Operand::Array(items)) = op.operands.last() {
                    for item in items {
                        match item {
                            Operand::String(bytes) => push_bytes(&mut out, bytes),
                            // Wide negative kerning stands in for a space.
                            other if other.as_f64().is_some_and(|k| k < -200.0) => out.push(' '),
                            _ => {}
                        }
                    }
                }
            }
            "Td" | "TD" if op.f64_at(1).is_some_and(|ty| ty != 0.0) => new_line(&mut out),
            "T*" | "ET" => new_line(&mut out),
            _ => {}
        }
    }
    Ok(out)
}

/// Get the resources dictionary for a page, handling inheritance.
fn get_page_resources(
    doc: &lopdf::Document,
    page_id: lopdf::ObjectId,
) -> Result<&lopdf::Dictionary, ScanError> {
    match resolve_inherited(doc, page_id, b"Resources")? {
        Some(obj) => obj
            .as_dict()
            .map_err(|_| ScanError::Parse("/Resources is not a dictionary".to_string())),
        None => {
            static EMPTY_DICT: std::sync::LazyLock<lopdf::Dictionary> =
                std::sync::LazyLock::new(lopdf::Dictionary::new);
            Ok(&EMPTY_DICT)
        }
    }
}
