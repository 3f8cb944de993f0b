//! Context hints drawn from the document's filename.
//!
//! These are plain substring checks over the lowercased filename. Document
//! text is never consulted.

/// Words suggesting the document is a ticket, where Aztec is the expected code.
const TICKET_KEYWORDS: &[&str] = &[
    "aztec", "ticket", "billet", "boarding", "pass", "train", "rail", "sncf", "flight",
];

/// Words suggesting the document holds a single pass, so several Data Matrix
/// hits are fragments of one code rather than separate tickets.
const SINGLE_TICKET_KEYWORDS: &[&str] = &["data_matrix", "datamatrix", "pass", "ticket", "boarding"];

/// Filename of the document being processed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextHints {
    filename: String,
}

impl ContextHints {
    pub fn from_filename(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into().to_lowercase(),
        }
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Whether the filename suggests a ticket or pass document.
    pub fn suggests_ticket(&self) -> bool {
        self.filename_contains_any(TICKET_KEYWORDS)
    }

    /// Whether the filename suggests one pass split into several detections.
    pub fn suggests_single_ticket(&self) -> bool {
        self.filename_contains_any(SINGLE_TICKET_KEYWORDS)
    }

    fn filename_contains_any(&self, words: &[&str]) -> bool {
        words.iter().any(|w| self.filename.contains(w))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticket_hint_from_filename() {
        assert!(ContextHints::from_filename("ticket_aztec_123.pdf").suggests_ticket());
        assert!(ContextHints::from_filename("Billet_Train.PDF").suggests_ticket());
        assert!(!ContextHints::from_filename("document.pdf").suggests_ticket());
    }

    #[test]
    fn ticket_hint_needs_keyword_in_filename() {
        // "passenger" in the body of a generic document is not a hint.
        assert!(!ContextHints::from_filename("document.pdf").suggests_ticket());
        assert!(!ContextHints::from_filename("invoice-2026.pdf").suggests_ticket());
        assert!(ContextHints::from_filename("SNCF_e-billet.pdf").suggests_ticket());
    }

    #[test]
    fn single_ticket_hint_from_filename() {
        assert!(ContextHints::from_filename("pass_with_data_matrix.pdf").suggests_single_ticket());
        assert!(ContextHints::from_filename("DataMatrix.pdf").suggests_single_ticket());
        assert!(!ContextHints::from_filename("invoice.pdf").suggests_single_ticket());
    }

    #[test]
    fn filename_is_lowercased() {
        assert_eq!(ContextHints::from_filename("A.PDF").filename(), "a.pdf");
    }
}
