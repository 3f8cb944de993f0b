//! Error and warning types for tixpass.
//!
//! Provides [`PassError`] for fatal errors that stop generation of a ticket,
//! [`PassWarning`] for non-fatal issues that still allow a pass to be
//! produced, and [`PassResult`] for pairing a value with collected warnings.

use std::fmt;

/// Fatal error types for pass generation.
///
/// These errors indicate conditions that prevent a usable artifact from
/// being produced for the current document or ticket.
#[derive(Debug, Clone, PartialEq)]
pub enum PassError {
    /// The source document could not be opened or parsed.
    Document(String),
    /// Barcode detection failed for a reason other than "nothing found".
    Detection(String),
    /// The pass definition violates the schema; carries every violation message.
    Validation(Vec<String>),
    /// The signing identity could not be used to produce a signature.
    Signing(String),
    /// The bundle could not be serialized or compressed.
    Package(String),
    /// I/O error reading inputs or writing outputs.
    Io(String),
    /// Any other error not covered by specific variants.
    Other(String),
}

impl fmt::Display for PassError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PassError::Document(msg) => write!(f, "document error: {msg}"),
            PassError::Detection(msg) => write!(f, "detection error: {msg}"),
            PassError::Validation(issues) => {
                write!(f, "pass validation failed: {}", issues.join("; "))
            }
            PassError::Signing(msg) => write!(f, "signing error: {msg}"),
            PassError::Package(msg) => write!(f, "packaging error: {msg}"),
            PassError::Io(msg) => write!(f, "I/O error: {msg}"),
            PassError::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for PassError {}

impl From<std::io::Error> for PassError {
    fn from(err: std::io::Error) -> Self {
        PassError::Io(err.to_string())
    }
}

/// Machine-readable warning code for categorizing generation issues.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PassWarningCode {
    /// A barcode was found in a symbology the wallet cannot display.
    UnsupportedSymbology,
    /// The pass definition failed validation but generation continued.
    Validation,
    /// No signing identity was available; the pass is unsigned.
    Unsigned,
    /// An icon or thumbnail asset could not be generated.
    Asset,
    /// Any other warning not covered by specific variants.
    Other,
}

impl PassWarningCode {
    /// Returns the string tag for this warning code.
    pub fn as_str(&self) -> &str {
        match self {
            PassWarningCode::UnsupportedSymbology => "UNSUPPORTED_SYMBOLOGY",
            PassWarningCode::Validation => "VALIDATION",
            PassWarningCode::Unsigned => "UNSIGNED",
            PassWarningCode::Asset => "ASSET",
            PassWarningCode::Other => "OTHER",
        }
    }
}

impl fmt::Display for PassWarningCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A non-fatal warning raised while detecting barcodes or building passes.
///
/// The [`description`](PassWarning::description) is the user-facing text;
/// the [`code`](PassWarning::code) lets callers filter without string matching.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PassWarning {
    /// Machine-readable warning code.
    pub code: PassWarningCode,
    /// Human-readable description of the warning.
    pub description: String,
    /// 1-based ticket number the warning applies to, if any.
    pub ticket: Option<usize>,
}

impl PassWarning {
    /// Create a warning with just a description.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            code: PassWarningCode::Other,
            description: description.into(),
            ticket: None,
        }
    }

    /// Create a warning with a specific code and description.
    pub fn with_code(code: PassWarningCode, description: impl Into<String>) -> Self {
        Self {
            code,
            description: description.into(),
            ticket: None,
        }
    }

    /// Attach the ticket number, returning the modified warning (builder pattern).
    pub fn for_ticket(mut self, ticket: usize) -> Self {
        self.ticket = Some(ticket);
        self
    }
}

impl fmt::Display for PassWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.description)?;
        if let Some(ticket) = self.ticket {
            write!(f, " (ticket {ticket})")?;
        }
        Ok(())
    }
}

/// Push `warning` unless an identical description is already present.
pub fn push_unique(warnings: &mut Vec<PassWarning>, warning: PassWarning) {
    if !warnings
        .iter()
        .any(|w| w.description == warning.description)
    {
        warnings.push(warning);
    }
}

/// Result wrapper that pairs a value with collected warnings.
#[derive(Debug, Clone)]
pub struct PassResult<T> {
    /// The produced value.
    pub value: T,
    /// Warnings collected while producing it.
    pub warnings: Vec<PassWarning>,
}

impl<T> PassResult<T> {
    /// Create a result with no warnings.
    pub fn ok(value: T) -> Self {
        Self {
            value,
            warnings: Vec::new(),
        }
    }

    /// Create a result with warnings.
    pub fn with_warnings(value: T, warnings: Vec<PassWarning>) -> Self {
        Self { value, warnings }
    }

    /// Returns true if there are no warnings.
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    /// Transform the value while preserving warnings.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> PassResult<U> {
        PassResult {
            value: f(self.value),
            warnings: self.warnings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pass_error_display() {
        assert_eq!(
            PassError::Document("no trailer".into()).to_string(),
            "document error: no trailer"
        );
        assert_eq!(
            PassError::Package("zip closed".into()).to_string(),
            "packaging error: zip closed"
        );
        assert_eq!(PassError::Other("boom".into()).to_string(), "boom");
    }

    #[test]
    fn validation_error_joins_messages() {
        let err = PassError::Validation(vec!["a missing".into(), "b bad".into()]);
        assert_eq!(err.to_string(), "pass validation failed: a missing; b bad");
    }

    #[test]
    fn pass_error_from_io() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: PassError = io.into();
        assert_eq!(err, PassError::Io("gone".into()));
    }

    #[test]
    fn pass_error_is_std_error() {
        let err: Box<dyn std::error::Error> = Box::new(PassError::Signing("x".into()));
        assert_eq!(err.to_string(), "signing error: x");
    }

    #[test]
    fn warning_code_tags() {
        assert_eq!(
            PassWarningCode::UnsupportedSymbology.as_str(),
            "UNSUPPORTED_SYMBOLOGY"
        );
        assert_eq!(PassWarningCode::Validation.to_string(), "VALIDATION");
        assert_eq!(PassWarningCode::Unsigned.as_str(), "UNSIGNED");
        assert_eq!(PassWarningCode::Asset.as_str(), "ASSET");
        assert_eq!(PassWarningCode::Other.as_str(), "OTHER");
    }

    #[test]
    fn warning_display_with_ticket() {
        let w = PassWarning::with_code(PassWarningCode::Validation, "Validation: bad color")
            .for_ticket(2);
        assert_eq!(w.to_string(), "[VALIDATION] Validation: bad color (ticket 2)");
    }

    #[test]
    fn warning_new_uses_other_code() {
        let w = PassWarning::new("something");
        assert_eq!(w.code, PassWarningCode::Other);
        assert_eq!(w.ticket, None);
        assert_eq!(w.to_string(), "[OTHER] something");
    }

    #[test]
    fn push_unique_skips_duplicate_descriptions() {
        let mut warnings = Vec::new();
        push_unique(&mut warnings, PassWarning::new("same"));
        push_unique(&mut warnings, PassWarning::new("same"));
        push_unique(&mut warnings, PassWarning::new("other"));
        assert_eq!(warnings.len(), 2);
    }

    #[test]
    fn pass_result_helpers() {
        let r = PassResult::ok(3);
        assert!(r.is_clean());
        let r = PassResult::with_warnings(3, vec![PassWarning::new("w")]).map(|v| v * 2);
        assert_eq!(r.value, 6);
        assert!(!r.is_clean());
    }
}
