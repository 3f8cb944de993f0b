//! tixpass-core: Backend-independent data types and algorithms.
//!
//! This crate provides the foundational types (Symbology, BarcodeCandidate,
//! PassDefinition, etc.) and algorithms (group precedence, consolidation,
//! pass building, validation) used by tixpass. It performs no I/O and has no
//! image, PDF, or crypto dependencies.

pub mod builder;
pub mod candidate;
pub mod consolidate;
pub mod error;
pub mod geometry;
pub mod hints;
pub mod options;
pub mod pass;
pub mod priority;
pub mod symbology;
pub mod text_scan;
pub mod ticket;
pub mod validation;

pub use builder::{BuilderOptions, PassBuilder, PassInput, TicketSlot};
pub use candidate::{BarcodeCandidate, DetectionMethod, Enhancement};
pub use consolidate::{ConsolidatedBarcode, Consolidation, consolidate};
pub use error::{PassError, PassResult, PassWarning, PassWarningCode};
pub use geometry::BBox;
pub use hints::ContextHints;
pub use options::DetectOptions;
pub use pass::{PassBarcode, PassDefinition, PassField, PassStructure};
pub use priority::{FormatGroup, detect_by_precedence, select_best};
pub use symbology::{PassBarcodeFormat, Symbology};
pub use text_scan::scan_text;
pub use ticket::{DocumentType, PassColors, Rgb, TicketExtraction};
pub use validation::{Severity, ValidationIssue, is_valid, validate_pass};
