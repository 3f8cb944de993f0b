//! tixpass: Turn ticket PDFs into signed wallet passes.
//!
//! This is the public API facade crate for tixpass-rs. It re-exports types from
//! tixpass-core and uses tixpass-scan for PDF reading and barcode decoding.
//!
//! # Architecture
//!
//! - **tixpass-core**: Backend-independent data types and algorithms
//! - **tixpass-scan**: PDF access, rasterization and barcode decoding
//! - **tixpass** (this crate): Detection ladder, signing and packaging
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use tixpass::{GeneratorOptions, PassColors, PassGenerator, RxingDecoder, SigningIdentity, TicketExtraction};
//!
//! let identity = SigningIdentity::from_env()?.map(Arc::new);
//! let generator = PassGenerator::new(GeneratorOptions::from_env(), identity, Box::new(RxingDecoder::new()));
//! let report = generator.generate(&pdf, "ticket.pdf", &TicketExtraction::default(), &PassColors::default())?;
//! for pass in report.passes {
//!     std::fs::write(format!("ticket-{}.pkpass", pass.ticket_number), pass.bytes)?;
//! }
//! ```

pub mod assets;
pub mod document;
pub mod error;
pub mod generator;
pub mod identity;
pub mod manifest;
pub mod orchestrator;
pub mod package;
pub mod signer;

pub use document::TicketDocument;
pub use error::SigningError;
pub use generator::{
    BarcodeSummary, DetectionReport, GeneratedPass, GenerationReport, GeneratorOptions, PassGenerator,
};
pub use identity::SigningIdentity;
pub use manifest::ManifestMismatch;
pub use orchestrator::{
    DetectionOutcome, DetectionStrategy, EmbeddedImages, Enhanced, Orchestrator, RasterLadder, TextPatterns,
};
pub use package::PassBundle;
pub use signer::{SignatureDigest, SigningOptions, sign_manifest};

pub use tixpass_core;
pub use tixpass_core::{
    BuilderOptions, ConsolidatedBarcode, DetectOptions, DocumentType, PassColors, PassDefinition, PassError,
    PassWarning, PassWarningCode, Rgb, TicketExtraction, ValidationIssue, validate_pass,
};
pub use tixpass_scan;
pub use tixpass_scan::{BarcodeDecoder, RxingDecoder};
