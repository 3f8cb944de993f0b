//! The pass generation service: document in, one `.pkpass` per ticket out.

use std::env;
use std::sync::Arc;

use serde::Serialize;
use tixpass_core::error::push_unique;
use tixpass_core::validation::error_messages;
use tixpass_core::{
    BarcodeCandidate, BuilderOptions, ConsolidatedBarcode, ContextHints, DetectOptions, PassBuilder, PassColors,
    PassDefinition, PassError, PassInput, PassWarning, PassWarningCode, TicketExtraction, TicketSlot, consolidate,
    validate_pass,
};
use tixpass_scan::BarcodeDecoder;
use tracing::{debug, info, warn};

use crate::assets::{self, THUMBNAIL_FILE};
use crate::document::TicketDocument;
use crate::identity::SigningIdentity;
use crate::orchestrator::Orchestrator;
use crate::package::{PASS_FILE, PassBundle};
use crate::signer::{SigningOptions, sign_manifest};

/// Environment variable holding the App Store id linked from passes.
pub const ENV_APP_STORE_ID: &str = "APP_STORE_ID";

/// Options for [`PassGenerator`].
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorOptions {
    pub detect: DetectOptions,
    pub builder: BuilderOptions,
    pub signing: SigningOptions,
    /// Fail a ticket on validation errors instead of recording them as
    /// warnings. Default: true.
    pub strict_validation: bool,
    /// Include a first-page thumbnail. Default: true.
    pub thumbnail: bool,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            detect: DetectOptions::default(),
            builder: BuilderOptions::default(),
            signing: SigningOptions::default(),
            strict_validation: true,
            thumbnail: true,
        }
    }
}

impl GeneratorOptions {
    /// Defaults, with `APP_STORE_ID` and `PASS_SIGNATURE_DIGEST` applied.
    pub fn from_env() -> Self {
        let mut options = Self {
            signing: SigningOptions::from_env(),
            ..Self::default()
        };
        if let Ok(id) = env::var(ENV_APP_STORE_ID) {
            options.builder = options.builder.with_app_store_id(&id);
        }
        options
    }
}

/// Display form of a consolidated barcode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BarcodeSummary {
    pub symbology: String,
    /// Pass barcode format, or `None` when the symbology is unsupported.
    pub format: Option<String>,
    pub message: String,
    pub confidence: u8,
    pub detection_count: usize,
    pub pages: Vec<usize>,
    pub methods: Vec<String>,
}

impl From<&ConsolidatedBarcode> for BarcodeSummary {
    fn from(barcode: &ConsolidatedBarcode) -> Self {
        Self {
            symbology: barcode.symbology.as_str().to_string(),
            format: barcode.format.map(|f| f.as_str().to_string()),
            message: barcode.pass_message(),
            confidence: barcode.confidence,
            detection_count: barcode.detection_count,
            pages: barcode.pages_found.iter().copied().collect(),
            methods: barcode.methods_used.iter().cloned().collect(),
        }
    }
}

/// Result of scanning a document without generating passes.
#[derive(Debug, Clone, Default)]
pub struct DetectionReport {
    /// Raw candidates from the winning strategy.
    pub candidates: Vec<BarcodeCandidate>,
    pub strategy: Option<&'static str>,
    /// Supported barcodes, best first.
    pub barcodes: Vec<ConsolidatedBarcode>,
    /// Detected barcodes that cannot appear on a pass.
    pub unsupported: Vec<ConsolidatedBarcode>,
    pub warnings: Vec<PassWarning>,
}

/// One generated `.pkpass`.
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedPass {
    pub ticket_number: usize,
    pub total: usize,
    pub title: String,
    pub description: String,
    pub serial_number: String,
    pub barcode: Option<BarcodeSummary>,
    #[serde(skip)]
    pub bytes: Vec<u8>,
    pub signed: bool,
}

/// Everything produced for one document.
#[derive(Debug, Clone)]
pub struct GenerationReport {
    pub passes: Vec<GeneratedPass>,
    pub barcodes: Vec<BarcodeSummary>,
    pub strategy: Option<&'static str>,
    pub warnings: Vec<PassWarning>,
}

/// Turns ticket PDFs into pass archives.
///
/// The signing identity is loaded once and shared; a generator can serve any
/// number of documents.
///
/// # Example
///
/// ```ignore
/// let identity = SigningIdentity::from_env()?.map(Arc::new);
/// let generator = PassGenerator::new(GeneratorOptions::from_env(), identity, Box::new(RxingDecoder::new()));
/// let report = generator.generate(&pdf, "ticket.pdf", &ticket, &PassColors::default())?;
/// ```
pub struct PassGenerator {
    options: GeneratorOptions,
    identity: Option<Arc<SigningIdentity>>,
    decoder: Box<dyn BarcodeDecoder>,
    orchestrator: Orchestrator,
    builder: PassBuilder,
}

impl PassGenerator {
    pub fn new(
        options: GeneratorOptions,
        identity: Option<Arc<SigningIdentity>>,
        decoder: Box<dyn BarcodeDecoder>,
    ) -> Self {
        let orchestrator = Orchestrator::from_options(&options.detect);
        let builder = PassBuilder::new(options.builder.clone());
        if identity.is_none() {
            warn!("no signing identity configured; passes will be unsigned");
        }
        Self {
            options,
            identity,
            decoder,
            orchestrator,
            builder,
        }
    }

    pub fn options(&self) -> &GeneratorOptions {
        &self.options
    }

    pub fn is_signing(&self) -> bool {
        self.identity.is_some()
    }

    /// Pass type and team identifiers: the certificate's when it has them,
    /// else the configured fallbacks.
    pub fn identifiers(&self) -> (&str, &str) {
        let fallback = &self.options.builder;
        let ptid = self
            .identity
            .as_deref()
            .and_then(SigningIdentity::pass_type_identifier)
            .unwrap_or(&fallback.pass_type_identifier);
        let team = self
            .identity
            .as_deref()
            .and_then(SigningIdentity::team_identifier)
            .unwrap_or(&fallback.team_identifier);
        (ptid, team)
    }

    /// Scan a document and consolidate what it holds.
    ///
    /// # Errors
    ///
    /// Returns [`PassError::Document`] if the PDF cannot be opened. Finding
    /// no barcode is not an error.
    pub fn detect(&self, pdf: &[u8], filename: &str) -> Result<DetectionReport, PassError> {
        let doc = TicketDocument::open(pdf, self.options.detect.clone())?;
        Ok(self.detect_in(&doc, filename))
    }

    fn detect_in(&self, doc: &TicketDocument, filename: &str) -> DetectionReport {
        let hints = ContextHints::from_filename(filename);
        let outcome = self.orchestrator.run(doc, self.decoder.as_ref(), &hints);
        let consolidation = consolidate(&outcome.candidates, &hints);
        debug!(
            candidates = outcome.candidates.len(),
            barcodes = consolidation.barcodes.len(),
            unsupported = consolidation.unsupported.len(),
            "consolidated"
        );
        DetectionReport {
            candidates: outcome.candidates,
            strategy: outcome.strategy,
            barcodes: consolidation.barcodes,
            unsupported: consolidation.unsupported,
            warnings: consolidation.warnings,
        }
    }

    /// Generate one pass per supported barcode (at least one pass).
    ///
    /// # Errors
    ///
    /// Returns the first ticket's error: [`PassError::Validation`] in strict
    /// mode, [`PassError::Signing`] or [`PassError::Package`] when a bundle
    /// cannot be sealed, or [`PassError::Document`] for unreadable input.
    pub fn generate(
        &self,
        pdf: &[u8],
        filename: &str,
        ticket: &TicketExtraction,
        colors: &PassColors,
    ) -> Result<GenerationReport, PassError> {
        let doc = TicketDocument::open(pdf, self.options.detect.clone())?;
        let detection = self.detect_in(&doc, filename);
        let mut warnings = detection.warnings;

        let thumbnail = if self.options.thumbnail {
            match assets::thumbnail(&doc) {
                Ok(png) => Some(png),
                Err(err) => {
                    warn!(error = %err, "thumbnail skipped");
                    push_unique(
                        &mut warnings,
                        PassWarning::with_code(PassWarningCode::Asset, format!("Thumbnail not generated: {err}")),
                    );
                    None
                }
            }
        } else {
            None
        };

        let barcodes: Vec<Option<&ConsolidatedBarcode>> = if detection.barcodes.is_empty() {
            vec![None]
        } else {
            detection.barcodes.iter().map(Some).collect()
        };
        let total = barcodes.len();
        let job = |(index, barcode): (usize, &Option<&ConsolidatedBarcode>)| {
            let input = PassInput {
                ticket,
                barcode: *barcode,
                colors,
                slot: TicketSlot::new(index + 1, total),
                source_filename: Some(filename),
            };
            self.generate_ticket(&input, thumbnail.as_deref())
        };

        #[cfg(feature = "parallel")]
        let results: Vec<Result<(GeneratedPass, Vec<PassWarning>), PassError>> = {
            use rayon::prelude::*;
            barcodes.par_iter().enumerate().map(job).collect()
        };
        #[cfg(not(feature = "parallel"))]
        let results: Vec<Result<(GeneratedPass, Vec<PassWarning>), PassError>> =
            barcodes.iter().enumerate().map(job).collect();

        let mut passes = Vec::with_capacity(total);
        for result in results {
            let (pass, ticket_warnings) = result?;
            for warning in ticket_warnings {
                push_unique(&mut warnings, warning);
            }
            passes.push(pass);
        }
        if self.identity.is_none() {
            push_unique(
                &mut warnings,
                PassWarning::with_code(
                    PassWarningCode::Unsigned,
                    "No signing certificate configured. The pass is unsigned and will not open in Wallet.",
                ),
            );
        }
        info!(passes = passes.len(), warnings = warnings.len(), "generation finished");

        Ok(GenerationReport {
            passes,
            barcodes: detection.barcodes.iter().map(BarcodeSummary::from).collect(),
            strategy: detection.strategy,
            warnings,
        })
    }

    /// Build, validate, sign and package one ticket.
    fn generate_ticket(
        &self,
        input: &PassInput<'_>,
        thumbnail: Option<&[u8]>,
    ) -> Result<(GeneratedPass, Vec<PassWarning>), PassError> {
        let number = input.slot.number;
        let (ptid, team) = self.identifiers();
        let def = self.builder.build(input, ptid, team);
        let mut warnings = Vec::new();

        let issues = validate_pass(&def);
        let errors = error_messages(&issues);
        if !errors.is_empty() {
            if self.options.strict_validation {
                return Err(PassError::Validation(errors));
            }
            for message in errors {
                push_unique(
                    &mut warnings,
                    PassWarning::with_code(PassWarningCode::Validation, format!("Validation: {message}"))
                        .for_ticket(number),
                );
            }
        }
        for issue in issues.iter().filter(|i| i.is_warning()) {
            debug!(ticket = number, issue = %issue.message, "validation warning");
        }

        let mut bundle = PassBundle::new();
        bundle.insert(
            PASS_FILE,
            serde_json::to_vec_pretty(&def).map_err(|e| PassError::Package(format!("{PASS_FILE}: {e}")))?,
        );
        let title = primary_title(&def);
        for (name, png) in assets::icon_files(input.ticket.document_type, &title, input.colors.background, input.colors.foreground)? {
            bundle.insert(name, png);
        }
        if let Some(png) = thumbnail {
            bundle.insert(THUMBNAIL_FILE, png.to_vec());
        }

        let manifest = bundle.seal_manifest()?;
        if let Some(identity) = self.identity.as_deref() {
            bundle.set_signature(sign_manifest(identity, &manifest, self.options.signing.digest)?);
        }
        let bytes = bundle.to_pkpass()?;
        info!(ticket = number, total = input.slot.total, bytes = bytes.len(), signed = bundle.is_signed(), "pass generated");

        Ok((
            GeneratedPass {
                ticket_number: number,
                total: input.slot.total,
                title,
                description: def.description.clone(),
                serial_number: def.serial_number.clone(),
                barcode: input.barcode.map(BarcodeSummary::from),
                bytes,
                signed: bundle.is_signed(),
            },
            warnings,
        ))
    }
}

impl std::fmt::Debug for PassGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PassGenerator")
            .field("options", &self.options)
            .field("identity", &self.identity)
            .field("orchestrator", &self.orchestrator)
            .finish_non_exhaustive()
    }
}

/// Value of the primary `title` field, else the logo text.
fn primary_title(def: &PassDefinition) -> String {
    def.structure()
        .and_then(|(_, s)| s.primary_fields.iter().find(|f| f.key == "title"))
        .map(|f| f.value.clone())
        .or_else(|| def.logo_text.clone())
        .unwrap_or_default()
}
