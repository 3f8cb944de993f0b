use std::path::Path;

use tixpass::{BarcodeSummary, GeneratorOptions, PassGenerator, RxingDecoder};

use crate::cli::OutputFormat;
use crate::shared::{file_name, print_json, read_file, report_error, warning_json};

pub fn run(file: &Path, text_fallback: bool, format: &OutputFormat) -> Result<(), i32> {
    let pdf = read_file(file)?;

    let mut options = GeneratorOptions::from_env();
    options.detect.text_fallback = text_fallback;
    let generator = PassGenerator::new(options, None, Box::new(RxingDecoder::new()));

    let report = generator
        .detect(&pdf, &file_name(file))
        .map_err(|e| report_error(&e))?;
    let barcodes: Vec<BarcodeSummary> = report.barcodes.iter().map(BarcodeSummary::from).collect();
    let unsupported: Vec<BarcodeSummary> = report.unsupported.iter().map(BarcodeSummary::from).collect();

    match format {
        OutputFormat::Text => {
            if barcodes.is_empty() && unsupported.is_empty() {
                println!("No barcodes found.");
            }
            for (i, barcode) in barcodes.iter().enumerate() {
                println!(
                    "{}. {} ({}) pages {:?} x{} confidence {}: {}",
                    i + 1,
                    barcode.symbology,
                    barcode.format.as_deref().unwrap_or("-"),
                    barcode.pages,
                    barcode.detection_count,
                    barcode.confidence,
                    barcode.message,
                );
            }
            for barcode in &unsupported {
                println!("unsupported {}: {}", barcode.symbology, barcode.message);
            }
            if let Some(strategy) = report.strategy {
                println!("Strategy: {strategy}");
            }
            for warning in &report.warnings {
                eprintln!("Warning: {}", warning.description);
            }
        }
        OutputFormat::Json => {
            let warnings: Vec<serde_json::Value> = report.warnings.iter().map(warning_json).collect();
            let output = serde_json::json!({
                "file": file.display().to_string(),
                "strategy": report.strategy,
                "candidates": report.candidates.len(),
                "barcodes": barcodes,
                "unsupported": unsupported,
                "warnings": warnings,
            });
            print_json(&output)?;
        }
    }

    Ok(())
}
