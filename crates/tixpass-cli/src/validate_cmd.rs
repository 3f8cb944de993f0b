use std::path::Path;

use tixpass::tixpass_core::Severity;
use tixpass::{PassDefinition, validate_pass};

use crate::cli::OutputFormat;
use crate::shared::{EXIT_ERROR, EXIT_INVALID, print_json, read_file};

pub fn run(file: &Path, format: &OutputFormat) -> Result<(), i32> {
    let bytes = read_file(file)?;
    let def: PassDefinition = serde_json::from_slice(&bytes).map_err(|e| {
        eprintln!("Error: not a pass definition: {e}");
        EXIT_ERROR
    })?;

    let issues = validate_pass(&def);
    let error_count = issues.iter().filter(|i| i.is_error()).count();
    let warning_count = issues.iter().filter(|i| i.is_warning()).count();

    match format {
        OutputFormat::Text => {
            if issues.is_empty() {
                println!("No issues found.");
            } else {
                for issue in &issues {
                    let severity = match issue.severity {
                        Severity::Error => "ERROR",
                        Severity::Warning => "WARNING",
                    };
                    print!("[{severity}] {}: {}", issue.code, issue.message);
                    if let Some(ref loc) = issue.location {
                        print!(" (at {loc})");
                    }
                    println!();
                }
                println!();
                println!("Summary: {error_count} error(s), {warning_count} warning(s)");
            }
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "issues": issues,
                "summary": {
                    "errors": error_count,
                    "warnings": warning_count,
                },
            });
            print_json(&output)?;
        }
    }

    if error_count > 0 {
        return Err(EXIT_INVALID);
    }
    Ok(())
}
