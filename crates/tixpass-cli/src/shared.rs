use std::path::Path;
use std::sync::Arc;

use serde_json::Value;
use tixpass::{PassError, PassWarning, SigningIdentity};
use tracing::{info, warn};

use crate::cli::SigningArgs;

/// Exit code for bad input, unreadable files and failed generation.
pub const EXIT_ERROR: i32 = 1;
/// Exit code when a pass or archive fails validation.
pub const EXIT_INVALID: i32 = 2;

/// Read a whole file, printing a friendly message on failure.
pub fn read_file(file: &Path) -> Result<Vec<u8>, i32> {
    if !file.exists() {
        eprintln!("Error: file not found: {}", file.display());
        return Err(EXIT_ERROR);
    }
    std::fs::read(file).map_err(|e| {
        eprintln!("Error: failed to read {}: {e}", file.display());
        EXIT_ERROR
    })
}

/// File name used for detection hints.
pub fn file_name(file: &Path) -> String {
    file.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Map a generation error to an exit code, printing it.
pub fn report_error(err: &PassError) -> i32 {
    eprintln!("Error: {err}");
    match err {
        PassError::Validation(_) => EXIT_INVALID,
        _ => EXIT_ERROR,
    }
}

/// Load the signing identity named by the flags, or from the environment.
///
/// A missing or malformed identity is reported and signing is skipped.
pub fn load_identity(args: &SigningArgs) -> Option<Arc<SigningIdentity>> {
    let loaded = if let Some(dir) = &args.cert_dir {
        SigningIdentity::from_dir(dir).map(Some)
    } else if let (Some(cert), Some(key), Some(wwdr)) = (&args.cert, &args.key, &args.wwdr) {
        SigningIdentity::from_files(cert, key, wwdr).map(Some)
    } else {
        SigningIdentity::from_env()
    };

    match loaded {
        Ok(Some(identity)) => {
            info!(?identity, "signing identity loaded");
            Some(Arc::new(identity))
        }
        Ok(None) => {
            warn!("no signing identity configured");
            None
        }
        Err(err) => {
            eprintln!("Warning: signing identity not loaded: {err}");
            None
        }
    }
}

pub fn warning_json(warning: &PassWarning) -> Value {
    let mut obj = serde_json::json!({
        "code": warning.code.as_str(),
        "description": warning.description,
    });
    if let Some(ticket) = warning.ticket {
        obj["ticket"] = serde_json::json!(ticket);
    }
    obj
}

/// Print a JSON value, pretty.
pub fn print_json(value: &Value) -> Result<(), i32> {
    let text = serde_json::to_string_pretty(value).map_err(|e| {
        eprintln!("Error: failed to serialize output: {e}");
        EXIT_ERROR
    })?;
    println!("{text}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_exit_with_two() {
        assert_eq!(report_error(&PassError::Validation(vec!["x".into()])), EXIT_INVALID);
        assert_eq!(report_error(&PassError::Package("zip".into())), EXIT_ERROR);
    }

    #[test]
    fn file_name_strips_directories() {
        assert_eq!(file_name(Path::new("/tmp/tickets/boarding.pdf")), "boarding.pdf");
    }

    #[test]
    fn warning_json_includes_ticket() {
        let warning = PassWarning::new("odd").for_ticket(2);
        let json = warning_json(&warning);
        assert_eq!(json["code"], "OTHER");
        assert_eq!(json["ticket"], 2);
    }
}
