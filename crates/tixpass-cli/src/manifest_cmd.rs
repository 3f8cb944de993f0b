use std::path::Path;

use tixpass::PassBundle;
use tixpass::manifest::{self, MANIFEST_FILE};

use crate::shared::{EXIT_INVALID, read_file, report_error};

pub fn run(file: &Path) -> Result<(), i32> {
    let bytes = read_file(file)?;
    let bundle = PassBundle::from_pkpass(&bytes).map_err(|e| report_error(&e))?;

    let Some(listed) = bundle.get(MANIFEST_FILE) else {
        eprintln!("Error: {} has no {MANIFEST_FILE}", file.display());
        return Err(EXIT_INVALID);
    };
    let mismatches = manifest::verify(listed, bundle.files()).map_err(|e| {
        eprintln!("Error: {e}");
        EXIT_INVALID
    })?;

    let hashed = bundle.names().filter(|name| manifest::is_hashed(name)).count();
    let signed = if bundle.is_signed() { "signed" } else { "unsigned" };
    if mismatches.is_empty() {
        println!("OK: {hashed} file(s) match the manifest ({signed})");
        return Ok(());
    }

    for mismatch in &mismatches {
        println!("MISMATCH {mismatch}");
    }
    println!();
    println!("Summary: {} mismatch(es) in {hashed} file(s)", mismatches.len());
    Err(EXIT_INVALID)
}
