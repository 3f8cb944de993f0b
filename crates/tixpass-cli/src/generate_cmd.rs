use std::path::{Path, PathBuf};

use tixpass::{GeneratedPass, GeneratorOptions, PassColors, PassGenerator, RxingDecoder, TicketExtraction};

use crate::cli::GenerateArgs;
use crate::shared::{EXIT_ERROR, file_name, load_identity, read_file, report_error};

pub fn run(args: &GenerateArgs) -> Result<(), i32> {
    let pdf = read_file(&args.file)?;
    let ticket = load_ticket(args)?;
    let colors = PassColors {
        background: args.bg.unwrap_or(PassColors::default().background),
        foreground: args.fg.unwrap_or(PassColors::default().foreground),
        label: args.label.unwrap_or(PassColors::default().label),
    };

    let mut options = GeneratorOptions::from_env();
    options.detect.text_fallback = args.text_fallback;
    options.strict_validation = !args.lenient;
    options.thumbnail = !args.no_thumbnail;
    if let Some(digest) = args.signing.digest {
        options.signing.digest = digest.into();
    }

    let identity = load_identity(&args.signing);
    let generator = PassGenerator::new(options, identity, Box::new(RxingDecoder::new()));
    let report = generator
        .generate(&pdf, &file_name(&args.file), &ticket, &colors)
        .map_err(|e| report_error(&e))?;

    std::fs::create_dir_all(&args.out).map_err(|e| {
        eprintln!("Error: failed to create {}: {e}", args.out.display());
        EXIT_ERROR
    })?;

    let stem = args
        .file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "ticket".to_string());
    for pass in &report.passes {
        let path = output_path(&args.out, &stem, pass);
        std::fs::write(&path, &pass.bytes).map_err(|e| {
            eprintln!("Error: failed to write {}: {e}", path.display());
            EXIT_ERROR
        })?;
        let barcode = pass
            .barcode
            .as_ref()
            .map(|b| format!("{} {}", b.symbology, b.message))
            .unwrap_or_else(|| "no barcode".to_string());
        let signed = if pass.signed { "signed" } else { "unsigned" };
        println!("{} ({signed}, {barcode})", path.display());
    }

    for warning in &report.warnings {
        eprintln!("Warning: {}", warning.description);
    }
    Ok(())
}

/// Metadata from `--metadata`, with `--title` and `--document-type` applied.
fn load_ticket(args: &GenerateArgs) -> Result<TicketExtraction, i32> {
    let mut ticket = match &args.metadata {
        Some(path) => {
            let bytes = read_file(path)?;
            serde_json::from_slice(&bytes).map_err(|e| {
                eprintln!("Error: invalid metadata in {}: {e}", path.display());
                EXIT_ERROR
            })?
        }
        None => TicketExtraction::default(),
    };
    if let Some(title) = &args.title {
        ticket.title = title.clone();
    }
    if let Some(kind) = args.document_type {
        ticket.document_type = kind;
    }
    Ok(ticket)
}

/// `<stem>.pkpass` for a single ticket, `<stem>-N.pkpass` otherwise.
fn output_path(out: &Path, stem: &str, pass: &GeneratedPass) -> PathBuf {
    if pass.total > 1 {
        out.join(format!("{stem}-{}.pkpass", pass.ticket_number))
    } else {
        out.join(format!("{stem}.pkpass"))
    }
}
