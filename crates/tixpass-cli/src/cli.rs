use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use tixpass::{DocumentType, Rgb, SignatureDigest};

/// Scan ticket PDFs for barcodes and turn them into wallet passes.
#[derive(Debug, Parser)]
#[command(name = "tixpass", about, version)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Write logs to stderr as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Detect and consolidate the barcodes in a PDF
    Scan {
        /// Path to the PDF file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Fall back to barcode-like strings in the page text
        #[arg(long)]
        text_fallback: bool,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Generate one .pkpass per ticket found in a PDF
    Generate(GenerateArgs),

    /// Check a pass.json against the pass schema rules
    Validate {
        /// Path to the pass.json file
        #[arg(value_name = "PASS_JSON")]
        file: PathBuf,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Recompute and check the manifest of a .pkpass archive
    Manifest {
        /// Path to the .pkpass file
        #[arg(value_name = "PKPASS")]
        file: PathBuf,
    },
}

/// Arguments of the `generate` subcommand.
#[derive(Debug, Args)]
pub struct GenerateArgs {
    /// Path to the PDF file
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Directory the .pkpass files are written to
    #[arg(long, value_name = "DIR")]
    pub out: PathBuf,

    /// Ticket metadata as a JSON file
    #[arg(long, value_name = "JSON_FILE")]
    pub metadata: Option<PathBuf>,

    /// Pass title (overrides the metadata title)
    #[arg(long)]
    pub title: Option<String>,

    /// Document type (event_ticket, boarding_pass, transit, hotel, generic)
    #[arg(long, value_name = "KIND")]
    pub document_type: Option<DocumentType>,

    /// Background color as rgb(r, g, b)
    #[arg(long, value_name = "RGB")]
    pub bg: Option<Rgb>,

    /// Foreground color as rgb(r, g, b)
    #[arg(long, value_name = "RGB")]
    pub fg: Option<Rgb>,

    /// Label color as rgb(r, g, b)
    #[arg(long, value_name = "RGB")]
    pub label: Option<Rgb>,

    #[command(flatten)]
    pub signing: SigningArgs,

    /// Record validation errors as warnings instead of failing
    #[arg(long)]
    pub lenient: bool,

    /// Fall back to barcode-like strings in the page text
    #[arg(long)]
    pub text_fallback: bool,

    /// Do not embed a first-page thumbnail
    #[arg(long)]
    pub no_thumbnail: bool,
}

/// Where the signing identity comes from.
///
/// Without any of these flags the identity is read from the environment;
/// when that is empty too, passes are written unsigned.
#[derive(Debug, Args)]
pub struct SigningArgs {
    /// Directory holding pass.pem, key.pem and wwdrg4.pem (or wwdr.pem)
    #[arg(long, value_name = "DIR", conflicts_with_all = ["cert", "key", "wwdr"])]
    pub cert_dir: Option<PathBuf>,

    /// Pass certificate PEM
    #[arg(long, value_name = "PEM", requires_all = ["key", "wwdr"])]
    pub cert: Option<PathBuf>,

    /// Private key PEM (PKCS#8 or PKCS#1)
    #[arg(long, value_name = "PEM", requires_all = ["cert", "wwdr"])]
    pub key: Option<PathBuf>,

    /// Issuer certificate PEM
    #[arg(long, value_name = "PEM", requires_all = ["cert", "key"])]
    pub wwdr: Option<PathBuf>,

    /// Signature digest
    #[arg(long, value_enum)]
    pub digest: Option<DigestArg>,
}

/// Output format for reports.
#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// JSON output
    Json,
}

/// Signature digest choice.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DigestArg {
    Sha1,
    Sha256,
}

impl From<DigestArg> for SignatureDigest {
    fn from(arg: DigestArg) -> Self {
        match arg {
            DigestArg::Sha1 => SignatureDigest::Sha1,
            DigestArg::Sha256 => SignatureDigest::Sha256,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_scan_defaults() {
        let cli = Cli::parse_from(["tixpass", "scan", "ticket.pdf"]);
        assert_eq!(cli.verbose, 0);
        match cli.command {
            Commands::Scan {
                ref file,
                text_fallback,
                ref format,
            } => {
                assert_eq!(file, &PathBuf::from("ticket.pdf"));
                assert!(!text_fallback);
                assert!(matches!(format, OutputFormat::Text));
            }
            _ => panic!("expected Scan subcommand"),
        }
    }

    #[test]
    fn verbosity_counts_and_is_global() {
        let cli = Cli::parse_from(["tixpass", "scan", "ticket.pdf", "-vv", "--log-json"]);
        assert_eq!(cli.verbose, 2);
        assert!(cli.log_json);
    }

    #[test]
    fn parse_generate_with_colors_and_cert_dir() {
        let cli = Cli::parse_from([
            "tixpass",
            "generate",
            "ticket.pdf",
            "--out",
            "passes",
            "--bg",
            "rgb(10, 20, 30)",
            "--document-type",
            "boarding_pass",
            "--cert-dir",
            "certs",
            "--digest",
            "sha1",
            "--lenient",
        ]);
        match cli.command {
            Commands::Generate(args) => {
                assert_eq!(args.out, PathBuf::from("passes"));
                assert_eq!(args.bg, Some(Rgb::new(10, 20, 30)));
                assert_eq!(args.document_type, Some(DocumentType::BoardingPass));
                assert_eq!(args.signing.cert_dir, Some(PathBuf::from("certs")));
                assert!(matches!(args.signing.digest, Some(DigestArg::Sha1)));
                assert!(args.lenient);
            }
            _ => panic!("expected Generate subcommand"),
        }
    }

    #[test]
    fn generate_requires_out() {
        assert!(Cli::try_parse_from(["tixpass", "generate", "ticket.pdf"]).is_err());
    }

    #[test]
    fn cert_files_must_come_together() {
        let result = Cli::try_parse_from([
            "tixpass", "generate", "t.pdf", "--out", "o", "--cert", "pass.pem",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn cert_dir_conflicts_with_cert_files() {
        let result = Cli::try_parse_from([
            "tixpass", "generate", "t.pdf", "--out", "o", "--cert-dir", "d", "--cert", "c", "--key", "k", "--wwdr", "w",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn bad_color_is_rejected() {
        let result = Cli::try_parse_from(["tixpass", "generate", "t.pdf", "--out", "o", "--bg", "blue"]);
        assert!(result.is_err());
    }

    #[test]
    fn parse_validate_json() {
        let cli = Cli::parse_from(["tixpass", "validate", "pass.json", "--format", "json"]);
        match cli.command {
            Commands::Validate { ref format, .. } => assert!(matches!(format, OutputFormat::Json)),
            _ => panic!("expected Validate subcommand"),
        }
    }

    #[test]
    fn parse_manifest() {
        let cli = Cli::parse_from(["tixpass", "manifest", "ticket.pkpass"]);
        assert!(matches!(cli.command, Commands::Manifest { .. }));
    }
}
