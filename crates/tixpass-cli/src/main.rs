mod cli;
mod generate_cmd;
mod manifest_cmd;
mod scan_cmd;
mod shared;
mod validate_cmd;

use clap::Parser;
use cli::Cli;
use tracing_subscriber::EnvFilter;

fn init_logging(verbose: u8, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };
        EnvFilter::new(level)
    });

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.log_json);

    let result = match cli.command {
        cli::Commands::Scan {
            ref file,
            text_fallback,
            ref format,
        } => scan_cmd::run(file, text_fallback, format),
        cli::Commands::Generate(ref args) => generate_cmd::run(args),
        cli::Commands::Validate { ref file, ref format } => validate_cmd::run(file, format),
        cli::Commands::Manifest { ref file } => manifest_cmd::run(file),
    };

    if let Err(code) = result {
        std::process::exit(code);
    }
}
