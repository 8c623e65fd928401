use clap::{Parser, Subcommand};
use docscan::models::DateFormat;
use docscan::processing::DateNormalizer;
use docscan::utils::Result;
use docscan::{DocumentScanner, ScannerConfig};
use log::error;
use serde::Serialize;
use serde_json::json;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "docscan", version, about = "Decode scanned identity document payloads")]
struct Cli {
    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Decode and verify a Secure QR payload
    Qr {
        /// Scanned digits, or `-` for stdin
        data: String,
        /// Certificate directory, overrides the configuration
        #[arg(long)]
        trust_store: Option<PathBuf>,
    },
    /// Parse AAMVA driver license barcode text
    Aamva {
        /// Barcode text, or `-` for stdin
        text: String,
    },
    /// Normalize an OCR date string
    Date {
        raw: String,
        #[arg(long)]
        format: Option<DateFormat>,
    },
    /// Report whether a date could be read two ways
    Ambiguous { raw: String },
}

fn read_input(arg: &str) -> Result<String> {
    if arg != "-" {
        return Ok(arg.to_string());
    }
    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;
    Ok(buffer)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => ScannerConfig::from_file(path)?,
        None => ScannerConfig::default(),
    };

    match cli.command {
        Command::Qr { data, trust_store } => {
            if trust_store.is_some() {
                config.trust_store_dir = trust_store;
            }
            let scanner = DocumentScanner::new(config);
            print_json(&scanner.decode_qr(&read_input(&data)?))
        }
        Command::Aamva { text } => {
            let scanner = DocumentScanner::new(config);
            print_json(&scanner.parse_license(&read_input(&text)?))
        }
        Command::Date { raw, format } => {
            let hint = format.unwrap_or(config.date_format);
            let normalized = DateNormalizer::normalize(&raw, hint)?;
            print_json(&json!({ "input": raw, "format": hint, "normalized": normalized }))
        }
        Command::Ambiguous { raw } => {
            let ambiguous = DateNormalizer::is_ambiguous(&raw);
            print_json(&json!({ "input": raw, "ambiguous": ambiguous }))
        }
    }
}

fn main() -> ExitCode {
    env_logger::init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{}", err);
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}
