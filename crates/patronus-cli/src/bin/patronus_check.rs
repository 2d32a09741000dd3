// patronus-check: run every installed checker provider over text.
//
// Reads running text from stdin (or a file), checks each paragraph
// independently and prints findings in a human-readable, diff-able format
// or as JSON.
//
// Usage:
//   patronus-check [OPTIONS] [FILE]
//
// Logging goes to stderr and is controlled by PATRONUS_LOG (default: warn).

use std::io::{self, Read, Write};
use std::path::PathBuf;

use clap::Parser;
use patronus::Properties;
use patronus_cli::{ParagraphDto, fatal, load_checker, paragraphs, write_pretty, write_providers};
use tracing_subscriber::EnvFilter;

/// Check text with the installed Patronus providers
#[derive(Parser)]
#[command(name = "patronus-check")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// File to check (default: stdin)
    file: Option<PathBuf>,

    /// Path to configuration file
    #[arg(short, long, env = "PATRONUS_CONFIG")]
    config: Option<PathBuf>,

    /// Extra provider directory, searched first (can be repeated)
    #[arg(short = 'p', long = "provider-dir")]
    provider_dirs: Vec<PathBuf>,

    /// Language of the text (default: from config)
    #[arg(short, long)]
    language: Option<String>,

    /// Output format
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,

    /// Paragraphs are separated by empty lines (default: each line is one)
    #[arg(long)]
    empty_line: bool,

    /// Dispatch to providers on separate threads
    #[arg(long)]
    parallel: bool,

    /// List loaded providers and exit
    #[arg(long)]
    list_providers: bool,

    /// Enable debug logging (overrides PATRONUS_LOG)
    #[arg(short, long)]
    verbose: bool,
}

/// Output format for check results.
#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON array with one object per paragraph.
    Json,
}

fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env("PATRONUS_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let (checker, config) = load_checker(cli.config.as_deref(), &cli.provider_dirs)
        .unwrap_or_else(|e| fatal(&e));

    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());

    if cli.list_providers {
        write_providers(&mut out, &checker).unwrap_or_else(|e| fatal(&e.to_string()));
        return;
    }

    let input = match &cli.file {
        Some(path) => std::fs::read_to_string(path)
            .unwrap_or_else(|e| fatal(&format!("failed to read {}: {e}", path.display()))),
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .unwrap_or_else(|e| fatal(&format!("error reading stdin: {e}")));
            buf
        }
    };

    let props = cli
        .language
        .map(Properties::new)
        .unwrap_or_else(|| config.properties());
    let parallel = cli.parallel || config.parallel;

    let mut json = Vec::new();
    for paragraph in paragraphs(&input, cli.empty_line) {
        let report = if parallel {
            checker.check_parallel(&props, &paragraph)
        } else {
            checker.check(&props, &paragraph)
        };
        match cli.format {
            OutputFormat::Text => write_pretty(&mut out, &paragraph, &report)
                .unwrap_or_else(|e| fatal(&e.to_string())),
            OutputFormat::Json => json.push(ParagraphDto::new(&paragraph, &report)),
        }
    }

    if let OutputFormat::Json = cli.format {
        serde_json::to_writer_pretty(&mut out, &json).unwrap_or_else(|e| fatal(&e.to_string()));
        writeln!(out).unwrap_or_else(|e| fatal(&e.to_string()));
    }
    out.flush().unwrap_or_else(|e| fatal(&e.to_string()));
}
