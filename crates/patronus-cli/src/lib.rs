// patronus-cli: shared utilities for the command-line tools.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;

use patronus::{CheckError, CheckReport, Checker, Config};
use serde::Serialize;

/// Read the configuration and load providers.
///
/// `extra_dirs` are scanned before the configured directories. Providers
/// that fail to load are logged and skipped.
pub fn load_checker(
    config_path: Option<&Path>,
    extra_dirs: &[PathBuf],
) -> Result<(Checker, Config), String> {
    let mut config = Config::load(config_path).map_err(|e| e.to_string())?;
    if !extra_dirs.is_empty() {
        let mut dirs = extra_dirs.to_vec();
        dirs.append(&mut config.provider_dirs);
        config.provider_dirs = dirs;
    }
    let checker = Checker::from_config(&config);
    if checker.is_empty() {
        tracing::warn!(
            "no providers found; searched {}",
            config
                .provider_search_paths()
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );
    }
    Ok((checker, config))
}

/// Split input into paragraphs.
///
/// By default every non-empty line is a paragraph. With `empty_line_separates`
/// consecutive lines are joined with a space and paragraphs end at blank
/// lines.
pub fn paragraphs(input: &str, empty_line_separates: bool) -> Vec<String> {
    if !empty_line_separates {
        return input
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_owned)
            .collect();
    }

    let mut out = Vec::new();
    let mut paragraph = String::new();
    for line in input.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            if !paragraph.is_empty() {
                out.push(std::mem::take(&mut paragraph));
            }
            continue;
        }
        if !paragraph.is_empty() {
            paragraph.push(' ');
        }
        paragraph.push_str(trimmed);
    }
    if !paragraph.is_empty() {
        out.push(paragraph);
    }
    out
}

/// Print findings in a human-readable, diff-able format.
pub fn write_pretty(
    out: &mut impl Write,
    paragraph: &str,
    report: &CheckReport<'_>,
) -> io::Result<()> {
    for arr in report.arrays() {
        for ann in arr {
            writeln!(out, "{paragraph}")?;
            writeln!(
                out,
                "E: [{}] {} ({}, start={})",
                arr.provider(),
                ann.message(),
                ann.kind(),
                ann.offset()
            )?;
            let covered = paragraph.get(ann.offset()..ann.end()).unwrap_or("");
            writeln!(out, "E: \"{covered}\"")?;
            for suggestion in ann.suggestions() {
                writeln!(out, "S:  \"{suggestion}\"")?;
            }
            writeln!(out, "=================================================")?;
        }
    }
    for failure in report.failures() {
        writeln!(out, "W: {failure}")?;
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct ParagraphDto {
    pub paragraph: String,
    pub annotations: Vec<AnnotationDto>,
    pub failures: Vec<FailureDto>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationDto {
    pub provider: String,
    pub offset: usize,
    pub length: usize,
    pub kind: String,
    pub message: String,
    pub suggestions: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct FailureDto {
    pub provider: String,
    pub kind: String,
    pub message: String,
}

impl ParagraphDto {
    pub fn new(paragraph: &str, report: &CheckReport<'_>) -> Self {
        let annotations = report
            .arrays()
            .flat_map(|arr| {
                arr.iter().map(move |ann| AnnotationDto {
                    provider: arr.provider().to_owned(),
                    offset: ann.offset(),
                    length: ann.length(),
                    kind: ann.kind().name().to_owned(),
                    message: ann.message().to_owned(),
                    suggestions: ann.suggestions().map(str::to_owned).collect(),
                })
            })
            .collect();
        let failures = report.failures().map(FailureDto::from).collect();
        Self {
            paragraph: paragraph.to_owned(),
            annotations,
            failures,
        }
    }
}

impl From<&CheckError> for FailureDto {
    fn from(e: &CheckError) -> Self {
        Self {
            provider: e.provider().to_owned(),
            kind: format!("{:?}", e.kind()),
            message: e.to_string(),
        }
    }
}

/// Names of the registered providers, one per line.
pub fn write_providers(out: &mut impl Write, checker: &Checker) -> io::Result<()> {
    for provider in checker.providers() {
        let note = if provider.is_concurrent() { "" } else { " (serialized)" };
        writeln!(out, "{}{note}", provider.name())?;
    }
    Ok(())
}

/// Print an error message and exit with code 1.
pub fn fatal(msg: &str) -> ! {
    eprintln!("error: {msg}");
    process::exit(1);
}
