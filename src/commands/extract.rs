// src/commands/extract.rs

use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::process::ExitCode;

use crate::errors::{QuarryError, Severity};
use crate::extractor::Extractor;
use crate::facts::TextSink;
use crate::ir::Unit;

/// Extract one unit file into fact tuples.
pub fn extract_unit(unit_path: &Path, output: Option<&Path>) -> ExitCode {
    match run(unit_path, output) {
        Ok(severe) => {
            // severe diagnostics leave a partial fact set, not a failure
            if severe > 0 {
                tracing::warn!(severe, "extraction finished with inconsistencies");
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            let report = miette::Report::new(e);
            eprintln!("{report:?}");
            ExitCode::FAILURE
        }
    }
}

fn run(unit_path: &Path, output: Option<&Path>) -> Result<usize, QuarryError> {
    let display_path = unit_path.display().to_string();
    let source = fs::read_to_string(unit_path).map_err(|source| QuarryError::Read {
        path: display_path.clone(),
        source,
    })?;
    let unit: Unit = serde_json::from_str(&source).map_err(|source| QuarryError::Parse {
        path: display_path.clone(),
        source,
    })?;

    let out: Box<dyn Write> = match output {
        Some(path) => {
            let file = fs::File::create(path).map_err(|source| QuarryError::Write {
                path: path.display().to_string(),
                source,
            })?;
            Box::new(BufWriter::new(file))
        }
        None => Box::new(io::stdout().lock()),
    };

    let mut extractor = Extractor::new(&unit, TextSink::new(out));
    extractor.extract();
    let (sink, log) = extractor.finish();
    sink.finish().map_err(|source| QuarryError::Write {
        path: output
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "<stdout>".to_string()),
        source,
    })?;

    for entry in log.entries() {
        let line = match entry.span {
            Some(span) => format!("{}:{}:{}: {}", display_path, span.line, span.column, entry.diag),
            None => format!("{}: {}", display_path, entry.diag),
        };
        match entry.severity {
            Severity::Info => eprintln!("note: {line}"),
            Severity::Warning => eprintln!("warning: {line}"),
            Severity::Severe => eprintln!("error: {line}"),
        }
    }
    Ok(log.severe_count())
}
