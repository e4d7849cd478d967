// src/errors/mod.rs
//! Diagnostics for the extraction engine.
//!
//! Engine diagnostics never abort a run: each one is recorded in a
//! [`DiagnosticLog`] (and mirrored to `tracing`), and extraction of the
//! surrounding tree continues with the most defensible fallback. Hard
//! failures (I/O, malformed input files) are a separate [`QuarryError`]
//! rendered with miette at the CLI boundary.

pub mod diag;
pub mod report;

pub use diag::{Diag, Diagnostic, DiagnosticLog, Severity};
pub use report::QuarryError;
