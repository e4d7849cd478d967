// src/errors/report.rs
//! Hard failures surfaced at the CLI boundary.

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum QuarryError {
    #[error("could not read '{path}'")]
    #[diagnostic(code(quarry::io))]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("could not write '{path}'")]
    #[diagnostic(code(quarry::io))]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{path}' is not a valid unit")]
    #[diagnostic(
        code(quarry::parse),
        help("units are produced by a front end with `quarry`'s unit schema")
    )]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}
