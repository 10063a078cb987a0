//! Error types returned by the library.
//!
//! Startup failures ([`LoadError`]) are fatal to the binary. Query-time
//! failures ([`AggregateError`], [`MapError`]) are turned into HTTP error
//! responses by the server and never abort the process.

use std::path::PathBuf;
use thiserror::Error;

/// Failure while reading the source files.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open {}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read CSV from {source_name}: {source}")]
    Csv {
        source_name: String,
        #[source]
        source: csv::Error,
    },

    #[error("{source_name} is missing required column '{column}'")]
    MissingColumn {
        source_name: String,
        column: &'static str,
    },

    #[error("no data files configured")]
    NoFiles,
}

/// Failure while grouping the accident table.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AggregateError {
    #[error("invalid dimension '{0}'")]
    InvalidDimension(String),
}

/// Failure while resolving a map document.
#[derive(Debug, Error)]
pub enum MapError {
    #[error("unknown map document '{0}'")]
    UnknownDocument(String),

    #[error("map document not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("failed to read map document {}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
