//! Error types.
//!
//! Three enums, one per propagation boundary: [`IndexError`] covers the
//! driver and persistence layer (I/O, unknown language tags, schema
//! mismatches — all fatal or logged-and-skipped per file), [`QueryError`]
//! covers the index's query surface (currently just a bad regex), and
//! [`GraphError`] covers the analyzer (degrades to empty results in the
//! caller, never unwinds on its own). Processor-level failures never reach
//! an error type at all: a processor returns `Option::None` and the driver
//! logs and moves on, so there is no `ProcessorError` public type.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unknown language tag '{tag}' for {path}")]
    UnknownLanguage { path: PathBuf, tag: String },

    #[error("failed to parse {path} as JSON: {source}")]
    DeserializationError {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("index data schema mismatch: expected type '{expected}', found '{found}'")]
    SchemaMismatch { expected: String, found: String },

    #[error("config error: {reason}")]
    ConfigError { reason: String },
}

#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("invalid regex pattern '{pattern}': {source}")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("node index {idx} is out of bounds for a graph of {len} nodes")]
    NodeOutOfBounds { idx: usize, len: usize },

    #[error("SCC data is stale or missing and could not be recomputed: {reason}")]
    SccUnavailable { reason: String },
}
