//! Error types for the provider, the table store and the override file.
//!
//! Provider errors are recoverable (the affected season or field is skipped);
//! store errors abort the run.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("transport error calling {endpoint}: {source}")]
    Transport {
        endpoint: String,
        source: reqwest::Error,
    },

    #[error("{endpoint} returned HTTP {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("unexpected payload from {endpoint}: {message}")]
    Decode { endpoint: String, message: String },

    #[error("circuit breaker '{0}' is open")]
    CircuitOpen(String),

    #[error("failed to read fixture {}: {}", .path.display(), .source)]
    Fixture {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access {}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("CSV error in {}: {}", .path.display(), .source)]
    Csv { path: PathBuf, source: csv::Error },

    #[error("{} is missing required column '{}'", .path.display(), .column)]
    MissingColumn { path: PathBuf, column: String },

    #[error("line {line}: invalid value {value:?} in column '{column}'")]
    InvalidField {
        line: usize,
        column: String,
        value: String,
    },
}

#[derive(Debug, Error)]
pub enum OverrideError {
    #[error("failed to read rank overrides {}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid rank overrides {}: {}", .path.display(), .source)]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}
