//! Error types for loading suites, scenes and writing results.
//!
//! None of these are fatal to a run: loaders fall back to defaults and the
//! result writer logs and moves on. They exist so callers can tell what went wrong.

use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the runner's file boundaries.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// Reading or writing a file failed.
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A JSON document could not be parsed or produced.
    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A TOML test document could not be parsed.
    #[error("invalid TOML in {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// The document parsed but contained no tests.
    #[error("no tests defined in {path}")]
    EmptySuite { path: PathBuf },

    /// No test template exists for the requested feature type.
    #[error("unknown feature type '{0}' (available: door, pickup, door_with_key, movement)")]
    UnknownFeature(String),
}

impl RunnerError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.into(),
            source,
        }
    }
}
