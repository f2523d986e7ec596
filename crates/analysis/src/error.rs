use std::path::PathBuf;
use thiserror::Error;

/// Errors that reach the caller of [`Analyzer`](crate::Analyzer).
///
/// Empty input, a missing community detector and geocoding timeouts are not
/// errors: they produce a valid, reduced result instead.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("input is not valid UTF-8 text: {0}")]
    MalformedInput(#[from] std::str::Utf8Error),

    #[error("failed to write graph artifact to {path:?}: {source}")]
    Artifact {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Capability(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
