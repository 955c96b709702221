use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the harness core.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// A builder precondition failed: missing parameter or missing path.
    #[error("{0}")]
    InvalidInput(String),

    /// One or more expected rules did not fire cleanly. The message lists
    /// every finding, one per line.
    #[error("{0}")]
    Validation(String),

    #[error("error reading report file '{}': {source}", path.display())]
    ReportRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("error parsing report file '{}': {message}", path.display())]
    ReportParse { path: PathBuf, message: String },
}

impl HarnessError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        HarnessError::InvalidInput(msg.into())
    }
}

pub type HarnessResult<T> = std::result::Result<T, HarnessError>;
