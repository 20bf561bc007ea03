//! Error types for table generation

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while turning a table into document artifacts.
///
/// Validation and configuration errors are raised before any file is written or
/// any external tool is launched.
#[derive(Error, Debug)]
pub enum TableError {
    /// The input is not a usable table (no columns, no rows, ragged rows)
    #[error("Invalid input: {0}")]
    InputValidation(String),

    /// Options that cannot be satisfied (unknown theme, span mismatch, ...)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The output location could not be prepared or written
    #[error("Filesystem error at '{}': {source}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The compiler or cropper is missing, failed, or timed out
    #[error("{tool} failed: {detail}")]
    ExternalTool { tool: String, detail: String },

    /// Compilation succeeded but cropping did not; the full document is still usable
    #[error("Cropping failed ({detail}); full document kept at '{}'", full_artifact.display())]
    CropFailed {
        full_artifact: PathBuf,
        detail: String,
    },
}

impl TableError {
    pub(crate) fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        TableError::Filesystem {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn tool(tool: impl Into<String>, detail: impl Into<String>) -> Self {
        TableError::ExternalTool {
            tool: tool.into(),
            detail: detail.into(),
        }
    }
}

/// Result type used throughout the crate
pub type Result<T> = std::result::Result<T, TableError>;
