//! services/api/src/error.rs
//!
//! Defines the primary error type for the service binaries.

use crate::config::ConfigError;
use nutrifit_core::AnalysisError;

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents a failure of the analysis pipeline.
    #[error("Analysis Error: {0}")]
    Analysis(#[from] AnalysisError),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}
