//! crates/nutrifit_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of the generative-model API and of the PDF library.

use async_trait::async_trait;

use crate::domain::GeneratedPdf;
use crate::layout::ReportLayout;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (network, disk, PDF).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Upstream model error: {0}")]
    Upstream(String),
    #[error("Rendering failed: {0}")]
    Render(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait ModelGateway: Send + Sync {
    /// Sends the recording and the prompt to the model and returns its raw text answer.
    async fn generate(&self, audio: &[u8], mime_type: &str, prompt: &str) -> PortResult<String>;
}

pub trait ReportRenderer: Send + Sync {
    /// Draws a laid-out report and stores it under a fresh unique file name.
    fn render(&self, layout: &ReportLayout) -> PortResult<GeneratedPdf>;
}
