//! services/api/src/lib.rs
//!
//! Library half of the service, shared by the `api`, `openapi` and `analyze` binaries.

pub mod adapters;
pub mod config;
pub mod error;
pub mod web;

use adapters::{GeminiGateway, PdfReportRenderer};
use config::Config;
use error::ApiError;
use nutrifit_core::AnalysisService;
use std::sync::Arc;

/// Wires the Gemini gateway and the PDF renderer into an `AnalysisService`.
///
/// The returned renderer handle is the same one the service writes through, so it
/// can be used to resolve stored reports.
pub fn build_analysis_service(
    config: &Config,
) -> Result<(AnalysisService, Arc<PdfReportRenderer>), ApiError> {
    let prompt = config.load_prompt()?;

    let gateway = Arc::new(GeminiGateway::new(
        reqwest::Client::new(),
        config.gemini_api_base.clone(),
        config.gemini_api_key.clone(),
        config.gemini_model.clone(),
    ));
    let renderer = Arc::new(PdfReportRenderer::new(config.reports_dir.clone()));

    let service = AnalysisService::new(gateway, renderer.clone(), prompt);
    Ok((service, renderer))
}
