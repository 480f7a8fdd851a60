//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::adapters::pdf::PdfReportRenderer;
use crate::config::Config;
use nutrifit_core::AnalysisService;
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
/// Nothing in it is mutated after startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub analysis: Arc<AnalysisService>,
    /// Resolves stored report files for download.
    pub reports: Arc<PdfReportRenderer>,
}
