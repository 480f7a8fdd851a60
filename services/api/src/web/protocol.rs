//! services/api/src/web/protocol.rs
//!
//! Defines the JSON payloads exchanged over the REST API.

use chrono::{DateTime, Utc};
use nutrifit_core::{AnalysisOutcome, PdfOutcome};
use serde::Serialize;
use serde_json::{Map, Value};
use utoipa::ToSchema;

/// Public route under which stored reports are served.
pub const REPORTS_ROUTE: &str = "/reports";

//=========================================================================================
// Responses
//=========================================================================================

/// The response payload of a successful analysis.
#[derive(Serialize, ToSchema)]
pub struct AnalyzeResponse {
    /// The extracted report object. Carries `_warning` when expected keys are missing.
    #[schema(value_type = Object)]
    pub report: Map<String, Value>,
    /// Model text outside the JSON object.
    pub remainder: String,
    pub schema_complete: bool,
    pub pdf: PdfLink,
    pub generated_at: DateTime<Utc>,
}

impl AnalyzeResponse {
    pub fn from_outcome(outcome: AnalysisOutcome) -> Self {
        Self {
            report: outcome.report,
            remainder: outcome.remainder,
            schema_complete: outcome.schema_complete,
            pdf: PdfLink::from(&outcome.pdf),
            generated_at: Utc::now(),
        }
    }
}

/// Where to download the generated PDF, or why there is none.
#[derive(Serialize, ToSchema, Debug, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PdfLink {
    Ready { file_name: String, url: String },
    Failed { reason: String },
}

impl From<&PdfOutcome> for PdfLink {
    fn from(outcome: &PdfOutcome) -> Self {
        match outcome {
            PdfOutcome::Ready(pdf) => PdfLink::Ready {
                file_name: pdf.file_name.clone(),
                url: format!("{}/{}", REPORTS_ROUTE, pdf.file_name),
            },
            PdfOutcome::Failed { reason } => PdfLink::Failed {
                reason: reason.clone(),
            },
        }
    }
}

/// The body of every error response.
#[derive(Serialize, ToSchema, Debug)]
pub struct ErrorResponse {
    pub error: String,
    /// The underlying error text, for upstream failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// The unparsed model output, when no JSON could be extracted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_text: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            detail: None,
            raw_text: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_raw_text(mut self, raw_text: impl Into<String>) -> Self {
        self.raw_text = Some(raw_text.into());
        self
    }
}
