//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use crate::web::protocol::{AnalyzeResponse, ErrorResponse, PdfLink};
use crate::web::state::AppState;
use crate::web::upload::read_audio_upload;
use axum::{
    body::Body,
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json},
};
use nutrifit_core::AnalysisError;
use serde_json::json;
use std::sync::Arc;
use tokio_util::io::ReaderStream;
use tracing::{error, info, warn};
use utoipa::OpenApi;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        analyze_handler,
        download_report_handler,
    ),
    components(
        schemas(AnalyzeResponse, PdfLink, ErrorResponse)
    ),
    tags(
        (name = "NutriFit AI API", description = "Analyze recorded dietician calls into structured health reports.")
    )
)]
pub struct ApiDoc;

/// Error half of every JSON handler result.
pub type HandlerError = (StatusCode, Json<ErrorResponse>);

fn handler_error(status: StatusCode, body: ErrorResponse) -> HandlerError {
    (status, Json(body))
}

/// Maps pipeline failures onto HTTP statuses.
pub fn analysis_error_response(err: AnalysisError) -> HandlerError {
    match err {
        AnalysisError::EmptyUpload => handler_error(
            StatusCode::BAD_REQUEST,
            ErrorResponse::new("No file selected"),
        ),
        AnalysisError::Gateway(e) => handler_error(
            StatusCode::BAD_GATEWAY,
            ErrorResponse::new("Failed to analyze the recording with the model")
                .with_detail(e.to_string()),
        ),
        AnalysisError::NoJson { raw_text } => handler_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorResponse::new("Could not extract a JSON report from the model response")
                .with_raw_text(raw_text),
        ),
    }
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Analyze an uploaded call recording.
///
/// Accepts a multipart/form-data request with an `audio` file part (mp3, wav, m4a).
/// The PDF is best-effort: when it cannot be produced the response still succeeds and
/// `pdf.status` is `failed`.
#[utoipa::path(
    post,
    path = "/api/analyze",
    request_body(content_type = "multipart/form-data", description = "The recording, in a part named `audio`."),
    responses(
        (status = 200, description = "Recording analyzed", body = AnalyzeResponse),
        (status = 400, description = "Missing file or empty file name", body = ErrorResponse),
        (status = 500, description = "The model answer held no JSON report; includes the raw text", body = ErrorResponse),
        (status = 502, description = "The model call failed", body = ErrorResponse)
    )
)]
pub async fn analyze_handler(
    State(app_state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<AnalyzeResponse>, HandlerError> {
    let upload = read_audio_upload(&mut multipart)
        .await
        .map_err(|e| {
            warn!("Failed to read multipart data: {}", e);
            handler_error(
                e.status(),
                ErrorResponse::new("Failed to read multipart data").with_detail(e.body_text()),
            )
        })?
        .ok_or_else(|| {
            handler_error(
                StatusCode::BAD_REQUEST,
                ErrorResponse::new("Please upload a file"),
            )
        })?;

    let outcome = app_state
        .analysis
        .analyze(&upload)
        .await
        .map_err(|e| {
            error!("Analysis of {:?} failed: {}", upload.file_name, e);
            analysis_error_response(e)
        })?;

    Ok(Json(AnalyzeResponse::from_outcome(outcome)))
}

/// Download a previously generated report as an attachment.
#[utoipa::path(
    get,
    path = "/reports/{file_name}",
    params(
        ("file_name" = String, Path, description = "File name returned in `pdf.file_name`.")
    ),
    responses(
        (status = 200, description = "The PDF file (application/pdf attachment)"),
        (status = 400, description = "Not a report file name", body = ErrorResponse),
        (status = 404, description = "No such report", body = ErrorResponse)
    )
)]
pub async fn download_report_handler(
    State(app_state): State<Arc<AppState>>,
    Path(file_name): Path<String>,
) -> Result<impl IntoResponse, HandlerError> {
    let path = app_state.reports.resolve(&file_name).ok_or_else(|| {
        handler_error(
            StatusCode::BAD_REQUEST,
            ErrorResponse::new("Invalid report file name"),
        )
    })?;

    let file = tokio::fs::File::open(&path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            handler_error(StatusCode::NOT_FOUND, ErrorResponse::new("Report not found"))
        } else {
            error!("Failed to open report {}: {:?}", path.display(), e);
            handler_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse::new("Failed to read report"),
            )
        }
    })?;

    info!(file_name = %file_name, "Serving report");
    let headers = [
        (header::CONTENT_TYPE, "application/pdf".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", file_name),
        ),
    ];
    Ok((headers, Body::from_stream(ReaderStream::new(file))))
}

/// Liveness probe.
pub async fn health_handler() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}
