//! services/api/src/web/page.rs
//!
//! A single HTML page: an upload form that shows the analysis of the submitted
//! recording underneath it. Every piece of model output is escaped before it is
//! written into the page.

use crate::web::protocol::REPORTS_ROUTE;
use crate::web::state::AppState;
use crate::web::upload::read_audio_upload;
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::Html,
};
use nutrifit_core::{validation, AnalysisError, AnalysisOutcome, PdfOutcome};
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::{error, warn};

const PAGE_HEAD: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>NutriFit AI - Voice Call Analyzer</title>
<style>
body { font-family: sans-serif; max-width: 52rem; margin: 2rem auto; padding: 0 1rem; }
pre { white-space: pre-wrap; background: #f5f5f5; padding: 1rem; }
.warning { color: #a15c00; }
.error { color: #b00020; }
</style>
</head>
<body>
<h1>NutriFit AI - Voice Call Analyzer</h1>
<p>Upload a health consultation recording to generate a structured report.</p>
<form method="post" enctype="multipart/form-data">
<input type="file" name="audio" accept=".mp3,.wav,.m4a,audio/*">
<button type="submit">Analyze</button>
</form>
"#;

const PAGE_TAIL: &str = "</body>\n</html>\n";

/// What to show below the form.
enum PageResult {
    Warning(String),
    Error { message: String, detail: String },
    Raw(String),
    Report(Box<AnalysisOutcome>),
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn render_page(result: Option<&PageResult>) -> String {
    let mut page = String::from(PAGE_HEAD);

    match result {
        None => {}
        Some(PageResult::Warning(message)) => {
            let _ = writeln!(page, "<p class=\"warning\">&#9888; {}</p>", escape_html(message));
        }
        Some(PageResult::Error { message, detail }) => {
            let _ = writeln!(
                page,
                "<p class=\"error\">{}</p>\n<pre>{}</pre>",
                escape_html(message),
                escape_html(detail)
            );
        }
        Some(PageResult::Raw(text)) => {
            let _ = writeln!(page, "<h2>Analysis</h2>\n<pre>{}</pre>", escape_html(text));
        }
        Some(PageResult::Report(outcome)) => render_report(&mut page, outcome),
    }

    page.push_str(PAGE_TAIL);
    page
}

fn render_report(page: &mut String, outcome: &AnalysisOutcome) {
    page.push_str("<h2>Analysis complete</h2>\n");

    if !outcome.schema_complete {
        let _ = writeln!(
            page,
            "<p class=\"warning\">&#9888; {}</p>",
            escape_html(validation::MISSING_KEYS_WARNING)
        );
    }

    match &outcome.pdf {
        PdfOutcome::Ready(pdf) => {
            let _ = writeln!(
                page,
                "<p><a href=\"{}/{}\">Download Structured Health Report (PDF)</a></p>",
                REPORTS_ROUTE,
                escape_html(&pdf.file_name)
            );
        }
        PdfOutcome::Failed { reason } => {
            let _ = writeln!(
                page,
                "<p class=\"warning\">PDF unavailable: {}</p>",
                escape_html(reason)
            );
        }
    }

    if let Some(summary) = outcome.report.get("summary").and_then(|v| v.as_str()) {
        let _ = writeln!(page, "<h3>Summary</h3>\n<pre>{}</pre>", escape_html(summary));
    }
    if !outcome.remainder.is_empty() {
        let _ = writeln!(page, "<h3>Report</h3>\n<pre>{}</pre>", escape_html(&outcome.remainder));
    }

    let json = serde_json::to_string_pretty(&outcome.report).unwrap_or_default();
    let _ = writeln!(
        page,
        "<details><summary>Structured data</summary>\n<pre>{}</pre></details>",
        escape_html(&json)
    );
}

//=========================================================================================
// Handlers
//=========================================================================================

/// GET / - The upload form.
pub async fn index_page() -> Html<String> {
    Html(render_page(None))
}

/// POST / - Analyze the submitted recording and show the result below the form.
pub async fn analyze_page(
    State(app_state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> (StatusCode, Html<String>) {
    let upload = match read_audio_upload(&mut multipart).await {
        Ok(Some(upload)) => upload,
        Ok(None) => {
            let result = PageResult::Warning("Please upload a file".to_string());
            return (StatusCode::OK, Html(render_page(Some(&result))));
        }
        Err(e) => {
            warn!("Failed to read multipart data: {}", e);
            let result = PageResult::Error {
                message: "Failed to read the uploaded file".to_string(),
                detail: e.body_text(),
            };
            return (e.status(), Html(render_page(Some(&result))));
        }
    };

    let (status, result) = match app_state.analysis.analyze(&upload).await {
        Ok(outcome) => (StatusCode::OK, PageResult::Report(Box::new(outcome))),
        Err(AnalysisError::EmptyUpload) => (
            StatusCode::OK,
            PageResult::Warning("No file selected".to_string()),
        ),
        Err(AnalysisError::NoJson { raw_text }) => {
            warn!("No JSON report in the model answer for {:?}", upload.file_name);
            (StatusCode::INTERNAL_SERVER_ERROR, PageResult::Raw(raw_text))
        }
        Err(e @ AnalysisError::Gateway(_)) => {
            error!("Analysis of {:?} failed: {}", upload.file_name, e);
            (
                StatusCode::BAD_GATEWAY,
                PageResult::Error {
                    message: "Failed to analyze the recording with the model".to_string(),
                    detail: e.to_string(),
                },
            )
        }
    };

    (status, Html(render_page(Some(&result))))
}
