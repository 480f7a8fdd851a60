//! crates/nutrifit_core/src/analysis.rs
//!
//! The request pipeline: upload → model gateway → JSON extraction → schema check →
//! layout → PDF renderer. One sequential pass per recording; the gateway and renderer
//! are injected so the whole flow can run against fakes.

use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::domain::{AnalysisReport, AudioUpload, PdfOutcome};
use crate::extraction::extract_json;
use crate::layout::{layout_report, layout_text, PageGeometry, ReportLayout};
use crate::ports::{ModelGateway, PortError, ReportRenderer};
use crate::validation;

//=========================================================================================
// Errors and outcomes
//=========================================================================================

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    /// The upload carried an empty file name. The model is never called.
    #[error("No file selected")]
    EmptyUpload,

    #[error("Model call failed: {0}")]
    Gateway(#[source] PortError),

    /// The model answered but no JSON object could be extracted.
    #[error("Could not extract a JSON report from the model response")]
    NoJson { raw_text: String },
}

/// Everything produced for one structured analysis.
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    /// The extracted object, possibly carrying the `_warning` marker.
    pub report: Map<String, Value>,
    /// Model text that was not part of the JSON object.
    pub remainder: String,
    pub raw_text: String,
    pub schema_complete: bool,
    pub pdf: PdfOutcome,
}

/// Result of the unstructured path: the model text as-is plus its PDF.
#[derive(Debug, Clone)]
pub struct RawAnalysis {
    pub text: String,
    pub pdf: PdfOutcome,
}

//=========================================================================================
// AnalysisService
//=========================================================================================

pub struct AnalysisService {
    gateway: Arc<dyn ModelGateway>,
    renderer: Arc<dyn ReportRenderer>,
    prompt: String,
}

impl AnalysisService {
    pub fn new(
        gateway: Arc<dyn ModelGateway>,
        renderer: Arc<dyn ReportRenderer>,
        prompt: impl Into<String>,
    ) -> Self {
        Self {
            gateway,
            renderer,
            prompt: prompt.into(),
        }
    }

    /// Runs the structured pipeline for one recording.
    ///
    /// Validation problems are annotated on the report and rendering failures are
    /// reported through `PdfOutcome::Failed`; neither fails the call.
    pub async fn analyze(&self, upload: &AudioUpload) -> Result<AnalysisOutcome, AnalysisError> {
        let raw_text = self.call_model(upload).await?;

        let extraction = extract_json(&raw_text);
        let Some(mut report) = extraction.object else {
            warn!(
                response_len = raw_text.len(),
                "No JSON object found in the model response"
            );
            return Err(AnalysisError::NoJson { raw_text });
        };

        let schema_complete = validation::annotate_missing_keys(&mut report);
        if !schema_complete {
            warn!(
                missing = ?validation::missing_keys(&report),
                "Model response is missing expected keys"
            );
        }

        let layout = match AnalysisReport::from_object(&report) {
            Ok(typed) => layout_report(&typed, PageGeometry::default()),
            Err(e) => {
                warn!("Report does not fit the expected shape, rendering raw text: {}", e);
                layout_text(&raw_text, PageGeometry::default())
            }
        };
        let pdf = self.render(layout).await;

        Ok(AnalysisOutcome {
            report,
            remainder: extraction.remainder,
            raw_text,
            schema_complete,
            pdf,
        })
    }

    /// Runs the unstructured pipeline: the trimmed model text is drawn line by line.
    pub async fn analyze_raw(&self, upload: &AudioUpload) -> Result<RawAnalysis, AnalysisError> {
        let text = self.call_model(upload).await?.trim().to_string();
        let pdf = self.render(layout_text(&text, PageGeometry::default())).await;
        Ok(RawAnalysis { text, pdf })
    }

    async fn call_model(&self, upload: &AudioUpload) -> Result<String, AnalysisError> {
        if upload.file_name.is_empty() {
            return Err(AnalysisError::EmptyUpload);
        }

        info!(
            file_name = %upload.file_name,
            mime_type = %upload.mime_type,
            bytes = upload.data.len(),
            "Sending recording to the model"
        );
        self.gateway
            .generate(&upload.data, &upload.mime_type, &self.prompt)
            .await
            .map_err(|e| {
                error!("Model call failed: {:?}", e);
                AnalysisError::Gateway(e)
            })
    }

    /// Drawing and writing the PDF is blocking work, so it runs on the blocking pool.
    async fn render(&self, layout: ReportLayout) -> PdfOutcome {
        let renderer = Arc::clone(&self.renderer);
        let pages = layout.page_count();

        let reason = match tokio::task::spawn_blocking(move || renderer.render(&layout)).await {
            Ok(Ok(pdf)) => {
                info!(file_name = %pdf.file_name, pages, "PDF report written");
                return PdfOutcome::Ready(pdf);
            }
            Ok(Err(e)) => e.to_string(),
            Err(e) => format!("Render task failed: {}", e),
        };

        warn!("PDF generation failed, continuing without it: {}", reason);
        PdfOutcome::Failed { reason }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::GeneratedPdf;
    use crate::layout::{RAW_REPORT_TITLE, REPORT_TITLE};
    use crate::ports::PortResult;
    use crate::prompt::ANALYSIS_PROMPT;
    use async_trait::async_trait;
    use bytes::Bytes;
    use serde_json::json;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    struct FakeGateway {
        answer: Result<String, String>,
        calls: AtomicUsize,
        seen: Mutex<Vec<(usize, String, String)>>,
    }

    impl FakeGateway {
        fn answering(text: &str) -> Arc<Self> {
            Arc::new(Self {
                answer: Ok(text.to_string()),
                calls: AtomicUsize::new(0),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn failing(reason: &str) -> Arc<Self> {
            Arc::new(Self {
                answer: Err(reason.to_string()),
                calls: AtomicUsize::new(0),
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl ModelGateway for FakeGateway {
        async fn generate(&self, audio: &[u8], mime_type: &str, prompt: &str) -> PortResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen
                .lock()
                .unwrap()
                .push((audio.len(), mime_type.to_string(), prompt.to_string()));
            self.answer.clone().map_err(PortError::Upstream)
        }
    }

    #[derive(Default)]
    struct FakeRenderer {
        fail: bool,
        layouts: Mutex<Vec<ReportLayout>>,
    }

    impl ReportRenderer for FakeRenderer {
        fn render(&self, layout: &ReportLayout) -> PortResult<GeneratedPdf> {
            self.layouts.lock().unwrap().push(layout.clone());
            if self.fail {
                return Err(PortError::Render("disk full".to_string()));
            }
            Ok(GeneratedPdf {
                file_name: "nutrifit_report_test.pdf".to_string(),
                path: PathBuf::from("reports/nutrifit_report_test.pdf"),
            })
        }
    }

    fn upload(file_name: &str) -> AudioUpload {
        AudioUpload {
            file_name: file_name.to_string(),
            mime_type: "audio/mpeg".to_string(),
            data: Bytes::from_static(b"ID3fake-mp3"),
        }
    }

    fn service(gateway: Arc<FakeGateway>, renderer: Arc<FakeRenderer>) -> AnalysisService {
        AnalysisService::new(gateway, renderer, ANALYSIS_PROMPT)
    }

    #[tokio::test]
    async fn structured_answer_produces_report_remainder_and_pdf() {
        let gateway = FakeGateway::answering(
            r#"Here is the result: {"transcript":"hi","summary":"ok","personalized_nutrition":{}} done"#,
        );
        let renderer = Arc::new(FakeRenderer::default());
        let outcome = service(gateway.clone(), renderer.clone())
            .analyze(&upload("call.mp3"))
            .await
            .unwrap();

        assert_eq!(
            Value::Object(outcome.report),
            json!({"transcript": "hi", "summary": "ok", "personalized_nutrition": {}})
        );
        assert_eq!(outcome.remainder, "Here is the result:  done");
        assert!(outcome.schema_complete);
        assert_eq!(outcome.pdf.file_name(), Some("nutrifit_report_test.pdf"));

        let seen = gateway.seen.lock().unwrap();
        assert_eq!(seen[0], (11, "audio/mpeg".to_string(), ANALYSIS_PROMPT.to_string()));
        assert_eq!(renderer.layouts.lock().unwrap()[0].title, REPORT_TITLE);
    }

    #[tokio::test]
    async fn empty_file_name_never_reaches_the_model() {
        let gateway = FakeGateway::answering("{}");
        let renderer = Arc::new(FakeRenderer::default());
        let result = service(gateway.clone(), renderer.clone())
            .analyze(&upload(""))
            .await;

        assert!(matches!(result, Err(AnalysisError::EmptyUpload)));
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 0);
        assert!(renderer.layouts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn gateway_failure_is_wrapped_and_nothing_is_rendered() {
        let gateway = FakeGateway::failing("connection reset by peer");
        let renderer = Arc::new(FakeRenderer::default());
        let err = service(gateway, renderer.clone())
            .analyze(&upload("call.wav"))
            .await
            .unwrap_err();

        assert!(matches!(err, AnalysisError::Gateway(_)));
        assert!(err.to_string().contains("connection reset by peer"));
        assert!(renderer.layouts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn answer_without_json_keeps_the_raw_text() {
        let gateway = FakeGateway::answering("**1. Conversation Transcript**\nNo JSON today.");
        let renderer = Arc::new(FakeRenderer::default());
        let err = service(gateway, renderer.clone())
            .analyze(&upload("call.m4a"))
            .await
            .unwrap_err();

        match err {
            AnalysisError::NoJson { raw_text } => {
                assert_eq!(raw_text, "**1. Conversation Transcript**\nNo JSON today.")
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(renderer.layouts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_keys_are_annotated_and_processing_continues() {
        let gateway = FakeGateway::answering(r#"{"summary": "partial"}"#);
        let renderer = Arc::new(FakeRenderer::default());
        let outcome = service(gateway, renderer)
            .analyze(&upload("call.mp3"))
            .await
            .unwrap();

        assert!(!outcome.schema_complete);
        assert_eq!(
            outcome.report[validation::WARNING_KEY],
            json!(validation::MISSING_KEYS_WARNING)
        );
        assert!(matches!(outcome.pdf, PdfOutcome::Ready(_)));
    }

    #[tokio::test]
    async fn render_failure_degrades_to_failed_pdf() {
        let gateway = FakeGateway::answering(
            r#"{"transcript":"t","summary":"s","personalized_nutrition":null}"#,
        );
        let renderer = Arc::new(FakeRenderer {
            fail: true,
            ..FakeRenderer::default()
        });
        let outcome = service(gateway, renderer)
            .analyze(&upload("call.mp3"))
            .await
            .unwrap();

        assert_eq!(
            outcome.pdf,
            PdfOutcome::Failed {
                reason: "Rendering failed: disk full".to_string()
            }
        );
        assert_eq!(outcome.report["summary"], json!("s"));
    }

    #[tokio::test]
    async fn ill_shaped_report_is_rendered_as_raw_text() {
        let gateway = FakeGateway::answering(
            r#"{"transcript":"t","summary":"s","personalized_nutrition":{},"suggested_improvements":"not a list"}"#,
        );
        let renderer = Arc::new(FakeRenderer::default());
        let outcome = service(gateway, renderer.clone())
            .analyze(&upload("call.mp3"))
            .await
            .unwrap();

        assert!(outcome.schema_complete);
        assert_eq!(renderer.layouts.lock().unwrap()[0].title, RAW_REPORT_TITLE);
    }

    /// Blocks its thread the way drawing and writing a real PDF does.
    struct SlowRenderer {
        delay: Duration,
    }

    impl ReportRenderer for SlowRenderer {
        fn render(&self, _layout: &ReportLayout) -> PortResult<GeneratedPdf> {
            std::thread::sleep(self.delay);
            Ok(GeneratedPdf {
                file_name: "nutrifit_report_slow.pdf".to_string(),
                path: PathBuf::from("reports/nutrifit_report_slow.pdf"),
            })
        }
    }

    struct PanickingRenderer;

    impl ReportRenderer for PanickingRenderer {
        fn render(&self, _layout: &ReportLayout) -> PortResult<GeneratedPdf> {
            panic!("font table corrupted");
        }
    }

    #[tokio::test]
    async fn slow_render_does_not_stall_other_tasks() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let ticker = {
            let ticks = Arc::clone(&ticks);
            tokio::spawn(async move {
                loop {
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    ticks.fetch_add(1, Ordering::SeqCst);
                }
            })
        };

        let gateway = FakeGateway::answering(
            r#"{"transcript":"t","summary":"s","personalized_nutrition":{}}"#,
        );
        let renderer = Arc::new(SlowRenderer {
            delay: Duration::from_millis(300),
        });
        let outcome = AnalysisService::new(gateway, renderer, ANALYSIS_PROMPT)
            .analyze(&upload("call.mp3"))
            .await
            .unwrap();
        ticker.abort();

        assert_eq!(outcome.pdf.file_name(), Some("nutrifit_report_slow.pdf"));
        let ticks = ticks.load(Ordering::SeqCst);
        assert!(ticks >= 5, "only {} ticks while rendering", ticks);
    }

    #[tokio::test]
    async fn panicking_renderer_degrades_to_failed_pdf() {
        let gateway = FakeGateway::answering("Plain text answer");
        let raw = AnalysisService::new(gateway, Arc::new(PanickingRenderer), ANALYSIS_PROMPT)
            .analyze_raw(&upload("call.mp3"))
            .await
            .unwrap();

        assert_eq!(raw.text, "Plain text answer");
        match raw.pdf {
            PdfOutcome::Failed { reason } => assert!(reason.starts_with("Render task failed")),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn raw_analysis_trims_and_renders_the_text() {
        let gateway = FakeGateway::answering("\n  Line one\nLine two  \n");
        let renderer = Arc::new(FakeRenderer::default());
        let raw = service(gateway, renderer.clone())
            .analyze_raw(&upload("call.mp3"))
            .await
            .unwrap();

        assert_eq!(raw.text, "Line one\nLine two");
        let layouts = renderer.layouts.lock().unwrap();
        let lines: Vec<&str> = layouts[0].lines().map(|line| line.text.as_str()).collect();
        assert_eq!(lines, vec!["Line one", "Line two"]);
    }
}
