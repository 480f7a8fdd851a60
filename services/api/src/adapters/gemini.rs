//! services/api/src/adapters/gemini.rs
//!
//! This module contains the adapter for Google's Gemini `generateContent` API.
//! It implements the `ModelGateway` port from the `core` crate, sending the audio
//! inline (base64) next to the prompt in a single user turn.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use nutrifit_core::ports::{ModelGateway, PortError, PortResult};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the `ModelGateway` port over the Gemini REST API.
#[derive(Clone)]
pub struct GeminiGateway {
    client: Client,
    api_base: String,
    api_key: String,
    model: String,
}

impl GeminiGateway {
    /// Creates a new `GeminiGateway`.
    pub fn new(client: Client, api_base: String, api_key: String, model: String) -> Self {
        Self {
            client,
            api_base,
            api_key,
            model,
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.api_base.trim_end_matches('/'),
            self.model
        )
    }
}

//=========================================================================================
// Wire Types
//=========================================================================================

#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Text { text: &'a str },
    Inline { inline_data: InlineData<'a> },
}

#[derive(Serialize)]
struct InlineData<'a> {
    mime_type: &'a str,
    data: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Deserialize, Debug)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize, Debug)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

fn build_request<'a>(audio: &[u8], mime_type: &'a str, prompt: &'a str) -> GenerateContentRequest<'a> {
    GenerateContentRequest {
        contents: vec![Content {
            role: "user",
            parts: vec![
                Part::Text { text: prompt },
                Part::Inline {
                    inline_data: InlineData {
                        mime_type,
                        data: STANDARD.encode(audio),
                    },
                },
            ],
        }],
    }
}

/// Joins the text parts of the first candidate.
fn response_text(response: GenerateContentResponse) -> PortResult<String> {
    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(PortError::Upstream(format!(
            "Gemini blocked the request: {}",
            reason
        )));
    }

    let candidate = response.candidates.into_iter().next().ok_or_else(|| {
        PortError::Upstream("Gemini returned no candidates in its response.".to_string())
    })?;
    let finish_reason = candidate.finish_reason.unwrap_or_default();

    let text: String = candidate
        .content
        .map(|content| content.parts)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|part| part.text)
        .collect();

    if text.is_empty() {
        return Err(PortError::Upstream(format!(
            "Gemini response contained no text content (finish reason: {}).",
            if finish_reason.is_empty() { "unknown" } else { finish_reason.as_str() }
        )));
    }
    Ok(text)
}

//=========================================================================================
// `ModelGateway` Trait Implementation
//=========================================================================================

#[async_trait]
impl ModelGateway for GeminiGateway {
    /// Sends the recording and prompt to Gemini and returns the generated text.
    async fn generate(&self, audio: &[u8], mime_type: &str, prompt: &str) -> PortResult<String> {
        let request = build_request(audio, mime_type, prompt);

        debug!(model = %self.model, "Calling Gemini generateContent");
        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| PortError::Upstream(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PortError::Upstream(format!(
                "Gemini returned {}: {}",
                status, body
            )));
        }

        let parsed = response
            .json::<GenerateContentResponse>()
            .await
            .map_err(|e| PortError::Upstream(format!("Malformed Gemini response: {}", e)))?;

        response_text(parsed)
    }
}
