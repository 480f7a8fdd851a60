//! crates/nutrifit_core/src/extraction.rs
//!
//! Locates and parses a JSON object embedded in free-form model output.
//!
//! The model is told to put its JSON first, but it regularly wraps the object in
//! prose or code fences. Extraction tries, in order:
//!
//! 1. the shortest strictly valid object starting at the first `{`;
//! 2. the first match of a pattern that tolerates one level of nested braces.
//!
//! Whatever is not consumed as JSON is returned as the remainder, which becomes the
//! human-readable body of the report.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::debug;

/// Outer braces around plain text or at most one balanced inner `{...}`.
static ONE_LEVEL_OBJECT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{(?:[^{}]|\{[^{}]*\})*\}").expect("object pattern is a valid regex")
});

/// The outcome of scanning model output for a JSON object.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    /// The parsed object, or `None` when no JSON object could be found.
    pub object: Option<Map<String, Value>>,
    /// The text that was not part of the object, trimmed. Equal to the input when
    /// nothing was found.
    pub remainder: String,
}

impl Extraction {
    fn not_found(text: &str) -> Self {
        Self {
            object: None,
            remainder: text.to_string(),
        }
    }

    fn found(object: Map<String, Value>, text: &str, start: usize, end: usize) -> Self {
        let remainder = format!("{}{}", &text[..start], &text[end..]);
        Self {
            object: Some(object),
            remainder: remainder.trim().to_string(),
        }
    }

    pub fn is_found(&self) -> bool {
        self.object.is_some()
    }
}

/// Extracts the first JSON object from `text`.
///
/// The progressive scan is quadratic in the length of the text after the first
/// brace, which is fine for report-sized answers.
pub fn extract_json(text: &str) -> Extraction {
    let Some(start) = text.find('{') else {
        return Extraction::not_found(text);
    };

    if let Some((object, end)) = shortest_object_from(text, start) {
        return Extraction::found(object, text, start, end);
    }

    if let Some(candidate) = ONE_LEVEL_OBJECT.find(text) {
        match serde_json::from_str::<Map<String, Value>>(candidate.as_str()) {
            Ok(object) => {
                debug!(
                    start = candidate.start(),
                    end = candidate.end(),
                    "JSON recovered by the nested-brace fallback"
                );
                return Extraction::found(object, text, candidate.start(), candidate.end());
            }
            Err(e) => debug!("Fallback candidate is not valid JSON: {}", e),
        }
    }

    Extraction::not_found(text)
}

/// Widens the candidate span one character at a time and returns the first prefix
/// that parses, together with its exclusive end offset.
///
/// A complete object always ends with `}`, so only those positions are parsed.
fn shortest_object_from(text: &str, start: usize) -> Option<(Map<String, Value>, usize)> {
    text[start..]
        .char_indices()
        .filter(|&(_, c)| c == '}')
        .map(|(offset, _)| start + offset + 1)
        .find_map(|end| {
            serde_json::from_str::<Map<String, Value>>(&text[start..end])
                .ok()
                .map(|object| (object, end))
        })
}
