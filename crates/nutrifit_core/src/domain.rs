//! crates/nutrifit_core/src/domain.rs
//!
//! Defines the core data structures for a single call analysis.
//! The report mirrors the JSON object the model is asked to emit, so it derives
//! serde traits; nothing here touches HTTP, disk or the PDF library.

use bytes::Bytes;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;

//=========================================================================================
// Upload
//=========================================================================================

/// One uploaded recording, exactly as the client declared it.
#[derive(Debug, Clone)]
pub struct AudioUpload {
    pub file_name: String,
    pub mime_type: String,
    pub data: Bytes,
}

//=========================================================================================
// AnalysisReport
//=========================================================================================

/// The structured result of analyzing one recording.
///
/// Every field tolerates a missing key or an explicit JSON `null` and falls back
/// to its empty value. Serialization never omits a field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    #[serde(default, deserialize_with = "null_as_default")]
    pub transcript: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub summary: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub key_health_concerns: Vec<EvidenceItem>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub dietary_habits: Vec<HabitItem>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub allergies_or_restrictions: Vec<EvidenceItem>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub suggested_improvements: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub personalized_nutrition: PersonalizedNutrition,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tone_emotion: ToneEmotion,
    #[serde(default, deserialize_with = "null_as_default")]
    pub follow_up_questions: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub metadata: Map<String, Value>,
}

impl AnalysisReport {
    /// Builds a typed report from an extracted JSON object.
    pub fn from_object(object: &Map<String, Value>) -> Result<Self, serde_json::Error> {
        serde_json::from_value(Value::Object(object.clone()))
    }
}

/// A finding backed by something said on the call (health concerns, allergies).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvidenceItem {
    #[serde(default, deserialize_with = "null_as_default")]
    pub label: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub evidence: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub confidence: Confidence,
}

/// An observed eating pattern.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HabitItem {
    #[serde(default, deserialize_with = "null_as_default")]
    pub label: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub details: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub confidence: Confidence,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonalizedNutrition {
    #[serde(default, deserialize_with = "text_or_number")]
    pub calorie_target: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub macro_split: MacroSplit,
    #[serde(default, deserialize_with = "null_as_default")]
    pub sample_meal_plan: Vec<String>,
    #[serde(default)]
    pub hydration_l_per_day: Option<f64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub supplements: Vec<String>,
}

/// Macro percentages. They are expected to sum to roughly 100 but this is not checked.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MacroSplit {
    #[serde(default)]
    pub protein_pct: Option<f64>,
    #[serde(default)]
    pub carb_pct: Option<f64>,
    #[serde(default)]
    pub fat_pct: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToneEmotion {
    #[serde(default, deserialize_with = "null_as_default")]
    pub primary: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub secondary: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub confidence: Confidence,
}

//=========================================================================================
// Confidence
//=========================================================================================

/// A model confidence score, always within `[0.0, 1.0]`.
///
/// Out-of-range inputs are clamped and `NaN` becomes `0.0`.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(from = "f64", into = "f64")]
pub struct Confidence(f64);

impl Confidence {
    pub fn new(value: f64) -> Self {
        if value.is_nan() {
            Self(0.0)
        } else {
            Self(value.clamp(0.0, 1.0))
        }
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl From<f64> for Confidence {
    fn from(value: f64) -> Self {
        Self::new(value)
    }
}

impl From<Confidence> for f64 {
    fn from(confidence: Confidence) -> Self {
        confidence.0
    }
}

//=========================================================================================
// Render artifacts
//=========================================================================================

/// A PDF written to the reports directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedPdf {
    pub file_name: String,
    pub path: PathBuf,
}

/// Result of the best-effort PDF step. A failure never fails the analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PdfOutcome {
    Ready(GeneratedPdf),
    Failed { reason: String },
}

impl PdfOutcome {
    pub fn file_name(&self) -> Option<&str> {
        match self {
            PdfOutcome::Ready(pdf) => Some(&pdf.file_name),
            PdfOutcome::Failed { .. } => None,
        }
    }
}

//=========================================================================================
// Serde helpers
//=========================================================================================

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// Models emit the calorie target as either "1800 kcal" or 1800.
fn text_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) => Ok(Some(text)),
        Some(Value::Number(number)) => Ok(Some(number.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected a string or number for calorie_target, got {}",
            other
        ))),
    }
}
