//! Persisted record types and their codec.
//!
//! Every pipeline stage reads exclusively from the previous stage's durable
//! output, so these types are the contract between stages: a batch run
//! persists [`InteractionRecord`]s, the judge persists [`AssessmentRecord`]s,
//! and the report builder consumes either as raw JSON documents.

pub mod codec;
pub mod extract;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::StoreError;

/// Suffix appended to a cohort tag when its records are judged.
pub const ASSESS_SUFFIX: &str = "_assess";

/// One row of ground truth for one (prompt, model, mode) execution.
///
/// Immutable once persisted. The `cohort_tag` is assigned by the batch run
/// that produced the record and never mutated; downstream stages key off it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionRecord {
    /// Explicit record identifier carried into assessments. Earlier data
    /// lacked this field, so it defaults to empty on decode.
    #[serde(default)]
    pub record_id: String,
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub response: String,
    /// Opaque model identifier that produced the response.
    #[serde(default)]
    pub model: String,
    /// Mode tag: which context-building strategy fed the prompt.
    #[serde(default)]
    pub bot_type: String,
    #[serde(default)]
    pub cohort_tag: String,
    /// Human-readable wall-clock duration of the provider call.
    #[serde(default)]
    pub time_to_run: String,
}

impl InteractionRecord {
    /// Creates a record with a fresh identifier.
    pub fn new(
        question: impl Into<String>,
        response: impl Into<String>,
        model: impl Into<String>,
        bot_type: impl Into<String>,
        cohort_tag: impl Into<String>,
        time_to_run: impl Into<String>,
    ) -> Self {
        Self {
            record_id: Uuid::new_v4().to_string(),
            question: question.into(),
            response: response.into(),
            model: model.into(),
            bot_type: bot_type.into(),
            cohort_tag: cohort_tag.into(),
            time_to_run: time_to_run.into(),
        }
    }

    /// Serializes the record to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, StoreError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserializes a record from a persisted JSON document.
    ///
    /// Tolerant of missing fields: absent keys decode as empty strings so a
    /// scan over heterogeneous storage can still filter on `cohort_tag`.
    pub fn from_json(text: &str) -> Result<Self, StoreError> {
        Ok(serde_json::from_str(text)?)
    }
}

/// A scored evaluation of one [`InteractionRecord`].
///
/// Linked to its source both by the shared pre-suffix cohort tag and, when
/// the source carried one, by `source_record_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentRecord {
    /// Identifier of the judged record, when the source record carried one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_record_id: Option<String>,
    /// The response text that was judged.
    #[serde(default)]
    pub assessed_response: String,
    /// Model that produced the judged response.
    #[serde(default)]
    pub response_model: String,
    /// Judge model that produced the score.
    #[serde(default)]
    pub assess_model: String,
    /// Wall-clock duration of the original generation.
    #[serde(default)]
    pub runtime: String,
    #[serde(default)]
    pub bot_type: String,
    /// Source cohort tag with [`ASSESS_SUFFIX`] appended.
    #[serde(default)]
    pub cohort_tag: String,
    /// Structured-or-text scoring payload from the judge model.
    #[serde(default)]
    pub response: Value,
}

impl AssessmentRecord {
    /// Serializes the record to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, StoreError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserializes a record from a persisted JSON document.
    pub fn from_json(text: &str) -> Result<Self, StoreError> {
        Ok(serde_json::from_str(text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interaction_record_roundtrip() {
        let record = InteractionRecord::new(
            "How do I renew my license?",
            "Visit dol.wa.gov",
            "us.amazon.nova-pro-v1:0",
            "KB-Website",
            "prompts_small_run01",
            "Elapsed time: 1.2345 seconds",
        );
        assert!(!record.record_id.is_empty());

        let json = record.to_json().expect("serialize");
        let parsed = InteractionRecord::from_json(&json).expect("deserialize");
        assert_eq!(parsed.record_id, record.record_id);
        assert_eq!(parsed.question, record.question);
        assert_eq!(parsed.cohort_tag, "prompts_small_run01");
    }

    #[test]
    fn test_interaction_record_tolerates_missing_fields() {
        let parsed =
            InteractionRecord::from_json(r#"{"cohort_tag": "legacy_run"}"#).expect("deserialize");
        assert_eq!(parsed.cohort_tag, "legacy_run");
        assert_eq!(parsed.record_id, "");
        assert_eq!(parsed.question, "");
    }

    #[test]
    fn test_assessment_record_structured_payload() {
        let record = AssessmentRecord {
            source_record_id: Some("abc-123".to_string()),
            assessed_response: "Visit dol.wa.gov".to_string(),
            response_model: "gpt-4o".to_string(),
            assess_model: "us.anthropic.claude-3-5-sonnet-20241022-v2:0".to_string(),
            runtime: "Elapsed time: 1.0 seconds".to_string(),
            bot_type: "assess".to_string(),
            cohort_tag: format!("run01{ASSESS_SUFFIX}"),
            response: serde_json::json!({"scores": {"accuracy": 4}}),
        };

        let json = record.to_json().expect("serialize");
        let parsed = AssessmentRecord::from_json(&json).expect("deserialize");
        assert_eq!(parsed.cohort_tag, "run01_assess");
        assert_eq!(parsed.response["scores"]["accuracy"], 4);
        assert_eq!(parsed.source_record_id.as_deref(), Some("abc-123"));
    }

    #[test]
    fn test_assessment_record_omits_absent_source_id() {
        let record = AssessmentRecord {
            source_record_id: None,
            assessed_response: String::new(),
            response_model: String::new(),
            assess_model: String::new(),
            runtime: String::new(),
            bot_type: String::new(),
            cohort_tag: String::new(),
            response: Value::Null,
        };
        let json = record.to_json().expect("serialize");
        assert!(!json.contains("source_record_id"));
    }
}
