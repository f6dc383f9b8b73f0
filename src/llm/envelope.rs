//! Request envelopes for foundation-model invocations.
//!
//! The two known wire shapes carry the same content: a system prompt, one
//! user message, and deterministic sampling parameters. Nova nests message
//! content in `[{"text": ...}]` blocks; the Anthropic shape uses a flat
//! content string and carries an `anthropic_version` marker.

use serde::Serialize;
use serde_json::Value;

use crate::error::LlmError;

const SYSTEM_PROMPT: &str = "You are a helpful AI assistant.";
const MAX_TOKENS: u32 = 2000;

/// Generic chat envelope for Nova-family models.
#[derive(Debug, Serialize)]
pub struct NovaRequest {
    messages: Vec<NovaMessage>,
    system: Vec<NovaText>,
    #[serde(rename = "inferenceConfig")]
    inference_config: NovaInferenceConfig,
}

#[derive(Debug, Serialize)]
struct NovaMessage {
    role: String,
    content: Vec<NovaText>,
}

#[derive(Debug, Serialize)]
struct NovaText {
    text: String,
}

#[derive(Debug, Serialize)]
struct NovaInferenceConfig {
    #[serde(rename = "maxTokens")]
    max_tokens: u32,
    temperature: f64,
    #[serde(rename = "topP")]
    top_p: f64,
    #[serde(rename = "topK")]
    top_k: u32,
}

impl NovaRequest {
    /// Builds a single-turn user request with deterministic sampling.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![NovaMessage {
                role: "user".to_string(),
                content: vec![NovaText {
                    text: prompt.into(),
                }],
            }],
            system: vec![NovaText {
                text: SYSTEM_PROMPT.to_string(),
            }],
            inference_config: NovaInferenceConfig {
                max_tokens: MAX_TOKENS,
                temperature: 0.0,
                top_p: 1.0,
                top_k: 50,
            },
        }
    }

    pub fn to_value(&self) -> Result<Value, LlmError> {
        serde_json::to_value(self).map_err(|e| LlmError::ParseError(e.to_string()))
    }
}

/// Anthropic envelope for Claude-family models on the same endpoint.
#[derive(Debug, Serialize)]
pub struct ClaudeRequest {
    anthropic_version: String,
    max_tokens: u32,
    messages: Vec<ClaudeMessage>,
    system: String,
    temperature: f64,
    top_p: f64,
    top_k: u32,
}

#[derive(Debug, Serialize)]
struct ClaudeMessage {
    role: String,
    content: String,
}

impl ClaudeRequest {
    /// Builds a single-turn user request with deterministic sampling.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            anthropic_version: "bedrock-2023-05-31".to_string(),
            max_tokens: MAX_TOKENS,
            messages: vec![ClaudeMessage {
                role: "user".to_string(),
                content: prompt.into(),
            }],
            system: SYSTEM_PROMPT.to_string(),
            temperature: 0.0,
            top_p: 1.0,
            top_k: 50,
        }
    }

    pub fn to_value(&self) -> Result<Value, LlmError> {
        serde_json::to_value(self).map_err(|e| LlmError::ParseError(e.to_string()))
    }
}

/// Extracts the output text from a Nova response envelope
/// (`output.message.content[0].text`).
pub fn nova_output_text(response: &Value) -> Result<String, LlmError> {
    response
        .pointer("/output/message/content/0/text")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| {
            LlmError::ParseError("Nova response missing output.message.content[0].text".to_string())
        })
}

/// Extracts the output text from a Claude response envelope
/// (`content[0].text`).
pub fn claude_output_text(response: &Value) -> Result<String, LlmError> {
    response
        .pointer("/content/0/text")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| LlmError::ParseError("Claude response missing content[0].text".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nova_request_shape() {
        let body = NovaRequest::new("hello").to_value().expect("to_value");

        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"][0]["text"], "hello");
        assert_eq!(body["system"][0]["text"], SYSTEM_PROMPT);
        assert_eq!(body["inferenceConfig"]["maxTokens"], 2000);
        assert_eq!(body["inferenceConfig"]["topK"], 50);
    }

    #[test]
    fn test_claude_request_shape() {
        let body = ClaudeRequest::new("hello").to_value().expect("to_value");

        assert_eq!(body["anthropic_version"], "bedrock-2023-05-31");
        assert_eq!(body["messages"][0]["content"], "hello");
        assert_eq!(body["system"], SYSTEM_PROMPT);
        assert_eq!(body["max_tokens"], 2000);
    }

    #[test]
    fn test_nova_output_text() {
        let response = json!({
            "output": {"message": {"content": [{"text": "answer"}]}}
        });
        assert_eq!(nova_output_text(&response).expect("text"), "answer");

        let err = nova_output_text(&json!({"output": {}})).unwrap_err();
        assert!(matches!(err, LlmError::ParseError(_)));
    }

    #[test]
    fn test_claude_output_text() {
        let response = json!({"content": [{"text": "answer"}]});
        assert_eq!(claude_output_text(&response).expect("text"), "answer");

        assert!(claude_output_text(&json!({"content": []})).is_err());
    }
}
