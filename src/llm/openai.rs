//! OpenAI-compatible chat-completion client.
//!
//! Used for the "gpt" provider family. The wire format is the standard
//! `/chat/completions` shape, so any compatible gateway works as the base.

use std::env;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::LlmError;

/// A message in a conversation with a chat-completion model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message sender (e.g., "system", "user", "assistant").
    pub role: String,
    /// Content of the message.
    pub content: String,
}

impl Message {
    /// Create a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Request for text generation from a chat-completion model.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationRequest {
    /// Model identifier to use for generation.
    pub model: String,
    /// Conversation messages.
    pub messages: Vec<Message>,
    /// Sampling temperature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Maximum number of tokens to generate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Nucleus sampling parameter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
}

impl GenerationRequest {
    /// Create a new generation request with default parameters.
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature: None,
            max_tokens: None,
            top_p: None,
        }
    }

    /// Set the temperature for this request.
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the max tokens for this request.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set the top_p for this request.
    pub fn with_top_p(mut self, top_p: f64) -> Self {
        self.top_p = Some(top_p);
        self
    }
}

/// Response from a chat-completion request.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationResponse {
    /// Model that generated this response.
    pub model: String,
    /// Generated choices/completions.
    pub choices: Vec<Choice>,
}

impl GenerationResponse {
    /// Get the content of the first choice, if available.
    pub fn first_content(&self) -> Option<&str> {
        self.choices.first().map(|c| c.message.content.as_str())
    }
}

/// A single generated choice.
#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    /// Generated message.
    pub message: Message,
    /// Reason the generation stopped (e.g., "stop", "length").
    pub finish_reason: Option<String>,
}

/// Error response from the API.
#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Trait for chat-completion responders.
#[async_trait]
pub trait ChatResponder: Send + Sync {
    /// Generate a response for the given request.
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse, LlmError>;
}

/// Client for OpenAI-compatible chat-completion APIs.
pub struct ChatCompletionsClient {
    api_base: String,
    api_key: Option<String>,
    http_client: Client,
}

impl ChatCompletionsClient {
    /// Create a new client with explicit configuration.
    pub fn new(api_base: String, api_key: Option<String>) -> Self {
        Self {
            api_base,
            api_key,
            http_client: Client::builder()
                .timeout(Duration::from_secs(120))
                .build()
                .expect("Failed to build HTTP client"),
        }
    }

    /// Create a client from environment variables.
    ///
    /// - `OPENAI_API_BASE`: base URL (defaults to "https://api.openai.com/v1")
    /// - `OPENAI_API_KEY`: API key (required)
    pub fn from_env() -> Result<Self, LlmError> {
        let api_base = env::var("OPENAI_API_BASE")
            .unwrap_or_else(|_| "https://api.openai.com/v1".to_string());
        let api_key = env::var("OPENAI_API_KEY")
            .map_err(|_| LlmError::MissingApiKey("openai".to_string()))?;
        Ok(Self::new(api_base, Some(api_key)))
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }
}

#[async_trait]
impl ChatResponder for ChatCompletionsClient {
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse, LlmError> {
        let url = format!("{}/chat/completions", self.api_base);

        let mut http_request = self
            .http_client
            .post(&url)
            .header("Content-Type", "application/json");

        if let Some(ref api_key) = self.api_key {
            http_request = http_request.header("Authorization", format!("Bearer {}", api_key));
        }

        let http_response = http_request
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::RequestFailed(e.to_string()))?;

        let status = http_response.status();
        if !status.is_success() {
            let code = status.as_u16();
            let error_text = http_response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error response".to_string());

            if let Ok(error_response) = serde_json::from_str::<ApiErrorResponse>(&error_text) {
                if code == 429 {
                    return Err(LlmError::RateLimited(error_response.error.message));
                }
                return Err(LlmError::ApiError {
                    code,
                    message: error_response.error.message,
                });
            }

            return Err(LlmError::ApiError {
                code,
                message: error_text,
            });
        }

        http_response
            .json()
            .await
            .map_err(|e| LlmError::ParseError(format!("Failed to parse API response: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_constructors() {
        let system = Message::system("You are helpful.");
        assert_eq!(system.role, "system");

        let user = Message::user("Hello");
        assert_eq!(user.role, "user");
        assert_eq!(user.content, "Hello");
    }

    #[test]
    fn test_generation_request_builder() {
        let request = GenerationRequest::new("gpt-4o", vec![Message::user("test")])
            .with_temperature(0.0)
            .with_max_tokens(500)
            .with_top_p(1.0);

        assert_eq!(request.model, "gpt-4o");
        assert_eq!(request.temperature, Some(0.0));
        assert_eq!(request.max_tokens, Some(500));
        assert_eq!(request.top_p, Some(1.0));
    }

    #[test]
    fn test_request_serialization_skips_unset_params() {
        let request = GenerationRequest::new("gpt-4o", vec![Message::user("test")])
            .with_temperature(0.0);

        let json = serde_json::to_string(&request).expect("serialize");
        assert!(json.contains("\"temperature\":0.0"));
        assert!(!json.contains("max_tokens"));
        assert!(!json.contains("top_p"));
    }

    #[test]
    fn test_first_content() {
        let response = GenerationResponse {
            model: "gpt-4o".to_string(),
            choices: vec![Choice {
                message: Message {
                    role: "assistant".to_string(),
                    content: "Hi there!".to_string(),
                },
                finish_reason: Some("stop".to_string()),
            }],
        };
        assert_eq!(response.first_content(), Some("Hi there!"));

        let empty = GenerationResponse {
            model: "gpt-4o".to_string(),
            choices: vec![],
        };
        assert_eq!(empty.first_content(), None);
    }

    #[tokio::test]
    async fn test_generate_connection_error() {
        let client = ChatCompletionsClient::new("http://localhost:65535".to_string(), None);
        let request = GenerationRequest::new("gpt-4o", vec![Message::user("test")]);

        let result = client.generate(request).await;
        assert!(matches!(result, Err(LlmError::RequestFailed(_))));
    }
}
