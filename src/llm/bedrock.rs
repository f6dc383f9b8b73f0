//! HTTP client for the foundation-model invoke endpoint.
//!
//! One endpoint serves both envelope shapes; the caller picks the body via
//! [`crate::llm::envelope`] based on the resolved provider family.

use std::env;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::error::LlmError;

/// Trait for responders that invoke a foundation model with a raw
/// request envelope and return the raw response envelope.
#[async_trait]
pub trait FoundationResponder: Send + Sync {
    async fn invoke(&self, model_id: &str, body: Value) -> Result<Value, LlmError>;
}

/// Client for a Bedrock-runtime-style invoke API.
pub struct BedrockRuntimeClient {
    api_base: String,
    api_key: Option<String>,
    http_client: Client,
}

impl BedrockRuntimeClient {
    /// Creates a new client with explicit configuration.
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

    /// Creates a client from environment variables.
    ///
    /// - `BEDROCK_API_BASE`: base URL for the invoke API (required)
    /// - `BEDROCK_API_KEY`: bearer token (optional)
    pub fn from_env() -> Result<Self, LlmError> {
        let api_base = env::var("BEDROCK_API_BASE")
            .map_err(|_| LlmError::MissingApiBase("bedrock".to_string()))?;
        let api_key = env::var("BEDROCK_API_KEY").ok();
        Ok(Self::new(api_base, api_key))
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }
}

#[async_trait]
impl FoundationResponder for BedrockRuntimeClient {
    async fn invoke(&self, model_id: &str, body: Value) -> Result<Value, LlmError> {
        let url = format!("{}/model/{}/invoke", self.api_base, model_id);

        let mut request = self
            .http_client
            .post(&url)
            .header("Content-Type", "application/json")
            .header("Accept", "application/json");

        if let Some(ref api_key) = self.api_key {
            request = request.header("Authorization", format!("Bearer {}", api_key));
        }

        let response = request
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let code = status.as_u16();
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error response".to_string());

            if code == 429 {
                return Err(LlmError::RateLimited(message));
            }
            return Err(LlmError::ApiError { code, message });
        }

        response
            .json()
            .await
            .map_err(|e| LlmError::ParseError(format!("Failed to parse invoke response: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::envelope::NovaRequest;

    #[test]
    fn test_client_construction() {
        let client = BedrockRuntimeClient::new(
            "http://localhost:4000".to_string(),
            Some("test-key".to_string()),
        );
        assert_eq!(client.api_base(), "http://localhost:4000");
    }

    #[tokio::test]
    async fn test_invoke_connection_error() {
        // Port unlikely to have a listener.
        let client = BedrockRuntimeClient::new("http://localhost:65535".to_string(), None);
        let body = NovaRequest::new("test").to_value().expect("to_value");

        let result = client.invoke("us.amazon.nova-pro-v1:0", body).await;
        assert!(matches!(result, Err(LlmError::RequestFailed(_))));
    }
}
