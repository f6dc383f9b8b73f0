//! Streaming agent responder.
//!
//! Agents return their answer as a stream of incremental text chunks. The
//! stream is finite and non-restartable per invocation; callers consume it
//! to completion and concatenate the chunks into one final string.

use std::pin::Pin;
use std::time::Duration;

use async_stream::try_stream;
use async_trait::async_trait;
use futures::{Stream, StreamExt};
use reqwest::Client;
use serde_json::json;
use uuid::Uuid;

use crate::error::LlmError;

/// A finite stream of text chunks from an agent invocation.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<String, LlmError>> + Send>>;

/// Trait for stateful multi-turn agent responders.
#[async_trait]
pub trait AgentResponder: Send + Sync {
    /// Sends `input_text` to the agent and returns its chunk stream.
    async fn invoke_agent(
        &self,
        agent_id: &str,
        alias_id: &str,
        session_id: &str,
        input_text: &str,
    ) -> Result<ChunkStream, LlmError>;
}

/// Consumes a chunk stream to completion and concatenates the text.
pub async fn collect_chunks(mut stream: ChunkStream) -> Result<String, LlmError> {
    let mut full_response = String::new();
    while let Some(chunk) = stream.next().await {
        full_response.push_str(&chunk?);
    }
    Ok(full_response)
}

/// Generates a fresh session identifier for a single-shot agent call.
pub fn new_session_id() -> String {
    let id = Uuid::new_v4().to_string();
    format!("session-{}", &id[..8])
}

/// HTTP client for an agent-runtime-style streaming endpoint.
pub struct HttpAgentClient {
    api_base: String,
    api_key: Option<String>,
    http_client: Client,
}

impl HttpAgentClient {
    pub fn new(api_base: String, api_key: Option<String>) -> Self {
        Self {
            api_base,
            api_key,
            http_client: Client::builder()
                .timeout(Duration::from_secs(300))
                .build()
                .expect("Failed to build HTTP client"),
        }
    }

    /// Creates a client from environment variables.
    ///
    /// - `AGENT_API_BASE`: base URL for the agent runtime (required)
    /// - `AGENT_API_KEY`: bearer token (optional)
    pub fn from_env() -> Result<Self, LlmError> {
        let api_base = std::env::var("AGENT_API_BASE")
            .map_err(|_| LlmError::MissingApiBase("agent".to_string()))?;
        let api_key = std::env::var("AGENT_API_KEY").ok();
        Ok(Self::new(api_base, api_key))
    }
}

#[async_trait]
impl AgentResponder for HttpAgentClient {
    async fn invoke_agent(
        &self,
        agent_id: &str,
        alias_id: &str,
        session_id: &str,
        input_text: &str,
    ) -> Result<ChunkStream, LlmError> {
        let url = format!(
            "{}/agents/{}/agentAliases/{}/sessions/{}/text",
            self.api_base, agent_id, alias_id, session_id
        );

        let mut request = self
            .http_client
            .post(&url)
            .header("Content-Type", "application/json");

        if let Some(ref api_key) = self.api_key {
            request = request.header("Authorization", format!("Bearer {}", api_key));
        }

        let mut response = request
            .json(&json!({ "inputText": input_text }))
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
            return Err(LlmError::ApiError { code, message });
        }

        // Chunks arrive as plain UTF-8 text, not JSON.
        let stream = try_stream! {
            while let Some(bytes) = response
                .chunk()
                .await
                .map_err(|e| LlmError::RequestFailed(e.to_string()))?
            {
                yield String::from_utf8_lossy(&bytes).into_owned();
            }
        };

        Ok(Box::pin(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    #[tokio::test]
    async fn test_collect_chunks_concatenates_in_order() {
        let chunks: Vec<Result<String, LlmError>> = vec![
            Ok("Hello".to_string()),
            Ok(", ".to_string()),
            Ok("world".to_string()),
        ];
        let stream: ChunkStream = Box::pin(stream::iter(chunks));

        let text = collect_chunks(stream).await.expect("collect");
        assert_eq!(text, "Hello, world");
    }

    #[tokio::test]
    async fn test_collect_chunks_propagates_error() {
        let chunks: Vec<Result<String, LlmError>> = vec![
            Ok("partial".to_string()),
            Err(LlmError::RequestFailed("stream broke".to_string())),
        ];
        let stream: ChunkStream = Box::pin(stream::iter(chunks));

        let result = collect_chunks(stream).await;
        assert!(matches!(result, Err(LlmError::RequestFailed(_))));
    }

    #[test]
    fn test_new_session_id() {
        let a = new_session_id();
        let b = new_session_id();
        assert!(a.starts_with("session-"));
        assert_eq!(a.len(), "session-".len() + 8);
        assert_ne!(a, b);
    }
}
