//! Knowledge-base retrieval for context building.

use std::env;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::error::LlmError;

/// Number of results requested from the knowledge base per query.
const SEARCH_RESULTS: u32 = 50;

/// One retrieved passage with its relevance score.
#[derive(Debug, Clone)]
pub struct Passage {
    pub text: String,
    pub score: f64,
    /// Source location (typically a URL) when the knowledge base tracks one.
    pub source: Option<String>,
}

/// Trait for knowledge-base retrieval backends.
#[async_trait]
pub trait KnowledgeBase: Send + Sync {
    /// Returns passages relevant to `query` from knowledge base `kb_id`.
    async fn retrieve(&self, kb_id: &str, query: &str) -> Result<Vec<Passage>, LlmError>;
}

/// Keeps the top `limit` passages by descending relevance score.
pub fn top_passages(mut passages: Vec<Passage>, limit: usize) -> Vec<Passage> {
    passages.sort_by(|a, b| b.score.total_cmp(&a.score));
    passages.truncate(limit);
    passages
}

#[derive(Debug, Deserialize)]
struct RetrieveResponse {
    #[serde(rename = "retrievalResults", default)]
    retrieval_results: Vec<RetrievalResult>,
}

#[derive(Debug, Deserialize)]
struct RetrievalResult {
    content: RetrievalContent,
    #[serde(default)]
    score: f64,
    #[serde(default)]
    location: Option<RetrievalLocation>,
}

#[derive(Debug, Deserialize)]
struct RetrievalContent {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct RetrievalLocation {
    #[serde(rename = "webLocation", default)]
    web_location: Option<WebLocation>,
}

#[derive(Debug, Deserialize)]
struct WebLocation {
    #[serde(default)]
    url: String,
}

/// HTTP client for a knowledge-base retrieval endpoint.
pub struct HttpKnowledgeBase {
    api_base: String,
    api_key: Option<String>,
    http_client: Client,
}

impl HttpKnowledgeBase {
    pub fn new(api_base: String, api_key: Option<String>) -> Self {
        Self {
            api_base,
            api_key,
            http_client: Client::builder()
                .timeout(Duration::from_secs(60))
                .build()
                .expect("Failed to build HTTP client"),
        }
    }

    /// Creates a client from environment variables.
    ///
    /// - `KB_API_BASE`: base URL for the retrieval API (required)
    /// - `KB_API_KEY`: bearer token (optional)
    pub fn from_env() -> Result<Self, LlmError> {
        let api_base =
            env::var("KB_API_BASE").map_err(|_| LlmError::MissingApiBase("kb".to_string()))?;
        let api_key = env::var("KB_API_KEY").ok();
        Ok(Self::new(api_base, api_key))
    }
}

#[async_trait]
impl KnowledgeBase for HttpKnowledgeBase {
    async fn retrieve(&self, kb_id: &str, query: &str) -> Result<Vec<Passage>, LlmError> {
        let url = format!("{}/knowledgebases/{}/retrieve", self.api_base, kb_id);

        let body = json!({
            "retrievalQuery": { "text": query },
            "retrievalConfiguration": {
                "vectorSearchConfiguration": {
                    "numberOfResults": SEARCH_RESULTS,
                    "overrideSearchType": "HYBRID"
                }
            }
        });

        let mut request = self
            .http_client
            .post(&url)
            .header("Content-Type", "application/json");

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
            return Err(LlmError::ApiError { code, message });
        }

        let parsed: RetrieveResponse = response
            .json()
            .await
            .map_err(|e| LlmError::ParseError(format!("Failed to parse retrieve response: {}", e)))?;

        Ok(parsed
            .retrieval_results
            .into_iter()
            .map(|r| Passage {
                text: r.content.text,
                score: r.score,
                source: r
                    .location
                    .and_then(|l| l.web_location)
                    .map(|w| w.url)
                    .filter(|u| !u.is_empty()),
            })
            .collect())
    }
}
