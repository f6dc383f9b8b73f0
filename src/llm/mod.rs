//! LLM provider integrations.
//!
//! Four provider families serve generation requests:
//! - Nova-family foundation models (generic chat envelope)
//! - Claude-family foundation models (Anthropic envelope, same endpoint)
//! - OpenAI-compatible chat completions
//! - Stateful multi-turn agents that stream text chunks
//!
//! The family is resolved once from the model identifier at configuration
//! time; routing stays exhaustive from there.

pub mod agent;
pub mod bedrock;
pub mod envelope;
pub mod openai;
pub mod retrieval;

pub use agent::{collect_chunks, AgentResponder, ChunkStream, HttpAgentClient};
pub use bedrock::{BedrockRuntimeClient, FoundationResponder};
pub use openai::{ChatCompletionsClient, ChatResponder, GenerationRequest, GenerationResponse, Message};
pub use retrieval::{top_passages, HttpKnowledgeBase, KnowledgeBase, Passage};

/// Provider family for a model identifier.
///
/// Resolved once when a run is configured, replacing per-call substring
/// checks with an exhaustive match at dispatch time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderFamily {
    /// Foundation model using the generic chat envelope.
    Nova,
    /// Foundation model using the Anthropic envelope.
    Claude,
    /// OpenAI-compatible chat completion model.
    OpenAi,
    /// Stateful multi-turn agent identifier.
    Agent,
}

impl ProviderFamily {
    /// Resolves the family from a model identifier's content.
    ///
    /// Anything that is not recognizably a foundation or chat-completion
    /// model is treated as an agent identifier.
    pub fn resolve(model_id: &str) -> Self {
        if model_id.contains("nova") {
            Self::Nova
        } else if model_id.contains("claude") {
            Self::Claude
        } else if model_id.contains("gpt") {
            Self::OpenAi
        } else {
            Self::Agent
        }
    }
}
