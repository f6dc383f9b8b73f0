//! Single-unit response generation: context, prompt, dispatch, timing.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::error::LlmError;
use crate::llm::agent::{collect_chunks, new_session_id, AgentResponder};
use crate::llm::envelope::{claude_output_text, nova_output_text, ClaudeRequest, NovaRequest};
use crate::llm::openai::{ChatResponder, GenerationRequest, Message};
use crate::llm::{FoundationResponder, ProviderFamily};
use crate::pipeline::config::{Mode, RunConfig};
use crate::pipeline::context::ContextBuilder;
use crate::prompts::{self, AnswerStyle};

/// Token cap for chat-completion responses.
const CHAT_MAX_TOKENS: u32 = 500;

/// A generated response with its timing metadata.
#[derive(Debug, Clone)]
pub struct GeneratedAnswer {
    pub text: String,
    /// Human-readable duration, e.g. "Elapsed time: 1.2345 seconds".
    pub time_to_run: String,
    pub elapsed: Duration,
}

/// Dispatches one prompt to the correct backend responder.
///
/// The unit of concurrent work for [`crate::pipeline::batch::BatchRunner`]
/// and [`crate::pipeline::judge::JudgeRunner`]. Routing is an exhaustive
/// match on the provider family resolved at configuration time.
pub struct ResponseGenerator {
    foundation: Arc<dyn FoundationResponder>,
    chat: Arc<dyn ChatResponder>,
    agent: Arc<dyn AgentResponder>,
    context: ContextBuilder,
    agent_alias_id: String,
}

impl ResponseGenerator {
    pub fn new(
        foundation: Arc<dyn FoundationResponder>,
        chat: Arc<dyn ChatResponder>,
        agent: Arc<dyn AgentResponder>,
        context: ContextBuilder,
        agent_alias_id: impl Into<String>,
    ) -> Self {
        Self {
            foundation,
            chat,
            agent,
            context,
            agent_alias_id: agent_alias_id.into(),
        }
    }

    /// Answers a user question: builds mode-specific context, fills the
    /// answer prompt, and dispatches to the configured model.
    ///
    /// Agents manage their own retrieval, so they receive the raw question
    /// rather than the templated prompt.
    pub async fn answer(
        &self,
        question: &str,
        chat_history: &str,
        run: &RunConfig,
    ) -> Result<GeneratedAnswer, LlmError> {
        let context = self.context.build(run.mode, &run.kb_id, question).await?;
        let style = match run.mode {
            Mode::KbLegalAssistant => AnswerStyle::Legal,
            _ => AnswerStyle::Resident,
        };
        let prompt = prompts::build_answer_prompt(style, chat_history, &context, question);

        self.timed_dispatch(run.family, &run.model, &prompt, question)
            .await
    }

    /// Dispatches a fully built prompt, resolving the family from the model
    /// identifier. Used by the judge stage, where no context is needed.
    pub async fn invoke(&self, model_id: &str, prompt: &str) -> Result<GeneratedAnswer, LlmError> {
        let family = ProviderFamily::resolve(model_id);
        self.timed_dispatch(family, model_id, prompt, prompt).await
    }

    async fn timed_dispatch(
        &self,
        family: ProviderFamily,
        model_id: &str,
        prompt: &str,
        agent_input: &str,
    ) -> Result<GeneratedAnswer, LlmError> {
        let started = Instant::now();
        let text = self.dispatch(family, model_id, prompt, agent_input).await?;
        let elapsed = started.elapsed();
        debug!(model_id, elapsed_secs = elapsed.as_secs_f64(), "model call complete");

        Ok(GeneratedAnswer {
            text,
            time_to_run: format!("Elapsed time: {:.4} seconds", elapsed.as_secs_f64()),
            elapsed,
        })
    }

    async fn dispatch(
        &self,
        family: ProviderFamily,
        model_id: &str,
        prompt: &str,
        agent_input: &str,
    ) -> Result<String, LlmError> {
        match family {
            ProviderFamily::Nova => {
                let body = NovaRequest::new(prompt).to_value()?;
                let response = self.foundation.invoke(model_id, body).await?;
                nova_output_text(&response)
            }
            ProviderFamily::Claude => {
                let body = ClaudeRequest::new(prompt).to_value()?;
                let response = self.foundation.invoke(model_id, body).await?;
                claude_output_text(&response)
            }
            ProviderFamily::OpenAi => {
                let request = GenerationRequest::new(model_id, vec![Message::user(prompt)])
                    .with_temperature(0.0)
                    .with_top_p(1.0)
                    .with_max_tokens(CHAT_MAX_TOKENS);
                let response = self.chat.generate(request).await?;
                response
                    .first_content()
                    .map(str::to_string)
                    .ok_or_else(|| LlmError::EmptyResponse(model_id.to_string()))
            }
            ProviderFamily::Agent => {
                let session_id = new_session_id();
                let stream = self
                    .agent
                    .invoke_agent(model_id, &self.agent_alias_id, &session_id, agent_input)
                    .await?;
                collect_chunks(stream).await
            }
        }
    }
}
