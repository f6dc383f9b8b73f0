//! Prompt templates for generation and judging.
//!
//! Templates use `{placeholder}` slots filled by simple replacement.

/// Default resident-assistant prompt with history/context/question slots.
const RESIDENT_ASSISTANT_TEMPLATE: &str = r#"
You are a knowledgeable and trustworthy virtual assistant for Washington State residents.
Your role is to provide accurate, up-to-date information and direct links to official
Washington State government services, forms, and resources.

Instructions:
- Provide clear, step-by-step, actionable answers understandable at a 5th-grade reading level.
- Always provide a helpful response, even if the question is vague; do not ask the user to rephrase.
- If no reliable or official answer is available, say so clearly and suggest how the user can get help.
- Include direct URLs to official Washington State websites, forms, or service pages whenever possible.
- Only include URLs that are valid and relevant, and never repeat the same URL in a response.
- When appropriate, offer the option to connect with a human representative.
- End each response with a helpful follow-up question to guide the user to their next step.

Conversation History (for reference only; do not use as a source of truth):
{chat_history}

Context (retrieved from official sources):
{context}

User Question:
{question}

Answer:
"#;

/// Legal-assistant prompt used for the legal knowledge-base mode.
const LEGAL_ASSISTANT_TEMPLATE: &str = r#"
You are a responsible, transparent, and equitable AI assistant designed to help Washington
state residents understand and navigate the 2025 Washington Session Laws.

Your role is to:
- Provide clear, plain-language explanations of legal provisions from the 2025 Washington Session Laws.
- Help users understand how specific laws may apply to their situation, without offering legal advice.
- Flag and explain any limitations or uncertainties in the information you provide.
- If you can't find an answer from the retrieved content, say "I don't know."
- Where possible provide helpful URL links with the response.

You must emphasize that you are not a lawyer and that decisions should be guided by a
qualified human lawyer. Always disclose when content is AI-generated.

Conversation History (for reference only; do not use as a source of truth):
{chat_history}

Context (retrieved from official sources):
{context}

User Question:
{question}

Answer:
"#;

/// Judge prompt asking for 1-5 scores across the evaluation criteria.
const JUDGE_TEMPLATE: &str = r#"
You are an extremely critical, detail-oriented expert evaluator of chatbot responses to
help residents of the State of Washington.
Given a user prompt below and the chatbot response, evaluate on a scale of 1 to 5 for the
following criteria: helpfulness, accuracy, clarity, tone, and conciseness. Confirm that
all URLs are valid and factor that into the assessment scores. Also add a field for total
URLs and number of valid URLs. Provide a brief overall assessment at the end.
Be extremely picky. 5's should be rare.
{report_style}

User Prompt:
{question}

Response:
{response}
"#;

/// Whether the user-facing answer prompt uses the legal-assistant variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerStyle {
    Resident,
    Legal,
}

/// Builds the full answer prompt for a user question.
pub fn build_answer_prompt(
    style: AnswerStyle,
    chat_history: &str,
    context: &str,
    question: &str,
) -> String {
    let template = match style {
        AnswerStyle::Resident => RESIDENT_ASSISTANT_TEMPLATE,
        AnswerStyle::Legal => LEGAL_ASSISTANT_TEMPLATE,
    };
    template
        .replace("{chat_history}", chat_history)
        .replace("{context}", context)
        .replace("{question}", question)
}

/// Builds the judge prompt for scoring a prior response.
///
/// In batch mode the judge is asked for a JSON-readable object so the score
/// can be re-nested into the assessment record; interactive callers get a
/// readable report instead.
pub fn build_judge_prompt(question: &str, response: &str, batch_mode: bool) -> String {
    let report_style = if batch_mode {
        "Return the answer as a .json readable object."
    } else {
        "Return the answer as a readable report."
    };
    JUDGE_TEMPLATE
        .replace("{report_style}", report_style)
        .replace("{question}", question)
        .replace("{response}", response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_answer_prompt_fills_slots() {
        let prompt = build_answer_prompt(
            AnswerStyle::Resident,
            "human: hi\nai: hello",
            "dol.wa.gov renewals page",
            "How do I renew my license?",
        );
        assert!(prompt.contains("human: hi"));
        assert!(prompt.contains("dol.wa.gov renewals page"));
        assert!(prompt.contains("How do I renew my license?"));
        assert!(!prompt.contains("{question}"));
    }

    #[test]
    fn test_legal_prompt_selected() {
        let prompt = build_answer_prompt(AnswerStyle::Legal, "NONE", "NONE", "q");
        assert!(prompt.contains("Washington Session Laws"));
    }

    #[test]
    fn test_judge_prompt_batch_mode() {
        let prompt = build_judge_prompt("q", "r", true);
        assert!(prompt.contains(".json readable object"));
        assert!(prompt.contains("helpfulness, accuracy, clarity, tone, and conciseness"));

        let readable = build_judge_prompt("q", "r", false);
        assert!(readable.contains("readable report"));
    }
}
