//! Ordered conversation history for interactive sessions.
//!
//! Batch runs are single-shot and pass no history; interactive callers keep a
//! [`Transcript`] per session and render it into the answer prompt.

/// Speaker of a single turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    Human,
    Ai,
}

impl Speaker {
    fn label(&self) -> &'static str {
        match self {
            Speaker::Human => "human",
            Speaker::Ai => "ai",
        }
    }
}

/// One turn of conversation.
#[derive(Debug, Clone)]
pub struct Turn {
    pub speaker: Speaker,
    pub content: String,
}

/// Ordered conversation history.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a question/answer pair in order.
    pub fn record_exchange(&mut self, question: impl Into<String>, answer: impl Into<String>) {
        self.turns.push(Turn {
            speaker: Speaker::Human,
            content: question.into(),
        });
        self.turns.push(Turn {
            speaker: Speaker::Ai,
            content: answer.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Renders the history as `speaker: content` lines, or "NONE" when empty.
    pub fn render(&self) -> String {
        if self.turns.is_empty() {
            return "NONE".to_string();
        }
        self.turns
            .iter()
            .map(|turn| format!("{}: {}", turn.speaker.label(), turn.content))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
