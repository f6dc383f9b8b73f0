//! Mode-specific context building for answer prompts.

use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;

use crate::error::LlmError;
use crate::llm::retrieval::{top_passages, KnowledgeBase};
use crate::pipeline::config::Mode;

/// Passages kept from a knowledge-base lookup, by descending score.
const TOP_PASSAGES: usize = 5;

/// One row of the agency lookup table.
#[derive(Debug, Clone, Deserialize)]
pub struct AgencyRow {
    #[serde(rename = "Website")]
    pub website: String,
    #[serde(rename = "Parent Domain")]
    pub parent_domain: String,
    #[serde(rename = "Domain")]
    pub domain: String,
}

/// Static lookup table of official agency websites.
#[derive(Debug, Clone, Default)]
pub struct AgencyTable {
    rows: Vec<AgencyRow>,
}

impl AgencyTable {
    pub fn new(rows: Vec<AgencyRow>) -> Self {
        Self { rows }
    }

    /// Loads the table from a CSV file with Website/Parent Domain/Domain columns.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, csv::Error> {
        let mut reader = csv::Reader::from_path(path)?;
        let rows = reader.deserialize().collect::<Result<Vec<AgencyRow>, _>>()?;
        Ok(Self { rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Renders the table as prompt context, one row per line.
    pub fn render(&self) -> String {
        let mut out = String::from("Website | Parent Domain | Domain");
        for row in &self.rows {
            out.push_str(&format!(
                "\n{} | {} | {}",
                row.website, row.parent_domain, row.domain
            ));
        }
        out
    }
}

/// Builds the context string a mode feeds into the answer prompt.
pub struct ContextBuilder {
    knowledge_base: Arc<dyn KnowledgeBase>,
    agencies: Option<AgencyTable>,
}

impl ContextBuilder {
    pub fn new(knowledge_base: Arc<dyn KnowledgeBase>, agencies: Option<AgencyTable>) -> Self {
        Self {
            knowledge_base,
            agencies,
        }
    }

    /// Returns the context for `query` under `mode`, or "NONE" when the mode
    /// has no context source configured.
    pub async fn build(&self, mode: Mode, kb_id: &str, query: &str) -> Result<String, LlmError> {
        match mode {
            Mode::WebsiteAgencies => Ok(self
                .agencies
                .as_ref()
                .filter(|table| !table.is_empty())
                .map(AgencyTable::render)
                .unwrap_or_else(|| "NONE".to_string())),
            Mode::KbWebsite => {
                let context = self.retrieve_context(kb_id, query).await?;
                Ok(format!("{} Only return URLS present in this context", context))
            }
            Mode::KbLegalAssistant => self.retrieve_context(kb_id, query).await,
        }
    }

    async fn retrieve_context(&self, kb_id: &str, query: &str) -> Result<String, LlmError> {
        let passages = self.knowledge_base.retrieve(kb_id, query).await?;
        let kept = top_passages(passages, TOP_PASSAGES);
        debug!(kb_id, kept = kept.len(), "retrieved knowledge-base context");

        Ok(kept
            .iter()
            .map(|passage| match &passage.source {
                Some(source) => format!("{} (source: {})", passage.text, source),
                None => passage.text.clone(),
            })
            .collect::<Vec<_>>()
            .join("\n\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    use crate::llm::retrieval::Passage;

    struct FixedKb {
        passages: Vec<Passage>,
    }

    #[async_trait]
    impl KnowledgeBase for FixedKb {
        async fn retrieve(&self, _kb_id: &str, _query: &str) -> Result<Vec<Passage>, LlmError> {
            Ok(self.passages.clone())
        }
    }

    fn passage(text: &str, score: f64) -> Passage {
        Passage {
            text: text.to_string(),
            score,
            source: None,
        }
    }

    fn table() -> AgencyTable {
        AgencyTable::new(vec![AgencyRow {
            website: "Dept of Licensing".to_string(),
            parent_domain: "wa.gov".to_string(),
            domain: "dol.wa.gov".to_string(),
        }])
    }

    #[tokio::test]
    async fn test_agency_mode_renders_table() {
        let builder = ContextBuilder::new(Arc::new(FixedKb { passages: vec![] }), Some(table()));
        let context = builder
            .build(Mode::WebsiteAgencies, "", "any question")
            .await
            .expect("build");

        assert!(context.contains("Dept of Licensing | wa.gov | dol.wa.gov"));
    }

    #[tokio::test]
    async fn test_agency_mode_without_table_is_none() {
        let builder = ContextBuilder::new(Arc::new(FixedKb { passages: vec![] }), None);
        let context = builder
            .build(Mode::WebsiteAgencies, "", "q")
            .await
            .expect("build");
        assert_eq!(context, "NONE");
    }

    #[tokio::test]
    async fn test_kb_website_mode_appends_url_restriction() {
        let kb = FixedKb {
            passages: vec![passage("renewal info", 0.9)],
        };
        let builder = ContextBuilder::new(Arc::new(kb), None);
        let context = builder
            .build(Mode::KbWebsite, "kb-1", "q")
            .await
            .expect("build");

        assert!(context.starts_with("renewal info"));
        assert!(context.ends_with("Only return URLS present in this context"));
    }

    #[tokio::test]
    async fn test_legal_mode_keeps_top_five_by_score() {
        let passages = (0..8)
            .map(|i| passage(&format!("p{}", i), i as f64 / 10.0))
            .collect();
        let builder = ContextBuilder::new(Arc::new(FixedKb { passages }), None);
        let context = builder
            .build(Mode::KbLegalAssistant, "kb-1", "q")
            .await
            .expect("build");

        assert!(context.contains("p7"));
        assert!(context.contains("p3"));
        assert!(!context.contains("p2"));
        assert!(!context.ends_with("Only return URLS present in this context"));
    }
}
