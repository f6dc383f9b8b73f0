//! Run configuration for the batch, judge, and report stages.

use std::fmt;
use std::str::FromStr;

use crate::error::BatchError;
use crate::llm::ProviderFamily;

/// Default number of concurrently in-flight model calls.
pub const DEFAULT_CONCURRENCY: usize = 30;

/// Retrieval/context-building strategy for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Static agency lookup table as context.
    WebsiteAgencies,
    /// Knowledge-base retrieval, restricted to URLs found in the context.
    KbWebsite,
    /// Knowledge-base retrieval with the legal-assistant prompt.
    KbLegalAssistant,
}

impl Mode {
    /// Tag written into record `bot_type` fields.
    pub fn label(&self) -> &'static str {
        match self {
            Mode::WebsiteAgencies => "Website-Agencies",
            Mode::KbWebsite => "KB-Website",
            Mode::KbLegalAssistant => "KB-Legal Assistant",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Mode {
    type Err = BatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Website-Agencies" => Ok(Mode::WebsiteAgencies),
            "KB-Website" => Ok(Mode::KbWebsite),
            "KB-Legal Assistant" => Ok(Mode::KbLegalAssistant),
            other => Err(BatchError::InvalidConfig(format!(
                "unknown mode '{}' (expected Website-Agencies, KB-Website, or KB-Legal Assistant)",
                other
            ))),
        }
    }
}

/// Configuration for one (model, mode) generation unit.
///
/// The provider family is resolved once at construction; routing never
/// re-inspects the model identifier per call.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub model: String,
    pub family: ProviderFamily,
    pub mode: Mode,
    pub kb_id: String,
}

impl RunConfig {
    pub fn new(model: impl Into<String>, mode: Mode, kb_id: impl Into<String>) -> Self {
        let model = model.into();
        let family = ProviderFamily::resolve(&model);
        Self {
            model,
            family,
            mode,
            kb_id: kb_id.into(),
        }
    }
}

/// Configuration for a full batch run.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Prompts to replay against every (model, mode) pair.
    pub prompts: Vec<String>,
    /// Model identifiers to fan out over.
    pub models: Vec<String>,
    /// Modes to fan out over.
    pub modes: Vec<Mode>,
    /// Knowledge base consulted by KB modes.
    pub kb_id: String,
    /// Cohort tag stamped on every record of this run.
    pub cohort_tag: String,
    /// Store key prefix for persisted records.
    pub storage_prefix: String,
    /// Tag embedded in generated record filenames.
    pub file_tag: String,
    /// Maximum concurrently in-flight units.
    pub concurrency: usize,
}

impl BatchConfig {
    pub fn new(prompts: Vec<String>, models: Vec<String>, modes: Vec<Mode>) -> Self {
        Self {
            prompts,
            models,
            modes,
            kb_id: String::new(),
            cohort_tag: "wabotpoc".to_string(),
            storage_prefix: "evaluation_data/batch/".to_string(),
            file_tag: "wabotpoc".to_string(),
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    pub fn with_kb_id(mut self, kb_id: impl Into<String>) -> Self {
        self.kb_id = kb_id.into();
        self
    }

    pub fn with_cohort_tag(mut self, cohort_tag: impl Into<String>) -> Self {
        self.cohort_tag = cohort_tag.into();
        self
    }

    pub fn with_storage_prefix(mut self, storage_prefix: impl Into<String>) -> Self {
        self.storage_prefix = storage_prefix.into();
        self
    }

    pub fn with_file_tag(mut self, file_tag: impl Into<String>) -> Self {
        self.file_tag = file_tag.into();
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Fails fast before any unit is dispatched.
    pub fn validate(&self) -> Result<(), BatchError> {
        if self.prompts.is_empty() {
            return Err(BatchError::InvalidConfig("prompt list is empty".to_string()));
        }
        if self.models.is_empty() {
            return Err(BatchError::InvalidConfig("model list is empty".to_string()));
        }
        if self.modes.is_empty() {
            return Err(BatchError::InvalidConfig("mode list is empty".to_string()));
        }
        if self.concurrency == 0 {
            return Err(BatchError::InvalidConfig(
                "concurrency must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Total units this run will dispatch.
    pub fn unit_count(&self) -> usize {
        self.prompts.len() * self.models.len() * self.modes.len()
    }
}

/// Configuration for a judge pass over persisted records.
#[derive(Debug, Clone)]
pub struct JudgeConfig {
    /// Store prefix scanned for source records.
    pub source_prefix: String,
    /// Only records with this cohort tag are judged.
    pub target_cohort_tag: String,
    /// Model invoked to score each response.
    pub judge_model: String,
    /// Store key prefix for assessment records.
    pub output_prefix: String,
    /// Tag embedded in generated assessment filenames.
    pub file_tag: String,
    pub concurrency: usize,
}

impl JudgeConfig {
    pub fn new(
        source_prefix: impl Into<String>,
        target_cohort_tag: impl Into<String>,
        judge_model: impl Into<String>,
    ) -> Self {
        let target_cohort_tag = target_cohort_tag.into();
        Self {
            source_prefix: source_prefix.into(),
            file_tag: target_cohort_tag.clone(),
            target_cohort_tag,
            judge_model: judge_model.into(),
            output_prefix: "evaluation_data/assess/".to_string(),
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    pub fn with_output_prefix(mut self, output_prefix: impl Into<String>) -> Self {
        self.output_prefix = output_prefix.into();
        self
    }

    pub fn with_file_tag(mut self, file_tag: impl Into<String>) -> Self {
        self.file_tag = file_tag.into();
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn validate(&self) -> Result<(), BatchError> {
        if self.target_cohort_tag.is_empty() {
            return Err(BatchError::InvalidConfig(
                "target cohort tag is empty".to_string(),
            ));
        }
        if self.judge_model.is_empty() {
            return Err(BatchError::InvalidConfig("judge model is empty".to_string()));
        }
        if self.concurrency == 0 {
            return Err(BatchError::InvalidConfig(
                "concurrency must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Configuration for flattening records into a CSV report.
#[derive(Debug, Clone)]
pub struct ReportConfig {
    /// Store prefix scanned for records to flatten.
    pub source_prefix: String,
    /// Dotted paths selecting one column each, in order.
    pub field_paths: Vec<String>,
}

impl ReportConfig {
    pub fn new(source_prefix: impl Into<String>, field_paths: Vec<String>) -> Self {
        Self {
            source_prefix: source_prefix.into(),
            field_paths,
        }
    }
}
