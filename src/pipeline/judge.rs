//! Scoring pass over persisted interaction records.

use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::{info, warn};

use crate::error::{BatchError, LlmError, StoreError};
use crate::pipeline::config::JudgeConfig;
use crate::pipeline::generator::ResponseGenerator;
use crate::prompts;
use crate::record::codec::{make_record_key, normalize_value};
use crate::record::{AssessmentRecord, InteractionRecord, ASSESS_SUFFIX};
use crate::store::ObjectStore;

#[derive(Debug, thiserror::Error)]
enum UnitError {
    #[error(transparent)]
    Llm(#[from] LlmError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Outcome counts for one judge pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct JudgeSummary {
    /// Keys found under the source prefix.
    pub scanned: usize,
    /// Objects that could not be read or decoded.
    pub skipped: usize,
    /// Decoded records matching the target cohort tag.
    pub matched: usize,
    /// Assessment records successfully persisted.
    pub assessed: usize,
    /// Matched records whose judge call or persistence failed.
    pub failed: usize,
}

/// Scans a record store, scores each record in a target cohort with a judge
/// model, and persists one [`AssessmentRecord`] per source record.
///
/// Corrupt or unreadable objects are logged and skipped; they never abort
/// the pass. Judge calls run concurrently under the same bounded-semaphore
/// discipline as batch generation.
pub struct JudgeRunner {
    generator: Arc<ResponseGenerator>,
    store: Arc<dyn ObjectStore>,
}

impl JudgeRunner {
    pub fn new(generator: Arc<ResponseGenerator>, store: Arc<dyn ObjectStore>) -> Self {
        Self { generator, store }
    }

    pub async fn run(&self, config: &JudgeConfig) -> Result<JudgeSummary, BatchError> {
        config.validate()?;

        let keys = self.store.list(&config.source_prefix).await.map_err(BatchError::Store)?;
        let scanned = keys.len();

        let mut matched = Vec::new();
        let mut skipped = 0usize;
        for key in keys {
            match self.load_record(&key).await {
                Ok(record) => {
                    if record.cohort_tag == config.target_cohort_tag {
                        matched.push(record);
                    }
                }
                Err(e) => {
                    warn!(key = %key, error = %e, "skipping unreadable record");
                    skipped += 1;
                }
            }
        }
        info!(
            scanned,
            skipped,
            matched = matched.len(),
            cohort_tag = %config.target_cohort_tag,
            "judge scan complete"
        );

        let semaphore = Arc::new(Semaphore::new(config.concurrency));
        let units = matched.iter().map(|record| {
            let semaphore = Arc::clone(&semaphore);
            async move {
                let _permit = semaphore
                    .acquire()
                    .await
                    .expect("semaphore closed during judge run");
                match self.assess_record(record, config).await {
                    Ok(()) => true,
                    Err(e) => {
                        warn!(record_id = %record.record_id, error = %e, "judge unit failed");
                        false
                    }
                }
            }
        });

        let results = join_all(units).await;
        let assessed = results.iter().filter(|ok| **ok).count();

        let summary = JudgeSummary {
            scanned,
            skipped,
            matched: results.len(),
            assessed,
            failed: results.len() - assessed,
        };
        info!(
            assessed = summary.assessed,
            failed = summary.failed,
            judge_model = %config.judge_model,
            "judge pass complete"
        );
        Ok(summary)
    }

    async fn load_record(&self, key: &str) -> Result<InteractionRecord, StoreError> {
        let bytes = self.store.get(key).await?;
        let text = String::from_utf8_lossy(&bytes);
        InteractionRecord::from_json(&text)
    }

    async fn assess_record(
        &self,
        record: &InteractionRecord,
        config: &JudgeConfig,
    ) -> Result<(), UnitError> {
        let prompt = prompts::build_judge_prompt(&record.question, &record.response, true);
        let answer = self.generator.invoke(&config.judge_model, &prompt).await?;

        let assessment = AssessmentRecord {
            source_record_id: (!record.record_id.is_empty()).then(|| record.record_id.clone()),
            assessed_response: record.response.clone(),
            response_model: record.model.clone(),
            assess_model: config.judge_model.clone(),
            runtime: record.time_to_run.clone(),
            bot_type: record.bot_type.clone(),
            cohort_tag: format!("{}{}", config.target_cohort_tag, ASSESS_SUFFIX),
            response: normalize_value(&answer.text),
        };

        let key = format!(
            "{}{}_{}",
            config.output_prefix,
            assessment.cohort_tag,
            make_record_key(&config.file_tag)
        );
        self.store
            .put(&key, assessment.to_json()?.as_bytes())
            .await?;
        Ok(())
    }
}
