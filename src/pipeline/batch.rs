//! Fan-out of a prompt list over a {model × mode} matrix.

use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::{info, warn};

use crate::error::{BatchError, LlmError, StoreError};
use crate::pipeline::config::{BatchConfig, RunConfig};
use crate::pipeline::generator::ResponseGenerator;
use crate::record::codec::make_record_key;
use crate::record::InteractionRecord;
use crate::store::ObjectStore;

/// Failure of one unit of work; logged and counted, never fatal to the run.
#[derive(Debug, thiserror::Error)]
enum UnitError {
    #[error(transparent)]
    Llm(#[from] LlmError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Outcome counts for one batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchSummary {
    /// Units dispatched: prompts × models × modes.
    pub dispatched: usize,
    /// Records successfully persisted.
    pub persisted: usize,
    /// Units that failed (model call or persistence).
    pub failed: usize,
}

/// Replays a prompt list against every (model, mode) pair and persists one
/// [`InteractionRecord`] per unit.
///
/// Each (prompt, model, mode) triple is an independent unit of concurrent
/// work gated by a semaphore; a failing unit is logged and skipped without
/// cancelling its siblings.
pub struct BatchRunner {
    generator: Arc<ResponseGenerator>,
    store: Arc<dyn ObjectStore>,
}

impl BatchRunner {
    pub fn new(generator: Arc<ResponseGenerator>, store: Arc<dyn ObjectStore>) -> Self {
        Self { generator, store }
    }

    /// Runs the full cross product. Fails fast on invalid configuration;
    /// per-unit failures only reduce the persisted count.
    pub async fn run(&self, config: &BatchConfig) -> Result<BatchSummary, BatchError> {
        config.validate()?;

        let semaphore = Arc::new(Semaphore::new(config.concurrency));
        let mut units = Vec::with_capacity(config.unit_count());

        for model in &config.models {
            for mode in &config.modes {
                let run = RunConfig::new(model.clone(), *mode, config.kb_id.clone());
                info!(model = %run.model, mode = %run.mode, prompts = config.prompts.len(), "dispatching batch unit group");

                for prompt in &config.prompts {
                    let run = run.clone();
                    let semaphore = Arc::clone(&semaphore);
                    units.push(async move {
                        let _permit = semaphore
                            .acquire()
                            .await
                            .expect("semaphore closed during batch run");
                        match self.process_unit(prompt, &run, config).await {
                            Ok(()) => true,
                            Err(e) => {
                                warn!(model = %run.model, mode = %run.mode, error = %e, "batch unit failed");
                                false
                            }
                        }
                    });
                }
            }
        }

        let dispatched = units.len();
        let results = join_all(units).await;
        let persisted = results.iter().filter(|ok| **ok).count();

        let summary = BatchSummary {
            dispatched,
            persisted,
            failed: dispatched - persisted,
        };
        info!(
            dispatched = summary.dispatched,
            persisted = summary.persisted,
            failed = summary.failed,
            cohort_tag = %config.cohort_tag,
            "batch run complete"
        );
        Ok(summary)
    }

    async fn process_unit(
        &self,
        prompt: &str,
        run: &RunConfig,
        config: &BatchConfig,
    ) -> Result<(), UnitError> {
        // Single-shot: no transcript history in batch runs.
        let answer = self.generator.answer(prompt, "NONE", run).await?;

        let record = InteractionRecord::new(
            prompt,
            answer.text,
            &run.model,
            run.mode.label(),
            &config.cohort_tag,
            answer.time_to_run,
        );

        let key = format!(
            "{}{}_{}",
            config.storage_prefix,
            config.cohort_tag,
            make_record_key(&config.file_tag)
        );
        self.store.put(&key, record.to_json()?.as_bytes()).await?;
        Ok(())
    }
}
