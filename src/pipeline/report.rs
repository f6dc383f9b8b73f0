//! Flattening persisted records into a CSV report.

use std::sync::Arc;

use serde_json::Value;
use tracing::{info, warn};

use crate::error::ReportError;
use crate::pipeline::config::ReportConfig;
use crate::record::codec;
use crate::record::extract::extract;
use crate::store::ObjectStore;

/// Builds a CSV report from the records under a store prefix.
///
/// Column order is exactly the configured field paths; a path absent from a
/// record (or resolving to null) yields an empty cell rather than an error,
/// so heterogeneous record shapes flatten into one table.
pub struct ReportBuilder {
    store: Arc<dyn ObjectStore>,
}

impl ReportBuilder {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Builds the report in memory and returns the CSV bytes.
    pub async fn build(&self, config: &ReportConfig) -> Result<Vec<u8>, ReportError> {
        if config.field_paths.is_empty() {
            return Err(ReportError::NoFields);
        }

        let keys = self.store.list(&config.source_prefix).await?;
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(&config.field_paths)?;

        let mut rows = 0usize;
        let mut skipped = 0usize;
        for key in keys {
            let document = match self.load_document(&key).await {
                Ok(document) => document,
                Err(e) => {
                    warn!(key = %key, error = %e, "skipping unreadable record");
                    skipped += 1;
                    continue;
                }
            };

            let row: Vec<String> = config
                .field_paths
                .iter()
                .map(|path| {
                    extract(&document, path)
                        .map(render_cell)
                        .unwrap_or_default()
                })
                .collect();
            writer.write_record(&row)?;
            rows += 1;
        }

        info!(rows, skipped, prefix = %config.source_prefix, "report built");
        writer
            .into_inner()
            .map_err(|e| ReportError::Io(e.into_error()))
    }

    /// Builds the report and writes it to `key` in `sink` as one object.
    pub async fn write_to(
        &self,
        config: &ReportConfig,
        sink: &dyn ObjectStore,
        key: &str,
    ) -> Result<(), ReportError> {
        let bytes = self.build(config).await?;
        sink.put(key, &bytes).await?;
        Ok(())
    }

    async fn load_document(&self, key: &str) -> Result<Value, ReportError> {
        let bytes = self.store.get(key).await?;
        let text = String::from_utf8_lossy(&bytes);
        Ok(Value::Object(codec::decode(&text)?))
    }
}

/// Renders one extracted value as a CSV cell. Strings are used raw (no JSON
/// quoting); everything else keeps its compact JSON form.
fn render_cell(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
