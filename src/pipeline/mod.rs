//! Batch evaluation pipeline: generate, judge, report.
//!
//! The three stages are decoupled through durable storage. A batch run
//! persists interaction records; the judge reads them back and persists
//! assessments; the report builder flattens either kind into CSV. Each stage
//! can run independently against whatever the previous stage left behind.

pub mod batch;
pub mod config;
pub mod context;
pub mod generator;
pub mod judge;
pub mod report;

pub use batch::{BatchRunner, BatchSummary};
pub use config::{BatchConfig, JudgeConfig, Mode, ReportConfig, RunConfig, DEFAULT_CONCURRENCY};
pub use context::{AgencyRow, AgencyTable, ContextBuilder};
pub use generator::{GeneratedAnswer, ResponseGenerator};
pub use judge::{JudgeRunner, JudgeSummary};
pub use report::ReportBuilder;
