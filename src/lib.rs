//! evalforge: batch evaluation pipeline for RAG chatbot responses.
//!
//! Replays prompt lists against a matrix of models and retrieval modes,
//! scores the persisted responses with a judge model, and flattens the
//! resulting records into CSV reports.
//!
//! The stages communicate only through an [`store::ObjectStore`], so each
//! can be run (and re-run) independently:
//!
//! 1. [`pipeline::BatchRunner`] fans out {model × mode} × prompts and
//!    persists one [`record::InteractionRecord`] per unit.
//! 2. [`pipeline::JudgeRunner`] scans a cohort of records, scores each with
//!    a judge model, and persists [`record::AssessmentRecord`]s.
//! 3. [`pipeline::ReportBuilder`] flattens records into CSV columns
//!    selected by dotted field paths.

pub mod cli;
pub mod error;
pub mod llm;
pub mod pipeline;
pub mod prompts;
pub mod record;
pub mod store;
pub mod transcript;

pub use error::{BatchError, LlmError, ReportError, StoreError};
pub use pipeline::{BatchConfig, BatchRunner, JudgeConfig, JudgeRunner, Mode, ReportBuilder, ReportConfig, ResponseGenerator, RunConfig};
pub use record::{AssessmentRecord, InteractionRecord};
pub use store::{FsObjectStore, MemoryStore, ObjectStore, StoreUri};
