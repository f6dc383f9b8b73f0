//! Error types for evalforge operations.
//!
//! Defines error types for the major subsystems:
//! - LLM provider interactions (foundation models, chat completions, agents)
//! - Record storage and decoding
//! - Batch generation and judging runs
//! - CSV report building

use thiserror::Error;

/// Errors that can occur during LLM provider calls.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Missing API key for provider '{0}'")]
    MissingApiKey(String),

    #[error("Missing API base URL for provider '{0}'")]
    MissingApiBase(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Failed to parse provider response: {0}")]
    ParseError(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("API error ({code}): {message}")]
    ApiError { code: u16, message: String },

    #[error("Provider returned an empty response for model '{0}'")]
    EmptyResponse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur in the record store and codec.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An S3-style URI or storage prefix is malformed. Fatal to the
    /// operation that received it; reported before any work starts.
    #[error("Invalid store reference '{uri}': {reason}")]
    InvalidReference { uri: String, reason: String },

    /// A persisted record is not valid JSON. Non-fatal during scans:
    /// callers skip the record and log the key.
    #[error("Failed to decode record: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur during batch generation and judge runs.
#[derive(Debug, Error)]
pub enum BatchError {
    /// Structural input problem rejected before any task is dispatched.
    #[error("Invalid batch configuration: {0}")]
    InvalidConfig(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Errors that can occur while building CSV reports.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Report has no field paths")]
    NoFields,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
