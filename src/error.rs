//! Error types for the signal controller.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SignalError {
    /// The vision service call failed or timed out.
    #[error("Analysis service failure: {0}")]
    AnalysisService(String),

    /// The vision service answered with something that is not an analysis.
    #[error("Malformed analysis: {0}")]
    MalformedAnalysis(#[from] serde_json::Error),

    /// Internal state no longer matches the intersection layout.
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("AMQP error: {0}")]
    Amqp(#[from] amiquip::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Task error: {0}")]
    Task(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, SignalError>;
