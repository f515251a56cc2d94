//! Error types for the weekrep pipeline.

use thiserror::Error;

/// Errors that can occur while producing a report.
#[derive(Error, Debug)]
pub enum WeekrepError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid date range: {0}")]
    DateRange(String),

    #[error("Unknown timezone: {0}")]
    Timezone(String),

    #[error("Calendar parse error in {source_label}: {reason}")]
    Parse { source_label: String, reason: String },

    #[error("Generation request failed: {0}")]
    Generation(String),

    #[error("Generation failed after {attempts} attempts: {reason}")]
    GenerationExhausted { attempts: u32, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for weekrep operations.
pub type WeekrepResult<T> = Result<T, WeekrepError>;
