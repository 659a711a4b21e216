//! Error types for the MindLog core.

use thiserror::Error;

/// Errors that can occur in MindLog operations.
#[derive(Error, Debug)]
pub enum MindLogError {
    /// A date or time handed to a formatter did not match `YYYY-MM-DD` / `HH:mm`.
    #[error("Invalid date/time: {0}")]
    Format(String),

    /// No `schedule` events were eligible for export.
    #[error("Nothing to export")]
    EmptySelection,

    /// Text that the escaper cannot represent safely.
    #[error("Cannot encode text: {0}")]
    Encoding(String),

    #[error("ICS parse error: {0}")]
    IcsParse(String),

    #[error("Event not found: {0}")]
    EventNotFound(String),

    #[error("Invalid event: {0}")]
    InvalidEvent(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for MindLogError {
    fn from(e: serde_json::Error) -> Self {
        MindLogError::Serialization(e.to_string())
    }
}

/// Result type alias for MindLog operations.
pub type MindLogResult<T> = Result<T, MindLogError>;
