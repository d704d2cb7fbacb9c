//! Bounds resolution errors.

/// Errors that can occur while resolving slot bounds.
#[derive(Debug, thiserror::Error)]
pub enum BoundsError {
    #[error("No streams selected")]
    NoStreams,

    #[error("Inverted slot range: min {min_slot} > max {max_slot}")]
    InvertedRange { min_slot: u64, max_slot: u64 },

    #[error("Malformed bounds rows: {0}")]
    MalformedRows(#[from] serde_json::Error),

    #[error("Bounds source failed: {message}")]
    SourceFailed { message: String },

    #[error("Bounds worker is not running")]
    WorkerGone,
}

impl BoundsError {
    /// Convenience constructor for collaborator failures.
    pub fn source_failed(message: impl Into<String>) -> Self {
        Self::SourceFailed {
            message: message.into(),
        }
    }
}
