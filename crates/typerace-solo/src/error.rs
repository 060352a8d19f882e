//! Error types for solo mode.

/// Errors that can occur while recording or reading solo results.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SoloError {
    /// The submission failed validation (e.g. a blank username).
    #[error("invalid solo result: {0}")]
    Invalid(String),

    /// The backing store couldn't complete the operation.
    #[error("storage error: {0}")]
    Storage(String),
}

impl SoloError {
    /// Reason sent back to the client in `soloResultSaved`.
    ///
    /// Clients only ever see a generic message, never the detail.
    pub fn client_reason(&self) -> &'static str {
        "Database error"
    }
}
