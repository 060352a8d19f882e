//! The stored solo attempt.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use typerace_protocol::SoloSubmission;

use crate::SoloError;

/// One finished solo attempt, as persisted and as served by the
/// results API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SoloResult {
    /// Store-assigned id.
    pub id: u64,
    pub username: String,
    pub wpm: f64,
    pub accuracy: f64,
    pub error_count: u32,
    /// Seconds the attempt took.
    pub time_elapsed: f64,
    /// Set by the server when the result is accepted.
    pub created_at: DateTime<Utc>,
}

/// A validated submission, ready to be stored.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSoloResult {
    pub username: String,
    pub wpm: f64,
    pub accuracy: f64,
    pub error_count: u32,
    pub time_elapsed: f64,
}

impl NewSoloResult {
    /// Validates a client submission.
    ///
    /// # Errors
    /// [`SoloError::Invalid`] if the username is blank or a numeric
    /// field isn't a finite number.
    pub fn from_submission(submission: SoloSubmission) -> Result<Self, SoloError> {
        let username = submission.username.trim();
        if username.is_empty() {
            return Err(SoloError::Invalid("username is required".into()));
        }
        for (field, value) in [
            ("wpm", submission.wpm),
            ("accuracy", submission.accuracy),
            ("timeElapsed", submission.time_elapsed),
        ] {
            if !value.is_finite() {
                return Err(SoloError::Invalid(format!("{field} must be a number")));
            }
        }

        Ok(Self {
            username: username.to_string(),
            wpm: submission.wpm,
            accuracy: submission.accuracy,
            error_count: submission.error_count,
            time_elapsed: submission.time_elapsed,
        })
    }

    /// Stamps the record with its id and creation time.
    pub fn into_result(self, id: u64, created_at: DateTime<Utc>) -> SoloResult {
        SoloResult {
            id,
            username: self.username,
            wpm: self.wpm,
            accuracy: self.accuracy,
            error_count: self.error_count,
            time_elapsed: self.time_elapsed,
            created_at,
        }
    }
}
