use std::time::Duration;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, BrightDataError>;

#[derive(Debug, Error)]
pub enum BrightDataError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Job submission failed: {0}")]
    Submission(String),

    #[error("Job {job_id} failed: {message}")]
    JobFailed { job_id: String, message: String },

    #[error(
        "Job {job_id} produced no result after {} minutes and {attempts} attempts",
        .elapsed.as_secs() / 60
    )]
    JobTimeout {
        job_id: String,
        elapsed: Duration,
        attempts: u32,
    },
}

impl BrightDataError {
    /// The provider rejected the request itself (HTTP 400), usually a bad profile URL.
    pub fn is_bad_request(&self) -> bool {
        matches!(self, BrightDataError::Api { status: 400, .. })
    }
}

impl From<reqwest::Error> for BrightDataError {
    fn from(err: reqwest::Error) -> Self {
        BrightDataError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for BrightDataError {
    fn from(err: serde_json::Error) -> Self {
        BrightDataError::Parse(err.to_string())
    }
}
