use synthex_analysis::AnalysisError;
use thiserror::Error;

const ANALYSIS_ERROR_PREFIX: &str = "❌ Error during analysis:\n\n";

const BAD_REQUEST_GUIDANCE: &str = "⚠️ Problem with TikTok API - Please try:\n\
• Check that the URL is correct\n\
• Contact technical support if the problem persists\n\n";

/// Failures inside a streamed exchange. They reach the client as text, never
/// as an HTTP status.
#[derive(Error, Debug)]
pub enum StreamError {
    #[error("completion service error: {0}")]
    Completion(String),

    #[error("unknown tool requested: {0}")]
    UnknownTool(String),

    #[error("invalid tool arguments: {0}")]
    InvalidArguments(String),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error("failed to encode analysis report: {0}")]
    Encode(#[from] serde_json::Error),
}

impl StreamError {
    /// Text shown to the client in place of the report.
    pub fn user_message(&self) -> String {
        match self {
            StreamError::Completion(message) => format!("❌ Error: {message}\n\n"),
            StreamError::Analysis(e) if e.is_bad_request() => {
                format!("{ANALYSIS_ERROR_PREFIX}{BAD_REQUEST_GUIDANCE}")
            }
            other => format!("{ANALYSIS_ERROR_PREFIX}{other}"),
        }
    }
}
