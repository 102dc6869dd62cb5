use brightdata_client::BrightDataError;
use serde_json::Value;
use synthex_common::NoVideosFound;
use thiserror::Error;

/// The payload held no list of records or no usable videos.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{reason}")]
pub struct SchemaRecognitionError {
    pub reason: String,
    /// First raw record, if there was one.
    pub sample: Option<Value>,
    pub received_keys: Vec<String>,
    pub data_structure: &'static str,
}

impl SchemaRecognitionError {
    pub fn into_no_videos(self) -> NoVideosFound {
        NoVideosFound::new(self.sample, self.received_keys, self.data_structure)
    }
}

/// Detail collection failed. Always absorbed by the coordinator.
#[derive(Error, Debug)]
pub enum EnrichmentError {
    #[error("detail collection failed: {0}")]
    Provider(#[from] BrightDataError),

    #[error("detail snapshot has no recognizable rows ({structure})")]
    UnrecognizedShape { structure: &'static str },
}

/// Profile-stage failure; ends the analysis.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error(transparent)]
    Provider(#[from] BrightDataError),
}

impl AnalysisError {
    /// The provider rejected the request itself, usually a bad profile URL.
    pub fn is_bad_request(&self) -> bool {
        match self {
            AnalysisError::Provider(e) => e.is_bad_request(),
        }
    }
}
