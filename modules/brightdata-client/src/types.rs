use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which Bright Data dataset a job collects from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatasetKind {
    /// Profile-level collection: account metadata plus its recent videos.
    Profile,
    /// Per-video detail for an explicit list of video URLs.
    VideoDetail,
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasetKind::Profile => write!(f, "profile"),
            DatasetKind::VideoDetail => write!(f, "video_detail"),
        }
    }
}

/// One input row for the trigger endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TriggerInput {
    pub url: String,
    pub country: String,
}

impl TriggerInput {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            country: String::new(),
        }
    }
}

/// Body returned by `POST /trigger`.
#[derive(Debug, Clone, Deserialize)]
pub struct TriggerResponse {
    #[serde(default)]
    pub snapshot_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Pending,
    Running,
    Ready,
    Failed,
    TimedOut,
}

/// A submitted snapshot job. Only the poller mutates it; it is dropped once
/// polling finishes.
#[derive(Debug, Clone)]
pub struct ScrapeJob {
    pub id: String,
    pub dataset_kind: DatasetKind,
    pub submitted_at: DateTime<Utc>,
    pub attempts: u32,
    pub state: JobState,
}

impl ScrapeJob {
    pub fn new(id: impl Into<String>, dataset_kind: DatasetKind) -> Self {
        Self {
            id: id.into(),
            dataset_kind,
            submitted_at: Utc::now(),
            attempts: 0,
            state: JobState::Pending,
        }
    }
}

/// Result of a job that reached a usable terminal classification.
#[derive(Debug, Clone)]
pub struct CompletedSnapshot {
    pub job_id: String,
    pub payload: serde_json::Value,
    pub attempts: u32,
    pub elapsed: Duration,
    /// True when the payload was accepted after the attempt ceiling without
    /// the provider ever reporting it ready.
    pub partial: bool,
}
