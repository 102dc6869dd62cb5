pub mod error;
pub mod poller;
pub mod shape;
pub mod types;

pub use error::{BrightDataError, Result};
pub use poller::{JobPoller, PollPolicy};
pub use shape::{classify, SnapshotShape};
pub use types::{
    CompletedSnapshot, DatasetKind, JobState, ScrapeJob, TriggerInput, TriggerResponse,
};

use async_trait::async_trait;

const BASE_URL: &str = "https://api.brightdata.com/datasets/v3";

/// Dataset ID for the TikTok profiles collector.
const TIKTOK_PROFILES_DATASET: &str = "gd_l1villgoiiidt09ci";

/// Dataset ID for the TikTok posts (per-video detail) collector.
const TIKTOK_POSTS_DATASET: &str = "gd_lu702nij2f790tmv9h";

/// The two calls the poller needs from a scraping provider.
#[async_trait]
pub trait ScrapeProvider: Send + Sync {
    /// Start a collection job; returns the provider's snapshot id.
    async fn trigger(&self, kind: DatasetKind, inputs: &[TriggerInput]) -> Result<String>;
    /// Fetch the current snapshot body, whatever shape it has.
    async fn snapshot(&self, snapshot_id: &str) -> Result<serde_json::Value>;
}

pub struct BrightDataClient {
    client: reqwest::Client,
    token: String,
    base_url: String,
    profile_dataset: String,
    detail_dataset: String,
}

impl BrightDataClient {
    pub fn new(token: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            token,
            base_url: BASE_URL.to_string(),
            profile_dataset: TIKTOK_PROFILES_DATASET.to_string(),
            detail_dataset: TIKTOK_POSTS_DATASET.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_dataset(mut self, kind: DatasetKind, dataset_id: &str) -> Self {
        match kind {
            DatasetKind::Profile => self.profile_dataset = dataset_id.to_string(),
            DatasetKind::VideoDetail => self.detail_dataset = dataset_id.to_string(),
        }
        self
    }

    pub fn dataset_id(&self, kind: DatasetKind) -> &str {
        match kind {
            DatasetKind::Profile => &self.profile_dataset,
            DatasetKind::VideoDetail => &self.detail_dataset,
        }
    }

    async fn check(resp: reqwest::Response) -> Result<reqwest::Response> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(BrightDataError::Api {
                status: status.as_u16(),
                message: body,
            });
        }
        Ok(resp)
    }

    /// Trigger a collection job. Fails with `Submission` when the provider
    /// accepts the request but returns no snapshot id.
    pub async fn trigger_collection(
        &self,
        kind: DatasetKind,
        inputs: &[TriggerInput],
    ) -> Result<String> {
        let url = format!(
            "{}/trigger?dataset_id={}&include_errors=true",
            self.base_url,
            self.dataset_id(kind)
        );
        tracing::debug!(dataset = %kind, inputs = inputs.len(), "Triggering Bright Data collection");

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(inputs)
            .send()
            .await?;
        let resp = Self::check(resp).await?;

        let body: TriggerResponse = resp.json().await?;
        body.snapshot_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                BrightDataError::Submission(format!("no snapshot_id returned for {kind} job"))
            })
    }

    /// Fetch a snapshot in JSON format.
    pub async fn fetch_snapshot(&self, snapshot_id: &str) -> Result<serde_json::Value> {
        let url = format!("{}/snapshot/{}?format=json", self.base_url, snapshot_id);
        let resp = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await?;
        let resp = Self::check(resp).await?;

        let text = resp.text().await?;
        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl ScrapeProvider for BrightDataClient {
    async fn trigger(&self, kind: DatasetKind, inputs: &[TriggerInput]) -> Result<String> {
        self.trigger_collection(kind, inputs).await
    }

    async fn snapshot(&self, snapshot_id: &str) -> Result<serde_json::Value> {
        self.fetch_snapshot(snapshot_id).await
    }
}
