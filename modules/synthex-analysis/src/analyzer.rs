use brightdata_client::{DatasetKind, JobPoller};
use serde_json::Value;
use tracing::{info, warn};

use synthex_common::{AnalysisReport, AnalysisResult};

use crate::enrichment::EnrichmentCoordinator;
use crate::error::AnalysisError;
use crate::normalize::{no_videos_error, normalize};
use crate::ranking::{rank, summarize};

/// The full profile pipeline behind the `analyze_profile` tool.
#[derive(Clone)]
pub struct ProfileAnalyzer {
    profiles: JobPoller,
    enrichment: EnrichmentCoordinator,
}

impl ProfileAnalyzer {
    pub fn new(profiles: JobPoller, enrichment: EnrichmentCoordinator) -> Self {
        Self {
            profiles,
            enrichment,
        }
    }

    /// Collect the profile and build its report. Only profile-stage provider
    /// failures are errors; an unusable payload becomes a no-videos report.
    pub async fn analyze(&self, profile_url: &str) -> Result<AnalysisReport, AnalysisError> {
        info!(url = profile_url, "Collecting profile");
        let snapshot = self
            .profiles
            .run(DatasetKind::Profile, &[profile_url.to_string()])
            .await?;
        if snapshot.partial {
            warn!(job_id = %snapshot.job_id, "Profile snapshot accepted as partial");
        }

        Ok(self.build_report(&snapshot.payload).await)
    }

    /// Everything after collection: normalize, rank, enrich, summarize.
    pub async fn build_report(&self, payload: &Value) -> AnalysisReport {
        let profile = match normalize(payload) {
            Ok(profile) => profile,
            Err(e) => {
                warn!(reason = %e, keys = ?e.received_keys, "No videos recognized in profile payload");
                return AnalysisReport::NoVideos(e.into_no_videos());
            }
        };

        let selection = rank(&profile.videos);
        if selection.qualifying.is_empty() {
            warn!(
                username = %profile.username,
                total = profile.videos.len(),
                "Profile has no videos with views"
            );
            return AnalysisReport::NoVideos(
                no_videos_error(payload, "no videos with views").into_no_videos(),
            );
        }

        info!(
            username = %profile.username,
            total = profile.videos.len(),
            qualifying = selection.qualifying.len(),
            "Ranked profile videos"
        );

        let enrichment = self.enrichment.enrich(&selection).await;
        let summary = summarize(&profile.videos, &selection);

        AnalysisReport::Complete(Box::new(AnalysisResult {
            username: profile.username,
            profile_summary: summary,
            enriched_data_count: enrichment.entries.len(),
            all_videos_basic_data: profile.videos.len(),
            top_performing_videos: selection.top,
            worst_performing_videos: selection.worst,
            detailed_analysis: enrichment.entries,
            raw_data_sample: profile.raw_sample,
            enrichment: enrichment.source,
        }))
    }
}
