use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

// --- Canonical records ---

/// One video in the canonical shape every provider schema is mapped into.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalVideo {
    pub id: String,
    pub url: String,
    pub views: u64,
    pub likes: u64,
    pub comments: u64,
    pub shares: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    pub description: String,
    /// Derived from the counters, never taken from the provider.
    pub engagement_rate: f64,
}

impl CanonicalVideo {
    pub fn new(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            views: 0,
            likes: 0,
            comments: 0,
            shares: 0,
            created_at: None,
            description: String::new(),
            engagement_rate: 0.0,
        }
    }

    pub fn with_counts(mut self, views: u64, likes: u64, comments: u64, shares: u64) -> Self {
        self.views = views;
        self.likes = likes;
        self.comments = comments;
        self.shares = shares;
        self.engagement_rate = engagement_rate(views, likes, comments, shares);
        self
    }
}

/// `(likes + comments + shares) / views * 100`, or 0 for unviewed videos.
/// Summed in `f64` since provider counters can sit anywhere up to `u64::MAX`.
pub fn engagement_rate(views: u64, likes: u64, comments: u64, shares: u64) -> f64 {
    if views == 0 {
        return 0.0;
    }
    (likes as f64 + comments as f64 + shares as f64) / views as f64 * 100.0
}

/// Normalized view of one profile collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSnapshot {
    pub username: String,
    pub videos: Vec<CanonicalVideo>,
    /// First two raw video records as the provider sent them.
    pub raw_sample: Vec<Value>,
}

/// Extremal subsets drawn from one sorted sequence of qualifying videos.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RankedSelection {
    /// Up to 10, highest engagement first.
    pub top: Vec<CanonicalVideo>,
    /// Up to 10, lowest engagement first.
    pub worst: Vec<CanonicalVideo>,
    /// Every video with `views > 0`, sorted by engagement descending.
    pub qualifying: Vec<CanonicalVideo>,
}

impl RankedSelection {
    /// `top ++ worst`, the order enrichment candidates and the fallback use.
    pub fn combined(&self) -> Vec<CanonicalVideo> {
        self.top.iter().chain(self.worst.iter()).cloned().collect()
    }
}

// --- Tool output ---

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSummary {
    pub total_videos: usize,
    pub total_views: u64,
    pub total_likes: u64,
    pub total_comments: u64,
    pub total_shares: u64,
    pub average_engagement: f64,
}

/// Where `detailedAnalysis` came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EnrichmentSource {
    Enriched,
    Fallback,
}

/// One entry of `detailedAnalysis`: a raw detail row or the basic record it
/// stands in for.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DetailEntry {
    Detail(Value),
    Basic(CanonicalVideo),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub username: String,
    pub profile_summary: ProfileSummary,
    pub top_performing_videos: Vec<CanonicalVideo>,
    pub worst_performing_videos: Vec<CanonicalVideo>,
    pub detailed_analysis: Vec<DetailEntry>,
    pub enriched_data_count: usize,
    pub all_videos_basic_data: usize,
    pub raw_data_sample: Vec<Value>,
    pub enrichment: EnrichmentSource,
}

pub const NO_VIDEOS_MESSAGE: &str = "No videos found for this profile";

/// Tool output when the profile payload held no usable videos.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoVideosFound {
    pub error: String,
    pub profile_data: Option<Value>,
    pub debug_info: DebugInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugInfo {
    pub received_keys: Vec<String>,
    pub data_structure: String,
}

impl NoVideosFound {
    pub fn new(profile_data: Option<Value>, received_keys: Vec<String>, data_structure: &str) -> Self {
        Self {
            error: NO_VIDEOS_MESSAGE.to_string(),
            profile_data,
            debug_info: DebugInfo {
                received_keys,
                data_structure: data_structure.to_string(),
            },
        }
    }
}

/// What the `analyze_profile` tool hands back to the model.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AnalysisReport {
    Complete(Box<AnalysisResult>),
    NoVideos(NoVideosFound),
}

impl AnalysisReport {
    pub fn is_complete(&self) -> bool {
        matches!(self, AnalysisReport::Complete(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn engagement_rate_is_zero_without_views() {
        assert_eq!(engagement_rate(0, 10, 10, 10), 0.0);
    }

    #[test]
    fn with_counts_derives_engagement() {
        let video = CanonicalVideo::new("1", "").with_counts(1000, 50, 10, 5);
        assert!((video.engagement_rate - 6.5).abs() < 1e-9);
    }

    #[test]
    fn engagement_rate_survives_saturated_counters() {
        let rate = engagement_rate(10, u64::MAX, u64::MAX, 5);
        assert!(rate.is_finite());
        assert!(rate > 0.0);
    }

    #[test]
    fn video_serializes_camel_case_without_missing_timestamp() {
        let value = serde_json::to_value(CanonicalVideo::new("7", "u")).unwrap();
        assert_eq!(value["engagementRate"], json!(0.0));
        assert!(value.get("createdAt").is_none());
    }

    #[test]
    fn combined_keeps_top_then_worst() {
        let a = CanonicalVideo::new("a", "");
        let b = CanonicalVideo::new("b", "");
        let selection = RankedSelection {
            top: vec![a.clone()],
            worst: vec![b.clone()],
            qualifying: vec![a.clone(), b.clone()],
        };
        let ids: Vec<_> = selection.combined().into_iter().map(|v| v.id).collect();
        assert_eq!(ids, ["a", "b"]);
    }

    #[test]
    fn no_videos_report_serializes_flat() {
        let report = AnalysisReport::NoVideos(NoVideosFound::new(
            None,
            vec!["status".to_string()],
            "object",
        ));
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["error"], NO_VIDEOS_MESSAGE);
        assert_eq!(value["profileData"], Value::Null);
        assert_eq!(value["debugInfo"]["receivedKeys"], json!(["status"]));
        assert_eq!(value["debugInfo"]["dataStructure"], "object");
    }
}
