use std::collections::HashSet;

use synthex_common::{CanonicalVideo, ProfileSummary, RankedSelection};

/// Size of each extremal subset.
pub const SELECTION_SIZE: usize = 10;

const VIDEO_HOST: &str = "tiktok.com";

/// Drop unviewed videos, sort the rest by engagement (stable, descending) and
/// take both ends. `worst[0]` is the lowest performer.
pub fn rank(videos: &[CanonicalVideo]) -> RankedSelection {
    let mut qualifying: Vec<CanonicalVideo> =
        videos.iter().filter(|v| v.views > 0).cloned().collect();
    qualifying.sort_by(|a, b| b.engagement_rate.total_cmp(&a.engagement_rate));

    let top = qualifying.iter().take(SELECTION_SIZE).cloned().collect();
    let worst = qualifying.iter().rev().take(SELECTION_SIZE).cloned().collect();

    RankedSelection {
        top,
        worst,
        qualifying,
    }
}

/// Totals over every normalized video; the average only over qualifying ones.
pub fn summarize(videos: &[CanonicalVideo], selection: &RankedSelection) -> ProfileSummary {
    let average_engagement = if selection.qualifying.is_empty() {
        0.0
    } else {
        selection
            .qualifying
            .iter()
            .map(|v| v.engagement_rate)
            .sum::<f64>()
            / selection.qualifying.len() as f64
    };

    ProfileSummary {
        total_videos: videos.len(),
        total_views: total(videos, |v| v.views),
        total_likes: total(videos, |v| v.likes),
        total_comments: total(videos, |v| v.comments),
        total_shares: total(videos, |v| v.shares),
        average_engagement,
    }
}

/// Saturating sum of one counter; provider values may already be `u64::MAX`.
fn total(videos: &[CanonicalVideo], counter: impl Fn(&CanonicalVideo) -> u64) -> u64 {
    videos.iter().map(counter).fold(0, u64::saturating_add)
}

/// Detail-job inputs: valid video URLs from `top ++ worst`, first occurrence
/// kept when the two subsets overlap.
pub fn enrichment_candidates(selection: &RankedSelection) -> Vec<String> {
    let mut seen = HashSet::new();
    selection
        .top
        .iter()
        .chain(selection.worst.iter())
        .map(|v| v.url.as_str())
        .filter(|url| is_video_url(url))
        .filter(|url| seen.insert(*url))
        .map(str::to_string)
        .collect()
}

/// An http(s) URL on the video host (or a subdomain) whose path names a video.
pub fn is_video_url(raw: &str) -> bool {
    let Ok(parsed) = url::Url::parse(raw) else {
        return false;
    };
    if !matches!(parsed.scheme(), "http" | "https") {
        return false;
    }
    let host_ok = parsed.host_str().is_some_and(|host| {
        host == VIDEO_HOST || host.ends_with(&format!(".{VIDEO_HOST}"))
    });
    host_ok && parsed.path().contains("/video/")
}
