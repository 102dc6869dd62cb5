//! Maps provider payloads of unknown shape onto [`ProfileSnapshot`].
//!
//! Collectors disagree on where the videos live and what each counter is
//! called, so every lookup walks a list of aliases in priority order.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;
use tracing::debug;

use synthex_common::{engagement_rate, CanonicalVideo, ProfileSnapshot};

use crate::error::SchemaRecognitionError;

/// Record fields that may hold the video list.
const VIDEO_LIST_KEYS: &[&str] = &["top_videos", "videos", "top_posts_data", "posts", "items"];

const VIEW_KEYS: &[&str] = &["playcount", "views"];
const LIKE_KEYS: &[&str] = &["diggcount", "likes"];
const COMMENT_KEYS: &[&str] = &["commentcount", "comments"];
const SHARE_KEYS: &[&str] = &["share_count", "shares"];
const URL_KEYS: &[&str] = &["video_url", "post_url", "url"];
const ID_KEYS: &[&str] = &["video_id", "post_id", "id"];
const DESCRIPTION_KEYS: &[&str] = &["description", "desc", "text"];
const CREATED_KEYS: &[&str] = &["create_date", "create_time", "created_time"];

const DEFAULT_USERNAME: &str = "user";

/// Normalize a profile payload. Pure: the same payload always yields the same
/// snapshot.
pub fn normalize(raw: &Value) -> Result<ProfileSnapshot, SchemaRecognitionError> {
    let records = record_list(raw, true)
        .ok_or_else(|| unrecognized(raw, &[], "payload has no record list"))?;

    let Some(raw_videos) = video_list(&records) else {
        return Err(unrecognized(
            raw,
            &records,
            "no videos under any known key",
        ));
    };

    let username = records
        .first()
        .and_then(|r| first_text(r, &["account_id", "nickname"]))
        .unwrap_or_else(|| DEFAULT_USERNAME.to_string());

    let videos: Vec<CanonicalVideo> = raw_videos
        .iter()
        .filter(|v| v.is_object())
        .map(|v| canonical_video(v, &username))
        .collect();

    if videos.is_empty() {
        return Err(unrecognized(raw, &records, "video list holds no records"));
    }

    debug!(username = %username, count = videos.len(), "Normalized profile videos");

    Ok(ProfileSnapshot {
        username,
        videos,
        raw_sample: raw_videos.iter().take(2).cloned().collect(),
    })
}

/// Build the error the pipeline turns into a "no videos" report, using the
/// payload's first record as the sample.
pub fn no_videos_error(raw: &Value, reason: &str) -> SchemaRecognitionError {
    let records = record_list(raw, true).unwrap_or_default();
    unrecognized(raw, &records, reason)
}

fn unrecognized(raw: &Value, records: &[&Value], reason: &str) -> SchemaRecognitionError {
    let sample = records.first().map(|r| (*r).clone());
    let received_keys = sample
        .as_ref()
        .and_then(Value::as_object)
        .map(|m| m.keys().cloned().collect())
        .unwrap_or_default();
    SchemaRecognitionError {
        reason: reason.to_string(),
        sample,
        received_keys,
        data_structure: structure_name(raw),
    }
}

pub(crate) fn structure_name(raw: &Value) -> &'static str {
    match raw {
        Value::Array(_) => "array",
        Value::Object(_) => "object",
        Value::String(_) => "string",
        Value::Number(_) => "number",
        Value::Bool(_) => "boolean",
        Value::Null => "null",
    }
}

/// Resolve the list of records in a payload: a top-level array, a `data`
/// array, or a `data` object. With `accept_bare`, an object carrying no
/// `status` is itself the single record.
pub(crate) fn record_list(raw: &Value, accept_bare: bool) -> Option<Vec<&Value>> {
    match raw {
        Value::Array(rows) => Some(rows.iter().collect()),
        Value::Object(map) => match map.get("data") {
            Some(Value::Array(rows)) => Some(rows.iter().collect()),
            Some(record @ Value::Object(_)) => Some(vec![record]),
            _ if accept_bare && !map.contains_key("status") => Some(vec![raw]),
            _ => None,
        },
        _ => None,
    }
}

fn video_list<'a>(records: &[&'a Value]) -> Option<&'a Vec<Value>> {
    let first = *records.first()?;
    videos_in(first).or_else(|| records.iter().find_map(|r| videos_in(*r)))
}

fn videos_in(record: &Value) -> Option<&Vec<Value>> {
    VIDEO_LIST_KEYS.iter().find_map(|key| {
        record
            .get(key)
            .and_then(Value::as_array)
            .filter(|list| !list.is_empty())
    })
}

fn canonical_video(raw: &Value, username: &str) -> CanonicalVideo {
    let views = first_count(raw, VIEW_KEYS);
    let likes = first_count(raw, LIKE_KEYS);
    let comments = first_count(raw, COMMENT_KEYS);
    let shares = first_count(raw, SHARE_KEYS);

    let id = first_text(raw, ID_KEYS).unwrap_or_default();
    let url = first_text(raw, URL_KEYS).unwrap_or_else(|| {
        if id.is_empty() {
            String::new()
        } else {
            format!("https://www.tiktok.com/@{username}/video/{id}")
        }
    });

    CanonicalVideo {
        id,
        url,
        views,
        likes,
        comments,
        shares,
        created_at: CREATED_KEYS
            .iter()
            .find_map(|key| raw.get(key).and_then(parse_timestamp)),
        description: first_text(raw, DESCRIPTION_KEYS).unwrap_or_default(),
        engagement_rate: engagement_rate(views, likes, comments, shares),
    }
}

/// First alias with a non-zero count.
fn first_count(raw: &Value, keys: &[&str]) -> u64 {
    keys.iter()
        .map(|key| raw.get(key).map(as_count).unwrap_or(0))
        .find(|&n| n > 0)
        .unwrap_or(0)
}

/// Counters arrive as integers, floats, or numeric strings.
fn as_count(value: &Value) -> u64 {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite() && *f > 0.0).map(|f| f as u64))
            .unwrap_or(0),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<u64>()
                .ok()
                .or_else(|| {
                    s.parse::<f64>()
                        .ok()
                        .filter(|f| f.is_finite() && *f > 0.0)
                        .map(|f| f as u64)
                })
                .unwrap_or(0)
        }
        _ => 0,
    }
}

/// First alias with a non-empty string. Numeric ids are rendered as text.
fn first_text(raw: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match raw.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => n.as_i64().and_then(from_epoch),
        Value::String(s) => {
            let s = s.trim();
            if let Ok(secs) = s.parse::<i64>() {
                return from_epoch(secs);
            }
            DateTime::parse_from_rfc3339(s)
                .map(|dt| dt.with_timezone(&Utc))
                .ok()
                .or_else(|| {
                    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
                        .ok()
                        .map(|naive| naive.and_utc())
                })
        }
        _ => None,
    }
}

fn from_epoch(secs: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_opt(secs, 0).single()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn one_video_record() -> Value {
        json!({
            "account_id": "u1",
            "top_videos": [{
                "video_id": "1",
                "playcount": 1000,
                "diggcount": 50,
                "commentcount": 10,
                "share_count": 5
            }]
        })
    }

    #[test]
    fn wrapped_profile_yields_single_video() {
        let snapshot = normalize(&json!({"data": [one_video_record()]})).unwrap();

        assert_eq!(snapshot.username, "u1");
        assert_eq!(snapshot.videos.len(), 1);
        let video = &snapshot.videos[0];
        assert_eq!(video.views, 1000);
        assert!((video.engagement_rate - 6.5).abs() < 1e-9);
        assert_eq!(video.url, "https://www.tiktok.com/@u1/video/1");
    }

    #[test]
    fn same_result_for_array_wrapped_and_bare_payloads() {
        let array = normalize(&json!([one_video_record()])).unwrap();
        let wrapped = normalize(&json!({"status": "ready", "data": [one_video_record()]})).unwrap();
        let bare = normalize(&one_video_record()).unwrap();
        let data_object = normalize(&json!({"data": one_video_record()})).unwrap();

        assert_eq!(array, wrapped);
        assert_eq!(array, bare);
        assert_eq!(array, data_object);
    }

    #[test]
    fn normalizing_twice_gives_identical_snapshots() {
        let raw = json!([one_video_record()]);
        assert_eq!(normalize(&raw).unwrap(), normalize(&raw).unwrap());
    }

    #[test]
    fn alias_priority_prefers_first_nonzero() {
        let video = canonical_video(
            &json!({
                "playcount": 0,
                "views": "2500",
                "diggcount": 10,
                "likes": 99,
                "comments": 3,
                "shares": 1.0,
                "post_url": "https://www.tiktok.com/@a/video/9",
                "url": "https://example.com/ignored",
                "post_id": 9,
                "desc": "hello"
            }),
            "a",
        );

        assert_eq!(video.views, 2500);
        assert_eq!(video.likes, 10);
        assert_eq!(video.comments, 3);
        assert_eq!(video.shares, 1);
        assert_eq!(video.url, "https://www.tiktok.com/@a/video/9");
        assert_eq!(video.id, "9");
        assert_eq!(video.description, "hello");
    }

    #[test]
    fn missing_id_and_url_leaves_url_empty() {
        let video = canonical_video(&json!({"views": 10}), "a");
        assert_eq!(video.url, "");
        assert_eq!(video.id, "");
    }

    #[test]
    fn timestamps_accept_rfc3339_and_epoch() {
        let rfc = canonical_video(&json!({"create_date": "2024-05-01T12:00:00Z"}), "a");
        let epoch = canonical_video(&json!({"create_time": 1714564800}), "a");
        let epoch_text = canonical_video(&json!({"created_time": "1714564800"}), "a");

        assert_eq!(rfc.created_at, epoch.created_at);
        assert_eq!(epoch.created_at, epoch_text.created_at);
        assert!(rfc.created_at.is_some());
        assert!(canonical_video(&json!({"create_date": "soon"}), "a").created_at.is_none());
    }

    #[test]
    fn falls_back_to_scanning_other_records() {
        let raw = json!([
            {"account_id": "u1", "top_videos": []},
            {"posts": [{"id": "p1", "views": 5}]}
        ]);
        let snapshot = normalize(&raw).unwrap();
        assert_eq!(snapshot.username, "u1");
        assert_eq!(snapshot.videos[0].id, "p1");
    }

    #[test]
    fn username_falls_back_to_nickname_then_default() {
        let nick = normalize(&json!([{"nickname": "Nick", "videos": [{"id": "1"}]}])).unwrap();
        assert_eq!(nick.username, "Nick");

        let anon = normalize(&json!([{"videos": [{"id": "1"}]}])).unwrap();
        assert_eq!(anon.username, "user");
    }

    #[test]
    fn raw_sample_keeps_first_two_videos() {
        let raw = json!([{"videos": [{"id": "1"}, {"id": "2"}, {"id": "3"}]}]);
        let snapshot = normalize(&raw).unwrap();
        assert_eq!(snapshot.raw_sample, vec![json!({"id": "1"}), json!({"id": "2"})]);
    }

    #[test]
    fn profile_without_videos_reports_received_keys() {
        let err = normalize(&json!([{"account_id": "u1", "followers": 10}])).unwrap_err();

        assert_eq!(err.data_structure, "array");
        assert_eq!(err.received_keys, vec!["account_id", "followers"]);
        assert_eq!(err.sample, Some(json!({"account_id": "u1", "followers": 10})));
    }

    #[test]
    fn status_only_object_has_no_record_list() {
        let err = normalize(&json!({"status": "running"})).unwrap_err();
        assert!(err.sample.is_none());
        assert!(err.received_keys.is_empty());
        assert_eq!(err.data_structure, "object");
    }

    #[test]
    fn empty_array_has_no_videos() {
        assert!(normalize(&json!([])).is_err());
    }
}
