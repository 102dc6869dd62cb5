//! Classification of snapshot payloads.
//!
//! The snapshot endpoint has no stable contract: depending on the dataset and
//! how far along the job is, it answers with a bare array of rows, a
//! `{status, data}` envelope, a single bare record, or a status-only object.
//! Everything downstream works off the [`SnapshotShape`] computed here once
//! per response.

use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq)]
pub enum SnapshotShape {
    /// Non-empty top-level array of records.
    Array(Vec<Value>),
    /// Object carrying `status: "ready"` or a non-empty `data` list.
    Wrapped(Value),
    /// Object without any status field, taken to be a single record.
    Bare(Value),
    /// Anything else: still collecting (or an empty/scalar body).
    Pending {
        status: Option<String>,
        payload: Value,
    },
    /// Provider reported `status: "failed"`.
    Failed { message: String },
}

impl SnapshotShape {
    pub fn label(&self) -> &'static str {
        match self {
            SnapshotShape::Array(_) => "array",
            SnapshotShape::Wrapped(_) => "wrapped",
            SnapshotShape::Bare(_) => "bare",
            SnapshotShape::Pending { .. } => "pending",
            SnapshotShape::Failed { .. } => "failed",
        }
    }
}

fn status_of(map: &Map<String, Value>) -> Option<&str> {
    map.get("status")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

fn has_nonempty_data(map: &Map<String, Value>) -> bool {
    map.get("data")
        .and_then(Value::as_array)
        .is_some_and(|rows| !rows.is_empty())
}

/// Classify a raw snapshot body. Checks run in a fixed order: non-empty array,
/// `status == "ready"`, non-empty `data` list, bare object, `status == "failed"`,
/// then pending.
pub fn classify(payload: Value) -> SnapshotShape {
    match payload {
        Value::Array(rows) if !rows.is_empty() => SnapshotShape::Array(rows),
        Value::Object(map) => {
            let status = status_of(&map).map(str::to_ascii_lowercase);
            match status.as_deref() {
                Some("ready") => SnapshotShape::Wrapped(Value::Object(map)),
                _ if has_nonempty_data(&map) => SnapshotShape::Wrapped(Value::Object(map)),
                None => SnapshotShape::Bare(Value::Object(map)),
                Some("failed") => {
                    let message = map
                        .get("error")
                        .or_else(|| map.get("message"))
                        .and_then(Value::as_str)
                        .unwrap_or("provider reported status 'failed'")
                        .to_string();
                    SnapshotShape::Failed { message }
                }
                Some(other) => SnapshotShape::Pending {
                    status: Some(other.to_string()),
                    payload: Value::Object(map),
                },
            }
        }
        other => SnapshotShape::Pending {
            status: None,
            payload: other,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nonempty_array_is_ready_data() {
        let shape = classify(json!([{"account_id": "u1"}]));
        assert!(matches!(shape, SnapshotShape::Array(rows) if rows.len() == 1));
    }

    #[test]
    fn empty_array_is_still_pending() {
        assert!(matches!(
            classify(json!([])),
            SnapshotShape::Pending { status: None, .. }
        ));
    }

    #[test]
    fn ready_status_is_wrapped_even_without_rows() {
        assert_eq!(classify(json!({"status": "ready"})).label(), "wrapped");
    }

    #[test]
    fn data_rows_win_over_running_status() {
        let shape = classify(json!({"status": "running", "data": [{"id": 1}]}));
        assert_eq!(shape.label(), "wrapped");
    }

    #[test]
    fn object_without_status_is_bare_record() {
        let shape = classify(json!({"account_id": "u1", "top_videos": []}));
        assert_eq!(shape.label(), "bare");
    }

    #[test]
    fn failed_status_carries_provider_message() {
        let shape = classify(json!({"status": "failed", "error": "quota exceeded"}));
        assert_eq!(
            shape,
            SnapshotShape::Failed {
                message: "quota exceeded".to_string()
            }
        );
    }

    #[test]
    fn running_status_is_pending() {
        let shape = classify(json!({"status": "running", "message": "Snapshot is not ready yet"}));
        match shape {
            SnapshotShape::Pending { status, .. } => assert_eq!(status.as_deref(), Some("running")),
            other => panic!("expected pending, got {other:?}"),
        }
    }

    #[test]
    fn scalar_body_is_pending() {
        assert_eq!(classify(json!("building")).label(), "pending");
        assert_eq!(classify(Value::Null).label(), "pending");
    }
}
