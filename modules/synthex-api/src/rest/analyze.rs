use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Json, Response,
    },
};
use futures::{future, StreamExt};
use serde::Deserialize;
use tracing::info;

use crate::relay::{relay, StreamEvent};
use crate::AppState;

#[derive(Deserialize)]
pub struct AnalyzeRequest {
    #[serde(default)]
    url: Option<String>,
}

/// Terminal sentinel the client waits for.
const DONE_SENTINEL: &str = "[DONE]";

/// Transport frame for one relay event. Tool-call fragments stay server-side.
pub fn sse_event(event: &StreamEvent) -> Option<Event> {
    match event {
        StreamEvent::TextDelta(text) | StreamEvent::Error(text) => Some(
            Event::default().data(
                serde_json::json!({"choices": [{"delta": {"content": text}}]}).to_string(),
            ),
        ),
        StreamEvent::Done => Some(Event::default().data(DONE_SENTINEL)),
        StreamEvent::ToolCallDelta { .. } => None,
    }
}

pub async fn api_analyze(
    State(state): State<Arc<AppState>>,
    Json(body): Json<AnalyzeRequest>,
) -> Response {
    let url = body.url.as_deref().map(str::trim).unwrap_or_default();
    if url.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": "Missing URL"})),
        )
            .into_response();
    }

    info!(url, "Analysis requested");

    let events = relay(
        state.completion.clone(),
        state.analyzer.clone(),
        url.to_string(),
    )
    .filter_map(|event| future::ready(sse_event(&event).map(Ok::<_, Infallible>)));

    Sse::new(events)
        .keep_alive(KeepAlive::new().interval(state.keep_alive))
        .into_response()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use ai_client::{ChatChunk, ChunkStream, ToolDefinitionWire, WireMessage};
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request};
    use serde_json::json;
    use synthex_analysis::AnalysisError;
    use synthex_common::{AnalysisReport, NoVideosFound};
    use tower::ServiceExt;

    use super::*;
    use crate::relay::{CompletionService, ProfileAnalysis};

    /// Answers every request with plain text and a stop.
    struct EchoCompletion;

    #[async_trait]
    impl CompletionService for EchoCompletion {
        async fn stream(
            &self,
            _messages: Vec<WireMessage>,
            _tools: &[ToolDefinitionWire],
        ) -> anyhow::Result<ChunkStream> {
            let chunks: Vec<anyhow::Result<ChatChunk>> = vec![
                json!({"choices": [{"index": 0, "delta": {"content": "Hi \"there\""}}]}),
                json!({"choices": [{"index": 0, "delta": {}, "finish_reason": "stop"}]}),
            ]
            .into_iter()
            .map(|v| Ok(serde_json::from_value(v).unwrap()))
            .collect();
            Ok(Box::pin(futures::stream::iter(chunks)))
        }
    }

    struct NoVideos;

    #[async_trait]
    impl ProfileAnalysis for NoVideos {
        async fn analyze(&self, _profile_url: &str) -> Result<AnalysisReport, AnalysisError> {
            Ok(AnalysisReport::NoVideos(NoVideosFound::new(None, vec![], "array")))
        }
    }

    fn app() -> axum::Router {
        crate::router(Arc::new(AppState {
            completion: Arc::new(EchoCompletion),
            analyzer: Arc::new(NoVideos),
            keep_alive: Duration::from_secs(15),
        }))
    }

    fn post(body: &str) -> Request<Body> {
        Request::post("/analyze")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn missing_url_is_bad_request() {
        let response = app().oneshot(post("{}")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn blank_url_is_bad_request() {
        let response = app().oneshot(post(r#"{"url": "   "}"#)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn malformed_body_is_rejected() {
        let response = app().oneshot(post("{not json")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn analysis_streams_content_frames_then_done() {
        let response = app()
            .oneshot(post(r#"{"url": "https://www.tiktok.com/@u"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/event-stream"
        );

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(body.to_vec()).unwrap();
        let frames: Vec<&str> = body
            .split("\n\n")
            .filter_map(|frame| frame.strip_prefix("data: "))
            .collect();

        assert_eq!(frames.last(), Some(&"[DONE]"));
        let first: serde_json::Value = serde_json::from_str(frames[0]).unwrap();
        assert_eq!(first["choices"][0]["delta"]["content"], "Hi \"there\"");
    }

    #[test]
    fn tool_fragments_are_not_forwarded() {
        let fragment = StreamEvent::ToolCallDelta {
            name: Some("analyze_profile".to_string()),
            arguments: "{".to_string(),
        };
        assert!(sse_event(&fragment).is_none());
        assert!(sse_event(&StreamEvent::Done).is_some());
        assert!(sse_event(&StreamEvent::Error("boom".to_string())).is_some());
    }
}
