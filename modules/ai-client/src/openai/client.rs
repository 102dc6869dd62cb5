use anyhow::{anyhow, Result};
use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use tracing::debug;

use super::sse::SseDecoder;
use super::types::*;
use super::ChunkStream;

const OPENAI_API_URL: &str = "https://api.openai.com/v1";

pub(crate) struct OpenAiClient {
    api_key: String,
    http: reqwest::Client,
    base_url: String,
}

impl OpenAiClient {
    pub fn new(api_key: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            http: reqwest::Client::new(),
            base_url: OPENAI_API_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.api_key))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("text/event-stream"));
        Ok(headers)
    }

    /// Send a streaming chat request and decode the SSE body into chunks. The
    /// stream ends at the `[DONE]` sentinel or when the body closes.
    pub async fn chat_stream(&self, request: &ChatRequest) -> Result<ChunkStream> {
        let url = format!("{}/chat/completions", self.base_url);

        debug!(
            model = %request.model,
            messages = request.messages.len(),
            tools = request.tools.as_ref().map_or(0, Vec::len),
            "OpenAI streaming chat request"
        );

        let response = self
            .http
            .post(&url)
            .headers(self.headers()?)
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            return Err(anyhow!("OpenAI API error ({}): {}", status, error_text));
        }

        let mut body = Box::pin(response.bytes_stream());
        let stream = async_stream::stream! {
            let mut decoder = SseDecoder::default();
            while let Some(bytes) = body.next().await {
                let bytes = match bytes {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        yield Err(anyhow!("OpenAI stream interrupted: {}", e));
                        return;
                    }
                };
                for frame in decoder.push_chunk(&bytes) {
                    if frame.is_done() {
                        return;
                    }
                    match serde_json::from_str::<ChatChunk>(&frame.data) {
                        Ok(chunk) => yield Ok(chunk),
                        Err(e) => {
                            yield Err(anyhow!("Invalid OpenAI stream chunk: {}", e));
                            return;
                        }
                    }
                }
            }
            if let Some(frame) = decoder.finish() {
                if !frame.is_done() {
                    match serde_json::from_str::<ChatChunk>(&frame.data) {
                        Ok(chunk) => yield Ok(chunk),
                        Err(e) => yield Err(anyhow!("Invalid OpenAI stream chunk: {}", e)),
                    }
                }
            }
        };

        Ok(Box::pin(stream))
    }
}
