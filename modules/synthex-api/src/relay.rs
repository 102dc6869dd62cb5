//! Two-phase completion relay.
//!
//! Phase 1 offers the model the `analyze_profile` tool and relays whatever it
//! says while deciding. Once it finishes a tool call, the profile pipeline runs
//! as that tool and phase 2 feeds the report back, relaying the final answer.
//! The whole exchange is one lazily driven stream: dropping it (client
//! disconnect) drops the in-flight poll and completion futures with it.

use std::sync::Arc;

use ai_client::{ChunkStream, OpenAi, ToolCallDelta, ToolDefinitionWire, WireMessage, WireToolCall};
use async_trait::async_trait;
use futures::{Stream, StreamExt};
use tracing::{debug, info, warn};

use synthex_analysis::{AnalysisError, ProfileAnalyzer};
use synthex_common::AnalysisReport;

use crate::error::StreamError;
use crate::prompt::{analyze_tool, initial_messages, AnalyzeProfileArgs, ANALYZE_TOOL};

/// Id used for the tool call when the model does not supply one.
const DEFAULT_TOOL_CALL_ID: &str = "call_analyze";

// --- Seams ---

/// Streaming chat completions.
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn stream(
        &self,
        messages: Vec<WireMessage>,
        tools: &[ToolDefinitionWire],
    ) -> anyhow::Result<ChunkStream>;
}

#[async_trait]
impl CompletionService for OpenAi {
    async fn stream(
        &self,
        messages: Vec<WireMessage>,
        tools: &[ToolDefinitionWire],
    ) -> anyhow::Result<ChunkStream> {
        self.stream_chat(messages, tools).await
    }
}

/// The work behind the `analyze_profile` tool.
#[async_trait]
pub trait ProfileAnalysis: Send + Sync {
    async fn analyze(&self, profile_url: &str) -> Result<AnalysisReport, AnalysisError>;
}

#[async_trait]
impl ProfileAnalysis for ProfileAnalyzer {
    async fn analyze(&self, profile_url: &str) -> Result<AnalysisReport, AnalysisError> {
        ProfileAnalyzer::analyze(self, profile_url).await
    }
}

// --- Events ---

/// What the relay hands to the transport.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    TextDelta(String),
    ToolCallDelta {
        name: Option<String>,
        arguments: String,
    },
    Done,
    Error(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RelayState {
    Text,
    ToolAccumulating,
    ToolExecuting,
    FinalText,
}

/// One tool call assembled from streamed fragments. Fragments for other call
/// indices are ignored; only the first call runs.
#[derive(Debug, Default)]
struct PendingToolCall {
    index: Option<u32>,
    id: Option<String>,
    name: Option<String>,
    arguments: String,
}

impl PendingToolCall {
    /// Returns false when the fragment belongs to a different call.
    fn absorb(&mut self, delta: &ToolCallDelta) -> bool {
        match self.index {
            Some(index) if index != delta.index => return false,
            None => self.index = Some(delta.index),
            _ => {}
        }
        if let Some(id) = delta.id.as_ref().filter(|id| !id.is_empty()) {
            self.id = Some(id.clone());
        }
        if let Some(function) = &delta.function {
            if let Some(name) = function.name.as_ref().filter(|n| !n.is_empty()) {
                self.name = Some(name.clone());
            }
            if let Some(fragment) = &function.arguments {
                self.arguments.push_str(fragment);
            }
        }
        true
    }

    fn is_started(&self) -> bool {
        self.index.is_some()
    }

    fn id(&self) -> &str {
        self.id.as_deref().unwrap_or(DEFAULT_TOOL_CALL_ID)
    }

    fn parse(&self) -> Result<AnalyzeProfileArgs, StreamError> {
        let name = self.name.as_deref().unwrap_or_default();
        if name != ANALYZE_TOOL {
            return Err(StreamError::UnknownTool(name.to_string()));
        }
        let args: AnalyzeProfileArgs = serde_json::from_str(&self.arguments)
            .map_err(|e| StreamError::InvalidArguments(e.to_string()))?;
        if args.url.trim().is_empty() {
            return Err(StreamError::InvalidArguments("url is empty".to_string()));
        }
        Ok(args)
    }
}

/// Relay one analysis request. Always ends with `Done`.
pub fn relay(
    completion: Arc<dyn CompletionService>,
    analyzer: Arc<dyn ProfileAnalysis>,
    profile_url: String,
) -> impl Stream<Item = StreamEvent> + Send + 'static {
    async_stream::stream! {
        let mut messages = initial_messages(&profile_url);
        let tools = [analyze_tool()];
        let mut state = RelayState::Text;

        let mut phase_one = match completion.stream(messages.clone(), &tools).await {
            Ok(stream) => stream,
            Err(e) => {
                let err = StreamError::Completion(e.to_string());
                warn!(error = %err, "Completion request failed");
                yield StreamEvent::Error(err.user_message());
                yield StreamEvent::Done;
                return;
            }
        };

        let mut call = PendingToolCall::default();
        let mut tool_finished = false;

        while let Some(chunk) = phase_one.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    let err = StreamError::Completion(e.to_string());
                    warn!(error = %err, "Completion stream failed");
                    yield StreamEvent::Error(err.user_message());
                    yield StreamEvent::Done;
                    return;
                }
            };

            for choice in chunk.choices {
                if let Some(text) = choice.delta.content.filter(|t| !t.is_empty()) {
                    if state == RelayState::Text {
                        yield StreamEvent::TextDelta(text);
                    }
                }
                for delta in choice.delta.tool_calls.unwrap_or_default() {
                    if !call.absorb(&delta) {
                        debug!(index = delta.index, "Ignoring additional tool call");
                        continue;
                    }
                    if state == RelayState::Text {
                        state = RelayState::ToolAccumulating;
                        debug!("Tool call started");
                    }
                    yield StreamEvent::ToolCallDelta {
                        name: delta.function.as_ref().and_then(|f| f.name.clone()),
                        arguments: delta
                            .function
                            .and_then(|f| f.arguments)
                            .unwrap_or_default(),
                    };
                }
                if choice.finish_reason.as_deref() == Some("tool_calls") {
                    tool_finished = true;
                }
            }

            if tool_finished {
                break;
            }
        }

        if !call.is_started() {
            debug!("Completion finished without a tool call");
            yield StreamEvent::Done;
            return;
        }

        state = RelayState::ToolExecuting;
        debug!(?state, tool = call.name.as_deref().unwrap_or_default(), "Executing tool");

        let args = match call.parse() {
            Ok(args) => args,
            Err(err) => {
                warn!(error = %err, "Rejected tool call");
                yield StreamEvent::Error(err.user_message());
                yield StreamEvent::Done;
                return;
            }
        };

        yield StreamEvent::TextDelta(format!("🔍 Analyzing profile {}...\n\n", args.url));

        let report = match analyzer.analyze(&args.url).await {
            Ok(report) => report,
            Err(e) => {
                let err = StreamError::from(e);
                warn!(error = %err, url = %args.url, "Profile analysis failed");
                yield StreamEvent::Error(err.user_message());
                yield StreamEvent::Done;
                return;
            }
        };

        let encoded = match serde_json::to_string(&report) {
            Ok(encoded) => encoded,
            Err(e) => {
                let err = StreamError::from(e);
                warn!(error = %err, "Could not encode report");
                yield StreamEvent::Error(err.user_message());
                yield StreamEvent::Done;
                return;
            }
        };
        info!(complete = report.is_complete(), bytes = encoded.len(), "Tool result ready");

        let call_id = call.id().to_string();
        messages.push(WireMessage::assistant_tool_calls(vec![WireToolCall::function(
            &call_id,
            ANALYZE_TOOL,
            &call.arguments,
        )]));
        messages.push(WireMessage::tool(call_id, encoded));

        state = RelayState::FinalText;
        debug!(?state, messages = messages.len(), "Requesting final answer");

        let mut phase_two = match completion.stream(messages, &[]).await {
            Ok(stream) => stream,
            Err(e) => {
                let err = StreamError::Completion(e.to_string());
                warn!(error = %err, "Final completion request failed");
                yield StreamEvent::Error(err.user_message());
                yield StreamEvent::Done;
                return;
            }
        };

        'final_text: while let Some(chunk) = phase_two.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    let err = StreamError::Completion(e.to_string());
                    warn!(error = %err, "Final completion stream failed");
                    yield StreamEvent::Error(err.user_message());
                    break 'final_text;
                }
            };
            for choice in chunk.choices {
                if let Some(text) = choice.delta.content.filter(|t| !t.is_empty()) {
                    yield StreamEvent::TextDelta(text);
                }
                if choice.finish_reason.as_deref() == Some("stop") {
                    break 'final_text;
                }
            }
        }

        yield StreamEvent::Done;
    }
}
