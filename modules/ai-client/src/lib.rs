//! Streaming chat-completions client for OpenAI-compatible endpoints.
//!
//! Only the surface the relay needs: send a message list (optionally with
//! function tools) with `stream: true` and get back a stream of decoded chunks.

pub mod openai;

pub use openai::{
    function_tool, ChatChunk, ChatRequest, ChunkChoice, ChunkDelta, ChunkStream, FunctionCall,
    FunctionDelta, OpenAi, Role, ToolCallDelta, ToolDefinitionWire, WireMessage, WireToolCall,
};
