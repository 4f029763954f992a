//! Wire types for the OpenAI-compatible chat surface.
//!
//! This crate intentionally does **not** depend on axum or any concrete HTTP
//! client. It holds the request/response/chunk shapes the gateway speaks
//! downstream, the model-listing shapes, and the SSE framing helpers shared
//! by the gateway facade and the adapters that consume upstream event
//! streams.

pub mod chat;
pub mod models;
pub mod sse;

pub use chat::request::{ChatMessage, ChatRequestBody, Role};
pub use chat::response::{
    AssistantMessage, ChatChoice, ChatCompletionObjectType, ChatCompletionResponse,
    CompletionUsage, FinishReason, ResponseRole,
};
pub use chat::stream::{
    ChatCompletionChunk, ChunkObjectType, StreamChoice, StreamDelta, StreamErrorFrame,
};
pub use models::{ListModelsResponse, ListObjectType, Model, ModelObjectType};
pub use sse::{DONE_FRAME, SseParser, data_frame, is_done};
