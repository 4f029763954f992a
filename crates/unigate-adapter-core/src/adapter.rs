use async_trait::async_trait;

use unigate_protocol::ChatMessage;

use crate::errors::AdapterResult;

/// Incremental reply: a finite, order-preserving sequence of append-only text
/// fragments that concatenate to the full reply. Channel close signals
/// completion. A mid-stream upstream failure surfaces as one `Err` item and
/// then the channel closes; the sequence is not restartable.
pub type FragmentStream = tokio::sync::mpsc::Receiver<AdapterResult<String>>;

/// Per-request generation options forwarded to the backend.
#[derive(Debug, Clone, Default)]
pub struct SendOptions {
    /// The requested model id, for adapters serving more than one model.
    /// Adapters fall back to their first supported model when absent.
    pub model: Option<String>,
    pub max_tokens: Option<i64>,
    pub temperature: Option<f64>,
}

/// Capability contract implemented once per upstream backend. Backends are
/// free to speak request/response polling, SSE server-push or socket
/// protocols underneath; the gateway only depends on these operations.
#[async_trait]
pub trait ChatAdapter: Send + Sync {
    /// Model names this adapter serves; populates the registry and the
    /// listing endpoint.
    fn supported_models(&self) -> &[String];

    /// Full assistant reply for the ordered conversation. Upstream failures
    /// must surface as an error, never as silently truncated or empty text.
    async fn send_message(
        &self,
        conversation: &[ChatMessage],
        options: &SendOptions,
    ) -> AdapterResult<String>;

    /// Incremental reply for the ordered conversation.
    async fn send_message_stream(
        &self,
        conversation: &[ChatMessage],
        options: &SendOptions,
    ) -> AdapterResult<FragmentStream>;
}
