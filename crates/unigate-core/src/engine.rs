use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::mpsc;

use unigate_adapter_core::{LoadedAdapters, SendOptions};
use unigate_protocol::{
    AssistantMessage, ChatChoice, ChatCompletionObjectType, ChatCompletionResponse,
    ChatRequestBody, CompletionUsage, FinishReason, Model, ResponseRole,
};

use crate::dispatch;
use crate::error::GatewayError;
use crate::stream::{ChunkBuilder, pump_stream, response_id, unix_now};

const STREAM_CHANNEL_CAPACITY: usize = 16;

/// Gateway facade: translates OpenAI-shaped requests into adapter calls and
/// adapter output back into OpenAI-shaped responses.
///
/// Holds no per-request state beyond the conversation passed in; the adapter
/// map is read-only after startup, so concurrent handlers share it without
/// locking.
pub struct Gateway {
    adapters: Arc<LoadedAdapters>,
}

impl Gateway {
    pub fn new(adapters: LoadedAdapters) -> Self {
        Self {
            adapters: Arc::new(adapters),
        }
    }

    /// Descriptors for every model a loaded adapter serves.
    pub fn models(&self) -> Vec<Model> {
        self.adapters.registry().all_models()
    }

    /// Non-streaming path: one full adapter reply wrapped into one
    /// chat.completion object with a single choice and placeholder usage.
    pub async fn chat_completion(
        &self,
        req: &ChatRequestBody,
    ) -> Result<ChatCompletionResponse, GatewayError> {
        let adapter = dispatch::resolve(&self.adapters, &req.model)?;
        let text = adapter
            .send_message(&req.messages, &send_options(req))
            .await
            .map_err(|err| GatewayError::Upstream(err.to_string()))?;

        Ok(ChatCompletionResponse {
            id: response_id(),
            object: ChatCompletionObjectType::ChatCompletion,
            created: unix_now(),
            model: req.model.clone(),
            choices: vec![ChatChoice {
                index: 0,
                message: AssistantMessage {
                    role: ResponseRole::Assistant,
                    content: Some(text),
                },
                finish_reason: FinishReason::Stop,
            }],
            usage: Some(CompletionUsage::default()),
        })
    }

    /// Streaming path: returns the channel of ready-to-send SSE frames.
    ///
    /// Dispatch and the upstream connection are resolved *before* returning,
    /// so those failures surface as plain HTTP errors instead of a broken
    /// event stream. One spawned task per response pumps fragments into
    /// frames; ordering within the response follows fragment arrival order.
    pub async fn chat_completion_stream(
        &self,
        req: &ChatRequestBody,
    ) -> Result<mpsc::Receiver<Bytes>, GatewayError> {
        let adapter = dispatch::resolve(&self.adapters, &req.model)?;
        let fragments = adapter
            .send_message_stream(&req.messages, &send_options(req))
            .await
            .map_err(|err| GatewayError::Upstream(err.to_string()))?;

        let (tx, rx) = mpsc::channel(STREAM_CHANNEL_CAPACITY);
        tokio::spawn(pump_stream(ChunkBuilder::new(&req.model), fragments, tx));
        Ok(rx)
    }
}

fn send_options(req: &ChatRequestBody) -> SendOptions {
    SendOptions {
        model: Some(req.model.clone()),
        max_tokens: req.max_tokens,
        temperature: req.temperature,
    }
}
