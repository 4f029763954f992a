use std::sync::Arc;

use async_trait::async_trait;

use unigate_adapter_core::{
    AdapterError, AdapterFactory, AdapterResult, ChatAdapter, FragmentStream, SendOptions,
};
use unigate_protocol::ChatMessage;

use crate::http_client::{ChatHttpClient, UpstreamChatBody};

const ADAPTER_NAME: &str = "qianfan";
const DEFAULT_BASE_URL: &str = "https://qianfan.baidubce.com";
const CHAT_PATH: &str = "/v2/chat/completions";
const API_KEY_ENV: &str = "QIANFAN_API_KEY";
const BASE_URL_ENV: &str = "QIANFAN_BASE_URL";
const SUPPORTED_MODELS: &[&str] = &["deepseek-r1", "deepseek-v3"];

/// Baidu Qianfan v2 backend. OpenAI-compatible wire protocol; streamed
/// replies arrive as SSE server-push with reasoning deltas interleaved ahead
/// of content deltas.
pub struct QianfanAdapter {
    client: ChatHttpClient,
    models: Vec<String>,
}

impl QianfanAdapter {
    pub fn from_env() -> AdapterResult<Arc<dyn ChatAdapter>> {
        let api_key = std::env::var(API_KEY_ENV)
            .map_err(|_| AdapterError::InvalidConfig(format!("{API_KEY_ENV} is not set")))?;
        let base_url =
            std::env::var(BASE_URL_ENV).unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Ok(Arc::new(Self {
            client: ChatHttpClient::new(&base_url, CHAT_PATH, &api_key)?,
            models: SUPPORTED_MODELS.iter().map(|m| m.to_string()).collect(),
        }))
    }

    pub fn factory() -> AdapterFactory {
        AdapterFactory::new(ADAPTER_NAME, Self::from_env)
    }

    fn body<'a>(
        &'a self,
        conversation: &'a [ChatMessage],
        options: &'a SendOptions,
        stream: bool,
    ) -> UpstreamChatBody<'a> {
        UpstreamChatBody {
            model: options.model.as_deref().unwrap_or(&self.models[0]),
            messages: conversation,
            stream,
            max_tokens: options.max_tokens,
            temperature: options.temperature,
        }
    }
}

#[async_trait]
impl ChatAdapter for QianfanAdapter {
    fn supported_models(&self) -> &[String] {
        &self.models
    }

    async fn send_message(
        &self,
        conversation: &[ChatMessage],
        options: &SendOptions,
    ) -> AdapterResult<String> {
        self.client
            .complete(&self.body(conversation, options, false))
            .await
    }

    async fn send_message_stream(
        &self,
        conversation: &[ChatMessage],
        options: &SendOptions,
    ) -> AdapterResult<FragmentStream> {
        self.client
            .complete_stream(&self.body(conversation, options, true))
            .await
    }
}
