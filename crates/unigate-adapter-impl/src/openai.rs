use std::sync::Arc;

use async_trait::async_trait;

use unigate_adapter_core::{
    AdapterError, AdapterFactory, AdapterResult, ChatAdapter, FragmentStream, SendOptions,
};
use unigate_protocol::ChatMessage;

use crate::http_client::{ChatHttpClient, UpstreamChatBody};

const ADAPTER_NAME: &str = "openai";
const DEFAULT_BASE_URL: &str = "https://api.openai.com";
const CHAT_PATH: &str = "/v1/chat/completions";
const API_KEY_ENV: &str = "OPENAI_API_KEY";
const BASE_URL_ENV: &str = "OPENAI_BASE_URL";
const MODELS_ENV: &str = "OPENAI_MODELS";
const DEFAULT_MODELS: &[&str] = &["gpt-4o", "gpt-4o-mini"];

/// Generic OpenAI-compatible backend. Base URL and served model list come
/// from the environment, so one adapter covers any upstream speaking this
/// protocol without touching the gateway.
pub struct OpenAiAdapter {
    client: ChatHttpClient,
    models: Vec<String>,
}

impl OpenAiAdapter {
    pub fn from_env() -> AdapterResult<Arc<dyn ChatAdapter>> {
        let api_key = std::env::var(API_KEY_ENV)
            .map_err(|_| AdapterError::InvalidConfig(format!("{API_KEY_ENV} is not set")))?;
        let base_url =
            std::env::var(BASE_URL_ENV).unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let models = std::env::var(MODELS_ENV)
            .map(|raw| parse_models(&raw))
            .unwrap_or_default();
        let models = if models.is_empty() {
            DEFAULT_MODELS.iter().map(|m| m.to_string()).collect()
        } else {
            models
        };
        Ok(Arc::new(Self {
            client: ChatHttpClient::new(&base_url, CHAT_PATH, &api_key)?,
            models,
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

fn parse_models(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .collect()
}

#[async_trait]
impl ChatAdapter for OpenAiAdapter {
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
