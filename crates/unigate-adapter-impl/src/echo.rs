use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use unigate_adapter_core::{
    AdapterFactory, AdapterResult, ChatAdapter, FragmentStream, SendOptions,
};
use unigate_protocol::{ChatMessage, Role};

const ADAPTER_NAME: &str = "echo";
const FRAGMENT_PACING: Duration = Duration::from_millis(15);
const EMPTY_REPLY: &str = "(nothing to echo)";

/// Local deterministic backend: replies with the last user message. Keeps a
/// credential-less checkout usable and doubles as a reference implementation
/// of the adapter contract.
pub struct EchoAdapter {
    models: Vec<String>,
}

impl EchoAdapter {
    pub fn new() -> Self {
        Self {
            models: vec!["echo-1".to_string()],
        }
    }

    pub fn factory() -> AdapterFactory {
        AdapterFactory::new(ADAPTER_NAME, || {
            Ok(Arc::new(EchoAdapter::new()) as Arc<dyn ChatAdapter>)
        })
    }

    fn reply(conversation: &[ChatMessage]) -> String {
        conversation
            .iter()
            .rev()
            .find(|message| message.role == Role::User)
            .map(|message| message.content.clone())
            .unwrap_or_else(|| EMPTY_REPLY.to_string())
    }
}

impl Default for EchoAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatAdapter for EchoAdapter {
    fn supported_models(&self) -> &[String] {
        &self.models
    }

    async fn send_message(
        &self,
        conversation: &[ChatMessage],
        _options: &SendOptions,
    ) -> AdapterResult<String> {
        Ok(Self::reply(conversation))
    }

    async fn send_message_stream(
        &self,
        conversation: &[ChatMessage],
        _options: &SendOptions,
    ) -> AdapterResult<FragmentStream> {
        let reply = Self::reply(conversation);
        let (tx, rx) = mpsc::channel(8);
        tokio::spawn(async move {
            // split_inclusive keeps the separators so fragments concatenate
            // back to the exact reply.
            for piece in reply.split_inclusive(' ') {
                tokio::time::sleep(FRAGMENT_PACING).await;
                if tx.send(Ok(piece.to_string())).await.is_err() {
                    return;
                }
            }
        });
        Ok(rx)
    }
}
