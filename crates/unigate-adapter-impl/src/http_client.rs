use std::time::Duration;

use bytes::Bytes;
use futures_util::StreamExt;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::warn;
use wreq::{Client, Method};

use unigate_adapter_core::{AdapterError, AdapterResult, FragmentStream};
use unigate_protocol::{ChatCompletionChunk, ChatCompletionResponse, ChatMessage, SseParser, is_done};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(600);
const STREAM_IDLE_TIMEOUT: Duration = Duration::from_secs(60);
const MAX_ERROR_SNIPPET: usize = 300;

/// Request body for OpenAI-compatible upstreams.
#[derive(Debug, Serialize)]
pub(crate) struct UpstreamChatBody<'a> {
    pub(crate) model: &'a str,
    pub(crate) messages: &'a [ChatMessage],
    pub(crate) stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) max_tokens: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) temperature: Option<f64>,
}

/// Shared chat client for backends speaking the OpenAI wire protocol over
/// plain HTTP (full replies) or SSE server-push (streamed replies).
pub(crate) struct ChatHttpClient {
    client: Client,
    chat_url: String,
    api_key: String,
}

impl ChatHttpClient {
    pub(crate) fn new(base_url: &str, chat_path: &str, api_key: &str) -> AdapterResult<Self> {
        if api_key.trim().is_empty() {
            return Err(AdapterError::InvalidConfig("api key is empty".to_string()));
        }
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .read_timeout(STREAM_IDLE_TIMEOUT)
            .build()
            .map_err(|err| AdapterError::InvalidConfig(err.to_string()))?;
        let base = base_url.trim_end_matches('/');
        let path = chat_path.trim_start_matches('/');
        Ok(Self {
            client,
            chat_url: format!("{base}/{path}"),
            api_key: api_key.to_string(),
        })
    }

    async fn post(&self, body: &UpstreamChatBody<'_>, accept: &str) -> AdapterResult<wreq::Response> {
        let payload =
            serde_json::to_vec(body).map_err(|err| AdapterError::Serialization(err.to_string()))?;
        self.client
            .request(Method::POST, &self.chat_url)
            .header("authorization", format!("Bearer {}", self.api_key))
            .header("content-type", "application/json")
            .header("accept", accept)
            .body(Bytes::from(payload))
            .send()
            .await
            .map_err(|err| AdapterError::Upstream(err.to_string()))
    }

    /// Full-reply call: POST once, decode one chat.completion object.
    pub(crate) async fn complete(&self, body: &UpstreamChatBody<'_>) -> AdapterResult<String> {
        let resp = self.post(body, "application/json").await?;
        let status = resp.status().as_u16();
        let bytes = resp
            .bytes()
            .await
            .map_err(|err| AdapterError::Upstream(err.to_string()))?;
        if !(200..300).contains(&status) {
            return Err(status_error(status, &bytes));
        }
        let parsed: ChatCompletionResponse = serde_json::from_slice(&bytes)
            .map_err(|err| AdapterError::Serialization(err.to_string()))?;
        let Some(choice) = parsed.choices.into_iter().next() else {
            return Err(AdapterError::Upstream(
                "upstream reply carried no choices".to_string(),
            ));
        };
        Ok(choice.message.content.unwrap_or_default())
    }

    /// Streamed call: POST with `stream: true`, pump the SSE body into a
    /// fragment channel. The pump stops pulling as soon as the receiver is
    /// dropped, which releases the upstream connection.
    pub(crate) async fn complete_stream(
        &self,
        body: &UpstreamChatBody<'_>,
    ) -> AdapterResult<FragmentStream> {
        let resp = self.post(body, "text/event-stream").await?;
        let status = resp.status().as_u16();
        if !(200..300).contains(&status) {
            let bytes = resp.bytes().await.unwrap_or_default();
            return Err(status_error(status, &bytes));
        }

        let (tx, rx) = mpsc::channel::<AdapterResult<String>>(16);
        tokio::spawn(async move {
            let mut stream = resp.bytes_stream();
            let mut parser = SseParser::new();
            while let Some(item) = stream.next().await {
                let chunk = match item {
                    Ok(chunk) => chunk,
                    Err(err) => {
                        let _ = tx.send(Err(AdapterError::Upstream(err.to_string()))).await;
                        return;
                    }
                };
                for data in parser.push_bytes(&chunk) {
                    if is_done(&data) {
                        return;
                    }
                    for fragment in delta_fragments(&data) {
                        if tx.send(Ok(fragment)).await.is_err() {
                            return;
                        }
                    }
                }
            }
        });
        Ok(rx)
    }
}

/// Text carried by one upstream chunk, reasoning first: Qianfan-style
/// upstreams interleave `reasoning_content` ahead of `content`. A chunk that
/// fails to decode is logged and skipped; only transport failures end the
/// stream.
fn delta_fragments(data: &str) -> Vec<String> {
    let chunk: ChatCompletionChunk = match serde_json::from_str(data) {
        Ok(chunk) => chunk,
        Err(err) => {
            warn!(error = %err, "skipping malformed upstream chunk");
            return Vec::new();
        }
    };
    let Some(choice) = chunk.choices.into_iter().next() else {
        return Vec::new();
    };
    [choice.delta.reasoning_content, choice.delta.content]
        .into_iter()
        .flatten()
        .filter(|piece| !piece.is_empty())
        .collect()
}

fn status_error(status: u16, body: &[u8]) -> AdapterError {
    let snippet: String = String::from_utf8_lossy(body)
        .chars()
        .take(MAX_ERROR_SNIPPET)
        .collect();
    AdapterError::Upstream(format!("upstream returned {status}: {snippet}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delta_fragments_orders_reasoning_before_content() {
        let data = r#"{
            "id": "as-1", "object": "chat.completion.chunk", "created": 1, "model": "m",
            "choices": [{"index": 0,
                         "delta": {"reasoning_content": "think", "content": "say"},
                         "finish_reason": null}]
        }"#;
        assert_eq!(delta_fragments(data), vec!["think", "say"]);
    }

    #[test]
    fn delta_fragments_skips_malformed_and_empty() {
        assert!(delta_fragments("not json").is_empty());
        let empty = r#"{
            "id": "as-1", "object": "chat.completion.chunk", "created": 1, "model": "m",
            "choices": [{"index": 0, "delta": {}, "finish_reason": "stop"}]
        }"#;
        assert!(delta_fragments(empty).is_empty());
    }
}
