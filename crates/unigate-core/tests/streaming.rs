use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc;
use tokio::time::timeout;

use unigate_adapter_core::{
    AdapterError, AdapterFactory, AdapterResult, ChatAdapter, FragmentStream, SendOptions,
    load_all,
};
use unigate_core::{Gateway, GatewayError};
use unigate_protocol::{ChatMessage, ChatRequestBody, Role};

const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Deterministic backend double: replays a fixed fragment script.
struct ScriptedAdapter {
    models: Vec<String>,
    script: Vec<AdapterResult<String>>,
    full_reply: AdapterResult<String>,
}

impl ScriptedAdapter {
    fn ok(model: &str, fragments: &[&str]) -> Arc<dyn ChatAdapter> {
        Arc::new(Self {
            models: vec![model.to_string()],
            script: fragments.iter().map(|f| Ok(f.to_string())).collect(),
            full_reply: Ok(fragments.concat()),
        })
    }

    fn failing_mid_stream(model: &str, fragments: &[&str], message: &str) -> Arc<dyn ChatAdapter> {
        let mut script: Vec<AdapterResult<String>> =
            fragments.iter().map(|f| Ok(f.to_string())).collect();
        script.push(Err(AdapterError::Upstream(message.to_string())));
        Arc::new(Self {
            models: vec![model.to_string()],
            script,
            full_reply: Err(AdapterError::Upstream(message.to_string())),
        })
    }
}

#[async_trait]
impl ChatAdapter for ScriptedAdapter {
    fn supported_models(&self) -> &[String] {
        &self.models
    }

    async fn send_message(
        &self,
        _conversation: &[ChatMessage],
        _options: &SendOptions,
    ) -> AdapterResult<String> {
        self.full_reply.clone()
    }

    async fn send_message_stream(
        &self,
        _conversation: &[ChatMessage],
        _options: &SendOptions,
    ) -> AdapterResult<FragmentStream> {
        let (tx, rx) = mpsc::channel(self.script.len().max(1));
        for item in self.script.clone() {
            let _ = tx.try_send(item);
        }
        Ok(rx)
    }
}

/// Backend whose fragment stream is fed by the test, for observing when the
/// facade stops pulling.
struct PipeAdapter {
    models: Vec<String>,
    stream: Mutex<Option<FragmentStream>>,
}

impl PipeAdapter {
    fn new(model: &str, stream: FragmentStream) -> Self {
        Self {
            models: vec![model.to_string()],
            stream: Mutex::new(Some(stream)),
        }
    }
}

#[async_trait]
impl ChatAdapter for PipeAdapter {
    fn supported_models(&self) -> &[String] {
        &self.models
    }

    async fn send_message(
        &self,
        _conversation: &[ChatMessage],
        _options: &SendOptions,
    ) -> AdapterResult<String> {
        Err(AdapterError::Unsupported("pipe adapter only streams"))
    }

    async fn send_message_stream(
        &self,
        _conversation: &[ChatMessage],
        _options: &SendOptions,
    ) -> AdapterResult<FragmentStream> {
        self.stream
            .lock()
            .expect("stream lock")
            .take()
            .ok_or(AdapterError::Unsupported("stream already taken"))
    }
}

fn gateway_with(adapter: Arc<dyn ChatAdapter>) -> Gateway {
    Gateway::new(load_all(vec![AdapterFactory::new("scripted", move || {
        Ok(adapter.clone())
    })]))
}

fn request(model: &str) -> ChatRequestBody {
    ChatRequestBody {
        model: model.to_string(),
        messages: vec![ChatMessage::new(Role::User, "hi")],
        max_tokens: None,
        temperature: None,
        stream: Some(true),
    }
}

async fn collect_frames(mut rx: mpsc::Receiver<Bytes>) -> Vec<String> {
    let mut frames = Vec::new();
    while let Some(frame) = rx.recv().await {
        frames.push(String::from_utf8(frame.to_vec()).expect("frames are utf-8"));
    }
    frames
}

fn payload(frame: &str) -> serde_json::Value {
    let data = frame
        .strip_prefix("data: ")
        .and_then(|rest| rest.strip_suffix("\n\n"))
        .expect("well-formed SSE frame");
    serde_json::from_str(data).expect("frame payload is JSON")
}

#[tokio::test]
async fn successful_stream_has_role_content_finish_done() {
    let gateway = gateway_with(ScriptedAdapter::ok("script-1", &["Hel", "lo"]));
    let rx = gateway
        .chat_completion_stream(&request("script-1"))
        .await
        .unwrap();
    let frames = timeout(TEST_TIMEOUT, collect_frames(rx)).await.unwrap();

    assert_eq!(frames.len(), 5);
    assert_eq!(frames[4], "data: [DONE]\n\n");

    let chunks: Vec<_> = frames[..4].iter().map(|f| payload(f)).collect();

    // Role announcement first, carrying no content.
    assert_eq!(chunks[0]["choices"][0]["delta"]["role"], "assistant");
    assert!(chunks[0]["choices"][0]["delta"].get("content").is_none());
    assert!(chunks[0]["choices"][0]["finish_reason"].is_null());

    assert_eq!(chunks[1]["choices"][0]["delta"]["content"], "Hel");
    assert_eq!(chunks[2]["choices"][0]["delta"]["content"], "lo");

    // Terminal chunk: empty delta, finish_reason stop.
    assert_eq!(chunks[3]["choices"][0]["delta"], serde_json::json!({}));
    assert_eq!(chunks[3]["choices"][0]["finish_reason"], "stop");

    // id, created and model are identical across every chunk.
    for chunk in &chunks {
        assert_eq!(chunk["id"], chunks[0]["id"]);
        assert_eq!(chunk["created"], chunks[0]["created"]);
        assert_eq!(chunk["model"], "script-1");
        assert_eq!(chunk["object"], "chat.completion.chunk");
    }
}

#[tokio::test]
async fn zero_fragment_stream_still_opens_and_closes() {
    let gateway = gateway_with(ScriptedAdapter::ok("script-1", &[]));
    let rx = gateway
        .chat_completion_stream(&request("script-1"))
        .await
        .unwrap();
    let frames = timeout(TEST_TIMEOUT, collect_frames(rx)).await.unwrap();

    assert_eq!(frames.len(), 3);
    assert_eq!(payload(&frames[0])["choices"][0]["delta"]["role"], "assistant");
    assert_eq!(payload(&frames[1])["choices"][0]["finish_reason"], "stop");
    assert_eq!(frames[2], "data: [DONE]\n\n");
}

#[tokio::test]
async fn midstream_error_emits_error_frame_and_stops() {
    let gateway = gateway_with(ScriptedAdapter::failing_mid_stream(
        "script-1",
        &["Hel"],
        "backend exploded",
    ));
    let rx = gateway
        .chat_completion_stream(&request("script-1"))
        .await
        .unwrap();
    let frames = timeout(TEST_TIMEOUT, collect_frames(rx)).await.unwrap();

    // Role, one content chunk, then the in-band error frame, and nothing
    // after it: no finish chunk, no [DONE].
    assert_eq!(frames.len(), 3);
    assert_eq!(payload(&frames[1])["choices"][0]["delta"]["content"], "Hel");
    let error = payload(&frames[2]);
    assert!(
        error["error"]
            .as_str()
            .expect("error frame carries a message")
            .contains("backend exploded")
    );
    assert!(error.get("choices").is_none());
}

#[tokio::test]
async fn unknown_model_fails_with_model_not_found() {
    let gateway = gateway_with(ScriptedAdapter::ok("script-1", &["x"]));

    let err = gateway
        .chat_completion_stream(&request("ghost-model"))
        .await
        .expect_err("ghost-model has no adapter");
    match &err {
        GatewayError::ModelNotFound(model) => assert_eq!(model, "ghost-model"),
        other => panic!("expected ModelNotFound, got {other:?}"),
    }
    assert_eq!(err.status(), 404);
    assert!(err.to_string().contains("ghost-model"));

    let err = gateway
        .chat_completion(&request("ghost-model"))
        .await
        .expect_err("non-streaming path misses too");
    assert_eq!(err.status(), 404);
}

#[tokio::test]
async fn non_streaming_reply_matches_stream_concatenation() {
    let fragments = ["To", "kyo ", "rain"];
    let gateway = gateway_with(ScriptedAdapter::ok("script-1", &fragments));

    let response = gateway.chat_completion(&request("script-1")).await.unwrap();
    let full = response.choices[0]
        .message
        .content
        .clone()
        .expect("non-streaming reply has content");

    let rx = gateway
        .chat_completion_stream(&request("script-1"))
        .await
        .unwrap();
    let frames = timeout(TEST_TIMEOUT, collect_frames(rx)).await.unwrap();
    let streamed: String = frames[..frames.len() - 1]
        .iter()
        .map(|f| payload(f))
        .filter_map(|chunk| {
            chunk["choices"][0]["delta"]["content"]
                .as_str()
                .map(str::to_string)
        })
        .collect();

    assert_eq!(streamed, full);
    assert_eq!(full, fragments.concat());
}

#[tokio::test]
async fn upstream_failure_surfaces_as_server_error() {
    let gateway = gateway_with(ScriptedAdapter::failing_mid_stream(
        "script-1",
        &[],
        "connection refused",
    ));
    let err = gateway
        .chat_completion(&request("script-1"))
        .await
        .expect_err("adapter full reply fails");
    assert_eq!(err.status(), 500);
    assert_eq!(err.kind(), "upstream_error");
    assert!(err.to_string().contains("connection refused"));
}

#[tokio::test]
async fn client_disconnect_stops_pulling_fragments() {
    let (frag_tx, frag_rx) = mpsc::channel(1);
    let gateway = gateway_with(Arc::new(PipeAdapter::new("pipe-1", frag_rx)));

    let rx = gateway
        .chat_completion_stream(&request("pipe-1"))
        .await
        .unwrap();
    drop(rx);

    // Once the response channel is gone the pump must drop the fragment
    // receiver, failing our sender instead of buffering forever.
    timeout(TEST_TIMEOUT, async {
        loop {
            if frag_tx.send(Ok("x".to_string())).await.is_err() {
                break;
            }
        }
    })
    .await
    .expect("pump kept pulling after the client disconnected");
}

#[tokio::test]
async fn models_lists_registered_models() {
    let gateway = gateway_with(ScriptedAdapter::ok("script-1", &["x"]));
    let models = gateway.models();
    assert_eq!(models.len(), 1);
    assert_eq!(models[0].id, "script-1");
    assert_eq!(models[0].owned_by, "scripted");
}
