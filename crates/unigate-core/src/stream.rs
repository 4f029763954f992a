use bytes::Bytes;
use time::OffsetDateTime;
use tokio::sync::mpsc;
use tracing::warn;

use unigate_adapter_core::FragmentStream;
use unigate_protocol::{
    ChatCompletionChunk, ChunkObjectType, DONE_FRAME, FinishReason, ResponseRole, StreamChoice,
    StreamDelta, StreamErrorFrame, data_frame,
};

pub(crate) fn response_id() -> String {
    let hex = uuid::Uuid::new_v4().simple().to_string();
    format!("chatcmpl-{}", &hex[..8])
}

pub(crate) fn unix_now() -> i64 {
    OffsetDateTime::now_utc().unix_timestamp()
}

/// Shared identity of every chunk in one streamed response. Invariant: `id`,
/// `created` and `model` never vary within a response.
pub(crate) struct ChunkBuilder {
    id: String,
    created: i64,
    model: String,
}

impl ChunkBuilder {
    pub(crate) fn new(model: &str) -> Self {
        Self {
            id: response_id(),
            created: unix_now(),
            model: model.to_string(),
        }
    }

    fn chunk(&self, delta: StreamDelta, finish_reason: Option<FinishReason>) -> ChatCompletionChunk {
        ChatCompletionChunk {
            id: self.id.clone(),
            object: ChunkObjectType::ChatCompletionChunk,
            created: self.created,
            model: self.model.clone(),
            choices: vec![StreamChoice {
                index: 0,
                delta,
                finish_reason,
            }],
        }
    }

    fn role(&self) -> ChatCompletionChunk {
        self.chunk(
            StreamDelta {
                role: Some(ResponseRole::Assistant),
                ..StreamDelta::default()
            },
            None,
        )
    }

    fn content(&self, fragment: String) -> ChatCompletionChunk {
        self.chunk(
            StreamDelta {
                content: Some(fragment),
                ..StreamDelta::default()
            },
            None,
        )
    }

    fn finish(&self) -> ChatCompletionChunk {
        self.chunk(StreamDelta::default(), Some(FinishReason::Stop))
    }
}

/// Drive one streamed response over its SSE frame channel:
/// `START → ROLE_SENT → (CONTENT)* → DONE | ERROR`.
///
/// Exactly one role announcement before any content, one content chunk per
/// adapter fragment in arrival order, then one terminal finish chunk and the
/// `[DONE]` sentinel. An `Err` fragment becomes one in-band error frame and
/// the stream ends there: no finish chunk or sentinel after an error. A
/// dropped receiver (client disconnect) fails the next send, which stops the
/// pump and, by dropping the fragment receiver, the adapter's own stream.
pub(crate) async fn pump_stream(
    builder: ChunkBuilder,
    mut fragments: FragmentStream,
    tx: mpsc::Sender<Bytes>,
) {
    if !send_chunk(&tx, &builder.role()).await {
        return;
    }
    while let Some(item) = fragments.recv().await {
        match item {
            Ok(fragment) => {
                if !send_chunk(&tx, &builder.content(fragment)).await {
                    return;
                }
            }
            Err(err) => {
                warn!(error = %err, "adapter stream failed mid-response");
                if let Ok(frame) = data_frame(&StreamErrorFrame {
                    error: err.to_string(),
                }) {
                    let _ = tx.send(frame).await;
                }
                return;
            }
        }
    }
    if !send_chunk(&tx, &builder.finish()).await {
        return;
    }
    let _ = tx.send(Bytes::from_static(DONE_FRAME)).await;
}

async fn send_chunk(tx: &mpsc::Sender<Bytes>, chunk: &ChatCompletionChunk) -> bool {
    let frame = match data_frame(chunk) {
        Ok(frame) => frame,
        Err(err) => {
            warn!(error = %err, "failed to encode stream chunk");
            return false;
        }
    };
    tx.send(frame).await.is_ok()
}
