use serde::{Deserialize, Serialize};

use crate::chat::response::{FinishReason, ResponseRole};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChunkObjectType {
    #[serde(rename = "chat.completion.chunk")]
    ChatCompletionChunk,
}

/// Partial message fields carried by one streamed chunk. The first chunk of a
/// response announces the role, content chunks carry one fragment each, and
/// the terminal chunk is empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamDelta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<ResponseRole>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning_content: Option<String>,
}

impl StreamDelta {
    pub fn is_empty(&self) -> bool {
        self.role.is_none() && self.content.is_none() && self.reasoning_content.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamChoice {
    pub index: i64,
    pub delta: StreamDelta,
    /// Serialized as an explicit `null` on non-terminal chunks.
    pub finish_reason: Option<FinishReason>,
}

/// One `data:` payload of a streamed response. `id`, `created` and `model`
/// are identical across every chunk of a single response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatCompletionChunk {
    pub id: String,
    pub object: ChunkObjectType,
    pub created: i64,
    pub model: String,
    pub choices: Vec<StreamChoice>,
}

/// In-band error frame emitted when an adapter stream fails mid-response.
/// Deliberately not a delta chunk; after this frame the stream ends without
/// a finish chunk or `[DONE]` sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamErrorFrame {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_chunk_shape() {
        let chunk = ChatCompletionChunk {
            id: "chatcmpl-0011aabb".to_string(),
            object: ChunkObjectType::ChatCompletionChunk,
            created: 1700000000,
            model: "echo-1".to_string(),
            choices: vec![StreamChoice {
                index: 0,
                delta: StreamDelta {
                    role: Some(ResponseRole::Assistant),
                    ..StreamDelta::default()
                },
                finish_reason: None,
            }],
        };
        let json = serde_json::to_value(&chunk).unwrap();
        assert_eq!(json["object"], "chat.completion.chunk");
        assert_eq!(json["choices"][0]["delta"]["role"], "assistant");
        // Absent delta fields are omitted; finish_reason stays an explicit null.
        assert!(json["choices"][0]["delta"].get("content").is_none());
        assert!(json["choices"][0]["finish_reason"].is_null());
    }

    #[test]
    fn finish_chunk_has_empty_delta() {
        let choice = StreamChoice {
            index: 0,
            delta: StreamDelta::default(),
            finish_reason: Some(FinishReason::Stop),
        };
        let json = serde_json::to_value(&choice).unwrap();
        assert_eq!(json["delta"], serde_json::json!({}));
        assert_eq!(json["finish_reason"], "stop");
    }

    #[test]
    fn upstream_chunk_with_extra_fields_parses() {
        let data = r#"{
            "id": "as-x1", "object": "chat.completion.chunk", "created": 1,
            "model": "deepseek-r1",
            "choices": [{"index": 0, "delta": {"reasoning_content": "hm"}, "finish_reason": null}],
            "usage": {"prompt_tokens": 3, "completion_tokens": 1, "total_tokens": 4}
        }"#;
        let chunk: ChatCompletionChunk = serde_json::from_str(data).unwrap();
        assert_eq!(
            chunk.choices[0].delta.reasoning_content.as_deref(),
            Some("hm")
        );
        assert!(!chunk.choices[0].delta.is_empty());
    }
}
