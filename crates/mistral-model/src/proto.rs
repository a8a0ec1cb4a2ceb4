use serde::{Deserialize, Serialize};
use wyn_agent_model::{ModelFinishReason, ModelMessage, ModelRequest};

use crate::MistralConfig;

// ------------------------------
// Types received from the server
// ------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
pub struct ChatCompletionChunk {
    pub id: String,
    pub choices: Vec<Choice>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
pub struct Choice {
    pub delta: Delta,
    pub finish_reason: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
pub struct Delta {
    pub content: Option<Content>,
}

/// Message content, which newer models may send as typed chunks instead of
/// a plain string.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(untagged)]
pub enum Content {
    Text(String),
    Chunks(Vec<ContentChunk>),
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
pub struct ContentChunk {
    pub r#type: String,
    pub text: Option<String>,
}

impl Content {
    /// Returns the text part of the content. Non-text chunks are dropped.
    pub fn into_text(self) -> String {
        match self {
            Content::Text(text) => text,
            Content::Chunks(chunks) => chunks
                .into_iter()
                .filter(|chunk| chunk.r#type == "text")
                .filter_map(|chunk| chunk.text)
                .collect(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct ErrorBody {
    pub message: Option<String>,
    pub detail: Option<serde_json::Value>,
}

impl ErrorBody {
    /// Extracts a human readable message from an error response body,
    /// falling back to the raw body.
    pub fn describe(body: &str) -> String {
        let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) else {
            return body.trim().to_owned();
        };
        if let Some(message) = parsed.message {
            return message;
        }
        match parsed.detail {
            Some(serde_json::Value::String(detail)) => detail,
            Some(detail) => detail.to_string(),
            None => body.trim().to_owned(),
        }
    }
}

#[inline]
pub fn parse_finish_reason(reason: &str) -> ModelFinishReason {
    match reason {
        "length" | "model_length" => ModelFinishReason::Length,
        "error" => ModelFinishReason::Error,
        "stop" => ModelFinishReason::Stop,
        other => {
            warn!("unexpected finish reason: {other}");
            ModelFinishReason::Stop
        }
    }
}

// ------------------------
// Types sent to the server
// ------------------------

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Message {
    User { content: String },
    Assistant { content: String },
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct AgentCompletionRequest {
    agent_id: String,
    messages: Vec<Message>,
    stream: bool,
}

// -----------
// Conversions
// -----------

#[inline]
pub fn create_request(
    req: &ModelRequest,
    config: &MistralConfig,
) -> AgentCompletionRequest {
    AgentCompletionRequest {
        agent_id: config.agent_id.clone(),
        messages: req.messages.iter().map(create_message).collect(),
        stream: true,
    }
}

#[inline]
fn create_message(msg: &ModelMessage) -> Message {
    match msg {
        ModelMessage::User(content) => Message::User {
            content: content.clone(),
        },
        ModelMessage::Assistant(content) => Message::Assistant {
            content: content.clone(),
        },
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::MistralConfigBuilder;

    #[test]
    fn test_create_request() {
        let request = ModelRequest {
            messages: vec![
                ModelMessage::User("Write hello world".to_owned()),
                ModelMessage::Assistant("```python\nprint('hello')\n```".to_owned()),
                ModelMessage::User("Thanks".to_owned()),
            ],
        };
        let config = MistralConfigBuilder::with_credentials("xxx", "ag:abc").build();
        let payload =
            serde_json::to_value(create_request(&request, &config)).unwrap();
        assert_eq!(
            payload,
            json!({
                "agent_id": "ag:abc",
                "messages": [
                    { "role": "user", "content": "Write hello world" },
                    {
                        "role": "assistant",
                        "content": "```python\nprint('hello')\n```"
                    },
                    { "role": "user", "content": "Thanks" },
                ],
                "stream": true,
            })
        );
    }

    #[test]
    fn test_chunked_content() {
        let chunk: ChatCompletionChunk = serde_json::from_value(json!({
            "id": "1",
            "choices": [{
                "index": 0,
                "delta": {
                    "content": [
                        { "type": "thinking", "thinking": [] },
                        { "type": "text", "text": "Hi" },
                        { "type": "text", "text": " there" },
                    ]
                },
                "finish_reason": null
            }]
        }))
        .unwrap();
        let content = chunk.choices[0].delta.content.clone().unwrap();
        assert_eq!(content.into_text(), "Hi there");
    }

    #[test]
    fn test_describe_error_body() {
        assert_eq!(
            ErrorBody::describe(r#"{"message":"Unauthorized"}"#),
            "Unauthorized"
        );
        assert_eq!(
            ErrorBody::describe(r#"{"detail":"Agent not found"}"#),
            "Agent not found"
        );
        assert_eq!(ErrorBody::describe("bad gateway\n"), "bad gateway");
    }

    #[test]
    fn test_parse_finish_reason() {
        assert_eq!(parse_finish_reason("stop"), ModelFinishReason::Stop);
        assert_eq!(
            parse_finish_reason("model_length"),
            ModelFinishReason::Length
        );
        assert_eq!(parse_finish_reason("error"), ModelFinishReason::Error);
    }
}
