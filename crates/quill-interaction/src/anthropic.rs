//! Anthropic messages-API adapter.
//!
//! Request/response shapes for the messages endpoint. System messages
//! move to the top-level `system` field; only user/assistant turns ride
//! in the message list.

use serde::{Deserialize, Serialize};

use quill_core::config::{GenerationParams, ProviderConfig};
use quill_core::prompt::PromptMessage;
use quill_core::session::MessageRole;

pub const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Serialize)]
pub struct CreateMessageRequest {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    pub messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub stream: bool,
}

#[derive(Debug, Serialize)]
pub struct WireMessage {
    pub role: &'static str,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateMessageResponse {
    #[serde(default)]
    pub content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub text: String,
}

/// Builds the request body from a prompt message list.
pub fn build_request(
    provider: &ProviderConfig,
    messages: &[PromptMessage],
    params: &GenerationParams,
    stream: bool,
) -> CreateMessageRequest {
    let mut system_parts = Vec::new();
    let mut wire_messages = Vec::new();

    for message in messages {
        match message.role {
            MessageRole::System => system_parts.push(message.content.clone()),
            MessageRole::User => wire_messages.push(WireMessage {
                role: "user",
                content: message.content.clone(),
            }),
            MessageRole::Assistant => wire_messages.push(WireMessage {
                role: "assistant",
                content: message.content.clone(),
            }),
        }
    }

    CreateMessageRequest {
        model: provider.default_model.clone(),
        max_tokens: params.max_tokens,
        temperature: params.temperature,
        system: (!system_parts.is_empty()).then(|| system_parts.join("\n\n")),
        messages: wire_messages,
        stream,
    }
}

/// Pulls the response text out of the first text content block.
pub fn extract_text(response: CreateMessageResponse) -> Option<String> {
    response
        .content
        .into_iter()
        .find(|block| block.kind == "text")
        .map(|block| block.text)
}

/// Extracts the text fragment from one streaming event payload, if the
/// event carries one.
pub fn extract_stream_delta(payload: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(payload).ok()?;
    if value.get("type")?.as_str()? != "content_block_delta" {
        return None;
    }
    value
        .get("delta")?
        .get("text")?
        .as_str()
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> ProviderConfig {
        ProviderConfig {
            name: "anthropic".to_string(),
            adapter: quill_core::config::AdapterKind::Anthropic,
            url: "https://api.anthropic.com/v1/messages".to_string(),
            api_key: String::new(),
            default_model: "claude-sonnet-4-20250514".to_string(),
            resolved_key: "key".to_string(),
        }
    }

    #[test]
    fn test_system_messages_lift_to_system_field() {
        let messages = vec![
            PromptMessage::new(MessageRole::System, "be brief"),
            PromptMessage::new(MessageRole::User, "hi"),
            PromptMessage::new(MessageRole::Assistant, "hello"),
        ];

        let request = build_request(&provider(), &messages, &GenerationParams::default(), false);

        assert_eq!(request.system.as_deref(), Some("be brief"));
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, "user");
        assert_eq!(request.messages[1].role, "assistant");
    }

    #[test]
    fn test_stream_flag_omitted_when_false() {
        let messages = vec![PromptMessage::new(MessageRole::User, "hi")];
        let request = build_request(&provider(), &messages, &GenerationParams::default(), false);

        let body = serde_json::to_value(&request).unwrap();
        assert!(body.get("stream").is_none());

        let request = build_request(&provider(), &messages, &GenerationParams::default(), true);
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["stream"], serde_json::json!(true));
    }

    #[test]
    fn test_extract_text_takes_first_text_block() {
        let response: CreateMessageResponse = serde_json::from_str(
            r#"{"content":[{"type":"tool_use"},{"type":"text","text":"answer"}]}"#,
        )
        .unwrap();

        assert_eq!(extract_text(response).as_deref(), Some("answer"));
    }

    #[test]
    fn test_extract_stream_delta() {
        let payload = r#"{"type":"content_block_delta","delta":{"type":"text_delta","text":"par"}}"#;
        assert_eq!(extract_stream_delta(payload).as_deref(), Some("par"));

        assert!(extract_stream_delta(r#"{"type":"message_stop"}"#).is_none());
        assert!(extract_stream_delta("not json").is_none());
    }
}
