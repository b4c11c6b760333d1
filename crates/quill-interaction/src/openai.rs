//! OpenAI chat-completions adapter.
//!
//! Also serves local OpenAI-compatible endpoints; those differ only in
//! base URL and in sending no credential.

use serde::{Deserialize, Serialize};

use quill_core::config::{GenerationParams, ProviderConfig};
use quill_core::prompt::PromptMessage;

#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f64,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub stream: bool,
}

#[derive(Debug, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
pub struct ResponseMessage {
    #[serde(default)]
    pub content: Option<String>,
}

/// Builds the request body from a prompt message list.
pub fn build_request(
    provider: &ProviderConfig,
    messages: &[PromptMessage],
    params: &GenerationParams,
    stream: bool,
) -> ChatCompletionRequest {
    ChatCompletionRequest {
        model: provider.default_model.clone(),
        messages: messages
            .iter()
            .map(|message| ChatMessage {
                role: message.role.as_str(),
                content: message.content.clone(),
            })
            .collect(),
        temperature: params.temperature,
        max_tokens: params.max_tokens,
        stream,
    }
}

/// Pulls the response text out of the first choice.
pub fn extract_text(response: ChatCompletionResponse) -> Option<String> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
}

/// Extracts the text fragment from one streaming `data:` payload.
///
/// The terminal `[DONE]` sentinel and role-only deltas yield `None`.
pub fn extract_stream_delta(payload: &str) -> Option<String> {
    if payload == "[DONE]" {
        return None;
    }
    let value: serde_json::Value = serde_json::from_str(payload).ok()?;
    value
        .get("choices")?
        .get(0)?
        .get("delta")?
        .get("content")?
        .as_str()
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_core::session::MessageRole;

    fn provider() -> ProviderConfig {
        ProviderConfig {
            name: "openai".to_string(),
            adapter: quill_core::config::AdapterKind::OpenAi,
            url: "https://api.openai.com/v1/chat/completions".to_string(),
            api_key: String::new(),
            default_model: "gpt-4o".to_string(),
            resolved_key: "key".to_string(),
        }
    }

    #[test]
    fn test_build_request_keeps_system_in_message_list() {
        let messages = vec![
            PromptMessage::new(MessageRole::System, "be brief"),
            PromptMessage::new(MessageRole::User, "hi"),
        ];

        let request = build_request(&provider(), &messages, &GenerationParams::default(), false);

        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, "system");
        assert_eq!(request.messages[1].role, "user");
        assert_eq!(request.model, "gpt-4o");
    }

    #[test]
    fn test_extract_text() {
        let response: ChatCompletionResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"role":"assistant","content":"hey"}}]}"#)
                .unwrap();

        assert_eq!(extract_text(response).as_deref(), Some("hey"));
    }

    #[test]
    fn test_extract_text_empty_choices() {
        let response: ChatCompletionResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(extract_text(response).is_none());
    }

    #[test]
    fn test_extract_stream_delta() {
        let payload = r#"{"choices":[{"delta":{"content":"to"}}]}"#;
        assert_eq!(extract_stream_delta(payload).as_deref(), Some("to"));

        assert!(extract_stream_delta("[DONE]").is_none());
        assert!(extract_stream_delta(r#"{"choices":[{"delta":{"role":"assistant"}}]}"#).is_none());
    }
}
