//! HTTP implementation of the prompt execution seam.
//!
//! One reqwest client serves every configured provider; the adapter kind
//! on the provider decides the wire shape and auth discipline. Every
//! failure mode (transport, HTTP status, malformed payload) surfaces as
//! `QuillError::AgentExecution`; callers never see reqwest's error type.

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, RequestBuilder, Response};
use serde_json::Value;
use tracing::debug;

use quill_core::config::{AdapterKind, GenerationParams, ProviderConfig};
use quill_core::error::{QuillError, Result};
use quill_core::prompt::{PromptMessage, PromptService};

use crate::anthropic;
use crate::openai;
use crate::sse::SseParser;

/// Prompt execution over HTTP.
pub struct HttpPromptService {
    client: Client,
}

impl HttpPromptService {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    fn apply_auth(builder: RequestBuilder, provider: &ProviderConfig) -> RequestBuilder {
        match provider.adapter {
            AdapterKind::Anthropic => builder
                .header("x-api-key", &provider.resolved_key)
                .header("anthropic-version", anthropic::ANTHROPIC_VERSION),
            AdapterKind::OpenAi => builder.bearer_auth(&provider.resolved_key),
            AdapterKind::Local => builder,
        }
    }

    async fn send(
        &self,
        provider_name: &str,
        provider: &ProviderConfig,
        body: &Value,
    ) -> Result<Response> {
        debug!("dispatching to {} ({})", provider_name, provider.url);
        let builder = self.client.post(&provider.url).json(body);
        let response = Self::apply_auth(builder, provider)
            .send()
            .await
            .map_err(|err| transport_error(provider_name, err))?;

        if !response.status().is_success() {
            return Err(status_error(provider_name, response).await);
        }
        Ok(response)
    }
}

impl Default for HttpPromptService {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds the request body for a provider's adapter kind.
fn build_body(
    provider: &ProviderConfig,
    messages: &[PromptMessage],
    params: &GenerationParams,
    stream: bool,
) -> Result<Value> {
    let body = match provider.adapter {
        AdapterKind::Anthropic => {
            serde_json::to_value(anthropic::build_request(provider, messages, params, stream))?
        }
        // Local endpoints speak the chat-completions shape.
        AdapterKind::OpenAi | AdapterKind::Local => {
            serde_json::to_value(openai::build_request(provider, messages, params, stream))?
        }
    };
    Ok(body)
}

fn extract_full_text(adapter: AdapterKind, payload: Value) -> Option<String> {
    match adapter {
        AdapterKind::Anthropic => {
            anthropic::extract_text(serde_json::from_value(payload).ok()?)
        }
        AdapterKind::OpenAi | AdapterKind::Local => {
            openai::extract_text(serde_json::from_value(payload).ok()?)
        }
    }
}

fn extract_delta(adapter: AdapterKind, payload: &str) -> Option<String> {
    match adapter {
        AdapterKind::Anthropic => anthropic::extract_stream_delta(payload),
        AdapterKind::OpenAi | AdapterKind::Local => openai::extract_stream_delta(payload),
    }
}

fn transport_error(provider_name: &str, err: reqwest::Error) -> QuillError {
    let detail = if err.is_timeout() {
        "request timed out"
    } else if err.is_connect() {
        "connection failed"
    } else {
        "request failed"
    };
    QuillError::agent_execution(format!("provider '{}': {}: {}", provider_name, detail, err))
}

async fn status_error(provider_name: &str, response: Response) -> QuillError {
    let status = response.status();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<unreadable error body>".to_string());
    QuillError::agent_execution(format!(
        "provider '{}' returned HTTP {}: {}",
        provider_name,
        status,
        body.trim()
    ))
}

#[async_trait]
impl PromptService for HttpPromptService {
    async fn call(
        &self,
        provider: &ProviderConfig,
        messages: &[PromptMessage],
        params: &GenerationParams,
    ) -> Result<String> {
        let name = provider.name.as_str();
        let body = build_body(provider, messages, params, false)?;
        let response = self.send(name, provider, &body).await?;

        let payload: Value = response
            .json()
            .await
            .map_err(|err| transport_error(name, err))?;

        extract_full_text(provider.adapter, payload).ok_or_else(|| {
            QuillError::agent_execution(format!("provider '{}': response carried no text", name))
        })
    }

    async fn call_streaming(
        &self,
        provider: &ProviderConfig,
        messages: &[PromptMessage],
        params: &GenerationParams,
        on_chunk: &mut (dyn for<'a> FnMut(&'a str) + Send),
    ) -> Result<String> {
        let name = provider.name.as_str();
        let body = build_body(provider, messages, params, true)?;
        let response = self.send(name, provider, &body).await?;

        let mut stream = response.bytes_stream();
        let mut parser = SseParser::default();
        let mut full = String::new();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|err| transport_error(name, err))?;
            for payload in parser.feed(&chunk) {
                if let Some(delta) = extract_delta(provider.adapter, &payload) {
                    on_chunk(&delta);
                    full.push_str(&delta);
                }
            }
        }

        Ok(full)
    }

    async fn probe(&self, provider: &ProviderConfig) -> Result<()> {
        // Reachability only: any HTTP response counts, including 4xx.
        self.client
            .get(&provider.url)
            .send()
            .await
            .map(|_| ())
            .map_err(|err| transport_error(&provider.name, err))
    }
}
