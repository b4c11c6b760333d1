//! The prompt execution seam.
//!
//! The orchestration engine talks to LLM providers exclusively through
//! [`PromptService`]; wire formats, transport, and retries live entirely
//! behind it.

use async_trait::async_trait;

use crate::config::{GenerationParams, ProviderConfig};
use crate::error::Result;
use crate::session::MessageRole;

/// One message in an outgoing prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptMessage {
    pub role: MessageRole,
    pub content: String,
}

impl PromptMessage {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Executes prompts against a configured provider.
///
/// Failures of any kind must surface as
/// [`QuillError::AgentExecution`](crate::QuillError::AgentExecution);
/// transport-level error types never cross this boundary.
#[async_trait]
pub trait PromptService: Send + Sync {
    /// Sends the messages and returns the complete response text.
    async fn call(
        &self,
        provider: &ProviderConfig,
        messages: &[PromptMessage],
        params: &GenerationParams,
    ) -> Result<String>;

    /// Sends the messages, invoking `on_chunk` once per incremental text
    /// fragment in arrival order, and returns the accumulated full text.
    async fn call_streaming(
        &self,
        provider: &ProviderConfig,
        messages: &[PromptMessage],
        params: &GenerationParams,
        on_chunk: &mut (dyn for<'a> FnMut(&'a str) + Send),
    ) -> Result<String>;

    /// Best-effort connectivity probe used by health checks.
    async fn probe(&self, provider: &ProviderConfig) -> Result<()>;
}
