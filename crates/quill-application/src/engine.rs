//! The orchestration engine.
//!
//! Composes configuration, the conversation store, the project scanner,
//! and the prompt execution service into the chat use case: assemble the
//! message payload, dispatch sync or streaming, and feed the result back
//! into the conversation store.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use quill_core::config::{ProviderConfig, ResolvedConfig};
use quill_core::error::{QuillError, Result};
use quill_core::prompt::{PromptMessage, PromptService};
use quill_core::session::{ConversationStore, MessageRole};
use quill_infrastructure::{ConfigService, ProjectScanner};

use crate::template;

/// Byte cap per important file included in the context payload.
const MAX_CONTEXT_FILE_BYTES: u64 = 16 * 1024;

/// One chat exchange, with explicit, typed options.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    /// The user's message text.
    pub text: String,
    /// Attach a fresh project context payload to the system prompt.
    pub include_context: bool,
    /// Send recent conversation history alongside the new message.
    pub include_history: bool,
    /// Stream the response incrementally.
    pub stream: bool,
    /// Provider override; the configured default applies when `None`.
    pub provider: Option<String>,
}

impl ChatRequest {
    /// A plain request with history on, context and streaming off.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            include_context: false,
            include_history: true,
            stream: false,
            provider: None,
        }
    }
}

/// Orchestrates one conversation over the injected collaborators.
pub struct ChatEngine {
    pub(crate) config: ConfigService,
    pub(crate) store: ConversationStore,
    pub(crate) scanner: ProjectScanner,
    pub(crate) service: Arc<dyn PromptService>,
}

impl ChatEngine {
    pub fn new(
        config: ConfigService,
        store: ConversationStore,
        scanner: ProjectScanner,
        service: Arc<dyn PromptService>,
    ) -> Self {
        Self {
            config,
            store,
            scanner,
            service,
        }
    }

    /// The resolved configuration in effect.
    pub fn config(&self) -> &ResolvedConfig {
        self.config.config()
    }

    /// The configuration service, for dotted-path get/set flows.
    pub fn config_service_mut(&mut self) -> &mut ConfigService {
        &mut self.config
    }

    /// The conversation store.
    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    /// Mutable access to the conversation store (save/load/clear flows).
    pub fn store_mut(&mut self) -> &mut ConversationStore {
        &mut self.store
    }

    /// The project scanner.
    pub fn scanner(&self) -> &ProjectScanner {
        &self.scanner
    }

    /// Mutable access to the scanner (refresh flows).
    pub fn scanner_mut(&mut self) -> &mut ProjectScanner {
        &mut self.scanner
    }

    pub(crate) fn resolve_provider(&self, explicit: Option<&str>) -> Result<ProviderConfig> {
        let config = self.config.config();
        let name = explicit.unwrap_or(config.default_provider.as_str());
        config
            .providers
            .get(name)
            .cloned()
            .ok_or_else(|| QuillError::not_found("provider", name))
    }

    /// Processes one user message and returns the assistant's reply.
    ///
    /// The user message is appended to the store first; on success the
    /// assistant's full text is appended after it. On failure the user
    /// message stays in history, no assistant message is appended, and the
    /// error surfaces unchanged. With `request.stream`, every incremental
    /// fragment is forwarded to `on_chunk` before the call returns.
    pub async fn process_message(
        &mut self,
        request: &ChatRequest,
        on_chunk: Option<&mut (dyn FnMut(&str) + Send)>,
    ) -> Result<String> {
        let provider = self.resolve_provider(request.provider.as_deref())?;
        let params = self.config.config().params.clone();
        let history_limit = self.config.config().history_limit;

        self.store
            .add_message(MessageRole::User, request.text.clone(), BTreeMap::new());

        let mut messages = Vec::new();

        if request.include_context {
            let context = self.scanner.get_context(true, MAX_CONTEXT_FILE_BYTES);
            messages.push(PromptMessage::new(
                MessageRole::System,
                template::render_system_prompt(&context)?,
            ));
        } else {
            messages.push(PromptMessage::new(
                MessageRole::System,
                template::BASE_SYSTEM_PROMPT,
            ));
        }

        if request.include_history {
            // Everything before the just-appended user message.
            let log = self.store.messages();
            let prior = &log[..log.len() - 1];
            let start = prior.len().saturating_sub(history_limit);
            for message in &prior[start..] {
                messages.push(PromptMessage::new(message.role, message.content.clone()));
            }
        }

        messages.push(PromptMessage::new(MessageRole::User, request.text.clone()));

        debug!(
            "dispatching {} messages to provider '{}' (stream: {})",
            messages.len(),
            provider.name,
            request.stream
        );

        let reply = if request.stream {
            let mut sink = |_: &str| {};
            let callback: &mut (dyn FnMut(&str) + Send) = match on_chunk {
                Some(callback) => callback,
                None => &mut sink,
            };
            self.service
                .call_streaming(&provider, &messages, &params, callback)
                .await?
        } else {
            self.service.call(&provider, &messages, &params).await?
        };

        let mut metadata = BTreeMap::new();
        metadata.insert(
            "provider".to_string(),
            serde_json::Value::String(provider.name.clone()),
        );
        self.store
            .add_message(MessageRole::Assistant, reply.clone(), metadata);

        Ok(reply)
    }

    /// One-shot generation (`generate TYPE`); bypasses the conversation
    /// store entirely.
    pub async fn generate(
        &self,
        kind: &str,
        description: &str,
        language: Option<&str>,
    ) -> Result<String> {
        let prompt = template::build_generate_prompt(kind, description, language)?;
        let provider = self.resolve_provider(None)?;
        let params = self.config.config().params.clone();

        let messages = vec![
            PromptMessage::new(MessageRole::System, template::BASE_SYSTEM_PROMPT),
            PromptMessage::new(MessageRole::User, prompt),
        ];

        self.service.call(&provider, &messages, &params).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use quill_core::config::GenerationParams;
    use quill_core::session::StoreSettings;
    use quill_infrastructure::{JsonSessionRepository, QuillPaths};
    use std::collections::VecDeque;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Scripted prompt service that records every request.
    struct MockService {
        replies: Mutex<VecDeque<std::result::Result<String, String>>>,
        requests: Mutex<Vec<Vec<PromptMessage>>>,
    }

    impl MockService {
        fn with_replies(replies: Vec<std::result::Result<String, String>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn next_reply(&self, messages: &[PromptMessage]) -> Result<String> {
            self.requests.lock().unwrap().push(messages.to_vec());
            match self.replies.lock().unwrap().pop_front() {
                Some(Ok(text)) => Ok(text),
                Some(Err(message)) => Err(QuillError::agent_execution(message)),
                None => Err(QuillError::agent_execution("no scripted reply")),
            }
        }

        fn requests(&self) -> Vec<Vec<PromptMessage>> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PromptService for MockService {
        async fn call(
            &self,
            _provider: &ProviderConfig,
            messages: &[PromptMessage],
            _params: &GenerationParams,
        ) -> Result<String> {
            self.next_reply(messages)
        }

        async fn call_streaming(
            &self,
            _provider: &ProviderConfig,
            messages: &[PromptMessage],
            _params: &GenerationParams,
            on_chunk: &mut (dyn for<'a> FnMut(&'a str) + Send),
        ) -> Result<String> {
            let full = self.next_reply(messages)?;
            for piece in full.split_inclusive(' ') {
                on_chunk(piece);
            }
            Ok(full)
        }

        async fn probe(&self, _provider: &ProviderConfig) -> Result<()> {
            Ok(())
        }
    }

    fn engine_with(service: Arc<MockService>) -> (ChatEngine, TempDir) {
        let tmp = TempDir::new().unwrap();
        let config_dir = tmp.path().join("config");
        fs::create_dir_all(&config_dir).unwrap();
        fs::write(
            config_dir.join("llm_config.yml"),
            concat!(
                "default_provider: mock\n",
                "providers:\n",
                "  mock:\n",
                "    adapter: local\n",
                "    url: http://localhost:9\n",
                "    default_model: test-model\n",
            ),
        )
        .unwrap();

        let project_dir = tmp.path().join("project");
        fs::create_dir_all(&project_dir).unwrap();
        fs::write(project_dir.join("Gemfile"), "source 'https://rubygems.org'").unwrap();
        fs::write(project_dir.join("README.md"), "# Demo project").unwrap();

        let config = ConfigService::load(QuillPaths::at(&config_dir)).unwrap();
        let store = ConversationStore::new(
            StoreSettings {
                history_limit: config.config().history_limit,
                auto_save: false,
            },
            Arc::new(JsonSessionRepository::new(config_dir.join("sessions"))),
        );

        struct NoRepo;
        impl quill_core::project::RepositoryInspector for NoRepo {
            fn inspect(&self, _dir: &std::path::Path) -> Option<quill_core::project::RepoMetadata> {
                None
            }
        }
        let scanner = ProjectScanner::new(&project_dir, Arc::new(NoRepo)).unwrap();

        (ChatEngine::new(config, store, scanner, service), tmp)
    }

    #[tokio::test]
    async fn test_process_message_appends_user_and_assistant() {
        let service = MockService::with_replies(vec![Ok("hello there".to_string())]);
        let (mut engine, _tmp) = engine_with(service.clone());

        let reply = engine
            .process_message(&ChatRequest::new("hi"), None)
            .await
            .unwrap();

        assert_eq!(reply, "hello there");
        let log = engine.store().messages();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].role, MessageRole::User);
        assert_eq!(log[1].role, MessageRole::Assistant);
        assert_eq!(log[1].metadata["provider"], serde_json::json!("mock"));
    }

    #[tokio::test]
    async fn test_failure_keeps_user_message_appends_no_assistant() {
        let service = MockService::with_replies(vec![Err("boom".to_string())]);
        let (mut engine, _tmp) = engine_with(service);

        let err = engine
            .process_message(&ChatRequest::new("hi"), None)
            .await
            .unwrap_err();

        assert!(err.is_agent_execution());
        let log = engine.store().messages();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].role, MessageRole::User);
    }

    #[tokio::test]
    async fn test_context_request_leads_with_templated_system_prompt() {
        let service = MockService::with_replies(vec![Ok("ok".to_string())]);
        let (mut engine, _tmp) = engine_with(service.clone());

        let mut request = ChatRequest::new("what is this project?");
        request.include_context = true;
        engine.process_message(&request, None).await.unwrap();

        let requests = service.requests();
        let first = &requests[0][0];
        assert_eq!(first.role, MessageRole::System);
        assert!(first.content.contains("Project: project (ruby)"));
        assert!(first.content.contains("# Demo project"));
    }

    #[tokio::test]
    async fn test_history_excludes_the_new_user_message() {
        let service =
            MockService::with_replies(vec![Ok("first".to_string()), Ok("second".to_string())]);
        let (mut engine, _tmp) = engine_with(service.clone());

        engine
            .process_message(&ChatRequest::new("one"), None)
            .await
            .unwrap();
        engine
            .process_message(&ChatRequest::new("two"), None)
            .await
            .unwrap();

        let requests = service.requests();
        // system + (user "one", assistant "first") + user "two"
        let second_request = &requests[1];
        assert_eq!(second_request.len(), 4);
        assert_eq!(second_request[1].content, "one");
        assert_eq!(second_request[2].content, "first");
        assert_eq!(second_request[3].content, "two");
    }

    #[tokio::test]
    async fn test_streaming_forwards_chunks_and_appends_full_text() {
        let service = MockService::with_replies(vec![Ok("streamed reply here".to_string())]);
        let (mut engine, _tmp) = engine_with(service);

        let mut seen = String::new();
        let mut collect = |chunk: &str| seen.push_str(chunk);
        let mut request = ChatRequest::new("go");
        request.stream = true;

        let reply = engine
            .process_message(&request, Some(&mut collect))
            .await
            .unwrap();

        assert_eq!(seen, "streamed reply here");
        assert_eq!(reply, "streamed reply here");
        assert_eq!(engine.store().messages()[1].content, "streamed reply here");
    }

    #[tokio::test]
    async fn test_unknown_provider_override_is_not_found() {
        let service = MockService::with_replies(vec![]);
        let (mut engine, _tmp) = engine_with(service);

        let mut request = ChatRequest::new("hi");
        request.provider = Some("ghost".to_string());

        let err = engine.process_message(&request, None).await.unwrap_err();
        assert!(matches!(err, QuillError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_generate_bypasses_the_store() {
        let service = MockService::with_replies(vec![Ok("fn main() {}".to_string())]);
        let (engine, _tmp) = engine_with(service);

        let code = engine.generate("code", "hello world", Some("Rust")).await.unwrap();

        assert_eq!(code, "fn main() {}");
        assert!(engine.store().is_empty());
    }

    #[tokio::test]
    async fn test_health_check_creates_extension_dirs() {
        let service = MockService::with_replies(vec![]);
        let (engine, tmp) = engine_with(service);

        let report = engine.health_check().await;

        assert!(report.healthy);
        for dir in ["templates", "workers", "agents", "tools"] {
            assert!(tmp.path().join("config").join(dir).is_dir());
        }
        assert!(report.config_path.ends_with("config.yml"));
    }

    #[tokio::test]
    async fn test_generate_unknown_kind_fails_before_dispatch() {
        let service = MockService::with_replies(vec![]);
        let (engine, _tmp) = engine_with(service.clone());

        let err = engine.generate("poem", "x", None).await.unwrap_err();

        assert!(err.is_invalid_argument());
        assert!(service.requests().is_empty());
    }
}
