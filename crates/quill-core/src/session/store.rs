//! The in-memory conversation store.
//!
//! Owns the ordered message log for the current session and drives
//! persistence through a [`SessionSink`]: explicit save/load, and an
//! automatic save every tenth appended message.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use tracing::{debug, warn};

use crate::error::{QuillError, Result};

use super::message::{Message, MessageRole};
use super::model::{mint_session_id, SessionSnapshot, SessionStats, SnapshotMetadata, SNAPSHOT_VERSION};
use super::repository::SessionSink;

/// Auto-save cadence: persist after every Nth appended message.
const AUTO_SAVE_INTERVAL: usize = 10;

/// Store behavior taken from the resolved configuration.
#[derive(Debug, Clone)]
pub struct StoreSettings {
    /// Default window size for [`ConversationStore::recent_messages`].
    pub history_limit: usize,
    /// Whether the auto-save cadence is active.
    pub auto_save: bool,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            history_limit: 20,
            auto_save: true,
        }
    }
}

/// Ordered, timestamped message log keyed by a session identifier.
pub struct ConversationStore {
    session_id: String,
    created_at: f64,
    messages: Vec<Message>,
    settings: StoreSettings,
    sink: Arc<dyn SessionSink>,
}

fn now_epoch() -> f64 {
    Utc::now().timestamp_millis() as f64 / 1000.0
}

impl ConversationStore {
    /// Creates an empty store with a freshly minted session identifier.
    pub fn new(settings: StoreSettings, sink: Arc<dyn SessionSink>) -> Self {
        Self {
            session_id: mint_session_id(),
            created_at: now_epoch(),
            messages: Vec::new(),
            settings,
            sink,
        }
    }

    /// The current session identifier.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Number of messages in the log.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// The full ordered message log.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Appends a message stamped with the wall clock and the current
    /// session identifier.
    ///
    /// After every successful append, if auto-save is enabled and the
    /// message count is an exact multiple of ten, the session is persisted
    /// to its default file. An auto-save failure is logged and swallowed;
    /// it never reaches the caller.
    pub fn add_message(
        &mut self,
        role: MessageRole,
        content: impl Into<String>,
        metadata: BTreeMap<String, serde_json::Value>,
    ) -> &Message {
        let message = Message {
            role,
            content: content.into(),
            timestamp: now_epoch(),
            session_id: self.session_id.clone(),
            metadata,
        };
        self.messages.push(message);

        if self.settings.auto_save && self.messages.len() % AUTO_SAVE_INTERVAL == 0 {
            if let Err(err) = self.save(None) {
                warn!("auto-save failed: {}", err);
            } else {
                debug!(
                    "auto-saved session {} at {} messages",
                    self.session_id,
                    self.messages.len()
                );
            }
        }

        self.messages.last().expect("just pushed")
    }

    /// Returns the last `limit` messages, oldest first.
    ///
    /// With `limit == None` the configured history limit applies. Never
    /// returns more messages than exist.
    pub fn recent_messages(&self, limit: Option<usize>) -> &[Message] {
        let limit = limit.unwrap_or(self.settings.history_limit);
        let start = self.messages.len().saturating_sub(limit);
        &self.messages[start..]
    }

    /// Builds the persistable snapshot of the current state.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.session_id.clone(),
            created_at: self.created_at,
            messages: self.messages.clone(),
            metadata: SnapshotMetadata {
                version: SNAPSHOT_VERSION.to_string(),
                total_messages: self.messages.len(),
            },
        }
    }

    /// Persists the session, returning the path written.
    ///
    /// Without a name the filename derives from the session identifier, so
    /// repeated unnamed saves overwrite the same file.
    pub fn save(&self, name: Option<&str>) -> Result<PathBuf> {
        self.sink.persist(&self.snapshot(), name)
    }

    /// Loads a saved session, replacing the in-memory state wholesale.
    ///
    /// # Returns
    ///
    /// - `Ok(true)`: loaded; messages and session identifier adopted
    /// - `Ok(false)`: no such file; state unchanged
    /// - `Err(..)`: file exists but is malformed; state unchanged
    pub fn load(&mut self, name: &str) -> Result<bool> {
        match self.sink.retrieve(name)? {
            Some(snapshot) => {
                self.session_id = snapshot.session_id;
                self.created_at = snapshot.created_at;
                self.messages = snapshot.messages;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Empties the message log and mints a fresh session identifier.
    ///
    /// The old identifier is never reused; previously saved files are left
    /// in place.
    pub fn clear(&mut self) {
        self.messages.clear();
        let mut fresh = mint_session_id();
        while fresh == self.session_id {
            // Identifiers have millisecond resolution; wait one out.
            std::thread::sleep(std::time::Duration::from_millis(1));
            fresh = mint_session_id();
        }
        self.session_id = fresh;
        self.created_at = now_epoch();
    }

    /// Aggregate statistics over the current log.
    pub fn stats(&self) -> SessionStats {
        SessionStats::compute(&self.session_id, &self.messages)
    }

    /// Names of saved sessions available to [`ConversationStore::load`].
    pub fn list_sessions(&self) -> Result<Vec<String>> {
        self.sink.list()
    }

    /// Renders the session in the requested format.
    ///
    /// Supported formats: `json` (full structured dump), `markdown`,
    /// `text`. Anything else is an invalid argument.
    pub fn export(&self, format: &str) -> Result<String> {
        match format {
            "json" => Ok(serde_json::to_string_pretty(&self.snapshot())?),
            "markdown" => Ok(self.render_markdown()),
            "text" => Ok(self.render_text()),
            other => Err(QuillError::invalid_argument(format!(
                "unknown export format '{}'; expected json, markdown, or text",
                other
            ))),
        }
    }

    fn render_markdown(&self) -> String {
        let mut out = format!("# Conversation {}\n", self.session_id);
        for message in &self.messages {
            out.push_str(&format!(
                "\n## {} ({})\n\n{}\n",
                message.role,
                format_timestamp(message.timestamp),
                message.content
            ));
        }
        out
    }

    fn render_text(&self) -> String {
        let mut out = format!("Conversation {}\n", self.session_id);
        for message in &self.messages {
            out.push_str(&format!(
                "[{}] {}: {}\n",
                format_timestamp(message.timestamp),
                message.role,
                message.content
            ));
        }
        out
    }
}

fn format_timestamp(epoch_seconds: f64) -> String {
    let millis = (epoch_seconds * 1000.0) as i64;
    match Utc.timestamp_millis_opt(millis) {
        chrono::LocalResult::Single(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        _ => format!("{:.3}", epoch_seconds),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// In-memory sink recording persisted snapshots and call counts.
    #[derive(Default)]
    struct MemorySink {
        saved: Mutex<BTreeMap<String, SessionSnapshot>>,
        persist_calls: Mutex<Vec<usize>>,
        corrupt_names: Mutex<Vec<String>>,
        fail_persist: Mutex<bool>,
    }

    impl MemorySink {
        fn persist_counts(&self) -> Vec<usize> {
            self.persist_calls.lock().unwrap().clone()
        }

        fn mark_corrupt(&self, name: &str) {
            self.corrupt_names.lock().unwrap().push(name.to_string());
        }

        fn set_fail_persist(&self, fail: bool) {
            *self.fail_persist.lock().unwrap() = fail;
        }
    }

    impl SessionSink for MemorySink {
        fn persist(&self, snapshot: &SessionSnapshot, name: Option<&str>) -> Result<PathBuf> {
            if *self.fail_persist.lock().unwrap() {
                return Err(QuillError::io("disk full"));
            }
            let name = name
                .map(str::to_string)
                .unwrap_or_else(|| format!("conversation_{}", snapshot.session_id));
            self.persist_calls
                .lock()
                .unwrap()
                .push(snapshot.messages.len());
            self.saved.lock().unwrap().insert(name.clone(), snapshot.clone());
            Ok(PathBuf::from(format!("{}.json", name)))
        }

        fn retrieve(&self, name: &str) -> Result<Option<SessionSnapshot>> {
            if self.corrupt_names.lock().unwrap().iter().any(|n| n == name) {
                return Err(QuillError::Serialization {
                    format: "JSON".to_string(),
                    message: "unexpected end of input".to_string(),
                });
            }
            Ok(self.saved.lock().unwrap().get(name).cloned())
        }

        fn list(&self) -> Result<Vec<String>> {
            Ok(self.saved.lock().unwrap().keys().cloned().collect())
        }
    }

    fn store_with_sink(auto_save: bool) -> (ConversationStore, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::default());
        let settings = StoreSettings {
            history_limit: 20,
            auto_save,
        };
        (ConversationStore::new(settings, sink.clone()), sink)
    }

    #[test]
    fn test_add_message_appends_in_order_with_session_id() {
        let (mut store, _) = store_with_sink(false);

        store.add_message(MessageRole::User, "hi", BTreeMap::new());
        store.add_message(MessageRole::Assistant, "hello", BTreeMap::new());

        assert_eq!(store.len(), 2);
        assert_eq!(store.messages()[0].content, "hi");
        assert_eq!(store.messages()[1].content, "hello");
        assert!(store
            .messages()
            .iter()
            .all(|m| m.session_id == store.session_id()));
        assert!(store.messages()[0].timestamp <= store.messages()[1].timestamp);
    }

    #[test]
    fn test_recent_messages_window() {
        let (mut store, _) = store_with_sink(false);
        for i in 0..7 {
            store.add_message(MessageRole::User, format!("m{}", i), BTreeMap::new());
        }

        let recent = store.recent_messages(Some(3));
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].content, "m4");
        assert_eq!(recent[2].content, "m6");

        // Never more than exist.
        assert_eq!(store.recent_messages(Some(100)).len(), 7);
        // Default limit comes from settings (20 > 7, so everything).
        assert_eq!(store.recent_messages(None).len(), 7);
    }

    #[test]
    fn test_auto_save_fires_exactly_on_multiples_of_ten() {
        let (mut store, sink) = store_with_sink(true);

        for i in 0..25 {
            store.add_message(MessageRole::User, format!("m{}", i), BTreeMap::new());
        }

        assert_eq!(sink.persist_counts(), vec![10, 20]);
    }

    #[test]
    fn test_auto_save_disabled_never_persists() {
        let (mut store, sink) = store_with_sink(false);

        for i in 0..30 {
            store.add_message(MessageRole::User, format!("m{}", i), BTreeMap::new());
        }

        assert!(sink.persist_counts().is_empty());
    }

    #[test]
    fn test_auto_save_failure_is_swallowed() {
        let (mut store, sink) = store_with_sink(true);
        sink.set_fail_persist(true);

        for i in 0..10 {
            store.add_message(MessageRole::User, format!("m{}", i), BTreeMap::new());
        }

        // The failing tenth append still lands in the log.
        assert_eq!(store.len(), 10);
    }

    #[test]
    fn test_save_load_round_trip() {
        let (mut store, sink) = store_with_sink(false);
        store.add_message(MessageRole::User, "hi", BTreeMap::new());
        store.add_message(MessageRole::Assistant, "hello", BTreeMap::new());
        let original_id = store.session_id().to_string();
        let original_messages = store.messages().to_vec();

        store.save(Some("pinned")).unwrap();

        let settings = StoreSettings::default();
        let mut restored = ConversationStore::new(settings, sink);
        assert!(restored.load("pinned").unwrap());

        assert_eq!(restored.session_id(), original_id);
        assert_eq!(restored.messages(), original_messages.as_slice());
    }

    #[test]
    fn test_load_missing_returns_false_state_unchanged() {
        let (mut store, _) = store_with_sink(false);
        store.add_message(MessageRole::User, "hi", BTreeMap::new());
        let id_before = store.session_id().to_string();

        assert!(!store.load("nope").unwrap());
        assert_eq!(store.session_id(), id_before);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_load_corrupt_errors_state_unchanged() {
        let (mut store, sink) = store_with_sink(false);
        store.add_message(MessageRole::User, "hi", BTreeMap::new());
        let id_before = store.session_id().to_string();
        sink.mark_corrupt("bad");

        let err = store.load("bad").unwrap_err();
        assert!(err.is_serialization());
        assert_eq!(store.session_id(), id_before);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_default_save_name_overwrites_same_file() {
        let (mut store, sink) = store_with_sink(false);
        store.add_message(MessageRole::User, "one", BTreeMap::new());
        let first = store.save(None).unwrap();
        store.add_message(MessageRole::User, "two", BTreeMap::new());
        let second = store.save(None).unwrap();

        assert_eq!(first, second);
        assert_eq!(sink.saved.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_clear_mints_fresh_id_and_keeps_saved_files() {
        let (mut store, sink) = store_with_sink(false);
        store.add_message(MessageRole::User, "hi", BTreeMap::new());
        store.save(Some("kept")).unwrap();
        let old_id = store.session_id().to_string();

        store.clear();

        assert!(store.is_empty());
        assert_ne!(store.session_id(), old_id);
        assert_eq!(sink.saved.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_stats_clean_session_scenario() {
        let (mut store, _) = store_with_sink(false);
        store.add_message(MessageRole::User, "hi", BTreeMap::new());
        store.add_message(MessageRole::Assistant, "hello", BTreeMap::new());

        let stats = store.stats();
        assert_eq!(stats.total_messages, 2);
        assert_eq!(stats.role_counts["user"], 1);
        assert_eq!(stats.role_counts["assistant"], 1);
        assert!(stats.duration_seconds >= 0.0);
    }

    #[test]
    fn test_export_formats() {
        let (mut store, _) = store_with_sink(false);
        store.add_message(MessageRole::User, "hi there", BTreeMap::new());

        let json = store.export("json").unwrap();
        let parsed: SessionSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.messages.len(), 1);
        assert_eq!(parsed.metadata.total_messages, 1);

        let markdown = store.export("markdown").unwrap();
        assert!(markdown.contains("## user"));
        assert!(markdown.contains("hi there"));

        let text = store.export("text").unwrap();
        assert!(text.contains("user: hi there"));
    }

    #[test]
    fn test_export_unknown_format_is_invalid_argument() {
        let (store, _) = store_with_sink(false);

        let err = store.export("xml").unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_session_ids_sort_chronologically() {
        let (mut store, _) = store_with_sink(false);
        let first = store.session_id().to_string();
        store.clear();
        let second = store.session_id().to_string();

        assert!(first < second);
    }
}
