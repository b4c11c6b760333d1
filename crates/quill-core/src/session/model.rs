//! Session identity, snapshots, and statistics.

use std::collections::BTreeMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::message::Message;

/// Schema marker written into every session file.
pub const SNAPSHOT_VERSION: &str = "1.0";

/// Mints a new session identifier from the current wall clock.
///
/// Format: `YYYYMMDD_HHMMSSmmm` (UTC). Identifiers are lexically sortable
/// with millisecond resolution, so saved conversation files sort by name
/// in approximately chronological order.
pub fn mint_session_id() -> String {
    Utc::now().format("%Y%m%d_%H%M%S%3f").to_string()
}

/// File-level metadata stored alongside the message list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotMetadata {
    /// Snapshot schema version.
    pub version: String,
    /// Message count at save time.
    pub total_messages: usize,
}

/// The complete persistable state of one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Identifier of the session.
    pub session_id: String,
    /// Seconds since the Unix epoch when the session was created.
    pub created_at: f64,
    /// Full ordered message list.
    pub messages: Vec<Message>,
    /// File-level metadata.
    pub metadata: SnapshotMetadata,
}

/// Aggregate statistics over a session's message log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionStats {
    /// Identifier of the session.
    pub session_id: String,
    /// Total number of messages.
    pub total_messages: usize,
    /// Message count per role name.
    pub role_counts: BTreeMap<String, usize>,
    /// Last timestamp minus first timestamp; zero with one message or none.
    pub duration_seconds: f64,
    /// Mean character length across all messages; zero when empty.
    pub average_message_length: f64,
}

impl SessionStats {
    /// Computes statistics for a session's message list.
    pub fn compute(session_id: &str, messages: &[Message]) -> Self {
        let mut role_counts: BTreeMap<String, usize> = BTreeMap::new();
        for message in messages {
            *role_counts.entry(message.role.to_string()).or_default() += 1;
        }

        let duration_seconds = match (messages.first(), messages.last()) {
            (Some(first), Some(last)) if messages.len() > 1 => last.timestamp - first.timestamp,
            _ => 0.0,
        };

        let average_message_length = if messages.is_empty() {
            0.0
        } else {
            let total_chars: usize = messages.iter().map(|m| m.content.chars().count()).sum();
            total_chars as f64 / messages.len() as f64
        };

        Self {
            session_id: session_id.to_string(),
            total_messages: messages.len(),
            role_counts,
            duration_seconds,
            average_message_length,
        }
    }
}
