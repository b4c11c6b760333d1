//! Conversation session domain.
//!
//! A session is one identifiable conversation: an ordered, timestamped
//! message log with lifecycle (mint, clear, persist, restore), statistics,
//! and export renderings. Persistence goes through the [`SessionSink`]
//! trait so storage stays out of the domain layer.

pub mod message;
pub mod model;
pub mod repository;
pub mod store;

pub use message::{Message, MessageRole};
pub use model::{mint_session_id, SessionSnapshot, SessionStats, SnapshotMetadata};
pub use repository::SessionSink;
pub use store::{ConversationStore, StoreSettings};
