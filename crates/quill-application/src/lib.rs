//! Application layer for Quill.
//!
//! Use-case composition: the [`ChatEngine`] wires configuration, the
//! conversation store, the project scanner, and the prompt execution
//! service into the operations the CLI exposes.

pub mod engine;
pub mod health;
pub mod template;

pub use engine::{ChatEngine, ChatRequest};
pub use health::HealthReport;
