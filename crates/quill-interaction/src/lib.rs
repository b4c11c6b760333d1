//! Provider interaction layer for Quill.
//!
//! Implements the domain's `PromptService` seam over HTTP: an Anthropic
//! messages-API adapter, an OpenAI chat-completions adapter, and a local
//! OpenAI-compatible adapter, with incremental SSE streaming.

mod anthropic;
mod openai;
mod service;
mod sse;

pub use service::HttpPromptService;
