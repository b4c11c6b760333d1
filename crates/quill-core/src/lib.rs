//! Core domain layer for Quill.
//!
//! This crate holds the domain models, the shared error taxonomy, and the
//! service traits the outer layers implement: configuration resolution,
//! conversation state, project context, and the prompt execution seam.

pub mod config;
pub mod error;
pub mod project;
pub mod prompt;
pub mod session;

pub use error::{QuillError, Result};
