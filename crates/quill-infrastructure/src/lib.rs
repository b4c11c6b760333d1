//! Infrastructure layer for Quill.
//!
//! Everything that touches the outside world on behalf of the domain
//! layer: filesystem paths, YAML configuration storage, the JSON session
//! repository, the project scanner, and the git inspector.

pub mod config_service;
pub mod config_storage;
pub mod git;
pub mod paths;
pub mod scanner;
pub mod session_repository;

pub use config_service::ConfigService;
pub use config_storage::YamlDocumentStorage;
pub use git::GitInspector;
pub use paths::QuillPaths;
pub use scanner::ProjectScanner;
pub use session_repository::JsonSessionRepository;
