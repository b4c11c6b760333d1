//! Session persistence trait.
//!
//! Defines the interface the conversation store persists through,
//! decoupling the domain from the on-disk format and location.

use std::path::PathBuf;

use crate::error::Result;

use super::model::SessionSnapshot;

/// An abstract sink for session snapshots.
///
/// Implementations decide the file naming and directory layout. The
/// missing-versus-corrupt asymmetry is part of the contract: callers
/// branch on it.
pub trait SessionSink: Send + Sync {
    /// Writes a snapshot, returning the path written.
    ///
    /// With `name == None` the filename is derived from the snapshot's
    /// session identifier, so repeated unnamed saves overwrite one file.
    fn persist(&self, snapshot: &SessionSnapshot, name: Option<&str>) -> Result<PathBuf>;

    /// Reads a snapshot by name.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(snapshot))`: found and parsed
    /// - `Ok(None)`: no such file
    /// - `Err(QuillError::Serialization { .. })`: file exists but is malformed
    fn retrieve(&self, name: &str) -> Result<Option<SessionSnapshot>>;

    /// Lists stored session names, sorted ascending.
    fn list(&self) -> Result<Vec<String>>;
}
