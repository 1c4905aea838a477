//! Install request
//!
//! Defines what a single install action operates on.

use std::path::PathBuf;

use crate::config::{require_dir, ConfigError};
use crate::manifest::bundled_files_dir;

/// One user-initiated install. Built per action and consumed once.
#[derive(Debug, Clone)]
pub struct InstallRequest {
    /// Game directory the payload is installed into
    pub target_dir: PathBuf,

    /// Move pre-existing items into `reshade_backup` first
    pub backup: bool,

    /// Directory holding the payload items
    pub source_dir: PathBuf,
}

impl InstallRequest {
    /// Request installing the bundled payload into `target_dir`, no backup.
    pub fn new(target_dir: impl Into<PathBuf>) -> Self {
        Self {
            target_dir: target_dir.into(),
            backup: false,
            source_dir: bundled_files_dir(),
        }
    }

    pub fn with_backup(mut self, backup: bool) -> Self {
        self.backup = backup;
        self
    }

    pub fn with_source(mut self, source_dir: impl Into<PathBuf>) -> Self {
        self.source_dir = source_dir.into();
        self
    }

    /// Validate the request
    ///
    /// Individual missing payload items are not checked here; those are
    /// reported per item during the copy.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_dir(&self.target_dir, "game folder")?;
        require_dir(&self.source_dir, "payload folder")?;
        Ok(())
    }
}
