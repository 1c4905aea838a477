//! Precondition checks run before an operation is started.
//!
//! A missing folder or archive selection is reported to the user as a
//! warning and the operation is never attempted.

use std::path::{Path, PathBuf};

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Please select the {0}.")]
    NotSelected(&'static str),

    #[error("Select a valid {what}: {path} is not a folder")]
    NotADirectory { what: &'static str, path: PathBuf },

    #[error("Select a valid {what}: {path} is not a file")]
    NotAFile { what: &'static str, path: PathBuf },
}

/// Require `path` to be an existing directory.
pub fn require_dir(path: &Path, what: &'static str) -> Result<(), ConfigError> {
    if path.as_os_str().is_empty() {
        return Err(ConfigError::NotSelected(what));
    }
    if !path.is_dir() {
        return Err(ConfigError::NotADirectory {
            what,
            path: path.to_path_buf(),
        });
    }
    Ok(())
}

/// Require `path` to be an existing regular file.
pub fn require_file(path: &Path, what: &'static str) -> Result<(), ConfigError> {
    if path.as_os_str().is_empty() {
        return Err(ConfigError::NotSelected(what));
    }
    if !path.is_file() {
        return Err(ConfigError::NotAFile {
            what,
            path: path.to_path_buf(),
        });
    }
    Ok(())
}
