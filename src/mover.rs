//! Event prepare: move every mod out of the mods folder into a temp folder
//! and back again.
//!
//! Unlike the installer this is fail-fast. The first entry that cannot be
//! moved stops the run and the error is handed back to the caller.

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::paths::{ensure_parent_dirs, move_entry, same_path};
use crate::progress::Reporter;

/// Temp folder created inside the mods folder.
pub const TEMP_BACKUP_DIR_NAME: &str = "temp_backup";

/// Bulk move errors
#[derive(Debug, thiserror::Error)]
pub enum MoveError {
    #[error("Failed to list {}: {source}", path.display())]
    List {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to move {}: {source}", entry.to_string_lossy())]
    Move {
        entry: OsString,
        #[source]
        source: io::Error,
    },
}

/// Direction of an event-prepare run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveMode {
    /// Mods folder -> temp folder
    Backup,
    /// Temp folder -> mods folder
    Restore,
}

impl MoveMode {
    pub fn label(&self) -> &'static str {
        match self {
            MoveMode::Backup => "Backup",
            MoveMode::Restore => "Restore",
        }
    }
}

impl std::fmt::Display for MoveMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A set of entries to relocate from one root to another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkMoveJob {
    pub source: PathBuf,
    pub dest: PathBuf,
    /// Entry names relative to `source`, in move order
    pub entries: Vec<OsString>,
    /// Label used in log lines
    pub mode: MoveMode,
}

/// Path of the temp folder for `mods_dir`.
pub fn temp_backup_dir(mods_dir: &Path) -> PathBuf {
    mods_dir.join(TEMP_BACKUP_DIR_NAME)
}

/// Path of the temp folder for `mods_dir`, creating it if needed.
pub fn ensure_temp_backup_dir(mods_dir: &Path) -> io::Result<PathBuf> {
    let temp = temp_backup_dir(mods_dir);
    fs::create_dir_all(&temp)?;
    Ok(temp)
}

/// List the children of `dir` by name, sorted, leaving out `exclude`.
///
/// `exclude` is compared by absolute path so a temp folder nested inside
/// the listed folder is never moved into itself.
pub fn list_entries(dir: &Path, exclude: Option<&Path>) -> Result<Vec<OsString>, MoveError> {
    let read_dir = fs::read_dir(dir).map_err(|source| MoveError::List {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut entries = Vec::new();
    for entry in read_dir {
        let entry = entry.map_err(|source| MoveError::List {
            path: dir.to_path_buf(),
            source,
        })?;

        if let Some(exclude) = exclude {
            if same_path(&entry.path(), exclude) {
                continue;
            }
        }

        entries.push(entry.file_name());
    }

    entries.sort();
    Ok(entries)
}

/// Build the job for `mode` between the mods folder and its temp folder.
pub fn plan(mode: MoveMode, mods_dir: &Path, temp_dir: &Path) -> Result<BulkMoveJob, MoveError> {
    let job = match mode {
        MoveMode::Backup => BulkMoveJob {
            source: mods_dir.to_path_buf(),
            dest: temp_dir.to_path_buf(),
            entries: list_entries(mods_dir, Some(temp_dir))?,
            mode,
        },
        MoveMode::Restore => BulkMoveJob {
            source: temp_dir.to_path_buf(),
            dest: mods_dir.to_path_buf(),
            entries: list_entries(temp_dir, None)?,
            mode,
        },
    };
    Ok(job)
}

/// Move every entry of `job`, reporting `i/total` after each one.
///
/// Stops at the first failure. Returns the number of entries moved.
pub fn move_all(job: &BulkMoveJob, reporter: &Reporter) -> Result<usize, MoveError> {
    let total = job.entries.len();
    reporter.begin();
    info!(
        "{}: moving {} entries from {} to {}",
        job.mode,
        total,
        job.source.display(),
        job.dest.display()
    );

    for (idx, name) in job.entries.iter().enumerate() {
        let from = job.source.join(name);
        let to = job.dest.join(name);

        ensure_parent_dirs(&to)
            .and_then(|_| move_entry(&from, &to))
            .map_err(|source| MoveError::Move {
                entry: name.clone(),
                source,
            })?;

        reporter.progress((idx + 1) as f64 / total as f64);
        reporter.log(format!("{} {}/{}", job.mode, idx + 1, total));
    }

    reporter.progress(1.0);
    reporter.log(format!("{} complete.", job.mode));
    Ok(total)
}
