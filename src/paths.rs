//! File system helpers shared by the installer and the bulk mover.
//!
//! - Moving entries with a copy+delete fallback across devices
//! - Removing a file or directory tree uniformly
//! - Comparing paths by their absolute form

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use filetime::FileTime;
use walkdir::WalkDir;

/// Create parent directories for a path if they don't exist
pub fn ensure_parent_dirs(path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Absolute form of `path` without touching the file system.
///
/// Relative paths are joined onto the current directory; `.` and `..`
/// components are folded lexically.
pub fn absolute(path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };

    let mut normalized = PathBuf::new();
    for component in joined.components() {
        match component {
            std::path::Component::CurDir => {}
            std::path::Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

/// Check if two paths point at the same location
pub fn same_path(a: &Path, b: &Path) -> bool {
    absolute(a) == absolute(b)
}

/// Remove a file or a whole directory tree.
pub fn remove_entry(path: &Path) -> io::Result<()> {
    let metadata = fs::symlink_metadata(path)?;
    if metadata.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}

/// Copy a single file, overwriting `dest`, and carry over its access and
/// modification times.
pub fn copy_file_preserving_times(source: &Path, dest: &Path) -> io::Result<u64> {
    let bytes = fs::copy(source, dest)?;
    let metadata = fs::metadata(source)?;
    filetime::set_file_times(
        dest,
        FileTime::from_last_access_time(&metadata),
        FileTime::from_last_modification_time(&metadata),
    )?;
    Ok(bytes)
}

/// Recursively copy `source` into `dest`, merging with whatever is already
/// there. Existing files with the same relative path are overwritten,
/// unrelated entries are left alone.
///
/// Returns the number of files copied.
pub fn merge_copy_dir(source: &Path, dest: &Path) -> io::Result<u64> {
    if !source.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("Not a directory: {}", source.display()),
        ));
    }

    fs::create_dir_all(dest)?;

    let mut files_copied = 0;
    for entry in WalkDir::new(source).follow_links(true) {
        let entry = entry.map_err(io::Error::from)?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        let dest_path = dest.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&dest_path)?;
        } else if entry.file_type().is_file() {
            ensure_parent_dirs(&dest_path)?;
            copy_file_preserving_times(entry.path(), &dest_path)?;
            files_copied += 1;
        }
    }

    Ok(files_copied)
}

#[cfg(unix)]
fn is_cross_device(err: &io::Error) -> bool {
    err.raw_os_error() == Some(libc::EXDEV)
}

#[cfg(windows)]
fn is_cross_device(err: &io::Error) -> bool {
    // ERROR_NOT_SAME_DEVICE
    err.raw_os_error() == Some(17)
}

#[cfg(not(any(unix, windows)))]
fn is_cross_device(_err: &io::Error) -> bool {
    false
}

/// Move a file or directory to `dest`.
///
/// Uses a rename. When source and destination live on different devices
/// the entry is copied and the source removed afterwards.
pub fn move_entry(source: &Path, dest: &Path) -> io::Result<()> {
    match fs::rename(source, dest) {
        Ok(()) => Ok(()),
        Err(e) if is_cross_device(&e) => {
            tracing::debug!(
                "Cross-device move, copying {} to {}",
                source.display(),
                dest.display()
            );
            copy_then_remove(source, dest)
        }
        Err(e) => Err(e),
    }
}

/// Copy `source` to `dest`, then delete `source`.
fn copy_then_remove(source: &Path, dest: &Path) -> io::Result<()> {
    if source.is_dir() {
        merge_copy_dir(source, dest)?;
        fs::remove_dir_all(source)
    } else {
        copy_file_preserving_times(source, dest)?;
        fs::remove_file(source)
    }
}
