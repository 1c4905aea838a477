//! Backup phase: set aside pre-existing items before they get overwritten.

use std::io;
use std::path::{Path, PathBuf};

use crate::paths::{ensure_parent_dirs, move_entry, remove_entry};

/// Backup folder created inside the install target.
pub const BACKUP_DIR_NAME: &str = "reshade_backup";

/// Path of the backup folder for `target_dir`.
pub fn backup_dir(target_dir: &Path) -> PathBuf {
    target_dir.join(BACKUP_DIR_NAME)
}

/// Move `target_dir/<item>` into `backup_dir/<item>`.
///
/// Returns `Ok(None)` when there is nothing to back up. Anything already
/// at the backup location is removed first so repeated installs keep
/// only the most recent backup.
pub fn backup_item(target_dir: &Path, backup_dir: &Path, item: &str) -> io::Result<Option<PathBuf>> {
    let live = target_dir.join(item);
    if !live.exists() {
        return Ok(None);
    }

    let dest = backup_dir.join(item);
    if dest.exists() {
        if let Err(e) = remove_entry(&dest) {
            tracing::debug!("Could not clear old backup {}: {}", dest.display(), e);
        }
    }

    ensure_parent_dirs(&dest)?;
    move_entry(&live, &dest)?;
    Ok(Some(dest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_nothing_to_back_up() {
        let target = TempDir::new().unwrap();
        let backup = backup_dir(target.path());
        assert_eq!(backup_item(target.path(), &backup, "dxgi.dll").unwrap(), None);
        assert!(!backup.join("dxgi.dll").exists());
    }

    #[test]
    fn test_backup_replaces_previous_backup() {
        let target = TempDir::new().unwrap();
        let backup = backup_dir(target.path());

        std::fs::create_dir_all(backup.join("reshade-shaders/Old")).unwrap();
        std::fs::write(backup.join("reshade-shaders/Old/stale.fx"), b"stale").unwrap();

        std::fs::create_dir_all(target.path().join("reshade-shaders")).unwrap();
        std::fs::write(target.path().join("reshade-shaders/live.fx"), b"live").unwrap();

        let dest = backup_item(target.path(), &backup, "reshade-shaders").unwrap();

        assert_eq!(dest, Some(backup.join("reshade-shaders")));
        assert!(!target.path().join("reshade-shaders").exists());
        assert!(backup.join("reshade-shaders/live.fx").exists());
        assert!(!backup.join("reshade-shaders/Old").exists());
    }

    #[test]
    fn test_backup_file_over_file() {
        let target = TempDir::new().unwrap();
        let backup = backup_dir(target.path());
        std::fs::create_dir_all(&backup).unwrap();
        std::fs::write(backup.join("ReShade.ini"), b"first").unwrap();
        std::fs::write(target.path().join("ReShade.ini"), b"second").unwrap();

        backup_item(target.path(), &backup, "ReShade.ini").unwrap();

        assert_eq!(std::fs::read(backup.join("ReShade.ini")).unwrap(), b"second");
        assert!(!target.path().join("ReShade.ini").exists());
    }
}
