//! External extraction tool discovery and invocation.
//!
//! Anything that is not a zip is handed to an external archiver. The tool
//! is looked up in this order, first hit wins:
//!
//! 1. A bundled `UnRAR.exe` (`unrar` outside Windows) next to the executable
//! 2. `WinRAR\UnRAR.exe` under `%ProgramFiles%` and `%ProgramFiles(x86)%`
//! 3. `7z`, `7za` or `7zr` on `PATH`
//!
//! # Command lines
//!
//! - UnRAR: `unrar x -o+ archive.rar dest/`
//!   - `-o+`: Overwrite existing files
//!   - destination must end in a path separator
//! - 7-Zip: `7z x archive.rar -odest -y`
//!   - `-o{dir}`: Output directory
//!   - `-y`: Yes to all prompts

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use super::ExtractError;

/// Bundled extractor file name
#[cfg(windows)]
pub const BUNDLED_NAMES: &[&str] = &["UnRAR.exe"];
#[cfg(not(windows))]
pub const BUNDLED_NAMES: &[&str] = &["unrar"];

/// Environment variables naming program-files style directories
pub const PROGRAM_FILES_VARS: &[&str] = &["ProgramFiles", "ProgramFiles(x86)"];

/// Archivers accepted from `PATH`, in preference order
pub const PATH_NAMES: &[&str] = &["7z", "7za", "7zr"];

/// Argument convention of an extractor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractorFlavor {
    /// RAR family (`unrar`, `UnRAR.exe`)
    UnRar,
    /// 7-Zip family (`7z`, `7za`, `7zr`)
    SevenZip,
}

/// A located extraction tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extractor {
    pub path: PathBuf,
    pub flavor: ExtractorFlavor,
}

impl Extractor {
    /// Wrap a tool path, picking the flavor from its file name.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        let flavor = if name.starts_with("unrar") {
            ExtractorFlavor::UnRar
        } else {
            ExtractorFlavor::SevenZip
        };

        Self { path, flavor }
    }

    /// Arguments that extract `archive` into `dest`.
    pub fn args(&self, archive: &Path, dest: &Path) -> Vec<OsString> {
        match self.flavor {
            ExtractorFlavor::UnRar => {
                let mut dest_arg = dest.as_os_str().to_os_string();
                if !dest_arg.to_string_lossy().ends_with(['/', '\\']) {
                    dest_arg.push(std::path::MAIN_SEPARATOR_STR);
                }
                vec![
                    "x".into(),
                    "-o+".into(),
                    archive.as_os_str().to_os_string(),
                    dest_arg,
                ]
            }
            ExtractorFlavor::SevenZip => {
                let mut out_arg = OsString::from("-o");
                out_arg.push(dest.as_os_str());
                vec![
                    "x".into(),
                    archive.as_os_str().to_os_string(),
                    out_arg,
                    "-y".into(),
                ]
            }
        }
    }

    /// Command that extracts `archive` into `dest` with output suppressed.
    pub fn command(&self, archive: &Path, dest: &Path) -> Command {
        let mut cmd = Command::new(&self.path);
        cmd.args(self.args(archive, dest))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        cmd
    }

    /// Run the extraction. A non-zero exit status is an error.
    pub fn run(&self, archive: &Path, dest: &Path) -> Result<(), ExtractError> {
        tracing::debug!(
            "Running {} on {} -> {}",
            self.path.display(),
            archive.display(),
            dest.display()
        );

        let status = self
            .command(archive, dest)
            .status()
            .map_err(|source| ExtractError::Launch {
                tool: self.path.clone(),
                source,
            })?;

        if !status.success() {
            return Err(ExtractError::ToolFailed {
                tool: self.path.clone(),
                status,
            });
        }

        Ok(())
    }
}

/// Where to look for an extractor.
#[derive(Debug, Clone, Default)]
pub struct ExtractorSearch {
    /// Directory the program ships in
    pub bundled_dir: Option<PathBuf>,
    /// Program-files style roots checked for `WinRAR/UnRAR.exe`
    pub program_files: Vec<PathBuf>,
    /// `PATH`-style search list
    pub search_path: Option<OsString>,
}

impl ExtractorSearch {
    /// Search inputs taken from the running process.
    pub fn from_env() -> Self {
        let bundled_dir = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf));

        let program_files = PROGRAM_FILES_VARS
            .iter()
            .filter_map(|var| std::env::var_os(var))
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .collect();

        Self {
            bundled_dir,
            program_files,
            search_path: std::env::var_os("PATH"),
        }
    }

    /// Fixed file locations checked before `PATH`, in order.
    pub fn file_candidates(&self) -> Vec<PathBuf> {
        let mut candidates = Vec::new();
        if let Some(ref dir) = self.bundled_dir {
            candidates.extend(BUNDLED_NAMES.iter().map(|name| dir.join(name)));
        }
        for root in &self.program_files {
            candidates.push(root.join("WinRAR").join("UnRAR.exe"));
        }
        candidates
    }

    /// Find the first available extractor.
    pub fn locate(&self) -> Result<Extractor, ExtractError> {
        for candidate in self.file_candidates() {
            if candidate.is_file() {
                tracing::debug!("Using extractor {}", candidate.display());
                return Ok(Extractor::new(candidate));
            }
        }

        if let Some(ref search_path) = self.search_path {
            let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
            for name in PATH_NAMES {
                if let Ok(found) = which::which_in(name, Some(search_path), &cwd) {
                    tracing::debug!("Using extractor {} from PATH", found.display());
                    return Ok(Extractor::new(found));
                }
            }
        }

        Err(ExtractError::NoExtractor)
    }
}

/// Locate an extractor using the real environment.
pub fn locate_extractor() -> Result<Extractor, ExtractError> {
    ExtractorSearch::from_env().locate()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_flavor_from_name() {
        assert_eq!(Extractor::new("C:/WinRAR/UnRAR.exe").flavor, ExtractorFlavor::UnRar);
        assert_eq!(Extractor::new("/usr/bin/unrar").flavor, ExtractorFlavor::UnRar);
        assert_eq!(Extractor::new("/usr/bin/7z").flavor, ExtractorFlavor::SevenZip);
        assert_eq!(Extractor::new("/usr/bin/7za").flavor, ExtractorFlavor::SevenZip);
    }

    #[test]
    fn test_unrar_args() {
        let ex = Extractor::new("/opt/unrar");
        let args = ex.args(Path::new("/dl/bodycam.rar"), Path::new("/game/Win64"));
        let expected_dest = format!("/game/Win64{}", std::path::MAIN_SEPARATOR);
        assert_eq!(
            args,
            vec![
                OsString::from("x"),
                OsString::from("-o+"),
                OsString::from("/dl/bodycam.rar"),
                OsString::from(expected_dest),
            ]
        );

        // Already terminated destinations are left alone
        let args = ex.args(Path::new("a.rar"), Path::new("/out/"));
        assert_eq!(args[3], OsString::from("/out/"));
    }

    #[test]
    fn test_sevenzip_args() {
        let ex = Extractor::new("/usr/bin/7z");
        let args = ex.args(Path::new("/dl/bodycam.rar"), Path::new("/game/Win64"));
        assert_eq!(
            args,
            vec![
                OsString::from("x"),
                OsString::from("/dl/bodycam.rar"),
                OsString::from("-o/game/Win64"),
                OsString::from("-y"),
            ]
        );
    }

    #[test]
    fn test_nothing_found() {
        let empty = TempDir::new().unwrap();
        let search = ExtractorSearch {
            bundled_dir: Some(empty.path().to_path_buf()),
            program_files: vec![empty.path().to_path_buf()],
            search_path: Some(empty.path().as_os_str().to_os_string()),
        };
        assert!(matches!(search.locate(), Err(ExtractError::NoExtractor)));
        assert!(matches!(ExtractorSearch::default().locate(), Err(ExtractError::NoExtractor)));
    }

    #[test]
    fn test_bundled_wins_over_program_files() {
        let bundled = TempDir::new().unwrap();
        let program_files = TempDir::new().unwrap();
        std::fs::write(bundled.path().join(BUNDLED_NAMES[0]), b"").unwrap();
        std::fs::create_dir_all(program_files.path().join("WinRAR")).unwrap();
        std::fs::write(program_files.path().join("WinRAR/UnRAR.exe"), b"").unwrap();

        let search = ExtractorSearch {
            bundled_dir: Some(bundled.path().to_path_buf()),
            program_files: vec![program_files.path().to_path_buf()],
            search_path: None,
        };
        let found = search.locate().unwrap();
        assert_eq!(found.path, bundled.path().join(BUNDLED_NAMES[0]));
        assert_eq!(found.flavor, ExtractorFlavor::UnRar);
    }

    #[test]
    fn test_program_files_order() {
        let x64 = TempDir::new().unwrap();
        let x86 = TempDir::new().unwrap();
        std::fs::create_dir_all(x86.path().join("WinRAR")).unwrap();
        std::fs::write(x86.path().join("WinRAR/UnRAR.exe"), b"").unwrap();

        let search = ExtractorSearch {
            bundled_dir: None,
            program_files: vec![x64.path().to_path_buf(), x86.path().to_path_buf()],
            search_path: None,
        };
        assert_eq!(search.locate().unwrap().path, x86.path().join("WinRAR/UnRAR.exe"));
    }

    #[cfg(unix)]
    #[test]
    fn test_found_on_path() {
        use std::os::unix::fs::PermissionsExt;

        let bin = TempDir::new().unwrap();
        let tool = bin.path().join("7za");
        std::fs::write(&tool, b"#!/bin/sh\nexit 0\n").unwrap();
        std::fs::set_permissions(&tool, std::fs::Permissions::from_mode(0o755)).unwrap();

        let search = ExtractorSearch {
            bundled_dir: None,
            program_files: Vec::new(),
            search_path: Some(bin.path().as_os_str().to_os_string()),
        };
        let found = search.locate().unwrap();
        assert_eq!(found.path, tool);
        assert_eq!(found.flavor, ExtractorFlavor::SevenZip);
    }

    #[cfg(unix)]
    #[test]
    fn test_run_reports_exit_status() {
        let bin = TempDir::new().unwrap();

        // `false` ignores its arguments and exits 1
        let err = Extractor::new("false")
            .run(Path::new("a.rar"), bin.path())
            .unwrap_err();
        assert!(matches!(err, ExtractError::ToolFailed { .. }));

        let missing = Extractor::new(bin.path().join("unrar"));
        assert!(matches!(
            missing.run(Path::new("a.rar"), bin.path()),
            Err(ExtractError::Launch { .. })
        ));
    }
}
