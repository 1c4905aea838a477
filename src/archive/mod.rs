//! Archive extraction.
//!
//! Zip archives are extracted in-process with the zip crate and report
//! per-member progress. Everything else (rar and friends) is handed to an
//! external tool located at runtime, see [`extractor`]. That path has no
//! per-member visibility, so it reports the indeterminate progress state.

pub mod extractor;
pub mod zip_extract;

pub use extractor::{locate_extractor, Extractor, ExtractorFlavor, ExtractorSearch};
pub use zip_extract::extract_zip;

use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;

use crate::progress::Reporter;

/// Archive extraction errors
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("No extractor found! Install UnRAR.exe or 7-Zip/WinRAR.")]
    NoExtractor,

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to read zip archive {}: {source}", path.display())]
    Zip {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("Failed to run {}: {source}", tool.display())]
    Launch {
        tool: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{} failed with {status}", tool.display())]
    ToolFailed { tool: PathBuf, status: ExitStatus },
}

/// How an archive gets extracted, decided by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    /// `.zip`, extracted natively
    Zip,
    /// Anything else, extracted by an external tool
    External,
}

impl ArchiveKind {
    pub fn from_path(path: &Path) -> Self {
        let is_zip = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("zip"))
            .unwrap_or(false);

        if is_zip {
            ArchiveKind::Zip
        } else {
            ArchiveKind::External
        }
    }
}

/// What an extraction did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractSummary {
    /// Members written for zip archives; `None` for external extraction
    pub members: Option<usize>,
}

/// Extract `archive_path` into `dest`, locating an external tool from the
/// real environment when one is needed.
pub fn extract(archive_path: &Path, dest: &Path, reporter: &Reporter) -> Result<ExtractSummary, ExtractError> {
    extract_with_search(archive_path, dest, &ExtractorSearch::from_env(), reporter)
}

/// Extract using an explicit extractor search.
///
/// For non-zip archives the extractor is located before anything is
/// written, so a missing tool leaves the file system untouched.
pub fn extract_with_search(
    archive_path: &Path,
    dest: &Path,
    search: &ExtractorSearch,
    reporter: &Reporter,
) -> Result<ExtractSummary, ExtractError> {
    match ArchiveKind::from_path(archive_path) {
        ArchiveKind::Zip => {
            let members = extract_zip(archive_path, dest, reporter)?;
            reporter.log(format!(
                "Extracted {} files from {}",
                members,
                display_name(archive_path)
            ));
            Ok(ExtractSummary {
                members: Some(members),
            })
        }
        ArchiveKind::External => {
            let extractor = search.locate()?;
            reporter.indeterminate();
            reporter.log(format!(
                "Extracting {} with {}",
                display_name(archive_path),
                extractor.path.display()
            ));

            std::fs::create_dir_all(dest).map_err(|source| ExtractError::Io {
                path: dest.to_path_buf(),
                source,
            })?;
            extractor.run(archive_path, dest)?;

            reporter.log(format!("Extracted {}", display_name(archive_path)));
            Ok(ExtractSummary { members: None })
        }
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::{EventLog, ProgressEvent};
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_kind_from_extension() {
        assert_eq!(ArchiveKind::from_path(Path::new("a.zip")), ArchiveKind::Zip);
        assert_eq!(ArchiveKind::from_path(Path::new("A.ZIP")), ArchiveKind::Zip);
        assert_eq!(ArchiveKind::from_path(Path::new("a.rar")), ArchiveKind::External);
        assert_eq!(ArchiveKind::from_path(Path::new("a.7z")), ArchiveKind::External);
        assert_eq!(ArchiveKind::from_path(Path::new("zip")), ArchiveKind::External);
    }

    #[test]
    fn test_zip_needs_no_extractor() {
        let dir = TempDir::new().unwrap();
        let zip_path = dir.path().join("bodycam.zip");
        {
            let file = std::fs::File::create(&zip_path).unwrap();
            let mut zip = zip::ZipWriter::new(file);
            let options = zip::write::SimpleFileOptions::default();
            zip.start_file("one.txt", options).unwrap();
            zip.write_all(b"1").unwrap();
            zip.start_file("two.txt", options).unwrap();
            zip.write_all(b"2").unwrap();
            zip.finish().unwrap();
        }

        let dest = dir.path().join("Win64");
        let log = EventLog::new();
        let summary =
            extract_with_search(&zip_path, &dest, &ExtractorSearch::default(), &log.reporter()).unwrap();

        assert_eq!(summary.members, Some(2));
        assert!(dest.join("one.txt").exists());
        assert!(dest.join("two.txt").exists());
        assert_eq!(log.fractions().last(), Some(&1.0));
        assert_eq!(log.lines(), vec!["Extracted 2 files from bodycam.zip"]);
    }

    #[test]
    fn test_missing_extractor_fails_before_writing() {
        let dir = TempDir::new().unwrap();
        let rar = dir.path().join("bodycam.rar");
        std::fs::write(&rar, b"Rar!\x1a\x07\x00").unwrap();
        let dest = dir.path().join("Win64");

        let log = EventLog::new();
        let err = extract_with_search(&rar, &dest, &ExtractorSearch::default(), &log.reporter()).unwrap_err();

        assert!(matches!(err, ExtractError::NoExtractor));
        assert!(!dest.exists());
        assert!(log.events().is_empty());
        assert_eq!(
            err.to_string(),
            "No extractor found! Install UnRAR.exe or 7-Zip/WinRAR."
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_external_reports_indeterminate() {
        let dir = TempDir::new().unwrap();
        let bin = dir.path().join("bin");
        std::fs::create_dir_all(&bin).unwrap();
        // stand-in archiver that accepts anything and succeeds
        let true_bin = which::which("true").unwrap();
        std::os::unix::fs::symlink(true_bin, bin.join("7z")).unwrap();

        let rar = dir.path().join("bodycam.rar");
        std::fs::write(&rar, b"Rar!").unwrap();
        let dest = dir.path().join("Win64");

        let search = ExtractorSearch {
            bundled_dir: None,
            program_files: Vec::new(),
            search_path: Some(bin.as_os_str().to_os_string()),
        };
        let log = EventLog::new();
        let summary = extract_with_search(&rar, &dest, &search, &log.reporter()).unwrap();

        assert_eq!(summary.members, None);
        assert!(dest.is_dir());
        assert_eq!(log.events()[0], ProgressEvent::Indeterminate);
        assert!(log.fractions().is_empty());
    }
}
