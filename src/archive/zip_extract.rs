//! Native zip extraction with per-member progress.

use std::fs::{self, File};
use std::io::{self, Read};
use std::path::Path;

use super::ExtractError;
use crate::paths::ensure_parent_dirs;
use crate::progress::Reporter;

/// Extract every member of a zip archive into `dest`.
///
/// The member count is known up front so progress goes `0, 1/N, ..., 1`.
/// A member that fails (unsafe name, write error) is logged and skipped.
/// Returns the number of members written.
pub fn extract_zip(archive_path: &Path, dest: &Path, reporter: &Reporter) -> Result<usize, ExtractError> {
    let file = File::open(archive_path).map_err(|source| ExtractError::Io {
        path: archive_path.to_path_buf(),
        source,
    })?;
    let mut archive = zip::ZipArchive::new(file).map_err(|source| ExtractError::Zip {
        path: archive_path.to_path_buf(),
        source,
    })?;

    fs::create_dir_all(dest).map_err(|source| ExtractError::Io {
        path: dest.to_path_buf(),
        source,
    })?;

    let total = archive.len();
    reporter.begin();
    tracing::info!("Extracting {} members from {}", total, archive_path.display());

    let mut extracted = 0;
    for index in 0..total {
        match archive.by_index(index) {
            Ok(mut member) => {
                let name = member.name().to_string();
                let is_dir = member.is_dir();
                let result = match member.enclosed_name() {
                    Some(relative) => write_member(&mut member, &dest.join(relative), is_dir),
                    None => Err(io::Error::new(io::ErrorKind::InvalidData, "unsafe path in archive")),
                };
                match result {
                    Ok(()) => extracted += 1,
                    Err(e) => reporter.log(format!("Failed to extract {}: {}", name, e)),
                }
            }
            Err(e) => reporter.log(format!("Failed to read entry {}: {}", index + 1, e)),
        }
        reporter.progress((index + 1) as f64 / total as f64);
    }

    reporter.progress(1.0);
    Ok(extracted)
}

fn write_member(reader: &mut impl Read, out_path: &Path, is_dir: bool) -> io::Result<()> {
    if is_dir {
        return fs::create_dir_all(out_path);
    }

    ensure_parent_dirs(out_path)?;
    let mut out_file = File::create(out_path)?;
    io::copy(reader, &mut out_file)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::EventLog;
    use std::io::Write;
    use tempfile::tempdir;

    fn write_zip(path: &Path, files: &[(&str, &[u8])]) {
        let file = File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default();
        for (name, data) in files {
            zip.start_file(*name, options).unwrap();
            zip.write_all(data).unwrap();
        }
        zip.finish().unwrap();
    }

    #[test]
    fn test_extract_all_members() {
        let dir = tempdir().unwrap();
        let zip_path = dir.path().join("bodycam.zip");
        let output = dir.path().join("Win64");
        write_zip(
            &zip_path,
            &[
                ("dxgi.dll", b"dll"),
                ("SpectrumB Bodycam/preset.ini", b"ini"),
                ("reshade-shaders/Shaders/a.fx", b"fx"),
                ("reshade-shaders/Textures/b.png", b"png"),
            ],
        );

        let log = EventLog::new();
        let count = extract_zip(&zip_path, &output, &log.reporter()).unwrap();

        assert_eq!(count, 4);
        assert_eq!(fs::read(output.join("dxgi.dll")).unwrap(), b"dll");
        assert_eq!(fs::read(output.join("SpectrumB Bodycam/preset.ini")).unwrap(), b"ini");
        assert!(output.join("reshade-shaders/Textures/b.png").exists());
        assert_eq!(log.fractions(), vec![0.0, 0.25, 0.5, 0.75, 1.0, 1.0]);
        assert!(log.lines().is_empty());
    }

    #[test]
    fn test_directory_members() {
        let dir = tempdir().unwrap();
        let zip_path = dir.path().join("dirs.zip");
        {
            let file = File::create(&zip_path).unwrap();
            let mut zip = zip::ZipWriter::new(file);
            let options = zip::write::SimpleFileOptions::default();
            zip.add_directory("empty/", options).unwrap();
            zip.start_file("full/file.txt", options).unwrap();
            zip.write_all(b"content").unwrap();
            zip.finish().unwrap();
        }

        let output = dir.path().join("out");
        let count = extract_zip(&zip_path, &output, &Reporter::silent()).unwrap();

        assert_eq!(count, 2);
        assert!(output.join("empty").is_dir());
        assert!(output.join("full/file.txt").is_file());
    }

    #[test]
    fn test_unsafe_member_is_skipped() {
        let dir = tempdir().unwrap();
        let zip_path = dir.path().join("evil.zip");
        write_zip(&zip_path, &[("../escape.txt", b"bad"), ("ok.txt", b"good")]);

        let output = dir.path().join("out");
        let log = EventLog::new();
        let count = extract_zip(&zip_path, &output, &log.reporter()).unwrap();

        assert_eq!(count, 1);
        assert!(output.join("ok.txt").exists());
        assert!(!dir.path().join("escape.txt").exists());
        assert_eq!(log.lines().len(), 1);
        assert!(log.lines()[0].starts_with("Failed to extract ../escape.txt"));
        assert_eq!(log.fractions().last(), Some(&1.0));
    }

    #[test]
    fn test_not_a_zip() {
        let dir = tempdir().unwrap();
        let fake = dir.path().join("fake.zip");
        fs::write(&fake, b"definitely not a zip").unwrap();

        let err = extract_zip(&fake, &dir.path().join("out"), &Reporter::silent()).unwrap_err();
        assert!(matches!(err, ExtractError::Zip { .. }));
        assert!(!dir.path().join("out").exists());
    }
}
