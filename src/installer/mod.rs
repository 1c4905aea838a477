//! Payload installation
//!
//! Installs every manifest item from the payload folder into the game folder:
//! 1. Backup: optionally move same-named existing items into `reshade_backup`
//! 2. Copy: copy each item, merging directories into what is already there
//!
//! Installation is best-effort. A failing item is logged and the run moves on
//! to the next one, so the run always reaches 100% and the caller inspects
//! the log (or the returned [`InstallReport`]) for failures.
//!
//! A copy that fails after its item was backed up leaves neither version in
//! the game folder. The backup copy is still in `reshade_backup`.

pub mod backup;
pub mod config;

pub use backup::{backup_dir, BACKUP_DIR_NAME};
pub use config::InstallRequest;

use std::io;
use std::path::Path;

use tracing::{info, warn};

use crate::config::ConfigError;
use crate::manifest::Manifest;
use crate::paths::{copy_file_preserving_times, ensure_parent_dirs, merge_copy_dir};
use crate::progress::Reporter;

/// Which part of the run an outcome belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Backup,
    Copy,
}

/// Result of handling one manifest item in one phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemOutcome {
    pub item: String,
    pub phase: Phase,
    /// Error text when the item failed
    pub error: Option<String>,
}

impl ItemOutcome {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Per-item outcomes of an install run, in the order they happened.
#[derive(Debug, Clone, Default)]
pub struct InstallReport {
    pub outcomes: Vec<ItemOutcome>,
}

impl InstallReport {
    pub fn backed_up(&self) -> usize {
        self.count(Phase::Backup, true)
    }

    pub fn copied(&self) -> usize {
        self.count(Phase::Copy, true)
    }

    /// All failed items across both phases
    pub fn failures(&self) -> impl Iterator<Item = &ItemOutcome> {
        self.outcomes.iter().filter(|o| !o.is_ok())
    }

    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(ItemOutcome::is_ok)
    }

    fn count(&self, phase: Phase, ok: bool) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.phase == phase && o.is_ok() == ok)
            .count()
    }

    fn record(&mut self, item: &str, phase: Phase, result: io::Result<()>) -> Option<String> {
        let error = result.err().map(|e| e.to_string());
        self.outcomes.push(ItemOutcome {
            item: item.to_string(),
            phase,
            error: error.clone(),
        });
        error
    }
}

/// Copy `source_dir/<item>` to `target_dir/<item>`.
///
/// Directories are merge-copied, files overwrite the destination and keep
/// their modification time.
pub fn copy_item(source_dir: &Path, target_dir: &Path, item: &str) -> io::Result<u64> {
    let source = source_dir.join(item);
    let dest = target_dir.join(item);

    if source.is_dir() {
        merge_copy_dir(&source, &dest)
    } else {
        ensure_parent_dirs(&dest)?;
        copy_file_preserving_times(&source, &dest).map(|_| 1)
    }
}

/// Install `manifest` as described by `request`.
///
/// Never fails as a whole. Emits progress 0 first, `i/n` after each copied
/// item and exactly 1.0 at the end.
pub fn install(request: &InstallRequest, manifest: &Manifest, reporter: &Reporter) -> InstallReport {
    let mut report = InstallReport::default();
    let total = manifest.len();

    info!(
        "Installing {} items from {} to {} (backup: {})",
        total,
        request.source_dir.display(),
        request.target_dir.display(),
        request.backup
    );
    reporter.begin();

    if request.backup {
        let backup_dir = backup_dir(&request.target_dir);
        if let Err(e) = std::fs::create_dir_all(&backup_dir) {
            warn!("Failed to create backup folder {}: {}", backup_dir.display(), e);
        }

        for item in manifest.iter() {
            match backup::backup_item(&request.target_dir, &backup_dir, item) {
                Ok(None) => {}
                Ok(Some(_)) => {
                    report.record(item, Phase::Backup, Ok(()));
                    reporter.log(format!("Backed up {}", item));
                }
                Err(e) => {
                    let msg = report.record(item, Phase::Backup, Err(e)).unwrap_or_default();
                    reporter.log(format!("Failed to backup {}: {}", item, msg));
                }
            }
        }
    }

    for (idx, item) in manifest.iter().enumerate() {
        let result = copy_item(&request.source_dir, &request.target_dir, item).map(|_| ());
        match report.record(item, Phase::Copy, result) {
            None => reporter.log(format!("Copied {}", item)),
            Some(msg) => reporter.log(format!("Failed to copy {}: {}", item, msg)),
        }
        reporter.progress((idx + 1) as f64 / total as f64);
    }

    reporter.progress(1.0);

    let failed = report.failures().count();
    if failed > 0 {
        warn!("Install finished with {} failed items", failed);
    } else {
        info!("Install finished: {} items copied", report.copied());
    }

    report
}

/// Install orchestrator holding a validated request.
pub struct Installer {
    request: InstallRequest,
    manifest: Manifest,
    reporter: Reporter,
}

impl Installer {
    /// Create a new installer, validating the request first
    pub fn new(request: InstallRequest) -> Result<Self, ConfigError> {
        request.validate()?;
        Ok(Self {
            request,
            manifest: Manifest::bundled(),
            reporter: Reporter::silent(),
        })
    }

    pub fn with_manifest(mut self, manifest: Manifest) -> Self {
        self.manifest = manifest;
        self
    }

    pub fn with_reporter(mut self, reporter: Reporter) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn request(&self) -> &InstallRequest {
        &self.request
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Run the installation
    pub fn run(&self) -> InstallReport {
        install(&self.request, &self.manifest, &self.reporter)
    }
}
