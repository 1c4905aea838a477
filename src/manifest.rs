//! The payload manifest: which bundled entries get installed.

use std::path::{Component, Path, PathBuf};

/// Entries shipped in the bundled `files/` directory.
pub const BUNDLED_ITEMS: &[&str] = &[
    "dxgi.dll",
    "ReShade.ini",
    "ReShadePreset.ini",
    "reshade-shaders",
    "SpectrumB Bodycam",
];

/// Name of the bundled payload directory next to the executable.
pub const FILES_DIR_NAME: &str = "files";

/// Manifest construction errors
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("Manifest must contain at least one item")]
    Empty,

    #[error("Manifest item must be a relative path: {0}")]
    NotRelative(String),

    #[error("Manifest item may not leave its root: {0}")]
    Traversal(String),
}

/// Ordered, non-empty list of relative item names.
///
/// Each name is resolved against both the source root and the target root,
/// so `sub/` in the manifest means `source/sub` is copied to `target/sub`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    items: Vec<String>,
}

impl Manifest {
    /// Build a manifest, rejecting empty lists and names that are absolute
    /// or climb out of their root.
    pub fn new<I, S>(items: I) -> Result<Self, ManifestError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut validated = Vec::new();
        for item in items {
            let item: String = item.into();
            let trimmed = item.trim_end_matches(['/', '\\']);
            if trimmed.is_empty() {
                return Err(ManifestError::NotRelative(item));
            }

            let path = Path::new(trimmed);
            let mut named = false;
            for component in path.components() {
                match component {
                    Component::Normal(_) => named = true,
                    Component::CurDir => {}
                    Component::ParentDir => return Err(ManifestError::Traversal(item)),
                    Component::RootDir | Component::Prefix(_) => {
                        return Err(ManifestError::NotRelative(item))
                    }
                }
            }
            // "." alone would name the root itself
            if !named {
                return Err(ManifestError::NotRelative(item));
            }

            validated.push(trimmed.to_string());
        }

        if validated.is_empty() {
            return Err(ManifestError::Empty);
        }

        Ok(Self { items: validated })
    }

    /// The manifest this installer ships with.
    pub fn bundled() -> Self {
        Self {
            items: BUNDLED_ITEMS.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(String::as_str)
    }

    /// Number of items. Never zero.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Default for Manifest {
    fn default() -> Self {
        Self::bundled()
    }
}

/// Get the path to the bundled payload directory.
///
/// Looks next to the executable first, then falls back to `files/`
/// relative to the current directory.
pub fn bundled_files_dir() -> PathBuf {
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            return exe_dir.join(FILES_DIR_NAME);
        }
    }

    PathBuf::from(FILES_DIR_NAME)
}
