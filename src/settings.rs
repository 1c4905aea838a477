//! Settings management
//!
//! Stores the last used folders in ~/.config/spectrumb/settings.json.
//! Settings are a plain value: load once at startup, pass it where it is
//! needed, save it back explicitly.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

fn default_true() -> bool {
    true
}

/// User settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Game folder the ReShade payload was last installed into
    #[serde(default)]
    pub game_folder: Option<String>,

    /// Win64 folder archives are extracted into
    #[serde(default)]
    pub win64_folder: Option<String>,

    /// Normal mods folder used by event prepare
    #[serde(default)]
    pub normalmods_folder: Option<String>,

    /// Last selected bodycam archive
    #[serde(default)]
    pub bodycam_archive: Option<String>,

    #[serde(default)]
    pub backup_src: Option<String>,

    #[serde(default)]
    pub backup_dst: Option<String>,

    #[serde(default)]
    pub restore_src: Option<String>,

    #[serde(default)]
    pub restore_dst: Option<String>,

    /// Persist selections for next time
    #[serde(default = "default_true")]
    pub save_all: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            game_folder: None,
            win64_folder: None,
            normalmods_folder: None,
            bodycam_archive: None,
            backup_src: None,
            backup_dst: None,
            restore_src: None,
            restore_dst: None,
            save_all: true,
        }
    }
}

fn path_string(path: &Path) -> String {
    path.display().to_string()
}

impl Settings {
    /// Get the config directory path (~/.config/spectrumb)
    fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?
            .join("spectrumb");

        Ok(config_dir)
    }

    /// Get the default settings file path
    pub fn default_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("settings.json"))
    }

    /// Load settings from `path`, or return defaults if it is missing or
    /// cannot be parsed
    pub fn load_from(path: &Path) -> Self {
        match Self::try_load(path) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!("Could not load settings: {:#}. Using defaults.", e);
                Self::default()
            }
        }
    }

    /// Try to load settings, returning error on failure
    fn try_load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content =
            std::fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;

        let settings: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {:?}", path))?;

        Ok(settings)
    }

    /// Save settings to `path`
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {:?}", parent))?;
            }
        }

        let content = serde_json::to_string_pretty(self).context("Failed to serialize settings")?;
        std::fs::write(path, content).with_context(|| format!("Failed to write {:?}", path))?;

        tracing::debug!("Saved settings to {}", path.display());
        Ok(())
    }

    /// Record the game folder. Returns true if the settings changed.
    pub fn remember_game_folder(&mut self, path: &Path) -> bool {
        self.remember(|s| &mut s.game_folder, path)
    }

    pub fn remember_win64_folder(&mut self, path: &Path) -> bool {
        self.remember(|s| &mut s.win64_folder, path)
    }

    pub fn remember_mods_folder(&mut self, path: &Path) -> bool {
        self.remember(|s| &mut s.normalmods_folder, path)
    }

    pub fn remember_archive(&mut self, path: &Path) -> bool {
        self.remember(|s| &mut s.bodycam_archive, path)
    }

    /// Record the event-prepare folders. Restore runs the opposite way, so
    /// its source and destination are the swapped pair.
    pub fn remember_event_folders(&mut self, mods_dir: &Path, temp_dir: &Path) -> bool {
        if !self.save_all {
            return false;
        }

        let mods = Some(path_string(mods_dir));
        let temp = Some(path_string(temp_dir));
        let changed = self.backup_src != mods
            || self.backup_dst != temp
            || self.restore_src != temp
            || self.restore_dst != mods;

        self.backup_src = mods.clone();
        self.backup_dst = temp.clone();
        self.restore_src = temp;
        self.restore_dst = mods;
        changed
    }

    fn remember(&mut self, field: impl FnOnce(&mut Self) -> &mut Option<String>, path: &Path) -> bool {
        if !self.save_all {
            return false;
        }

        let value = Some(path_string(path));
        let slot = field(self);
        if *slot == value {
            return false;
        }
        *slot = value;
        true
    }

    pub fn game_folder(&self) -> Option<PathBuf> {
        self.game_folder.as_ref().map(PathBuf::from)
    }

    pub fn win64_folder(&self) -> Option<PathBuf> {
        self.win64_folder.as_ref().map(PathBuf::from)
    }

    pub fn mods_folder(&self) -> Option<PathBuf> {
        self.normalmods_folder.as_ref().map(PathBuf::from)
    }

    pub fn archive(&self) -> Option<PathBuf> {
        self.bodycam_archive.as_ref().map(PathBuf::from)
    }
}
