//! SpectrumB Installer
//!
//! Installs the SpectrumB Bodycam ReShade package into a game folder,
//! extracts bodycam archives into the Win64 folder, and sets the mods
//! folder aside (and back) for events.

pub mod archive;
pub mod config;
pub mod installer;
pub mod manifest;
pub mod mover;
pub mod paths;
pub mod progress;
pub mod settings;
pub mod worker;

pub use installer::{install, InstallReport, InstallRequest, Installer};
pub use manifest::Manifest;
pub use progress::{ProgressCallback, ProgressEvent, Reporter};
pub use settings::Settings;
