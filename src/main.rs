//! SpectrumB Installer command line front end

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use spectrumb::archive;
use spectrumb::config::{require_dir, require_file};
use spectrumb::mover::{self, MoveMode};
use spectrumb::worker::{self, Operation};
use spectrumb::{InstallRequest, Installer, ProgressEvent, Settings};

#[derive(Parser)]
#[command(name = "spectrumb")]
#[command(version)]
#[command(about = "SpectrumB Bodycam installer - ReShade payload, bodycam archives and event prepare")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (use RUST_LOG=debug for more detail)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Settings file (defaults to ~/.config/spectrumb/settings.json)
    #[arg(long, global = true, env = "SPECTRUMB_SETTINGS")]
    settings: Option<PathBuf>,

    /// Don't remember selected folders for next time
    #[arg(long, global = true)]
    no_save: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Install the bundled ReShade payload into the game folder
    Install {
        /// Game folder (defaults to the last one used)
        #[arg(short, long)]
        target: Option<PathBuf>,

        /// Move existing ReShade files to reshade_backup first
        #[arg(short, long)]
        backup: bool,

        /// Payload folder (defaults to files/ next to the executable)
        #[arg(short, long)]
        source: Option<PathBuf>,
    },

    /// Move all mods to temp_backup, or restore them from it
    Event {
        #[arg(value_enum)]
        mode: EventMode,

        /// Normal mods folder (defaults to the last one used)
        #[arg(short, long)]
        mods: Option<PathBuf>,
    },

    /// Extract a bodycam archive into the Win64 folder
    Extract {
        /// Archive to extract (defaults to the last one used)
        archive: Option<PathBuf>,

        /// Win64 folder (defaults to the last one used)
        #[arg(short, long)]
        dest: Option<PathBuf>,
    },

    /// Show which external extractor would be used for rar archives
    LocateExtractor,
}

#[derive(Clone, Copy, ValueEnum)]
enum EventMode {
    /// Backup all mods to temp
    Backup,
    /// Restore all mods from temp to mods
    Restore,
}

impl From<EventMode> for MoveMode {
    fn from(mode: EventMode) -> Self {
        match mode {
            EventMode::Backup => MoveMode::Backup,
            EventMode::Restore => MoveMode::Restore,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Only initialize logging if verbose or RUST_LOG is set
    if cli.verbose || std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(if cli.verbose {
                    "spectrumb=debug".parse()?
                } else {
                    "spectrumb=warn".parse()?
                }),
            )
            .init();
    }

    let settings_path = match cli.settings {
        Some(path) => path,
        None => Settings::default_path()?,
    };
    let mut settings = Settings::load_from(&settings_path);
    if cli.no_save {
        settings.save_all = false;
    }

    match cli.command {
        Commands::Install {
            target,
            backup,
            source,
        } => {
            let target = target
                .or_else(|| settings.game_folder())
                .context("Please select the game folder (--target).")?;

            let mut request = InstallRequest::new(&target).with_backup(backup);
            if let Some(source) = source {
                request = request.with_source(source);
            }
            let installer = Installer::new(request)?;

            if settings.remember_game_folder(&target) {
                save_settings(&settings, &settings_path);
            }

            println!("Selected folder: {}", target.display());
            let op = worker::spawn("install", move |reporter| installer.with_reporter(reporter).run())?;
            let report = drive(op)?;

            println!("Installation complete!");
            let failed = report.failures().count();
            if failed > 0 {
                println!("{} item(s) failed, see the log above.", failed);
            }
        }

        Commands::Event { mode, mods } => {
            let mode = MoveMode::from(mode);
            let mods = mods
                .or_else(|| settings.mods_folder())
                .context("Please select the mods folder (--mods).")?;
            require_dir(&mods, "mods folder")?;

            let temp = mover::ensure_temp_backup_dir(&mods)
                .with_context(|| format!("Failed to create temp folder in {}", mods.display()))?;

            let changed = settings.remember_mods_folder(&mods);
            if settings.remember_event_folders(&mods, &temp) || changed {
                save_settings(&settings, &settings_path);
            }

            let job = mover::plan(mode, &mods, &temp)?;
            println!("{} in progress...", mode);
            let op = worker::spawn("event", move |reporter| mover::move_all(&job, &reporter))?;
            drive(op)??;
        }

        Commands::Extract { archive, dest } => {
            let archive_path = archive
                .or_else(|| settings.archive())
                .context("Please select the archive.")?;
            let dest = dest
                .or_else(|| settings.win64_folder())
                .context("Please select the Win64 folder (--dest).")?;
            require_file(&archive_path, "archive")?;
            require_dir(&dest, "Win64 folder")?;

            let changed = settings.remember_archive(&archive_path);
            if settings.remember_win64_folder(&dest) || changed {
                save_settings(&settings, &settings_path);
            }

            println!("Installing Bodycam...");
            let op = worker::spawn("extract", move |reporter| {
                archive::extract(&archive_path, &dest, &reporter)
            })?;
            drive(op)??;
            println!("Bodycam installed.");
        }

        Commands::LocateExtractor => {
            let extractor = archive::locate_extractor()?;
            println!("{} ({:?})", extractor.path.display(), extractor.flavor);
        }
    }

    Ok(())
}

/// Render a running operation's events until it finishes, then return its
/// result.
fn drive<T>(op: Operation<T>) -> Result<T> {
    let bar_style = ProgressStyle::default_bar()
        .template("[{bar:40.cyan/blue}] {percent:>3}% {msg}")?
        .progress_chars("=>-");
    let spinner_style = ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?;

    let pb = ProgressBar::new(1000);
    pb.set_style(bar_style.clone());
    let mut spinning = false;

    for event in op.events() {
        match event {
            ProgressEvent::Log { message } => pb.println(message),
            ProgressEvent::Progress { fraction } => {
                if spinning {
                    pb.disable_steady_tick();
                    pb.set_style(bar_style.clone());
                    spinning = false;
                }
                pb.set_position((fraction * 1000.0).round() as u64);
            }
            ProgressEvent::Indeterminate => {
                pb.set_style(spinner_style.clone());
                pb.set_message(format!("{}...", op.name()));
                pb.enable_steady_tick(Duration::from_millis(100));
                spinning = true;
            }
        }
    }

    pb.finish_and_clear();
    Ok(op.wait()?)
}

fn save_settings(settings: &Settings, path: &Path) {
    if let Err(e) = settings.save_to(path) {
        tracing::warn!("Failed to save settings: {:#}", e);
    }
}
