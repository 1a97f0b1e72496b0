use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LoggingSettings;
use crate::state;

/// Send `tracing` output to the log file; stdout belongs to the TUI.
///
/// Returns the file in use, or `None` when logging stays off.
pub fn init(settings: &LoggingSettings) -> Option<PathBuf> {
    let path = settings
        .file
        .clone()
        .or_else(|| state::state_dir().map(|d| d.join("lyra.log")))?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).ok()?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .ok()?;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false),
        )
        .try_init()
        .ok()?;

    Some(path)
}
