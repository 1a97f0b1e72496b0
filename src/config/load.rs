use std::env;
use std::path::{Path, PathBuf};

use super::schema::Settings;

/// A value that loaded fine but cannot be used.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {reason}")]
pub struct InvalidSetting {
    pub field: &'static str,
    pub reason: &'static str,
}

impl Settings {
    /// Layer the config file (if any) under `LYRA__*` environment overrides.
    pub fn load() -> Result<Self, ::config::ConfigError> {
        Self::load_from(resolve_config_path().as_deref())
    }

    fn load_from(file: Option<&Path>) -> Result<Self, ::config::ConfigError> {
        let mut builder = ::config::Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(::config::File::from(path).required(false));
        }
        builder
            .add_source(
                ::config::Environment::with_prefix("LYRA")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    pub fn validate(&self) -> Result<(), InvalidSetting> {
        if self.library.normalized_audio_extensions().is_empty() {
            return Err(InvalidSetting {
                field: "library.audio_extensions",
                reason: "must name at least one extension",
            });
        }
        if self.playback.tick_ms == 0 {
            return Err(InvalidSetting {
                field: "playback.tick_ms",
                reason: "must be at least 1",
            });
        }
        Ok(())
    }
}

/// `$LYRA_CONFIG_PATH`, else `$XDG_CONFIG_HOME/lyra/config.toml`, else
/// `~/.config/lyra/config.toml`.
pub fn resolve_config_path() -> Option<PathBuf> {
    if let Some(p) = env::var_os("LYRA_CONFIG_PATH") {
        return Some(PathBuf::from(p));
    }
    env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))
        .map(|dir| dir.join("lyra").join("config.toml"))
}
