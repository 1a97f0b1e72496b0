use std::path::PathBuf;

use serde::Deserialize;

use crate::session::PlayMode;

/// Top-level application settings loaded from `config.toml`.
///
/// File format: TOML
/// Default path (Linux/XDG): `$XDG_CONFIG_HOME/lyra/config.toml` or `~/.config/lyra/config.toml`
///
/// Precedence (highest wins):
/// 1) Environment variables (prefix `LYRA__`, `__` as nested separator)
/// 2) Config file (if present)
/// 3) Struct defaults
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub library: LibrarySettings,
    pub playback: PlaybackSettings,
    pub controls: ControlsSettings,
    pub ui: UiSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LibrarySettings {
    /// File extensions to treat as audio (case-insensitive, without dot).
    pub audio_extensions: Vec<String>,
    /// File extensions to treat as lyric files.
    pub lyric_extensions: Vec<String>,
    /// Whether to include hidden files/directories (dotfiles).
    pub include_hidden: bool,
    /// Whether to follow symlinks during scanning.
    pub follow_links: bool,
    /// Words that mark the artist side of an `A - B` file name.
    pub artist_keywords: Vec<String>,
    /// Minimum wall time between two intermediate progress updates.
    pub progress_interval_ms: u64,
}

impl Default for LibrarySettings {
    fn default() -> Self {
        Self {
            audio_extensions: ["mp3", "m4a", "wav", "aac", "flac"]
                .into_iter()
                .map(String::from)
                .collect(),
            lyric_extensions: vec!["lrc".into()],
            include_hidden: false,
            follow_links: true,
            artist_keywords: [
                "band", "orchestra", "ensemble", "quartet", "trio", "choir", "feat", "ft", "dj",
                "乐队", "乐团", "组合", "合唱团",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            progress_interval_ms: 1000,
        }
    }
}

impl LibrarySettings {
    /// Lowercased, dot-free audio extensions.
    pub fn normalized_audio_extensions(&self) -> Vec<String> {
        normalize_extensions(&self.audio_extensions)
    }

    /// Lowercased, dot-free lyric extensions.
    pub fn normalized_lyric_extensions(&self) -> Vec<String> {
        normalize_extensions(&self.lyric_extensions)
    }
}

fn normalize_extensions(exts: &[String]) -> Vec<String> {
    exts.iter()
        .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|e| !e.is_empty())
        .collect()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlaybackSettings {
    /// Play mode used when no saved state exists.
    pub play_mode: PlayModeSetting,
    /// Whether range-lock starts enabled when no saved state exists.
    pub range_lock: bool,
    /// How often the session polls the audio engine for position (milliseconds).
    pub tick_ms: u64,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            play_mode: PlayModeSetting::Sequential,
            range_lock: false,
            tick_ms: 250,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlayModeSetting {
    #[serde(alias = "sequence", alias = "loop-all", alias = "loop_all")]
    Sequential,
    #[serde(alias = "repeat_one", alias = "loop-one", alias = "loop_one")]
    RepeatOne,
    #[serde(alias = "random")]
    Shuffle,
}

impl From<PlayModeSetting> for PlayMode {
    fn from(value: PlayModeSetting) -> Self {
        match value {
            PlayModeSetting::Sequential => PlayMode::Sequential,
            PlayModeSetting::RepeatOne => PlayMode::RepeatOne,
            PlayModeSetting::Shuffle => PlayMode::Shuffle,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ControlsSettings {
    /// Number of seconds to scrub when pressing `H` / `L`.
    pub scrub_seconds: u64,
}

impl Default for ControlsSettings {
    fn default() -> Self {
        Self { scrub_seconds: 5 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UiSettings {
    /// The text rendered inside the top header box.
    pub header_text: String,
    /// Whether to render the current lyric line.
    pub show_lyrics: bool,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            header_text: " lyra ~ local music, in time ".to_string(),
            show_lyrics: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default filter directive; `RUST_LOG` wins when set.
    pub level: String,
    /// Log file; defaults to `lyra.log` next to the state file.
    pub file: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}
