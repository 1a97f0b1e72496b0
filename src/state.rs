//! Player state that survives restarts.
//!
//! Play mode, range-lock and the granted root folders are kept in a small
//! TOML file. Config decides the defaults; once the user changes a setting at
//! runtime the state file wins.

use std::env;
use std::fs;
use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::session::PlayMode;

#[derive(Debug, Error)]
pub enum StateError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed state file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("cannot encode state: {0}")]
    Encode(#[from] toml::ser::Error),
}

/// Where the session writes the preferences it owns.
pub trait PrefsStore {
    fn save_playback(&mut self, mode: PlayMode, range_locked: bool) -> Result<(), StateError>;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistedState {
    /// `None` until the user changes it at runtime.
    pub play_mode: Option<PlayMode>,
    pub range_locked: Option<bool>,
    pub roots: Vec<PathBuf>,
}

/// [`PersistedState`] backed by a TOML file.
#[derive(Debug)]
pub struct StateFile {
    path: PathBuf,
    state: PersistedState,
}

impl StateFile {
    /// Read `path`; a missing file is an empty state.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StateError> {
        let path = path.into();
        let state = match fs::read_to_string(&path) {
            Ok(text) => toml::from_str(&text).map_err(|source| StateError::Parse {
                path: path.clone(),
                source,
            })?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => PersistedState::default(),
            Err(source) => return Err(StateError::Read { path, source }),
        };
        Ok(Self { path, state })
    }

    /// In-memory state that is never written.
    pub fn detached() -> Self {
        Self {
            path: PathBuf::new(),
            state: PersistedState::default(),
        }
    }

    pub fn state(&self) -> &PersistedState {
        &self.state
    }

    /// Append roots not stored yet. Returns whether anything was added.
    pub fn add_roots(&mut self, roots: impl IntoIterator<Item = PathBuf>) -> bool {
        let before = self.state.roots.len();
        for root in roots {
            if !self.state.roots.contains(&root) {
                self.state.roots.push(root);
            }
        }
        self.state.roots.len() != before
    }

    pub fn save(&self) -> Result<(), StateError> {
        if self.path.as_os_str().is_empty() {
            return Ok(());
        }
        let text = toml::to_string_pretty(&self.state)?;
        let write_err = |source| StateError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        // Replace atomically so a crash never leaves half a file.
        let tmp = self.path.with_extension("toml.tmp");
        fs::write(&tmp, text).map_err(write_err)?;
        fs::rename(&tmp, &self.path).map_err(write_err)?;
        Ok(())
    }
}

impl PrefsStore for StateFile {
    fn save_playback(&mut self, mode: PlayMode, range_locked: bool) -> Result<(), StateError> {
        self.state.play_mode = Some(mode);
        self.state.range_locked = Some(range_locked);
        self.save()
    }
}

/// `$XDG_STATE_HOME/lyra`, or `~/.local/state/lyra`.
pub fn state_dir() -> Option<PathBuf> {
    if let Some(xdg) = env::var_os("XDG_STATE_HOME").filter(|v| !v.is_empty()) {
        return Some(PathBuf::from(xdg).join("lyra"));
    }
    let home = env::var_os("HOME").filter(|v| !v.is_empty())?;
    Some(PathBuf::from(home).join(".local").join("state").join("lyra"))
}

/// `$LYRA_STATE_PATH`, or `state.toml` in [`state_dir`].
pub fn resolve_state_path() -> Option<PathBuf> {
    if let Some(p) = env::var_os("LYRA_STATE_PATH").filter(|v| !v.is_empty()) {
        return Some(PathBuf::from(p));
    }
    state_dir().map(|d| d.join("state.toml"))
}
