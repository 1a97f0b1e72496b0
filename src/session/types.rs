//! Small playback enums and the events a session emits.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Transport state of a session.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

/// How `next` / `previous` and natural completion pick the following track.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlayMode {
    /// Walk the queue in order, wrapping at both ends.
    #[default]
    Sequential,
    /// Stay on the current track.
    RepeatOne,
    /// Draw from a shuffled permutation of the queue.
    Shuffle,
}

impl PlayMode {
    /// `Sequential -> RepeatOne -> Shuffle -> Sequential`.
    pub fn cycled(self) -> Self {
        match self {
            Self::Sequential => Self::RepeatOne,
            Self::RepeatOne => Self::Shuffle,
            Self::Shuffle => Self::Sequential,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Sequential => "Sequential",
            Self::RepeatOne => "Repeat-one",
            Self::Shuffle => "Shuffle",
        }
    }
}

/// Discrete things that happened inside a session, drained by the runtime.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    /// A track began playing from the start.
    TrackStarted { path: PathBuf },
    /// A track could not be opened; the session is stopped.
    PlaybackFailed { path: PathBuf, reason: String },
}
