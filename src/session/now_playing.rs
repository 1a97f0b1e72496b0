use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use super::types::{PlayMode, PlaybackState};

/// Everything an external "now playing" surface shows about the session.
#[derive(Debug, Clone, PartialEq)]
pub struct NowPlayingSnapshot {
    pub path: PathBuf,
    pub title: String,
    pub artist: Option<String>,
    pub album: Option<String>,
    /// Zero when unknown.
    pub duration: Duration,
    pub elapsed: Duration,
    /// 1.0 while playing, 0.0 otherwise.
    pub rate: f64,
    /// Position in the active queue.
    pub track_index: Option<usize>,
    pub track_count: usize,
    pub playback: PlaybackState,
    pub play_mode: PlayMode,
}

#[derive(Debug, Error)]
#[error("now-playing surface rejected the update: {0}")]
pub struct SurfaceError(pub String);

/// Outbound seam for the now-playing projection.
pub trait NowPlayingSurface {
    fn publish(&mut self, snapshot: &NowPlayingSnapshot) -> Result<(), SurfaceError>;
    fn clear(&mut self);

    /// The position jumped to `position` outside normal playback.
    fn seeked(&mut self, _position: Duration) {}
}
