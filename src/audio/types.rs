//! The engine seam the playback session drives.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("cannot open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot decode {path}: {reason}")]
    Decode { path: PathBuf, reason: String },
    #[error("seek failed: {0}")]
    Seek(String),
    #[error("audio output unavailable: {0}")]
    Output(String),
}

/// Something that can play one audio file at a time.
///
/// Every call happens on the thread that owns the session.
pub trait AudioEngine {
    /// Replace whatever is loaded with `path` and start it from zero.
    ///
    /// Returns the decoder's total duration when it knows one.
    fn load(&mut self, path: &Path) -> Result<Option<Duration>, EngineError>;
    fn play(&mut self);
    fn pause(&mut self);
    /// Drop the loaded source.
    fn stop(&mut self);
    fn seek(&mut self, to: Duration) -> Result<(), EngineError>;
    fn position(&self) -> Duration;
    /// True once a loaded source has played to its end.
    fn is_finished(&self) -> bool;
}
