use std::path::{Path, PathBuf};
use std::time::Duration;

use rodio::{OutputStream, OutputStreamBuilder, Sink};

use super::sink::create_sink_at;
use super::types::{AudioEngine, EngineError};

/// [`AudioEngine`] on the default output device.
pub struct RodioEngine {
    stream: OutputStream,
    sink: Option<Sink>,
    path: Option<PathBuf>,
    /// Start offset of the current sink when it was rebuilt to seek.
    offset: Duration,
    paused: bool,
}

impl RodioEngine {
    pub fn open_default() -> Result<Self, EngineError> {
        let mut stream = OutputStreamBuilder::open_default_stream()
            .map_err(|e| EngineError::Output(e.to_string()))?;
        // rodio prints to stderr when the stream drops, which tears the TUI.
        stream.log_on_drop(false);

        Ok(Self {
            stream,
            sink: None,
            path: None,
            offset: Duration::ZERO,
            paused: true,
        })
    }

    fn rebuild_at(&mut self, to: Duration) -> Result<(), EngineError> {
        let Some(path) = self.path.clone() else {
            return Ok(());
        };
        let (sink, _) = create_sink_at(&self.stream, &path, to)?;
        if !self.paused {
            sink.play();
        }
        if let Some(old) = self.sink.replace(sink) {
            old.stop();
        }
        self.offset = to;
        Ok(())
    }
}

impl AudioEngine for RodioEngine {
    fn load(&mut self, path: &Path) -> Result<Option<Duration>, EngineError> {
        self.stop();

        let (sink, total) = create_sink_at(&self.stream, path, Duration::ZERO)?;
        sink.play();

        self.sink = Some(sink);
        self.path = Some(path.to_path_buf());
        self.paused = false;
        tracing::debug!(path = %path.display(), ?total, "loaded track");
        Ok(total)
    }

    fn play(&mut self) {
        if let Some(sink) = &self.sink {
            sink.play();
            self.paused = false;
        }
    }

    fn pause(&mut self) {
        if let Some(sink) = &self.sink {
            sink.pause();
            self.paused = true;
        }
    }

    fn stop(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
        self.path = None;
        self.offset = Duration::ZERO;
        self.paused = true;
    }

    fn seek(&mut self, to: Duration) -> Result<(), EngineError> {
        let seeked = match &self.sink {
            Some(sink) => sink.try_seek(to),
            None => return Ok(()),
        };

        match seeked {
            Ok(()) => {
                self.offset = Duration::ZERO;
                Ok(())
            }
            Err(e) => {
                tracing::debug!(error = %e, "in-place seek unsupported, rebuilding sink");
                self.rebuild_at(to)
                    .map_err(|e| EngineError::Seek(e.to_string()))
            }
        }
    }

    fn position(&self) -> Duration {
        self.sink
            .as_ref()
            .map_or(Duration::ZERO, |s| self.offset + s.get_pos())
    }

    fn is_finished(&self) -> bool {
        self.sink.as_ref().is_some_and(Sink::empty)
    }
}

impl Drop for RodioEngine {
    fn drop(&mut self) {
        self.stop();
    }
}
