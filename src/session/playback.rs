use std::fs;
use std::mem;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::access::GrantRegistry;
use crate::audio::AudioEngine;
use crate::library::TrackEntry;
use crate::lyrics::{self, LyricLine};
use crate::state::PrefsStore;

use super::now_playing::{NowPlayingSnapshot, NowPlayingSurface};
use super::queue::{PlayQueue, wrapping_next, wrapping_prev};
use super::shuffle::ShuffleCursor;
use super::types::{PlayMode, PlaybackState, SessionEvent};

/// Collaborators a session talks to besides the engine.
pub struct SessionPorts {
    pub registry: Arc<GrantRegistry>,
    pub surface: Box<dyn NowPlayingSurface>,
    pub prefs: Box<dyn PrefsStore>,
}

/// The playback state machine.
///
/// Owns the library list, the active queue and the engine. All calls are
/// expected on one thread; the runtime drives `tick` periodically.
pub struct PlaybackSession<E: AudioEngine> {
    engine: E,
    ports: SessionPorts,

    library: Vec<TrackEntry>,
    queue: PlayQueue,
    shuffle: ShuffleCursor,

    current: Option<TrackEntry>,
    state: PlaybackState,
    position: Duration,
    duration: Duration,

    play_mode: PlayMode,
    range_locked: bool,

    events: Vec<SessionEvent>,
    last_published: Option<NowPlayingSnapshot>,
}

impl<E: AudioEngine> PlaybackSession<E> {
    pub fn new(engine: E, ports: SessionPorts, play_mode: PlayMode, range_locked: bool) -> Self {
        Self {
            engine,
            ports,
            library: Vec::new(),
            queue: PlayQueue::default(),
            shuffle: ShuffleCursor::default(),
            current: None,
            state: PlaybackState::Stopped,
            position: Duration::ZERO,
            duration: Duration::ZERO,
            play_mode,
            range_locked,
            events: Vec::new(),
            last_published: None,
        }
    }

    /// Replace the library list and re-anchor the queue on the current track.
    pub fn set_playlist(&mut self, tracks: Vec<TrackEntry>) {
        self.library = tracks;

        // Pick up refreshed metadata for the playing file.
        if let Some(cur) = &self.current {
            if let Some(fresh) = self.library.iter().find(|t| t.path == cur.path) {
                self.current = Some(fresh.clone());
            }
        }

        self.rebuild_queue(None);
        tracing::debug!(
            library = self.library.len(),
            queue = self.queue.len(),
            "playlist replaced"
        );
        self.publish();
    }

    /// Start `track` from zero. `at_index` is the queue position the caller
    /// took it from, if any.
    pub fn play(&mut self, track: TrackEntry, at_index: Option<usize>) {
        self.current = Some(track);
        self.rebuild_queue(at_index);
        self.start_current();
    }

    pub fn toggle_play_pause(&mut self) {
        match self.state {
            PlaybackState::Playing => self.pause(),
            PlaybackState::Paused | PlaybackState::Stopped => self.resume(),
        }
    }

    pub fn pause(&mut self) {
        if self.state != PlaybackState::Playing {
            return;
        }
        self.engine.pause();
        self.state = PlaybackState::Paused;
        self.publish();
    }

    pub fn resume(&mut self) {
        match self.state {
            PlaybackState::Playing => {}
            PlaybackState::Paused => {
                self.engine.play();
                self.state = PlaybackState::Playing;
                self.publish();
            }
            PlaybackState::Stopped => {
                if self.current.is_some() {
                    self.start_current();
                } else if !self.queue.is_empty() {
                    self.play_queue_position(0);
                }
            }
        }
    }

    /// Stop the engine but keep the queue and the current track.
    pub fn stop(&mut self) {
        self.engine.stop();
        self.state = PlaybackState::Stopped;
        self.position = Duration::ZERO;
        self.publish();
    }

    pub fn next(&mut self) {
        let len = self.queue.len();
        let cur = self.queue.current();
        let target = match self.play_mode {
            PlayMode::Sequential => wrapping_next(cur, len),
            PlayMode::RepeatOne => cur.or(Some(0)),
            PlayMode::Shuffle => self.shuffle.next(len, cur),
        };
        self.advance_to(target);
    }

    pub fn previous(&mut self) {
        let len = self.queue.len();
        let cur = self.queue.current();
        let target = match self.play_mode {
            PlayMode::Sequential => wrapping_prev(cur, len),
            PlayMode::RepeatOne => cur.or(Some(0)),
            // No back-history: previous draws from the same cursor.
            PlayMode::Shuffle => self.shuffle.next(len, cur),
        };
        self.advance_to(target);
    }

    /// Move to `time`, clamped to the track length when it is known.
    pub fn seek(&mut self, time: Duration) {
        if self.current.is_none() || self.state == PlaybackState::Stopped {
            return;
        }
        let target = if self.duration.is_zero() {
            time
        } else {
            time.min(self.duration)
        };

        match self.engine.seek(target) {
            Ok(()) => {
                self.position = target;
                self.publish();
                self.ports.surface.seeked(target);
            }
            Err(e) => {
                tracing::warn!(error = %e, ?target, "seek failed");
                self.publish();
            }
        }
    }

    /// Seek relative to the current position.
    pub fn seek_by(&mut self, delta_secs: i64) {
        let delta = Duration::from_secs(delta_secs.unsigned_abs());
        let target = if delta_secs < 0 {
            self.position.saturating_sub(delta)
        } else {
            self.position.saturating_add(delta)
        };
        self.seek(target);
    }

    pub fn toggle_play_mode(&mut self) {
        self.play_mode = self.play_mode.cycled();
        if self.play_mode == PlayMode::Shuffle {
            self.shuffle
                .regenerate(self.queue.len(), self.queue.current());
        }
        tracing::info!(mode = ?self.play_mode, "play mode changed");
        self.persist();
        self.publish();
    }

    pub fn toggle_range_lock(&mut self) {
        self.range_locked = !self.range_locked;
        self.rebuild_queue(None);
        tracing::info!(
            locked = self.range_locked,
            queue = self.queue.len(),
            "range lock toggled"
        );
        self.persist();
        self.publish();
    }

    /// Poll the engine: refresh the position and handle natural completion.
    pub fn tick(&mut self) {
        if self.state != PlaybackState::Playing {
            return;
        }
        if self.engine.is_finished() {
            self.on_track_finished();
            return;
        }

        let pos = self.engine.position();
        self.position = if self.duration.is_zero() {
            pos
        } else {
            pos.min(self.duration)
        };
        self.publish();
    }

    /// Drain events produced since the last call.
    pub fn take_events(&mut self) -> Vec<SessionEvent> {
        mem::take(&mut self.events)
    }

    pub fn current_track(&self) -> Option<&TrackEntry> {
        self.current.as_ref()
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    pub fn playback_state(&self) -> PlaybackState {
        self.state
    }

    pub fn current_position(&self) -> Duration {
        self.position
    }

    pub fn total_duration(&self) -> Duration {
        self.duration
    }

    pub fn play_mode(&self) -> PlayMode {
        self.play_mode
    }

    pub fn is_range_locked(&self) -> bool {
        self.range_locked
    }

    /// Tracks of the active queue, in order.
    pub fn queue(&self) -> impl Iterator<Item = &TrackEntry> + '_ {
        self.queue.entries().iter().map(|&i| &self.library[i])
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn queue_track(&self, pos: usize) -> Option<&TrackEntry> {
        self.queue.library_index(pos).map(|i| &self.library[i])
    }

    pub fn current_index(&self) -> Option<usize> {
        self.queue.current()
    }

    /// Parsed lyrics of the current track, if it has any.
    pub fn current_lyrics(&self) -> Option<&[LyricLine]> {
        self.current
            .as_ref()?
            .cached_lyrics()
            .filter(|l| !l.is_empty())
    }

    /// Index of the lyric line active at the current position.
    pub fn current_lyric_index(&self) -> Option<usize> {
        self.current_lyrics()
            .map(|lines| lyrics::current_index(self.position, lines))
    }

    fn on_track_finished(&mut self) {
        tracing::debug!("track finished");
        if self.range_locked || self.play_mode == PlayMode::RepeatOne {
            self.start_current();
        } else {
            self.next();
        }
    }

    fn advance_to(&mut self, target: Option<usize>) {
        let len = self.queue.len();
        if len == 0 {
            return;
        }
        let pos = target.filter(|&p| p < len).unwrap_or(0);
        self.play_queue_position(pos);
    }

    fn play_queue_position(&mut self, pos: usize) {
        let Some(track) = self.queue_track(pos).cloned() else {
            return;
        };
        self.current = Some(track);
        self.queue.set_current(Some(pos));
        self.start_current();
    }

    fn rebuild_queue(&mut self, hint: Option<usize>) {
        self.queue.rebuild(
            &self.library,
            self.current.as_ref(),
            hint,
            self.range_locked,
        );
        self.shuffle
            .regenerate(self.queue.len(), self.queue.current());
    }

    fn start_current(&mut self) {
        let Some(track) = self.current.clone() else {
            return;
        };
        self.load_lyrics(&track);

        let opened = match self.ports.registry.acquire(&track.path) {
            Ok(_guard) => self.engine.load(&track.path).map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };

        match opened {
            Ok(probed) => {
                self.state = PlaybackState::Playing;
                self.position = Duration::ZERO;
                self.duration = if track.duration.is_zero() {
                    probed.unwrap_or_default()
                } else {
                    track.duration
                };
                tracing::info!(path = %track.path.display(), "playing");
                self.events.push(SessionEvent::TrackStarted {
                    path: track.path.clone(),
                });
                self.publish();
            }
            Err(reason) => {
                tracing::warn!(path = %track.path.display(), %reason, "cannot play track");
                self.engine.stop();
                self.state = PlaybackState::Stopped;
                self.position = Duration::ZERO;
                self.duration = Duration::ZERO;
                self.current = None;
                self.events.push(SessionEvent::PlaybackFailed {
                    path: track.path,
                    reason,
                });
                self.last_published = None;
                self.ports.surface.clear();
            }
        }
    }

    fn load_lyrics(&self, track: &TrackEntry) {
        if track.cached_lyrics().is_some() {
            return;
        }
        let Some(path) = &track.lyrics_path else {
            return;
        };
        match self.read_lyrics(path) {
            Ok(lines) => {
                tracing::debug!(path = %path.display(), lines = lines.len(), "lyrics parsed");
                track.cache_lyrics(lines);
            }
            Err(reason) => {
                tracing::warn!(path = %path.display(), %reason, "cannot read lyrics");
            }
        }
    }

    fn read_lyrics(&self, path: &Path) -> Result<Vec<LyricLine>, String> {
        let _guard = self
            .ports
            .registry
            .acquire(path)
            .map_err(|e| e.to_string())?;
        let bytes = fs::read(path).map_err(|e| e.to_string())?;
        Ok(lyrics::parse(&String::from_utf8_lossy(&bytes)))
    }

    fn persist(&mut self) {
        if let Err(e) = self
            .ports
            .prefs
            .save_playback(self.play_mode, self.range_locked)
        {
            tracing::warn!(error = %e, "cannot persist playback preferences");
        }
    }

    fn snapshot(&self) -> Option<NowPlayingSnapshot> {
        let track = self.current.as_ref()?;
        Some(NowPlayingSnapshot {
            path: track.path.clone(),
            title: track.title.clone(),
            artist: track.artist.clone(),
            album: track.album.clone(),
            duration: self.duration,
            elapsed: self.position,
            rate: if self.is_playing() { 1.0 } else { 0.0 },
            track_index: self.queue.current(),
            track_count: self.queue.len(),
            playback: self.state,
            play_mode: self.play_mode,
        })
    }

    fn publish(&mut self) {
        let Some(snapshot) = self.snapshot() else {
            self.clear_surface();
            return;
        };
        if self.last_published.as_ref() == Some(&snapshot) {
            return;
        }

        let surface = &mut self.ports.surface;
        if let Err(first) = surface.publish(&snapshot) {
            tracing::debug!(error = %first, "now-playing update rejected, retrying");
            surface.clear();
            if let Err(e) = surface.publish(&snapshot) {
                tracing::warn!(error = %e, "now-playing update failed");
                self.last_published = None;
                return;
            }
        }
        self.last_published = Some(snapshot);
    }

    fn clear_surface(&mut self) {
        if self.last_published.take().is_some() {
            self.ports.surface.clear();
        }
    }
}
