//! MPRIS D-Bus service.
//!
//! Desktop media widgets and `playerctl` read the now-playing snapshot from
//! here, and their transport requests come back to the event loop as
//! [`ControlCmd`]s. The bus connection lives on its own thread; a missing
//! session bus only disables the service.

use std::collections::HashMap;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_io::{Timer, block_on};
use zbus::object_server::SignalEmitter;
use zbus::{Connection, interface};
use zvariant::{ObjectPath, OwnedObjectPath, OwnedValue, Value};

use crate::session::{NowPlayingSnapshot, NowPlayingSurface, PlayMode, PlaybackState, SurfaceError};

const OBJECT_PATH: &str = "/org/mpris/MediaPlayer2";
const BUS_NAME: &str = "org.mpris.MediaPlayer2.lyra";
const NO_TRACK: &str = "/org/mpris/MediaPlayer2/TrackList/NoTrack";

/// Transport requests from D-Bus clients.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ControlCmd {
    Quit,
    Play,
    Pause,
    PlayPause,
    Stop,
    Next,
    Prev,
    /// Relative seek in microseconds.
    Seek(i64),
    /// Absolute position in microseconds.
    SetPosition(i64),
}

#[derive(Debug, Default)]
struct SharedState {
    playback: PlaybackState,
    play_mode: PlayMode,
    title: Option<String>,
    artist: Vec<String>,
    album: Option<String>,
    url: Option<String>,
    length_micros: Option<i64>,
    position_micros: i64,
    rate: f64,
    track_id: Option<OwnedObjectPath>,
    /// Position to announce with `Seeked` on the next service wake-up.
    pending_seek: Option<i64>,
}

impl SharedState {
    fn apply(&mut self, snap: &NowPlayingSnapshot) {
        self.playback = snap.playback;
        self.play_mode = snap.play_mode;
        self.title = Some(snap.title.clone());
        self.artist = snap.artist.iter().cloned().collect();
        self.album = snap.album.clone();
        self.url = Some(format!("file://{}", snap.path.display()));
        self.length_micros = (!snap.duration.is_zero()).then(|| micros(snap.duration));
        self.position_micros = micros(snap.elapsed);
        self.rate = snap.rate;
        self.track_id = track_object_path(snap);
    }

    fn reset(&mut self) {
        let play_mode = self.play_mode;
        *self = Self {
            play_mode,
            ..Self::default()
        };
    }
}

/// Queue position when the track is queued, else a digest of its path.
fn track_object_path(snap: &NowPlayingSnapshot) -> Option<OwnedObjectPath> {
    let leaf = match snap.track_index {
        Some(i) => i.to_string(),
        None => {
            let mut hasher = DefaultHasher::new();
            snap.path.hash(&mut hasher);
            format!("p{:016x}", hasher.finish())
        }
    };
    ObjectPath::try_from(format!("{OBJECT_PATH}/track/{leaf}"))
        .ok()
        .map(OwnedObjectPath::from)
}

fn micros(d: Duration) -> i64 {
    i64::try_from(d.as_micros()).unwrap_or(i64::MAX)
}

/// Publishing side of the service; cheap to hold on the UI thread.
pub struct MprisHandle {
    state: Arc<Mutex<SharedState>>,
    notify: Sender<()>,
}

impl MprisHandle {
    fn changed(&self) {
        // The service thread may have exited without a session bus.
        let _ = self.notify.send(());
    }
}

impl NowPlayingSurface for MprisHandle {
    fn publish(&mut self, snapshot: &NowPlayingSnapshot) -> Result<(), SurfaceError> {
        let mut s = self
            .state
            .lock()
            .map_err(|_| SurfaceError("MPRIS state lock poisoned".into()))?;
        s.apply(snapshot);
        drop(s);
        self.changed();
        Ok(())
    }

    fn clear(&mut self) {
        match self.state.lock() {
            Ok(mut s) => s.reset(),
            Err(poisoned) => poisoned.into_inner().reset(),
        }
        self.changed();
    }

    fn seeked(&mut self, position: Duration) {
        let at = micros(position);
        match self.state.lock() {
            Ok(mut s) => {
                s.position_micros = at;
                s.pending_seek = Some(at);
            }
            Err(_) => return,
        }
        self.changed();
    }
}

struct RootIface {
    tx: Sender<ControlCmd>,
}

#[interface(name = "org.mpris.MediaPlayer2")]
impl RootIface {
    fn raise(&self) {}

    fn quit(&self) {
        let _ = self.tx.send(ControlCmd::Quit);
    }

    #[zbus(property)]
    fn can_quit(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_raise(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn has_track_list(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn identity(&self) -> &str {
        "lyra"
    }

    #[zbus(property)]
    fn supported_uri_schemes(&self) -> Vec<String> {
        vec!["file".to_string()]
    }

    #[zbus(property)]
    fn supported_mime_types(&self) -> Vec<String> {
        ["audio/mpeg", "audio/mp4", "audio/wav", "audio/aac", "audio/flac"]
            .into_iter()
            .map(String::from)
            .collect()
    }
}

struct PlayerIface {
    tx: Sender<ControlCmd>,
    state: Arc<Mutex<SharedState>>,
}

impl PlayerIface {
    fn read<T>(&self, f: impl FnOnce(&SharedState) -> T) -> T {
        match self.state.lock() {
            Ok(s) => f(&s),
            Err(poisoned) => f(&poisoned.into_inner()),
        }
    }

    fn send(&self, cmd: ControlCmd) {
        let _ = self.tx.send(cmd);
    }

    fn take_pending_seek(&self) -> Option<i64> {
        match self.state.lock() {
            Ok(mut s) => s.pending_seek.take(),
            Err(poisoned) => poisoned.into_inner().pending_seek.take(),
        }
    }
}

#[interface(name = "org.mpris.MediaPlayer2.Player")]
impl PlayerIface {
    fn next(&self) {
        self.send(ControlCmd::Next);
    }

    fn previous(&self) {
        self.send(ControlCmd::Prev);
    }

    fn play(&self) {
        self.send(ControlCmd::Play);
    }

    fn pause(&self) {
        self.send(ControlCmd::Pause);
    }

    fn play_pause(&self) {
        self.send(ControlCmd::PlayPause);
    }

    fn stop(&self) {
        self.send(ControlCmd::Stop);
    }

    fn seek(&self, offset: i64) {
        self.send(ControlCmd::Seek(offset));
    }

    fn set_position(&self, track_id: ObjectPath<'_>, position: i64) {
        // Requests for a track that is no longer current are ignored.
        let current = self.read(|s| s.track_id.clone());
        if current.as_ref().map(|p| p.as_str()) == Some(track_id.as_str()) {
            self.send(ControlCmd::SetPosition(position));
        }
    }

    #[zbus(signal)]
    async fn seeked(emitter: &SignalEmitter<'_>, position: i64) -> zbus::Result<()>;

    #[zbus(property)]
    fn playback_status(&self) -> &str {
        match self.read(|s| s.playback) {
            PlaybackState::Stopped => "Stopped",
            PlaybackState::Playing => "Playing",
            PlaybackState::Paused => "Paused",
        }
    }

    #[zbus(property)]
    fn loop_status(&self) -> &str {
        match self.read(|s| s.play_mode) {
            PlayMode::RepeatOne => "Track",
            PlayMode::Sequential | PlayMode::Shuffle => "Playlist",
        }
    }

    #[zbus(property)]
    fn shuffle(&self) -> bool {
        self.read(|s| s.play_mode == PlayMode::Shuffle)
    }

    #[zbus(property)]
    fn rate(&self) -> f64 {
        self.read(|s| s.rate)
    }

    #[zbus(property)]
    fn position(&self) -> i64 {
        self.read(|s| s.position_micros)
    }

    #[zbus(property)]
    fn can_control(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_play(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_pause(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_seek(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_go_next(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_go_previous(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn metadata(&self) -> HashMap<String, OwnedValue> {
        self.read(metadata_map)
    }
}

fn metadata_map(s: &SharedState) -> HashMap<String, OwnedValue> {
    let mut map = HashMap::new();
    let mut put = |key: &str, value: Value<'_>| {
        if let Ok(v) = OwnedValue::try_from(value) {
            map.insert(key.to_string(), v);
        }
    };

    let track_id = s
        .track_id
        .clone()
        .map(OwnedObjectPath::into_inner)
        .or_else(|| ObjectPath::try_from(NO_TRACK).ok());
    if let Some(id) = track_id {
        put("mpris:trackid", Value::from(id));
    }
    if let Some(title) = &s.title {
        put("xesam:title", Value::from(title.as_str()));
    }
    if !s.artist.is_empty() {
        put("xesam:artist", Value::from(s.artist.clone()));
    }
    if let Some(album) = &s.album {
        put("xesam:album", Value::from(album.as_str()));
    }
    if let Some(url) = &s.url {
        put("xesam:url", Value::from(url.as_str()));
    }
    if let Some(len) = s.length_micros {
        put("mpris:length", Value::from(len));
    }
    map
}

/// Serve MPRIS on a background thread and return the publishing handle.
pub fn spawn_mpris(tx: Sender<ControlCmd>) -> MprisHandle {
    let state = Arc::new(Mutex::new(SharedState::default()));
    let (notify_tx, notify_rx) = mpsc::channel::<()>();

    let state_for_thread = Arc::clone(&state);
    std::thread::spawn(move || {
        block_on(async move {
            if let Err(e) = serve(tx, state_for_thread, notify_rx).await {
                tracing::warn!(error = %e, "MPRIS service unavailable");
            }
        });
    });

    MprisHandle {
        state,
        notify: notify_tx,
    }
}

async fn serve(
    tx: Sender<ControlCmd>,
    state: Arc<Mutex<SharedState>>,
    notify: Receiver<()>,
) -> zbus::Result<()> {
    let connection = Connection::session().await?;
    connection.request_name(BUS_NAME).await?;

    let server = connection.object_server();
    server.at(OBJECT_PATH, RootIface { tx: tx.clone() }).await?;
    server.at(OBJECT_PATH, PlayerIface { tx, state }).await?;
    tracing::info!(name = BUS_NAME, "MPRIS service registered");

    let player = server.interface::<_, PlayerIface>(OBJECT_PATH).await?;
    loop {
        Timer::after(Duration::from_millis(200)).await;

        let mut dirty = false;
        loop {
            match notify.try_recv() {
                Ok(()) => dirty = true,
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => return Ok(()),
            }
        }
        if dirty {
            let iface = player.get().await;
            emit_changes(&iface, player.signal_emitter()).await;
            if let Some(position) = iface.take_pending_seek() {
                if let Err(e) = PlayerIface::seeked(player.signal_emitter(), position).await {
                    tracing::debug!(error = %e, "MPRIS Seeked signal failed");
                }
            }
        }
    }
}

async fn emit_changes(iface: &PlayerIface, emitter: &SignalEmitter<'_>) {
    let results = [
        iface.playback_status_changed(emitter).await,
        iface.metadata_changed(emitter).await,
        iface.loop_status_changed(emitter).await,
        iface.shuffle_changed(emitter).await,
        iface.rate_changed(emitter).await,
    ];
    for r in results {
        if let Err(e) = r {
            tracing::debug!(error = %e, "MPRIS property signal failed");
        }
    }
}

#[cfg(test)]
mod tests;
