use std::sync::mpsc::{Receiver, Sender};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{Terminal, backend::CrosstermBackend};

use crate::app::App;
use crate::audio::AudioEngine;
use crate::config;
use crate::library::{IndexerEvent, LibraryIndexer};
use crate::mpris::ControlCmd;
use crate::session::{PlaybackSession, PlaybackState, SessionEvent};
use crate::ui;

/// Channels the loop drains each iteration.
pub struct Channels {
    pub control_tx: Sender<ControlCmd>,
    pub control_rx: Receiver<ControlCmd>,
    pub index_tx: Sender<IndexerEvent>,
    pub index_rx: Receiver<IndexerEvent>,
}

/// State tracked by the runtime event loop across iterations.
pub struct EventLoopState {
    /// Internal two-key prefix state used for `gg` handling.
    pub pending_gg: bool,
    last_tick: Instant,
}

impl EventLoopState {
    pub fn new() -> Self {
        Self {
            pending_gg: false,
            last_tick: Instant::now(),
        }
    }
}

/// Everything the handlers mutate, borrowed for one iteration.
pub struct Context<'a, E: AudioEngine> {
    pub settings: &'a config::Settings,
    pub app: &'a mut App,
    pub session: &'a mut PlaybackSession<E>,
    pub indexer: &'a LibraryIndexer,
    pub channels: &'a Channels,
}

/// Main terminal event loop: input, indexer results, the playback tick and
/// MPRIS commands. Returns `Ok(())` when shutdown is requested.
pub fn run<E: AudioEngine>(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    cx: &mut Context<'_, E>,
    state: &mut EventLoopState,
) -> Result<(), Box<dyn std::error::Error>> {
    let tick = Duration::from_millis(cx.settings.playback.tick_ms);

    loop {
        while let Ok(ev) = cx.channels.index_rx.try_recv() {
            handle_indexer_event(ev, cx);
        }

        if state.last_tick.elapsed() >= tick {
            cx.session.tick();
            state.last_tick = Instant::now();
        }

        for ev in cx.session.take_events() {
            handle_session_event(ev, cx);
        }
        cx.app.clamp_selection(cx.session.queue_len());

        let (app, session) = (&*cx.app, &*cx.session);
        terminal.draw(|f| ui::draw(f, app, session, &cx.settings.ui, &cx.settings.controls))?;

        while let Ok(cmd) = cx.channels.control_rx.try_recv() {
            if handle_control_cmd(cmd, cx) {
                return Ok(());
            }
        }

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if handle_key_event(key, cx, state) {
                    cx.session.stop();
                    break;
                }
            }
        }
    }

    Ok(())
}

fn follow_current<E: AudioEngine>(cx: &mut Context<'_, E>) {
    if !cx.app.follow_playback {
        return;
    }
    if let Some(i) = cx.session.current_index() {
        cx.app.selected = i;
    }
}

/// Start scans for every root, replacing their trees when they finish.
pub fn rescan_all<E: AudioEngine>(cx: &mut Context<'_, E>) {
    let roots: Vec<_> = cx.app.roots().map(|r| r.to_path_buf()).collect();
    for root in roots {
        let Some(generation) = cx.app.begin_scan(&root) else {
            continue;
        };
        // Scans are never joined; results arrive on the channel.
        let _ = cx
            .indexer
            .scan_to_channel(root, generation, cx.channels.index_tx.clone());
    }
}

fn handle_indexer_event<E: AudioEngine>(ev: IndexerEvent, cx: &mut Context<'_, E>) {
    match ev {
        IndexerEvent::Progress {
            root,
            generation,
            fraction,
        } => cx.app.scan_progress(&root, generation, fraction),
        IndexerEvent::Completed {
            root,
            generation,
            tree,
        } => {
            let empty = tree.is_none();
            if !cx.app.scan_finished(&root, generation, tree) {
                return;
            }
            if empty {
                cx.app
                    .set_status(format!("No audio found in {}", root.display()));
            }
            cx.session.set_playlist(cx.app.library());
            follow_current(cx);
        }
    }
}

fn handle_session_event<E: AudioEngine>(ev: SessionEvent, cx: &mut Context<'_, E>) {
    match ev {
        SessionEvent::TrackStarted { .. } => follow_current(cx),
        SessionEvent::PlaybackFailed { path, reason } => {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            cx.app.set_status(format!("Cannot play {name}: {reason}"));
        }
    }
}

/// Play the track under the cursor unless it is already playing.
fn play_selected<E: AudioEngine>(cx: &mut Context<'_, E>) {
    let selected = cx.app.selected;
    if cx.session.is_playing() && cx.session.current_index() == Some(selected) {
        return;
    }
    if let Some(track) = cx.session.queue_track(selected).cloned() {
        cx.app.follow_playback_on();
        cx.session.play(track, Some(selected));
    }
}

fn micros_to_duration(micros: i64) -> Duration {
    Duration::from_micros(micros.max(0).unsigned_abs())
}

/// Returns `true` when the app should quit.
fn handle_control_cmd<E: AudioEngine>(cmd: ControlCmd, cx: &mut Context<'_, E>) -> bool {
    let idle = cx.session.playback_state() == PlaybackState::Stopped
        && cx.session.current_track().is_none();

    match cmd {
        ControlCmd::Quit => {
            cx.session.stop();
            return true;
        }
        ControlCmd::Play | ControlCmd::PlayPause if idle => play_selected(cx),
        ControlCmd::Play => cx.session.resume(),
        ControlCmd::PlayPause => cx.session.toggle_play_pause(),
        ControlCmd::Pause => cx.session.pause(),
        ControlCmd::Stop => cx.session.stop(),
        ControlCmd::Next => {
            cx.app.follow_playback_on();
            cx.session.next();
        }
        ControlCmd::Prev => {
            cx.app.follow_playback_on();
            cx.session.previous();
        }
        ControlCmd::Seek(offset) => {
            let pos = cx.session.current_position();
            let delta = micros_to_duration(offset.saturating_abs());
            let target = if offset < 0 {
                pos.saturating_sub(delta)
            } else {
                pos.saturating_add(delta)
            };
            cx.session.seek(target);
        }
        ControlCmd::SetPosition(at) => cx.session.seek(micros_to_duration(at)),
    }
    false
}

/// Returns `true` when the app should quit.
fn handle_key_event<E: AudioEngine>(
    key: KeyEvent,
    cx: &mut Context<'_, E>,
    state: &mut EventLoopState,
) -> bool {
    if key.code != KeyCode::Char('g') {
        state.pending_gg = false;
    }
    let len = cx.session.queue_len();
    let scrub = i64::try_from(cx.settings.controls.scrub_seconds).unwrap_or(i64::MAX);

    match key.code {
        KeyCode::Char('q') => return true,
        KeyCode::Char('g') => {
            if state.pending_gg {
                state.pending_gg = false;
                cx.app.follow_playback_off();
                cx.app.select_first();
            } else {
                state.pending_gg = true;
            }
        }
        KeyCode::Char('G') => {
            cx.app.follow_playback_off();
            cx.app.select_last(len);
        }
        KeyCode::Char('j') | KeyCode::Down => {
            cx.app.follow_playback_off();
            cx.app.next(len);
        }
        KeyCode::Char('k') | KeyCode::Up => {
            cx.app.follow_playback_off();
            cx.app.prev(len);
        }
        KeyCode::Enter => play_selected(cx),
        KeyCode::Char('p') | KeyCode::Char(' ') => {
            let _ = cx.channels.control_tx.send(ControlCmd::PlayPause);
        }
        KeyCode::Char('l') => {
            let _ = cx.channels.control_tx.send(ControlCmd::Next);
        }
        KeyCode::Char('h') => {
            let _ = cx.channels.control_tx.send(ControlCmd::Prev);
        }
        KeyCode::Char('L') => cx.session.seek_by(scrub),
        KeyCode::Char('H') => cx.session.seek_by(-scrub),
        KeyCode::Char('m') => {
            cx.session.toggle_play_mode();
            let label = cx.session.play_mode().label();
            cx.app.set_status(format!("Play mode: {label}"));
        }
        KeyCode::Char('r') => {
            cx.session.toggle_range_lock();
            cx.app.follow_playback_on();
            follow_current(cx);
        }
        KeyCode::Char('R') => {
            rescan_all(cx);
            cx.app.set_status("Rescanning library");
        }
        _ => {}
    }
    false
}
