//! UI rendering for the terminal front-end.
//!
//! Everything here is drawn from `App` plus a read-only view of the session.

use std::time::Duration;

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style, Stylize},
    text::Line,
    widgets::{Block, Borders, List, ListItem, ListState, Padding, Paragraph, Wrap},
};

use crate::app::App;
use crate::audio::AudioEngine;
use crate::config::{ControlsSettings, UiSettings};
use crate::session::{PlaybackSession, PlaybackState};

const CONTROLS: &[(&str, &str)] = &[
    ("j/k", "up/down"),
    ("h/l", "prev/next song"),
    ("enter", "play selected song"),
    ("space/p", "play/pause"),
    ("gg/G", "top/bottom"),
    ("m", "play mode"),
    ("r", "range lock"),
    ("R", "rescan"),
    ("q", "quit"),
];

/// Render the controls help text, incorporating scrub seconds.
fn controls_text(scrub_seconds: u64) -> String {
    let mut parts: Vec<String> = CONTROLS
        .iter()
        .map(|(k, v)| format!("[{k}] {v}"))
        .collect();
    parts.insert(2, format!("[H/L] scrub -/+{scrub_seconds}s"));
    parts.join(" | ")
}

/// Format a `Duration` as `MM:SS`.
fn format_mmss(d: Duration) -> String {
    let secs = d.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

fn padded() -> Padding {
    Padding {
        left: 1,
        right: 0,
        top: 0,
        bottom: 0,
    }
}

fn status_text<E: AudioEngine>(app: &App, session: &PlaybackSession<E>) -> String {
    let mut parts: Vec<String> = Vec::new();

    match session.current_track() {
        Some(track) => {
            let state = match session.playback_state() {
                PlaybackState::Playing => "Playing",
                PlaybackState::Paused => "Paused",
                PlaybackState::Stopped => "Stopped",
            };
            let total = session.total_duration();
            let time = if total.is_zero() {
                format_mmss(session.current_position())
            } else {
                format!(
                    "{} / {}",
                    format_mmss(session.current_position()),
                    format_mmss(total)
                )
            };
            parts.push(format!("Song: {} [{time}]", track.display()));
            parts.push(state.to_string());
        }
        None => parts.push("Stopped".to_string()),
    }

    parts.push(format!("PLAYBACK: {}", session.play_mode().label()));
    parts.push(if session.is_range_locked() {
        "LOCK: folder".to_string()
    } else {
        "LOCK: off".to_string()
    });
    parts.push(format!("Tracks: {}", app.track_count()));

    for scan in app.scans().iter().filter(|s| !s.done) {
        let name = scan
            .root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| scan.root.display().to_string());
        parts.push(format!("Scanning {name}: {:.0}%", scan.progress * 100.0));
    }

    if let Some(msg) = &app.status {
        parts.push(msg.clone());
    }

    parts.join(" • ")
}

/// Visible window `[start, end)` of a list of `total` rows that keeps
/// `selected` centered when possible.
fn visible_window(total: usize, height: usize, selected: usize) -> (usize, usize) {
    if total <= height || height == 0 {
        return (0, total);
    }
    let half = height / 2;
    let mut start = selected.saturating_sub(half);
    if start + height > total {
        start = total - height;
    }
    (start, start + height)
}

fn draw_queue<E: AudioEngine>(
    frame: &mut Frame,
    area: Rect,
    app: &App,
    session: &PlaybackSession<E>,
) {
    let total = session.queue_len();
    let selected = app.selected.min(total.saturating_sub(1));
    let (start, end) = visible_window(total, area.height.saturating_sub(2) as usize, selected);
    let playing = session.current_index();

    // Only build items for the visible window.
    let items: Vec<ListItem> = session
        .queue()
        .enumerate()
        .skip(start)
        .take(end - start)
        .map(|(i, track)| {
            let item = ListItem::new(track.display());
            if Some(i) == playing {
                item.style(Style::default().add_modifier(Modifier::BOLD))
            } else {
                item
            }
        })
        .collect();

    let title = if session.is_range_locked() {
        let folder = session
            .current_track()
            .and_then(|t| t.folder())
            .and_then(|f| f.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        format!(" tracks: {folder} ")
    } else {
        " tracks ".to_string()
    };

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");
    let mut state = ListState::default();
    if total > 0 {
        state.select(Some(selected - start));
    }
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_lyrics<E: AudioEngine>(frame: &mut Frame, area: Rect, session: &PlaybackSession<E>) {
    let lines: Vec<Line> = match (session.current_lyrics(), session.current_lyric_index()) {
        (Some(lyrics), Some(i)) => {
            let prev = i.checked_sub(1).and_then(|p| lyrics.get(p));
            let next = lyrics.get(i + 1);
            vec![
                Line::from(prev.map_or("", |l| l.text.as_str())).dim(),
                Line::from(lyrics[i].text.as_str()).bold(),
                Line::from(next.map_or("", |l| l.text.as_str())).dim(),
            ]
        }
        _ => vec![Line::from(""), Line::from("no lyrics").dim()],
    };

    let par = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(Block::bordered().title(" lyrics "));
    frame.render_widget(par, area);
}

/// Render the entire UI into `frame`.
pub fn draw<E: AudioEngine>(
    frame: &mut Frame,
    app: &App,
    session: &PlaybackSession<E>,
    ui_settings: &UiSettings,
    controls_settings: &ControlsSettings,
) {
    let lyrics_height = if ui_settings.show_lyrics { 5 } else { 0 };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(5),
            Constraint::Min(1),
            Constraint::Length(lyrics_height),
            Constraint::Length(4),
        ])
        .split(frame.area());

    let header = Paragraph::new(ui_settings.header_text.as_str())
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" lyra ")
                .title_alignment(Alignment::Center),
        );
    frame.render_widget(header, chunks[0]);

    let status = Paragraph::new(status_text(app, session))
        .block(Block::bordered().padding(padded()).title(" status "))
        .wrap(Wrap { trim: true });
    frame.render_widget(status, chunks[1]);

    draw_queue(frame, chunks[2], app, session);

    if ui_settings.show_lyrics {
        draw_lyrics(frame, chunks[3], session);
    }

    let footer = Paragraph::new(controls_text(controls_settings.scrub_seconds))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" controls ")
                .padding(padded()),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(footer, chunks[4]);
}
