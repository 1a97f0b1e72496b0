use std::sync::mpsc;

use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use ratatui::{Terminal, backend::CrosstermBackend};

use crate::app::App;
use crate::audio::RodioEngine;
use crate::library::LibraryIndexer;
use crate::mpris;
use crate::session::{PlaybackSession, SessionPorts};

mod event_loop;
mod logging;
mod settings;
mod startup;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let (settings, config_warning) = settings::load_settings();
    let log_file = logging::init(&settings.logging);
    if let Some(msg) = config_warning {
        tracing::warn!("{msg}");
    }
    tracing::info!(log = ?log_file, "lyra starting");

    let boot = startup::prepare(&settings, startup::cli_roots());
    let registry = startup::grant_roots(&boot.roots);

    let engine = RodioEngine::open_default()?;

    let (control_tx, control_rx) = mpsc::channel();
    let (index_tx, index_rx) = mpsc::channel();
    let now_playing = mpris::spawn_mpris(control_tx.clone());

    let mut session = PlaybackSession::new(
        engine,
        SessionPorts {
            registry: registry.clone(),
            surface: Box::new(now_playing),
            prefs: Box::new(boot.state),
        },
        boot.play_mode,
        boot.range_locked,
    );
    let indexer = LibraryIndexer::new(settings.library.clone(), registry);
    let mut app = App::new(boot.roots);
    let channels = event_loop::Channels {
        control_tx,
        control_rx,
        index_tx,
        index_rx,
    };

    let mut cx = event_loop::Context {
        settings: &settings,
        app: &mut app,
        session: &mut session,
        indexer: &indexer,
        channels: &channels,
    };
    event_loop::rescan_all(&mut cx);

    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut state = event_loop::EventLoopState::new();
    let run_result = event_loop::run(&mut terminal, &mut cx, &mut state);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = &run_result {
        tracing::error!(error = %e, "event loop failed");
    }
    tracing::info!("lyra exiting");
    run_result
}
