use std::env;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use crate::access::{GrantRegistry, PlainFolderGrant};
use crate::config;
use crate::session::PlayMode;
use crate::state::{self, StateFile};

/// Everything decided before the terminal is taken over.
pub struct Startup {
    pub roots: Vec<PathBuf>,
    pub state: StateFile,
    pub play_mode: PlayMode,
    pub range_locked: bool,
}

/// Root folders named on the command line.
pub fn cli_roots() -> Vec<PathBuf> {
    env::args_os().skip(1).map(PathBuf::from).collect()
}

fn open_state() -> StateFile {
    let Some(path) = state::resolve_state_path() else {
        tracing::warn!("no state directory, preferences will not be saved");
        return StateFile::detached();
    };
    match StateFile::open(&path) {
        Ok(file) => file,
        Err(e) => {
            tracing::warn!(error = %e, "ignoring saved state");
            StateFile::detached()
        }
    }
}

/// Merge command-line roots into the saved ones and pick playback defaults.
pub fn prepare(settings: &config::Settings, cli: Vec<PathBuf>) -> Startup {
    let mut state = open_state();

    let cli: Vec<PathBuf> = cli
        .into_iter()
        .map(|p| fs::canonicalize(&p).unwrap_or(p))
        .collect();
    if state.add_roots(cli) {
        if let Err(e) = state.save() {
            tracing::warn!(error = %e, "cannot save library roots");
        }
    }

    let mut roots = state.state().roots.clone();
    if roots.is_empty() {
        roots.extend(env::current_dir().ok());
    }

    let play_mode = state
        .state()
        .play_mode
        .unwrap_or_else(|| settings.playback.play_mode.into());
    let range_locked = state
        .state()
        .range_locked
        .unwrap_or(settings.playback.range_lock);

    tracing::info!(roots = roots.len(), ?play_mode, range_locked, "starting up");
    Startup {
        roots,
        state,
        play_mode,
        range_locked,
    }
}

/// One unscoped grant per root.
pub fn grant_roots(roots: &[PathBuf]) -> Arc<GrantRegistry> {
    let registry = GrantRegistry::new();
    for root in roots {
        registry.register(Arc::new(PlainFolderGrant::new(root.clone())));
    }
    registry
}
