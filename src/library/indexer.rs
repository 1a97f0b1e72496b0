use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::Sender;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::access::GrantRegistry;
use crate::config::LibrarySettings;

use super::model::LibraryTree;
use super::progress::ProgressReporter;
use super::scan::Scanner;

/// Scan results posted back to the thread that owns the UI.
///
/// `generation` echoes the value passed to [`LibraryIndexer::scan_to_channel`]
/// so the receiver can drop results of a superseded scan.
#[derive(Debug)]
pub enum IndexerEvent {
    Progress {
        root: PathBuf,
        generation: u64,
        fraction: f32,
    },
    Completed {
        root: PathBuf,
        generation: u64,
        tree: Option<LibraryTree>,
    },
}

/// Builds [`LibraryTree`]s for granted roots on background threads.
#[derive(Clone)]
pub struct LibraryIndexer {
    settings: LibrarySettings,
    registry: Arc<GrantRegistry>,
}

impl LibraryIndexer {
    pub fn new(settings: LibrarySettings, registry: Arc<GrantRegistry>) -> Self {
        Self { settings, registry }
    }

    /// Scan `root` on a worker thread.
    ///
    /// `on_progress` receives a non-decreasing fraction in `[0, 1]`, starting
    /// with `0.0` and ending with `1.0`. `on_complete` receives the tree, or
    /// `None` when the root holds no audio or cannot be accessed. Both run on
    /// the worker thread.
    pub fn scan<P, C>(&self, root: PathBuf, on_progress: P, on_complete: C) -> JoinHandle<()>
    where
        P: FnMut(f32) + Send + 'static,
        C: FnOnce(Option<LibraryTree>) + Send + 'static,
    {
        let settings = self.settings.clone();
        let registry = Arc::clone(&self.registry);

        thread::spawn(move || {
            let interval = Duration::from_millis(settings.progress_interval_ms);
            let mut progress = ProgressReporter::new(interval, on_progress);
            progress.start();

            let started = std::time::Instant::now();
            let tree = match registry.acquire(&root) {
                Ok(_guard) => Scanner::new(&settings, &mut progress).run(&root),
                Err(e) => {
                    tracing::warn!(root = %root.display(), error = %e, "library root not accessible");
                    None
                }
            };

            progress.finish();
            tracing::info!(
                root = %root.display(),
                tracks = tree.as_ref().map_or(0, |t| t.tracks().len()),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "library scan finished"
            );
            on_complete(tree);
        })
    }

    /// Scan `root`, posting progress and the result to `tx`.
    pub fn scan_to_channel(
        &self,
        root: PathBuf,
        generation: u64,
        tx: Sender<IndexerEvent>,
    ) -> JoinHandle<()> {
        let progress_tx = tx.clone();
        let progress_root = root.clone();
        let complete_root = root.clone();

        self.scan(
            root,
            move |fraction| {
                let _ = progress_tx.send(IndexerEvent::Progress {
                    root: progress_root.clone(),
                    generation,
                    fraction,
                });
            },
            move |tree| {
                let _ = tx.send(IndexerEvent::Completed {
                    root: complete_root,
                    generation,
                    tree,
                });
            },
        )
    }
}
