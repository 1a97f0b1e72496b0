//! Application model: cursor, scan progress per root and loaded trees.
//!
//! Playback itself lives in the session; `App` only keeps what the terminal
//! front-end needs between frames.

use std::path::{Path, PathBuf};

use crate::library::{LibraryTree, TrackEntry};

/// Progress of the most recent scan of one root.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanStatus {
    pub root: PathBuf,
    pub progress: f32,
    pub done: bool,
    /// Tracks found by the last finished scan; `None` while running or when
    /// the root held nothing playable.
    pub tracks: Option<usize>,
    /// Bumped by every `begin_scan`; events from older scans are ignored.
    pub generation: u64,
}

pub struct App {
    /// Cursor position in the session's active queue.
    pub selected: usize,
    /// Move the cursor to each track as it starts.
    pub follow_playback: bool,
    /// Last notable message, shown in the status box.
    pub status: Option<String>,

    scans: Vec<ScanStatus>,
    trees: Vec<Option<LibraryTree>>,
}

impl App {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        let scans = roots
            .into_iter()
            .map(|root| ScanStatus {
                root,
                progress: 0.0,
                done: false,
                tracks: None,
                generation: 0,
            })
            .collect::<Vec<_>>();
        let trees = vec![None; scans.len()];

        Self {
            selected: 0,
            follow_playback: true,
            status: None,
            scans,
            trees,
        }
    }

    pub fn roots(&self) -> impl Iterator<Item = &Path> {
        self.scans.iter().map(|s| s.root.as_path())
    }

    pub fn scans(&self) -> &[ScanStatus] {
        &self.scans
    }

    pub fn is_scanning(&self) -> bool {
        self.scans.iter().any(|s| !s.done)
    }

    fn current_scan(&self, root: &Path, generation: u64) -> Option<usize> {
        self.scans
            .iter()
            .position(|s| s.root == root && s.generation == generation)
    }

    /// Reset progress for `root` before (re)scanning it. Returns the
    /// generation the new scan must report with.
    pub fn begin_scan(&mut self, root: &Path) -> Option<u64> {
        let scan = self.scans.iter_mut().find(|s| s.root == root)?;
        scan.generation += 1;
        scan.progress = 0.0;
        scan.done = false;
        Some(scan.generation)
    }

    pub fn scan_progress(&mut self, root: &Path, generation: u64, fraction: f32) {
        if let Some(pos) = self.current_scan(root, generation) {
            let scan = &mut self.scans[pos];
            scan.progress = scan.progress.max(fraction);
        }
    }

    /// Store the result of a finished scan, replacing the previous tree.
    /// Returns `false` when the result belongs to a superseded scan.
    pub fn scan_finished(
        &mut self,
        root: &Path,
        generation: u64,
        tree: Option<LibraryTree>,
    ) -> bool {
        let Some(pos) = self.current_scan(root, generation) else {
            tracing::debug!(root = %root.display(), generation, "dropping stale scan result");
            return false;
        };
        let scan = &mut self.scans[pos];
        scan.progress = 1.0;
        scan.done = true;
        scan.tracks = tree.as_ref().map(|t| t.tracks().len());
        self.trees[pos] = tree;
        true
    }

    /// All loaded tracks: roots in the order given, each flattened.
    pub fn library(&self) -> Vec<TrackEntry> {
        self.trees
            .iter()
            .flatten()
            .flat_map(LibraryTree::flatten)
            .collect()
    }

    pub fn track_count(&self) -> usize {
        self.trees.iter().flatten().map(|t| t.tracks().len()).sum()
    }

    pub fn set_status(&mut self, msg: impl Into<String>) {
        self.status = Some(msg.into());
    }

    /// Move the cursor down, wrapping to the top.
    pub fn next(&mut self, len: usize) {
        if len == 0 {
            self.selected = 0;
            return;
        }
        self.selected = (self.selected.min(len - 1) + 1) % len;
    }

    /// Move the cursor up, wrapping to the bottom.
    pub fn prev(&mut self, len: usize) {
        if len == 0 {
            self.selected = 0;
            return;
        }
        self.selected = (self.selected.min(len - 1) + len - 1) % len;
    }

    pub fn select_first(&mut self) {
        self.selected = 0;
    }

    pub fn select_last(&mut self, len: usize) {
        self.selected = len.saturating_sub(1);
    }

    /// Keep the cursor inside a queue of `len` after it changed.
    pub fn clamp_selection(&mut self, len: usize) {
        self.selected = self.selected.min(len.saturating_sub(1));
    }

    pub fn follow_playback_on(&mut self) {
        self.follow_playback = true;
    }

    pub fn follow_playback_off(&mut self) {
        self.follow_playback = false;
    }
}
