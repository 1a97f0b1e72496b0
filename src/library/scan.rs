use std::cmp::Ordering;
use std::collections::HashSet;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

use crate::config::LibrarySettings;

use super::metadata::read_metadata;
use super::model::{LibraryTree, PendingDir, PendingTrack};
use super::progress::ProgressReporter;

/// Failures met while walking a library root. None of them abort a scan.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("cannot open library root {path}: {source}")]
    Root {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot enumerate entry under {path}: {source}")]
    Enumeration {
        path: PathBuf,
        source: walkdir::Error,
    },
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

fn has_extension(path: &Path, exts: &[String]) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| exts.iter().any(|e| e.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}

/// Case-insensitive name order, falling back to the raw name for ties.
pub(super) fn compare_names(a: &OsStr, b: &OsStr) -> Ordering {
    let a = a.to_string_lossy();
    let b = b.to_string_lossy();
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(&b))
}

fn stem_lower(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

/// Pick the lyric file for `track` among `candidates` from the same folder.
///
/// An exact stem match wins over a stem that merely contains the track's stem.
pub(super) fn find_lyrics_for(track: &Path, candidates: &[PathBuf]) -> Option<PathBuf> {
    let stem = stem_lower(track);
    if stem.is_empty() {
        return None;
    }
    candidates
        .iter()
        .find(|c| stem_lower(c) == stem)
        .or_else(|| candidates.iter().find(|c| stem_lower(c).contains(&stem)))
        .cloned()
}

/// Walks one root in two passes: count, then classify.
pub(super) struct Scanner<'a, F: FnMut(f32)> {
    settings: &'a LibrarySettings,
    audio_exts: Vec<String>,
    lyric_exts: Vec<String>,
    progress: &'a mut ProgressReporter<F>,
    total: u64,
    processed: u64,
    visited: HashSet<PathBuf>,
}

impl<'a, F: FnMut(f32)> Scanner<'a, F> {
    pub(super) fn new(settings: &'a LibrarySettings, progress: &'a mut ProgressReporter<F>) -> Self {
        Self {
            settings,
            audio_exts: settings.normalized_audio_extensions(),
            lyric_exts: settings.normalized_lyric_extensions(),
            progress,
            total: 0,
            processed: 0,
            visited: HashSet::new(),
        }
    }

    fn keep(&self, entry: &DirEntry) -> bool {
        self.settings.include_hidden || entry.depth() == 0 || !is_hidden(entry.path())
    }

    /// Build the tree for `root`, or `None` when it holds no audio.
    pub(super) fn run(mut self, root: &Path) -> Option<LibraryTree> {
        if let Err(source) = fs::read_dir(root) {
            let err = ScanError::Root {
                path: root.to_path_buf(),
                source,
            };
            tracing::warn!(error = %err, "scan aborted");
            return None;
        }

        self.total = self.count(root);
        let current = self.progress.last_value();
        self.progress.flush(current);
        tracing::debug!(root = %root.display(), entries = self.total, "counted library entries");

        let tree = self.walk_dir(root);
        let current = self.progress.last_value();
        self.progress.flush(current);

        tree.map(LibraryTree::from_pending)
    }

    fn count(&self, root: &Path) -> u64 {
        let include_hidden = self.settings.include_hidden;
        WalkDir::new(root)
            .min_depth(1)
            .follow_links(self.settings.follow_links)
            .into_iter()
            .filter_entry(move |e| include_hidden || e.depth() == 0 || !is_hidden(e.path()))
            .filter_map(|entry| match entry {
                Ok(e) => Some(e),
                Err(source) => {
                    let err = ScanError::Enumeration {
                        path: root.to_path_buf(),
                        source,
                    };
                    tracing::warn!(error = %err, "skipping entry while counting");
                    None
                }
            })
            .count() as u64
    }

    fn advance(&mut self) {
        self.processed += 1;
        if self.total > 0 {
            let fraction = self.processed as f64 / self.total as f64;
            self.progress.update(fraction.min(1.0) as f32);
        }
    }

    fn walk_dir(&mut self, dir: &Path) -> Option<PendingDir> {
        // Symlinked folders can loop back on themselves.
        let canonical = fs::canonicalize(dir).unwrap_or_else(|_| dir.to_path_buf());
        if !self.visited.insert(canonical) {
            tracing::debug!(dir = %dir.display(), "folder already visited, skipping");
            return None;
        }

        let walker = WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(self.settings.follow_links)
            .sort_by(|a, b| compare_names(a.file_name(), b.file_name()));

        let mut children = Vec::new();
        let mut audio_files = Vec::new();
        let mut lyric_files = Vec::new();

        let entries: Vec<_> = walker.into_iter().collect();
        for entry in entries {
            let entry = match entry {
                Ok(e) if self.keep(&e) => e,
                Ok(_) => continue,
                Err(source) => {
                    let err = ScanError::Enumeration {
                        path: dir.to_path_buf(),
                        source,
                    };
                    tracing::warn!(error = %err, "skipping entry");
                    continue;
                }
            };

            self.advance();
            let path = entry.path();
            let file_type = entry.file_type();

            if file_type.is_dir() {
                if let Some(child) = self.walk_dir(path) {
                    children.push(child);
                }
            } else if file_type.is_file() {
                if has_extension(path, &self.audio_exts) {
                    audio_files.push(path.to_path_buf());
                } else if has_extension(path, &self.lyric_exts) {
                    lyric_files.push(path.to_path_buf());
                }
            }
        }

        let tracks: Vec<PendingTrack> = audio_files
            .into_iter()
            .map(|path| {
                let meta = read_metadata(&path, &self.settings.artist_keywords);
                let lyrics_path = find_lyrics_for(&path, &lyric_files);
                PendingTrack {
                    path,
                    title: meta.title,
                    artist: meta.artist,
                    album: meta.album,
                    duration: meta.duration,
                    lyrics_path,
                }
            })
            .collect();

        if tracks.is_empty() && children.is_empty() {
            return None;
        }

        let name = dir
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| dir.display().to_string());

        Some(PendingDir {
            path: dir.to_path_buf(),
            name,
            children,
            tracks,
        })
    }
}
