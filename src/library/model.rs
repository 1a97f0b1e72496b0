use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use crate::lyrics::LyricLine;

use super::display::display_name;

/// Arena index of a [`DirectoryNode`] inside one [`LibraryTree`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// A folder that holds tracks or folders holding tracks.
#[derive(Debug, Clone)]
pub struct DirectoryNode {
    pub path: PathBuf,
    pub name: String,
    pub parent: Option<NodeId>,
    /// Sub-directories, sorted by case-insensitive name.
    pub children: Vec<NodeId>,
    /// Indices into [`LibraryTree::tracks`].
    pub tracks: Vec<usize>,
}

/// A playable audio file and what we know about it.
#[derive(Debug, Clone)]
pub struct TrackEntry {
    pub path: PathBuf,
    pub title: String,
    pub artist: Option<String>,
    pub album: Option<String>,
    /// Zero when unknown.
    pub duration: Duration,
    pub lyrics_path: Option<PathBuf>,
    pub directory: NodeId,
    lyrics: Arc<OnceLock<Vec<LyricLine>>>,
}

impl PartialEq for TrackEntry {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl Eq for TrackEntry {}

impl TrackEntry {
    pub fn new(
        path: PathBuf,
        title: String,
        artist: Option<String>,
        album: Option<String>,
        duration: Duration,
        lyrics_path: Option<PathBuf>,
        directory: NodeId,
    ) -> Self {
        Self {
            path,
            title,
            artist,
            album,
            duration,
            lyrics_path,
            directory,
            lyrics: Arc::new(OnceLock::new()),
        }
    }

    /// Folder the file lives in; range-lock groups tracks by this.
    pub fn folder(&self) -> Option<&Path> {
        self.path.parent()
    }

    pub fn display(&self) -> String {
        display_name(&self.title, self.artist.as_deref())
    }

    /// Parsed lyrics, if they were loaded before.
    ///
    /// The cache is shared by every clone of this entry.
    pub fn cached_lyrics(&self) -> Option<&[LyricLine]> {
        self.lyrics.get().map(Vec::as_slice)
    }

    /// Store parsed lyrics; the first stored value wins.
    pub fn cache_lyrics(&self, lines: Vec<LyricLine>) -> &[LyricLine] {
        let _ = self.lyrics.set(lines);
        self.lyrics.get().map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Directory gathered during the walk, before ids are assigned.
#[derive(Debug)]
pub(super) struct PendingDir {
    pub path: PathBuf,
    pub name: String,
    pub children: Vec<PendingDir>,
    pub tracks: Vec<PendingTrack>,
}

#[derive(Debug)]
pub(super) struct PendingTrack {
    pub path: PathBuf,
    pub title: String,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub duration: Duration,
    pub lyrics_path: Option<PathBuf>,
}

/// Result of scanning one root: directories in an arena, tracks in a list.
#[derive(Debug, Clone)]
pub struct LibraryTree {
    nodes: Vec<DirectoryNode>,
    tracks: Vec<TrackEntry>,
}

impl LibraryTree {
    pub(super) fn from_pending(root: PendingDir) -> Self {
        let mut tree = Self {
            nodes: Vec::new(),
            tracks: Vec::new(),
        };
        tree.attach(root, None);
        tree
    }

    fn attach(&mut self, dir: PendingDir, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(DirectoryNode {
            path: dir.path,
            name: dir.name,
            parent,
            children: Vec::new(),
            tracks: Vec::new(),
        });

        for t in dir.tracks {
            let index = self.tracks.len();
            self.tracks.push(TrackEntry::new(
                t.path,
                t.title,
                t.artist,
                t.album,
                t.duration,
                t.lyrics_path,
                id,
            ));
            self.nodes[id.0].tracks.push(index);
        }

        for child in dir.children {
            let child_id = self.attach(child, Some(id));
            self.nodes[id.0].children.push(child_id);
        }

        id
    }

    pub fn root(&self) -> &DirectoryNode {
        &self.nodes[0]
    }

    pub fn root_path(&self) -> &Path {
        &self.root().path
    }

    pub fn node(&self, id: NodeId) -> Option<&DirectoryNode> {
        self.nodes.get(id.0)
    }

    pub fn parent(&self, id: NodeId) -> Option<&DirectoryNode> {
        self.node(id)?.parent.and_then(|p| self.node(p))
    }

    pub fn find_node(&self, path: &Path) -> Option<NodeId> {
        self.nodes.iter().position(|n| n.path == path).map(NodeId)
    }

    pub fn directory_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn tracks(&self) -> &[TrackEntry] {
        &self.tracks
    }

    /// Tracks in play order: a folder's own tracks, then each sub-folder in turn.
    pub fn flatten(&self) -> Vec<TrackEntry> {
        let mut out = Vec::with_capacity(self.tracks.len());
        let mut stack = vec![NodeId(0)];
        while let Some(id) = stack.pop() {
            let Some(node) = self.node(id) else {
                continue;
            };
            out.extend(node.tracks.iter().map(|&i| self.tracks[i].clone()));
            stack.extend(node.children.iter().rev().copied());
        }
        out
    }
}
