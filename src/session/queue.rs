//! The active play queue.
//!
//! The queue holds indices into the session's library list. With range-lock on
//! it only keeps tracks from the anchor track's folder.

use crate::library::TrackEntry;

#[derive(Debug, Default, Clone)]
pub struct PlayQueue {
    entries: Vec<usize>,
    current: Option<usize>,
}

impl PlayQueue {
    /// Recompute entries from `library` and re-anchor the current position.
    ///
    /// `hint` is a queue position the caller believes holds `anchor`; it is
    /// used only if it really does.
    pub fn rebuild(
        &mut self,
        library: &[TrackEntry],
        anchor: Option<&TrackEntry>,
        hint: Option<usize>,
        range_locked: bool,
    ) {
        let folder = if range_locked {
            anchor.and_then(TrackEntry::folder)
        } else {
            None
        };

        self.entries = library
            .iter()
            .enumerate()
            .filter(|(_, t)| folder.is_none_or(|f| t.folder() == Some(f)))
            .map(|(i, _)| i)
            .collect();

        // The anchor may be gone from the library after a rescan.
        if self.entries.is_empty() && folder.is_some() {
            self.entries = (0..library.len()).collect();
        }

        self.current = anchor.and_then(|a| {
            hint.filter(|&h| self.library_index(h).is_some_and(|i| library[i] == *a))
                .or_else(|| {
                    self.entries
                        .iter()
                        .position(|&i| library[i].path == a.path)
                })
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn current(&self) -> Option<usize> {
        self.current
    }

    /// Set the current position; out-of-range values clear it.
    pub fn set_current(&mut self, pos: Option<usize>) {
        self.current = pos.filter(|&p| p < self.entries.len());
    }

    /// Library index stored at queue position `pos`.
    pub fn library_index(&self, pos: usize) -> Option<usize> {
        self.entries.get(pos).copied()
    }

    pub fn entries(&self) -> &[usize] {
        &self.entries
    }
}

/// Position after `current` in a queue of `len`, wrapping to the start.
pub fn wrapping_next(current: Option<usize>, len: usize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    Some(current.map_or(0, |c| (c + 1) % len))
}

/// Position before `current` in a queue of `len`, wrapping to the end.
pub fn wrapping_prev(current: Option<usize>, len: usize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    Some(current.map_or(0, |c| (c % len + len - 1) % len))
}
