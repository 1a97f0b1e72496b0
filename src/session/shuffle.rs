use std::collections::VecDeque;

use rand::seq::SliceRandom;

/// Pending permutation of queue positions for shuffle playback.
///
/// The current position is left out whenever the queue has another one, so a
/// draw never repeats the track that is already playing.
#[derive(Debug, Default, Clone)]
pub struct ShuffleCursor {
    pending: VecDeque<usize>,
    len: usize,
}

impl ShuffleCursor {
    pub fn regenerate(&mut self, len: usize, current: Option<usize>) {
        let mut order: Vec<usize> = (0..len)
            .filter(|&i| len == 1 || Some(i) != current)
            .collect();
        order.shuffle(&mut rand::rng());
        self.pending = order.into();
        self.len = len;
        tracing::trace!(len, ?current, "shuffle cursor regenerated");
    }

    /// Take the next position, regenerating when exhausted or stale.
    pub fn next(&mut self, len: usize, current: Option<usize>) -> Option<usize> {
        if len == 0 {
            self.pending.clear();
            self.len = 0;
            return None;
        }
        if self.len != len || self.pending.is_empty() {
            self.regenerate(len, current);
        }
        self.pending.pop_front().filter(|&i| i < len)
    }

    pub fn remaining(&self) -> usize {
        self.pending.len()
    }

    pub fn pending(&self) -> impl Iterator<Item = usize> + '_ {
        self.pending.iter().copied()
    }
}
