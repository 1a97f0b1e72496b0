//! Throttled, monotonic scan progress.

use std::time::{Duration, Instant};

/// Wraps a progress callback so that reported values never go backwards,
/// stay within `[0, 1]`, and arrive at most once per `interval` unless forced.
pub struct ProgressReporter<F: FnMut(f32)> {
    emit: F,
    interval: Duration,
    last_emit: Option<Instant>,
    last_value: f32,
}

impl<F: FnMut(f32)> ProgressReporter<F> {
    pub fn new(interval: Duration, emit: F) -> Self {
        Self {
            emit,
            interval,
            last_emit: None,
            last_value: 0.0,
        }
    }

    /// The initial `0.0`.
    pub fn start(&mut self) {
        self.push(0.0, true);
    }

    /// Intermediate update; dropped when the previous one was too recent.
    pub fn update(&mut self, value: f32) {
        self.push(value, false);
    }

    /// Update that fires regardless of throttling (end of a pass).
    pub fn flush(&mut self, value: f32) {
        self.push(value, true);
    }

    /// The terminal `1.0`.
    pub fn finish(&mut self) {
        self.push(1.0, true);
    }

    pub fn last_value(&self) -> f32 {
        self.last_value
    }

    fn push(&mut self, value: f32, force: bool) {
        if !force {
            if let Some(at) = self.last_emit {
                if at.elapsed() < self.interval {
                    return;
                }
            }
        }

        let value = if value.is_nan() {
            self.last_value
        } else {
            value.clamp(0.0, 1.0).max(self.last_value)
        };

        self.last_value = value;
        self.last_emit = Some(Instant::now());
        (self.emit)(value);
    }
}
