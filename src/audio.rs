//! Audio output.
//!
//! The session talks to an [`AudioEngine`]; [`RodioEngine`] is the one backed
//! by the default output device.

mod player;
mod sink;
mod types;

pub use player::RodioEngine;
pub use types::{AudioEngine, EngineError};

#[cfg(test)]
mod tests;
