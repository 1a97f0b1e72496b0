//! Settings for the scanner, playback, controls, UI and logging.
//!
//! `Settings::load` layers an optional TOML file under `LYRA__*` environment
//! overrides; anything unset keeps the struct defaults.

mod load;
mod schema;

pub use schema::*;

#[cfg(test)]
mod tests;
