//! Application module: the model behind the terminal front-end.
//!
//! `App` holds the cursor, per-root scan progress and the loaded library
//! trees; the runtime feeds it indexer events and reads it when drawing.

mod model;

pub use model::*;
