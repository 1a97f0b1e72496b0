//! Library indexing: turns granted folder trees into typed content trees.
//!
//! A scan runs on a worker thread in two passes (count, then classify) and
//! reports monotonic progress. Folders without audio anywhere below them are
//! pruned, so an empty root yields no tree at all.

mod display;
mod indexer;
mod metadata;
mod model;
mod progress;
mod scan;

pub use indexer::{IndexerEvent, LibraryIndexer};
pub use model::{LibraryTree, TrackEntry};
