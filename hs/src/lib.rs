//! HistoryStore - file-backed history of generated prompts
//!
//! Every completed wizard session can be written here as one pretty-printed
//! JSON document. The wizard itself only ever writes; this crate's CLI is
//! the reader.
//!
//! # Architecture
//!
//! ```text
//! history/
//! ├── prompt_2025-01-01_10-00-00.json
//! ├── prompt_2025-01-01_10-00-00-2.json   # same-second collision
//! └── ...
//! ```
//!
//! # Example
//!
//! ```ignore
//! use historystore::{HistoryRecord, HistoryStore};
//!
//! let store = HistoryStore::open("history")?;
//! let id = store.save(&HistoryRecord::new("Content", "Write a blog post", "You are...", 3))?;
//! let record = store.get(&id)?;
//! ```

pub mod cli;
pub mod config;
mod store;

pub use store::{HistoryRecord, HistoryStats, HistoryStore, RecordId, SearchMatch, SearchOptions};

/// Timestamp layout used for record keys and file names
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";
