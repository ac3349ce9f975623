//! Undo/redo history over scene snapshots

mod engine;

pub use engine::{HistoryEngine, PersistedHistory, PushOutcome, HISTORY_LIMIT};
