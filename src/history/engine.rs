//! Bounded undo/redo history over scene snapshots

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::scene::{normalize, normalize_value, SceneState, Snapshot};

/// Maximum number of snapshots kept in history
pub const HISTORY_LIMIT: usize = 100;

/// The blob written to the durable store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedHistory {
    pub entries: Vec<Snapshot>,
    pub index: usize,
}

/// Result of a push attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// A new entry was appended at the end of history
    Appended,
    /// The candidate equals the current entry; nothing changed
    Duplicate,
    /// A restore is in progress; pushes are ignored
    Restoring,
}

/// Undo/redo stack plus the live scene it restores into.
///
/// Live-state writes go through [`HistoryEngine::edit`], which raises the
/// dirty flag. Restores (undo, redo, hydrate) write the live state with the
/// `restoring` flag raised so those writes neither dirty the scene nor push.
#[derive(Debug)]
pub struct HistoryEngine {
    scene: SceneState,
    entries: Vec<Snapshot>,
    index: usize,
    limit: usize,
    hydrated: bool,
    dirty: bool,
    restoring: bool,
}

impl HistoryEngine {
    /// Start with a single entry captured from `scene`
    pub fn new(scene: SceneState) -> Self {
        Self::with_limit(scene, HISTORY_LIMIT)
    }

    pub fn with_limit(scene: SceneState, limit: usize) -> Self {
        let initial = Snapshot::capture(&scene);
        Self {
            scene,
            entries: vec![initial],
            index: 0,
            limit: limit.max(1),
            hydrated: false,
            dirty: false,
            restoring: false,
        }
    }

    pub fn scene(&self) -> &SceneState {
        &self.scene
    }

    pub fn entries(&self) -> &[Snapshot] {
        &self.entries
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn current(&self) -> &Snapshot {
        &self.entries[self.index]
    }

    pub fn is_hydrated(&self) -> bool {
        self.hydrated
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn is_restoring(&self) -> bool {
        self.restoring
    }

    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.index + 1 < self.entries.len()
    }

    /// Mutate the live scene. Marks it dirty unless a restore is running.
    pub fn edit<R>(&mut self, f: impl FnOnce(&mut SceneState) -> R) -> R {
        let result = f(&mut self.scene);
        if !self.restoring {
            self.dirty = true;
        }
        result
    }

    /// Append a snapshot (or the current live state) to history.
    ///
    /// Pushing a value equal to the current entry (light timestamps aside) is
    /// a no-op. Otherwise the redo branch is discarded and the oldest entries
    /// are dropped to stay within the limit.
    pub fn push(&mut self, snapshot: Option<&Snapshot>) -> PushOutcome {
        if self.restoring {
            return PushOutcome::Restoring;
        }

        let candidate = match snapshot {
            Some(snapshot) => normalize(snapshot),
            None => Snapshot::capture(&self.scene),
        };

        if self
            .entries
            .get(self.index)
            .is_some_and(|current| current.same_scene(&candidate))
        {
            return PushOutcome::Duplicate;
        }

        self.entries.truncate(self.index + 1);
        self.entries.push(candidate);

        if self.entries.len() > self.limit {
            let overflow = self.entries.len() - self.limit;
            self.entries.drain(..overflow);
        }
        self.index = self.entries.len() - 1;

        tracing::debug!(
            index = self.index,
            len = self.entries.len(),
            "History entry appended"
        );
        PushOutcome::Appended
    }

    /// Push the live state if it was edited since the last commit
    pub fn commit(&mut self) -> Option<PushOutcome> {
        if !self.dirty {
            return None;
        }
        let outcome = self.push(None);
        self.dirty = false;
        Some(outcome)
    }

    pub fn undo(&mut self) -> bool {
        if self.index == 0 {
            return false;
        }
        self.index -= 1;
        self.restore_current();
        true
    }

    pub fn redo(&mut self) -> bool {
        if !self.can_redo() {
            return false;
        }
        self.index += 1;
        self.restore_current();
        true
    }

    /// Replace history with a persisted payload.
    ///
    /// Entries that are not valid version-1 snapshots are dropped and the rest
    /// are capped to the newest `limit`. The persisted index then selects the
    /// last survivor at or before its original position rather than being
    /// clamped as a bare number: dropping entries shifts positions, and a
    /// plain clamp would land on a different snapshot than the saved one.
    /// Without drops the two agree. If nothing survives, history restarts
    /// from the live scene. Always latches `hydrated`.
    pub fn hydrate(&mut self, persisted: Option<&Value>) {
        let raw_entries = persisted
            .and_then(|p| p.get("entries"))
            .and_then(Value::as_array);
        let raw_index = persisted
            .and_then(|p| p.get("index"))
            .and_then(|i| i.as_i64().or_else(|| i.as_f64().map(|f| f as i64)))
            .unwrap_or(0);

        let mut survivors: Vec<(usize, Snapshot)> = raw_entries
            .map(|entries| {
                entries
                    .iter()
                    .enumerate()
                    .filter_map(|(i, value)| normalize_value(value).map(|s| (i, s)))
                    .collect()
            })
            .unwrap_or_default();

        let dropped = raw_entries.map_or(0, Vec::len) - survivors.len();
        if dropped > 0 {
            tracing::warn!(dropped, "Discarded malformed history entries");
        }

        if survivors.len() > self.limit {
            let overflow = survivors.len() - self.limit;
            survivors.drain(..overflow);
        }

        if survivors.is_empty() {
            self.entries = vec![Snapshot::capture(&self.scene)];
            self.index = 0;
        } else {
            let target = raw_index.max(0) as usize;
            self.index = survivors
                .iter()
                .rposition(|(original, _)| *original <= target)
                .unwrap_or(0);
            self.entries = survivors.into_iter().map(|(_, s)| s).collect();
            self.restore_current();
        }

        self.hydrated = true;
    }

    /// Current history in its persisted form
    pub fn persisted(&self) -> PersistedHistory {
        PersistedHistory {
            entries: self.entries.clone(),
            index: self.index,
        }
    }

    /// Write the entry at `index` into the live scene under the restore guard
    fn restore_current(&mut self) {
        let snapshot = self.entries[self.index].clone();
        self.restoring = true;
        self.edit(|scene| scene.restore(&snapshot));
        self.restoring = false;
        self.dirty = false;
    }
}
