//! Undo/redo history for the mind-map store.
//!
//! The history is a single linear timeline of full snapshots with a cursor
//! pointing at the entry that matches the live state. Recording a new entry
//! discards everything after the cursor, so there is never a redo branch to
//! merge.

use crate::constants::MAX_HISTORY_ENTRIES;
use crate::types::MindMapSnapshot;
use std::collections::VecDeque;

/// Bounded linear history of snapshots.
#[derive(Debug, Clone)]
pub struct History {
    entries: VecDeque<MindMapSnapshot>,
    cursor: usize,
    capacity: usize,
}

impl History {
    /// Creates a history whose only entry is `baseline`.
    pub fn new(baseline: MindMapSnapshot) -> Self {
        Self::with_capacity(baseline, MAX_HISTORY_ENTRIES)
    }

    /// Creates a history with a custom capacity (at least one entry is always kept).
    pub fn with_capacity(baseline: MindMapSnapshot, capacity: usize) -> Self {
        let mut entries = VecDeque::with_capacity(capacity.max(1));
        entries.push_back(baseline);
        Self {
            entries,
            cursor: 0,
            capacity: capacity.max(1),
        }
    }

    /// Records a snapshot after the cursor.
    ///
    /// Entries after the cursor are dropped first; when the capacity is
    /// exceeded the oldest entry is evicted.
    pub fn record(&mut self, snapshot: MindMapSnapshot) {
        self.entries.truncate(self.cursor + 1);
        self.entries.push_back(snapshot);

        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
        self.cursor = self.entries.len() - 1;
    }

    /// Returns true if there is an entry before the cursor.
    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    /// Returns true if there is an entry after the cursor.
    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    /// Moves the cursor back one entry and returns it, or `None` at the start.
    pub fn step_back(&mut self) -> Option<&MindMapSnapshot> {
        if !self.can_undo() {
            return None;
        }
        self.cursor -= 1;
        self.entries.get(self.cursor)
    }

    /// Moves the cursor forward one entry and returns it, or `None` at the end.
    pub fn step_forward(&mut self) -> Option<&MindMapSnapshot> {
        if !self.can_redo() {
            return None;
        }
        self.cursor += 1;
        self.entries.get(self.cursor)
    }

    /// Number of retained entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false; a history holds at least its baseline.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Position of the cursor within the retained entries.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// The entry under the cursor.
    pub fn current(&self) -> Option<&MindMapSnapshot> {
        self.entries.get(self.cursor)
    }

    /// Iterates over all retained entries, oldest first.
    pub fn entries(&self) -> impl Iterator<Item = &MindMapSnapshot> {
        self.entries.iter()
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(MindMapSnapshot::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{NodeRecord, Position};

    fn snapshot_with(count: usize) -> MindMapSnapshot {
        MindMapSnapshot {
            nodes: (0..count)
                .map(|i| NodeRecord::new(format!("n{i}"), "x", Position::default()))
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn fresh_history_cannot_move() {
        let mut history = History::default();
        assert!(!history.can_undo());
        assert!(!history.can_redo());
        assert!(history.step_back().is_none());
        assert!(history.step_forward().is_none());
        assert_eq!(history.cursor(), 0);
    }

    #[test]
    fn step_back_and_forward_walk_the_timeline() {
        let mut history = History::default();
        history.record(snapshot_with(1));
        history.record(snapshot_with(2));

        assert_eq!(history.step_back().map(|s| s.nodes.len()), Some(1));
        assert_eq!(history.step_back().map(|s| s.nodes.len()), Some(0));
        assert!(history.step_back().is_none());
        assert_eq!(history.step_forward().map(|s| s.nodes.len()), Some(1));
        assert!(history.can_redo());
    }

    #[test]
    fn recording_after_undo_discards_redo_entries() {
        let mut history = History::default();
        history.record(snapshot_with(1));
        history.record(snapshot_with(2));
        history.step_back();
        history.record(snapshot_with(5));

        assert!(!history.can_redo());
        assert_eq!(history.len(), 3);
        assert_eq!(history.current().map(|s| s.nodes.len()), Some(5));
    }

    #[test]
    fn capacity_evicts_oldest_entries() {
        let mut history = History::with_capacity(snapshot_with(0), 3);
        for i in 1..=5 {
            history.record(snapshot_with(i));
        }
        let sizes: Vec<usize> = history.entries().map(|s| s.nodes.len()).collect();
        assert_eq!(sizes, vec![3, 4, 5]);
        assert_eq!(history.cursor(), 2);
    }
}
