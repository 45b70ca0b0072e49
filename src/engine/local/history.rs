use super::files::FileMove;
use super::mistakes::MistakeKey;
use crate::core::ResultRecord;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Everything needed to revert and replay one action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub before: Vec<ResultRecord>,
    pub after: Vec<ResultRecord>,
    pub moves: Vec<FileMove>,
    pub mistakes: Vec<MistakeKey>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct History {
    undo: VecDeque<HistoryEntry>,
    redo: Vec<HistoryEntry>,
}

impl History {
    /// Record a new action. Invalidates redo and returns the entries that
    /// fell off the undo queue.
    pub fn push(&mut self, entry: HistoryEntry, limit: usize) -> Vec<HistoryEntry> {
        self.redo.clear();
        self.undo.push_back(entry);
        let mut evicted = Vec::new();
        while self.undo.len() > limit {
            if let Some(old) = self.undo.pop_front() {
                evicted.push(old);
            }
        }
        evicted
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn take_undo(&mut self) -> Option<HistoryEntry> {
        self.undo.pop_back()
    }

    pub fn push_redo(&mut self, entry: HistoryEntry) {
        self.redo.push(entry);
    }

    pub fn take_redo(&mut self) -> Option<HistoryEntry> {
        self.redo.pop()
    }

    /// Put a redone entry back without touching the redo stack.
    pub fn push_undo(&mut self, entry: HistoryEntry) {
        self.undo.push_back(entry);
    }

    /// Drop both stacks, returning the undo entries so their trash can be purged.
    pub fn clear(&mut self) -> Vec<HistoryEntry> {
        self.redo.clear();
        self.undo.drain(..).collect()
    }

    /// Every file location recorded as a move target.
    pub fn referenced_files(&self) -> impl Iterator<Item = &std::path::Path> {
        self.undo
            .iter()
            .chain(self.redo.iter())
            .flat_map(|entry| entry.moves.iter().map(|m| m.to.as_path()))
    }

    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }
}
