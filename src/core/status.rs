use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ThreadType {
    Main,
    Collect,
    Compare,
}

/// What a worker slot is doing. `Finish` and `Stopped` are terminal for the
/// main slot; `None` means the slot has never run anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StateType {
    None,
    Search,
    Compare,
    ApplyAction,
    RenameCurrent,
    Sort,
    Refresh,
    Undo,
    Redo,
    Load,
    Save,
    Clear,
    Finish,
    Stopped,
}

impl StateType {
    pub fn is_terminal(self) -> bool {
        matches!(self, StateType::None | StateType::Finish | StateType::Stopped)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSample {
    pub state: StateType,
    pub path: Option<PathBuf>,
    pub current: usize,
    pub total: usize,
}

impl StatusSample {
    pub fn idle() -> Self {
        Self {
            state: StateType::None,
            path: None,
            current: 0,
            total: 0,
        }
    }
}

impl Default for StatusSample {
    fn default() -> Self {
        Self::idle()
    }
}
