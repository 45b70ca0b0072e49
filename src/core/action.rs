use serde::{Deserialize, Serialize};

/// Actions applied to the whole result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GlobalActionType {
    SetHint,
    SetGroup,
    Refresh,
    Undo,
    Redo,
}

/// Actions applied to the current result or to the selected ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LocalActionType {
    DeleteDefect,
    DeleteFirst,
    DeleteSecond,
    DeleteBoth,
    RenameFirstToSecond,
    RenameSecondToFirst,
    PerformHint,
    Mistake,
}

impl LocalActionType {
    /// Whether the action removes or overwrites files on disk.
    pub fn is_destructive(self) -> bool {
        !matches!(self, LocalActionType::Mistake)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetType {
    Current,
    Selected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionEnableType {
    Any,
    Defect,
    DuplPair,
    PerformHint,
    Undo,
    Redo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectionType {
    SelectCurrent,
    UnselectCurrent,
    SelectAll,
    UnselectAll,
    SelectAllButThis,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortType {
    Type,
    Difference,
    Hint,
    Group,
    FirstPath,
    SecondPath,
    FirstSize,
    SecondSize,
    FirstArea,
    SecondArea,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RenameCurrentType {
    First,
    Second,
}

/// Engine-managed files that can be loaded, saved or cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileType {
    Result,
    MistakeDatabase,
}
