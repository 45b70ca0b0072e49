use crate::error::OptionsError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Longest path, in UTF-16 units, the engine accepts.
pub const MAX_PATH_EX: usize = 32768;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PathRole {
    Search,
    Ignore,
    Valid,
    Delete,
}

impl PathRole {
    pub const ALL: [PathRole; 4] = [
        PathRole::Search,
        PathRole::Ignore,
        PathRole::Valid,
        PathRole::Delete,
    ];
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PathEntry {
    pub path: PathBuf,
    /// Recurse into subfolders. Only meaningful for the search role.
    #[serde(default = "default_sub_folder")]
    pub enable_sub_folder: bool,
}

fn default_sub_folder() -> bool {
    true
}

impl PathEntry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            enable_sub_folder: true,
        }
    }

    pub fn flat(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            enable_sub_folder: false,
        }
    }

    /// Whether `path` lies at or below this entry.
    pub fn contains(&self, path: &Path) -> bool {
        path.starts_with(&self.path)
    }
}

/// Length of `path` as the engine counts it.
pub fn path_units(path: &Path) -> usize {
    path.to_string_lossy().encode_utf16().count()
}

pub fn is_too_long(path: &Path) -> bool {
    path_units(path) >= MAX_PATH_EX
}

/// The paths of one role, as edited in the paths dialog.
///
/// The search list is never allowed to become empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathList {
    role: PathRole,
    entries: Vec<PathEntry>,
}

impl PathList {
    pub fn new(role: PathRole, entries: Vec<PathEntry>) -> Self {
        Self { role, entries }
    }

    pub fn role(&self) -> PathRole {
        self.role
    }

    pub fn entries(&self) -> &[PathEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<PathEntry> {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Adds `entry` unless an identical path is already listed.
    pub fn add(&mut self, entry: PathEntry) -> bool {
        if self.entries.iter().any(|e| e.path == entry.path) {
            return false;
        }
        self.entries.push(entry);
        true
    }

    pub fn can_remove(&self) -> bool {
        match self.role {
            PathRole::Search => self.entries.len() > 1,
            _ => !self.entries.is_empty(),
        }
    }

    pub fn remove(&mut self, index: usize) -> Result<PathEntry, OptionsError> {
        if index >= self.entries.len() {
            return Err(OptionsError::InvalidIndex {
                index,
                len: self.entries.len(),
            });
        }
        if self.role == PathRole::Search && self.entries.len() == 1 {
            return Err(OptionsError::LastSearchPath);
        }
        Ok(self.entries.remove(index))
    }

    pub fn replace(&mut self, index: usize, entry: PathEntry) -> Result<(), OptionsError> {
        let len = self.entries.len();
        let slot = self
            .entries
            .get_mut(index)
            .ok_or(OptionsError::InvalidIndex { index, len })?;
        *slot = entry;
        Ok(())
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.entries.iter().any(|entry| entry.contains(path))
    }
}
