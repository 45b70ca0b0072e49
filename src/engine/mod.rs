//! The engine boundary: one session's duplicate search state behind a fixed
//! set of operations.

pub mod local;

use crate::core::{
    ActionEnableType, FileType, GlobalActionType, Group, GroupId, ImageInfo, LocalActionType,
    RenameCurrentType, ResultRecord, SelectionType, SortType, StatusSample, TargetType,
    ThreadType,
};
use crate::error::EngineResult;
use crate::options::{OptionsType, PathEntry, PathRole};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

pub use local::{EngineConfig, LocalEngine};

/// Most records a single page fetch may return.
pub const PAGE_SIZE: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineVersion {
    pub major: u32,
    pub minor: u32,
    pub release: u32,
}

impl fmt::Display for EngineVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.release)
    }
}

/// Operations every duplicate search engine exposes.
///
/// Implementations own all mutable state; callers only ever see value
/// snapshots. Methods take `&self` so one thread can poll [`Engine::status`]
/// and page through results while another runs a long operation such as
/// [`Engine::search`]. Mutating calls must not overlap each other.
pub trait Engine: Send + Sync {
    fn version(&self) -> EngineVersion;

    /// Release engine resources. Fails with `AccessDenied` while busy.
    fn release(&self) -> EngineResult<()>;

    fn search(&self) -> EngineResult<()>;

    /// Ask the running operation to stop. Completion is only observable
    /// through [`Engine::status`].
    fn stop(&self) -> EngineResult<()>;

    /// Progress of one worker slot; `Ok(None)` once `thread_id` is past the
    /// last worker of `thread_type`.
    fn status(&self, thread_type: ThreadType, thread_id: usize)
        -> EngineResult<Option<StatusSample>>;

    fn options_get(&self, kind: OptionsType) -> EngineResult<Vec<u8>>;
    fn options_set(&self, kind: OptionsType, flat: &[u8]) -> EngineResult<()>;
    fn options_set_default(&self) -> EngineResult<()>;

    fn paths_get(&self, role: PathRole) -> EngineResult<Vec<PathEntry>>;
    fn paths_set(&self, role: PathRole, entries: &[PathEntry]) -> EngineResult<()>;

    fn result_count(&self) -> EngineResult<usize>;
    fn results(&self, start: usize, max: usize) -> EngineResult<Vec<ResultRecord>>;
    fn sort_results(&self, sort: SortType, increasing: bool) -> EngineResult<()>;

    fn group_count(&self) -> EngineResult<usize>;
    fn groups(&self, start: usize, max: usize) -> EngineResult<Vec<Group>>;
    fn image_info_count(&self, group: GroupId) -> EngineResult<usize>;
    fn image_infos(&self, group: GroupId, start: usize, max: usize)
        -> EngineResult<Vec<ImageInfo>>;

    fn current_set(&self, index: usize) -> EngineResult<()>;
    fn current_get(&self) -> EngineResult<Option<usize>>;

    fn selection_set(&self, start: usize, size: usize, value: bool) -> EngineResult<()>;
    fn selection_get(&self, start: usize, size: usize) -> EngineResult<Vec<bool>>;
    fn group_selection_set(
        &self,
        group: GroupId,
        start: usize,
        size: usize,
        value: bool,
    ) -> EngineResult<()>;
    fn group_selection_get(&self, group: GroupId, start: usize, size: usize)
        -> EngineResult<Vec<bool>>;
    fn select(&self, selection: SelectionType) -> EngineResult<()>;

    fn can_apply(&self, action: ActionEnableType) -> EngineResult<bool>;
    fn apply_global(&self, action: GlobalActionType) -> EngineResult<()>;
    fn apply_local(&self, action: LocalActionType, target: TargetType) -> EngineResult<()>;
    fn rename_current(&self, which: RenameCurrentType, new_path: &Path) -> EngineResult<()>;

    fn load(&self, file: FileType, path: &Path) -> EngineResult<()>;
    fn save(&self, file: FileType, path: &Path) -> EngineResult<()>;
    fn clear(&self, file: FileType) -> EngineResult<()>;
}
