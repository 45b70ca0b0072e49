#![allow(dead_code)]

use antidupl::core::{
    ActionEnableType, FileType, GlobalActionType, Group, GroupId, ImageInfo, LocalActionType,
    RenameCurrentType, ResultRecord, SelectionType, SortType, StatusSample, TargetType,
    ThreadType,
};
use antidupl::engine::EngineVersion;
use antidupl::options::{OptionsType, PathEntry, PathRole};
use antidupl::{Engine, EngineConfig, EngineError, EngineResult, LocalEngine};
use image::{Rgb, RgbImage};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tempfile::TempDir;

/// Temp layout: `pics/` holds images, `state/` the engine's own files.
pub struct Fixture {
    pub temp_dir: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        std::fs::create_dir_all(temp_dir.path().join("pics")).unwrap();
        Self { temp_dir }
    }

    pub fn pics(&self) -> PathBuf {
        self.temp_dir.path().join("pics")
    }

    pub fn state(&self) -> PathBuf {
        self.temp_dir.path().join("state")
    }

    pub fn config(&self) -> EngineConfig {
        EngineConfig {
            trash_dir: self.state().join("trash"),
            mistake_database: Some(self.state().join("mistakes.db")),
            default_search_path: self.pics(),
        }
    }

    pub fn engine(&self) -> LocalEngine {
        LocalEngine::new(self.config()).unwrap()
    }

    /// Horizontal gradient; copies of it are exact duplicates.
    pub fn write_gradient(&self, name: &str) -> PathBuf {
        let path = self.pics().join(name);
        RgbImage::from_fn(80, 80, |x, y| Rgb([x as u8 * 3, y as u8, 60]))
            .save(&path)
            .unwrap();
        path
    }

    /// Checkerboard, far from the gradient.
    pub fn write_checker(&self, name: &str) -> PathBuf {
        let path = self.pics().join(name);
        RgbImage::from_fn(80, 80, |x, y| {
            if (x / 10 + y / 10) % 2 == 0 {
                Rgb([255, 255, 255])
            } else {
                Rgb([0, 0, 0])
            }
        })
        .save(&path)
        .unwrap();
        path
    }

    pub fn write_broken(&self, name: &str) -> PathBuf {
        let path = self.pics().join(name);
        std::fs::write(&path, b"\x89PNG\r\n\x1a\nnot really").unwrap();
        path
    }
}

/// Delegates to a [`LocalEngine`] while recording every result page fetch.
/// `busy_releases` makes that many `release` calls report `AccessDenied`.
pub struct CountingEngine {
    pub inner: LocalEngine,
    pub fetches: Mutex<Vec<(usize, usize)>>,
    pub version: Option<EngineVersion>,
    pub busy_releases: AtomicUsize,
    pub stops: AtomicUsize,
}

impl CountingEngine {
    pub fn new(inner: LocalEngine) -> Self {
        Self {
            inner,
            fetches: Mutex::new(Vec::new()),
            version: None,
            busy_releases: AtomicUsize::new(0),
            stops: AtomicUsize::new(0),
        }
    }

    pub fn fetches(&self) -> Vec<(usize, usize)> {
        self.fetches.lock().unwrap().clone()
    }
}

impl Engine for CountingEngine {
    fn version(&self) -> EngineVersion {
        self.version.unwrap_or_else(|| self.inner.version())
    }

    fn release(&self) -> EngineResult<()> {
        let busy = self
            .busy_releases
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if busy.is_ok() {
            return Err(EngineError::AccessDenied);
        }
        self.inner.release()
    }

    fn search(&self) -> EngineResult<()> {
        self.inner.search()
    }

    fn stop(&self) -> EngineResult<()> {
        self.stops.fetch_add(1, Ordering::SeqCst);
        self.inner.stop()
    }

    fn status(&self, thread_type: ThreadType, thread_id: usize) -> EngineResult<Option<StatusSample>> {
        self.inner.status(thread_type, thread_id)
    }

    fn options_get(&self, kind: OptionsType) -> EngineResult<Vec<u8>> {
        self.inner.options_get(kind)
    }

    fn options_set(&self, kind: OptionsType, flat: &[u8]) -> EngineResult<()> {
        self.inner.options_set(kind, flat)
    }

    fn options_set_default(&self) -> EngineResult<()> {
        self.inner.options_set_default()
    }

    fn paths_get(&self, role: PathRole) -> EngineResult<Vec<PathEntry>> {
        self.inner.paths_get(role)
    }

    fn paths_set(&self, role: PathRole, entries: &[PathEntry]) -> EngineResult<()> {
        self.inner.paths_set(role, entries)
    }

    fn result_count(&self) -> EngineResult<usize> {
        self.inner.result_count()
    }

    fn results(&self, start: usize, max: usize) -> EngineResult<Vec<ResultRecord>> {
        self.fetches.lock().unwrap().push((start, max));
        self.inner.results(start, max)
    }

    fn sort_results(&self, sort: SortType, increasing: bool) -> EngineResult<()> {
        self.inner.sort_results(sort, increasing)
    }

    fn group_count(&self) -> EngineResult<usize> {
        self.inner.group_count()
    }

    fn groups(&self, start: usize, max: usize) -> EngineResult<Vec<Group>> {
        self.inner.groups(start, max)
    }

    fn image_info_count(&self, group: GroupId) -> EngineResult<usize> {
        self.inner.image_info_count(group)
    }

    fn image_infos(&self, group: GroupId, start: usize, max: usize) -> EngineResult<Vec<ImageInfo>> {
        self.inner.image_infos(group, start, max)
    }

    fn current_set(&self, index: usize) -> EngineResult<()> {
        self.inner.current_set(index)
    }

    fn current_get(&self) -> EngineResult<Option<usize>> {
        self.inner.current_get()
    }

    fn selection_set(&self, start: usize, size: usize, value: bool) -> EngineResult<()> {
        self.inner.selection_set(start, size, value)
    }

    fn selection_get(&self, start: usize, size: usize) -> EngineResult<Vec<bool>> {
        self.inner.selection_get(start, size)
    }

    fn group_selection_set(
        &self,
        group: GroupId,
        start: usize,
        size: usize,
        value: bool,
    ) -> EngineResult<()> {
        self.inner.group_selection_set(group, start, size, value)
    }

    fn group_selection_get(&self, group: GroupId, start: usize, size: usize) -> EngineResult<Vec<bool>> {
        self.inner.group_selection_get(group, start, size)
    }

    fn select(&self, selection: SelectionType) -> EngineResult<()> {
        self.inner.select(selection)
    }

    fn can_apply(&self, action: ActionEnableType) -> EngineResult<bool> {
        self.inner.can_apply(action)
    }

    fn apply_global(&self, action: GlobalActionType) -> EngineResult<()> {
        self.inner.apply_global(action)
    }

    fn apply_local(&self, action: LocalActionType, target: TargetType) -> EngineResult<()> {
        self.inner.apply_local(action, target)
    }

    fn rename_current(&self, which: RenameCurrentType, new_path: &Path) -> EngineResult<()> {
        self.inner.rename_current(which, new_path)
    }

    fn load(&self, file: FileType, path: &Path) -> EngineResult<()> {
        self.inner.load(file, path)
    }

    fn save(&self, file: FileType, path: &Path) -> EngineResult<()> {
        self.inner.save(file, path)
    }

    fn clear(&self, file: FileType) -> EngineResult<()> {
        self.inner.clear(file)
    }
}
