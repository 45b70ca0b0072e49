//! Caller-side wrapper around an [`Engine`]: version check, paged reads,
//! typed options access and orderly release.

pub mod paging;
pub mod poller;

pub use paging::{fetch_range, PageCache};
pub use poller::{Progress, StatusPoller};

use crate::core::{
    ActionEnableType, FileType, GlobalActionType, Group, GroupId, ImageInfo, LocalActionType,
    RenameCurrentType, ResultRecord, SelectionType, SortType, TargetType,
};
use crate::engine::Engine;
use crate::error::{EngineError, EngineResult, SessionError, SessionResult};
use crate::options::{
    AdvancedOptions, CompareOptions, CoreOptions, DefectOptions, FlatOptions, PathRole,
    SearchOptions,
};
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Engine major version this session speaks.
pub const SUPPORTED_MAJOR: u32 = 2;

const RELEASE_RETRY: Duration = Duration::from_millis(10);

/// Owns one engine instance for its whole lifetime.
///
/// Every call that can change the result list bumps a generation counter,
/// which drops the cached result and group pages.
pub struct EngineSession<E: Engine> {
    engine: Arc<E>,
    generation: u64,
    results: PageCache<ResultRecord>,
    groups: PageCache<Group>,
    released: bool,
}

impl<E: Engine> EngineSession<E> {
    pub fn open(engine: E) -> SessionResult<Self> {
        Self::from_arc(Arc::new(engine))
    }

    pub fn from_arc(engine: Arc<E>) -> SessionResult<Self> {
        let version = engine.version();
        if version.major != SUPPORTED_MAJOR {
            return Err(SessionError::IncompatibleVersion {
                found: version.to_string(),
                expected: SUPPORTED_MAJOR,
            });
        }
        log::debug!("Opened engine session, engine version {}", version);
        Ok(Self {
            engine,
            generation: 0,
            results: PageCache::default(),
            groups: PageCache::default(),
            released: false,
        })
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn poller(&self) -> StatusPoller<E> {
        StatusPoller::new(Arc::clone(&self.engine))
    }

    fn invalidate(&mut self) {
        self.generation += 1;
    }

    /// Run a mutating engine call; the caches are dropped even when it fails,
    /// since a partial action may still have changed the results.
    fn mutate<T>(&mut self, call: impl FnOnce(&E) -> EngineResult<T>) -> SessionResult<T> {
        let result = call(self.engine.as_ref());
        self.invalidate();
        Ok(result?)
    }

    // Options

    pub fn options<O: FlatOptions>(&self) -> SessionResult<O> {
        let bytes = self.engine.options_get(O::KIND)?;
        Ok(O::from_bytes(&bytes)?)
    }

    pub fn set_options<O: FlatOptions>(&self, options: &O) -> SessionResult<()> {
        Ok(self.engine.options_set(O::KIND, &options.to_bytes())?)
    }

    /// Every options category and path list the engine currently holds.
    pub fn options_bundle(&self) -> SessionResult<CoreOptions> {
        Ok(CoreOptions {
            search: self.options::<SearchOptions>()?,
            compare: self.options::<CompareOptions>()?,
            defect: self.options::<DefectOptions>()?,
            advanced: self.options::<AdvancedOptions>()?,
            search_paths: self.engine.paths_get(PathRole::Search)?,
            ignore_paths: self.engine.paths_get(PathRole::Ignore)?,
            valid_paths: self.engine.paths_get(PathRole::Valid)?,
            delete_paths: self.engine.paths_get(PathRole::Delete)?,
        })
    }

    fn push_options(&self, options: &CoreOptions) -> SessionResult<()> {
        self.set_options(&options.search)?;
        self.set_options(&options.compare)?;
        self.set_options(&options.defect)?;
        self.set_options(&options.advanced)?;
        for role in PathRole::ALL {
            self.engine.paths_set(role, options.paths(role))?;
        }
        Ok(())
    }

    /// Push a whole bundle. If any part is rejected the previous bundle is
    /// pushed back so the engine never keeps a half-applied set.
    pub fn commit_options(&self, options: &CoreOptions) -> SessionResult<()> {
        let previous = self.options_bundle()?;
        if let Err(e) = self.push_options(options) {
            log::warn!("Options rejected by engine: {}", e);
            if let Err(restore) = self.push_options(&previous) {
                log::error!("Failed to restore previous options: {}", restore);
            }
            return Err(e);
        }
        Ok(())
    }

    /// Reset the engine to its defaults and return them.
    pub fn default_options(&self) -> SessionResult<CoreOptions> {
        self.engine.options_set_default()?;
        self.options_bundle()
    }

    // Search and status

    pub fn search(&mut self) -> SessionResult<()> {
        self.mutate(|engine| engine.search())
    }

    pub fn stop(&self) -> SessionResult<()> {
        Ok(self.engine.stop()?)
    }

    // Results

    pub fn result_size(&self) -> SessionResult<usize> {
        Ok(self.engine.result_count()?)
    }

    pub fn results(&self, start: usize, size: usize) -> SessionResult<Vec<ResultRecord>> {
        let total = self.result_size()?;
        fetch_range(total, start, size, |s, m| self.engine.results(s, m))
    }

    /// Cached single-record read.
    pub fn result_at(&mut self, index: usize) -> SessionResult<Option<ResultRecord>> {
        let total = self.engine.result_count()?;
        let engine = &self.engine;
        self.results
            .get(self.generation, index, total, |s, m| engine.results(s, m))
    }

    pub fn group_count(&self) -> SessionResult<usize> {
        Ok(self.engine.group_count()?)
    }

    pub fn groups(&self, start: usize, size: usize) -> SessionResult<Vec<Group>> {
        let total = self.group_count()?;
        fetch_range(total, start, size, |s, m| self.engine.groups(s, m))
    }

    pub fn group_at(&mut self, index: usize) -> SessionResult<Option<Group>> {
        let total = self.engine.group_count()?;
        let engine = &self.engine;
        self.groups
            .get(self.generation, index, total, |s, m| engine.groups(s, m))
    }

    pub fn image_info_count(&self, group: GroupId) -> SessionResult<usize> {
        Ok(self.engine.image_info_count(group)?)
    }

    pub fn image_infos(
        &self,
        group: GroupId,
        start: usize,
        size: usize,
    ) -> SessionResult<Vec<ImageInfo>> {
        let total = self.image_info_count(group)?;
        fetch_range(total, start, size, |s, m| self.engine.image_infos(group, s, m))
    }

    pub fn sort(&mut self, sort: SortType, increasing: bool) -> SessionResult<()> {
        self.mutate(|engine| engine.sort_results(sort, increasing))
    }

    // Cursor and selection

    pub fn current(&self) -> SessionResult<Option<usize>> {
        Ok(self.engine.current_get()?)
    }

    pub fn set_current(&self, index: usize) -> SessionResult<()> {
        Ok(self.engine.current_set(index)?)
    }

    pub fn set_selection(&self, start: usize, size: usize, value: bool) -> SessionResult<()> {
        Ok(self.engine.selection_set(start, size, value)?)
    }

    pub fn selection(&self, start: usize, size: usize) -> SessionResult<Vec<bool>> {
        Ok(self.engine.selection_get(start, size)?)
    }

    pub fn set_group_selection(
        &self,
        group: GroupId,
        start: usize,
        size: usize,
        value: bool,
    ) -> SessionResult<()> {
        Ok(self.engine.group_selection_set(group, start, size, value)?)
    }

    pub fn group_selection(
        &self,
        group: GroupId,
        start: usize,
        size: usize,
    ) -> SessionResult<Vec<bool>> {
        Ok(self.engine.group_selection_get(group, start, size)?)
    }

    pub fn select(&self, selection: SelectionType) -> SessionResult<()> {
        Ok(self.engine.select(selection)?)
    }

    // Actions

    /// Asks the engine every time; enabled state depends on the current
    /// selection and history.
    pub fn can_apply(&self, action: ActionEnableType) -> SessionResult<bool> {
        Ok(self.engine.can_apply(action)?)
    }

    pub fn apply_global(&mut self, action: GlobalActionType) -> SessionResult<()> {
        self.mutate(|engine| engine.apply_global(action))
    }

    pub fn apply_local(&mut self, action: LocalActionType, target: TargetType) -> SessionResult<()> {
        self.mutate(|engine| engine.apply_local(action, target))
    }

    pub fn rename_current(&mut self, which: RenameCurrentType, new_path: &Path) -> SessionResult<()> {
        self.mutate(|engine| engine.rename_current(which, new_path))
    }

    // Files

    pub fn load(&mut self, file: FileType, path: &Path) -> SessionResult<()> {
        self.mutate(|engine| engine.load(file, path))
    }

    pub fn save(&self, file: FileType, path: &Path) -> SessionResult<()> {
        Ok(self.engine.save(file, path)?)
    }

    pub fn clear(&mut self, file: FileType) -> SessionResult<()> {
        self.mutate(|engine| engine.clear(file))
    }

    // Release

    fn release(&mut self) -> EngineResult<()> {
        if self.released {
            return Ok(());
        }
        loop {
            match self.engine.release() {
                Err(EngineError::AccessDenied) => {
                    log::debug!("Engine busy, stopping before release");
                    self.engine.stop()?;
                    thread::sleep(RELEASE_RETRY);
                }
                other => {
                    self.released = true;
                    return other;
                }
            }
        }
    }

    /// Release the engine, stopping any running operation first.
    pub fn close(mut self) -> SessionResult<()> {
        Ok(self.release()?)
    }
}

impl<E: Engine> Drop for EngineSession<E> {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            log::warn!("Failed to release engine: {}", e);
        }
    }
}
