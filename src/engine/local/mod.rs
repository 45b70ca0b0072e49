//! In-process engine: collects images from disk, compares them and keeps
//! the resulting defect and duplicate records with full undo support.

mod actions;
mod collect;
mod compare;
mod exif;
mod files;
mod hint;
mod history;
mod metrics;
mod mistakes;
mod result_file;
mod results;
mod selection;
mod status;

pub use collect::CollectError;
pub use files::FileMove;
pub use mistakes::{MistakeKey, MistakeStore};
pub use status::StatusBoard;

use super::{Engine, EngineVersion, PAGE_SIZE};
use crate::core::{
    ActionEnableType, DefectRecord, DefectType, DuplPair, FileType, GlobalActionType, Group, GroupId,
    HintType, ImageInfo, LocalActionType, RenameCurrentType, ResultRecord, ResultType,
    SelectionType, SortType, StateType, StatusSample, TargetType, ThreadType,
};
use crate::error::{EngineError, EngineResult};
use crate::options::paths::is_too_long;
use crate::options::{
    AdvancedOptions, CompareOptions, CoreOptions, DefectOptions, FlatOptions, OptionsType,
    PathEntry, PathList, PathRole, SearchOptions,
};
use actions::ActionBatch;
use collect::Collector;
use compare::Comparer;
use files::{move_file, Trash};
use history::{History, HistoryEntry};
use result_file::ResultFile;
use results::ResultSet;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::io;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

pub const VERSION: EngineVersion = EngineVersion {
    major: 2,
    minor: 3,
    release: 10,
};

/// Where the engine keeps its own files.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub trash_dir: PathBuf,
    /// `None` keeps the mistake database in memory.
    pub mistake_database: Option<PathBuf>,
    pub default_search_path: PathBuf,
}

impl EngineConfig {
    /// Trash and mistake database inside `dir`, searching the user's
    /// pictures folder by default.
    pub fn in_dir(dir: &Path) -> Self {
        let default_search_path = dirs::picture_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."));
        Self {
            trash_dir: dir.join("trash"),
            mistake_database: Some(dir.join("mistakes.db")),
            default_search_path,
        }
    }
}

fn default_options(config: &EngineConfig) -> CoreOptions {
    CoreOptions {
        search: SearchOptions::default(),
        compare: CompareOptions::default(),
        defect: DefectOptions::default(),
        advanced: AdvancedOptions::default(),
        search_paths: vec![PathEntry::new(&config.default_search_path)],
        ignore_paths: Vec::new(),
        valid_paths: Vec::new(),
        delete_paths: Vec::new(),
    }
}

struct EngineState {
    options: CoreOptions,
    results: ResultSet,
    history: History,
}

/// Marks the engine busy for the lifetime of one mutating call.
struct Operation<'a> {
    engine: &'a LocalEngine,
}

impl Drop for Operation<'_> {
    fn drop(&mut self) {
        let stopped = self.engine.stop.load(Ordering::SeqCst);
        self.engine.status.finish(stopped);
        self.engine.busy.store(false, Ordering::SeqCst);
    }
}

pub struct LocalEngine {
    config: EngineConfig,
    state: RwLock<EngineState>,
    status: StatusBoard,
    stop: AtomicBool,
    busy: AtomicBool,
    trash: Trash,
    mistakes: Mutex<MistakeStore>,
    next_image_id: AtomicU64,
}

fn page<T: Clone>(items: &[T], start: usize, max: usize) -> EngineResult<Vec<T>> {
    if max > PAGE_SIZE {
        return Err(EngineError::OutputBufferIsTooSmall);
    }
    if start > items.len() {
        return Err(EngineError::InvalidStartPosition);
    }
    let end = start.saturating_add(max).min(items.len());
    Ok(items[start..end].to_vec())
}

fn decode<O: FlatOptions>(flat: &[u8]) -> EngineResult<O> {
    let options = O::from_bytes(flat)?;
    options.validate()?;
    Ok(options)
}

/// Apply `moves` in order. On the first failure the moves already made are
/// reverted so the file system is left as it was found.
fn replay(moves: &[FileMove]) -> EngineResult<()> {
    for (done, m) in moves.iter().enumerate() {
        if let Err(e) = move_file(&m.from, &m.to) {
            log::warn!("Failed to move {} -> {}: {}", m.from.display(), m.to.display(), e);
            for back in moves[..done].iter().rev().map(FileMove::reversed) {
                if let Err(e) = move_file(&back.from, &back.to) {
                    log::error!("Failed to roll back {}: {}", back.to.display(), e);
                }
            }
            return Err(match e.kind() {
                io::ErrorKind::AlreadyExists => EngineError::CantCreateFile,
                _ => EngineError::CantWriteFile,
            });
        }
    }
    Ok(())
}

fn check_paths(role: PathRole, entries: &[PathEntry]) -> EngineResult<()> {
    if role == PathRole::Search && entries.is_empty() {
        return Err(EngineError::InvalidParameterCombination);
    }
    if entries.iter().any(|e| is_too_long(&e.path)) {
        return Err(EngineError::PathTooLong);
    }
    Ok(())
}

impl LocalEngine {
    pub fn new(config: EngineConfig) -> EngineResult<Self> {
        let trash = Trash::new(&config.trash_dir).map_err(|e| {
            log::error!("Failed to create trash {}: {}", config.trash_dir.display(), e);
            EngineError::CantCreateFile
        })?;
        let store = match &config.mistake_database {
            Some(path) => MistakeStore::open(path),
            None => MistakeStore::in_memory(),
        }
        .map_err(|e| {
            log::error!("Failed to open mistake database: {}", e);
            EngineError::CantOpenFile
        })?;

        log::info!("Engine {} ready, trash at {}", VERSION, trash.dir().display());
        Ok(Self {
            state: RwLock::new(EngineState {
                options: default_options(&config),
                results: ResultSet::default(),
                history: History::default(),
            }),
            config,
            status: StatusBoard::new(),
            stop: AtomicBool::new(false),
            busy: AtomicBool::new(false),
            trash,
            mistakes: Mutex::new(store),
            next_image_id: AtomicU64::new(1),
        })
    }

    fn read(&self) -> RwLockReadGuard<'_, EngineState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, EngineState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn mistakes(&self) -> MutexGuard<'_, MistakeStore> {
        self.mistakes.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn begin(&self, state: StateType) -> EngineResult<Operation<'_>> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(EngineError::AccessDenied);
        }
        self.stop.store(false, Ordering::SeqCst);
        self.status.start(state);
        Ok(Operation { engine: self })
    }

    /// Fail while a long operation holds the engine.
    fn idle(&self) -> EngineResult<()> {
        if self.busy.load(Ordering::SeqCst) {
            Err(EngineError::AccessDenied)
        } else {
            Ok(())
        }
    }

    fn record_history(&self, state: &mut EngineState, entry: HistoryEntry) {
        let limit = state.options.advanced.undo_queue_size.max(0) as usize;
        for evicted in state.history.push(entry, limit) {
            self.trash.purge(&evicted.moves);
        }
        log::debug!("Undo history holds {} entries", state.history.undo_len());
    }

    fn drop_history(&self, state: &mut EngineState, keep: &HashSet<PathBuf>) {
        for entry in state.history.clear() {
            let orphaned: Vec<FileMove> = entry
                .moves
                .into_iter()
                .filter(|m| !keep.contains(&m.to))
                .collect();
            self.trash.purge(&orphaned);
        }
    }

    fn build_results(
        &self,
        options: &CoreOptions,
        collected: &[collect::Collected],
        matches: Vec<compare::Match>,
    ) -> Vec<ResultRecord> {
        let known = if options.advanced.mistake_database {
            self.mistakes().keys().unwrap_or_else(|e| {
                log::warn!("Failed to read mistake database: {}", e);
                HashSet::new()
            })
        } else {
            HashSet::new()
        };
        let cap = options.advanced.result_count_max.max(0) as usize;

        let defects = collected
            .iter()
            .filter(|c| c.defect != DefectType::None)
            .map(|c| {
                ResultRecord::Defect(DefectRecord {
                    image: c.info.clone(),
                    defect: c.defect,
                    hint: HintType::None,
                })
            });
        let pairs = matches.into_iter().map(|m| {
            ResultRecord::DuplPair(DuplPair {
                first: collected[m.first].info.clone(),
                second: collected[m.second].info.clone(),
                difference: m.difference,
                transform: m.transform,
                group: GroupId(0),
                hint: HintType::None,
            })
        });

        defects
            .chain(pairs)
            .filter(|record| !known.contains(&MistakeKey::of(record)))
            .take(cap)
            .collect()
    }

    fn undo(&self, state: &mut EngineState) -> EngineResult<()> {
        let entry = state.history.take_undo().ok_or(EngineError::ZeroTarget)?;
        let backwards: Vec<FileMove> = entry.moves.iter().rev().map(FileMove::reversed).collect();
        if let Err(e) = replay(&backwards) {
            state.history.push_undo(entry);
            return Err(e);
        }
        {
            let store = self.mistakes();
            for key in &entry.mistakes {
                if let Err(e) = store.remove(key) {
                    log::warn!("Failed to forget mistake: {}", e);
                }
            }
        }
        state.results.replace(entry.before.clone());
        state.history.push_redo(entry);
        Ok(())
    }

    fn redo(&self, state: &mut EngineState) -> EngineResult<()> {
        let entry = state.history.take_redo().ok_or(EngineError::ZeroTarget)?;
        if let Err(e) = replay(&entry.moves) {
            state.history.push_redo(entry);
            return Err(e);
        }
        {
            let store = self.mistakes();
            for key in &entry.mistakes {
                if let Err(e) = store.insert(key) {
                    log::warn!("Failed to record mistake: {}", e);
                }
            }
        }
        state.results.replace(entry.after.clone());
        state.history.push_undo(entry);
        Ok(())
    }

    fn resolve(current: &Path, new_path: &Path) -> PathBuf {
        if new_path.is_absolute() {
            new_path.to_path_buf()
        } else {
            current
                .parent()
                .map(|dir| dir.join(new_path))
                .unwrap_or_else(|| new_path.to_path_buf())
        }
    }
}

impl Engine for LocalEngine {
    fn version(&self) -> EngineVersion {
        VERSION
    }

    fn release(&self) -> EngineResult<()> {
        self.idle()?;
        log::debug!("Engine released");
        Ok(())
    }

    fn search(&self) -> EngineResult<()> {
        let _op = self.begin(StateType::Search)?;
        let options = self.read().options.clone();

        let collector = Collector::new(&options, &self.status, &self.stop, &self.next_image_id);
        let candidates = collector.discover();
        let collected = collector
            .collect(&candidates)
            .map_err(|e| {
                log::error!("Collect failed: {}", e);
                EngineError::Unknown
            })?;

        let matches = if self.stop.load(Ordering::SeqCst) {
            Vec::new()
        } else {
            Comparer::new(&options, &self.status, &self.stop)
                .compare(&collected)
                .map_err(|e| {
                    log::error!("Compare failed: {}", e);
                    EngineError::Unknown
                })?
        };

        let mut records = self.build_results(&options, &collected, matches);
        hint::apply(&mut records, &options);

        let mut state = self.write();
        self.drop_history(&mut state, &HashSet::new());
        state.results.replace(records);
        log::info!(
            "Search finished with {} results in {} groups",
            state.results.len(),
            state.results.groups().len()
        );
        Ok(())
    }

    fn stop(&self) -> EngineResult<()> {
        self.stop.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn status(&self, thread_type: ThreadType, thread_id: usize) -> EngineResult<Option<StatusSample>> {
        self.status.sample(thread_type, thread_id)
    }

    fn options_get(&self, kind: OptionsType) -> EngineResult<Vec<u8>> {
        Ok(self.read().options.flat_bytes(kind))
    }

    fn options_set(&self, kind: OptionsType, flat: &[u8]) -> EngineResult<()> {
        self.idle()?;
        let mut state = self.write();
        match kind {
            OptionsType::Search => state.options.search = decode(flat)?,
            OptionsType::Compare => state.options.compare = decode(flat)?,
            OptionsType::Defect => state.options.defect = decode(flat)?,
            OptionsType::Advanced => state.options.advanced = decode(flat)?,
        }
        Ok(())
    }

    fn options_set_default(&self) -> EngineResult<()> {
        self.idle()?;
        self.write().options = default_options(&self.config);
        Ok(())
    }

    fn paths_get(&self, role: PathRole) -> EngineResult<Vec<PathEntry>> {
        Ok(self.read().options.paths(role).to_vec())
    }

    fn paths_set(&self, role: PathRole, entries: &[PathEntry]) -> EngineResult<()> {
        self.idle()?;
        check_paths(role, entries)?;
        self.write()
            .options
            .set_path_list(PathList::new(role, entries.to_vec()));
        Ok(())
    }

    fn result_count(&self) -> EngineResult<usize> {
        Ok(self.read().results.len())
    }

    fn results(&self, start: usize, max: usize) -> EngineResult<Vec<ResultRecord>> {
        page(self.read().results.records(), start, max)
    }

    fn sort_results(&self, sort: SortType, increasing: bool) -> EngineResult<()> {
        let _op = self.begin(StateType::Sort)?;
        self.write().results.sort(sort, increasing);
        Ok(())
    }

    fn group_count(&self) -> EngineResult<usize> {
        Ok(self.read().results.groups().len())
    }

    fn groups(&self, start: usize, max: usize) -> EngineResult<Vec<Group>> {
        let state = self.read();
        let summaries: Vec<Group> = state.results.groups().iter().map(|g| g.summary()).collect();
        page(&summaries, start, max)
    }

    fn image_info_count(&self, group: GroupId) -> EngineResult<usize> {
        Ok(self.read().results.group(group)?.images.len())
    }

    fn image_infos(&self, group: GroupId, start: usize, max: usize) -> EngineResult<Vec<ImageInfo>> {
        let state = self.read();
        page(&state.results.group(group)?.images, start, max)
    }

    fn current_set(&self, index: usize) -> EngineResult<()> {
        self.write().results.set_current(index)
    }

    fn current_get(&self) -> EngineResult<Option<usize>> {
        Ok(self.read().results.current())
    }

    fn selection_set(&self, start: usize, size: usize, value: bool) -> EngineResult<()> {
        let mut state = self.write();
        let len = state.results.len();
        if start > len {
            return Err(EngineError::InvalidStartPosition);
        }
        state.results.selection.set_results(start, size, len, value);
        Ok(())
    }

    fn selection_get(&self, start: usize, size: usize) -> EngineResult<Vec<bool>> {
        let state = self.read();
        let len = state.results.len();
        if start > len {
            return Err(EngineError::InvalidStartPosition);
        }
        Ok(state.results.selection.results(start, size, len))
    }

    fn group_selection_set(
        &self,
        group: GroupId,
        start: usize,
        size: usize,
        value: bool,
    ) -> EngineResult<()> {
        let mut state = self.write();
        let len = state.results.group(group)?.images.len();
        if start > len {
            return Err(EngineError::InvalidStartPosition);
        }
        state.results.selection.set_images(group, start, size, len, value);
        Ok(())
    }

    fn group_selection_get(&self, group: GroupId, start: usize, size: usize) -> EngineResult<Vec<bool>> {
        let state = self.read();
        let len = state.results.group(group)?.images.len();
        if start > len {
            return Err(EngineError::InvalidStartPosition);
        }
        Ok(state.results.selection.images(group, start, size, len))
    }

    fn select(&self, selection: SelectionType) -> EngineResult<()> {
        self.write().results.select(selection)
    }

    fn can_apply(&self, action: ActionEnableType) -> EngineResult<bool> {
        let state = self.read();
        let focus = state.results.focus();
        Ok(match action {
            ActionEnableType::Any => !focus.is_empty(),
            ActionEnableType::Defect => focus.iter().any(|r| r.kind() == ResultType::Defect),
            ActionEnableType::DuplPair => focus.iter().any(|r| r.kind() == ResultType::DuplPair),
            ActionEnableType::PerformHint => focus.iter().any(|r| r.hint() != HintType::None),
            ActionEnableType::Undo => state.history.can_undo(),
            ActionEnableType::Redo => state.history.can_redo(),
        })
    }

    fn apply_global(&self, action: GlobalActionType) -> EngineResult<()> {
        let state_type = match action {
            GlobalActionType::SetHint | GlobalActionType::SetGroup => StateType::ApplyAction,
            GlobalActionType::Refresh => StateType::Refresh,
            GlobalActionType::Undo => StateType::Undo,
            GlobalActionType::Redo => StateType::Redo,
        };
        let _op = self.begin(state_type)?;
        let mut guard = self.write();
        let state = &mut *guard;
        match action {
            GlobalActionType::SetHint => {
                state.results.set_hints(&state.options);
                Ok(())
            }
            GlobalActionType::SetGroup => {
                state.results.regroup();
                Ok(())
            }
            GlobalActionType::Refresh => {
                let dropped = state.results.refresh();
                log::info!("Refresh dropped {} results", dropped);
                Ok(())
            }
            GlobalActionType::Undo => self.undo(state),
            GlobalActionType::Redo => self.redo(state),
        }
    }

    fn apply_local(&self, action: LocalActionType, target: TargetType) -> EngineResult<()> {
        let _op = self.begin(StateType::ApplyAction)?;
        let mut guard = self.write();
        let state = &mut *guard;

        let targets: Vec<ResultRecord> = state
            .results
            .targets(target)
            .into_iter()
            .filter_map(|i| state.results.records().get(i).cloned())
            .collect();
        if targets.is_empty() {
            return Err(EngineError::ZeroTarget);
        }
        self.status.progress(None, 0, targets.len());

        let before = state.results.records().to_vec();
        let mut batch = ActionBatch::new(&self.trash, before.clone());
        batch.run(action, &targets);
        let outcome = batch.finish()?;
        let failure = outcome.failure;

        // only keys this action added are forgotten again on undo
        let mistakes = if state.options.advanced.mistake_database {
            let store = self.mistakes();
            let added: Vec<MistakeKey> = outcome
                .mistakes
                .into_iter()
                .filter(|key| !matches!(store.contains(key), Ok(true)))
                .filter(|key| match store.insert(key) {
                    Ok(()) => true,
                    Err(e) => {
                        log::warn!("Failed to record mistake: {}", e);
                        false
                    }
                })
                .collect();
            if let Ok(count) = store.len() {
                log::debug!("Mistake database holds {} entries", count);
            }
            added
        } else {
            Vec::new()
        };

        state.results.replace(outcome.records);
        self.status.progress(None, targets.len(), targets.len());
        let entry = HistoryEntry {
            before,
            after: state.results.records().to_vec(),
            moves: outcome.moves,
            mistakes,
        };
        self.record_history(state, entry);
        // completed targets stay applied and undoable
        match failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn rename_current(&self, which: RenameCurrentType, new_path: &Path) -> EngineResult<()> {
        let _op = self.begin(StateType::RenameCurrent)?;
        let mut guard = self.write();
        let state = &mut *guard;

        let current = state.results.current().ok_or(EngineError::ZeroTarget)?;
        let record = state
            .results
            .records()
            .get(current)
            .ok_or(EngineError::InvalidIndex)?;
        let image = match which {
            RenameCurrentType::First => record.first(),
            RenameCurrentType::Second => {
                record.second().ok_or(EngineError::InvalidRenameCurrentType)?
            }
        };
        let from = image.path.clone();
        if new_path.file_name().is_none() {
            return Err(EngineError::InvalidFileName);
        }
        let to = Self::resolve(&from, new_path);
        if is_too_long(&to) {
            return Err(EngineError::PathTooLong);
        }
        if to == from {
            return Ok(());
        }
        if to.exists() {
            return Err(EngineError::CantCreateFile);
        }
        move_file(&from, &to).map_err(|e| {
            log::warn!("Failed to rename {}: {}", from.display(), e);
            EngineError::CantWriteFile
        })?;
        log::info!("Renamed {} -> {}", from.display(), to.display());

        let before = state.results.records().to_vec();
        let mut records = before.clone();
        results::move_path(&mut records, &from, &to);
        state.results.replace(records);
        let entry = HistoryEntry {
            before,
            after: state.results.records().to_vec(),
            moves: vec![FileMove { from, to }],
            mistakes: Vec::new(),
        };
        self.record_history(state, entry);
        Ok(())
    }

    fn load(&self, file: FileType, path: &Path) -> EngineResult<()> {
        let _op = self.begin(StateType::Load)?;
        match file {
            FileType::Result => {
                let loaded = ResultFile::load(path)?;
                let mut guard = self.write();
                let state = &mut *guard;
                let keep: HashSet<PathBuf> = loaded
                    .history
                    .referenced_files()
                    .map(Path::to_path_buf)
                    .collect();
                self.drop_history(state, &keep);
                state.results.replace(loaded.results);
                state.history = loaded.history;
                log::info!("Loaded {} results from {}", state.results.len(), path.display());
                Ok(())
            }
            FileType::MistakeDatabase => {
                if !path.exists() {
                    return Err(EngineError::FileIsNotExists);
                }
                let source = MistakeStore::open(path).map_err(|_| EngineError::CantOpenFile)?;
                let keys = source.keys().map_err(|_| EngineError::InvalidFileFormat)?;
                let store = self.mistakes();
                store.clear().map_err(|_| EngineError::CantWriteFile)?;
                for key in &keys {
                    store.insert(key).map_err(|_| EngineError::CantWriteFile)?;
                }
                log::info!(
                    "Loaded {} mistakes from {}",
                    store.len().map_err(|_| EngineError::CantReadFile)?,
                    path.display()
                );
                Ok(())
            }
        }
    }

    fn save(&self, file: FileType, path: &Path) -> EngineResult<()> {
        let _op = self.begin(StateType::Save)?;
        match file {
            FileType::Result => {
                let state = self.read();
                ResultFile::new(state.results.records().to_vec(), state.history.clone()).save(path)
            }
            FileType::MistakeDatabase => self.mistakes().save_to(path).map_err(|e| {
                log::warn!("Failed to save mistake database {}: {}", path.display(), e);
                EngineError::CantWriteFile
            }),
        }
    }

    fn clear(&self, file: FileType) -> EngineResult<()> {
        let _op = self.begin(StateType::Clear)?;
        match file {
            FileType::Result => {
                let mut guard = self.write();
                let state = &mut *guard;
                self.drop_history(state, &HashSet::new());
                state.results.clear();
                Ok(())
            }
            FileType::MistakeDatabase => self
                .mistakes()
                .clear()
                .map_err(|_| EngineError::CantWriteFile),
        }
    }
}
