use crate::core::{StateType, StatusSample, ThreadType};
use crate::error::{EngineError, EngineResult};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct Board {
    main: StatusSample,
    collect: Vec<StatusSample>,
    compare: Vec<StatusSample>,
}

impl Board {
    fn workers(&mut self, thread_type: ThreadType) -> Option<&mut Vec<StatusSample>> {
        match thread_type {
            ThreadType::Main => None,
            ThreadType::Collect => Some(&mut self.collect),
            ThreadType::Compare => Some(&mut self.compare),
        }
    }
}

/// Progress of the main operation and of each stage worker.
///
/// Worker slots only exist while their stage runs, so a poller walking
/// thread ids upwards stops at the first missing one.
#[derive(Debug, Default)]
pub struct StatusBoard {
    inner: Mutex<Board>,
}

impl StatusBoard {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Board> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn start(&self, state: StateType) {
        let mut board = self.lock();
        board.main = StatusSample {
            state,
            path: None,
            current: 0,
            total: 0,
        };
    }

    pub fn set_state(&self, state: StateType) {
        self.lock().main.state = state;
    }

    pub fn progress(&self, path: Option<&Path>, current: usize, total: usize) {
        let mut board = self.lock();
        board.main.path = path.map(Path::to_path_buf);
        board.main.current = current;
        board.main.total = total;
    }

    pub fn finish(&self, stopped: bool) {
        let mut board = self.lock();
        board.main.state = if stopped {
            StateType::Stopped
        } else {
            StateType::Finish
        };
        board.main.path = None;
        board.collect.clear();
        board.compare.clear();
    }

    pub fn open_workers(&self, thread_type: ThreadType, count: usize, state: StateType) {
        let mut board = self.lock();
        if let Some(workers) = board.workers(thread_type) {
            *workers = vec![
                StatusSample {
                    state,
                    ..StatusSample::idle()
                };
                count
            ];
        }
    }

    pub fn worker_progress(
        &self,
        thread_type: ThreadType,
        id: usize,
        path: &Path,
        current: usize,
        total: usize,
    ) {
        let mut board = self.lock();
        if let Some(sample) = board.workers(thread_type).and_then(|w| w.get_mut(id)) {
            sample.path = Some(path.to_path_buf());
            sample.current = current;
            sample.total = total;
        }
    }

    pub fn close_workers(&self, thread_type: ThreadType) {
        if let Some(workers) = self.lock().workers(thread_type) {
            workers.clear();
        }
    }

    pub fn sample(&self, thread_type: ThreadType, id: usize) -> EngineResult<Option<StatusSample>> {
        let mut board = self.lock();
        match thread_type {
            ThreadType::Main if id == 0 => Ok(Some(board.main.clone())),
            ThreadType::Main => Err(EngineError::InvalidThreadId),
            other => Ok(board
                .workers(other)
                .and_then(|workers| workers.get(id).cloned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_main_slot_lifecycle() {
        let board = StatusBoard::new();
        assert_eq!(
            board.sample(ThreadType::Main, 0).unwrap().unwrap().state,
            StateType::None
        );

        board.start(StateType::Search);
        board.progress(Some(Path::new("/a")), 3, 10);
        let sample = board.sample(ThreadType::Main, 0).unwrap().unwrap();
        assert_eq!(sample.state, StateType::Search);
        assert_eq!((sample.current, sample.total), (3, 10));

        board.finish(true);
        assert_eq!(
            board.sample(ThreadType::Main, 0).unwrap().unwrap().state,
            StateType::Stopped
        );
        assert_eq!(
            board.sample(ThreadType::Main, 1),
            Err(EngineError::InvalidThreadId)
        );
    }

    #[test]
    fn test_workers_end_with_sentinel() {
        let board = StatusBoard::new();
        board.open_workers(ThreadType::Compare, 2, StateType::Compare);
        board.worker_progress(ThreadType::Compare, 1, Path::new("/b"), 1, 4);

        assert!(board.sample(ThreadType::Compare, 0).unwrap().is_some());
        let second = board.sample(ThreadType::Compare, 1).unwrap().unwrap();
        assert_eq!(second.current, 1);
        assert!(board.sample(ThreadType::Compare, 2).unwrap().is_none());
        assert!(board.sample(ThreadType::Collect, 0).unwrap().is_none());

        board.close_workers(ThreadType::Compare);
        assert!(board.sample(ThreadType::Compare, 0).unwrap().is_none());
    }
}
