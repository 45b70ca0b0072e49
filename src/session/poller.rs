use crate::core::{StateType, StatusSample, ThreadType};
use crate::engine::Engine;
use crate::error::EngineResult;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Snapshot of every worker slot at one instant.
#[derive(Debug, Clone)]
pub struct Progress {
    pub main: StatusSample,
    pub collect: Vec<StatusSample>,
    pub compare: Vec<StatusSample>,
    pub elapsed: Duration,
}

impl Progress {
    /// Completed share of the main operation, `None` while the total is unknown.
    pub fn fraction(&self) -> Option<f64> {
        if self.main.total == 0 {
            return None;
        }
        Some((self.main.current as f64 / self.main.total as f64).clamp(0.0, 1.0))
    }

    /// Remaining time, extrapolated from the elapsed time and the fraction done.
    pub fn eta(&self) -> Option<Duration> {
        let fraction = self.fraction().filter(|f| *f > 0.0)?;
        Some(self.elapsed.mul_f64((1.0 - fraction) / fraction))
    }

    pub fn is_finished(&self) -> bool {
        self.main.state.is_terminal()
    }

    pub fn was_stopped(&self) -> bool {
        self.main.state == StateType::Stopped
    }
}

/// Status reader sharing the engine with a session. Safe to use from another
/// thread while the session runs a long operation.
pub struct StatusPoller<E: Engine> {
    engine: Arc<E>,
    started: Instant,
}

impl<E: Engine> Clone for StatusPoller<E> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            started: self.started,
        }
    }
}

impl<E: Engine> StatusPoller<E> {
    pub fn new(engine: Arc<E>) -> Self {
        Self {
            engine,
            started: Instant::now(),
        }
    }

    /// Restart the elapsed clock used for ETA estimates.
    pub fn restart(&mut self) {
        self.started = Instant::now();
    }

    pub fn poll(&self) -> EngineResult<Progress> {
        let main = self
            .engine
            .status(ThreadType::Main, 0)?
            .unwrap_or_default();
        Ok(Progress {
            main,
            collect: self.workers(ThreadType::Collect)?,
            compare: self.workers(ThreadType::Compare)?,
            elapsed: self.started.elapsed(),
        })
    }

    fn workers(&self, thread_type: ThreadType) -> EngineResult<Vec<StatusSample>> {
        let mut samples = Vec::new();
        while let Some(sample) = self.engine.status(thread_type, samples.len())? {
            samples.push(sample);
        }
        Ok(samples)
    }

    pub fn stop(&self) -> EngineResult<()> {
        self.engine.stop()
    }
}
