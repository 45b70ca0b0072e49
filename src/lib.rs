//! Duplicate and defective image finder.
//!
//! [`engine::LocalEngine`] does the searching; [`session::EngineSession`]
//! is how callers talk to any [`engine::Engine`]: paged result reads,
//! typed options and orderly shutdown.

pub mod app;
pub mod core;
pub mod engine;
pub mod error;
pub mod options;
pub mod session;

pub use crate::engine::{Engine, EngineConfig, LocalEngine, PAGE_SIZE};
pub use crate::error::{EngineError, EngineResult, OptionsError, SessionError, SessionResult};
pub use crate::options::CoreOptions;
pub use crate::session::{EngineSession, Progress, StatusPoller};
