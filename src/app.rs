use crate::engine::EngineConfig;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Per-user directory holding options, profiles, results and the engine's
/// own files.
#[derive(Debug, Clone)]
pub struct UserData {
    dir: PathBuf,
}

impl UserData {
    /// `explicit` wins; otherwise `<platform data dir>/AntiDupl`.
    pub fn resolve(explicit: Option<PathBuf>) -> Self {
        let dir = explicit.unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("AntiDupl")
        });
        Self { dir }
    }

    pub fn ensure(&self) -> io::Result<()> {
        fs::create_dir_all(&self.dir)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn options_file(&self) -> PathBuf {
        self.dir.join("options.xml")
    }

    pub fn profiles_dir(&self) -> PathBuf {
        self.dir.join("profiles")
    }

    pub fn results_file(&self) -> PathBuf {
        self.dir.join("results.adr")
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig::in_dir(&self.dir)
    }
}
