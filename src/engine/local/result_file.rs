use super::history::History;
use crate::core::ResultRecord;
use crate::error::{EngineError, EngineResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;

pub const RESULT_FILE_VERSION: u32 = 1;

/// On-disk form of a result set (`.adr`).
#[derive(Debug, Serialize, Deserialize)]
pub struct ResultFile {
    pub version: u32,
    pub saved_at: DateTime<Utc>,
    pub results: Vec<ResultRecord>,
    #[serde(default)]
    pub history: History,
}

impl ResultFile {
    pub fn new(results: Vec<ResultRecord>, history: History) -> Self {
        Self {
            version: RESULT_FILE_VERSION,
            saved_at: Utc::now(),
            results,
            history,
        }
    }

    pub fn load(path: &Path) -> EngineResult<Self> {
        let text = fs::read_to_string(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => EngineError::FileIsNotExists,
            _ => EngineError::CantReadFile,
        })?;
        let file: ResultFile = serde_json::from_str(&text).map_err(|e| {
            log::warn!("Invalid result file {}: {}", path.display(), e);
            EngineError::InvalidFileFormat
        })?;
        if file.version != RESULT_FILE_VERSION {
            log::warn!(
                "Result file {} has version {}, expected {}",
                path.display(),
                file.version,
                RESULT_FILE_VERSION
            );
            return Err(EngineError::InvalidFileFormat);
        }
        Ok(file)
    }

    /// Write to a sibling temp file, then rename over `path`.
    pub fn save(&self, path: &Path) -> EngineResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|_| EngineError::CantCreateFile)?;
        }
        let json = serde_json::to_string(self).map_err(|_| EngineError::Unknown)?;
        let tmp = path.with_extension("adr.tmp");
        fs::write(&tmp, json).map_err(|_| EngineError::CantWriteFile)?;
        fs::rename(&tmp, path).map_err(|_| EngineError::CantWriteFile)
    }
}
