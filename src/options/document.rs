use super::{
    AdvancedOptions, CompareOptions, CoreOptions, DefectOptions, PathEntry, SearchOptions,
};
use crate::error::OptionsError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DOCUMENT_VERSION: u32 = 2;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename = "AntiDuplOptions")]
struct OptionsDocument {
    #[serde(rename = "@version")]
    version: u32,
    search: SearchOptions,
    compare: CompareOptions,
    defect: DefectOptions,
    advanced: AdvancedOptions,
    #[serde(default)]
    search_paths: PathsElement,
    #[serde(default)]
    ignore_paths: PathsElement,
    #[serde(default)]
    valid_paths: PathsElement,
    #[serde(default)]
    delete_paths: PathsElement,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct PathsElement {
    #[serde(default, rename = "entry")]
    entries: Vec<PathEntry>,
}

impl From<Vec<PathEntry>> for PathsElement {
    fn from(entries: Vec<PathEntry>) -> Self {
        Self { entries }
    }
}

impl From<&CoreOptions> for OptionsDocument {
    fn from(options: &CoreOptions) -> Self {
        Self {
            version: DOCUMENT_VERSION,
            search: options.search.clone(),
            compare: options.compare.clone(),
            defect: options.defect.clone(),
            advanced: options.advanced.clone(),
            search_paths: options.search_paths.clone().into(),
            ignore_paths: options.ignore_paths.clone().into(),
            valid_paths: options.valid_paths.clone().into(),
            delete_paths: options.delete_paths.clone().into(),
        }
    }
}

impl TryFrom<OptionsDocument> for CoreOptions {
    type Error = OptionsError;

    fn try_from(doc: OptionsDocument) -> Result<Self, Self::Error> {
        if doc.version != DOCUMENT_VERSION {
            return Err(OptionsError::Version(doc.version));
        }
        if doc.search_paths.entries.is_empty() {
            return Err(OptionsError::LastSearchPath);
        }
        Ok(CoreOptions {
            search: doc.search,
            compare: doc.compare,
            defect: doc.defect,
            advanced: doc.advanced,
            search_paths: doc.search_paths.entries,
            ignore_paths: doc.ignore_paths.entries,
            valid_paths: doc.valid_paths.entries,
            delete_paths: doc.delete_paths.entries,
        })
    }
}

pub fn to_xml(options: &CoreOptions) -> Result<String, OptionsError> {
    Ok(quick_xml::se::to_string(&OptionsDocument::from(options))?)
}

pub fn from_xml(text: &str) -> Result<CoreOptions, OptionsError> {
    let doc: OptionsDocument = quick_xml::de::from_str(text)?;
    CoreOptions::try_from(doc)
}

pub fn load(path: &Path) -> Result<CoreOptions, OptionsError> {
    let text = fs::read_to_string(path).map_err(|source| OptionsError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    from_xml(&text)
}

/// Load the document at `path`, falling back to `defaults` on any failure.
///
/// A missing, unreadable, truncated or outdated file is never an error for
/// the caller; the reason is only logged.
pub fn load_or_else<F>(path: &Path, defaults: F) -> CoreOptions
where
    F: FnOnce() -> CoreOptions,
{
    match load(path) {
        Ok(options) => options,
        Err(OptionsError::Io { source, .. }) if source.kind() == std::io::ErrorKind::NotFound => {
            log::info!("No options file at {}, using defaults", path.display());
            defaults()
        }
        Err(e) => {
            log::warn!(
                "Failed to load options from {}: {}; using defaults",
                path.display(),
                e
            );
            defaults()
        }
    }
}

/// Write the document next to `path` and rename it into place.
pub fn save(options: &CoreOptions, path: &Path) -> Result<(), OptionsError> {
    let xml = to_xml(options)?;
    let io_err = |source| OptionsError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    let tmp = path.with_extension("xml.tmp");
    fs::write(&tmp, xml).map_err(io_err)?;
    fs::rename(&tmp, path).map_err(io_err)?;
    Ok(())
}

/// Named option sets stored as `<dir>/<name>.xml`.
pub struct ProfileStore {
    dir: PathBuf,
}

impl ProfileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn profile_path(&self, name: &str) -> Result<PathBuf, OptionsError> {
        let valid = !name.is_empty()
            && !name.starts_with('.')
            && !name.contains(['/', '\\', ':'])
            && name.len() <= 255;
        if !valid {
            return Err(OptionsError::ProfileName(name.to_string()));
        }
        Ok(self.dir.join(format!("{}.xml", name)))
    }

    pub fn list(&self) -> Result<Vec<String>, OptionsError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(OptionsError::Io {
                    path: self.dir.clone(),
                    source,
                })
            }
        };

        let mut names: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().and_then(|e| e.to_str()) == Some("xml"))
            .filter_map(|path| {
                path.file_stem()
                    .and_then(|stem| stem.to_str())
                    .map(str::to_string)
            })
            .collect();
        names.sort();
        Ok(names)
    }

    pub fn save(&self, name: &str, options: &CoreOptions) -> Result<(), OptionsError> {
        save(options, &self.profile_path(name)?)
    }

    pub fn load(&self, name: &str) -> Result<CoreOptions, OptionsError> {
        load(&self.profile_path(name)?)
    }

    pub fn remove(&self, name: &str) -> Result<(), OptionsError> {
        let path = self.profile_path(name)?;
        fs::remove_file(&path).map_err(|source| OptionsError::Io { path, source })
    }
}
