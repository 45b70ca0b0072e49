use super::exif::read_exif;
use super::metrics::{self, Fingerprint};
use super::status::StatusBoard;
use crate::core::{DefectType, ImageInfo, ImageType, StateType, ThreadType};
use crate::options::CoreOptions;
use chrono::{DateTime, Utc};
use image::ImageReader;
use rayon::prelude::*;
use std::collections::HashSet;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

#[derive(Debug, Error)]
pub enum CollectError {
    #[error("Thread pool error: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

/// A discovered file and the search path that reached it.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub path: PathBuf,
    pub root: usize,
}

/// One collected image with everything the compare stage needs.
#[derive(Debug, Clone)]
pub struct Collected {
    pub info: ImageInfo,
    pub root: usize,
    pub digest: [u8; 32],
    pub fingerprint: Option<Fingerprint>,
    pub defect: DefectType,
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .map(|name| name.starts_with('.'))
            .unwrap_or(false)
}

pub struct Collector<'a> {
    options: &'a CoreOptions,
    status: &'a StatusBoard,
    stop: &'a AtomicBool,
    /// Next image id; owned by the engine so ids restart with it.
    ids: &'a AtomicU64,
}

impl<'a> Collector<'a> {
    pub fn new(
        options: &'a CoreOptions,
        status: &'a StatusBoard,
        stop: &'a AtomicBool,
        ids: &'a AtomicU64,
    ) -> Self {
        Self {
            options,
            status,
            stop,
            ids,
        }
    }

    fn stopped(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }

    fn ignored(&self, path: &Path) -> bool {
        self.options.ignore_paths.iter().any(|e| e.contains(path))
    }

    /// Walk every search path and list the image files to collect.
    pub fn discover(&self) -> Vec<Candidate> {
        let mut seen = HashSet::new();
        let mut found = Vec::new();

        for (root, entry) in self.options.search_paths.iter().enumerate() {
            if !entry.path.exists() {
                log::warn!("Search path does not exist: {}", entry.path.display());
                continue;
            }
            let depth = if entry.enable_sub_folder { usize::MAX } else { 1 };
            let walker = WalkDir::new(&entry.path)
                .max_depth(depth)
                .follow_links(false)
                .into_iter()
                .filter_entry(|e| {
                    !self.ignored(e.path()) && (self.options.search.hidden || !is_hidden(e))
                });

            for dir_entry in walker {
                if self.stopped() {
                    return found;
                }
                let dir_entry = match dir_entry {
                    Ok(e) => e,
                    Err(e) => {
                        log::warn!("Failed to read directory entry: {}", e);
                        continue;
                    }
                };
                if !dir_entry.file_type().is_file() {
                    continue;
                }
                let path = dir_entry.into_path();
                let image_type = ImageType::from_path(&path);
                if image_type == ImageType::None || !self.options.search.accepts(image_type) {
                    continue;
                }
                if seen.insert(path.clone()) {
                    self.status.progress(Some(&path), found.len() + 1, 0);
                    found.push(Candidate { path, root });
                }
            }
        }

        log::info!("Discovered {} image files", found.len());
        found
    }

    /// Decode and measure every candidate on the collect pool. Stops early,
    /// keeping what was already collected, when the stop flag is raised.
    pub fn collect(&self, candidates: &[Candidate]) -> Result<Vec<Collected>, CollectError> {
        let threads = self.options.advanced.collect_threads();
        let pool = rayon::ThreadPoolBuilder::new().num_threads(threads).build()?;
        let total = candidates.len();
        let done = AtomicUsize::new(0);

        self.status
            .open_workers(ThreadType::Collect, threads, StateType::Search);
        let collected = pool.install(|| {
            candidates
                .par_iter()
                .filter_map(|candidate| {
                    if self.stopped() {
                        return None;
                    }
                    let worker = rayon::current_thread_index().unwrap_or(0);
                    let n = done.fetch_add(1, Ordering::Relaxed) + 1;
                    self.status
                        .worker_progress(ThreadType::Collect, worker, &candidate.path, n, total);
                    self.status.progress(Some(&candidate.path), n, total);
                    self.process(candidate)
                })
                .collect::<Vec<_>>()
        });
        self.status.close_workers(ThreadType::Collect);

        Ok(collected)
    }

    fn process(&self, candidate: &Candidate) -> Option<Collected> {
        let path = &candidate.path;
        let meta = match fs::metadata(path) {
            Ok(meta) => meta,
            Err(e) => {
                log::warn!("Failed to stat {}: {}", path.display(), e);
                return None;
            }
        };
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                log::warn!("Failed to read {}: {}", path.display(), e);
                return None;
            }
        };

        let image_type = ImageType::from_path(path);
        let time = meta
            .modified()
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now());
        let mut info = ImageInfo {
            id: self.ids.fetch_add(1, Ordering::Relaxed),
            path: path.clone(),
            size: meta.len(),
            time,
            image_type,
            width: 0,
            height: 0,
            blockiness: 0.0,
            blurring: 0.0,
            exif: read_exif(&bytes),
        };
        let digest = *blake3::hash(&bytes).as_bytes();

        let decoded = ImageReader::new(Cursor::new(&bytes))
            .with_guessed_format()
            .map_err(image::ImageError::IoError)
            .and_then(|reader| reader.decode());

        let defects = &self.options.defect;
        let (fingerprint, mut defect) = match decoded {
            Ok(img) => {
                let gray = img.to_luma8();
                info.width = gray.width();
                info.height = gray.height();
                info.blockiness = metrics::blockiness(&gray);
                info.blurring = metrics::blurring(&gray);
                let advanced = &self.options.advanced;
                let fp = Fingerprint::from_gray(
                    &gray,
                    advanced.reduced_image_size.max(1) as u32,
                    advanced.ignore_frame_width.max(0) as u32,
                );
                (Some(fp), DefectType::None)
            }
            Err(e) => {
                log::debug!("Failed to decode {}: {}", path.display(), e);
                (None, DefectType::Unknown)
            }
        };

        if defect == DefectType::None
            && image_type == ImageType::Jpeg
            && !metrics::has_jpeg_end_marker(&bytes)
        {
            defect = DefectType::JpegEndMarkerAbsent;
        }
        if defect == DefectType::None
            && defects.check_on_blockiness
            && !(defects.check_on_blockiness_only_not_jpeg && image_type == ImageType::Jpeg)
            && info.blockiness > defects.blockiness_threshold as f64
        {
            defect = DefectType::Blockiness;
        }
        if defect == DefectType::None
            && defects.check_on_blurring
            && info.blurring > defects.blurring_threshold as f64
        {
            defect = DefectType::Blurring;
        }
        if matches!(defect, DefectType::Unknown | DefectType::JpegEndMarkerAbsent)
            && !defects.check_on_defect
        {
            defect = DefectType::None;
        }

        Some(Collected {
            info,
            root: candidate.root,
            digest,
            fingerprint,
            defect,
        })
    }
}
