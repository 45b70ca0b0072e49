use super::collect::{Collected, CollectError};
use super::metrics::{self, Fingerprint};
use super::status::StatusBoard;
use crate::core::{StateType, ThreadType, TransformType};
use crate::options::{AlgorithmComparing, CoreOptions};
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// A pair of collected images judged to be duplicates.
#[derive(Debug, Clone, PartialEq)]
pub struct Match {
    pub first: usize,
    pub second: usize,
    pub difference: f64,
    pub transform: TransformType,
}

pub struct Comparer<'a> {
    options: &'a CoreOptions,
    status: &'a StatusBoard,
    stop: &'a AtomicBool,
}

impl<'a> Comparer<'a> {
    pub fn new(options: &'a CoreOptions, status: &'a StatusBoard, stop: &'a AtomicBool) -> Self {
        Self {
            options,
            status,
            stop,
        }
    }

    fn in_size_range(&self, item: &Collected) -> bool {
        let compare = &self.options.compare;
        let (min, max) = (
            compare.minimal_image_size.max(0) as u32,
            compare.maximal_image_size.max(0) as u32,
        );
        let (w, h) = (item.info.width, item.info.height);
        w >= min && h >= min && w <= max && h <= max
    }

    /// Compare every eligible pair on the compare pool. Matches come back
    /// ordered by their first index, then second.
    pub fn compare(&self, items: &[Collected]) -> Result<Vec<Match>, CollectError> {
        let eligible: Vec<usize> = items
            .iter()
            .enumerate()
            .filter(|(_, item)| item.fingerprint.is_some() && self.in_size_range(item))
            .map(|(i, _)| i)
            .collect();

        let threads = self.options.advanced.compare_threads();
        let pool = rayon::ThreadPoolBuilder::new().num_threads(threads).build()?;
        let total = eligible.len();
        let done = AtomicUsize::new(0);

        self.status
            .open_workers(ThreadType::Compare, threads, StateType::Compare);
        self.status.set_state(StateType::Compare);
        let mut matches = pool.install(|| {
            (0..eligible.len())
                .into_par_iter()
                .flat_map_iter(|a| {
                    if self.stop.load(Ordering::Relaxed) {
                        return Vec::new();
                    }
                    let first = &items[eligible[a]];
                    let worker = rayon::current_thread_index().unwrap_or(0);
                    let n = done.fetch_add(1, Ordering::Relaxed) + 1;
                    self.status
                        .worker_progress(ThreadType::Compare, worker, &first.info.path, n, total);
                    self.status.progress(Some(&first.info.path), n, total);

                    eligible[a + 1..]
                        .iter()
                        .filter_map(|&b| {
                            self.match_pair(first, &items[b])
                                .map(|(difference, transform)| Match {
                                    first: eligible[a],
                                    second: b,
                                    difference,
                                    transform,
                                })
                        })
                        .collect::<Vec<_>>()
                })
                .collect::<Vec<_>>()
        });
        self.status.close_workers(ThreadType::Compare);

        matches.sort_by_key(|m| (m.first, m.second));
        log::info!("Found {} duplicate pairs among {} images", matches.len(), total);
        Ok(matches)
    }

    fn match_pair(&self, a: &Collected, b: &Collected) -> Option<(f64, TransformType)> {
        let compare = &self.options.compare;
        if !compare.compare_inside_one_folder && a.info.path.parent() == b.info.path.parent() {
            return None;
        }
        if !compare.compare_inside_one_search_path && a.root == b.root {
            return None;
        }
        if compare.type_control && a.info.image_type != b.info.image_type {
            return None;
        }
        if compare.check_on_equality {
            return (a.digest == b.digest).then_some((0.0, TransformType::Turn0));
        }

        let (fa, fb) = (a.fingerprint.as_ref()?, b.fingerprint.as_ref()?);
        let transforms: &[TransformType] = if compare.transformed_image {
            &TransformType::ALL
        } else {
            &[TransformType::Turn0]
        };

        transforms
            .iter()
            .filter(|t| self.geometry_matches(a, b, **t))
            .filter_map(|&t| self.difference(fa, &fb.transformed(t)).map(|d| (d, t)))
            .min_by(|x, y| x.0.total_cmp(&y.0))
    }

    fn geometry_matches(&self, a: &Collected, b: &Collected, transform: TransformType) -> bool {
        let compare = &self.options.compare;
        let (aw, ah) = (a.info.width, a.info.height);
        let (bw, bh) = if transform.swaps_axes() {
            (b.info.height, b.info.width)
        } else {
            (b.info.width, b.info.height)
        };
        if compare.size_control && (aw, ah) != (bw, bh) {
            return false;
        }
        if compare.ratio_control {
            let resolution = self.options.advanced.ratio_resolution.max(1) as f64;
            let ratio = |w: u32, h: u32| (w as f64 / h.max(1) as f64 * resolution).round();
            if ratio(aw, ah) != ratio(bw, bh) {
                return false;
            }
        }
        true
    }

    /// Difference in percent when the pair passes the configured threshold.
    fn difference(&self, a: &Fingerprint, b: &Fingerprint) -> Option<f64> {
        let compare = &self.options.compare;
        match compare.algorithm_comparing {
            AlgorithmComparing::SquaredSum => {
                let d = metrics::rms_difference(a, b);
                (d <= compare.threshold_difference as f64).then_some(d)
            }
            AlgorithmComparing::Ssim => {
                let s = metrics::ssim(a, b);
                (s >= compare.ssim_threshold).then_some((1.0 - s) * 100.0)
            }
        }
    }
}
