use super::flat::{flag, unflag, FlatOptions, OptionsType};
use crate::error::OptionsError;
use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvancedOptions {
    /// Remember pairs marked as mistakes and skip them on later searches.
    pub mistake_database: bool,
    pub ratio_resolution: i32,
    pub compare_thread_count: i32,
    pub collect_thread_count: i32,
    /// Side of the square fingerprint images are reduced to.
    pub reduced_image_size: i32,
    pub undo_queue_size: i32,
    pub result_count_max: i32,
    /// Border trimmed from each side before fingerprinting, in percent.
    pub ignore_frame_width: i32,
}

impl Default for AdvancedOptions {
    fn default() -> Self {
        let threads = num_cpus::get().min(256) as i32;
        Self {
            mistake_database: true,
            ratio_resolution: 32,
            compare_thread_count: threads,
            collect_thread_count: threads,
            reduced_image_size: 32,
            undo_queue_size: 10,
            result_count_max: 100_000,
            ignore_frame_width: 0,
        }
    }
}

impl AdvancedOptions {
    pub fn compare_threads(&self) -> usize {
        Self::threads(self.compare_thread_count)
    }

    pub fn collect_threads(&self) -> usize {
        Self::threads(self.collect_thread_count)
    }

    fn threads(count: i32) -> usize {
        if count > 0 {
            count as usize
        } else {
            num_cpus::get()
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct FlatAdvancedOptions {
    pub mistake_database: i32,
    pub ratio_resolution: i32,
    pub compare_thread_count: i32,
    pub collect_thread_count: i32,
    pub reduced_image_size: i32,
    pub undo_queue_size: i32,
    pub result_count_max: i32,
    pub ignore_frame_width: i32,
}

impl FlatOptions for AdvancedOptions {
    const KIND: OptionsType = OptionsType::Advanced;
    type Flat = FlatAdvancedOptions;

    fn to_flat(&self) -> FlatAdvancedOptions {
        FlatAdvancedOptions {
            mistake_database: flag(self.mistake_database),
            ratio_resolution: self.ratio_resolution,
            compare_thread_count: self.compare_thread_count,
            collect_thread_count: self.collect_thread_count,
            reduced_image_size: self.reduced_image_size,
            undo_queue_size: self.undo_queue_size,
            result_count_max: self.result_count_max,
            ignore_frame_width: self.ignore_frame_width,
        }
    }

    fn from_flat(flat: &FlatAdvancedOptions) -> Result<Self, OptionsError> {
        Ok(Self {
            mistake_database: unflag("mistake_database", flat.mistake_database)?,
            ratio_resolution: flat.ratio_resolution,
            compare_thread_count: flat.compare_thread_count,
            collect_thread_count: flat.collect_thread_count,
            reduced_image_size: flat.reduced_image_size,
            undo_queue_size: flat.undo_queue_size,
            result_count_max: flat.result_count_max,
            ignore_frame_width: flat.ignore_frame_width,
        })
    }

    fn validate(&self) -> Result<(), OptionsError> {
        let checks = [
            ("ratio_resolution", self.ratio_resolution, 1, 1024),
            ("compare_thread_count", self.compare_thread_count, 0, 256),
            ("collect_thread_count", self.collect_thread_count, 0, 256),
            ("reduced_image_size", self.reduced_image_size, 8, 64),
            ("undo_queue_size", self.undo_queue_size, 0, 1000),
            ("result_count_max", self.result_count_max, 1, i32::MAX),
            ("ignore_frame_width", self.ignore_frame_width, 0, 12),
        ];
        for (field, value, min, max) in checks {
            if value < min || value > max {
                return Err(OptionsError::FlatValue { field, value });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_round_trip() {
        let options = AdvancedOptions {
            mistake_database: false,
            undo_queue_size: 3,
            ..AdvancedOptions::default()
        };
        assert_eq!(AdvancedOptions::from_bytes(&options.to_bytes()).unwrap(), options);
    }

    #[test]
    fn test_zero_threads_means_all_cores() {
        let options = AdvancedOptions {
            compare_thread_count: 0,
            collect_thread_count: 2,
            ..AdvancedOptions::default()
        };
        assert_eq!(options.compare_threads(), num_cpus::get());
        assert_eq!(options.collect_threads(), 2);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_reduced_size_range() {
        let options = AdvancedOptions {
            reduced_image_size: 4,
            ..AdvancedOptions::default()
        };
        assert!(options.validate().is_err());
    }
}
