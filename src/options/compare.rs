use super::flat::{flag, unflag, FlatOptions, OptionsType};
use crate::error::OptionsError;
use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlgorithmComparing {
    SquaredSum,
    #[serde(rename = "SSIM")]
    Ssim,
}

impl AlgorithmComparing {
    fn code(self) -> i32 {
        match self {
            AlgorithmComparing::SquaredSum => 0,
            AlgorithmComparing::Ssim => 1,
        }
    }

    fn from_code(value: i32) -> Result<Self, OptionsError> {
        match value {
            0 => Ok(AlgorithmComparing::SquaredSum),
            1 => Ok(AlgorithmComparing::Ssim),
            other => Err(OptionsError::FlatValue {
                field: "algorithm_comparing",
                value: other,
            }),
        }
    }
}

/// How two collected images are compared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompareOptions {
    /// Report byte-identical files only.
    pub check_on_equality: bool,
    /// Also try the seven rotated/mirrored orientations.
    pub transformed_image: bool,
    pub size_control: bool,
    pub type_control: bool,
    pub ratio_control: bool,
    /// Maximal accepted difference in percent for `SquaredSum`.
    pub threshold_difference: i32,
    pub minimal_image_size: i32,
    pub maximal_image_size: i32,
    pub compare_inside_one_folder: bool,
    pub compare_inside_one_search_path: bool,
    pub algorithm_comparing: AlgorithmComparing,
    /// Minimal accepted similarity for `Ssim`, in `[0, 1]`.
    pub ssim_threshold: f64,
}

impl Default for CompareOptions {
    fn default() -> Self {
        Self {
            check_on_equality: false,
            transformed_image: false,
            size_control: false,
            type_control: false,
            ratio_control: false,
            threshold_difference: 5,
            minimal_image_size: 64,
            maximal_image_size: 8192,
            compare_inside_one_folder: true,
            compare_inside_one_search_path: true,
            algorithm_comparing: AlgorithmComparing::SquaredSum,
            ssim_threshold: 0.95,
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct FlatCompareOptions {
    pub ssim_threshold: f64,
    pub check_on_equality: i32,
    pub transformed_image: i32,
    pub size_control: i32,
    pub type_control: i32,
    pub ratio_control: i32,
    pub threshold_difference: i32,
    pub minimal_image_size: i32,
    pub maximal_image_size: i32,
    pub compare_inside_one_folder: i32,
    pub compare_inside_one_search_path: i32,
    pub algorithm_comparing: i32,
    pub reserved: i32,
}

impl FlatOptions for CompareOptions {
    const KIND: OptionsType = OptionsType::Compare;
    type Flat = FlatCompareOptions;

    fn to_flat(&self) -> FlatCompareOptions {
        FlatCompareOptions {
            ssim_threshold: self.ssim_threshold,
            check_on_equality: flag(self.check_on_equality),
            transformed_image: flag(self.transformed_image),
            size_control: flag(self.size_control),
            type_control: flag(self.type_control),
            ratio_control: flag(self.ratio_control),
            threshold_difference: self.threshold_difference,
            minimal_image_size: self.minimal_image_size,
            maximal_image_size: self.maximal_image_size,
            compare_inside_one_folder: flag(self.compare_inside_one_folder),
            compare_inside_one_search_path: flag(self.compare_inside_one_search_path),
            algorithm_comparing: self.algorithm_comparing.code(),
            reserved: 0,
        }
    }

    fn from_flat(flat: &FlatCompareOptions) -> Result<Self, OptionsError> {
        Ok(Self {
            check_on_equality: unflag("check_on_equality", flat.check_on_equality)?,
            transformed_image: unflag("transformed_image", flat.transformed_image)?,
            size_control: unflag("size_control", flat.size_control)?,
            type_control: unflag("type_control", flat.type_control)?,
            ratio_control: unflag("ratio_control", flat.ratio_control)?,
            threshold_difference: flat.threshold_difference,
            minimal_image_size: flat.minimal_image_size,
            maximal_image_size: flat.maximal_image_size,
            compare_inside_one_folder: unflag(
                "compare_inside_one_folder",
                flat.compare_inside_one_folder,
            )?,
            compare_inside_one_search_path: unflag(
                "compare_inside_one_search_path",
                flat.compare_inside_one_search_path,
            )?,
            algorithm_comparing: AlgorithmComparing::from_code(flat.algorithm_comparing)?,
            ssim_threshold: flat.ssim_threshold,
        })
    }

    fn validate(&self) -> Result<(), OptionsError> {
        if !(0..=100).contains(&self.threshold_difference) {
            return Err(OptionsError::FlatValue {
                field: "threshold_difference",
                value: self.threshold_difference,
            });
        }
        if self.minimal_image_size < 0 || self.minimal_image_size > self.maximal_image_size {
            return Err(OptionsError::FlatValue {
                field: "minimal_image_size",
                value: self.minimal_image_size,
            });
        }
        if !(0.0..=1.0).contains(&self.ssim_threshold) {
            return Err(OptionsError::FlatValue {
                field: "ssim_threshold",
                value: (self.ssim_threshold * 100.0) as i32,
            });
        }
        Ok(())
    }
}
