use super::flat::{flag, unflag, FlatOptions, OptionsType};
use crate::error::OptionsError;
use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefectOptions {
    /// Undecodable files and JPEGs without an end marker.
    pub check_on_defect: bool,
    pub check_on_blockiness: bool,
    pub blockiness_threshold: i32,
    pub check_on_blockiness_only_not_jpeg: bool,
    pub check_on_blurring: bool,
    pub blurring_threshold: i32,
}

impl Default for DefectOptions {
    fn default() -> Self {
        Self {
            check_on_defect: true,
            check_on_blockiness: false,
            blockiness_threshold: 10,
            check_on_blockiness_only_not_jpeg: false,
            check_on_blurring: false,
            blurring_threshold: 32,
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct FlatDefectOptions {
    pub check_on_defect: i32,
    pub check_on_blockiness: i32,
    pub blockiness_threshold: i32,
    pub check_on_blockiness_only_not_jpeg: i32,
    pub check_on_blurring: i32,
    pub blurring_threshold: i32,
}

impl FlatOptions for DefectOptions {
    const KIND: OptionsType = OptionsType::Defect;
    type Flat = FlatDefectOptions;

    fn to_flat(&self) -> FlatDefectOptions {
        FlatDefectOptions {
            check_on_defect: flag(self.check_on_defect),
            check_on_blockiness: flag(self.check_on_blockiness),
            blockiness_threshold: self.blockiness_threshold,
            check_on_blockiness_only_not_jpeg: flag(self.check_on_blockiness_only_not_jpeg),
            check_on_blurring: flag(self.check_on_blurring),
            blurring_threshold: self.blurring_threshold,
        }
    }

    fn from_flat(flat: &FlatDefectOptions) -> Result<Self, OptionsError> {
        Ok(Self {
            check_on_defect: unflag("check_on_defect", flat.check_on_defect)?,
            check_on_blockiness: unflag("check_on_blockiness", flat.check_on_blockiness)?,
            blockiness_threshold: flat.blockiness_threshold,
            check_on_blockiness_only_not_jpeg: unflag(
                "check_on_blockiness_only_not_jpeg",
                flat.check_on_blockiness_only_not_jpeg,
            )?,
            check_on_blurring: unflag("check_on_blurring", flat.check_on_blurring)?,
            blurring_threshold: flat.blurring_threshold,
        })
    }

    fn validate(&self) -> Result<(), OptionsError> {
        for (field, value) in [
            ("blockiness_threshold", self.blockiness_threshold),
            ("blurring_threshold", self.blurring_threshold),
        ] {
            if !(0..=100).contains(&value) {
                return Err(OptionsError::FlatValue { field, value });
            }
        }
        Ok(())
    }
}
