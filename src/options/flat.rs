use crate::error::OptionsError;
use bytemuck::Pod;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Options categories exchanged with the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptionsType {
    Search,
    Compare,
    Defect,
    Advanced,
}

impl OptionsType {
    pub const ALL: [OptionsType; 4] = [
        OptionsType::Search,
        OptionsType::Compare,
        OptionsType::Defect,
        OptionsType::Advanced,
    ];

    pub fn name(self) -> &'static str {
        match self {
            OptionsType::Search => "search",
            OptionsType::Compare => "compare",
            OptionsType::Defect => "defect",
            OptionsType::Advanced => "advanced",
        }
    }
}

impl fmt::Display for OptionsType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An options record with a fixed-layout flat form used at the engine boundary.
///
/// Both directions go through the same `Flat` struct, so a field can't be
/// present on one side and silently missing on the other. Booleans travel as
/// `0`/`1` integers, enums as their discriminant.
pub trait FlatOptions: Sized + Clone + PartialEq + fmt::Debug {
    const KIND: OptionsType;
    type Flat: Pod;

    fn to_flat(&self) -> Self::Flat;

    fn from_flat(flat: &Self::Flat) -> Result<Self, OptionsError>;

    /// Range checks the engine applies before accepting a record.
    fn validate(&self) -> Result<(), OptionsError> {
        Ok(())
    }

    fn to_bytes(&self) -> Vec<u8> {
        bytemuck::bytes_of(&self.to_flat()).to_vec()
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self, OptionsError> {
        let expected = std::mem::size_of::<Self::Flat>();
        if bytes.len() != expected {
            return Err(OptionsError::FlatSize {
                kind: Self::KIND.name(),
                expected,
                got: bytes.len(),
            });
        }
        let flat: Self::Flat = bytemuck::pod_read_unaligned(bytes);
        Self::from_flat(&flat)
    }
}

pub(crate) fn flag(value: bool) -> i32 {
    i32::from(value)
}

pub(crate) fn unflag(field: &'static str, value: i32) -> Result<bool, OptionsError> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(OptionsError::FlatValue {
            field,
            value: other,
        }),
    }
}
