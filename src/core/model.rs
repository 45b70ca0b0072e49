use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImageType {
    None,
    Bmp,
    Gif,
    Jpeg,
    Png,
    Tiff,
    Tga,
    Icon,
    Dds,
    Webp,
}

impl ImageType {
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "bmp" => ImageType::Bmp,
            "gif" => ImageType::Gif,
            "jpg" | "jpeg" | "jpe" | "jfif" => ImageType::Jpeg,
            "png" => ImageType::Png,
            "tif" | "tiff" => ImageType::Tiff,
            "tga" => ImageType::Tga,
            "ico" => ImageType::Icon,
            "dds" => ImageType::Dds,
            "webp" => ImageType::Webp,
            _ => ImageType::None,
        }
    }

    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(Self::from_extension)
            .unwrap_or(ImageType::None)
    }
}

/// Subset of EXIF tags reported for an image.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExifInfo {
    pub image_description: Option<String>,
    pub equip_make: Option<String>,
    pub equip_model: Option<String>,
    pub software_used: Option<String>,
    pub date_time: Option<String>,
    pub artist: Option<String>,
    pub user_comment: Option<String>,
}

impl ExifInfo {
    pub fn is_empty(&self) -> bool {
        self == &ExifInfo::default()
    }
}

/// Snapshot of one image as reported by the engine. Never mutated in place:
/// a changed file shows up as a new record on the next fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageInfo {
    pub id: u64,
    pub path: PathBuf,
    pub size: u64,
    pub time: DateTime<Utc>,
    pub image_type: ImageType,
    pub width: u32,
    pub height: u32,
    pub blockiness: f64,
    pub blurring: f64,
    pub exif: Option<ExifInfo>,
}

impl ImageInfo {
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DefectType {
    None,
    Unknown,
    JpegEndMarkerAbsent,
    Blockiness,
    Blurring,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HintType {
    None,
    DeleteFirst,
    DeleteSecond,
    RenameFirstToSecond,
    RenameSecondToFirst,
}

/// Geometric relation of the second image to the first: four rotations, optionally mirrored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransformType {
    Turn0,
    Turn90,
    Turn180,
    Turn270,
    MirrorTurn0,
    MirrorTurn90,
    MirrorTurn180,
    MirrorTurn270,
}

impl TransformType {
    pub const ALL: [TransformType; 8] = [
        TransformType::Turn0,
        TransformType::Turn90,
        TransformType::Turn180,
        TransformType::Turn270,
        TransformType::MirrorTurn0,
        TransformType::MirrorTurn90,
        TransformType::MirrorTurn180,
        TransformType::MirrorTurn270,
    ];

    pub fn quarter_turns(self) -> usize {
        match self {
            TransformType::Turn0 | TransformType::MirrorTurn0 => 0,
            TransformType::Turn90 | TransformType::MirrorTurn90 => 1,
            TransformType::Turn180 | TransformType::MirrorTurn180 => 2,
            TransformType::Turn270 | TransformType::MirrorTurn270 => 3,
        }
    }

    pub fn is_mirrored(self) -> bool {
        matches!(
            self,
            TransformType::MirrorTurn0
                | TransformType::MirrorTurn90
                | TransformType::MirrorTurn180
                | TransformType::MirrorTurn270
        )
    }

    /// Whether width and height swap under this transform.
    pub fn swaps_axes(self) -> bool {
        self.quarter_turns() % 2 == 1
    }
}

/// Group ids are only meaningful for the result set that produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupId(pub u64);

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub size: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefectRecord {
    pub image: ImageInfo,
    pub defect: DefectType,
    pub hint: HintType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplPair {
    pub first: ImageInfo,
    pub second: ImageInfo,
    pub difference: f64,
    pub transform: TransformType,
    pub group: GroupId,
    pub hint: HintType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResultType {
    Defect,
    DuplPair,
}

/// One entry of the result set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ResultRecord {
    Defect(DefectRecord),
    DuplPair(DuplPair),
}

impl ResultRecord {
    pub fn kind(&self) -> ResultType {
        match self {
            ResultRecord::Defect(_) => ResultType::Defect,
            ResultRecord::DuplPair(_) => ResultType::DuplPair,
        }
    }

    pub fn hint(&self) -> HintType {
        match self {
            ResultRecord::Defect(d) => d.hint,
            ResultRecord::DuplPair(p) => p.hint,
        }
    }

    pub fn set_hint(&mut self, hint: HintType) {
        match self {
            ResultRecord::Defect(d) => d.hint = hint,
            ResultRecord::DuplPair(p) => p.hint = hint,
        }
    }

    pub fn first(&self) -> &ImageInfo {
        match self {
            ResultRecord::Defect(d) => &d.image,
            ResultRecord::DuplPair(p) => &p.first,
        }
    }

    pub fn second(&self) -> Option<&ImageInfo> {
        match self {
            ResultRecord::Defect(_) => None,
            ResultRecord::DuplPair(p) => Some(&p.second),
        }
    }

    pub fn images(&self) -> impl Iterator<Item = &ImageInfo> {
        std::iter::once(self.first()).chain(self.second())
    }

    pub fn group(&self) -> Option<GroupId> {
        match self {
            ResultRecord::Defect(_) => None,
            ResultRecord::DuplPair(p) => Some(p.group),
        }
    }

    pub fn references(&self, path: &Path) -> bool {
        self.images().any(|image| image.path == path)
    }
}
