use super::flat::{flag, unflag, FlatOptions, OptionsType};
use crate::core::ImageType;
use crate::error::OptionsError;
use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

/// Which files the collect stage picks up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchOptions {
    pub hidden: bool,
    pub jpeg: bool,
    pub bmp: bool,
    pub gif: bool,
    pub png: bool,
    pub tiff: bool,
    pub tga: bool,
    pub icon: bool,
    pub dds: bool,
    pub webp: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            hidden: false,
            jpeg: true,
            bmp: true,
            gif: true,
            png: true,
            tiff: true,
            tga: true,
            icon: true,
            dds: true,
            webp: true,
        }
    }
}

impl SearchOptions {
    pub fn accepts(&self, image_type: ImageType) -> bool {
        match image_type {
            ImageType::None => false,
            ImageType::Jpeg => self.jpeg,
            ImageType::Bmp => self.bmp,
            ImageType::Gif => self.gif,
            ImageType::Png => self.png,
            ImageType::Tiff => self.tiff,
            ImageType::Tga => self.tga,
            ImageType::Icon => self.icon,
            ImageType::Dds => self.dds,
            ImageType::Webp => self.webp,
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct FlatSearchOptions {
    pub hidden: i32,
    pub jpeg: i32,
    pub bmp: i32,
    pub gif: i32,
    pub png: i32,
    pub tiff: i32,
    pub tga: i32,
    pub icon: i32,
    pub dds: i32,
    pub webp: i32,
}

impl FlatOptions for SearchOptions {
    const KIND: OptionsType = OptionsType::Search;
    type Flat = FlatSearchOptions;

    fn to_flat(&self) -> FlatSearchOptions {
        FlatSearchOptions {
            hidden: flag(self.hidden),
            jpeg: flag(self.jpeg),
            bmp: flag(self.bmp),
            gif: flag(self.gif),
            png: flag(self.png),
            tiff: flag(self.tiff),
            tga: flag(self.tga),
            icon: flag(self.icon),
            dds: flag(self.dds),
            webp: flag(self.webp),
        }
    }

    fn from_flat(flat: &FlatSearchOptions) -> Result<Self, OptionsError> {
        Ok(Self {
            hidden: unflag("hidden", flat.hidden)?,
            jpeg: unflag("jpeg", flat.jpeg)?,
            bmp: unflag("bmp", flat.bmp)?,
            gif: unflag("gif", flat.gif)?,
            png: unflag("png", flat.png)?,
            tiff: unflag("tiff", flat.tiff)?,
            tga: unflag("tga", flat.tga)?,
            icon: unflag("icon", flat.icon)?,
            dds: unflag("dds", flat.dds)?,
            webp: unflag("webp", flat.webp)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_round_trip() {
        let mut options = SearchOptions::default();
        options.hidden = true;
        options.gif = false;

        let bytes = options.to_bytes();
        assert_eq!(bytes.len(), 10 * 4);
        assert_eq!(SearchOptions::from_bytes(&bytes).unwrap(), options);
    }

    #[test]
    fn test_non_binary_flag_is_rejected() {
        let mut flat = SearchOptions::default().to_flat();
        flat.png = 2;
        assert!(matches!(
            SearchOptions::from_flat(&flat),
            Err(OptionsError::FlatValue { field: "png", .. })
        ));
    }

    #[test]
    fn test_accepts_by_type() {
        let options = SearchOptions {
            webp: false,
            ..SearchOptions::default()
        };
        assert!(options.accepts(ImageType::Jpeg));
        assert!(!options.accepts(ImageType::Webp));
        assert!(!options.accepts(ImageType::None));
    }
}
