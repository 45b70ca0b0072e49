//! Pixel metrics over grayscale images and reduced fingerprints.

use crate::core::TransformType;
use image::imageops::{self, FilterType};
use image::GrayImage;

const BLOCK: u32 = 8;

/// Square grayscale thumbnail used for perceptual comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct Fingerprint {
    side: usize,
    pixels: Vec<u8>,
}

impl Fingerprint {
    /// Reduce `gray` to `side`², after trimming `frame_percent` of each
    /// dimension from every edge.
    pub fn from_gray(gray: &GrayImage, side: u32, frame_percent: u32) -> Self {
        let (width, height) = gray.dimensions();
        let dx = width * frame_percent / 100;
        let dy = height * frame_percent / 100;
        let inner_w = width.saturating_sub(2 * dx).max(1);
        let inner_h = height.saturating_sub(2 * dy).max(1);
        let trimmed = imageops::crop_imm(gray, dx, dy, inner_w, inner_h).to_image();
        let reduced = imageops::resize(&trimmed, side, side, FilterType::Triangle);
        Self {
            side: side as usize,
            pixels: reduced.into_raw(),
        }
    }

    #[cfg(test)]
    pub fn from_pixels(side: usize, pixels: Vec<u8>) -> Option<Self> {
        (pixels.len() == side * side).then_some(Self { side, pixels })
    }

    #[cfg(test)]
    pub fn side(&self) -> usize {
        self.side
    }

    #[cfg(test)]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// The fingerprint as seen through `transform`.
    pub fn transformed(&self, transform: TransformType) -> Fingerprint {
        if transform == TransformType::Turn0 {
            return self.clone();
        }
        let n = self.side;
        let mut pixels = Vec::with_capacity(self.pixels.len());
        for y in 0..n {
            for x in 0..n {
                let (mut sx, mut sy) = (x, y);
                for _ in 0..transform.quarter_turns() {
                    (sx, sy) = (sy, n - 1 - sx);
                }
                if transform.is_mirrored() {
                    sx = n - 1 - sx;
                }
                pixels.push(self.pixels[sy * n + sx]);
            }
        }
        Fingerprint { side: n, pixels }
    }
}

/// Root mean square pixel difference, as a percentage of full scale.
pub fn rms_difference(a: &Fingerprint, b: &Fingerprint) -> f64 {
    if a.pixels.is_empty() || a.pixels.len() != b.pixels.len() {
        return 100.0;
    }
    let sum: f64 = a
        .pixels
        .iter()
        .zip(&b.pixels)
        .map(|(&p, &q)| {
            let d = p as f64 - q as f64;
            d * d
        })
        .sum();
    (sum / a.pixels.len() as f64).sqrt() / 255.0 * 100.0
}

/// Global structural similarity in `[-1, 1]`; identical inputs give 1.
pub fn ssim(a: &Fingerprint, b: &Fingerprint) -> f64 {
    if a.pixels.is_empty() || a.pixels.len() != b.pixels.len() {
        return 0.0;
    }
    const C1: f64 = (0.01 * 255.0) * (0.01 * 255.0);
    const C2: f64 = (0.03 * 255.0) * (0.03 * 255.0);

    let n = a.pixels.len() as f64;
    let mean_a = a.pixels.iter().map(|&p| p as f64).sum::<f64>() / n;
    let mean_b = b.pixels.iter().map(|&p| p as f64).sum::<f64>() / n;
    let (mut var_a, mut var_b, mut cov) = (0.0, 0.0, 0.0);
    for (&p, &q) in a.pixels.iter().zip(&b.pixels) {
        let da = p as f64 - mean_a;
        let db = q as f64 - mean_b;
        var_a += da * da;
        var_b += db * db;
        cov += da * db;
    }
    var_a /= n;
    var_b /= n;
    cov /= n;

    ((2.0 * mean_a * mean_b + C1) * (2.0 * cov + C2))
        / ((mean_a * mean_a + mean_b * mean_b + C1) * (var_a + var_b + C2))
}

/// How much stronger edges are on the 8×8 block grid than inside blocks,
/// from 0 (no block structure) to 100.
pub fn blockiness(gray: &GrayImage) -> f64 {
    let (width, height) = gray.dimensions();
    if width < 2 * BLOCK || height < 2 * BLOCK {
        return 0.0;
    }
    let (mut grid_sum, mut grid_n, mut inner_sum, mut inner_n) = (0.0, 0u64, 0.0, 0u64);
    for y in 0..height {
        for x in 0..width - 1 {
            let d = (gray.get_pixel(x, y)[0] as f64 - gray.get_pixel(x + 1, y)[0] as f64).abs();
            if (x + 1) % BLOCK == 0 {
                grid_sum += d;
                grid_n += 1;
            } else {
                inner_sum += d;
                inner_n += 1;
            }
        }
    }
    for y in 0..height - 1 {
        for x in 0..width {
            let d = (gray.get_pixel(x, y)[0] as f64 - gray.get_pixel(x, y + 1)[0] as f64).abs();
            if (y + 1) % BLOCK == 0 {
                grid_sum += d;
                grid_n += 1;
            } else {
                inner_sum += d;
                inner_n += 1;
            }
        }
    }
    let grid = grid_sum / grid_n.max(1) as f64;
    let inner = inner_sum / inner_n.max(1) as f64;
    if grid + inner == 0.0 {
        return 0.0;
    }
    ((grid - inner).max(0.0) / (grid + inner) * 100.0).min(100.0)
}

/// Lack of fine detail, from 0 (sharp) to 100 (flat), derived from the mean
/// absolute Laplacian.
pub fn blurring(gray: &GrayImage) -> f64 {
    let (width, height) = gray.dimensions();
    if width < 3 || height < 3 {
        return 0.0;
    }
    let at = |x: u32, y: u32| gray.get_pixel(x, y)[0] as f64;
    let mut sum = 0.0;
    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let laplacian =
                4.0 * at(x, y) - at(x - 1, y) - at(x + 1, y) - at(x, y - 1) - at(x, y + 1);
            sum += laplacian.abs();
        }
    }
    let mean = sum / ((width - 2) as f64 * (height - 2) as f64);
    100.0 / (1.0 + mean / 4.0)
}

/// JPEG streams must end with the EOI marker, allowing trailing padding.
pub fn has_jpeg_end_marker(bytes: &[u8]) -> bool {
    let trimmed = bytes
        .iter()
        .rposition(|&b| b != 0)
        .map(|last| &bytes[..=last])
        .unwrap_or(&[]);
    trimmed.ends_with(&[0xFF, 0xD9])
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn gradient(side: u32) -> GrayImage {
        GrayImage::from_fn(side, side, |x, y| Luma([((x * 7 + y * 3) % 256) as u8]))
    }

    fn print(side: usize) -> Fingerprint {
        Fingerprint::from_pixels(side, (0..side * side).map(|i| (i * 13 % 256) as u8).collect())
            .unwrap()
    }

    #[test]
    fn test_fingerprint_has_requested_side() {
        let fp = Fingerprint::from_gray(&gradient(100), 16, 5);
        assert_eq!(fp.side(), 16);
        assert_eq!(fp.pixels().len(), 256);
    }

    #[test]
    fn test_identical_fingerprints() {
        let fp = print(8);
        assert_eq!(rms_difference(&fp, &fp), 0.0);
        assert!((ssim(&fp, &fp) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_inverted_fingerprint_is_far() {
        let fp = print(8);
        let inverted =
            Fingerprint::from_pixels(8, fp.pixels().iter().map(|p| 255 - p).collect()).unwrap();
        assert!(rms_difference(&fp, &inverted) > 30.0);
        assert!(ssim(&fp, &inverted) < 0.0);
    }

    #[test]
    fn test_transforms_are_distinct_and_invertible() {
        let fp = print(4);
        let mut seen = Vec::new();
        for t in TransformType::ALL {
            let out = fp.transformed(t);
            assert!(!seen.contains(&out), "{:?} duplicates another transform", t);
            seen.push(out);
        }
        let twice = fp
            .transformed(TransformType::Turn180)
            .transformed(TransformType::Turn180);
        assert_eq!(twice, fp);
        let mirrored = fp
            .transformed(TransformType::MirrorTurn0)
            .transformed(TransformType::MirrorTurn0);
        assert_eq!(mirrored, fp);
    }

    #[test]
    fn test_flat_image_is_blurred_not_blocky() {
        let flat = GrayImage::from_pixel(32, 32, Luma([128]));
        assert_eq!(blurring(&flat), 100.0);
        assert_eq!(blockiness(&flat), 0.0);
    }

    #[test]
    fn test_block_grid_is_blocky() {
        let blocks = GrayImage::from_fn(64, 64, |x, y| {
            Luma([if (x / 8 + y / 8) % 2 == 0 { 40 } else { 200 }])
        });
        assert!(blockiness(&blocks) > 90.0);
    }

    #[test]
    fn test_noise_is_sharp() {
        let noisy = GrayImage::from_fn(32, 32, |x, y| Luma([if (x + y) % 2 == 0 { 0 } else { 255 }]));
        assert!(blurring(&noisy) < 5.0);
    }

    #[test]
    fn test_jpeg_end_marker() {
        assert!(has_jpeg_end_marker(&[0xFF, 0xD8, 0x00, 0xFF, 0xD9]));
        assert!(has_jpeg_end_marker(&[0xFF, 0xD8, 0xFF, 0xD9, 0x00, 0x00]));
        assert!(!has_jpeg_end_marker(&[0xFF, 0xD8, 0x12]));
        assert!(!has_jpeg_end_marker(&[]));
    }
}
