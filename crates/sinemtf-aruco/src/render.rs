//! Marker bitmaps for chart printing.

use crate::Dictionary;
use sinemtf_core::GrayImage;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MarkerError {
    #[error("marker id {id} is not in dictionary `{dictionary}` ({count} markers)")]
    UnknownId {
        id: u32,
        dictionary: String,
        count: usize,
    },
    #[error("marker side {side_px} px is smaller than its {modules} modules")]
    SideTooSmall { side_px: usize, modules: usize },
    #[error("dictionary `{dictionary}` has {bits} data bits; at most 64 are supported")]
    TooManyBits { dictionary: String, bits: usize },
}

/// Source of fiducial bitmaps.
///
/// Implementations draw a marker as a square 8-bit image, black modules 0
/// and white modules 255.
pub trait MarkerRenderer {
    /// Dictionary name printed in the chart description.
    fn name(&self) -> &str;

    /// Modules per side, frame included.
    fn modules_per_side(&self) -> usize;

    fn render(&self, id: u32, side_px: usize) -> Result<GrayImage, MarkerError>;
}

impl MarkerRenderer for Dictionary {
    fn name(&self) -> &str {
        &self.name
    }

    fn modules_per_side(&self) -> usize {
        Dictionary::modules_per_side(self)
    }

    /// Nearest-module rendering: pixel `p` shows module `floor(p * n / side_px)`.
    fn render(&self, id: u32, side_px: usize) -> Result<GrayImage, MarkerError> {
        if !self.fits_u64() {
            return Err(MarkerError::TooManyBits {
                dictionary: self.name.to_string(),
                bits: self.bit_count(),
            });
        }
        let grid = self.module_grid(id).ok_or_else(|| MarkerError::UnknownId {
            id,
            dictionary: self.name.to_string(),
            count: self.len(),
        })?;
        let n = Dictionary::modules_per_side(self);
        if side_px < n {
            return Err(MarkerError::SideTooSmall {
                side_px,
                modules: n,
            });
        }
        let mut img = GrayImage::filled(side_px, side_px, 0);
        for y in 0..side_px {
            let my = y * n / side_px;
            for x in 0..side_px {
                let mx = x * n / side_px;
                if grid[my * n + mx] {
                    img.set(x, y, 255);
                }
            }
        }
        Ok(img)
    }
}
