//! Dictionary metadata and packed marker codes.

use serde::{Deserialize, Serialize};
use sinemtf_core::JsonIoError;
use std::{borrow::Cow, fs, path::Path};

fn default_border_bits() -> usize {
    1
}

/// An ArUco-style marker dictionary.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dictionary {
    /// Human-readable name, printed on the chart.
    pub name: Cow<'static, str>,
    /// Number of data bits per side (4 for `4X4_*`).
    pub marker_size: usize,
    /// Width of the solid black frame, in modules.
    #[serde(default = "default_border_bits")]
    pub border_bits: usize,
    /// One code per marker id, encoding the inner `marker_size × marker_size` bits.
    ///
    /// Bits are row-major with bit 0 at the top-left data module; a set bit
    /// is a **white** module (the OpenCV convention).
    pub codes: Cow<'static, [u64]>,
}

impl Dictionary {
    /// Total number of inner bits per marker.
    #[inline]
    pub fn bit_count(&self) -> usize {
        self.marker_size * self.marker_size
    }

    /// Modules per side including the black frame on both sides.
    #[inline]
    pub fn modules_per_side(&self) -> usize {
        self.marker_size + 2 * self.border_bits
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn code(&self, id: u32) -> Option<u64> {
        self.codes.get(id as usize).copied()
    }

    /// Whether every code fits the packed `u64` representation.
    #[inline]
    pub fn fits_u64(&self) -> bool {
        self.bit_count() <= 64
    }

    /// Full module grid of marker `id` (frame included), row-major, `true` = white.
    ///
    /// `None` for unknown ids and for dictionaries wider than 64 bits.
    pub fn module_grid(&self, id: u32) -> Option<Vec<bool>> {
        if !self.fits_u64() {
            return None;
        }
        let code = self.code(id)?;
        let n = self.modules_per_side();
        let b = self.border_bits;
        let mut grid = vec![false; n * n];
        for y in 0..self.marker_size {
            for x in 0..self.marker_size {
                let bit = (code >> (y * self.marker_size + x)) & 1;
                grid[(y + b) * n + x + b] = bit == 1;
            }
        }
        Some(grid)
    }

    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, JsonIoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), JsonIoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins::DICT_4X4_50;

    #[test]
    fn module_grid_has_black_frame() {
        let dict = DICT_4X4_50;
        assert_eq!(dict.modules_per_side(), 6);
        let grid = dict.module_grid(0).expect("id 0");
        for i in 0..6 {
            assert!(!grid[i], "top row");
            assert!(!grid[30 + i], "bottom row");
            assert!(!grid[i * 6], "left column");
            assert!(!grid[i * 6 + 5], "right column");
        }
        // 0x4cad: bit 0 set -> top-left data module is white
        assert!(grid[6 + 1]);
        assert!(dict.module_grid(50).is_none());
    }

    #[test]
    fn custom_dictionary_loads_from_json() {
        let json = r#"{ "name": "tiny", "marker_size": 2, "codes": [1, 6] }"#;
        let dict: Dictionary = serde_json::from_str(json).expect("parse");
        assert_eq!(dict.border_bits, 1);
        assert_eq!(dict.len(), 2);

        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("dict.json");
        dict.write_json(&path).expect("write");
        assert_eq!(Dictionary::load_json(&path).expect("load"), dict);
    }

    #[test]
    fn oversized_dictionary_has_no_module_grid() {
        let json = r#"{ "name": "wide", "marker_size": 9, "codes": [1] }"#;
        let dict: Dictionary = serde_json::from_str(json).expect("parse");
        assert!(!dict.fits_u64());
        assert!(dict.module_grid(0).is_none());
    }
}
