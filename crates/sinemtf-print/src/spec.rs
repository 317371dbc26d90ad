//! Chart design parameters.

use serde::{Deserialize, Serialize};
use sinemtf_core::{ConfigurationError, JsonIoError};
use std::{fs, path::Path};

fn default_dpi() -> f64 {
    600.0
}

fn default_subpixel_samples() -> usize {
    101
}

fn default_text_height_ratio() -> f64 {
    0.06
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FiducialSpec {
    /// Marker id within the dictionary.
    pub id: u32,
    /// Printed side length, mm.
    pub side_mm: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SineSpec {
    /// One tile per frequency, top to bottom in the unrotated stack.
    pub frequencies_lpmm: Vec<f64>,
    /// Tile length along the sine direction, mm.
    pub length_mm: f64,
    /// Tile height across the sine direction, mm.
    pub tile_height_mm: f64,
    /// Gaussian-weighted sub-samples integrated per printed pixel.
    /// Values `<= 1` sample each pixel center once.
    #[serde(default = "default_subpixel_samples")]
    pub subpixel_samples: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReferenceSpec {
    /// Height of the black/white strip, mm.
    pub height_mm: f64,
}

/// Everything that defines a printable chart.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    #[serde(default = "default_dpi")]
    pub dpi: f64,
    pub fiducial: FiducialSpec,
    pub sine: SineSpec,
    pub reference: ReferenceSpec,
    /// Description text height relative to the width of the tile it labels.
    #[serde(default = "default_text_height_ratio")]
    pub text_height_ratio: f64,
}

fn positive(what: &'static str, value: f64) -> Result<(), ConfigurationError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigurationError::InvalidDimension { what, value })
    }
}

impl ChartSpec {
    /// Check value ranges. Pixel-level checks happen during layout.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if !(self.dpi.is_finite() && self.dpi > 0.0) {
            return Err(ConfigurationError::InvalidDpi { dpi: self.dpi });
        }
        if self.sine.frequencies_lpmm.is_empty() {
            return Err(ConfigurationError::EmptyFrequencies);
        }
        if let Some(&lpmm) = self
            .sine
            .frequencies_lpmm
            .iter()
            .find(|f| !(f.is_finite() && **f > 0.0))
        {
            return Err(ConfigurationError::InvalidFrequency { lpmm });
        }
        positive("fiducial side", self.fiducial.side_mm)?;
        positive("sine tile length", self.sine.length_mm)?;
        positive("sine tile height", self.sine.tile_height_mm)?;
        positive("reference strip height", self.reference.height_mm)?;
        if !(self.text_height_ratio.is_finite() && self.text_height_ratio >= 0.0) {
            return Err(ConfigurationError::InvalidParameter {
                name: "text_height_ratio",
                value: self.text_height_ratio,
            });
        }
        Ok(())
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

    #[test]
    fn defaults_fill_in_optional_fields() {
        let json = r#"{
            "fiducial": { "id": 3, "side_mm": 20.0 },
            "sine": { "frequencies_lpmm": [1.0, 2.0], "length_mm": 40.0, "tile_height_mm": 5.0 },
            "reference": { "height_mm": 5.0 }
        }"#;
        let spec: ChartSpec = serde_json::from_str(json).expect("parse");
        assert_eq!(spec.dpi, 600.0);
        assert_eq!(spec.sine.subpixel_samples, 101);
        assert_eq!(spec.text_height_ratio, 0.06);
        spec.validate().expect("valid");
    }

    #[test]
    fn rejects_bad_values() {
        let json = r#"{
            "dpi": 300.0,
            "fiducial": { "id": 3, "side_mm": 20.0 },
            "sine": { "frequencies_lpmm": [1.0], "length_mm": 40.0, "tile_height_mm": 5.0 },
            "reference": { "height_mm": 5.0 }
        }"#;
        let base: ChartSpec = serde_json::from_str(json).expect("parse");

        let mut s = base.clone();
        s.sine.frequencies_lpmm.clear();
        assert_eq!(s.validate(), Err(ConfigurationError::EmptyFrequencies));

        let mut s = base.clone();
        s.sine.frequencies_lpmm = vec![0.0];
        assert_eq!(s.validate(), Err(ConfigurationError::InvalidFrequency { lpmm: 0.0 }));

        let mut s = base.clone();
        s.dpi = -1.0;
        assert_eq!(s.validate(), Err(ConfigurationError::InvalidDpi { dpi: -1.0 }));

        let mut s = base;
        s.reference.height_mm = 0.0;
        assert!(matches!(
            s.validate(),
            Err(ConfigurationError::InvalidDimension { what: "reference strip height", .. })
        ));
    }
}
