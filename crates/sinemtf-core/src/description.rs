//! Geometric metadata of a generated chart.

use crate::{ConfigurationError, JsonIoError, Xywhr};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizePx {
    pub h: usize,
    pub w: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SizeMm {
    pub h: f64,
    pub w: f64,
}

/// The fiducial marker region.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FiducialRegion {
    pub id: u32,
    pub xywhr: Xywhr,
    /// Printed side length of the marker, mm.
    pub physical_width_mm: f64,
}

impl FiducialRegion {
    /// Chart pixel pitch derived from the marker, mm per canonical pixel.
    pub fn pixel_pitch_mm(&self) -> f64 {
        self.physical_width_mm / self.xywhr.width
    }
}

/// The block of stacked sine tiles, one per frequency.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SineBlock {
    pub xywhr: Xywhr,
    pub frequencies_lpmm: Vec<f64>,
}

impl SineBlock {
    /// Per-frequency tile rectangles, in frequency order.
    pub fn tiles(&self) -> Vec<(f64, Xywhr)> {
        self.frequencies_lpmm
            .iter()
            .copied()
            .zip(self.xywhr.split_rows(self.frequencies_lpmm.len()))
            .collect()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReferenceStrip {
    pub xywhr: Xywhr,
}

/// Everything needed to find the chart regions again in a photograph.
///
/// All rectangles live in canonical chart pixels at the design resolution.
/// Unknown fields are ignored when loading.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChartDescription {
    pub total_size_px: SizePx,
    pub total_size_mm: SizeMm,
    pub fiducial: FiducialRegion,
    pub sine_block: SineBlock,
    pub reference_strip: ReferenceStrip,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dpi: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dictionary: Option<String>,
}

impl ChartDescription {
    /// Check frequencies, region sizes and that no two regions overlap.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let freqs = &self.sine_block.frequencies_lpmm;
        if freqs.is_empty() {
            return Err(ConfigurationError::EmptyFrequencies);
        }
        if let Some(&lpmm) = freqs.iter().find(|f| !(f.is_finite() && **f > 0.0)) {
            return Err(ConfigurationError::InvalidFrequency { lpmm });
        }
        if let Some(dpi) = self.dpi {
            if !(dpi.is_finite() && dpi > 0.0) {
                return Err(ConfigurationError::InvalidDpi { dpi });
            }
        }
        let pw = self.fiducial.physical_width_mm;
        if !(pw.is_finite() && pw > 0.0) {
            return Err(ConfigurationError::InvalidDimension {
                what: "fiducial physical width",
                value: pw,
            });
        }

        let regions = self.regions();
        for (name, r) in &regions {
            if !r.is_valid() {
                return Err(ConfigurationError::InvalidDimension {
                    what: *name,
                    value: r.width.min(r.height),
                });
            }
        }
        for i in 0..regions.len() {
            for j in i + 1..regions.len() {
                if boxes_overlap(&regions[i].1, &regions[j].1) {
                    return Err(ConfigurationError::OverlappingRegions {
                        a: regions[i].0,
                        b: regions[j].0,
                    });
                }
            }
        }
        Ok(())
    }

    /// Named regions in a fixed order: fiducial, sine block, reference strip.
    pub fn regions(&self) -> [(&'static str, Xywhr); 3] {
        [
            ("fiducial", self.fiducial.xywhr),
            ("sine_block", self.sine_block.xywhr),
            ("reference_strip", self.reference_strip.xywhr),
        ]
    }

    /// The fiducial region if it carries `id`.
    pub fn fiducial_with_id(&self, id: u32) -> Result<&FiducialRegion, ConfigurationError> {
        if self.fiducial.id == id {
            Ok(&self.fiducial)
        } else {
            Err(ConfigurationError::UnknownFiducial { id })
        }
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

// Overlap of the axis-aligned bounding boxes; shared edges do not count.
fn boxes_overlap(a: &Xywhr, b: &Xywhr) -> bool {
    const EPS: f64 = 1e-6;
    let a = a.bounding_box();
    let b = b.bounding_box();
    let ox = a[2].min(b[2]) - a[0].max(b[0]);
    let oy = a[3].min(b[3]) - a[1].max(b[1]);
    ox > EPS && oy > EPS
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    fn sample() -> ChartDescription {
        ChartDescription {
            total_size_px: SizePx { h: 120, w: 90 },
            total_size_mm: SizeMm { h: 5.08, w: 3.81 },
            fiducial: FiducialRegion {
                id: 7,
                xywhr: Xywhr::axis_aligned(50.0, 0.0, 40.0, 40.0),
                physical_width_mm: 1.6933,
            },
            sine_block: SineBlock {
                xywhr: Xywhr::new(0.0, 100.0, 100.0, 45.0, -FRAC_PI_2),
                frequencies_lpmm: vec![5.0, 10.0, 20.0],
            },
            reference_strip: ReferenceStrip {
                xywhr: Xywhr::axis_aligned(0.0, 105.0, 90.0, 15.0),
            },
            dpi: Some(600.0),
            dictionary: None,
        }
    }

    #[test]
    fn sample_is_valid_and_tiles_follow_frequencies() {
        let d = sample();
        d.validate().expect("valid");
        let tiles = d.sine_block.tiles();
        assert_eq!(tiles.len(), 3);
        assert_eq!(tiles[2].0, 20.0);
        assert!((tiles[1].1.x - 15.0).abs() < 1e-9);
        assert!((tiles[1].1.height - 15.0).abs() < 1e-9);
    }

    #[test]
    fn overlapping_regions_are_rejected() {
        let mut d = sample();
        d.fiducial.xywhr.x = 20.0;
        assert_eq!(
            d.validate(),
            Err(ConfigurationError::OverlappingRegions {
                a: "fiducial",
                b: "sine_block"
            })
        );
    }

    #[test]
    fn bad_frequencies_are_rejected() {
        let mut d = sample();
        d.sine_block.frequencies_lpmm.clear();
        assert_eq!(d.validate(), Err(ConfigurationError::EmptyFrequencies));
        d.sine_block.frequencies_lpmm = vec![5.0, -1.0];
        assert_eq!(
            d.validate(),
            Err(ConfigurationError::InvalidFrequency { lpmm: -1.0 })
        );
    }

    #[test]
    fn unknown_fiducial_id() {
        let d = sample();
        assert!(d.fiducial_with_id(7).is_ok());
        assert_eq!(
            d.fiducial_with_id(3),
            Err(ConfigurationError::UnknownFiducial { id: 3 })
        );
    }

    #[test]
    fn json_file_round_trip_ignores_unknown_fields() {
        let d = sample();
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("chart_description.json");
        d.write_json(&path).expect("write");
        assert_eq!(ChartDescription::load_json(&path).expect("load"), d);

        let mut value: serde_json::Value = serde_json::to_value(&d).expect("to value");
        value["printer"] = serde_json::json!("lab inkjet");
        value["fiducial"]["note"] = serde_json::json!(1);
        let back: ChartDescription = serde_json::from_value(value).expect("lenient parse");
        assert_eq!(back, d);
    }

    #[test]
    fn rectangles_are_plain_arrays_in_json() {
        let json = serde_json::to_value(sample()).expect("json");
        assert_eq!(json["reference_strip"]["xywhr"], serde_json::json!([0.0, 105.0, 90.0, 15.0, 0.0]));
        assert!(json.get("dictionary").is_none());
    }
}
