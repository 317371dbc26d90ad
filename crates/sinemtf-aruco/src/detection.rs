//! The interface to external marker detectors.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use sinemtf_core::{GrayImageView, JsonIoError};
use std::{fs, path::Path};

/// One detected marker.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarkerDetection {
    pub id: u32,
    /// Image corners in marker-local order: top-left first, then clockwise.
    /// Continuous pixel coordinates (pixel centers at `+0.5`).
    pub corners: [Point2<f64>; 4],
}

/// A fiducial detector. Implementations live outside this workspace.
pub trait MarkerDetector {
    fn detect(&self, image: &GrayImageView<'_>) -> Vec<MarkerDetection>;
}

/// Detections recorded ahead of time, returned for any image.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordedDetections(pub Vec<MarkerDetection>);

impl RecordedDetections {
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

impl MarkerDetector for RecordedDetections {
    fn detect(&self, _image: &GrayImageView<'_>) -> Vec<MarkerDetection> {
        self.0.clone()
    }
}

/// First detection carrying `id`.
pub fn select_marker(detections: &[MarkerDetection], id: u32) -> Option<&MarkerDetection> {
    detections.iter().find(|d| d.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn det(id: u32, x: f64) -> MarkerDetection {
        MarkerDetection {
            id,
            corners: [
                Point2::new(x, 0.0),
                Point2::new(x + 10.0, 0.0),
                Point2::new(x + 10.0, 10.0),
                Point2::new(x, 10.0),
            ],
        }
    }

    #[test]
    fn selects_by_id() {
        let dets = vec![det(3, 0.0), det(7, 20.0), det(7, 40.0)];
        assert_eq!(select_marker(&dets, 7).map(|d| d.corners[0].x), Some(20.0));
        assert!(select_marker(&dets, 1).is_none());
    }

    #[test]
    fn recorded_detections_round_trip() {
        let rec = RecordedDetections(vec![det(7, 1.5)]);
        let json = serde_json::to_value(&rec).expect("json");
        assert_eq!(json[0]["corners"][1], serde_json::json!([11.5, 0.0]));

        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("detections.json");
        rec.write_json(&path).expect("write");
        let back = RecordedDetections::load_json(&path).expect("load");
        let img = sinemtf_core::GrayImage::filled(4, 4, 0);
        assert_eq!(back.detect(&img.view()), rec.0);
    }
}
