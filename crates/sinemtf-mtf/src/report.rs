use crate::{
    estimate_mtf, estimate_reference_modes, CalibrationError, FitDiagnostics, MtfError, MtfParams,
    Rectification, ReferenceModes,
};
use serde::{Deserialize, Serialize};
use sinemtf_core::JsonIoError;
use std::{fs, path::Path};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// MTF at one chart frequency.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MtfResult {
    pub lpmm: f64,
    pub mtf: f64,
    /// Pixel pitch the tile was analyzed at, mm.
    pub pixel_pitch_mm: f64,
}

/// Everything measured from one photograph.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MtfReport {
    pub modes: ReferenceModes,
    /// In chart frequency order.
    pub results: Vec<MtfResult>,
    pub diagnostics: FitDiagnostics,
}

impl MtfReport {
    pub fn mtf_at(&self, lpmm: f64) -> Option<f64> {
        self.results.iter().find(|r| r.lpmm == lpmm).map(|r| r.mtf)
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

/// Calibrate on the reference strip, then measure every sine tile.
#[cfg_attr(feature = "tracing", instrument(level = "info", skip_all, fields(tiles = rectification.tiles.len())))]
pub fn estimate_chart_mtf(
    rectification: &Rectification,
    params: &MtfParams,
) -> Result<MtfReport, MtfError> {
    let reference = rectification
        .reference_tile()
        .ok_or(CalibrationError::MissingReference)?;
    let modes = estimate_reference_modes(&reference.image, params)?;

    let results = rectification
        .sine_tiles()
        .map(|(lpmm, tile)| {
            let mtf = estimate_mtf(&tile.image, lpmm, tile.pixel_pitch_mm, &modes, params)?;
            log::info!(lpmm = lpmm; "MTF = {mtf:.4}");
            Ok(MtfResult {
                lpmm,
                mtf,
                pixel_pitch_mm: tile.pixel_pitch_mm,
            })
        })
        .collect::<Result<Vec<_>, MtfError>>()?;

    Ok(MtfReport {
        modes,
        results,
        diagnostics: rectification.diagnostics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ExtractedTile, TileKind};
    use sinemtf_core::{AffineMap, FloatImage, Xywhr};
    use std::f64::consts::PI;

    fn diagnostics() -> FitDiagnostics {
        FitDiagnostics {
            rms_residual_px: 0.0,
            max_residual_px: 0.0,
            inliers: 4,
            scale: 1.0,
            rotation_rad: 0.0,
        }
    }

    fn tile(kind: TileKind, image: FloatImage, pixel_pitch_mm: f64) -> ExtractedTile {
        ExtractedTile {
            kind,
            image,
            pixel_pitch_mm,
            region: Xywhr::axis_aligned(0.0, 0.0, 1.0, 1.0),
        }
    }

    /// Tiles sampled at 8 px per period with the given contrast, over a
    /// reference strip with black at 0.2 and white at 0.8.
    fn rectification(contrasts: &[(f64, f64)]) -> Rectification {
        let mut tiles: Vec<_> = contrasts
            .iter()
            .map(|&(lpmm, c)| {
                let img = FloatImage::from_fn(100, 20, |x, _| {
                    (0.5 + 0.3 * c * (2.0 * PI * x as f64 / 8.0).sin()) as f32
                });
                tile(TileKind::Sine { lpmm }, img, 1.0 / (8.0 * lpmm))
            })
            .collect();
        let strip = FloatImage::from_fn(80, 10, |x, _| if x < 40 { 0.2 } else { 0.8 });
        tiles.push(tile(TileKind::Reference, strip, 0.01));
        Rectification {
            tiles,
            captured_to_canonical: AffineMap::identity(),
            diagnostics: diagnostics(),
        }
    }

    #[test]
    fn report_follows_tile_order() {
        let r = rectification(&[(1.0, 1.0), (2.0, 0.5), (4.0, 0.25)]);
        let report = estimate_chart_mtf(&r, &MtfParams::default()).expect("report");
        assert!((report.modes.common - 0.5).abs() < 1e-6);
        assert!((report.modes.differential - 0.3).abs() < 1e-6);
        let got: Vec<_> = report.results.iter().map(|r| r.lpmm).collect();
        assert_eq!(got, vec![1.0, 2.0, 4.0]);
        for (want, r) in [1.0, 0.5, 0.25].iter().zip(&report.results) {
            assert!((r.mtf - want).abs() < 1e-3, "{} lp/mm: {}", r.lpmm, r.mtf);
        }
        assert_eq!(report.mtf_at(2.0), report.results.get(1).map(|r| r.mtf));
        assert_eq!(report.mtf_at(3.0), None);
    }

    #[test]
    fn missing_reference_is_reported() {
        let mut r = rectification(&[(1.0, 1.0)]);
        r.tiles.pop();
        assert_eq!(
            estimate_chart_mtf(&r, &MtfParams::default()),
            Err(MtfError::Calibration(CalibrationError::MissingReference))
        );
    }
}
