//! JSON configuration and file-level analysis.

use crate::analyze::{AnalyzeError, AnalyzeParams, FrameAnalysis};
use crate::core::JsonIoError;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, path::PathBuf};

/// Inputs and outputs of one `analyze` run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnalyzeConfig {
    /// Photograph of the chart; any format the `image` crate decodes.
    pub photo_path: PathBuf,
    pub description_path: PathBuf,
    /// Marker detections for the photograph, as written by an external detector.
    pub detections_path: PathBuf,
    /// Where to write the [`FrameAnalysis`] JSON.
    #[serde(default)]
    pub output_path: Option<PathBuf>,
    /// Where to write a copy of the photograph with the fiducial outlined.
    #[serde(default)]
    pub overlay_path: Option<PathBuf>,
    #[serde(default)]
    pub params: AnalyzeParams,
}

impl AnalyzeConfig {
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, JsonIoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), JsonIoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Resolve relative paths against `base` (usually the config's directory).
    pub fn resolve_paths(&mut self, base: &Path) {
        let join = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        join(&mut self.photo_path);
        join(&mut self.description_path);
        join(&mut self.detections_path);
        if let Some(p) = self.output_path.as_mut() {
            join(p);
        }
        if let Some(p) = self.overlay_path.as_mut() {
            join(p);
        }
    }
}

impl FrameAnalysis {
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

/// Convert an `image::GrayImage` into the lightweight core view type.
#[cfg(feature = "image")]
pub fn gray_view(img: &::image::GrayImage) -> crate::core::GrayImageView<'_> {
    crate::core::GrayImageView {
        width: img.width() as usize,
        height: img.height() as usize,
        data: img.as_raw(),
    }
}

/// Decode a photograph and convert it to 8-bit luma.
#[cfg(feature = "image")]
pub fn load_gray(path: impl AsRef<Path>) -> Result<crate::core::GrayImage, AnalyzeError> {
    let luma = ::image::ImageReader::open(path)?.decode()?.to_luma8();
    let (width, height) = luma.dimensions();
    crate::core::GrayImage::from_raw(width as usize, height as usize, luma.into_raw())
        .ok_or(AnalyzeError::InvalidImage { width, height })
}

/// Load everything `config` names, analyze the photograph and write the
/// requested outputs.
#[cfg(feature = "image")]
pub fn run_analysis(config: &AnalyzeConfig) -> Result<FrameAnalysis, AnalyzeError> {
    use crate::aruco::RecordedDetections;
    use crate::core::ChartDescription;

    let photo = load_gray(&config.photo_path)?;
    let description = ChartDescription::load_json(&config.description_path)?;
    let detections = RecordedDetections::load_json(&config.detections_path)?;
    log::info!(
        "analyzing {} ({}x{} px, {} detections)",
        config.photo_path.display(),
        photo.width,
        photo.height,
        detections.0.len()
    );

    let analysis =
        crate::analyze::analyze_frame(&photo.view(), &detections.0, &description, &config.params)?;

    if let Some(path) = &config.output_path {
        analysis.write_json(path)?;
        log::info!("wrote {}", path.display());
    }
    if let Some(path) = &config.overlay_path {
        let mut canvas = photo.clone();
        crate::overlay::draw_fiducial_overlay(&mut canvas, &analysis.corners, 255);
        sinemtf_print::save_png(path, &canvas, None)?;
        log::info!("wrote {}", path.display());
    }
    Ok(analysis)
}
