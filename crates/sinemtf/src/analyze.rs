//! Frame-level pipeline: fiducial selection, rectification, MTF.

use crate::aruco::{select_marker, Dictionary, MarkerDetection, MarkerDetector, Match, Matcher};
use crate::core::{
    estimate_rect_to_rect_affine, ChartDescription, ConfigurationError, FitDirection,
    GrayImageView, JsonIoError,
};
use crate::mtf::{
    estimate_chart_mtf, extract_region, extract_tiles, MtfError, MtfParams, MtfReport,
    RectifierParams,
};
use crate::overlay::{fiducial_squareness, Squareness};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Errors produced by the frame-level helpers.
#[derive(thiserror::Error, Debug)]
pub enum AnalyzeError {
    #[error("fiducial {id} was not detected in the frame")]
    FiducialNotDetected { id: u32 },

    #[error(transparent)]
    Mtf(#[from] MtfError),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Json(#[from] JsonIoError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Print(#[from] sinemtf_print::PrintError),

    #[cfg(feature = "image")]
    #[error(transparent)]
    Image(#[from] image::ImageError),

    #[error("decoded image has inconsistent dimensions {width}x{height}")]
    InvalidImage { width: u32, height: u32 },
}

/// Tuning of both pipeline stages.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyzeParams {
    #[serde(default)]
    pub rectifier: RectifierParams,
    #[serde(default)]
    pub mtf: MtfParams,
}

/// Result for one photograph.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FrameAnalysis {
    pub fiducial_id: u32,
    pub corners: [Point2<f64>; 4],
    pub squareness: Squareness,
    pub report: MtfReport,
}

/// Measure one frame from detections made by the caller.
///
/// Only the detection whose id matches the description's fiducial is used.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip_all, fields(w = image.width, h = image.height, detections = detections.len()))
)]
pub fn analyze_frame(
    image: &GrayImageView<'_>,
    detections: &[MarkerDetection],
    description: &ChartDescription,
    params: &AnalyzeParams,
) -> Result<FrameAnalysis, AnalyzeError> {
    let id = description.fiducial.id;
    let detection =
        select_marker(detections, id).ok_or(AnalyzeError::FiducialNotDetected { id })?;
    analyze_detection(image, detection, description, params)
}

/// Measure one frame from a single fiducial detection.
///
/// Fails with [`ConfigurationError::UnknownFiducial`] when the detection's
/// id is not the chart's fiducial.
pub fn analyze_detection(
    image: &GrayImageView<'_>,
    detection: &MarkerDetection,
    description: &ChartDescription,
    params: &AnalyzeParams,
) -> Result<FrameAnalysis, AnalyzeError> {
    let id = description.fiducial_with_id(detection.id)?.id;
    let corners = detection.corners;

    let squareness = fiducial_squareness(&corners);
    log::debug!(
        fiducial = id;
        "side ratio {:.3}, corner angle error {:.4} rad",
        squareness.side_ratio,
        squareness.max_corner_angle_error_rad
    );
    if squareness.side_ratio > 1.2 {
        log::warn!(
            fiducial = id;
            "fiducial is far from square (side ratio {:.3}); the chart may be tilted",
            squareness.side_ratio
        );
    }

    let rectification = extract_tiles(image, &corners, description, &params.rectifier)?;
    let report = estimate_chart_mtf(&rectification, &params.mtf)?;

    Ok(FrameAnalysis {
        fiducial_id: id,
        corners,
        squareness,
        report,
    })
}

/// Run `detector` on the frame, then [`analyze_frame`].
pub fn analyze_with_detector(
    image: &GrayImageView<'_>,
    detector: &dyn MarkerDetector,
    description: &ChartDescription,
    params: &AnalyzeParams,
) -> Result<FrameAnalysis, AnalyzeError> {
    let detections = detector.detect(image);
    log::debug!("detector returned {} markers", detections.len());
    analyze_frame(image, &detections, description, params)
}

/// Resample the fiducial region through its own corners and read it back.
///
/// A cross-check that the corners are ordered and belong to the expected
/// marker. `None` when the marker cannot be read or matched.
pub fn decode_fiducial(
    image: &GrayImageView<'_>,
    corners: &[Point2<f64>; 4],
    description: &ChartDescription,
    dictionary: &Dictionary,
    params: &RectifierParams,
) -> Result<Option<Match>, AnalyzeError> {
    let fiducial = &description.fiducial;
    let fit = estimate_rect_to_rect_affine(
        &fiducial.xywhr,
        corners,
        params.model,
        FitDirection::Reverse,
        &params.fit,
    )
    .map_err(MtfError::from)?;
    let width = dictionary.modules_per_side() * 8;
    let rectified = extract_region(
        image,
        &fit.map,
        &fiducial.xywhr,
        width,
        params.interpolation,
    )
    .map_err(MtfError::from)?;
    let Some(matcher) = Matcher::new(dictionary.clone(), 1) else {
        return Ok(None);
    };
    Ok(matcher.decode_rectified(&rectified))
}
