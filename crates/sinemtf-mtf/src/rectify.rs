//! Cutting chart regions out of a photograph.
//!
//! The fiducial's canonical rectangle and its detected corners give the
//! map from captured pixels to canonical chart pixels. Each region is then
//! cropped in canonical space, scaled to the width its analysis needs and
//! resampled from the photograph in one pass.

use crate::{MtfError, RectifierParams};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use sinemtf_core::{
    crop_rect_and_scale, estimate_rect_to_rect_affine, warp_affine, AffineMap, ChartDescription,
    FitDirection, FloatImage, GeometryError, GrayImageView, Interpolation, Xywhr,
};

#[cfg(feature = "tracing")]
use tracing::instrument;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum TileKind {
    Sine { lpmm: f64 },
    Reference,
}

/// One resampled region.
#[derive(Clone, Debug)]
pub struct ExtractedTile {
    pub kind: TileKind,
    /// Values in `[0, 1]` (bicubic overshoot aside).
    pub image: FloatImage,
    /// Physical size of one output pixel on the chart, mm.
    pub pixel_pitch_mm: f64,
    /// The region in canonical chart pixels.
    pub region: Xywhr,
}

/// Quality of the fiducial fit.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FitDiagnostics {
    pub rms_residual_px: f64,
    pub max_residual_px: f64,
    pub inliers: usize,
    /// Captured pixels per canonical chart pixel.
    pub scale: f64,
    /// Rotation of the chart in the photograph, radians.
    pub rotation_rad: f64,
}

/// Result of [`extract_tiles`]: sine tiles in description order, then the
/// reference strip.
#[derive(Clone, Debug)]
pub struct Rectification {
    pub tiles: Vec<ExtractedTile>,
    pub captured_to_canonical: AffineMap,
    pub diagnostics: FitDiagnostics,
}

impl Rectification {
    pub fn sine_tiles(&self) -> impl Iterator<Item = (f64, &ExtractedTile)> {
        self.tiles.iter().filter_map(|t| match t.kind {
            TileKind::Sine { lpmm } => Some((lpmm, t)),
            TileKind::Reference => None,
        })
    }

    pub fn reference_tile(&self) -> Option<&ExtractedTile> {
        self.tiles
            .iter()
            .rev()
            .find(|t| t.kind == TileKind::Reference)
    }
}

/// Resample one canonical region from the photograph.
///
/// `captured_to_canonical` maps photograph pixels into chart pixels; the
/// region ends up `target_width` pixels wide with its width edge horizontal.
pub fn extract_region(
    image: &GrayImageView<'_>,
    captured_to_canonical: &AffineMap,
    region: &Xywhr,
    target_width: usize,
    interpolation: Interpolation,
) -> Result<FloatImage, GeometryError> {
    let canvas = crop_rect_and_scale(region, target_width)?;
    let total = captured_to_canonical.then(&canvas.map);
    let inverse = total.inverse().ok_or(GeometryError::NonInvertible)?;
    Ok(warp_affine(
        image,
        &inverse,
        canvas.width,
        canvas.height,
        interpolation,
    ))
}

/// Locate the chart through its fiducial and resample every analysis region.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip(image, corners, description, params), fields(w = image.width, h = image.height))
)]
pub fn extract_tiles(
    image: &GrayImageView<'_>,
    corners: &[Point2<f64>; 4],
    description: &ChartDescription,
    params: &RectifierParams,
) -> Result<Rectification, MtfError> {
    description.validate()?;
    params.validate()?;

    let fiducial = &description.fiducial;
    let src_pp = fiducial.pixel_pitch_mm();
    let fit = estimate_rect_to_rect_affine(
        &fiducial.xywhr,
        corners,
        params.model,
        FitDirection::Reverse,
        &params.fit,
    )?;
    let h = fit.map;
    let canonical_per_captured = h.similarity_scale();
    if !(canonical_per_captured > 0.0) {
        return Err(GeometryError::NonInvertible.into());
    }
    let scale = 1.0 / canonical_per_captured;
    let diagnostics = FitDiagnostics {
        rms_residual_px: fit.rms_residual_px,
        max_residual_px: fit.max_residual_px,
        inliers: fit.inlier_count(),
        scale,
        rotation_rad: -h.rotation_angle(),
    };
    log::debug!(
        fiducial = description.fiducial.id;
        "fiducial fit: scale={scale:.4} rotation={:.4}rad rms={:.4}px",
        diagnostics.rotation_rad,
        diagnostics.rms_residual_px
    );

    let mut plan: Vec<(TileKind, Xywhr, usize)> = Vec::new();
    for (lpmm, rect) in description.sine_block.tiles() {
        let length_mm = rect.width * src_pp;
        let w = (length_mm * lpmm * 2.0 * params.sine_oversample).round().max(1.0) as usize;
        plan.push((TileKind::Sine { lpmm }, rect, w));
    }
    let reference = description.reference_strip.xywhr;
    let ref_w = (scale * params.reference_oversample * reference.width)
        .round()
        .max(1.0) as usize;
    plan.push((TileKind::Reference, reference, ref_w));

    let mut tiles = Vec::with_capacity(plan.len());
    for (kind, region, target_width) in plan {
        let image = extract_region(image, &h, &region, target_width, params.interpolation)?;
        let pixel_pitch_mm = region.width * src_pp / target_width as f64;
        log::debug!(
            "extracted {kind:?}: {}x{} px at {pixel_pitch_mm:.6} mm/px",
            image.width,
            image.height
        );
        tiles.push(ExtractedTile {
            kind,
            image,
            pixel_pitch_mm,
            region,
        });
    }

    Ok(Rectification {
        tiles,
        captured_to_canonical: h,
        diagnostics,
    })
}
