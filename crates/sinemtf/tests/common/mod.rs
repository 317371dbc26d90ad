#![allow(dead_code)]

use nalgebra::Point2;
use sinemtf::aruco::builtins::DICT_4X4_50;
use sinemtf::aruco::MarkerDetection;
use sinemtf::core::{rect_to_corners, warp_affine_gray, AffineMap, GrayImage, Interpolation};
use sinemtf::print::{BlankText, FiducialSpec, ReferenceSpec, SineSpec};
use sinemtf::{generate_chart, AnalyzeParams, ChartLayout, ChartSpec, RectifierParams};
use std::sync::OnceLock;

pub const FIDUCIAL_ID: u32 = 7;
pub const FREQUENCIES: [f64; 3] = [5.0, 10.0, 20.0];

/// 3 mm fiducial, 10 mm x 1 mm sine tiles and a 1 mm strip at 6000 dpi
/// (1535 x 2716 px).
pub fn chart_spec() -> ChartSpec {
    ChartSpec {
        dpi: 6000.0,
        fiducial: FiducialSpec {
            id: FIDUCIAL_ID,
            side_mm: 3.0,
        },
        sine: SineSpec {
            frequencies_lpmm: FREQUENCIES.to_vec(),
            length_mm: 10.0,
            tile_height_mm: 1.0,
            subpixel_samples: 11,
        },
        reference: ReferenceSpec { height_mm: 1.0 },
        text_height_ratio: 0.06,
    }
}

pub fn chart() -> &'static ChartLayout {
    static CHART: OnceLock<ChartLayout> = OnceLock::new();
    CHART.get_or_init(|| generate_chart(&chart_spec(), &DICT_4X4_50, &BlankText).expect("chart"))
}

/// A synthetic photograph of the chart.
pub struct Capture {
    pub photo: GrayImage,
    /// Canonical chart pixels to photograph pixels.
    pub chart_to_photo: AffineMap,
    pub corners: [Point2<f64>; 4],
}

impl Capture {
    pub fn detections(&self) -> Vec<MarkerDetection> {
        vec![MarkerDetection {
            id: FIDUCIAL_ID,
            corners: self.corners,
        }]
    }
}

/// Rotate the chart by `theta`, scale it by `scale` and place its bounding
/// box at `offset` on a black background with the same margin on the far side.
pub fn capture(chart: &ChartLayout, scale: f64, theta: f64, offset: (f64, f64)) -> Capture {
    capture_with_pose(chart, &AffineMap::similarity(scale, theta, 0.0, 0.0), offset)
}

/// Like [`capture`] for an arbitrary linear `pose` (shear included).
pub fn capture_with_pose(chart: &ChartLayout, pose: &AffineMap, offset: (f64, f64)) -> Capture {
    let (w, h) = (chart.image.width as f64, chart.image.height as f64);
    let outline = [
        Point2::new(0.0, 0.0),
        Point2::new(w, 0.0),
        Point2::new(w, h),
        Point2::new(0.0, h),
    ]
    .map(|p| pose.apply(p));
    let min_x = outline.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
    let min_y = outline.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
    let max_x = outline.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max);
    let max_y = outline.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);

    let chart_to_photo = pose.then(&AffineMap::translation(offset.0 - min_x, offset.1 - min_y));
    let photo_w = (max_x - min_x + 2.0 * offset.0).ceil() as usize;
    let photo_h = (max_y - min_y + 2.0 * offset.1).ceil() as usize;
    let photo_to_chart = chart_to_photo.inverse().expect("invertible pose");
    let photo = warp_affine_gray(
        &chart.image.view(),
        &photo_to_chart,
        photo_w,
        photo_h,
        Interpolation::Bicubic,
    );
    let corners = rect_to_corners(&chart.description.fiducial.xywhr).map(|p| chart_to_photo.apply(p));
    Capture {
        photo,
        chart_to_photo,
        corners,
    }
}

/// Rotated 7°, scaled 0.9, placed at (50, 30).
pub fn default_capture() -> &'static Capture {
    static CAPTURE: OnceLock<Capture> = OnceLock::new();
    CAPTURE.get_or_init(|| capture(chart(), 0.9, 7f64.to_radians(), (50.0, 30.0)))
}

/// 8 output pixels per sine period.
pub fn params() -> AnalyzeParams {
    AnalyzeParams {
        rectifier: RectifierParams {
            sine_oversample: 4.0,
            ..RectifierParams::default()
        },
        ..AnalyzeParams::default()
    }
}
