//! Visual QA of the detected fiducial.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use sinemtf_core::GrayImage;
use sinemtf_print::TextRenderer;
use std::f64::consts::FRAC_PI_2;

/// How close a detected quadrilateral is to a square.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Squareness {
    /// Longest side over shortest side; 1 for a square.
    pub side_ratio: f64,
    /// Largest deviation of an interior angle from 90°, radians.
    pub max_corner_angle_error_rad: f64,
}

pub fn fiducial_squareness(corners: &[Point2<f64>; 4]) -> Squareness {
    let edges: [_; 4] = std::array::from_fn(|i| corners[(i + 1) % 4] - corners[i]);
    let lengths = edges.map(|e| e.norm());
    let longest = lengths.iter().copied().fold(0.0, f64::max);
    let shortest = lengths.iter().copied().fold(f64::INFINITY, f64::min);
    let side_ratio = if shortest > 0.0 {
        longest / shortest
    } else {
        f64::INFINITY
    };

    let mut max_err: f64 = 0.0;
    for i in 0..4 {
        let incoming = -edges[(i + 3) % 4];
        let outgoing = edges[i];
        let denom = incoming.norm() * outgoing.norm();
        if denom <= 0.0 {
            max_err = FRAC_PI_2;
            continue;
        }
        let angle = (incoming.dot(&outgoing) / denom).clamp(-1.0, 1.0).acos();
        max_err = max_err.max((angle - FRAC_PI_2).abs());
    }

    Squareness {
        side_ratio,
        max_corner_angle_error_rad: max_err,
    }
}

/// `"(x.x, y.y)"` of the origin corner.
pub fn coordinate_label(corners: &[Point2<f64>; 4]) -> String {
    format!("({:.1}, {:.1})", corners[0].x, corners[0].y)
}

fn put(canvas: &mut GrayImage, x: f64, y: f64, value: u8) {
    if !(x >= 0.0 && y >= 0.0) {
        return;
    }
    let (px, py) = (x as usize, y as usize);
    if px < canvas.width && py < canvas.height {
        canvas.set(px, py, value);
    }
}

fn draw_line(canvas: &mut GrayImage, a: Point2<f64>, b: Point2<f64>, value: u8) {
    let d = b - a;
    let steps = d.x.abs().max(d.y.abs()).ceil().max(1.0) as usize;
    for s in 0..=steps {
        let p = a + d * (s as f64 / steps as f64);
        put(canvas, p.x, p.y, value);
    }
}

/// Outline the quadrilateral and mark its origin corner with a 5×5 square.
///
/// Anything outside `canvas` is clipped.
pub fn draw_fiducial_overlay(canvas: &mut GrayImage, corners: &[Point2<f64>; 4], value: u8) {
    for i in 0..4 {
        draw_line(canvas, corners[i], corners[(i + 1) % 4], value);
    }
    let o = corners[0];
    for dy in -2..=2 {
        for dx in -2..=2 {
            put(canvas, o.x + dx as f64, o.y + dy as f64, value);
        }
    }
}

/// Paste [`coordinate_label`] just above the origin corner, `height_px` tall.
pub fn draw_coordinate_label(
    canvas: &mut GrayImage,
    corners: &[Point2<f64>; 4],
    text: &dyn TextRenderer,
    height_px: usize,
) {
    let label = coordinate_label(corners);
    let width = height_px * label.len() / 2;
    if width == 0 {
        return;
    }
    let tile = text.render_line(&label, width, height_px);
    let x = corners[0].x.max(0.0) as usize;
    let y = (corners[0].y - height_px as f64).max(0.0) as usize;
    canvas.paste(&tile, x, y);
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use sinemtf_core::AffineMap;

    fn square(side: f64) -> [Point2<f64>; 4] {
        [
            Point2::new(0.0, 0.0),
            Point2::new(side, 0.0),
            Point2::new(side, side),
            Point2::new(0.0, side),
        ]
    }

    #[test]
    fn rotated_square_is_square() {
        let t = AffineMap::similarity(2.0, 0.7, 30.0, -4.0);
        let q = square(10.0).map(|p| t.apply(p));
        let s = fiducial_squareness(&q);
        assert_abs_diff_eq!(s.side_ratio, 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(s.max_corner_angle_error_rad, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn sheared_quad_reports_distortion() {
        let mut q = square(10.0);
        q[1].x = 20.0;
        q[2].x = 20.0; // 20x10 rectangle
        let s = fiducial_squareness(&q);
        assert_abs_diff_eq!(s.side_ratio, 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(s.max_corner_angle_error_rad, 0.0, epsilon = 1e-12);

        let mut q = square(10.0);
        q[2].x = 15.0;
        q[3].x = 5.0; // parallelogram leaning by atan(1/2)
        let s = fiducial_squareness(&q);
        assert_abs_diff_eq!(s.max_corner_angle_error_rad, 0.5f64.atan(), epsilon = 1e-9);
        assert!(s.side_ratio > 1.0);
    }

    #[test]
    fn label_formats_origin_corner() {
        let mut q = square(5.0);
        q[0] = Point2::new(12.345, 6.78);
        assert_eq!(coordinate_label(&q), "(12.3, 6.8)");
    }

    #[test]
    fn overlay_outlines_and_clips() {
        let mut canvas = GrayImage::filled(20, 20, 0);
        let q = [
            Point2::new(4.5, 4.5),
            Point2::new(14.5, 4.5),
            Point2::new(14.5, 14.5),
            Point2::new(4.5, 14.5),
        ];
        draw_fiducial_overlay(&mut canvas, &q, 255);
        assert_eq!(canvas.get(9, 4), 255);
        assert_eq!(canvas.get(14, 9), 255);
        assert_eq!(canvas.get(2, 2), 255); // origin marker
        assert_eq!(canvas.get(9, 9), 0);

        // a quad running off the canvas does not panic
        let off = square(40.0).map(|p| Point2::new(p.x - 10.0, p.y + 5.0));
        draw_fiducial_overlay(&mut canvas, &off, 128);
        assert_eq!(canvas.get(0, 5), 128);
    }
}
