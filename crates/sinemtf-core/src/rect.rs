//! Rotated rectangles (`xywhr`) and resampling canvases.

use crate::{AffineMap, GeometryError};
use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};

/// A rectangle placed in some pixel space.
///
/// `(x, y)` is the rectangle's own top-left corner, `width`/`height` are its
/// side lengths in its own frame, and `rotation` turns the width edge
/// clockwise (radians, image `y` axis pointing down).
///
/// Serialized as the 5-element array `[x, y, w, h, r]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 5]", into = "[f64; 5]")]
pub struct Xywhr {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub rotation: f64,
}

impl From<[f64; 5]> for Xywhr {
    fn from(v: [f64; 5]) -> Self {
        Self::new(v[0], v[1], v[2], v[3], v[4])
    }
}

impl From<Xywhr> for [f64; 5] {
    fn from(r: Xywhr) -> Self {
        [r.x, r.y, r.width, r.height, r.rotation]
    }
}

impl Xywhr {
    pub const fn new(x: f64, y: f64, width: f64, height: f64, rotation: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
            rotation,
        }
    }

    /// Axis-aligned rectangle.
    pub const fn axis_aligned(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::new(x, y, width, height, 0.0)
    }

    #[inline]
    pub fn origin(&self) -> Point2<f64> {
        Point2::new(self.x, self.y)
    }

    /// Image of the local `(width, 0)` vector.
    #[inline]
    pub fn u_vec(&self) -> Vector2<f64> {
        let (s, c) = self.rotation.sin_cos();
        Vector2::new(c * self.width, s * self.width)
    }

    /// Image of the local `(0, height)` vector.
    #[inline]
    pub fn v_vec(&self) -> Vector2<f64> {
        let (s, c) = self.rotation.sin_cos();
        Vector2::new(-s * self.height, c * self.height)
    }

    /// Finite, with strictly positive sides.
    pub fn is_valid(&self) -> bool {
        [self.x, self.y, self.width, self.height, self.rotation]
            .iter()
            .all(|v| v.is_finite())
            && self.width > 0.0
            && self.height > 0.0
    }

    /// Split along the height into `n` equal sub-rectangles, top to bottom.
    pub fn split_rows(&self, n: usize) -> Vec<Xywhr> {
        if n == 0 {
            return Vec::new();
        }
        let v = self.v_vec();
        let h = self.height / n as f64;
        (0..n)
            .map(|a| {
                let o = self.origin() + v * (a as f64 / n as f64);
                Xywhr::new(o.x, o.y, self.width, h, self.rotation)
            })
            .collect()
    }

    /// Axis-aligned bounding box `[min_x, min_y, max_x, max_y]` of the corners.
    pub fn bounding_box(&self) -> [f64; 4] {
        let c = rect_to_corners(self);
        let mut bb = [f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY];
        for p in &c {
            bb[0] = bb[0].min(p.x);
            bb[1] = bb[1].min(p.y);
            bb[2] = bb[2].max(p.x);
            bb[3] = bb[3].max(p.y);
        }
        bb
    }
}

/// Corners of a rectangle: top-left, top-right, bottom-right, bottom-left.
pub fn rect_to_corners(r: &Xywhr) -> [Point2<f64>; 4] {
    let o = r.origin();
    let u = r.u_vec();
    let v = r.v_vec();
    [o, o + u, o + u + v, o + v]
}

/// Signed shoelace area of a polygon (positive for clockwise order in image coords).
pub fn polygon_area(pts: &[Point2<f64>]) -> f64 {
    let n = pts.len();
    if n < 3 {
        return 0.0;
    }
    let mut acc = 0.0;
    for i in 0..n {
        let a = pts[i];
        let b = pts[(i + 1) % n];
        acc += a.x * b.y - b.x * a.y;
    }
    0.5 * acc
}

/// Output canvas of a crop: the map into the canvas and the canvas size.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResampleCanvas {
    /// Maps source-space points into canvas pixels.
    pub map: AffineMap,
    pub width: usize,
    pub height: usize,
}

/// Build the map that cuts `rect` out of its space and scales its width to
/// `target_width` pixels.
///
/// The rectangle's corner goes to the origin, its width edge becomes
/// horizontal and the scale is isotropic; the canvas height is
/// `round(height * target_width / width)`.
pub fn crop_rect_and_scale(
    rect: &Xywhr,
    target_width: usize,
) -> Result<ResampleCanvas, GeometryError> {
    if !rect.is_valid() || target_width == 0 {
        return Err(GeometryError::DegenerateRect);
    }
    let s = target_width as f64 / rect.width;
    let height = (rect.height * s).round().max(0.0) as usize;
    if height == 0 {
        return Err(GeometryError::DegenerateRect);
    }
    let map = AffineMap::translation(-rect.x, -rect.y)
        .then(&AffineMap::rotation(-rect.rotation))
        .then(&AffineMap::scaling(s));
    Ok(ResampleCanvas {
        map,
        width: target_width,
        height,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    fn assert_pt(a: Point2<f64>, b: Point2<f64>) {
        assert_relative_eq!(a.x, b.x, epsilon = 1e-9);
        assert_relative_eq!(a.y, b.y, epsilon = 1e-9);
    }

    #[test]
    fn corners_are_clockwise_from_top_left() {
        let c = rect_to_corners(&Xywhr::axis_aligned(10.0, 20.0, 30.0, 40.0));
        assert_pt(c[0], Point2::new(10.0, 20.0));
        assert_pt(c[1], Point2::new(40.0, 20.0));
        assert_pt(c[2], Point2::new(40.0, 60.0));
        assert_pt(c[3], Point2::new(10.0, 60.0));
        assert!(polygon_area(&c) > 0.0);
    }

    #[test]
    fn negative_quarter_turn_points_width_up() {
        // the sine block layout: origin at the bottom-left, width running upwards
        let r = Xywhr::new(0.0, 100.0, 100.0, 30.0, -FRAC_PI_2);
        let c = rect_to_corners(&r);
        assert_pt(c[1], Point2::new(0.0, 0.0));
        assert_pt(c[2], Point2::new(30.0, 0.0));
        assert_pt(c[3], Point2::new(30.0, 100.0));
        assert_eq!(r.bounding_box().map(|v| v.round()), [0.0, 0.0, 30.0, 100.0]);
    }

    #[test]
    fn split_rows_walks_along_height() {
        let r = Xywhr::new(0.0, 100.0, 100.0, 30.0, -FRAC_PI_2);
        let parts = r.split_rows(3);
        assert_eq!(parts.len(), 3);
        assert_relative_eq!(parts[1].x, 10.0, epsilon = 1e-9);
        assert_relative_eq!(parts[2].x, 20.0, epsilon = 1e-9);
        assert_relative_eq!(parts[2].y, 100.0, epsilon = 1e-9);
        assert_relative_eq!(parts[0].height, 10.0);
    }

    #[test]
    fn crop_maps_rect_onto_canvas() {
        let r = Xywhr::new(50.0, 20.0, 40.0, 10.0, 0.3);
        let canvas = crop_rect_and_scale(&r, 80).expect("canvas");
        assert_eq!((canvas.width, canvas.height), (80, 20));
        let c = rect_to_corners(&r);
        assert_pt(canvas.map.apply(c[0]), Point2::new(0.0, 0.0));
        assert_pt(canvas.map.apply(c[1]), Point2::new(80.0, 0.0));
        assert_pt(canvas.map.apply(c[2]), Point2::new(80.0, 20.0));
        assert_pt(canvas.map.apply(c[3]), Point2::new(0.0, 20.0));
    }

    #[test]
    fn crop_rejects_degenerate_input() {
        assert!(crop_rect_and_scale(&Xywhr::axis_aligned(0.0, 0.0, 0.0, 5.0), 10).is_err());
        assert!(crop_rect_and_scale(&Xywhr::axis_aligned(0.0, 0.0, 5.0, 5.0), 0).is_err());
    }

    #[test]
    fn serializes_as_array() {
        let r = Xywhr::new(1.0, 2.0, 3.0, 4.0, 0.5);
        let json = serde_json::to_string(&r).expect("json");
        assert_eq!(json, "[1.0,2.0,3.0,4.0,0.5]");
        let back: Xywhr = serde_json::from_str(&json).expect("parse");
        assert_eq!(back, r);
    }
}
