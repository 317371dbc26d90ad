//! Gray and float images, sampling and affine warps.
//!
//! Coordinates passed to the samplers are continuous: pixel `(c, r)` covers
//! `[c, c+1) × [r, r+1)` and its value lives at the center `(c+0.5, r+0.5)`.
//! Reads outside the image return 0.

use crate::AffineMap;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug)]
pub struct GrayImageView<'a> {
    pub width: usize,
    pub height: usize,
    pub data: &'a [u8], // row-major, len = w*h
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GrayImage {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl GrayImage {
    /// Image filled with a constant value.
    pub fn filled(width: usize, height: usize, value: u8) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }

    /// Wrap a row-major buffer; `None` if its length is not `width * height`.
    pub fn from_raw(width: usize, height: usize, data: Vec<u8>) -> Option<Self> {
        (data.len() == width * height).then_some(Self {
            width,
            height,
            data,
        })
    }

    pub fn view(&self) -> GrayImageView<'_> {
        GrayImageView {
            width: self.width,
            height: self.height,
            data: &self.data,
        }
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.width + x]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, v: u8) {
        self.data[y * self.width + x] = v;
    }

    /// Copy `src` into `self` with its top-left at `(x, y)`, clipping at the borders.
    pub fn paste(&mut self, src: &GrayImage, x: usize, y: usize) {
        let w = src.width.min(self.width.saturating_sub(x));
        let h = src.height.min(self.height.saturating_sub(y));
        for r in 0..h {
            let dst = (y + r) * self.width + x;
            self.data[dst..dst + w].copy_from_slice(&src.data[r * src.width..r * src.width + w]);
        }
    }

    /// Sub-image `[x, x+w) × [y, y+h)`, clipped to the image.
    pub fn crop(&self, x: usize, y: usize, w: usize, h: usize) -> GrayImage {
        let w = w.min(self.width.saturating_sub(x));
        let h = h.min(self.height.saturating_sub(y));
        let mut data = Vec::with_capacity(w * h);
        for r in y..y + h {
            data.extend_from_slice(&self.data[r * self.width + x..r * self.width + x + w]);
        }
        GrayImage {
            width: w,
            height: h,
            data,
        }
    }
}

/// Row-major `f32` image.
#[derive(Clone, Debug, PartialEq)]
pub struct FloatImage {
    pub width: usize,
    pub height: usize,
    pub data: Vec<f32>,
}

impl FloatImage {
    pub fn zeros(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0.0; width * height],
        }
    }

    /// Build an image by evaluating `f(x, y)` at every pixel index.
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> f32) -> Self {
        let mut data = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            data,
        }
    }

    /// Scale an 8-bit image into `[0, 1]`.
    pub fn from_gray(src: &GrayImageView<'_>) -> Self {
        Self {
            width: src.width,
            height: src.height,
            data: src.data.iter().map(|&v| v as f32 / 255.0).collect(),
        }
    }

    /// Quantize `[0, 1]` values back to 8 bits.
    pub fn to_gray(&self) -> GrayImage {
        GrayImage {
            width: self.width,
            height: self.height,
            data: self
                .data
                .iter()
                .map(|&v| (v * 255.0).round().clamp(0.0, 255.0) as u8)
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.data[y * self.width + x]
    }

    #[inline]
    pub fn row(&self, y: usize) -> &[f32] {
        &self.data[y * self.width..(y + 1) * self.width]
    }

    /// Mean over the block `[x0, x1) × [y0, y1)`; `None` for an empty block.
    pub fn block_mean(&self, x0: usize, x1: usize, y0: usize, y1: usize) -> Option<f64> {
        let x1 = x1.min(self.width);
        let y1 = y1.min(self.height);
        if x0 >= x1 || y0 >= y1 {
            return None;
        }
        let mut acc = 0.0f64;
        for y in y0..y1 {
            acc += self.row(y)[x0..x1].iter().map(|&v| v as f64).sum::<f64>();
        }
        Some(acc / ((x1 - x0) * (y1 - y0)) as f64)
    }

    pub fn crop(&self, x: usize, y: usize, w: usize, h: usize) -> FloatImage {
        let w = w.min(self.width.saturating_sub(x));
        let h = h.min(self.height.saturating_sub(y));
        let mut data = Vec::with_capacity(w * h);
        for r in y..y + h {
            data.extend_from_slice(&self.row(r)[x..x + w]);
        }
        FloatImage {
            width: w,
            height: h,
            data,
        }
    }
}

/// Resampling kernel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Interpolation {
    Nearest,
    Bilinear,
    /// Catmull-Rom cubic convolution (`a = -0.5`).
    #[default]
    Bicubic,
}

#[inline]
fn get_gray(src: &GrayImageView<'_>, x: i64, y: i64) -> f32 {
    if x < 0 || y < 0 || x >= src.width as i64 || y >= src.height as i64 {
        return 0.0;
    }
    src.data[y as usize * src.width + x as usize] as f32
}

#[inline]
pub fn sample_nearest(src: &GrayImageView<'_>, x: f64, y: f64) -> f32 {
    get_gray(src, x.floor() as i64, y.floor() as i64)
}

#[inline]
pub fn sample_bilinear(src: &GrayImageView<'_>, x: f64, y: f64) -> f32 {
    let xs = x - 0.5;
    let ys = y - 0.5;
    let x0 = xs.floor() as i64;
    let y0 = ys.floor() as i64;
    let fx = (xs - x0 as f64) as f32;
    let fy = (ys - y0 as f64) as f32;

    let p00 = get_gray(src, x0, y0);
    let p10 = get_gray(src, x0 + 1, y0);
    let p01 = get_gray(src, x0, y0 + 1);
    let p11 = get_gray(src, x0 + 1, y0 + 1);

    let a = p00 + fx * (p10 - p00);
    let b = p01 + fx * (p11 - p01);
    a + fy * (b - a)
}

const CUBIC_A: f64 = -0.5;

#[inline]
fn cubic_weight(t: f64) -> f64 {
    let t = t.abs();
    if t <= 1.0 {
        ((CUBIC_A + 2.0) * t - (CUBIC_A + 3.0)) * t * t + 1.0
    } else if t < 2.0 {
        ((CUBIC_A * t - 5.0 * CUBIC_A) * t + 8.0 * CUBIC_A) * t - 4.0 * CUBIC_A
    } else {
        0.0
    }
}

/// Catmull-Rom bicubic sample. The result is not clamped and may overshoot
/// the input range near edges.
#[inline]
pub fn sample_bicubic(src: &GrayImageView<'_>, x: f64, y: f64) -> f32 {
    let xs = x - 0.5;
    let ys = y - 0.5;
    let x0 = xs.floor();
    let y0 = ys.floor();
    let fx = xs - x0;
    let fy = ys - y0;
    let (x0, y0) = (x0 as i64, y0 as i64);

    let wx = [
        cubic_weight(fx + 1.0),
        cubic_weight(fx),
        cubic_weight(1.0 - fx),
        cubic_weight(2.0 - fx),
    ];
    let wy = [
        cubic_weight(fy + 1.0),
        cubic_weight(fy),
        cubic_weight(1.0 - fy),
        cubic_weight(2.0 - fy),
    ];

    let mut acc = 0.0f64;
    for (j, wyj) in wy.iter().enumerate() {
        let yy = y0 - 1 + j as i64;
        let mut row = 0.0f64;
        for (i, wxi) in wx.iter().enumerate() {
            row += wxi * get_gray(src, x0 - 1 + i as i64, yy) as f64;
        }
        acc += wyj * row;
    }
    acc as f32
}

#[inline]
pub fn sample(src: &GrayImageView<'_>, x: f64, y: f64, interpolation: Interpolation) -> f32 {
    match interpolation {
        Interpolation::Nearest => sample_nearest(src, x, y),
        Interpolation::Bilinear => sample_bilinear(src, x, y),
        Interpolation::Bicubic => sample_bicubic(src, x, y),
    }
}

/// Resample `src` onto a `width × height` canvas.
///
/// `h_src_from_dst` maps canvas coordinates into `src`; every canvas pixel
/// center is pulled through it. Values are scaled into `[0, 1]`; samples
/// outside `src` read as 0.
pub fn warp_affine(
    src: &GrayImageView<'_>,
    h_src_from_dst: &AffineMap,
    width: usize,
    height: usize,
    interpolation: Interpolation,
) -> FloatImage {
    FloatImage::from_fn(width, height, |x, y| {
        let p = h_src_from_dst.apply(Point2::new(x as f64 + 0.5, y as f64 + 0.5));
        sample(src, p.x, p.y, interpolation) / 255.0
    })
}

/// 8-bit variant of [`warp_affine`], rounding and clamping to `0..=255`.
pub fn warp_affine_gray(
    src: &GrayImageView<'_>,
    h_src_from_dst: &AffineMap,
    width: usize,
    height: usize,
    interpolation: Interpolation,
) -> GrayImage {
    let mut data = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            let p = h_src_from_dst.apply(Point2::new(x as f64 + 0.5, y as f64 + 0.5));
            let v = sample(src, p.x, p.y, interpolation);
            data.push(v.round().clamp(0.0, 255.0) as u8);
        }
    }
    GrayImage {
        width,
        height,
        data,
    }
}

/// Axes trimmed by [`remove_bezel`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BezelAxes {
    #[default]
    Both,
    Horizontal,
    Vertical,
}

/// Drop `round(len * ratio)` samples from both ends of the selected axes.
///
/// `Horizontal` trims columns, `Vertical` trims rows. The result may be empty.
pub fn remove_bezel(image: &FloatImage, ratio: f64, axes: BezelAxes) -> FloatImage {
    let trim = |len: usize| ((len as f64 * ratio).round().max(0.0) as usize).min(len);
    let (bx, by) = match axes {
        BezelAxes::Both => (trim(image.width), trim(image.height)),
        BezelAxes::Horizontal => (trim(image.width), 0),
        BezelAxes::Vertical => (0, trim(image.height)),
    };
    let w = image.width.saturating_sub(2 * bx);
    let h = image.height.saturating_sub(2 * by);
    image.crop(bx, by, w, h)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(w: usize, h: usize) -> GrayImage {
        let mut img = GrayImage::filled(w, h, 0);
        for y in 0..h {
            for x in 0..w {
                img.set(x, y, (10 * x + y) as u8);
            }
        }
        img
    }

    #[test]
    fn samplers_hit_pixel_centers_exactly() {
        let img = ramp(8, 6);
        let v = img.view();
        for (x, y) in [(1usize, 1usize), (3, 2), (6, 4)] {
            let (cx, cy) = (x as f64 + 0.5, y as f64 + 0.5);
            let want = img.get(x, y) as f32;
            assert_eq!(sample_nearest(&v, cx, cy), want);
            assert!((sample_bilinear(&v, cx, cy) - want).abs() < 1e-4);
            assert!((sample_bicubic(&v, cx, cy) - want).abs() < 1e-4);
        }
    }

    #[test]
    fn interpolators_reproduce_linear_ramps() {
        let img = ramp(10, 10);
        let v = img.view();
        // interior points, away from the zero border
        for &(x, y) in &[(3.2, 4.7), (5.5, 5.0), (6.9, 3.1)] {
            let want = (10.0 * (x - 0.5) + (y - 0.5)) as f32;
            assert!((sample_bilinear(&v, x, y) - want).abs() < 1e-3);
            assert!((sample_bicubic(&v, x, y) - want).abs() < 1e-3);
        }
    }

    #[test]
    fn outside_reads_as_zero() {
        let img = GrayImage::filled(4, 4, 200);
        let v = img.view();
        assert_eq!(sample_bilinear(&v, -3.0, 2.0), 0.0);
        assert_eq!(sample_bicubic(&v, 2.0, 40.0), 0.0);
    }

    #[test]
    fn identity_warp_copies_and_normalizes() {
        let img = ramp(7, 5);
        let out = warp_affine(&img.view(), &AffineMap::identity(), 7, 5, Interpolation::Bicubic);
        for y in 0..5 {
            for x in 0..7 {
                assert!((out.get(x, y) - img.get(x, y) as f32 / 255.0).abs() < 1e-6);
            }
        }
        let g = warp_affine_gray(&img.view(), &AffineMap::identity(), 7, 5, Interpolation::Bilinear);
        assert_eq!(g, img);
    }

    #[test]
    fn translation_warp_shifts_content() {
        let img = ramp(8, 8);
        let shift = AffineMap::translation(2.0, 1.0);
        let out = warp_affine_gray(&img.view(), &shift, 4, 4, Interpolation::Nearest);
        assert_eq!(out.get(0, 0), img.get(2, 1));
        assert_eq!(out.get(3, 2), img.get(5, 3));
    }

    #[test]
    fn bezel_trims_selected_axes() {
        let img = FloatImage::from_fn(20, 10, |x, y| (x + 100 * y) as f32);
        let both = remove_bezel(&img, 0.1, BezelAxes::Both);
        assert_eq!((both.width, both.height), (16, 8));
        assert_eq!(both.get(0, 0), 2.0 + 100.0);
        let h = remove_bezel(&img, 0.1, BezelAxes::Horizontal);
        assert_eq!((h.width, h.height), (16, 10));
        let v = remove_bezel(&img, 0.25, BezelAxes::Vertical);
        assert_eq!((v.width, v.height), (20, 4));
        assert_eq!(v.get(0, 0), 300.0);
        assert!(remove_bezel(&img, 0.5, BezelAxes::Both).is_empty());
    }

    #[test]
    fn paste_and_crop_agree() {
        let tile = ramp(3, 2);
        let mut canvas = GrayImage::filled(10, 10, 255);
        canvas.paste(&tile, 4, 7);
        assert_eq!(canvas.crop(4, 7, 3, 2), tile);
        assert_eq!(canvas.get(3, 7), 255);
        // clipped at the border
        canvas.paste(&tile, 9, 9);
        assert_eq!(canvas.get(9, 9), tile.get(0, 0));
    }

    #[test]
    fn block_mean_averages_region() {
        let img = FloatImage::from_fn(4, 4, |x, _| x as f32);
        assert_eq!(img.block_mean(0, 2, 0, 4), Some(0.5));
        assert_eq!(img.block_mean(3, 3, 0, 4), None);
    }
}
