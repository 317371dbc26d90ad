//! Raster tiles: sine patterns, the black/white reference strip.

use sinemtf_core::{GrayImage, MM_PER_INCH};
use std::f64::consts::PI;

/// Sine period in printed pixels; kept fractional.
#[inline]
pub fn period_px(lpmm: f64, dpi: f64) -> f64 {
    dpi / (MM_PER_INCH * lpmm)
}

/// One row of a sine tile, quantized to 8 bits.
///
/// Pixel `c` covers `[c, c+1)` along the tile. With `subpixel_samples > 1`
/// it integrates that many samples at the cell midpoints
/// `(2k+1) / (2 * samples)`, weighted by a Gaussian centred on the pixel
/// (σ = 1/6 px); otherwise it samples the pixel center. The profile is then
/// stretched to the full `0..=255` range.
pub fn sine_profile(lpmm: f64, length_px: usize, dpi: f64, subpixel_samples: usize) -> Vec<u8> {
    let period = period_px(lpmm, dpi);
    let samples = subpixel_samples.max(1);
    let sigma = 0.5 / 3.0;
    let taps: Vec<(f64, f64)> = (0..samples)
        .map(|k| {
            let offset = (2 * k + 1) as f64 / (2 * samples) as f64;
            let z = (offset - 0.5) / sigma;
            (offset, (-0.5 * z * z).exp())
        })
        .collect();
    let weight_sum: f64 = taps.iter().map(|(_, w)| w).sum();

    let raw: Vec<f64> = (0..length_px)
        .map(|c| {
            let acc: f64 = taps
                .iter()
                .map(|&(o, w)| w * (2.0 * PI * (c as f64 + o) / period).sin())
                .sum();
            0.5 + 0.5 * acc / weight_sum
        })
        .collect();

    let lo = raw.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = raw.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = hi - lo;
    raw.iter()
        .map(|&v| {
            let n = if span > 1e-12 { (v - lo) / span } else { 0.5 };
            (n.clamp(0.0, 1.0) * 255.0).round() as u8
        })
        .collect()
}

fn repeat_rows(row: &[u8], height: usize) -> GrayImage {
    let mut data = Vec::with_capacity(row.len() * height);
    for _ in 0..height {
        data.extend_from_slice(row);
    }
    GrayImage {
        width: row.len(),
        height,
        data,
    }
}

/// A `length_px × height_px` tile whose intensity varies sinusoidally along x.
pub fn draw_sine_tile(
    lpmm: f64,
    length_px: usize,
    height_px: usize,
    dpi: f64,
    subpixel_samples: usize,
) -> GrayImage {
    repeat_rows(&sine_profile(lpmm, length_px, dpi, subpixel_samples), height_px)
}

/// Sine tiles stacked top to bottom in frequency order (unrotated).
pub fn draw_sine_block(
    frequencies_lpmm: &[f64],
    length_px: usize,
    tile_height_px: usize,
    dpi: f64,
    subpixel_samples: usize,
) -> GrayImage {
    let mut block = GrayImage::filled(length_px, tile_height_px * frequencies_lpmm.len(), 255);
    for (a, &lpmm) in frequencies_lpmm.iter().enumerate() {
        let tile = draw_sine_tile(lpmm, length_px, tile_height_px, dpi, subpixel_samples);
        block.paste(&tile, 0, a * tile_height_px);
    }
    block
}

/// Black/white reference strip.
///
/// The leftmost `round(width / 4)` columns are 0, the rightmost as many are
/// 255, and the columns between ramp linearly from 0 to 255 inclusive.
pub fn draw_reference_strip(width: usize, height: usize) -> GrayImage {
    let head = (width as f64 / 4.0).round() as usize;
    let ramp = width.saturating_sub(2 * head);
    let mut row = Vec::with_capacity(width);
    row.extend(std::iter::repeat_n(0u8, head.min(width)));
    for i in 0..ramp {
        let t = if ramp > 1 {
            i as f64 / (ramp - 1) as f64
        } else {
            0.0
        };
        row.push((t * 255.0).round() as u8);
    }
    row.extend(std::iter::repeat_n(255u8, width - row.len()));
    repeat_rows(&row, height)
}

/// Rotate by 90° counter-clockwise: row `i` of the result is column
/// `width - 1 - i` of the input.
pub fn rotate_ccw(src: &GrayImage) -> GrayImage {
    let (w, h) = (src.width, src.height);
    let mut out = GrayImage::filled(h, w, 0);
    for i in 0..w {
        for j in 0..h {
            out.set(j, i, src.get(w - 1 - i, j));
        }
    }
    out
}
