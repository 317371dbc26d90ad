//! Contrast calibration and windowed-spectrum MTF.

use crate::{CalibrationError, MtfError, MtfParams};
use rustfft::{num_complex::Complex, FftPlanner};
use serde::{Deserialize, Serialize};
use sinemtf_core::{remove_bezel, BezelAxes, ConfigurationError, FloatImage};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Black/white calibration of a capture.
///
/// `common` is the mid-gray level, `differential` half the white-minus-black
/// swing, both in normalized intensity.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReferenceModes {
    pub common: f64,
    pub differential: f64,
}

impl Default for ReferenceModes {
    /// An ideal capture of a full-range print.
    fn default() -> Self {
        Self {
            common: 0.5,
            differential: 0.5,
        }
    }
}

/// Average the black and white ends of a reference strip.
///
/// The strip's leftmost and rightmost `width / 4` columns are taken as the
/// black and white blocks; each is bezel-trimmed on both axes before
/// averaging.
pub fn estimate_reference_modes(
    reference: &FloatImage,
    params: &MtfParams,
) -> Result<ReferenceModes, MtfError> {
    params.validate()?;
    let too_small = CalibrationError::ReferenceTooSmall {
        width: reference.width,
        height: reference.height,
    };
    let sub_w = reference.width / 4;
    if sub_w == 0 || reference.height == 0 {
        return Err(too_small.into());
    }

    let block_mean = |x: usize| {
        let block = remove_bezel(
            &reference.crop(x, 0, sub_w, reference.height),
            params.bezel_ratio,
            BezelAxes::Both,
        );
        block.block_mean(0, block.width, 0, block.height)
    };
    let (Some(black), Some(white)) = (block_mean(0), block_mean(reference.width - sub_w)) else {
        return Err(too_small.into());
    };

    let modes = ReferenceModes {
        common: 0.5 * (black + white),
        differential: 0.5 * (white - black),
    };
    log::debug!(
        "reference: black={black:.4} white={white:.4} common={:.4} differential={:.4}",
        modes.common,
        modes.differential
    );
    if !(modes.differential.abs() >= params.min_differential) {
        return Err(CalibrationError::FlatReference {
            differential: modes.differential,
        }
        .into());
    }
    Ok(modes)
}

/// Signed DFT frequency of bin `k` out of `n` at sample spacing `d`.
#[inline]
fn fft_frequency(k: usize, n: usize, d: f64) -> f64 {
    let k = if k < n.div_ceil(2) {
        k as f64
    } else {
        k as f64 - n as f64
    };
    k / (n as f64 * d)
}

/// Modulation transfer at `target_lpmm` from one resampled sine tile.
///
/// The tile is bezel-trimmed and normalized to `(v - common) / differential`.
/// Its 2-D spectrum, scaled so that a unit sine along x has magnitude 1 at
/// its one-sided peak, is integrated in power over the bins with
/// `|fx - f| <= f * bandwidth_ratio` (`fx >= 0`) and
/// `|fy| <= f * bandwidth_ratio`; the result is the root of that power.
/// Values above 1 are returned as measured.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(tile, modes, params), fields(w = tile.width, h = tile.height))
)]
pub fn estimate_mtf(
    tile: &FloatImage,
    target_lpmm: f64,
    pixel_pitch_mm: f64,
    modes: &ReferenceModes,
    params: &MtfParams,
) -> Result<f64, MtfError> {
    params.validate()?;
    if !(target_lpmm.is_finite() && target_lpmm > 0.0) {
        return Err(ConfigurationError::InvalidFrequency { lpmm: target_lpmm }.into());
    }
    if !(pixel_pitch_mm.is_finite() && pixel_pitch_mm > 0.0) {
        return Err(ConfigurationError::InvalidParameter {
            name: "pixel_pitch_mm",
            value: pixel_pitch_mm,
        }
        .into());
    }
    if !(modes.differential.is_finite() && modes.differential != 0.0) {
        return Err(CalibrationError::FlatReference {
            differential: modes.differential,
        }
        .into());
    }

    let trimmed = remove_bezel(tile, params.bezel_ratio, BezelAxes::Both);
    if trimmed.is_empty() {
        return Err(CalibrationError::EmptyTile {
            width: tile.width,
            height: tile.height,
        }
        .into());
    }
    let (w, h) = (trimmed.width, trimmed.height);
    let half_window = target_lpmm * params.bandwidth_ratio;

    let columns: Vec<usize> = (0..=w / 2)
        .filter(|&k| (fft_frequency(k, w, pixel_pitch_mm) - target_lpmm).abs() <= half_window)
        .collect();
    if columns.is_empty() {
        log::warn!(lpmm = target_lpmm; "no spectral bins within ±{half_window:.3} lp/mm");
        return Ok(0.0);
    }

    let mut planner = FftPlanner::<f64>::new();
    let row_fft = planner.plan_fft_forward(w);
    let col_fft = planner.plan_fft_forward(h);

    // selected columns of the row spectra, column-major
    let mut selected = vec![Complex::new(0.0, 0.0); columns.len() * h];
    let mut row = vec![Complex::new(0.0, 0.0); w];
    for y in 0..h {
        for (dst, &v) in row.iter_mut().zip(trimmed.row(y)) {
            *dst = Complex::new((v as f64 - modes.common) / modes.differential, 0.0);
        }
        row_fft.process(&mut row);
        for (j, &k) in columns.iter().enumerate() {
            selected[j * h + y] = row[k];
        }
    }

    let rows_in_window: Vec<usize> = (0..h)
        .filter(|&k| fft_frequency(k, h, pixel_pitch_mm).abs() <= half_window)
        .collect();
    let mut power = 0.0;
    for column in selected.chunks_mut(h) {
        col_fft.process(column);
        power += rows_in_window
            .iter()
            .map(|&k| column[k].norm_sqr())
            .sum::<f64>();
    }

    let scale = 2.0 / (h as f64 * w as f64);
    let mtf = power.sqrt() * scale;
    log::debug!(
        lpmm = target_lpmm;
        "{w}x{h} px, {} x {} bins, mtf={mtf:.4}",
        columns.len(),
        rows_in_window.len()
    );
    Ok(mtf)
}
