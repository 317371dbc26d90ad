//! Dictionary matching, rotation helpers and reading of rectified markers.

use crate::Dictionary;
use sinemtf_core::FloatImage;

/// A dictionary match for an observed marker code.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Match {
    /// Marker id in the dictionary.
    pub id: u32,
    /// Rotation `0..=3` such that: `observed_code == rotate(dict_code, rotation)`.
    pub rotation: u8,
    /// Hamming distance between observed and dictionary code (after rotation).
    pub hamming: u8,
}

/// Brute-force matcher over all ids and rotations.
#[derive(Clone, Debug)]
pub struct Matcher {
    dict: Dictionary,
    max_hamming: u8,
    rotated: Vec<[u64; 4]>,
}

impl Matcher {
    /// Returns `None` for dictionaries with more than 64 data bits.
    pub fn new(dict: Dictionary, max_hamming: u8) -> Option<Self> {
        if !dict.fits_u64() {
            return None;
        }
        let n = dict.marker_size;
        let rotated = dict
            .codes
            .iter()
            .map(|&base| {
                [
                    rotate_code_u64(base, n, 0),
                    rotate_code_u64(base, n, 1),
                    rotate_code_u64(base, n, 2),
                    rotate_code_u64(base, n, 3),
                ]
            })
            .collect();
        Some(Self {
            dict,
            max_hamming,
            rotated,
        })
    }

    #[inline]
    pub fn dictionary(&self) -> &Dictionary {
        &self.dict
    }

    /// Best match within `max_hamming`; the first exact hit wins.
    pub fn match_code(&self, observed: u64) -> Option<Match> {
        let mut best: Option<Match> = None;
        for (id, rots) in self.rotated.iter().enumerate() {
            for (rot, &cand) in rots.iter().enumerate() {
                let h = (observed ^ cand).count_ones() as u8;
                if h > self.max_hamming {
                    continue;
                }
                let m = Match {
                    id: id as u32,
                    rotation: rot as u8,
                    hamming: h,
                };
                if h == 0 {
                    return Some(m);
                }
                if best.is_none_or(|prev| h < prev.hamming) {
                    best = Some(m);
                }
            }
        }
        best
    }

    /// Read and match a marker from an image whose borders are the marker's outer edges.
    pub fn decode_rectified(&self, image: &FloatImage) -> Option<Match> {
        let code = read_marker_code(image, &self.dict)?;
        self.match_code(code)
    }
}

/// Rotate a code stored in row-major bits: `idx = y * N + x`.
pub fn rotate_code_u64(code: u64, n: usize, rot: u8) -> u64 {
    let rot = rot & 3;
    if rot == 0 {
        return code;
    }

    #[inline]
    fn get(code: u64, idx: usize) -> u64 {
        (code >> idx) & 1
    }

    let mut out = 0u64;
    for y in 0..n {
        for x in 0..n {
            let (sx, sy) = match rot {
                1 => (y, n - 1 - x),
                2 => (n - 1 - x, n - 1 - y),
                _ => (n - 1 - y, x),
            };
            out |= get(code, sy * n + sx) << (y * n + x);
        }
    }
    out
}

/// Sample module centers of a rectified marker and pack its data bits.
///
/// The threshold is the midpoint of the darkest and brightest module. Returns
/// `None` when the image is too small, has no contrast, or the frame is not
/// dark all around.
pub fn read_marker_code(image: &FloatImage, dict: &Dictionary) -> Option<u64> {
    let n = dict.modules_per_side();
    if image.width < n || image.height < n || !dict.fits_u64() {
        return None;
    }
    let cell_w = image.width as f64 / n as f64;
    let cell_h = image.height as f64 / n as f64;
    let mut values = Vec::with_capacity(n * n);
    for my in 0..n {
        for mx in 0..n {
            let px = (((mx as f64 + 0.5) * cell_w) as usize).min(image.width - 1);
            let py = (((my as f64 + 0.5) * cell_h) as usize).min(image.height - 1);
            values.push(image.get(px, py));
        }
    }
    let lo = values.iter().copied().fold(f32::INFINITY, f32::min);
    let hi = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    if !(hi - lo > 0.1) {
        return None;
    }
    let thr = 0.5 * (lo + hi);

    let b = dict.border_bits;
    let mut code = 0u64;
    for my in 0..n {
        for mx in 0..n {
            let white = values[my * n + mx] > thr;
            let in_frame = mx < b || my < b || mx >= n - b || my >= n - b;
            if in_frame {
                if white {
                    return None;
                }
            } else if white {
                code |= 1 << ((my - b) * dict.marker_size + (mx - b));
            }
        }
    }
    Some(code)
}
