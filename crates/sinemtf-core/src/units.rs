//! Print-resolution unit conversions.

/// Millimetres per inch.
pub const MM_PER_INCH: f64 = 25.4;

/// Convert a physical length to a whole number of printer dots.
#[inline]
pub fn mm_to_pixels(length_mm: f64, dpi: f64) -> i64 {
    (length_mm / MM_PER_INCH * dpi).round() as i64
}

/// Convert a pixel length (possibly fractional) back to millimetres.
///
/// Exact inverse of the unrounded conversion; a value that went through
/// [`mm_to_pixels`] comes back within half a pixel.
#[inline]
pub fn pixels_to_mm(px: f64, dpi: f64) -> f64 {
    px / dpi * MM_PER_INCH
}

/// Pixel pitch in mm for a given print resolution.
#[inline]
pub fn dpi_to_pixel_pitch(dpi: f64) -> f64 {
    MM_PER_INCH / dpi
}

/// Print resolution for a given pixel pitch in mm.
#[inline]
pub fn pixel_pitch_to_dpi(pitch_mm: f64) -> f64 {
    MM_PER_INCH / pitch_mm
}
