//! Geometry, image and chart-description primitives for sine-chart MTF
//! measurement.
//!
//! Everything here is pure and synchronous: no detector, no file format
//! beyond JSON, no global state besides the optional logger.

mod affine;
mod description;
mod error;
mod image;
mod logger;
mod rect;
mod units;

pub use affine::{
    estimate_affine_lmeds, estimate_rect_to_rect_affine, AffineFit, AffineMap, AffineModel,
    FitDirection, FitParams,
};
pub use description::{
    ChartDescription, FiducialRegion, ReferenceStrip, SineBlock, SizeMm, SizePx,
};
pub use error::{ConfigurationError, GeometryError, JsonIoError};
pub use image::{
    remove_bezel, sample, sample_bicubic, sample_bilinear, sample_nearest, warp_affine,
    warp_affine_gray, BezelAxes, FloatImage, GrayImage, GrayImageView, Interpolation,
};
pub use rect::{crop_rect_and_scale, polygon_area, rect_to_corners, ResampleCanvas, Xywhr};
pub use units::{
    dpi_to_pixel_pitch, mm_to_pixels, pixel_pitch_to_dpi, pixels_to_mm, MM_PER_INCH,
};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::{init_logger, init_with_level, LogConfig};

pub use nalgebra::Point2;
