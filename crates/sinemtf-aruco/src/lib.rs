//! ArUco dictionaries for the chart fiducial.
//!
//! This crate covers:
//! - packed dictionaries (a built-in `4X4_50` plus JSON-loaded custom ones),
//! - rendering marker bitmaps through [`MarkerRenderer`],
//! - reading back markers from rectified images,
//! - the [`MarkerDetector`] interface consumed by the analysis pipeline.
//!
//! It does **not** find markers in photographs; a detector is supplied by
//! the caller.

pub mod builtins;
mod detection;
mod dictionary;
mod matcher;
mod render;

pub use detection::{select_marker, MarkerDetection, MarkerDetector, RecordedDetections};
pub use dictionary::Dictionary;
pub use matcher::{read_marker_code, rotate_code_u64, Match, Matcher};
pub use render::{MarkerError, MarkerRenderer};
