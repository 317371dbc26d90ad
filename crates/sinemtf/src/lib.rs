//! High-level facade crate for the `sinemtf-*` workspace.
//!
//! This crate provides:
//! - re-exports of the underlying crates,
//! - the frame-level pipeline: pick the chart fiducial from marker
//!   detections, rectify the chart regions and estimate MTF per frequency,
//! - fiducial overlays for visual checks,
//! - (feature `image`) file-level helpers that decode a photograph and run
//!   an analysis described by a JSON config.
//!
//! ## Quickstart
//!
//! ```no_run
//! use sinemtf::aruco::RecordedDetections;
//! use sinemtf::core::ChartDescription;
//! use sinemtf::{analyze_frame, load_gray, AnalyzeParams};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let photo = load_gray("shot.png")?;
//! let description = ChartDescription::load_json("chart_description.json")?;
//! let detections = RecordedDetections::load_json("detections.json")?;
//!
//! let analysis = analyze_frame(
//!     &photo.view(),
//!     &detections.0,
//!     &description,
//!     &AnalyzeParams::default(),
//! )?;
//! for r in &analysis.report.results {
//!     println!("{:>6.2} lp/mm  MTF {:.3}", r.lpmm, r.mtf);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `sinemtf::core`: units, rectangles, affine fitting, images, chart descriptions.
//! - `sinemtf::aruco`: fiducial dictionaries, marker rendering, detector interface.
//! - `sinemtf::print`: chart generation.
//! - `sinemtf::mtf`: region rectification and MTF estimation.

pub use sinemtf_aruco as aruco;
pub use sinemtf_core as core;
pub use sinemtf_mtf as mtf;
pub use sinemtf_print as print;

mod analyze;
mod io;
mod overlay;

pub use analyze::{
    analyze_detection, analyze_frame, analyze_with_detector, decode_fiducial, AnalyzeError,
    AnalyzeParams, FrameAnalysis,
};
pub use io::AnalyzeConfig;
#[cfg(feature = "image")]
pub use io::{gray_view, load_gray, run_analysis};
pub use overlay::{
    coordinate_label, draw_coordinate_label, draw_fiducial_overlay, fiducial_squareness,
    Squareness,
};

pub use sinemtf_mtf::{MtfParams, MtfReport, MtfResult, RectifierParams, ReferenceModes};
pub use sinemtf_print::{generate_chart, ChartLayout, ChartSpec};
