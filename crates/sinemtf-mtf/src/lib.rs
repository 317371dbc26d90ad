//! Rectification of chart regions and MTF estimation.
//!
//! Given a photograph, the detected corners of the chart's fiducial and the
//! chart description, [`extract_tiles`] resamples every sine tile and the
//! reference strip onto canvases of known pixel pitch. [`estimate_chart_mtf`]
//! then calibrates contrast on the reference strip and measures the
//! modulation transfer of each tile from its windowed 2-D spectrum.
//!
//! ```no_run
//! use sinemtf_core::{ChartDescription, GrayImage, Point2};
//! use sinemtf_mtf::{estimate_chart_mtf, extract_tiles, MtfParams, RectifierParams};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let description = ChartDescription::load_json("chart_description.json")?;
//! let photo = GrayImage::filled(640, 480, 0);
//! let corners = [
//!     Point2::new(100.0, 100.0),
//!     Point2::new(200.0, 100.0),
//!     Point2::new(200.0, 200.0),
//!     Point2::new(100.0, 200.0),
//! ];
//! let tiles = extract_tiles(&photo.view(), &corners, &description, &RectifierParams::default())?;
//! let report = estimate_chart_mtf(&tiles, &MtfParams::default())?;
//! for r in &report.results {
//!     println!("{} lp/mm: {:.3}", r.lpmm, r.mtf);
//! }
//! # Ok(())
//! # }
//! ```

mod error;
mod estimate;
mod params;
mod rectify;
mod report;

pub use error::{CalibrationError, MtfError};
pub use estimate::{estimate_mtf, estimate_reference_modes, ReferenceModes};
pub use params::{MtfParams, RectifierParams};
pub use rectify::{
    extract_region, extract_tiles, ExtractedTile, FitDiagnostics, Rectification, TileKind,
};
pub use report::{estimate_chart_mtf, MtfReport, MtfResult};
