//! Printable sine MTF charts.
//!
//! A chart carries one fiducial marker, a block of sine tiles (one per
//! spatial frequency) and a black/white reference strip. [`generate_chart`]
//! renders the bitmap and the [`ChartDescription`](sinemtf_core::ChartDescription)
//! that the analysis side uses to find the regions again.
//!
//! ```no_run
//! use sinemtf_aruco::builtins::DICT_4X4_50;
//! use sinemtf_print::{generate_chart, BlankText, ChartSpec};
//!
//! let spec = ChartSpec::load_json("chart.json")?;
//! let chart = generate_chart(&spec, &DICT_4X4_50, &BlankText)?;
//! chart.write("chart.png", "chart_description.json")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod error;
mod io;
mod layout;
mod spec;
mod text;
mod tiles;

pub use error::PrintError;
pub use io::{save_png, write_png};
pub use layout::{generate_chart, ChartLayout};
pub use spec::{ChartSpec, FiducialSpec, ReferenceSpec, SineSpec};
pub use text::{fiducial_caption, sine_block_caption, BlankText, TextRenderer};
pub use tiles::{
    draw_reference_strip, draw_sine_block, draw_sine_tile, period_px, rotate_ccw, sine_profile,
};
