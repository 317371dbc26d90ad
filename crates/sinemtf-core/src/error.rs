/// Failures of the geometric stage: fiducial fitting, map inversion, canvases.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    #[error("source rectangle is degenerate (zero size or non-finite)")]
    DegenerateRect,
    #[error("corner quadrilateral is degenerate (area {area:.3} px^2)")]
    DegenerateQuad { area: f64 },
    #[error("not enough point correspondences (need >= {needed}, got {got})")]
    NotEnoughPoints { needed: usize, got: usize },
    #[error("affine map is not invertible")]
    NonInvertible,
    #[error("fit residual {rms:.3} px exceeds tolerance {tolerance:.3} px")]
    ResidualTooLarge { rms: f64, tolerance: f64 },
}

/// Invalid chart descriptions, chart specs or tuning parameters.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("frequency list is empty")]
    EmptyFrequencies,
    #[error("frequency {lpmm} lp/mm must be finite and > 0")]
    InvalidFrequency { lpmm: f64 },
    #[error("dpi {dpi} must be finite and > 0")]
    InvalidDpi { dpi: f64 },
    #[error("{what} must be finite and > 0 (got {value})")]
    InvalidDimension { what: &'static str, value: f64 },
    #[error("fiducial id {id} is not part of the chart description")]
    UnknownFiducial { id: u32 },
    #[error("chart regions `{a}` and `{b}` overlap")]
    OverlappingRegions { a: &'static str, b: &'static str },
    #[error("parameter `{name}` has invalid value {value}")]
    InvalidParameter { name: &'static str, value: f64 },
}

/// Reading or writing one of the JSON documents (descriptions, specs, reports).
#[derive(thiserror::Error, Debug)]
pub enum JsonIoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
