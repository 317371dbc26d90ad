use sinemtf_core::{ConfigurationError, GeometryError};

/// The measured data cannot calibrate or carry an estimate.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum CalibrationError {
    #[error("reference strip has no contrast (differential {differential:.5})")]
    FlatReference { differential: f64 },
    #[error("reference tile {width}x{height} is too small to hold black and white blocks")]
    ReferenceTooSmall { width: usize, height: usize },
    #[error("rectification carries no reference strip")]
    MissingReference,
    #[error("tile {width}x{height} is empty after bezel removal")]
    EmptyTile { width: usize, height: usize },
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum MtfError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Calibration(#[from] CalibrationError),
}
