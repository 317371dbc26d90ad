use sinemtf_aruco::MarkerError;
use sinemtf_core::{ConfigurationError, JsonIoError};

#[derive(thiserror::Error, Debug)]
pub enum PrintError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Marker(#[from] MarkerError),
    #[error(transparent)]
    Json(#[from] JsonIoError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("png encoding failed: {0}")]
    Png(#[from] png::EncodingError),
}
