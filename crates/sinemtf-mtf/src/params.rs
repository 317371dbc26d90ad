use serde::{Deserialize, Serialize};
use sinemtf_core::{AffineModel, ConfigurationError, FitParams, Interpolation};

fn default_sine_oversample() -> f64 {
    16.0
}

fn default_reference_oversample() -> f64 {
    4.0
}

/// How regions are cut out of a photograph.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RectifierParams {
    /// Fiducial fit model; similarity suits fronto-parallel captures.
    #[serde(default)]
    pub model: AffineModel,
    /// Output pixels per half period of each sine tile.
    #[serde(default = "default_sine_oversample")]
    pub sine_oversample: f64,
    /// Reference-strip output pixels per captured pixel.
    #[serde(default = "default_reference_oversample")]
    pub reference_oversample: f64,
    #[serde(default)]
    pub interpolation: Interpolation,
    #[serde(default)]
    pub fit: FitParams,
}

impl Default for RectifierParams {
    fn default() -> Self {
        Self {
            model: AffineModel::Similarity,
            sine_oversample: default_sine_oversample(),
            reference_oversample: default_reference_oversample(),
            interpolation: Interpolation::Bicubic,
            fit: FitParams::default(),
        }
    }
}

impl RectifierParams {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        for (name, value) in [
            ("sine_oversample", self.sine_oversample),
            ("reference_oversample", self.reference_oversample),
            ("max_residual_px", self.fit.max_residual_px),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigurationError::InvalidParameter { name, value });
            }
        }
        Ok(())
    }
}

fn default_bandwidth_ratio() -> f64 {
    0.15
}

fn default_bezel_ratio() -> f64 {
    0.1
}

fn default_min_differential() -> f64 {
    1e-3
}

/// Spectral estimation tuning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MtfParams {
    /// Half-width of the integration window relative to the target frequency.
    /// 0.15 tolerates roughly 9° of residual tile rotation.
    #[serde(default = "default_bandwidth_ratio")]
    pub bandwidth_ratio: f64,
    /// Fraction of each tile side discarded before analysis.
    #[serde(default = "default_bezel_ratio")]
    pub bezel_ratio: f64,
    /// Smallest usable white/black half-difference, in normalized intensity.
    #[serde(default = "default_min_differential")]
    pub min_differential: f64,
}

impl Default for MtfParams {
    fn default() -> Self {
        Self {
            bandwidth_ratio: default_bandwidth_ratio(),
            bezel_ratio: default_bezel_ratio(),
            min_differential: default_min_differential(),
        }
    }
}

impl MtfParams {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let b = self.bandwidth_ratio;
        if !(b > 0.0 && b < 1.0) {
            return Err(ConfigurationError::InvalidParameter {
                name: "bandwidth_ratio",
                value: b,
            });
        }
        let z = self.bezel_ratio;
        if !(z >= 0.0 && z < 0.5) {
            return Err(ConfigurationError::InvalidParameter {
                name: "bezel_ratio",
                value: z,
            });
        }
        let d = self.min_differential;
        if !(d.is_finite() && d >= 0.0) {
            return Err(ConfigurationError::InvalidParameter {
                name: "min_differential",
                value: d,
            });
        }
        Ok(())
    }
}
