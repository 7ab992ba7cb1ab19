//! Factorization options, loadable from TOML.

use serde::{Deserialize, Serialize};

use crate::error::{RcwaError, Result};
use crate::gsel::Truncation;

/// Smallest discretization resolution accepted by the discretized rules.
pub const MIN_RESOLUTION: usize = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FmmOptions {
    pub use_polarization_basis: bool,
    pub use_jones_vector_basis: bool,
    pub use_normal_vector_basis: bool,
    pub use_lanczos_smoothing: bool,
    pub lanczos_smoothing_width: f64,
    pub lanczos_smoothing_power: u32,
    pub use_discretized_epsilon: bool,
    pub use_subpixel_smoothing: bool,
    pub resolution: usize,
    pub lattice_truncation: Truncation,
    pub use_experimental_fmm: bool,
}

impl Default for FmmOptions {
    fn default() -> Self {
        Self {
            use_polarization_basis: false,
            use_jones_vector_basis: false,
            use_normal_vector_basis: false,
            use_lanczos_smoothing: false,
            lanczos_smoothing_width: 1.0,
            lanczos_smoothing_power: 1,
            use_discretized_epsilon: false,
            use_subpixel_smoothing: false,
            resolution: 64,
            lattice_truncation: Truncation::Circular,
            use_experimental_fmm: false,
        }
    }
}

impl FmmOptions {
    /// Parse and validate options from a TOML document. Missing keys take
    /// their defaults.
    pub fn from_toml_str(src: &str) -> Result<Self> {
        let options: Self = toml::from_str(src)?;
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<()> {
        if self.resolution < MIN_RESOLUTION {
            return Err(RcwaError::Config(format!(
                "resolution must be at least {MIN_RESOLUTION}, got {}",
                self.resolution
            )));
        }
        if !(self.lanczos_smoothing_width.is_finite() && self.lanczos_smoothing_width > 0.0) {
            return Err(RcwaError::Config(format!(
                "lanczos_smoothing_width must be positive, got {}",
                self.lanczos_smoothing_width
            )));
        }
        Ok(())
    }
}
