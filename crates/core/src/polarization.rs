//! Polarization bases used to project the in-plane permittivity operator.

use serde::{Deserialize, Serialize};

use crate::options::FmmOptions;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolarizationBasis {
    /// Unit normal of the nearest interface.
    NormalVector,
    /// Interface normal fading with distance from the interface.
    VectorLength,
    /// Complex Jones vector rotating from linear at the interface to circular
    /// far from it.
    Jones,
}

impl PolarizationBasis {
    /// Basis requested by the options, or `None` when projection is off.
    /// Jones takes precedence over the normal-vector field, which takes
    /// precedence over the vector-length field.
    pub fn from_options(options: &FmmOptions) -> Option<Self> {
        if !options.use_polarization_basis || options.use_experimental_fmm {
            return None;
        }
        Some(if options.use_jones_vector_basis {
            Self::Jones
        } else if options.use_normal_vector_basis {
            Self::NormalVector
        } else {
            Self::VectorLength
        })
    }
}
