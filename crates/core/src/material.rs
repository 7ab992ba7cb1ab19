//! Material permittivities.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::error::{RcwaError, Result};

/// Index of a material in a [`MaterialTable`].
pub type MaterialId = usize;

/// Permittivity tensor with an in-plane 2×2 block and a decoupled `zz` entry:
///
/// ```text
/// [ xx xy 0  ]
/// [ yx yy 0  ]
/// [ 0  0  zz ]
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpsilonTensor {
    pub xx: Complex64,
    pub xy: Complex64,
    pub yx: Complex64,
    pub yy: Complex64,
    pub zz: Complex64,
}

impl EpsilonTensor {
    pub const ZERO: Self = Self {
        xx: Complex64::ZERO,
        xy: Complex64::ZERO,
        yx: Complex64::ZERO,
        yy: Complex64::ZERO,
        zz: Complex64::ZERO,
    };

    pub fn isotropic(eps: Complex64) -> Self {
        Self {
            xx: eps,
            xy: Complex64::ZERO,
            yx: Complex64::ZERO,
            yy: eps,
            zz: eps,
        }
    }

    /// In-plane block, row-major.
    pub fn in_plane(&self) -> [Complex64; 4] {
        [self.xx, self.xy, self.yx, self.yy]
    }

    pub fn with_in_plane(block: [Complex64; 4], zz: Complex64) -> Self {
        Self {
            xx: block[0],
            xy: block[1],
            yx: block[2],
            yy: block[3],
            zz,
        }
    }

    pub fn scaled(&self, weight: f64) -> Self {
        Self {
            xx: self.xx * weight,
            xy: self.xy * weight,
            yx: self.yx * weight,
            yy: self.yy * weight,
            zz: self.zz * weight,
        }
    }

    pub fn add(&self, other: &Self) -> Self {
        Self {
            xx: self.xx + other.xx,
            xy: self.xy + other.xy,
            yx: self.yx + other.yx,
            yy: self.yy + other.yy,
            zz: self.zz + other.zz,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Material {
    Scalar(Complex64),
    Tensor(EpsilonTensor),
}

impl Material {
    pub fn scalar(re: f64, im: f64) -> Self {
        Self::Scalar(Complex64::new(re, im))
    }

    pub fn is_tensor(&self) -> bool {
        matches!(self, Self::Tensor(_))
    }

    /// Full tensor view; scalars become isotropic tensors.
    pub fn tensor(&self) -> EpsilonTensor {
        match self {
            Self::Scalar(eps) => EpsilonTensor::isotropic(*eps),
            Self::Tensor(tensor) => *tensor,
        }
    }

    /// Out-of-plane permittivity.
    pub fn zz(&self) -> Complex64 {
        match self {
            Self::Scalar(eps) => *eps,
            Self::Tensor(tensor) => tensor.zz,
        }
    }
}

/// Materials owned by a simulation, referenced by index.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MaterialTable {
    materials: Vec<Material>,
}

impl MaterialTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_materials(materials: Vec<Material>) -> Self {
        Self { materials }
    }

    pub fn push(&mut self, material: Material) -> MaterialId {
        self.materials.push(material);
        self.materials.len() - 1
    }

    pub fn get(&self, id: MaterialId) -> Result<&Material> {
        self.materials.get(id).ok_or_else(|| {
            RcwaError::invalid_argument(
                2,
                format!("material {id} is not defined ({} materials)", self.materials.len()),
            )
        })
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }
}
