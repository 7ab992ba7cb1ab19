//! Fourier-factorization engine: turns a patterned layer into the reciprocal
//! space permittivity operators consumed by the mode equation.
//!
//! Every rule produces the same pair: `epsilon2`, the `2n × 2n` in-plane
//! operator with quadrants `[[xx, xy], [yx, yy]]`, and `epsilon_inv`, the
//! `n × n` operator standing in for `1/ε_zz`. Rows and columns follow the
//! basis order.

mod closed_form;
mod common;
mod discretized;
mod experimental;
mod projection;

use log::debug;

use crate::dielectric::AveragingMode;
use crate::error::{RcwaError, Result};
use crate::gsel::BasisSet;
use crate::lattice::Lattice2D;
use crate::material::{MaterialId, MaterialTable};
use crate::matrix::CMatrix;
use crate::options::FmmOptions;
use crate::pattern::Pattern;
use crate::polarization::PolarizationBasis;

pub use common::{discretization_grid, LanczosSmoothing};

/// A layer as seen by the factorization engine.
#[derive(Clone, Copy)]
pub struct LayerPattern<'a> {
    pub pattern: &'a dyn Pattern,
    pub background: MaterialId,
}

impl<'a> LayerPattern<'a> {
    pub fn new(pattern: &'a dyn Pattern, background: MaterialId) -> Self {
        Self {
            pattern,
            background,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PermittivityOperators {
    pub epsilon2: CMatrix,
    pub epsilon_inv: CMatrix,
}

impl PermittivityOperators {
    /// Number of basis vectors the operators were built for.
    pub fn basis_len(&self) -> usize {
        self.epsilon_inv.rows()
    }

    /// Quadrant `(row, col)` of `epsilon2`, each index 0 or 1.
    pub fn quadrant(&self, row: usize, col: usize) -> CMatrix {
        let n = self.basis_len();
        self.epsilon2.block(row * n, col * n, n, n)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FactorizationRule {
    ClosedForm,
    Discretized(AveragingMode),
    Experimental,
}

impl FactorizationRule {
    pub fn from_options(options: &FmmOptions) -> Self {
        if options.use_experimental_fmm {
            Self::Experimental
        } else if options.use_subpixel_smoothing {
            Self::Discretized(AveragingMode::Kottke)
        } else if options.use_discretized_epsilon {
            Self::Discretized(AveragingMode::AreaWeighted)
        } else {
            Self::ClosedForm
        }
    }
}

/// Build the permittivity operators of `layer` in the planewave basis `basis`.
pub fn build_permittivity_operators(
    layer: &LayerPattern<'_>,
    materials: &MaterialTable,
    basis: &BasisSet,
    lattice: &Lattice2D,
    options: &FmmOptions,
) -> Result<PermittivityOperators> {
    if basis.is_empty() {
        return Err(RcwaError::invalid_argument(3, "basis is empty"));
    }
    if basis.lattice() != lattice {
        return Err(RcwaError::invalid_argument(
            3,
            "basis was selected for a different lattice",
        ));
    }
    options.validate()?;
    materials.get(layer.background)?;
    for shape in 0..layer.pattern.shape_count() {
        materials.get(layer.pattern.shape_material(shape))?;
    }

    let rule = FactorizationRule::from_options(options);
    let polarization = match rule {
        FactorizationRule::Experimental => None,
        _ => PolarizationBasis::from_options(options),
    };
    debug!(
        "factorizing layer with {} shapes over {} basis vectors: {:?}, polarization basis {:?}",
        layer.pattern.shape_count(),
        basis.len(),
        rule,
        polarization
    );

    let context = common::FactorizationContext::new(layer, materials, basis, lattice)?;
    let operators = match rule {
        FactorizationRule::ClosedForm => closed_form::build(&context, options, polarization)?,
        FactorizationRule::Discretized(mode) => {
            discretized::build(&context, options, mode, polarization)?
        }
        FactorizationRule::Experimental => experimental::build(&context)?,
    };
    debug!("epsilon2[0,0] = {}", operators.epsilon2[(0, 0)]);
    Ok(operators)
}
