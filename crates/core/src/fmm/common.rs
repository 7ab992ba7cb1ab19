use log::debug;
use num_complex::Complex64;

use super::LayerPattern;
use crate::error::{RcwaError, Result};
use crate::fft::{next_fast_size, FftDirection, FftPlan2D};
use crate::field::Field2D;
use crate::grid::Grid2D;
use crate::gsel::BasisSet;
use crate::lattice::{Dimensionality, Lattice2D, ReciprocalLattice2D};
use crate::material::{Material, MaterialTable};
use crate::matrix::CMatrix;
use crate::options::FmmOptions;
use crate::special::jinc;

/// Inputs shared by every factorization rule, resolved once per call.
pub(crate) struct FactorizationContext<'a> {
    pub layer: LayerPattern<'a>,
    pub materials: &'a MaterialTable,
    pub basis: &'a BasisSet,
    pub lattice: &'a Lattice2D,
    pub lk: ReciprocalLattice2D,
    pub dimensionality: Dimensionality,
    pub cell_size: f64,
    /// Material of each region: slot 0 is the background.
    pub regions: Vec<Material>,
}

impl<'a> FactorizationContext<'a> {
    pub fn new(
        layer: &LayerPattern<'a>,
        materials: &'a MaterialTable,
        basis: &'a BasisSet,
        lattice: &'a Lattice2D,
    ) -> Result<Self> {
        let lk = lattice.reciprocate()?;
        let mut regions = Vec::with_capacity(layer.pattern.shape_count() + 1);
        regions.push(*materials.get(layer.background)?);
        for shape in 0..layer.pattern.shape_count() {
            regions.push(*materials.get(layer.pattern.shape_material(shape))?);
        }
        Ok(Self {
            layer: *layer,
            materials,
            basis,
            lattice,
            lk,
            dimensionality: lattice.dimensionality(),
            cell_size: lattice.unit_cell_size(),
            regions,
        })
    }

    pub fn n(&self) -> usize {
        self.basis.len()
    }

    pub fn has_tensor(&self) -> bool {
        self.regions.iter().any(Material::is_tensor)
    }

    /// Per-region table of `value(material)`.
    pub fn region_values(&self, value: impl Fn(&Material) -> Complex64) -> Vec<Complex64> {
        self.regions.iter().map(value).collect()
    }

    /// `M[i, j] = sample(G_i − G_j)`.
    pub fn difference_matrix(&self, mut sample: impl FnMut([i32; 2]) -> Complex64) -> CMatrix {
        let g = self.basis.vectors();
        CMatrix::from_fn(g.len(), g.len(), |i, j| {
            sample([g[i][0] - g[j][0], g[i][1] - g[j][1]])
        })
    }

    /// Toeplitz matrix of the analytic Fourier transform of a region table,
    /// optionally attenuated by Lanczos smoothing.
    pub fn transform_matrix(
        &self,
        values: &[Complex64],
        lanczos: Option<&LanczosSmoothing>,
    ) -> CMatrix {
        self.difference_matrix(|dg| {
            let f = self.lk.frequency(dg);
            let value = self.layer.pattern.fourier_transform(
                values,
                f,
                self.dimensionality,
                self.cell_size,
            );
            match lanczos {
                Some(smoothing) => value * smoothing.factor(f),
                None => value,
            }
        })
    }

    /// Toeplitz matrix read out of a forward-transformed grid.
    pub fn spectrum_matrix(&self, spectrum: &Field2D) -> CMatrix {
        self.difference_matrix(|dg| spectrum.at_frequency(dg))
    }

    /// Largest spatial frequency present in the basis.
    pub fn max_frequency(&self) -> f64 {
        self.basis
            .vectors()
            .iter()
            .map(|&g| {
                let f = self.lk.frequency(g);
                f[0].hypot(f[1])
            })
            .fold(0.0, f64::max)
    }
}

/// Lanczos sigma factors `σ(f) = Jinc(|f| / (2·order + 1))^power`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LanczosSmoothing {
    pub order: f64,
    pub power: u32,
}

impl LanczosSmoothing {
    /// Smoothing requested by the options, or `None` when disabled. The order
    /// is the length of the last basis frequency plus the shortest
    /// reciprocal vector, scaled by the smoothing width.
    pub fn from_options(
        basis: &BasisSet,
        lk: &ReciprocalLattice2D,
        options: &FmmOptions,
    ) -> Option<Self> {
        if !options.use_lanczos_smoothing || basis.is_empty() {
            return None;
        }
        let last = lk.frequency(basis.get(basis.len() - 1));
        let shortest = if lk.is_one_dimensional() {
            lk.b1_length()
        } else {
            lk.b1_length().min(lk.b2_length())
        };
        let order = (last[0].hypot(last[1]) + shortest) * options.lanczos_smoothing_width;
        debug!("Lanczos smoothing order {order}, power {}", options.lanczos_smoothing_power);
        Some(Self {
            order,
            power: options.lanczos_smoothing_power,
        })
    }

    pub fn factor(&self, f: [f64; 2]) -> f64 {
        let x = f[0].hypot(f[1]) / (2.0 * self.order + 1.0);
        jinc(x).powi(self.power as i32)
    }
}

/// Real-space grid fine enough to resolve every basis frequency at
/// `resolution` samples per period. Each axis holds at least `4M + 1` bins so
/// the differences `-2M..=2M` read by the operators never share a bin.
pub fn discretization_grid(
    basis: &BasisSet,
    lattice: &Lattice2D,
    resolution: usize,
) -> Result<Grid2D> {
    let extent = basis.extent();
    let axis = |m: i32| -> Result<usize> {
        let m = m.max(1) as usize;
        let sampled = m.checked_mul(resolution);
        let distinct = m.checked_mul(4).and_then(|n| n.checked_add(1));
        sampled
            .zip(distinct)
            .map(|(sampled, distinct)| next_fast_size(sampled.max(distinct)))
            .ok_or(RcwaError::Allocation {
                elements: usize::MAX,
            })
    };
    let nx = axis(extent[0])?;
    let ny = if lattice.is_one_dimensional() {
        1
    } else {
        axis(extent[1])?
    };
    let elements = nx
        .checked_mul(ny)
        .filter(|&len| len <= isize::MAX as usize / std::mem::size_of::<Complex64>())
        .ok_or(RcwaError::Allocation {
            elements: nx.saturating_mul(ny),
        })?;
    debug!("discretization grid {nx}x{ny} ({elements} cells)");
    Ok(Grid2D::new(nx, ny))
}

/// Forward transform each field in place and normalize by the cell count, so
/// that bin `dG` holds the Fourier coefficient of that frequency.
pub(crate) fn forward_transform_all(fields: &mut [&mut Field2D]) -> Result<()> {
    let Some(first) = fields.first() else {
        return Ok(());
    };
    let grid = first.grid();
    let plan = FftPlan2D::new(grid, FftDirection::Forward)?;
    let scale = 1.0 / grid.len() as f64;
    for field in fields.iter_mut() {
        plan.execute_in_place(field)?;
        field.scale(scale);
    }
    Ok(())
}

pub(crate) fn block_diagonal(upper: &CMatrix, lower: &CMatrix) -> CMatrix {
    let n = upper.rows();
    let mut out = CMatrix::zeros(2 * n, 2 * n);
    out.set_block(0, 0, upper);
    out.set_block(n, n, lower);
    out
}

pub(crate) fn from_quadrants(xx: &CMatrix, xy: &CMatrix, yx: &CMatrix, yy: &CMatrix) -> CMatrix {
    let n = xx.rows();
    let mut out = CMatrix::zeros(2 * n, 2 * n);
    out.set_block(0, 0, xx);
    out.set_block(0, n, xy);
    out.set_block(n, 0, yx);
    out.set_block(n, n, yy);
    out
}
