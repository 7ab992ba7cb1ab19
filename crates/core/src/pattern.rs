//! Contract between the factorization engine and a layer's geometry.
//!
//! A pattern is an ordered list of shapes, each tagged with a material. Value
//! tables passed to [`Pattern::fourier_transform`] and occupancy slices filled
//! by [`Pattern::discretize_cell`] use one slot per region: slot 0 is the
//! background and shape `i` lives in slot `i + 1`. When shapes overlap, the
//! one with the larger index wins.

use num_complex::Complex64;

use crate::grid::Grid2D;
use crate::lattice::Dimensionality;
use crate::material::MaterialId;

/// Closest material interface to a point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InterfaceSample {
    /// Unit normal pointing out of the shape owning the interface.
    pub normal: [f64; 2],
    /// Distance from the query point to the interface.
    pub distance: f64,
}

pub trait Pattern {
    fn shape_count(&self) -> usize;

    fn shape_material(&self, shape: usize) -> MaterialId;

    /// Fourier coefficient at spatial frequency `frequency` (cycles per unit
    /// length) of the piecewise-constant function taking `values[0]` in the
    /// background and `values[i + 1]` inside shape `i`, normalized by
    /// `cell_size`: `(1/A) ∫ v(x) e^{-2πi f·x} dA`.
    fn fourier_transform(
        &self,
        values: &[Complex64],
        frequency: [f64; 2],
        dimensionality: Dimensionality,
        cell_size: f64,
    ) -> Complex64;

    /// Fraction of grid cell `cell` covered by each region, written into
    /// `occupancy` (length `shape_count() + 1`). Cell `(ix, iy)` is centred on
    /// fractional point `(ix/nx, iy/ny)`.
    fn discretize_cell(&self, grid: Grid2D, cell: [usize; 2], occupancy: &mut [f64]);

    /// Outward unit normal of shape `shape` nearest to the Cartesian `point`,
    /// or `None` where the normal is undefined.
    fn interface_normal(&self, shape: usize, point: [f64; 2]) -> Option<[f64; 2]>;

    /// Closest interface of any shape to the Cartesian `point`.
    fn nearest_interface(&self, point: [f64; 2]) -> Option<InterfaceSample>;
}
