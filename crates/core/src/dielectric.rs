//! Real-space permittivity sampling on the discretization grid, with plain
//! area averaging or Kottke subpixel averaging at two-material interfaces.

use log::trace;
use num_complex::Complex64;

use crate::error::Result;
use crate::field::Field2D;
use crate::grid::Grid2D;
use crate::lattice::Lattice2D;
use crate::material::{EpsilonTensor, MaterialId, MaterialTable};
use crate::pattern::Pattern;

/// Occupancy at or below this counts as an empty region.
pub const OCCUPANCY_THRESHOLD: f64 = 2.0 * f64::EPSILON;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AveragingMode {
    /// Occupancy-weighted arithmetic mean of every region in the cell.
    AreaWeighted,
    /// Interface-aware averaging where exactly two regions meet.
    Kottke,
}

/// Per-cell permittivity components on one grid, plus the reciprocal of the
/// out-of-plane component.
#[derive(Debug, Clone)]
pub struct DielectricGrids {
    pub grid: Grid2D,
    pub xx: Field2D,
    pub xy: Field2D,
    pub yx: Field2D,
    pub yy: Field2D,
    pub zz: Field2D,
    pub inv_zz: Field2D,
}

impl DielectricGrids {
    fn zeros(grid: Grid2D) -> Self {
        Self {
            grid,
            xx: Field2D::zeros(grid),
            xy: Field2D::zeros(grid),
            yx: Field2D::zeros(grid),
            yy: Field2D::zeros(grid),
            zz: Field2D::zeros(grid),
            inv_zz: Field2D::zeros(grid),
        }
    }

    fn set(&mut self, ix: usize, iy: usize, tensor: &EpsilonTensor, inv_zz: Complex64) {
        self.xx.set(ix, iy, tensor.xx);
        self.xy.set(ix, iy, tensor.xy);
        self.yx.set(ix, iy, tensor.yx);
        self.yy.set(ix, iy, tensor.yy);
        self.zz.set(ix, iy, tensor.zz);
        self.inv_zz.set(ix, iy, inv_zz);
    }

    pub fn tensor_at(&self, ix: usize, iy: usize) -> EpsilonTensor {
        EpsilonTensor {
            xx: self.xx.get(ix, iy),
            xy: self.xy.get(ix, iy),
            yx: self.yx.get(ix, iy),
            yy: self.yy.get(ix, iy),
            zz: self.zz.get(ix, iy),
        }
    }

    pub fn fields_mut(&mut self) -> [&mut Field2D; 6] {
        [
            &mut self.xx,
            &mut self.xy,
            &mut self.yx,
            &mut self.yy,
            &mut self.zz,
            &mut self.inv_zz,
        ]
    }
}

/// Sample a layer's permittivity on `grid`.
pub fn sample_layer(
    pattern: &dyn Pattern,
    background: MaterialId,
    materials: &MaterialTable,
    lattice: &Lattice2D,
    grid: Grid2D,
    mode: AveragingMode,
) -> Result<DielectricGrids> {
    let regions = pattern.shape_count() + 1;
    let mut tensors = Vec::with_capacity(regions);
    tensors.push(materials.get(background)?.tensor());
    for shape in 0..pattern.shape_count() {
        tensors.push(materials.get(pattern.shape_material(shape))?.tensor());
    }

    let mut grids = DielectricGrids::zeros(grid);
    let mut occupancy = vec![0.0; regions];
    let mut present = Vec::with_capacity(regions);
    let mut interface_cells = 0usize;

    for iy in 0..grid.ny {
        for ix in 0..grid.nx {
            pattern.discretize_cell(grid, [ix, iy], &mut occupancy);
            present.clear();
            present.extend((0..regions).filter(|&slot| occupancy[slot] > OCCUPANCY_THRESHOLD));

            let tensor = match present.as_slice() {
                [] => tensors[0],
                [only] => tensors[*only],
                [outer, inner] if mode == AveragingMode::Kottke => {
                    let point = lattice.fractional_to_cartesian(grid.cell_center(ix, iy));
                    match pattern
                        .interface_normal(inner - 1, point)
                        .filter(|n| n[0] != 0.0 || n[1] != 0.0)
                    {
                        Some(normal) => {
                            interface_cells += 1;
                            let total = occupancy[*inner] + occupancy[*outer];
                            kottke_average(
                                &tensors[*inner],
                                &tensors[*outer],
                                occupancy[*inner] / total,
                                normal,
                            )
                        }
                        None => area_average(&tensors, &occupancy, &present),
                    }
                }
                _ => area_average(&tensors, &occupancy, &present),
            };

            let inv_zz = if present.len() <= 1 {
                tensor.zz.inv()
            } else {
                let total: f64 = present.iter().map(|&slot| occupancy[slot]).sum();
                present
                    .iter()
                    .map(|&slot| tensors[slot].zz.inv() * occupancy[slot])
                    .sum::<Complex64>()
                    / total
            };
            grids.set(ix, iy, &tensor, inv_zz);
        }
    }
    trace!(
        "sampled {}x{} permittivity grid ({:?}, {} Kottke cells)",
        grid.nx,
        grid.ny,
        mode,
        interface_cells
    );
    Ok(grids)
}

fn area_average(tensors: &[EpsilonTensor], occupancy: &[f64], present: &[usize]) -> EpsilonTensor {
    let total: f64 = present.iter().map(|&slot| occupancy[slot]).sum();
    present
        .iter()
        .fold(EpsilonTensor::ZERO, |acc, &slot| {
            acc.add(&tensors[slot].scaled(occupancy[slot] / total))
        })
}

type Block = [Complex64; 4];

/// Kottke average of two tensors meeting at an interface with unit normal
/// `normal`. `fill` is the fraction of the cell occupied by `inner`.
///
/// The in-plane blocks are rotated into the normal frame, averaged through
/// the tau transform (which makes the normal component a harmonic mean and
/// the tangential components arithmetic means) and rotated back. `zz` is the
/// arithmetic mean.
pub fn kottke_average(
    inner: &EpsilonTensor,
    outer: &EpsilonTensor,
    fill: f64,
    normal: [f64; 2],
) -> EpsilonTensor {
    if fill <= 0.0 {
        return *outer;
    }
    if fill >= 1.0 {
        return *inner;
    }
    let len = normal[0].hypot(normal[1]);
    let n = [normal[0] / len, normal[1] / len];

    let a = tau(&to_normal_frame(&inner.in_plane(), n));
    let b = tau(&to_normal_frame(&outer.in_plane(), n));
    let mut mixed = [Complex64::ZERO; 4];
    for k in 0..4 {
        mixed[k] = a[k] * fill + b[k] * (1.0 - fill);
    }
    let block = to_normal_frame(&inverse_tau(&mixed), [n[0], -n[1]]);
    let zz = inner.zz * fill + outer.zz * (1.0 - fill);
    EpsilonTensor::with_in_plane(block, zz)
}

/// `Rᵀ M R` with `R = [[n0, −n1], [n1, n0]]`.
fn to_normal_frame(m: &Block, n: [f64; 2]) -> Block {
    let r = [n[0], -n[1], n[1], n[0]];
    let mr = [
        m[0] * r[0] + m[1] * r[2],
        m[0] * r[1] + m[1] * r[3],
        m[2] * r[0] + m[3] * r[2],
        m[2] * r[1] + m[3] * r[3],
    ];
    [
        mr[0] * r[0] + mr[2] * r[2],
        mr[1] * r[0] + mr[3] * r[2],
        mr[0] * r[1] + mr[2] * r[3],
        mr[1] * r[1] + mr[3] * r[3],
    ]
}

fn tau(e: &Block) -> Block {
    let inv = e[0].inv();
    [-inv, e[1] * inv, e[2] * inv, e[3] - e[2] * e[1] * inv]
}

fn inverse_tau(t: &Block) -> Block {
    let inv = t[0].inv();
    [-inv, -t[1] * inv, -t[2] * inv, t[3] - t[2] * t[1] * inv]
}
