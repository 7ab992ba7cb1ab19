//! Polarization-basis projection of the in-plane operator.
//!
//! A vector field `ψ` marks, cell by cell, the direction normal to the
//! nearest interface. With projector blocks `P_ab = [ψ_a·conj(ψ_b)]` and
//! `Δ = E − [1/ε]⁻¹`, the field component along `ψ` sees the inverse rule
//! while the rest sees the Laurent rule:
//!
//! ```text
//! epsilon2 = [[E − Δ·Pxx,   −Δ·Pxy],
//!             [  −Δ·Pyx, E − Δ·Pyy]]
//! ```

use std::f64::consts::{FRAC_1_SQRT_2, FRAC_PI_4};

use log::trace;
use num_complex::Complex64;

use super::common::{forward_transform_all, FactorizationContext};
use crate::error::Result;
use crate::field::Field2D;
use crate::grid::Grid2D;
use crate::matrix::CMatrix;
use crate::pattern::InterfaceSample;
use crate::polarization::PolarizationBasis;

pub(crate) fn project(
    ctx: &FactorizationContext<'_>,
    kind: PolarizationBasis,
    grid: Grid2D,
    laurent: &CMatrix,
    inverse_rule: &CMatrix,
) -> Result<CMatrix> {
    let (psi_x, psi_y) = vector_field(ctx, kind, grid);

    let mut pxx = Field2D::zeros(grid);
    let mut pxy = Field2D::zeros(grid);
    let mut pyx = Field2D::zeros(grid);
    let mut pyy = Field2D::zeros(grid);
    for idx in 0..grid.len() {
        let (x, y) = (psi_x.as_slice()[idx], psi_y.as_slice()[idx]);
        pxx.as_mut_slice()[idx] = x * x.conj();
        pxy.as_mut_slice()[idx] = x * y.conj();
        pyx.as_mut_slice()[idx] = y * x.conj();
        pyy.as_mut_slice()[idx] = y * y.conj();
    }
    forward_transform_all(&mut [&mut pxx, &mut pxy, &mut pyx, &mut pyy])?;

    let delta = laurent.sub(&inverse_rule.inverse("inverting the inverse-rule matrix")?);
    let minus_one = Complex64::new(-1.0, 0.0);
    let n = ctx.n();
    let mut epsilon2 = CMatrix::zeros(2 * n, 2 * n);
    epsilon2.set_block(0, 0, &laurent.sub(&delta.matmul(&ctx.spectrum_matrix(&pxx))));
    epsilon2.set_block(0, n, &delta.matmul(&ctx.spectrum_matrix(&pxy)).scaled(minus_one));
    epsilon2.set_block(n, 0, &delta.matmul(&ctx.spectrum_matrix(&pyx)).scaled(minus_one));
    epsilon2.set_block(n, n, &laurent.sub(&delta.matmul(&ctx.spectrum_matrix(&pyy))));
    Ok(epsilon2)
}

/// Sample `ψ` at every cell centre of `grid`.
fn vector_field(
    ctx: &FactorizationContext<'_>,
    kind: PolarizationBasis,
    grid: Grid2D,
) -> (Field2D, Field2D) {
    let f_max = ctx.max_frequency();
    let decay = if f_max > 0.0 { 2.0 * f_max } else { 0.0 };
    let mut psi_x = Field2D::zeros(grid);
    let mut psi_y = Field2D::zeros(grid);
    let mut interface_cells = 0usize;

    for iy in 0..grid.ny {
        for ix in 0..grid.nx {
            let point = ctx.lattice.fractional_to_cartesian(grid.cell_center(ix, iy));
            let sample = ctx.layer.pattern.nearest_interface(point);
            if sample.is_some() {
                interface_cells += 1;
            }
            let psi = vector_at(kind, sample, decay);
            psi_x.set(ix, iy, psi[0]);
            psi_y.set(ix, iy, psi[1]);
        }
    }
    trace!(
        "{:?} vector field: {} of {} cells near an interface",
        kind,
        interface_cells,
        grid.len()
    );
    (psi_x, psi_y)
}

/// `decay` is `1/ℓ` for the interface length scale `ℓ`.
fn vector_at(kind: PolarizationBasis, sample: Option<InterfaceSample>, decay: f64) -> [Complex64; 2] {
    let Some(InterfaceSample { normal, distance }) = sample else {
        return match kind {
            PolarizationBasis::Jones => [
                Complex64::new(FRAC_1_SQRT_2, 0.0),
                Complex64::new(0.0, FRAC_1_SQRT_2),
            ],
            _ => [Complex64::ZERO; 2],
        };
    };
    let closeness = (-(distance * decay).powi(2)).exp();
    match kind {
        PolarizationBasis::NormalVector => {
            [Complex64::new(normal[0], 0.0), Complex64::new(normal[1], 0.0)]
        }
        PolarizationBasis::VectorLength => [
            Complex64::new(normal[0] * closeness, 0.0),
            Complex64::new(normal[1] * closeness, 0.0),
        ],
        PolarizationBasis::Jones => {
            let theta = FRAC_PI_4 * (1.0 - closeness);
            let (s, c) = theta.sin_cos();
            let tangent = [-normal[1], normal[0]];
            [
                Complex64::new(c * normal[0], s * tangent[0]),
                Complex64::new(c * normal[1], s * tangent[1]),
            ]
        }
    }
}
