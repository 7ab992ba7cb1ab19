//! Discretized rule: sample the layer on a real-space grid, transform the
//! component grids and read the coefficients back at basis differences.

use log::debug;

use super::common::{forward_transform_all, from_quadrants, FactorizationContext};
use super::projection;
use super::PermittivityOperators;
use crate::dielectric::{sample_layer, AveragingMode};
use crate::error::{RcwaError, Result};
use crate::options::FmmOptions;
use crate::polarization::PolarizationBasis;

pub(crate) fn build(
    ctx: &FactorizationContext<'_>,
    options: &FmmOptions,
    mode: AveragingMode,
    polarization: Option<PolarizationBasis>,
) -> Result<PermittivityOperators> {
    if polarization.is_some() && ctx.has_tensor() {
        return Err(RcwaError::Unsupported(
            "polarization basis projection requires scalar materials".into(),
        ));
    }
    let grid = super::discretization_grid(ctx.basis, ctx.lattice, options.resolution)?;
    debug!("discretizing on {}x{} grid ({:?})", grid.nx, grid.ny, mode);

    let mut grids = sample_layer(
        ctx.layer.pattern,
        ctx.layer.background,
        ctx.materials,
        ctx.lattice,
        grid,
        mode,
    )?;
    forward_transform_all(&mut grids.fields_mut())?;

    let xx = ctx.spectrum_matrix(&grids.xx);
    let epsilon_inv = ctx
        .spectrum_matrix(&grids.zz)
        .inverse("inverting the zz component matrix")?;

    let epsilon2 = match polarization {
        Some(kind) => {
            let inverse_rule = ctx.spectrum_matrix(&grids.inv_zz);
            projection::project(ctx, kind, grid, &xx, &inverse_rule)?
        }
        // Kottke cells carry off-diagonal terms even in scalar layers.
        None => from_quadrants(
            &xx,
            &ctx.spectrum_matrix(&grids.xy),
            &ctx.spectrum_matrix(&grids.yx),
            &ctx.spectrum_matrix(&grids.yy),
        ),
    };
    Ok(PermittivityOperators {
        epsilon2,
        epsilon_inv,
    })
}
