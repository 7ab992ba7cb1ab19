//! Closed-form rule: every matrix entry comes from the pattern's analytic
//! Fourier transform.

use log::debug;
use num_complex::Complex64;

use super::common::{block_diagonal, from_quadrants, FactorizationContext, LanczosSmoothing};
use super::projection;
use super::PermittivityOperators;
use crate::error::{RcwaError, Result};
use crate::lattice::Dimensionality;
use crate::material::Material;
use crate::options::FmmOptions;
use crate::polarization::PolarizationBasis;

pub(crate) fn build(
    ctx: &FactorizationContext<'_>,
    options: &FmmOptions,
    polarization: Option<PolarizationBasis>,
) -> Result<PermittivityOperators> {
    let lanczos = LanczosSmoothing::from_options(ctx.basis, &ctx.lk, options);
    if ctx.has_tensor() {
        if polarization.is_some() {
            return Err(RcwaError::Unsupported(
                "polarization basis projection requires scalar materials".into(),
            ));
        }
        return build_tensor(ctx, lanczos.as_ref());
    }

    let eps = ctx.region_values(Material::zz);
    let inv_eps = ctx.region_values(|m| m.zz().inv());
    let e = ctx.transform_matrix(&eps, lanczos.as_ref());

    if let Some(kind) = polarization {
        let inverse_rule = ctx.transform_matrix(&inv_eps, lanczos.as_ref());
        let grid = super::discretization_grid(ctx.basis, ctx.lattice, options.resolution)?;
        let epsilon2 = projection::project(ctx, kind, grid, &e, &inverse_rule)?;
        return Ok(PermittivityOperators {
            epsilon2,
            epsilon_inv: inverse_rule,
        });
    }

    let epsilon_inv = e.inverse("inverting the Laurent matrix")?;
    let epsilon2 = match ctx.dimensionality {
        Dimensionality::Two => block_diagonal(&e, &e),
        Dimensionality::One => {
            // Fields normal to the grating see the inverse rule.
            debug!("1D layer: using the inverse rule for the normal component");
            let inverse_rule = ctx.transform_matrix(&inv_eps, lanczos.as_ref());
            let normal = inverse_rule.inverse("inverting the inverse-rule matrix")?;
            block_diagonal(&e, &normal)
        }
    };
    Ok(PermittivityOperators {
        epsilon2,
        epsilon_inv,
    })
}

fn build_tensor(
    ctx: &FactorizationContext<'_>,
    lanczos: Option<&LanczosSmoothing>,
) -> Result<PermittivityOperators> {
    let component = |pick: fn(&Material) -> Complex64| {
        ctx.transform_matrix(&ctx.region_values(pick), lanczos)
    };
    let xx = component(|m| m.tensor().xx);
    let xy = component(|m| m.tensor().xy);
    let yx = component(|m| m.tensor().yx);
    let yy = component(|m| m.tensor().yy);
    let zz = component(Material::zz);
    Ok(PermittivityOperators {
        epsilon2: from_quadrants(&xx, &xy, &yx, &yy),
        epsilon_inv: zz.inverse("inverting the zz component matrix")?,
    })
}
