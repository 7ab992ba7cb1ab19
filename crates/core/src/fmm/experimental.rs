//! Experimental rule: closed-form matrices with the inverse rule standing in
//! for `1/ε_zz`. Smoothing and polarization bases do not apply.

use num_complex::Complex64;

use super::common::{block_diagonal, from_quadrants, FactorizationContext};
use super::PermittivityOperators;
use crate::error::Result;
use crate::material::Material;

pub(crate) fn build(ctx: &FactorizationContext<'_>) -> Result<PermittivityOperators> {
    let epsilon_inv = ctx.transform_matrix(&ctx.region_values(|m| m.zz().inv()), None);

    let epsilon2 = if ctx.has_tensor() {
        let component = |pick: fn(&Material) -> Complex64| {
            ctx.transform_matrix(&ctx.region_values(pick), None)
        };
        from_quadrants(
            &component(|m| m.tensor().xx),
            &component(|m| m.tensor().xy),
            &component(|m| m.tensor().yx),
            &component(|m| m.tensor().yy),
        )
    } else {
        let e = ctx.transform_matrix(&ctx.region_values(Material::zz), None);
        block_diagonal(&e, &e)
    };
    Ok(PermittivityOperators {
        epsilon2,
        epsilon_inv,
    })
}
