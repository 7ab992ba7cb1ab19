#![cfg(test)]

use std::f64::consts::PI;

use num_complex::Complex64;

use super::dielectric::{sample_layer, AveragingMode};
use super::error::RcwaError;
use super::fmm::{
    build_permittivity_operators, discretization_grid, FactorizationRule, LanczosSmoothing,
    LayerPattern, PermittivityOperators,
};
use super::geometry::{Shape, ShapeList};
use super::gsel::{BasisSet, Truncation};
use super::lattice::Lattice2D;
use super::material::{EpsilonTensor, Material, MaterialTable};
use super::matrix::CMatrix;
use super::options::FmmOptions;
use super::pattern::Pattern;
use super::polarization::PolarizationBasis;

const AIR: usize = 0;
const DIELECTRIC: usize = 1;

fn materials() -> MaterialTable {
    MaterialTable::from_materials(vec![Material::scalar(1.0, 0.0), Material::scalar(4.0, 0.0)])
}

fn circle_layer(lattice: Lattice2D, radius: f64) -> ShapeList {
    ShapeList::new(lattice)
        .unwrap()
        .with_shape(
            Shape::Circle {
                center: [0.0, 0.0],
                radius,
            },
            DIELECTRIC,
        )
        .unwrap()
}

fn build(
    pattern: &dyn Pattern,
    background: usize,
    materials: &MaterialTable,
    basis: &BasisSet,
    options: &FmmOptions,
) -> super::error::Result<PermittivityOperators> {
    let lattice = *basis.lattice();
    build_permittivity_operators(
        &LayerPattern::new(pattern, background),
        materials,
        basis,
        &lattice,
        options,
    )
}

fn scalar_transform_matrix(pattern: &ShapeList, basis: &BasisSet, values: &[Complex64]) -> CMatrix {
    let lattice = basis.lattice();
    let lk = lattice.reciprocate().unwrap();
    let g = basis.vectors();
    CMatrix::from_fn(g.len(), g.len(), |i, j| {
        let dg = [g[i][0] - g[j][0], g[i][1] - g[j][1]];
        pattern.fourier_transform(
            values,
            lk.frequency(dg),
            lattice.dimensionality(),
            lattice.unit_cell_size(),
        )
    })
}

fn assert_close(a: &CMatrix, b: &CMatrix, tol: f64, what: &str) {
    let diff = a.max_abs_diff(b);
    assert!(diff <= tol, "{what}: max deviation {diff} > {tol}");
}

#[test]
fn closed_form_dc_term_is_mean_permittivity() {
    let lattice = Lattice2D::square(1.0);
    let r = 0.2;
    let pattern = circle_layer(lattice, r);
    let basis = BasisSet::select(&lattice, 9, Truncation::Circular).unwrap();
    let ops = build(&pattern, AIR, &materials(), &basis, &FmmOptions::default()).unwrap();
    assert_eq!(ops.epsilon2.rows(), 18);
    assert_eq!(ops.epsilon_inv.rows(), 9);
    let expected = 1.0 + 3.0 * PI * r * r;
    assert!((ops.epsilon2[(0, 0)].re - expected).abs() < 1e-12);
    assert!((ops.epsilon2[(9, 9)].re - expected).abs() < 1e-12);
}

#[test]
fn laurent_inverse_is_inverse_of_upper_quadrant() {
    let lattice = Lattice2D::square(1.0);
    let pattern = circle_layer(lattice, 0.3);
    let basis = BasisSet::select(&lattice, 21, Truncation::Circular).unwrap();
    let ops = build(&pattern, AIR, &materials(), &basis, &FmmOptions::default()).unwrap();
    let e = ops.quadrant(0, 0);
    assert_close(&ops.quadrant(1, 1), &e, 0.0, "diagonal quadrants");
    assert_close(&ops.quadrant(0, 1), &CMatrix::zeros(21, 21), 0.0, "cross quadrant");
    assert_close(&ops.epsilon_inv.matmul(&e), &CMatrix::identity(21), 1e-10, "E⁻¹·E");
}

#[test]
fn single_material_layer_is_diagonal_for_every_rule() {
    let lattice = Lattice2D::hexagonal(1.0);
    let pattern = ShapeList::new(lattice).unwrap();
    let basis = BasisSet::select(&lattice, 13, Truncation::Circular).unwrap();
    let n = basis.len();
    let eps = CMatrix::identity(n).scaled(Complex64::new(4.0, 0.0));
    let inv = CMatrix::identity(n).scaled(Complex64::new(0.25, 0.0));

    let variants = [
        FmmOptions::default(),
        FmmOptions {
            use_discretized_epsilon: true,
            ..FmmOptions::default()
        },
        FmmOptions {
            use_subpixel_smoothing: true,
            ..FmmOptions::default()
        },
        FmmOptions {
            use_experimental_fmm: true,
            ..FmmOptions::default()
        },
    ];
    for options in variants {
        let ops = build(&pattern, DIELECTRIC, &materials(), &basis, &options).unwrap();
        let rule = FactorizationRule::from_options(&options);
        assert_close(&ops.quadrant(0, 0), &eps, 1e-12, &format!("{rule:?} xx"));
        assert_close(&ops.quadrant(1, 1), &eps, 1e-12, &format!("{rule:?} yy"));
        assert_close(&ops.quadrant(0, 1), &CMatrix::zeros(n, n), 1e-12, &format!("{rule:?} xy"));
        assert_close(&ops.quadrant(1, 0), &CMatrix::zeros(n, n), 1e-12, &format!("{rule:?} yx"));
        assert_close(&ops.epsilon_inv, &inv, 1e-12, &format!("{rule:?} inverse"));
    }
}

#[test]
fn one_dimensional_layer_uses_inverse_rule_for_normal_component() {
    let lattice = Lattice2D::one_dimensional([1.0, 0.0]);
    let pattern = ShapeList::new(lattice)
        .unwrap()
        .with_shape(
            Shape::Interval {
                center: [0.0, 0.0],
                halfwidth: 0.25,
            },
            DIELECTRIC,
        )
        .unwrap();
    let basis = BasisSet::select(&lattice, 7, Truncation::Circular).unwrap();
    let ops = build(&pattern, AIR, &materials(), &basis, &FmmOptions::default()).unwrap();

    let e = scalar_transform_matrix(&pattern, &basis, &[Complex64::new(1.0, 0.0), Complex64::new(4.0, 0.0)]);
    let inverse_rule = scalar_transform_matrix(&pattern, &basis, &[Complex64::new(1.0, 0.0), Complex64::new(0.25, 0.0)]);
    let expected = inverse_rule.inverse("test").unwrap();

    assert_close(&ops.quadrant(0, 0), &e, 1e-12, "Laurent quadrant");
    assert_close(&ops.quadrant(1, 1), &expected, 1e-10, "inverse-rule quadrant");
    assert!((ops.epsilon2[(0, 0)].re - 2.5).abs() < 1e-12);
    // Harmonic mean of 1 and 4 at half fill is 1.6, and the DC entry of
    // [1/ε]⁻¹ lies between it and the arithmetic mean.
    let dc = ops.quadrant(1, 1)[(0, 0)].re;
    assert!(dc >= 1.6 - 1e-12 && dc < 2.5, "{dc}");
}

#[test]
fn lanczos_factor_is_one_at_dc_and_decays() {
    let lattice = Lattice2D::square(1.0);
    let basis = BasisSet::select(&lattice, 21, Truncation::Circular).unwrap();
    let lk = lattice.reciprocate().unwrap();
    let options = FmmOptions {
        use_lanczos_smoothing: true,
        ..FmmOptions::default()
    };
    let smoothing = LanczosSmoothing::from_options(&basis, &lk, &options).unwrap();
    // Last basis vector has length √5, plus one reciprocal vector.
    assert!((smoothing.order - (5.0f64.sqrt() + 1.0)).abs() < 1e-12);
    assert_eq!(smoothing.factor([0.0, 0.0]), 1.0);
    let f1 = smoothing.factor([1.0, 0.0]);
    let f2 = smoothing.factor([2.0, 0.0]);
    assert!(f1 < 1.0 && f2 < f1 && f2 > 0.0);
    assert!(LanczosSmoothing::from_options(&basis, &lk, &FmmOptions::default()).is_none());
}

#[test]
fn lanczos_smoothing_keeps_dc_and_damps_harmonics() {
    let lattice = Lattice2D::square(1.0);
    let pattern = circle_layer(lattice, 0.25);
    let basis = BasisSet::select(&lattice, 9, Truncation::Circular).unwrap();
    let plain = build(&pattern, AIR, &materials(), &basis, &FmmOptions::default()).unwrap();
    let smooth = build(
        &pattern,
        AIR,
        &materials(),
        &basis,
        &FmmOptions {
            use_lanczos_smoothing: true,
            lanczos_smoothing_power: 2,
            ..FmmOptions::default()
        },
    )
    .unwrap();
    assert!((plain.epsilon2[(0, 0)] - smooth.epsilon2[(0, 0)]).norm() < 1e-14);
    assert!(smooth.epsilon2[(1, 0)].norm() < plain.epsilon2[(1, 0)].norm());
}

#[test]
fn experimental_rule_ignores_smoothing_and_polarization_options() {
    let lattice = Lattice2D::square(1.0);
    let pattern = circle_layer(lattice, 0.3);
    let basis = BasisSet::select(&lattice, 9, Truncation::Circular).unwrap();
    let plain = FmmOptions {
        use_experimental_fmm: true,
        ..FmmOptions::default()
    };
    let decorated = FmmOptions {
        use_experimental_fmm: true,
        use_lanczos_smoothing: true,
        use_polarization_basis: true,
        use_jones_vector_basis: true,
        use_subpixel_smoothing: true,
        ..FmmOptions::default()
    };
    let a = build(&pattern, AIR, &materials(), &basis, &plain).unwrap();
    let b = build(&pattern, AIR, &materials(), &basis, &decorated).unwrap();
    assert_eq!(a, b);

    let inverse_rule = scalar_transform_matrix(&pattern, &basis, &[Complex64::new(1.0, 0.0), Complex64::new(0.25, 0.0)]);
    assert_close(&a.epsilon_inv, &inverse_rule, 1e-14, "experimental inverse");
}

#[test]
fn polarization_projection_of_uniform_layer_is_laurent() {
    let lattice = Lattice2D::square(1.0);
    let pattern = ShapeList::new(lattice).unwrap();
    let basis = BasisSet::select(&lattice, 9, Truncation::Circular).unwrap();
    for (jones, normal) in [(false, false), (false, true), (true, false)] {
        let options = FmmOptions {
            use_polarization_basis: true,
            use_jones_vector_basis: jones,
            use_normal_vector_basis: normal,
            ..FmmOptions::default()
        };
        let ops = build(&pattern, DIELECTRIC, &materials(), &basis, &options).unwrap();
        let e = CMatrix::identity(9).scaled(Complex64::new(4.0, 0.0));
        assert_close(&ops.quadrant(0, 0), &e, 1e-12, "projected xx");
        assert_close(&ops.quadrant(0, 1), &CMatrix::zeros(9, 9), 1e-12, "projected xy");
        assert_close(
            &ops.epsilon_inv,
            &CMatrix::identity(9).scaled(Complex64::new(0.25, 0.0)),
            1e-12,
            "inverse rule",
        );
    }
}

#[test]
fn normal_vector_projection_mixes_in_the_inverse_rule() {
    let lattice = Lattice2D::square(1.0);
    let pattern = circle_layer(lattice, 0.3);
    let basis = BasisSet::select(&lattice, 9, Truncation::Circular).unwrap();
    let laurent = build(&pattern, AIR, &materials(), &basis, &FmmOptions::default()).unwrap();
    let options = FmmOptions {
        use_polarization_basis: true,
        use_normal_vector_basis: true,
        ..FmmOptions::default()
    };
    let projected = build(&pattern, AIR, &materials(), &basis, &options).unwrap();
    let shift = (projected.epsilon2[(0, 0)] - laurent.epsilon2[(0, 0)]).norm();
    assert!(shift > 1e-6, "projection left the DC term unchanged");
    assert!(projected.epsilon2.is_finite());
    // Circle symmetry: xx and yy quadrants carry the same DC term.
    assert!((projected.epsilon2[(0, 0)] - projected.epsilon2[(9, 9)]).norm() < 1e-10);
}

#[test]
fn polarization_basis_with_tensor_material_is_unsupported() {
    let lattice = Lattice2D::square(1.0);
    let mut table = materials();
    let tensor = table.push(Material::Tensor(EpsilonTensor {
        xx: Complex64::new(2.0, 0.0),
        xy: Complex64::ZERO,
        yx: Complex64::ZERO,
        yy: Complex64::new(3.0, 0.0),
        zz: Complex64::new(4.0, 0.0),
    }));
    let pattern = ShapeList::new(lattice)
        .unwrap()
        .with_shape(
            Shape::Circle {
                center: [0.0, 0.0],
                radius: 0.2,
            },
            tensor,
        )
        .unwrap();
    let basis = BasisSet::select(&lattice, 5, Truncation::Circular).unwrap();
    let options = FmmOptions {
        use_polarization_basis: true,
        ..FmmOptions::default()
    };
    let err = build(&pattern, AIR, &table, &basis, &options).unwrap_err();
    assert!(matches!(err, RcwaError::Unsupported(_)), "{err}");
}

#[test]
fn tensor_background_fills_each_quadrant() {
    let lattice = Lattice2D::square(1.0);
    let table = MaterialTable::from_materials(vec![Material::Tensor(EpsilonTensor {
        xx: Complex64::new(2.0, 0.0),
        xy: Complex64::new(0.0, 0.5),
        yx: Complex64::new(0.0, -0.5),
        yy: Complex64::new(3.0, 0.0),
        zz: Complex64::new(5.0, 0.0),
    })]);
    let pattern = ShapeList::new(lattice).unwrap();
    let basis = BasisSet::select(&lattice, 5, Truncation::Circular).unwrap();
    for options in [
        FmmOptions::default(),
        FmmOptions {
            use_discretized_epsilon: true,
            ..FmmOptions::default()
        },
    ] {
        let ops = build(&pattern, 0, &table, &basis, &options).unwrap();
        let id = CMatrix::identity(5);
        assert_close(&ops.quadrant(0, 1), &id.scaled(Complex64::new(0.0, 0.5)), 1e-12, "xy");
        assert_close(&ops.quadrant(1, 0), &id.scaled(Complex64::new(0.0, -0.5)), 1e-12, "yx");
        assert_close(&ops.quadrant(1, 1), &id.scaled(Complex64::new(3.0, 0.0)), 1e-12, "yy");
        assert_close(&ops.epsilon_inv, &id.scaled(Complex64::new(0.2, 0.0)), 1e-12, "zz⁻¹");
    }
}

#[test]
fn discretized_rule_approximates_closed_form() {
    let lattice = Lattice2D::square(1.0);
    let r = 0.3;
    let pattern = circle_layer(lattice, r);
    let basis = BasisSet::select(&lattice, 9, Truncation::Circular).unwrap();
    let options = FmmOptions {
        use_discretized_epsilon: true,
        ..FmmOptions::default()
    };
    let ops = build(&pattern, AIR, &materials(), &basis, &options).unwrap();
    let expected = 1.0 + 3.0 * PI * r * r;
    assert!((ops.epsilon2[(0, 0)].re - expected).abs() < 0.02, "{}", ops.epsilon2[(0, 0)]);
    assert!(ops.epsilon2[(0, 0)].im.abs() < 1e-12);
}

#[test]
fn kottke_and_area_averaging_share_the_zz_operator() {
    let lattice = Lattice2D::square(1.0);
    let pattern = circle_layer(lattice, 0.27);
    let basis = BasisSet::select(&lattice, 9, Truncation::Circular).unwrap();
    let area = build(
        &pattern,
        AIR,
        &materials(),
        &basis,
        &FmmOptions {
            use_discretized_epsilon: true,
            ..FmmOptions::default()
        },
    )
    .unwrap();
    let kottke = build(
        &pattern,
        AIR,
        &materials(),
        &basis,
        &FmmOptions {
            use_subpixel_smoothing: true,
            ..FmmOptions::default()
        },
    )
    .unwrap();
    assert_close(&kottke.epsilon_inv, &area.epsilon_inv, 1e-12, "zz inverse");
    // Interface cells average harmonically along the normal.
    assert!(kottke.epsilon2[(0, 0)].re < area.epsilon2[(0, 0)].re);
}

#[test]
fn rule_and_basis_dispatch_follow_option_precedence() {
    let mut options = FmmOptions::default();
    assert_eq!(FactorizationRule::from_options(&options), FactorizationRule::ClosedForm);
    options.use_discretized_epsilon = true;
    assert_eq!(
        FactorizationRule::from_options(&options),
        FactorizationRule::Discretized(AveragingMode::AreaWeighted)
    );
    options.use_subpixel_smoothing = true;
    assert_eq!(
        FactorizationRule::from_options(&options),
        FactorizationRule::Discretized(AveragingMode::Kottke)
    );
    options.use_experimental_fmm = true;
    assert_eq!(FactorizationRule::from_options(&options), FactorizationRule::Experimental);

    let mut options = FmmOptions {
        use_polarization_basis: true,
        ..FmmOptions::default()
    };
    assert_eq!(PolarizationBasis::from_options(&options), Some(PolarizationBasis::VectorLength));
    options.use_normal_vector_basis = true;
    assert_eq!(PolarizationBasis::from_options(&options), Some(PolarizationBasis::NormalVector));
    options.use_jones_vector_basis = true;
    assert_eq!(PolarizationBasis::from_options(&options), Some(PolarizationBasis::Jones));
    options.use_polarization_basis = false;
    assert_eq!(PolarizationBasis::from_options(&options), None);
}

#[test]
fn discretization_grid_scales_with_basis_extent() {
    let lattice = Lattice2D::square(1.0);
    let basis = BasisSet::select(&lattice, 21, Truncation::Circular).unwrap();
    let grid = discretization_grid(&basis, &lattice, 8).unwrap();
    assert_eq!((grid.nx, grid.ny), (16, 16));
    let grid = discretization_grid(&basis, &lattice, 7).unwrap();
    assert_eq!((grid.nx, grid.ny), (15, 15));

    let line = Lattice2D::one_dimensional([1.0, 0.0]);
    let basis = BasisSet::select(&line, 11, Truncation::Circular).unwrap();
    let grid = discretization_grid(&basis, &line, 8).unwrap();
    assert_eq!((grid.nx, grid.ny), (40, 1));
}

#[test]
fn coarse_resolution_keeps_basis_differences_in_distinct_bins() {
    let lattice = Lattice2D::square(1.0);
    let r = 0.3;
    let pattern = circle_layer(lattice, r);
    let table = materials();
    let basis = BasisSet::select(&lattice, 9, Truncation::Circular).unwrap();
    let g = basis.vectors();
    let closed = build(&pattern, AIR, &table, &basis, &FmmOptions::default()).unwrap();

    for resolution in [2, 3, 4] {
        let grid = discretization_grid(&basis, &lattice, resolution).unwrap();
        assert!(grid.nx >= 5 && grid.ny >= 5, "{resolution}: {}x{}", grid.nx, grid.ny);
        let options = FmmOptions {
            use_discretized_epsilon: true,
            resolution,
            ..FmmOptions::default()
        };
        let ops = build(&pattern, AIR, &table, &basis, &options).unwrap();
        let e = ops.quadrant(0, 0);

        // Direct DFT of the sampled grid at every basis difference.
        let sampled =
            sample_layer(&pattern, AIR, &table, &lattice, grid, AveragingMode::AreaWeighted)
                .unwrap();
        let cells = grid.len() as f64;
        for i in 0..g.len() {
            for j in 0..g.len() {
                let dg = [g[i][0] - g[j][0], g[i][1] - g[j][1]];
                let mut expected = Complex64::ZERO;
                for iy in 0..grid.ny {
                    for ix in 0..grid.nx {
                        let phase = -2.0
                            * PI
                            * (dg[0] as f64 * ix as f64 / grid.nx as f64
                                + dg[1] as f64 * iy as f64 / grid.ny as f64);
                        expected += sampled.xx.get(ix, iy) * Complex64::from_polar(1.0, phase);
                    }
                }
                expected /= cells;
                assert!(
                    (e[(i, j)] - expected).norm() < 1e-12,
                    "resolution {resolution}, dG {dg:?}: {} vs {expected}",
                    e[(i, j)]
                );
            }
        }

        let dc = closed.epsilon2[(0, 0)].re;
        assert!((e[(0, 0)].re - dc).abs() < 0.05, "resolution {resolution}: {}", e[(0, 0)]);
        assert!(ops.epsilon_inv.is_finite());
    }
}

#[test]
fn anisotropic_shape_in_scalar_background_fills_quadrants_by_region() {
    let lattice = Lattice2D::square(1.0);
    let mut table = materials();
    let xy = Complex64::new(0.0, 0.5);
    let rod = table.push(Material::Tensor(EpsilonTensor {
        xx: Complex64::new(2.0, 0.0),
        xy,
        yx: xy.conj(),
        yy: Complex64::new(3.0, 0.0),
        zz: Complex64::new(6.0, 0.0),
    }));
    let r = 0.25;
    let pattern = ShapeList::new(lattice)
        .unwrap()
        .with_shape(
            Shape::Circle {
                center: [0.0, 0.0],
                radius: r,
            },
            rod,
        )
        .unwrap();
    let basis = BasisSet::select(&lattice, 9, Truncation::Circular).unwrap();
    let ops = build(&pattern, AIR, &table, &basis, &FmmOptions::default()).unwrap();

    let c = |re: f64| Complex64::new(re, 0.0);
    // The air background contributes its permittivity to the diagonal
    // components and nothing to the cross terms.
    let xx = scalar_transform_matrix(&pattern, &basis, &[c(1.0), c(2.0)]);
    let xy_expected = scalar_transform_matrix(&pattern, &basis, &[Complex64::ZERO, xy]);
    let yx_expected = scalar_transform_matrix(&pattern, &basis, &[Complex64::ZERO, xy.conj()]);
    let yy = scalar_transform_matrix(&pattern, &basis, &[c(1.0), c(3.0)]);
    let zz = scalar_transform_matrix(&pattern, &basis, &[c(1.0), c(6.0)]);
    assert_close(&ops.quadrant(0, 0), &xx, 1e-14, "xx");
    assert_close(&ops.quadrant(0, 1), &xy_expected, 1e-14, "xy");
    assert_close(&ops.quadrant(1, 0), &yx_expected, 1e-14, "yx");
    assert_close(&ops.quadrant(1, 1), &yy, 1e-14, "yy");
    assert_close(&ops.epsilon_inv.matmul(&zz), &CMatrix::identity(9), 1e-10, "zz⁻¹·zz");

    let area = PI * r * r;
    assert!((ops.epsilon2[(0, 9)] - xy * area).norm() < 1e-12);
    assert!((ops.epsilon2[(0, 0)] - c(1.0 + area)).norm() < 1e-12);
}

#[test]
fn invalid_inputs_are_reported_by_argument() {
    let lattice = Lattice2D::square(1.0);
    let pattern = circle_layer(lattice, 0.2);
    let basis = BasisSet::select(&lattice, 9, Truncation::Circular).unwrap();

    let err = build(&pattern, 5, &materials(), &basis, &FmmOptions::default()).unwrap_err();
    assert_eq!(err.code(), -2);

    let other = Lattice2D::square(2.0);
    let err = build_permittivity_operators(
        &LayerPattern::new(&pattern, AIR),
        &materials(),
        &basis,
        &other,
        &FmmOptions::default(),
    )
    .unwrap_err();
    assert_eq!(err.code(), -3);

    let options = FmmOptions {
        use_discretized_epsilon: true,
        resolution: 1,
        ..FmmOptions::default()
    };
    let err = build(&pattern, AIR, &materials(), &basis, &options).unwrap_err();
    assert!(matches!(err, RcwaError::Config(_)));
}
