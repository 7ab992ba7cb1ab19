//! Special functions needed by closed-form shape transforms and Lanczos smoothing.

use std::f64::consts::PI;

/// Below this argument the power series of J1 is used; above it the Hankel
/// asymptotic expansion. Both are accurate to roughly 1e-12 at the switch.
const SERIES_LIMIT: f64 = 16.0;

/// Bessel function of the first kind of order one.
pub fn bessel_j1(x: f64) -> f64 {
    if x < 0.0 {
        return -bessel_j1(-x);
    }
    if x < SERIES_LIMIT {
        j1_series(x)
    } else {
        j1_asymptotic(x)
    }
}

/// J1(x) = Σ (-1)^m (x/2)^(2m+1) / (m! (m+1)!)
fn j1_series(x: f64) -> f64 {
    let half = 0.5 * x;
    let q = -half * half;
    let mut term = half;
    let mut sum = term;
    for m in 1..200 {
        term *= q / (m as f64 * (m as f64 + 1.0));
        sum += term;
        if term.abs() <= sum.abs() * f64::EPSILON {
            break;
        }
    }
    sum
}

/// Hankel expansion J1(x) ≈ sqrt(2/(πx)) (P cos χ − Q sin χ), χ = x − 3π/4,
/// truncated at its smallest term.
fn j1_asymptotic(x: f64) -> f64 {
    let mu = 4.0;
    let mut p = 1.0;
    let mut q = 0.0;
    let mut term = 1.0f64;
    let mut last = f64::INFINITY;
    for k in 1..60 {
        let odd = (2 * k - 1) as f64;
        term *= (mu - odd * odd) / (k as f64 * 8.0 * x);
        let magnitude = term.abs();
        if magnitude >= last || magnitude < 1e-17 {
            break;
        }
        last = magnitude;
        // k odd feeds Q with sign (-1)^((k-1)/2), k even feeds P with (-1)^(k/2).
        match k % 4 {
            1 => q += term,
            2 => p -= term,
            3 => q -= term,
            _ => p += term,
        }
    }
    let chi = x - 0.75 * PI;
    (2.0 / (PI * x)).sqrt() * (p * chi.cos() - q * chi.sin())
}

/// `Jinc(x) = 2·J1(2πx)/(2πx)` with `Jinc(0) = 1`.
pub fn jinc(x: f64) -> f64 {
    let z = 2.0 * PI * x;
    if z == 0.0 {
        return 1.0;
    }
    2.0 * bessel_j1(z) / z
}

/// `sin(x)/x` with the removable singularity filled in.
pub fn sinc(x: f64) -> f64 {
    if x.abs() < 1e-4 {
        let x2 = x * x;
        1.0 - x2 / 6.0 + x2 * x2 / 120.0
    } else {
        x.sin() / x
    }
}
