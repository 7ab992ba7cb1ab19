//! Lattice primitives for 2D-periodic layers.
//!
//! The reciprocal basis is kept in cycles per unit length (`Lk`): the 2π of the
//! physical reciprocal vectors is folded into the convention, so a basis
//! vector `G = (m1, m2)` has spatial frequency `f = m1·b1 + m2·b2` and
//! wavevector `2π·f`.

use serde::{Deserialize, Serialize};

use crate::error::{RcwaError, Result};

const TAU: f64 = std::f64::consts::PI * 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Lattice2D {
    pub a1: [f64; 2],
    pub a2: [f64; 2],
}

/// Whether the pattern varies along one or two lattice directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimensionality {
    One,
    Two,
}

impl Lattice2D {
    pub fn square(a: f64) -> Self {
        Self {
            a1: [a, 0.0],
            a2: [0.0, a],
        }
    }

    pub fn rectangular(a: f64, b: f64) -> Self {
        Self {
            a1: [a, 0.0],
            a2: [0.0, b],
        }
    }

    pub fn hexagonal(a: f64) -> Self {
        let half = 0.5 * a;
        let h = (3.0f64).sqrt() * 0.5 * a;
        Self {
            a1: [a, 0.0],
            a2: [half, h],
        }
    }

    pub fn oblique(a1: [f64; 2], a2: [f64; 2]) -> Self {
        Self { a1, a2 }
    }

    /// Lattice periodic only along `a1`.
    pub fn one_dimensional(a1: [f64; 2]) -> Self {
        Self { a1, a2: [0.0, 0.0] }
    }

    pub fn is_one_dimensional(&self) -> bool {
        self.a2[0] == 0.0 && self.a2[1] == 0.0
    }

    pub fn dimensionality(&self) -> Dimensionality {
        if self.is_one_dimensional() {
            Dimensionality::One
        } else {
            Dimensionality::Two
        }
    }

    /// Invert the lattice into its frequency basis.
    ///
    /// A 1D lattice yields `b1 = a1/|a1|²` and `b2 = 0`.
    pub fn reciprocate(&self) -> Result<ReciprocalLattice2D> {
        if !self.a1.iter().chain(self.a2.iter()).all(|v| v.is_finite()) {
            return Err(RcwaError::invalid_argument(1, "lattice vectors must be finite"));
        }
        if self.is_one_dimensional() {
            let len_sq = norm_sq(self.a1);
            if len_sq == 0.0 {
                return Err(RcwaError::DegenerateLattice(
                    "1D lattice vector has zero length".into(),
                ));
            }
            return Ok(ReciprocalLattice2D {
                b1: [self.a1[0] / len_sq, self.a1[1] / len_sq],
                b2: [0.0, 0.0],
            });
        }
        let det = self.determinant();
        let scale = norm_sq(self.a1).sqrt() * norm_sq(self.a2).sqrt();
        if det.abs() <= f64::EPSILON * scale || scale == 0.0 {
            return Err(RcwaError::DegenerateLattice(
                "primitive vectors are linearly dependent".into(),
            ));
        }
        let inv = 1.0 / det;
        Ok(ReciprocalLattice2D {
            b1: [self.a2[1] * inv, -self.a2[0] * inv],
            b2: [-self.a1[1] * inv, self.a1[0] * inv],
        })
    }

    /// Area of the unit cell (length of `a1` for a 1D lattice).
    pub fn unit_cell_size(&self) -> f64 {
        if self.is_one_dimensional() {
            norm_sq(self.a1).sqrt()
        } else {
            self.determinant().abs()
        }
    }

    pub fn fractional_to_cartesian(&self, frac: [f64; 2]) -> [f64; 2] {
        [
            self.a1[0] * frac[0] + self.a2[0] * frac[1],
            self.a1[1] * frac[0] + self.a2[1] * frac[1],
        ]
    }

    /// Fractional coordinates of a Cartesian point. For a 1D lattice the
    /// second coordinate is zero and the first is the projection onto `a1`.
    pub fn cartesian_to_fractional(&self, cart: [f64; 2]) -> [f64; 2] {
        if self.is_one_dimensional() {
            let len_sq = norm_sq(self.a1);
            if len_sq == 0.0 {
                return [0.0, 0.0];
            }
            return [(cart[0] * self.a1[0] + cart[1] * self.a1[1]) / len_sq, 0.0];
        }
        let det = self.determinant();
        if det == 0.0 {
            return [0.0, 0.0];
        }
        let inv_det = 1.0 / det;
        [
            (self.a2[1] * cart[0] - self.a2[0] * cart[1]) * inv_det,
            (-self.a1[1] * cart[0] + self.a1[0] * cart[1]) * inv_det,
        ]
    }

    /// Shortest periodic image of a displacement, folded into the cell
    /// centred on the origin.
    pub fn minimum_image(&self, displacement: [f64; 2]) -> [f64; 2] {
        let frac = self.cartesian_to_fractional(displacement);
        let shift = [frac[0].round(), frac[1].round()];
        let lattice_shift = self.fractional_to_cartesian(shift);
        [
            displacement[0] - lattice_shift[0],
            displacement[1] - lattice_shift[1],
        ]
    }

    fn determinant(&self) -> f64 {
        self.a1[0] * self.a2[1] - self.a1[1] * self.a2[0]
    }
}

/// Frequency basis of a lattice (`Lk`), in cycles per unit length.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReciprocalLattice2D {
    pub b1: [f64; 2],
    pub b2: [f64; 2],
}

impl ReciprocalLattice2D {
    /// Spatial frequency of an integer basis vector.
    #[inline]
    pub fn frequency(&self, g: [i32; 2]) -> [f64; 2] {
        let (m1, m2) = (g[0] as f64, g[1] as f64);
        [
            m1 * self.b1[0] + m2 * self.b2[0],
            m1 * self.b1[1] + m2 * self.b2[1],
        ]
    }

    /// Physical wavevector `2π·f` of an integer basis vector.
    pub fn wavevector(&self, g: [i32; 2]) -> [f64; 2] {
        let f = self.frequency(g);
        [TAU * f[0], TAU * f[1]]
    }

    pub fn is_one_dimensional(&self) -> bool {
        self.b2[0] == 0.0 && self.b2[1] == 0.0
    }

    pub fn b1_length(&self) -> f64 {
        norm_sq(self.b1).sqrt()
    }

    pub fn b2_length(&self) -> f64 {
        norm_sq(self.b2).sqrt()
    }

    pub(crate) fn determinant(&self) -> f64 {
        self.b1[0] * self.b2[1] - self.b1[1] * self.b2[0]
    }
}

#[inline]
fn norm_sq(v: [f64; 2]) -> f64 {
    v[0] * v[0] + v[1] * v[1]
}
