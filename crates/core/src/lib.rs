//! Numerical core of a 2D-periodic RCWA solver: planewave basis selection,
//! 2D transforms, Fourier factorization of patterned layers and dense
//! eigensystems.

pub mod dielectric;
pub mod eigensolver;
pub mod error;
pub mod fft;
pub mod field;
pub mod fmm;
pub mod geometry;
pub mod grid;
pub mod gsel;
pub mod lattice;
pub mod material;
pub mod matrix;
pub mod options;
pub mod pattern;
pub mod polarization;
pub mod special;

pub use error::{RcwaError, Result};

#[cfg(test)]
mod _tests_fmm;
