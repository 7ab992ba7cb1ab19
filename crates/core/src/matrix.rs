//! Dense complex matrices in column-major order.
//!
//! Entry `(i, j)` lives at `data[i + j * rows]`, the layout the downstream
//! mode assembly consumes. Linear solves are delegated to `faer`.

use std::ops::{Index, IndexMut};

use faer::complex_native::c64;
use faer::linalg::solvers::SpSolver;
use num_complex::Complex64;

use crate::error::{RcwaError, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct CMatrix {
    rows: usize,
    cols: usize,
    data: Vec<Complex64>,
}

impl CMatrix {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![Complex64::ZERO; rows * cols],
        }
    }

    pub fn identity(n: usize) -> Self {
        let mut m = Self::zeros(n, n);
        for i in 0..n {
            m[(i, i)] = Complex64::ONE;
        }
        m
    }

    pub fn from_fn(rows: usize, cols: usize, mut f: impl FnMut(usize, usize) -> Complex64) -> Self {
        let mut data = Vec::with_capacity(rows * cols);
        for j in 0..cols {
            for i in 0..rows {
                data.push(f(i, j));
            }
        }
        Self { rows, cols, data }
    }

    pub fn from_diagonal(diag: &[Complex64]) -> Self {
        let mut m = Self::zeros(diag.len(), diag.len());
        for (i, &value) in diag.iter().enumerate() {
            m[(i, i)] = value;
        }
        m
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    /// Column-major storage.
    pub fn as_slice(&self) -> &[Complex64] {
        &self.data
    }

    pub fn column(&self, j: usize) -> &[Complex64] {
        &self.data[j * self.rows..(j + 1) * self.rows]
    }

    /// Copy of the `rows × cols` block starting at `(row0, col0)`.
    pub fn block(&self, row0: usize, col0: usize, rows: usize, cols: usize) -> Self {
        Self::from_fn(rows, cols, |i, j| self[(row0 + i, col0 + j)])
    }

    pub fn set_block(&mut self, row0: usize, col0: usize, block: &Self) {
        for j in 0..block.cols {
            for i in 0..block.rows {
                self[(row0 + i, col0 + j)] = block[(i, j)];
            }
        }
    }

    pub fn matmul(&self, rhs: &Self) -> Self {
        assert_eq!(self.cols, rhs.rows, "inner dimensions must agree");
        let mut out = Self::zeros(self.rows, rhs.cols);
        for j in 0..rhs.cols {
            for k in 0..self.cols {
                let b = rhs[(k, j)];
                if b == Complex64::ZERO {
                    continue;
                }
                let a_col = self.column(k);
                let out_col = &mut out.data[j * self.rows..(j + 1) * self.rows];
                for (dst, a) in out_col.iter_mut().zip(a_col) {
                    *dst += a * b;
                }
            }
        }
        out
    }

    pub fn sub(&self, rhs: &Self) -> Self {
        assert_eq!((self.rows, self.cols), (rhs.rows, rhs.cols));
        Self {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().zip(&rhs.data).map(|(a, b)| a - b).collect(),
        }
    }

    pub fn scaled(&self, alpha: Complex64) -> Self {
        Self {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().map(|a| a * alpha).collect(),
        }
    }

    pub fn conjugate_transpose(&self) -> Self {
        Self::from_fn(self.cols, self.rows, |i, j| self[(j, i)].conj())
    }

    pub fn max_abs_diff(&self, rhs: &Self) -> f64 {
        assert_eq!((self.rows, self.cols), (rhs.rows, rhs.cols));
        self.data
            .iter()
            .zip(&rhs.data)
            .map(|(a, b)| (a - b).norm())
            .fold(0.0, f64::max)
    }

    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|z| z.re.is_finite() && z.im.is_finite())
    }

    /// Solve `self · X = rhs` by LU decomposition with partial pivoting.
    pub fn solve(&self, rhs: &Self, context: &'static str) -> Result<Self> {
        if !self.is_square() {
            return Err(RcwaError::invalid_argument(1, "matrix must be square"));
        }
        if rhs.rows != self.rows {
            return Err(RcwaError::invalid_argument(2, "right-hand side has wrong row count"));
        }
        let n = self.rows;
        let lu = self.to_faer().partial_piv_lu();

        let mut solution = Self::zeros(n, rhs.cols);
        for j in 0..rhs.cols {
            let faer_rhs = faer::Col::<c64>::from_fn(n, |i| {
                let z = rhs[(i, j)];
                c64::new(z.re, z.im)
            });
            let faer_sol = lu.solve(&faer_rhs);
            for i in 0..n {
                let z = faer_sol[i];
                solution[(i, j)] = Complex64::new(z.re, z.im);
            }
        }
        if !solution.is_finite() {
            return Err(RcwaError::SingularMatrix { context });
        }
        Ok(solution)
    }

    pub fn inverse(&self, context: &'static str) -> Result<Self> {
        self.solve(&Self::identity(self.rows), context)
    }

    pub(crate) fn to_faer(&self) -> faer::Mat<c64> {
        faer::Mat::<c64>::from_fn(self.rows, self.cols, |i, j| {
            let z = self[(i, j)];
            c64::new(z.re, z.im)
        })
    }
}

impl Index<(usize, usize)> for CMatrix {
    type Output = Complex64;

    #[inline]
    fn index(&self, (i, j): (usize, usize)) -> &Complex64 {
        &self.data[i + j * self.rows]
    }
}

impl IndexMut<(usize, usize)> for CMatrix {
    #[inline]
    fn index_mut(&mut self, (i, j): (usize, usize)) -> &mut Complex64 {
        &mut self.data[i + j * self.rows]
    }
}
