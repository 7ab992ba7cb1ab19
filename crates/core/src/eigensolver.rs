//! Dense eigensystems of a layer's coupling matrix.
//!
//! Both solvers go through `faer`: the general complex eigendecomposition,
//! and the self-adjoint one for Hermitian matrices, which keeps eigenvalues
//! real and eigenvectors orthonormal.

use log::debug;
use num_complex::Complex64;

use crate::error::{RcwaError, Result};
use crate::matrix::CMatrix;

/// `values[k]` pairs with column `k` of `vectors` (`dim × count`).
#[derive(Debug, Clone, PartialEq)]
pub struct Eigenpairs {
    pub values: Vec<Complex64>,
    pub vectors: CMatrix,
}

impl Eigenpairs {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn vector(&self, k: usize) -> &[Complex64] {
        self.vectors.column(k)
    }

    /// Reorder by ascending real part, ties broken by imaginary part.
    pub fn sort_by_real_part(&mut self) {
        let mut order: Vec<usize> = (0..self.values.len()).collect();
        order.sort_by(|&a, &b| {
            let (x, y) = (self.values[a], self.values[b]);
            x.re.total_cmp(&y.re).then(x.im.total_cmp(&y.im))
        });
        let values = order.iter().map(|&k| self.values[k]).collect();
        let vectors = CMatrix::from_fn(self.vectors.rows(), order.len(), |i, k| {
            self.vectors[(i, order[k])]
        });
        self.values = values;
        self.vectors = vectors;
    }
}

fn check_input(count: usize, matrix: &CMatrix) -> Result<()> {
    if !matrix.is_square() {
        return Err(RcwaError::invalid_argument(
            2,
            format!("matrix is {}x{}, expected square", matrix.rows(), matrix.cols()),
        ));
    }
    if count > matrix.rows() {
        return Err(RcwaError::invalid_argument(
            1,
            format!("requested {count} eigenpairs of a {0}x{0} matrix", matrix.rows()),
        ));
    }
    if !matrix.is_finite() {
        return Err(RcwaError::invalid_argument(2, "matrix has non-finite entries"));
    }
    Ok(())
}

/// First `count` eigenpairs of a general complex matrix, in the order the
/// decomposition produces them. Eigenvectors have unit 2-norm.
pub fn eigensystem(count: usize, matrix: &CMatrix) -> Result<Eigenpairs> {
    check_input(count, matrix)?;
    let n = matrix.rows();
    if count == 0 || n == 0 {
        return Ok(Eigenpairs {
            values: Vec::new(),
            vectors: CMatrix::zeros(n, 0),
        });
    }

    let decomposition = matrix.to_faer().eigendecomposition::<faer::complex_native::c64>();
    let s = decomposition.s().column_vector();
    let u = decomposition.u();

    let mut values = Vec::with_capacity(count);
    let mut vectors = CMatrix::zeros(n, count);
    for k in 0..count {
        let lambda = s.read(k);
        values.push(Complex64::new(lambda.re, lambda.im));
        let mut norm_sq = 0.0;
        for i in 0..n {
            let z = u.read(i, k);
            let z = Complex64::new(z.re, z.im);
            norm_sq += z.norm_sqr();
            vectors[(i, k)] = z;
        }
        let norm = norm_sq.sqrt();
        if norm > 0.0 {
            for i in 0..n {
                vectors[(i, k)] /= norm;
            }
        }
    }

    if values.iter().any(|z| !(z.re.is_finite() && z.im.is_finite())) || !vectors.is_finite() {
        return Err(RcwaError::NoConvergence {
            context: format!("general eigendecomposition of a {n}x{n} matrix"),
        });
    }
    debug!("computed {count} of {n} eigenpairs (general)");
    Ok(Eigenpairs { values, vectors })
}

/// First `count` eigenpairs of the Hermitian part of `matrix`, by descending
/// eigenvalue. Eigenvalues are returned with zero imaginary part.
pub fn hermitian_eigensystem(count: usize, matrix: &CMatrix) -> Result<Eigenpairs> {
    check_input(count, matrix)?;
    let n = matrix.rows();
    if count == 0 || n == 0 {
        return Ok(Eigenpairs {
            values: Vec::new(),
            vectors: CMatrix::zeros(n, 0),
        });
    }

    let hermitian = CMatrix::from_fn(n, n, |i, j| 0.5 * (matrix[(i, j)] + matrix[(j, i)].conj()));
    let decomposition = hermitian
        .to_faer()
        .selfadjoint_eigendecomposition(faer::Side::Lower);
    let s = decomposition.s().column_vector();
    let u = decomposition.u();

    // faer orders eigenvalues ascending.
    let mut values = Vec::with_capacity(count);
    let mut vectors = CMatrix::zeros(n, count);
    for k in 0..count {
        let source = n - 1 - k;
        values.push(Complex64::new(s.read(source).re, 0.0));
        for i in 0..n {
            let z = u.read(i, source);
            vectors[(i, k)] = Complex64::new(z.re, z.im);
        }
    }

    if values.iter().any(|z| !z.re.is_finite()) || !vectors.is_finite() {
        return Err(RcwaError::NoConvergence {
            context: format!("self-adjoint eigendecomposition of a {n}x{n} matrix"),
        });
    }
    debug!("computed {count} of {n} eigenpairs (Hermitian)");
    Ok(Eigenpairs { values, vectors })
}
