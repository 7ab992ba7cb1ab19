//! Contiguous complex-valued storage on a uniform 2D grid.
//!
//! `Field2D` is the workspace type handed to the transform engine. rustfft
//! needs nothing beyond the natural alignment of `Complex64`, so a plain
//! `Vec` is the allocator.

use num_complex::Complex64;

use crate::grid::Grid2D;

#[derive(Debug, Clone)]
pub struct Field2D {
    grid: Grid2D,
    data: Vec<Complex64>,
}

impl Field2D {
    pub fn zeros(grid: Grid2D) -> Self {
        Self {
            data: vec![Complex64::default(); grid.len()],
            grid,
        }
    }

    pub fn from_vec(grid: Grid2D, data: Vec<Complex64>) -> Self {
        assert_eq!(data.len(), grid.len(), "data length must match grid size");
        Self { grid, data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn grid(&self) -> Grid2D {
        self.grid
    }

    pub fn as_slice(&self) -> &[Complex64] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [Complex64] {
        &mut self.data
    }

    pub fn get(&self, ix: usize, iy: usize) -> Complex64 {
        self.data[self.grid.idx(ix, iy)]
    }

    pub fn set(&mut self, ix: usize, iy: usize, value: Complex64) {
        let idx = self.grid.idx(ix, iy);
        self.data[idx] = value;
    }

    /// Value stored at a signed frequency after a forward transform.
    pub fn at_frequency(&self, f: [i32; 2]) -> Complex64 {
        self.data[self.grid.frequency_idx(f)]
    }

    pub fn fill(&mut self, value: Complex64) {
        self.data.fill(value);
    }

    pub fn scale(&mut self, alpha: f64) {
        for value in &mut self.data {
            *value *= alpha;
        }
    }
}

impl From<Field2D> for Vec<Complex64> {
    fn from(field: Field2D) -> Self {
        field.data
    }
}
