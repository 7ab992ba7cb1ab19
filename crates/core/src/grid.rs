//! Uniform sampling grids over the unit cell.

use serde::{Deserialize, Serialize};

/// Grid of `nx × ny` cells over the unit cell, stored row-major with `x`
/// fastest. Cell `(ix, iy)` is centred on fractional point `(ix/nx, iy/ny)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid2D {
    pub nx: usize,
    pub ny: usize,
}

impl Grid2D {
    pub fn new(nx: usize, ny: usize) -> Self {
        Self { nx, ny }
    }

    #[inline]
    pub fn idx(&self, ix: usize, iy: usize) -> usize {
        iy * self.nx + ix
    }

    pub fn len(&self) -> usize {
        self.nx * self.ny
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fractional coordinates of the centre of a cell.
    pub fn cell_center(&self, ix: usize, iy: usize) -> [f64; 2] {
        [ix as f64 / self.nx as f64, iy as f64 / self.ny as f64]
    }

    /// Storage index of a (possibly negative) frequency, wrapped into the
    /// transform's positive-index convention.
    #[inline]
    pub fn frequency_idx(&self, f: [i32; 2]) -> usize {
        let kx = f[0].rem_euclid(self.nx as i32) as usize;
        let ky = f[1].rem_euclid(self.ny as i32) as usize;
        self.idx(kx, ky)
    }
}
