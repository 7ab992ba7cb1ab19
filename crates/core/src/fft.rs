//! 2D complex FFT engine built on rustfft.
//!
//! The planner is a process-wide resource: `init`/`teardown` bracket its
//! lifetime and plan creation/destruction are serialized by a single lock.
//! Executing a plan never takes the lock, so independent solves can transform
//! concurrently once their plans exist.

use std::sync::Arc;

use log::trace;
use num_complex::Complex64;
use parking_lot::Mutex;
use rustfft::{Fft, FftPlanner};

pub use rustfft::FftDirection;

use crate::error::{RcwaError, Result};
use crate::field::Field2D;
use crate::grid::Grid2D;

static PLANNER: Mutex<Option<FftPlanner<f64>>> = Mutex::new(None);

/// Initialize the process-wide planner. Calling it more than once is a no-op;
/// plan creation initializes lazily if this was never called.
pub fn init() {
    let mut planner = PLANNER.lock();
    if planner.is_none() {
        *planner = Some(FftPlanner::new());
    }
}

/// Release every cached twiddle table and algorithm held by the planner.
/// Live plans stay valid; the next plan creation re-initializes.
pub fn teardown() {
    PLANNER.lock().take();
}

/// Smallest `m >= n` whose only prime factors are 2, 3 and 5.
pub fn next_fast_size(n: usize) -> usize {
    let mut candidate = n.max(1);
    loop {
        let mut m = candidate;
        for factor in [2, 3, 5] {
            while m % factor == 0 {
                m /= factor;
            }
        }
        if m == 1 {
            return candidate;
        }
        candidate += 1;
    }
}

struct PlanKernels {
    rows: Arc<dyn Fft<f64>>,
    cols: Arc<dyn Fft<f64>>,
}

/// A planned 2D transform of fixed size and direction. `Inverse` is
/// unnormalized.
pub struct FftPlan2D {
    grid: Grid2D,
    direction: FftDirection,
    kernels: Option<PlanKernels>,
}

impl FftPlan2D {
    pub fn new(grid: Grid2D, direction: FftDirection) -> Result<Self> {
        if grid.nx == 0 || grid.ny == 0 {
            return Err(RcwaError::FftPlan(format!(
                "grid {}x{} has a zero dimension",
                grid.nx, grid.ny
            )));
        }
        let kernels = {
            let mut guard = PLANNER.lock();
            let planner = guard.get_or_insert_with(FftPlanner::new);
            PlanKernels {
                rows: planner.plan_fft(grid.nx, direction),
                cols: planner.plan_fft(grid.ny, direction),
            }
        };
        trace!("planned {:?} FFT on {}x{} grid", direction, grid.nx, grid.ny);
        Ok(Self {
            grid,
            direction,
            kernels: Some(kernels),
        })
    }

    pub fn grid(&self) -> Grid2D {
        self.grid
    }

    pub fn direction(&self) -> FftDirection {
        self.direction
    }

    /// Transform `input` into `output`; `input` is left untouched.
    pub fn execute(&self, input: &Field2D, output: &mut Field2D) -> Result<()> {
        self.check_grid(input.grid())?;
        self.check_grid(output.grid())?;
        output.as_mut_slice().copy_from_slice(input.as_slice());
        self.execute_in_place(output)
    }

    pub fn execute_in_place(&self, buffer: &mut Field2D) -> Result<()> {
        self.check_grid(buffer.grid())?;
        let kernels = self
            .kernels
            .as_ref()
            .ok_or_else(|| RcwaError::FftPlan("plan was already destroyed".into()))?;
        let (nx, ny) = (self.grid.nx, self.grid.ny);
        let data = buffer.as_mut_slice();

        let scratch_len = kernels
            .rows
            .get_inplace_scratch_len()
            .max(kernels.cols.get_inplace_scratch_len());
        let mut scratch = vec![Complex64::default(); scratch_len];

        // Rows are contiguous, so one call processes all of them.
        if nx > 1 {
            kernels.rows.process_with_scratch(data, &mut scratch);
        }

        if ny > 1 {
            let mut column = vec![Complex64::default(); ny];
            for ix in 0..nx {
                for (iy, value) in column.iter_mut().enumerate() {
                    *value = data[iy * nx + ix];
                }
                kernels.cols.process_with_scratch(&mut column, &mut scratch);
                for (iy, value) in column.iter().enumerate() {
                    data[iy * nx + ix] = *value;
                }
            }
        }
        Ok(())
    }

    fn check_grid(&self, grid: Grid2D) -> Result<()> {
        if grid != self.grid {
            return Err(RcwaError::FftPlan(format!(
                "buffer grid {}x{} does not match plan grid {}x{}",
                grid.nx, grid.ny, self.grid.nx, self.grid.ny
            )));
        }
        Ok(())
    }
}

impl Drop for FftPlan2D {
    fn drop(&mut self) {
        let _guard = PLANNER.lock();
        drop(self.kernels.take());
    }
}
