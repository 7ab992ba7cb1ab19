//! Planewave basis selection (G-vector truncation).
//!
//! The returned order is the row/column order of every operator built from
//! the basis, so it is fully deterministic: ascending truncation metric, then
//! ascending length, then lexicographic on the integer pair.

use std::cmp::Ordering;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{RcwaError, Result};
use crate::lattice::{Lattice2D, ReciprocalLattice2D};

/// Relative tolerance under which two lengths belong to the same shell.
const SHELL_TOLERANCE: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Truncation {
    #[default]
    Circular,
    Parallelogramic,
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    g: [i32; 2],
    metric: f64,
    length: f64,
}

fn compare_candidates(a: &Candidate, b: &Candidate) -> Ordering {
    a.metric
        .total_cmp(&b.metric)
        .then(a.length.total_cmp(&b.length))
        .then(a.g.cmp(&b.g))
}

/// Select at most `capacity` basis vectors for the frequency basis `lk`.
pub fn select_g_vectors(
    truncation: Truncation,
    capacity: usize,
    lk: &ReciprocalLattice2D,
) -> Result<Vec<[i32; 2]>> {
    if capacity == 0 {
        return Err(RcwaError::invalid_argument(2, "capacity must be at least 1"));
    }
    if !lk.b1.iter().chain(lk.b2.iter()).all(|v| v.is_finite()) {
        return Err(RcwaError::invalid_argument(3, "reciprocal lattice must be finite"));
    }
    if lk.b1_length() == 0.0 {
        return Err(RcwaError::invalid_argument(3, "first reciprocal vector is zero"));
    }

    if lk.is_one_dimensional() {
        return Ok(select_one_dimensional(capacity));
    }
    if lk.determinant() == 0.0 {
        return Err(RcwaError::invalid_argument(3, "reciprocal vectors are collinear"));
    }

    let selected = match truncation {
        Truncation::Circular => select_circular(capacity, lk),
        Truncation::Parallelogramic => select_parallelogramic(capacity, lk),
    };
    debug!(
        "selected {} of {} requested G vectors ({:?} truncation)",
        selected.len(),
        capacity,
        truncation
    );
    Ok(selected)
}

fn select_one_dimensional(capacity: usize) -> Vec<[i32; 2]> {
    let extent = ((capacity - 1) / 2) as i32;
    let mut g: Vec<[i32; 2]> = (-extent..=extent).map(|m| [m, 0]).collect();
    g.sort_by(|a, b| a[0].abs().cmp(&b[0].abs()).then(a.cmp(b)));
    g
}

fn select_parallelogramic(capacity: usize, lk: &ReciprocalLattice2D) -> Vec<[i32; 2]> {
    let mut side = (capacity as f64).sqrt().floor() as usize;
    while side * side > capacity {
        side -= 1;
    }
    if side % 2 == 0 {
        side -= 1;
    }
    let extent = ((side - 1) / 2) as i32;
    let mut candidates = Vec::with_capacity(side * side);
    for m1 in -extent..=extent {
        for m2 in -extent..=extent {
            let g = [m1, m2];
            candidates.push(Candidate {
                g,
                metric: m1.abs().max(m2.abs()) as f64,
                length: length(lk, g),
            });
        }
    }
    candidates.sort_by(compare_candidates);
    candidates.into_iter().map(|c| c.g).collect()
}

fn select_circular(capacity: usize, lk: &ReciprocalLattice2D) -> Vec<[i32; 2]> {
    // Radius of a disc holding `capacity` reciprocal cells, padded by one cell
    // diagonal so the enumeration window can never run short.
    let cell_area = lk.determinant().abs();
    let radius =
        (capacity as f64 * cell_area / std::f64::consts::PI).sqrt() + lk.b1_length() + lk.b2_length();

    // m_i = f·a_i for the dual real-space vectors, so |m_i| <= radius·|a_i|.
    let inv = 1.0 / lk.determinant();
    let a1_len = lk.b2_length() * inv.abs();
    let a2_len = lk.b1_length() * inv.abs();
    let extent1 = (radius * a1_len).ceil() as i32 + 1;
    let extent2 = (radius * a2_len).ceil() as i32 + 1;

    let mut candidates = Vec::new();
    for m1 in -extent1..=extent1 {
        for m2 in -extent2..=extent2 {
            let g = [m1, m2];
            let len = length(lk, g);
            if len <= radius {
                candidates.push(Candidate {
                    g,
                    metric: len,
                    length: len,
                });
            }
        }
    }
    candidates.sort_by(compare_candidates);

    let mut keep = capacity.min(candidates.len());
    if keep < candidates.len() {
        let boundary = candidates[keep].length;
        while keep > 1 && same_shell(candidates[keep - 1].length, boundary) {
            keep -= 1;
        }
        if keep < capacity {
            debug!(
                "circular truncation backed off from {} to {} to keep whole shells",
                capacity, keep
            );
        }
    }
    candidates.truncate(keep);
    candidates.into_iter().map(|c| c.g).collect()
}

fn same_shell(a: f64, b: f64) -> bool {
    (a - b).abs() <= SHELL_TOLERANCE * a.max(b)
}

fn length(lk: &ReciprocalLattice2D, g: [i32; 2]) -> f64 {
    let f = lk.frequency(g);
    f[0].hypot(f[1])
}

/// A selected basis together with the request it was computed for.
#[derive(Debug, Clone, PartialEq)]
pub struct BasisSet {
    g: Vec<[i32; 2]>,
    lattice: Lattice2D,
    capacity: usize,
    truncation: Truncation,
}

impl BasisSet {
    pub fn select(lattice: &Lattice2D, capacity: usize, truncation: Truncation) -> Result<Self> {
        let lk = lattice.reciprocate()?;
        let g = select_g_vectors(truncation, capacity, &lk)?;
        Ok(Self {
            g,
            lattice: *lattice,
            capacity,
            truncation,
        })
    }

    /// Build a basis from an explicit list. Entries must be unique.
    pub fn from_vectors(lattice: &Lattice2D, g: Vec<[i32; 2]>) -> Result<Self> {
        if g.is_empty() {
            return Err(RcwaError::invalid_argument(2, "basis must not be empty"));
        }
        let mut sorted = g.clone();
        sorted.sort_unstable();
        if sorted.windows(2).any(|w| w[0] == w[1]) {
            return Err(RcwaError::invalid_argument(2, "basis vectors must be unique"));
        }
        let capacity = g.len();
        Ok(Self {
            g,
            lattice: *lattice,
            capacity,
            truncation: Truncation::Circular,
        })
    }

    /// Whether this basis was selected for the given request; a changed
    /// lattice or truncation count means the basis must be recomputed.
    pub fn is_valid_for(&self, lattice: &Lattice2D, capacity: usize, truncation: Truncation) -> bool {
        self.lattice == *lattice && self.capacity == capacity && self.truncation == truncation
    }

    pub fn len(&self) -> usize {
        self.g.len()
    }

    pub fn is_empty(&self) -> bool {
        self.g.is_empty()
    }

    pub fn vectors(&self) -> &[[i32; 2]] {
        &self.g
    }

    pub fn get(&self, index: usize) -> [i32; 2] {
        self.g[index]
    }

    /// Largest |m| per axis over the basis.
    pub fn extent(&self) -> [i32; 2] {
        self.g.iter().fold([0, 0], |acc, g| {
            [acc[0].max(g[0].abs()), acc[1].max(g[1].abs())]
        })
    }

    pub fn lattice(&self) -> &Lattice2D {
        &self.lattice
    }
}
