//! Reference pattern: an ordered list of circles, rotated rectangles and
//! strips, each filled with one material.
//!
//! On a 1D lattice every shape is reduced to its extent along the periodic
//! direction, so a circle of radius `r` behaves as a strip of half-width `r`.

use std::f64::consts::PI;

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::error::{RcwaError, Result};
use crate::grid::Grid2D;
use crate::lattice::{Dimensionality, Lattice2D, ReciprocalLattice2D};
use crate::material::MaterialId;
use crate::pattern::{InterfaceSample, Pattern};
use crate::special::{jinc, sinc};

/// Subsamples per cell axis used when discretizing.
pub const DEFAULT_SUBSAMPLES: usize = 8;

/// Frequencies with `|f·a2|` below this are treated as lying on the `a2 = 0` line.
const LINE_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Shape {
    Circle {
        center: [f64; 2],
        radius: f64,
    },
    /// Rectangle rotated counter-clockwise by `angle` radians about its centre.
    Rectangle {
        center: [f64; 2],
        #[serde(default)]
        angle: f64,
        halfwidths: [f64; 2],
    },
    /// Strip parallel to `a2`, `halfwidth` measured perpendicular to it.
    Interval { center: [f64; 2], halfwidth: f64 },
}

impl Shape {
    pub fn center(&self) -> [f64; 2] {
        match *self {
            Self::Circle { center, .. }
            | Self::Rectangle { center, .. }
            | Self::Interval { center, .. } => center,
        }
    }

    /// Half-extent of the shape along the unit direction `axis`.
    fn half_extent_along(&self, axis: [f64; 2]) -> f64 {
        match *self {
            Self::Circle { radius, .. } => radius,
            Self::Rectangle {
                angle, halfwidths, ..
            } => {
                let (s, c) = angle.sin_cos();
                halfwidths[0] * (c * axis[0] + s * axis[1]).abs()
                    + halfwidths[1] * (-s * axis[0] + c * axis[1]).abs()
            }
            Self::Interval { halfwidth, .. } => halfwidth,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlacedShape {
    pub shape: Shape,
    pub material: MaterialId,
}

/// Strip in fractional coordinates: `|u − center| < halfwidth` along `a1`.
#[derive(Debug, Clone, Copy)]
struct Strip {
    center: f64,
    halfwidth: f64,
}

#[derive(Debug, Clone)]
pub struct ShapeList {
    lattice: Lattice2D,
    reciprocal: ReciprocalLattice2D,
    shapes: Vec<PlacedShape>,
    subsamples: usize,
}

impl ShapeList {
    pub fn new(lattice: Lattice2D) -> Result<Self> {
        let reciprocal = lattice.reciprocate()?;
        Ok(Self {
            lattice,
            reciprocal,
            shapes: Vec::new(),
            subsamples: DEFAULT_SUBSAMPLES,
        })
    }

    pub fn with_subsamples(mut self, subsamples: usize) -> Self {
        self.subsamples = subsamples.max(1);
        self
    }

    /// Append a shape; later shapes are drawn over earlier ones.
    pub fn push(&mut self, shape: Shape, material: MaterialId) -> Result<usize> {
        validate_shape(&shape)?;
        self.shapes.push(PlacedShape { shape, material });
        Ok(self.shapes.len() - 1)
    }

    pub fn with_shape(mut self, shape: Shape, material: MaterialId) -> Result<Self> {
        self.push(shape, material)?;
        Ok(self)
    }

    pub fn shapes(&self) -> &[PlacedShape] {
        &self.shapes
    }

    pub fn lattice(&self) -> &Lattice2D {
        &self.lattice
    }

    fn normal_axis(&self) -> [f64; 2] {
        let len = self.reciprocal.b1_length();
        [self.reciprocal.b1[0] / len, self.reciprocal.b1[1] / len]
    }

    /// The strip a shape occupies when only the `a1` direction matters.
    fn strip(&self, shape: &Shape) -> Strip {
        let frac = self.lattice.cartesian_to_fractional(shape.center());
        Strip {
            center: frac[0],
            halfwidth: shape.half_extent_along(self.normal_axis()) * self.reciprocal.b1_length(),
        }
    }

    fn uses_strips(&self, shape: &Shape) -> bool {
        self.lattice.is_one_dimensional() || matches!(shape, Shape::Interval { .. })
    }

    fn contains(&self, shape: &Shape, point: [f64; 2]) -> bool {
        if self.uses_strips(shape) {
            let strip = self.strip(shape);
            let u = self.lattice.cartesian_to_fractional(point)[0] - strip.center;
            return wrapped_offset(u).abs() < strip.halfwidth;
        }
        let d = self.lattice.minimum_image(sub(point, shape.center()));
        match *shape {
            Shape::Circle { radius, .. } => d[0] * d[0] + d[1] * d[1] < radius * radius,
            Shape::Rectangle {
                angle, halfwidths, ..
            } => {
                let q = rotate(d, -angle);
                q[0].abs() < halfwidths[0] && q[1].abs() < halfwidths[1]
            }
            Shape::Interval { .. } => false,
        }
    }

    /// Outward normal and distance of the boundary point of `shape` closest to `point`.
    fn boundary(&self, shape: &Shape, point: [f64; 2]) -> Option<([f64; 2], f64)> {
        if self.uses_strips(shape) {
            let strip = self.strip(shape);
            let u = wrapped_offset(self.lattice.cartesian_to_fractional(point)[0] - strip.center);
            let axis = self.normal_axis();
            let sign = if u < 0.0 { -1.0 } else { 1.0 };
            let distance = (strip.halfwidth - u.abs()).abs() / self.reciprocal.b1_length();
            return Some(([sign * axis[0], sign * axis[1]], distance));
        }
        let d = self.lattice.minimum_image(sub(point, shape.center()));
        match *shape {
            Shape::Circle { radius, .. } => {
                let r = d[0].hypot(d[1]);
                if r == 0.0 {
                    return None;
                }
                Some(([d[0] / r, d[1] / r], (r - radius).abs()))
            }
            Shape::Rectangle {
                angle, halfwidths, ..
            } => {
                let q = rotate(d, -angle);
                let clamped = [
                    q[0].clamp(-halfwidths[0], halfwidths[0]),
                    q[1].clamp(-halfwidths[1], halfwidths[1]),
                ];
                let outside = sub(q, clamped);
                let gap = outside[0].hypot(outside[1]);
                let (local, distance) = if gap > 0.0 {
                    ([outside[0] / gap, outside[1] / gap], gap)
                } else {
                    let margin = [halfwidths[0] - q[0].abs(), halfwidths[1] - q[1].abs()];
                    let axis = usize::from(margin[1] < margin[0]);
                    let mut n = [0.0, 0.0];
                    n[axis] = if q[axis] < 0.0 { -1.0 } else { 1.0 };
                    (n, margin[axis])
                };
                Some((rotate(local, angle), distance))
            }
            Shape::Interval { .. } => None,
        }
    }

    /// Index of the shape drawn at `point`, if any.
    fn owner(&self, point: [f64; 2]) -> Option<usize> {
        self.shapes
            .iter()
            .rposition(|placed| self.contains(&placed.shape, point))
    }

    /// Region slot (0 = background) whose value the shape displaces: the
    /// latest earlier shape containing its centre.
    fn parent_slot(&self, index: usize) -> usize {
        let center = self.shapes[index].shape.center();
        self.shapes[..index]
            .iter()
            .rposition(|placed| self.contains(&placed.shape, center))
            .map_or(0, |parent| parent + 1)
    }

    fn shape_transform(
        &self,
        shape: &Shape,
        frequency: [f64; 2],
        dimensionality: Dimensionality,
        cell_size: f64,
    ) -> Complex64 {
        let center = shape.center();
        let phase = Complex64::from_polar(1.0, -2.0 * PI * dot(frequency, center));
        if dimensionality == Dimensionality::One || matches!(shape, Shape::Interval { .. }) {
            if !self.lattice.is_one_dimensional()
                && dot(frequency, self.lattice.a2).abs() > LINE_TOLERANCE
            {
                return Complex64::ZERO;
            }
            let strip = self.strip(shape);
            let m1 = dot(frequency, self.lattice.a1);
            return phase * (2.0 * strip.halfwidth * sinc(2.0 * PI * m1 * strip.halfwidth));
        }
        let magnitude = match *shape {
            Shape::Circle { radius, .. } => {
                let f = frequency[0].hypot(frequency[1]);
                PI * radius * radius * jinc(f * radius)
            }
            Shape::Rectangle {
                angle, halfwidths, ..
            } => {
                let fl = rotate(frequency, -angle);
                4.0 * halfwidths[0]
                    * halfwidths[1]
                    * sinc(2.0 * PI * fl[0] * halfwidths[0])
                    * sinc(2.0 * PI * fl[1] * halfwidths[1])
            }
            Shape::Interval { .. } => 0.0,
        };
        phase * (magnitude / cell_size)
    }
}

impl Pattern for ShapeList {
    fn shape_count(&self) -> usize {
        self.shapes.len()
    }

    fn shape_material(&self, shape: usize) -> MaterialId {
        self.shapes[shape].material
    }

    fn fourier_transform(
        &self,
        values: &[Complex64],
        frequency: [f64; 2],
        dimensionality: Dimensionality,
        cell_size: f64,
    ) -> Complex64 {
        let mut total = if frequency == [0.0, 0.0] {
            values[0]
        } else {
            Complex64::ZERO
        };
        for (index, placed) in self.shapes.iter().enumerate() {
            let contrast = values[index + 1] - values[self.parent_slot(index)];
            if contrast == Complex64::ZERO {
                continue;
            }
            total += contrast
                * self.shape_transform(&placed.shape, frequency, dimensionality, cell_size);
        }
        total
    }

    fn discretize_cell(&self, grid: Grid2D, cell: [usize; 2], occupancy: &mut [f64]) {
        occupancy.fill(0.0);
        let m = self.subsamples;
        let (my, weight) = if grid.ny == 1 && self.lattice.is_one_dimensional() {
            (1, 1.0 / m as f64)
        } else {
            (m, 1.0 / (m * m) as f64)
        };
        let center = grid.cell_center(cell[0], cell[1]);
        let du = 1.0 / (grid.nx * m) as f64;
        let dv = 1.0 / (grid.ny * my) as f64;
        for sy in 0..my {
            for sx in 0..m {
                let frac = [
                    center[0] + (sx as f64 + 0.5 - 0.5 * m as f64) * du,
                    center[1] + (sy as f64 + 0.5 - 0.5 * my as f64) * dv,
                ];
                let point = self.lattice.fractional_to_cartesian(frac);
                let slot = self.owner(point).map_or(0, |shape| shape + 1);
                occupancy[slot] += weight;
            }
        }
    }

    fn interface_normal(&self, shape: usize, point: [f64; 2]) -> Option<[f64; 2]> {
        self.boundary(&self.shapes.get(shape)?.shape, point)
            .map(|(normal, _)| normal)
    }

    fn nearest_interface(&self, point: [f64; 2]) -> Option<InterfaceSample> {
        self.shapes
            .iter()
            .filter_map(|placed| self.boundary(&placed.shape, point))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(normal, distance)| InterfaceSample { normal, distance })
    }
}

fn validate_shape(shape: &Shape) -> Result<()> {
    let finite = |v: &[f64]| v.iter().all(|x| x.is_finite());
    let ok = match *shape {
        Shape::Circle { center, radius } => finite(&center) && radius.is_finite() && radius >= 0.0,
        Shape::Rectangle {
            center,
            angle,
            halfwidths,
        } => {
            finite(&center)
                && angle.is_finite()
                && finite(&halfwidths)
                && halfwidths.iter().all(|h| *h >= 0.0)
        }
        Shape::Interval { center, halfwidth } => {
            finite(&center) && halfwidth.is_finite() && halfwidth >= 0.0
        }
    };
    if ok {
        Ok(())
    } else {
        Err(RcwaError::invalid_argument(1, format!("invalid shape {shape:?}")))
    }
}

/// Fold a fractional offset into `[-0.5, 0.5)`.
fn wrapped_offset(u: f64) -> f64 {
    u - (u + 0.5).floor()
}

#[inline]
fn dot(a: [f64; 2], b: [f64; 2]) -> f64 {
    a[0] * b[0] + a[1] * b[1]
}

#[inline]
fn sub(a: [f64; 2], b: [f64; 2]) -> [f64; 2] {
    [a[0] - b[0], a[1] - b[1]]
}

/// Rotate counter-clockwise by `angle` radians.
#[inline]
fn rotate(v: [f64; 2], angle: f64) -> [f64; 2] {
    let (s, c) = angle.sin_cos();
    [c * v[0] - s * v[1], s * v[0] + c * v[1]]
}
