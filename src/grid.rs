//! Reconstruction lattice.
//!
//! Grid points are stored flat, in the C (row-major) order of an
//! `nx × ny × nz` lattice: `flat = (i·ny + j)·nz + k`, so `k` (the z index)
//! varies fastest.

use crate::error::{CurlometerError, Result};
use crate::Vector3;

/// Lattice resolution of the reconstruction grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridResolution {
    pub nx: usize,
    pub ny: usize,
    pub nz: usize,
}

impl Default for GridResolution {
    fn default() -> Self {
        Self {
            nx: 10,
            ny: 10,
            nz: 10,
        }
    }
}

impl GridResolution {
    pub fn new(nx: usize, ny: usize, nz: usize) -> Self {
        Self { nx, ny, nz }
    }

    /// Total number of grid points.
    pub fn len(&self) -> usize {
        self.nx * self.ny * self.nz
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flat index of lattice cell `(i, j, k)`.
    #[inline]
    pub fn flat_index(&self, i: usize, j: usize, k: usize) -> usize {
        (i * self.ny + j) * self.nz + k
    }

    /// Lattice cell `(i, j, k)` of a flat index.
    #[inline]
    pub fn lattice_index(&self, flat: usize) -> (usize, usize, usize) {
        let k = flat % self.nz;
        let j = (flat / self.nz) % self.ny;
        let i = flat / (self.ny * self.nz);
        (i, j, k)
    }
}

/// Absolute positions of every reconstruction point plus the lattice shape.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconstructionGrid {
    pub resolution: GridResolution,
    pub points: Vec<Vector3>,
}

impl ReconstructionGrid {
    /// Wrap externally supplied grid points.
    ///
    /// The number of points must equal `nx·ny·nz`.
    pub fn new(resolution: GridResolution, points: Vec<Vector3>) -> Result<Self> {
        if points.len() != resolution.len() {
            return Err(CurlometerError::InputShape(format!(
                "grid has {} points but resolution {}x{}x{} needs {}",
                points.len(),
                resolution.nx,
                resolution.ny,
                resolution.nz,
                resolution.len()
            )));
        }
        Ok(Self { resolution, points })
    }

    /// Evenly spaced lattice spanning `center ± half_extent` on each axis.
    ///
    /// An axis with a single point sits at the center coordinate.
    pub fn uniform(center: Vector3, half_extent: Vector3, resolution: GridResolution) -> Self {
        let axis = |n: usize, c: f64, h: f64, idx: usize| -> f64 {
            if n <= 1 {
                c
            } else {
                c - h + 2.0 * h * idx as f64 / (n - 1) as f64
            }
        };

        let mut points = Vec::with_capacity(resolution.len());
        for i in 0..resolution.nx {
            for j in 0..resolution.ny {
                for k in 0..resolution.nz {
                    points.push(Vector3::new(
                        axis(resolution.nx, center.x, half_extent.x, i),
                        axis(resolution.ny, center.y, half_extent.y, j),
                        axis(resolution.nz, center.z, half_extent.z, k),
                    ));
                }
            }
        }
        Self { resolution, points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Point at lattice cell `(i, j, k)`.
    pub fn point(&self, i: usize, j: usize, k: usize) -> &Vector3 {
        &self.points[self.resolution.flat_index(i, j, k)]
    }

    /// Flat indices of the `nx × ny` layer at z index `k`, ordered `(i, j)`.
    pub fn z_slice(&self, k: usize) -> Vec<usize> {
        let res = self.resolution;
        let mut out = Vec::with_capacity(res.nx * res.ny);
        for i in 0..res.nx {
            for j in 0..res.ny {
                out.push(res.flat_index(i, j, k));
            }
        }
        out
    }
}
