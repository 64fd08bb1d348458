//! First-order curlometer solver.
//!
//! Assumes the field varies linearly across the tetrahedron,
//! `B(x) ≈ B₀ + ∇B · (x − x₀)`, and recovers `B₀`, the divergence and the
//! current density (`J = ∇ × B`, with μ₀ = 1) at the target point `x₀` from
//! four simultaneous measurements.
//!
//! Each field component `c` contributes a 4×4 block
//!
//! ```text
//! [1  Δx₁  Δy₁  Δz₁] [ B_c     ]   [B_c(r₁)]
//! [1  Δx₂  Δy₂  Δz₂] [ ∂B_c/∂x ] = [B_c(r₂)]
//! [1  Δx₃  Δy₃  Δz₃] [ ∂B_c/∂y ]   [B_c(r₃)]
//! [1  Δx₄  Δy₄  Δz₄] [ ∂B_c/∂z ]   [B_c(r₄)]
//! ```
//!
//! and the three blocks are stacked on the diagonal of a 12×12 system, which
//! is square and uniquely solvable for any non-degenerate tetrahedron.

use nalgebra::{Matrix4, SMatrix, SVector};

use crate::error::{CurlometerError, Result};
use crate::{Matrix3, Vector3};

/// |det H| below this fraction of (longest edge)³ is treated as singular.
pub const SINGULAR_TOLERANCE: f64 = 1e-10;

type System = SMatrix<f64, 12, 12>;
type Unknowns = SVector<f64, 12>;

/// Linear field estimate at a target point from one tetrahedron.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurlometerEstimate {
    /// ∇ · B at the target point.
    pub divergence: f64,
    /// B at the target point.
    pub field: Vector3,
    /// Current density ∇ × B (μ₀ = 1).
    pub current: Vector3,
    /// Recovered gradient tensor, `gradient[(i, j)] = ∂Bᵢ/∂xⱼ`.
    pub gradient: Matrix3,
}

/// Solve the first-order curlometer system for one tetrahedron.
///
/// * `positions` — spacecraft positions.
/// * `fields` — field measured at each position.
/// * `target` — point at which the field is estimated.
///
/// Returns [`CurlometerError::SingularSystem`] for coplanar or coincident
/// spacecraft.
pub fn solve_first_order(
    positions: &[Vector3; 4],
    fields: &[Vector3; 4],
    target: &Vector3,
) -> Result<CurlometerEstimate> {
    let recentered = positions.map(|p| p - target);

    let mut h = Matrix4::<f64>::zeros();
    for (row, r) in recentered.iter().enumerate() {
        h[(row, 0)] = 1.0;
        h[(row, 1)] = r.x;
        h[(row, 2)] = r.y;
        h[(row, 3)] = r.z;
    }

    let longest_edge = longest_edge(positions);
    if longest_edge == 0.0
        || h.determinant().abs() <= SINGULAR_TOLERANCE * longest_edge.powi(3)
    {
        return Err(CurlometerError::SingularSystem);
    }

    let mut a = System::zeros();
    let mut b = Unknowns::zeros();
    for c in 0..3 {
        let offset = 4 * c;
        a.fixed_view_mut::<4, 4>(offset, offset).copy_from(&h);
        for (row, f) in fields.iter().enumerate() {
            b[offset + row] = f[c];
        }
    }

    let x = a.lu().solve(&b).ok_or(CurlometerError::SingularSystem)?;
    if !x.iter().all(|v| v.is_finite()) {
        return Err(CurlometerError::SingularSystem);
    }

    let gradient = Matrix3::from_fn(|i, j| x[4 * i + 1 + j]);
    Ok(CurlometerEstimate {
        divergence: x[1] + x[6] + x[11],
        field: Vector3::new(x[0], x[4], x[8]),
        current: Vector3::new(x[10] - x[7], x[3] - x[9], x[5] - x[2]),
        gradient,
    })
}

fn longest_edge(positions: &[Vector3; 4]) -> f64 {
    let mut longest = 0.0f64;
    for i in 0..4 {
        for j in (i + 1)..4 {
            longest = longest.max((positions[i] - positions[j]).norm());
        }
    }
    longest
}
