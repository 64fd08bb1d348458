//! Tetrahedron shape analysis.
//!
//! The shape of a 4-spacecraft configuration is summarised by its volumetric
//! tensor
//!
//! ```text
//! R = 1/4 · Σ (rᵢ − r_b)(rᵢ − r_b)ᵀ
//! ```
//!
//! where `r_b` is the barycenter. The square roots of its eigenvalues are the
//! semi-axes `c ≤ b ≤ a` of the best-fit quasi-ellipsoid, from which the
//! characteristic size `L = 2a`, elongation `E = 1 − b/a` and planarity
//! `P = 1 − c/b` follow. `E ≈ P ≈ 0` for a regular tetrahedron; `E → 1` for
//! needle-like and `P → 1` for flat configurations.

use crate::error::{CurlometerError, Result};
use crate::{Matrix3, Vector3};

/// Eigenvalues more negative than this fraction of the largest |λ| are
/// treated as non-physical rather than round-off.
pub const EIGEN_TOLERANCE: f64 = 1e-12;

const MAX_EIGEN_ITERATIONS: usize = 1000;

/// Shape descriptor of one tetrahedron.
#[derive(Debug, Clone, PartialEq)]
pub struct TetrahedronShape {
    /// Arithmetic mean of the four vertices.
    pub barycenter: Vector3,
    /// Volumetric tensor R (symmetric, positive semi-definite).
    pub volumetric_tensor: Matrix3,
    /// Eigenvalues of R, sorted ascending.
    pub eigenvalues: [f64; 3],
    /// Characteristic size L = 2a.
    pub size: f64,
    /// Elongation E = 1 − b/a.
    pub elongation: f64,
    /// Planarity P = 1 − c/b.
    pub planarity: f64,
}

impl TetrahedronShape {
    /// Analyse the tetrahedron spanned by four points.
    ///
    /// Fails with [`CurlometerError::NonPhysicalEigenvalue`] when the tensor
    /// has a significantly negative or non-finite eigenvalue, and with
    /// [`CurlometerError::DegenerateGeometry`] when the vertices coincide or
    /// are collinear (E or P undefined).
    pub fn from_points(points: &[Vector3; 4]) -> Result<Self> {
        let barycenter = points.iter().fold(Vector3::zeros(), |acc, p| acc + p) / 4.0;

        let mut volumetric_tensor = Matrix3::zeros();
        for p in points {
            let d = p - barycenter;
            volumetric_tensor += d * d.transpose();
        }
        volumetric_tensor /= 4.0;

        if !volumetric_tensor.iter().all(|v| v.is_finite()) {
            return Err(CurlometerError::NonPhysicalEigenvalue {
                eigenvalue: f64::NAN,
            });
        }
        let eigen = volumetric_tensor
            .try_symmetric_eigen(f64::EPSILON, MAX_EIGEN_ITERATIONS)
            .ok_or(CurlometerError::NonPhysicalEigenvalue {
                eigenvalue: f64::NAN,
            })?;
        let mut eigenvalues = [
            eigen.eigenvalues[0],
            eigen.eigenvalues[1],
            eigen.eigenvalues[2],
        ];

        let scale = eigenvalues.iter().fold(0.0f64, |m, l| m.max(l.abs()));
        for lambda in eigenvalues.iter_mut() {
            if !lambda.is_finite() || *lambda < -EIGEN_TOLERANCE * scale {
                return Err(CurlometerError::NonPhysicalEigenvalue {
                    eigenvalue: *lambda,
                });
            }
            // Round-off below zero
            *lambda = lambda.max(0.0);
        }
        eigenvalues.sort_by(f64::total_cmp);

        let [c, b, a] = eigenvalues.map(f64::sqrt);
        if a <= 0.0 {
            return Err(CurlometerError::DegenerateGeometry {
                reason: "all four vertices coincide".to_string(),
            });
        }
        if b <= 0.0 {
            return Err(CurlometerError::DegenerateGeometry {
                reason: "vertices are collinear".to_string(),
            });
        }

        Ok(Self {
            barycenter,
            volumetric_tensor,
            eigenvalues,
            size: 2.0 * a,
            elongation: 1.0 - b / a,
            planarity: 1.0 - c / b,
        })
    }

    /// Semi-axes `[c, b, a]` of the best-fit ellipsoid, ascending.
    pub fn semi_axes(&self) -> [f64; 3] {
        self.eigenvalues.map(f64::sqrt)
    }

    /// Shape parameter χ = sqrt(E² + P²).
    pub fn shape_parameter(&self) -> f64 {
        self.elongation.hypot(self.planarity)
    }

    /// Distance from `point` to the barycenter.
    pub fn distance_to(&self, point: &Vector3) -> f64 {
        (point - self.barycenter).norm()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn regular_tetrahedron() -> [Vector3; 4] {
        [
            Vector3::new(1.0, 1.0, 1.0),
            Vector3::new(1.0, -1.0, -1.0),
            Vector3::new(-1.0, 1.0, -1.0),
            Vector3::new(-1.0, -1.0, 1.0),
        ]
    }

    #[test]
    fn test_regular_tetrahedron_is_round() {
        let shape = TetrahedronShape::from_points(&regular_tetrahedron()).unwrap();
        assert!(shape.barycenter.norm() < 1e-12);
        // R is the identity for this vertex set
        assert!((shape.volumetric_tensor - Matrix3::identity()).norm() < 1e-12);
        assert!((shape.size - 2.0).abs() < 1e-9);
        assert!(shape.elongation.abs() < 1e-9);
        assert!(shape.planarity.abs() < 1e-9);
        assert!(shape.shape_parameter() < 1e-9);
    }

    #[test]
    fn test_translated_tetrahedron_same_shape() {
        let offset = Vector3::new(1.0e4, -3.0e3, 250.0);
        let pts = regular_tetrahedron().map(|p| p + offset);
        let shape = TetrahedronShape::from_points(&pts).unwrap();
        assert!((shape.barycenter - offset).norm() < 1e-9);
        assert!((shape.size - 2.0).abs() < 1e-6);
        assert!(shape.shape_parameter() < 1e-6);
    }

    #[test]
    fn test_nearly_coplanar_is_flat() {
        let pts = [
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(0.0, 1.0, 0.0),
            Vector3::new(0.3, 0.3, 1e-4),
        ];
        let shape = TetrahedronShape::from_points(&pts).unwrap();
        assert!(shape.planarity > 0.99, "P = {}", shape.planarity);
        assert!(shape.shape_parameter() > 0.99);
    }

    #[test]
    fn test_elongated_is_needle_like() {
        let pts = [
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(100.0, 0.1, 0.0),
            Vector3::new(200.0, 0.0, 0.1),
            Vector3::new(300.0, 0.1, 0.1),
        ];
        let shape = TetrahedronShape::from_points(&pts).unwrap();
        assert!(shape.elongation > 0.99, "E = {}", shape.elongation);
    }

    #[test]
    fn test_coincident_points_are_degenerate() {
        let p = Vector3::new(2.0, 3.0, 4.0);
        let err = TetrahedronShape::from_points(&[p, p, p, p]).unwrap_err();
        assert!(matches!(err, CurlometerError::DegenerateGeometry { .. }));
    }

    #[test]
    fn test_collinear_points_are_degenerate() {
        let pts = [
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(2.0, 0.0, 0.0),
            Vector3::new(3.0, 0.0, 0.0),
        ];
        let err = TetrahedronShape::from_points(&pts).unwrap_err();
        assert!(matches!(err, CurlometerError::DegenerateGeometry { .. }));
    }

    #[test]
    fn test_non_finite_input_is_non_physical() {
        let mut pts = regular_tetrahedron();
        pts[2].x = f64::NAN;
        let err = TetrahedronShape::from_points(&pts).unwrap_err();
        assert!(matches!(err, CurlometerError::NonPhysicalEigenvalue { .. }));
    }

    #[test]
    fn test_random_tetrahedra_eigenvalues_real_non_negative() {
        let mut rng = StdRng::seed_from_u64(0x7e7a);
        for _ in 0..500 {
            let pts: [Vector3; 4] = std::array::from_fn(|_| {
                Vector3::new(
                    rng.random_range(-50.0..50.0),
                    rng.random_range(-50.0..50.0),
                    rng.random_range(-50.0..50.0),
                )
            });
            let shape = TetrahedronShape::from_points(&pts).unwrap();
            assert!(shape.eigenvalues.iter().all(|&l| l >= 0.0 && l.is_finite()));
            assert!(shape.eigenvalues.windows(2).all(|w| w[0] <= w[1]));
            let trace = shape.volumetric_tensor.trace();
            let sum: f64 = shape.eigenvalues.iter().sum();
            assert!((trace - sum).abs() < 1e-9 * trace.max(1.0));
            assert!(shape.size >= 0.0);
            assert!((0.0..=1.0).contains(&shape.elongation));
            assert!((0.0..=1.0).contains(&shape.planarity));
        }
    }
}
