//! Analytical magnetic field models.
//!
//! These provide ground truth for error evaluation and synthetic
//! spacecraft measurements.

use crate::{Matrix3, Vector3};

/// A magnetic field defined everywhere in space.
pub trait FieldModel {
    /// Field value at `x`.
    fn evaluate(&self, x: &Vector3) -> Vector3;

    /// Field value at each of `points`.
    fn sample(&self, points: &[Vector3]) -> Vec<Vector3> {
        points.iter().map(|p| self.evaluate(p)).collect()
    }
}

/// Spatially constant field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UniformField(pub Vector3);

impl FieldModel for UniformField {
    fn evaluate(&self, _x: &Vector3) -> Vector3 {
        self.0
    }
}

/// Affine field `B(x) = b0 + gradient · x`.
///
/// This is the model the first-order curlometer recovers exactly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearField {
    pub b0: Vector3,
    /// `gradient[(i, j)] = ∂Bᵢ/∂xⱼ`.
    pub gradient: Matrix3,
}

impl LinearField {
    pub fn new(b0: Vector3, gradient: Matrix3) -> Self {
        Self { b0, gradient }
    }

    /// ∇ · B (uniform).
    pub fn divergence(&self) -> f64 {
        self.gradient.trace()
    }

    /// ∇ × B (uniform).
    pub fn curl(&self) -> Vector3 {
        let m = &self.gradient;
        Vector3::new(
            m[(2, 1)] - m[(1, 2)],
            m[(0, 2)] - m[(2, 0)],
            m[(1, 0)] - m[(0, 1)],
        )
    }
}

impl FieldModel for LinearField {
    fn evaluate(&self, x: &Vector3) -> Vector3 {
        self.b0 + self.gradient * x
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_field_derivatives() {
        // Uniform current along z: B = (-y, x, 0)
        let field = LinearField::new(
            Vector3::zeros(),
            Matrix3::new(0.0, -1.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0),
        );
        assert_eq!(field.divergence(), 0.0);
        assert_eq!(field.curl(), Vector3::new(0.0, 0.0, 2.0));
        assert_eq!(
            field.evaluate(&Vector3::new(1.0, 2.0, 3.0)),
            Vector3::new(-2.0, 1.0, 0.0)
        );
    }

    #[test]
    fn test_sample() {
        let field = UniformField(Vector3::new(0.0, 0.0, 5.0));
        let values = field.sample(&[Vector3::zeros(), Vector3::new(1.0, 1.0, 1.0)]);
        assert_eq!(values, vec![Vector3::new(0.0, 0.0, 5.0); 2]);
    }
}
