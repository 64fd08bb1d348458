//! Error taxonomy for the reconstruction pipeline.

use thiserror::Error;

/// Result type for curlometer operations.
pub type Result<T> = std::result::Result<T, CurlometerError>;

/// Errors raised while analysing tetrahedra or reconstructing a field.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CurlometerError {
    /// Input collections have mismatched or insufficient sizes.
    #[error("input shape error: {0}")]
    InputShape(String),

    /// A reconstruction threshold is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The volumetric tensor produced an eigenvalue that cannot come from
    /// a real point cloud (significantly negative or not finite).
    #[error("non-physical eigenvalue {eigenvalue:e} in volumetric tensor")]
    NonPhysicalEigenvalue { eigenvalue: f64 },

    /// Coincident or collinear vertices; shape parameters are undefined.
    #[error("degenerate tetrahedron geometry: {reason}")]
    DegenerateGeometry { reason: String },

    /// The 12×12 curlometer system has no unique solution (coplanar or
    /// coincident spacecraft).
    #[error("singular curlometer system (coplanar or coincident spacecraft)")]
    SingularSystem,

    /// A failure attributed to one tetrahedron, and to a grid point when the
    /// failure happened during the sweep.
    #[error("tetrahedron {indices:?}{}: {source}", .point.map(|k| format!(" at grid point {k}")).unwrap_or_default())]
    Tetrahedron {
        indices: [usize; 4],
        point: Option<usize>,
        #[source]
        source: Box<CurlometerError>,
    },
}

impl CurlometerError {
    /// Attach tetrahedron (and optionally grid point) context to an error.
    pub fn for_tetrahedron(self, indices: [usize; 4], point: Option<usize>) -> Self {
        CurlometerError::Tetrahedron {
            indices,
            point,
            source: Box::new(self),
        }
    }

    /// The innermost error, with tetrahedron context stripped.
    pub fn root_cause(&self) -> &CurlometerError {
        match self {
            CurlometerError::Tetrahedron { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tetrahedron_context_message() {
        let err = CurlometerError::SingularSystem.for_tetrahedron([0, 1, 2, 5], Some(17));
        let msg = err.to_string();
        assert!(msg.contains("[0, 1, 2, 5]"), "{msg}");
        assert!(msg.contains("grid point 17"), "{msg}");
        assert_eq!(err.root_cause(), &CurlometerError::SingularSystem);
    }

    #[test]
    fn test_tetrahedron_context_without_point() {
        let err = CurlometerError::NonPhysicalEigenvalue { eigenvalue: -1.0 }
            .for_tetrahedron([1, 2, 3, 4], None);
        assert!(!err.to_string().contains("grid point"));
    }
}
