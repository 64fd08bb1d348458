use numpy::ndarray;
use numpy::{PyArray1, PyArray2};
use pyo3::prelude::*;

use curlometer::TetrahedronShape;

/// Shape descriptor of a 4-spacecraft tetrahedron.
///
/// Returned by ``tetrahedron_shape``.
///
/// Attributes:
///     size: Characteristic size L = 2a.
///     elongation: E = 1 - b/a.
///     planarity: P = 1 - c/b.
///     shape_parameter: chi = sqrt(E^2 + P^2).
///     barycenter: Mean of the four vertices (length-3 array).
///     volumetric_tensor: 3x3 volumetric tensor R.
///     eigenvalues: Eigenvalues of R, ascending.
#[pyclass(name = "TetrahedronShape", frozen)]
pub(crate) struct PyTetrahedronShape {
    pub(crate) inner: TetrahedronShape,
}

#[pymethods]
impl PyTetrahedronShape {
    /// Characteristic size L = 2a.
    #[getter]
    fn size(&self) -> f64 {
        self.inner.size
    }

    /// Elongation E = 1 - b/a.
    #[getter]
    fn elongation(&self) -> f64 {
        self.inner.elongation
    }

    /// Planarity P = 1 - c/b.
    #[getter]
    fn planarity(&self) -> f64 {
        self.inner.planarity
    }

    /// Shape parameter chi = sqrt(E^2 + P^2).
    #[getter]
    fn shape_parameter(&self) -> f64 {
        self.inner.shape_parameter()
    }

    #[getter]
    fn barycenter<'py>(&self, py: Python<'py>) -> Bound<'py, PyArray1<f64>> {
        let b = &self.inner.barycenter;
        PyArray1::from_vec(py, vec![b.x, b.y, b.z])
    }

    #[getter]
    fn volumetric_tensor<'py>(&self, py: Python<'py>) -> Bound<'py, PyArray2<f64>> {
        let r = &self.inner.volumetric_tensor;
        PyArray2::from_owned_array(
            py,
            ndarray::Array2::from_shape_fn((3, 3), |(i, j)| r[(i, j)]),
        )
    }

    #[getter]
    fn eigenvalues<'py>(&self, py: Python<'py>) -> Bound<'py, PyArray1<f64>> {
        PyArray1::from_vec(py, self.inner.eigenvalues.to_vec())
    }

    fn __repr__(&self) -> String {
        format!(
            "TetrahedronShape(L={:.4e}, E={:.4}, P={:.4}, chi={:.4})",
            self.inner.size,
            self.inner.elongation,
            self.inner.planarity,
            self.inner.shape_parameter(),
        )
    }
}
