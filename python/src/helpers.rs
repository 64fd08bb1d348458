use numpy::ndarray;
use numpy::{PyArray2, PyReadonlyArray1, PyReadonlyArray2};
use pyo3::prelude::*;

use curlometer::{CurlometerError, Vector3};

/// Convert an Nx3 numpy array into a list of 3-vectors.
pub(crate) fn parse_points(points: &PyReadonlyArray2<f64>, name: &str) -> PyResult<Vec<Vector3>> {
    let a = points.as_array();
    if a.shape()[1] != 3 {
        return Err(pyo3::exceptions::PyValueError::new_err(format!(
            "{} must be an Nx3 array, got {}x{}",
            name,
            a.shape()[0],
            a.shape()[1]
        )));
    }
    Ok((0..a.shape()[0])
        .map(|i| Vector3::new(a[[i, 0]], a[[i, 1]], a[[i, 2]]))
        .collect())
}

/// Convert a 4x3 numpy array into the vertices of a tetrahedron.
pub(crate) fn parse_tetrahedron(
    points: &PyReadonlyArray2<f64>,
    name: &str,
) -> PyResult<[Vector3; 4]> {
    let v = parse_points(points, name)?;
    if v.len() != 4 {
        return Err(pyo3::exceptions::PyValueError::new_err(format!(
            "{} must have exactly 4 rows, got {}",
            name,
            v.len()
        )));
    }
    Ok([v[0], v[1], v[2], v[3]])
}

/// Convert a length-3 numpy array into a 3-vector.
pub(crate) fn parse_vector(v: &PyReadonlyArray1<f64>, name: &str) -> PyResult<Vector3> {
    let a = v.as_array();
    if a.len() != 3 {
        return Err(pyo3::exceptions::PyValueError::new_err(format!(
            "{} must have length 3, got {}",
            name,
            a.len()
        )));
    }
    Ok(Vector3::new(a[0], a[1], a[2]))
}

/// Convert a list of 3-vectors into an Nx3 numpy array.
pub(crate) fn points_to_array<'py>(py: Python<'py>, points: &[Vector3]) -> Bound<'py, PyArray2<f64>> {
    let mut data = ndarray::Array2::<f64>::zeros((points.len(), 3));
    for (i, p) in points.iter().enumerate() {
        data[[i, 0]] = p.x;
        data[[i, 1]] = p.y;
        data[[i, 2]] = p.z;
    }
    PyArray2::from_owned_array(py, data)
}

/// Map crate errors onto Python exceptions.
pub(crate) fn to_py_err(e: CurlometerError) -> PyErr {
    match e.root_cause() {
        CurlometerError::InputShape(_) | CurlometerError::InvalidConfig(_) => {
            pyo3::exceptions::PyValueError::new_err(e.to_string())
        }
        _ => pyo3::exceptions::PyRuntimeError::new_err(e.to_string()),
    }
}
