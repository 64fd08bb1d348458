//! Python bindings for curlometer via PyO3.
//!
//! Exposes the reconstruction to Python as the `curlometer_rs` module. All
//! point and vector collections cross the boundary as Nx3 float64 numpy arrays.

mod helpers;
mod shape;

use numpy::{PyArray1, PyReadonlyArray1, PyReadonlyArray2};
use pyo3::prelude::*;
use pyo3::types::PyDict;

use curlometer::{
    solve_first_order, Constellation, DegeneratePolicy, ReconstructionConfig, Reconstructor,
    TetrahedronShape, Vector3,
};

use crate::helpers::{parse_points, parse_tetrahedron, parse_vector, points_to_array, to_py_err};
use crate::shape::PyTetrahedronShape;

// ═══════════════════════════════════════════════════════════════════════════
// reconstruct — the full gated sweep
// ═══════════════════════════════════════════════════════════════════════════

/// Reconstruct the magnetic field on a grid from spacecraft measurements.
///
/// Args:
///     positions: Nx3 array of spacecraft positions.
///     measurements: Nx3 array of field measurements, aligned with positions.
///     grid_points: Mx3 array of reconstruction points.
///     truth: Optional Mx3 array of the true field; enables the 'error' output.
///     chi_threshold: Shape cutoff on sqrt(E^2 + P^2). Default 1.0.
///     l_coeff: Proximity cutoff as a multiple of tetrahedron size. Default 1.0.
///     skip_degenerate: Exclude degenerate tetrahedra instead of failing. Default False.
///
/// Returns:
///     dict with keys 'estimate' (Mx3), 'tetra_passed' (M), 'divergence' (M),
///     'current' (Mx3), 'elapsed_ms', and 'error' (M) when truth is given.
#[pyfunction]
#[pyo3(signature = (
    positions,
    measurements,
    grid_points,
    truth = None,
    chi_threshold = 1.0,
    l_coeff = 1.0,
    skip_degenerate = false,
))]
fn reconstruct<'py>(
    py: Python<'py>,
    positions: PyReadonlyArray2<f64>,
    measurements: PyReadonlyArray2<f64>,
    grid_points: PyReadonlyArray2<f64>,
    truth: Option<PyReadonlyArray2<f64>>,
    chi_threshold: f64,
    l_coeff: f64,
    skip_degenerate: bool,
) -> PyResult<Bound<'py, PyDict>> {
    let positions = parse_points(&positions, "positions")?;
    let measurements = parse_points(&measurements, "measurements")?;
    let grid = parse_points(&grid_points, "grid_points")?;
    let truth = truth.map(|t| parse_points(&t, "truth")).transpose()?;

    let config = ReconstructionConfig {
        chi_threshold,
        l_coeff,
        degenerate_policy: if skip_degenerate {
            DegeneratePolicy::Skip
        } else {
            DegeneratePolicy::Abort
        },
        ..Default::default()
    };

    let result = Reconstructor::new(&positions, &measurements, config)
        .and_then(|rec| rec.reconstruct(&grid))
        .map_err(to_py_err)?;

    let dict = PyDict::new(py);
    dict.set_item("estimate", points_to_array(py, &result.estimate))?;
    dict.set_item(
        "tetra_passed",
        PyArray1::from_vec(py, result.tetra_passed.iter().map(|&n| n as u64).collect()),
    )?;
    dict.set_item("divergence", PyArray1::from_vec(py, result.divergence.clone()))?;
    dict.set_item("current", points_to_array(py, &result.current))?;
    dict.set_item("elapsed_ms", result.elapsed_ms)?;
    if let Some(truth) = truth {
        let error = result.percent_error(&truth).map_err(to_py_err)?;
        dict.set_item("error", PyArray1::from_vec(py, error))?;
    }
    Ok(dict)
}

// ═══════════════════════════════════════════════════════════════════════════
// Single-tetrahedron building blocks
// ═══════════════════════════════════════════════════════════════════════════

/// Shape descriptor of the tetrahedron spanned by a 4x3 array of points.
#[pyfunction]
fn tetrahedron_shape(points: PyReadonlyArray2<f64>) -> PyResult<PyTetrahedronShape> {
    let vertices = parse_tetrahedron(&points, "points")?;
    let inner = TetrahedronShape::from_points(&vertices).map_err(to_py_err)?;
    Ok(PyTetrahedronShape { inner })
}

/// First-order curlometer estimate for one tetrahedron.
///
/// Args:
///     positions: 4x3 array of spacecraft positions.
///     fields: 4x3 array of measured field vectors.
///     target: Length-3 point at which to estimate the field.
///
/// Returns:
///     dict with keys 'field' (3), 'divergence', 'current' (3), 'gradient' (3x3).
#[pyfunction]
#[pyo3(name = "curlometer")]
fn curlometer_first_order<'py>(
    py: Python<'py>,
    positions: PyReadonlyArray2<f64>,
    fields: PyReadonlyArray2<f64>,
    target: PyReadonlyArray1<f64>,
) -> PyResult<Bound<'py, PyDict>> {
    let positions = parse_tetrahedron(&positions, "positions")?;
    let fields = parse_tetrahedron(&fields, "fields")?;
    let target = parse_vector(&target, "target")?;

    let est = solve_first_order(&positions, &fields, &target).map_err(to_py_err)?;

    let gradient: Vec<Vector3> = (0..3).map(|i| est.gradient.row(i).transpose()).collect();
    let dict = PyDict::new(py);
    dict.set_item(
        "field",
        PyArray1::from_vec(py, vec![est.field.x, est.field.y, est.field.z]),
    )?;
    dict.set_item("divergence", est.divergence)?;
    dict.set_item(
        "current",
        PyArray1::from_vec(py, vec![est.current.x, est.current.y, est.current.z]),
    )?;
    dict.set_item("gradient", points_to_array(py, &gradient))?;
    Ok(dict)
}

/// Per-point percent error of an estimate against the true field.
///
/// Points whose estimate is exactly zero get an error of 1.
#[pyfunction]
#[pyo3(name = "percent_error")]
fn percent_error_array<'py>(
    py: Python<'py>,
    estimate: PyReadonlyArray2<f64>,
    truth: PyReadonlyArray2<f64>,
) -> PyResult<Bound<'py, PyArray1<f64>>> {
    let estimate = parse_points(&estimate, "estimate")?;
    let truth = parse_points(&truth, "truth")?;
    let error = curlometer::percent_error(&estimate, &truth).map_err(to_py_err)?;
    Ok(PyArray1::from_vec(py, error))
}

// ═══════════════════════════════════════════════════════════════════════════
// Trajectory loading
// ═══════════════════════════════════════════════════════════════════════════

/// Load spacecraft positions at one epoch from ``n{i}_clean.txt`` files.
///
/// Args:
///     directory: Directory holding the trajectory files.
///     num_spacecraft: Number of spacecraft files to read.
///     epoch: Row (e.g. hour) to sample; trajectories are truncated to the shortest.
///     r0: Optional length-3 reference point. When given, the constellation mean
///         is moved onto it.
///
/// Returns:
///     Nx3 array of positions.
#[pyfunction]
#[pyo3(signature = (directory, num_spacecraft, epoch, r0 = None))]
fn load_positions<'py>(
    py: Python<'py>,
    directory: &str,
    num_spacecraft: usize,
    epoch: usize,
    r0: Option<PyReadonlyArray1<f64>>,
) -> PyResult<Bound<'py, numpy::PyArray2<f64>>> {
    let constellation = Constellation::from_directory(directory, num_spacecraft)
        .map_err(|e| pyo3::exceptions::PyIOError::new_err(format!("{e:#}")))?;
    let positions = match r0 {
        Some(r0) => {
            let r0 = parse_vector(&r0, "r0")?;
            constellation.centered_positions(epoch, &r0)
        }
        None => constellation.positions_at(epoch),
    }
    .map_err(to_py_err)?;
    Ok(points_to_array(py, &positions))
}

// ═══════════════════════════════════════════════════════════════════════════
// Module definition
// ═══════════════════════════════════════════════════════════════════════════

/// curlometer_rs: multi-spacecraft magnetic field reconstruction
///
/// A Rust implementation of gated first-order curlometer reconstruction,
/// exposed to Python via PyO3.
#[pymodule]
fn curlometer_rs(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyTetrahedronShape>()?;
    m.add_function(wrap_pyfunction!(reconstruct, m)?)?;
    m.add_function(wrap_pyfunction!(tetrahedron_shape, m)?)?;
    m.add_function(wrap_pyfunction!(curlometer_first_order, m)?)?;
    m.add_function(wrap_pyfunction!(percent_error_array, m)?)?;
    m.add_function(wrap_pyfunction!(load_positions, m)?)?;
    Ok(())
}
