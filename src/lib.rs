//! # curlometer
//!
//! Multi-spacecraft **curlometer reconstruction** of a 3-D magnetic field,
//! written in Rust.
//!
//! Given simultaneous magnetometer measurements from a constellation of N
//! spacecraft, `curlometer` estimates the field on a spatial grid. Every
//! 4-spacecraft subset (a tetrahedron) yields a locally linear model of the
//! field, including its divergence and curl. The estimates of all
//! well-shaped tetrahedra near a grid point are averaged to give the field
//! there, and the result can be scored against a known analytical field.
//!
//! ## Example
//!
//! ```no_run
//! use curlometer::{
//!     FieldModel, GridResolution, LinearField, ReconstructionConfig, ReconstructionGrid,
//!     Reconstructor, Vector3, Matrix3,
//! };
//!
//! let field = LinearField::new(Vector3::new(5.0, 0.0, 0.0), Matrix3::identity() * 0.01);
//! let positions = vec![
//!     Vector3::new(100.0, 100.0, 100.0),
//!     Vector3::new(100.0, -100.0, -100.0),
//!     Vector3::new(-100.0, 100.0, -100.0),
//!     Vector3::new(-100.0, -100.0, 100.0),
//!     Vector3::new(10.0, 20.0, 150.0),
//! ];
//! let measurements = field.sample(&positions);
//!
//! let grid = ReconstructionGrid::uniform(
//!     Vector3::zeros(),
//!     Vector3::new(120.0, 120.0, 120.0),
//!     GridResolution::default(),
//! );
//!
//! let rec = Reconstructor::new(&positions, &measurements, ReconstructionConfig::default()).unwrap();
//! let result = rec.reconstruct(&grid.points).unwrap();
//! let errors = result.percent_error(&field.sample(&grid.points)).unwrap();
//! println!("{} of {} points covered", result.covered_points(), errors.len());
//! ```
//!
//! ## Algorithm overview
//!
//! 1. **Combinations** — enumerate every 4-spacecraft subset in lexicographic order
//! 2. **Shape analysis** — volumetric tensor eigenvalues give the size L, elongation E
//!    and planarity P of each tetrahedron (computed once per scenario)
//! 3. **First-order curlometer** — for each tetrahedron and grid point, solve a 12×12
//!    linear system for the field, divergence and current density at that point
//! 4. **Gating** — keep tetrahedra with `sqrt(E² + P²) < chi_threshold` whose barycenter
//!    lies within `l_coeff · L` of the point, and average their field estimates
//! 5. **Error** — percent difference against the ground truth, with uncovered points
//!    flagged rather than divided by zero

pub mod combinations;
pub mod constellation;
mod error;
pub mod error_eval;
pub mod field;
pub mod first_order;
pub mod grid;
pub mod reconstruction;
pub mod scenario;
pub mod shape;

pub use combinations::{tetrahedra, Combinations};
pub use constellation::{Constellation, TrajectorySample};
pub use error::{CurlometerError, Result};
pub use error_eval::{percent_error, ErrorSummary};
pub use field::{FieldModel, LinearField, UniformField};
pub use first_order::{solve_first_order, CurlometerEstimate};
pub use grid::{GridResolution, ReconstructionGrid};
pub use reconstruction::{
    reconstruct_field, DegeneratePolicy, PointEstimate, Progress, Reconstruction,
    ReconstructionConfig, Reconstructor, Tetrahedron,
};
pub use scenario::{Scenario, ScenarioConfig, ScenarioReport};
pub use shape::TetrahedronShape;

// Commonly used types
// All geometry is f64: positions are absolute (far from the origin) while
// tetrahedron sizes are small, so the 12×12 solve needs the extra precision.
pub type Vector3 = nalgebra::Vector3<f64>;
pub type Matrix3 = nalgebra::Matrix3<f64>;
