//! End-to-end reconstruction of one scenario.
//!
//! A scenario is a constellation snapshot (positions and measurements), a
//! reconstruction grid, and the ground-truth field on that grid. Running it
//! reconstructs the field, scores it against the truth and summarises the
//! error.

use tracing::info;

use crate::constellation::Constellation;
use crate::error::{CurlometerError, Result};
use crate::error_eval::{percent_error, ErrorSummary};
use crate::field::FieldModel;
use crate::grid::{GridResolution, ReconstructionGrid};
use crate::reconstruction::{Reconstruction, ReconstructionConfig, Reconstructor};
use crate::Vector3;

/// Scenario selection and reconstruction parameters.
#[derive(Debug, Clone)]
pub struct ScenarioConfig {
    /// Trajectory epoch (hour) at which the constellation is sampled.
    /// Default 205.
    pub epoch_index: usize,
    /// Lattice resolution of the reconstruction grid. Default 10×10×10.
    pub resolution: GridResolution,
    pub reconstruction: ReconstructionConfig,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            epoch_index: 205,
            resolution: GridResolution::default(),
            reconstruction: ReconstructionConfig::default(),
        }
    }
}

/// Fully materialised inputs of one reconstruction run.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub positions: Vec<Vector3>,
    pub measurements: Vec<Vector3>,
    pub grid: ReconstructionGrid,
    /// Ground-truth field at every grid point.
    pub truth: Vec<Vector3>,
}

/// Outputs of [`Scenario::run`].
#[derive(Debug, Clone)]
pub struct ScenarioReport {
    pub reconstruction: Reconstruction,
    /// Per-point percent error.
    pub error: Vec<f64>,
    pub summary: ErrorSummary,
}

impl Scenario {
    pub fn new(
        positions: Vec<Vector3>,
        measurements: Vec<Vector3>,
        grid: ReconstructionGrid,
        truth: Vec<Vector3>,
    ) -> Result<Self> {
        if truth.len() != grid.len() {
            return Err(CurlometerError::InputShape(format!(
                "ground truth has {} points but grid has {}",
                truth.len(),
                grid.len()
            )));
        }
        Ok(Self {
            positions,
            measurements,
            grid,
            truth,
        })
    }

    /// Synthetic scenario: the constellation at `config.epoch_index`, moved
    /// onto `r0`, measures `field`; the grid spans `r0 ± half_extent` at
    /// `config.resolution` and the truth is `field` on the grid.
    pub fn synthetic<M: FieldModel>(
        constellation: &Constellation,
        r0: &Vector3,
        half_extent: Vector3,
        field: &M,
        config: &ScenarioConfig,
    ) -> Result<Self> {
        let positions = constellation.centered_positions(config.epoch_index, r0)?;
        let measurements = field.sample(&positions);
        let grid = ReconstructionGrid::uniform(*r0, half_extent, config.resolution);
        let truth = field.sample(&grid.points);
        Self::new(positions, measurements, grid, truth)
    }

    /// Reconstruct the field over the grid and score it.
    pub fn run(&self, config: &ReconstructionConfig) -> Result<ScenarioReport> {
        let reconstructor =
            Reconstructor::new(&self.positions, &self.measurements, config.clone())?;
        let reconstruction = reconstructor.reconstruct(&self.grid.points)?;
        let error = percent_error(&reconstruction.estimate, &self.truth)?;
        let summary = ErrorSummary::from_errors(&error, &reconstruction.tetra_passed)?;

        if let (Some(mean), Some(median)) = (summary.mean_percent, summary.median_percent) {
            info!(
                "Mean error {:.3}% (median {:.3}%) over {} of {} points",
                mean, median, summary.covered_points, summary.total_points
            );
        } else {
            info!("No grid point was covered by a passing tetrahedron");
        }

        Ok(ScenarioReport {
            reconstruction,
            error,
            summary,
        })
    }
}
