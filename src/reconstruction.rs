//! Quality-gated field reconstruction over a grid.
//!
//! For every grid point, each tetrahedron of spacecraft is solved with the
//! first-order curlometer targeted at that point. A tetrahedron contributes
//! to the point's estimate only when it is
//!
//! 1. well shaped: `χ = sqrt(E² + P²) < chi_threshold`, and
//! 2. nearby: `|x − r_b| < l_coeff · L`,
//!
//! where `r_b` and `L` are the tetrahedron's barycenter and characteristic
//! size. Both comparisons are strict. The estimate is the mean field of the
//! passing tetrahedra, or the zero vector when none pass.
//!
//! Shape descriptors are computed once per scenario; solver outputs are
//! recomputed for every point. Grid points are independent, so with the
//! `parallel` feature the sweep is spread across a rayon thread pool.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::combinations::tetrahedra;
use crate::error::{CurlometerError, Result};
use crate::first_order::solve_first_order;
use crate::shape::TetrahedronShape;
use crate::Vector3;

// ── Configuration ───────────────────────────────────────────────────────────

/// What to do with a tetrahedron whose geometry cannot be analysed or solved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DegeneratePolicy {
    /// Abort the whole sweep on the first failure.
    #[default]
    Abort,
    /// Exclude the tetrahedron and continue. Shape failures exclude it from
    /// every point; solve failures exclude it from that point only.
    Skip,
}

/// Parameters controlling the reconstruction sweep.
#[derive(Debug, Clone)]
pub struct ReconstructionConfig {
    /// Shape-quality cutoff on χ = sqrt(E² + P²). Default 1.0.
    pub chi_threshold: f64,
    /// Proximity cutoff as a multiple of the tetrahedron size L. Default 1.0.
    pub l_coeff: f64,
    /// Handling of degenerate tetrahedra. Default [`DegeneratePolicy::Abort`].
    pub degenerate_policy: DegeneratePolicy,
    /// Fraction of grid points between progress reports. Default 0.1.
    pub progress_fraction: f64,
}

impl Default for ReconstructionConfig {
    fn default() -> Self {
        Self {
            chi_threshold: 1.0,
            l_coeff: 1.0,
            degenerate_policy: DegeneratePolicy::Abort,
            progress_fraction: 0.1,
        }
    }
}

impl ReconstructionConfig {
    fn validate(&self) -> Result<()> {
        if !self.chi_threshold.is_finite() || self.chi_threshold < 0.0 {
            return Err(CurlometerError::InvalidConfig(format!(
                "chi_threshold must be finite and non-negative, got {}",
                self.chi_threshold
            )));
        }
        if !self.l_coeff.is_finite() || self.l_coeff < 0.0 {
            return Err(CurlometerError::InvalidConfig(format!(
                "l_coeff must be finite and non-negative, got {}",
                self.l_coeff
            )));
        }
        if !(self.progress_fraction > 0.0 && self.progress_fraction <= 1.0) {
            return Err(CurlometerError::InvalidConfig(format!(
                "progress_fraction must be in (0, 1], got {}",
                self.progress_fraction
            )));
        }
        Ok(())
    }
}

// ── Gate ────────────────────────────────────────────────────────────────────

/// Gate decision for one (tetrahedron, grid point) pair.
///
/// `shape_parameter` is χ, `distance` the distance from the point to the
/// barycenter and `size` the characteristic size L.
#[inline]
pub fn passes_gate(
    shape_parameter: f64,
    distance: f64,
    size: f64,
    config: &ReconstructionConfig,
) -> bool {
    shape_parameter < config.chi_threshold && distance < config.l_coeff * size
}

/// One 4-spacecraft subset and its shape.
#[derive(Debug, Clone, PartialEq)]
pub struct Tetrahedron {
    /// Spacecraft indices, strictly increasing.
    pub indices: [usize; 4],
    pub shape: TetrahedronShape,
}

impl Tetrahedron {
    /// Whether this tetrahedron contributes to the estimate at `point`.
    pub fn passes_gate(&self, point: &Vector3, config: &ReconstructionConfig) -> bool {
        passes_gate(
            self.shape.shape_parameter(),
            self.shape.distance_to(point),
            self.shape.size,
            config,
        )
    }
}

// ── Results ─────────────────────────────────────────────────────────────────

/// Progress of a running sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

impl Progress {
    /// Completed fraction in [0, 1].
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }
}

/// Aggregated estimate at one grid point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointEstimate {
    /// Mean field over passing tetrahedra, zero when none pass.
    pub field: Vector3,
    /// Mean divergence over passing tetrahedra.
    pub divergence: f64,
    /// Mean current density over passing tetrahedra.
    pub current: Vector3,
    /// Number of tetrahedra that passed the gate.
    pub tetra_passed: usize,
    /// Tetrahedra skipped because their solve failed (skip policy only).
    pub skipped: usize,
}

/// Output of a reconstruction sweep, one entry per grid point.
#[derive(Debug, Clone)]
pub struct Reconstruction {
    pub estimate: Vec<Vector3>,
    pub tetra_passed: Vec<usize>,
    pub divergence: Vec<f64>,
    pub current: Vec<Vector3>,
    /// Total failed solves skipped across all points.
    pub skipped_solves: usize,
    /// Wall time of the sweep in milliseconds.
    pub elapsed_ms: f64,
}

impl Reconstruction {
    fn from_points(points: Vec<PointEstimate>, elapsed_ms: f64) -> Self {
        let n = points.len();
        let mut out = Self {
            estimate: Vec::with_capacity(n),
            tetra_passed: Vec::with_capacity(n),
            divergence: Vec::with_capacity(n),
            current: Vec::with_capacity(n),
            skipped_solves: 0,
            elapsed_ms,
        };
        for p in points {
            out.estimate.push(p.field);
            out.tetra_passed.push(p.tetra_passed);
            out.divergence.push(p.divergence);
            out.current.push(p.current);
            out.skipped_solves += p.skipped;
        }
        out
    }

    pub fn len(&self) -> usize {
        self.estimate.len()
    }

    pub fn is_empty(&self) -> bool {
        self.estimate.is_empty()
    }

    /// Number of points with at least one passing tetrahedron.
    pub fn covered_points(&self) -> usize {
        self.tetra_passed.iter().filter(|&&n| n > 0).count()
    }

    /// Per-point percent error against `truth`.
    pub fn percent_error(&self, truth: &[Vector3]) -> Result<Vec<f64>> {
        crate::error_eval::percent_error(&self.estimate, truth)
    }
}

// ── Reconstructor ───────────────────────────────────────────────────────────

/// Reconstruction engine for one scenario (fixed positions and measurements).
#[derive(Debug, Clone)]
pub struct Reconstructor {
    positions: Vec<Vector3>,
    measurements: Vec<Vector3>,
    config: ReconstructionConfig,
    tetrahedra: Vec<Tetrahedron>,
    excluded: Vec<[usize; 4]>,
}

impl Reconstructor {
    /// Validate inputs, enumerate every tetrahedron and analyse its shape.
    ///
    /// Fails with [`CurlometerError::InputShape`] when the position and
    /// measurement sets differ in length or hold fewer than four spacecraft.
    pub fn new(
        positions: &[Vector3],
        measurements: &[Vector3],
        config: ReconstructionConfig,
    ) -> Result<Self> {
        config.validate()?;
        if positions.len() != measurements.len() {
            return Err(CurlometerError::InputShape(format!(
                "{} positions but {} measurements",
                positions.len(),
                measurements.len()
            )));
        }
        if positions.len() < 4 {
            return Err(CurlometerError::InputShape(format!(
                "need at least 4 spacecraft, got {}",
                positions.len()
            )));
        }

        let combos = tetrahedra(positions.len());
        let mut kept = Vec::with_capacity(combos.len());
        let mut excluded = Vec::new();
        for indices in combos {
            let vertices = indices.map(|i| positions[i]);
            match TetrahedronShape::from_points(&vertices) {
                Ok(shape) => {
                    debug!(
                        "Tetrahedron {:?}: L={:.4e}, E={:.4}, P={:.4}, chi={:.4}",
                        indices,
                        shape.size,
                        shape.elongation,
                        shape.planarity,
                        shape.shape_parameter()
                    );
                    kept.push(Tetrahedron { indices, shape });
                }
                Err(e) => match config.degenerate_policy {
                    DegeneratePolicy::Abort => return Err(e.for_tetrahedron(indices, None)),
                    DegeneratePolicy::Skip => {
                        warn!("Excluding tetrahedron {:?}: {}", indices, e);
                        excluded.push(indices);
                    }
                },
            }
        }

        info!(
            "Analysed {} tetrahedra from {} spacecraft ({} excluded)",
            kept.len() + excluded.len(),
            positions.len(),
            excluded.len()
        );

        Ok(Self {
            positions: positions.to_vec(),
            measurements: measurements.to_vec(),
            config,
            tetrahedra: kept,
            excluded,
        })
    }

    pub fn config(&self) -> &ReconstructionConfig {
        &self.config
    }

    /// Tetrahedra with a valid shape descriptor, lexicographic order.
    pub fn tetrahedra(&self) -> &[Tetrahedron] {
        &self.tetrahedra
    }

    /// Tetrahedra excluded during shape analysis (skip policy only).
    pub fn excluded(&self) -> &[[usize; 4]] {
        &self.excluded
    }

    /// Reconstruct the field at every grid point, logging progress.
    pub fn reconstruct(&self, grid: &[Vector3]) -> Result<Reconstruction> {
        self.reconstruct_with_progress(grid, |_| {})
    }

    /// Reconstruct the field at every grid point.
    ///
    /// `progress` is called (possibly from worker threads) each time another
    /// `progress_fraction` of the points has completed, and once at the end.
    pub fn reconstruct_with_progress<F>(
        &self,
        grid: &[Vector3],
        progress: F,
    ) -> Result<Reconstruction>
    where
        F: Fn(Progress) + Sync,
    {
        let t0 = Instant::now();
        info!(
            "Reconstructing {} grid points from {} tetrahedra",
            grid.len(),
            self.tetrahedra.len()
        );

        let tracker = ProgressTracker::new(grid.len(), self.config.progress_fraction, &progress);
        let run = |(k, point): (usize, &Vector3)| {
            let estimate = self.estimate_point(k, point);
            tracker.tick();
            estimate
        };

        #[cfg(feature = "parallel")]
        let points: Vec<PointEstimate> = grid
            .par_iter()
            .enumerate()
            .map(run)
            .collect::<Result<Vec<_>>>()?;
        #[cfg(not(feature = "parallel"))]
        let points: Vec<PointEstimate> = grid
            .iter()
            .enumerate()
            .map(run)
            .collect::<Result<Vec<_>>>()?;

        let elapsed_ms = t0.elapsed().as_secs_f64() * 1000.0;
        let result = Reconstruction::from_points(points, elapsed_ms);
        info!(
            "Reconstruction complete in {:.1} ms: {} of {} points covered",
            elapsed_ms,
            result.covered_points(),
            result.len()
        );
        if result.skipped_solves > 0 {
            warn!("Skipped {} singular tetrahedron solves", result.skipped_solves);
        }
        Ok(result)
    }

    /// Solve every tetrahedron at `point` and average those passing the gate.
    ///
    /// `k` is the grid index, used only in error context.
    pub fn estimate_point(&self, k: usize, point: &Vector3) -> Result<PointEstimate> {
        let mut field = Vector3::zeros();
        let mut current = Vector3::zeros();
        let mut divergence = 0.0;
        let mut tetra_passed = 0usize;
        let mut skipped = 0usize;

        for tet in &self.tetrahedra {
            let positions = tet.indices.map(|i| self.positions[i]);
            let measurements = tet.indices.map(|i| self.measurements[i]);
            let estimate = match solve_first_order(&positions, &measurements, point) {
                Ok(estimate) => estimate,
                Err(e) => match self.config.degenerate_policy {
                    DegeneratePolicy::Abort => return Err(e.for_tetrahedron(tet.indices, Some(k))),
                    DegeneratePolicy::Skip => {
                        debug!("Skipping tetrahedron {:?} at point {}: {}", tet.indices, k, e);
                        skipped += 1;
                        continue;
                    }
                },
            };

            if tet.passes_gate(point, &self.config) {
                field += estimate.field;
                divergence += estimate.divergence;
                current += estimate.current;
                tetra_passed += 1;
            }
        }

        if tetra_passed > 0 {
            let n = tetra_passed as f64;
            field /= n;
            divergence /= n;
            current /= n;
        }

        Ok(PointEstimate {
            field,
            divergence,
            current,
            tetra_passed,
            skipped,
        })
    }
}

/// Convenience wrapper: build a [`Reconstructor`] and sweep `grid`.
pub fn reconstruct_field(
    positions: &[Vector3],
    measurements: &[Vector3],
    grid: &[Vector3],
    config: ReconstructionConfig,
) -> Result<Reconstruction> {
    Reconstructor::new(positions, measurements, config)?.reconstruct(grid)
}

// ── Progress reporting ──────────────────────────────────────────────────────

struct ProgressTracker<'a, F> {
    total: usize,
    step: usize,
    completed: AtomicUsize,
    callback: &'a F,
}

impl<'a, F: Fn(Progress) + Sync> ProgressTracker<'a, F> {
    fn new(total: usize, fraction: f64, callback: &'a F) -> Self {
        let step = ((total as f64 * fraction).ceil() as usize).max(1);
        Self {
            total,
            step,
            completed: AtomicUsize::new(0),
            callback,
        }
    }

    fn tick(&self) {
        let completed = self.completed.fetch_add(1, Ordering::Relaxed) + 1;
        if completed % self.step == 0 || completed == self.total {
            let progress = Progress {
                completed,
                total: self.total,
            };
            info!("{:.1}% of points computed", 100.0 * progress.fraction());
            (self.callback)(progress);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{FieldModel, LinearField, UniformField};
    use crate::first_order::solve_first_order;
    use crate::Matrix3;
    use std::sync::Mutex;

    fn regular_tetrahedron(scale: f64) -> Vec<Vector3> {
        vec![
            Vector3::new(1.0, 1.0, 1.0) * scale,
            Vector3::new(1.0, -1.0, -1.0) * scale,
            Vector3::new(-1.0, 1.0, -1.0) * scale,
            Vector3::new(-1.0, -1.0, 1.0) * scale,
        ]
    }

    #[test]
    fn test_gate_is_strict() {
        let config = ReconstructionConfig {
            chi_threshold: 0.5,
            l_coeff: 2.0,
            ..Default::default()
        };
        assert!(passes_gate(0.49, 1.0, 1.0, &config));
        // χ exactly at the threshold is excluded
        assert!(!passes_gate(0.5, 1.0, 1.0, &config));
        // distance exactly l_coeff·L is excluded
        assert!(!passes_gate(0.1, 2.0, 1.0, &config));
        assert!(passes_gate(0.1, 1.999, 1.0, &config));
    }

    #[test]
    fn test_input_shape_errors() {
        let pos = regular_tetrahedron(1.0);
        let meas = vec![Vector3::zeros(); 3];
        let err = Reconstructor::new(&pos, &meas, ReconstructionConfig::default()).unwrap_err();
        assert!(matches!(err, CurlometerError::InputShape(_)));

        let err = Reconstructor::new(&pos[..3], &meas, ReconstructionConfig::default())
            .unwrap_err();
        assert!(matches!(err, CurlometerError::InputShape(_)));
    }

    #[test]
    fn test_invalid_config() {
        let pos = regular_tetrahedron(1.0);
        let meas = vec![Vector3::zeros(); 4];
        let config = ReconstructionConfig {
            chi_threshold: f64::NAN,
            ..Default::default()
        };
        let err = Reconstructor::new(&pos, &meas, config).unwrap_err();
        assert!(matches!(err, CurlometerError::InvalidConfig(_)));
    }

    #[test]
    fn test_single_tetrahedron_matches_solver() {
        let pos = regular_tetrahedron(2.0);
        let field = LinearField::new(
            Vector3::new(1.0, -2.0, 0.5),
            Matrix3::new(0.1, 0.2, 0.0, -0.3, 0.05, 0.1, 0.0, 0.4, -0.15),
        );
        let meas = field.sample(&pos);
        let rec = Reconstructor::new(&pos, &meas, ReconstructionConfig::default()).unwrap();
        assert_eq!(rec.tetrahedra().len(), 1);

        let point = Vector3::new(0.3, -0.2, 0.1);
        let est = rec.estimate_point(0, &point).unwrap();
        assert_eq!(est.tetra_passed, 1);

        let positions: [Vector3; 4] = [pos[0], pos[1], pos[2], pos[3]];
        let measurements: [Vector3; 4] = [meas[0], meas[1], meas[2], meas[3]];
        let direct = solve_first_order(&positions, &measurements, &point).unwrap();
        assert_eq!(est.field, direct.field);
        assert_eq!(est.divergence, direct.divergence);
        assert_eq!(est.current, direct.current);
    }

    #[test]
    fn test_far_point_has_no_coverage() {
        let pos = regular_tetrahedron(1.0);
        let meas = UniformField(Vector3::new(0.0, 0.0, 3.0)).sample(&pos);
        let rec = Reconstructor::new(&pos, &meas, ReconstructionConfig::default()).unwrap();

        let grid = vec![Vector3::zeros(), Vector3::new(100.0, 0.0, 0.0)];
        let result = rec.reconstruct(&grid).unwrap();
        assert_eq!(result.tetra_passed, vec![1, 0]);
        assert!((result.estimate[0] - Vector3::new(0.0, 0.0, 3.0)).norm() < 1e-12);
        assert_eq!(result.estimate[1], Vector3::zeros());
        assert_eq!(result.divergence[1], 0.0);
        assert_eq!(result.current[1], Vector3::zeros());

        // Ground truth is irrelevant for uncovered points
        let truth = vec![Vector3::new(0.0, 0.0, 3.0), Vector3::new(9.0, 9.0, 9.0)];
        let errors = result.percent_error(&truth).unwrap();
        assert!(errors[0] < 1e-9);
        assert_eq!(errors[1], 1.0);
    }

    #[test]
    fn test_shape_threshold_excludes_everything() {
        let pos = regular_tetrahedron(1.0);
        let meas = UniformField(Vector3::new(1.0, 0.0, 0.0)).sample(&pos);
        // χ ≈ 0 for a regular tetrahedron, so a zero threshold rejects it
        let config = ReconstructionConfig {
            chi_threshold: 0.0,
            ..Default::default()
        };
        let result = reconstruct_field(&pos, &meas, &[Vector3::zeros()], config).unwrap();
        assert_eq!(result.tetra_passed, vec![0]);
        assert_eq!(result.estimate, vec![Vector3::zeros()]);
    }

    #[test]
    fn test_degenerate_abort_and_skip() {
        // Spacecraft 4 sits on spacecraft 0, so every tetrahedron containing
        // both has only three distinct vertices.
        let mut pos = regular_tetrahedron(1.0);
        pos.push(pos[0]);
        let meas = UniformField(Vector3::new(0.0, 1.0, 0.0)).sample(&pos);
        let grid = vec![Vector3::zeros()];

        let err = reconstruct_field(&pos, &meas, &grid, ReconstructionConfig::default())
            .unwrap_err();
        assert!(
            matches!(err, CurlometerError::Tetrahedron { indices, .. } if indices[0] == 0 && indices[3] == 4),
            "{err}"
        );

        let config = ReconstructionConfig {
            degenerate_policy: DegeneratePolicy::Skip,
            ..Default::default()
        };
        let rec = Reconstructor::new(&pos, &meas, config).unwrap();
        let result = rec.reconstruct(&grid).unwrap();
        assert_eq!(rec.tetrahedra().len() + rec.excluded().len(), 5);
        // [0,1,2,3] and [1,2,3,4] are the same regular tetrahedron
        assert_eq!(result.tetra_passed, vec![2]);
        assert_eq!(result.skipped_solves, 3 - rec.excluded().len());
        assert!((result.estimate[0] - Vector3::new(0.0, 1.0, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn test_progress_reports() {
        let pos = regular_tetrahedron(1.0);
        let meas = UniformField(Vector3::new(1.0, 1.0, 1.0)).sample(&pos);
        let config = ReconstructionConfig {
            progress_fraction: 0.25,
            ..Default::default()
        };
        let rec = Reconstructor::new(&pos, &meas, config).unwrap();
        let grid = vec![Vector3::zeros(); 8];
        let seen = Mutex::new(Vec::new());
        rec.reconstruct_with_progress(&grid, |p| seen.lock().unwrap().push(p.completed))
            .unwrap();
        let mut seen = seen.into_inner().unwrap();
        seen.sort_unstable();
        assert_eq!(seen, vec![2, 4, 6, 8]);
    }
}
