//! Spacecraft trajectories and constellation snapshots.
//!
//! Each spacecraft's trajectory is a whitespace-separated text file with one
//! sample per row: four time tokens followed by the `x y z` position. The
//! files of one mission are named `n{i}_clean.txt` for spacecraft `i`.
//! Trajectories of different spacecraft may differ in length; a
//! [`Constellation`] truncates all of them to the shortest one so every
//! epoch has a position for every spacecraft.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::error::CurlometerError;
use crate::Vector3;

/// Number of leading time tokens in each trajectory row.
pub const TIME_COLUMNS: usize = 4;

/// One row of a trajectory file.
#[derive(Debug, Clone, PartialEq)]
pub struct TrajectorySample {
    /// Time tokens joined by single spaces.
    pub time: String,
    pub position: Vector3,
}

/// File name of spacecraft `index`'s trajectory.
pub fn trajectory_file_name(index: usize) -> String {
    format!("n{index}_clean.txt")
}

/// Parse a single trajectory row.
fn parse_trajectory_row(record: &str) -> Result<TrajectorySample> {
    let tokens: Vec<&str> = record.split_whitespace().collect();
    anyhow::ensure!(
        tokens.len() >= TIME_COLUMNS + 3,
        "expected at least {} columns, found {}",
        TIME_COLUMNS + 3,
        tokens.len()
    );

    let coord = |i: usize| -> Result<f64> {
        tokens[TIME_COLUMNS + i]
            .parse::<f64>()
            .with_context(|| format!("invalid coordinate '{}'", tokens[TIME_COLUMNS + i]))
    };

    Ok(TrajectorySample {
        time: tokens[..TIME_COLUMNS].join(" "),
        position: Vector3::new(coord(0)?, coord(1)?, coord(2)?),
    })
}

/// Parse the contents of a trajectory file.
///
/// Blank lines and lines starting with `#` are ignored.
pub fn parse_trajectory(data: &str) -> Result<Vec<TrajectorySample>> {
    data.lines()
        .enumerate()
        .filter(|(_, line)| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        })
        .map(|(n, line)| parse_trajectory_row(line).with_context(|| format!("line {}", n + 1)))
        .collect()
}

/// Load one spacecraft trajectory from disk.
pub fn load_trajectory_file<P: AsRef<Path>>(path: P) -> Result<Vec<TrajectorySample>> {
    let path = path.as_ref();
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read trajectory {}", path.display()))?;
    parse_trajectory(&data).with_context(|| format!("failed to parse {}", path.display()))
}

/// Time-aligned trajectories of every spacecraft in a constellation.
#[derive(Debug, Clone)]
pub struct Constellation {
    trajectories: Vec<Vec<TrajectorySample>>,
}

impl Constellation {
    /// Build from per-spacecraft trajectories, truncating all to the
    /// shortest.
    pub fn from_trajectories(mut trajectories: Vec<Vec<TrajectorySample>>) -> Self {
        let epochs = trajectories.iter().map(Vec::len).min().unwrap_or(0);
        for t in trajectories.iter_mut() {
            t.truncate(epochs);
        }
        Self { trajectories }
    }

    /// Load one trajectory file per spacecraft.
    pub fn from_files<P: AsRef<Path>>(paths: &[P]) -> Result<Self> {
        let trajectories = paths
            .iter()
            .map(load_trajectory_file)
            .collect::<Result<Vec<_>>>()?;
        let constellation = Self::from_trajectories(trajectories);
        info!(
            "Loaded {} spacecraft trajectories ({} common epochs)",
            constellation.num_spacecraft(),
            constellation.num_epochs()
        );
        Ok(constellation)
    }

    /// Load `n{i}_clean.txt` for `i in 0..num_spacecraft` from `dir`.
    pub fn from_directory<P: AsRef<Path>>(dir: P, num_spacecraft: usize) -> Result<Self> {
        let dir = dir.as_ref();
        let paths: Vec<_> = (0..num_spacecraft)
            .map(|i| dir.join(trajectory_file_name(i)))
            .collect();
        Self::from_files(&paths)
    }

    pub fn num_spacecraft(&self) -> usize {
        self.trajectories.len()
    }

    /// Number of epochs shared by all spacecraft.
    pub fn num_epochs(&self) -> usize {
        self.trajectories.first().map_or(0, Vec::len)
    }

    /// Time stamp of `epoch`, taken from the last spacecraft's file.
    pub fn epoch_time(&self, epoch: usize) -> Option<&str> {
        self.trajectories
            .last()
            .and_then(|t| t.get(epoch))
            .map(|s| s.time.as_str())
    }

    /// Absolute position of every spacecraft at `epoch`.
    pub fn positions_at(&self, epoch: usize) -> crate::Result<Vec<Vector3>> {
        if epoch >= self.num_epochs() {
            return Err(CurlometerError::InputShape(format!(
                "epoch {} out of range ({} epochs available)",
                epoch,
                self.num_epochs()
            )));
        }
        Ok(self.trajectories.iter().map(|t| t[epoch].position).collect())
    }

    /// Positions at `epoch` with the constellation mean moved to `r0`.
    pub fn centered_positions(&self, epoch: usize, r0: &Vector3) -> crate::Result<Vec<Vector3>> {
        let positions = self.positions_at(epoch)?;
        let mean = positions.iter().fold(Vector3::zeros(), |acc, p| acc + p)
            / positions.len() as f64;
        Ok(positions.iter().map(|p| p - mean + r0).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
# year doy hour minute x y z
2029 100 00 00  10.0  20.0  30.0
2029 100 01 00  11.0  21.0  31.0

2029 100 02 00  12.0  22.0  32.0
";

    #[test]
    fn test_parse_trajectory() {
        let samples = parse_trajectory(SAMPLE).unwrap();
        assert_eq!(samples.len(), 3);
        assert_eq!(samples[1].time, "2029 100 01 00");
        assert_eq!(samples[2].position, Vector3::new(12.0, 22.0, 32.0));
    }

    #[test]
    fn test_parse_error_reports_line() {
        let err = parse_trajectory("2029 100 00 00 1.0 2.0\n").unwrap_err();
        assert!(format!("{err:#}").contains("line 1"), "{err:#}");

        let err = parse_trajectory("2029 100 00 00 1.0 2.0 3.0\n2029 100 00 00 1.0 x 3.0\n")
            .unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("line 2") && msg.contains("'x'"), "{msg}");
    }

    #[test]
    fn test_truncates_to_shortest() {
        let long = parse_trajectory(SAMPLE).unwrap();
        let short = long[..2].to_vec();
        let c = Constellation::from_trajectories(vec![long.clone(), short, long]);
        assert_eq!(c.num_spacecraft(), 3);
        assert_eq!(c.num_epochs(), 2);
        assert!(c.positions_at(2).is_err());
        assert_eq!(c.positions_at(1).unwrap().len(), 3);
        assert_eq!(c.epoch_time(1), Some("2029 100 01 00"));
    }

    #[test]
    fn test_centered_positions() {
        let a = vec![TrajectorySample {
            time: "t".into(),
            position: Vector3::new(0.0, 0.0, 0.0),
        }];
        let b = vec![TrajectorySample {
            time: "t".into(),
            position: Vector3::new(2.0, 4.0, 6.0),
        }];
        let c = Constellation::from_trajectories(vec![a, b]);
        let r0 = Vector3::new(100.0, 0.0, 0.0);
        let pos = c.centered_positions(0, &r0).unwrap();
        assert_eq!(pos[0], Vector3::new(99.0, -2.0, -3.0));
        assert_eq!(pos[1], Vector3::new(101.0, 2.0, 3.0));
    }
}
