use decorum::N64;
use once_cell::sync::Lazy;

use crate::{parse::Run, Error, Result};

const GRID_POINTS: usize = 30;
const MIN_EXPONENT: f64 = 3.0;
const MAX_EXPONENT: f64 = 7.0;
const STEP: u64 = 1000;
const MIN_EVALUATIONS: u64 = 1000;
const MAX_EVALUATIONS: u64 = 10_000_000;

pub static EVALUATION_GRID: Lazy<EvaluationGrid> = Lazy::new(EvaluationGrid::standard);

/// Evaluation counts every run is sampled at before runs are compared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluationGrid {
    points: Vec<u64>,
}

impl EvaluationGrid {
    /// Log-spaced points between 10^3 and 10^7, snapped to the nearest multiple
    /// of 1000 that a run could have logged at.
    pub fn standard() -> Self {
        let mut points: Vec<u64> = (0..GRID_POINTS)
            .map(|i| {
                let exponent = MIN_EXPONENT
                    + (MAX_EXPONENT - MIN_EXPONENT) * i as f64 / (GRID_POINTS - 1) as f64;
                snap(10f64.powf(exponent))
            })
            .collect();
        // the low end snaps onto the same step more than once
        points.dedup();
        Self { points }
    }

    pub fn points(&self) -> &[u64] {
        &self.points
    }

    pub fn up_to(&self, cutoff: Option<u64>) -> &[u64] {
        match cutoff {
            Some(cutoff) => &self.points[..self.points.partition_point(|&p| p <= cutoff)],
            None => &self.points,
        }
    }

    /// Best fitness of `run` at every grid point up to `cutoff`, without
    /// judging gaps. A point is covered by the last sample at or before it, as
    /// long as the run was still logging there or had already found the
    /// optimum.
    pub fn sample(&self, run: &Run, cutoff: Option<u64>) -> Vec<Option<N64>> {
        let last = run.last_evaluations();
        let converged = run.convergence_evaluations().is_some();

        self.up_to(cutoff)
            .iter()
            .map(|&point| {
                if !converged && last.map_or(true, |last| point > last) {
                    return None;
                }
                run.samples
                    .iter()
                    .filter(|sample| sample.evaluations <= point)
                    .last()
                    .map(|sample| sample.population.best_fitness())
            })
            .collect()
    }

    /// Like [`EvaluationGrid::sample`], but every point must be covered.
    pub fn resample(&self, run: &Run, cutoff: Option<u64>) -> Result<Vec<N64>> {
        self.sample(run, cutoff)
            .into_iter()
            .zip(self.up_to(cutoff))
            .map(|(fitness, &evaluations)| {
                fitness.ok_or_else(|| Error::MissingGridPoint {
                    path: run.path.clone(),
                    evaluations,
                })
            })
            .collect()
    }
}

/// Nearest step multiple within the logged range, ties going down.
fn snap(evaluations: f64) -> u64 {
    let lower = (evaluations / STEP as f64).floor() * STEP as f64;
    let upper = lower + STEP as f64;
    let snapped = if evaluations - lower <= upper - evaluations {
        lower
    } else {
        upper
    };
    (snapped as u64).clamp(MIN_EVALUATIONS, MAX_EVALUATIONS)
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    fn run(text: &str) -> Run {
        Run::parse(Path::new("fitness1"), text.as_bytes()).unwrap()
    }

    #[test]
    fn standard_grid_points() {
        assert_eq!(
            EVALUATION_GRID.points(),
            [
                1000, 2000, 3000, 4000, 5000, 7000, 9000, 13000, 17000, 24000, 33000, 45000,
                62000, 85000, 117000, 161000, 221000, 304000, 418000, 574000, 788000, 1083000,
                1487000, 2043000, 2807000, 3857000, 5298000, 7279000, 10000000,
            ]
        );
    }

    #[test]
    fn grid_is_strictly_increasing_and_canonical() {
        let points = EVALUATION_GRID.points();
        assert!(points.windows(2).all(|pair| pair[0] < pair[1]));
        assert!(points
            .iter()
            .all(|&p| p % 1000 == 0 && (1000..=10_000_000).contains(&p)));
    }

    #[test]
    fn cutoff_truncates_the_grid() {
        assert_eq!(EVALUATION_GRID.up_to(Some(5000)), [1000, 2000, 3000, 4000, 5000]);
        assert_eq!(EVALUATION_GRID.up_to(Some(999)), [] as [u64; 0]);
        assert_eq!(EVALUATION_GRID.up_to(None).len(), 29);
    }

    #[test]
    fn converged_runs_are_forward_filled() {
        let run = run("0\t1000\t0.25\t0.1\n0\t2000\t0.5\t0.1\n0\t3000\t0.75\t0.1\n0\t3500\t1.0\t0.2\n");
        let fitness: Vec<f64> = EVALUATION_GRID
            .resample(&run, None)
            .unwrap()
            .into_iter()
            .map(f64::from)
            .collect();
        assert_eq!(&fitness[..3], [0.25, 0.5, 0.75]);
        assert!(fitness[3..].iter().all(|&f| f == 1.0));
    }

    #[test]
    fn convergence_on_a_grid_point_fills_that_point() {
        let run = run("0\t1000\t0.25\t0.1\n0\t2000\t0.5\t0.1\n0\t4000\t1.0\t0.2\n");
        let fitness: Vec<f64> = EVALUATION_GRID
            .resample(&run, None)
            .unwrap()
            .into_iter()
            .map(f64::from)
            .collect();
        assert_eq!(&fitness[..3], [0.25, 0.5, 0.5]);
        assert_eq!(fitness[3], 1.0);
        assert!(fitness[3..].iter().all(|&f| f == 1.0));
    }

    #[test]
    fn samples_carry_forward_between_grid_points() {
        let run = run("0\t1000\t0.25\t0.1\n0\t4500\t0.5\t0.1\n0\t6000\t0.625\t0.1\n");
        let fitness: Vec<f64> = EVALUATION_GRID
            .resample(&run, Some(5000))
            .unwrap()
            .into_iter()
            .map(f64::from)
            .collect();
        assert_eq!(fitness, [0.25, 0.25, 0.25, 0.25, 0.5]);
    }

    #[test]
    fn uncovered_points_are_reported() {
        let early_stop = run("0\t1000\t0.25\t0.1\n0\t2000\t0.5\t0.1\n");
        let sampled = EVALUATION_GRID.sample(&early_stop, Some(3000));
        assert_eq!(sampled[2], None);
        match EVALUATION_GRID.resample(&early_stop, Some(3000)).unwrap_err() {
            Error::MissingGridPoint { path, evaluations } => {
                assert_eq!(path, Path::new("fitness1"));
                assert_eq!(evaluations, 3000);
            }
            other => panic!("unexpected error: {other}"),
        }

        let late_start = run("0\t2000\t0.5\t0.1\n0\t3000\t0.5\t0.1\n");
        assert!(matches!(
            EVALUATION_GRID.resample(&late_start, Some(3000)),
            Err(Error::MissingGridPoint {
                evaluations: 1000,
                ..
            })
        ));
    }
}
