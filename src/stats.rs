use statrs::{
    function::{erf::erfc, factorial::ln_binomial},
    statistics::{Data, OrderStatistics, RankTieBreaker, Statistics},
};

use crate::{Error, Result};

/// Two-sided 95% quantile of the standard normal distribution.
pub const Z_95: f64 = 1.96;

/// Relative tolerance when comparing table probabilities in Fisher's test.
const FISHER_TOLERANCE: f64 = 1e-7;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub mean: f64,
    /// Half-width of the 95% confidence interval of the mean.
    pub ci95: f64,
    pub count: usize,
}

impl Summary {
    /// Mean and normal-approximation confidence interval of `values`.
    ///
    /// The standard error needs at least two samples; fewer is reported as an
    /// error on behalf of `label` rather than producing NaN.
    pub fn of(label: &str, what: &'static str, values: &[f64]) -> Result<Self> {
        if values.len() < 2 {
            return Err(Error::InsufficientSamples {
                label: label.to_string(),
                what,
                found: values.len(),
                needed: 2,
            });
        }
        Ok(Self {
            mean: values.mean(),
            ci95: Z_95 * std_err(values),
            count: values.len(),
        })
    }

    pub fn lower(&self) -> f64 {
        self.mean - self.ci95
    }

    pub fn upper(&self) -> f64 {
        self.mean + self.ci95
    }
}

/// Standard error of the mean, using the sample standard deviation.
pub fn std_err(values: &[f64]) -> f64 {
    values.std_dev() / (values.len() as f64).sqrt()
}

pub fn avg_by<U>(items: &[U], selector: impl Fn(&U) -> f64) -> f64 {
    items.iter().map(selector).sum::<f64>() / items.len() as f64
}

/// Two-sided Wilcoxon rank-sum test using the normal approximation.
///
/// Tied observations share their average rank; no tie or continuity correction
/// is applied to the variance.
pub fn rank_sum_test(a: &[f64], b: &[f64]) -> f64 {
    let n1 = a.len() as f64;
    let n2 = b.len() as f64;
    let ranks = Data::new(a.iter().chain(b).copied().collect::<Vec<_>>())
        .ranks(RankTieBreaker::Average);
    let rank_sum: f64 = ranks[..a.len()].iter().sum();

    let expected = n1 * (n1 + n2 + 1.0) / 2.0;
    let std_dev = (n1 * n2 * (n1 + n2 + 1.0) / 12.0).sqrt();
    let z = (rank_sum - expected) / std_dev;
    erfc(z.abs() / std::f64::consts::SQRT_2)
}

/// Two-sided Fisher's exact test on a 2x2 contingency table.
///
/// Sums the hypergeometric probability of every table with the observed
/// margins that is no more likely than the observed one.
pub fn fisher_exact(table: [[u64; 2]; 2]) -> f64 {
    let [[a, b], [c, d]] = table;
    let population = a + b + c + d;
    let successes = a + c;
    let draws = a + b;

    let probability = |k: u64| {
        (ln_binomial(successes, k) + ln_binomial(population - successes, draws - k)
            - ln_binomial(population, draws))
        .exp()
    };

    let low = (draws + successes).saturating_sub(population);
    let high = draws.min(successes);
    let observed = probability(a);
    let p: f64 = (low..=high)
        .map(probability)
        .filter(|&p| p <= observed * (1.0 + FISHER_TOLERANCE))
        .sum();
    p.min(1.0)
}

/// Upper triangle of pairwise test results: `matrix[i][j]` is set for `j > i`.
pub fn pairwise<T>(samples: &[T], test: impl Fn(&T, &T) -> f64) -> Vec<Vec<Option<f64>>> {
    (0..samples.len())
        .map(|i| {
            (0..samples.len())
                .map(|j| (j > i).then(|| test(&samples[i], &samples[j])))
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn summary_of_fitness_values() {
        let summary = Summary::of("a", "runs", &[0.5, 0.7, 1.0]).unwrap();
        assert!(close(summary.mean, 2.2 / 3.0));
        // sample std dev 0.2516611, sem 0.1452966
        assert!((summary.ci95 - 1.96 * 0.145_296_631).abs() < 1e-6);
        assert_eq!(summary.count, 3);
        assert!(summary.lower() < summary.mean && summary.mean < summary.upper());
    }

    #[test]
    fn summary_needs_two_samples() {
        let err = Summary::of("lonely", "converged runs", &[5000.0]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "condition `lonely` has 1 converged runs, at least 2 required"
        );
        assert!(Summary::of("none", "runs", &[]).is_err());
    }

    #[test]
    fn rank_sum_of_separated_samples() {
        let p = rank_sum_test(&[1000.0, 2000.0, 3000.0], &[4000.0, 5000.0, 6000.0]);
        assert_eq!(format!("{p:.5}"), "0.04953");
        let q = rank_sum_test(&[4000.0, 5000.0, 6000.0], &[1000.0, 2000.0, 3000.0]);
        assert!(close(p, q));
    }

    #[test]
    fn rank_sum_of_identical_samples() {
        assert!(close(rank_sum_test(&[3.0, 3.0], &[3.0, 3.0, 3.0]), 1.0));
    }

    #[test]
    fn fisher_exact_reference_values() {
        assert!(close(fisher_exact([[2, 1], [0, 3]]), 0.4));
        assert!((fisher_exact([[8, 2], [1, 5]]) - 0.034_965_034_965).abs() < 1e-9);
        assert!(close(fisher_exact([[2, 1], [1, 2]]), 1.0));
        assert!(close(fisher_exact([[3, 0], [3, 0]]), 1.0));
        assert!(close(fisher_exact([[0, 0], [4, 1]]), 1.0));
    }

    #[test]
    fn pairwise_fills_the_upper_triangle() {
        let matrix = pairwise(&[1.0, 2.0, 4.0], |a, b| b - a);
        assert_eq!(
            matrix,
            vec![
                vec![None, Some(1.0), Some(3.0)],
                vec![None, None, Some(2.0)],
                vec![None, None, None],
            ]
        );
    }

    #[test]
    fn avg_by_selects_field() {
        assert!(close(avg_by(&[(1, 2.0), (2, 4.0)], |(_, v)| *v), 3.0));
    }
}
