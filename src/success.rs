use crate::{
    parse::read_outcomes,
    reports::Reporter,
    stats::{fisher_exact, pairwise},
    Condition, Error, FileKind, Result,
};

/// End-of-run tallies of one condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcomes {
    pub label: String,
    pub successes: u64,
    pub failures: u64,
}

impl Outcomes {
    pub fn total(&self) -> u64 {
        self.successes + self.failures
    }

    /// Percentage of runs that found the optimum.
    pub fn success_rate(&self) -> f64 {
        self.successes as f64 / self.total() as f64 * 100.0
    }

    fn contingency_row(&self) -> [u64; 2] {
        [self.successes, self.failures]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SuccessReport {
    pub outcomes: Vec<Outcomes>,
    /// Fisher's exact p-values, upper triangle only. `None` with fewer than
    /// two conditions.
    pub p_values: Option<Vec<Vec<Option<f64>>>>,
}

impl SuccessReport {
    pub fn labels(&self) -> Vec<&str> {
        self.outcomes.iter().map(|o| o.label.as_str()).collect()
    }
}

pub fn outcomes(condition: &Condition, reporter: &Reporter) -> Result<Outcomes> {
    let files = condition.files(FileKind::RunLog)?;
    let bar = reporter.condition(&condition.label, files.len());

    let (mut successes, mut failures) = (0, 0);
    for path in &files {
        let found = read_outcomes(path)?;
        tracing::debug!(path = %path.display(), markers = found.len(), "read run log");
        for success in found {
            if success {
                successes += 1;
            } else {
                failures += 1;
            }
        }
        bar.inc(1);
    }
    bar.finish_with_message(format!("{successes} succeeded"));

    let outcomes = Outcomes {
        label: condition.label.clone(),
        successes,
        failures,
    };
    if outcomes.total() == 0 {
        return Err(Error::InsufficientSamples {
            label: outcomes.label,
            what: "end-of-run markers",
            found: 0,
            needed: 1,
        });
    }
    tracing::info!(
        label = %outcomes.label,
        successes,
        failures,
        "success rate {:.2}%",
        outcomes.success_rate()
    );
    Ok(outcomes)
}

pub fn analyze(conditions: &[Condition], reporter: &Reporter) -> Result<SuccessReport> {
    let outcomes = conditions
        .iter()
        .map(|condition| outcomes(condition, reporter))
        .collect::<Result<Vec<_>>>()?;

    let p_values = (outcomes.len() >= 2).then(|| {
        pairwise(&outcomes, |a, b| {
            fisher_exact([a.contingency_row(), b.contingency_row()])
        })
    });

    Ok(SuccessReport { outcomes, p_values })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::tests::scratch_dir;

    #[test]
    fn rates_count_every_marker() {
        let dir = scratch_dir("success_rates");
        std::fs::write(
            dir.join("out-1.log"),
            "gen 1 best=0.2\nrun 0 overall=1.0\ngen 1 best=0.4\nrun 1 overall=0.75\n",
        )
        .unwrap();
        std::fs::write(dir.join("out-2.log"), "run 2 overall=1\n").unwrap();
        std::fs::write(dir.join("fitness1"), "overall=0.0\n").unwrap();

        let outcomes = outcomes(&Condition::new("a", &dir), &Reporter::hidden()).unwrap();
        assert_eq!(outcomes.successes, 2);
        assert_eq!(outcomes.failures, 1);
        assert_eq!(outcomes.total(), 3);
        assert_eq!(format!("{:.2}", outcomes.success_rate()), "66.67");
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn logs_without_markers_are_an_error() {
        let dir = scratch_dir("success_empty");
        std::fs::write(dir.join("out-1.log"), "gen 1 best=0.2\n").unwrap();

        let err = outcomes(&Condition::new("quiet", &dir), &Reporter::hidden()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "condition `quiet` has 0 end-of-run markers, at least 1 required"
        );
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn p_values_need_two_conditions() {
        let root = scratch_dir("success_pairs");
        let mut conditions = Vec::new();
        for (label, log) in [
            ("good", "overall=1.0\n".repeat(8) + &"overall=0.5\n".repeat(2)),
            ("bad", "overall=1.0\n".to_string() + &"overall=0.5\n".repeat(5)),
        ] {
            let dir = root.join(label);
            std::fs::create_dir_all(&dir).unwrap();
            std::fs::write(dir.join("out-0.log"), log).unwrap();
            conditions.push(Condition::new(label, dir));
        }

        let single = analyze(&conditions[..1], &Reporter::hidden()).unwrap();
        assert_eq!(single.p_values, None);

        let report = analyze(&conditions, &Reporter::hidden()).unwrap();
        assert_eq!(report.labels(), ["good", "bad"]);
        let matrix = report.p_values.unwrap();
        assert!((matrix[0][1].unwrap() - 0.034_965_034_965).abs() < 1e-9);
        assert_eq!(matrix[1][0], None);
        let _ = std::fs::remove_dir_all(root);
    }
}
