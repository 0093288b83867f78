use crate::{
    parse::Run,
    reports::Reporter,
    stats::{pairwise, rank_sum_test, Summary},
    Condition, FileKind, Result,
};

/// Evaluations each converged run of a condition needed to find the optimum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvergenceSet {
    pub label: String,
    pub runs: usize,
    pub evaluations: Vec<u64>,
}

impl ConvergenceSet {
    pub fn as_f64(&self) -> Vec<f64> {
        self.evaluations.iter().map(|&e| e as f64).collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConvergenceReport {
    pub sets: Vec<ConvergenceSet>,
    pub summaries: Vec<Summary>,
    /// Rank-sum p-values, upper triangle only.
    pub p_values: Vec<Vec<Option<f64>>>,
}

impl ConvergenceReport {
    pub fn labels(&self) -> Vec<&str> {
        self.sets.iter().map(|set| set.label.as_str()).collect()
    }
}

pub fn convergence_set(condition: &Condition, reporter: &Reporter) -> Result<ConvergenceSet> {
    let files = condition.files(FileKind::Fitness)?;
    let bar = reporter.condition(&condition.label, files.len());

    let mut evaluations = Vec::new();
    for path in &files {
        if let Some(converged) = Run::read(path)?.convergence_evaluations() {
            evaluations.push(converged);
        }
        bar.inc(1);
    }
    bar.finish_with_message(format!("{} converged", evaluations.len()));

    tracing::info!(
        label = %condition.label,
        runs = files.len(),
        converged = evaluations.len(),
        "collected convergence evaluations"
    );
    Ok(ConvergenceSet {
        label: condition.label.clone(),
        runs: files.len(),
        evaluations,
    })
}

pub fn analyze(conditions: &[Condition], reporter: &Reporter) -> Result<ConvergenceReport> {
    let sets = conditions
        .iter()
        .map(|condition| convergence_set(condition, reporter))
        .collect::<Result<Vec<_>>>()?;

    let samples: Vec<Vec<f64>> = sets.iter().map(ConvergenceSet::as_f64).collect();
    let summaries = sets
        .iter()
        .zip(&samples)
        .map(|(set, sample)| Summary::of(&set.label, "converged runs", sample))
        .collect::<Result<Vec<_>>>()?;

    let p_values = pairwise(&samples, |a, b| rank_sum_test(a, b));

    Ok(ConvergenceReport {
        sets,
        summaries,
        p_values,
    })
}
