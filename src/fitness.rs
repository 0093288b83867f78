use crate::{
    grid::EVALUATION_GRID,
    parse::Run,
    reports::Reporter,
    stats::Summary,
    Condition, Error, FileKind, Result,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurvePoint {
    pub evaluations: u64,
    pub fitness: Summary,
}

/// Mean best fitness of a condition's runs over the evaluation grid.
#[derive(Debug, Clone, PartialEq)]
pub struct FitnessCurve {
    pub label: String,
    pub runs: usize,
    pub points: Vec<CurvePoint>,
}

pub fn fitness_curve(
    condition: &Condition,
    cutoff: Option<u64>,
    reporter: &Reporter,
) -> Result<FitnessCurve> {
    let grid = EVALUATION_GRID.up_to(cutoff);
    if grid.is_empty() {
        return Err(Error::InsufficientSamples {
            label: condition.label.clone(),
            what: "grid points below the cutoff",
            found: 0,
            needed: 1,
        });
    }
    let files = condition.files(FileKind::Fitness)?;
    let bar = reporter.condition(&condition.label, files.len());

    // one column of per-run fitness values for every grid point
    let mut columns = vec![Vec::with_capacity(files.len()); grid.len()];
    for path in &files {
        let run = Run::read(path)?;
        let resampled = EVALUATION_GRID.resample(&run, cutoff)?;
        for (column, fitness) in columns.iter_mut().zip(resampled) {
            column.push(f64::from(fitness));
        }
        bar.inc(1);
    }
    bar.finish_with_message("parsed");

    let points = grid
        .iter()
        .zip(&columns)
        .map(|(&evaluations, fitness)| -> Result<CurvePoint> {
            Ok(CurvePoint {
                evaluations,
                fitness: Summary::of(&condition.label, "runs", fitness)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    if let Some(last) = points.last() {
        tracing::info!(
            label = %condition.label,
            runs = files.len(),
            "mean best fitness {:.4} at {} evaluations",
            last.fitness.mean,
            last.evaluations,
        );
    }

    Ok(FitnessCurve {
        label: condition.label.clone(),
        runs: files.len(),
        points,
    })
}

pub fn fitness_curves(
    conditions: &[Condition],
    cutoff: Option<u64>,
    reporter: &Reporter,
) -> Result<Vec<FitnessCurve>> {
    conditions
        .iter()
        .map(|condition| fitness_curve(condition, cutoff, reporter))
        .collect()
}
