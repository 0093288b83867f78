//! Line formats written by the optimizer.
//!
//! Fitness logs come in two flavours, told apart per line by the presence of a
//! `:` separator:
//!
//! ```text
//! simple:  <id>\t<evals>\t<max fitness>\t<avg fitness>
//! layered: <id>\t<evals>\t<l0 avg>:<l0 max>\t<l1 avg>:<l1 max>...
//! ```
//!
//! Run logs carry an `overall=<fitness>` token at the end of every run, and tree
//! tag files hold `<generation>\t<level>:<density>:<fitness>...` lines.

use std::{
    fs::File,
    io::{BufRead, BufReader},
    ops::ControlFlow,
    path::{Path, PathBuf},
};

use decorum::N64;

use crate::{Error, ParseErrorKind, Result, OPTIMAL_FITNESS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerFitness {
    pub avg: N64,
    pub max: N64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Population {
    Simple { max: N64, avg: N64 },
    Layered(Vec<LayerFitness>),
}

impl Population {
    /// Best fitness in the population. For layered populations that's the
    /// largest max fitness over all layers.
    pub fn best_fitness(&self) -> N64 {
        match self {
            Population::Simple { max, .. } => *max,
            Population::Layered(layers) => layers
                .iter()
                .map(|layer| layer.max)
                .max()
                .unwrap_or_else(|| N64::from(0.0)),
        }
    }

    pub fn is_optimal(&self) -> bool {
        f64::from(self.best_fitness()) == OPTIMAL_FITNESS
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    pub evaluations: u64,
    pub population: Population,
}

/// A single optimizer run read from its fitness log.
///
/// Samples are in file order and end at the first optimal reading, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    pub path: PathBuf,
    pub samples: Vec<Sample>,
}

impl Run {
    pub fn read(path: &Path) -> Result<Self> {
        Self::parse(path, open(path)?)
    }

    pub fn parse(path: &Path, reader: impl BufRead) -> Result<Self> {
        let mut samples = Vec::new();
        for_each_line(path, reader, |line| {
            let sample = parse_sample(line)?;
            let optimal = sample.population.is_optimal();
            samples.push(sample);
            Ok(if optimal {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            })
        })?;
        tracing::debug!(path = %path.display(), samples = samples.len(), "parsed run");
        Ok(Self {
            path: path.to_path_buf(),
            samples,
        })
    }

    /// Evaluation count of the first optimal sample.
    pub fn convergence_evaluations(&self) -> Option<u64> {
        self.samples
            .iter()
            .find(|sample| sample.population.is_optimal())
            .map(|sample| sample.evaluations)
    }

    pub fn last_evaluations(&self) -> Option<u64> {
        self.samples.last().map(|sample| sample.evaluations)
    }
}

pub fn parse_sample(line: &str) -> Result<Sample, ParseErrorKind> {
    let fields: Vec<&str> = line.split('\t').collect();

    if line.contains(':') {
        if fields.len() < 3 {
            return Err(ParseErrorKind::FieldCount {
                expected: "at least 3",
                found: fields.len(),
            });
        }
        let layers = fields[2..]
            .iter()
            .map(|field| -> Result<LayerFitness, ParseErrorKind> {
                let (avg, max) = field
                    .split_once(':')
                    .ok_or_else(|| ParseErrorKind::BadLayer(field.to_string()))?;
                Ok(LayerFitness {
                    avg: parse_fitness(avg)?,
                    max: parse_fitness(max)?,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Sample {
            evaluations: parse_int(fields[1])?,
            population: Population::Layered(layers),
        })
    } else {
        let [_id, evaluations, max, avg] = fields.as_slice() else {
            return Err(ParseErrorKind::FieldCount {
                expected: "4",
                found: fields.len(),
            });
        };
        Ok(Sample {
            evaluations: parse_int(evaluations)?,
            population: Population::Simple {
                max: parse_fitness(max)?,
                avg: parse_fitness(avg)?,
            },
        })
    }
}

const END_OF_RUN_MARKER: &str = "overall=";

/// Whether the line marks the end of a run and, if so, whether the run found
/// the optimum.
pub fn parse_end_of_run(line: &str) -> Result<Option<bool>, ParseErrorKind> {
    let Some(idx) = line.find(END_OF_RUN_MARKER) else { return Ok(None) };
    let value = line[idx + END_OF_RUN_MARKER.len()..]
        .split(|c: char| c.is_whitespace() || c == ',' || c == ';')
        .next()
        .unwrap_or_default();
    let fitness = parse_float(value)?;
    Ok(Some(fitness == OPTIMAL_FITNESS))
}

/// End-of-run outcomes in a run log, `true` for runs that found the optimum.
pub fn read_outcomes(path: &Path) -> Result<Vec<bool>> {
    let mut outcomes = Vec::new();
    for_each_line(path, open(path)?, |line| {
        if let Some(success) = parse_end_of_run(line)? {
            outcomes.push(success);
        }
        Ok(ControlFlow::Continue(()))
    })?;
    Ok(outcomes)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagEntry {
    pub level: u32,
    pub density: N64,
    pub fitness: N64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagRecord {
    pub generation: u64,
    pub entries: Vec<TagEntry>,
}

pub fn parse_tag_record(line: &str) -> Result<TagRecord, ParseErrorKind> {
    let mut fields = line.split('\t');
    let generation = parse_int(fields.next().unwrap_or_default())?;
    let entries = fields
        .map(|field| -> Result<TagEntry, ParseErrorKind> {
            let bad = || ParseErrorKind::BadTag(field.to_string());
            let mut parts = field.split(':');
            let (Some(level), Some(density), Some(fitness), None) =
                (parts.next(), parts.next(), parts.next(), parts.next())
            else {
                return Err(bad());
            };
            Ok(TagEntry {
                level: level.trim().parse().map_err(|_| bad())?,
                density: N64::from(parse_float(density)?),
                fitness: N64::from(parse_float(fitness)?),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(TagRecord {
        generation,
        entries,
    })
}

pub fn read_tag_records(path: &Path) -> Result<Vec<TagRecord>> {
    let mut records = Vec::new();
    for_each_line(path, open(path)?, |line| {
        records.push(parse_tag_record(line)?);
        Ok(ControlFlow::Continue(()))
    })?;
    Ok(records)
}

fn open(path: &Path) -> Result<BufReader<File>> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| Error::io(path, source))
}

/// Feeds every non-blank line to `visit`, attaching file and line number to
/// any parse error.
fn for_each_line(
    path: &Path,
    reader: impl BufRead,
    mut visit: impl FnMut(&str) -> Result<ControlFlow<()>, ParseErrorKind>,
) -> Result<()> {
    for (idx, line) in reader.lines().enumerate() {
        let line = line.map_err(|source| Error::io(path, source))?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match visit(line) {
            Ok(ControlFlow::Continue(())) => {}
            Ok(ControlFlow::Break(())) => break,
            Err(kind) => {
                return Err(Error::Parse {
                    path: path.to_path_buf(),
                    line: idx + 1,
                    kind,
                })
            }
        }
    }
    Ok(())
}

fn parse_int(field: &str) -> Result<u64, ParseErrorKind> {
    field
        .trim()
        .parse()
        .map_err(|_| ParseErrorKind::BadNumber(field.to_string()))
}

fn parse_float(field: &str) -> Result<f64, ParseErrorKind> {
    match field.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(ParseErrorKind::BadNumber(field.to_string())),
    }
}

fn parse_fitness(field: &str) -> Result<N64, ParseErrorKind> {
    let value = parse_float(field)?;
    if !(0.0..=1.0).contains(&value) {
        return Err(ParseErrorKind::FitnessOutOfRange(value));
    }
    Ok(N64::from(value))
}
