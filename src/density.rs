use std::collections::BTreeMap;

use crate::{
    parse::{read_tag_records, TagEntry, TagRecord},
    reports::Reporter,
    stats::avg_by,
    Condition, FileKind, Result,
};

/// Highest tag level that is plotted.
pub const MAX_TAG_LEVEL: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DensityPoint {
    pub generation: u64,
    /// Mean density over all runs, counting absent entries as 0.
    pub density: f64,
    /// Mean fitness of the retained entries.
    pub fitness: f64,
}

/// Average density of one tag level over generations.
#[derive(Debug, Clone, PartialEq)]
pub struct DensitySeries {
    pub level: u32,
    pub points: Vec<DensityPoint>,
}

impl DensitySeries {
    pub fn label(&self) -> String {
        format!("L{}:{}", self.level, self.level + 1)
    }
}

pub type RunEntries = BTreeMap<(u32, u64), TagEntry>;

/// Retains the densest entry of every (level, generation) in a run. Equal
/// densities go to strictly higher fitness, otherwise the first one stays.
pub fn best_entries(records: &[TagRecord]) -> RunEntries {
    let mut best = RunEntries::new();
    for record in records {
        for &entry in &record.entries {
            if entry.level > MAX_TAG_LEVEL {
                tracing::trace!(
                    level = entry.level,
                    generation = record.generation,
                    "skipping tag level"
                );
                continue;
            }
            best.entry((entry.level, record.generation))
                .and_modify(|kept| {
                    if is_better(&entry, kept) {
                        *kept = entry;
                    }
                })
                .or_insert(entry);
        }
    }
    best
}

fn is_better(candidate: &TagEntry, kept: &TagEntry) -> bool {
    candidate.density > kept.density
        || (candidate.density == kept.density && candidate.fitness > kept.fitness)
}

/// Averages the per-run best entries into one series per level present.
pub fn average(runs: &[RunEntries]) -> Vec<DensitySeries> {
    let mut levels: BTreeMap<u32, BTreeMap<u64, Vec<Option<TagEntry>>>> = BTreeMap::new();
    for &(level, generation) in runs.iter().flat_map(|run| run.keys()) {
        levels
            .entry(level)
            .or_default()
            .entry(generation)
            .or_insert_with(|| {
                runs.iter()
                    .map(|run| run.get(&(level, generation)).copied())
                    .collect()
            });
    }

    levels
        .into_iter()
        .map(|(level, generations)| DensitySeries {
            level,
            points: generations
                .into_iter()
                .map(|(generation, entries)| {
                    let present: Vec<TagEntry> = entries.iter().flatten().copied().collect();
                    DensityPoint {
                        generation,
                        density: avg_by(&entries, |entry| {
                            entry.map_or(0.0, |entry| f64::from(entry.density))
                        }),
                        fitness: avg_by(&present, |entry| f64::from(entry.fitness)),
                    }
                })
                .collect(),
        })
        .collect()
}

pub fn density_series(condition: &Condition, reporter: &Reporter) -> Result<Vec<DensitySeries>> {
    let files = condition.files(FileKind::TreeTags)?;
    let bar = reporter.condition(&condition.label, files.len());

    let mut runs = Vec::with_capacity(files.len());
    for path in &files {
        let records = read_tag_records(path)?;
        tracing::debug!(path = %path.display(), generations = records.len(), "read tree tags");
        runs.push(best_entries(&records));
        bar.inc(1);
    }
    bar.finish_with_message("parsed");

    let series = average(&runs);
    tracing::info!(
        label = %condition.label,
        runs = runs.len(),
        levels = series.len(),
        "averaged tag densities"
    );
    Ok(series)
}
