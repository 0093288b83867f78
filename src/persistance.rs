use std::path::{Path, PathBuf};

use eyre::WrapErr;

use crate::{stats::Summary, success::Outcomes};

const NO_VALUE: &str = "--";

/// Output files of a batch, kept in memory until every one of them has been
/// produced.
#[derive(Debug, Default)]
pub struct Outputs {
    files: Vec<(&'static str, Vec<u8>)>,
}

impl Outputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, name: &'static str, contents: Vec<u8>) {
        self.files.push((name, contents));
    }

    /// Renders a chart unless the crate was built with `drop_graphs`.
    pub fn add_graph(
        &mut self,
        name: &'static str,
        render: impl FnOnce() -> eyre::Result<Vec<u8>>,
    ) -> eyre::Result<()> {
        if cfg!(feature = "drop_graphs") {
            tracing::debug!(name, "graphs disabled, skipping");
            return Ok(());
        }
        let png = render().wrap_err_with(|| format!("failed to render {name}"))?;
        self.add(name, png);
        Ok(())
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.files.iter().map(|(name, _)| *name)
    }

    /// Writes every file under a staging name first and only renames them into
    /// place once all of them were written.
    pub fn write(self, out_dir: &Path) -> eyre::Result<()> {
        std::fs::create_dir_all(out_dir)
            .wrap_err_with(|| format!("failed to create {}", out_dir.display()))?;

        let mut staged = Vec::with_capacity(self.files.len());
        for (name, contents) in &self.files {
            let partial = out_dir.join(format!(".{name}.partial"));
            if let Err(err) = std::fs::write(&partial, contents) {
                discard(&staged);
                let _ = std::fs::remove_file(&partial);
                return Err(err)
                    .wrap_err_with(|| format!("failed to write {}", partial.display()));
            }
            staged.push((partial, out_dir.join(name)));
        }

        for (partial, path) in &staged {
            std::fs::rename(partial, path)
                .wrap_err_with(|| format!("failed to move {} into place", path.display()))?;
            tracing::info!(path = %path.display(), "wrote output");
        }
        Ok(())
    }
}

fn discard(staged: &[(PathBuf, PathBuf)]) {
    for (partial, _) in staged {
        if let Err(err) = std::fs::remove_file(partial) {
            tracing::warn!(path = %partial.display(), %err, "failed to remove staged output");
        }
    }
}

fn tab_writer() -> csv::Writer<Vec<u8>> {
    csv::WriterBuilder::new()
        .delimiter(b'\t')
        .quote_style(csv::QuoteStyle::Never)
        .flexible(true)
        .from_writer(Vec::new())
}

fn finish(writer: csv::Writer<Vec<u8>>) -> eyre::Result<Vec<u8>> {
    writer
        .into_inner()
        .map_err(|err| eyre::eyre!("failed to flush table: {}", err.error()))
}

/// Pairwise p-value matrix: a header of labels, then one row per condition
/// but the last, with `--` on and below the diagonal.
pub fn p_value_table(labels: &[&str], p_values: &[Vec<Option<f64>>]) -> eyre::Result<Vec<u8>> {
    let mut writer = tab_writer();

    writer.write_record(std::iter::once("").chain(labels.iter().copied()))?;

    for (label, row) in labels.iter().zip(p_values).take(labels.len().saturating_sub(1)) {
        writer.write_record(std::iter::once(label.to_string()).chain(row.iter().map(|p| {
            p.map(|p| format!("{p:.5}"))
                .unwrap_or_else(|| NO_VALUE.to_string())
        })))?;
    }

    finish(writer)
}

pub fn success_rate_table(outcomes: &[Outcomes]) -> eyre::Result<Vec<u8>> {
    let mut writer = tab_writer();
    for outcome in outcomes {
        writer.write_record([
            outcome.label.clone(),
            format!("{:.2}%", outcome.success_rate()),
        ])?;
    }
    finish(writer)
}

pub fn convergence_averages_table(labels: &[&str], summaries: &[Summary]) -> eyre::Result<Vec<u8>> {
    let mut writer = tab_writer();
    for (label, summary) in labels.iter().zip(summaries) {
        writer.write_record([
            label.to_string(),
            format!("{:.2}", summary.mean),
            format!("{:.2}", summary.ci95),
        ])?;
    }
    finish(writer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::tests::scratch_dir;

    fn text(bytes: Vec<u8>) -> String {
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn p_value_matrix_layout() {
        let matrix = vec![
            vec![None, Some(0.049_534_613), Some(1.0)],
            vec![None, None, Some(0.5)],
            vec![None, None, None],
        ];
        let table = text(p_value_table(&["a", "b", "c"], &matrix).unwrap());
        assert_eq!(table, "\ta\tb\tc\na\t--\t0.04953\t1.00000\nb\t--\t--\t0.50000\n");
    }

    #[test]
    fn single_condition_matrix_is_just_the_header() {
        let table = text(p_value_table(&["only"], &[vec![None]]).unwrap());
        assert_eq!(table, "\tonly\n");
    }

    #[test]
    fn success_rates_as_percentages() {
        let outcomes = [
            Outcomes {
                label: "a".into(),
                successes: 2,
                failures: 1,
            },
            Outcomes {
                label: "b".into(),
                successes: 0,
                failures: 4,
            },
        ];
        let table = text(success_rate_table(&outcomes).unwrap());
        assert_eq!(table, "a\t66.67%\nb\t0.00%\n");
    }

    #[test]
    fn convergence_averages_with_interval() {
        let summaries = [Summary {
            mean: 2000.0,
            ci95: 1131.6,
            count: 3,
        }];
        let table = text(convergence_averages_table(&["early"], &summaries).unwrap());
        assert_eq!(table, "early\t2000.00\t1131.60\n");
    }

    #[test]
    fn outputs_are_written_together() {
        let dir = scratch_dir("outputs").join("nested");
        let mut outputs = Outputs::new();
        outputs.add("a.txt", b"one".to_vec());
        outputs.add("b.txt", b"two".to_vec());
        assert_eq!(outputs.names().collect::<Vec<_>>(), ["a.txt", "b.txt"]);

        outputs.write(&dir).unwrap();
        assert_eq!(std::fs::read_to_string(dir.join("a.txt")).unwrap(), "one");
        assert_eq!(std::fs::read_to_string(dir.join("b.txt")).unwrap(), "two");
        let _ = std::fs::remove_dir_all(dir.parent().unwrap());
    }

    #[test]
    fn a_failed_write_leaves_no_outputs_behind() {
        let dir = scratch_dir("outputs_failed");
        // a directory in the way of the second file's staging name
        std::fs::create_dir_all(dir.join(".b.txt.partial")).unwrap();
        let mut outputs = Outputs::new();
        outputs.add("a.txt", b"one".to_vec());
        outputs.add("b.txt", b"two".to_vec());

        assert!(outputs.write(&dir).is_err());
        assert!(!dir.join("a.txt").exists());
        assert!(!dir.join(".a.txt.partial").exists());
        assert!(!dir.join("b.txt").exists());
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn failed_graphs_produce_no_output() {
        let mut outputs = Outputs::new();
        let result = outputs.add_graph("broken.png", || Err(eyre::eyre!("no backend")));
        if cfg!(feature = "drop_graphs") {
            assert!(result.is_ok());
        } else {
            assert!(result.is_err());
        }
        assert_eq!(outputs.names().count(), 0);
    }
}
