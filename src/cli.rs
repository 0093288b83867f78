//! Arguments shared by the post-run binaries.

use std::{path::PathBuf, str::FromStr};

use clap::{error::ErrorKind, Args, CommandFactory};

use crate::{reports::Reporter, Condition};

/// A comma separated list of non-empty items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommaList(pub Vec<String>);

impl FromStr for CommaList {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let items: Vec<String> = s.split(',').map(|item| item.trim().to_string()).collect();
        if items.iter().any(String::is_empty) {
            return Err(format!("`{s}` contains an empty item"));
        }
        Ok(Self(items))
    }
}

#[derive(Debug, Args)]
pub struct ConditionArgs {
    /// Comma separated directories, one per condition
    pub dirs: CommaList,
    /// Comma separated labels, in the same order as the directories
    pub labels: CommaList,
    /// Directory the outputs are written to
    pub out_dir: PathBuf,
}

impl ConditionArgs {
    /// Pairs directories with labels, exiting with a usage error if their
    /// counts differ.
    pub fn resolve<P: CommandFactory>(&self) -> Vec<Condition> {
        let (dirs, labels) = (&self.dirs.0, &self.labels.0);
        if dirs.len() != labels.len() {
            let mut command = P::command();
            command
                .error(
                    ErrorKind::WrongNumberOfValues,
                    format!(
                        "got {} directories but {} labels",
                        dirs.len(),
                        labels.len()
                    ),
                )
                .exit();
        }
        labels
            .iter()
            .zip(dirs)
            .map(|(label, dir)| Condition::new(label, dir))
            .collect()
    }
}

#[derive(Debug, Args)]
pub struct Verbosity {
    /// Hide progress bars
    #[arg(short, long)]
    pub quiet: bool,
    /// Log more, repeat for even more
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Verbosity {
    pub fn init(&self) -> eyre::Result<Reporter> {
        crate::reports::init_logging(self.verbose);
        Reporter::new(self.quiet)
    }
}
