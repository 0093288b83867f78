use std::{io, path::PathBuf};

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{}:{line}: {kind}", path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        kind: ParseErrorKind,
    },

    /// A run has no fitness value for a grid point it is expected to cover.
    #[error("{}: no fitness recorded for {evaluations} evaluations", path.display())]
    MissingGridPoint { path: PathBuf, evaluations: u64 },

    #[error("condition `{label}` has {found} {what}, at least {needed} required")]
    InsufficientSamples {
        label: String,
        what: &'static str,
        found: usize,
        needed: usize,
    },

    #[error("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to scan {}", path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseErrorKind {
    #[error("expected {expected} fields, found {found}")]
    FieldCount { expected: &'static str, found: usize },
    #[error("`{0}` is not a valid number")]
    BadNumber(String),
    #[error("layer entry `{0}` is not of the form <avg>:<max>")]
    BadLayer(String),
    #[error("tag entry `{0}` is not of the form <level>:<density>:<fitness>")]
    BadTag(String),
    #[error("fitness {0} is outside of [0, 1]")]
    FitnessOutOfRange(f64),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}
