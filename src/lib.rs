//! Post-run analysis of evolutionary algorithm experiment logs.
//!
//! Every aggregator is an independent batch job: it scans the condition
//! directories, parses the logs it cares about, summarizes them and hands back
//! plain values. Rendering and writing happen afterwards, so a failure anywhere
//! leaves the output directory untouched.

pub mod cli;
pub mod convergence;
pub mod density;
pub mod discovery;
pub mod error;
pub mod fitness;
pub mod graphs;
pub mod grid;
pub mod parse;
pub mod persistance;
pub mod reports;
pub mod stats;
pub mod success;

pub use discovery::{Condition, FileKind};
pub use error::{Error, ParseErrorKind, Result};

/// Fitness of a perfect solution. Logs stop once a run reaches it.
pub const OPTIMAL_FITNESS: f64 = 1.0;
