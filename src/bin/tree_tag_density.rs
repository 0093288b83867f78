use std::path::PathBuf;

use clap::Parser;
use postrun::{
    cli::Verbosity,
    density::density_series,
    graphs::{density_graph, legend_position},
    persistance::Outputs,
    Condition,
};

/// Plots the average tree tag density of every tag level over generations.
#[derive(Debug, Parser)]
#[command(name = "tree-tag-density", version)]
struct Args {
    /// Directory holding the tree tag files of one condition
    dir: PathBuf,
    /// Legend location, as a matplotlib location code
    #[arg(value_parser = clap::value_parser!(u8).range(0..=10))]
    legend_position: u8,
    /// Directory the chart is written to
    out_dir: PathBuf,
    #[command(flatten)]
    verbosity: Verbosity,
}

fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    let args = Args::parse();
    let reporter = args.verbosity.init()?;

    let label = args.dir.display().to_string();
    let series = density_series(&Condition::new(label, &args.dir), &reporter)?;

    let mut outputs = Outputs::new();
    outputs.add_graph("density.png", || {
        density_graph(&series, legend_position(args.legend_position))
    })?;
    outputs.write(&args.out_dir)
}
