use clap::Parser;
use postrun::{
    cli::{ConditionArgs, Verbosity},
    fitness::fitness_curves,
    graphs::fitness_graph,
    persistance::Outputs,
};

/// Plots mean best fitness against evaluations for every condition.
#[derive(Debug, Parser)]
#[command(name = "fitness-curve", version)]
struct Args {
    #[command(flatten)]
    conditions: ConditionArgs,
    /// Ignore evaluations past this count
    cutoff: Option<u64>,
    #[command(flatten)]
    verbosity: Verbosity,
}

fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    let args = Args::parse();
    let conditions = args.conditions.resolve::<Args>();
    let reporter = args.verbosity.init()?;

    let curves = fitness_curves(&conditions, args.cutoff, &reporter)?;

    let mut outputs = Outputs::new();
    outputs.add_graph("fitness.png", || fitness_graph(&curves))?;
    outputs.write(&args.conditions.out_dir)
}
