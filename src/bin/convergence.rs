use clap::Parser;
use postrun::{
    cli::{ConditionArgs, Verbosity},
    convergence::analyze,
    graphs::convergence_graph,
    persistance::{convergence_averages_table, p_value_table, Outputs},
};

/// Compares how many evaluations each condition needs to find the optimum.
#[derive(Debug, Parser)]
#[command(name = "convergence", version)]
struct Args {
    #[command(flatten)]
    conditions: ConditionArgs,
    #[command(flatten)]
    verbosity: Verbosity,
}

fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    let args = Args::parse();
    let conditions = args.conditions.resolve::<Args>();
    let reporter = args.verbosity.init()?;

    let report = analyze(&conditions, &reporter)?;
    let labels = report.labels();

    let mut outputs = Outputs::new();
    outputs.add_graph("convergence.png", || {
        convergence_graph(&labels, &report.summaries)
    })?;
    outputs.add(
        "convergencePVals.txt",
        p_value_table(&labels, &report.p_values)?,
    );
    outputs.add(
        "convergenceAverages.txt",
        convergence_averages_table(&labels, &report.summaries)?,
    );
    outputs.write(&args.conditions.out_dir)
}
