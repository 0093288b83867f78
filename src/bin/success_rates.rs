use clap::Parser;
use postrun::{
    cli::{ConditionArgs, Verbosity},
    persistance::{p_value_table, success_rate_table, Outputs},
    success::analyze,
};

/// Tallies how many runs of each condition found the optimum.
#[derive(Debug, Parser)]
#[command(name = "success-rates", version)]
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

    let mut outputs = Outputs::new();
    outputs.add("successRates.txt", success_rate_table(&report.outcomes)?);
    if let Some(p_values) = &report.p_values {
        outputs.add("successPVals.txt", p_value_table(&report.labels(), p_values)?);
    }
    outputs.write(&args.conditions.out_dir)
}
