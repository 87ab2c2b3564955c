use std::error::Error;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use env_logger::Env;

use sor_report::config::{
    DEFAULT_BAR_CHART_PATH, DEFAULT_BOXPLOT_PATH, DEFAULT_INPUT_PATH, DEFAULT_REPORT_PATH,
};
use sor_report::dataset::save_records;
use sor_report::{ReportConfig, ReportError, SimulationConfig};

/// Generates the SOR wait time report, or simulates the dataset it is built from.
///
/// Without a subcommand the report is generated using the options below.  Fonts are looked up
/// under `assets/fonts` or in the directory named by `SOR_REPORT_FONTS_DIR`.
#[derive(Parser)]
#[command(version, args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    report: ReportArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the charts and the PDF report from a dataset.
    Report(ReportArgs),

    /// Simulate the emergency department and write the wait time dataset.
    #[command(alias = "sim")]
    Simulate(SimulateArgs),
}

#[derive(Args)]
struct ReportArgs {
    /// Dataset with `Priority` and `WaitTime` columns.
    #[arg(long, default_value = DEFAULT_INPUT_PATH)]
    input: PathBuf,

    /// Output path of the wait time distribution chart.
    #[arg(long, default_value = DEFAULT_BOXPLOT_PATH)]
    boxplot: PathBuf,

    /// Output path of the mean wait time chart.
    #[arg(long, default_value = DEFAULT_BAR_CHART_PATH)]
    bar_chart: PathBuf,

    /// Output path of the PDF report.
    #[arg(long, default_value = DEFAULT_REPORT_PATH)]
    output: PathBuf,

    /// Field delimiter of the dataset.
    #[arg(long, default_value = ",", value_parser = parse_delimiter)]
    delimiter: u8,
}

#[derive(Args)]
struct SimulateArgs {
    /// Where to write the dataset.
    #[arg(long, default_value = DEFAULT_INPUT_PATH)]
    output: PathBuf,

    /// Simulated minutes.
    #[arg(long, default_value_t = 1000)]
    minutes: u32,

    /// Number of doctors on duty.
    #[arg(long, default_value_t = 3)]
    doctors: usize,

    /// Number of nurses on duty.
    #[arg(long, default_value_t = 5)]
    nurses: usize,

    /// Seed for a reproducible run.
    #[arg(long)]
    seed: Option<u64>,
}

fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value.as_bytes() {
        [byte] if byte.is_ascii() => Ok(*byte),
        _ => Err(format!("expected a single ASCII character, got '{}'", value)),
    }
}

fn report(args: ReportArgs) -> Result<(), ReportError> {
    let config = ReportConfig::new()
        .with_input_path(args.input)
        .with_boxplot_path(args.boxplot)
        .with_bar_chart_path(args.bar_chart)
        .with_report_path(args.output)
        .with_delimiter(args.delimiter);

    let summary = sor_report::run(&config)?;
    println!(
        "Generated {} ({} bytes) from {} records",
        summary.report_path.display(),
        summary.report_bytes,
        summary.records
    );
    Ok(())
}

fn simulate(args: SimulateArgs) -> Result<(), ReportError> {
    let config = SimulationConfig::new()
        .with_minutes(args.minutes)
        .with_doctors(args.doctors)
        .with_nurses(args.nurses)
        .with_seed(args.seed);

    let outcome = sor_report::simulate(config);
    save_records(&args.output, &outcome.records, b',')?;
    println!(
        "Saved {} wait times to {}",
        outcome.records.len(),
        args.output.display()
    );
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Report(args)) => report(args),
        Some(Commands::Simulate(args)) => simulate(args),
        None => report(cli.report),
    };

    if let Err(err) = result {
        eprintln!("Error: {}", err);
        print_error_sources(&err);
        std::process::exit(1);
    }
}

fn print_error_sources(mut error: &(dyn Error + 'static)) {
    while let Some(source) = error.source() {
        eprintln!("  caused by: {}", source);
        error = source;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn report_is_the_default_command() {
        let cli = Cli::try_parse_from(["sor_report", "--input", "data.csv"]).expect("parses");
        assert!(cli.command.is_none());
        assert_eq!(cli.report.input, PathBuf::from("data.csv"));
        assert_eq!(cli.report.output, PathBuf::from(DEFAULT_REPORT_PATH));
        assert_eq!(cli.report.delimiter, b',');
    }

    #[test]
    fn simulate_options_have_defaults() {
        let cli = Cli::try_parse_from(["sor_report", "simulate", "--seed", "9"]).expect("parses");
        let Some(Commands::Simulate(args)) = cli.command else {
            panic!("expected the simulate command");
        };
        assert_eq!(args.minutes, 1000);
        assert_eq!(args.doctors, 3);
        assert_eq!(args.nurses, 5);
        assert_eq!(args.seed, Some(9));
        assert_eq!(args.output, PathBuf::from(DEFAULT_INPUT_PATH));
    }

    #[test]
    fn delimiter_must_be_one_ascii_character() {
        assert_eq!(parse_delimiter(";"), Ok(b';'));
        assert!(parse_delimiter(";;").is_err());
        assert!(parse_delimiter("ł").is_err());
    }
}
