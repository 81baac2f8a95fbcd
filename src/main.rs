use anyhow::{bail, Context, Result};
use batch::{BatchReport, BatchRunner};
use clap::{Parser, Subcommand};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use configuration::{init_logging, load_settings, LogFormat, Settings};
use datastore::CsvAssumptionSource;
use debt_fraction::{CommandSolver, DebtFractionCalculator};
use engine::{FlatTable, RunSettings, Runner};
use std::path::PathBuf;
use technologies::TechRegistry;
use tracing::{info, warn};
use validator::ConsistencyValidator;

mod export;

/// Computes CAPEX and LCOE for the ATB electricity generation technologies.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Settings file. Defaults to `lcoe.toml` in the working directory.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Console log style. Overrides `[logging].format`.
    #[arg(long, global = true, value_enum)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every technology (or one) and export the results.
    Process(ProcessArgs),
    /// List the technologies of the registry.
    List,
    /// Compute debt fractions with the configured external solver.
    DebtFractions(DebtFractionArgs),
}

#[derive(Parser)]
struct ProcessArgs {
    /// Directory holding the extracted assumption tables.
    data_dir: PathBuf,

    /// Only process this technology (name or sheet name).
    #[arg(short, long)]
    tech: Option<String>,

    /// Long-format results, one row per year. `-` for stdout.
    #[arg(short, long)]
    flat: Option<PathBuf>,

    /// Wide-format results, one column per year.
    #[arg(short, long)]
    pivoted: Option<PathBuf>,

    /// Technology metadata.
    #[arg(short, long)]
    meta: Option<PathBuf>,

    /// Skip the comparison against the reference CAPEX and LCOE tables.
    #[arg(long)]
    no_checks: bool,
}

#[derive(Parser)]
struct DebtFractionArgs {
    /// Directory holding the extracted assumption tables.
    data_dir: PathBuf,

    /// Output CSV. `-` for stdout.
    #[arg(short, long)]
    output: PathBuf,

    /// Only process this technology (name or sheet name).
    #[arg(short, long)]
    tech: Option<String>,
}

fn main() -> Result<()> {
    // A missing .env file is fine.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let mut settings = load_settings(cli.config.as_deref()).context("Failed to load settings")?;
    if let Some(format) = cli.log_format {
        settings.logging.format = format;
    }
    let _guard = init_logging(&settings.logging, cli.verbose)?;
    let registry = TechRegistry::from_settings(&settings).context("Failed to build the technology registry")?;

    match cli.command {
        Commands::Process(args) => handle_process(args, &settings, &registry),
        Commands::List => {
            print_registry(&registry);
            Ok(())
        }
        Commands::DebtFractions(args) => handle_debt_fractions(args, &settings, &registry),
    }
}

fn handle_process(args: ProcessArgs, settings: &Settings, registry: &TechRegistry) -> Result<()> {
    let source = CsvAssumptionSource::new(&args.data_dir);
    let runner = Runner::new(registry, &source, RunSettings::from_settings(settings));
    let runs = batch::plan(registry, args.tech.as_deref())?;

    let mut batch_runner = BatchRunner::new(&settings.batch).with_progress(true);
    if !args.no_checks {
        batch_runner = batch_runner.with_validator(ConsistencyValidator::from_settings(&settings.validation));
    }
    let report = batch_runner.run(&runner, &runs)?;

    let mut table = FlatTable::default();
    for output in &report.outputs {
        let profile = registry.get(&output.technology)?;
        table.append(output.flat(profile)?);
    }

    if let Some(path) = &args.flat {
        export::write_flat(&table, path)?;
    }
    if let Some(path) = &args.pivoted {
        export::write_pivoted(&table, path)?;
    }
    if let Some(path) = &args.meta {
        export::write_meta(&report.outputs, path)?;
    }

    print_summary(&report);
    if !report.failures.is_empty() {
        bail!("{} of {} runs failed", report.failures.len(), report.planned);
    }
    Ok(())
}

fn handle_debt_fractions(args: DebtFractionArgs, settings: &Settings, registry: &TechRegistry) -> Result<()> {
    let config = &settings.debt_fraction;
    let Some(program) = &config.solver_command else {
        bail!("No debt-fraction solver configured; set [debt_fraction].solver_command");
    };
    let solver = CommandSolver::new(program, config.solver_args.clone());
    let calculator = DebtFractionCalculator::new(&solver, config)?;

    let source = CsvAssumptionSource::new(&args.data_dir);
    let runner = Runner::new(registry, &source, RunSettings::from_settings(settings));
    let rows = calculator.calculate_all(&runner, args.tech.as_deref())?;
    if rows.is_empty() {
        warn!("No technology matched; nothing written");
        return Ok(());
    }

    export::write_debt_fractions(&rows, &args.output)?;
    info!(rows = rows.len(), "Debt fractions complete");
    Ok(())
}

fn print_registry(registry: &TechRegistry) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Technology", "Sheet", "Details", "Life", "Formula", "Depreciation", "LCOE"]);
    for profile in registry.iter() {
        let depreciation: Vec<&str> = profile.depreciation.schedule_names().collect();
        table.add_row(vec![
            profile.name.clone(),
            profile.sheet_name.clone(),
            profile.num_tech_details.to_string(),
            profile.tech_life.to_string(),
            profile.strategy.to_string(),
            depreciation.join(", "),
            if profile.capabilities.has_lcoe { "yes" } else { "no" }.to_string(),
        ]);
    }
    println!("{table}");
}

fn print_summary(report: &BatchReport) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Job", "Runs", "Completed", "Failed", "Skipped", "Mismatches", "Elapsed"]);
    table.add_row(vec![
        report.job_id.to_string(),
        report.planned.to_string(),
        report.outputs.len().to_string(),
        report.failures.len().to_string(),
        report.skipped.to_string(),
        report.mismatches.len().to_string(),
        format!("{:.2}s", report.elapsed.num_milliseconds() as f64 / 1000.0),
    ]);
    eprintln!("{table}");

    if report.failures.is_empty() && report.mismatches.is_empty() {
        return;
    }
    let mut problems = Table::new();
    problems
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Kind", "Details"]);
    for failure in &report.failures {
        problems.add_row(vec!["failed".to_string(), failure.error.to_string()]);
    }
    for mismatch in &report.mismatches {
        problems.add_row(vec!["mismatch".to_string(), mismatch.to_string()]);
    }
    eprintln!("{problems}");
}
