//! infra-validator CLI entry point
//!
//! Runs the validation catalogue against a segmented network lab and writes
//! the JSON report.
//!
//! Exit codes: 0 every check passed, 1 at least one check failed,
//! 3 the tool itself could not do its job (configuration, report I/O).

use clap::Parser;
use infra_validator::checks::{catalogue, listing};
use infra_validator::cli::args::{Args, Command};
use infra_validator::cli::output::{render_summary, ConsoleProgress, Palette, ReportFormatter, TerminalFormatter};
use infra_validator::engine::report::Report;
use infra_validator::version::get_build_info;
use infra_validator::{run_validation, ValidatorError};
use std::path::Path;
use std::process::ExitCode;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::from(3)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    init_logging(&args.log_level);

    match args.command() {
        Command::Version => {
            println!("{}", get_build_info());
            ExitCode::SUCCESS
        }
        Command::List => print_catalogue(&args),
        Command::Score { report } => match Report::load(&report) {
            Ok(report) => {
                println!("{}", TerminalFormatter::new(args.color_enabled()).format(&report));
                verdict_code(&report)
            }
            Err(e) => fail(&e),
        },
        Command::Run => run(&args),
    }
}

/// Logs go to stderr; RUST_LOG wins over `--log-level`
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
}

fn fail(e: &ValidatorError) -> ExitCode {
    if e.is_report_failure() {
        eprintln!("Error: report could not be written: {}", e);
    } else {
        eprintln!("Error: {}", e);
    }
    ExitCode::from(3)
}

fn verdict_code(report: &Report) -> ExitCode {
    if report.score().is_perfect() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}

fn print_catalogue(args: &Args) -> ExitCode {
    let config = match args.load_config() {
        Ok(config) => config,
        Err(e) => return fail(&e),
    };

    println!("Validation catalogue ({}):\n", config.project);
    for entry in listing(&catalogue(&config)) {
        println!("  {:<5} {:<40} [{}]", entry.id, entry.description, entry.endpoint);
        println!("        {}", entry.command);
    }
    ExitCode::SUCCESS
}

fn run(args: &Args) -> ExitCode {
    let config = match args.load_config() {
        Ok(config) => config,
        Err(e) => return fail(&e),
    };
    let color = args.color_enabled();
    let inventory = config.build_inventory();

    println!("{}", Palette::new(color).bold(&format!("Validation: {}", config.project)));

    let mut progress = ConsoleProgress::stdout(color);
    let ledger = match run_validation(&config, &inventory, &mut progress) {
        Ok(ledger) => ledger,
        Err(e) => return fail(&e),
    };

    let report = Report::generate(&config.project, ledger);
    println!("\n{}", render_summary(&report, Palette::new(color)));

    if let Err(e) = report.save(&config.report_path) {
        return fail(&e);
    }
    println!("Report written to {}", config.report_path.display());

    if let Some(path) = &args.junit {
        if let Err(e) = export_junit(&report, path) {
            return fail(&e);
        }
    }

    verdict_code(&report)
}

#[cfg(feature = "junit")]
fn export_junit(report: &Report, path: &Path) -> Result<(), ValidatorError> {
    infra_validator::cli::output::write_junit(report, path)?;
    println!("JUnit export written to {}", path.display());
    Ok(())
}

#[cfg(not(feature = "junit"))]
fn export_junit(_report: &Report, path: &Path) -> Result<(), ValidatorError> {
    tracing::warn!(path = %path.display(), "built without junit support, export skipped");
    Ok(())
}
