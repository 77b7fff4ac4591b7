//! Command line arguments for infra-validator.

use crate::config::ValidatorConfig;
use crate::Result;
use clap::{Parser, Subcommand};
use std::env;
use std::path::PathBuf;

/// Validate a segmented network infrastructure against its security checklist
#[derive(Parser, Debug, Clone)]
#[command(name = "infra-validator")]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Where to write the JSON report (overrides the configuration)
    #[arg(short, long, global = true)]
    pub report: Option<PathBuf>,

    /// Also export the results as JUnit XML
    #[arg(long, global = true, value_name = "PATH")]
    pub junit: Option<PathBuf>,

    /// Project name written into the report
    #[arg(long, global = true)]
    pub project: Option<String>,

    /// Per-command timeout in seconds
    #[arg(long, global = true, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Command to execute
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run the validation catalogue (default)
    Run,
    /// List the catalogue without running it
    List,
    /// Re-score a previously written report
    Score {
        /// Report file to load
        report: PathBuf,
    },
    /// Print version information
    Version,
}

impl Args {
    /// Command to execute, `run` when none was given
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Run)
    }

    /// Colors are on unless `--no-color` or `NO_COLOR` is set
    pub fn color_enabled(&self) -> bool {
        !self.no_color && env::var_os("NO_COLOR").is_none()
    }

    /// Load the configuration file (or defaults), apply command line
    /// overrides and validate the result
    pub fn load_config(&self) -> Result<ValidatorConfig> {
        let mut config = match &self.config {
            Some(path) => ValidatorConfig::load(path)?,
            None => ValidatorConfig::default(),
        };
        self.apply_overrides(&mut config);
        config.validate()?;
        Ok(config)
    }

    pub fn apply_overrides(&self, config: &mut ValidatorConfig) {
        if let Some(report) = &self.report {
            config.report_path = report.clone();
        }
        if let Some(project) = &self.project {
            config.project = project.clone();
        }
        if let Some(timeout) = self.timeout {
            config.command_timeout_secs = timeout;
        }
    }
}
