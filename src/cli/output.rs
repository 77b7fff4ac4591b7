//! Console rendering and report export.
//!
//! Provides the live progress renderer used during a run, plus terminal
//! and JUnit XML formatters for finished reports.
//!
//! # Graceful Degradation
//!
//! - Non-TTY output: color disabled via NO_COLOR or --no-color
//! - Write errors on the console stream: ignored, the run continues
//! - Empty reports: valid output with zero checks
//!
//! No function in this module will panic.

use crate::engine::ledger::{CheckOutcome, Ledger};
use crate::engine::report::Report;
use crate::engine::sequencer::Progress;
use crate::Concern;
use std::io::{self, Write};
#[cfg(feature = "junit")]
use std::path::Path;

const RULE: &str = "--------------------------------------------------------------------------------";

/// ANSI coloring, a no-op when disabled
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    color: bool,
}

impl Palette {
    pub fn new(color: bool) -> Self {
        Palette { color }
    }

    fn colorize(&self, text: &str, color_code: &str) -> String {
        if self.color {
            format!("\x1b[{}m{}\x1b[0m", color_code, text)
        } else {
            text.to_string()
        }
    }

    pub fn green(&self, text: &str) -> String {
        self.colorize(text, "32")
    }

    pub fn red(&self, text: &str) -> String {
        self.colorize(text, "31")
    }

    pub fn yellow(&self, text: &str) -> String {
        self.colorize(text, "33")
    }

    pub fn gray(&self, text: &str) -> String {
        self.colorize(text, "90")
    }

    pub fn bold(&self, text: &str) -> String {
        self.colorize(text, "1")
    }
}

/// `[T1.2] description : PASS`, plus an indented details line when present
pub fn format_outcome(outcome: &CheckOutcome, palette: Palette) -> String {
    let status = if outcome.passed() {
        palette.green("PASS")
    } else {
        palette.red("FAIL")
    };
    let mut line = format!("[{}] {} : {}", outcome.id(), outcome.description(), status);
    if !outcome.details().is_empty() {
        line.push_str(&format!("\n    Details: {}", palette.gray(outcome.details())));
    }
    line
}

/// Final summary block: counts, score and verdict
pub fn render_summary(report: &Report, palette: Palette) -> String {
    let score = report.score();
    let verdict = if score.is_perfect() {
        palette.green("all checks passed")
    } else {
        palette.red("some checks failed")
    };

    let mut output = String::new();
    output.push_str(RULE);
    output.push('\n');
    output.push_str(&format!("Project: {}\n", report.meta.project));
    output.push_str(&format!(
        "SUMMARY: {} passed, {} failed, {} total\n",
        score.passed,
        score.total - score.passed,
        score.total
    ));
    output.push_str(&format!("Score: {}\n", palette.bold(&score.to_string())));
    output.push_str(&format!("Result: {}\n", verdict));
    output.push_str(RULE);
    output
}

/// Live progress renderer writing to a stream (stdout by default)
pub struct ConsoleProgress<W: Write> {
    out: W,
    palette: Palette,
}

impl ConsoleProgress<io::Stdout> {
    pub fn stdout(color: bool) -> Self {
        ConsoleProgress::new(io::stdout(), color)
    }
}

impl<W: Write> ConsoleProgress<W> {
    pub fn new(out: W, color: bool) -> Self {
        ConsoleProgress {
            out,
            palette: Palette::new(color),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Progress for ConsoleProgress<W> {
    fn banner(&mut self, title: &str) {
        let _ = writeln!(self.out, "\n{}", self.palette.bold(&format!("=== {} ===", title)));
    }

    fn info(&mut self, message: &str) {
        let _ = writeln!(self.out, "{} {}", self.palette.yellow("[*]"), message);
    }

    fn outcome(&mut self, outcome: &CheckOutcome) {
        let _ = writeln!(self.out, "{}", format_outcome(outcome, self.palette));
        let _ = self.out.flush();
    }
}

/// Trait for report formatters
pub trait ReportFormatter {
    /// Format a report into a string
    fn format(&self, report: &Report) -> String;
}

/// Group outcomes by concern, in order of first appearance
fn group_by_concern(ledger: &Ledger) -> Vec<(Concern, Vec<&CheckOutcome>)> {
    let mut groups: Vec<(Concern, Vec<&CheckOutcome>)> = Vec::new();
    for outcome in ledger.iter() {
        let concern = Concern::from_identifier(outcome.id());
        match groups.iter_mut().find(|(c, _)| *c == concern) {
            Some((_, outcomes)) => outcomes.push(outcome),
            None => groups.push((concern, vec![outcome])),
        }
    }
    groups
}

/// Terminal (human-readable) formatter for a stored report
pub struct TerminalFormatter {
    palette: Palette,
}

impl TerminalFormatter {
    pub fn new(color: bool) -> Self {
        TerminalFormatter {
            palette: Palette::new(color),
        }
    }
}

impl ReportFormatter for TerminalFormatter {
    fn format(&self, report: &Report) -> String {
        let mut output = String::new();

        output.push_str(RULE);
        output.push('\n');
        output.push_str("infra-validator report\n");
        output.push_str(&format!("Generated: {}\n", report.meta.timestamp));
        output.push_str(&format!("Recorded score: {}\n", report.meta.score));
        output.push_str(RULE);
        output.push_str("\n\n");

        for (concern, outcomes) in group_by_concern(&report.tests) {
            output.push_str(&format!("{}\n", concern.to_string().to_uppercase()));
            for outcome in outcomes {
                for line in format_outcome(outcome, self.palette).lines() {
                    output.push_str(&format!("  {}\n", line));
                }
            }
            output.push('\n');
        }

        output.push_str(&render_summary(report, self.palette));
        output
    }
}

/// JUnit XML formatter, one test suite per concern
#[cfg(feature = "junit")]
pub struct JunitFormatter;

#[cfg(feature = "junit")]
impl JunitFormatter {
    pub fn new() -> Self {
        JunitFormatter
    }

    fn escape_xml(s: &str) -> String {
        let mut result = String::with_capacity(s.len());
        for c in s.chars() {
            match c {
                '&' => result.push_str("&amp;"),
                '<' => result.push_str("&lt;"),
                '>' => result.push_str("&gt;"),
                '"' => result.push_str("&quot;"),
                '\'' => result.push_str("&apos;"),
                c => result.push(c),
            }
        }
        result
    }
}

#[cfg(feature = "junit")]
impl Default for JunitFormatter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "junit")]
impl ReportFormatter for JunitFormatter {
    fn format(&self, report: &Report) -> String {
        let mut output = String::new();
        output.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");

        let score = report.score();
        output.push_str(&format!(
            "<testsuites name=\"{}\" tests=\"{}\" failures=\"{}\" errors=\"0\" timestamp=\"{}\">\n",
            Self::escape_xml(&report.meta.project),
            score.total,
            score.total - score.passed,
            Self::escape_xml(&report.meta.timestamp)
        ));

        for (concern, outcomes) in group_by_concern(&report.tests) {
            let failures = outcomes.iter().filter(|o| !o.passed()).count();
            output.push_str(&format!(
                "  <testsuite name=\"{}\" tests=\"{}\" failures=\"{}\" errors=\"0\">\n",
                concern.slug(),
                outcomes.len(),
                failures
            ));

            for outcome in outcomes {
                output.push_str(&format!(
                    "    <testcase name=\"{}: {}\" classname=\"infra-validator.{}\" timestamp=\"{}\">\n",
                    Self::escape_xml(outcome.id()),
                    Self::escape_xml(outcome.description()),
                    concern.slug(),
                    Self::escape_xml(outcome.timestamp())
                ));
                if !outcome.passed() {
                    let message = if outcome.details().is_empty() {
                        "check failed"
                    } else {
                        outcome.details()
                    };
                    output.push_str(&format!(
                        "      <failure message=\"{}\">{}</failure>\n",
                        Self::escape_xml(message),
                        Self::escape_xml(outcome.command_output())
                    ));
                } else {
                    output.push_str(&format!(
                        "      <system-out>{}</system-out>\n",
                        Self::escape_xml(outcome.command_output())
                    ));
                }
                output.push_str("    </testcase>\n");
            }

            output.push_str("  </testsuite>\n");
        }

        output.push_str("</testsuites>");
        output
    }
}

/// Write the JUnit rendering of `report` to `path`
#[cfg(feature = "junit")]
pub fn write_junit(report: &Report, path: &Path) -> crate::Result<()> {
    std::fs::write(path, JunitFormatter::new().format(report)).map_err(|source| {
        crate::ValidatorError::ExportWrite {
            path: path.to_path_buf(),
            source,
        }
    })?;
    tracing::info!(path = %path.display(), "junit export written");
    Ok(())
}
