//! Check execution.
//!
//! Runs one command against one endpoint, applies the expectation and turns
//! the result into a [`CheckOutcome`] with a diagnostic detail.
//!
//! # Graceful Degradation
//!
//! - Empty output: classified normally; for silence-intent checks it is the
//!   success case and is labelled as a silent drop
//! - Oversized output: truncated to the per-check or default limit
//! - Terminal escape sequences and control characters: stripped
//!
//! Execution never fails; every path produces an outcome.

use crate::engine::ledger::{CheckOutcome, CheckStatus};
use crate::engine::poll::{poll_until, PollPolicy};
use crate::engine::predicate::Expectation;
use crate::platform::endpoint::{Endpoint, Inventory};
use crate::Concern;
use std::time::Duration;
use tracing::debug;

/// Stored output for a silence-intent check that got no response
pub const SILENT_DROP_OUTPUT: &str = "No response within bound (silent drop)";

/// Detail attached to a silence-intent check that got no response
pub const SILENT_DROP_DETAIL: &str = "Timeout treated as silent drop, expected for DROP policy tests";

/// Marker appended to truncated output
pub const TRUNCATION_MARKER: &str = "... (truncated)";

/// What a successful check looks like
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Intent {
    /// Success is a positive signal in the output
    #[default]
    Signal,
    /// Success is the absence of a positive signal; no output at all is a
    /// silent drop and counts as success
    ExpectSilence,
}

/// Declarative definition of one command check
#[derive(Debug, Clone, PartialEq)]
pub struct CheckSpec {
    /// Stable short code, e.g. "T2.1"
    pub id: String,
    pub description: String,
    pub concern: Concern,
    /// Name of the endpoint running the command
    pub endpoint: String,
    pub command: String,
    pub expectation: Expectation,
    pub intent: Intent,
    /// Stored output limit in characters (None = executor default)
    pub output_limit: Option<usize>,
    /// Re-run until the expectation holds (None = single attempt)
    pub poll: Option<PollPolicy>,
}

impl CheckSpec {
    pub fn new(
        id: impl Into<String>,
        description: impl Into<String>,
        concern: Concern,
        endpoint: impl Into<String>,
        command: impl Into<String>,
    ) -> Self {
        CheckSpec {
            id: id.into(),
            description: description.into(),
            concern,
            endpoint: endpoint.into(),
            command: command.into(),
            expectation: Expectation::none(),
            intent: Intent::Signal,
            output_limit: None,
            poll: None,
        }
    }

    pub fn expect(mut self, expectation: Expectation) -> Self {
        self.expectation = expectation;
        self
    }

    pub fn expect_silence(mut self) -> Self {
        self.intent = Intent::ExpectSilence;
        self
    }

    pub fn limit_output(mut self, chars: usize) -> Self {
        self.output_limit = Some(chars);
        self
    }

    pub fn polled(mut self, policy: PollPolicy) -> Self {
        self.poll = Some(policy);
        self
    }
}

/// Runs checks against endpoints with a bounded wait
#[derive(Debug, Clone)]
pub struct CheckExecutor {
    command_timeout: Duration,
    output_limit: usize,
}

impl Default for CheckExecutor {
    fn default() -> Self {
        CheckExecutor {
            command_timeout: Duration::from_secs(10),
            output_limit: 4096,
        }
    }
}

impl CheckExecutor {
    pub fn new(command_timeout: Duration, output_limit: usize) -> Self {
        CheckExecutor {
            command_timeout,
            output_limit,
        }
    }

    pub fn command_timeout(&self) -> Duration {
        self.command_timeout
    }

    /// Default stored output limit, in characters
    pub fn output_limit(&self) -> usize {
        self.output_limit
    }

    /// Execute a command whose output is not evaluated
    pub fn dispatch(&self, endpoint: &dyn Endpoint, command: &str) -> String {
        endpoint.execute(command, self.command_timeout)
    }

    /// Run a check, polling when the spec carries a poll policy
    pub fn run(&self, endpoint: &dyn Endpoint, spec: &CheckSpec) -> CheckOutcome {
        let output = match spec.poll {
            Some(ref policy) => {
                let polled = poll_until(
                    policy,
                    || endpoint.execute(&spec.command, self.command_timeout),
                    |out| spec.expectation.evaluate(out),
                );
                debug!(id = %spec.id, attempts = polled.attempts, satisfied = polled.satisfied, "polled check settled");
                polled.value
            }
            None => endpoint.execute(&spec.command, self.command_timeout),
        };
        self.classify(spec, &output)
    }

    /// Resolve the endpoint of `spec` in `inventory` and run the check.
    ///
    /// An endpoint missing from the inventory is recorded as a failure.
    pub fn run_in(&self, inventory: &Inventory, spec: &CheckSpec) -> CheckOutcome {
        match inventory.require(&spec.endpoint) {
            Ok(endpoint) => self.run(endpoint, spec),
            Err(e) => self.unmet(&spec.id, &spec.description, "", &e.to_string()),
        }
    }

    /// Turn raw captured output into an outcome for `spec`
    pub fn classify(&self, spec: &CheckSpec, raw_output: &str) -> CheckOutcome {
        let passed = spec.expectation.evaluate(raw_output);
        let silent = raw_output.trim().is_empty();
        let limit = spec.output_limit.unwrap_or(self.output_limit);

        let (output, details) = if passed {
            if silent && spec.intent == Intent::ExpectSilence {
                (SILENT_DROP_OUTPUT.to_string(), SILENT_DROP_DETAIL.to_string())
            } else {
                (sanitize_output(raw_output, limit), String::new())
            }
        } else {
            let mut details = spec
                .expectation
                .violations(raw_output)
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join("; ");
            if silent {
                details.push_str(&format!(
                    "; no output within {}s",
                    self.command_timeout.as_secs()
                ));
            }
            (sanitize_output(raw_output, limit), details)
        };

        CheckOutcome::new(
            spec.id.clone(),
            spec.description.clone(),
            CheckStatus::from_verdict(passed),
            output,
            details,
        )
    }

    /// Informational outcome (phase announcements); always passes
    pub fn announce(&self, id: &str, description: &str, output: &str) -> CheckOutcome {
        CheckOutcome::new(id, description, CheckStatus::Pass, output, "")
    }

    /// Failed outcome for a step that could not run
    pub fn unmet(&self, id: &str, description: &str, output: &str, details: &str) -> CheckOutcome {
        CheckOutcome::new(id, description, CheckStatus::Fail, output, details)
    }
}

/// Trim, strip terminal escapes and control characters, and cap the length.
pub fn sanitize_output(raw: &str, limit: usize) -> String {
    let mut cleaned = String::with_capacity(raw.len().min(limit + TRUNCATION_MARKER.len()));
    let mut chars = raw.trim().chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\u{1b}' => {
                // CSI sequences: ESC [ params final-byte
                if chars.peek() == Some(&'[') {
                    chars.next();
                    for next in chars.by_ref() {
                        if ('@'..='~').contains(&next) {
                            break;
                        }
                    }
                }
            }
            '\n' | '\t' => cleaned.push(c),
            c if c.is_control() => {}
            c => cleaned.push(c),
        }
    }

    if cleaned.chars().count() > limit {
        let mut truncated: String = cleaned.chars().take(limit).collect();
        truncated.push_str(TRUNCATION_MARKER);
        truncated
    } else {
        cleaned
    }
}
