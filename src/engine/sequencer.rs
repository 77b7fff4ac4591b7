//! Test sequencing.
//!
//! Executes catalogue steps strictly in order on the calling thread. Later
//! steps may rely on state established by earlier ones (tunnel up before the
//! tunnel ping, failover last), so the order is never changed.
//!
//! # Graceful Degradation
//!
//! - Unknown endpoint at run time: recorded as a failed outcome
//! - Failed scenario step: dependent steps skipped, independent steps run
//! - Fire-and-forget commands: output logged at debug level, never evaluated
//!
//! The run always completes and always yields a ledger.

use crate::checks::ha::{self, FailoverSpec};
use crate::engine::executor::{CheckExecutor, CheckSpec};
use crate::engine::ledger::{CheckOutcome, Ledger};
use crate::platform::endpoint::Inventory;
use crate::{Result, ValidatorError};
use std::collections::HashSet;
use tracing::{debug, info};

/// One entry of the validation catalogue
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Phase heading, presentation only
    Banner(String),
    /// Informational entry that always passes
    Announce {
        id: String,
        description: String,
        output: String,
    },
    /// Command check, polled when the spec carries a policy
    Check(CheckSpec),
    /// Command whose output is not evaluated (traffic generation, daemon start)
    Fire {
        endpoint: String,
        command: String,
        note: String,
    },
    /// High-availability failover scenario
    Failover(FailoverSpec),
}

impl Step {
    /// Identifiers of the outcomes this step can record
    pub fn identifiers(&self) -> Vec<&str> {
        match self {
            Step::Announce { id, .. } => vec![id.as_str()],
            Step::Check(spec) => vec![spec.id.as_str()],
            Step::Failover(spec) => spec.identifiers(),
            Step::Banner(_) | Step::Fire { .. } => Vec::new(),
        }
    }

    /// Endpoints this step needs
    pub fn endpoints(&self) -> Vec<&str> {
        match self {
            Step::Check(spec) => vec![spec.endpoint.as_str()],
            Step::Fire { endpoint, .. } => vec![endpoint.as_str()],
            Step::Failover(spec) => spec.endpoints(),
            Step::Banner(_) | Step::Announce { .. } => Vec::new(),
        }
    }
}

/// Observer notified as the run progresses
pub trait Progress {
    fn banner(&mut self, _title: &str) {}
    fn info(&mut self, _message: &str) {}
    fn outcome(&mut self, _outcome: &CheckOutcome) {}
}

/// Progress observer that ignores everything
#[derive(Debug, Default, Clone, Copy)]
pub struct Silent;

impl Progress for Silent {}

/// Ledger writer handed to scenario code
pub struct Recorder<'a> {
    ledger: &'a mut Ledger,
    progress: &'a mut dyn Progress,
}

impl<'a> Recorder<'a> {
    pub fn new(ledger: &'a mut Ledger, progress: &'a mut dyn Progress) -> Self {
        Recorder { ledger, progress }
    }

    /// Append an outcome and report it
    pub fn record(&mut self, outcome: CheckOutcome) {
        self.progress.outcome(&outcome);
        self.ledger.record(outcome);
    }

    pub fn info(&mut self, message: &str) {
        info!("{}", message);
        self.progress.info(message);
    }
}

/// Drives the catalogue against an inventory
pub struct Sequencer<'a> {
    inventory: &'a Inventory,
    executor: CheckExecutor,
    ledger: Ledger,
}

impl<'a> Sequencer<'a> {
    pub fn new(inventory: &'a Inventory, executor: CheckExecutor) -> Self {
        Sequencer {
            inventory,
            executor,
            ledger: Ledger::new(),
        }
    }

    /// Execute `steps` in order
    pub fn run(&mut self, steps: &[Step], progress: &mut dyn Progress) -> &Ledger {
        for step in steps {
            self.run_step(step, progress);
        }
        &self.ledger
    }

    fn run_step(&mut self, step: &Step, progress: &mut dyn Progress) {
        let inventory = self.inventory;
        let executor = &self.executor;
        let mut recorder = Recorder::new(&mut self.ledger, progress);

        match step {
            Step::Banner(title) => {
                info!(phase = %title, "entering phase");
                recorder.progress.banner(title);
            }
            Step::Announce {
                id,
                description,
                output,
            } => {
                recorder.record(executor.announce(id, description, output));
            }
            Step::Check(spec) => {
                recorder.record(executor.run_in(inventory, spec));
            }
            Step::Fire {
                endpoint,
                command,
                note,
            } => {
                recorder.info(note);
                match inventory.get(endpoint) {
                    Some(e) => {
                        let output = executor.dispatch(e, command);
                        debug!(endpoint = %endpoint, %command, output_len = output.len(), "fire-and-forget command done");
                    }
                    None => recorder.info(&format!("endpoint '{}' not in inventory, skipped", endpoint)),
                }
            }
            Step::Failover(spec) => {
                ha::run(spec, inventory, executor, &mut recorder);
            }
        }
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn into_ledger(self) -> Ledger {
        self.ledger
    }
}

/// Reject catalogues with reused identifiers, unknown endpoints or
/// command checks carrying no expectation.
pub fn validate_catalogue(steps: &[Step], inventory: &Inventory) -> Result<()> {
    let mut seen = HashSet::new();
    for step in steps {
        if let Step::Check(spec) = step {
            if spec.expectation.is_informational() {
                return Err(ValidatorError::Config(format!(
                    "check '{}' has no expectation and would always pass",
                    spec.id
                )));
            }
        }
        for id in step.identifiers() {
            if !seen.insert(id) {
                return Err(ValidatorError::Config(format!(
                    "check identifier '{}' is used more than once",
                    id
                )));
            }
        }
        for endpoint in step.endpoints() {
            if !inventory.contains(endpoint) {
                return Err(ValidatorError::Config(format!(
                    "step references unknown endpoint '{}'",
                    endpoint
                )));
            }
        }
    }
    Ok(())
}
