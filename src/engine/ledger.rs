//! Result ledger.
//!
//! Append-only, insertion-ordered record of check outcomes keyed by
//! identifier. Serializes as a JSON object whose key order is the execution
//! order, and deserializes back preserving that order.

use crate::engine::timestamp_now;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use tracing::warn;

/// Pass/fail verdict of one check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckStatus {
    #[serde(rename = "PASS")]
    Pass,
    #[serde(rename = "FAIL")]
    Fail,
}

impl CheckStatus {
    pub fn from_verdict(passed: bool) -> Self {
        if passed {
            CheckStatus::Pass
        } else {
            CheckStatus::Fail
        }
    }

    pub fn is_pass(&self) -> bool {
        matches!(self, CheckStatus::Pass)
    }
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckStatus::Pass => write!(f, "PASS"),
            CheckStatus::Fail => write!(f, "FAIL"),
        }
    }
}

/// Outcome of a single check. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckOutcome {
    #[serde(skip)]
    id: String,
    description: String,
    status: CheckStatus,
    timestamp: String,
    command_output: String,
    details: String,
}

impl CheckOutcome {
    /// Create an outcome stamped with the current time.
    ///
    /// Empty output is stored as `"N/A"`.
    pub fn new(
        id: impl Into<String>,
        description: impl Into<String>,
        status: CheckStatus,
        command_output: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        let command_output = command_output.into();
        CheckOutcome {
            id: id.into(),
            description: description.into(),
            status,
            timestamp: timestamp_now(),
            command_output: if command_output.trim().is_empty() {
                "N/A".to_string()
            } else {
                command_output
            },
            details: details.into(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn status(&self) -> CheckStatus {
        self.status
    }

    pub fn passed(&self) -> bool {
        self.status.is_pass()
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn command_output(&self) -> &str {
        &self.command_output
    }

    pub fn details(&self) -> &str {
        &self.details
    }
}

/// Ordered mapping from identifier to outcome.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ledger {
    entries: Vec<CheckOutcome>,
}

impl Ledger {
    pub fn new() -> Self {
        Ledger {
            entries: Vec::new(),
        }
    }

    /// Append an outcome.
    ///
    /// Identifiers are expected to be unique within a run. A reused
    /// identifier replaces the stored outcome in place (last write wins) and
    /// the replaced outcome is returned.
    pub fn record(&mut self, outcome: CheckOutcome) -> Option<CheckOutcome> {
        match self.entries.iter_mut().find(|e| e.id == outcome.id) {
            Some(existing) => {
                warn!(id = %outcome.id, "check identifier recorded twice, keeping the latest outcome");
                Some(std::mem::replace(existing, outcome))
            }
            None => {
                self.entries.push(outcome);
                None
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&CheckOutcome> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Outcomes in execution order
    pub fn iter(&self) -> impl Iterator<Item = &CheckOutcome> {
        self.entries.iter()
    }

    /// Identifiers in execution order
    pub fn ids(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.id.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn passed(&self) -> usize {
        self.entries.iter().filter(|e| e.passed()).count()
    }

    pub fn failed(&self) -> usize {
        self.len() - self.passed()
    }

    /// Failed outcomes in execution order
    pub fn failures(&self) -> Vec<&CheckOutcome> {
        self.entries.iter().filter(|e| !e.passed()).collect()
    }
}

impl Serialize for Ledger {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for entry in &self.entries {
            map.serialize_entry(&entry.id, entry)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Ledger {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct LedgerVisitor;

        impl<'de> Visitor<'de> for LedgerVisitor {
            type Value = Ledger;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "a map of check identifiers to outcomes")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Ledger, A::Error> {
                let mut ledger = Ledger::new();
                while let Some((id, mut outcome)) = access.next_entry::<String, CheckOutcome>()? {
                    outcome.id = id;
                    ledger.record(outcome);
                }
                Ok(ledger)
            }
        }

        deserializer.deserialize_map(LedgerVisitor)
    }
}
