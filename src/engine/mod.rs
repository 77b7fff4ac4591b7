//! Validation engine module.
//!
//! Provides predicate evaluation, check execution, sequencing, the result
//! ledger and report generation.

pub mod executor;
pub mod ledger;
pub mod poll;
pub mod predicate;
pub mod report;
pub mod sequencer;

/// Current local time as an ISO-8601 string with millisecond precision
pub fn timestamp_now() -> String {
    chrono::Local::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, false)
}
