//! CLI module for argument parsing and console rendering.
//!
//! Argument parsing uses `clap` derive; rendering is kept apart from the
//! engine and only ever sees finished outcomes and reports.

pub mod args;
pub mod output;
