//! infra-validator library
//!
//! Checklist-driven validation of a segmented network infrastructure
//! (WAN / DMZ / LAN behind a redundant firewall pair).
//!
//! This library provides:
//! - An endpoint abstraction for running commands on named hosts
//! - Substring predicates over captured command output
//! - The ordered validation catalogue (topology, firewall, DMZ, TLS, IDS, VPN)
//! - The high-availability failover scenario
//! - An insertion-ordered result ledger and the JSON report artifact
//!
//! # Example
//!
//! ```no_run
//! use infra_validator::config::ValidatorConfig;
//! use infra_validator::engine::report::Report;
//! use infra_validator::engine::sequencer::Silent;
//! use infra_validator::run_validation;
//!
//! let config = ValidatorConfig::default();
//! let inventory = config.build_inventory();
//! let ledger = run_validation(&config, &inventory, &mut Silent).expect("invalid catalogue");
//! let report = Report::generate(&config.project, ledger);
//! println!("Score: {}", report.score());
//! ```

pub mod checks;
pub mod cli;
pub mod config;
pub mod engine;
pub mod platform;
pub mod version;

use config::ValidatorConfig;
use engine::ledger::Ledger;
use engine::sequencer::{validate_catalogue, Progress, Sequencer};
use platform::endpoint::Inventory;
use std::fmt;
use std::path::PathBuf;

// Re-exports for public API
pub use engine::ledger::{CheckOutcome, CheckStatus};
pub use engine::report::{Report, Score};

/// Concern a check belongs to, used for grouping in listings and exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Concern {
    /// Reachability inside a zone and isolation between zones
    Topology,
    /// Default-deny policy and authorized cross-zone flows
    Firewall,
    /// Services published in the DMZ
    Dmz,
    /// TLS availability and certificate presence
    Encryption,
    /// Secure administrative access through the VPN tunnel
    Vpn,
    /// Intrusion detection alerts
    Intrusion,
    /// Firewall cluster failover
    HighAvailability,
}

impl Concern {
    /// Derive the concern from a check identifier such as `"T7.1"`.
    ///
    /// Identifiers outside the catalogue numbering fall back to `Topology`.
    pub fn from_identifier(id: &str) -> Self {
        let major = id
            .strip_prefix('T')
            .and_then(|rest| rest.split('.').next())
            .and_then(|n| n.parse::<u32>().ok());

        match major {
            Some(2) => Concern::Firewall,
            Some(3) => Concern::Dmz,
            Some(4) => Concern::Encryption,
            Some(5) | Some(6) => Concern::Vpn,
            Some(7) => Concern::Intrusion,
            Some(9) => Concern::HighAvailability,
            _ => Concern::Topology,
        }
    }

    /// Short machine-friendly name (JUnit suite names)
    pub fn slug(&self) -> &'static str {
        match self {
            Concern::Topology => "topology",
            Concern::Firewall => "firewall",
            Concern::Dmz => "dmz",
            Concern::Encryption => "encryption",
            Concern::Vpn => "vpn",
            Concern::Intrusion => "intrusion",
            Concern::HighAvailability => "high-availability",
        }
    }
}

impl fmt::Display for Concern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Concern::Topology => write!(f, "Topology"),
            Concern::Firewall => write!(f, "Firewall & Segmentation"),
            Concern::Dmz => write!(f, "DMZ & Web Services"),
            Concern::Encryption => write!(f, "Encryption"),
            Concern::Vpn => write!(f, "VPN & Secure Administration"),
            Concern::Intrusion => write!(f, "Intrusion Detection"),
            Concern::HighAvailability => write!(f, "High Availability"),
        }
    }
}

/// Error types for infra-validator operations.
///
/// Check-level problems are never errors: they are recorded as failed
/// outcomes. These variants cover conditions that stop the tool itself.
#[derive(Debug, thiserror::Error)]
pub enum ValidatorError {
    /// Invalid configuration or catalogue
    #[error("configuration error: {0}")]
    Config(String),

    /// A file could not be read
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The report artifact could not be persisted
    #[error("failed to write report {}: {source}", path.display())]
    ReportWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The JUnit export could not be persisted
    #[error("failed to write JUnit export {}: {source}", path.display())]
    ExportWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration file is not valid TOML for the expected schema
    #[error("invalid configuration file: {0}")]
    Toml(#[from] toml::de::Error),

    /// Report (de)serialization failed
    #[error("report serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

impl ValidatorError {
    /// Whether this error concerns persisting or decoding the report artifact
    pub fn is_report_failure(&self) -> bool {
        matches!(self, ValidatorError::ReportWrite { .. } | ValidatorError::Json(_))
    }
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, ValidatorError>;

/// Run the full validation pass.
///
/// Builds the catalogue from `config`, checks it against `inventory`, then
/// executes every step in order. Individual check failures end up in the
/// returned ledger; only an invalid catalogue is reported as an error.
///
/// # Example
///
/// ```no_run
/// use infra_validator::config::ValidatorConfig;
/// use infra_validator::engine::sequencer::Silent;
/// use infra_validator::run_validation;
///
/// let config = ValidatorConfig::default();
/// let inventory = config.build_inventory();
/// match run_validation(&config, &inventory, &mut Silent) {
///     Ok(ledger) => println!("{} checks recorded", ledger.len()),
///     Err(e) => eprintln!("Error: {}", e),
/// }
/// ```
pub fn run_validation(
    config: &ValidatorConfig,
    inventory: &Inventory,
    progress: &mut dyn Progress,
) -> Result<Ledger> {
    let steps = checks::catalogue(config);
    validate_catalogue(&steps, inventory)?;

    let mut sequencer = Sequencer::new(inventory, config.executor());
    sequencer.run(&steps, progress);
    Ok(sequencer.into_ledger())
}
