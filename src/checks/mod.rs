//! Validation catalogue.
//!
//! Checks are organized by concern and executed in this order:
//! - Topology: reachability inside a zone, isolation between zones
//! - Firewall: default DROP policy and authorized flows
//! - DMZ: published web service and redirection
//! - Encryption: TLS certificate presentation
//! - Intrusion: IDS signatures for synthetic attack traffic
//! - VPN: SSH refused outside the tunnel, tunnel establishment
//! - High availability: firewall cluster failover
//!
//! # Graceful Degradation
//!
//! Every entry is declarative. Nothing here executes commands; the
//! sequencer turns entries into outcomes and a failed entry never
//! prevents later independent entries from running.

pub mod dmz;
pub mod encryption;
pub mod firewall;
pub mod ha;
pub mod ids;
pub mod topology;
pub mod vpn;

use crate::config::ValidatorConfig;
use crate::engine::sequencer::Step;
use crate::Concern;

/// Concerns in execution order. Intrusion detection runs before the VPN
/// phase and failover always runs last.
pub const EXECUTION_ORDER: [Concern; 7] = [
    Concern::Topology,
    Concern::Firewall,
    Concern::Dmz,
    Concern::Encryption,
    Concern::Intrusion,
    Concern::Vpn,
    Concern::HighAvailability,
];

/// Full catalogue in execution order
pub fn catalogue(config: &ValidatorConfig) -> Vec<Step> {
    EXECUTION_ORDER
        .iter()
        .flat_map(|&concern| get_checks_by_concern(config, concern))
        .collect()
}

/// Catalogue steps belonging to one concern
pub fn get_checks_by_concern(config: &ValidatorConfig, concern: Concern) -> Vec<Step> {
    match concern {
        Concern::Topology => topology::get_topology_checks(config),
        Concern::Firewall => firewall::get_firewall_checks(config),
        Concern::Dmz => dmz::get_dmz_checks(config),
        Concern::Encryption => encryption::get_encryption_checks(config),
        Concern::Intrusion => ids::get_ids_checks(config),
        Concern::Vpn => vpn::get_vpn_checks(config),
        Concern::HighAvailability => ha::get_ha_checks(config),
    }
}

/// One line of the catalogue listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    pub id: String,
    pub description: String,
    pub endpoint: String,
    pub command: String,
}

/// Flatten the catalogue for display (`list` subcommand)
pub fn listing(steps: &[Step]) -> Vec<ListingEntry> {
    let mut entries = Vec::new();
    for step in steps {
        match step {
            Step::Banner(_) => {}
            Step::Announce { id, description, .. } => entries.push(ListingEntry {
                id: id.clone(),
                description: description.clone(),
                endpoint: "-".to_string(),
                command: "(informational)".to_string(),
            }),
            Step::Check(spec) => entries.push(ListingEntry {
                id: spec.id.clone(),
                description: spec.description.clone(),
                endpoint: spec.endpoint.clone(),
                command: spec.command.clone(),
            }),
            Step::Fire {
                endpoint,
                command,
                note,
            } => entries.push(ListingEntry {
                id: "-".to_string(),
                description: note.clone(),
                endpoint: endpoint.clone(),
                command: command.clone(),
            }),
            Step::Failover(spec) => entries.extend(spec.listing()),
        }
    }
    entries
}
