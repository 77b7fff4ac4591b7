//! Topology checks.
//!
//! Confirms the emulated network is up, that hosts in the same zone reach
//! each other and that the WAN cannot reach the LAN directly.

use crate::config::ValidatorConfig;
use crate::engine::executor::CheckSpec;
use crate::engine::predicate::Expectation;
use crate::engine::sequencer::Step;
use crate::Concern;

/// Get all topology checks
pub fn get_topology_checks(config: &ValidatorConfig) -> Vec<Step> {
    vec![
        Step::Banner("Topology & Connectivity".to_string()),
        create_t1_1_step(config),
        create_t1_2_check(config),
        create_t1_3_check(config),
    ]
}

/// T1.1: Topology started
fn create_t1_1_step(config: &ValidatorConfig) -> Step {
    Step::Announce {
        id: "T1.1".to_string(),
        description: "Topology started".to_string(),
        output: format!("Topology started with {} endpoints", config.endpoints.len()),
    }
}

/// T1.2: Intra-zone connectivity (WAN)
fn create_t1_2_check(config: &ValidatorConfig) -> Step {
    Step::Check(
        CheckSpec::new(
            "T1.2",
            "Intra-zone connectivity (WAN)",
            Concern::Topology,
            &config.roles.attacker,
            format!("ping -c 1 -W 1 {}", config.addresses.wan_peer),
        )
        .expect(Expectation::contains("1 received")),
    )
}

/// T1.3: Inter-zone isolation (WAN->LAN)
fn create_t1_3_check(config: &ValidatorConfig) -> Step {
    Step::Check(
        CheckSpec::new(
            "T1.3",
            "Inter-zone isolation (WAN->LAN)",
            Concern::Topology,
            &config.roles.attacker,
            format!("ping -c 1 -W 1 {}", config.addresses.lan_host),
        )
        .expect(Expectation::contains("0 received")),
    )
}
