//! Firewall and segmentation checks.
//!
//! T2.1 probes an unused LAN port: a DROP policy answers with nothing at
//! all, so silence counts as success there.

use crate::config::ValidatorConfig;
use crate::engine::executor::CheckSpec;
use crate::engine::predicate::Expectation;
use crate::engine::sequencer::Step;
use crate::Concern;

/// Get all firewall checks
pub fn get_firewall_checks(config: &ValidatorConfig) -> Vec<Step> {
    vec![
        Step::Banner("Firewall & Segmentation".to_string()),
        create_t2_1_check(config),
        Step::Check(web_reachable_check("T2.2", "Authorized WAN->DMZ access (HTTP)", config)),
        create_t2_3_check(config),
    ]
}

/// T2.1: Default policy (DROP)
fn create_t2_1_check(config: &ValidatorConfig) -> Step {
    Step::Check(
        CheckSpec::new(
            "T2.1",
            "Default policy (DROP)",
            Concern::Firewall,
            &config.roles.attacker,
            format!("nc -zv -w 1 {} 12345", config.addresses.lan_host),
        )
        .expect(Expectation::not_contains("succeeded"))
        .expect_silence(),
    )
}

/// Plain HTTP request from the attacker to the DMZ web server.
///
/// Shared by T2.2 and the continuity step of the failover scenario.
pub fn web_reachable_check(id: &str, description: &str, config: &ValidatorConfig) -> CheckSpec {
    CheckSpec::new(
        id,
        description,
        Concern::from_identifier(id),
        &config.roles.attacker,
        format!("curl -I --connect-timeout 2 http://{}", config.addresses.dmz_web),
    )
    .expect(Expectation::contains("HTTP"))
}

/// T2.3: WAN->LAN denied (port filtered)
fn create_t2_3_check(config: &ValidatorConfig) -> Step {
    Step::Check(
        CheckSpec::new(
            "T2.3",
            "WAN->LAN denied (port filtered)",
            Concern::Firewall,
            &config.roles.attacker,
            format!("nmap -Pn -p 22 --max-retries 1 {}", config.addresses.lan_host),
        )
        .expect(Expectation::contains("filtered")),
    )
}
