//! Intrusion detection checks.
//!
//! Synthetic traffic (a SYN scan and an ICMP probe) is sent from the
//! attacker toward the web server, then each signature is looked up in the
//! tail of the IDS alert log. The log is flushed asynchronously, so both
//! lookups poll under the `settle.ids` policy. A missing alert for one
//! signature does not affect the other.

use crate::config::ValidatorConfig;
use crate::engine::executor::CheckSpec;
use crate::engine::predicate::Expectation;
use crate::engine::sequencer::Step;
use crate::Concern;

/// Alert message of the port scan rule
pub const SCAN_SIGNATURE: &str = "Scan Nmap";

/// Alert message of the ICMP rule
pub const PING_SIGNATURE: &str = "Ping Detecte";

/// Get all intrusion detection checks
pub fn get_ids_checks(config: &ValidatorConfig) -> Vec<Step> {
    let web = &config.addresses.dmz_web;
    vec![
        Step::Banner("Intrusion Detection".to_string()),
        Step::Fire {
            endpoint: config.roles.attacker.clone(),
            command: format!("nmap -sS -p 80 {}", web),
            note: "Generating port scan traffic".to_string(),
        },
        Step::Fire {
            endpoint: config.roles.attacker.clone(),
            command: format!("ping -c 2 {}", web),
            note: "Generating ICMP probe traffic".to_string(),
        },
        signature_check("T7.1", "IDS: port scan detected", SCAN_SIGNATURE, config),
        signature_check("T7.3", "IDS: suspicious traffic detected", PING_SIGNATURE, config),
    ]
}

fn signature_check(id: &str, description: &str, signature: &str, config: &ValidatorConfig) -> Step {
    Step::Check(
        CheckSpec::new(
            id,
            description,
            Concern::Intrusion,
            &config.roles.ids_sensor,
            format!("grep '{}' {} | tail -n 2", signature, config.paths.ids_log),
        )
        .expect(Expectation::contains(signature))
        .polled(config.settle.ids),
    )
}
