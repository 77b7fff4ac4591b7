//! TLS checks.

use crate::config::ValidatorConfig;
use crate::engine::executor::CheckSpec;
use crate::engine::predicate::Expectation;
use crate::engine::sequencer::Step;
use crate::Concern;

/// Stored output limit for the certificate dump
pub const CERTIFICATE_OUTPUT_LIMIT: usize = 500;

/// Get all encryption checks
pub fn get_encryption_checks(config: &ValidatorConfig) -> Vec<Step> {
    vec![
        Step::Banner("Encryption".to_string()),
        Step::Check(
            CheckSpec::new(
                "T4.1",
                "TLS certificate present",
                Concern::Encryption,
                &config.roles.attacker,
                format!("echo | openssl s_client -connect {}:443", config.addresses.dmz_web),
            )
            .expect(Expectation::contains("BEGIN CERTIFICATE"))
            .limit_output(CERTIFICATE_OUTPUT_LIMIT),
        ),
    ]
}
