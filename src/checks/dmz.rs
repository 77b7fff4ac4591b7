//! DMZ web service checks.

use crate::config::ValidatorConfig;
use crate::engine::executor::CheckSpec;
use crate::engine::predicate::Expectation;
use crate::engine::sequencer::Step;
use crate::Concern;

/// Get all DMZ checks
pub fn get_dmz_checks(config: &ValidatorConfig) -> Vec<Step> {
    let web = &config.addresses.dmz_web;
    vec![
        Step::Banner("DMZ & Web Services".to_string()),
        // T3.1: HTTPS availability
        Step::Check(
            CheckSpec::new(
                "T3.1",
                "HTTPS availability (200 OK)",
                Concern::Dmz,
                &config.roles.attacker,
                format!("curl -k -I --connect-timeout 2 https://{}", web),
            )
            .expect(Expectation::contains("200 OK")),
        ),
        // T3.2: HTTP redirected to HTTPS
        Step::Check(
            CheckSpec::new(
                "T3.2",
                "HTTP->HTTPS redirect (301)",
                Concern::Dmz,
                &config.roles.attacker,
                format!("curl -I --connect-timeout 2 http://{}", web),
            )
            .expect(Expectation::contains("301 Moved")),
        ),
        // T3.3: a compromised DMZ host must not reach the LAN
        Step::Check(
            CheckSpec::new(
                "T3.3",
                "DMZ->LAN isolation",
                Concern::Dmz,
                &config.roles.edge_server,
                format!("ping -c 1 -W 1 {}", config.addresses.lan_host),
            )
            .expect(Expectation::contains("0 received")),
        ),
    ]
}
