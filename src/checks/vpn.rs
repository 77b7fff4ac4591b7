//! VPN and secure administration checks.
//!
//! SSH to the LAN must be refused before the tunnel exists. The VPN client is
//! then started as a daemon and the tunnel interface is polled for under the
//! `settle.tunnel` policy before the gateway is pinged through it.

use crate::config::ValidatorConfig;
use crate::engine::executor::CheckSpec;
use crate::engine::predicate::Expectation;
use crate::engine::sequencer::Step;
use crate::Concern;

/// Tunnel interface created by the VPN client
pub const TUNNEL_INTERFACE: &str = "tun0";

/// Get all VPN checks
pub fn get_vpn_checks(config: &ValidatorConfig) -> Vec<Step> {
    let admin = &config.roles.admin;
    vec![
        Step::Banner("VPN & Secure Administration".to_string()),
        // T5.1: a DROP yields no banner at all, which is the expected result
        Step::Check(
            CheckSpec::new(
                "T5.1",
                "SSH refused without VPN",
                Concern::Vpn,
                admin,
                format!(
                    "timeout 2 ssh -o StrictHostKeyChecking=no root@{}",
                    config.addresses.lan_host
                ),
            )
            .expect(Expectation::not_contains("Welcome"))
            .expect_silence(),
        ),
        Step::Fire {
            endpoint: admin.clone(),
            command: format!("openvpn --config {} --daemon", config.paths.vpn_client_config),
            note: "Starting VPN client".to_string(),
        },
        // T5.2: "Device \"tun0\" does not exist." also names the interface,
        // so match the listing header instead
        Step::Check(
            CheckSpec::new(
                "T5.2",
                format!("Tunnel interface ({}) up", TUNNEL_INTERFACE),
                Concern::Vpn,
                admin,
                format!("ip addr show {}", TUNNEL_INTERFACE),
            )
            .expect(Expectation::contains(format!("{}:", TUNNEL_INTERFACE)))
            .polled(config.settle.tunnel),
        ),
        Step::Check(
            CheckSpec::new(
                "T5.3",
                "Tunnel connectivity",
                Concern::Vpn,
                admin,
                format!("ping -c 1 -W 1 {}", config.addresses.vpn_gateway),
            )
            .expect(Expectation::contains("1 received")),
        ),
    ]
}
