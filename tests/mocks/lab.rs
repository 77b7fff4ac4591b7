//! Mock lab configuration.
//!
//! Describes the observable behavior of every endpoint in the reference
//! topology and builds a scripted inventory from it.

use super::endpoint::{CallLog, ScriptedEndpoint};
use infra_validator::config::ValidatorConfig;
use infra_validator::engine::poll::PollPolicy;
use infra_validator::platform::endpoint::{EndpointRole, Inventory};
use std::collections::HashMap;
use std::time::Duration;

pub const PING_OK: &str = "1 packets transmitted, 1 received, 0% packet loss, time 0ms";
pub const PING_LOST: &str = "1 packets transmitted, 0 received, 100% packet loss, time 0ms";
pub const HTTP_REDIRECT: &str = "HTTP/1.1 301 Moved Permanently\r\nServer: nginx\r\nLocation: https://10.0.1.10/";
pub const HTTPS_OK: &str = "HTTP/1.1 200 OK\r\nServer: nginx\r\nContent-Type: text/html";
pub const CURL_TIMEOUT: &str = "curl: (28) Connection timed out after 2001 milliseconds";
pub const NO_TUNNEL: &str = "Device \"tun0\" does not exist.";
pub const TUNNEL_UP: &str = "7: tun0: <POINTOPOINT,MULTICAST,NOARP,UP,LOWER_UP> mtu 1500 qdisc fq_codel state UNKNOWN\n    inet 10.8.0.2/24 scope global tun0";
pub const SCAN_ALERT: &str = "12/01-10:00:01.000000  [**] [1:1000001:1] Scan Nmap [**] [Priority: 0] {TCP} 10.0.0.10:51234 -> 10.0.1.10:80";
pub const PING_ALERT: &str = "12/01-10:00:02.000000  [**] [1:1000002:1] Ping Detecte [**] [Priority: 0] {ICMP} 10.0.0.10 -> 10.0.1.10";

/// Answer of the DROP policy probe
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DropBehavior {
    /// No answer at all within the bound
    Silent,
    /// Rejected with a RST
    Refused,
    /// Connection established
    Open,
}

/// Which firewall member holds the virtual address at the start
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClusterState {
    Fw1Leads,
    Fw2Leads,
    NoLeader,
    SplitBrain,
}

/// Mock lab configuration
#[derive(Debug, Clone)]
pub struct MockLab {
    pub wan_reachable: bool,
    pub zones_isolated: bool,
    pub drop_behavior: DropBehavior,
    pub http_redirects: bool,
    pub https_ok: bool,
    pub certificate: bool,
    pub scan_alert: bool,
    pub ping_alert: bool,
    /// Empty alert log lookups before the alerts show up
    pub alert_delay: usize,
    pub ssh_open: bool,
    /// Tunnel checks failing before tun0 appears (None: never)
    pub tunnel_after: Option<usize>,
    pub cluster: ClusterState,
    pub pid_present: bool,
    /// Standby listings without the address before takeover (None: never)
    pub takeover_after: Option<usize>,
    pub service_after_failover: bool,
}

impl Default for MockLab {
    fn default() -> Self {
        Self::healthy()
    }
}

impl MockLab {
    /// Every check passes
    pub fn healthy() -> Self {
        MockLab {
            wan_reachable: true,
            zones_isolated: true,
            drop_behavior: DropBehavior::Silent,
            http_redirects: true,
            https_ok: true,
            certificate: true,
            scan_alert: true,
            ping_alert: true,
            alert_delay: 1,
            ssh_open: false,
            tunnel_after: Some(2),
            cluster: ClusterState::Fw1Leads,
            pid_present: true,
            takeover_after: Some(1),
            service_after_failover: true,
        }
    }

    /// Configuration for the reference lab with short settle policies
    pub fn config() -> ValidatorConfig {
        let fast = PollPolicy::new(Duration::from_millis(300), Duration::from_millis(1));
        let mut config = ValidatorConfig::default();
        config.settle.ids = fast;
        config.settle.tunnel = fast;
        config.settle.failover = fast;
        config
    }

    /// Scripted inventory plus the call log of every endpoint
    pub fn build(&self) -> (Inventory, HashMap<String, CallLog>) {
        let endpoints = vec![
            self.attacker(),
            self.admin(),
            self.web1(),
            ScriptedEndpoint::new("internal", EndpointRole::InternalHost),
            self.cluster_member("fw1", 0),
            self.cluster_member("fw2", 1),
        ];

        let mut logs = HashMap::new();
        let mut inventory = Inventory::new();
        for endpoint in endpoints {
            logs.insert(
                infra_validator::platform::endpoint::Endpoint::name(&endpoint).to_string(),
                endpoint.call_log(),
            );
            inventory.add(Box::new(endpoint));
        }
        (inventory, logs)
    }

    pub fn inventory(&self) -> Inventory {
        self.build().0
    }

    fn lan_ping(&self) -> &'static str {
        if self.zones_isolated {
            PING_LOST
        } else {
            PING_OK
        }
    }

    fn attacker(&self) -> ScriptedEndpoint {
        let http = if self.http_redirects {
            HTTP_REDIRECT
        } else {
            "HTTP/1.1 200 OK\r\nServer: nginx"
        };
        let continuity = if self.service_after_failover {
            http
        } else {
            CURL_TIMEOUT
        };
        let nc = match self.drop_behavior {
            DropBehavior::Silent => "",
            DropBehavior::Refused => "nc: connect to 10.0.2.10 port 12345 (tcp) failed: Connection refused",
            DropBehavior::Open => "Connection to 10.0.2.10 12345 port [tcp/*] succeeded!",
        };
        let nmap = if self.zones_isolated {
            "PORT   STATE    SERVICE\n22/tcp filtered ssh"
        } else {
            "PORT   STATE SERVICE\n22/tcp open  ssh"
        };
        let certificate = if self.certificate {
            format!(
                "CONNECTED(00000003)\nServer certificate\n-----BEGIN CERTIFICATE-----\n{}\n-----END CERTIFICATE-----",
                "MIIDazCCAlOgAwIBAgIUJ".repeat(40)
            )
        } else {
            "connect: Connection refused\nconnect:errno=111".to_string()
        };

        ScriptedEndpoint::new("attacker", EndpointRole::Attacker)
            .on("ping -c 1 -W 1 10.0.0.20", if self.wan_reachable { PING_OK } else { PING_LOST })
            .on("ping -c 1 -W 1 10.0.2.10", self.lan_ping())
            .on("nc -zv", nc)
            .on("curl -k -I", if self.https_ok { HTTPS_OK } else { CURL_TIMEOUT })
            // T2.2, T3.2, then the continuity check after failover
            .on_seq("curl -I", &[http, http, continuity])
            .on("nmap -Pn -p 22", nmap)
            .on("openssl s_client", &certificate)
            .on("nmap -sS", "Nmap done: 1 IP address (1 host up) scanned")
            .on("ping -c 2", "2 packets transmitted, 2 received")
    }

    fn admin(&self) -> ScriptedEndpoint {
        let ssh = if self.ssh_open {
            "Welcome to Ubuntu 22.04 LTS"
        } else {
            ""
        };
        let mut tunnel: Vec<&str> = Vec::new();
        match self.tunnel_after {
            Some(n) => {
                tunnel.extend(std::iter::repeat(NO_TUNNEL).take(n));
                tunnel.push(TUNNEL_UP);
            }
            None => tunnel.push(NO_TUNNEL),
        }
        let tunnel_ping = if self.tunnel_after.is_some() {
            PING_OK
        } else {
            "ping: connect: Network is unreachable"
        };

        ScriptedEndpoint::new("admin", EndpointRole::Admin)
            .on("timeout 2 ssh", ssh)
            .on("openvpn --config", "")
            .on_seq("ip addr show tun0", &tunnel)
            .on("ping -c 1 -W 1 10.8.0.1", tunnel_ping)
    }

    fn web1(&self) -> ScriptedEndpoint {
        ScriptedEndpoint::new("web1", EndpointRole::EdgeServer).on("ping -c 1 -W 1 10.0.2.10", self.lan_ping())
    }

    fn cluster_member(&self, name: &str, index: usize) -> ScriptedEndpoint {
        let holds = format!(
            "2: {0}-eth0: <BROADCAST,MULTICAST,UP,LOWER_UP> mtu 1500\n    inet 10.0.0.{1}/24 scope global {0}-eth0\n    inet 10.0.0.1/24 scope global secondary {0}-eth0",
            name,
            index + 2
        );
        let lacks = format!(
            "2: {0}-eth0: <BROADCAST,MULTICAST,UP,LOWER_UP> mtu 1500\n    inet 10.0.0.{1}/24 scope global {0}-eth0",
            name,
            index + 2
        );

        let leads = match self.cluster {
            ClusterState::Fw1Leads => index == 0,
            ClusterState::Fw2Leads => index == 1,
            ClusterState::NoLeader => false,
            ClusterState::SplitBrain => true,
        };

        // First listing is leader detection, later ones are takeover polling
        let mut listings: Vec<&str> = Vec::new();
        if leads {
            listings.push(&holds);
        } else {
            listings.push(&lacks);
            match self.takeover_after {
                Some(n) => {
                    listings.extend(std::iter::repeat(lacks.as_str()).take(n));
                    listings.push(&holds);
                }
                None => listings.push(&lacks),
            }
        }

        let pid_file = format!("/run/keepalived_{}.pid", name);
        let pid = if self.pid_present {
            "4242\n".to_string()
        } else {
            format!("cat: {}: No such file or directory", pid_file)
        };

        let mut endpoint = ScriptedEndpoint::new(name, EndpointRole::FirewallClusterMember)
            .on(&format!("cat {}", pid_file), &pid)
            .on("kill ", "");

        if index == 0 {
            let delay = std::iter::repeat("").take(self.alert_delay);
            let scan: Vec<&str> = if self.scan_alert {
                delay.clone().chain(std::iter::once(SCAN_ALERT)).collect()
            } else {
                vec![""]
            };
            let ping: Vec<&str> = if self.ping_alert {
                delay.chain(std::iter::once(PING_ALERT)).collect()
            } else {
                vec![""]
            };
            endpoint = endpoint
                .on_seq("grep 'Scan Nmap'", &scan)
                .on_seq("grep 'Ping Detecte'", &ping);
        }

        endpoint.on_seq("ip addr show", &listings)
    }
}
