//! Validator configuration.
//!
//! Loaded from an optional TOML file. Every field has a default matching the
//! reference lab (WAN 10.0.0.0/24, DMZ 10.0.1.0/24, LAN 10.0.2.0/24, VRRP
//! virtual address 10.0.0.1, VPN subnet 10.8.0.0/24), so an empty file or no
//! file at all describes that lab.
//!
//! ```toml
//! project = "Infra Reseau Securisee"
//! report_path = "rapport_validation.json"
//! command_timeout_secs = 10
//! launcher = ["ip", "netns", "exec", "{name}"]
//!
//! [addresses]
//! vip = "10.0.0.1"
//!
//! [settle.failover]
//! timeout_ms = 15000
//! interval_ms = 500
//!
//! [[endpoints]]
//! name = "fw1"
//! role = "firewall-cluster-member"
//! ```

use crate::engine::executor::CheckExecutor;
use crate::engine::poll::PollPolicy;
use crate::platform::endpoint::{EndpointRole, Inventory};
use crate::platform::shell::ShellEndpoint;
use crate::{Result, ValidatorError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ValidatorConfig {
    /// Project name written into the report metadata
    pub project: String,
    /// Where the JSON report is written
    pub report_path: PathBuf,
    /// Upper bound for any single command
    pub command_timeout_secs: u64,
    /// Default stored output limit, in characters
    pub output_limit: usize,
    /// Default launcher argv prefix for endpoints (`{name}` is substituted)
    pub launcher: Vec<String>,
    pub addresses: Addresses,
    pub roles: Roles,
    pub paths: Paths,
    pub settle: Settle,
    pub endpoints: Vec<EndpointConfig>,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        ValidatorConfig {
            project: "Infra Reseau Securisee".to_string(),
            report_path: PathBuf::from("rapport_validation.json"),
            command_timeout_secs: 10,
            output_limit: 4096,
            launcher: vec![
                "ip".to_string(),
                "netns".to_string(),
                "exec".to_string(),
                "{name}".to_string(),
            ],
            addresses: Addresses::default(),
            roles: Roles::default(),
            paths: Paths::default(),
            settle: Settle::default(),
            endpoints: default_endpoints(),
        }
    }
}

/// Addresses probed by the catalogue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Addresses {
    /// Another host in the attacker's own zone (WAN)
    pub wan_peer: String,
    /// Host on the protected LAN
    pub lan_host: String,
    /// Web server in the DMZ
    pub dmz_web: String,
    /// Virtual address shared by the firewall pair
    pub vip: String,
    /// VPN server address inside the tunnel
    pub vpn_gateway: String,
}

impl Default for Addresses {
    fn default() -> Self {
        Addresses {
            wan_peer: "10.0.0.20".to_string(),
            lan_host: "10.0.2.10".to_string(),
            dmz_web: "10.0.1.10".to_string(),
            vip: "10.0.0.1".to_string(),
            vpn_gateway: "10.8.0.1".to_string(),
        }
    }
}

/// Which endpoint plays which part in the catalogue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Roles {
    pub attacker: String,
    pub admin: String,
    pub edge_server: String,
    /// Endpoint hosting the intrusion detection log
    pub ids_sensor: String,
    /// The two redundant firewall members
    pub cluster: [String; 2],
}

impl Default for Roles {
    fn default() -> Self {
        Roles {
            attacker: "attacker".to_string(),
            admin: "admin".to_string(),
            edge_server: "web1".to_string(),
            ids_sensor: "fw1".to_string(),
            cluster: ["fw1".to_string(), "fw2".to_string()],
        }
    }
}

/// Files consulted on the endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Paths {
    /// Fast-alert log of the IDS
    pub ids_log: String,
    /// OpenVPN client configuration on the admin endpoint
    pub vpn_client_config: String,
    /// VRRP daemon pid file, `{member}` replaced by the member name
    pub pid_file_template: String,
}

impl Default for Paths {
    fn default() -> Self {
        Paths {
            ids_log: "/var/log/snort/snort.alert.fast".to_string(),
            vpn_client_config: "/home/server/admin.ovpn".to_string(),
            pid_file_template: "/run/keepalived_{member}.pid".to_string(),
        }
    }
}

/// Polling policies for conditions reached asynchronously
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settle {
    /// IDS alert flushed to the log
    pub ids: PollPolicy,
    /// Tunnel interface present after the VPN client starts
    pub tunnel: PollPolicy,
    /// Virtual address moved to the standby member
    pub failover: PollPolicy,
}

impl Default for Settle {
    fn default() -> Self {
        Settle {
            ids: PollPolicy::new(Duration::from_secs(10), Duration::from_millis(500)),
            tunnel: PollPolicy::new(Duration::from_secs(15), Duration::from_millis(500)),
            failover: PollPolicy::new(Duration::from_secs(15), Duration::from_millis(500)),
        }
    }
}

/// One endpoint of the topology
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EndpointConfig {
    pub name: String,
    pub role: EndpointRole,
    /// Overrides the top-level launcher
    #[serde(default)]
    pub launcher: Option<Vec<String>>,
}

impl EndpointConfig {
    pub fn new(name: &str, role: EndpointRole) -> Self {
        EndpointConfig {
            name: name.to_string(),
            role,
            launcher: None,
        }
    }
}

fn default_endpoints() -> Vec<EndpointConfig> {
    vec![
        EndpointConfig::new("attacker", EndpointRole::Attacker),
        EndpointConfig::new("admin", EndpointRole::Admin),
        EndpointConfig::new("web1", EndpointRole::EdgeServer),
        EndpointConfig::new("internal", EndpointRole::InternalHost),
        EndpointConfig::new("fw1", EndpointRole::FirewallClusterMember),
        EndpointConfig::new("fw2", EndpointRole::FirewallClusterMember),
    ]
}

impl ValidatorConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| ValidatorError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }

    /// Executor configured with this timeout and output limit
    pub fn executor(&self) -> CheckExecutor {
        CheckExecutor::new(self.command_timeout(), self.output_limit)
    }

    fn endpoint(&self, name: &str) -> Option<&EndpointConfig> {
        self.endpoints.iter().find(|e| e.name == name)
    }

    /// Check role assignments against the endpoint list
    pub fn validate(&self) -> Result<()> {
        if self.command_timeout_secs == 0 {
            return Err(ValidatorError::Config(
                "command_timeout_secs must be greater than zero".to_string(),
            ));
        }

        let mut names = std::collections::HashSet::new();
        for endpoint in &self.endpoints {
            if !names.insert(endpoint.name.as_str()) {
                return Err(ValidatorError::Config(format!(
                    "endpoint '{}' is declared more than once",
                    endpoint.name
                )));
            }
        }

        let expectations = [
            ("attacker", &self.roles.attacker, Some(EndpointRole::Attacker)),
            ("admin", &self.roles.admin, Some(EndpointRole::Admin)),
            ("edge_server", &self.roles.edge_server, Some(EndpointRole::EdgeServer)),
            ("ids_sensor", &self.roles.ids_sensor, None),
            ("cluster[0]", &self.roles.cluster[0], Some(EndpointRole::FirewallClusterMember)),
            ("cluster[1]", &self.roles.cluster[1], Some(EndpointRole::FirewallClusterMember)),
        ];

        for (slot, name, role) in expectations {
            let endpoint = self.endpoint(name).ok_or_else(|| {
                ValidatorError::Config(format!("roles.{} names unknown endpoint '{}'", slot, name))
            })?;
            if let Some(role) = role {
                if endpoint.role != role {
                    return Err(ValidatorError::Config(format!(
                        "roles.{}: endpoint '{}' has role {}, expected {}",
                        slot, name, endpoint.role, role
                    )));
                }
            }
        }

        if self.roles.cluster[0] == self.roles.cluster[1] {
            return Err(ValidatorError::Config(
                "roles.cluster must name two distinct endpoints".to_string(),
            ));
        }

        if !self.paths.pid_file_template.contains("{member}") {
            tracing::warn!(
                template = %self.paths.pid_file_template,
                "pid file template has no {{member}} placeholder, both members share one file"
            );
        }

        Ok(())
    }

    /// Build process-backed endpoints for every configured endpoint
    pub fn build_inventory(&self) -> Inventory {
        let mut inventory = Inventory::new();
        for endpoint in &self.endpoints {
            let launcher = endpoint
                .launcher
                .clone()
                .unwrap_or_else(|| self.launcher.clone());
            inventory.add(Box::new(ShellEndpoint::new(
                endpoint.name.clone(),
                endpoint.role,
                launcher,
            )));
        }
        inventory
    }
}
