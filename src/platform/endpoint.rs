//! Endpoint abstraction.
//!
//! An endpoint is a named network participant that can run a shell-level
//! command and hand back whatever it printed. How the command is dispatched
//! (namespace, container, local shell) is the implementation's business.
//!
//! # Contract
//!
//! - stdout and stderr are merged into a single text blob
//! - A non-zero exit status is not an error; only the text matters
//! - The timeout is enforced by the endpoint; on expiry the partial output
//!   (possibly empty) is returned

use crate::{Result, ValidatorError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Role an endpoint plays in the validated topology
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EndpointRole {
    /// External host on the WAN side generating hostile traffic
    Attacker,
    /// External administrator workstation (VPN client)
    Admin,
    /// Server published in the DMZ
    EdgeServer,
    /// Host on the protected LAN
    InternalHost,
    /// One member of the redundant firewall pair
    FirewallClusterMember,
}

impl fmt::Display for EndpointRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndpointRole::Attacker => write!(f, "attacker"),
            EndpointRole::Admin => write!(f, "admin"),
            EndpointRole::EdgeServer => write!(f, "edge-server"),
            EndpointRole::InternalHost => write!(f, "internal-host"),
            EndpointRole::FirewallClusterMember => write!(f, "firewall-cluster-member"),
        }
    }
}

/// A named participant capable of executing commands.
pub trait Endpoint {
    /// Endpoint name as referenced by the catalogue
    fn name(&self) -> &str;

    /// Role in the topology
    fn role(&self) -> EndpointRole;

    /// Execute `command` and return its merged output, bounded by `timeout`.
    fn execute(&self, command: &str, timeout: Duration) -> String;
}

/// Set of endpoints supplied by the topology, looked up by name.
#[derive(Default)]
pub struct Inventory {
    endpoints: Vec<Box<dyn Endpoint>>,
}

impl Inventory {
    /// Create an empty inventory
    pub fn new() -> Self {
        Inventory {
            endpoints: Vec::new(),
        }
    }

    /// Add an endpoint, replacing any previous one with the same name
    pub fn add(&mut self, endpoint: Box<dyn Endpoint>) {
        self.endpoints.retain(|e| e.name() != endpoint.name());
        self.endpoints.push(endpoint);
    }

    /// Builder-style variant of [`Inventory::add`]
    pub fn with(mut self, endpoint: Box<dyn Endpoint>) -> Self {
        self.add(endpoint);
        self
    }

    /// Look up an endpoint by name
    pub fn get(&self, name: &str) -> Option<&dyn Endpoint> {
        self.endpoints
            .iter()
            .find(|e| e.name() == name)
            .map(|e| e.as_ref())
    }

    /// Look up an endpoint, failing with a configuration error if absent
    pub fn require(&self, name: &str) -> Result<&dyn Endpoint> {
        self.get(name)
            .ok_or_else(|| ValidatorError::Config(format!("unknown endpoint '{}'", name)))
    }

    /// Whether an endpoint with this name exists
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Endpoint names in registration order
    pub fn names(&self) -> Vec<&str> {
        self.endpoints.iter().map(|e| e.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}

impl fmt::Debug for Inventory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Inventory")
            .field("endpoints", &self.names())
            .finish()
    }
}
