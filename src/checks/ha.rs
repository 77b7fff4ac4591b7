//! Firewall cluster failover scenario.
//!
//! Runs as a small state machine over the two cluster members:
//!
//! 1. Leader detection: whichever member lists the virtual address
//! 2. Controlled failure: the leader's VRRP daemon is killed by pid
//! 3. Takeover: the standby is polled until it lists the virtual address
//! 4. Continuity: the web service is requested again through the cluster
//!
//! Detection is a pure function of the two listings, and the chosen leader
//! is carried forward as a [`FailoverPlan`].
//!
//! # Graceful Degradation
//!
//! - No member or both members hold the address: T9.1 and T9.2 fail, the
//!   failure is not induced and continuity is not checked
//! - Pid file missing or unreadable: T9.2 fails with `PID not found`,
//!   continuity is not checked
//! - Standby never takes the address: T9.2 fails after the settle policy
//!   expires, continuity is still checked

use crate::checks::firewall::web_reachable_check;
use crate::checks::ListingEntry;
use crate::config::ValidatorConfig;
use crate::engine::executor::{sanitize_output, CheckExecutor, CheckSpec};
use crate::engine::poll::PollPolicy;
use crate::engine::predicate::Expectation;
use crate::engine::sequencer::{Recorder, Step};
use crate::platform::endpoint::Inventory;
use crate::Concern;
use std::fmt;
use tracing::{debug, warn};

/// Identifier of the initial cluster state check
pub const INITIAL_STATE_ID: &str = "T9.1";

/// Identifier of the takeover check
pub const TAKEOVER_ID: &str = "T9.2";

/// Output recorded when the leader's pid file yields no pid
pub const PID_NOT_FOUND: &str = "PID not found";

/// Command listing interface addresses on a member
const LIST_ADDRESSES: &str = "ip addr show";

/// Parameters of the failover scenario
#[derive(Debug, Clone, PartialEq)]
pub struct FailoverSpec {
    /// The two redundant firewall members
    pub members: [String; 2],
    /// Virtual address that moves between members
    pub vip: String,
    /// Pid file path, `{member}` replaced by the member name
    pub pid_file_template: String,
    /// How long to wait for the standby to take the address
    pub settle: PollPolicy,
    /// Service check repeated after the failover
    pub continuity: CheckSpec,
}

impl FailoverSpec {
    pub fn from_config(config: &ValidatorConfig) -> Self {
        FailoverSpec {
            members: config.roles.cluster.clone(),
            vip: config.addresses.vip.clone(),
            pid_file_template: config.paths.pid_file_template.clone(),
            settle: config.settle.failover,
            continuity: web_reachable_check("T9.3", "Web service continuity after failure", config),
        }
    }

    pub fn identifiers(&self) -> Vec<&str> {
        vec![INITIAL_STATE_ID, TAKEOVER_ID, self.continuity.id.as_str()]
    }

    pub fn endpoints(&self) -> Vec<&str> {
        vec![
            self.members[0].as_str(),
            self.members[1].as_str(),
            self.continuity.endpoint.as_str(),
        ]
    }

    /// Pid file of the VRRP daemon on `member`
    pub fn pid_file(&self, member: &str) -> String {
        self.pid_file_template.replace("{member}", member)
    }

    /// Takeover check against `standby`
    pub fn takeover_check(&self, standby: &str) -> CheckSpec {
        CheckSpec::new(
            TAKEOVER_ID,
            format!("HA failover to {}", standby),
            Concern::HighAvailability,
            standby,
            LIST_ADDRESSES,
        )
        .expect(Expectation::contains(vip_marker(&self.vip)))
        .polled(self.settle)
    }

    pub(crate) fn listing(&self) -> Vec<ListingEntry> {
        let members = format!("{},{}", self.members[0], self.members[1]);
        vec![
            ListingEntry {
                id: INITIAL_STATE_ID.to_string(),
                description: format!("Initial cluster state (holder of {})", self.vip),
                endpoint: members.clone(),
                command: LIST_ADDRESSES.to_string(),
            },
            ListingEntry {
                id: TAKEOVER_ID.to_string(),
                description: "HA failover to standby".to_string(),
                endpoint: members,
                command: format!("kill $(cat {}); {}", self.pid_file_template, LIST_ADDRESSES),
            },
            ListingEntry {
                id: self.continuity.id.clone(),
                description: self.continuity.description.clone(),
                endpoint: self.continuity.endpoint.clone(),
                command: self.continuity.command.clone(),
            },
        ]
    }
}

/// Result of looking for the virtual address on both members
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeaderDetection {
    /// Exactly one member holds the address
    Leader { leader: String, standby: String },
    /// Neither member holds the address
    NoLeader,
    /// Both members hold the address
    SplitBrain,
}

impl LeaderDetection {
    /// Failover plan for a unique leader
    pub fn plan(&self, spec: &FailoverSpec) -> Option<FailoverPlan> {
        match self {
            LeaderDetection::Leader { leader, standby } => Some(FailoverPlan {
                leader: leader.clone(),
                standby: standby.clone(),
                pid_file: spec.pid_file(leader),
            }),
            LeaderDetection::NoLeader | LeaderDetection::SplitBrain => None,
        }
    }
}

impl fmt::Display for LeaderDetection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LeaderDetection::Leader { leader, .. } => write!(f, "leader={}", leader),
            LeaderDetection::NoLeader => write!(f, "leader=none"),
            LeaderDetection::SplitBrain => write!(f, "leader=ambiguous"),
        }
    }
}

/// Targets of the induced failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailoverPlan {
    pub leader: String,
    pub standby: String,
    pub pid_file: String,
}

/// Address fragment as printed by `ip addr show` (`inet 10.0.0.1/24`).
///
/// The trailing slash keeps `10.0.0.1` from matching `10.0.0.10`.
pub fn vip_marker(vip: &str) -> String {
    format!("inet {}/", vip)
}

/// Decide which member leads from their address listings.
pub fn detect_leader(members: &[String; 2], listings: [&str; 2], vip: &str) -> LeaderDetection {
    let marker = vip_marker(vip);
    let holds = [listings[0].contains(&marker), listings[1].contains(&marker)];

    match holds {
        [true, false] => LeaderDetection::Leader {
            leader: members[0].clone(),
            standby: members[1].clone(),
        },
        [false, true] => LeaderDetection::Leader {
            leader: members[1].clone(),
            standby: members[0].clone(),
        },
        [false, false] => LeaderDetection::NoLeader,
        [true, true] => LeaderDetection::SplitBrain,
    }
}

/// Extract a process id from pid file content
pub fn parse_pid(content: &str) -> Option<u32> {
    let trimmed = content.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    trimmed.parse().ok()
}

/// Get the high-availability steps
pub fn get_ha_checks(config: &ValidatorConfig) -> Vec<Step> {
    vec![
        Step::Banner("High Availability".to_string()),
        Step::Failover(FailoverSpec::from_config(config)),
    ]
}

/// Run the failover scenario, recording T9.1, T9.2 and (when the failure
/// was induced) the continuity check.
pub fn run(spec: &FailoverSpec, inventory: &Inventory, executor: &CheckExecutor, recorder: &mut Recorder) {
    let listings: Vec<String> = spec
        .members
        .iter()
        .map(|member| match inventory.get(member) {
            Some(endpoint) => executor.dispatch(endpoint, LIST_ADDRESSES),
            None => {
                warn!(member = %member, "cluster member not in inventory");
                String::new()
            }
        })
        .collect();

    let detection = detect_leader(
        &spec.members,
        [listings[0].as_str(), listings[1].as_str()],
        &spec.vip,
    );
    debug!(%detection, vip = %spec.vip, "leader detection");

    let plan = match detection.plan(spec) {
        Some(plan) => {
            recorder.record(executor.announce(
                INITIAL_STATE_ID,
                &format!("Initial cluster state ({})", detection),
                &format!("{} holds {}", plan.leader, spec.vip),
            ));
            plan
        }
        None => {
            let details = match detection {
                LeaderDetection::SplitBrain => format!(
                    "both {} and {} hold {} (split brain)",
                    spec.members[0], spec.members[1], spec.vip
                ),
                _ => format!("neither {} nor {} holds {}", spec.members[0], spec.members[1], spec.vip),
            };
            let output = format!(
                "{}:\n{}\n{}:\n{}",
                spec.members[0], listings[0], spec.members[1], listings[1]
            );
            recorder.record(executor.unmet(
                INITIAL_STATE_ID,
                &format!("Initial cluster state ({})", detection),
                &sanitize_output(&output, executor.output_limit()),
                &details,
            ));
            recorder.record(executor.unmet(
                TAKEOVER_ID,
                "HA failover",
                "",
                "no unique leader, failover not attempted",
            ));
            return;
        }
    };

    let pid = inventory.get(&plan.leader).and_then(|leader| {
        let content = executor.dispatch(leader, &format!("cat {}", plan.pid_file));
        parse_pid(&content).map(|pid| (leader, pid))
    });

    let Some((leader, pid)) = pid else {
        recorder.record(executor.unmet(
            TAKEOVER_ID,
            &format!("HA failover to {}", plan.standby),
            PID_NOT_FOUND,
            &format!("no process id in {} on {}", plan.pid_file, plan.leader),
        ));
        return;
    };

    recorder.info(&format!("Stopping VRRP daemon on {} (pid {})", plan.leader, pid));
    let kill_output = executor.dispatch(leader, &format!("kill {}", pid));
    if !kill_output.trim().is_empty() {
        debug!(output = %kill_output.trim(), "kill reported output");
    }

    recorder.record(executor.run_in(inventory, &spec.takeover_check(&plan.standby)));
    recorder.record(executor.run_in(inventory, &spec.continuity));
}
