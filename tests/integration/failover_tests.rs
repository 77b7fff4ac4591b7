//! Failover scenario integration tests.
//!
//! The scenario runs last in the catalogue; these tests look only at the
//! T9.x outcomes and at what was sent to the cluster members.

use crate::mocks::{calls_matching, ClusterState, MockLab};
use infra_validator::checks::ha::{detect_leader, LeaderDetection, PID_NOT_FOUND};
use infra_validator::engine::ledger::Ledger;
use infra_validator::engine::sequencer::Silent;
use infra_validator::run_validation;
use std::collections::HashMap;

fn run_lab(lab: &MockLab) -> (Ledger, HashMap<String, crate::mocks::CallLog>) {
    let (inventory, logs) = lab.build();
    let ledger = run_validation(&MockLab::config(), &inventory, &mut Silent).unwrap();
    (ledger, logs)
}

fn ha_ids(ledger: &Ledger) -> Vec<&str> {
    ledger.ids().into_iter().filter(|id| id.starts_with("T9.")).collect()
}

#[test]
fn test_takeover_by_fw2_when_fw1_leads() {
    let (ledger, logs) = run_lab(&MockLab::healthy());

    assert_eq!(ha_ids(&ledger), vec!["T9.1", "T9.2", "T9.3"]);
    assert_eq!(
        ledger.get("T9.1").map(|o| o.description()),
        Some("Initial cluster state (leader=fw1)")
    );
    assert_eq!(ledger.get("T9.2").map(|o| o.description()), Some("HA failover to fw2"));
    assert_eq!(calls_matching(&logs["fw1"], "kill "), vec!["kill 4242"]);
    assert!(calls_matching(&logs["fw2"], "kill ").is_empty());
}

#[test]
fn test_takeover_by_fw1_when_fw2_leads() {
    let lab = MockLab {
        cluster: ClusterState::Fw2Leads,
        ..MockLab::healthy()
    };
    let (ledger, logs) = run_lab(&lab);

    assert!(ledger.get("T9.2").map(|o| o.passed()).unwrap_or(false));
    assert_eq!(ledger.get("T9.2").map(|o| o.description()), Some("HA failover to fw1"));
    assert_eq!(calls_matching(&logs["fw2"], "cat /run/keepalived_fw2.pid").len(), 1);
    assert_eq!(calls_matching(&logs["fw2"], "kill "), vec!["kill 4242"]);
}

#[test]
fn test_missing_pid_stops_before_kill() {
    let lab = MockLab {
        pid_present: false,
        ..MockLab::healthy()
    };
    let (ledger, logs) = run_lab(&lab);

    assert_eq!(ha_ids(&ledger), vec!["T9.1", "T9.2"]);
    let takeover = ledger.get("T9.2").unwrap();
    assert!(!takeover.passed());
    assert_eq!(takeover.command_output(), PID_NOT_FOUND);
    assert!(takeover.details().contains("/run/keepalived_fw1.pid"));
    assert!(calls_matching(&logs["fw1"], "kill ").is_empty());
    assert!(!ledger.contains("T9.3"));
}

#[test]
fn test_no_leader_fails_without_inducing_failure() {
    let lab = MockLab {
        cluster: ClusterState::NoLeader,
        ..MockLab::healthy()
    };
    let (ledger, logs) = run_lab(&lab);

    assert_eq!(ha_ids(&ledger), vec!["T9.1", "T9.2"]);
    let initial = ledger.get("T9.1").unwrap();
    assert!(!initial.passed());
    assert!(initial.details().contains("neither fw1 nor fw2 holds 10.0.0.1"));
    assert_eq!(
        ledger.get("T9.2").map(|o| o.details()),
        Some("no unique leader, failover not attempted")
    );
    for member in ["fw1", "fw2"] {
        assert!(calls_matching(&logs[member], "cat ").is_empty());
        assert!(calls_matching(&logs[member], "kill ").is_empty());
    }
}

#[test]
fn test_split_brain_reported() {
    let lab = MockLab {
        cluster: ClusterState::SplitBrain,
        ..MockLab::healthy()
    };
    let (ledger, _) = run_lab(&lab);

    let initial = ledger.get("T9.1").unwrap();
    assert!(!initial.passed());
    assert_eq!(initial.description(), "Initial cluster state (leader=ambiguous)");
    assert!(initial.details().contains("split brain"));
    assert!(!ledger.contains("T9.3"));
}

#[test]
fn test_standby_never_takes_over() {
    let lab = MockLab {
        takeover_after: None,
        ..MockLab::healthy()
    };
    let (ledger, logs) = run_lab(&lab);

    let takeover = ledger.get("T9.2").unwrap();
    assert!(!takeover.passed());
    assert_eq!(takeover.details(), "expected 'inet 10.0.0.1/' in output");
    // detection plus at least two polling attempts
    assert!(calls_matching(&logs["fw2"], "ip addr show").len() >= 3);
    assert!(ledger.get("T9.3").map(|o| o.passed()).unwrap_or(false));
}

#[test]
fn test_service_lost_after_failover() {
    let lab = MockLab {
        service_after_failover: false,
        ..MockLab::healthy()
    };
    let (ledger, _) = run_lab(&lab);

    assert!(ledger.get("T9.2").map(|o| o.passed()).unwrap_or(false));
    let continuity = ledger.get("T9.3").unwrap();
    assert!(!continuity.passed());
    assert_eq!(continuity.details(), "expected 'HTTP' in output");
    // the earlier T2.2 probe is unaffected
    assert!(ledger.get("T2.2").map(|o| o.passed()).unwrap_or(false));
}

#[test]
fn test_detection_is_deterministic() {
    let members = ["fw1".to_string(), "fw2".to_string()];
    let a = "inet 10.0.0.2/24 scope global fw1-eth0\ninet 10.0.0.1/24 scope global secondary fw1-eth0";
    let b = "inet 10.0.0.3/24 scope global fw2-eth0";

    for _ in 0..3 {
        assert_eq!(
            detect_leader(&members, [a, b], "10.0.0.1"),
            LeaderDetection::Leader {
                leader: "fw1".to_string(),
                standby: "fw2".to_string()
            }
        );
    }
}
