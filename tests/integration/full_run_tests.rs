//! Full run integration tests.
//!
//! Complete catalogue runs against the scripted lab: ordering, predicate
//! outcomes, polling and independence of failures.

use crate::mocks::{calls_matching, DropBehavior, MockLab};
use infra_validator::engine::executor::{SILENT_DROP_DETAIL, SILENT_DROP_OUTPUT};
use infra_validator::engine::ledger::{CheckOutcome, Ledger};
use infra_validator::engine::sequencer::{Progress, Silent};
use infra_validator::run_validation;

const CATALOGUE_ORDER: [&str; 18] = [
    "T1.1", "T1.2", "T1.3", "T2.1", "T2.2", "T2.3", "T3.1", "T3.2", "T3.3", "T4.1", "T7.1", "T7.3",
    "T5.1", "T5.2", "T5.3", "T9.1", "T9.2", "T9.3",
];

fn run_lab(lab: &MockLab) -> Ledger {
    run_validation(&MockLab::config(), &lab.inventory(), &mut Silent).unwrap()
}

fn outcome<'a>(ledger: &'a Ledger, id: &str) -> &'a CheckOutcome {
    ledger
        .get(id)
        .unwrap_or_else(|| panic!("{} missing from ledger {:?}", id, ledger.ids()))
}

#[test]
fn test_healthy_lab_passes_everything() {
    let ledger = run_lab(&MockLab::healthy());

    assert_eq!(ledger.ids(), CATALOGUE_ORDER.to_vec());
    let failures: Vec<(&str, &str)> = ledger.failures().iter().map(|o| (o.id(), o.details())).collect();
    assert!(failures.is_empty(), "unexpected failures: {:?}", failures);
}

#[test]
fn test_zone_probes_classified_from_output() {
    let ledger = run_lab(&MockLab::healthy());

    let wan = outcome(&ledger, "T1.2");
    assert!(wan.passed());
    assert!(wan.command_output().contains("1 received"));

    let lan = outcome(&ledger, "T1.3");
    assert!(lan.passed());
    assert!(lan.command_output().contains("0 received"));
}

#[test]
fn test_flat_network_fails_isolation_checks() {
    let lab = MockLab {
        zones_isolated: false,
        ..MockLab::healthy()
    };
    let ledger = run_lab(&lab);

    for id in ["T1.3", "T2.3", "T3.3"] {
        assert!(!outcome(&ledger, id).passed(), "{} should fail", id);
    }
    assert_eq!(outcome(&ledger, "T1.3").details(), "expected '0 received' in output");
    assert!(outcome(&ledger, "T1.2").passed());
    assert_eq!(ledger.len(), CATALOGUE_ORDER.len());
}

#[test]
fn test_silent_drop_is_pass_with_sentinel() {
    let ledger = run_lab(&MockLab::healthy());
    let drop = outcome(&ledger, "T2.1");

    assert!(drop.passed());
    assert_eq!(drop.command_output(), SILENT_DROP_OUTPUT);
    assert_eq!(drop.details(), SILENT_DROP_DETAIL);

    let ssh = outcome(&ledger, "T5.1");
    assert!(ssh.passed());
    assert_eq!(ssh.details(), SILENT_DROP_DETAIL);
}

#[test]
fn test_refused_connection_still_passes_drop_check() {
    let lab = MockLab {
        drop_behavior: DropBehavior::Refused,
        ..MockLab::healthy()
    };
    let ledger = run_lab(&lab);
    let drop = outcome(&ledger, "T2.1");

    assert!(drop.passed());
    assert!(drop.command_output().contains("Connection refused"));
    assert_eq!(drop.details(), "");
}

#[test]
fn test_open_port_fails_drop_check() {
    let lab = MockLab {
        drop_behavior: DropBehavior::Open,
        ..MockLab::healthy()
    };
    let ledger = run_lab(&lab);
    let drop = outcome(&ledger, "T2.1");

    assert!(!drop.passed());
    assert_eq!(drop.details(), "unexpected 'succeeded' in output");
}

#[test]
fn test_certificate_output_truncated() {
    let ledger = run_lab(&MockLab::healthy());
    let cert = outcome(&ledger, "T4.1");

    assert!(cert.passed());
    assert!(cert.command_output().ends_with("... (truncated)"));
    assert_eq!(cert.command_output().chars().count(), 500 + "... (truncated)".len());
}

#[test]
fn test_ids_signatures_are_independent() {
    let lab = MockLab {
        scan_alert: false,
        ..MockLab::healthy()
    };
    let ledger = run_lab(&lab);

    let scan = outcome(&ledger, "T7.1");
    assert!(!scan.passed());
    assert_eq!(scan.command_output(), "N/A");
    assert!(outcome(&ledger, "T7.3").passed());
}

#[test]
fn test_ids_traffic_generated_before_log_lookup() {
    let (inventory, logs) = MockLab::healthy().build();
    run_validation(&MockLab::config(), &inventory, &mut Silent).unwrap();

    let attacker = logs["attacker"].lock().unwrap().clone();
    let scan = attacker.iter().position(|c| c.starts_with("nmap -sS")).unwrap();
    let probe = attacker.iter().position(|c| c.starts_with("ping -c 2")).unwrap();
    assert!(scan < probe);

    // Alert appears on the second lookup
    assert_eq!(calls_matching(&logs["fw1"], "grep 'Scan Nmap'").len(), 2);
}

#[test]
fn test_tunnel_polled_until_up() {
    let (inventory, logs) = MockLab::healthy().build();
    let ledger = run_validation(&MockLab::config(), &inventory, &mut Silent).unwrap();

    assert!(outcome(&ledger, "T5.2").passed());
    assert_eq!(calls_matching(&logs["admin"], "ip addr show tun0").len(), 3);

    let admin = logs["admin"].lock().unwrap().clone();
    let start = admin.iter().position(|c| c.starts_with("openvpn --config /home/server/admin.ovpn --daemon"));
    let first_check = admin.iter().position(|c| c == "ip addr show tun0");
    assert!(start.unwrap() < first_check.unwrap());
}

#[test]
fn test_tunnel_never_up_fails_but_run_continues() {
    let lab = MockLab {
        tunnel_after: None,
        ..MockLab::healthy()
    };
    let ledger = run_lab(&lab);

    let tunnel = outcome(&ledger, "T5.2");
    assert!(!tunnel.passed());
    assert!(tunnel.command_output().contains("does not exist"));
    assert!(!outcome(&ledger, "T5.3").passed());

    // Failover still runs afterwards
    assert!(outcome(&ledger, "T9.3").passed());
}

#[test]
fn test_progress_observer_sees_every_outcome_in_order() {
    #[derive(Default)]
    struct Collect {
        banners: Vec<String>,
        infos: usize,
        ids: Vec<String>,
    }

    impl Progress for Collect {
        fn banner(&mut self, title: &str) {
            self.banners.push(title.to_string());
        }
        fn info(&mut self, _message: &str) {
            self.infos += 1;
        }
        fn outcome(&mut self, outcome: &CheckOutcome) {
            self.ids.push(outcome.id().to_string());
        }
    }

    let mut progress = Collect::default();
    let ledger = run_validation(&MockLab::config(), &MockLab::healthy().inventory(), &mut progress).unwrap();

    assert_eq!(progress.ids, ledger.ids());
    assert_eq!(progress.banners.len(), 7);
    assert_eq!(progress.banners.first().map(String::as_str), Some("Topology & Connectivity"));
    // two traffic generators, the VPN client start and the daemon kill
    assert_eq!(progress.infos, 4);
}

#[test]
fn test_missing_endpoint_rejected_before_any_check() {
    let mut config = MockLab::config();
    config.roles.edge_server = "web2".to_string();
    let (inventory, logs) = MockLab::healthy().build();

    assert!(run_validation(&config, &inventory, &mut Silent).is_err());
    assert!(logs.values().all(|log| log.lock().unwrap().is_empty()));
}
