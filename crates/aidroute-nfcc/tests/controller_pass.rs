use aidroute_core::{
    Aid, AidIntent, AidMap, AidRoutingManager, CommitStatus, ConfigureStatus, MatchingMode,
    PowerState, Route, RoutingConfig, RoutingError, SecureElementTable,
};
use aidroute_nfcc::{ControllerConfig, ControllerEvent, Fault, LmrtEntry, SimulatedController};

const ESE1: Route = Route(0x86);
const SIM1: Route = Route(0x81);

fn config() -> RoutingConfig {
    RoutingConfig {
        secure_elements: SecureElementTable::new(vec![ESE1], vec![SIM1]),
        ..RoutingConfig::new()
    }
}

fn aids() -> AidMap {
    [
        ("A00000000101", AidIntent::host(PowerState::ALL)),
        ("A00000000102*", AidIntent::off_host(Some("eSE1"), PowerState::ALL)),
        ("A000000003", AidIntent::off_host(Some("SIM1"), PowerState::ALL)),
    ]
    .into_iter()
    .map(|(raw, intent)| (Aid::parse(raw).unwrap(), intent))
    .collect()
}

fn bytes(raw: &str) -> Vec<u8> {
    Aid::parse(raw).unwrap().to_bytes()
}

#[test]
fn test_committed_table_routes_every_aid() {
    let manager = AidRoutingManager::new(SimulatedController::new(ControllerConfig::new()));
    let outcome = manager
        .resolve_and_configure(&config(), &aids(), false, false)
        .unwrap();
    assert_eq!(outcome.status, ConfigureStatus::Committed);

    manager.with_transport(|controller| {
        assert_eq!(controller.commit_count(), 1);
        assert_eq!(controller.aid_table_bytes(), outcome.table_bytes);
        assert_eq!(controller.route_for(&bytes("A00000000101")), Some(Route::HOST));
        assert_eq!(controller.route_for(&bytes("A0000000010201")), Some(ESE1));
        assert_eq!(controller.route_for(&bytes("A000000003")), Some(SIM1));
        // Unregistered AIDs land on the default route
        assert_eq!(controller.route_for(&bytes("F0010203")), Some(Route::HOST));
    });
}

#[test]
fn test_wire_table_decodes_back() {
    let manager = AidRoutingManager::new(SimulatedController::new(ControllerConfig::new()));
    manager
        .resolve_and_configure(&config(), &aids(), false, false)
        .unwrap();

    let controller = manager.into_transport();
    let decoded = LmrtEntry::decode_all(&controller.encoded_table()).unwrap();
    assert_eq!(decoded, controller.committed());
    // ISO-DEP protocol plus three technologies were sent on the first pass
    assert_eq!(decoded.iter().filter(|e| !e.is_aid()).count(), 4);
}

#[test]
fn test_smaller_controller_rejects_commit() {
    let controller = SimulatedController::new(ControllerConfig {
        capacity_bytes: 12,
        ..ControllerConfig::new()
    });
    let manager = AidRoutingManager::new(controller);

    let err = manager
        .resolve_and_configure(&config(), &aids(), false, false)
        .unwrap_err();
    assert!(matches!(
        err,
        RoutingError::CommitRejected { status } if status == CommitStatus::FAILED
    ));
    assert!(manager.is_routing_table_cleared());
    manager.with_transport(|controller| assert!(controller.committed().is_empty()));
}

#[test]
fn test_power_cycle_recovery() {
    let manager = AidRoutingManager::new(SimulatedController::new(ControllerConfig::new()));
    manager
        .resolve_and_configure(&config(), &aids(), false, false)
        .unwrap();

    let event = manager.with_transport(SimulatedController::power_cycle);
    assert_eq!(event, ControllerEvent::TableCleared);
    manager.report_table_cleared();

    let outcome = manager
        .resolve_and_configure(&config(), &aids(), false, false)
        .unwrap();
    assert_eq!(outcome.status, ConfigureStatus::Committed);
    manager.with_transport(|controller| {
        assert_eq!(controller.commit_count(), 2);
        assert_eq!(controller.route_for(&bytes("A000000003")), Some(SIM1));
    });
}

#[test]
fn test_injected_failure_keeps_previous_table() {
    let manager = AidRoutingManager::new(SimulatedController::new(ControllerConfig::new()));
    manager
        .resolve_and_configure(&config(), &aids(), false, false)
        .unwrap();
    let before = manager.state();

    manager.with_transport(|controller| controller.inject(Fault::FailCommand("commit_routing")));
    let err = manager
        .resolve_and_configure(&config(), &AidMap::new(), false, false)
        .unwrap_err();
    assert!(matches!(err, RoutingError::UnknownCommitFailure { .. }));
    assert_eq!(manager.state(), before);
    manager.with_transport(|controller| {
        assert_eq!(controller.route_for(&bytes("A000000003")), Some(SIM1));
    });
}

#[test]
fn test_override_pass_reaches_controller() {
    let manager = AidRoutingManager::new(SimulatedController::new(ControllerConfig::new()));
    let mut config = config();
    config.matching_mode = MatchingMode::ExactOrSubsetOrPrefix;
    config.override_routes = Some(aidroute_core::RouteOptions {
        default_route: ESE1,
        ..aidroute_core::RouteOptions::new()
    });

    manager
        .resolve_and_configure(&config, &aids(), false, true)
        .unwrap();
    manager.with_transport(|controller| {
        assert!(controller.last_commit_override());
        assert!(controller.committed().iter().all(LmrtEntry::is_aid));
        assert_eq!(controller.route_for(&bytes("F0010203")), Some(ESE1));
    });
}
