#![allow(dead_code)]

use aidroute_core::{
    Aid, AidIntent, AidMap, CommitStatus, PowerState, Route, RouteQualifier, RoutingConfig,
    RoutingTransport, SecureElementTable, TransportError,
};
use parking_lot::Mutex;
use std::sync::Arc;

pub const ESE1: Route = Route(0x86);
pub const SIM1: Route = Route(0x81);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Clear,
    IsoDep(Route),
    Technology { offhost: Route, felica: Route },
    AddRoute {
        aid: Vec<u8>,
        route: Route,
        qualifier: RouteQualifier,
        power: PowerState,
    },
    Commit { is_override_pass: bool },
}

/// Transport that records every command; clones share the same log
#[derive(Clone, Default)]
pub struct RecordingTransport {
    log: Arc<Mutex<Vec<Command>>>,
    commit_status: Arc<Mutex<Option<CommitStatus>>>,
    fail_on_add: Arc<Mutex<bool>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> Vec<Command> {
        self.log.lock().clone()
    }

    pub fn take(&self) -> Vec<Command> {
        std::mem::take(&mut *self.log.lock())
    }

    pub fn count(&self, pred: impl Fn(&Command) -> bool) -> usize {
        self.log.lock().iter().filter(|c| pred(c)).count()
    }

    pub fn commits(&self) -> usize {
        self.count(|c| matches!(c, Command::Commit { .. }))
    }

    pub fn clears(&self) -> usize {
        self.count(|c| matches!(c, Command::Clear))
    }

    pub fn reject_commits(&self, status: CommitStatus) {
        *self.commit_status.lock() = Some(status);
    }

    pub fn fail_on_add(&self, fail: bool) {
        *self.fail_on_add.lock() = fail;
    }

    /// AID bytes of every add-route command, in push order
    pub fn pushed_aids(&self) -> Vec<Vec<u8>> {
        self.log
            .lock()
            .iter()
            .filter_map(|c| match c {
                Command::AddRoute { aid, .. } => Some(aid.clone()),
                _ => None,
            })
            .collect()
    }
}

impl RoutingTransport for RecordingTransport {
    fn clear_routing_table(&mut self) -> Result<(), TransportError> {
        self.log.lock().push(Command::Clear);
        Ok(())
    }

    fn set_isodep_protocol_route(&mut self, route: Route) -> Result<(), TransportError> {
        self.log.lock().push(Command::IsoDep(route));
        Ok(())
    }

    fn set_technology_ab_felica_route(
        &mut self,
        offhost_route: Route,
        felica_route: Route,
    ) -> Result<(), TransportError> {
        self.log.lock().push(Command::Technology {
            offhost: offhost_route,
            felica: felica_route,
        });
        Ok(())
    }

    fn add_route(
        &mut self,
        aid: &[u8],
        route: Route,
        qualifier: RouteQualifier,
        power: PowerState,
    ) -> Result<(), TransportError> {
        if *self.fail_on_add.lock() {
            return Err(TransportError::CommandFailed {
                command: "add_route",
                reason: "controller timeout".to_string(),
            });
        }
        self.log.lock().push(Command::AddRoute {
            aid: aid.to_vec(),
            route,
            qualifier,
            power,
        });
        Ok(())
    }

    fn commit_routing(&mut self, is_override_pass: bool) -> Result<CommitStatus, TransportError> {
        self.log.lock().push(Command::Commit { is_override_pass });
        Ok(self.commit_status.lock().unwrap_or(CommitStatus::OK))
    }
}

pub fn sample_config() -> RoutingConfig {
    RoutingConfig {
        secure_elements: SecureElementTable::new(vec![ESE1], vec![SIM1]),
        ..RoutingConfig::new()
    }
}

/// Config whose default AID route is the embedded secure element
pub fn ese_default_config() -> RoutingConfig {
    let mut config = sample_config();
    config.routes.default_route = ESE1;
    config
}

pub fn aid(raw: &str) -> Aid {
    Aid::parse(raw).unwrap()
}

pub fn host() -> AidIntent {
    AidIntent::host(PowerState::ALL)
}

pub fn ese() -> AidIntent {
    AidIntent::off_host(Some("eSE1"), PowerState::ALL)
}

pub fn sim() -> AidIntent {
    AidIntent::off_host(Some("SIM1"), PowerState::ALL)
}

pub fn aid_map(entries: &[(&str, AidIntent)]) -> AidMap {
    entries
        .iter()
        .map(|(raw, intent)| (aid(raw), intent.clone()))
        .collect()
}

pub fn hex(raw: &str) -> Vec<u8> {
    aid(raw).to_bytes()
}
