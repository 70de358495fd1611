//! In-memory controller that speaks the routing transport

use crate::lmrt::{LmrtEntry, PROTOCOL_ISO_DEP, TECHNOLOGY_A, TECHNOLOGY_B, TECHNOLOGY_F};
use aidroute_core::{
    CommitStatus, PowerState, Route, RouteQualifier, RoutingTransport, TransportError,
    MAX_AID_HEX_DIGITS,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Bytes available for AID entries
    pub capacity_bytes: usize,
    /// Reject the first commit with a non-OK status
    pub reject_commit: bool,
}

impl ControllerConfig {
    pub fn new() -> Self {
        Self {
            capacity_bytes: 2048,
            reject_commit: false,
        }
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Injected misbehaviour, consumed by the first command it applies to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    RejectNextCommit(CommitStatus),
    FailCommand(&'static str),
}

/// Something the routing core has to be told about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerEvent {
    /// The controller lost its routing table
    TableCleared,
}

#[derive(Debug, Default)]
pub struct SimulatedController {
    config: ControllerConfig,
    staged: Vec<LmrtEntry>,
    committed: Vec<LmrtEntry>,
    faults: Vec<Fault>,
    commit_count: usize,
    last_commit_override: bool,
}

impl SimulatedController {
    pub fn new(config: ControllerConfig) -> Self {
        let mut faults = Vec::new();
        if config.reject_commit {
            faults.push(Fault::RejectNextCommit(CommitStatus::REJECTED));
        }
        Self {
            config,
            faults,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn inject(&mut self, fault: Fault) {
        self.faults.push(fault);
    }

    /// Entries the controller currently routes with
    pub fn committed(&self) -> &[LmrtEntry] {
        &self.committed
    }

    /// Committed table in wire form
    pub fn encoded_table(&self) -> Vec<u8> {
        LmrtEntry::encode_all(&self.committed)
    }

    /// Bytes the committed AID entries occupy
    pub fn aid_table_bytes(&self) -> usize {
        aid_bytes(&self.committed)
    }

    pub fn commit_count(&self) -> usize {
        self.commit_count
    }

    pub fn last_commit_override(&self) -> bool {
        self.last_commit_override
    }

    /// Drop the table as a controller reset would
    pub fn power_cycle(&mut self) -> ControllerEvent {
        info!(entries = self.committed.len(), "controller power cycle");
        self.staged.clear();
        self.committed.clear();
        ControllerEvent::TableCleared
    }

    /// Route a SELECT for `aid` would take under the committed table.
    ///
    /// Exact entries win over prefix and subset entries, longer matches win
    /// over shorter ones, and the empty AID entry catches everything else.
    pub fn route_for(&self, aid: &[u8]) -> Option<Route> {
        let mut best: Option<(usize, Route)> = None;
        for entry in &self.committed {
            let LmrtEntry::Aid {
                aid: value,
                route,
                qualifier,
                ..
            } = entry
            else {
                continue;
            };

            let matched = match *qualifier {
                RouteQualifier::EXACT => value.as_slice() == aid,
                RouteQualifier::PREFIX => aid.starts_with(value),
                RouteQualifier::SUBSET => value.starts_with(aid),
                _ => false,
            };
            if !matched {
                continue;
            }

            if *qualifier == RouteQualifier::EXACT {
                return Some(*route);
            }
            if best.map_or(true, |(len, _)| value.len() > len) {
                best = Some((value.len(), *route));
            }
        }
        best.map(|(_, route)| route)
    }

    fn take_fault(&mut self, command: &'static str) -> Result<(), TransportError> {
        let position = self
            .faults
            .iter()
            .position(|f| matches!(f, Fault::FailCommand(name) if *name == command));
        match position {
            Some(index) => {
                self.faults.remove(index);
                warn!(command, "injected controller failure");
                Err(TransportError::CommandFailed {
                    command,
                    reason: "injected failure".to_string(),
                })
            }
            None => Ok(()),
        }
    }

    fn take_rejection(&mut self) -> Option<CommitStatus> {
        let index = self
            .faults
            .iter()
            .position(|f| matches!(f, Fault::RejectNextCommit(_)))?;
        match self.faults.remove(index) {
            Fault::RejectNextCommit(status) => Some(status),
            Fault::FailCommand(_) => None,
        }
    }
}

fn aid_bytes(entries: &[LmrtEntry]) -> usize {
    entries
        .iter()
        .filter(|e| e.is_aid())
        .map(LmrtEntry::encoded_len)
        .sum()
}

impl RoutingTransport for SimulatedController {
    fn clear_routing_table(&mut self) -> Result<(), TransportError> {
        self.take_fault("clear_routing_table")?;
        debug!(staged = self.staged.len(), "clearing staged routing table");
        self.staged.clear();
        Ok(())
    }

    fn set_isodep_protocol_route(&mut self, route: Route) -> Result<(), TransportError> {
        self.take_fault("set_isodep_protocol_route")?;
        self.staged.push(LmrtEntry::Protocol {
            protocol: PROTOCOL_ISO_DEP,
            route,
            power: PowerState::ALL,
        });
        Ok(())
    }

    fn set_technology_ab_felica_route(
        &mut self,
        offhost_route: Route,
        felica_route: Route,
    ) -> Result<(), TransportError> {
        self.take_fault("set_technology_ab_felica_route")?;
        for (technology, route) in [
            (TECHNOLOGY_A, offhost_route),
            (TECHNOLOGY_B, offhost_route),
            (TECHNOLOGY_F, felica_route),
        ] {
            self.staged.push(LmrtEntry::Technology {
                technology,
                route,
                power: PowerState::ALL,
            });
        }
        Ok(())
    }

    fn add_route(
        &mut self,
        aid: &[u8],
        route: Route,
        qualifier: RouteQualifier,
        power: PowerState,
    ) -> Result<(), TransportError> {
        self.take_fault("add_route")?;
        if aid.len() * 2 > MAX_AID_HEX_DIGITS {
            return Err(TransportError::CommandFailed {
                command: "add_route",
                reason: format!("AID of {} bytes is too long", aid.len()),
            });
        }
        self.staged.push(LmrtEntry::Aid {
            aid: aid.to_vec(),
            route,
            qualifier,
            power,
        });
        Ok(())
    }

    fn commit_routing(&mut self, is_override_pass: bool) -> Result<CommitStatus, TransportError> {
        self.take_fault("commit_routing")?;
        let staged = std::mem::take(&mut self.staged);

        if let Some(status) = self.take_rejection() {
            warn!(%status, "controller rejected commit");
            return Ok(status);
        }

        let bytes = aid_bytes(&staged);
        if bytes > self.config.capacity_bytes {
            warn!(
                bytes,
                capacity = self.config.capacity_bytes,
                "routing table exceeds controller capacity"
            );
            return Ok(CommitStatus::FAILED);
        }

        // Default routes survive a commit that did not resend them
        let mut table: Vec<LmrtEntry> = if staged.iter().any(|e| !e.is_aid()) {
            Vec::new()
        } else {
            self.committed.iter().filter(|e| !e.is_aid()).cloned().collect()
        };
        table.extend(staged);

        self.committed = table;
        self.commit_count += 1;
        self.last_commit_override = is_override_pass;
        info!(
            entries = self.committed.len(),
            bytes,
            override_pass = is_override_pass,
            "routing table committed"
        );
        Ok(CommitStatus::OK)
    }
}
