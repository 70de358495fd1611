//! Seam between the routing core and the NFC controller transport

use crate::types::{PowerState, Route, RouteQualifier};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Status byte returned by the controller for a routing commit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommitStatus(pub u8);

impl CommitStatus {
    pub const OK: CommitStatus = CommitStatus(0x00);
    pub const REJECTED: CommitStatus = CommitStatus(0x01);
    pub const FAILED: CommitStatus = CommitStatus(0x03);

    pub fn is_ok(self) -> bool {
        self == CommitStatus::OK
    }
}

impl fmt::Display for CommitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02x}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("controller failed {command}: {reason}")]
    CommandFailed {
        command: &'static str,
        reason: String,
    },

    #[error("controller transport is closed")]
    Closed,
}

/// Commands the core issues to program the controller's routing table.
///
/// Calls block until the controller answers.
pub trait RoutingTransport {
    /// Drop every AID entry currently staged in the controller
    fn clear_routing_table(&mut self) -> Result<(), TransportError>;

    fn set_isodep_protocol_route(&mut self, route: Route) -> Result<(), TransportError>;

    fn set_technology_ab_felica_route(
        &mut self,
        offhost_route: Route,
        felica_route: Route,
    ) -> Result<(), TransportError>;

    fn add_route(
        &mut self,
        aid: &[u8],
        route: Route,
        qualifier: RouteQualifier,
        power: PowerState,
    ) -> Result<(), TransportError>;

    /// Apply everything staged since the last clear
    fn commit_routing(&mut self, is_override_pass: bool) -> Result<CommitStatus, TransportError>;
}

impl<T: RoutingTransport + ?Sized> RoutingTransport for Box<T> {
    fn clear_routing_table(&mut self) -> Result<(), TransportError> {
        (**self).clear_routing_table()
    }

    fn set_isodep_protocol_route(&mut self, route: Route) -> Result<(), TransportError> {
        (**self).set_isodep_protocol_route(route)
    }

    fn set_technology_ab_felica_route(
        &mut self,
        offhost_route: Route,
        felica_route: Route,
    ) -> Result<(), TransportError> {
        (**self).set_technology_ab_felica_route(offhost_route, felica_route)
    }

    fn add_route(
        &mut self,
        aid: &[u8],
        route: Route,
        qualifier: RouteQualifier,
        power: PowerState,
    ) -> Result<(), TransportError> {
        (**self).add_route(aid, route, qualifier, power)
    }

    fn commit_routing(&mut self, is_override_pass: bool) -> Result<CommitStatus, TransportError> {
        (**self).commit_routing(is_override_pass)
    }
}
