//! Pushes an accepted entry set to the controller

use crate::builder::CandidateEntrySet;
use crate::config::RouteOptions;
use crate::error::RoutingError;
use crate::transport::{RoutingTransport, TransportError};
use serde::Serialize;
use std::fmt;
use tracing::{debug, error};

/// Where a commit sequence is, or where it stopped
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitPhase {
    #[default]
    Idle,
    Clearing,
    SendingDefaultRoutes,
    Pushing,
    Committing,
}

impl fmt::Display for CommitPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            CommitPhase::Idle => "idle",
            CommitPhase::Clearing => "clearing the routing table",
            CommitPhase::SendingDefaultRoutes => "sending default routes",
            CommitPhase::Pushing => "pushing routing entries",
            CommitPhase::Committing => "committing",
        };
        f.write_str(text)
    }
}

pub struct CommitRequest<'a> {
    pub entries: &'a CandidateEntrySet,
    pub routes: &'a RouteOptions,
    /// Re-send the ISO-DEP and technology default routes before the entries
    pub send_default_routes: bool,
    pub is_override_pass: bool,
}

/// Runs clear, default routes, entries and commit in order.
///
/// The phase is `Idle` again once `commit` returns, whatever the outcome.
#[derive(Debug, Default)]
pub struct Committer {
    phase: CommitPhase,
}

impl Committer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> CommitPhase {
        self.phase
    }

    pub fn commit<T: RoutingTransport + ?Sized>(
        &mut self,
        transport: &mut T,
        request: &CommitRequest<'_>,
    ) -> Result<(), RoutingError> {
        let result = self.run(transport, request);
        if let Err(err) = &result {
            error!(phase = %self.phase, error = %err, "routing commit failed");
        }
        self.phase = CommitPhase::Idle;
        result
    }

    fn run<T: RoutingTransport + ?Sized>(
        &mut self,
        transport: &mut T,
        request: &CommitRequest<'_>,
    ) -> Result<(), RoutingError> {
        self.enter(CommitPhase::Clearing);
        transport
            .clear_routing_table()
            .map_err(|e| self.failure(e))?;

        if request.send_default_routes {
            self.enter(CommitPhase::SendingDefaultRoutes);
            let routes = request.routes;
            transport
                .set_isodep_protocol_route(routes.default_isodep_route)
                .map_err(|e| self.failure(e))?;
            transport
                .set_technology_ab_felica_route(routes.default_offhost_route, routes.default_felica_route)
                .map_err(|e| self.failure(e))?;
        }

        self.enter(CommitPhase::Pushing);
        for (aid, entry) in request.entries.iter() {
            transport
                .add_route(&aid.to_bytes(), entry.route, entry.qualifier, entry.power)
                .map_err(|e| self.failure(e))?;
        }

        self.enter(CommitPhase::Committing);
        let status = transport
            .commit_routing(request.is_override_pass)
            .map_err(|e| self.failure(e))?;
        if !status.is_ok() {
            return Err(RoutingError::CommitRejected { status });
        }
        Ok(())
    }

    fn enter(&mut self, phase: CommitPhase) {
        debug!(%phase, "commit phase");
        self.phase = phase;
    }

    fn failure(&self, source: TransportError) -> RoutingError {
        RoutingError::UnknownCommitFailure {
            phase: self.phase,
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aid::Aid;
    use crate::builder::TableBuilder;
    use crate::config::RoutingConfig;
    use crate::resolver::{ResolvedAid, ResolvedAids};
    use crate::transport::CommitStatus;
    use crate::types::{PowerState, Route, RouteQualifier};

    #[derive(Default)]
    struct Log {
        calls: Vec<String>,
        fail_on: Option<&'static str>,
        status: Option<CommitStatus>,
    }

    impl Log {
        fn call(&mut self, name: &'static str) -> Result<(), TransportError> {
            self.calls.push(name.to_string());
            if self.fail_on == Some(name) {
                return Err(TransportError::Closed);
            }
            Ok(())
        }
    }

    impl RoutingTransport for Log {
        fn clear_routing_table(&mut self) -> Result<(), TransportError> {
            self.call("clear")
        }

        fn set_isodep_protocol_route(&mut self, _route: Route) -> Result<(), TransportError> {
            self.call("isodep")
        }

        fn set_technology_ab_felica_route(&mut self, _offhost: Route, _felica: Route) -> Result<(), TransportError> {
            self.call("technology")
        }

        fn add_route(
            &mut self,
            _aid: &[u8],
            _route: Route,
            _qualifier: RouteQualifier,
            _power: PowerState,
        ) -> Result<(), TransportError> {
            self.call("add")
        }

        fn commit_routing(&mut self, _is_override_pass: bool) -> Result<CommitStatus, TransportError> {
            self.call("commit")?;
            Ok(self.status.unwrap_or(CommitStatus::OK))
        }
    }

    fn entries() -> CandidateEntrySet {
        let config = RoutingConfig::new();
        let mut resolved = ResolvedAids::new();
        resolved.insert(
            Aid::parse("A000000002").unwrap(),
            ResolvedAid {
                route: Route(0x81),
                power: PowerState::ALL,
                on_host: false,
                unchecked_off_host_se: Vec::new(),
            },
        );
        TableBuilder::new(&config).build(&resolved, Route::HOST).entries
    }

    #[test]
    fn test_commit_sequence() {
        let entries = entries();
        let routes = RouteOptions::new();
        let mut log = Log::default();
        let mut committer = Committer::new();

        let request = CommitRequest {
            entries: &entries,
            routes: &routes,
            send_default_routes: true,
            is_override_pass: false,
        };
        committer.commit(&mut log, &request).unwrap();

        // One entry plus the empty AID
        assert_eq!(log.calls, vec!["clear", "isodep", "technology", "add", "add", "commit"]);
        assert_eq!(committer.phase(), CommitPhase::Idle);
    }

    #[test]
    fn test_default_routes_skipped() {
        let entries = entries();
        let routes = RouteOptions::new();
        let mut log = Log::default();

        let request = CommitRequest {
            entries: &entries,
            routes: &routes,
            send_default_routes: false,
            is_override_pass: true,
        };
        Committer::new().commit(&mut log, &request).unwrap();
        assert_eq!(log.calls, vec!["clear", "add", "add", "commit"]);
    }

    #[test]
    fn test_transport_failure_reports_phase() {
        let entries = entries();
        let routes = RouteOptions::new();
        let mut log = Log {
            fail_on: Some("add"),
            ..Log::default()
        };
        let mut committer = Committer::new();

        let request = CommitRequest {
            entries: &entries,
            routes: &routes,
            send_default_routes: false,
            is_override_pass: false,
        };
        let err = committer.commit(&mut log, &request).unwrap_err();
        assert!(matches!(
            err,
            RoutingError::UnknownCommitFailure {
                phase: CommitPhase::Pushing,
                ..
            }
        ));
        // Nothing after the failing call
        assert_eq!(log.calls, vec!["clear", "add"]);
        assert_eq!(committer.phase(), CommitPhase::Idle);
    }

    #[test]
    fn test_rejected_status() {
        let entries = entries();
        let routes = RouteOptions::new();
        let mut log = Log {
            status: Some(CommitStatus::REJECTED),
            ..Log::default()
        };

        let request = CommitRequest {
            entries: &entries,
            routes: &routes,
            send_default_routes: false,
            is_override_pass: false,
        };
        let err = Committer::new().commit(&mut log, &request).unwrap_err();
        assert!(matches!(
            err,
            RoutingError::CommitRejected { status } if status == CommitStatus::REJECTED
        ));
    }
}
