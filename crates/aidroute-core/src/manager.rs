//! Entry point: one routing pass from AID registrations to a committed table

use crate::change::{ChangeDetector, ChangeReport};
use crate::committer::{CommitRequest, Committer};
use crate::config::{RouteOptions, RoutingConfig};
use crate::error::{ConfigureRoutingCode, RoutingDefect, RoutingError};
use crate::plan::{plan_table, TablePlan};
use crate::state::{RoutingSnapshot, RoutingState};
use crate::transport::RoutingTransport;
use crate::types::{parse_aid_map, AidIntent, AidMap, Route};
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigureStatus {
    /// Nothing changed; the controller was not touched
    Unchanged,
    /// A new table was pushed and committed
    Committed,
}

/// Result of a successful pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigureOutcome {
    pub status: ConfigureStatus,
    pub default_route: Route,
    /// The configured default route did not fit and a later candidate was used
    pub fallback_used: bool,
    pub table_bytes: usize,
    pub entry_count: usize,
    pub changes: ChangeReport,
    pub defects: Vec<RoutingDefect>,
}

impl ConfigureOutcome {
    pub fn code(&self) -> ConfigureRoutingCode {
        ConfigureRoutingCode::Success
    }
}

struct Inner<T> {
    state: RoutingState,
    transport: T,
    committer: Committer,
}

/// Owns the committed routing state and the controller transport.
///
/// Every pass holds the lock from reading the prior state until the new
/// state is written, so passes from different callers never interleave.
pub struct AidRoutingManager<T: RoutingTransport> {
    inner: Mutex<Inner<T>>,
}

impl<T: RoutingTransport> AidRoutingManager<T> {
    pub fn new(transport: T) -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: RoutingState::new(),
                transport,
                committer: Committer::new(),
            }),
        }
    }

    /// Resolve `aids`, fit them into the controller, and push if anything changed
    pub fn resolve_and_configure(
        &self,
        config: &RoutingConfig,
        aids: &AidMap,
        force: bool,
        is_override_pass: bool,
    ) -> Result<ConfigureOutcome, RoutingError> {
        let mut inner = self.inner.lock();

        let TablePlan {
            resolved,
            routes,
            result,
            defects,
        } = plan_table(config, aids);
        let built =
            result.inspect_err(|err| error!(error = %err, "routing table does not fit"))?;

        let default_route = built.entries.default_route();
        let pass_routes = RouteOptions {
            default_route,
            ..routes
        };
        let proposed = RoutingState::from_pass(&resolved, built.entries.clone(), pass_routes);
        let changes = ChangeDetector::new(&proposed, &inner.state).report(force);

        let mut outcome = ConfigureOutcome {
            status: ConfigureStatus::Unchanged,
            default_route,
            fallback_used: default_route != routes.default_route,
            table_bytes: built.table_bytes,
            entry_count: built.entries.len(),
            changes,
            defects,
        };

        if !changes.needs_push() {
            info!(route = %default_route, "routing table unchanged");
            inner.state.refresh_maps(&resolved);
            return Ok(outcome);
        }

        let request = CommitRequest {
            entries: &built.entries,
            routes: &pass_routes,
            send_default_routes: !config.is_override_mode()
                && (force || changes.routing_option_changed),
            is_override_pass,
        };
        let Inner {
            state,
            transport,
            committer,
        } = &mut *inner;
        committer.commit(transport, &request)?;

        *state = proposed;
        outcome.status = ConfigureStatus::Committed;
        info!(
            route = %default_route,
            entries = outcome.entry_count,
            table_bytes = outcome.table_bytes,
            fallback = outcome.fallback_used,
            "routing table committed"
        );
        Ok(outcome)
    }

    /// Like [`resolve_and_configure`](Self::resolve_and_configure), for raw
    /// registration strings; malformed ones come back as defects
    pub fn resolve_and_configure_raw<I, S>(
        &self,
        config: &RoutingConfig,
        aids: I,
        force: bool,
        is_override_pass: bool,
    ) -> Result<ConfigureOutcome, RoutingError>
    where
        I: IntoIterator<Item = (S, AidIntent)>,
        S: AsRef<str>,
    {
        let (aids, invalid) = parse_aid_map(aids);
        let mut outcome = self.resolve_and_configure(config, &aids, force, is_override_pass)?;
        outcome.defects.splice(0..0, invalid);
        Ok(outcome)
    }

    /// The controller dropped its table; forget what was committed
    pub fn report_table_cleared(&self) {
        info!("routing table cleared by controller");
        self.inner.lock().state = RoutingState::new();
    }

    pub fn is_routing_table_cleared(&self) -> bool {
        self.inner.lock().state.is_cleared()
    }

    pub fn state(&self) -> RoutingState {
        self.inner.lock().state.clone()
    }

    pub fn snapshot(&self) -> RoutingSnapshot {
        self.inner.lock().state.snapshot()
    }

    pub fn dump(&self) -> String {
        self.inner.lock().state.dump()
    }

    pub fn with_transport<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        f(&mut self.inner.lock().transport)
    }

    pub fn into_transport(self) -> T {
        self.inner.into_inner().transport
    }
}
