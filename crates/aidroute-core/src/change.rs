//! Decides whether a pass has to touch the controller at all

use crate::state::RoutingState;
use crate::types::Route;
use serde::Serialize;

/// Which parts of the routing state moved since the last commit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ChangeReport {
    pub forced: bool,
    pub unroute_required: bool,
    pub route_required: bool,
    pub routing_option_changed: bool,
    pub default_power_changed: bool,
    pub table_changed: bool,
}

impl ChangeReport {
    pub fn needs_push(&self) -> bool {
        self.forced
            || self.unroute_required
            || self.route_required
            || self.routing_option_changed
            || self.default_power_changed
            || self.table_changed
    }
}

/// Compares a proposed state against the last committed one
pub struct ChangeDetector<'a> {
    new: &'a RoutingState,
    prior: &'a RoutingState,
}

impl<'a> ChangeDetector<'a> {
    pub fn new(new: &'a RoutingState, prior: &'a RoutingState) -> Self {
        Self { new, prior }
    }

    fn new_default(&self) -> Route {
        self.new.default_route().unwrap_or(Route::HOST)
    }

    /// A previously non-default AID is gone, moved, or wants a different power mask
    pub fn unroute_required(&self) -> bool {
        let default = self.new_default();
        self.prior
            .route_for_aid()
            .iter()
            .filter(|(_, route)| **route != default)
            .any(|(aid, route)| {
                self.new.route_for_aid().get(aid) != Some(route)
                    || self.new.power_for_aid().get(aid) != self.prior.power_for_aid().get(aid)
            })
    }

    /// A non-default AID is new, moved, or wants a different power mask
    pub fn route_required(&self) -> bool {
        let default = self.new_default();
        self.new
            .route_for_aid()
            .iter()
            .filter(|(_, route)| **route != default)
            .any(|(aid, route)| {
                self.prior.route_for_aid().get(aid) != Some(route)
                    || self.prior.power_for_aid().get(aid) != self.new.power_for_aid().get(aid)
            })
    }

    pub fn routing_option_changed(&self) -> bool {
        match (self.prior.route_options(), self.new.route_options()) {
            (Some(prior), Some(new)) => {
                prior.default_route != new.default_route
                    || prior.default_isodep_route != new.default_isodep_route
                    || prior.default_offhost_route != new.default_offhost_route
            }
            _ => true,
        }
    }

    pub fn default_power_changed(&self) -> bool {
        self.new.empty_aid_power() != self.prior.empty_aid_power()
    }

    pub fn table_changed(&self) -> bool {
        self.new.entries() != self.prior.entries()
    }

    pub fn report(&self, force: bool) -> ChangeReport {
        ChangeReport {
            forced: force,
            unroute_required: self.unroute_required(),
            route_required: self.route_required(),
            routing_option_changed: self.routing_option_changed(),
            default_power_changed: self.default_power_changed(),
            table_changed: self.table_changed(),
        }
    }

    pub fn needs_push(&self, force: bool) -> bool {
        self.report(force).needs_push()
    }
}
