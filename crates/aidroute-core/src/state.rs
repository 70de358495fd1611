//! The routing state the controller last acknowledged

use crate::aid::Aid;
use crate::builder::CandidateEntrySet;
use crate::config::RouteOptions;
use crate::resolver::ResolvedAids;
use crate::types::{PowerState, Route, RoutingTable};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;

/// Per-pass AID maps plus the route options and entries they were pushed with.
///
/// A fresh or cleared state has no route options and no entries, which makes
/// the next pass treat every setting as changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoutingState {
    route_for_aid: BTreeMap<Aid, Route>,
    power_for_aid: BTreeMap<Aid, PowerState>,
    table: RoutingTable,
    route_options: Option<RouteOptions>,
    entries: Option<CandidateEntrySet>,
}

impl RoutingState {
    pub fn new() -> Self {
        Self::default()
    }

    /// State describing one resolved pass under `routes`.
    ///
    /// `routes.default_route` must be the default route the entries were built for.
    pub fn from_pass(resolved: &ResolvedAids, entries: CandidateEntrySet, routes: RouteOptions) -> Self {
        Self {
            route_for_aid: resolved.route_for_aid(),
            power_for_aid: resolved.power_for_aid(),
            table: resolved.table(),
            route_options: Some(routes),
            entries: Some(entries),
        }
    }

    pub fn route_for_aid(&self) -> &BTreeMap<Aid, Route> {
        &self.route_for_aid
    }

    pub fn power_for_aid(&self) -> &BTreeMap<Aid, PowerState> {
        &self.power_for_aid
    }

    pub fn table(&self) -> &RoutingTable {
        &self.table
    }

    pub fn route_options(&self) -> Option<&RouteOptions> {
        self.route_options.as_ref()
    }

    pub fn entries(&self) -> Option<&CandidateEntrySet> {
        self.entries.as_ref()
    }

    pub fn default_route(&self) -> Option<Route> {
        self.route_options.map(|r| r.default_route)
    }

    pub fn empty_aid_power(&self) -> Option<PowerState> {
        self.entries.as_ref().and_then(CandidateEntrySet::empty_aid_power)
    }

    pub fn is_cleared(&self) -> bool {
        self.route_for_aid.is_empty() && self.route_options.is_none()
    }

    /// Keep the AID maps of a pass that needed no push, without touching
    /// what the controller holds
    pub(crate) fn refresh_maps(&mut self, resolved: &ResolvedAids) {
        self.route_for_aid = resolved.route_for_aid();
        self.power_for_aid = resolved.power_for_aid();
        self.table = resolved.table();
    }

    /// Human-readable table grouped by route
    pub fn dump(&self) -> String {
        let mut out = String::from("Routing table:\n");
        let default = match self.default_route() {
            Some(route) if route.is_host() => "host",
            Some(_) => "secure element",
            None => "unset",
        };
        let _ = writeln!(out, "    Default route: {default}");
        for (route, aids) in &self.table {
            let _ = writeln!(out, "    Routed to {route}:");
            for aid in aids {
                let _ = writeln!(out, "        \"{aid}\"");
            }
        }
        out
    }

    pub fn snapshot(&self) -> RoutingSnapshot {
        RoutingSnapshot {
            default_route: self.default_route(),
            routes: self
                .table
                .iter()
                .map(|(route, aids)| RouteSnapshot {
                    id: *route,
                    aids: aids.iter().map(ToString::to_string).collect(),
                })
                .collect(),
        }
    }
}

/// Serializable view of the committed routing table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingSnapshot {
    pub default_route: Option<Route>,
    pub routes: Vec<RouteSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteSnapshot {
    pub id: Route,
    pub aids: Vec<String>,
}
