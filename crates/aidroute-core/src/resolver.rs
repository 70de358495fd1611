//! Maps each AID's handler intent to a concrete route

use crate::aid::Aid;
use crate::config::{RouteOptions, SecureElementTable};
use crate::error::RoutingDefect;
use crate::types::{AidIntent, AidMap, PowerState, Route, RoutingTable};
use std::collections::BTreeMap;

/// An AID after route resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAid {
    pub route: Route,
    pub power: PowerState,
    pub on_host: bool,
    pub unchecked_off_host_se: Vec<String>,
}

/// Every routable AID with exactly one route
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedAids {
    entries: BTreeMap<Aid, ResolvedAid>,
}

impl ResolvedAids {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, aid: Aid, resolved: ResolvedAid) {
        self.entries.insert(aid, resolved);
    }

    pub fn get(&self, aid: &Aid) -> Option<&ResolvedAid> {
        self.entries.get(aid)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Aid, &ResolvedAid)> {
        self.entries.iter()
    }

    /// AIDs resolved to `route`
    pub fn routed_to(&self, route: Route) -> impl Iterator<Item = (&Aid, &ResolvedAid)> {
        self.entries.iter().filter(move |(_, r)| r.route == route)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn route_for_aid(&self) -> BTreeMap<Aid, Route> {
        self.entries
            .iter()
            .map(|(aid, r)| (aid.clone(), r.route))
            .collect()
    }

    pub fn power_for_aid(&self) -> BTreeMap<Aid, PowerState> {
        self.entries
            .iter()
            .map(|(aid, r)| (aid.clone(), r.power))
            .collect()
    }

    /// Group AIDs by route
    pub fn table(&self) -> RoutingTable {
        let mut table = RoutingTable::new();
        for (aid, r) in &self.entries {
            table.entry(r.route).or_default().insert(aid.clone());
        }
        table
    }
}

/// Resolves intents against the current default routes and secure elements
#[derive(Debug, Clone, Copy)]
pub struct RouteResolver<'a> {
    routes: &'a RouteOptions,
    secure_elements: &'a SecureElementTable,
}

impl<'a> RouteResolver<'a> {
    pub fn new(routes: &'a RouteOptions, secure_elements: &'a SecureElementTable) -> Self {
        Self {
            routes,
            secure_elements,
        }
    }

    pub fn resolve(&self, aid: &Aid, intent: &AidIntent) -> Result<Route, RoutingDefect> {
        if intent.on_host {
            return Ok(Route::HOST);
        }

        match intent.off_host_se.as_deref() {
            None => Ok(self.routes.default_offhost_route),
            Some(name) => self.secure_elements.route_for(name).ok_or_else(|| {
                RoutingDefect::UnknownSecureElement {
                    aid: aid.clone(),
                    secure_element: name.to_string(),
                }
            }),
        }
    }

    /// Resolve a whole map; AIDs naming an unknown secure element are left out
    pub fn resolve_all(&self, aids: &AidMap) -> (ResolvedAids, Vec<RoutingDefect>) {
        let mut resolved = ResolvedAids::new();
        let mut defects = Vec::new();

        for (aid, intent) in aids {
            match self.resolve(aid, intent) {
                Ok(route) => resolved.insert(
                    aid.clone(),
                    ResolvedAid {
                        route,
                        power: intent.power,
                        on_host: intent.on_host,
                        unchecked_off_host_se: intent.unchecked_off_host_se.clone(),
                    },
                ),
                Err(defect) => {
                    tracing::error!(%defect, "dropping off-host AID");
                    defects.push(defect);
                }
            }
        }

        (resolved, defects)
    }
}
