//! Resolve, build and fit a table without touching a controller

use crate::builder::{BuiltTable, TableBuilder};
use crate::capacity::{candidate_routes, CapacityFallbackLoop};
use crate::config::{RouteOptions, RoutingConfig};
use crate::error::{RoutingDefect, RoutingError};
use crate::resolver::{ResolvedAids, RouteResolver};
use crate::types::{AidMap, Route};

/// The table one pass would commit, before comparing with the prior state
#[derive(Debug)]
pub struct TablePlan {
    pub resolved: ResolvedAids,
    /// Routes the pass started from
    pub routes: RouteOptions,
    pub result: Result<BuiltTable, RoutingError>,
    /// Resolver defects, then builder defects of the accepted candidate
    pub defects: Vec<RoutingDefect>,
}

impl TablePlan {
    /// Default route of the accepted candidate
    pub fn default_route(&self) -> Option<Route> {
        self.result
            .as_ref()
            .ok()
            .map(|built| built.entries.default_route())
    }

    pub fn fallback_used(&self) -> bool {
        self.default_route()
            .is_some_and(|route| route != self.routes.default_route)
    }
}

pub fn plan_table(config: &RoutingConfig, aids: &AidMap) -> TablePlan {
    let routes = config.effective_routes();
    let (resolved, mut defects) =
        RouteResolver::new(&routes, &config.secure_elements).resolve_all(aids);

    let builder = TableBuilder::new(config);
    let candidates = candidate_routes(routes.default_route, config.auto_route_switching);
    let result = CapacityFallbackLoop::new(&builder, config.max_table_bytes, config.is_override_mode())
        .resolve_with_capacity(&resolved, &candidates);
    if let Ok(built) = &result {
        defects.extend(built.defects.iter().cloned());
    }

    TablePlan {
        resolved,
        routes,
        result,
        defects,
    }
}
