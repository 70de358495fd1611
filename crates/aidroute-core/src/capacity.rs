//! Picks the first default route whose table fits the controller

use crate::builder::{BuiltTable, TableBuilder};
use crate::error::RoutingError;
use crate::resolver::ResolvedAids;
use crate::types::Route;
use tracing::{debug, info, warn};

/// Default routes to try in order: the configured one, then the host
pub fn candidate_routes(default_route: Route, auto_route_switching: bool) -> Vec<Route> {
    let mut candidates = vec![default_route];
    if auto_route_switching && !default_route.is_host() {
        candidates.push(Route::HOST);
    }
    candidates
}

pub struct CapacityFallbackLoop<'a> {
    builder: &'a TableBuilder<'a>,
    max_table_bytes: usize,
    ignore_capacity: bool,
}

impl<'a> CapacityFallbackLoop<'a> {
    pub fn new(builder: &'a TableBuilder<'a>, max_table_bytes: usize, ignore_capacity: bool) -> Self {
        Self {
            builder,
            max_table_bytes,
            ignore_capacity,
        }
    }

    /// Build each candidate in turn and return the first that fits.
    ///
    /// With capacity ignored the first candidate always wins. When nothing
    /// fits, the overflow reports the cheapest candidate's size.
    pub fn resolve_with_capacity(
        &self,
        resolved: &ResolvedAids,
        candidates: &[Route],
    ) -> Result<BuiltTable, RoutingError> {
        let mut required_bytes: Option<usize> = None;

        for (attempt, &route) in candidates.iter().enumerate() {
            let built = self.builder.build(resolved, route);

            if self.ignore_capacity || built.table_bytes <= self.max_table_bytes {
                if attempt > 0 {
                    info!(
                        route = %route,
                        table_bytes = built.table_bytes,
                        "routing table fits after falling back"
                    );
                }
                return Ok(built);
            }

            debug!(
                route = %route,
                table_bytes = built.table_bytes,
                max_table_bytes = self.max_table_bytes,
                "routing table does not fit"
            );
            required_bytes = Some(
                required_bytes.map_or(built.table_bytes, |min| min.min(built.table_bytes)),
            );
        }

        let required_bytes = required_bytes.unwrap_or(0);
        warn!(
            required_bytes,
            max_table_bytes = self.max_table_bytes,
            "no default route gives a routing table that fits"
        );
        Err(RoutingError::TableOverflow {
            required_bytes,
            max_table_bytes: self.max_table_bytes,
            candidates: candidates.to_vec(),
        })
    }
}
