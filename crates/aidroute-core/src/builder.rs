//! Routing table construction for one candidate default route

use crate::aid::{Aid, AidQualifier};
use crate::config::{PowerBaselines, RoutingConfig, SecureElementTable};
use crate::error::RoutingDefect;
use crate::resolver::{ResolvedAid, ResolvedAids};
use crate::types::{MatchingMode, NciVersion, PowerState, Route, RouteQualifier};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, warn};

/// One entry the controller is asked to hold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteEntry {
    pub route: Route,
    pub power: PowerState,
    pub qualifier: RouteQualifier,
}

/// The entries intended for the controller under one default route choice.
///
/// AIDs routed to the default route are normally absent: the controller
/// sends anything it cannot match to the default route anyway.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CandidateEntrySet {
    default_route: Route,
    entries: BTreeMap<Aid, RouteEntry>,
    empty_aid_power: Option<PowerState>,
}

impl CandidateEntrySet {
    pub fn new(default_route: Route) -> Self {
        Self {
            default_route,
            entries: BTreeMap::new(),
            empty_aid_power: None,
        }
    }

    pub fn default_route(&self) -> Route {
        self.default_route
    }

    pub fn entries(&self) -> &BTreeMap<Aid, RouteEntry> {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Aid, &RouteEntry)> {
        self.entries.iter()
    }

    pub fn get(&self, aid: &Aid) -> Option<&RouteEntry> {
        self.entries.get(aid)
    }

    pub fn contains(&self, aid: &Aid) -> bool {
        self.entries.contains_key(aid)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Power mask of the synthetic empty-AID entry, when one was added
    pub fn empty_aid_power(&self) -> Option<PowerState> {
        self.empty_aid_power
    }

    /// Bytes the controller needs to hold every entry
    pub fn table_bytes(&self) -> usize {
        self.entries.keys().map(Aid::entry_cost).sum()
    }

    fn insert(&mut self, aid: Aid, entry: RouteEntry) {
        self.entries.insert(aid, entry);
    }
}

/// A built candidate together with its cost and the entries it had to drop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltTable {
    pub entries: CandidateEntrySet,
    pub table_bytes: usize,
    pub defects: Vec<RoutingDefect>,
}

/// Builds the minimal entry set the controller needs for a given default route
#[derive(Debug, Clone, Copy)]
pub struct TableBuilder<'a> {
    matching_mode: MatchingMode,
    nci_version: NciVersion,
    baselines: &'a PowerBaselines,
    secure_elements: &'a SecureElementTable,
}

impl<'a> TableBuilder<'a> {
    pub fn new(config: &'a RoutingConfig) -> Self {
        Self {
            matching_mode: config.matching_mode,
            nci_version: config.nci_version,
            baselines: &config.power_baselines,
            secure_elements: &config.secure_elements,
        }
    }

    pub fn matching_mode(&self) -> MatchingMode {
        self.matching_mode
    }

    pub fn build(&self, resolved: &ResolvedAids, default_route: Route) -> BuiltTable {
        let mut set = CandidateEntrySet::new(default_route);
        let mut defects = Vec::new();

        // Phase 1: Everything not on the default route needs an explicit entry
        let explicit: Vec<&Aid> = resolved
            .iter()
            .filter(|(_, r)| r.route != default_route)
            .map(|(aid, _)| aid)
            .collect();

        // Phase 2: Prefix-only controllers would let a shorter explicit AID
        // swallow longer default-route AIDs, so those go in explicitly too
        let shadowed = if self.matching_mode == MatchingMode::PrefixOnly {
            self.shadowed_default_aids(resolved, default_route)
        } else {
            Vec::new()
        };
        for aid in &shadowed {
            debug!(%aid, route = %default_route, "adding default-route AID shadowed by a shorter entry");
        }

        // Phase 3: Rewrite markers for the controller's matching mode.
        // Explicit AIDs go first so a promoted twin never displaces one.
        for aid in explicit.into_iter().chain(shadowed) {
            if let Some(r) = resolved.get(aid) {
                self.push_entry(&mut set, &mut defects, aid, r);
            }
        }

        // Phase 4: Tell NCI 2.0 controllers which power states reach the default route
        if self.nci_version.supports_empty_aid() {
            let power = self.default_route_power(resolved, default_route);
            debug!(route = %default_route, %power, "adding empty AID for default route");
            set.insert(
                Aid::empty(),
                RouteEntry {
                    route: default_route,
                    power,
                    qualifier: RouteQualifier::PREFIX,
                },
            );
            set.empty_aid_power = Some(power);
        }

        if !default_route.is_host() {
            // Phase 5: Off-host default AIDs with their own power needs stay explicit
            let baseline = self.baselines.offhost_default(self.nci_version);
            for (aid, r) in resolved.routed_to(default_route) {
                if r.power != baseline && !set.contains(aid) {
                    debug!(%aid, power = %r.power, %baseline, "keeping default-route AID for its power state");
                    self.push_entry(&mut set, &mut defects, aid, r);
                }
            }

            // Phase 6: Host AIDs with unchecked off-host candidates
            self.drop_unreachable_host_fallbacks(&mut set, resolved, default_route);
        }

        let table_bytes = set.table_bytes();
        BuiltTable {
            entries: set,
            table_bytes,
            defects,
        }
    }

    fn push_entry(
        &self,
        set: &mut CandidateEntrySet,
        defects: &mut Vec<RoutingDefect>,
        aid: &Aid,
        resolved: &ResolvedAid,
    ) {
        if !self.matching_mode.accepts(aid.qualifier()) {
            let defect = RoutingDefect::UnsupportedMatchEntry {
                aid: aid.clone(),
                mode: self.matching_mode,
            };
            warn!(%defect, "dropping routing entry");
            defects.push(defect);
            return;
        }

        if let Some(twin) = self.wire_twin(aid) {
            if let Some(existing) = set.entries.get_mut(&twin) {
                if existing.route == resolved.route {
                    debug!(%aid, %twin, "merging AID into the entry it shares bytes with");
                    existing.power |= resolved.power;
                } else {
                    let defect = RoutingDefect::ConflictingMatchEntry {
                        aid: aid.clone(),
                        kept_route: existing.route,
                        kept: twin,
                        mode: self.matching_mode,
                    };
                    warn!(%defect, "dropping routing entry");
                    defects.push(defect);
                }
                return;
            }
        }

        debug!(%aid, route = %resolved.route, power = %resolved.power, "routing AID");
        set.insert(
            aid.clone(),
            RouteEntry {
                route: resolved.route,
                power: resolved.power,
                qualifier: aid.qualifier().into(),
            },
        );
    }

    /// The other spelling of `aid` that the controller cannot tell apart.
    ///
    /// A prefix-only controller treats every entry as a prefix, so `X` and
    /// `X*` are pushed as the same bytes.
    fn wire_twin(&self, aid: &Aid) -> Option<Aid> {
        if self.matching_mode != MatchingMode::PrefixOnly {
            return None;
        }
        match aid.qualifier() {
            AidQualifier::Exact => Some(aid.with_qualifier(AidQualifier::Prefix)),
            AidQualifier::Prefix => Some(aid.with_qualifier(AidQualifier::Exact)),
            AidQualifier::Subset => None,
        }
    }

    /// Default-route AIDs that start with the value of some AID on another route.
    ///
    /// Explicit values are indexed in a hash set and each default-route AID
    /// probes its own even-length prefixes, so the cost is linear in the
    /// number of AIDs times the maximum AID length.
    fn shadowed_default_aids<'r>(
        &self,
        resolved: &'r ResolvedAids,
        default_route: Route,
    ) -> Vec<&'r Aid> {
        let explicit_values: HashSet<&str> = resolved
            .iter()
            .filter(|(aid, r)| r.route != default_route && self.matching_mode.accepts(aid.qualifier()))
            .map(|(aid, _)| aid.value())
            .collect();

        if explicit_values.is_empty() {
            return Vec::new();
        }

        resolved
            .routed_to(default_route)
            .filter(|(aid, _)| {
                let value = aid.value();
                (2..=value.len())
                    .step_by(2)
                    .any(|len| explicit_values.contains(&value[..len]))
            })
            .map(|(aid, _)| aid)
            .collect()
    }

    fn default_route_power(&self, resolved: &ResolvedAids, default_route: Route) -> PowerState {
        if default_route.is_host() {
            resolved
                .routed_to(default_route)
                .fold(self.baselines.host_default, |power, (_, r)| power | r.power)
        } else {
            self.baselines.offhost_all
        }
    }

    /// Host-routed AIDs that also listed unchecked off-host secure elements only
    /// stay when one of those secure elements is the default route
    fn drop_unreachable_host_fallbacks(
        &self,
        set: &mut CandidateEntrySet,
        resolved: &ResolvedAids,
        default_route: Route,
    ) {
        let secure_elements = self.secure_elements;
        set.entries.retain(|aid, _| {
            let Some(r) = resolved.get(aid) else {
                return true;
            };
            if !r.on_host || r.unchecked_off_host_se.is_empty() {
                return true;
            }

            let reaches_default = r
                .unchecked_off_host_se
                .iter()
                .any(|se| secure_elements.route_for(se) == Some(default_route));
            if reaches_default {
                debug!(%aid, route = %default_route, "keeping host route for AID with unchecked off-host");
            } else {
                debug!(%aid, "removing AID from host route list");
            }
            reaches_default
        });
    }
}
