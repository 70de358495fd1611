//! Configuration snapshot read at the start of every routing pass

use crate::types::{MatchingMode, NciVersion, PowerState, Route};
use serde::{Deserialize, Serialize};

/// Default routes for AIDs, ISO-DEP and the A/B/F technologies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteOptions {
    pub default_route: Route,
    pub default_isodep_route: Route,
    pub default_offhost_route: Route,
    pub default_felica_route: Route,
}

impl RouteOptions {
    pub fn new() -> Self {
        Self {
            default_route: Route::HOST,
            default_isodep_route: Route::HOST,
            default_offhost_route: Route(0x81),
            default_felica_route: Route::HOST,
        }
    }
}

impl Default for RouteOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// Route ids of the embedded (`eSE<n>`) and UICC (`SIM<n>`) secure elements
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecureElementTable {
    pub ese: Vec<Route>,
    pub uicc: Vec<Route>,
}

impl SecureElementTable {
    pub fn new(ese: Vec<Route>, uicc: Vec<Route>) -> Self {
        Self { ese, uicc }
    }

    /// Look up a secure element by name; `None` when the name is unknown
    /// or would resolve to the host
    pub fn route_for(&self, name: &str) -> Option<Route> {
        let (routes, index) = if let Some(index) = name.strip_prefix("eSE") {
            (&self.ese, index)
        } else if let Some(index) = name.strip_prefix("SIM") {
            (&self.uicc, index)
        } else {
            return None;
        };

        if index.is_empty() || !index.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let slot: usize = index.parse().ok()?;
        let route = *routes.get(slot.checked_sub(1)?)?;
        (!route.is_host()).then_some(route)
    }
}

/// Power masks the controller assumes for routes without an explicit entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PowerBaselines {
    /// Baseline of the empty-AID entry when the default route is the host
    pub host_default: PowerState,
    /// Off-host default route power on NCI 2.0 controllers
    pub offhost_all: PowerState,
    /// Off-host default route power on NCI 1.0 controllers
    pub offhost_all_nci1: PowerState,
}

impl PowerBaselines {
    pub fn new() -> Self {
        Self {
            host_default: PowerState::SWITCH_ON | PowerState::SCREEN_ON_LOCKED,
            offhost_all: PowerState::ALL,
            offhost_all_nci1: PowerState::ALL_NCI_1_0,
        }
    }

    pub fn offhost_default(&self, nci_version: NciVersion) -> PowerState {
        match nci_version {
            NciVersion::V1 => self.offhost_all_nci1,
            NciVersion::V2 => self.offhost_all,
        }
    }
}

impl Default for PowerBaselines {
    fn default() -> Self {
        Self::new()
    }
}

/// Routing configuration for one pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Configured default routes
    pub routes: RouteOptions,

    /// Routes forced by an override; `Some` puts the pass in override mode
    pub override_routes: Option<RouteOptions>,

    /// Secure element name lookup
    pub secure_elements: SecureElementTable,

    /// Controller AID matching capability
    pub matching_mode: MatchingMode,

    /// Controller NCI version
    pub nci_version: NciVersion,

    /// Controller-reported routing table budget in bytes
    pub max_table_bytes: usize,

    /// Fall back to the host default route when the table does not fit
    pub auto_route_switching: bool,

    /// NCI-version dependent power constants
    pub power_baselines: PowerBaselines,
}

impl RoutingConfig {
    pub fn new() -> Self {
        Self {
            routes: RouteOptions::new(),
            override_routes: None,
            secure_elements: SecureElementTable::default(),
            matching_mode: MatchingMode::ExactOrPrefix,
            nci_version: NciVersion::V2,
            max_table_bytes: 2048,
            auto_route_switching: true,
            power_baselines: PowerBaselines::new(),
        }
    }

    pub fn is_override_mode(&self) -> bool {
        self.override_routes.is_some()
    }

    /// Routes this pass works with: the override when present, else the configured ones
    pub fn effective_routes(&self) -> RouteOptions {
        self.override_routes.unwrap_or(self.routes)
    }

    pub fn supports_prefix_routing(&self) -> bool {
        self.matching_mode.supports_prefix_routing()
    }

    pub fn supports_subset_routing(&self) -> bool {
        self.matching_mode.supports_subset_routing()
    }
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self::new()
    }
}
