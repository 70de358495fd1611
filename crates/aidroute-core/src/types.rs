//! Core types for AID routing

use crate::aid::{Aid, AidQualifier};
use crate::error::RoutingDefect;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Numeric routing destination (NFCEE id). `0x00` is the host.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Route(pub u8);

impl Route {
    pub const HOST: Route = Route(0x00);

    pub fn is_host(self) -> bool {
        self == Route::HOST
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02x}", self.0)
    }
}

/// Device power/screen states in which a route is active
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PowerState(pub u8);

impl PowerState {
    pub const NONE: PowerState = PowerState(0x00);
    pub const SWITCH_ON: PowerState = PowerState(0x01);
    pub const SWITCH_OFF: PowerState = PowerState(0x02);
    pub const BATTERY_OFF: PowerState = PowerState(0x04);
    pub const SCREEN_OFF_UNLOCKED: PowerState = PowerState(0x08);
    pub const SCREEN_ON_LOCKED: PowerState = PowerState(0x10);
    pub const SCREEN_OFF_LOCKED: PowerState = PowerState(0x20);
    pub const ALL: PowerState = PowerState(0x3F);
    pub const ALL_NCI_1_0: PowerState = PowerState(0x07);

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn contains(self, other: PowerState) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for PowerState {
    type Output = PowerState;

    fn bitor(self, rhs: PowerState) -> PowerState {
        PowerState(self.0 | rhs.0)
    }
}

impl BitOrAssign for PowerState {
    fn bitor_assign(&mut self, rhs: PowerState) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for PowerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02x}", self.0)
    }
}

/// How the controller matches AIDs against routing table entries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchingMode {
    /// Every entry is matched exactly
    ExactOnly,
    /// Entries are matched exactly or as a prefix
    #[default]
    ExactOrPrefix,
    /// Every entry is matched as a prefix
    PrefixOnly,
    /// Entries are matched exactly, as a subset or as a prefix
    ExactOrSubsetOrPrefix,
}

impl MatchingMode {
    /// Decode the controller's capability byte
    pub fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0x00 => Some(MatchingMode::ExactOnly),
            0x01 => Some(MatchingMode::ExactOrPrefix),
            0x02 => Some(MatchingMode::PrefixOnly),
            0x03 => Some(MatchingMode::ExactOrSubsetOrPrefix),
            _ => None,
        }
    }

    pub fn supports_prefix_routing(self) -> bool {
        !matches!(self, MatchingMode::ExactOnly)
    }

    pub fn supports_subset_routing(self) -> bool {
        matches!(self, MatchingMode::ExactOrSubsetOrPrefix)
    }

    /// Whether an AID with this qualifier can be programmed at all
    pub fn accepts(self, qualifier: AidQualifier) -> bool {
        match qualifier {
            AidQualifier::Exact => true,
            AidQualifier::Prefix => self.supports_prefix_routing(),
            AidQualifier::Subset => self.supports_subset_routing(),
        }
    }
}

impl fmt::Display for MatchingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MatchingMode::ExactOnly => "exact-only",
            MatchingMode::ExactOrPrefix => "exact-or-prefix",
            MatchingMode::PrefixOnly => "prefix-only",
            MatchingMode::ExactOrSubsetOrPrefix => "exact-or-subset-or-prefix",
        };
        f.write_str(name)
    }
}

/// NCI protocol version spoken by the controller
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NciVersion {
    #[serde(rename = "1.0")]
    V1,
    #[default]
    #[serde(rename = "2.0")]
    V2,
}

impl NciVersion {
    /// NCI 2.0 controllers accept a zero-length AID entry for the default route
    pub fn supports_empty_aid(self) -> bool {
        self >= NciVersion::V2
    }
}

/// Match qualifier byte sent along with each AID entry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RouteQualifier(pub u8);

impl RouteQualifier {
    pub const EXACT: RouteQualifier = RouteQualifier(0x00);
    pub const PREFIX: RouteQualifier = RouteQualifier(0x10);
    pub const SUBSET: RouteQualifier = RouteQualifier(0x20);
}

impl From<AidQualifier> for RouteQualifier {
    fn from(qualifier: AidQualifier) -> Self {
        match qualifier {
            AidQualifier::Exact => RouteQualifier::EXACT,
            AidQualifier::Prefix => RouteQualifier::PREFIX,
            AidQualifier::Subset => RouteQualifier::SUBSET,
        }
    }
}

fn default_power() -> PowerState {
    PowerState::ALL
}

/// Where a registered AID wants to be handled
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AidIntent {
    pub on_host: bool,
    /// Named secure element (`eSE1`, `SIM2`, ...); `None` means the default off-host route
    #[serde(default)]
    pub off_host_se: Option<String>,
    #[serde(default = "default_power")]
    pub power: PowerState,
    /// Off-host candidates not yet confirmed for an on-host AID
    #[serde(default)]
    pub unchecked_off_host_se: Vec<String>,
}

impl AidIntent {
    pub fn host(power: PowerState) -> Self {
        Self {
            on_host: true,
            off_host_se: None,
            power,
            unchecked_off_host_se: Vec::new(),
        }
    }

    pub fn off_host(secure_element: Option<&str>, power: PowerState) -> Self {
        Self {
            on_host: false,
            off_host_se: secure_element.map(str::to_string),
            power,
            unchecked_off_host_se: Vec::new(),
        }
    }

    pub fn with_unchecked_off_host<I, S>(mut self, secure_elements: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.unchecked_off_host_se = secure_elements.into_iter().map(Into::into).collect();
        self
    }
}

/// AID registrations keyed by parsed AID
pub type AidMap = BTreeMap<Aid, AidIntent>;

/// Route id -> AIDs assigned to it
pub type RoutingTable = BTreeMap<Route, BTreeSet<Aid>>;

/// Parse raw AID strings once at ingestion; malformed ones are dropped with a defect
pub fn parse_aid_map<I, S>(registrations: I) -> (AidMap, Vec<RoutingDefect>)
where
    I: IntoIterator<Item = (S, AidIntent)>,
    S: AsRef<str>,
{
    let mut aids = AidMap::new();
    let mut defects = Vec::new();

    for (raw, intent) in registrations {
        let raw = raw.as_ref();
        match Aid::parse(raw) {
            Ok(aid) => {
                aids.insert(aid, intent);
            }
            Err(reason) => {
                let defect = RoutingDefect::InvalidAid {
                    raw: raw.to_string(),
                    reason,
                };
                tracing::warn!(%defect, "dropping AID registration");
                defects.push(defect);
            }
        }
    }

    (aids, defects)
}
