//! AID routing table construction for NFC card emulation
//!
//! Compresses a set of application AID registrations into a routing table
//! that fits the controller's capacity and matching capability, and decides
//! whether the hardware table has to be re-pushed at all.

mod aid;
mod builder;
mod capacity;
mod change;
mod committer;
mod config;
mod error;
mod manager;
mod plan;
mod resolver;
mod state;
mod transport;
mod types;

pub use aid::{Aid, AidParseError, AidQualifier, ENTRY_HEADER_BYTES, MAX_AID_HEX_DIGITS};
pub use builder::{BuiltTable, CandidateEntrySet, RouteEntry, TableBuilder};
pub use capacity::{candidate_routes, CapacityFallbackLoop};
pub use change::{ChangeDetector, ChangeReport};
pub use committer::{CommitPhase, CommitRequest, Committer};
pub use config::{PowerBaselines, RouteOptions, RoutingConfig, SecureElementTable};
pub use error::{ConfigureRoutingCode, RoutingDefect, RoutingError};
pub use manager::{AidRoutingManager, ConfigureOutcome, ConfigureStatus};
pub use plan::{plan_table, TablePlan};
pub use resolver::{ResolvedAid, ResolvedAids, RouteResolver};
pub use state::{RouteSnapshot, RoutingSnapshot, RoutingState};
pub use transport::{CommitStatus, RoutingTransport, TransportError};
pub use types::{
    parse_aid_map, AidIntent, AidMap, MatchingMode, NciVersion, PowerState, Route,
    RouteQualifier, RoutingTable,
};
