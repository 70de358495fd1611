//! Error taxonomy for routing passes

use crate::aid::{Aid, AidParseError};
use crate::committer::CommitPhase;
use crate::transport::{CommitStatus, TransportError};
use crate::types::{MatchingMode, Route};
use thiserror::Error;

/// Malformed input recovered inside a pass: the entry is dropped, the pass goes on
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoutingDefect {
    #[error("invalid AID registration {raw:?}: {reason}")]
    InvalidAid { raw: String, reason: AidParseError },

    #[error("AID {aid} uses a match qualifier the {mode} controller cannot route")]
    UnsupportedMatchEntry { aid: Aid, mode: MatchingMode },

    #[error(
        "AID {aid} goes out as the same {mode} controller entry as {kept}, \
         which is already routed to {kept_route}"
    )]
    ConflictingMatchEntry {
        aid: Aid,
        kept: Aid,
        kept_route: Route,
        mode: MatchingMode,
    },

    #[error("AID {aid} names unknown secure element {secure_element:?}")]
    UnknownSecureElement { aid: Aid, secure_element: String },
}

/// A routing pass that failed; the persisted routing state is left untouched
#[derive(Debug, Error)]
pub enum RoutingError {
    #[error(
        "routing table overflow: smallest candidate needs {required_bytes} bytes, \
         controller holds {max_table_bytes}"
    )]
    TableOverflow {
        required_bytes: usize,
        max_table_bytes: usize,
        candidates: Vec<Route>,
    },

    #[error("controller rejected the routing commit with status {status}")]
    CommitRejected { status: CommitStatus },

    #[error("routing update failed while {phase}")]
    UnknownCommitFailure {
        phase: CommitPhase,
        #[source]
        source: TransportError,
    },
}

/// Numeric pass result reported to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigureRoutingCode {
    Success = 0,
    TableFull = 1,
    Unknown = 2,
}

impl ConfigureRoutingCode {
    pub fn as_raw(self) -> u8 {
        self as u8
    }
}

impl RoutingError {
    pub fn failure_code(&self) -> ConfigureRoutingCode {
        match self {
            RoutingError::TableOverflow { .. } => ConfigureRoutingCode::TableFull,
            RoutingError::CommitRejected { .. } | RoutingError::UnknownCommitFailure { .. } => {
                ConfigureRoutingCode::Unknown
            }
        }
    }
}
