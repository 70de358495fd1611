//! Simulated NFC controller for exercising AID routing passes
//!
//! Stages routing commands the way an NCI controller does, encodes them as
//! listen-mode routing table entries, and enforces a byte capacity when the
//! table is committed.

mod controller;
mod lmrt;

pub use controller::{ControllerConfig, ControllerEvent, Fault, SimulatedController};
pub use lmrt::{LmrtEntry, LmrtError, PROTOCOL_ISO_DEP, TECHNOLOGY_A, TECHNOLOGY_B, TECHNOLOGY_F};
