//! Listen-mode routing table entry codec
//!
//! Every entry is a TLV: `[type, length, route, power, value...]`, where
//! `length` covers route, power and value. AID entries carry the route
//! qualifier in the type byte.

use aidroute_core::{PowerState, Route, RouteQualifier};
use thiserror::Error;

const TYPE_TECHNOLOGY: u8 = 0x00;
const TYPE_PROTOCOL: u8 = 0x01;
const TYPE_AID: u8 = 0x02;
const TYPE_MASK: u8 = 0x0F;
const QUALIFIER_MASK: u8 = 0xF0;

/// Route and power bytes that precede every value
const ROUTE_POWER_LEN: usize = 2;
const HEADER_LEN: usize = 2;

pub const TECHNOLOGY_A: u8 = 0x00;
pub const TECHNOLOGY_B: u8 = 0x01;
pub const TECHNOLOGY_F: u8 = 0x02;
pub const PROTOCOL_ISO_DEP: u8 = 0x04;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LmrtError {
    #[error("routing entry truncated at byte {offset}")]
    Truncated { offset: usize },

    #[error("unknown routing entry type 0x{0:02x}")]
    UnknownType(u8),

    #[error("{kind} entry at byte {offset} has length {length}")]
    BadLength {
        kind: &'static str,
        offset: usize,
        length: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LmrtEntry {
    Technology {
        technology: u8,
        route: Route,
        power: PowerState,
    },
    Protocol {
        protocol: u8,
        route: Route,
        power: PowerState,
    },
    Aid {
        aid: Vec<u8>,
        route: Route,
        qualifier: RouteQualifier,
        power: PowerState,
    },
}

impl LmrtEntry {
    pub fn route(&self) -> Route {
        match self {
            LmrtEntry::Technology { route, .. }
            | LmrtEntry::Protocol { route, .. }
            | LmrtEntry::Aid { route, .. } => *route,
        }
    }

    pub fn is_aid(&self) -> bool {
        matches!(self, LmrtEntry::Aid { .. })
    }

    fn value_len(&self) -> usize {
        match self {
            LmrtEntry::Technology { .. } | LmrtEntry::Protocol { .. } => 1,
            LmrtEntry::Aid { aid, .. } => aid.len(),
        }
    }

    /// Bytes this entry takes in the controller table
    pub fn encoded_len(&self) -> usize {
        HEADER_LEN + ROUTE_POWER_LEN + self.value_len()
    }

    pub fn encode(&self, out: &mut Vec<u8>) {
        let length = (ROUTE_POWER_LEN + self.value_len()) as u8;
        match self {
            LmrtEntry::Technology {
                technology,
                route,
                power,
            } => out.extend_from_slice(&[TYPE_TECHNOLOGY, length, route.0, power.bits(), *technology]),
            LmrtEntry::Protocol {
                protocol,
                route,
                power,
            } => out.extend_from_slice(&[TYPE_PROTOCOL, length, route.0, power.bits(), *protocol]),
            LmrtEntry::Aid {
                aid,
                route,
                qualifier,
                power,
            } => {
                out.extend_from_slice(&[TYPE_AID | qualifier.0, length, route.0, power.bits()]);
                out.extend_from_slice(aid);
            }
        }
    }

    pub fn encode_all<'a>(entries: impl IntoIterator<Item = &'a LmrtEntry>) -> Vec<u8> {
        let mut out = Vec::new();
        for entry in entries {
            entry.encode(&mut out);
        }
        out
    }

    /// Parse a full table; never panics on malformed input
    pub fn decode_all(bytes: &[u8]) -> Result<Vec<LmrtEntry>, LmrtError> {
        let mut entries = Vec::new();
        let mut offset = 0;

        while offset < bytes.len() {
            let header = bytes
                .get(offset..offset + HEADER_LEN)
                .ok_or(LmrtError::Truncated { offset })?;
            let (kind, length) = (header[0], header[1] as usize);
            let body = bytes
                .get(offset + HEADER_LEN..offset + HEADER_LEN + length)
                .ok_or(LmrtError::Truncated { offset })?;
            if length < ROUTE_POWER_LEN {
                return Err(LmrtError::BadLength {
                    kind: "routing",
                    offset,
                    length,
                });
            }

            let route = Route(body[0]);
            let power = PowerState(body[1]);
            let value = &body[ROUTE_POWER_LEN..];

            let entry = match kind & TYPE_MASK {
                TYPE_TECHNOLOGY | TYPE_PROTOCOL if value.len() != 1 => {
                    return Err(LmrtError::BadLength {
                        kind: "technology/protocol",
                        offset,
                        length,
                    });
                }
                TYPE_TECHNOLOGY => LmrtEntry::Technology {
                    technology: value[0],
                    route,
                    power,
                },
                TYPE_PROTOCOL => LmrtEntry::Protocol {
                    protocol: value[0],
                    route,
                    power,
                },
                TYPE_AID => LmrtEntry::Aid {
                    aid: value.to_vec(),
                    route,
                    qualifier: RouteQualifier(kind & QUALIFIER_MASK),
                    power,
                },
                _ => return Err(LmrtError::UnknownType(kind)),
            };

            entries.push(entry);
            offset += HEADER_LEN + length;
        }

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aid_entry_layout() {
        let entry = LmrtEntry::Aid {
            aid: vec![0xA0, 0x00, 0x00, 0x00, 0x03],
            route: Route(0x86),
            qualifier: RouteQualifier::PREFIX,
            power: PowerState::ALL,
        };
        let mut out = Vec::new();
        entry.encode(&mut out);
        assert_eq!(out, vec![0x12, 0x07, 0x86, 0x3F, 0xA0, 0x00, 0x00, 0x00, 0x03]);
        assert_eq!(entry.encoded_len(), out.len());
    }

    #[test]
    fn test_aid_entry_matches_core_cost() {
        let aid = aidroute_core::Aid::parse("A000000003101001").unwrap();
        let entry = LmrtEntry::Aid {
            aid: aid.to_bytes(),
            route: Route::HOST,
            qualifier: RouteQualifier::EXACT,
            power: PowerState::SWITCH_ON,
        };
        assert_eq!(entry.encoded_len(), aid.entry_cost());
    }

    #[test]
    fn test_empty_aid_entry() {
        let entry = LmrtEntry::Aid {
            aid: vec![],
            route: Route::HOST,
            qualifier: RouteQualifier::PREFIX,
            power: PowerState(0x11),
        };
        let bytes = LmrtEntry::encode_all([&entry]);
        assert_eq!(bytes, vec![0x12, 0x02, 0x00, 0x11]);
        assert_eq!(LmrtEntry::decode_all(&bytes).unwrap(), vec![entry]);
    }

    #[test]
    fn test_decode_mixed_table() {
        let entries = vec![
            LmrtEntry::Protocol {
                protocol: PROTOCOL_ISO_DEP,
                route: Route::HOST,
                power: PowerState::ALL,
            },
            LmrtEntry::Technology {
                technology: TECHNOLOGY_F,
                route: Route(0x81),
                power: PowerState::ALL,
            },
            LmrtEntry::Aid {
                aid: vec![0xA0, 0x00, 0x00, 0x00, 0x04],
                route: Route(0x81),
                qualifier: RouteQualifier::SUBSET,
                power: PowerState::SWITCH_ON,
            },
        ];
        let bytes = LmrtEntry::encode_all(&entries);
        assert_eq!(LmrtEntry::decode_all(&bytes).unwrap(), entries);
    }

    #[test]
    fn test_decode_rejects_malformed() {
        assert_eq!(
            LmrtEntry::decode_all(&[0x02]),
            Err(LmrtError::Truncated { offset: 0 })
        );
        assert_eq!(
            LmrtEntry::decode_all(&[0x02, 0x05, 0x00, 0x01]),
            Err(LmrtError::Truncated { offset: 0 })
        );
        assert_eq!(
            LmrtEntry::decode_all(&[0x07, 0x02, 0x00, 0x01]),
            Err(LmrtError::UnknownType(0x07))
        );
        assert!(matches!(
            LmrtEntry::decode_all(&[0x01, 0x03, 0x00, 0x01, 0x04, 0x02, 0x01, 0x00]),
            Err(LmrtError::BadLength { offset: 5, .. })
        ));
    }
}
