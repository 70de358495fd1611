//! Application identifiers and their match qualifiers

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Longest AID the controller accepts, in hex digits (16 bytes)
pub const MAX_AID_HEX_DIGITS: usize = 32;

/// Per-entry routing table overhead: tag, route, length and power bytes
pub const ENTRY_HEADER_BYTES: usize = 4;

/// How an AID registration wants to be matched
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AidQualifier {
    /// Plain AID, matched exactly
    Exact,
    /// `*` suffix: any AID starting with the value
    Prefix,
    /// `#` suffix: any AID the value starts with
    Subset,
}

impl AidQualifier {
    fn marker(self) -> Option<char> {
        match self {
            AidQualifier::Exact => None,
            AidQualifier::Prefix => Some('*'),
            AidQualifier::Subset => Some('#'),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AidParseError {
    #[error("AID is empty")]
    Empty,
    #[error("AID contains non-hex character {0:?}")]
    NonHex(char),
    #[error("AID has an odd number of hex digits ({0})")]
    OddLength(usize),
    #[error("AID is {0} hex digits long, at most {MAX_AID_HEX_DIGITS} are allowed")]
    TooLong(usize),
}

/// A parsed AID: upper-case hex value plus the qualifier its suffix encoded
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Aid {
    value: String,
    qualifier: AidQualifier,
}

impl Aid {
    pub fn parse(raw: &str) -> Result<Self, AidParseError> {
        let trimmed = raw.trim();
        let (value, qualifier) = if let Some(v) = trimmed.strip_suffix('*') {
            (v, AidQualifier::Prefix)
        } else if let Some(v) = trimmed.strip_suffix('#') {
            (v, AidQualifier::Subset)
        } else {
            (trimmed, AidQualifier::Exact)
        };

        if value.is_empty() {
            return Err(AidParseError::Empty);
        }
        if let Some(c) = value.chars().find(|c| !c.is_ascii_hexdigit()) {
            return Err(AidParseError::NonHex(c));
        }
        if value.len() % 2 != 0 {
            return Err(AidParseError::OddLength(value.len()));
        }
        if value.len() > MAX_AID_HEX_DIGITS {
            return Err(AidParseError::TooLong(value.len()));
        }

        Ok(Self {
            value: value.to_ascii_uppercase(),
            qualifier,
        })
    }

    /// The zero-length AID standing for "everything routed to the default route"
    pub fn empty() -> Self {
        Self {
            value: String::new(),
            qualifier: AidQualifier::Prefix,
        }
    }

    /// Same value, different match qualifier
    pub fn with_qualifier(&self, qualifier: AidQualifier) -> Self {
        Self {
            value: self.value.clone(),
            qualifier,
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn qualifier(&self) -> AidQualifier {
        self.qualifier
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    pub fn hex_digits(&self) -> usize {
        self.value.len()
    }

    /// Bytes the AID occupies on the wire
    pub fn encoded_len(&self) -> usize {
        self.value.len().div_ceil(2)
    }

    /// Bytes one routing table entry for this AID costs in the controller
    pub fn entry_cost(&self) -> usize {
        self.encoded_len() + ENTRY_HEADER_BYTES
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.value
            .as_bytes()
            .chunks(2)
            .map(|pair| {
                let hi = hex_nibble(pair[0]);
                let lo = pair.get(1).map_or(0, |&c| hex_nibble(c));
                (hi << 4) | lo
            })
            .collect()
    }
}

fn hex_nibble(c: u8) -> u8 {
    (c as char).to_digit(16).unwrap_or(0) as u8
}

impl fmt::Display for Aid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)?;
        if self.is_empty() {
            return Ok(());
        }
        if let Some(marker) = self.qualifier.marker() {
            write!(f, "{}", marker)?;
        }
        Ok(())
    }
}

impl FromStr for Aid {
    type Err = AidParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Aid::parse(s)
    }
}

impl Serialize for Aid {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Aid {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Aid::parse(&raw).map_err(serde::de::Error::custom)
    }
}
