//! Build and agent identifiers.
//!
//! Both are rendered externally as lowercase hexadecimal strings. On input
//! they accept either a hex string (with or without a `0x` prefix) or a
//! plain JSON number.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};

use std::fmt;
use std::str::FromStr;

use crate::error::BuildError;

/// Unique identifier for a gateway or relay build, bounded to `u16`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BuildId(pub u16);

impl BuildId {
    pub const MAX: i64 = u16::MAX as i64;

    /// Validate a raw identifier against the `[0, 65535]` range.
    ///
    /// Values outside the range are an [`BuildError::OutOfRange`], never a
    /// lookup miss.
    pub fn from_raw(raw: i64) -> Result<Self, BuildError> {
        u16::try_from(raw)
            .map(Self)
            .map_err(|_| BuildError::OutOfRange(raw))
    }

    pub fn value(self) -> u16 {
        self.0
    }
}

impl fmt::Display for BuildId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:x}", self.0)
    }
}

impl FromStr for BuildId {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = parse_hex_i64(s)
            .ok_or_else(|| BuildError::BadRequest(format!("invalid build id '{s}'")))?;
        Self::from_raw(raw)
    }
}

impl Serialize for BuildId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for BuildId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = HexOrNumber::deserialize(deserializer)?.into_u64::<D::Error>()?;
        u16::try_from(raw)
            .map(BuildId)
            .map_err(|_| de::Error::custom(format!("build id {raw:#x} out of range")))
    }
}

/// Identifier of a running agent (gateway or relay), a full `u64`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AgentId(pub u64);

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

impl FromStr for AgentId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = strip_hex_prefix(s);
        u64::from_str_radix(digits, 16)
            .map(AgentId)
            .map_err(|e| format!("invalid agent id '{s}': {e}"))
    }
}

impl Serialize for AgentId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for AgentId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        HexOrNumber::deserialize(deserializer)?
            .into_u64::<D::Error>()
            .map(AgentId)
    }
}

/// Serde helpers for `u64` fields rendered as lowercase hex strings.
pub mod hex_u64 {
    use super::HexOrNumber;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&format_args!("{value:x}"))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        HexOrNumber::deserialize(deserializer)?.into_u64::<D::Error>()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum HexOrNumber {
    Number(u64),
    Hex(String),
}

impl HexOrNumber {
    fn into_u64<E: de::Error>(self) -> Result<u64, E> {
        match self {
            HexOrNumber::Number(n) => Ok(n),
            HexOrNumber::Hex(s) => u64::from_str_radix(strip_hex_prefix(&s), 16)
                .map_err(|e| E::custom(format!("invalid hex id '{s}': {e}"))),
        }
    }
}

fn strip_hex_prefix(s: &str) -> &str {
    let s = s.trim();
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}

/// Parse a hex id that may be negative or wider than `u16`, so range
/// violations can be reported as such.
fn parse_hex_i64(s: &str) -> Option<i64> {
    let s = s.trim();
    let (negative, digits) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };
    let digits = strip_hex_prefix(digits);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let value = i64::try_from(u64::from_str_radix(digits, 16).ok()?).ok()?;
    if negative { value.checked_neg() } else { Some(value) }
}
