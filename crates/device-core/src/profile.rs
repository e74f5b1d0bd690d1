//! SNMP profile and value data model
//!
//! A device profile maps OIDs to a static profile datum plus an optional
//! behavior descriptor. OIDs and PDUs are otherwise opaque to the core.

use crate::behavior::BehaviorDescriptor;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// SNMP object identifier in dotted notation; opaque key to the core
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Oid(String);

impl Oid {
    /// Wrap a dotted-notation identifier
    pub fn new(oid: impl Into<String>) -> Self {
        Self(oid.into())
    }

    /// The dotted-notation form
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Oid {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for Oid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// SNMP syntax of a profile datum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnmpType {
    /// Plain signed integer
    Integer,
    /// Byte string
    OctetString,
    /// 32-bit wrapping counter
    Counter32,
    /// 32-bit bounded gauge
    Gauge32,
    /// Hundredths of a second since agent start
    TimeTicks,
}

/// Raw profile value before typing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProfileValue {
    /// Numeric raw value
    Integer(i64),
    /// Textual raw value
    Text(String),
}

impl ProfileValue {
    /// Numeric view; textual values parse when possible
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ProfileValue::Integer(n) => Some(*n),
            ProfileValue::Text(s) => s.parse().ok(),
        }
    }

    /// Non-negative numeric view, clamping negatives to zero
    pub fn as_u64(&self) -> u64 {
        self.as_i64().unwrap_or(0).max(0) as u64
    }
}

/// Static profile entry for one OID: its syntax and raw value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileDatum {
    /// SNMP syntax the value carries on the wire
    pub snmp_type: SnmpType,
    /// Raw profile value
    pub value: ProfileValue,
}

impl ProfileDatum {
    /// Counter32 datum
    pub fn counter32(value: u32) -> Self {
        Self {
            snmp_type: SnmpType::Counter32,
            value: ProfileValue::Integer(value as i64),
        }
    }

    /// Gauge32 datum
    pub fn gauge32(value: i32) -> Self {
        Self {
            snmp_type: SnmpType::Gauge32,
            value: ProfileValue::Integer(value as i64),
        }
    }

    /// TimeTicks datum
    pub fn timeticks(value: u32) -> Self {
        Self {
            snmp_type: SnmpType::TimeTicks,
            value: ProfileValue::Integer(value as i64),
        }
    }

    /// Integer datum
    pub fn integer(value: i64) -> Self {
        Self {
            snmp_type: SnmpType::Integer,
            value: ProfileValue::Integer(value),
        }
    }

    /// OctetString datum
    pub fn string(value: impl Into<String>) -> Self {
        Self {
            snmp_type: SnmpType::OctetString,
            value: ProfileValue::Text(value.into()),
        }
    }

    /// Type the raw value according to its declared SNMP syntax
    pub fn to_value(&self) -> SnmpValue {
        match self.snmp_type {
            SnmpType::Integer => SnmpValue::Integer(self.value.as_i64().unwrap_or(0)),
            SnmpType::OctetString => {
                let text = match &self.value {
                    ProfileValue::Text(s) => s.clone(),
                    ProfileValue::Integer(n) => n.to_string(),
                };
                SnmpValue::OctetString(text.into_bytes())
            }
            SnmpType::Counter32 => {
                SnmpValue::Counter32((self.value.as_u64() % (1u64 << 32)) as u32)
            }
            SnmpType::Gauge32 => SnmpValue::Gauge32(
                self.value
                    .as_i64()
                    .unwrap_or(0)
                    .clamp(i32::MIN as i64, i32::MAX as i64) as i32,
            ),
            SnmpType::TimeTicks => {
                SnmpValue::TimeTicks((self.value.as_u64() % (1u64 << 32)) as u32)
            }
        }
    }
}

/// Typed SNMP value produced by the value engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnmpValue {
    /// 32-bit wrapping counter
    Counter32(u32),
    /// 32-bit gauge, clamped into its behavior's declared range
    Gauge32(i32),
    /// Hundredths of a second since agent start
    TimeTicks(u32),
    /// Plain signed integer
    Integer(i64),
    /// Byte string
    OctetString(Vec<u8>),
    /// Uninterpreted payload
    Opaque(Vec<u8>),
}

impl SnmpValue {
    /// Counter view
    pub fn as_counter32(&self) -> Option<u32> {
        match self {
            SnmpValue::Counter32(v) => Some(*v),
            _ => None,
        }
    }

    /// Gauge view
    pub fn as_gauge32(&self) -> Option<i32> {
        match self {
            SnmpValue::Gauge32(v) => Some(*v),
            _ => None,
        }
    }

    /// TimeTicks view
    pub fn as_timeticks(&self) -> Option<u32> {
        match self {
            SnmpValue::TimeTicks(v) => Some(*v),
            _ => None,
        }
    }

    /// UTF-8 view of an octet string
    pub fn as_text(&self) -> Option<&str> {
        match self {
            SnmpValue::OctetString(bytes) => std::str::from_utf8(bytes).ok(),
            _ => None,
        }
    }
}

/// Profile entry: the static datum plus how it evolves
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileEntry {
    /// Static value and syntax
    pub datum: ProfileDatum,
    /// Temporal behavior; absent means always-static
    pub behavior: Option<BehaviorDescriptor>,
}

/// Per-device OID table supplied at actor creation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceProfile {
    entries: BTreeMap<Oid, ProfileEntry>,
}

impl DeviceProfile {
    /// Empty profile
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach an OID with a static datum and optional behavior
    pub fn insert(
        &mut self,
        oid: impl Into<Oid>,
        datum: ProfileDatum,
        behavior: Option<BehaviorDescriptor>,
    ) {
        self.entries.insert(oid.into(), ProfileEntry { datum, behavior });
    }

    /// Look up one OID
    pub fn get(&self, oid: &Oid) -> Option<&ProfileEntry> {
        self.entries.get(oid)
    }

    /// Number of OIDs in the profile
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the profile holds no OIDs
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in OID order
    pub fn iter(&self) -> impl Iterator<Item = (&Oid, &ProfileEntry)> {
        self.entries.iter()
    }

    /// All OIDs in the profile, in order
    pub fn oids(&self) -> impl Iterator<Item = &Oid> {
        self.entries.keys()
    }
}

impl From<String> for Oid {
    fn from(s: String) -> Self {
        Self(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_typing_per_syntax() {
        assert_eq!(
            ProfileDatum::counter32(42).to_value(),
            SnmpValue::Counter32(42)
        );
        assert_eq!(ProfileDatum::gauge32(-7).to_value(), SnmpValue::Gauge32(-7));
        assert_eq!(
            ProfileDatum::timeticks(360_000).to_value(),
            SnmpValue::TimeTicks(360_000)
        );
        assert_eq!(
            ProfileDatum::integer(-12).to_value(),
            SnmpValue::Integer(-12)
        );
        assert_eq!(
            ProfileDatum::string("hello").to_value(),
            SnmpValue::OctetString(b"hello".to_vec())
        );
    }

    #[test]
    fn test_counter_typing_wraps_and_never_negative() {
        let datum = ProfileDatum {
            snmp_type: SnmpType::Counter32,
            value: ProfileValue::Integer((1i64 << 32) + 5),
        };
        assert_eq!(datum.to_value(), SnmpValue::Counter32(5));

        let negative = ProfileDatum {
            snmp_type: SnmpType::Counter32,
            value: ProfileValue::Integer(-9),
        };
        assert_eq!(negative.to_value(), SnmpValue::Counter32(0));
    }

    #[test]
    fn test_numeric_octet_string_renders_digits() {
        let datum = ProfileDatum {
            snmp_type: SnmpType::OctetString,
            value: ProfileValue::Integer(80),
        };
        assert_eq!(datum.to_value().as_text(), Some("80"));
    }

    #[test]
    fn test_profile_insert_and_lookup() {
        let mut profile = DeviceProfile::new();
        profile.insert(
            "1.3.6.1.2.1.1.1.0",
            ProfileDatum::string("test device"),
            None,
        );
        profile.insert(
            "1.3.6.1.2.1.1.3.0",
            ProfileDatum::timeticks(0),
            Some(BehaviorDescriptor::UptimeCounter {
                increment_rate: 100.0,
                reset_probability: 0.0,
            }),
        );

        assert_eq!(profile.len(), 2);
        let entry = profile.get(&Oid::from("1.3.6.1.2.1.1.1.0")).unwrap();
        assert!(entry.behavior.is_none());
        assert!(profile.get(&Oid::from("1.3.6.1.9.9.9.0")).is_none());
    }

    #[test]
    fn test_profile_value_parsing() {
        assert_eq!(ProfileValue::Text("123".to_string()).as_i64(), Some(123));
        assert_eq!(ProfileValue::Text("abc".to_string()).as_i64(), None);
        assert_eq!(ProfileValue::Integer(-5).as_u64(), 0);
    }
}
