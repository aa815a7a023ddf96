//! Abstract data types and dynamically typed values
//!
//! References:
//! - <https://datatracker.ietf.org/doc/html/rfc7011#section-6.1>
//! - <https://datatracker.ietf.org/doc/html/rfc6313>

use serde::Serialize;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::time::{SystemTime, UNIX_EPOCH};

/// Wire marker for variable-length fields (RFC 7011 section 7)
pub const VARIABLE_LENGTH: u16 = 65535;

/// Abstract data types from RFC 7011 section 6, plus the RFC 6313 basicList
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FieldType {
    OctetArray,
    Unsigned8,
    Unsigned16,
    Unsigned32,
    Unsigned64,
    Signed8,
    Signed16,
    Signed32,
    Signed64,
    Float32,
    Float64,
    Boolean,
    MacAddress,
    String,
    DateTimeSeconds,
    DateTimeMilliseconds,
    DateTimeMicroseconds,
    DateTimeNanoseconds,
    Ipv4Address,
    Ipv6Address,
    BasicList,
    /// Unrecognized type name
    Illegal,
}

impl FieldType {
    /// Default on-wire size in bytes for this type
    pub fn default_size(self) -> u16 {
        match self {
            FieldType::OctetArray => VARIABLE_LENGTH,
            FieldType::Unsigned8 => 1,
            FieldType::Unsigned16 => 2,
            FieldType::Unsigned32 => 4,
            FieldType::Unsigned64 => 8,
            FieldType::Signed8 => 1,
            FieldType::Signed16 => 2,
            FieldType::Signed32 => 4,
            FieldType::Signed64 => 8,
            FieldType::Float32 => 4,
            FieldType::Float64 => 8,
            FieldType::Boolean => 1,
            FieldType::MacAddress => 6,
            FieldType::String => VARIABLE_LENGTH,
            FieldType::DateTimeSeconds => 4,
            FieldType::DateTimeMilliseconds => 8,
            FieldType::DateTimeMicroseconds => 8,
            FieldType::DateTimeNanoseconds => 8,
            FieldType::Ipv4Address => 4,
            FieldType::Ipv6Address => 16,
            FieldType::BasicList => VARIABLE_LENGTH,
            FieldType::Illegal => 0,
        }
    }

    /// Map the textual RFC 7011 type name to a type.
    /// Returns [`FieldType::Illegal`] for unrecognized names.
    pub fn from_name(name: &str) -> FieldType {
        match name {
            "octetArray" => FieldType::OctetArray,
            "unsigned8" => FieldType::Unsigned8,
            "unsigned16" => FieldType::Unsigned16,
            "unsigned32" => FieldType::Unsigned32,
            "unsigned64" => FieldType::Unsigned64,
            "signed8" => FieldType::Signed8,
            "signed16" => FieldType::Signed16,
            "signed32" => FieldType::Signed32,
            "signed64" => FieldType::Signed64,
            "float32" => FieldType::Float32,
            "float64" => FieldType::Float64,
            "boolean" => FieldType::Boolean,
            "macAddress" => FieldType::MacAddress,
            "string" => FieldType::String,
            "dateTimeSeconds" => FieldType::DateTimeSeconds,
            "dateTimeMilliseconds" => FieldType::DateTimeMilliseconds,
            "dateTimeMicroseconds" => FieldType::DateTimeMicroseconds,
            "dateTimeNanoseconds" => FieldType::DateTimeNanoseconds,
            "ipv4Address" => FieldType::Ipv4Address,
            "ipv6Address" => FieldType::Ipv6Address,
            "basicList" => FieldType::BasicList,
            _ => FieldType::Illegal,
        }
    }

    fn name(self) -> &'static str {
        match self {
            FieldType::OctetArray => "octetArray",
            FieldType::Unsigned8 => "unsigned8",
            FieldType::Unsigned16 => "unsigned16",
            FieldType::Unsigned32 => "unsigned32",
            FieldType::Unsigned64 => "unsigned64",
            FieldType::Signed8 => "signed8",
            FieldType::Signed16 => "signed16",
            FieldType::Signed32 => "signed32",
            FieldType::Signed64 => "signed64",
            FieldType::Float32 => "float32",
            FieldType::Float64 => "float64",
            FieldType::Boolean => "boolean",
            FieldType::MacAddress => "macAddress",
            FieldType::String => "string",
            FieldType::DateTimeSeconds => "dateTimeSeconds",
            FieldType::DateTimeMilliseconds => "dateTimeMilliseconds",
            FieldType::DateTimeMicroseconds => "dateTimeMicroseconds",
            FieldType::DateTimeNanoseconds => "dateTimeNanoseconds",
            FieldType::Ipv4Address => "ipv4Address",
            FieldType::Ipv6Address => "ipv6Address",
            FieldType::BasicList => "basicList",
            FieldType::Illegal => "<bad>",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A dynamically typed application value.
///
/// Values are loosely typed on purpose: the template decides the on-wire
/// type and the serializer coerces the value into it, so callers can hand
/// over whatever representation they already hold. `From` conversions cover
/// the common shapes:
///
/// ```
/// use ipfix_exporter::FieldValue;
/// use std::net::Ipv4Addr;
///
/// let _: FieldValue = 5u64.into();
/// let _: FieldValue = Ipv4Addr::new(192, 168, 0, 1).into();
/// let _: FieldValue = "dns".into();
/// let _: FieldValue = FieldValue::list([1u64, 2, 3]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Absent value; encodes as zero / empty
    Null,
    Unsigned(u64),
    Signed(i64),
    Float(f64),
    Bool(bool),
    Bytes(Vec<u8>),
    String(String),
    Ipv4(Ipv4Addr),
    Ipv6(Ipv6Addr),
    Mac([u8; 6]),
    /// Wall-clock time
    Time(SystemTime),
    /// Duration since the Unix epoch, in milliseconds
    Milliseconds(u64),
    /// Duration since the Unix epoch, in microseconds
    Microseconds(u64),
    /// Duration since the Unix epoch, in nanoseconds
    Nanoseconds(u64),
    /// Element sequence for basic lists
    List(Vec<FieldValue>),
}

impl FieldValue {
    /// Build a list value from anything convertible to field values
    pub fn list<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<FieldValue>,
    {
        FieldValue::List(items.into_iter().map(Into::into).collect())
    }

    /// Shape name used in conversion error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldValue::Null => "null",
            FieldValue::Unsigned(_) => "unsigned integer",
            FieldValue::Signed(_) => "signed integer",
            FieldValue::Float(_) => "float",
            FieldValue::Bool(_) => "boolean",
            FieldValue::Bytes(_) => "byte array",
            FieldValue::String(_) => "string",
            FieldValue::Ipv4(_) => "ipv4 address",
            FieldValue::Ipv6(_) => "ipv6 address",
            FieldValue::Mac(_) => "mac address",
            FieldValue::Time(_) => "time",
            FieldValue::Milliseconds(_) => "milliseconds timestamp",
            FieldValue::Microseconds(_) => "microseconds timestamp",
            FieldValue::Nanoseconds(_) => "nanoseconds timestamp",
            FieldValue::List(_) => "list",
        }
    }
}

macro_rules! value_from_unsigned {
    ($($t:ty),*) => {$(
        impl From<$t> for FieldValue {
            fn from(value: $t) -> Self {
                FieldValue::Unsigned(u64::from(value))
            }
        }
    )*};
}

macro_rules! value_from_signed {
    ($($t:ty),*) => {$(
        impl From<$t> for FieldValue {
            fn from(value: $t) -> Self {
                FieldValue::Signed(i64::from(value))
            }
        }
    )*};
}

value_from_unsigned!(u8, u16, u32, u64);
value_from_signed!(i8, i16, i32, i64);

impl From<f32> for FieldValue {
    fn from(value: f32) -> Self {
        FieldValue::Float(f64::from(value))
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::String(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::String(value)
    }
}

impl From<&[u8]> for FieldValue {
    fn from(value: &[u8]) -> Self {
        FieldValue::Bytes(value.to_vec())
    }
}

impl From<Vec<u8>> for FieldValue {
    fn from(value: Vec<u8>) -> Self {
        FieldValue::Bytes(value)
    }
}

impl From<Ipv4Addr> for FieldValue {
    fn from(value: Ipv4Addr) -> Self {
        FieldValue::Ipv4(value)
    }
}

impl From<Ipv6Addr> for FieldValue {
    fn from(value: Ipv6Addr) -> Self {
        FieldValue::Ipv6(value)
    }
}

impl From<IpAddr> for FieldValue {
    fn from(value: IpAddr) -> Self {
        match value {
            IpAddr::V4(ip) => FieldValue::Ipv4(ip),
            IpAddr::V6(ip) => FieldValue::Ipv6(ip),
        }
    }
}

impl From<[u8; 6]> for FieldValue {
    fn from(value: [u8; 6]) -> Self {
        FieldValue::Mac(value)
    }
}

impl From<SystemTime> for FieldValue {
    fn from(value: SystemTime) -> Self {
        FieldValue::Time(value)
    }
}

impl From<Vec<FieldValue>> for FieldValue {
    fn from(value: Vec<FieldValue>) -> Self {
        FieldValue::List(value)
    }
}

/// Export clock handed to every stream operation.
///
/// Patched into the message header as 32-bit Unix seconds when the message
/// is flushed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExportTime {
    /// Wall-clock time
    Wall(SystemTime),
    /// Seconds since the Unix epoch
    Seconds(u64),
    /// Milliseconds since the Unix epoch
    Milliseconds(u64),
    /// Microseconds since the Unix epoch
    Microseconds(u64),
    /// Nanoseconds since the Unix epoch
    Nanoseconds(u64),
}

impl ExportTime {
    /// Current wall-clock time
    pub fn now() -> Self {
        ExportTime::Wall(SystemTime::now())
    }

    pub(crate) fn unix_seconds(self) -> u32 {
        match self {
            ExportTime::Wall(t) => unix_parts(t).0 as u32,
            ExportTime::Seconds(v) => v as u32,
            ExportTime::Milliseconds(v) => (v / 1_000) as u32,
            ExportTime::Microseconds(v) => (v / 1_000_000) as u32,
            ExportTime::Nanoseconds(v) => (v / 1_000_000_000) as u32,
        }
    }
}

impl From<SystemTime> for ExportTime {
    fn from(value: SystemTime) -> Self {
        ExportTime::Wall(value)
    }
}

/// Split a wall-clock time into Unix seconds and nanosecond-of-second.
/// Times before the epoch clamp to zero.
pub(crate) fn unix_parts(t: SystemTime) -> (u64, u64) {
    match t.duration_since(UNIX_EPOCH) {
        Ok(d) => (d.as_secs(), u64::from(d.subsec_nanos())),
        Err(_) => (0, 0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_default_sizes() {
        assert_eq!(FieldType::Unsigned64.default_size(), 8);
        assert_eq!(FieldType::Ipv4Address.default_size(), 4);
        assert_eq!(FieldType::Ipv6Address.default_size(), 16);
        assert_eq!(FieldType::MacAddress.default_size(), 6);
        assert_eq!(FieldType::String.default_size(), VARIABLE_LENGTH);
        assert_eq!(FieldType::BasicList.default_size(), VARIABLE_LENGTH);
    }

    #[test]
    fn test_type_names_round_trip() {
        let names = [
            "octetArray",
            "unsigned8",
            "unsigned16",
            "unsigned32",
            "unsigned64",
            "signed8",
            "signed16",
            "signed32",
            "signed64",
            "float32",
            "float64",
            "boolean",
            "macAddress",
            "string",
            "dateTimeSeconds",
            "dateTimeMilliseconds",
            "dateTimeMicroseconds",
            "dateTimeNanoseconds",
            "ipv4Address",
            "ipv6Address",
            "basicList",
        ];
        for name in names {
            let kind = FieldType::from_name(name);
            assert_ne!(kind, FieldType::Illegal, "{name}");
            assert_eq!(kind.to_string(), name);
        }
        assert_eq!(FieldType::from_name("uint128"), FieldType::Illegal);
    }

    #[test]
    fn test_export_time_unix_seconds() {
        let t = SystemTime::UNIX_EPOCH + Duration::from_secs(1_514_764_800);
        assert_eq!(ExportTime::Wall(t).unix_seconds(), 1_514_764_800);
        assert_eq!(ExportTime::Seconds(1_514_764_800).unix_seconds(), 1_514_764_800);
        assert_eq!(ExportTime::Milliseconds(1_514_764_800_123).unix_seconds(), 1_514_764_800);
        assert_eq!(ExportTime::Microseconds(1_514_764_800_123_456).unix_seconds(), 1_514_764_800);
        assert_eq!(
            ExportTime::Nanoseconds(1_514_764_800_123_456_789).unix_seconds(),
            1_514_764_800
        );
    }

    #[test]
    fn test_value_conversions() {
        assert_eq!(FieldValue::from(5u8), FieldValue::Unsigned(5));
        assert_eq!(FieldValue::from(-3i32), FieldValue::Signed(-3));
        assert_eq!(FieldValue::from("x"), FieldValue::String("x".to_string()));
        assert_eq!(
            FieldValue::from(IpAddr::V4(Ipv4Addr::LOCALHOST)),
            FieldValue::Ipv4(Ipv4Addr::LOCALHOST)
        );
        assert_eq!(
            FieldValue::list([1u16, 2]),
            FieldValue::List(vec![FieldValue::Unsigned(1), FieldValue::Unsigned(2)])
        );
    }
}
