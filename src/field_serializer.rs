//! Field value encoding per RFC 7011 section 6.1
//!
//! Converts a loosely typed [`FieldValue`] into the on-wire encoding of one
//! field of a given abstract type and length. All multi-byte quantities are
//! big-endian. Basic lists are assembled one level up, by the information
//! element; asking this module to encode one is an error.

use crate::buffer::SerializeBuffer;
use crate::error::{ExportError, Result};
use crate::types::{FieldType, FieldValue, VARIABLE_LENGTH, unix_parts};

/// Seconds between the NTP epoch (1900-01-01) and the Unix epoch
/// (1970-01-01), used by the micro- and nanosecond time encodings.
const NTP_TO_UNIX: u32 = 0x83AA_7E80;

/// Encode `value` as one field of type `kind` in `length` bytes.
/// Returns the number of bytes written, including any variable-length
/// prefix.
pub(crate) fn serialize_value<B: SerializeBuffer>(
    out: &mut B,
    kind: FieldType,
    value: &FieldValue,
    length: u16,
) -> Result<usize> {
    match kind {
        FieldType::OctetArray
        | FieldType::Ipv4Address
        | FieldType::Ipv6Address
        | FieldType::MacAddress
        | FieldType::String => serialize_octet_array(out, kind, value, length),
        FieldType::Unsigned8
        | FieldType::Unsigned16
        | FieldType::Unsigned32
        | FieldType::Unsigned64
        | FieldType::Signed8
        | FieldType::Signed16
        | FieldType::Signed32
        | FieldType::Signed64
        | FieldType::Boolean => serialize_integer(out, kind, value, length),
        FieldType::Float32 | FieldType::Float64 => serialize_float(out, kind, value, length),
        FieldType::DateTimeSeconds
        | FieldType::DateTimeMilliseconds
        | FieldType::DateTimeMicroseconds
        | FieldType::DateTimeNanoseconds => serialize_datetime(out, kind, value),
        FieldType::BasicList | FieldType::Illegal => Err(ExportError::IllegalType(kind)),
    }
}

fn serialize_octet_array<B: SerializeBuffer>(
    out: &mut B,
    kind: FieldType,
    value: &FieldValue,
    length: u16,
) -> Result<usize> {
    let octets4;
    let octets16;
    let raw: Option<&[u8]> = match value {
        FieldValue::Bytes(bytes) => Some(bytes),
        FieldValue::String(s) => Some(s.as_bytes()),
        FieldValue::Ipv4(ip) => {
            octets4 = ip.octets();
            Some(&octets4)
        }
        FieldValue::Ipv6(ip) => {
            octets16 = ip.octets();
            Some(&octets16)
        }
        FieldValue::Mac(mac) => Some(mac),
        FieldValue::Null => None,
        other => {
            return Err(ExportError::Conversion {
                want: kind,
                have: other.type_name(),
            });
        }
    };
    let length = if length == 0 { kind.default_size() } else { length };

    if length == VARIABLE_LENGTH {
        let payload = raw.unwrap_or(&[]);
        let len = payload.len();
        if len == 0 {
            out.append(1)?[0] = 0;
            return Ok(1);
        }
        if len < 255 {
            let window = out.append(len + 1)?;
            window[0] = len as u8;
            window[1..].copy_from_slice(payload);
            return Ok(len + 1);
        }
        let window = out.append(len + 3)?;
        window[0] = 0xff;
        window[1..3].copy_from_slice(&(len as u16).to_be_bytes());
        window[3..].copy_from_slice(payload);
        return Ok(len + 3);
    }

    let length = usize::from(length);
    match raw {
        Some(payload) if payload.len() == length => {
            out.append(length)?.copy_from_slice(payload);
            Ok(length)
        }
        payload => {
            let is_address = matches!(
                kind,
                FieldType::Ipv4Address | FieldType::Ipv6Address | FieldType::MacAddress
            );
            if is_address {
                // only an absent address may deviate from the fixed size;
                // it encodes as all zeroes
                if payload.is_some() {
                    return Err(ExportError::Conversion {
                        want: kind,
                        have: value.type_name(),
                    });
                }
                out.append(length)?.fill(0);
                return Ok(length);
            }
            let payload = payload.unwrap_or(&[]);
            let copied = payload.len().min(length);
            let window = out.append(length)?;
            window[..copied].copy_from_slice(&payload[..copied]);
            window[copied..].fill(0);
            Ok(length)
        }
    }
}

fn serialize_integer<B: SerializeBuffer>(
    out: &mut B,
    kind: FieldType,
    value: &FieldValue,
    length: u16,
) -> Result<usize> {
    let val: u64 = match value {
        FieldValue::Unsigned(v) => *v,
        FieldValue::Signed(v) => *v as u64,
        FieldValue::Float(v) => *v as u64,
        // RFC 7011 section 6.1.5: true is 1, false is 2
        FieldValue::Bool(true) => 1,
        FieldValue::Bool(false) => 2,
        FieldValue::Null => 0,
        other => {
            return Err(ExportError::Conversion {
                want: kind,
                have: other.type_name(),
            });
        }
    };
    let length = if length == 0 { kind.default_size() } else { length };
    let length = usize::from(length);
    if !(1..=8).contains(&length) {
        return Err(ExportError::Size { kind, length });
    }
    // least significant `length` bytes of the 64-bit container
    out.append(length)?
        .copy_from_slice(&val.to_be_bytes()[8 - length..]);
    Ok(length)
}

fn serialize_float<B: SerializeBuffer>(
    out: &mut B,
    kind: FieldType,
    value: &FieldValue,
    length: u16,
) -> Result<usize> {
    let val: f64 = match value {
        FieldValue::Float(v) => *v,
        FieldValue::Unsigned(v) => *v as f64,
        FieldValue::Signed(v) => *v as f64,
        FieldValue::Bool(true) => 1.0,
        FieldValue::Bool(false) => 2.0,
        FieldValue::Null => 0.0,
        other => {
            return Err(ExportError::Conversion {
                want: kind,
                have: other.type_name(),
            });
        }
    };
    if kind == FieldType::Float32 {
        out.append(4)?
            .copy_from_slice(&(val as f32).to_bits().to_be_bytes());
        return Ok(4);
    }
    match length {
        // reduced-size encoding: downcast to the 32-bit representation
        4 => {
            out.append(4)?
                .copy_from_slice(&(val as f32).to_bits().to_be_bytes());
            Ok(4)
        }
        8 => {
            out.append(8)?.copy_from_slice(&val.to_bits().to_be_bytes());
            Ok(8)
        }
        _ => Err(ExportError::Size {
            kind,
            length: usize::from(length),
        }),
    }
}

fn serialize_datetime<B: SerializeBuffer>(
    out: &mut B,
    kind: FieldType,
    value: &FieldValue,
) -> Result<usize> {
    let (seconds, nanoseconds): (u64, u64) = match value {
        FieldValue::Time(t) => unix_parts(*t),
        FieldValue::Milliseconds(v) => (v / 1_000, (v % 1_000) * 1_000_000),
        FieldValue::Microseconds(v) => (v / 1_000_000, (v % 1_000_000) * 1_000),
        FieldValue::Nanoseconds(v) => (v / 1_000_000_000, v % 1_000_000_000),
        // bare numbers count nanoseconds since the Unix epoch
        FieldValue::Unsigned(v) => (v / 1_000_000_000, v % 1_000_000_000),
        FieldValue::Signed(v) => {
            let v = *v as u64;
            (v / 1_000_000_000, v % 1_000_000_000)
        }
        FieldValue::Float(v) => {
            let v = *v as u64;
            (v / 1_000_000_000, v % 1_000_000_000)
        }
        FieldValue::Null => (0, 0),
        other => {
            return Err(ExportError::Conversion {
                want: kind,
                have: other.type_name(),
            });
        }
    };
    match kind {
        FieldType::DateTimeSeconds => {
            out.append(4)?
                .copy_from_slice(&(seconds as u32).to_be_bytes());
            Ok(4)
        }
        FieldType::DateTimeMilliseconds => {
            let millis = seconds * 1_000 + nanoseconds / 1_000_000;
            out.append(8)?.copy_from_slice(&millis.to_be_bytes());
            Ok(8)
        }
        FieldType::DateTimeMicroseconds | FieldType::DateTimeNanoseconds => {
            // NTP format: 32-bit seconds since 1900, then a 32-bit binary
            // fraction of a second. RFC 7011 section 6.1.9 wants the
            // bottom 11 fraction bits zeroed for microsecond resolution;
            // they are masked, not rounded.
            let mut fraction = ((nanoseconds << 32) / 1_000_000_000) as u32;
            if kind == FieldType::DateTimeMicroseconds {
                fraction &= 0xFFFF_F800;
            }
            let window = out.append(8)?;
            window[..4].copy_from_slice(&((seconds as u32).wrapping_add(NTP_TO_UNIX)).to_be_bytes());
            window[4..].copy_from_slice(&fraction.to_be_bytes());
            Ok(8)
        }
        _ => Err(ExportError::IllegalType(kind)),
    }
}
