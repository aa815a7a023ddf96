//! Information elements and RFC 6313 basic lists
//!
//! References:
//! - <https://datatracker.ietf.org/doc/html/rfc7011#section-3.2>
//! - <https://datatracker.ietf.org/doc/html/rfc6313>
//! - <https://www.iana.org/assignments/ipfix/ipfix.xhtml>

use crate::buffer::SerializeBuffer;
use crate::error::{ExportError, Result};
use crate::field_serializer::serialize_value;
use crate::types::{FieldType, FieldValue, VARIABLE_LENGTH};
use serde::Serialize;
use std::fmt;

/// IANA information element id assigned to basicList (RFC 6313)
pub const BASIC_LIST_ID: u16 = 291;

/// Structured data semantics from RFC 6313 section 4.4
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[repr(u8)]
pub enum ListSemantic {
    NoneOf = 0,
    ExactlyOneOf = 1,
    OneOrMoreOf = 2,
    AllOf = 3,
    Ordered = 4,
    Undefined = 0xFF,
}

/// Immutable field descriptor: a name, an enterprise number (0 for IANA
/// elements), a numeric id, an abstract type and an on-wire length.
/// Basic lists additionally carry the descriptor of their element type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InformationElement {
    pub name: String,
    pub pen: u32,
    pub id: u16,
    pub kind: FieldType,
    /// On-wire length in bytes; [`VARIABLE_LENGTH`] marks variable fields
    pub length: u16,
    pub sub_element: Option<Box<InformationElement>>,
}

impl InformationElement {
    /// Create an information element. A zero `length` is replaced by the
    /// type's default size.
    pub fn new(name: impl Into<String>, pen: u32, id: u16, kind: FieldType, length: u16) -> Self {
        let length = if length == 0 && kind != FieldType::Illegal {
            kind.default_size()
        } else {
            length
        };
        Self {
            name: name.into(),
            pen,
            id,
            kind,
            length,
            sub_element: None,
        }
    }

    /// Create a basicList element holding `count` values of `sub_element`.
    /// A `count` of zero, or a variable-length `sub_element`, makes the
    /// list itself variable-length.
    pub fn basic_list(name: impl Into<String>, sub_element: InformationElement, count: u16) -> Self {
        let length = if count == 0 || sub_element.length == VARIABLE_LENGTH {
            VARIABLE_LENGTH
        } else {
            1 + sub_element.template_size() as u16 + count * sub_element.length
        };
        Self {
            name: name.into(),
            pen: 0,
            id: BASIC_LIST_ID,
            kind: FieldType::BasicList,
            length,
            sub_element: Some(Box::new(sub_element)),
        }
    }

    /// Bytes this element occupies in a template record: 4 for IANA
    /// elements, 8 when an enterprise number is present.
    pub fn template_size(&self) -> usize {
        if self.pen == 0 { 4 } else { 8 }
    }

    /// Write the field specifier for a template record. The enterprise bit
    /// of the id marks elements with a private enterprise number.
    pub(crate) fn serialize_template_header<B: SerializeBuffer>(&self, out: &mut B) -> Result<usize> {
        if self.pen == 0 {
            let window = out.append(4)?;
            window[..2].copy_from_slice(&self.id.to_be_bytes());
            window[2..].copy_from_slice(&self.length.to_be_bytes());
            return Ok(4);
        }
        let window = out.append(8)?;
        window[..2].copy_from_slice(&(self.id | 0x8000).to_be_bytes());
        window[2..4].copy_from_slice(&self.length.to_be_bytes());
        window[4..].copy_from_slice(&self.pen.to_be_bytes());
        Ok(8)
    }

    /// Encode one value of this element into `out`.
    ///
    /// Scalar types delegate to the field serializer. Basic lists emit the
    /// RFC 6313 layout: a semantic byte, the element type's field
    /// specifier, then every list element, wrapped in variable-length
    /// framing when the list's declared length is variable.
    pub(crate) fn serialize_data<B: SerializeBuffer>(
        &self,
        out: &mut B,
        value: &FieldValue,
    ) -> Result<usize> {
        if self.kind != FieldType::BasicList {
            return serialize_value(out, self.kind, value, self.length);
        }
        let sub = self
            .sub_element
            .as_deref()
            .ok_or(ExportError::IllegalType(FieldType::BasicList))?;
        let elements: &[FieldValue] = match value {
            FieldValue::List(items) => items,
            FieldValue::Null => &[],
            other => {
                return Err(ExportError::Conversion {
                    want: FieldType::BasicList,
                    have: other.type_name(),
                });
            }
        };

        let variable = self.length == VARIABLE_LENGTH;
        let mut length_slot = 0;
        if variable {
            // always the three-byte form, so the length can be patched in
            // place once the content size is known
            let slot = out.len() + 1;
            let window = out.append(3)?;
            window[0] = 0xff;
            length_slot = slot;
        } else {
            let per_element = usize::from(sub.length);
            if per_element == 0 {
                return Err(ExportError::IllegalType(sub.kind));
            }
            let content = usize::from(self.length)
                .checked_sub(1 + sub.template_size())
                .ok_or(ExportError::Size {
                    kind: FieldType::BasicList,
                    length: usize::from(self.length),
                })?;
            let required = content / per_element;
            if elements.len() != required {
                return Err(ExportError::BasicListMismatch {
                    given: elements.len(),
                    required,
                });
            }
        }

        out.append(1)?[0] = ListSemantic::Undefined as u8;
        let mut written = 1;
        written += sub.serialize_template_header(out)?;
        for element in elements {
            written += sub.serialize_data(out, element)?;
        }

        if variable {
            out.patch_u16(length_slot, written as u16);
            Ok(written + 3)
        } else {
            debug_assert_eq!(written, usize::from(self.length));
            Ok(written)
        }
    }
}

impl fmt::Display for InformationElement {
    /// iespec form per RFC 7013 section 10.1, omitting the enterprise
    /// number when IANA-assigned and the length when it is the type default
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        if self.pen != 0 {
            write!(f, "{}/", self.pen)?;
        }
        write!(f, "{})<{}>", self.id, self.kind)?;
        if self.length != self.kind.default_size() {
            if self.length == VARIABLE_LENGTH {
                write!(f, "[v]")?;
            } else {
                write!(f, "[{}]", self.length)?;
            }
        }
        Ok(())
    }
}
