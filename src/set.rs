//! Incremental set assembly
//!
//! A set groups consecutive records sharing one set id behind a single
//! 4-byte set header. The builder coalesces matching records, refuses
//! mismatched ones, and checks free space before any record serializer
//! runs so a failing record never lands half-written in the message.

use crate::buffer::{MessageBuffer, SerializeBuffer};
use crate::error::{ExportError, Result};

/// Set id reserved for template sets (RFC 7011 section 3.3.2)
pub(crate) const TEMPLATE_SET_ID: u16 = 2;

/// Smallest set id usable for data sets; equals the first template id
pub(crate) const DATA_SET_MIN_ID: u16 = 256;

/// Bytes taken by a set header (id + length)
pub(crate) const SET_HEADER_LEN: usize = 4;

/// Anything that can be written into a set: a template definition or a
/// staged data record.
pub(crate) trait Record {
    /// Set id this record belongs to
    fn set_id(&self) -> u16;

    /// Serialized size in bytes
    fn byte_len(&self) -> usize;

    /// Write the record into the message buffer. Only called once the
    /// builder has verified the bytes fit.
    fn serialize_to(&mut self, out: &mut MessageBuffer) -> Result<()>;
}

/// Builder for the set currently open in the message buffer.
///
/// `id == 0` means no set is open; 0 is a reserved set id in IPFIX. While
/// open, `length_slot` is the offset of the 2-byte length field inside the
/// message buffer, patched on finalize.
#[derive(Debug, Default)]
pub(crate) struct SetBuilder {
    id: u16,
    length: usize,
    length_slot: usize,
}

impl SetBuilder {
    /// Append a record, opening a new set when none is open.
    ///
    /// Signals [`ExportError::BufferFull`] without touching the buffer when
    /// the record (plus set header, if one is needed) does not fit, and
    /// [`ExportError::SetMismatch`] when a set with a different id is open.
    pub fn append_record(&mut self, out: &mut MessageBuffer, record: &mut dyn Record) -> Result<()> {
        if self.id == 0 {
            return self.start_set(out, record);
        }
        if record.set_id() != self.id {
            return Err(ExportError::SetMismatch {
                got: record.set_id(),
                expected: self.id,
            });
        }
        let len = record.byte_len();
        if out.bytes_free() < len {
            return Err(ExportError::BufferFull(len));
        }
        record.serialize_to(out)?;
        self.length += len;
        Ok(())
    }

    fn start_set(&mut self, out: &mut MessageBuffer, record: &mut dyn Record) -> Result<()> {
        let length = record.byte_len() + SET_HEADER_LEN;
        if out.bytes_free() < length {
            return Err(ExportError::BufferFull(length));
        }
        let slot = out.len() + 2;
        let header = out.append(SET_HEADER_LEN)?;
        header[..2].copy_from_slice(&record.set_id().to_be_bytes());
        // header[2..4] is the length, patched on finalize
        self.id = record.set_id();
        self.length = length;
        self.length_slot = slot;
        record.serialize_to(out)
    }

    /// Patch the set length and close the set. Closing a set that was
    /// never opened is a no-op.
    pub fn finalize(&mut self, out: &mut MessageBuffer) {
        if self.length > 0 {
            out.patch_u16(self.length_slot, self.length as u16);
        }
        self.id = 0;
        self.length = 0;
    }
}
