//! Fixed-capacity serialization buffers
//!
//! Both buffers hand out in-place writable windows and signal overflow
//! instead of growing. Patch targets inside them (set lengths, message
//! length and export time) are tracked as offsets and written back just
//! before the buffer leaves the process.

use crate::error::{ExportError, Result};
use crate::set::Record;
use std::io::{self, Write};

/// Append-only byte buffer with overflow signaling and offset patching
pub(crate) trait SerializeBuffer {
    /// Reserve `count` bytes and return them for writing, or signal
    /// [`ExportError::BufferFull`] carrying `count` when they do not fit.
    fn append(&mut self, count: usize) -> Result<&mut [u8]>;

    fn bytes_free(&self) -> usize;

    fn len(&self) -> usize;

    /// Write a big-endian u16 over two already-appended bytes
    fn patch_u16(&mut self, offset: usize, value: u16);
}

/// Message assembly buffer with capacity fixed to the stream MTU.
/// The limit is tracked separately because `Vec` may over-allocate.
#[derive(Debug)]
pub(crate) struct MessageBuffer {
    buf: Vec<u8>,
    capacity: usize,
}

impl MessageBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Write a big-endian u32 over four already-appended bytes
    pub fn patch_u32(&mut self, offset: usize, value: u32) {
        self.buf[offset..offset + 4].copy_from_slice(&value.to_be_bytes());
    }

    /// Write the assembled message to the sink and reset to empty.
    /// The buffer keeps its content when the write fails so the caller
    /// can retry against a recovered sink.
    pub fn finalize<W: Write>(&mut self, sink: &mut W) -> io::Result<()> {
        sink.write_all(&self.buf)?;
        self.buf.clear();
        Ok(())
    }
}

impl SerializeBuffer for MessageBuffer {
    fn append(&mut self, count: usize) -> Result<&mut [u8]> {
        if self.bytes_free() < count {
            return Err(ExportError::BufferFull(count));
        }
        let start = self.buf.len();
        self.buf.resize(start + count, 0);
        Ok(&mut self.buf[start..])
    }

    fn bytes_free(&self) -> usize {
        self.capacity - self.buf.len()
    }

    fn len(&self) -> usize {
        self.buf.len()
    }

    fn patch_u16(&mut self, offset: usize, value: u16) {
        self.buf[offset..offset + 2].copy_from_slice(&value.to_be_bytes());
    }
}

/// Reusable staging buffer for one serialized data record.
///
/// Carries the set id (template identifier) of the record being staged.
/// Never grows: the capacity is fixed when the stream is built, and a
/// record that does not fit raises [`ExportError::BufferFull`].
#[derive(Debug, Default)]
pub(crate) struct RecordBuffer {
    buf: Vec<u8>,
    capacity: usize,
    set_id: u16,
}

impl RecordBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
            capacity,
            set_id: 0,
        }
    }

    /// Drop any staged bytes and restamp the buffer for a new record
    pub fn reset(&mut self, set_id: u16) {
        self.buf.clear();
        self.set_id = set_id;
    }
}

impl SerializeBuffer for RecordBuffer {
    fn append(&mut self, count: usize) -> Result<&mut [u8]> {
        if self.bytes_free() < count {
            return Err(ExportError::BufferFull(count));
        }
        let start = self.buf.len();
        self.buf.resize(start + count, 0);
        Ok(&mut self.buf[start..])
    }

    fn bytes_free(&self) -> usize {
        self.capacity - self.buf.len()
    }

    fn len(&self) -> usize {
        self.buf.len()
    }

    fn patch_u16(&mut self, offset: usize, value: u16) {
        self.buf[offset..offset + 2].copy_from_slice(&value.to_be_bytes());
    }
}

impl Record for RecordBuffer {
    fn set_id(&self) -> u16 {
        self.set_id
    }

    fn byte_len(&self) -> usize {
        self.buf.len()
    }

    fn serialize_to(&mut self, out: &mut MessageBuffer) -> Result<()> {
        let window = out.append(self.buf.len())?;
        window.copy_from_slice(&self.buf);
        self.buf.clear();
        Ok(())
    }
}
