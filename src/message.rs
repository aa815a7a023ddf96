//! Message stream assembly
//!
//! The stream owns one MTU-sized message buffer and fills it with sets as
//! records arrive. Records of one set id coalesce behind a shared set
//! header; an id change closes the set; a full buffer flushes the message
//! and restarts the record in a fresh one. Message length and export time
//! are patched into the header when the message is flushed.

use crate::buffer::{MessageBuffer, RecordBuffer, SerializeBuffer};
use crate::error::{ExportError, Result};
use crate::ie::InformationElement;
use crate::set::{DATA_SET_MIN_ID, SET_HEADER_LEN, Record, SetBuilder};
use crate::template::Template;
use crate::types::{ExportTime, FieldValue};
use std::io::Write;

/// IPFIX protocol version (RFC 7011 section 3.1)
const MESSAGE_VERSION: u16 = 0x000a;

/// Bytes taken by a message header
const MESSAGE_HEADER_LEN: usize = 16;

/// Smallest usable MTU: a message header, a set header and at least a
/// one-byte record, with room to spare for the template that defines it
const MIN_MTU: u16 = 28;

/// Builder for a stream of IPFIX messages on a byte sink.
///
/// Created over anything [`Write`]; templates are registered with
/// [`add_template`](Self::add_template) and data records exported with
/// [`send_data`](Self::send_data). Records are buffered into messages no
/// longer than the MTU and leave through the sink on
/// [`flush`](Self::flush), or earlier when a record does not fit the
/// message being built.
#[derive(Debug)]
pub struct MessageStream<W: Write> {
    sink: W,
    buffer: MessageBuffer,
    record: RecordBuffer,
    templates: Vec<Template>,
    current_set: SetBuilder,
    length_slot: usize,
    time_slot: usize,
    sequence: u32,
    observation_id: u32,
    mtu: u16,
    dirty: bool,
}

impl<W: Write> MessageStream<W> {
    /// Create a message stream writing messages of at most `mtu` bytes.
    /// An `mtu` of 0 selects the largest expressible message (65535
    /// bytes); anything below 28 is refused. `observation_id` lands
    /// unchanged in every message header.
    pub fn new(sink: W, mtu: u16, observation_id: u32) -> Result<Self> {
        let mtu = if mtu == 0 { u16::MAX } else { mtu };
        if mtu < MIN_MTU {
            return Err(ExportError::MtuTooSmall(mtu));
        }
        Ok(Self {
            sink,
            buffer: MessageBuffer::with_capacity(usize::from(mtu)),
            record: RecordBuffer::with_capacity(usize::from(mtu)),
            templates: Vec::new(),
            current_set: SetBuilder::default(),
            length_slot: 0,
            time_slot: 0,
            sequence: 0,
            observation_id,
            mtu,
            dirty: false,
        })
    }

    /// Register a template over `elements` and write its definition to the
    /// stream. Returns the new template id; ids start at 256 and are
    /// assigned densely in registration order. Template records do not
    /// advance the sequence counter (RFC 7011 section 3.1).
    pub fn add_template<I>(&mut self, now: ExportTime, elements: I) -> Result<u16>
    where
        I: IntoIterator<Item = InformationElement>,
    {
        let id = DATA_SET_MIN_ID + self.templates.len() as u16;
        let mut template = Template::new(id, elements.into_iter().collect());
        self.send_record(&mut template, now)?;
        self.templates.push(template);
        Ok(id)
    }

    /// Re-send the definition of an already registered template, for
    /// periodic refresh over unreliable transports.
    pub fn send_template(&mut self, now: ExportTime, template: u16) -> Result<()> {
        let mut record = self.templates[self.template_index(template)?].clone();
        self.send_record(&mut record, now)
    }

    /// Export one data record of template `template`. `values` must match
    /// the template's elements in count and order. On success the sequence
    /// counter advances by one.
    pub fn send_data(&mut self, now: ExportTime, template: u16, values: &[FieldValue]) -> Result<()> {
        let index = self.template_index(template)?;
        let mut record = std::mem::take(&mut self.record);
        let result = match self.templates[index].assign_record(&mut record, values) {
            Ok(()) => self.send_record(&mut record, now),
            // the staging buffer is MTU-sized, so a record that overflows
            // it cannot fit any message either
            Err(ExportError::BufferFull(missing)) => Err(ExportError::RecordTooBig {
                required: MESSAGE_HEADER_LEN + SET_HEADER_LEN + record.byte_len() + missing,
                mtu: self.mtu,
            }),
            Err(e) => Err(e),
        };
        self.record = record;
        result
    }

    /// Finalize and write out the message under construction. Converts
    /// `now` to 32-bit Unix seconds for the export time field. A clean
    /// stream flushes to nothing. On a sink error the message stays
    /// buffered and dirty, so flushing again retries the write.
    pub fn flush(&mut self, now: ExportTime) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }
        self.current_set.finalize(&mut self.buffer);
        self.buffer.patch_u16(self.length_slot, self.buffer.len() as u16);
        self.buffer.patch_u32(self.time_slot, now.unix_seconds());
        self.buffer.finalize(&mut self.sink)?;
        self.dirty = false;
        Ok(())
    }

    /// Count of data records exported so far, modulo 2^32
    pub fn sequence(&self) -> u32 {
        self.sequence
    }

    /// Observation domain id stamped into every message
    pub fn observation_id(&self) -> u32 {
        self.observation_id
    }

    /// Maximum message length in bytes
    pub fn mtu(&self) -> u16 {
        self.mtu
    }

    /// Give back the sink, dropping any unflushed message
    pub fn into_sink(self) -> W {
        self.sink
    }

    fn template_index(&self, template: u16) -> Result<usize> {
        template
            .checked_sub(DATA_SET_MIN_ID)
            .map(usize::from)
            .filter(|index| *index < self.templates.len())
            .ok_or(ExportError::UnknownTemplate(template))
    }

    /// Open a new message: 16-byte header with version, sequence and
    /// observation domain; length and export time are patched on flush.
    fn start_message(&mut self) -> Result<()> {
        let base = self.buffer.len();
        let header = self.buffer.append(MESSAGE_HEADER_LEN)?;
        header[..2].copy_from_slice(&MESSAGE_VERSION.to_be_bytes());
        header[8..12].copy_from_slice(&self.sequence.to_be_bytes());
        header[12..16].copy_from_slice(&self.observation_id.to_be_bytes());
        self.length_slot = base + 2;
        self.time_slot = base + 4;
        self.dirty = true;
        Ok(())
    }

    /// Append a record to the current set, recovering from the two
    /// internal signals: a mismatched set id closes the set and retries, a
    /// full buffer flushes the message and retries in a fresh one. The
    /// record is restarted whole on every retry; it never lands partially
    /// in a message. A record that cannot fit even an empty message is
    /// rejected as too big before anything reaches the sink.
    fn send_record(&mut self, record: &mut dyn Record, now: ExportTime) -> Result<()> {
        if !self.dirty {
            self.start_message()?;
        }
        loop {
            match self.current_set.append_record(&mut self.buffer, record) {
                Ok(()) => {
                    if record.set_id() >= DATA_SET_MIN_ID {
                        self.sequence = self.sequence.wrapping_add(1);
                    }
                    return Ok(());
                }
                Err(ExportError::BufferFull(missing)) => {
                    if self.buffer.len() == MESSAGE_HEADER_LEN {
                        return Err(ExportError::RecordTooBig {
                            required: MESSAGE_HEADER_LEN + missing,
                            mtu: self.mtu,
                        });
                    }
                    self.flush(now)?;
                    self.start_message()?;
                }
                Err(ExportError::SetMismatch { .. }) => {
                    self.current_set.finalize(&mut self.buffer);
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FieldType;

    fn u64_element() -> InformationElement {
        InformationElement::new("octetDeltaCount", 0, 1, FieldType::Unsigned64, 0)
    }

    #[test]
    fn test_mtu_validation() {
        assert!(matches!(
            MessageStream::new(Vec::new(), 27, 0),
            Err(ExportError::MtuTooSmall(27))
        ));
        assert_eq!(MessageStream::new(Vec::new(), 28, 0).unwrap().mtu(), 28);
        assert_eq!(MessageStream::new(Vec::new(), 0, 0).unwrap().mtu(), 65535);
    }

    #[test]
    fn test_flush_without_records_writes_nothing() {
        let mut stream = MessageStream::new(Vec::new(), 0, 0).unwrap();
        stream.flush(ExportTime::Seconds(0)).unwrap();
        assert!(stream.into_sink().is_empty());
    }

    #[test]
    fn test_template_ids_are_dense() {
        let mut stream = MessageStream::new(Vec::new(), 0, 0).unwrap();
        let now = ExportTime::Seconds(0);
        assert_eq!(stream.add_template(now, vec![u64_element()]).unwrap(), 256);
        assert_eq!(stream.add_template(now, vec![u64_element()]).unwrap(), 257);
    }

    #[test]
    fn test_templates_do_not_advance_sequence() {
        let mut stream = MessageStream::new(Vec::new(), 0, 0).unwrap();
        let now = ExportTime::Seconds(0);
        let id = stream.add_template(now, vec![u64_element()]).unwrap();
        assert_eq!(stream.sequence(), 0);
        stream.send_data(now, id, &[1u64.into()]).unwrap();
        stream.send_data(now, id, &[2u64.into()]).unwrap();
        assert_eq!(stream.sequence(), 2);
    }

    #[test]
    fn test_unknown_template_ids() {
        let mut stream = MessageStream::new(Vec::new(), 0, 0).unwrap();
        let now = ExportTime::Seconds(0);
        assert!(matches!(
            stream.send_data(now, 256, &[1u64.into()]),
            Err(ExportError::UnknownTemplate(256))
        ));
        assert!(matches!(
            stream.send_data(now, 255, &[1u64.into()]),
            Err(ExportError::UnknownTemplate(255))
        ));
        assert!(matches!(
            stream.send_template(now, 300),
            Err(ExportError::UnknownTemplate(300))
        ));
    }

    #[test]
    fn test_arity_mismatch_emits_nothing() {
        let mut out = Vec::new();
        let now = ExportTime::Seconds(0);
        let mut stream = MessageStream::new(&mut out, 0, 0).unwrap();
        let id = stream.add_template(now, vec![u64_element()]).unwrap();
        stream.flush(now).unwrap();

        assert!(matches!(
            stream.send_data(now, id, &[1u64.into(), 2u64.into()]),
            Err(ExportError::TemplateMismatch { given: 2, required: 1 })
        ));
        // the failed record opened no message, so flushing adds nothing
        stream.flush(now).unwrap();
        drop(stream);
        assert_eq!(out.len(), 16 + 4 + 8);
    }

    #[test]
    fn test_failed_record_leaves_message_intact() {
        let mut stream = MessageStream::new(Vec::new(), 0, 0).unwrap();
        let now = ExportTime::Seconds(7);
        let id = stream.add_template(now, vec![u64_element()]).unwrap();
        // arity mismatch surfaces without disturbing the open message
        assert!(matches!(
            stream.send_data(now, id, &[]),
            Err(ExportError::TemplateMismatch { given: 0, required: 1 })
        ));
        stream.send_data(now, id, &[9u64.into()]).unwrap();
        stream.flush(now).unwrap();
        assert_eq!(stream.sequence(), 1);

        let bytes = stream.into_sink();
        // one message: header, template set, one-record data set
        assert_eq!(bytes.len(), 16 + (4 + 8) + (4 + 8));
        assert_eq!(u16::from_be_bytes([bytes[2], bytes[3]]) as usize, bytes.len());
    }

    #[test]
    fn test_send_template_resends_same_definition() {
        let mut stream = MessageStream::new(Vec::new(), 0, 0).unwrap();
        let now = ExportTime::Seconds(0);
        let id = stream.add_template(now, vec![u64_element()]).unwrap();
        stream.send_template(now, id).unwrap();
        stream.flush(now).unwrap();
        assert_eq!(stream.sequence(), 0);

        let bytes = stream.into_sink();
        // both template records coalesce into one template set
        assert_eq!(bytes.len(), 16 + 4 + 8 + 8);
        assert_eq!(&bytes[16..20], [0x00, 0x02, 0x00, 0x14]);
        assert_eq!(bytes[20..28], bytes[28..36]);
    }
}
