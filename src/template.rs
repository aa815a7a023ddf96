//! Template records and data record assembly

use crate::buffer::{MessageBuffer, RecordBuffer, SerializeBuffer};
use crate::error::{ExportError, Result};
use crate::ie::InformationElement;
use crate::set::{Record, TEMPLATE_SET_ID};
use crate::types::FieldValue;

/// An ordered list of information elements under a stable identifier.
///
/// As a record, a template serializes its own definition into a template
/// set (set id 2). Data records referencing it are staged through
/// [`Template::assign_record`].
#[derive(Debug, Clone)]
pub(crate) struct Template {
    identifier: u16,
    elements: Vec<InformationElement>,
}

impl Template {
    pub fn new(identifier: u16, elements: Vec<InformationElement>) -> Self {
        Self {
            identifier,
            elements,
        }
    }

    /// Serialize `values` into the staging buffer as one data record of
    /// this template. The buffer is reset first; on error it holds partial
    /// bytes that the next assignment overwrites, and nothing reaches the
    /// message.
    pub fn assign_record(&self, record: &mut RecordBuffer, values: &[FieldValue]) -> Result<()> {
        if values.len() != self.elements.len() {
            return Err(ExportError::TemplateMismatch {
                given: values.len(),
                required: self.elements.len(),
            });
        }
        record.reset(self.identifier);
        for (element, value) in self.elements.iter().zip(values) {
            element.serialize_data(record, value)?;
        }
        Ok(())
    }
}

impl Record for Template {
    fn set_id(&self) -> u16 {
        TEMPLATE_SET_ID
    }

    fn byte_len(&self) -> usize {
        4 + self
            .elements
            .iter()
            .map(InformationElement::template_size)
            .sum::<usize>()
    }

    fn serialize_to(&mut self, out: &mut MessageBuffer) -> Result<()> {
        let header = out.append(4)?;
        header[..2].copy_from_slice(&self.identifier.to_be_bytes());
        header[2..].copy_from_slice(&(self.elements.len() as u16).to_be_bytes());
        for element in &self.elements {
            element.serialize_template_header(out)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FieldType;
    use std::net::Ipv4Addr;

    fn sample_template() -> Template {
        Template::new(
            256,
            vec![
                InformationElement::new("octetDeltaCount", 0, 1, FieldType::Unsigned64, 0),
                InformationElement::new("sourceIPv4Address", 0, 8, FieldType::Ipv4Address, 0),
            ],
        )
    }

    #[test]
    fn test_template_record_layout() {
        let mut template = sample_template();
        assert_eq!(template.set_id(), TEMPLATE_SET_ID);
        assert_eq!(template.byte_len(), 4 + 4 + 4);

        let mut out = MessageBuffer::with_capacity(64);
        template.serialize_to(&mut out).unwrap();
        let mut bytes = Vec::new();
        out.finalize(&mut bytes).unwrap();
        assert_eq!(
            bytes,
            [0x01, 0x00, 0x00, 0x02, 0x00, 0x01, 0x00, 0x08, 0x00, 0x08, 0x00, 0x04]
        );
    }

    #[test]
    fn test_assign_record_serializes_in_element_order() {
        let template = sample_template();
        let mut record = RecordBuffer::with_capacity(64);
        template
            .assign_record(
                &mut record,
                &[5u64.into(), Ipv4Addr::new(192, 168, 0, 1).into()],
            )
            .unwrap();
        assert_eq!(record.set_id(), 256);
        assert_eq!(record.byte_len(), 12);
    }

    #[test]
    fn test_assign_record_checks_arity() {
        let template = sample_template();
        let mut record = RecordBuffer::with_capacity(64);
        assert!(matches!(
            template.assign_record(&mut record, &[5u64.into()]),
            Err(ExportError::TemplateMismatch { given: 1, required: 2 })
        ));
    }

    #[test]
    fn test_reassignment_overwrites_failed_record() {
        let template = sample_template();
        let mut record = RecordBuffer::with_capacity(64);
        // a bad value leaves partial bytes behind
        assert!(
            template
                .assign_record(&mut record, &["oops".into(), FieldValue::Null])
                .is_err()
        );
        // the next assignment starts from a clean buffer
        template
            .assign_record(&mut record, &[1u64.into(), FieldValue::Null])
            .unwrap();
        assert_eq!(record.byte_len(), 12);
    }
}
