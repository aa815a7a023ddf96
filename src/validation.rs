//! Export validation helpers using netflow_parser
//!
//! These helpers feed a finished export back through an IPFIX parser to
//! verify it is well-formed. Useful in tests and when wiring up a new
//! collector.

use crate::error::{ExportError, Result};
use netflow_parser::{NetflowPacket, NetflowParser};

/// Validate that `bytes` holds one or more well-formed IPFIX messages
/// and nothing else.
///
/// Messages are checked in order with one parser, so templates defined in
/// earlier messages cover data sets in later ones. Exports carrying
/// variable-length fields are beyond what the parser understands; validate
/// those against expected bytes instead.
pub fn validate_export(bytes: &[u8]) -> Result<()> {
    let mut parser = NetflowParser::default();
    let result = parser.parse_bytes(bytes);

    if let Some(error) = result.error {
        return Err(ExportError::Validation(format!(
            "invalid IPFIX stream: {error}"
        )));
    }

    if result.packets.is_empty() {
        return Err(ExportError::Validation(
            "no messages found in export".to_string(),
        ));
    }

    for packet in &result.packets {
        if !matches!(packet, NetflowPacket::IPFix(_)) {
            return Err(ExportError::Validation(
                "expected an IPFIX message, got a different NetFlow version".to_string(),
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_export_is_invalid() {
        assert!(validate_export(&[]).is_err());
    }

    #[test]
    fn test_garbage_is_invalid() {
        assert!(validate_export(&[0xde, 0xad, 0xbe, 0xef]).is_err());
    }
}
