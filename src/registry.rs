//! Information element registry and iespec parsing
//!
//! Elements are registered under their name and looked up when templates
//! are declared. The registry is an explicit value: nothing here is
//! process-global, and two exporters can run with different element sets.
//!
//! The textual element form ("iespec", RFC 7013 section 10.1) is
//! `name(pen/id)<type>[length]` with the enterprise number and the length
//! optional, and `v` as length marking a variable-length field:
//!
//! ```text
//! octetDeltaCount(1)<unsigned64>
//! reverseOctetDeltaCount(29305/1)<unsigned64>
//! ipPayload(313)<octetArray>[v]
//! ```

use crate::error::{ExportError, Result};
use crate::ie::InformationElement;
use crate::types::{FieldType, VARIABLE_LENGTH};
use std::collections::HashMap;

/// Common IANA-assigned information elements, one iespec per entry.
/// A curated slice of <https://www.iana.org/assignments/ipfix/ipfix.xhtml>
/// covering the usual flow five-tuple, counters and timestamps.
const IANA_CORE_SPECS: &[&str] = &[
    "octetDeltaCount(1)<unsigned64>",
    "packetDeltaCount(2)<unsigned64>",
    "protocolIdentifier(4)<unsigned8>",
    "ipClassOfService(5)<unsigned8>",
    "tcpControlBits(6)<unsigned16>",
    "sourceTransportPort(7)<unsigned16>",
    "sourceIPv4Address(8)<ipv4Address>",
    "sourceIPv4PrefixLength(9)<unsigned8>",
    "ingressInterface(10)<unsigned32>",
    "destinationTransportPort(11)<unsigned16>",
    "destinationIPv4Address(12)<ipv4Address>",
    "destinationIPv4PrefixLength(13)<unsigned8>",
    "egressInterface(14)<unsigned32>",
    "ipNextHopIPv4Address(15)<ipv4Address>",
    "bgpSourceAsNumber(16)<unsigned32>",
    "bgpDestinationAsNumber(17)<unsigned32>",
    "bgpNextHopIPv4Address(18)<ipv4Address>",
    "sourceIPv6Address(27)<ipv6Address>",
    "destinationIPv6Address(28)<ipv6Address>",
    "flowLabelIPv6(31)<unsigned32>",
    "icmpTypeCodeIPv4(32)<unsigned16>",
    "sourceMacAddress(56)<macAddress>",
    "destinationMacAddress(80)<macAddress>",
    "applicationName(96)<string>",
    "flowEndReason(136)<unsigned8>",
    "flowId(148)<unsigned64>",
    "flowStartSeconds(150)<dateTimeSeconds>",
    "flowEndSeconds(151)<dateTimeSeconds>",
    "flowStartMilliseconds(152)<dateTimeMilliseconds>",
    "flowEndMilliseconds(153)<dateTimeMilliseconds>",
    "flowStartMicroseconds(154)<dateTimeMicroseconds>",
    "flowEndMicroseconds(155)<dateTimeMicroseconds>",
    "flowStartNanoseconds(156)<dateTimeNanoseconds>",
    "flowEndNanoseconds(157)<dateTimeNanoseconds>",
];

/// Name-keyed store of information element definitions
#[derive(Debug, Default)]
pub struct ElementRegistry {
    elements: HashMap<String, InformationElement>,
}

impl ElementRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry pre-loaded with common IANA elements
    pub fn with_iana_core() -> Self {
        let mut registry = Self::new();
        // the table is fixed and covered by tests; a line that fails to
        // parse or collides would be a build defect
        for spec in IANA_CORE_SPECS {
            if let Ok(element) = parse_ie_spec(spec) {
                let _ = registry.register(element);
            }
        }
        registry
    }

    /// Register an element under its name. Names are unique; registering
    /// a second element with the same name fails.
    pub fn register(&mut self, element: InformationElement) -> Result<()> {
        if self.elements.contains_key(&element.name) {
            return Err(ExportError::DuplicateElement(element.name));
        }
        self.elements.insert(element.name.clone(), element);
        Ok(())
    }

    /// Parse an iespec and register the resulting element
    pub fn register_spec(&mut self, spec: &str) -> Result<()> {
        self.register(parse_ie_spec(spec)?)
    }

    /// Register one iespec per line. Blank lines and `#` comments are
    /// skipped.
    pub fn load_spec_lines(&mut self, text: &str) -> Result<()> {
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            self.register_spec(line)?;
        }
        Ok(())
    }

    /// Look up an element by name
    pub fn lookup(&self, name: &str) -> Result<&InformationElement> {
        self.elements
            .get(name)
            .ok_or_else(|| ExportError::UnknownElement(name.to_string()))
    }

    /// Number of registered elements
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

/// Parse an iespec of the form `name(pen/id)<type>[length]`
pub fn parse_ie_spec(spec: &str) -> Result<InformationElement> {
    let malformed = || ExportError::MalformedSpec(spec.to_string());
    let spec_text = spec.trim();

    let open = spec_text.find('(').ok_or_else(malformed)?;
    let close = spec_text.find(')').ok_or_else(malformed)?;
    if open == 0 || close < open {
        return Err(malformed());
    }
    let name = &spec_text[..open];

    let numbers = &spec_text[open + 1..close];
    let (pen, id) = match numbers.split_once('/') {
        Some((pen, id)) => (
            pen.parse::<u32>().map_err(|_| malformed())?,
            id.parse::<u16>().map_err(|_| malformed())?,
        ),
        None => (0, numbers.parse::<u16>().map_err(|_| malformed())?),
    };

    let rest = &spec_text[close + 1..];
    let kind_text = rest
        .strip_prefix('<')
        .and_then(|r| r.split_once('>'))
        .ok_or_else(malformed)?;
    let (kind_name, tail) = kind_text;
    let kind = FieldType::from_name(kind_name);
    if kind == FieldType::Illegal {
        return Err(malformed());
    }

    let length = match tail {
        "" => 0,
        bracketed => {
            let inner = bracketed
                .strip_prefix('[')
                .and_then(|r| r.strip_suffix(']'))
                .ok_or_else(malformed)?;
            if inner == "v" {
                VARIABLE_LENGTH
            } else {
                inner.parse::<u16>().map_err(|_| malformed())?
            }
        }
    };

    Ok(InformationElement::new(name, pen, id, kind, length))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_spec() {
        let ie = parse_ie_spec("octetDeltaCount(1)<unsigned64>").unwrap();
        assert_eq!(ie.name, "octetDeltaCount");
        assert_eq!(ie.pen, 0);
        assert_eq!(ie.id, 1);
        assert_eq!(ie.kind, FieldType::Unsigned64);
        assert_eq!(ie.length, 8);
    }

    #[test]
    fn test_parse_enterprise_spec() {
        let ie = parse_ie_spec("reverseOctetDeltaCount(29305/1)<unsigned64>").unwrap();
        assert_eq!(ie.pen, 29305);
        assert_eq!(ie.id, 1);
    }

    #[test]
    fn test_parse_lengths() {
        let ie = parse_ie_spec("tag(5)<octetArray>[2]").unwrap();
        assert_eq!(ie.length, 2);
        let ie = parse_ie_spec("payload(313)<octetArray>[v]").unwrap();
        assert_eq!(ie.length, VARIABLE_LENGTH);
        // no length falls back to the type default
        let ie = parse_ie_spec("applicationName(96)<string>").unwrap();
        assert_eq!(ie.length, VARIABLE_LENGTH);
    }

    #[test]
    fn test_parse_rejects_malformed_specs() {
        for bad in [
            "",
            "octetDeltaCount",
            "(1)<unsigned64>",
            "x(1)",
            "x(1)<unsigned64",
            "x(1)<uint64>",
            "x(one)<unsigned64>",
            "x(1/2/3)<unsigned64>",
            "x(1)<unsigned64>[eight]",
            "x(1)<unsigned64>8",
        ] {
            assert!(
                matches!(parse_ie_spec(bad), Err(ExportError::MalformedSpec(_))),
                "{bad}"
            );
        }
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = ElementRegistry::new();
        registry.register_spec("octetDeltaCount(1)<unsigned64>").unwrap();
        assert_eq!(registry.lookup("octetDeltaCount").unwrap().id, 1);
        assert!(matches!(
            registry.lookup("packetDeltaCount"),
            Err(ExportError::UnknownElement(_))
        ));
    }

    #[test]
    fn test_duplicate_names_are_rejected() {
        let mut registry = ElementRegistry::new();
        registry.register_spec("octetDeltaCount(1)<unsigned64>").unwrap();
        assert!(matches!(
            registry.register_spec("octetDeltaCount(1)<unsigned64>"),
            Err(ExportError::DuplicateElement(_))
        ));
    }

    #[test]
    fn test_load_spec_lines_skips_comments() {
        let mut registry = ElementRegistry::new();
        registry
            .load_spec_lines(
                "# counters\noctetDeltaCount(1)<unsigned64>\n\npacketDeltaCount(2)<unsigned64>\n",
            )
            .unwrap();
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_iana_core_loads_completely() {
        let registry = ElementRegistry::with_iana_core();
        assert_eq!(registry.len(), IANA_CORE_SPECS.len());
        assert_eq!(registry.lookup("sourceIPv4Address").unwrap().id, 8);
        assert_eq!(
            registry.lookup("flowEndNanoseconds").unwrap().kind,
            FieldType::DateTimeNanoseconds
        );
        assert_eq!(
            registry.lookup("applicationName").unwrap().length,
            VARIABLE_LENGTH
        );
    }
}
