use crate::config::schema::ExportConfig;
use ipfix_exporter::{ExportError, Result};
use std::fs;
use std::path::Path;

/// Parse a YAML export definition file
pub fn parse_yaml_file<P: AsRef<Path>>(path: P) -> Result<ExportConfig> {
    let contents = fs::read_to_string(path)?;
    parse_yaml_str(&contents)
}

/// Parse a YAML export definition string
pub fn parse_yaml_str(contents: &str) -> Result<ExportConfig> {
    serde_yaml::from_str(contents)
        .map_err(|e| ExportError::Validation(format!("failed to parse YAML: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_export() {
        let yaml = r#"
observation_domain_id: 1
templates:
  - name: flow
    fields: [octetDeltaCount, sourceIPv4Address]
records:
  - template: flow
    values: [5, "192.168.0.1"]
  - template: flow
    values: [10, "192.168.0.2"]
"#;

        let config = parse_yaml_str(yaml).unwrap();
        assert_eq!(config.observation_domain_id, 1);
        assert_eq!(config.templates.len(), 1);
        assert_eq!(config.templates[0].fields.len(), 2);
        assert_eq!(config.records.len(), 2);
    }

    #[test]
    fn test_parse_with_custom_elements() {
        let yaml = r#"
elements:
  - "myCounter(29305/42)<unsigned64>"
templates:
  - name: counters
    fields: [myCounter]
"#;

        let config = parse_yaml_str(yaml).unwrap();
        assert_eq!(config.elements.len(), 1);
        assert!(config.records.is_empty());
    }

    #[test]
    fn test_parse_rejects_missing_templates() {
        assert!(parse_yaml_str("observation_domain_id: 1\n").is_err());
    }
}
