use crate::config::schema::ExportConfig;
use ipfix_exporter::{ExportError, Result};
use std::collections::HashSet;

/// Validate an export definition before anything is serialized
pub fn validate_config(config: &ExportConfig) -> Result<()> {
    if config.templates.is_empty() {
        return Err(ExportError::Validation(
            "export definition must contain at least one template".to_string(),
        ));
    }

    let mut names = HashSet::new();
    for template in &config.templates {
        if template.fields.is_empty() {
            return Err(ExportError::Validation(format!(
                "template '{}' has no fields",
                template.name
            )));
        }
        if !names.insert(template.name.as_str()) {
            return Err(ExportError::Validation(format!(
                "template name '{}' is used twice",
                template.name
            )));
        }
    }

    for record in &config.records {
        let Some(template) = config
            .templates
            .iter()
            .find(|t| t.name == record.template)
        else {
            return Err(ExportError::Validation(format!(
                "record references undefined template '{}'",
                record.template
            )));
        };
        if record.values.len() != template.fields.len() {
            return Err(ExportError::Validation(format!(
                "record for template '{}' has {} values, template has {} fields",
                record.template,
                record.values.len(),
                template.fields.len()
            )));
        }
    }

    Ok(())
}
