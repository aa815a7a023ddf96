use serde::{Deserialize, Serialize};

/// Root export definition
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ExportConfig {
    /// Observation domain id stamped into every message header
    #[serde(default)]
    pub observation_domain_id: u32,

    /// Maximum bytes per message; 0 selects the library default.
    /// Overridden by --mtu on the command line.
    #[serde(default)]
    pub mtu: u16,

    /// Extra information elements, one iespec per entry.
    /// Common IANA elements are available without listing them here.
    #[serde(default)]
    pub elements: Vec<String>,

    /// Templates to register, in order
    pub templates: Vec<TemplateConfig>,

    /// Data records to export, in order
    #[serde(default)]
    pub records: Vec<RecordConfig>,
}

/// One template: a name for the records section to reference, and the
/// element names making up the record layout
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct TemplateConfig {
    pub name: String,
    pub fields: Vec<String>,
}

/// One data record: the template it belongs to and its values in template
/// order
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RecordConfig {
    pub template: String,
    pub values: Vec<serde_yaml::Value>,
}
