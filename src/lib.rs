#![doc = include_str!("../README.md")]

pub mod error;
pub mod ie;
pub mod message;
pub mod registry;
pub mod sink;
pub mod types;
pub mod validation;

mod buffer;
mod field_serializer;
mod set;
mod template;

// Re-export the core types for convenience
pub use error::{ExportError, Result};
pub use ie::{BASIC_LIST_ID, InformationElement, ListSemantic};
pub use message::MessageStream;
pub use registry::{ElementRegistry, parse_ie_spec};
pub use sink::UdpSink;
pub use types::{ExportTime, FieldType, FieldValue, VARIABLE_LENGTH};
