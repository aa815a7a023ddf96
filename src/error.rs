use crate::types::FieldType;
use thiserror::Error;

/// Custom error types for the IPFIX exporter
#[derive(Error, Debug)]
pub enum ExportError {
    /// A single record can never fit a message of the configured MTU
    #[error("record needs {required} bytes but the maximum message size is {mtu}")]
    RecordTooBig { required: usize, mtu: u16 },

    /// Value count does not match the template arity
    #[error("template takes {required} values, got {given}")]
    TemplateMismatch { given: usize, required: usize },

    /// Element count does not match a fixed-size basic list
    #[error("basic list takes {required} elements, got {given}")]
    BasicListMismatch { given: usize, required: usize },

    /// Template id was never returned by add_template
    #[error("template id {0} unknown")]
    UnknownTemplate(u16),

    /// Value shape cannot be encoded as the requested type
    #[error("cannot encode {have} as {want}")]
    Conversion { want: FieldType, have: &'static str },

    /// Encoding length is not valid for the type
    #[error("illegal length {length} for type {kind}")]
    Size { kind: FieldType, length: usize },

    /// Type cannot be serialized directly
    #[error("illegal type {0}")]
    IllegalType(FieldType),

    /// MTU leaves no room for a message header, a set header and a record
    #[error("mtu {0} is too small for an IPFIX message")]
    MtuTooSmall(u16),

    /// Information element name collision in a registry
    #[error("information element {0} is already registered")]
    DuplicateElement(String),

    /// Information element name lookup failure
    #[error("no information element named {0} is registered")]
    UnknownElement(String),

    /// iespec text that does not match name(pen/id)<type>[length]
    #[error("malformed iespec '{0}'")]
    MalformedSpec(String),

    /// Export validation errors
    #[error("validation error: {0}")]
    Validation(String),

    /// Sink I/O errors
    #[error("sink error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal signal: the message buffer cannot take the requested bytes.
    /// Recovered by MessageStream (flush and retry) and only surfaced when
    /// the record is too big for an empty message.
    #[error("message buffer full, {0} more bytes needed")]
    BufferFull(usize),

    /// Internal signal: a record arrived for a different set than the open
    /// one. Recovered by MessageStream (close the set and retry).
    #[error("record for set {got} does not match open set {expected}")]
    SetMismatch { got: u16, expected: u16 },
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, ExportError>;
