//! Wire codec error types.

use thiserror::Error;

/// Result type for wire operations.
pub type WireResult<T> = Result<T, WireError>;

/// Errors produced while encoding or decoding envelopes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WireError {
    /// Writing the XML document failed.
    #[error("failed to encode envelope: {0}")]
    Encode(String),

    /// A field name cannot be written as an element name.
    #[error("invalid field name '{0}'")]
    InvalidFieldName(String),

    /// The payload is not well-formed XML.
    #[error("malformed XML: {0}")]
    Malformed(String),

    /// The payload is not valid UTF-8.
    #[error("payload is not valid UTF-8")]
    InvalidUtf8,

    /// A document type declaration was present.
    #[error("document type declarations are not accepted")]
    DocTypeForbidden,

    /// A processing instruction was present.
    #[error("processing instructions are not accepted")]
    ProcessingInstructionForbidden,

    /// A field element contained child elements.
    #[error("nested element inside field '{0}'")]
    NestedElement(String),

    /// The same field appeared twice.
    #[error("duplicate field '{0}'")]
    DuplicateField(String),

    /// The document is missing its root, has several, or ends early.
    #[error("invalid envelope structure: {0}")]
    Structure(String),
}

impl From<quick_xml::Error> for WireError {
    fn from(e: quick_xml::Error) -> Self {
        Self::Malformed(e.to_string())
    }
}
