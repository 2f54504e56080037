//! Vertex connection errors.

use shadewire_schema::SchemaError;

/// Errors raised while building vertex layouts or connecting them to a
/// vertex shader's inputs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VertexError {
    /// Vertex buffers are described by array or loose array schemas.
    #[error("vertex layout schema must be an array or loose array, found {0}")]
    NotAnArray(String),

    /// The shader's vertex input is not a struct.
    #[error("vertex shader inputs must be a struct, found {0}")]
    NotAStruct(String),

    /// A member type has no vertex format.
    #[error("'{field}' of type {schema} has no vertex format")]
    UnsupportedFormat { field: String, schema: String },

    /// A shader input has no supplied attribute.
    #[error("vertex input '{field}' has no matching attribute in any bound vertex layout")]
    MissingAttribute { field: String },

    /// An attribute reference names a layout that was not passed in.
    #[error("attribute for '{field}' refers to vertex layout {layout}, but only {count} are bound")]
    UnknownLayout {
        field: String,
        layout: usize,
        count: usize,
    },

    /// An attribute reference names a member the layout does not have.
    #[error("vertex layout {layout} has no attribute '{attribute}' (wanted by '{field}')")]
    UnknownAttribute {
        field: String,
        layout: usize,
        attribute: String,
    },

    /// The attribute's format yields a different scalar kind than the input.
    #[error("'{field}' expects {expected} data but the attribute format is {format}")]
    FormatMismatch {
        field: String,
        expected: String,
        format: String,
    },

    #[error(transparent)]
    Schema(#[from] SchemaError),
}
