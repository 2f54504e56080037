//! Schema construction errors.

/// Errors raised while building a [`Schema`](crate::Schema).
///
/// All of them are reported when the schema is constructed, never later
/// during resolution.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    /// A custom alignment is not a power of two.
    #[error("custom alignment {0} is not a power of two")]
    AlignmentNotPowerOfTwo(u64),

    /// A custom alignment is not a multiple of the natural alignment.
    #[error("custom alignment {align} is not a multiple of the natural alignment {natural}")]
    AlignmentBelowNatural { align: u64, natural: u64 },

    /// A custom size is smaller than the natural size.
    #[error("custom size {size} is smaller than the natural size {natural}")]
    SizeBelowNatural { size: u64, natural: u64 },

    /// A custom size was applied to data with no fixed size.
    #[error("custom size cannot be applied to a runtime-sized array")]
    SizeOnRuntimeArray,

    /// A runtime-sized array nested inside an array or another struct.
    #[error("runtime-sized arrays cannot be nested ({0})")]
    NestedRuntimeArray(String),

    /// A runtime-sized array that is not the last field of its struct.
    #[error("runtime-sized array field '{field}' must be the last field of the struct")]
    RuntimeArrayNotLast { field: String },

    /// A runtime-sized array inside loose (vertex) data.
    #[error("loose data cannot contain runtime-sized arrays ({0})")]
    RuntimeArrayInLoose(String),

    /// Atomics are only defined over 32-bit integers.
    #[error("atomic<{0}> is not allowed; atomics wrap i32 or u32 only")]
    AtomicScalar(String),

    /// A vector over a scalar that WGSL vectors do not support.
    #[error("vectors of {0} are not supported")]
    VectorScalar(String),

    /// Two fields share a name.
    #[error("duplicate field '{0}'")]
    DuplicateField(String),

    /// Two fields share a custom location.
    #[error("duplicate @location({location}) on field '{field}'")]
    DuplicateLocation { location: u32, field: String },

    /// WGSL structs need at least one member.
    #[error("struct '{0}' has no fields")]
    EmptyStruct(String),

    /// Loose (unpadded) data placed where aligned data is required.
    #[error("loose data cannot be used inside aligned data ({0})")]
    LooseInAligned(String),

    /// An attribute that makes no sense on the wrapped schema.
    #[error("attribute {attribute} cannot be applied to {target}")]
    InvalidAttribute { attribute: String, target: String },
}
