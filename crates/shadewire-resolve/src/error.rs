//! Error types for resolution and code generation.

use shadewire_schema::SchemaError;

use crate::context::Extension;

/// Failures while turning IR, values and schemas into WGSL text.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GenerationError {
    #[error("unmapped builtin '{0}'")]
    UnmappedBuiltin(String),

    #[error("unknown identifier '{0}'")]
    UnknownIdentifier(String),

    #[error("invalid member access '.{property}' on {target}")]
    InvalidMemberAccess { property: String, target: String },

    #[error("cannot index into {0}")]
    InvalidIndex(String),

    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    #[error("literal {literal} does not fit in {ty}")]
    LiteralOutOfRange { literal: String, ty: String },

    #[error("non-finite float {0} has no WGSL literal")]
    NonFiniteLiteral(String),

    #[error("type {0} is only valid in host-visible data")]
    HostOnlyType(String),

    #[error("'{0}' is declared without a type or initializer")]
    UntypedDeclaration(String),

    #[error("assignments are only valid as statements")]
    AssignmentInExpression,

    #[error("'{0}' is not callable")]
    NotCallable(String),

    #[error("{0} cannot be used as a WGSL expression")]
    NotRepresentable(String),

    #[error("'{function}' expects {expected} arguments, got {found}")]
    ArgumentCount {
        function: String,
        expected: usize,
        found: usize,
    },

    #[error("invalid initializer for '{0}'")]
    InvalidInitializer(String),
}

/// Any failure of a `resolve` call. No partial output is produced.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ResolveError {
    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("missing value for slot '{0}'")]
    MissingSlotValue(String),

    #[error("cycle detected while resolving '{0}'")]
    Cycle(String),

    #[error("extension '{0}' is required but not enabled")]
    ExtensionNotEnabled(Extension),

    #[error("runtime-sized data in uniform binding '{0}'")]
    RuntimeSizedUniform(String),

    #[error("binding '{0}' holds atomics but is not read_write storage")]
    AtomicOutsideReadWrite(String),

    #[error("binding @group({group}) @binding({binding}) is used twice")]
    BindingConflict { group: u32, binding: u32 },

    #[error("helper '{label}' failed: {message}")]
    Helper { label: String, message: String },
}
