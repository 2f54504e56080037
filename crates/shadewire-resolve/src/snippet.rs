//! Typed fragments of generated WGSL.

use std::fmt;

use shadewire_schema::{Scalar, Schema};

/// The type of a generated expression, as far as the generator knows it.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum SnippetType {
    /// A concrete WGSL type. Always undecorated.
    Concrete(Schema),
    /// An integer literal (or expression over them) not yet given a type.
    AbstractInt,
    /// A float literal (or expression over them) not yet given a type.
    AbstractFloat,
    /// The result of calling a function without a return value.
    Void,
    /// Opaque text, e.g. a function name or substituted raw WGSL.
    Unknown,
}

impl SnippetType {
    /// The type shader code sees for `schema`: decorations stripped,
    /// builtins and packed formats replaced by the values they carry.
    pub fn concrete(schema: &Schema) -> Self {
        match schema.data() {
            Schema::Packed(p) => Self::Concrete(p.shader_schema()),
            other => Self::Concrete(other),
        }
    }

    pub fn is_abstract(&self) -> bool {
        matches!(self, Self::AbstractInt | Self::AbstractFloat)
    }

    pub fn schema(&self) -> Option<&Schema> {
        match self {
            Self::Concrete(s) => Some(s),
            _ => None,
        }
    }

    /// The component scalar of a concrete type.
    pub fn scalar(&self) -> Option<Scalar> {
        self.schema().and_then(Schema::scalar)
    }

    /// The concrete type WGSL picks for an unconstrained `let`/`var`.
    pub fn defaulted(self) -> Self {
        match self {
            Self::AbstractInt => Self::Concrete(Schema::I32),
            Self::AbstractFloat => Self::Concrete(Schema::F32),
            other => other,
        }
    }
}

impl fmt::Display for SnippetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Concrete(s) => write!(f, "{s}"),
            Self::AbstractInt => f.write_str("abstract-int"),
            Self::AbstractFloat => f.write_str("abstract-float"),
            Self::Void => f.write_str("void"),
            Self::Unknown => f.write_str("unknown"),
        }
    }
}

/// A piece of WGSL expression text together with its type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Snippet {
    pub code: String,
    pub ty: SnippetType,
}

impl Snippet {
    pub fn new(code: impl Into<String>, ty: SnippetType) -> Self {
        Self {
            code: code.into(),
            ty,
        }
    }

    /// Raw WGSL whose type is not tracked.
    pub fn raw(code: impl Into<String>) -> Self {
        Self::new(code, SnippetType::Unknown)
    }

    pub fn typed(code: impl Into<String>, schema: &Schema) -> Self {
        Self::new(code, SnippetType::concrete(schema))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abstract_types_default_like_wgsl() {
        assert_eq!(
            SnippetType::AbstractInt.defaulted(),
            SnippetType::Concrete(Schema::I32)
        );
        assert_eq!(
            SnippetType::AbstractFloat.defaulted(),
            SnippetType::Concrete(Schema::F32)
        );
        assert_eq!(SnippetType::Unknown.defaulted(), SnippetType::Unknown);
    }

    #[test]
    fn concrete_types_are_undecorated() {
        let decorated = shadewire_schema::align(16, Schema::U32).unwrap();
        assert_eq!(SnippetType::concrete(&decorated), SnippetType::Concrete(Schema::U32));
        assert_eq!(SnippetType::concrete(&Schema::VEC3F).scalar(), Some(Scalar::F32));
    }
}
