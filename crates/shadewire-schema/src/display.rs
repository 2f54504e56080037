//! Display implementations using WGSL spelling.

use std::fmt;

use crate::types::{
    Attribute, BuiltinValue, InterpolationSampling, InterpolationType, PackedFormat, Scalar,
    ScalarKind, Schema, VectorSize,
};

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ScalarKind::Bool => write!(f, "bool"),
            ScalarKind::Sint => write!(f, "i{}", u32::from(self.width) * 8),
            ScalarKind::Uint => write!(f, "u{}", u32::from(self.width) * 8),
            ScalarKind::Float => write!(f, "f{}", u32::from(self.width) * 8),
        }
    }
}

impl fmt::Display for VectorSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", *self as u32)
    }
}

impl fmt::Display for InterpolationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Perspective => "perspective",
            Self::Linear => "linear",
            Self::Flat => "flat",
        })
    }
}

impl fmt::Display for InterpolationSampling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Center => "center",
            Self::Centroid => "centroid",
            Self::Sample => "sample",
            Self::First => "first",
            Self::Either => "either",
        })
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Align(n) => write!(f, "@align({n})"),
            Self::Size(n) => write!(f, "@size({n})"),
            Self::Location(n) => write!(f, "@location({n})"),
            Self::Interpolate(ty, None) => write!(f, "@interpolate({ty})"),
            Self::Interpolate(ty, Some(sampling)) => write!(f, "@interpolate({ty}, {sampling})"),
        }
    }
}

impl fmt::Display for BuiltinValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@builtin({})", self.wgsl_name())
    }
}

impl fmt::Display for PackedFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Unorm8x2 => "unorm8x2",
            Self::Unorm8x4 => "unorm8x4",
            Self::Snorm8x4 => "snorm8x4",
            Self::Uint8x2 => "uint8x2",
            Self::Uint8x4 => "uint8x4",
            Self::Sint8x4 => "sint8x4",
            Self::Unorm16x2 => "unorm16x2",
            Self::Unorm16x4 => "unorm16x4",
            Self::Float16x2 => "float16x2",
            Self::Float16x4 => "float16x4",
            Self::Unorm10_10_10_2 => "unorm10-10-10-2",
        })
    }
}

/// Short vector suffix (`f`, `h`, `i`, `u`) for the scalar, if WGSL has one.
pub(crate) fn vector_suffix(scalar: Scalar) -> Option<char> {
    match (scalar.kind, scalar.width) {
        (ScalarKind::Float, 4) => Some('f'),
        (ScalarKind::Float, 2) => Some('h'),
        (ScalarKind::Sint, 4) => Some('i'),
        (ScalarKind::Uint, 4) => Some('u'),
        _ => None,
    }
}

/// Formats a schema the way WGSL spells it; structs use their label.
impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(s) => write!(f, "{s}"),
            Self::Vector { size, scalar } => match vector_suffix(*scalar) {
                Some(suffix) => write!(f, "vec{size}{suffix}"),
                None => write!(f, "vec{size}<{scalar}>"),
            },
            Self::Matrix { size } => write!(f, "mat{size}x{size}f"),
            Self::Array(a) if a.is_runtime_sized() => write!(f, "array<{}>", a.element()),
            Self::Array(a) => write!(f, "array<{}, {}>", a.element(), a.count()),
            Self::LooseArray(a) => write!(f, "loose_array<{}, {}>", a.element(), a.count()),
            Self::Struct(s) | Self::LooseStruct(s) => {
                f.write_str(s.label().unwrap_or("struct"))
            }
            Self::Atomic(s) => write!(f, "atomic<{s}>"),
            Self::Decorated(d) => write!(f, "{}", d.inner()),
            Self::Packed(p) => write!(f, "{p}"),
            Self::Builtin(b) => write!(f, "{}", b.value_schema()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wgsl_spelling() {
        assert_eq!(Schema::F32.to_string(), "f32");
        assert_eq!(Schema::VEC3F.to_string(), "vec3f");
        assert_eq!(Schema::VEC2H.to_string(), "vec2h");
        assert_eq!(Schema::VEC4B.to_string(), "vec4<bool>");
        assert_eq!(Schema::MAT4X4F.to_string(), "mat4x4f");
        let a = Schema::array(Schema::U32, 8).unwrap();
        assert_eq!(a.to_string(), "array<u32, 8>");
        let r = Schema::runtime_array(Schema::VEC4F).unwrap();
        assert_eq!(r.to_string(), "array<vec4f>");
        assert_eq!(Schema::atomic(Scalar::I32).unwrap().to_string(), "atomic<i32>");
    }

    #[test]
    fn attribute_spelling() {
        assert_eq!(Attribute::Align(16).to_string(), "@align(16)");
        assert_eq!(
            Attribute::Interpolate(InterpolationType::Flat, Some(InterpolationSampling::First))
                .to_string(),
            "@interpolate(flat, first)"
        );
        assert_eq!(
            BuiltinValue::VertexIndex.to_string(),
            "@builtin(vertex_index)"
        );
    }
}
