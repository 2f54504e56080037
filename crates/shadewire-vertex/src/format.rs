//! Vertex attribute formats and how schemas map onto them.

use std::fmt;

use shadewire_schema::{PackedFormat, Scalar, ScalarKind, Schema};

/// The format of one vertex attribute, as a graphics API spells it.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub enum VertexFormat {
    Uint8x2,
    Uint8x4,
    Sint8x4,
    Unorm8x2,
    Unorm8x4,
    Snorm8x4,
    Unorm16x2,
    Unorm16x4,
    Float16x2,
    Float16x4,
    Float32,
    Float32x2,
    Float32x3,
    Float32x4,
    Uint32,
    Uint32x2,
    Uint32x3,
    Uint32x4,
    Sint32,
    Sint32x2,
    Sint32x3,
    Sint32x4,
    Unorm10_10_10_2,
}

impl VertexFormat {
    /// The format that stores data of `schema`, if there is one.
    ///
    /// Decorations are looked through. Packed schemas map one to one;
    /// 32-bit scalars and vectors map to the matching `*32` format and
    /// two- and four-component `f16` vectors to `Float16x*`.
    pub fn from_schema(schema: &Schema) -> Option<Self> {
        match schema.undecorated() {
            Schema::Packed(p) => Some(Self::from(*p)),
            Schema::Scalar(s) => Self::from_components(*s, 1),
            Schema::Vector { size, scalar } => Self::from_components(*scalar, size.count()),
            _ => None,
        }
    }

    fn from_components(scalar: Scalar, count: u64) -> Option<Self> {
        use VertexFormat::*;
        let format = match (scalar, count) {
            (Scalar::F32, 1) => Float32,
            (Scalar::F32, 2) => Float32x2,
            (Scalar::F32, 3) => Float32x3,
            (Scalar::F32, 4) => Float32x4,
            (Scalar::U32, 1) => Uint32,
            (Scalar::U32, 2) => Uint32x2,
            (Scalar::U32, 3) => Uint32x3,
            (Scalar::U32, 4) => Uint32x4,
            (Scalar::I32, 1) => Sint32,
            (Scalar::I32, 2) => Sint32x2,
            (Scalar::I32, 3) => Sint32x3,
            (Scalar::I32, 4) => Sint32x4,
            (Scalar::F16, 2) => Float16x2,
            (Scalar::F16, 4) => Float16x4,
            _ => return None,
        };
        Some(format)
    }

    /// Size of one attribute in bytes.
    pub fn size(self) -> u64 {
        use VertexFormat::*;
        match self {
            Uint8x2 | Unorm8x2 => 2,
            Uint8x4 | Sint8x4 | Unorm8x4 | Snorm8x4 | Unorm16x2 | Float16x2 | Float32 | Uint32
            | Sint32 | Unorm10_10_10_2 => 4,
            Unorm16x4 | Float16x4 | Float32x2 | Uint32x2 | Sint32x2 => 8,
            Float32x3 | Uint32x3 | Sint32x3 => 12,
            Float32x4 | Uint32x4 | Sint32x4 => 16,
        }
    }

    /// The scalar kind a shader sees when reading this format.
    ///
    /// Normalized formats read as floats.
    pub fn shader_kind(self) -> ScalarKind {
        use VertexFormat::*;
        match self {
            Uint8x2 | Uint8x4 | Uint32 | Uint32x2 | Uint32x3 | Uint32x4 => ScalarKind::Uint,
            Sint8x4 | Sint32 | Sint32x2 | Sint32x3 | Sint32x4 => ScalarKind::Sint,
            _ => ScalarKind::Float,
        }
    }
}

impl From<PackedFormat> for VertexFormat {
    fn from(format: PackedFormat) -> Self {
        match format {
            PackedFormat::Unorm8x2 => Self::Unorm8x2,
            PackedFormat::Unorm8x4 => Self::Unorm8x4,
            PackedFormat::Snorm8x4 => Self::Snorm8x4,
            PackedFormat::Uint8x2 => Self::Uint8x2,
            PackedFormat::Uint8x4 => Self::Uint8x4,
            PackedFormat::Sint8x4 => Self::Sint8x4,
            PackedFormat::Unorm16x2 => Self::Unorm16x2,
            PackedFormat::Unorm16x4 => Self::Unorm16x4,
            PackedFormat::Float16x2 => Self::Float16x2,
            PackedFormat::Float16x4 => Self::Float16x4,
            PackedFormat::Unorm10_10_10_2 => Self::Unorm10_10_10_2,
        }
    }
}

impl fmt::Display for VertexFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use VertexFormat::*;
        f.write_str(match self {
            Uint8x2 => "uint8x2",
            Uint8x4 => "uint8x4",
            Sint8x4 => "sint8x4",
            Unorm8x2 => "unorm8x2",
            Unorm8x4 => "unorm8x4",
            Snorm8x4 => "snorm8x4",
            Unorm16x2 => "unorm16x2",
            Unorm16x4 => "unorm16x4",
            Float16x2 => "float16x2",
            Float16x4 => "float16x4",
            Float32 => "float32",
            Float32x2 => "float32x2",
            Float32x3 => "float32x3",
            Float32x4 => "float32x4",
            Uint32 => "uint32",
            Uint32x2 => "uint32x2",
            Uint32x3 => "uint32x3",
            Uint32x4 => "uint32x4",
            Sint32 => "sint32",
            Sint32x2 => "sint32x2",
            Sint32x3 => "sint32x3",
            Sint32x4 => "sint32x4",
            Unorm10_10_10_2 => "unorm10-10-10-2",
        })
    }
}
