//! The schema sum type and its building blocks.

use std::sync::Arc;

/// Width of a scalar type in bytes.
pub type Bytes = u8;

/// The kind of a scalar type.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub enum ScalarKind {
    /// Boolean.
    Bool,
    /// Signed integer.
    Sint,
    /// Unsigned integer.
    Uint,
    /// Floating point.
    Float,
}

/// A scalar type: kind + byte width.
///
/// Only the associated constants exist; fields are not settable from
/// outside the crate.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct Scalar {
    pub(crate) kind: ScalarKind,
    pub(crate) width: Bytes,
}

impl Scalar {
    /// `bool` occupies four bytes in host-visible layouts.
    pub const BOOL: Self = Self {
        kind: ScalarKind::Bool,
        width: 4,
    };
    pub const I32: Self = Self {
        kind: ScalarKind::Sint,
        width: 4,
    };
    pub const U32: Self = Self {
        kind: ScalarKind::Uint,
        width: 4,
    };
    pub const F32: Self = Self {
        kind: ScalarKind::Float,
        width: 4,
    };
    pub const F16: Self = Self {
        kind: ScalarKind::Float,
        width: 2,
    };
    /// Only meaningful in host-visible buffers (index data, loose data).
    pub const U16: Self = Self {
        kind: ScalarKind::Uint,
        width: 2,
    };

    pub fn kind(self) -> ScalarKind {
        self.kind
    }

    pub fn width(self) -> Bytes {
        self.width
    }

    /// Returns `true` for `f32` and `f16`.
    pub fn is_float(self) -> bool {
        self.kind == ScalarKind::Float
    }

    /// Returns `true` for signed and unsigned integers.
    pub fn is_integer(self) -> bool {
        matches!(self.kind, ScalarKind::Sint | ScalarKind::Uint)
    }
}

/// Number of components in a vector (or columns/rows of a square matrix).
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub enum VectorSize {
    /// 2 components.
    Bi = 2,
    /// 3 components.
    Tri = 3,
    /// 4 components.
    Quad = 4,
}

impl VectorSize {
    /// Returns the vector size for `n` components, if any.
    pub fn from_count(n: usize) -> Option<Self> {
        match n {
            2 => Some(Self::Bi),
            3 => Some(Self::Tri),
            4 => Some(Self::Quad),
            _ => None,
        }
    }

    /// Number of components.
    pub fn count(self) -> u64 {
        self as u64
    }
}

/// Interpolation type of an inter-stage value.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub enum InterpolationType {
    Perspective,
    Linear,
    Flat,
}

/// Interpolation sampling of an inter-stage value.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub enum InterpolationSampling {
    Center,
    Centroid,
    Sample,
    First,
    Either,
}

/// An attribute attached to a [`Decorated`] schema.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub enum Attribute {
    /// `@align(n)`: overrides the member alignment.
    Align(u64),
    /// `@size(n)`: forces the member to occupy exactly `n` bytes.
    Size(u64),
    /// `@location(n)`: inter-stage / vertex attribute slot.
    Location(u32),
    /// `@interpolate(type[, sampling])`.
    Interpolate(InterpolationType, Option<InterpolationSampling>),
}

impl Attribute {
    pub(crate) fn same_kind(&self, other: &Attribute) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

/// Values supplied by the pipeline rather than by buffers.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub enum BuiltinValue {
    VertexIndex,
    InstanceIndex,
    Position,
    FrontFacing,
    FragDepth,
    SampleIndex,
    SampleMask,
    GlobalInvocationId,
    LocalInvocationId,
    LocalInvocationIndex,
    WorkgroupId,
    NumWorkgroups,
}

impl BuiltinValue {
    /// The WGSL type the builtin carries.
    pub fn value_schema(self) -> Schema {
        match self {
            Self::VertexIndex
            | Self::InstanceIndex
            | Self::SampleIndex
            | Self::SampleMask
            | Self::LocalInvocationIndex => Schema::U32,
            Self::Position => Schema::VEC4F,
            Self::FrontFacing => Schema::BOOL,
            Self::FragDepth => Schema::F32,
            Self::GlobalInvocationId
            | Self::LocalInvocationId
            | Self::WorkgroupId
            | Self::NumWorkgroups => Schema::VEC3U,
        }
    }

    /// The identifier used inside `@builtin(...)`.
    pub fn wgsl_name(self) -> &'static str {
        match self {
            Self::VertexIndex => "vertex_index",
            Self::InstanceIndex => "instance_index",
            Self::Position => "position",
            Self::FrontFacing => "front_facing",
            Self::FragDepth => "frag_depth",
            Self::SampleIndex => "sample_index",
            Self::SampleMask => "sample_mask",
            Self::GlobalInvocationId => "global_invocation_id",
            Self::LocalInvocationId => "local_invocation_id",
            Self::LocalInvocationIndex => "local_invocation_index",
            Self::WorkgroupId => "workgroup_id",
            Self::NumWorkgroups => "num_workgroups",
        }
    }
}

/// Packed vertex formats that only exist in loose (vertex buffer) data.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub enum PackedFormat {
    Unorm8x2,
    Unorm8x4,
    Snorm8x4,
    Uint8x2,
    Uint8x4,
    Sint8x4,
    Unorm16x2,
    Unorm16x4,
    Float16x2,
    Float16x4,
    Unorm10_10_10_2,
}

impl PackedFormat {
    /// Size of one packed value in bytes.
    pub fn size(self) -> u64 {
        match self {
            Self::Unorm8x2 | Self::Uint8x2 => 2,
            Self::Unorm8x4
            | Self::Snorm8x4
            | Self::Uint8x4
            | Self::Sint8x4
            | Self::Unorm16x2
            | Self::Float16x2
            | Self::Unorm10_10_10_2 => 4,
            Self::Unorm16x4 | Self::Float16x4 => 8,
        }
    }

    /// The type a shader sees after the vertex fetch unpacks the value.
    pub fn shader_schema(self) -> Schema {
        match self {
            Self::Unorm8x2 | Self::Unorm16x2 | Self::Float16x2 => Schema::VEC2F,
            Self::Uint8x2 => Schema::VEC2U,
            Self::Unorm8x4
            | Self::Snorm8x4
            | Self::Unorm16x4
            | Self::Float16x4
            | Self::Unorm10_10_10_2 => Schema::VEC4F,
            Self::Uint8x4 => Schema::VEC4U,
            Self::Sint8x4 => Schema::VEC4I,
        }
    }
}

/// A named struct member.
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub struct StructField {
    pub name: String,
    pub schema: Schema,
}

/// An ordered record of fields; declaration order is significant.
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub struct StructSchema {
    pub(crate) label: Option<String>,
    pub(crate) fields: Vec<StructField>,
}

impl StructSchema {
    /// The host-provided label, used as the preferred WGSL name.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[StructField] {
        &self.fields
    }

    /// Looks a field up by name.
    pub fn field(&self, name: &str) -> Option<&StructField> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Element schema and count of an array. A count of zero means runtime-sized.
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub struct ArraySchema {
    pub(crate) element: Schema,
    pub(crate) count: u32,
}

impl ArraySchema {
    pub fn element(&self) -> &Schema {
        &self.element
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn is_runtime_sized(&self) -> bool {
        self.count == 0
    }
}

/// A schema wrapped with an ordered list of attributes.
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub struct Decorated {
    pub(crate) inner: Schema,
    pub(crate) attributes: Vec<Attribute>,
}

impl Decorated {
    pub fn inner(&self) -> &Schema {
        &self.inner
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }
}

/// A GPU-representable type.
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub enum Schema {
    /// A single scalar value.
    Scalar(Scalar),
    /// A vector of scalars.
    Vector { size: VectorSize, scalar: Scalar },
    /// A square `f32` matrix of `size` columns.
    Matrix { size: VectorSize },
    /// A fixed-size or runtime-sized array with aligned elements.
    Array(Arc<ArraySchema>),
    /// A struct with aligned members.
    Struct(Arc<StructSchema>),
    /// An atomic 32-bit integer.
    Atomic(Scalar),
    /// A schema with attributes.
    Decorated(Arc<Decorated>),
    /// An array without implicit element padding.
    LooseArray(Arc<ArraySchema>),
    /// A struct without implicit member padding.
    LooseStruct(Arc<StructSchema>),
    /// A packed vertex format.
    Packed(PackedFormat),
    /// A pipeline-provided value.
    Builtin(BuiltinValue),
}

impl Schema {
    pub const BOOL: Self = Self::Scalar(Scalar::BOOL);
    pub const F32: Self = Self::Scalar(Scalar::F32);
    pub const F16: Self = Self::Scalar(Scalar::F16);
    pub const I32: Self = Self::Scalar(Scalar::I32);
    pub const U32: Self = Self::Scalar(Scalar::U32);
    pub const U16: Self = Self::Scalar(Scalar::U16);

    pub const VEC2F: Self = Self::vec(VectorSize::Bi, Scalar::F32);
    pub const VEC3F: Self = Self::vec(VectorSize::Tri, Scalar::F32);
    pub const VEC4F: Self = Self::vec(VectorSize::Quad, Scalar::F32);
    pub const VEC2H: Self = Self::vec(VectorSize::Bi, Scalar::F16);
    pub const VEC3H: Self = Self::vec(VectorSize::Tri, Scalar::F16);
    pub const VEC4H: Self = Self::vec(VectorSize::Quad, Scalar::F16);
    pub const VEC2I: Self = Self::vec(VectorSize::Bi, Scalar::I32);
    pub const VEC3I: Self = Self::vec(VectorSize::Tri, Scalar::I32);
    pub const VEC4I: Self = Self::vec(VectorSize::Quad, Scalar::I32);
    pub const VEC2U: Self = Self::vec(VectorSize::Bi, Scalar::U32);
    pub const VEC3U: Self = Self::vec(VectorSize::Tri, Scalar::U32);
    pub const VEC4U: Self = Self::vec(VectorSize::Quad, Scalar::U32);
    pub const VEC2B: Self = Self::vec(VectorSize::Bi, Scalar::BOOL);
    pub const VEC3B: Self = Self::vec(VectorSize::Tri, Scalar::BOOL);
    pub const VEC4B: Self = Self::vec(VectorSize::Quad, Scalar::BOOL);

    pub const MAT2X2F: Self = Self::Matrix {
        size: VectorSize::Bi,
    };
    pub const MAT3X3F: Self = Self::Matrix {
        size: VectorSize::Tri,
    };
    pub const MAT4X4F: Self = Self::Matrix {
        size: VectorSize::Quad,
    };

    const fn vec(size: VectorSize, scalar: Scalar) -> Self {
        Self::Vector { size, scalar }
    }

    /// Strips decorations and replaces builtins with the value they carry.
    ///
    /// This is the type generated code works with.
    pub fn data(&self) -> Schema {
        match self {
            Self::Decorated(d) => d.inner.data(),
            Self::Builtin(b) => b.value_schema(),
            other => other.clone(),
        }
    }

    /// Strips decorations only.
    pub fn undecorated(&self) -> &Schema {
        match self {
            Self::Decorated(d) => d.inner.undecorated(),
            other => other,
        }
    }

    /// Attributes attached to this schema (empty when undecorated).
    pub fn attributes(&self) -> &[Attribute] {
        match self {
            Self::Decorated(d) => &d.attributes,
            _ => &[],
        }
    }

    /// The `@location` attribute, if any.
    pub fn location(&self) -> Option<u32> {
        self.attributes().iter().find_map(|a| match a {
            Attribute::Location(n) => Some(*n),
            _ => None,
        })
    }

    /// The builtin this schema stands for, if any.
    pub fn builtin(&self) -> Option<BuiltinValue> {
        match self.undecorated() {
            Self::Builtin(b) => Some(*b),
            _ => None,
        }
    }

    /// The struct behind this schema (aligned or loose).
    pub fn as_struct(&self) -> Option<&Arc<StructSchema>> {
        match self.undecorated() {
            Self::Struct(s) | Self::LooseStruct(s) => Some(s),
            _ => None,
        }
    }

    /// The array behind this schema (aligned or loose).
    pub fn as_array(&self) -> Option<&Arc<ArraySchema>> {
        match self.undecorated() {
            Self::Array(a) | Self::LooseArray(a) => Some(a),
            _ => None,
        }
    }

    /// The component scalar of scalars, vectors, matrices and atomics.
    pub fn scalar(&self) -> Option<Scalar> {
        match self.undecorated() {
            Self::Scalar(s) | Self::Atomic(s) => Some(*s),
            Self::Vector { scalar, .. } => Some(*scalar),
            Self::Matrix { .. } => Some(Scalar::F32),
            Self::Builtin(b) => b.value_schema().scalar(),
            _ => None,
        }
    }

    /// Returns `true` for loose data, which has no implicit padding.
    pub fn is_loose(&self) -> bool {
        matches!(
            self.undecorated(),
            Self::LooseArray(_) | Self::LooseStruct(_) | Self::Packed(_)
        )
    }

    /// Returns `true` if this schema has no fixed size: a runtime-sized
    /// array, or a struct whose last member is one.
    pub fn is_runtime_sized(&self) -> bool {
        match self.undecorated() {
            Self::Array(a) | Self::LooseArray(a) => a.is_runtime_sized(),
            Self::Struct(s) | Self::LooseStruct(s) => s
                .fields
                .last()
                .is_some_and(|f| f.schema.is_runtime_sized()),
            _ => false,
        }
    }

    /// Returns `true` if `f16` appears anywhere inside this schema.
    pub fn uses_f16(&self) -> bool {
        match self {
            Self::Scalar(s) | Self::Vector { scalar: s, .. } => *s == Scalar::F16,
            Self::Array(a) | Self::LooseArray(a) => a.element.uses_f16(),
            Self::Struct(s) | Self::LooseStruct(s) => s.fields.iter().any(|f| f.schema.uses_f16()),
            Self::Decorated(d) => d.inner.uses_f16(),
            Self::Packed(p) => p.shader_schema().uses_f16(),
            Self::Matrix { .. } | Self::Atomic(_) | Self::Builtin(_) => false,
        }
    }

    /// Returns `true` if an atomic appears anywhere inside this schema.
    pub fn contains_atomic(&self) -> bool {
        match self {
            Self::Atomic(_) => true,
            Self::Array(a) | Self::LooseArray(a) => a.element.contains_atomic(),
            Self::Struct(s) | Self::LooseStruct(s) => {
                s.fields.iter().any(|f| f.schema.contains_atomic())
            }
            Self::Decorated(d) => d.inner.contains_atomic(),
            _ => false,
        }
    }

    /// The label of a struct schema.
    pub fn label(&self) -> Option<&str> {
        self.as_struct().and_then(|s| s.label())
    }
}
