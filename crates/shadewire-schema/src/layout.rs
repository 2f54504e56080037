//! Host-shareable memory layout.
//!
//! Sizes, alignments and offsets follow WGSL's layout rules for uniform and
//! storage buffers. Loose data uses the same member ordering algorithm with
//! an alignment of one for undecorated members, so nothing is padded.

use crate::types::{ArraySchema, Attribute, Scalar, Schema, StructSchema, VectorSize};

/// Size and alignment of a schema. `size` is `None` for runtime-sized data.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Layout {
    pub size: Option<u64>,
    pub alignment: u64,
}

impl Layout {
    fn fixed(size: u64, alignment: u64) -> Self {
        Self {
            size: Some(size),
            alignment,
        }
    }
}

/// Placement of one struct member.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldLayout {
    pub name: String,
    pub offset: u64,
    /// Bytes the member occupies, including a custom `@size`.
    pub size: Option<u64>,
    pub alignment: u64,
}

/// Rounds `value` up to the next multiple of `alignment`.
pub fn round_up(value: u64, alignment: u64) -> u64 {
    value.div_ceil(alignment) * alignment
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Packing {
    Aligned,
    Loose,
}

impl Schema {
    /// Size and alignment of this schema.
    pub fn layout(&self) -> Layout {
        match self {
            Self::Scalar(s) | Self::Atomic(s) => {
                Layout::fixed(u64::from(s.width), u64::from(s.width))
            }
            Self::Vector { size, scalar } => vector_layout(*size, *scalar),
            Self::Matrix { size } => {
                let column = vector_layout(*size, Scalar::F32);
                let column_size = column.size.unwrap_or(0);
                let stride = round_up(column_size, column.alignment);
                Layout::fixed(size.count() * stride, column.alignment)
            }
            Self::Array(a) => array_layout(a, Packing::Aligned),
            Self::LooseArray(a) => array_layout(a, Packing::Loose),
            Self::Struct(s) => struct_layout(s, Packing::Aligned).0,
            Self::LooseStruct(s) => struct_layout(s, Packing::Loose).0,
            Self::Decorated(d) => {
                let inner = d.inner().layout();
                Layout {
                    size: custom_size(d.attributes()).or(inner.size),
                    alignment: custom_align(d.attributes()).unwrap_or(inner.alignment),
                }
            }
            Self::Packed(p) => Layout::fixed(p.size(), 1),
            Self::Builtin(b) => b.value_schema().layout(),
        }
    }

    /// Size in bytes; `None` for runtime-sized data.
    pub fn size(&self) -> Option<u64> {
        self.layout().size
    }

    /// Alignment in bytes.
    pub fn alignment(&self) -> u64 {
        self.layout().alignment
    }

    /// Distance between consecutive elements of an array schema.
    pub fn stride(&self) -> Option<u64> {
        match self.undecorated() {
            Self::Array(a) => Some(element_stride(a, Packing::Aligned)),
            Self::LooseArray(a) => Some(element_stride(a, Packing::Loose)),
            _ => None,
        }
    }

    /// Member placements of a struct schema, in declaration order.
    pub fn field_layouts(&self) -> Option<Vec<FieldLayout>> {
        match self.undecorated() {
            Self::Struct(s) => Some(struct_layout(s, Packing::Aligned).1),
            Self::LooseStruct(s) => Some(struct_layout(s, Packing::Loose).1),
            _ => None,
        }
    }

    /// `(name, offset)` pairs of a struct schema.
    pub fn field_offsets(&self) -> Option<Vec<(String, u64)>> {
        self.field_layouts()
            .map(|fields| fields.into_iter().map(|f| (f.name, f.offset)).collect())
    }

    /// Returns `true` if the layout introduces no internal or trailing
    /// padding anywhere, so the data can be copied as one dense block.
    pub fn is_contiguous(&self) -> bool {
        match self {
            Self::Scalar(_)
            | Self::Vector { .. }
            | Self::Atomic(_)
            | Self::Packed(_)
            | Self::Builtin(_) => true,
            Self::Matrix { size } => *size != VectorSize::Tri,
            Self::Array(a) => array_is_contiguous(a, Packing::Aligned),
            Self::LooseArray(a) => array_is_contiguous(a, Packing::Loose),
            Self::Struct(s) => struct_is_contiguous(s, Packing::Aligned),
            Self::LooseStruct(s) => struct_is_contiguous(s, Packing::Loose),
            Self::Decorated(d) => {
                let padded = match custom_size(d.attributes()) {
                    Some(size) => Some(size) != d.inner().size(),
                    None => false,
                };
                !padded && d.inner().is_contiguous()
            }
        }
    }
}

fn vector_layout(size: VectorSize, scalar: Scalar) -> Layout {
    let component = u64::from(scalar.width);
    let alignment = match size {
        VectorSize::Bi => 2 * component,
        VectorSize::Tri | VectorSize::Quad => 4 * component,
    };
    Layout::fixed(size.count() * component, alignment)
}

fn custom_align(attributes: &[Attribute]) -> Option<u64> {
    attributes.iter().find_map(|a| match a {
        Attribute::Align(n) => Some(*n),
        _ => None,
    })
}

fn custom_size(attributes: &[Attribute]) -> Option<u64> {
    attributes.iter().find_map(|a| match a {
        Attribute::Size(n) => Some(*n),
        _ => None,
    })
}

/// Layout of a schema placed as a member or element under `packing`.
fn member_layout(schema: &Schema, packing: Packing) -> Layout {
    match packing {
        Packing::Aligned => schema.layout(),
        Packing::Loose => {
            let natural = schema.layout();
            Layout {
                size: natural.size,
                alignment: custom_align(schema.attributes()).unwrap_or(1),
            }
        }
    }
}

fn element_stride(array: &ArraySchema, packing: Packing) -> u64 {
    let element = member_layout(array.element(), packing);
    round_up(element.size.unwrap_or(0), element.alignment)
}

fn array_layout(array: &ArraySchema, packing: Packing) -> Layout {
    let element = member_layout(array.element(), packing);
    let stride = element_stride(array, packing);
    Layout {
        size: (!array.is_runtime_sized()).then(|| u64::from(array.count()) * stride),
        alignment: element.alignment,
    }
}

fn array_is_contiguous(array: &ArraySchema, packing: Packing) -> bool {
    let element_size = array.element().size();
    Some(element_stride(array, packing)) == element_size && array.element().is_contiguous()
}

fn struct_layout(s: &StructSchema, packing: Packing) -> (Layout, Vec<FieldLayout>) {
    let mut offset = 0;
    let mut alignment = 1;
    let mut runtime_sized = false;
    let mut fields = Vec::with_capacity(s.fields().len());

    for field in s.fields() {
        let layout = member_layout(&field.schema, packing);
        offset = round_up(offset, layout.alignment);
        alignment = alignment.max(layout.alignment);
        fields.push(FieldLayout {
            name: field.name.clone(),
            offset,
            size: layout.size,
            alignment: layout.alignment,
        });
        match layout.size {
            Some(size) => offset += size,
            // Only the last member can be runtime-sized.
            None => runtime_sized = true,
        }
    }

    let layout = Layout {
        size: (!runtime_sized).then(|| round_up(offset, alignment)),
        alignment,
    };
    (layout, fields)
}

fn struct_is_contiguous(s: &StructSchema, packing: Packing) -> bool {
    let (layout, placements) = struct_layout(s, packing);
    let mut end = 0;
    for (field, placement) in s.fields().iter().zip(&placements) {
        if placement.offset != end || !field.schema.is_contiguous() {
            return false;
        }
        match placement.size {
            Some(size) => end += size,
            None => return true,
        }
    }
    layout.size == Some(end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PackedFormat, align, size};
    use proptest::prelude::*;

    fn offsets(schema: &Schema) -> Vec<(String, u64)> {
        schema.field_offsets().expect("struct schema")
    }

    #[test]
    fn scalar_layouts() {
        assert_eq!(Schema::F32.layout(), Layout::fixed(4, 4));
        assert_eq!(Schema::F16.layout(), Layout::fixed(2, 2));
        assert_eq!(Schema::U16.layout(), Layout::fixed(2, 2));
        assert_eq!(Schema::BOOL.layout(), Layout::fixed(4, 4));
    }

    #[test]
    fn vector_layouts() {
        assert_eq!(Schema::VEC2F.layout(), Layout::fixed(8, 8));
        assert_eq!(Schema::VEC3F.layout(), Layout::fixed(12, 16));
        assert_eq!(Schema::VEC4F.layout(), Layout::fixed(16, 16));
        assert_eq!(Schema::VEC3H.layout(), Layout::fixed(6, 8));
        assert_eq!(Schema::VEC2H.layout(), Layout::fixed(4, 4));
    }

    #[test]
    fn matrix_layouts() {
        assert_eq!(Schema::MAT2X2F.layout(), Layout::fixed(16, 8));
        assert_eq!(Schema::MAT3X3F.layout(), Layout::fixed(48, 16));
        assert_eq!(Schema::MAT4X4F.layout(), Layout::fixed(64, 16));
    }

    #[test]
    fn array_stride_rounds_to_alignment() {
        let a = Schema::array(Schema::VEC3F, 4).unwrap();
        assert_eq!(a.stride(), Some(16));
        assert_eq!(a.layout(), Layout::fixed(64, 16));

        let runtime = Schema::runtime_array(Schema::U32).unwrap();
        assert_eq!(runtime.size(), None);
        assert_eq!(runtime.alignment(), 4);
    }

    #[test]
    fn struct_with_vec3_member() {
        let s = Schema::structure("S", [("a", Schema::U32), ("b", Schema::VEC3U)]).unwrap();
        assert_eq!(s.layout(), Layout::fixed(32, 16));
        assert_eq!(offsets(&s), vec![("a".into(), 0), ("b".into(), 16)]);
    }

    #[test]
    fn custom_alignment_grows_struct() {
        let plain =
            Schema::structure("Plain", [("a", Schema::U32), ("b", Schema::U32), ("c", Schema::U32)])
                .unwrap();
        assert_eq!(plain.size(), Some(12));

        let aligned = Schema::structure(
            "Aligned",
            [
                ("a", Schema::U32),
                ("b", align(16, Schema::U32).unwrap()),
                ("c", Schema::U32),
            ],
        )
        .unwrap();
        let fields = aligned.field_layouts().unwrap();
        assert_eq!(fields[1].offset, 16);
        assert_eq!(fields[2].offset, 20);
        // Members end at 24; the struct rounds up to its 16-byte alignment.
        assert_eq!(fields[2].offset + fields[2].size.unwrap(), 24);
        assert_eq!(aligned.layout(), Layout::fixed(32, 16));
    }

    #[test]
    fn custom_size_pads_member() {
        let s = Schema::structure(
            "Sized",
            [("a", size(12, Schema::U32).unwrap()), ("b", Schema::U32)],
        )
        .unwrap();
        assert_eq!(offsets(&s), vec![("a".into(), 0), ("b".into(), 12)]);
        assert_eq!(s.size(), Some(16));
        assert!(!s.is_contiguous());
    }

    #[test]
    fn runtime_array_struct_has_no_size() {
        let s = Schema::structure(
            "Particles",
            [
                ("count", Schema::U32),
                ("data", Schema::runtime_array(Schema::VEC4F).unwrap()),
            ],
        )
        .unwrap();
        assert_eq!(s.size(), None);
        assert_eq!(s.alignment(), 16);
        assert_eq!(offsets(&s)[1], ("data".into(), 16));
    }

    #[test]
    fn nested_struct_alignment() {
        let inner = Schema::structure("Inner", [("v", Schema::VEC3F)]).unwrap();
        assert_eq!(inner.layout(), Layout::fixed(16, 16));
        let outer = Schema::structure("Outer", [("x", Schema::F32), ("inner", inner)]).unwrap();
        assert_eq!(offsets(&outer)[1], ("inner".into(), 16));
        assert_eq!(outer.size(), Some(32));
    }

    #[test]
    fn loose_struct_is_packed() {
        let s = Schema::loose_structure(
            "Vertex",
            [
                ("position", Schema::VEC3F),
                ("color", Schema::packed(PackedFormat::Unorm8x4)),
                ("uv", Schema::VEC2F),
            ],
        )
        .unwrap();
        assert_eq!(
            offsets(&s),
            vec![("position".into(), 0), ("color".into(), 12), ("uv".into(), 16)]
        );
        assert_eq!(s.layout(), Layout::fixed(24, 1));
        assert!(s.is_contiguous());
    }

    #[test]
    fn loose_members_honor_custom_alignment() {
        let s = Schema::loose_structure(
            "Vertex",
            [
                ("a", Schema::F16),
                ("b", align(4, Schema::F32).unwrap()),
            ],
        )
        .unwrap();
        assert_eq!(offsets(&s), vec![("a".into(), 0), ("b".into(), 4)]);
        assert_eq!(s.layout(), Layout::fixed(8, 4));
        assert!(!s.is_contiguous());
    }

    #[test]
    fn loose_array_stride_is_element_size() {
        let a = Schema::loose_array(Schema::VEC3F, 10).unwrap();
        assert_eq!(a.stride(), Some(12));
        assert_eq!(a.size(), Some(120));
        assert!(a.is_contiguous());
    }

    #[test]
    fn contiguity() {
        assert!(Schema::array(Schema::VEC4F, 3).unwrap().is_contiguous());
        assert!(!Schema::array(Schema::VEC3F, 3).unwrap().is_contiguous());
        assert!(!Schema::MAT3X3F.is_contiguous());
        let dense = Schema::structure("Dense", [("a", Schema::VEC2F), ("b", Schema::VEC2F)]).unwrap();
        assert!(dense.is_contiguous());
        let padded = Schema::structure("Padded", [("a", Schema::F32), ("b", Schema::VEC2F)]).unwrap();
        assert!(!padded.is_contiguous());
        let trailing = Schema::structure("Trailing", [("a", Schema::VEC3F)]).unwrap();
        assert!(!trailing.is_contiguous());
    }

    #[test]
    fn atomic_matches_inner() {
        let a = Schema::atomic(Scalar::U32).unwrap();
        assert_eq!(a.layout(), Schema::U32.layout());
    }

    fn leaf() -> impl Strategy<Value = Schema> {
        prop_oneof![
            Just(Schema::F32),
            Just(Schema::U32),
            Just(Schema::F16),
            Just(Schema::VEC2F),
            Just(Schema::VEC3F),
            Just(Schema::VEC4F),
            Just(Schema::VEC3U),
            Just(Schema::VEC2H),
            Just(Schema::MAT3X3F),
            Just(Schema::MAT4X4F),
        ]
    }

    fn member() -> impl Strategy<Value = Schema> {
        let element = (leaf(), 1u32..5).prop_map(|(e, n)| Schema::array(e, n).unwrap());
        let base = prop_oneof![leaf(), element];
        (base, 0u32..3, 0u64..3).prop_map(|(schema, shift, extra)| {
            let natural = schema.layout();
            let schema = if shift > 0 {
                align(natural.alignment << shift, schema).unwrap()
            } else {
                schema
            };
            if extra > 0 {
                size(natural.size.unwrap() + extra * 4, schema).unwrap()
            } else {
                schema
            }
        })
    }

    fn record() -> impl Strategy<Value = Schema> {
        prop::collection::vec(member(), 1..6).prop_map(|members| {
            Schema::structure(
                "Record",
                members
                    .into_iter()
                    .enumerate()
                    .map(|(i, s)| (format!("f{i}"), s)),
            )
            .unwrap()
        })
    }

    proptest! {
        #[test]
        fn offsets_respect_member_alignment(s in record()) {
            for field in s.field_layouts().unwrap() {
                prop_assert_eq!(field.offset % field.alignment, 0);
            }
        }

        #[test]
        fn size_is_multiple_of_alignment(s in record()) {
            let layout = s.layout();
            prop_assert_eq!(layout.size.unwrap() % layout.alignment, 0);
        }

        #[test]
        fn layout_is_deterministic(s in record()) {
            prop_assert_eq!(s.layout(), s.clone().layout());
            prop_assert_eq!(s.field_layouts(), s.field_layouts());
        }

        #[test]
        fn custom_alignment_is_exact(base in leaf(), shift in 0u32..4) {
            let wanted = base.alignment() << shift;
            prop_assert_eq!(align(wanted, base).unwrap().alignment(), wanted);
        }

        #[test]
        fn members_never_overlap(s in record()) {
            let fields = s.field_layouts().unwrap();
            for pair in fields.windows(2) {
                prop_assert!(pair[0].offset + pair[0].size.unwrap() <= pair[1].offset);
            }
        }
    }
}
