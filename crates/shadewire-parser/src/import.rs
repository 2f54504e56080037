//! Reading struct layouts and schemas out of a `naga::Module`.

use std::collections::HashMap;

use shadewire_schema::{
    BuiltinValue, Scalar, Schema, VectorSize, align, location, round_up, size,
};

use crate::{ParseError, parse};

// ---------------------------------------------------------------------------
// Layouts as naga computes them
// ---------------------------------------------------------------------------

/// The layout naga assigns to a struct declared in WGSL source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StructLayout {
    pub name: String,
    pub size: u32,
    pub alignment: u32,
    /// Member names and byte offsets, in declaration order.
    pub members: Vec<(String, u32)>,
}

/// Layouts of every named struct in `source`, in declaration order.
pub fn struct_layouts(source: &str) -> Result<Vec<StructLayout>, ParseError> {
    let module = parse(source)?;
    let mut layouter = naga::proc::Layouter::default();
    layouter
        .update(module.to_ctx())
        .map_err(|e| ParseError::Layout(e.to_string()))?;

    let mut layouts = Vec::new();
    for (handle, ty) in module.types.iter() {
        let naga::TypeInner::Struct { members, span } = &ty.inner else {
            continue;
        };
        let Some(name) = &ty.name else {
            continue;
        };
        layouts.push(StructLayout {
            name: name.clone(),
            size: *span,
            // `round_up(1)` yields the alignment itself.
            alignment: layouter[handle].alignment.round_up(1),
            members: members
                .iter()
                .map(|m| (m.name.clone().unwrap_or_default(), m.offset))
                .collect(),
        });
    }
    Ok(layouts)
}

// ---------------------------------------------------------------------------
// Schema import
// ---------------------------------------------------------------------------

/// Imports every named struct in `source` as a [`Schema`].
///
/// Member offsets, struct sizes and alignments are reproduced exactly.
/// Where naga places a member further than natural layout would (an
/// explicit `@align` or `@size` in the source), the preceding member gets
/// an `@size` covering the gap; a struct aligned beyond its members' natural
/// alignment gets that alignment on its first member.
pub fn import_structs(source: &str) -> Result<Vec<(String, Schema)>, ParseError> {
    let module = parse(source)?;
    let mut layouter = naga::proc::Layouter::default();
    layouter
        .update(module.to_ctx())
        .map_err(|e| ParseError::Layout(e.to_string()))?;
    let mut importer = Importer {
        module: &module,
        layouter: &layouter,
        schemas: HashMap::new(),
    };

    let mut structs = Vec::new();
    for (handle, ty) in module.types.iter() {
        if let (naga::TypeInner::Struct { .. }, Some(name)) = (&ty.inner, &ty.name) {
            structs.push((name.clone(), importer.schema(handle)?));
        }
    }
    Ok(structs)
}

struct Importer<'a> {
    module: &'a naga::Module,
    layouter: &'a naga::proc::Layouter,
    schemas: HashMap<naga::Handle<naga::Type>, Schema>,
}

impl Importer<'_> {
    fn schema(&mut self, handle: naga::Handle<naga::Type>) -> Result<Schema, ParseError> {
        if let Some(schema) = self.schemas.get(&handle) {
            return Ok(schema.clone());
        }
        let ty = &self.module.types[handle];
        let schema = match &ty.inner {
            naga::TypeInner::Scalar(s) => Schema::Scalar(scalar(*s)?),
            naga::TypeInner::Vector { size, scalar: s } => {
                Schema::vector(vector_size(*size), scalar(*s)?)?
            }
            naga::TypeInner::Matrix {
                columns,
                rows,
                scalar: s,
            } if columns == rows && *s == naga::Scalar::F32 => Schema::Matrix {
                size: vector_size(*columns),
            },
            naga::TypeInner::Atomic(s) => Schema::atomic(scalar(*s)?)?,
            naga::TypeInner::Array { base, size, .. } => {
                let element = self.schema(*base)?;
                match size {
                    naga::ArraySize::Constant(n) => Schema::array(element, n.get())?,
                    naga::ArraySize::Dynamic => Schema::runtime_array(element)?,
                    other => return Err(unsupported(&format!("array size {other:?}"))),
                }
            }
            naga::TypeInner::Struct { members, span } => {
                let label = ty.name.clone().unwrap_or_default();
                let alignment = u64::from(self.layouter[handle].alignment.round_up(1));
                let fields = self.members(members, *span, alignment)?;
                Schema::structure(label, fields)?
            }
            other => return Err(unsupported(&format!("{other:?}"))),
        };
        self.schemas.insert(handle, schema.clone());
        Ok(schema)
    }

    fn members(
        &mut self,
        members: &[naga::StructMember],
        span: u32,
        alignment: u64,
    ) -> Result<Vec<(String, Schema)>, ParseError> {
        let mut schemas = Vec::with_capacity(members.len());
        for member in members {
            let schema = match &member.binding {
                Some(naga::Binding::BuiltIn(builtin)) => Schema::Builtin(builtin_value(builtin)?),
                Some(naga::Binding::Location { location: n, .. }) => {
                    location(*n, self.schema(member.ty)?)?
                }
                None => self.schema(member.ty)?,
            };
            schemas.push(schema);
        }

        let natural = schemas.iter().map(Schema::alignment).max().unwrap_or(1);
        if alignment > natural
            && let Some(first) = schemas.first_mut()
        {
            *first = align(alignment, first.clone())?;
        }

        let mut fields = Vec::with_capacity(members.len());
        for (i, (member, schema)) in members.iter().zip(schemas.iter()).enumerate() {
            let offset = u64::from(member.offset);
            let end = offset + schema.size().unwrap_or(0);
            let (next, natural_next) = match members.get(i + 1) {
                Some(next) => (
                    u64::from(next.offset),
                    round_up(end, schemas[i + 1].alignment()),
                ),
                None => (u64::from(span), round_up(end, alignment)),
            };
            let schema = if next != natural_next && !schema.is_runtime_sized() {
                size(next - offset, schema.clone())?
            } else {
                schema.clone()
            };
            let name = member
                .name
                .clone()
                .unwrap_or_else(|| format!("member_{i}"));
            fields.push((name, schema));
        }
        Ok(fields)
    }
}

fn unsupported(what: &str) -> ParseError {
    ParseError::Unsupported(what.to_string())
}

fn scalar(s: naga::Scalar) -> Result<Scalar, ParseError> {
    match (s.kind, s.width) {
        (naga::ScalarKind::Bool, _) => Ok(Scalar::BOOL),
        (naga::ScalarKind::Float, 4) => Ok(Scalar::F32),
        (naga::ScalarKind::Float, 2) => Ok(Scalar::F16),
        (naga::ScalarKind::Sint, 4) => Ok(Scalar::I32),
        (naga::ScalarKind::Uint, 4) => Ok(Scalar::U32),
        _ => Err(unsupported(&format!("scalar {s:?}"))),
    }
}

fn vector_size(size: naga::VectorSize) -> VectorSize {
    match size {
        naga::VectorSize::Bi => VectorSize::Bi,
        naga::VectorSize::Tri => VectorSize::Tri,
        naga::VectorSize::Quad => VectorSize::Quad,
    }
}

fn builtin_value(builtin: &naga::BuiltIn) -> Result<BuiltinValue, ParseError> {
    Ok(match builtin {
        naga::BuiltIn::Position { .. } => BuiltinValue::Position,
        naga::BuiltIn::VertexIndex => BuiltinValue::VertexIndex,
        naga::BuiltIn::InstanceIndex => BuiltinValue::InstanceIndex,
        naga::BuiltIn::FrontFacing => BuiltinValue::FrontFacing,
        naga::BuiltIn::FragDepth => BuiltinValue::FragDepth,
        naga::BuiltIn::SampleIndex => BuiltinValue::SampleIndex,
        naga::BuiltIn::SampleMask => BuiltinValue::SampleMask,
        naga::BuiltIn::GlobalInvocationId => BuiltinValue::GlobalInvocationId,
        naga::BuiltIn::LocalInvocationId => BuiltinValue::LocalInvocationId,
        naga::BuiltIn::LocalInvocationIndex => BuiltinValue::LocalInvocationIndex,
        naga::BuiltIn::WorkGroupId => BuiltinValue::WorkgroupId,
        naga::BuiltIn::NumWorkGroups => BuiltinValue::NumWorkgroups,
        other => return Err(unsupported(&format!("builtin {other:?}"))),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn naga_layout_of_padded_struct() {
        let layouts = struct_layouts("struct A { a: u32, b: vec3<u32> }").unwrap();
        assert_eq!(
            layouts,
            [StructLayout {
                name: "A".into(),
                size: 32,
                alignment: 16,
                members: vec![("a".into(), 0), ("b".into(), 16)],
            }]
        );
    }

    #[test]
    fn explicit_alignment_is_reproduced_with_sizes() {
        let source = "struct S { x: u32, @align(16) y: u32, z: u32 }";
        let [(name, schema)] = import_structs(source).unwrap().try_into().unwrap();
        assert_eq!(name, "S");
        assert_eq!(schema.size(), Some(32));
        assert_eq!(
            schema.field_offsets().unwrap(),
            [("x".into(), 0), ("y".into(), 16), ("z".into(), 20)]
        );
    }

    #[test]
    fn raised_struct_alignment_is_recovered() {
        let source = "struct T { a: u32, @align(32) b: u32 }";
        let [(_, schema)] = import_structs(source).unwrap().try_into().unwrap();
        assert_eq!(schema.alignment(), 32);
        assert_eq!(schema.size(), Some(64));
        assert_eq!(
            schema.field_offsets().unwrap(),
            [("a".into(), 0), ("b".into(), 32)]
        );
    }

    #[test]
    fn io_bindings_become_attributes() {
        let source = "struct Out { @builtin(position) pos: vec4<f32>, @location(2) uv: vec2<f32> }";
        let [(_, schema)] = import_structs(source).unwrap().try_into().unwrap();
        let fields = schema.as_struct().unwrap().fields();
        assert_eq!(fields[0].schema.builtin(), Some(BuiltinValue::Position));
        assert_eq!(fields[1].schema.location(), Some(2));
    }

    #[test]
    fn nested_structs_share_one_schema() {
        let source = "struct Inner { v: vec2<f32> }\nstruct Outer { a: Inner, b: array<Inner, 3> }";
        let structs = import_structs(source).unwrap();
        assert_eq!(structs.len(), 2);
        let outer = &structs[1].1;
        let b = outer.as_struct().unwrap().field("b").unwrap();
        assert_eq!(b.schema.as_array().unwrap().element(), &structs[0].1);
    }
}
