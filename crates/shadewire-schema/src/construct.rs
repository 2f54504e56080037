//! Validating constructors for composite and decorated schemas.

use std::collections::HashSet;
use std::sync::Arc;

use crate::error::SchemaError;
use crate::types::{
    ArraySchema, Attribute, Decorated, InterpolationSampling, InterpolationType, PackedFormat,
    Scalar, Schema, StructField, StructSchema, VectorSize,
};

impl Schema {
    /// A vector of `size` components.
    pub fn vector(size: VectorSize, scalar: Scalar) -> Result<Schema, SchemaError> {
        if scalar == Scalar::U16 {
            return Err(SchemaError::VectorScalar(scalar.to_string()));
        }
        Ok(Schema::Vector { size, scalar })
    }

    /// A fixed-size array of `count` elements; `count == 0` is runtime-sized.
    pub fn array(element: Schema, count: u32) -> Result<Schema, SchemaError> {
        check_leaf(&element)?;
        if element.is_runtime_sized() {
            return Err(SchemaError::NestedRuntimeArray("array element".into()));
        }
        if element.is_loose() {
            return Err(SchemaError::LooseInAligned("array element".into()));
        }
        Ok(Schema::Array(Arc::new(ArraySchema { element, count })))
    }

    /// A runtime-sized array.
    pub fn runtime_array(element: Schema) -> Result<Schema, SchemaError> {
        Self::array(element, 0)
    }

    /// A tightly packed array for vertex data.
    pub fn loose_array(element: Schema, count: u32) -> Result<Schema, SchemaError> {
        if count == 0 {
            return Err(SchemaError::RuntimeArrayInLoose("loose array".into()));
        }
        check_leaf(&element)?;
        if element.is_runtime_sized() {
            return Err(SchemaError::NestedRuntimeArray("loose array element".into()));
        }
        Ok(Schema::LooseArray(Arc::new(ArraySchema { element, count })))
    }

    /// A labeled struct. Field order is preserved and significant.
    pub fn structure<N: Into<String>>(
        label: impl Into<String>,
        fields: impl IntoIterator<Item = (N, Schema)>,
    ) -> Result<Schema, SchemaError> {
        let s = build_struct(Some(label.into()), fields, false)?;
        Ok(Schema::Struct(Arc::new(s)))
    }

    /// A struct without a label; resolution names it `item`.
    pub fn anonymous_structure<N: Into<String>>(
        fields: impl IntoIterator<Item = (N, Schema)>,
    ) -> Result<Schema, SchemaError> {
        let s = build_struct(None, fields, false)?;
        Ok(Schema::Struct(Arc::new(s)))
    }

    /// A labeled struct without implicit padding, for vertex data.
    pub fn loose_structure<N: Into<String>>(
        label: impl Into<String>,
        fields: impl IntoIterator<Item = (N, Schema)>,
    ) -> Result<Schema, SchemaError> {
        let s = build_struct(Some(label.into()), fields, true)?;
        Ok(Schema::LooseStruct(Arc::new(s)))
    }

    /// An atomic integer.
    pub fn atomic(scalar: Scalar) -> Result<Schema, SchemaError> {
        if scalar != Scalar::I32 && scalar != Scalar::U32 {
            return Err(SchemaError::AtomicScalar(scalar.to_string()));
        }
        Ok(Schema::Atomic(scalar))
    }

    pub fn packed(format: PackedFormat) -> Schema {
        Schema::Packed(format)
    }
}

/// Rejects vector and atomic leaves spelled with the raw enum variants
/// over scalars their constructors refuse.
fn check_leaf(schema: &Schema) -> Result<(), SchemaError> {
    match schema.undecorated() {
        Schema::Vector { scalar, .. } => Schema::vector(VectorSize::Bi, *scalar).map(drop),
        Schema::Atomic(scalar) => Schema::atomic(*scalar).map(drop),
        _ => Ok(()),
    }
}

fn build_struct<N: Into<String>>(
    label: Option<String>,
    fields: impl IntoIterator<Item = (N, Schema)>,
    loose: bool,
) -> Result<StructSchema, SchemaError> {
    let fields: Vec<StructField> = fields
        .into_iter()
        .map(|(name, schema)| StructField {
            name: name.into(),
            schema,
        })
        .collect();

    if fields.is_empty() {
        let name = label.as_deref().unwrap_or("<anonymous>");
        return Err(SchemaError::EmptyStruct(name.into()));
    }

    let mut names = HashSet::new();
    let mut locations = HashSet::new();
    let last = fields.len() - 1;
    for (i, field) in fields.iter().enumerate() {
        if !names.insert(field.name.as_str()) {
            return Err(SchemaError::DuplicateField(field.name.clone()));
        }
        check_leaf(&field.schema)?;
        if let Some(location) = field.schema.location()
            && !locations.insert(location)
        {
            return Err(SchemaError::DuplicateLocation {
                location,
                field: field.name.clone(),
            });
        }

        if loose {
            if field.schema.is_runtime_sized() {
                return Err(SchemaError::RuntimeArrayInLoose(format!(
                    "field '{}'",
                    field.name
                )));
            }
            continue;
        }

        if field.schema.is_loose() {
            return Err(SchemaError::LooseInAligned(format!("field '{}'", field.name)));
        }
        if field.schema.is_runtime_sized() {
            let is_array = field.schema.as_array().is_some();
            if !is_array {
                return Err(SchemaError::NestedRuntimeArray(format!(
                    "field '{}'",
                    field.name
                )));
            }
            if i != last {
                return Err(SchemaError::RuntimeArrayNotLast {
                    field: field.name.clone(),
                });
            }
        }
    }

    Ok(StructSchema { label, fields })
}

fn decorate(schema: Schema, attribute: Attribute) -> Schema {
    let (inner, mut attributes) = match schema {
        Schema::Decorated(d) => (d.inner.clone(), d.attributes.clone()),
        other => (other, Vec::new()),
    };
    attributes.retain(|a| !a.same_kind(&attribute));
    attributes.push(attribute);
    Schema::Decorated(Arc::new(Decorated { inner, attributes }))
}

/// `@align(alignment)`: `alignment` must be a power of two and a multiple
/// of the natural alignment of `schema`.
pub fn align(alignment: u64, schema: Schema) -> Result<Schema, SchemaError> {
    if !alignment.is_power_of_two() {
        return Err(SchemaError::AlignmentNotPowerOfTwo(alignment));
    }
    let natural = schema.undecorated().alignment();
    if alignment % natural != 0 {
        return Err(SchemaError::AlignmentBelowNatural {
            align: alignment,
            natural,
        });
    }
    Ok(decorate(schema, Attribute::Align(alignment)))
}

/// `@size(bytes)`: `bytes` must be at least the natural size of `schema`.
pub fn size(bytes: u64, schema: Schema) -> Result<Schema, SchemaError> {
    let natural = schema
        .undecorated()
        .size()
        .ok_or(SchemaError::SizeOnRuntimeArray)?;
    if bytes < natural {
        return Err(SchemaError::SizeBelowNatural {
            size: bytes,
            natural,
        });
    }
    Ok(decorate(schema, Attribute::Size(bytes)))
}

/// `@location(n)` for inter-stage and vertex inputs.
pub fn location(n: u32, schema: Schema) -> Result<Schema, SchemaError> {
    if schema.builtin().is_some() {
        return Err(SchemaError::InvalidAttribute {
            attribute: format!("@location({n})"),
            target: "a builtin".into(),
        });
    }
    Ok(decorate(schema, Attribute::Location(n)))
}

/// `@interpolate(ty[, sampling])` for inter-stage values.
pub fn interpolate(
    ty: InterpolationType,
    sampling: Option<InterpolationSampling>,
    schema: Schema,
) -> Result<Schema, SchemaError> {
    let attribute = Attribute::Interpolate(ty, sampling);
    if schema.builtin().is_some() {
        return Err(SchemaError::InvalidAttribute {
            attribute: attribute.to_string(),
            target: "a builtin".into(),
        });
    }
    let is_integer = schema.data().scalar().is_some_and(|s| s.is_integer());
    if is_integer && ty != InterpolationType::Flat {
        return Err(SchemaError::InvalidAttribute {
            attribute: attribute.to_string(),
            target: "integer data".into(),
        });
    }
    Ok(decorate(schema, attribute))
}
