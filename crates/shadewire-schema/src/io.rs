//! Inter-stage and vertex input/output helpers.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::construct::location;
use crate::error::SchemaError;
use crate::types::{Schema, StructField, StructSchema};

/// Gives every IO member without a builtin or an explicit `@location` the
/// lowest unused location, in declaration order.
///
/// Non-struct schemas get `@location(0)` unless they are builtins or
/// already located.
pub fn with_locations(schema: &Schema) -> Result<Schema, SchemaError> {
    let Some(s) = schema.as_struct() else {
        if schema.builtin().is_some() || schema.location().is_some() {
            return Ok(schema.clone());
        }
        return location(0, schema.clone());
    };

    let mut used: BTreeSet<u32> = s.fields().iter().filter_map(|f| f.schema.location()).collect();
    let mut next = 0;
    let mut fields = Vec::with_capacity(s.fields().len());
    for field in s.fields() {
        let schema = if field.schema.builtin().is_some() || field.schema.location().is_some() {
            field.schema.clone()
        } else {
            while used.contains(&next) {
                next += 1;
            }
            used.insert(next);
            location(next, field.schema.clone())?
        };
        fields.push(StructField {
            name: field.name.clone(),
            schema,
        });
    }

    let rebuilt = Arc::new(StructSchema {
        label: s.label.clone(),
        fields,
    });
    Ok(if schema.is_loose() {
        Schema::LooseStruct(rebuilt)
    } else {
        Schema::Struct(rebuilt)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BuiltinValue;

    #[test]
    fn assigns_lowest_free_locations() {
        let s = Schema::structure(
            "VertexIn",
            [
                ("index", Schema::Builtin(BuiltinValue::VertexIndex)),
                ("pos", Schema::VEC2F),
                ("color", location(0, Schema::VEC4F).unwrap()),
                ("uv", Schema::VEC2F),
            ],
        )
        .unwrap();
        let located = with_locations(&s).unwrap();
        let fields = located.as_struct().unwrap().fields();
        assert_eq!(fields[0].schema.location(), None);
        assert_eq!(fields[1].schema.location(), Some(1));
        assert_eq!(fields[2].schema.location(), Some(0));
        assert_eq!(fields[3].schema.location(), Some(2));
        assert_eq!(located.label(), Some("VertexIn"));
    }

    #[test]
    fn plain_value_gets_location_zero() {
        let located = with_locations(&Schema::VEC4F).unwrap();
        assert_eq!(located.location(), Some(0));
        let position = Schema::Builtin(BuiltinValue::Position);
        assert_eq!(with_locations(&position).unwrap(), position);
    }
}
