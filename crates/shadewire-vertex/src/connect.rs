//! Matching a vertex shader's inputs against bound vertex layouts.

use log::debug;
use shadewire_schema::{Schema, io::with_locations};

use crate::error::VertexError;
use crate::format::VertexFormat;
use crate::layout::{StepMode, VertexLayout};

/// Points a shader input at an attribute of one of the bound layouts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttributeRef {
    /// Index into the `layouts` slice passed to [`connect`].
    pub layout: usize,
    /// Field of the layout's element; `None` for the element itself.
    pub attribute: Option<String>,
}

impl AttributeRef {
    /// The whole element of layout `layout`.
    pub fn element(layout: usize) -> Self {
        Self {
            layout,
            attribute: None,
        }
    }

    /// Field `name` of the elements of layout `layout`.
    pub fn field(layout: usize, name: impl Into<String>) -> Self {
        Self {
            layout,
            attribute: Some(name.into()),
        }
    }
}

#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub struct VertexAttribute {
    pub format: VertexFormat,
    pub offset: u64,
    pub shader_location: u32,
}

/// An owned vertex buffer descriptor, ready for a graphics API.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VertexBufferLayoutOwned {
    pub array_stride: u64,
    pub step_mode: StepMode,
    pub attributes: Vec<VertexAttribute>,
}

/// Connects the inputs of a vertex shader to the attributes `supplied` for
/// them.
///
/// Every non-builtin member of `shader_inputs` must be supplied, and the
/// attribute's format must read as the member's scalar kind. Locations are
/// the ones the generated shader uses (see [`with_locations`]). Returns one
/// buffer layout per entry of `layouts`, in order, each listing the
/// attributes read from it by shader location.
pub fn connect(
    shader_inputs: &Schema,
    supplied: &[(&str, AttributeRef)],
    layouts: &[VertexLayout],
) -> Result<Vec<VertexBufferLayoutOwned>, VertexError> {
    let located = with_locations(shader_inputs)?;
    let inputs = located
        .as_struct()
        .ok_or_else(|| VertexError::NotAStruct(shader_inputs.to_string()))?;

    let mut buffers: Vec<VertexBufferLayoutOwned> = layouts
        .iter()
        .map(|layout| VertexBufferLayoutOwned {
            array_stride: layout.stride(),
            step_mode: layout.step_mode(),
            attributes: Vec::new(),
        })
        .collect();

    for field in inputs.fields() {
        if field.schema.builtin().is_some() {
            continue;
        }
        let Some(location) = field.schema.location() else {
            continue;
        };
        let (_, reference) = supplied
            .iter()
            .find(|(name, _)| *name == field.name)
            .ok_or_else(|| VertexError::MissingAttribute {
                field: field.name.clone(),
            })?;

        let layout = layouts
            .get(reference.layout)
            .ok_or_else(|| VertexError::UnknownLayout {
                field: field.name.clone(),
                layout: reference.layout,
                count: layouts.len(),
            })?;
        let attribute = layout
            .attribute(reference.attribute.as_deref())
            .ok_or_else(|| VertexError::UnknownAttribute {
                field: field.name.clone(),
                layout: reference.layout,
                attribute: reference
                    .attribute
                    .clone()
                    .unwrap_or_else(|| "element".into()),
            })?;

        let expected = field.schema.scalar();
        if expected.is_none_or(|s| s.kind() != attribute.format.shader_kind()) {
            return Err(VertexError::FormatMismatch {
                field: field.name.clone(),
                expected: field.schema.to_string(),
                format: attribute.format.to_string(),
            });
        }

        buffers[reference.layout].attributes.push(VertexAttribute {
            format: attribute.format,
            offset: attribute.offset,
            shader_location: location,
        });
    }

    for (name, _) in supplied {
        if inputs.field(name).is_none() {
            debug!("supplied attribute '{name}' is not read by the shader");
        }
    }
    for buffer in &mut buffers {
        buffer.attributes.sort_by_key(|a| a.shader_location);
    }
    Ok(buffers)
}
