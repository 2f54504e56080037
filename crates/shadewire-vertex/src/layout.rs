//! Vertex buffer layouts derived from array schemas.

use log::warn;
use shadewire_schema::Schema;

use crate::error::VertexError;
use crate::format::VertexFormat;

/// How often the vertex fetch advances through a buffer.
#[derive(Clone, Copy, Debug, Default, Hash, Eq, PartialEq)]
pub enum StepMode {
    /// One element per vertex.
    #[default]
    Vertex,
    /// One element per instance.
    Instance,
}

/// One attribute a vertex buffer can supply.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LayoutAttribute {
    /// Field name for struct elements, `None` when the element itself is
    /// the attribute.
    pub name: Option<String>,
    pub format: VertexFormat,
    pub offset: u64,
}

/// The attributes and stride of one vertex buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VertexLayout {
    schema: Schema,
    step_mode: StepMode,
    stride: u64,
    attributes: Vec<LayoutAttribute>,
}

impl VertexLayout {
    /// Describes a buffer holding `schema`, an array or loose array.
    ///
    /// The stride is the array stride; attributes come from the element's
    /// fields (or the element itself) with their byte offsets.
    pub fn new(schema: &Schema, step_mode: StepMode) -> Result<Self, VertexError> {
        let (element, stride) = match (schema.as_array(), schema.stride()) {
            (Some(array), Some(stride)) => (array.element().clone(), stride),
            _ => return Err(VertexError::NotAnArray(schema.to_string())),
        };

        let attributes = match (element.as_struct(), element.field_layouts()) {
            (Some(s), Some(layouts)) => s
                .fields()
                .iter()
                .zip(layouts)
                .map(|(field, layout)| {
                    let format = VertexFormat::from_schema(&field.schema).ok_or_else(|| {
                        VertexError::UnsupportedFormat {
                            field: field.name.clone(),
                            schema: field.schema.to_string(),
                        }
                    })?;
                    Ok(LayoutAttribute {
                        name: Some(field.name.clone()),
                        format,
                        offset: layout.offset,
                    })
                })
                .collect::<Result<Vec<_>, VertexError>>()?,
            _ => {
                let format = VertexFormat::from_schema(&element).ok_or_else(|| {
                    VertexError::UnsupportedFormat {
                        field: "element".into(),
                        schema: element.to_string(),
                    }
                })?;
                vec![LayoutAttribute {
                    name: None,
                    format,
                    offset: 0,
                }]
            }
        };

        if !schema.is_contiguous() {
            warn!("vertex data {schema} contains padding; a loose layout would be denser");
        }

        Ok(Self {
            schema: schema.clone(),
            step_mode,
            stride,
            attributes,
        })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn step_mode(&self) -> StepMode {
        self.step_mode
    }

    /// Bytes between consecutive elements.
    pub fn stride(&self) -> u64 {
        self.stride
    }

    pub fn attributes(&self) -> &[LayoutAttribute] {
        &self.attributes
    }

    /// The attribute for `name`; `None` selects the whole element.
    pub fn attribute(&self, name: Option<&str>) -> Option<&LayoutAttribute> {
        self.attributes
            .iter()
            .find(|a| a.name.as_deref() == name)
    }
}
