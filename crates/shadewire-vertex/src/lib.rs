//! Vertex buffer layouts for shadewire.
//!
//! A [`VertexLayout`] reads the stride and attribute offsets of a vertex
//! buffer from its array schema. [`connect`] matches those attributes
//! against the inputs a vertex shader declares and produces the buffer
//! descriptors a graphics API needs, failing on any input left unfed.

mod connect;
mod error;
mod format;
mod layout;

pub use connect::{AttributeRef, VertexAttribute, VertexBufferLayoutOwned, connect};
pub use error::VertexError;
pub use format::VertexFormat;
pub use layout::{LayoutAttribute, StepMode, VertexLayout};
