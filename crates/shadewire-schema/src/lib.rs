//! Schema values for shadewire.
//!
//! A [`Schema`] describes a GPU-representable type: scalars, vectors,
//! matrices, arrays, structs, atomics, decorated members, loose (unpadded)
//! vertex data and pipeline builtins. Every composite constructor validates
//! eagerly, so an invalid schema can never reach resolution.
//!
//! The [`layout`] module assigns size, alignment and field offsets that
//! match WGSL's host-shareable memory layout byte for byte.

mod construct;
mod display;
mod error;
pub mod io;
pub mod layout;
mod types;

pub use construct::{align, interpolate, location, size};
pub use error::SchemaError;
pub use layout::{FieldLayout, Layout, round_up};
pub use types::{
    ArraySchema, Attribute, BuiltinValue, Bytes, Decorated, InterpolationSampling,
    InterpolationType, PackedFormat, Scalar, ScalarKind, Schema, StructField, StructSchema,
    VectorSize,
};
