#![warn(missing_docs)]
//! Resolution of shadewire items into a WGSL module.
//!
//! Items (functions, buffers, constants, variables, slots and derived
//! values) live in a [`Registry`] and refer to each other by [`Handle`].
//! [`resolve`] walks everything a request references, declares each item
//! once per distinct set of slot values it observed, and returns the
//! module text with binding and struct layout metadata.
//!
//! Slots are filled through [`Item::with`] bindings; derived values are
//! computed lazily and memoized by the slot values they actually read.

mod arena;
mod builtins;
mod context;
mod error;
mod generator;
mod item;
mod literal;
mod names;
mod slot;
mod snippet;
mod template;

pub use arena::{Arena, Handle};
pub use context::{
    BindingInfo, Extension, Naming, ResolutionCtx, ResolveOptions, ResolveRequest, ResolvedModule,
    StructLayoutInfo, resolve, resolve_items,
};
pub use error::{GenerationError, ResolveError};
pub use item::{
    Access, AddressSpace, Bound, Buffer, Constant, Function, FunctionBody, Helper, Item, Registry,
    Stage, Usage, Value, Variable,
};
pub use names::{DEFAULT_NAME, NameRegistry, RandomNameRegistry, StrictNameRegistry};
pub use slot::{Derived, DerivedScope, Slot};
pub use snippet::{Snippet, SnippetType};
