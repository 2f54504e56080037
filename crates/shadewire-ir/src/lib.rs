//! Function-body intermediate representation for shadewire.
//!
//! The IR is a small immutable tree produced by an external transpiler
//! from host-language functions. Numeric literals keep their source text so
//! the generator can decide their concrete WGSL type from context.

mod display;
mod expr;
mod stmt;

pub use expr::{AssignOp, BinaryOp, Expression, Literal, LogicalOp, UnaryOp, UpdateOp};
pub use stmt::{Block, DeclarationKind, Function, Statement};
