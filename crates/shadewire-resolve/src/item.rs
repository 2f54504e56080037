//! Resolvable items, host values and the registry that owns them.

use std::fmt;
use std::sync::Arc;

use shadewire_schema::Schema;

use crate::arena::{Arena, Handle};
use crate::error::ResolveError;
use crate::slot::{Derived, DerivedScope, Slot};
use crate::snippet::Snippet;

/// Where a function sits in the pipeline.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub enum Stage {
    /// An ordinary function, callable from other functions.
    Plain,
    Vertex,
    Fragment,
    Compute { workgroup_size: [u32; 3] },
}

impl Stage {
    pub fn is_entry_point(self) -> bool {
        !matches!(self, Self::Plain)
    }
}

/// A function body, either pre-authored or transpiled.
#[derive(Clone, Debug, PartialEq)]
pub enum FunctionBody {
    /// Raw WGSL starting at the parameter list, e.g.
    /// `(x: f32) -> f32 { return x * scale; }`. Identifiers naming an
    /// external are substituted with the external's resolved text.
    Wgsl(String),
    /// A transpiled body; parameter and result types come from the shell.
    Ir(shadewire_ir::Function),
}

/// A shader function: a typed shell plus a body and its externals.
#[derive(Clone, Debug, PartialEq)]
pub struct Function {
    pub label: Option<String>,
    pub stage: Stage,
    pub params: Vec<Schema>,
    pub result: Option<Schema>,
    pub body: FunctionBody,
    /// Host values the body refers to by name.
    pub externals: Vec<(String, Value)>,
}

impl Function {
    pub fn ir(
        label: impl Into<String>,
        params: impl IntoIterator<Item = Schema>,
        result: Option<Schema>,
        body: shadewire_ir::Function,
    ) -> Self {
        Self {
            label: Some(label.into()),
            stage: Stage::Plain,
            params: params.into_iter().collect(),
            result,
            body: FunctionBody::Ir(body),
            externals: Vec::new(),
        }
    }

    pub fn wgsl(
        label: impl Into<String>,
        params: impl IntoIterator<Item = Schema>,
        result: Option<Schema>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            label: Some(label.into()),
            stage: Stage::Plain,
            params: params.into_iter().collect(),
            result,
            body: FunctionBody::Wgsl(text.into()),
            externals: Vec::new(),
        }
    }

    pub fn stage(mut self, stage: Stage) -> Self {
        self.stage = stage;
        self
    }

    pub fn external(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.externals.push((name.into(), value.into()));
        self
    }
}

/// Read-only or read-write storage access.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub enum Access {
    Read,
    ReadWrite,
}

#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub enum Usage {
    Uniform,
    Storage(Access),
}

impl Usage {
    /// The address space spelled inside `var<...>`.
    pub fn address_space(self) -> &'static str {
        match self {
            Self::Uniform => "uniform",
            Self::Storage(Access::Read) => "storage, read",
            Self::Storage(Access::ReadWrite) => "storage, read_write",
        }
    }
}

/// A buffer bound to the pipeline through a bind group.
#[derive(Clone, Debug, PartialEq)]
pub struct Buffer {
    pub label: Option<String>,
    pub schema: Schema,
    pub usage: Usage,
    /// Unset indices are assigned automatically in group 0.
    pub group: Option<u32>,
    pub binding: Option<u32>,
}

impl Buffer {
    pub fn new(label: impl Into<String>, schema: Schema, usage: Usage) -> Self {
        Self {
            label: Some(label.into()),
            schema,
            usage,
            group: None,
            binding: None,
        }
    }

    pub fn at(mut self, group: u32, binding: u32) -> Self {
        self.group = Some(group);
        self.binding = Some(binding);
        self
    }
}

/// A module-scope `const`.
#[derive(Clone, Debug, PartialEq)]
pub struct Constant {
    pub label: Option<String>,
    pub schema: Schema,
    pub value: Value,
}

#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub enum AddressSpace {
    Private,
    Workgroup,
}

/// A module-scope `var<private>` or `var<workgroup>`.
#[derive(Clone, Debug, PartialEq)]
pub struct Variable {
    pub label: Option<String>,
    pub space: AddressSpace,
    pub schema: Schema,
    /// Only private variables may have an initializer.
    pub init: Option<Value>,
}

/// A compile-time host computation, invoked during generation.
#[derive(Clone)]
pub struct Helper {
    pub label: String,
    call: Arc<dyn Fn(&[Value]) -> Result<Value, ResolveError> + Send + Sync>,
}

impl Helper {
    pub fn new<F>(label: impl Into<String>, f: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, ResolveError> + Send + Sync + 'static,
    {
        Self {
            label: label.into(),
            call: Arc::new(f),
        }
    }

    pub fn call(&self, args: &[Value]) -> Result<Value, ResolveError> {
        (self.call)(args)
    }
}

impl fmt::Debug for Helper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Helper({})", self.label)
    }
}

impl PartialEq for Helper {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.call, &other.call)
    }
}

/// An item with slot bindings applied to its sub-resolution.
#[derive(Clone, Debug, PartialEq)]
pub struct Bound {
    pub item: Item,
    pub bindings: Vec<(Handle<Slot>, Value)>,
}

/// A reference to something that can produce WGSL.
#[derive(Clone, Debug, PartialEq)]
pub enum Item {
    Function(Handle<Function>),
    Slot(Handle<Slot>),
    Derived(Handle<Derived>),
    Constant(Handle<Constant>),
    Variable(Handle<Variable>),
    Buffer(Handle<Buffer>),
    Bound(Arc<Bound>),
}

impl Item {
    /// Binds `slot` to `value` while this item is resolved.
    ///
    /// Later bindings shadow earlier ones for the same slot.
    pub fn with(&self, slot: Handle<Slot>, value: impl Into<Value>) -> Item {
        let (item, mut bindings) = match self {
            Item::Bound(b) => (b.item.clone(), b.bindings.clone()),
            other => (other.clone(), Vec::new()),
        };
        bindings.push((slot, value.into()));
        Item::Bound(Arc::new(Bound { item, bindings }))
    }

    /// The function behind this item, looking through bindings.
    pub fn function(&self) -> Option<Handle<Function>> {
        match self {
            Item::Function(h) => Some(*h),
            Item::Bound(b) => b.item.function(),
            _ => None,
        }
    }
}

macro_rules! item_from_handle {
    ($($ty:ident),*) => {
        $(
            impl From<Handle<$ty>> for Item {
                fn from(h: Handle<$ty>) -> Self {
                    Item::$ty(h)
                }
            }

            impl From<Handle<$ty>> for Value {
                fn from(h: Handle<$ty>) -> Self {
                    Value::Item(Item::$ty(h))
                }
            }
        )*
    };
}

item_from_handle!(Function, Slot, Derived, Constant, Variable, Buffer);

/// A host value that resolution can turn into WGSL.
#[derive(Clone, Debug)]
pub enum Value {
    Bool(bool),
    AbstractInt(i64),
    AbstractFloat(f64),
    I32(i32),
    U32(u32),
    F32(f32),
    F16(half::f16),
    /// A type; calling it constructs a value.
    Schema(Schema),
    Item(Item),
    /// Already generated WGSL.
    Code(Snippet),
    Array(Vec<Value>),
    /// A compile-time record; member access is resolved on the host.
    Record(Vec<(String, Value)>),
    Helper(Helper),
}

impl Value {
    pub fn record<N: Into<String>>(fields: impl IntoIterator<Item = (N, Value)>) -> Self {
        Self::Record(
            fields
                .into_iter()
                .map(|(name, value)| (name.into(), value))
                .collect(),
        )
    }

    /// Field of a compile-time record.
    pub fn field(&self, name: &str) -> Option<&Value> {
        match self {
            Self::Record(fields) => fields.iter().find(|(n, _)| n == name).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Short description used in error messages.
    pub fn describe(&self) -> String {
        match self {
            Self::Bool(_) => "bool".into(),
            Self::AbstractInt(_) => "abstract-int".into(),
            Self::AbstractFloat(_) => "abstract-float".into(),
            Self::I32(_) => "i32".into(),
            Self::U32(_) => "u32".into(),
            Self::F32(_) => "f32".into(),
            Self::F16(_) => "f16".into(),
            Self::Schema(s) => format!("type {s}"),
            Self::Item(_) => "item".into(),
            Self::Code(s) => format!("expression '{}'", s.code),
            Self::Array(_) => "array value".into(),
            Self::Record(_) => "record".into(),
            Self::Helper(h) => format!("helper '{}'", h.label),
        }
    }
}

/// Floats compare by bit pattern so that memo lookups are reflexive.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::AbstractInt(a), Self::AbstractInt(b)) => a == b,
            (Self::AbstractFloat(a), Self::AbstractFloat(b)) => a.to_bits() == b.to_bits(),
            (Self::I32(a), Self::I32(b)) => a == b,
            (Self::U32(a), Self::U32(b)) => a == b,
            (Self::F32(a), Self::F32(b)) => a.to_bits() == b.to_bits(),
            (Self::F16(a), Self::F16(b)) => a.to_bits() == b.to_bits(),
            (Self::Schema(a), Self::Schema(b)) => a == b,
            (Self::Item(a), Self::Item(b)) => a == b,
            (Self::Code(a), Self::Code(b)) => a == b,
            (Self::Array(a), Self::Array(b)) => a == b,
            (Self::Record(a), Self::Record(b)) => a == b,
            (Self::Helper(a), Self::Helper(b)) => a == b,
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::I32(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Self::U32(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Self::F32(v)
    }
}

impl From<half::f16> for Value {
    fn from(v: half::f16) -> Self {
        Self::F16(v)
    }
}

impl From<Schema> for Value {
    fn from(v: Schema) -> Self {
        Self::Schema(v)
    }
}

impl From<Item> for Value {
    fn from(v: Item) -> Self {
        Self::Item(v)
    }
}

impl From<Helper> for Value {
    fn from(v: Helper) -> Self {
        Self::Helper(v)
    }
}

/// Owns every resolvable item of a host program.
///
/// Items are added during setup through `&mut self`. Resolution borrows
/// the registry immutably, so nothing can be created while a resolution
/// is in progress.
#[derive(Debug, Default)]
pub struct Registry {
    pub(crate) functions: Arena<Function>,
    pub(crate) slots: Arena<Slot>,
    pub(crate) derived: Arena<Derived>,
    pub(crate) constants: Arena<Constant>,
    pub(crate) variables: Arena<Variable>,
    pub(crate) buffers: Arena<Buffer>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn function(&mut self, function: Function) -> Handle<Function> {
        self.functions.append(function)
    }

    /// A slot with an optional default value.
    pub fn slot(&mut self, label: impl Into<String>, default: Option<Value>) -> Handle<Slot> {
        self.slots.append(Slot {
            label: Some(label.into()),
            default,
            schema: None,
        })
    }

    /// A slot whose value is concretized to `schema` when emitted.
    pub fn typed_slot(
        &mut self,
        label: impl Into<String>,
        schema: Schema,
        default: Option<Value>,
    ) -> Handle<Slot> {
        self.slots.append(Slot {
            label: Some(label.into()),
            default,
            schema: Some(schema),
        })
    }

    pub fn derived<F>(&mut self, label: impl Into<String>, compute: F) -> Handle<Derived>
    where
        F: Fn(&mut DerivedScope<'_, '_>) -> Result<Value, ResolveError> + Send + Sync + 'static,
    {
        self.derived.append(Derived::new(label, compute))
    }

    pub fn constant(
        &mut self,
        label: impl Into<String>,
        schema: Schema,
        value: impl Into<Value>,
    ) -> Handle<Constant> {
        self.constants.append(Constant {
            label: Some(label.into()),
            schema,
            value: value.into(),
        })
    }

    pub fn variable(&mut self, variable: Variable) -> Handle<Variable> {
        self.variables.append(variable)
    }

    pub fn buffer(&mut self, buffer: Buffer) -> Handle<Buffer> {
        self.buffers.append(buffer)
    }

    pub fn functions(&self) -> &Arena<Function> {
        &self.functions
    }
}
