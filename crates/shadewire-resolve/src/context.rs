//! The resolution context: all mutable state of one `resolve` call.
//!
//! A [`ResolutionCtx`] owns the binding stack, the memo table, the name
//! registry and the append-only declaration list. Declarations are appended
//! after everything they reference, so the output never contains forward
//! references. Items are deduplicated by handle plus the values of the slots
//! they (transitively) read.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;

use log::{debug, trace, warn};
use shadewire_schema::{FieldLayout, Scalar, Schema};

use crate::arena::Handle;
use crate::error::{GenerationError, ResolveError};
use crate::generator::{self, Generator};
use crate::item::{
    Access, AddressSpace, Buffer, Constant, Function, FunctionBody, Item, Registry, Usage, Value,
    Variable,
};
use crate::literal;
use crate::names::{DEFAULT_NAME, NameRegistry, RandomNameRegistry, StrictNameRegistry};
use crate::slot::{Derived, DerivedScope, Slot};
use crate::snippet::{Snippet, SnippetType};
use crate::template;

/// How declaration names are chosen.
#[derive(Clone, Copy, Debug, Default, Hash, Eq, PartialEq)]
pub enum Naming {
    /// Labels with `_1`, `_2`, ... suffixes on collision.
    #[default]
    Strict,
    /// Opaque `item_<n>` tokens.
    Random,
}

/// Optional WGSL language extensions.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub enum Extension {
    F16,
}

impl fmt::Display for Extension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::F16 => f.write_str("f16"),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResolveOptions {
    pub naming: Naming,
    /// Extensions the target supports. `enable` lines are only emitted for
    /// the ones the resolved code actually uses.
    pub extensions: BTreeSet<Extension>,
}

impl ResolveOptions {
    pub fn naming(mut self, naming: Naming) -> Self {
        self.naming = naming;
        self
    }

    pub fn enable(mut self, extension: Extension) -> Self {
        self.extensions.insert(extension);
        self
    }
}

/// Named externals to resolve, optionally spliced into a WGSL template.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResolveRequest {
    pub template: Option<String>,
    pub externals: Vec<(String, Value)>,
}

impl ResolveRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn template(mut self, text: impl Into<String>) -> Self {
        self.template = Some(text.into());
        self
    }

    pub fn external(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.externals.push((name.into(), value.into()));
        self
    }
}

/// A buffer binding the graphics layer must provide.
#[derive(Clone, Debug, PartialEq)]
pub struct BindingInfo {
    pub name: String,
    pub group: u32,
    pub binding: u32,
    pub usage: Usage,
    pub schema: Schema,
    /// `None` for runtime-sized data.
    pub size: Option<u64>,
}

/// Host layout of a declared (aligned) struct.
#[derive(Clone, Debug, PartialEq)]
pub struct StructLayoutInfo {
    pub name: String,
    pub size: Option<u64>,
    pub alignment: u64,
    pub fields: Vec<FieldLayout>,
}

/// The output of one resolution.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedModule {
    pub code: String,
    pub bindings: Vec<BindingInfo>,
    pub structs: Vec<StructLayoutInfo>,
}

/// Resolves the externals of `request` and returns the WGSL document.
///
/// With a template, identifiers in it that name an external are replaced by
/// the external's resolved text and the template ends the document. Without
/// one, every external is resolved for its declarations.
pub fn resolve(
    registry: &Registry,
    request: &ResolveRequest,
    options: &ResolveOptions,
) -> Result<ResolvedModule, ResolveError> {
    let mut ctx = ResolutionCtx::new(registry, options);
    match &request.template {
        Some(text) => {
            let mut body = template::substitute(&mut ctx, text, &request.externals)?;
            if !body.ends_with('\n') {
                body.push('\n');
            }
            ctx.declare(body);
        }
        None => {
            for (_, value) in &request.externals {
                ctx.resolve_value(value)?;
            }
        }
    }
    Ok(ctx.finish())
}

/// Resolves explicit entry items, in order.
pub fn resolve_items(
    registry: &Registry,
    items: &[Item],
    options: &ResolveOptions,
) -> Result<ResolvedModule, ResolveError> {
    let mut ctx = ResolutionCtx::new(registry, options);
    for item in items {
        ctx.resolve_item(item)?;
    }
    Ok(ctx.finish())
}

#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
enum ItemKey {
    Function(Handle<Function>),
    Derived(Handle<Derived>),
    Constant(Handle<Constant>),
    Variable(Handle<Variable>),
    Buffer(Handle<Buffer>),
}

type Bindings = Vec<(Handle<Slot>, Value)>;

/// A memoized result and the slot values it was computed under.
#[derive(Debug)]
struct MemoEntry {
    reads: Bindings,
    result: Value,
}

/// Slot reads of one in-progress computation. Reads answered by a binding
/// frame at or above `base` were pushed by the computation itself and are
/// not part of its key.
#[derive(Debug)]
struct Tracker {
    key: ItemKey,
    base: usize,
    reads: Bindings,
}

pub struct ResolutionCtx<'r> {
    registry: &'r Registry,
    options: ResolveOptions,
    names: Box<dyn NameRegistry>,
    declarations: Vec<String>,
    frames: Vec<Bindings>,
    trackers: Vec<Tracker>,
    memo: HashMap<ItemKey, Vec<MemoEntry>>,
    schema_names: HashMap<Schema, String>,
    extensions: BTreeSet<Extension>,
    bindings: Vec<BindingInfo>,
    used_bindings: HashSet<(u32, u32)>,
    /// Explicit `(group, binding)` pairs of every registered buffer; never
    /// handed out automatically.
    reserved_bindings: HashSet<(u32, u32)>,
    structs: Vec<StructLayoutInfo>,
}

impl<'r> ResolutionCtx<'r> {
    pub fn new(registry: &'r Registry, options: &ResolveOptions) -> Self {
        let names: Box<dyn NameRegistry> = match options.naming {
            Naming::Strict => Box::new(StrictNameRegistry::default()),
            Naming::Random => Box::new(RandomNameRegistry::default()),
        };
        let reserved_bindings = registry
            .buffers
            .iter()
            .filter_map(|(_, buffer)| Some((buffer.group.unwrap_or(0), buffer.binding?)))
            .collect();
        Self {
            registry,
            options: options.clone(),
            names,
            declarations: Vec::new(),
            frames: Vec::new(),
            trackers: Vec::new(),
            memo: HashMap::new(),
            schema_names: HashMap::new(),
            extensions: BTreeSet::new(),
            bindings: Vec::new(),
            used_bindings: HashSet::new(),
            reserved_bindings,
            structs: Vec::new(),
        }
    }

    pub fn registry(&self) -> &'r Registry {
        self.registry
    }

    /// Runs `f` with `bindings` pushed as the innermost frame.
    pub fn with_bindings<T>(
        &mut self,
        bindings: &[(Handle<Slot>, Value)],
        f: impl FnOnce(&mut Self) -> Result<T, ResolveError>,
    ) -> Result<T, ResolveError> {
        self.frames.push(bindings.to_vec());
        let result = f(self);
        self.frames.pop();
        result
    }

    /// Innermost binding for `slot` and the frame it came from; `None` as
    /// the frame means the slot's default.
    fn lookup_slot(&self, slot: Handle<Slot>) -> Option<(Option<usize>, Value)> {
        for (depth, frame) in self.frames.iter().enumerate().rev() {
            if let Some((_, value)) = frame.iter().rev().find(|(s, _)| *s == slot) {
                return Some((Some(depth), value.clone()));
            }
        }
        self.registry.slots[slot]
            .default
            .clone()
            .map(|value| (None, value))
    }

    /// The current value of `slot`, recorded as a read by every enclosing
    /// computation that did not bind the slot itself.
    pub fn read_slot(&mut self, slot: Handle<Slot>) -> Result<Value, ResolveError> {
        let (depth, value) = self.lookup_slot(slot).ok_or_else(|| {
            ResolveError::MissingSlotValue(self.registry.slots[slot].name().to_string())
        })?;
        for tracker in &mut self.trackers {
            let external = depth.is_none_or(|d| d < tracker.base);
            if external && !tracker.reads.iter().any(|(s, _)| *s == slot) {
                tracker.reads.push((slot, value.clone()));
            }
        }
        Ok(value)
    }

    fn label(&self, key: ItemKey) -> String {
        let r = self.registry;
        let label = match key {
            ItemKey::Function(h) => r.functions[h].label.as_deref(),
            ItemKey::Derived(h) => r.derived[h].label.as_deref(),
            ItemKey::Constant(h) => r.constants[h].label.as_deref(),
            ItemKey::Variable(h) => r.variables[h].label.as_deref(),
            ItemKey::Buffer(h) => r.buffers[h].label.as_deref(),
        };
        label.unwrap_or(DEFAULT_NAME).to_string()
    }

    /// Returns `true` if every slot in `reads` currently has the recorded value.
    fn still_bound(&self, reads: &Bindings) -> bool {
        reads.iter().all(|(slot, expected)| {
            self.lookup_slot(*slot)
                .is_some_and(|(_, current)| current == *expected)
        })
    }

    /// Returns the memoized result for `key` under the current bindings, or
    /// computes and records it.
    fn memoized(
        &mut self,
        key: ItemKey,
        compute: impl FnOnce(&mut Self) -> Result<Value, ResolveError>,
    ) -> Result<Value, ResolveError> {
        let hit = self
            .memo
            .get(&key)
            .and_then(|entries| entries.iter().find(|entry| self.still_bound(&entry.reads)));
        if let Some(entry) = hit {
            trace!("memo hit for {key:?}");
            let result = entry.result.clone();
            let slots: Vec<_> = entry.reads.iter().map(|(slot, _)| *slot).collect();
            // The hit depends on the same slots; enclosing computations must see them.
            for slot in slots {
                self.read_slot(slot)?;
            }
            return Ok(result);
        }

        // Re-entry under different values for the slots read so far is a
        // separate instantiation; under the same values it never terminates.
        let reentered = self
            .trackers
            .iter()
            .any(|tracker| tracker.key == key && self.still_bound(&tracker.reads));
        if reentered {
            return Err(ResolveError::Cycle(self.label(key)));
        }
        self.trackers.push(Tracker {
            key,
            base: self.frames.len(),
            reads: Vec::new(),
        });
        let result = compute(self);
        let tracker = self.trackers.pop();
        let result = result?;

        let reads = tracker.map(|t| t.reads).unwrap_or_default();
        for (slot, _) in &reads {
            self.read_slot(*slot)?;
        }
        self.memo.entry(key).or_default().push(MemoEntry {
            reads,
            result: result.clone(),
        });
        Ok(result)
    }

    /// Evaluates a derived value, at most once per distinct set of slot
    /// values it reads.
    pub fn compute_derived(&mut self, handle: Handle<Derived>) -> Result<Value, ResolveError> {
        let registry = self.registry;
        let derived = &registry.derived[handle];
        self.memoized(ItemKey::Derived(handle), |ctx| {
            debug!("computing derived '{}'", derived.name());
            derived.compute(&mut DerivedScope { ctx })
        })
    }

    /// Looks through slots and derived values until a plain value remains.
    pub fn unwrap_value(&mut self, value: &Value) -> Result<Value, ResolveError> {
        let mut current = value.clone();
        loop {
            current = match &current {
                Value::Item(Item::Slot(slot)) => self.read_slot(*slot)?,
                Value::Item(Item::Derived(derived)) => self.compute_derived(*derived)?,
                _ => return Ok(current),
            };
        }
    }

    pub(crate) fn declare(&mut self, text: String) {
        self.declarations.push(text);
    }

    pub(crate) fn require(&mut self, extension: Extension) -> Result<(), ResolveError> {
        if !self.options.extensions.contains(&extension) {
            return Err(ResolveError::ExtensionNotEnabled(extension));
        }
        self.extensions.insert(extension);
        Ok(())
    }

    fn check_scalar(&mut self, scalar: Scalar) -> Result<(), ResolveError> {
        if scalar == Scalar::F16 {
            self.require(Extension::F16)?;
        }
        if scalar == Scalar::U16 {
            return Err(GenerationError::HostOnlyType(scalar.to_string()).into());
        }
        Ok(())
    }

    /// Gives an abstract snippet the concrete type `target`, if `target` is
    /// a scalar. Other snippets are returned unchanged.
    pub(crate) fn concretize(
        &mut self,
        snippet: Snippet,
        target: &Schema,
    ) -> Result<Snippet, ResolveError> {
        if !snippet.ty.is_abstract() {
            return Ok(snippet);
        }
        let Schema::Scalar(scalar) = target.data() else {
            return Ok(snippet);
        };
        self.check_scalar(scalar)?;

        let code = if literal::is_literal(&snippet.code) {
            literal::concretize(&snippet.code, &snippet.ty, scalar)?
        } else {
            let float_to_int = snippet.ty == SnippetType::AbstractFloat && !scalar.is_float();
            if float_to_int || scalar == Scalar::BOOL {
                return Err(GenerationError::TypeMismatch {
                    expected: scalar.to_string(),
                    found: snippet.ty.to_string(),
                }
                .into());
            }
            format!("{scalar}({})", snippet.code)
        };
        Ok(Snippet::typed(code, &Schema::Scalar(scalar)))
    }

    /// The WGSL spelling of `schema`, declaring structs on first use.
    pub fn resolve_schema(&mut self, schema: &Schema) -> Result<String, ResolveError> {
        match schema {
            Schema::Scalar(s) | Schema::Vector { scalar: s, .. } => {
                self.check_scalar(*s)?;
                Ok(schema.to_string())
            }
            Schema::Matrix { .. } | Schema::Atomic(_) => Ok(schema.to_string()),
            Schema::Array(a) | Schema::LooseArray(a) => {
                let element = self.resolve_schema(a.element())?;
                Ok(if a.is_runtime_sized() {
                    format!("array<{element}>")
                } else {
                    format!("array<{element}, {}>", a.count())
                })
            }
            Schema::Struct(_) | Schema::LooseStruct(_) => self.declare_struct(schema),
            Schema::Decorated(d) => self.resolve_schema(d.inner()),
            Schema::Packed(p) => self.resolve_schema(&p.shader_schema()),
            Schema::Builtin(b) => self.resolve_schema(&b.value_schema()),
        }
    }

    fn declare_struct(&mut self, schema: &Schema) -> Result<String, ResolveError> {
        if let Some(name) = self.schema_names.get(schema) {
            return Ok(name.clone());
        }
        let Some(s) = schema.as_struct() else {
            return Err(GenerationError::NotRepresentable(schema.to_string()).into());
        };
        let loose = schema.is_loose();

        let mut members = String::new();
        for field in s.fields() {
            let ty = self.resolve_schema(&field.schema)?;
            let attributes = generator::member_attributes(&field.schema, loose);
            members.push_str(&format!("  {attributes}{}: {ty},\n", field.name));
        }

        let name = self.names.make_unique(s.label());
        debug!("declaring struct {name}");
        self.declare(format!("struct {name} {{\n{members}}}\n"));
        if !loose {
            let layout = schema.layout();
            self.structs.push(StructLayoutInfo {
                name: name.clone(),
                size: layout.size,
                alignment: layout.alignment,
                fields: schema.field_layouts().unwrap_or_default(),
            });
        }
        self.schema_names.insert(schema.clone(), name.clone());
        Ok(name)
    }

    /// Resolves a host value to WGSL expression text.
    pub fn resolve_value(&mut self, value: &Value) -> Result<Snippet, ResolveError> {
        let finite = |f: f64, text: String| {
            if f.is_finite() {
                Ok(text)
            } else {
                Err(GenerationError::NonFiniteLiteral(f.to_string()))
            }
        };
        let snippet = match value {
            Value::Bool(b) => Snippet::typed(b.to_string(), &Schema::BOOL),
            Value::AbstractInt(n) => Snippet::new(n.to_string(), SnippetType::AbstractInt),
            Value::AbstractFloat(f) => {
                Snippet::new(finite(*f, format!("{f:?}"))?, SnippetType::AbstractFloat)
            }
            Value::I32(n) => Snippet::typed(literal::i32_literal(*n), &Schema::I32),
            Value::U32(n) => Snippet::typed(format!("{n}u"), &Schema::U32),
            Value::F32(f) => {
                Snippet::typed(finite(f64::from(*f), format!("{f}f"))?, &Schema::F32)
            }
            Value::F16(h) => {
                self.require(Extension::F16)?;
                Snippet::typed(finite(h.to_f64(), format!("{h}h"))?, &Schema::F16)
            }
            Value::Schema(schema) => Snippet::raw(self.resolve_schema(schema)?),
            Value::Item(item) => self.resolve_item(item)?,
            Value::Code(snippet) => snippet.clone(),
            Value::Array(values) => self.resolve_array(values)?,
            Value::Record(_) | Value::Helper(_) => {
                return Err(GenerationError::NotRepresentable(value.describe()).into());
            }
        };
        Ok(snippet)
    }

    fn resolve_array(&mut self, values: &[Value]) -> Result<Snippet, ResolveError> {
        let elements = values
            .iter()
            .map(|v| self.resolve_value(v))
            .collect::<Result<Vec<_>, _>>()?;
        let code = elements
            .iter()
            .map(|e| e.code.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        let element_type = elements.first().and_then(|e| e.ty.schema()).cloned();
        let uniform = elements.iter().all(|e| e.ty.schema() == element_type.as_ref());
        let ty = match element_type {
            Some(element) if uniform => Schema::array(element, values.len() as u32)
                .map(SnippetType::Concrete)
                .unwrap_or(SnippetType::Unknown),
            _ => SnippetType::Unknown,
        };
        Ok(Snippet::new(format!("array({code})"), ty))
    }

    /// Resolves an item to the expression that refers to it, declaring it
    /// (and everything it depends on) on first use.
    pub fn resolve_item(&mut self, item: &Item) -> Result<Snippet, ResolveError> {
        match item {
            Item::Function(h) => self.resolve_function(*h),
            Item::Slot(h) => {
                let value = self.read_slot(*h)?;
                let snippet = self.resolve_value(&value)?;
                match &self.registry.slots[*h].schema {
                    Some(schema) => self.concretize(snippet, schema),
                    None => Ok(snippet),
                }
            }
            Item::Derived(h) => {
                let value = self.compute_derived(*h)?;
                self.resolve_value(&value)
            }
            Item::Constant(h) => self.resolve_constant(*h),
            Item::Variable(h) => self.resolve_variable(*h),
            Item::Buffer(h) => self.resolve_buffer(*h),
            Item::Bound(bound) => {
                self.with_bindings(&bound.bindings, |ctx| ctx.resolve_item(&bound.item))
            }
        }
    }

    fn resolve_function(&mut self, handle: Handle<Function>) -> Result<Snippet, ResolveError> {
        let registry = self.registry;
        let function = &registry.functions[handle];
        let value = self.memoized(ItemKey::Function(handle), |ctx| {
            let name = ctx.names.make_unique(function.label.as_deref());
            let text = match &function.body {
                FunctionBody::Wgsl(text) => {
                    let body = template::substitute(ctx, text, &function.externals)?;
                    let attributes = generator::stage_attributes(function.stage);
                    format!("{attributes}fn {name}{}\n", body.trim_end())
                }
                FunctionBody::Ir(ir) => {
                    Generator::new(ctx, &function.externals).function(&name, function, ir)?
                }
            };
            debug!("declaring fn {name}");
            ctx.declare(text);
            Ok(Value::Code(Snippet::raw(name)))
        })?;
        self.resolve_value(&value)
    }

    fn resolve_constant(&mut self, handle: Handle<Constant>) -> Result<Snippet, ResolveError> {
        let registry = self.registry;
        let constant = &registry.constants[handle];
        let value = self.memoized(ItemKey::Constant(handle), |ctx| {
            let ty = ctx.resolve_schema(&constant.schema)?;
            let init = ctx.resolve_value(&constant.value)?;
            let init = ctx.concretize(init, &constant.schema)?;
            let name = ctx.names.make_unique(constant.label.as_deref());
            debug!("declaring const {name}");
            ctx.declare(format!("const {name}: {ty} = {};\n", init.code));
            Ok(Value::Code(Snippet::typed(name, &constant.schema)))
        })?;
        self.resolve_value(&value)
    }

    fn resolve_variable(&mut self, handle: Handle<Variable>) -> Result<Snippet, ResolveError> {
        let registry = self.registry;
        let variable = &registry.variables[handle];
        let value = self.memoized(ItemKey::Variable(handle), |ctx| {
            let label = variable.label.as_deref();
            let ty = ctx.resolve_schema(&variable.schema)?;
            let init = match (&variable.init, variable.space) {
                (None, _) => String::new(),
                (Some(value), AddressSpace::Private) => {
                    let init = ctx.resolve_value(value)?;
                    let init = ctx.concretize(init, &variable.schema)?;
                    format!(" = {}", init.code)
                }
                (Some(_), AddressSpace::Workgroup) => {
                    let label = label.unwrap_or(DEFAULT_NAME).to_string();
                    return Err(GenerationError::InvalidInitializer(label).into());
                }
            };
            let space = match variable.space {
                AddressSpace::Private => "private",
                AddressSpace::Workgroup => "workgroup",
            };
            let name = ctx.names.make_unique(label);
            debug!("declaring var<{space}> {name}");
            ctx.declare(format!("var<{space}> {name}: {ty}{init};\n"));
            Ok(Value::Code(Snippet::typed(name, &variable.schema)))
        })?;
        self.resolve_value(&value)
    }

    fn resolve_buffer(&mut self, handle: Handle<Buffer>) -> Result<Snippet, ResolveError> {
        let registry = self.registry;
        let buffer = &registry.buffers[handle];
        let value = self.memoized(ItemKey::Buffer(handle), |ctx| {
            let label = buffer.label.as_deref().unwrap_or(DEFAULT_NAME);
            if buffer.usage == Usage::Uniform && buffer.schema.is_runtime_sized() {
                return Err(ResolveError::RuntimeSizedUniform(label.to_string()));
            }
            if buffer.schema.is_loose() {
                return Err(GenerationError::HostOnlyType(buffer.schema.to_string()).into());
            }
            let read_write = buffer.usage == Usage::Storage(Access::ReadWrite);
            if buffer.schema.contains_atomic() && !read_write {
                return Err(ResolveError::AtomicOutsideReadWrite(label.to_string()));
            }
            let ty = ctx.resolve_schema(&buffer.schema)?;
            let (group, binding) = ctx.assign_binding(buffer, label)?;
            let name = ctx.names.make_unique(buffer.label.as_deref());
            debug!("declaring binding {name} at @group({group}) @binding({binding})");
            ctx.declare(format!(
                "@group({group}) @binding({binding}) var<{}> {name}: {ty};\n",
                buffer.usage.address_space()
            ));
            ctx.bindings.push(BindingInfo {
                name: name.clone(),
                group,
                binding,
                usage: buffer.usage,
                schema: buffer.schema.clone(),
                size: buffer.schema.size(),
            });
            Ok(Value::Code(Snippet::typed(name, &buffer.schema)))
        })?;
        self.resolve_value(&value)
    }

    fn assign_binding(&mut self, buffer: &Buffer, label: &str) -> Result<(u32, u32), ResolveError> {
        let group = buffer.group.unwrap_or(0);
        let binding = match buffer.binding {
            Some(binding) => binding,
            None => {
                let taken = |b: &u32| {
                    self.used_bindings.contains(&(group, *b))
                        || self.reserved_bindings.contains(&(group, *b))
                };
                let free = (0..).find(|b| !taken(b)).unwrap_or(0);
                warn!("'{label}' has no explicit binding; using @group({group}) @binding({free})");
                free
            }
        };
        if !self.used_bindings.insert((group, binding)) {
            return Err(ResolveError::BindingConflict { group, binding });
        }
        Ok((group, binding))
    }

    /// Assembles the document: `enable` lines, then declarations in order.
    pub fn finish(self) -> ResolvedModule {
        let mut code = String::new();
        for extension in &self.extensions {
            code.push_str(&format!("enable {extension};\n"));
        }
        if !self.extensions.is_empty() && !self.declarations.is_empty() {
            code.push('\n');
        }
        code.push_str(&self.declarations.join("\n"));
        ResolvedModule {
            code,
            bindings: self.bindings,
            structs: self.structs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn int(n: i64) -> Value {
        Value::AbstractInt(n)
    }

    #[test]
    fn slot_reads_innermost_then_default() {
        let mut registry = Registry::new();
        let with_default = registry.slot("a", Some(int(1)));
        let without = registry.slot("b", None);
        let options = ResolveOptions::default();
        let mut ctx = ResolutionCtx::new(&registry, &options);

        assert_eq!(ctx.read_slot(with_default).unwrap(), int(1));
        let inner = ctx
            .with_bindings(&[(with_default, int(2))], |ctx| {
                ctx.with_bindings(&[(with_default, int(3))], |ctx| ctx.read_slot(with_default))
            })
            .unwrap();
        assert_eq!(inner, int(3));
        assert_eq!(
            ctx.read_slot(without),
            Err(ResolveError::MissingSlotValue("b".into()))
        );
    }

    #[test]
    fn frames_pop_on_error() {
        let mut registry = Registry::new();
        let slot = registry.slot("a", None);
        let missing = registry.slot("missing", None);
        let options = ResolveOptions::default();
        let mut ctx = ResolutionCtx::new(&registry, &options);
        let result = ctx.with_bindings(&[(slot, int(1))], |ctx| ctx.read_slot(missing));
        assert!(result.is_err());
        assert!(ctx.read_slot(slot).is_err());
    }

    #[test]
    fn derived_computes_once_per_read_set() {
        let mut registry = Registry::new();
        let n = registry.slot("n", Some(int(1)));
        let unrelated = registry.slot("unrelated", Some(int(0)));
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = runs.clone();
        let double = registry.derived("double", move |scope| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(int(scope.read_int(n)? * 2))
        });
        let options = ResolveOptions::default();
        let mut ctx = ResolutionCtx::new(&registry, &options);

        assert_eq!(ctx.compute_derived(double).unwrap(), int(2));
        assert_eq!(ctx.compute_derived(double).unwrap(), int(2));
        // Bindings of slots it never reads do not matter.
        let shadowed = ctx
            .with_bindings(&[(unrelated, int(7))], |ctx| ctx.compute_derived(double))
            .unwrap();
        assert_eq!(shadowed, int(2));
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        let rebound = ctx
            .with_bindings(&[(n, int(5))], |ctx| ctx.compute_derived(double))
            .unwrap();
        assert_eq!(rebound, int(10));
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn reads_propagate_through_nested_derived_values() {
        let mut registry = Registry::new();
        let n = registry.slot("n", Some(int(1)));
        let inner_runs = Arc::new(AtomicUsize::new(0));
        let counter = inner_runs.clone();
        let inner = registry.derived("inner", move |scope| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(int(scope.read_int(n)? + 1))
        });
        let outer = registry.derived("outer", move |scope| {
            let v = scope.derived(inner)?;
            scope.unwrap(&v)
        });
        let options = ResolveOptions::default();
        let mut ctx = ResolutionCtx::new(&registry, &options);

        assert_eq!(ctx.compute_derived(outer).unwrap(), int(2));
        let rebound = ctx
            .with_bindings(&[(n, int(10))], |ctx| ctx.compute_derived(outer))
            .unwrap();
        assert_eq!(rebound, int(11));
        assert_eq!(inner_runs.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn inner_bindings_do_not_leak_into_keys() {
        let mut registry = Registry::new();
        let n = registry.slot("n", None);
        let reads_n = registry.derived("reads_n", move |scope| scope.read(n));
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = runs.clone();
        let binds_n = registry.derived("binds_n", move |scope| {
            counter.fetch_add(1, Ordering::SeqCst);
            scope.ctx.with_bindings(&[(n, int(3))], |ctx| ctx.compute_derived(reads_n))
        });
        let options = ResolveOptions::default();
        let mut ctx = ResolutionCtx::new(&registry, &options);

        let a = ctx
            .with_bindings(&[(n, int(1))], |ctx| ctx.compute_derived(binds_n))
            .unwrap();
        let b = ctx
            .with_bindings(&[(n, int(2))], |ctx| ctx.compute_derived(binds_n))
            .unwrap();
        assert_eq!(a, int(3));
        assert_eq!(b, int(3));
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn self_reference_is_a_cycle() {
        let mut registry = Registry::new();
        let slot = registry.slot("target", None);
        let looping = registry.derived("looping", move |scope| {
            let v = scope.read(slot)?;
            scope.unwrap(&v)
        });
        let options = ResolveOptions::default();
        let mut ctx = ResolutionCtx::new(&registry, &options);
        let result = ctx.with_bindings(&[(slot, Value::from(looping))], |ctx| {
            ctx.compute_derived(looping)
        });
        assert_eq!(result, Err(ResolveError::Cycle("looping".into())));
    }

    #[test]
    fn concretize_only_touches_abstract_snippets() {
        let registry = Registry::new();
        let options = ResolveOptions::default().enable(Extension::F16);
        let mut ctx = ResolutionCtx::new(&registry, &options);

        let lit = Snippet::new("2", SnippetType::AbstractInt);
        assert_eq!(ctx.concretize(lit.clone(), &Schema::F16).unwrap().code, "2h");
        assert_eq!(ctx.concretize(lit.clone(), &Schema::VEC3F).unwrap(), lit);
        let expr = Snippet::new("(1 + 2)", SnippetType::AbstractInt);
        assert_eq!(ctx.concretize(expr, &Schema::U32).unwrap().code, "u32((1 + 2))");
        let concrete = Snippet::typed("x", &Schema::F32);
        assert_eq!(ctx.concretize(concrete.clone(), &Schema::U32).unwrap(), concrete);
    }

    #[test]
    fn f16_requires_the_extension() {
        let registry = Registry::new();
        let options = ResolveOptions::default();
        let mut ctx = ResolutionCtx::new(&registry, &options);
        assert_eq!(
            ctx.resolve_schema(&Schema::VEC2H),
            Err(ResolveError::ExtensionNotEnabled(Extension::F16))
        );
        assert!(matches!(
            ctx.resolve_schema(&Schema::U16),
            Err(ResolveError::Generation(GenerationError::HostOnlyType(_)))
        ));
    }

    #[test]
    fn struct_declared_once_before_use() {
        let inner = Schema::structure("Inner", [("v", Schema::VEC3F)]).unwrap();
        let outer = Schema::structure(
            "Outer",
            [("a", inner.clone()), ("b", inner.clone()), ("c", Schema::U32)],
        )
        .unwrap();
        let registry = Registry::new();
        let request = ResolveRequest::new()
            .external("Outer", outer)
            .external("Inner", inner);
        let module = resolve(&registry, &request, &ResolveOptions::default()).unwrap();
        let expected = "\
struct Inner {
  v: vec3f,
}

struct Outer {
  a: Inner,
  b: Inner,
  c: u32,
}
";
        assert_eq!(module.code, expected);
        assert_eq!(module.structs.len(), 2);
        assert_eq!(module.structs[1].size, Some(48));
    }

    #[test]
    fn buffers_get_bindings_and_metadata() {
        let particles = Schema::structure(
            "Particles",
            [
                ("count", Schema::U32),
                ("items", Schema::runtime_array(Schema::VEC4F).unwrap()),
            ],
        )
        .unwrap();
        let mut registry = Registry::new();
        let params = registry.buffer(Buffer::new("params", Schema::VEC4F, Usage::Uniform).at(0, 0));
        let data = registry.buffer(Buffer::new(
            "data",
            particles.clone(),
            Usage::Storage(Access::ReadWrite),
        ));
        let module = resolve_items(
            &registry,
            &[params.into(), data.into(), params.into()],
            &ResolveOptions::default(),
        )
        .unwrap();
        assert!(
            module
                .code
                .contains("@group(0) @binding(0) var<uniform> params: vec4f;")
        );
        assert!(
            module
                .code
                .contains("@group(0) @binding(1) var<storage, read_write> data: Particles;")
        );
        assert_eq!(module.bindings.len(), 2);
        assert_eq!(module.bindings[1].size, None);
    }

    #[test]
    fn runtime_sized_uniform_is_rejected() {
        let mut registry = Registry::new();
        let bad = registry.buffer(Buffer::new(
            "bad",
            Schema::runtime_array(Schema::F32).unwrap(),
            Usage::Uniform,
        ));
        assert_eq!(
            resolve_items(&registry, &[bad.into()], &ResolveOptions::default()),
            Err(ResolveError::RuntimeSizedUniform("bad".into()))
        );
    }

    #[test]
    fn explicit_binding_conflicts_are_rejected() {
        let mut registry = Registry::new();
        let a = registry.buffer(Buffer::new("a", Schema::F32, Usage::Uniform).at(1, 2));
        let b = registry.buffer(Buffer::new("b", Schema::U32, Usage::Uniform).at(1, 2));
        assert_eq!(
            resolve_items(&registry, &[a.into(), b.into()], &ResolveOptions::default()),
            Err(ResolveError::BindingConflict {
                group: 1,
                binding: 2
            })
        );
    }

    #[test]
    fn automatic_bindings_skip_explicit_ones_resolved_later() {
        let mut registry = Registry::new();
        let lights = registry.buffer(Buffer::new("lights", Schema::F32, Usage::Uniform));
        let fixed = registry.buffer(Buffer::new("fixed", Schema::U32, Usage::Uniform).at(0, 0));
        let module = resolve_items(
            &registry,
            &[lights.into(), fixed.into()],
            &ResolveOptions::default(),
        )
        .unwrap();
        let placed: Vec<_> = module
            .bindings
            .iter()
            .map(|b| (b.name.as_str(), b.group, b.binding))
            .collect();
        assert_eq!(placed, [("lights", 0, 1), ("fixed", 0, 0)]);
    }

    #[test]
    fn atomics_need_read_write_storage() {
        let counters = Schema::structure(
            "Counters",
            [("hits", Schema::atomic(Scalar::U32).unwrap())],
        )
        .unwrap();
        let mut registry = Registry::new();
        let uniform = registry.buffer(Buffer::new("hits", counters.clone(), Usage::Uniform));
        let storage = registry.buffer(Buffer::new(
            "counters",
            counters,
            Usage::Storage(Access::ReadWrite),
        ));
        assert_eq!(
            resolve_items(&registry, &[uniform.into()], &ResolveOptions::default()),
            Err(ResolveError::AtomicOutsideReadWrite("hits".into()))
        );
        let module =
            resolve_items(&registry, &[storage.into()], &ResolveOptions::default()).unwrap();
        assert!(module.code.contains("hits: atomic<u32>,"));
    }

    #[test]
    fn constants_and_variables() {
        let mut registry = Registry::new();
        let limit = registry.constant("LIMIT", Schema::U32, int(64));
        let counter = registry.variable(Variable {
            label: Some("counter".into()),
            space: AddressSpace::Private,
            schema: Schema::F32,
            init: Some(int(1)),
        });
        let tile = registry.variable(Variable {
            label: Some("tile".into()),
            space: AddressSpace::Workgroup,
            schema: Schema::array(Schema::F32, 64).unwrap(),
            init: None,
        });
        let module = resolve_items(
            &registry,
            &[limit.into(), counter.into(), tile.into()],
            &ResolveOptions::default(),
        )
        .unwrap();
        assert_eq!(
            module.code,
            "const LIMIT: u32 = 64u;\n\nvar<private> counter: f32 = 1f;\n\nvar<workgroup> tile: array<f32, 64>;\n"
        );
    }

    #[test]
    fn enable_lines_only_when_used() {
        let registry = Registry::new();
        let options = ResolveOptions::default().enable(Extension::F16);
        let a = Schema::structure("A", [("a", Schema::F32)]).unwrap();
        let plain = ResolveRequest::new().external("x", a);
        let module = resolve(&registry, &plain, &options).unwrap();
        assert!(!module.code.contains("enable"));

        let b = Schema::structure("B", [("b", Schema::F16)]).unwrap();
        let half = ResolveRequest::new().external("x", b);
        let module = resolve(&registry, &half, &options).unwrap();
        assert!(module.code.starts_with("enable f16;\n\nstruct B {"));
    }
}
