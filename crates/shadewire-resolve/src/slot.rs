//! Slots, derived values and the scope derived computations run in.

use std::fmt;
use std::sync::Arc;

use shadewire_schema::Schema;

use crate::arena::Handle;
use crate::context::ResolutionCtx;
use crate::error::ResolveError;
use crate::item::Value;

/// A placeholder for dependency injection, shadowed by `.with` bindings.
#[derive(Clone, Debug, PartialEq)]
pub struct Slot {
    pub label: Option<String>,
    pub default: Option<Value>,
    /// When set, abstract values read through the slot are emitted as this type.
    pub schema: Option<Schema>,
}

impl Slot {
    pub fn name(&self) -> &str {
        self.label.as_deref().unwrap_or("<unnamed>")
    }
}

type Compute = dyn Fn(&mut DerivedScope<'_, '_>) -> Result<Value, ResolveError> + Send + Sync;

/// A pure computation over slot reads, memoized per set of values read.
#[derive(Clone)]
pub struct Derived {
    pub label: Option<String>,
    compute: Arc<Compute>,
}

impl Derived {
    pub fn new<F>(label: impl Into<String>, compute: F) -> Self
    where
        F: Fn(&mut DerivedScope<'_, '_>) -> Result<Value, ResolveError> + Send + Sync + 'static,
    {
        Self {
            label: Some(label.into()),
            compute: Arc::new(compute),
        }
    }

    pub fn name(&self) -> &str {
        self.label.as_deref().unwrap_or("<unnamed>")
    }

    pub(crate) fn compute(&self, scope: &mut DerivedScope<'_, '_>) -> Result<Value, ResolveError> {
        (self.compute)(scope)
    }
}

impl fmt::Debug for Derived {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Derived").field("label", &self.label).finish()
    }
}

/// The view of a resolution a derived computation is allowed to see.
///
/// Every read goes through the context, so the slots a computation touches
/// are tracked and become part of its memo key.
pub struct DerivedScope<'a, 'r> {
    pub(crate) ctx: &'a mut ResolutionCtx<'r>,
}

impl DerivedScope<'_, '_> {
    /// The current value of `slot`: innermost binding, then its default.
    pub fn read(&mut self, slot: Handle<Slot>) -> Result<Value, ResolveError> {
        self.ctx.read_slot(slot)
    }

    /// The value of another derived value under the current bindings.
    pub fn derived(&mut self, derived: Handle<Derived>) -> Result<Value, ResolveError> {
        self.ctx.compute_derived(derived)
    }

    /// Looks through slot and derived indirections until a plain value remains.
    pub fn unwrap(&mut self, value: &Value) -> Result<Value, ResolveError> {
        self.ctx.unwrap_value(value)
    }

    /// Reads a slot holding an integer, unwrapping indirections.
    pub fn read_int(&mut self, slot: Handle<Slot>) -> Result<i64, ResolveError> {
        let value = self.read(slot)?;
        match self.unwrap(&value)? {
            Value::AbstractInt(n) => Ok(n),
            Value::I32(n) => Ok(n.into()),
            Value::U32(n) => Ok(n.into()),
            other => Err(ResolveError::Helper {
                label: self.ctx.registry().slots[slot].name().to_string(),
                message: format!("expected an integer, found {}", other.describe()),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_hides_closure() {
        let d = Derived::new("double", |_| Ok(Value::AbstractInt(0)));
        assert_eq!(format!("{d:?}"), "Derived { label: Some(\"double\") }");
        assert_eq!(d.name(), "double");
    }
}
