//! Integration tests: declaration dedup and slot-driven specialization.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use shadewire_resolve::*;
use shadewire_schema::Schema;

fn scaled(registry: &mut Registry) -> (Handle<Function>, Handle<Slot>) {
    let factor = registry.typed_slot("factor", Schema::F32, None);
    let f = registry.function(
        Function::wgsl(
            "scaled",
            [Schema::F32],
            Some(Schema::F32),
            "(x: f32) -> f32 { return x * factor; }",
        )
        .external("factor", factor),
    );
    (f, factor)
}

fn count(code: &str, needle: &str) -> usize {
    code.matches(needle).count()
}

#[test]
fn derived_value_shared_by_two_dependents_runs_once() {
    let runs = Arc::new(AtomicUsize::new(0));
    let mut registry = Registry::new();
    let n = registry.slot("n", Some(Value::AbstractInt(3)));
    let counter = Arc::clone(&runs);
    let double = registry.derived("double", move |scope| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(Value::AbstractInt(scope.read_int(n)? * 2))
    });
    let a = registry.derived("a", move |scope| match scope.derived(double)? {
        Value::AbstractInt(d) => Ok(Value::AbstractInt(d + 1)),
        other => Ok(other),
    });
    let b = registry.derived("b", move |scope| match scope.derived(double)? {
        Value::AbstractInt(d) => Ok(Value::AbstractInt(d + 2)),
        other => Ok(other),
    });

    let request = ResolveRequest::new()
        .template("const A = a;\nconst B = b;")
        .external("a", a)
        .external("b", b);
    let module = resolve(&registry, &request, &ResolveOptions::default()).unwrap();

    assert_eq!(module.code, "const A = 7;\nconst B = 8;\n");
    assert_eq!(runs.load(Ordering::SeqCst), 1);
}

#[test]
fn equal_bindings_collapse_and_distinct_bindings_specialize() {
    let mut registry = Registry::new();
    let (f, factor) = scaled(&mut registry);
    let item = Item::from(f);
    let items = [
        item.with(factor, Value::AbstractInt(2)),
        item.with(factor, Value::AbstractInt(2)),
        item.with(factor, Value::AbstractInt(4)),
    ];
    let module = resolve_items(&registry, &items, &ResolveOptions::default()).unwrap();

    assert_eq!(count(&module.code, "fn "), 2);
    assert!(module.code.contains("fn scaled(x: f32) -> f32 { return x * 2f; }"));
    assert!(module.code.contains("fn scaled_1(x: f32) -> f32 { return x * 4f; }"));
}

#[test]
fn call_sites_reference_their_specialization() {
    let mut registry = Registry::new();
    let (f, factor) = scaled(&mut registry);
    let item = Item::from(f);
    let main = registry.function(
        Function::wgsl(
            "main",
            [],
            Some(Schema::F32),
            "() -> f32 { return twice(1.0) + four_times(1.0); }",
        )
        .external("twice", item.with(factor, Value::F32(2.0)))
        .external("four_times", item.with(factor, Value::F32(4.0))),
    );
    let module = resolve_items(&registry, &[main.into()], &ResolveOptions::default()).unwrap();

    assert!(module.code.contains("return scaled(1.0) + scaled_1(1.0);"));
    let main_at = module.code.find("fn main").unwrap();
    assert!(module.code.find("fn scaled_1").unwrap() < main_at);
}

#[test]
fn inner_binding_does_not_specialize_the_caller() {
    let mut registry = Registry::new();
    let (f, factor) = scaled(&mut registry);
    let bound = Item::from(f).with(factor, Value::F32(2.0));
    let caller = registry.function(
        Function::wgsl("caller", [], Some(Schema::F32), "() -> f32 { return op(3.0); }")
            .external("op", bound),
    );
    let caller = Item::from(caller);
    let items = [
        caller.with(factor, Value::F32(5.0)),
        caller.with(factor, Value::F32(6.0)),
    ];
    let module = resolve_items(&registry, &items, &ResolveOptions::default()).unwrap();

    assert_eq!(count(&module.code, "fn caller"), 1);
    assert_eq!(count(&module.code, "fn scaled"), 1);
}

#[test]
fn resolution_is_idempotent_across_contexts() {
    let mut registry = Registry::new();
    let (f, factor) = scaled(&mut registry);
    let params = registry.buffer(Buffer::new(
        "params",
        Schema::structure("Params", [("scale", Schema::F32), ("offset", Schema::VEC3F)]).unwrap(),
        Usage::Uniform,
    ));
    let items = [Item::from(f).with(factor, Value::F32(1.5)), params.into()];

    for options in [
        ResolveOptions::default(),
        ResolveOptions::default().naming(Naming::Random),
    ] {
        let first = resolve_items(&registry, &items, &options).unwrap();
        let second = resolve_items(&registry, &items, &options).unwrap();
        assert_eq!(first.code, second.code);
        assert_eq!(first.bindings, second.bindings);
    }
}

#[test]
fn diamond_dependency_is_declared_once() {
    let mut registry = Registry::new();
    let base = registry.function(Function::wgsl(
        "base_value",
        [],
        Some(Schema::F32),
        "() -> f32 { return 1.0; }",
    ));
    let left = registry.function(
        Function::wgsl("left", [], Some(Schema::F32), "() -> f32 { return base(); }")
            .external("base", base),
    );
    let right = registry.function(
        Function::wgsl("right", [], Some(Schema::F32), "() -> f32 { return base() * 2.0; }")
            .external("base", base),
    );
    let top = registry.function(
        Function::wgsl("top", [], Some(Schema::F32), "() -> f32 { return l() + r(); }")
            .external("l", left)
            .external("r", right),
    );
    let module = resolve_items(&registry, &[top.into()], &ResolveOptions::default()).unwrap();

    assert_eq!(count(&module.code, "fn base_value"), 1);
    let position = |name: &str| module.code.find(&format!("fn {name}(")).unwrap();
    assert!(position("base_value") < position("left"));
    assert!(position("left") < position("right"));
    assert!(position("right") < position("top"));
    assert!(module.code.contains("return left() + right();"));
}

#[test]
fn unbound_slot_without_default_names_the_slot() {
    let mut registry = Registry::new();
    let (f, _) = scaled(&mut registry);
    let result = resolve_items(&registry, &[f.into()], &ResolveOptions::default());
    assert_eq!(result, Err(ResolveError::MissingSlotValue("factor".into())));
}

#[test]
fn random_naming_ignores_labels() {
    let mut registry = Registry::new();
    let (f, factor) = scaled(&mut registry);
    let options = ResolveOptions::default().naming(Naming::Random);
    let module = resolve_items(
        &registry,
        &[Item::from(f).with(factor, Value::F32(2.0))],
        &options,
    )
    .unwrap();
    assert!(module.code.starts_with("fn item_0(x: f32)"));
    assert!(!module.code.contains("scaled"));
}

fn wrapper(registry: &mut Registry) -> (Handle<Function>, Handle<Slot>) {
    let inner = registry.slot("inner", None);
    let wrap = registry.function(
        Function::wgsl("wrap", [], Some(Schema::F32), "() -> f32 { return inner() * 2.0; }")
            .external("inner", inner),
    );
    (wrap, inner)
}

#[test]
fn reaching_itself_under_new_bindings_is_a_separate_instantiation() {
    let mut registry = Registry::new();
    let (wrap, inner) = wrapper(&mut registry);
    let leaf = registry.function(Function::wgsl(
        "leaf",
        [],
        Some(Schema::F32),
        "() -> f32 { return 1.0; }",
    ));
    let nested = Item::from(wrap).with(inner, Item::from(wrap).with(inner, leaf));
    let module = resolve_items(&registry, &[nested], &ResolveOptions::default()).unwrap();

    assert_eq!(
        module.code,
        "fn leaf() -> f32 { return 1.0; }\n\n\
         fn wrap_1() -> f32 { return leaf() * 2.0; }\n\n\
         fn wrap() -> f32 { return wrap_1() * 2.0; }\n"
    );
}

#[test]
fn rebinding_an_unread_slot_does_not_break_a_cycle() {
    let mut registry = Registry::new();
    let (wrap, inner) = wrapper(&mut registry);
    let unrelated = registry.slot("unrelated", None);
    let again = Item::from(wrap).with(unrelated, Value::F32(1.0));
    let looping = Item::from(wrap).with(inner, again);
    assert_eq!(
        resolve_items(&registry, &[looping], &ResolveOptions::default()),
        Err(ResolveError::Cycle("wrap".into()))
    );
}
