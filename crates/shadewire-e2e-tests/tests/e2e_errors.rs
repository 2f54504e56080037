mod common;

use shadewire_resolve::*;
use shadewire_schema::{Schema, SchemaError};

#[test]
fn invalid_wgsl_is_rejected() {
    assert!(shadewire_parser::validate("this is not valid WGSL @@@ {{{").is_err());
}

#[test]
fn non_trailing_runtime_array_fails_before_resolution() {
    let err = Schema::structure(
        "Bad",
        [
            ("items", Schema::runtime_array(Schema::F32).unwrap()),
            ("count", Schema::U32),
        ],
    )
    .unwrap_err();
    assert_eq!(
        err,
        SchemaError::RuntimeArrayNotLast {
            field: "items".into()
        }
    );
}

#[test]
fn unbound_slot_fails_the_whole_resolution() {
    let mut registry = Registry::new();
    let factor = registry.typed_slot("factor", Schema::F32, None);
    let f = registry.function(
        Function::wgsl("scaled", [Schema::F32], Some(Schema::F32), "(x: f32) -> f32 { return x * factor; }")
            .external("factor", factor),
    );
    assert_eq!(
        resolve_items(&registry, &[f.into()], &ResolveOptions::default()),
        Err(ResolveError::MissingSlotValue("factor".into()))
    );
}

#[test]
fn self_reference_through_a_slot_is_a_cycle() {
    let mut registry = Registry::new();
    let next = registry.slot("next", None);
    let ping = registry.function(
        Function::wgsl("ping", [], Some(Schema::F32), "() -> f32 { return next(); }")
            .external("next", next),
    );
    let item = Item::from(ping).with(next, ping);
    assert_eq!(
        resolve_items(&registry, &[item], &ResolveOptions::default()),
        Err(ResolveError::Cycle("ping".into()))
    );
}

#[test]
fn conflicting_bindings_are_reported() {
    let mut registry = Registry::new();
    let a = registry.buffer(Buffer::new("a", Schema::VEC4F, Usage::Uniform).at(0, 0));
    let b = registry.buffer(Buffer::new("b", Schema::VEC4F, Usage::Uniform).at(0, 0));
    let result = resolve_items(&registry, &[a.into(), b.into()], &ResolveOptions::default());
    assert_eq!(
        result,
        Err(ResolveError::BindingConflict {
            group: 0,
            binding: 0
        })
    );
}
