use shadewire_resolve::{Item, Registry, ResolveOptions, ResolvedModule, resolve_items};

/// Resolve `items` and validate the generated WGSL with naga.
#[allow(dead_code)]
pub fn resolve_valid(registry: &Registry, items: &[Item], options: &ResolveOptions) -> ResolvedModule {
    let module = resolve_items(registry, items, options).expect("resolution failed");
    assert_valid(&module.code);
    module
}

/// Panics with the generated text when naga rejects it.
#[allow(dead_code)]
pub fn assert_valid(code: &str) {
    if let Err(e) = shadewire_parser::validate(code) {
        panic!("generated WGSL failed validation: {e}\n---\n{code}---");
    }
}

/// Every struct the resolver declared must have the layout naga computes
/// for the emitted declaration.
#[allow(dead_code)]
pub fn assert_layouts_match(module: &ResolvedModule) {
    let naga = shadewire_parser::struct_layouts(&module.code).expect("naga layout failed");
    assert!(!module.structs.is_empty(), "no structs declared");
    for ours in &module.structs {
        let theirs = naga
            .iter()
            .find(|l| l.name == ours.name)
            .unwrap_or_else(|| panic!("naga has no struct {}", ours.name));
        assert_eq!(ours.alignment, u64::from(theirs.alignment), "alignment of {}", ours.name);
        if let Some(size) = ours.size {
            assert_eq!(size, u64::from(theirs.size), "size of {}", ours.name);
        }
        let offsets: Vec<(String, u64)> = ours
            .fields
            .iter()
            .map(|f| (f.name.clone(), f.offset))
            .collect();
        let expected: Vec<(String, u64)> = theirs
            .members
            .iter()
            .map(|(name, offset)| (name.clone(), u64::from(*offset)))
            .collect();
        assert_eq!(offsets, expected, "offsets of {}", ours.name);
    }
}
