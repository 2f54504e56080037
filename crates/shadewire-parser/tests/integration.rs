//! Integration tests for the naga-backed front-end.

use shadewire_parser::{ParseError, StructLayout, import_structs, parse, struct_layouts, validate};
use shadewire_schema::{Schema, align};

#[test]
fn validate_compute_shader() {
    let source = r#"
@group(0) @binding(0) var<storage, read_write> values: array<f32>;

@compute @workgroup_size(64)
fn main(@builtin(global_invocation_id) gid: vec3<u32>) {
    let i = gid.x;
    if (i < arrayLength(&values)) {
        values[i] = values[i] * 2f;
    }
}
"#;
    let module = validate(source).expect("shader should validate");
    assert_eq!(module.entry_points.len(), 1);
    assert_eq!(module.entry_points[0].workgroup_size, [64, 1, 1]);
    assert_eq!(module.global_variables.len(), 1);
}

#[test]
fn syntax_errors_are_reported() {
    let err = parse("fn main( {").unwrap_err();
    assert!(matches!(err, ParseError::Wgsl(_)));
}

#[test]
fn type_errors_fail_validation() {
    let source = "fn f() -> u32 { return 1.5f; }";
    assert!(validate(source).is_err());
}

#[test]
fn naga_agrees_on_padded_record() {
    let ours = Schema::structure("A", [("a", Schema::U32), ("b", Schema::VEC3U)]).unwrap();
    let [theirs] = struct_layouts("struct A { a: u32, b: vec3<u32> }")
        .unwrap()
        .try_into()
        .unwrap();

    assert_eq!(ours.size(), Some(u64::from(theirs.size)));
    assert_eq!(ours.alignment(), u64::from(theirs.alignment));
    let offsets: Vec<(String, u64)> = theirs
        .members
        .iter()
        .map(|(name, offset)| (name.clone(), u64::from(*offset)))
        .collect();
    assert_eq!(ours.field_offsets().unwrap(), offsets);
}

#[test]
fn naga_agrees_on_custom_alignment() {
    let ours = Schema::structure(
        "B",
        [
            ("x", Schema::U32),
            ("y", align(16, Schema::U32).unwrap()),
            ("z", Schema::U32),
        ],
    )
    .unwrap();
    let layouts = struct_layouts("struct B { x: u32, @align(16) y: u32, z: u32 }").unwrap();
    assert_eq!(
        layouts,
        [StructLayout {
            name: "B".into(),
            size: 32,
            alignment: 16,
            members: vec![("x".into(), 0), ("y".into(), 16), ("z".into(), 20)],
        }]
    );
    assert_eq!(ours.size(), Some(32));
    assert_eq!(ours.alignment(), 16);
}

#[test]
fn imported_structs_round_trip_through_layout() {
    let source = r#"
struct Light {
    position: vec3<f32>,
    intensity: f32,
    color: vec4<f32>,
}

struct Scene {
    ambient: vec3<f32>,
    count: u32,
    lights: array<Light>,
}
"#;
    let imported = import_structs(source).unwrap();
    let layouts = struct_layouts(source).unwrap();
    assert_eq!(imported.len(), layouts.len());

    for ((name, schema), layout) in imported.iter().zip(&layouts) {
        assert_eq!(name, &layout.name);
        assert_eq!(schema.alignment(), u64::from(layout.alignment));
        let offsets: Vec<u64> = schema
            .field_offsets()
            .unwrap()
            .into_iter()
            .map(|(_, offset)| offset)
            .collect();
        let expected: Vec<u64> = layout.members.iter().map(|(_, o)| u64::from(*o)).collect();
        assert_eq!(offsets, expected, "offsets of {name}");
    }
    // The runtime-sized scene has no fixed size.
    assert_eq!(imported[1].1.size(), None);
    assert_eq!(imported[0].1.size(), Some(32));
}

#[test]
fn unsupported_types_are_rejected() {
    let source = "struct M { m: mat2x3<f32> }";
    assert!(matches!(
        import_structs(source),
        Err(ParseError::Unsupported(_))
    ));
}
