#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(source) = std::str::from_utf8(data) else {
        return;
    };
    let (Ok(imported), Ok(layouts)) = (
        shadewire_parser::import_structs(source),
        shadewire_parser::struct_layouts(source),
    ) else {
        return;
    };
    // Whatever naga accepts and we can import must lay out identically.
    for ((name, schema), layout) in imported.iter().zip(&layouts) {
        assert_eq!(name, &layout.name);
        assert_eq!(schema.alignment(), u64::from(layout.alignment), "{name}");
        let offsets: Vec<u64> = schema
            .field_offsets()
            .unwrap_or_default()
            .into_iter()
            .map(|(_, offset)| offset)
            .collect();
        let expected: Vec<u64> = layout.members.iter().map(|(_, o)| u64::from(*o)).collect();
        assert_eq!(offsets, expected, "{name}");
    }
});
