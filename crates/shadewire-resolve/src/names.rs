//! Collision-free WGSL identifiers for module-scope declarations.

use std::collections::HashSet;

/// WGSL keywords, reserved words and predeclared names that must never be
/// produced as a declaration name.
const RESERVED: &[&str] = &[
    "alias", "break", "case", "const", "const_assert", "continue", "continuing", "default",
    "diagnostic", "discard", "else", "enable", "false", "fn", "for", "if", "let", "loop",
    "override", "requires", "return", "struct", "switch", "true", "var", "while", "NULL", "Self",
    "abstract", "active", "alignas", "alignof", "as", "asm", "asm_fragment", "async",
    "attribute", "auto", "await", "become", "cast", "catch", "class", "co_await", "co_return",
    "co_yield", "coherent", "column_major", "common", "compile", "compile_fragment", "concept",
    "const_cast", "consteval", "constexpr", "constinit", "crate", "debugger", "decltype",
    "delete", "demote", "demote_to_helper", "do", "dynamic_cast", "enum", "explicit", "export",
    "extends", "extern", "external", "fallthrough", "filter", "final", "finally", "friend",
    "from", "fxgroup", "get", "goto", "groupshared", "highp", "impl", "implements", "import",
    "inline", "instanceof", "interface", "layout", "lowp", "macro", "macro_rules", "match",
    "mediump", "meta", "mod", "module", "move", "mut", "mutable", "namespace", "new", "nil",
    "noexcept", "noinline", "nointerpolation", "non_coherent", "noncoherent", "noperspective",
    "null", "nullptr", "of", "operator", "package", "packoffset", "partition", "pass", "patch",
    "pixelfragment", "precise", "precision", "premerge", "priv", "protected", "pub", "public",
    "readonly", "ref", "regardless", "register", "reinterpret_cast", "require", "resource",
    "restrict", "self", "set", "shared", "sizeof", "smooth", "snorm", "static", "static_assert",
    "static_cast", "subroutine", "super", "target", "template", "this", "thread_local",
    "throw", "trait", "try", "type", "typedef", "typeid", "typename", "typeof", "union",
    "unless", "unorm", "unsafe", "unsized", "use", "using", "varying", "virtual", "volatile",
    "wgsl", "where", "with", "writeonly", "yield", "bool", "f16", "f32", "i32", "u32", "vec2",
    "vec3", "vec4", "mat2x2", "mat3x3", "mat4x4", "array", "atomic", "ptr", "sampler",
    "texture_2d", "function", "private", "workgroup", "uniform", "storage",
];

/// Name assigned to items that carry no label.
pub const DEFAULT_NAME: &str = "item";

/// Produces unique identifiers for one resolution.
pub trait NameRegistry {
    /// Returns a fresh identifier; `label` is a preference, not a promise.
    fn make_unique(&mut self, label: Option<&str>) -> String;
}

/// Human-readable names: the first request for a label gets it verbatim,
/// later ones get `_1`, `_2`, ... in request order.
#[derive(Debug, Default)]
pub struct StrictNameRegistry {
    taken: HashSet<String>,
}

impl NameRegistry for StrictNameRegistry {
    fn make_unique(&mut self, label: Option<&str>) -> String {
        let base = sanitize(label.unwrap_or(DEFAULT_NAME));
        if !is_reserved(&base) && self.taken.insert(base.clone()) {
            return base;
        }
        let mut suffix = 1usize;
        loop {
            let candidate = format!("{base}_{suffix}");
            if self.taken.insert(candidate.clone()) {
                return candidate;
            }
            suffix += 1;
        }
    }
}

/// Anonymized names that ignore labels entirely.
///
/// Tokens come from a counter, so two resolutions of the same graph still
/// produce identical text.
#[derive(Debug, Default)]
pub struct RandomNameRegistry {
    next: usize,
}

impl NameRegistry for RandomNameRegistry {
    fn make_unique(&mut self, _label: Option<&str>) -> String {
        let name = format!("{DEFAULT_NAME}_{}", self.next);
        self.next += 1;
        name
    }
}

fn is_reserved(name: &str) -> bool {
    RESERVED.contains(&name)
}

/// Turns an arbitrary label into a WGSL identifier.
fn sanitize(label: &str) -> String {
    let mut out: String = label
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();

    // Identifiers cannot start with `__` or a digit, and `_` alone is a token.
    while out.starts_with("__") {
        out.remove(0);
    }
    if out.is_empty() || out == "_" {
        return DEFAULT_NAME.to_string();
    }
    if out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}
