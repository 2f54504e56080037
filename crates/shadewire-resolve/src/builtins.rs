//! Host builtin functions and the WGSL intrinsics they map to.

use shadewire_schema::Schema;

/// How a builtin's result type follows from its arguments.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ReturnRule {
    /// Same type as the first argument (component-wise functions).
    FirstArg,
    /// The component scalar of the first argument (`dot`, `length`).
    ComponentScalar,
    /// A fixed type.
    Fixed(FixedType),
    /// No value (barriers).
    Void,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum FixedType {
    Bool,
    U32,
}

impl FixedType {
    pub(crate) fn schema(self) -> Schema {
        match self {
            Self::Bool => Schema::BOOL,
            Self::U32 => Schema::U32,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Builtin {
    pub(crate) wgsl: &'static str,
    pub(crate) ret: ReturnRule,
    /// Pointer-taking intrinsics get `&` in front of their first argument.
    pub(crate) takes_pointer: bool,
}

impl Builtin {
    const fn new(wgsl: &'static str, ret: ReturnRule) -> Self {
        Self {
            wgsl,
            ret,
            takes_pointer: false,
        }
    }

    const fn pointer(wgsl: &'static str, ret: ReturnRule) -> Self {
        Self {
            wgsl,
            ret,
            takes_pointer: true,
        }
    }
}

/// Namespaces whose members are all builtins.
const NAMESPACES: &[&str] = &["std", "Math"];

pub(crate) fn is_namespace(root: &str) -> bool {
    NAMESPACES.contains(&root)
}

/// Looks up a host builtin by its dotted path (`sin`, `std.sin`, `Math.sqrt`).
pub(crate) fn lookup(path: &str) -> Option<Builtin> {
    if let Some(name) = path.strip_prefix("Math.") {
        return math(name);
    }
    wgsl(path.strip_prefix("std.").unwrap_or(path))
}

const COMPONENT_WISE: &[&str] = &[
    "abs", "acos", "acosh", "asin", "asinh", "atan", "atanh", "atan2", "ceil", "clamp", "cos",
    "cosh", "cross", "degrees", "exp", "exp2", "faceForward", "floor", "fma", "fract",
    "inverseSqrt", "log", "log2", "max", "min", "mix", "normalize", "pow", "radians", "reflect",
    "refract", "round", "saturate", "select", "sign", "sin", "sinh", "smoothstep", "sqrt", "step",
    "tan", "tanh", "transpose", "trunc", "countOneBits", "reverseBits", "dpdx", "dpdy", "fwidth",
];

const OTHERS: &[Builtin] = &[
    Builtin::new("dot", ReturnRule::ComponentScalar),
    Builtin::new("length", ReturnRule::ComponentScalar),
    Builtin::new("distance", ReturnRule::ComponentScalar),
    Builtin::new("determinant", ReturnRule::ComponentScalar),
    Builtin::new("all", ReturnRule::Fixed(FixedType::Bool)),
    Builtin::new("any", ReturnRule::Fixed(FixedType::Bool)),
    Builtin::pointer("arrayLength", ReturnRule::Fixed(FixedType::U32)),
    Builtin::pointer("atomicLoad", ReturnRule::ComponentScalar),
    Builtin::pointer("atomicAdd", ReturnRule::ComponentScalar),
    Builtin::pointer("atomicSub", ReturnRule::ComponentScalar),
    Builtin::pointer("atomicMax", ReturnRule::ComponentScalar),
    Builtin::pointer("atomicMin", ReturnRule::ComponentScalar),
    Builtin::pointer("atomicAnd", ReturnRule::ComponentScalar),
    Builtin::pointer("atomicOr", ReturnRule::ComponentScalar),
    Builtin::pointer("atomicXor", ReturnRule::ComponentScalar),
    Builtin::pointer("atomicExchange", ReturnRule::ComponentScalar),
    Builtin::pointer("atomicStore", ReturnRule::Void),
    Builtin::new("workgroupBarrier", ReturnRule::Void),
    Builtin::new("storageBarrier", ReturnRule::Void),
];

fn wgsl(name: &str) -> Option<Builtin> {
    if let Some(wgsl) = COMPONENT_WISE.iter().copied().find(|n| *n == name) {
        return Some(Builtin::new(wgsl, ReturnRule::FirstArg));
    }
    OTHERS.iter().copied().find(|b| b.wgsl == name)
}

fn math(name: &str) -> Option<Builtin> {
    let wgsl = match name {
        "abs" => "abs",
        "acos" => "acos",
        "asin" => "asin",
        "atan" => "atan",
        "atan2" => "atan2",
        "ceil" => "ceil",
        "cos" => "cos",
        "cosh" => "cosh",
        "exp" => "exp",
        "floor" => "floor",
        "log" => "log",
        "log2" => "log2",
        "max" => "max",
        "min" => "min",
        "pow" => "pow",
        "round" => "round",
        "sign" => "sign",
        "sin" => "sin",
        "sinh" => "sinh",
        "sqrt" => "sqrt",
        "tan" => "tan",
        "tanh" => "tanh",
        "trunc" => "trunc",
        _ => return None,
    };
    Some(Builtin::new(wgsl, ReturnRule::FirstArg))
}

/// WGSL type names usable as constructors without importing a schema.
pub(crate) fn constructor(name: &str) -> Option<Schema> {
    let schema = match name {
        "bool" => Schema::BOOL,
        "f32" => Schema::F32,
        "f16" => Schema::F16,
        "i32" => Schema::I32,
        "u32" => Schema::U32,
        "vec2f" => Schema::VEC2F,
        "vec3f" => Schema::VEC3F,
        "vec4f" => Schema::VEC4F,
        "vec2h" => Schema::VEC2H,
        "vec3h" => Schema::VEC3H,
        "vec4h" => Schema::VEC4H,
        "vec2i" => Schema::VEC2I,
        "vec3i" => Schema::VEC3I,
        "vec4i" => Schema::VEC4I,
        "vec2u" => Schema::VEC2U,
        "vec3u" => Schema::VEC3U,
        "vec4u" => Schema::VEC4U,
        "mat2x2f" => Schema::MAT2X2F,
        "mat3x3f" => Schema::MAT3X3F,
        "mat4x4f" => Schema::MAT4X4F,
        _ => return None,
    };
    Some(schema)
}
