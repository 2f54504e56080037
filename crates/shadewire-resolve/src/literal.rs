//! Numeric literal typing: abstract literals and their concrete spellings.

use shadewire_schema::{Scalar, ScalarKind};

use crate::error::GenerationError;
use crate::snippet::{Snippet, SnippetType};

/// Classifies the source text of an integer literal.
pub(crate) fn abstract_int(text: &str) -> Result<Snippet, GenerationError> {
    parse_int(text).ok_or_else(|| GenerationError::LiteralOutOfRange {
        literal: text.to_string(),
        ty: "abstract-int".into(),
    })?;
    Ok(Snippet::new(text, SnippetType::AbstractInt))
}

pub(crate) fn abstract_float(text: &str) -> Result<Snippet, GenerationError> {
    let value = parse_float(text).ok_or_else(|| GenerationError::LiteralOutOfRange {
        literal: text.to_string(),
        ty: "abstract-float".into(),
    })?;
    if !value.is_finite() {
        return Err(GenerationError::NonFiniteLiteral(text.to_string()));
    }
    Ok(Snippet::new(text, SnippetType::AbstractFloat))
}

pub(crate) fn parse_int(text: &str) -> Option<i64> {
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let magnitude = match digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        Some(hex) => i64::from_str_radix(hex, 16).ok()?,
        None => digits.parse::<i64>().ok()?,
    };
    Some(if negative { -magnitude } else { magnitude })
}

pub(crate) fn parse_float(text: &str) -> Option<f64> {
    // `str::parse` also accepts `inf` and `NaN`, which are identifiers here.
    let numeric = text.starts_with(|c: char| c.is_ascii_digit() || c == '.' || c == '-')
        && text
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'));
    if !numeric {
        return None;
    }
    text.parse::<f64>().ok()
}

/// Returns `true` if `code` is a bare (possibly negated) numeric literal.
pub(crate) fn is_literal(code: &str) -> bool {
    parse_int(code).is_some() || parse_float(code).is_some()
}

/// Spells an abstract literal as a concrete literal of `scalar`.
///
/// Integer literals may become any numeric type; float literals only
/// float types.
pub(crate) fn concretize(
    code: &str,
    ty: &SnippetType,
    scalar: Scalar,
) -> Result<String, GenerationError> {
    let out_of_range = || GenerationError::LiteralOutOfRange {
        literal: code.to_string(),
        ty: scalar.to_string(),
    };
    let mismatch = || GenerationError::TypeMismatch {
        expected: scalar.to_string(),
        found: ty.to_string(),
    };

    if scalar == Scalar::U16 {
        return Err(GenerationError::HostOnlyType(scalar.to_string()));
    }

    match (ty, scalar.kind()) {
        (SnippetType::AbstractInt, ScalarKind::Sint) => {
            let v = parse_int(code).ok_or_else(out_of_range)?;
            let v = i32::try_from(v).map_err(|_| out_of_range())?;
            Ok(i32_literal(v))
        }
        (SnippetType::AbstractInt, ScalarKind::Uint) => {
            let v = parse_int(code).ok_or_else(out_of_range)?;
            u32::try_from(v).map_err(|_| out_of_range())?;
            Ok(format!("{v}u"))
        }
        (SnippetType::AbstractInt, ScalarKind::Float) => {
            let v = parse_int(code).ok_or_else(out_of_range)? as f64;
            float_literal(code, v, scalar, out_of_range)
        }
        (SnippetType::AbstractFloat, ScalarKind::Float) => {
            let v = parse_float(code).ok_or_else(out_of_range)?;
            float_literal(code, v, scalar, out_of_range)
        }
        _ => Err(mismatch()),
    }
}

/// The concrete spelling of an `i32`. `-2147483648i` negates an
/// out-of-range literal, so the minimum goes through a conversion.
pub(crate) fn i32_literal(v: i32) -> String {
    if v == i32::MIN {
        format!("i32({v})")
    } else {
        format!("{v}i")
    }
}

fn float_literal(
    code: &str,
    value: f64,
    scalar: Scalar,
    out_of_range: impl Fn() -> GenerationError,
) -> Result<String, GenerationError> {
    let suffix = if scalar == Scalar::F16 {
        if !half::f16::from_f64(value).is_finite() {
            return Err(out_of_range());
        }
        'h'
    } else {
        if !(value as f32).is_finite() {
            return Err(out_of_range());
        }
        'f'
    };
    // Hex integers have no float spelling; use the decimal value.
    let text = if code.contains(['x', 'X']) {
        format!("{value}")
    } else {
        code.to_string()
    };
    Ok(format!("{text}{suffix}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_literals_take_any_numeric_type() {
        let ty = SnippetType::AbstractInt;
        assert_eq!(concretize("2", &ty, Scalar::I32).unwrap(), "2i");
        assert_eq!(concretize("2", &ty, Scalar::U32).unwrap(), "2u");
        assert_eq!(concretize("2", &ty, Scalar::F32).unwrap(), "2f");
        assert_eq!(concretize("2", &ty, Scalar::F16).unwrap(), "2h");
        assert_eq!(concretize("0x10", &ty, Scalar::U32).unwrap(), "16u");
        assert_eq!(concretize("0x10", &ty, Scalar::F32).unwrap(), "16f");
        assert_eq!(concretize("-3", &ty, Scalar::I32).unwrap(), "-3i");
    }

    #[test]
    fn minimum_i32_is_spelled_as_a_conversion() {
        let ty = SnippetType::AbstractInt;
        assert_eq!(
            concretize("-2147483648", &ty, Scalar::I32).unwrap(),
            "i32(-2147483648)"
        );
        assert_eq!(concretize("-2147483647", &ty, Scalar::I32).unwrap(), "-2147483647i");
        assert_eq!(i32_literal(i32::MIN), "i32(-2147483648)");
    }

    #[test]
    fn float_literals_only_take_float_types() {
        let ty = SnippetType::AbstractFloat;
        assert_eq!(concretize("1.5", &ty, Scalar::F16).unwrap(), "1.5h");
        assert_eq!(concretize("1e3", &ty, Scalar::F32).unwrap(), "1e3f");
        assert!(matches!(
            concretize("1.5", &ty, Scalar::I32),
            Err(GenerationError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn range_checks() {
        let ty = SnippetType::AbstractInt;
        assert!(matches!(
            concretize("-1", &ty, Scalar::U32),
            Err(GenerationError::LiteralOutOfRange { .. })
        ));
        assert!(matches!(
            concretize("3000000000", &ty, Scalar::I32),
            Err(GenerationError::LiteralOutOfRange { .. })
        ));
        assert!(matches!(
            concretize("100000", &ty, Scalar::F16),
            Err(GenerationError::LiteralOutOfRange { .. })
        ));
        assert!(matches!(
            concretize("1", &ty, Scalar::U16),
            Err(GenerationError::HostOnlyType(_))
        ));
    }

    #[test]
    fn literal_detection() {
        assert!(is_literal("12"));
        assert!(is_literal("-1.5"));
        assert!(is_literal("0xff"));
        assert!(!is_literal("(1 + 2)"));
        assert!(!is_literal("x"));
        assert!(!is_literal("inf"));
    }

    #[test]
    fn abstract_classification() {
        assert_eq!(abstract_int("7").unwrap().ty, SnippetType::AbstractInt);
        assert_eq!(abstract_float("7.5").unwrap().ty, SnippetType::AbstractFloat);
        assert!(abstract_int("99999999999999999999").is_err());
        assert!(abstract_float("1e400").is_err());
    }
}
