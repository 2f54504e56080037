//! Identifier substitution in raw WGSL text.
//!
//! Function bodies written as WGSL and whole-module templates refer to
//! externals by name. Every identifier token that names an external is
//! replaced by the resolved expression. Comments, numbers, attribute names,
//! member names after a `.`, member declarations in struct bodies and the
//! enumerant arguments of `@builtin`, `@interpolate` and `@diagnostic` are
//! left alone. `name.field` chains are followed while `name` is a record on
//! the host side.

use crate::context::ResolutionCtx;
use crate::error::ResolveError;
use crate::item::Value;

/// Attributes whose arguments are WGSL enumerants rather than expressions.
const ENUMERANT_ATTRIBUTES: &[&str] = &["builtin", "interpolate", "diagnostic"];

pub(crate) fn substitute(
    ctx: &mut ResolutionCtx<'_>,
    text: &str,
    externals: &[(String, Value)],
) -> Result<String, ResolveError> {
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;
    // `struct` seen, body not yet open.
    let mut struct_pending = false;
    let mut in_struct = false;

    while i < bytes.len() {
        let rest = &text[i..];
        if rest.starts_with("//") {
            let end = rest.find('\n').unwrap_or(rest.len());
            out.push_str(&rest[..end]);
            i += end;
            continue;
        }
        if rest.starts_with("/*") {
            let end = rest.find("*/").map_or(rest.len(), |e| e + 2);
            out.push_str(&rest[..end]);
            i += end;
            continue;
        }

        let c = bytes[i];
        if c.is_ascii_digit() {
            // Numbers may carry suffixes and exponents (`1e3f`, `0x1u`).
            let end = token_end(bytes, i);
            out.push_str(&text[i..end]);
            i = end;
            continue;
        }
        if !is_ident_start(c) {
            match c {
                b'{' if struct_pending => {
                    struct_pending = false;
                    in_struct = true;
                }
                b'}' => in_struct = false,
                _ => {}
            }
            let len = rest.chars().next().map_or(1, char::len_utf8);
            out.push_str(&rest[..len]);
            i += len;
            continue;
        }

        let end = token_end(bytes, i);
        let name = &text[i..end];
        let previous = previous_non_space(bytes, i);
        if previous == Some(b'@') && ENUMERANT_ATTRIBUTES.contains(&name) {
            let close = enumerant_arguments_end(bytes, end);
            out.push_str(&text[i..close]);
            i = close;
            continue;
        }
        if name == "struct" {
            struct_pending = true;
        }
        let member_declaration = in_struct && next_non_space(bytes, end) == Some(b':');
        let after_member = previous.is_some_and(|p| p == b'.' || p == b'@');
        let value = externals
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
            .filter(|_| !after_member && !member_declaration);

        let Some(value) = value else {
            out.push_str(name);
            i = end;
            continue;
        };

        let (value, end) = follow_fields(ctx, value, text, end)?;
        out.push_str(&ctx.resolve_value(&value)?.code);
        i = end;
    }
    Ok(out)
}

/// Follows `.field` accesses while the value is a record.
fn follow_fields(
    ctx: &mut ResolutionCtx<'_>,
    value: &Value,
    text: &str,
    mut end: usize,
) -> Result<(Value, usize), ResolveError> {
    let bytes = text.as_bytes();
    let mut current = value.clone();
    loop {
        if bytes.get(end) != Some(&b'.') || !bytes.get(end + 1).is_some_and(|b| is_ident_start(*b))
        {
            return Ok((current, end));
        }
        let unwrapped = ctx.unwrap_value(&current)?;
        let field_end = token_end(bytes, end + 1);
        let field = &text[end + 1..field_end];
        match unwrapped.field(field) {
            Some(next) => {
                current = next.clone();
                end = field_end;
            }
            None => return Ok((current, end)),
        }
    }
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

fn token_end(bytes: &[u8], start: usize) -> usize {
    bytes[start..]
        .iter()
        .position(|b| !(b.is_ascii_alphanumeric() || *b == b'_'))
        .map_or(bytes.len(), |p| start + p)
}

/// End of the parenthesized arguments starting after `start`, or `start`
/// itself when no `(` follows.
fn enumerant_arguments_end(bytes: &[u8], start: usize) -> usize {
    let open = start
        + bytes[start..]
            .iter()
            .take_while(|b| b.is_ascii_whitespace())
            .count();
    if bytes.get(open) != Some(&b'(') {
        return start;
    }
    bytes[open..]
        .iter()
        .position(|b| *b == b')')
        .map_or(bytes.len(), |p| open + p + 1)
}

fn next_non_space(bytes: &[u8], index: usize) -> Option<u8> {
    bytes[index..]
        .iter()
        .find(|b| !b.is_ascii_whitespace())
        .copied()
}

fn previous_non_space(bytes: &[u8], index: usize) -> Option<u8> {
    bytes[..index]
        .iter()
        .rev()
        .find(|b| !b.is_ascii_whitespace())
        .copied()
}
