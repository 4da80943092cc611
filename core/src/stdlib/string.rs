//! String methods.
//!
//! Positions and lengths count Unicode scalar values, not bytes.

use std::rc::Rc;

use crate::{
    evaluator::{Interpreter, RuntimeError},
    stdlib::{arg, integer_arg, relative_index, to_integer},
    values::{MAX_STRING_LENGTH, StringBuilder, Value},
};

/// Dispatch a string method. Returns `None` if `name` is not one.
pub fn call_method(
    interp: &mut Interpreter,
    s: &Rc<str>,
    name: &str,
    args: &[Value],
) -> Option<Result<Value, RuntimeError>> {
    let s: &str = s;
    Some(match name {
        "toUpperCase" => Ok(Value::from(s.to_uppercase())),
        "toLowerCase" => Ok(Value::from(s.to_lowercase())),
        "trim" => Ok(Value::str(s.trim())),
        "trimStart" => Ok(Value::str(s.trim_start())),
        "trimEnd" => Ok(Value::str(s.trim_end())),
        "split" => Ok(split(s, args)),
        "substring" => Ok(substring(s, args)),
        "substr" => Ok(substr(s, args)),
        "slice" => Ok(slice(s, args)),
        "indexOf" => Ok(index_of(s, args)),
        "lastIndexOf" => Ok(last_index_of(s, args)),
        "includes" => {
            let search = arg(args, 0).to_string();
            let from = byte_offset(s, char_position(args, 1, s));
            Ok(Value::Bool(s[from..].contains(search.as_str())))
        }
        "startsWith" => {
            let search = arg(args, 0).to_string();
            let from = byte_offset(s, char_position(args, 1, s));
            Ok(Value::Bool(s[from..].starts_with(search.as_str())))
        }
        "endsWith" => {
            let search = arg(args, 0).to_string();
            let len = char_len(s);
            let end = match args.get(1) {
                None | Some(Value::Undefined) => len,
                Some(v) => to_integer(v).clamp(0.0, len as f64) as usize,
            };
            Ok(Value::Bool(s[..byte_offset(s, end)].ends_with(search.as_str())))
        }
        "replace" => replace(interp, s, args, false),
        "replaceAll" => replace(interp, s, args, true),
        "repeat" => repeat(s, args),
        "padStart" => pad(s, args, true),
        "padEnd" => pad(s, args, false),
        "charAt" => {
            let i = integer_arg(args, 0, 0.0);
            Ok(char_at(s, i).map_or_else(|| Value::str(""), |c| Value::from(c.to_string())))
        }
        "charCodeAt" => {
            let i = integer_arg(args, 0, 0.0);
            Ok(Value::Number(char_at(s, i).map_or(f64::NAN, |c| {
                let mut units = [0u16; 2];
                c.encode_utf16(&mut units)[0] as f64
            })))
        }
        "at" => {
            let len = char_len(s) as f64;
            let i = integer_arg(args, 0, 0.0);
            let i = if i < 0.0 { len + i } else { i };
            Ok(char_at(s, i).map_or(Value::Undefined, |c| Value::from(c.to_string())))
        }
        "concat" => concat(s, args),
        _ => return None,
    })
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Byte offset of the `index`-th character, or `s.len()` past the end.
fn byte_offset(s: &str, index: usize) -> usize {
    s.char_indices().nth(index).map_or(s.len(), |(b, _)| b)
}

/// Character index of a byte offset.
fn char_index(s: &str, byte: usize) -> usize {
    s[..byte].chars().count()
}

fn char_at(s: &str, index: f64) -> Option<char> {
    if index < 0.0 {
        return None;
    }
    s.chars().nth(index as usize)
}

/// Optional position argument clamped to `0..=len`.
fn char_position(args: &[Value], i: usize, s: &str) -> usize {
    integer_arg(args, i, 0.0).clamp(0.0, char_len(s) as f64) as usize
}

fn substring_chars(s: &str, start: usize, end: usize) -> Value {
    if start >= end {
        return Value::str("");
    }
    Value::str(&s[byte_offset(s, start)..byte_offset(s, end)])
}

fn split(s: &str, args: &[Value]) -> Value {
    let limit = match args.get(1) {
        None | Some(Value::Undefined) => usize::MAX,
        Some(v) => to_integer(v).max(0.0) as usize,
    };
    let parts: Vec<Value> = match args.first() {
        None | Some(Value::Undefined) => vec![Value::str(s)],
        Some(sep) => {
            let sep = sep.to_string();
            if sep.is_empty() {
                s.chars()
                    .take(limit)
                    .map(|c| Value::from(c.to_string()))
                    .collect()
            } else {
                s.split(sep.as_str()).take(limit).map(Value::str).collect()
            }
        }
    };
    Value::array(parts.into_iter().take(limit).collect())
}

fn substring(s: &str, args: &[Value]) -> Value {
    let len = char_len(s) as f64;
    let a = integer_arg(args, 0, 0.0).clamp(0.0, len) as usize;
    let b = integer_arg(args, 1, len).clamp(0.0, len) as usize;
    substring_chars(s, a.min(b), a.max(b))
}

fn substr(s: &str, args: &[Value]) -> Value {
    let len = char_len(s);
    let start = relative_index(integer_arg(args, 0, 0.0), len);
    let count = integer_arg(args, 1, len as f64).clamp(0.0, (len - start) as f64) as usize;
    substring_chars(s, start, start + count)
}

fn slice(s: &str, args: &[Value]) -> Value {
    let len = char_len(s);
    let start = relative_index(integer_arg(args, 0, 0.0), len);
    let end = relative_index(integer_arg(args, 1, len as f64), len);
    substring_chars(s, start, end)
}

fn index_of(s: &str, args: &[Value]) -> Value {
    let search = arg(args, 0).to_string();
    let from = byte_offset(s, char_position(args, 1, s));
    Value::Number(
        s[from..]
            .find(search.as_str())
            .map_or(-1.0, |pos| char_index(s, from + pos) as f64),
    )
}

fn last_index_of(s: &str, args: &[Value]) -> Value {
    let search = arg(args, 0).to_string();
    Value::Number(
        s.rfind(search.as_str())
            .map_or(-1.0, |pos| char_index(s, pos) as f64),
    )
}

/// Byte offsets where `pattern` matches. An empty pattern matches at every
/// character boundary.
fn match_offsets(s: &str, pattern: &str, all: bool) -> Vec<usize> {
    let offsets: Vec<usize> = if pattern.is_empty() {
        s.char_indices()
            .map(|(b, _)| b)
            .chain(std::iter::once(s.len()))
            .collect()
    } else {
        s.match_indices(pattern).map(|(b, _)| b).collect()
    };
    if all {
        offsets
    } else {
        offsets.into_iter().take(1).collect()
    }
}

fn replace(
    interp: &mut Interpreter,
    s: &str,
    args: &[Value],
    all: bool,
) -> Result<Value, RuntimeError> {
    let pattern = arg(args, 0).to_string();
    let replacement = arg(args, 1);
    let mut out = String::with_capacity(s.len());
    let mut last = 0;
    for offset in match_offsets(s, &pattern, all) {
        out.push_str(&s[last..offset]);
        let text = match &replacement {
            Value::Function(_) => {
                let position = Value::Number(char_index(s, offset) as f64);
                interp
                    .call(&replacement, &[Value::str(&pattern), position, Value::str(s)])?
                    .to_string()
            }
            other => other.to_string(),
        };
        out.push_str(&text);
        last = offset + pattern.len();
    }
    out.push_str(&s[last..]);
    Ok(Value::from(out))
}

fn concat(s: &str, args: &[Value]) -> Result<Value, RuntimeError> {
    let mut out = StringBuilder::new();
    out.push_str(s)?;
    for value in args {
        out.push_value(value)?;
    }
    Ok(Value::from(out.finish()))
}

fn repeat(s: &str, args: &[Value]) -> Result<Value, RuntimeError> {
    let count = to_integer(&arg(args, 0));
    if count < 0.0 || count.is_infinite() {
        return Err(RuntimeError::range_error(format!(
            "Invalid count value: {}",
            arg(args, 0)
        )));
    }
    let count = count as usize;
    if char_len(s).saturating_mul(count) > MAX_STRING_LENGTH {
        return Err(RuntimeError::range_error("Invalid string length"));
    }
    Ok(Value::from(s.repeat(count)))
}

fn pad(s: &str, args: &[Value], at_start: bool) -> Result<Value, RuntimeError> {
    let target = integer_arg(args, 0, 0.0);
    let filler = match args.get(1) {
        None | Some(Value::Undefined) => " ".to_string(),
        Some(v) => v.to_string(),
    };
    let len = char_len(s);
    if target <= len as f64 || filler.is_empty() {
        return Ok(Value::str(s));
    }
    if target > MAX_STRING_LENGTH as f64 {
        return Err(RuntimeError::range_error("Invalid string length"));
    }
    let padding: String = filler.chars().cycle().take(target as usize - len).collect();
    Ok(Value::from(if at_start {
        padding + s
    } else {
        format!("{}{}", s, padding)
    }))
}
