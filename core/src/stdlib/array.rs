//! Array methods and the `Array` global.

use core::cmp::Ordering;

use crate::{
    evaluator::{
        Interpreter, MAX_ARRAY_LENGTH, RuntimeError,
        operators::{same_value_zero, strict_equals},
    },
    stdlib::{arg, integer_arg, relative_index},
    values::{ArrayRef, Function, MAX_NESTING_DEPTH, StringBuilder, Value},
};

/// `Array(n)` / `Array(a, b, ...)`.
pub fn array_constructor(_: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
    match args {
        [Value::Number(n)] => {
            if *n < 0.0 || n.fract() != 0.0 || *n >= MAX_ARRAY_LENGTH as f64 {
                return Err(RuntimeError::range_error("Invalid array length"));
            }
            Ok(Value::array(vec![Value::Undefined; *n as usize]))
        }
        _ => Ok(Value::array(args.to_vec())),
    }
}

fn is_array(_: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::Bool(matches!(args.first(), Some(Value::Array(_)))))
}

pub fn static_member(name: &str) -> Option<Value> {
    match name {
        "isArray" => Some(Function::native("isArray", is_array)),
        _ => None,
    }
}

/// Dispatch an array method. Returns `None` if `name` is not one.
pub fn call_method(
    interp: &mut Interpreter,
    items: &ArrayRef,
    name: &str,
    args: &[Value],
) -> Option<Result<Value, RuntimeError>> {
    Some(match name {
        "join" => join(items, args),
        "map" => map(interp, items, args),
        "filter" => filter(interp, items, args),
        "reduce" => reduce(interp, items, args),
        "forEach" => for_each(interp, items, args),
        "find" => find(interp, items, args).map(|found| {
            found.map_or(Value::Undefined, |(_, item)| item)
        }),
        "findIndex" => find(interp, items, args).map(|found| {
            Value::Number(found.map_or(-1.0, |(i, _)| i as f64))
        }),
        "some" => find(interp, items, args).map(|found| Value::Bool(found.is_some())),
        "every" => every(interp, items, args),
        "includes" => {
            let needle = arg(args, 0);
            Ok(Value::Bool(
                items.borrow().iter().any(|item| same_value_zero(item, &needle)),
            ))
        }
        "indexOf" => {
            let needle = arg(args, 0);
            Ok(Value::Number(
                items
                    .borrow()
                    .iter()
                    .position(|item| strict_equals(item, &needle))
                    .map_or(-1.0, |i| i as f64),
            ))
        }
        "slice" => {
            let items = items.borrow();
            let len = items.len();
            let start = relative_index(integer_arg(args, 0, 0.0), len);
            let end = relative_index(integer_arg(args, 1, len as f64), len);
            Ok(Value::array(if start < end {
                items[start..end].to_vec()
            } else {
                Vec::new()
            }))
        }
        "concat" => concat(items, args),
        "push" => {
            let mut items = items.borrow_mut();
            if items.len() + args.len() > MAX_ARRAY_LENGTH {
                return Some(Err(RuntimeError::range_error("Invalid array length")));
            }
            items.extend_from_slice(args);
            Ok(Value::Number(items.len() as f64))
        }
        "pop" => Ok(items.borrow_mut().pop().unwrap_or(Value::Undefined)),
        "shift" => {
            let mut items = items.borrow_mut();
            Ok(if items.is_empty() {
                Value::Undefined
            } else {
                items.remove(0)
            })
        }
        "unshift" => {
            let mut items = items.borrow_mut();
            if items.len() + args.len() > MAX_ARRAY_LENGTH {
                return Some(Err(RuntimeError::range_error("Invalid array length")));
            }
            items.splice(0..0, args.iter().cloned());
            Ok(Value::Number(items.len() as f64))
        }
        "reverse" => {
            items.borrow_mut().reverse();
            Ok(Value::Array(items.clone()))
        }
        "sort" => sort(interp, items, args),
        "flat" => {
            let depth = integer_arg(args, 0, 1.0);
            let mut out = Vec::new();
            flatten_into(&items.borrow(), depth, &mut out, &mut Vec::new())
                .map(|()| Value::array(out))
        }
        "at" => {
            let items = items.borrow();
            let i = integer_arg(args, 0, 0.0);
            let i = if i < 0.0 { items.len() as f64 + i } else { i };
            Ok(if i < 0.0 {
                Value::Undefined
            } else {
                items.get(i as usize).cloned().unwrap_or(Value::Undefined)
            })
        }
        _ => return None,
    })
}

fn join(items: &ArrayRef, args: &[Value]) -> Result<Value, RuntimeError> {
    let separator = match args.first() {
        None | Some(Value::Undefined) => ",".to_string(),
        Some(sep) => sep.to_js_string()?,
    };
    let mut out = StringBuilder::new();
    for (i, item) in items.borrow().iter().enumerate() {
        if i > 0 {
            out.push_str(&separator)?;
        }
        if !item.is_nullish() {
            out.push_value(item)?;
        }
    }
    Ok(Value::from(out.finish()))
}

/// Call `callback(item, index, array)` for each element of a snapshot of the
/// array, stopping early when `visit` returns `false`.
fn each_item(
    interp: &mut Interpreter,
    items: &ArrayRef,
    args: &[Value],
    mut visit: impl FnMut(usize, Value, Value) -> bool,
) -> Result<(), RuntimeError> {
    let callback = arg(args, 0);
    if !matches!(callback, Value::Function(_)) {
        return Err(RuntimeError::type_error(format!(
            "{} is not a function",
            callback.type_of()
        )));
    }
    let snapshot = items.borrow().to_vec();
    for (i, item) in snapshot.into_iter().enumerate() {
        let result = interp.call(
            &callback,
            &[item.clone(), Value::Number(i as f64), Value::Array(items.clone())],
        )?;
        if !visit(i, item, result) {
            break;
        }
    }
    Ok(())
}

fn map(interp: &mut Interpreter, items: &ArrayRef, args: &[Value]) -> Result<Value, RuntimeError> {
    let mut out = Vec::with_capacity(items.borrow().len());
    each_item(interp, items, args, |_, _, result| {
        out.push(result);
        true
    })?;
    Ok(Value::array(out))
}

fn filter(
    interp: &mut Interpreter,
    items: &ArrayRef,
    args: &[Value],
) -> Result<Value, RuntimeError> {
    let mut out = Vec::new();
    each_item(interp, items, args, |_, item, keep| {
        if keep.truthy() {
            out.push(item);
        }
        true
    })?;
    Ok(Value::array(out))
}

fn for_each(
    interp: &mut Interpreter,
    items: &ArrayRef,
    args: &[Value],
) -> Result<Value, RuntimeError> {
    each_item(interp, items, args, |_, _, _| true)?;
    Ok(Value::Undefined)
}

/// First element for which the callback is truthy, with its index.
fn find(
    interp: &mut Interpreter,
    items: &ArrayRef,
    args: &[Value],
) -> Result<Option<(usize, Value)>, RuntimeError> {
    let mut found = None;
    each_item(interp, items, args, |i, item, matched| {
        if matched.truthy() {
            found = Some((i, item));
            false
        } else {
            true
        }
    })?;
    Ok(found)
}

fn every(interp: &mut Interpreter, items: &ArrayRef, args: &[Value]) -> Result<Value, RuntimeError> {
    let mut all = true;
    each_item(interp, items, args, |_, _, matched| {
        all = matched.truthy();
        all
    })?;
    Ok(Value::Bool(all))
}

fn reduce(interp: &mut Interpreter, items: &ArrayRef, args: &[Value]) -> Result<Value, RuntimeError> {
    let callback = arg(args, 0);
    let snapshot = items.borrow().to_vec();
    let mut iter = snapshot.into_iter().enumerate();
    let mut acc = match args.get(1) {
        Some(initial) => initial.clone(),
        None => match iter.next() {
            Some((_, first)) => first,
            None => {
                return Err(RuntimeError::type_error(
                    "Reduce of empty array with no initial value",
                ));
            }
        },
    };
    for (i, item) in iter {
        acc = interp.call(
            &callback,
            &[acc, item, Value::Number(i as f64), Value::Array(items.clone())],
        )?;
    }
    Ok(acc)
}

fn concat(items: &ArrayRef, args: &[Value]) -> Result<Value, RuntimeError> {
    let mut out = items.borrow().to_vec();
    for value in args {
        match value {
            Value::Array(other) => out.extend(other.borrow().iter().cloned()),
            other => out.push(other.clone()),
        }
    }
    if out.len() > MAX_ARRAY_LENGTH {
        return Err(RuntimeError::range_error("Invalid array length"));
    }
    Ok(Value::array(out))
}

fn flatten_into(
    items: &[Value],
    depth: f64,
    out: &mut Vec<Value>,
    seen: &mut Vec<*const ()>,
) -> Result<(), RuntimeError> {
    for item in items {
        match item {
            Value::Array(inner) if depth >= 1.0 => {
                let ptr = std::rc::Rc::as_ptr(inner) as *const ();
                if seen.contains(&ptr) {
                    continue;
                }
                if seen.len() >= MAX_NESTING_DEPTH {
                    return Err(RuntimeError::range_error("Maximum call stack size exceeded"));
                }
                seen.push(ptr);
                flatten_into(&inner.borrow(), depth - 1.0, out, seen)?;
                seen.pop();
            }
            other => {
                if out.len() >= MAX_ARRAY_LENGTH {
                    return Err(RuntimeError::range_error("Invalid array length"));
                }
                out.push(other.clone());
            }
        }
    }
    Ok(())
}

/// In-place sort. Without a comparator, elements compare by their string
/// form and `undefined` sorts last.
fn sort(interp: &mut Interpreter, items: &ArrayRef, args: &[Value]) -> Result<Value, RuntimeError> {
    let comparator = arg(args, 0);
    let snapshot = items.borrow().to_vec();
    let (mut defined, undefined): (Vec<Value>, Vec<Value>) = snapshot
        .into_iter()
        .partition(|item| !matches!(item, Value::Undefined));

    defined = match &comparator {
        Value::Undefined => merge_sort(defined, &mut |a, b| {
            Ok(a.to_string().cmp(&b.to_string()))
        })?,
        Value::Function(_) => merge_sort(defined, &mut |a, b| {
            let order = interp.call(&comparator, &[a.clone(), b.clone()])?.to_number();
            Ok(if order < 0.0 {
                Ordering::Less
            } else if order > 0.0 {
                Ordering::Greater
            } else {
                Ordering::Equal
            })
        })?,
        _ => {
            return Err(RuntimeError::type_error(
                "The comparison function must be either a function or undefined",
            ));
        }
    };
    defined.extend(undefined);
    **items.borrow_mut() = defined;
    Ok(Value::Array(items.clone()))
}

/// Stable merge sort with a fallible comparator. Inconsistent comparators
/// give an unspecified order but never panic.
fn merge_sort<F>(mut items: Vec<Value>, compare: &mut F) -> Result<Vec<Value>, RuntimeError>
where
    F: FnMut(&Value, &Value) -> Result<Ordering, RuntimeError>,
{
    if items.len() <= 1 {
        return Ok(items);
    }
    let right = items.split_off(items.len() / 2);
    let left = merge_sort(items, compare)?;
    let right = merge_sort(right, compare)?;

    let mut out = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();
    loop {
        let take_right = match (left.peek(), right.peek()) {
            (Some(l), Some(r)) => compare(r, l)? == Ordering::Less,
            _ => break,
        };
        let next = if take_right { right.next() } else { left.next() };
        out.extend(next);
    }
    out.extend(left);
    out.extend(right);
    Ok(out)
}
