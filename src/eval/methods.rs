//! Builtin methods. The set is closed: no host method is ever invoked.

use std::cmp::Ordering;

use regex::Regex;

use super::expr::Interp;
use super::ops;
use crate::error::{ConfigError, Result, Span};
use crate::value::{ConfigTree, Value};

fn unknown(receiver: &Value, name: &str, span: Span) -> ConfigError {
    ConfigError::eval(
        format!("Unknown method `{}` for {}", name, receiver.type_name()),
        span,
        520,
    )
}

fn arity(name: &str, expected: &str, args: &[Value], span: Span) -> ConfigError {
    ConfigError::eval(
        format!("`{}` expects {} argument(s), got {}", name, expected, args.len()),
        span,
        502,
    )
}

fn string_arg<'v>(name: &str, args: &'v [Value], index: usize, span: Span) -> Result<&'v str> {
    args.get(index).and_then(Value::as_str).ok_or_else(|| {
        ConfigError::eval(format!("`{}` expects a string argument", name), span, 502)
    })
}

fn closure_arg<'v>(name: &str, args: &'v [Value], span: Span) -> Result<&'v crate::closure::ClosureValue> {
    match args.last() {
        Some(Value::Closure(closure)) => Ok(closure),
        _ => Err(ConfigError::eval(format!("`{}` expects a closure", name), span, 502)),
    }
}

pub(crate) fn call_method(
    interp: &mut Interp<'_>,
    receiver: Value,
    name: &str,
    args: Vec<Value>,
    span: Span,
) -> Result<Value> {
    if name == "toString" && args.is_empty() {
        return Ok(Value::String(receiver.to_string()));
    }
    match receiver {
        Value::String(s) => string_method(&s, name, &args, span),
        Value::List(items) => list_method(interp, items, name, &args, span),
        Value::Map(map) => map_method(interp, map, name, &args, span),
        Value::Closure(closure) if name == "call" => interp.invoke(&closure, args),
        Value::Null => Err(ConfigError::eval(
            format!("Cannot invoke method `{}` on null object", name),
            span,
            521,
        )),
        other => Err(unknown(&other, name, span)),
    }
}

fn string_method(s: &str, name: &str, args: &[Value], span: Span) -> Result<Value> {
    let value = match (name, args.len()) {
        ("size" | "length", 0) => Value::Int(s.chars().count() as i64),
        ("isEmpty", 0) => Value::Bool(s.is_empty()),
        ("toUpperCase", 0) => Value::String(s.to_uppercase()),
        ("toLowerCase", 0) => Value::String(s.to_lowercase()),
        ("trim", 0) => Value::String(s.trim().to_string()),
        ("contains", 1) => Value::Bool(s.contains(string_arg(name, args, 0, span)?)),
        ("startsWith", 1) => Value::Bool(s.starts_with(string_arg(name, args, 0, span)?)),
        ("endsWith", 1) => Value::Bool(s.ends_with(string_arg(name, args, 0, span)?)),
        ("replace", 2) => {
            let from = string_arg(name, args, 0, span)?;
            let to = string_arg(name, args, 1, span)?;
            Value::String(s.replace(from, to))
        }
        ("split", 0) => Value::List(s.split_whitespace().map(Value::from).collect()),
        ("split", 1) => {
            let pattern = string_arg(name, args, 0, span)?;
            let regex = Regex::new(pattern).map_err(|e| {
                ConfigError::eval(format!("Invalid regular expression: {}", e), span, 507)
            })?;
            let mut parts: Vec<&str> = regex.split(s).collect();
            while parts.last().is_some_and(|part| part.is_empty()) {
                parts.pop();
            }
            Value::List(parts.into_iter().map(Value::from).collect())
        }
        ("toInteger", 0) => ops::cast(Value::String(s.to_string()), "Integer", span)?,
        ("size" | "length" | "isEmpty" | "toUpperCase" | "toLowerCase" | "trim" | "toInteger", _) => {
            return Err(arity(name, "0", args, span));
        }
        ("contains" | "startsWith" | "endsWith", _) => return Err(arity(name, "1", args, span)),
        ("replace", _) => return Err(arity(name, "2", args, span)),
        ("split", _) => return Err(arity(name, "0 or 1", args, span)),
        _ => return Err(unknown(&Value::String(s.to_string()), name, span)),
    };
    Ok(value)
}

fn list_method(interp: &mut Interp<'_>, items: Vec<Value>, name: &str, args: &[Value], span: Span) -> Result<Value> {
    match name {
        "size" => Ok(Value::Int(items.len() as i64)),
        "isEmpty" => Ok(Value::Bool(items.is_empty())),
        "contains" => {
            let [needle] = args else {
                return Err(arity(name, "1", args, span));
            };
            Ok(Value::Bool(items.iter().any(|item| ops::values_equal(item, needle))))
        }
        "join" => {
            let separator = match args {
                [] => "",
                _ => string_arg(name, args, 0, span)?,
            };
            let joined = items.iter().map(Value::to_string).collect::<Vec<_>>().join(separator);
            Ok(Value::String(joined))
        }
        "first" | "last" => {
            let item = if name == "first" { items.into_iter().next() } else { items.into_iter().next_back() };
            item.ok_or_else(|| {
                ConfigError::eval(format!("Cannot access {}() element from an empty list", name), span, 523)
            })
        }
        "collect" => {
            let closure = closure_arg(name, args, span)?;
            items
                .into_iter()
                .map(|item| interp.invoke(closure, vec![item]))
                .collect::<Result<Vec<_>>>()
                .map(Value::List)
        }
        "each" => {
            let closure = closure_arg(name, args, span)?;
            for item in &items {
                interp.invoke(closure, vec![item.clone()])?;
            }
            Ok(Value::List(items))
        }
        "findAll" | "find" => {
            let closure = closure_arg(name, args, span)?;
            let mut found = Vec::new();
            for item in items {
                if interp.invoke(closure, vec![item.clone()])?.is_truthy() {
                    if name == "find" {
                        return Ok(item);
                    }
                    found.push(item);
                }
            }
            Ok(if name == "find" { Value::Null } else { Value::List(found) })
        }
        "sum" => {
            let mut items = items.into_iter();
            let Some(first) = items.next() else {
                return Ok(Value::Null);
            };
            items.try_fold(first, |total, item| ops::binary(crate::ast::BinaryOp::Add, total, item, span))
        }
        "max" | "min" => {
            let wanted = if name == "max" { Ordering::Greater } else { Ordering::Less };
            let mut best: Option<Value> = None;
            for item in items {
                best = match best {
                    None => Some(item),
                    Some(current) => {
                        let ordering = ops::compare(&item, &current).ok_or_else(|| {
                            ConfigError::eval(format!("Cannot compare elements in {}()", name), span, 502)
                        })?;
                        Some(if ordering == wanted { item } else { current })
                    }
                };
            }
            Ok(best.unwrap_or(Value::Null))
        }
        "reverse" => Ok(Value::List(items.into_iter().rev().collect())),
        "sort" => sort(interp, items, args, span),
        "unique" => {
            let mut unique: Vec<Value> = Vec::with_capacity(items.len());
            for item in items {
                if !unique.iter().any(|seen| ops::values_equal(seen, &item)) {
                    unique.push(item);
                }
            }
            Ok(Value::List(unique))
        }
        _ => Err(unknown(&Value::List(items), name, span)),
    }
}

/// Natural order, or the order given by a comparator (two params) or key (one param) closure.
fn sort(interp: &mut Interp<'_>, mut items: Vec<Value>, args: &[Value], span: Span) -> Result<Value> {
    let incomparable = || ConfigError::eval("Cannot compare list elements in sort()", span, 502);

    let mut keyed: Vec<(Value, Value)> = match args {
        [] => items.drain(..).map(|item| (item.clone(), item)).collect(),
        [Value::Closure(closure)] if closure.params().len() == 2 => {
            // insertion sort keeps the comparator calls fallible
            let mut sorted: Vec<Value> = Vec::with_capacity(items.len());
            for item in items {
                let mut at = sorted.len();
                for (i, existing) in sorted.iter().enumerate() {
                    let order = interp.invoke(closure, vec![item.clone(), existing.clone()])?;
                    if matches!(order, Value::Int(n) if n < 0) {
                        at = i;
                        break;
                    }
                }
                sorted.insert(at, item);
            }
            return Ok(Value::List(sorted));
        }
        [Value::Closure(closure)] => items
            .drain(..)
            .map(|item| -> Result<(Value, Value)> { Ok((interp.invoke(closure, vec![item.clone()])?, item)) })
            .collect::<Result<_>>()?,
        _ => return Err(arity("sort", "0 or 1", args, span)),
    };

    if !keyed.iter().all(|a| keyed.iter().all(|b| ops::compare(&a.0, &b.0).is_some())) {
        return Err(incomparable());
    }
    keyed.sort_by(|a, b| ops::compare(&a.0, &b.0).unwrap_or(Ordering::Equal));
    Ok(Value::List(keyed.into_iter().map(|(_, item)| item).collect()))
}

fn map_method(interp: &mut Interp<'_>, map: ConfigTree, name: &str, args: &[Value], span: Span) -> Result<Value> {
    match name {
        "size" => Ok(Value::Int(map.len() as i64)),
        "isEmpty" => Ok(Value::Bool(map.is_empty())),
        "containsKey" => {
            let [key] = args else {
                return Err(arity(name, "1", args, span));
            };
            Ok(Value::Bool(map.contains_key(&key.to_string())))
        }
        "keySet" => Ok(Value::List(map.into_keys().map(Value::String).collect())),
        "values" => Ok(Value::List(map.into_values().collect())),
        "get" => match args {
            [key] => Ok(map.get(&key.to_string()).cloned().unwrap_or(Value::Null)),
            [key, default] => Ok(map.get(&key.to_string()).cloned().unwrap_or_else(|| default.clone())),
            _ => Err(arity(name, "1 or 2", args, span)),
        },
        "collect" | "each" => {
            let closure = closure_arg(name, args, span)?;
            let two_params = closure.params().len() == 2;
            let mut results = Vec::with_capacity(map.len());
            for (key, value) in &map {
                let call_args = if two_params {
                    vec![Value::String(key.clone()), value.clone()]
                } else {
                    vec![ops::entry_value(key.clone(), value.clone())]
                };
                results.push(interp.invoke(closure, call_args)?);
            }
            Ok(if name == "each" { Value::Map(map) } else { Value::List(results) })
        }
        _ => Err(unknown(&Value::Map(map), name, span)),
    }
}
