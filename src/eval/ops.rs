use std::cmp::Ordering;

use regex::Regex;

use crate::ast::{BinaryOp, UnaryOp};
use crate::error::{ConfigError, Result, Span};
use crate::value::Value;

/// Ranges, repetitions and grown lists larger than this are refused rather than materialised.
pub(crate) const MAX_COLLECTION_LEN: usize = 1_000_000;

/// Length of a value about to be built, refused past [`MAX_COLLECTION_LEN`].
pub(crate) fn checked_len(len: Option<usize>, what: &str, span: Span) -> Result<usize> {
    match len {
        Some(len) if len <= MAX_COLLECTION_LEN => Ok(len),
        _ => Err(ConfigError::eval(
            format!("{} would exceed {} elements", what, MAX_COLLECTION_LEN),
            span,
            505,
        )),
    }
}

fn type_error(op: BinaryOp, left: &Value, right: &Value, span: Span) -> ConfigError {
    ConfigError::eval(
        format!(
            "Cannot apply '{}' to {} and {}",
            op.symbol(),
            left.type_name(),
            right.type_name()
        ),
        span,
        502,
    )
}

/// Every binary operator except the short-circuiting `&&` and `||`.
pub(crate) fn binary(op: BinaryOp, left: Value, right: Value, span: Span) -> Result<Value> {
    match op {
        BinaryOp::Add => add(left, right, span),
        BinaryOp::Sub => subtract(left, right, span),
        BinaryOp::Mul => multiply(left, right, span),
        BinaryOp::Div => divide(left, right, span),
        BinaryOp::Rem => remainder(left, right, span),
        BinaryOp::Pow => power(left, right, span),
        BinaryOp::Shl | BinaryOp::Shr | BinaryOp::UShr => shift(op, left, right, span),
        BinaryOp::Range | BinaryOp::RangeExclusive => range(op, left, right, span),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            let ordering = compare(&left, &right).ok_or_else(|| type_error(op, &left, &right, span))?;
            Ok(Value::Bool(match op {
                BinaryOp::Lt => ordering == Ordering::Less,
                BinaryOp::Le => ordering != Ordering::Greater,
                BinaryOp::Gt => ordering == Ordering::Greater,
                _ => ordering != Ordering::Less,
            }))
        }
        BinaryOp::Compare => {
            let ordering = compare(&left, &right).ok_or_else(|| type_error(op, &left, &right, span))?;
            Ok(Value::Int(ordering as i64))
        }
        BinaryOp::Eq => Ok(Value::Bool(values_equal(&left, &right))),
        BinaryOp::Ne => Ok(Value::Bool(!values_equal(&left, &right))),
        BinaryOp::In => contains(&right, &left)
            .map(Value::Bool)
            .ok_or_else(|| type_error(op, &left, &right, span)),
        BinaryOp::RegexFind | BinaryOp::RegexMatch => regex_match(op, &left, &right, span),
        BinaryOp::BitAnd | BinaryOp::BitXor | BinaryOp::BitOr => bitwise(op, left, right, span),
        BinaryOp::And => Ok(Value::Bool(left.is_truthy() && right.is_truthy())),
        BinaryOp::Or => Ok(Value::Bool(left.is_truthy() || right.is_truthy())),
    }
}

pub(crate) fn unary(op: UnaryOp, value: Value, span: Span) -> Result<Value> {
    match (op, value) {
        (UnaryOp::Not, value) => Ok(Value::Bool(!value.is_truthy())),
        (UnaryOp::Neg, Value::Int(n)) => n
            .checked_neg()
            .map(Value::Int)
            .ok_or_else(|| ConfigError::eval("Integer overflow", span, 503)),
        (UnaryOp::Neg, Value::Float(f)) => Ok(Value::Float(-f)),
        (UnaryOp::Plus, value @ (Value::Int(_) | Value::Float(_))) => Ok(value),
        (UnaryOp::BitNot, Value::Int(n)) => Ok(Value::Int(!n)),
        (op, value) => Err(ConfigError::eval(
            format!("Cannot apply unary {:?} to {}", op, value.type_name()),
            span,
            502,
        )),
    }
}

fn overflow(span: Span) -> ConfigError {
    ConfigError::eval("Integer overflow", span, 503)
}

fn add(left: Value, right: Value, span: Span) -> Result<Value> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => a.checked_add(b).map(Value::Int).ok_or_else(|| overflow(span)),
        (Value::String(a), b) => Ok(Value::String(format!("{}{}", a, b))),
        (a, Value::String(b)) if !matches!(a, Value::List(_) | Value::Map(_)) => {
            Ok(Value::String(format!("{}{}", a, b)))
        }
        (Value::List(mut a), Value::List(b)) => {
            a.extend(b);
            Ok(Value::List(a))
        }
        (Value::List(mut a), b) => {
            a.push(b);
            Ok(Value::List(a))
        }
        (Value::Map(mut a), Value::Map(b)) => {
            a.extend(b);
            Ok(Value::Map(a))
        }
        (a, b) => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => Ok(Value::Float(x + y)),
            _ => Err(type_error(BinaryOp::Add, &a, &b, span)),
        },
    }
}

fn subtract(left: Value, right: Value, span: Span) -> Result<Value> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => a.checked_sub(b).map(Value::Int).ok_or_else(|| overflow(span)),
        (Value::List(a), Value::List(b)) => Ok(Value::List(
            a.into_iter().filter(|item| !b.iter().any(|r| values_equal(item, r))).collect(),
        )),
        (Value::List(a), b) => Ok(Value::List(a.into_iter().filter(|item| !values_equal(item, &b)).collect())),
        (Value::Map(mut a), Value::Map(b)) => {
            a.retain(|key, value| b.get(key).is_none_or(|other| !values_equal(value, other)));
            Ok(Value::Map(a))
        }
        (a, b) => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => Ok(Value::Float(x - y)),
            _ => Err(type_error(BinaryOp::Sub, &a, &b, span)),
        },
    }
}

fn repeat_count(n: i64, span: Span) -> Result<usize> {
    usize::try_from(n).map_err(|_| ConfigError::eval("Repeat count must not be negative", span, 502))
}

fn multiply(left: Value, right: Value, span: Span) -> Result<Value> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => a.checked_mul(b).map(Value::Int).ok_or_else(|| overflow(span)),
        (Value::String(s), Value::Int(n)) => {
            let count = repeat_count(n, span)?;
            checked_len(s.len().checked_mul(count), "Repeated string", span)?;
            Ok(Value::String(s.repeat(count)))
        }
        (Value::List(items), Value::Int(n)) => {
            let count = repeat_count(n, span)?;
            let len = checked_len(items.len().checked_mul(count), "Repeated list", span)?;
            let mut out = Vec::with_capacity(len);
            for _ in 0..count {
                out.extend(items.iter().cloned());
            }
            Ok(Value::List(out))
        }
        (a, b) => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => Ok(Value::Float(x * y)),
            _ => Err(type_error(BinaryOp::Mul, &a, &b, span)),
        },
    }
}

fn division_by_zero(span: Span) -> ConfigError {
    ConfigError::eval("Division by zero", span, 504)
}

/// Integer division stays integral only when exact: `6 / 3` is 2, `7 / 2` is 3.5.
fn divide(left: Value, right: Value, span: Span) -> Result<Value> {
    match (&left, &right) {
        (Value::Int(_), Value::Int(0)) => Err(division_by_zero(span)),
        (Value::Int(a), Value::Int(b)) if a.checked_rem(*b) == Some(0) => {
            a.checked_div(*b).map(Value::Int).ok_or_else(|| overflow(span))
        }
        _ => match (left.as_f64(), right.as_f64()) {
            (Some(_), Some(y)) if y == 0.0 => Err(division_by_zero(span)),
            (Some(x), Some(y)) => Ok(Value::Float(x / y)),
            _ => Err(type_error(BinaryOp::Div, &left, &right, span)),
        },
    }
}

fn remainder(left: Value, right: Value, span: Span) -> Result<Value> {
    match (&left, &right) {
        (Value::Int(_), Value::Int(0)) => Err(division_by_zero(span)),
        (Value::Int(a), Value::Int(b)) => a.checked_rem(*b).map(Value::Int).ok_or_else(|| overflow(span)),
        _ => match (left.as_f64(), right.as_f64()) {
            (Some(_), Some(y)) if y == 0.0 => Err(division_by_zero(span)),
            (Some(x), Some(y)) => Ok(Value::Float(x % y)),
            _ => Err(type_error(BinaryOp::Rem, &left, &right, span)),
        },
    }
}

fn power(left: Value, right: Value, span: Span) -> Result<Value> {
    match (&left, &right) {
        (Value::Int(a), Value::Int(b)) if *b >= 0 => {
            let exp = u32::try_from(*b).map_err(|_| overflow(span))?;
            a.checked_pow(exp).map(Value::Int).ok_or_else(|| overflow(span))
        }
        _ => match (left.as_f64(), right.as_f64()) {
            (Some(x), Some(y)) => Ok(Value::Float(x.powf(y))),
            _ => Err(type_error(BinaryOp::Pow, &left, &right, span)),
        },
    }
}

fn shift(op: BinaryOp, left: Value, right: Value, span: Span) -> Result<Value> {
    let (Value::Int(a), Value::Int(b)) = (&left, &right) else {
        return Err(type_error(op, &left, &right, span));
    };
    let by = (*b & 63) as u32;
    Ok(Value::Int(match op {
        BinaryOp::Shl => a.wrapping_shl(by),
        BinaryOp::Shr => a.wrapping_shr(by),
        _ => ((*a as u64) >> by) as i64,
    }))
}

/// `a..b` and `a..<b` over integers, counting down when `a > b`.
fn range(op: BinaryOp, left: Value, right: Value, span: Span) -> Result<Value> {
    let (Value::Int(from), Value::Int(to)) = (&left, &right) else {
        return Err(type_error(op, &left, &right, span));
    };
    let (from, to) = (*from, *to);
    let exclusive = op == BinaryOp::RangeExclusive;

    if from.abs_diff(to) >= MAX_COLLECTION_LEN as u64 {
        return Err(ConfigError::eval(
            format!("Range {}..{} is too large", from, to),
            span,
            505,
        ));
    }

    let items: Vec<Value> = match (from <= to, exclusive) {
        (true, false) => (from..=to).map(Value::Int).collect(),
        (true, true) => (from..to).map(Value::Int).collect(),
        (false, false) => (to..=from).rev().map(Value::Int).collect(),
        (false, true) => ((to + 1)..=from).rev().map(Value::Int).collect(),
    };
    Ok(Value::List(items))
}

fn bitwise(op: BinaryOp, left: Value, right: Value, span: Span) -> Result<Value> {
    match (&left, &right) {
        (Value::Int(a), Value::Int(b)) => Ok(Value::Int(match op {
            BinaryOp::BitAnd => a & b,
            BinaryOp::BitXor => a ^ b,
            _ => a | b,
        })),
        (Value::Bool(a), Value::Bool(b)) => Ok(Value::Bool(match op {
            BinaryOp::BitAnd => a & b,
            BinaryOp::BitXor => a ^ b,
            _ => a | b,
        })),
        _ => Err(type_error(op, &left, &right, span)),
    }
}

fn regex_match(op: BinaryOp, left: &Value, right: &Value, span: Span) -> Result<Value> {
    let (Some(text), Some(pattern)) = (left.as_str(), right.as_str()) else {
        return Err(type_error(op, left, right, span));
    };
    let pattern = if op == BinaryOp::RegexMatch {
        format!("^(?:{})$", pattern)
    } else {
        pattern.to_string()
    };
    let regex = Regex::new(&pattern).map_err(|e| {
        ConfigError::eval(format!("Invalid regular expression: {}", e), span, 507)
    })?;
    Ok(Value::Bool(regex.is_match(text)))
}

/// Equality with numeric coercion, so `1 == 1.0`.
pub(crate) fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Int(_), Value::Float(_)) | (Value::Float(_), Value::Int(_)) => left.as_f64() == right.as_f64(),
        (Value::List(a), Value::List(b)) => a.len() == b.len() && a.iter().zip(b).all(|(x, y)| values_equal(x, y)),
        (Value::Map(a), Value::Map(b)) => {
            a.len() == b.len() && a.iter().all(|(k, v)| b.get(k).is_some_and(|w| values_equal(v, w)))
        }
        _ => left == right,
    }
}

/// Ordering for comparable pairs; null sorts before everything else.
pub(crate) fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        (Value::Null, _) => Some(Ordering::Less),
        (_, Value::Null) => Some(Ordering::Greater),
        (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => left.as_f64()?.partial_cmp(&right.as_f64()?),
    }
}

/// Membership for `in` and `contains`.
pub(crate) fn contains(container: &Value, item: &Value) -> Option<bool> {
    match container {
        Value::List(items) => Some(items.iter().any(|v| values_equal(v, item))),
        Value::Map(map) => Some(map.contains_key(&item.to_string())),
        Value::String(s) => item.as_str().map(|needle| s.contains(needle)),
        Value::Null => Some(false),
        _ => None,
    }
}

fn simple_type_name(ty: &str) -> &str {
    ty.strip_prefix("java.lang.")
        .or_else(|| ty.strip_prefix("java.util."))
        .or_else(|| ty.strip_prefix("groovy.lang."))
        .unwrap_or(ty)
}

/// `value as Type` and `(Type) value`.
pub(crate) fn cast(value: Value, ty: &str, span: Span) -> Result<Value> {
    let ty = simple_type_name(ty);
    if value.is_null() {
        return Ok(if ty == "boolean" { Value::Bool(false) } else { Value::Null });
    }

    let failed = |value: &Value| {
        ConfigError::eval(
            format!("Cannot cast {} '{}' to {}", value.type_name(), value, ty),
            span,
            508,
        )
    };

    match ty {
        "Object" | "def" => Ok(value),
        "String" | "GString" | "CharSequence" => Ok(Value::String(value.to_string())),
        "int" | "Integer" | "long" | "Long" | "short" | "Short" | "byte" | "Byte" | "BigInteger" => match &value {
            Value::Int(_) => Ok(value),
            Value::Float(f) if f.is_finite() => Ok(Value::Int(f.trunc() as i64)),
            Value::String(s) => s.trim().parse::<i64>().map(Value::Int).map_err(|_| failed(&value)),
            _ => Err(failed(&value)),
        },
        "float" | "Float" | "double" | "Double" | "BigDecimal" => match &value {
            Value::Int(n) => Ok(Value::Float(*n as f64)),
            Value::Float(_) => Ok(value),
            Value::String(s) => s.trim().parse::<f64>().map(Value::Float).map_err(|_| failed(&value)),
            _ => Err(failed(&value)),
        },
        "Number" => match &value {
            Value::Int(_) | Value::Float(_) => Ok(value),
            Value::String(s) => {
                let s = s.trim();
                s.parse::<i64>()
                    .map(Value::Int)
                    .or_else(|_| s.parse::<f64>().map(Value::Float))
                    .map_err(|_| failed(&value))
            }
            _ => Err(failed(&value)),
        },
        "boolean" | "Boolean" => Ok(Value::Bool(value.is_truthy())),
        "Map" | "LinkedHashMap" | "HashMap" => match value {
            Value::Map(_) => Ok(value),
            other => Err(failed(&other)),
        },
        "Closure" => match value {
            Value::Closure(_) => Ok(value),
            other => Err(failed(&other)),
        },
        ty if is_list_type(ty) => match value {
            Value::List(_) => Ok(value),
            Value::String(s) => Ok(Value::List(s.chars().map(|c| Value::String(c.to_string())).collect())),
            Value::Map(map) => Ok(Value::List(map.into_iter().map(|(k, v)| entry_value(k, v)).collect())),
            other => Ok(Value::List(vec![other])),
        },
        _ => Err(ConfigError::eval(
            format!("Unsupported cast target type '{}'", ty),
            span,
            509,
        )),
    }
}

fn is_list_type(ty: &str) -> bool {
    matches!(ty, "List" | "ArrayList" | "Collection" | "Set" | "LinkedHashSet") || ty.ends_with("[]")
}

/// `{key: k, value: v}`, the shape of a map entry seen by closures.
pub(crate) fn entry_value(key: String, value: Value) -> Value {
    let mut entry = crate::value::ConfigTree::new();
    entry.insert("key".into(), Value::String(key));
    entry.insert("value".into(), value);
    Value::Map(entry)
}

pub(crate) fn instance_of(value: &Value, ty: &str) -> bool {
    let ty = simple_type_name(ty);
    match value {
        Value::Null => false,
        _ if ty == "Object" => true,
        Value::Bool(_) => matches!(ty, "Boolean" | "boolean"),
        Value::Int(_) => matches!(ty, "Integer" | "int" | "Long" | "long" | "Number"),
        Value::Float(_) => matches!(ty, "Double" | "double" | "Float" | "float" | "BigDecimal" | "Number"),
        Value::String(_) => matches!(ty, "String" | "CharSequence" | "GString"),
        Value::List(_) => matches!(ty, "List" | "ArrayList" | "Collection"),
        Value::Map(_) => matches!(ty, "Map" | "LinkedHashMap" | "HashMap"),
        Value::Closure(_) => ty == "Closure",
    }
}
