// Author: Dustin Pilgrim
// License: MIT

use indexmap::IndexMap;

use crate::error::ConfigError;
use crate::value::Value;

fn mismatch(expected: &str, value: &Value, hint: &str, code: u32) -> ConfigError {
    ConfigError::Conversion {
        message: format!("Expected {}, got {} '{}'", expected, value.type_name(), value),
        path: String::new(),
        hint: Some(hint.into()),
        code: Some(code),
    }
}

fn out_of_range(value: &Value, target: &str) -> ConfigError {
    ConfigError::Conversion {
        message: format!("Number {} out of range for {}", value, target),
        path: String::new(),
        hint: Some(format!("Use a value that fits in {}", target)),
        code: Some(407),
    }
}

impl TryFrom<Value> for String {
    type Error = ConfigError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::String(s) => Ok(s),
            Value::Closure(closure) => Ok(closure.render_as_text()),
            other => Err(mismatch("string", &other, "Use a string value in your config", 401)),
        }
    }
}

impl TryFrom<Value> for bool {
    type Error = ConfigError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Bool(b) => Ok(b),
            other => Err(mismatch("boolean", &other, "Use true or false", 403)),
        }
    }
}

impl TryFrom<Value> for f64 {
    type Error = ConfigError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Int(n) => Ok(n as f64),
            Value::Float(x) => Ok(x),
            other => Err(mismatch("number", &other, "Use a number value in your config", 402)),
        }
    }
}

impl TryFrom<Value> for i64 {
    type Error = ConfigError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Int(n) => Ok(n),
            Value::Float(x) if x.fract() == 0.0 && x >= i64::MIN as f64 && x < i64::MAX as f64 => Ok(x as i64),
            Value::Float(_) => Err(mismatch("integer", &value, "Use a whole number", 402)),
            other => Err(mismatch("integer", &other, "Use a number value in your config", 402)),
        }
    }
}

impl TryFrom<Value> for u64 {
    type Error = ConfigError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let n = i64::try_from(value.clone())?;
        u64::try_from(n).map_err(|_| out_of_range(&value, "u64"))
    }
}

impl TryFrom<Value> for u32 {
    type Error = ConfigError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let n = i64::try_from(value.clone())?;
        u32::try_from(n).map_err(|_| out_of_range(&value, "u32"))
    }
}

impl TryFrom<Value> for i32 {
    type Error = ConfigError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let n = i64::try_from(value.clone())?;
        i32::try_from(n).map_err(|_| out_of_range(&value, "i32"))
    }
}

impl TryFrom<Value> for u16 {
    type Error = ConfigError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let n = i64::try_from(value.clone())?;
        u16::try_from(n).map_err(|_| out_of_range(&value, "u16"))
    }
}

impl<T> TryFrom<Value> for Vec<T>
where
    T: TryFrom<Value, Error = ConfigError>,
{
    type Error = ConfigError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::List(items) => items.into_iter().map(T::try_from).collect(),
            other => Err(mismatch("list", &other, "Use a list like [a, b]", 405)),
        }
    }
}

impl TryFrom<Value> for IndexMap<String, Value> {
    type Error = ConfigError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Map(map) => Ok(map),
            other => Err(mismatch("block or map", &other, "Use a block or a map literal", 406)),
        }
    }
}
