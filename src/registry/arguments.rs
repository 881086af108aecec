//! Binding of call arguments against a tool's input schema.
//!
//! The conversion table:
//!
//! | declared type | accepted input                                   |
//! |---------------|--------------------------------------------------|
//! | `integer`     | integers, integral floats, integer strings       |
//! | `number`      | numbers, numeric strings                         |
//! | `boolean`     | booleans, `"true"`/`"false"`/`"1"`/`"0"`, `1`/`0` |
//! | `string`      | strings, numbers and booleans (stringified)      |
//! | `array`       | arrays                                           |
//! | `object`      | objects                                          |
//! | `null`        | `null`                                           |
//!
//! A property may declare several types; the first that accepts the value
//! wins. `enum` membership is checked after conversion.

use serde_json::{Map, Number, Value};

use crate::error::McpError;

/// Arguments passed to a handler.
pub type Arguments = Map<String, Value>;

/// Validates and converts `arguments` against `schema`.
///
/// Missing required properties are rejected, absent optional properties with
/// a `default` receive it, and properties not in the schema pass through.
///
/// # Errors
///
/// Returns Invalid Params when a required argument is missing or a value
/// cannot be converted to its declared type.
pub fn bind(schema: &Value, mut arguments: Arguments) -> Result<Arguments, McpError> {
    if let Some(required) = schema.get("required").and_then(Value::as_array) {
        if let Some(missing) = required
            .iter()
            .filter_map(Value::as_str)
            .find(|name| !arguments.contains_key(*name))
        {
            return Err(McpError::InvalidParams(format!(
                "Missing required argument '{missing}'"
            )));
        }
    }

    let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
        return Ok(arguments);
    };

    for (name, property) in properties {
        match arguments.remove(name) {
            Some(value) => {
                let converted = convert(name, value, property)?;
                arguments.insert(name.clone(), converted);
            }
            None => {
                if let Some(default) = property.get("default") {
                    arguments.insert(name.clone(), default.clone());
                }
            }
        }
    }

    Ok(arguments)
}

/// Checks that every required prompt argument is present.
///
/// # Errors
///
/// Returns Invalid Params naming the first missing argument.
pub fn require<'a>(
    required: impl IntoIterator<Item = &'a str>,
    arguments: &Arguments,
) -> Result<(), McpError> {
    match required.into_iter().find(|name| !arguments.contains_key(*name)) {
        Some(missing) => Err(McpError::InvalidParams(format!(
            "Missing required argument '{missing}'"
        ))),
        None => Ok(()),
    }
}

fn convert(name: &str, value: Value, property: &Value) -> Result<Value, McpError> {
    let types: Vec<&str> = match property.get("type") {
        Some(Value::String(single)) => vec![single.as_str()],
        Some(Value::Array(many)) => many.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    };

    let converted = if types.is_empty() {
        value
    } else {
        types
            .iter()
            .find_map(|ty| convert_to(ty, &value))
            .ok_or_else(|| {
                McpError::InvalidParams(format!(
                    "Invalid value for argument '{name}': expected {}",
                    types.join(" or ")
                ))
            })?
    };

    if let Some(allowed) = property.get("enum").and_then(Value::as_array) {
        if !allowed.contains(&converted) {
            let options: Vec<String> = allowed.iter().map(Value::to_string).collect();
            return Err(McpError::InvalidParams(format!(
                "Invalid value for argument '{name}': must be one of {}",
                options.join(", ")
            )));
        }
    }

    Ok(converted)
}

fn convert_to(ty: &str, value: &Value) -> Option<Value> {
    match (ty, value) {
        ("integer", Value::Number(n)) => {
            if n.is_i64() || n.is_u64() {
                Some(value.clone())
            } else {
                n.as_f64()
                    .filter(|f| f.fract() == 0.0 && f.is_finite())
                    .and_then(float_to_i64)
                    .map(Value::from)
            }
        }
        ("integer", Value::String(s)) => s.trim().parse::<i64>().ok().map(Value::from),
        ("number", Value::Number(_))
        | ("boolean", Value::Bool(_))
        | ("string", Value::String(_))
        | ("array", Value::Array(_))
        | ("object", Value::Object(_))
        | ("null", Value::Null) => Some(value.clone()),
        ("number", Value::String(s)) => {
            let s = s.trim();
            s.parse::<i64>().map(Value::from).ok().or_else(|| {
                s.parse::<f64>()
                    .ok()
                    .and_then(Number::from_f64)
                    .map(Value::Number)
            })
        }
        ("boolean", Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Some(Value::Bool(true)),
            "false" | "0" => Some(Value::Bool(false)),
            _ => None,
        },
        ("boolean", Value::Number(n)) => match n.as_i64() {
            Some(1) => Some(Value::Bool(true)),
            Some(0) => Some(Value::Bool(false)),
            _ => None,
        },
        ("string", Value::Number(n)) => Some(Value::String(n.to_string())),
        ("string", Value::Bool(b)) => Some(Value::String(b.to_string())),
        _ => None,
    }
}

#[allow(clippy::cast_possible_truncation)] // range checked before the cast
fn float_to_i64(f: f64) -> Option<i64> {
    const LIMIT: f64 = 9_223_372_036_854_775_807.0;
    (f.abs() < LIMIT).then(|| f as i64)
}
