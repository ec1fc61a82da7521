/// Type conversions and null fallbacks.
use crate::error::Error;
use crate::value::Value;

use super::require_args;

pub(super) fn apply(name: &str, input: &Value, args: &[Value]) -> Result<Value, Error> {
    match name {
        "string" => Ok(Value::String(stringify(input))),
        "int" => Ok(to_int(input)),
        // The value model has a single float representation, so `decimal`
        // behaves as `float`.
        "float" | "decimal" => Ok(to_float(input)),
        "bool" => Ok(Value::Bool(to_bool(input))),
        "quote" => Ok(Value::String(format!("\"{}\"", stringify(input)))),
        "default" => {
            require_args(name, args, 1)?;
            if matches!(input, Value::Null) {
                Ok(args[0].clone())
            } else {
                Ok(input.clone())
            }
        }
        "coalesce" => {
            require_args(name, args, 1)?;
            if !matches!(input, Value::Null) {
                return Ok(input.clone());
            }
            Ok(args
                .iter()
                .find(|v| !matches!(v, Value::Null))
                .cloned()
                .unwrap_or(Value::Null))
        }
        _ => Err(Error::operator(name, "unknown filter function")),
    }
}

pub(super) fn stringify(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Int(n) => itoa::Buffer::new().format(*n).to_string(),
        Value::Double(f) => ryu::Buffer::new().format(*f).to_string(),
        Value::Bool(b) => if *b { "true" } else { "false" }.to_string(),
        Value::Null | Value::Undefined => "null".to_string(),
        Value::DateTime(ts) => ts.to_string(),
        Value::Array(_) | Value::Object(_) => {
            serde_json::Value::from(v.clone()).to_string()
        }
    }
}

fn to_int(v: &Value) -> Value {
    match v {
        Value::Int(_) => v.clone(),
        Value::Double(f) if f.is_finite() => Value::Int(*f as i64),
        Value::Bool(b) => Value::Int(*b as i64),
        Value::String(s) => {
            let s = s.trim();
            if let Ok(n) = s.parse::<i64>() {
                Value::Int(n)
            } else if let Ok(f) = s.parse::<f64>() {
                Value::Int(f as i64)
            } else {
                Value::Null
            }
        }
        Value::DateTime(ts) => Value::Int(ts.as_second()),
        _ => Value::Null,
    }
}

fn to_float(v: &Value) -> Value {
    match v {
        Value::Double(_) => v.clone(),
        Value::Int(n) => Value::Double(*n as f64),
        Value::Bool(b) => Value::Double(*b as i64 as f64),
        Value::String(s) => match s.trim().parse::<f64>() {
            Ok(f) => Value::Double(f),
            Err(_) => Value::Null,
        },
        Value::DateTime(ts) => Value::Double(
            ts.as_second() as f64 + ts.subsec_nanosecond() as f64 / 1_000_000_000.0,
        ),
        _ => Value::Null,
    }
}

/// Truthiness with string coercion: "true"/"1"/"yes"/"y"/"on" and
/// "false"/"0"/"no"/"n"/"off"/"" are recognized case-insensitively; any
/// other string is truthy by non-emptiness.
fn to_bool(v: &Value) -> bool {
    match v {
        Value::Null | Value::Undefined => false,
        Value::Bool(b) => *b,
        Value::Int(n) => *n != 0,
        Value::Double(f) => *f != 0.0,
        Value::String(s) => match s.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "y" | "on" => true,
            "false" | "0" | "no" | "n" | "off" | "" => false,
            _ => true,
        },
        Value::DateTime(_) => true,
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}
