/// Collection operations.
use crate::error::Error;
use crate::value::{Value, total_order, values_equal};

use super::{require_args, str_arg};

pub(super) fn apply(name: &str, input: &Value, args: &[Value]) -> Result<Value, Error> {
    match name {
        "len" => Ok(match input {
            Value::String(s) => Value::Int(s.chars().count() as i64),
            Value::Array(a) => Value::Int(a.len() as i64),
            Value::Object(o) => Value::Int(o.len() as i64),
            Value::Null => Value::Int(0),
            _ => Value::Null,
        }),
        "max" | "min" => {
            let Value::Array(items) = input else {
                return Ok(input.clone());
            };
            let mut best: Option<&Value> = None;
            for el in items {
                best = Some(match best {
                    None => el,
                    Some(b) => {
                        let keep_new = if name == "max" {
                            total_order(el, b).is_gt()
                        } else {
                            total_order(el, b).is_lt()
                        };
                        if keep_new { el } else { b }
                    }
                });
            }
            Ok(best.cloned().unwrap_or(Value::Null))
        }
        "sum" => {
            let Value::Array(items) = input else {
                return Ok(input.clone());
            };
            let mut int_sum = 0i64;
            let mut float_sum = 0.0f64;
            let mut is_float = false;
            for el in items {
                match el {
                    Value::Int(n) => match int_sum.checked_add(*n) {
                        Some(s) if !is_float => int_sum = s,
                        _ => {
                            is_float = true;
                            float_sum += *n as f64;
                        }
                    },
                    Value::Double(f) => {
                        is_float = true;
                        float_sum += f;
                    }
                    _ => {}
                }
            }
            if is_float {
                Ok(Value::Double(float_sum + int_sum as f64))
            } else {
                Ok(Value::Int(int_sum))
            }
        }
        "avg" => {
            let Value::Array(items) = input else {
                return Ok(input.clone());
            };
            let nums: Vec<f64> = items.iter().filter_map(Value::as_f64).collect();
            if nums.is_empty() {
                return Ok(Value::Null);
            }
            Ok(Value::Double(nums.iter().sum::<f64>() / nums.len() as f64))
        }
        "unique" => {
            let Value::Array(items) = input else {
                return Ok(input.clone());
            };
            let mut seen: Vec<&Value> = Vec::new();
            let mut out = Vec::new();
            for el in items {
                if !seen.iter().any(|s| values_equal(s, el)) {
                    seen.push(el);
                    out.push(el.clone());
                }
            }
            Ok(Value::Array(out))
        }
        "sorted" => {
            let Value::Array(items) = input else {
                return Ok(input.clone());
            };
            let reverse = matches!(args.first(), Some(Value::Bool(true)));
            let mut out = items.clone();
            out.sort_by(total_order);
            if reverse {
                out.reverse();
            }
            Ok(Value::Array(out))
        }
        "first" => Ok(match input {
            Value::Array(items) => items.first().cloned().unwrap_or(Value::Null),
            other => other.clone(),
        }),
        "last" => Ok(match input {
            Value::Array(items) => items.last().cloned().unwrap_or(Value::Null),
            other => other.clone(),
        }),
        "pick" => {
            require_args(name, args, 1)?;
            let keys = arg_keys(name, args)?;
            let Value::Object(pairs) = input else {
                return Ok(input.clone());
            };
            Ok(Value::Object(
                pairs
                    .iter()
                    .filter(|(k, _)| keys.contains(&k.as_str()))
                    .cloned()
                    .collect(),
            ))
        }
        "unpick" => {
            require_args(name, args, 1)?;
            let keys = arg_keys(name, args)?;
            let Value::Object(pairs) = input else {
                return Ok(input.clone());
            };
            Ok(Value::Object(
                pairs
                    .iter()
                    .filter(|(k, _)| !keys.contains(&k.as_str()))
                    .cloned()
                    .collect(),
            ))
        }
        _ => Err(Error::operator(name, "unknown filter function")),
    }
}

fn arg_keys<'a>(name: &str, args: &'a [Value]) -> Result<Vec<&'a str>, Error> {
    (0..args.len())
        .map(|i| str_arg(name, args, i))
        .collect()
}
