/// Numeric transforms. Non-numeric inputs pass through unchanged; operations
/// without a defined result (division by zero, sqrt of a negative, log of a
/// non-positive) produce null.
use crate::error::Error;
use crate::value::Value;

use super::num_arg;

pub(super) fn apply(name: &str, input: &Value, args: &[Value]) -> Result<Value, Error> {
    if input.as_f64().is_none() {
        // Validate arguments even when the input passes through.
        arg_check(name, args)?;
        return Ok(input.clone());
    }
    match name {
        "inc" => Ok(int_preserving(input, args, |n, _| n.checked_add(1), |x, _| x + 1.0)),
        "dec" => Ok(int_preserving(input, args, |n, _| n.checked_sub(1), |x, _| x - 1.0)),
        "double" => Ok(int_preserving(input, args, |n, _| n.checked_mul(2), |x, _| x * 2.0)),
        "square" => Ok(int_preserving(input, args, |n, _| n.checked_mul(n), |x, _| x * x)),
        "neg" => Ok(int_preserving(input, args, |n, _| n.checked_neg(), |x, _| -x)),
        "abs" => Ok(int_preserving(input, args, |n, _| n.checked_abs(), |x, _| x.abs())),
        "add" => {
            num_arg(name, args, 0)?;
            Ok(int_preserving(input, args, |n, a| n.checked_add(a?), |x, a| x + a))
        }
        "sub" => {
            num_arg(name, args, 0)?;
            Ok(int_preserving(input, args, |n, a| n.checked_sub(a?), |x, a| x - a))
        }
        "mul" => {
            num_arg(name, args, 0)?;
            Ok(int_preserving(input, args, |n, a| n.checked_mul(a?), |x, a| x * a))
        }
        "div" => {
            let d = num_arg(name, args, 0)?;
            if d == 0.0 {
                return Ok(Value::Null);
            }
            let x = input.as_f64().unwrap_or(0.0);
            Ok(narrow(x / d))
        }
        "mod" => {
            let d = num_arg(name, args, 0)?;
            if d == 0.0 {
                return Ok(Value::Null);
            }
            // Python-style modulo: the result takes the divisor's sign.
            if let (Value::Int(n), Some(Value::Int(m))) = (input, args.first()) {
                return Ok(Value::Int(python_mod(*n, *m)));
            }
            let x = input.as_f64().unwrap_or(0.0);
            Ok(narrow(x - d * (x / d).floor()))
        }
        "pow" => {
            let e = num_arg(name, args, 0)?;
            let x = input.as_f64().unwrap_or(0.0);
            Ok(narrow_or_null(x.powf(e)))
        }
        "rpow" => {
            let b = num_arg(name, args, 0)?;
            let x = input.as_f64().unwrap_or(0.0);
            Ok(narrow_or_null(b.powf(x)))
        }
        "sqrt" => {
            let x = input.as_f64().unwrap_or(0.0);
            if x < 0.0 {
                return Ok(Value::Null);
            }
            Ok(Value::Double(x.sqrt()))
        }
        "root" => {
            let d = num_arg(name, args, 0)?;
            let x = input.as_f64().unwrap_or(0.0);
            if d == 0.0 || x < 0.0 {
                return Ok(Value::Null);
            }
            Ok(Value::Double(x.powf(1.0 / d)))
        }
        "round" => {
            let digits = match args.first() {
                Some(v) => v.as_f64().ok_or_else(|| {
                    Error::operator(name, "argument 1 must be a number")
                })? as i32,
                None => 0,
            };
            let x = input.as_f64().unwrap_or(0.0);
            let m = 10f64.powi(digits);
            let rounded = (x * m).round() / m;
            if digits <= 0 {
                Ok(narrow(rounded))
            } else {
                Ok(Value::Double(rounded))
            }
        }
        "floor" => Ok(narrow(input.as_f64().unwrap_or(0.0).floor())),
        "ceil" => Ok(narrow(input.as_f64().unwrap_or(0.0).ceil())),
        "clamp" => {
            let lo = num_arg(name, args, 0)?;
            let hi = num_arg(name, args, 1)?;
            if let (Value::Int(n), Some(l), Some(h)) =
                (input, args[0].as_i64(), args[1].as_i64())
            {
                return Ok(Value::Int((*n).clamp(l, h)));
            }
            Ok(narrow(input.as_f64().unwrap_or(0.0).clamp(lo, hi)))
        }
        "sign" => {
            let x = input.as_f64().unwrap_or(0.0);
            Ok(Value::Int(if x > 0.0 {
                1
            } else if x < 0.0 {
                -1
            } else {
                0
            }))
        }
        "log" => {
            let x = input.as_f64().unwrap_or(0.0);
            if x <= 0.0 {
                return Ok(Value::Null);
            }
            match args.first() {
                None => Ok(Value::Double(x.ln())),
                Some(b) => {
                    let base = b
                        .as_f64()
                        .ok_or_else(|| Error::operator(name, "argument 1 must be a number"))?;
                    if base <= 0.0 || base == 1.0 {
                        return Ok(Value::Null);
                    }
                    Ok(Value::Double(x.ln() / base.ln()))
                }
            }
        }
        "exp" => Ok(Value::Double(input.as_f64().unwrap_or(0.0).exp())),
        "pct" => {
            let p = num_arg(name, args, 0)?;
            let x = input.as_f64().unwrap_or(0.0);
            Ok(narrow(x * p / 100.0))
        }
        _ => Err(Error::operator(name, "unknown filter function")),
    }
}

/// Validate required arguments for names that take them, so bad calls fail
/// even when a non-numeric input would otherwise pass straight through.
fn arg_check(name: &str, args: &[Value]) -> Result<(), Error> {
    match name {
        "add" | "sub" | "mul" | "div" | "mod" | "pow" | "rpow" | "root" | "pct" => {
            num_arg(name, args, 0).map(|_| ())
        }
        "clamp" => {
            num_arg(name, args, 0)?;
            num_arg(name, args, 1).map(|_| ())
        }
        _ => Ok(()),
    }
}

/// Apply an integer op when both operands are integers (falling back to the
/// float path on overflow), otherwise the float op.
fn int_preserving(
    input: &Value,
    args: &[Value],
    int_op: impl Fn(i64, Option<i64>) -> Option<i64>,
    f_op: impl Fn(f64, f64) -> f64,
) -> Value {
    let arg_f = args.first().and_then(Value::as_f64).unwrap_or(0.0);
    match input {
        Value::Int(n) => {
            let arg_i = match args.first() {
                Some(v) => match v.as_i64() {
                    Some(i) => Some(i),
                    None => {
                        // Float argument: compute in floats.
                        return Value::Double(f_op(*n as f64, arg_f));
                    }
                },
                None => None,
            };
            match int_op(*n, arg_i) {
                Some(out) => Value::Int(out),
                None => Value::Double(f_op(*n as f64, arg_f)),
            }
        }
        Value::Double(f) => Value::Double(f_op(*f, arg_f)),
        other => other.clone(),
    }
}

/// Narrow an integral float back to `Int`. Uses strict `<` for the upper
/// bound: `i64::MAX as f64` rounds up to 2^63, which doesn't fit.
fn narrow(f: f64) -> Value {
    if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Value::Int(f as i64)
    } else {
        Value::Double(f)
    }
}

fn narrow_or_null(f: f64) -> Value {
    if f.is_nan() {
        Value::Null
    } else {
        narrow(f)
    }
}

/// `-7 mod 3 == 2`, `7 mod -3 == -2`.
fn python_mod(n: i64, m: i64) -> i64 {
    let r = n % m;
    if r != 0 && (r < 0) != (m < 0) { r + m } else { r }
}
