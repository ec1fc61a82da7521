/// Predicate filters — every name here produces a boolean.
use crate::error::Error;
use crate::value::{Value, values_equal, values_order};

use super::{require_args, str_arg};
use std::cmp::Ordering;

pub(super) fn apply(name: &str, input: &Value, args: &[Value]) -> Result<Value, Error> {
    match name {
        "even" | "odd" => {
            let parity = match input {
                Value::Int(n) => Some(n.rem_euclid(2)),
                Value::Double(f) if f.fract() == 0.0 => Some((*f as i64).rem_euclid(2)),
                _ => None,
            };
            let want = if name == "even" { 0 } else { 1 };
            Ok(Value::Bool(parity == Some(want)))
        }
        "gt" | "lt" | "gte" | "lte" => {
            require_args(name, args, 1)?;
            let ord = values_order(input, &args[0]);
            let result = match (name, ord) {
                ("gt", Some(Ordering::Greater)) => true,
                ("lt", Some(Ordering::Less)) => true,
                ("gte", Some(Ordering::Greater | Ordering::Equal)) => true,
                ("lte", Some(Ordering::Less | Ordering::Equal)) => true,
                _ => false,
            };
            Ok(Value::Bool(result))
        }
        "between" => {
            require_args(name, args, 2)?;
            let lo = values_order(input, &args[0]);
            let hi = values_order(input, &args[1]);
            Ok(Value::Bool(
                matches!(lo, Some(Ordering::Greater | Ordering::Equal))
                    && matches!(hi, Some(Ordering::Less | Ordering::Equal)),
            ))
        }
        "contains" => {
            require_args(name, args, 1)?;
            Ok(Value::Bool(contains(input, &args[0])))
        }
        "in" => {
            require_args(name, args, 1)?;
            Ok(Value::Bool(contains(&args[0], input)))
        }
        "type_is" => {
            let want = str_arg(name, args, 0)?;
            Ok(Value::Bool(input.matches_type_name(want)))
        }
        "is_empty" => Ok(Value::Bool(input.is_empty_value())),
        "non_empty" => Ok(Value::Bool(!input.is_empty_value())),
        _ => Err(Error::operator(name, "unknown filter function")),
    }
}

/// Membership: substring for strings, element search for sequences, key
/// membership for mappings.
fn contains(container: &Value, needle: &Value) -> bool {
    match container {
        Value::String(s) => needle.as_str().is_some_and(|n| s.contains(n)),
        Value::Array(items) => items.iter().any(|el| values_equal(el, needle)),
        Value::Object(pairs) => needle
            .as_str()
            .is_some_and(|k| pairs.iter().any(|(ek, _)| ek == k)),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn f(name: &str, input: Value, args: &[Value]) -> Value {
        apply(name, &input, args).unwrap()
    }

    #[test]
    fn parity() {
        assert_eq!(f("even", Value::Int(4), &[]), Value::Bool(true));
        assert_eq!(f("odd", Value::Int(4), &[]), Value::Bool(false));
        assert_eq!(f("even", Value::Int(-3), &[]), Value::Bool(false));
        assert_eq!(f("odd", Value::Int(-3), &[]), Value::Bool(true));
        assert_eq!(f("even", Value::Double(2.0), &[]), Value::Bool(true));
        assert_eq!(f("even", Value::String("x".into()), &[]), Value::Bool(false));
    }

    #[test]
    fn comparisons() {
        assert_eq!(f("gt", Value::Int(3), &[Value::Int(2)]), Value::Bool(true));
        assert_eq!(f("lte", Value::Int(2), &[Value::Int(2)]), Value::Bool(true));
        assert_eq!(f("lt", Value::Int(3), &[Value::Int(2)]), Value::Bool(false));
    }

    #[test]
    fn comparison_across_types_is_false() {
        assert_eq!(
            f("gt", Value::String("3".into()), &[Value::Int(2)]),
            Value::Bool(false)
        );
    }

    #[test]
    fn between_is_inclusive() {
        assert_eq!(
            f("between", Value::Int(5), &[Value::Int(1), Value::Int(5)]),
            Value::Bool(true)
        );
        assert_eq!(
            f("between", Value::Int(6), &[Value::Int(1), Value::Int(5)]),
            Value::Bool(false)
        );
    }

    #[test]
    fn contains_per_shape() {
        assert_eq!(
            f(
                "contains",
                Value::String("hello".into()),
                &[Value::String("ell".into())]
            ),
            Value::Bool(true)
        );
        assert_eq!(
            f(
                "contains",
                Value::Array(vec![Value::Int(1), Value::Int(2)]),
                &[Value::Int(2)]
            ),
            Value::Bool(true)
        );
        assert_eq!(
            f(
                "contains",
                Value::Object(vec![("k".into(), Value::Null)]),
                &[Value::String("k".into())]
            ),
            Value::Bool(true)
        );
    }

    #[test]
    fn in_is_reversed_membership() {
        assert_eq!(
            f(
                "in",
                Value::Int(2),
                &[Value::Array(vec![Value::Int(1), Value::Int(2)])]
            ),
            Value::Bool(true)
        );
    }

    #[test]
    fn type_is_case_insensitive() {
        assert_eq!(
            f("type_is", Value::Int(1), &[Value::String("Int".into())]),
            Value::Bool(true)
        );
    }

    #[test]
    fn emptiness() {
        assert_eq!(f("is_empty", Value::Array(vec![]), &[]), Value::Bool(true));
        assert_eq!(f("is_empty", Value::Null, &[]), Value::Bool(true));
        assert_eq!(f("non_empty", Value::Int(0), &[]), Value::Bool(true));
    }
}
