/// Built-in filter functions — dispatcher to category sub-modules.
mod collections;
mod convert;
mod date;
mod math;
mod predicates;
mod strings;

use crate::error::Error;
use crate::value::Value;

pub(crate) fn apply(name: &str, input: &Value, args: &[Value]) -> Result<Value, Error> {
    match name {
        // Numeric transforms
        "inc" | "dec" | "double" | "square" | "add" | "sub" | "mul" | "div" | "mod" | "neg"
        | "pow" | "rpow" | "sqrt" | "root" | "round" | "floor" | "ceil" | "abs" | "clamp"
        | "sign" | "log" | "exp" | "pct" => math::apply(name, input, args),

        // Predicates
        "even" | "odd" | "gt" | "lt" | "gte" | "lte" | "between" | "contains" | "in"
        | "type_is" | "is_empty" | "non_empty" => predicates::apply(name, input, args),

        // Conversions and null fallbacks
        "string" | "int" | "float" | "decimal" | "bool" | "quote" | "default" | "coalesce" => {
            convert::apply(name, input, args)
        }

        // String operations
        "lower" | "upper" | "title" | "strip" | "replace" | "split" | "join" | "startswith"
        | "endswith" | "matches" => strings::apply(name, input, args),

        // Collection operations
        "len" | "max" | "min" | "sum" | "avg" | "unique" | "sorted" | "first" | "last" | "pick"
        | "unpick" => collections::apply(name, input, args),

        // Datetime operations
        "to_datetime" | "timestamp" | "age_seconds" | "before" | "after" => {
            date::apply(name, input, args)
        }

        _ => Err(Error::operator(name, "unknown filter function")),
    }
}

// ---------------------------------------------------------------------------
// Shared argument helpers
// ---------------------------------------------------------------------------

pub(super) fn require_args(name: &str, args: &[Value], n: usize) -> Result<(), Error> {
    if args.len() < n {
        return Err(Error::operator(
            name,
            format!("expected {} argument(s), got {}", n, args.len()),
        ));
    }
    Ok(())
}

pub(super) fn num_arg(name: &str, args: &[Value], i: usize) -> Result<f64, Error> {
    require_args(name, args, i + 1)?;
    args[i].as_f64().ok_or_else(|| {
        Error::operator(
            name,
            format!("argument {} must be a number, got {}", i + 1, args[i].type_name()),
        )
    })
}

pub(super) fn str_arg<'a>(name: &str, args: &'a [Value], i: usize) -> Result<&'a str, Error> {
    require_args(name, args, i + 1)?;
    args[i].as_str().ok_or_else(|| {
        Error::operator(
            name,
            format!("argument {} must be a string, got {}", i + 1, args[i].type_name()),
        )
    })
}
