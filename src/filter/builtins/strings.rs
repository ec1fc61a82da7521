/// String operations. Non-string inputs pass through unchanged, except the
/// boolean-valued tests which answer false.
use crate::error::Error;
use crate::value::Value;

use super::{convert::stringify, str_arg};

pub(super) fn apply(name: &str, input: &Value, args: &[Value]) -> Result<Value, Error> {
    match name {
        "lower" => Ok(map_str(input, |s| s.to_lowercase())),
        "upper" => Ok(map_str(input, |s| s.to_uppercase())),
        "title" => Ok(map_str(input, title_case)),
        "strip" => {
            let chars = match args.first() {
                None | Some(Value::Null) => None,
                Some(v) => Some(
                    v.as_str()
                        .ok_or_else(|| Error::operator(name, "argument 1 must be a string"))?,
                ),
            };
            Ok(map_str(input, |s| match chars {
                None => s.trim().to_string(),
                Some(set) => {
                    let set: Vec<char> = set.chars().collect();
                    s.trim_matches(|c| set.contains(&c)).to_string()
                }
            }))
        }
        "replace" => {
            let old = str_arg(name, args, 0)?;
            let new = str_arg(name, args, 1)?;
            Ok(map_str(input, |s| s.replace(old, new)))
        }
        "split" => {
            let Value::String(s) = input else {
                return Ok(input.clone());
            };
            let parts: Vec<Value> = match args.first() {
                None | Some(Value::Null) => s
                    .split_whitespace()
                    .map(|p| Value::String(p.into()))
                    .collect(),
                Some(sep) => {
                    let sep = sep
                        .as_str()
                        .ok_or_else(|| Error::operator(name, "argument 1 must be a string"))?;
                    if sep.is_empty() {
                        s.chars().map(|c| Value::String(c.to_string())).collect()
                    } else {
                        s.split(sep).map(|p| Value::String(p.into())).collect()
                    }
                }
            };
            Ok(Value::Array(parts))
        }
        "join" => {
            let sep = str_arg(name, args, 0)?;
            let Value::Array(items) = input else {
                return Ok(input.clone());
            };
            let parts: Vec<String> = items.iter().map(stringify).collect();
            Ok(Value::String(parts.join(sep)))
        }
        "startswith" => {
            let prefix = str_arg(name, args, 0)?;
            Ok(Value::Bool(
                input.as_str().is_some_and(|s| s.starts_with(prefix)),
            ))
        }
        "endswith" => {
            let suffix = str_arg(name, args, 0)?;
            Ok(Value::Bool(
                input.as_str().is_some_and(|s| s.ends_with(suffix)),
            ))
        }
        "matches" => {
            let pattern = str_arg(name, args, 0)?;
            let re = regex::Regex::new(pattern)
                .map_err(|e| Error::operator(name, format!("invalid regex: {e}")))?;
            Ok(Value::Bool(
                input.as_str().is_some_and(|s| re.is_match(s)),
            ))
        }
        _ => Err(Error::operator(name, "unknown filter function")),
    }
}

fn map_str(input: &Value, f: impl Fn(&str) -> String) -> Value {
    match input {
        Value::String(s) => Value::String(f(s)),
        other => other.clone(),
    }
}

fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;
    for c in s.chars() {
        if c.is_whitespace() {
            at_word_start = true;
            out.push(c);
        } else if at_word_start {
            out.extend(c.to_uppercase());
            at_word_start = false;
        } else {
            out.extend(c.to_lowercase());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn f(name: &str, input: &str, args: &[Value]) -> Value {
        apply(name, &Value::String(input.into()), args).unwrap()
    }

    #[test]
    fn case_mapping() {
        assert_eq!(f("lower", "HeLLo", &[]), Value::String("hello".into()));
        assert_eq!(f("upper", "hi", &[]), Value::String("HI".into()));
        assert_eq!(
            f("title", "hello wORLD", &[]),
            Value::String("Hello World".into())
        );
    }

    #[test]
    fn strip_whitespace_and_charset() {
        assert_eq!(f("strip", "  x  ", &[]), Value::String("x".into()));
        assert_eq!(
            f("strip", "--x--", &[Value::String("-".into())]),
            Value::String("x".into())
        );
    }

    #[test]
    fn replace() {
        assert_eq!(
            f(
                "replace",
                "a-b-c",
                &[Value::String("-".into()), Value::String(".".into())]
            ),
            Value::String("a.b.c".into())
        );
    }

    #[test]
    fn split_defaults_to_whitespace() {
        assert_eq!(
            f("split", "a b  c", &[]),
            Value::Array(vec![
                Value::String("a".into()),
                Value::String("b".into()),
                Value::String("c".into()),
            ])
        );
        assert_eq!(
            f("split", "a,b", &[Value::String(",".into())]),
            Value::Array(vec![Value::String("a".into()), Value::String("b".into())])
        );
    }

    #[test]
    fn join_stringifies_elements() {
        let arr = Value::Array(vec![Value::Int(1), Value::String("x".into())]);
        assert_eq!(
            apply("join", &arr, &[Value::String("-".into())]).unwrap(),
            Value::String("1-x".into())
        );
    }

    #[test]
    fn affix_tests() {
        assert_eq!(
            f("startswith", "hello", &[Value::String("he".into())]),
            Value::Bool(true)
        );
        assert_eq!(
            f("endswith", "hello", &[Value::String("lo".into())]),
            Value::Bool(true)
        );
        assert_eq!(
            apply("startswith", &Value::Int(1), &[Value::String("1".into())]).unwrap(),
            Value::Bool(false)
        );
    }

    #[test]
    fn matches_is_substring_search() {
        assert_eq!(
            f("matches", "hello42", &[Value::String(r"\d+".into())]),
            Value::Bool(true)
        );
        assert_eq!(
            f("matches", "hello", &[Value::String(r"^ell".into())]),
            Value::Bool(false)
        );
    }

    #[test]
    fn invalid_regex_is_operator_error() {
        assert!(f_err("matches", "x", &[Value::String("(".into())]));
    }

    fn f_err(name: &str, input: &str, args: &[Value]) -> bool {
        apply(name, &Value::String(input.into()), args).is_err()
    }

    #[test]
    fn non_string_passthrough() {
        assert_eq!(apply("lower", &Value::Int(3), &[]).unwrap(), Value::Int(3));
    }
}
