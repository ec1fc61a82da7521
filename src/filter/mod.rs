/// Filter pipeline subsystem.
///
/// A pipeline is an ordered list of named value-to-value transforms,
/// `$name | $name(args) | $name(args)[]`, compiled once and applied left to
/// right. Stage names resolve against a fixed built-in registry; unknown
/// names are an `Operator` error.
mod builtins;

use crate::error::Error;
use crate::value::Value;

/// One pipeline stage. `map_over` corresponds to the `$name[]` suffix:
/// apply the call to each element of a sequence input instead of the
/// sequence as a whole.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterCall {
    pub name: String,
    pub args: Vec<Value>,
    pub map_over: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Pipeline {
    calls: Vec<FilterCall>,
}

impl Pipeline {
    /// Parse pipeline text of the form `$name | $name(arg, ...) | $name[]`.
    pub fn parse(text: &str) -> Result<Pipeline, Error> {
        let stages = split_top_level(text, b'|')?;
        if stages.is_empty() {
            return Err(Error::parse(text, "empty filter pipeline"));
        }
        let mut calls = Vec::with_capacity(stages.len());
        for stage in stages {
            calls.push(parse_stage(stage.trim(), text)?);
        }
        Ok(Pipeline { calls })
    }

    /// Run every stage in order; the output of stage *i* feeds stage *i+1*.
    pub fn apply(&self, value: &Value) -> Result<Value, Error> {
        let mut current = value.clone();
        for call in &self.calls {
            current = call.apply(&current)?;
        }
        Ok(current)
    }
}

impl FilterCall {
    fn apply(&self, input: &Value) -> Result<Value, Error> {
        if self.map_over && let Value::Array(items) = input {
            let mapped = items
                .iter()
                .map(|el| builtins::apply(&self.name, el, &self.args))
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(Value::Array(mapped));
        }
        builtins::apply(&self.name, input, &self.args)
    }
}

/// Run a single built-in by name. Backs the public `run_filter_function`.
pub fn run(name: &str, value: &Value, args: &[Value]) -> Result<Value, Error> {
    builtins::apply(name, value, args)
}

// ---------------------------------------------------------------------------
// Pipeline text parsing
// ---------------------------------------------------------------------------

/// Split `text` on `sep` at depth zero, honoring parentheses, brackets, and
/// single/double quotes.
fn split_top_level(text: &str, sep: u8) -> Result<Vec<&str>, Error> {
    let bytes = text.as_bytes();
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\'' | b'"' => {
                let quote = bytes[i];
                i += 1;
                while i < bytes.len() && bytes[i] != quote {
                    if bytes[i] == b'\\' {
                        i += 1;
                    }
                    i += 1;
                }
                if i >= bytes.len() {
                    return Err(Error::parse(text, "unterminated quote"));
                }
            }
            b'(' | b'[' => depth += 1,
            b')' | b']' => depth -= 1,
            c if c == sep && depth == 0 => {
                parts.push(&text[start..i]);
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    if depth != 0 {
        return Err(Error::parse(text, "mismatched parentheses or brackets"));
    }
    parts.push(&text[start..]);
    Ok(parts)
}

fn parse_stage(stage: &str, full: &str) -> Result<FilterCall, Error> {
    let Some(rest) = stage.strip_prefix('$') else {
        return Err(Error::parse(
            full,
            format!("filter stage must start with '$': {stage:?}"),
        ));
    };
    let name_end = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(rest.len());
    let name = &rest[..name_end];
    if name.is_empty() {
        return Err(Error::parse(full, format!("missing filter name: {stage:?}")));
    }
    let mut tail = rest[name_end..].trim();

    let mut args = Vec::new();
    if let Some(after) = tail.strip_prefix('(') {
        let Some(close) = find_closing_paren(after) else {
            return Err(Error::parse(full, format!("unterminated '(' in {stage:?}")));
        };
        let arg_text = &after[..close];
        if !arg_text.trim().is_empty() {
            for part in split_top_level(arg_text, b',')? {
                args.push(parse_literal(part.trim(), full)?);
            }
        }
        tail = after[close + 1..].trim();
    }

    let map_over = match tail {
        "" => false,
        "[]" => true,
        other => {
            return Err(Error::parse(
                full,
                format!("unexpected trailing {other:?} in filter stage"),
            ));
        }
    };

    Ok(FilterCall {
        name: name.to_string(),
        args,
        map_over,
    })
}

fn find_closing_paren(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    let mut depth = 1i32;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\'' | b'"' => {
                let quote = bytes[i];
                i += 1;
                while i < bytes.len() && bytes[i] != quote {
                    if bytes[i] == b'\\' {
                        i += 1;
                    }
                    i += 1;
                }
            }
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// Parse a literal argument: integers, floats, quoted strings, `true`,
/// `false`, `null`, or a bare identifier (passed through as a string).
pub(crate) fn parse_literal(text: &str, full: &str) -> Result<Value, Error> {
    if text.is_empty() {
        return Err(Error::parse(full, "empty filter argument"));
    }
    match text {
        "true" => return Ok(Value::Bool(true)),
        "false" => return Ok(Value::Bool(false)),
        "null" => return Ok(Value::Null),
        _ => {}
    }
    let bytes = text.as_bytes();
    if bytes[0] == b'\'' || bytes[0] == b'"' {
        return parse_quoted(text, full);
    }
    if let Ok(n) = text.parse::<i64>() {
        return Ok(Value::Int(n));
    }
    if let Ok(f) = text.parse::<f64>() {
        return Ok(Value::Double(f));
    }
    // Bare identifier: passed as a string.
    Ok(Value::String(text.to_string()))
}

fn parse_quoted(text: &str, full: &str) -> Result<Value, Error> {
    let bytes = text.as_bytes();
    let quote = bytes[0];
    if bytes.len() < 2 || bytes[bytes.len() - 1] != quote {
        return Err(Error::parse(full, format!("unterminated string: {text}")));
    }
    let inner = &text[1..text.len() - 1];
    let mut s = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            s.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => s.push('\n'),
            Some('r') => s.push('\r'),
            Some('t') => s.push('\t'),
            Some('\\') => s.push('\\'),
            Some('\'') => s.push('\''),
            Some('"') => s.push('"'),
            Some(c) => {
                return Err(Error::parse(full, format!("unknown escape '\\{c}'")));
            }
            None => return Err(Error::parse(full, "trailing backslash in string")),
        }
    }
    Ok(Value::String(s))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_single_stage() {
        let p = Pipeline::parse("$double").unwrap();
        assert_eq!(
            p.calls,
            vec![FilterCall {
                name: "double".into(),
                args: vec![],
                map_over: false,
            }]
        );
    }

    #[test]
    fn parse_stage_with_args() {
        let p = Pipeline::parse("$add(3)|$clamp(0, 10)").unwrap();
        assert_eq!(p.calls.len(), 2);
        assert_eq!(p.calls[0].name, "add");
        assert_eq!(p.calls[0].args, vec![Value::Int(3)]);
        assert_eq!(p.calls[1].args, vec![Value::Int(0), Value::Int(10)]);
    }

    #[test]
    fn parse_map_over_suffix() {
        let p = Pipeline::parse("$double[]").unwrap();
        assert!(p.calls[0].map_over);
    }

    #[test]
    fn parse_string_args() {
        let p = Pipeline::parse("$replace('a', \"b\")").unwrap();
        assert_eq!(
            p.calls[0].args,
            vec![Value::String("a".into()), Value::String("b".into())]
        );
    }

    #[test]
    fn parse_bare_identifier_arg_is_string() {
        let p = Pipeline::parse("$type_is(list)").unwrap();
        assert_eq!(p.calls[0].args, vec![Value::String("list".into())]);
    }

    #[test]
    fn parse_keyword_and_numeric_args() {
        let p = Pipeline::parse("$default(true)|$round(2)|$add(-1.5)").unwrap();
        assert_eq!(p.calls[0].args, vec![Value::Bool(true)]);
        assert_eq!(p.calls[1].args, vec![Value::Int(2)]);
        assert_eq!(p.calls[2].args, vec![Value::Double(-1.5)]);
    }

    #[test]
    fn pipe_inside_quotes_is_not_a_stage_break() {
        let p = Pipeline::parse("$split('|')").unwrap();
        assert_eq!(p.calls.len(), 1);
        assert_eq!(p.calls[0].args, vec![Value::String("|".into())]);
    }

    #[test]
    fn reject_missing_dollar() {
        assert!(Pipeline::parse("double").is_err());
    }

    #[test]
    fn reject_unterminated_paren() {
        assert!(Pipeline::parse("$add(3").is_err());
    }

    #[test]
    fn unknown_filter_is_operator_error() {
        let p = Pipeline::parse("$frobnicate").unwrap();
        let err = p.apply(&Value::Int(1)).unwrap_err();
        assert!(matches!(err, Error::Operator { .. }));
    }

    #[test]
    fn stages_chain_left_to_right() {
        let p = Pipeline::parse("$inc|$double").unwrap();
        assert_eq!(p.apply(&Value::Int(3)).unwrap(), Value::Int(8));
    }

    #[test]
    fn map_over_applies_per_element() {
        let p = Pipeline::parse("$double[]").unwrap();
        let input = Value::Array(vec![Value::Int(1), Value::Int(2)]);
        assert_eq!(
            p.apply(&input).unwrap(),
            Value::Array(vec![Value::Int(2), Value::Int(4)])
        );
    }

    #[test]
    fn map_over_on_non_sequence_applies_whole() {
        let p = Pipeline::parse("$double[]").unwrap();
        assert_eq!(p.apply(&Value::Int(5)).unwrap(), Value::Int(10));
    }
}
