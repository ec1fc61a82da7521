/// Read-side interpreter backing `get` and `exists`.
use crate::error::Error;
use crate::path::Token;
use crate::value::Value;

use super::normalize_index;

/// Walk the token sequence from `cursor`. Returns `Value::Undefined` when
/// the path does not resolve; the caller converts that into the default
/// value or a strict-mode error.
pub(crate) fn resolve(cursor: &Value, tokens: &[Token], root: &Value) -> Result<Value, Error> {
    let Some((token, rest)) = tokens.split_first() else {
        return Ok(cursor.clone());
    };
    match token {
        Token::RootKey(k) | Token::Key(k) => match cursor {
            Value::Object(_) => match cursor.key(k) {
                Some(child) => resolve(child, rest, root),
                None => Ok(Value::Undefined),
            },
            // Key access over a sequence projects across the elements,
            // dropping the ones where the key is absent; the remainder then
            // continues on the projected sequence.
            Value::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for el in items {
                    if let Some(child) = el.key(k) {
                        out.push(child.clone());
                    }
                }
                resolve(&Value::Array(out), rest, root)
            }
            _ => Ok(Value::Undefined),
        },
        Token::Root => resolve(root, rest, root),
        Token::Index(i) => match cursor {
            Value::Array(items) => match normalize_index(*i, items.len()) {
                Some(idx) => resolve(&items[idx], rest, root),
                None => Ok(Value::Undefined),
            },
            _ => Ok(Value::Undefined),
        },
        Token::Slice(bounds) => match cursor {
            Value::Array(items) => {
                let projected: Vec<Value> = bounds
                    .indices(items.len())
                    .into_iter()
                    .map(|i| items[i].clone())
                    .collect();
                resolve(&Value::Array(projected), rest, root)
            }
            _ => Ok(Value::Undefined),
        },
        Token::Map => match cursor {
            Value::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for el in items {
                    let r = resolve(el, rest, root)?;
                    if !r.is_undefined() {
                        out.push(r);
                    }
                }
                Ok(Value::Array(out))
            }
            _ => Ok(Value::Undefined),
        },
        Token::Wildcard => {
            let mut out = Vec::new();
            match cursor {
                Value::Object(pairs) => {
                    for (_, v) in pairs {
                        let r = resolve(v, rest, root)?;
                        if !r.is_undefined() {
                            out.push(r);
                        }
                    }
                }
                Value::Array(items) => {
                    for el in items {
                        let r = resolve(el, rest, root)?;
                        if !r.is_undefined() {
                            out.push(r);
                        }
                    }
                }
                _ => return Ok(Value::Undefined),
            }
            Ok(Value::Array(out))
        }
        Token::DeepWildcard => {
            let mut out = Vec::new();
            descend(cursor, rest, root, &mut out)?;
            Ok(Value::Array(out))
        }
        Token::Filter(matcher) => match cursor {
            Value::Array(items) => {
                let mut kept = Vec::new();
                for el in items {
                    if matcher.matches(el)? {
                        kept.push(el.clone());
                    }
                }
                resolve(&Value::Array(kept), rest, root)
            }
            _ => Ok(Value::Undefined),
        },
        Token::Transform(pipeline) => {
            let transformed = pipeline.apply(cursor)?;
            resolve(&transformed, rest, root)
        }
    }
}

/// Pre-order descendant enumeration for `**`: attempt the remaining tokens
/// at every node, the starting one included, collecting the hits.
fn descend(
    node: &Value,
    rest: &[Token],
    root: &Value,
    out: &mut Vec<Value>,
) -> Result<(), Error> {
    let r = resolve(node, rest, root)?;
    if !r.is_undefined() {
        out.push(r);
    }
    match node {
        Value::Object(pairs) => {
            for (_, v) in pairs {
                descend(v, rest, root, out)?;
            }
        }
        Value::Array(items) => {
            for el in items {
                descend(el, rest, root, out)?;
            }
        }
        _ => {}
    }
    Ok(())
}

/// True when the token stream aggregates results into a projected sequence,
/// which makes `exists` treat an empty final sequence as absent.
pub(crate) fn aggregates(tokens: &[Token]) -> bool {
    tokens.iter().any(|t| {
        matches!(
            t,
            Token::Map | Token::Wildcard | Token::DeepWildcard | Token::Filter(_)
        )
    })
}
