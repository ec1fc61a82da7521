/// Mutating interpreter for `unset`: mirrors the `set` walk but removes at
/// the terminal instead of assigning. No scaffolding is ever created.
use log::trace;

use crate::error::Error;
use crate::path::Token;
use crate::value::Value;

use super::{
    absent, after_last_root, container_positions, navigate_mut, normalize_index, reject_transform,
};

pub(crate) fn execute(
    data: &mut Value,
    path: &str,
    tokens: &[Token],
    strict: bool,
) -> Result<(), Error> {
    reject_transform(path, tokens, "an unset")?;
    let tokens = after_last_root(tokens);
    if tokens.is_empty() {
        // The whole document has no parent to remove it from.
        return Ok(());
    }
    walk(data, tokens, strict, path)
}

fn walk(cursor: &mut Value, tokens: &[Token], strict: bool, path: &str) -> Result<(), Error> {
    let Some((token, rest)) = tokens.split_first() else {
        return Ok(());
    };
    if rest.is_empty() {
        return terminal(cursor, token, strict, path);
    }
    match token {
        Token::RootKey(k) | Token::Key(k) => match cursor.key_mut(k) {
            Some(child) => walk(child, rest, strict, path),
            None => absent(path, strict, format!("missing key '{k}'")),
        },
        Token::Root => walk(cursor, rest, strict, path),
        Token::Index(i) => match cursor {
            Value::Array(items) => match normalize_index(*i, items.len()) {
                Some(idx) => walk(&mut items[idx], rest, strict, path),
                None => absent(path, strict, format!("index {i} out of range")),
            },
            _ => absent(path, strict, "cannot index a non-sequence"),
        },
        Token::Slice(bounds) => match cursor {
            Value::Array(items) => {
                for idx in bounds.indices(items.len()) {
                    walk(&mut items[idx], rest, strict, path)?;
                }
                Ok(())
            }
            _ => absent(path, strict, "cannot slice a non-sequence"),
        },
        Token::Map => match cursor {
            Value::Array(items) => {
                for el in items.iter_mut() {
                    walk(el, rest, strict, path)?;
                }
                Ok(())
            }
            _ => absent(path, strict, "cannot map over a non-sequence"),
        },
        Token::Wildcard => {
            match cursor {
                Value::Object(pairs) => {
                    for (_, v) in pairs.iter_mut() {
                        if v.is_container() {
                            walk(v, rest, strict, path)?;
                        }
                    }
                }
                Value::Array(items) => {
                    for el in items.iter_mut() {
                        if el.is_container() {
                            walk(el, rest, strict, path)?;
                        }
                    }
                }
                _ => return absent(path, strict, "wildcard over a non-container"),
            }
            Ok(())
        }
        Token::DeepWildcard => {
            // Enumerate positions first, then apply deepest-first so earlier
            // removals cannot shift a later target.
            let mut positions = Vec::new();
            container_positions(cursor, &mut Vec::new(), &mut positions);
            for pos in positions.iter().rev() {
                if let Some(node) = navigate_mut(cursor, pos) {
                    walk(node, rest, strict, path)?;
                }
            }
            Ok(())
        }
        Token::Filter(matcher) => match cursor {
            Value::Array(items) => {
                let mut matched = false;
                for el in items.iter_mut() {
                    if matcher.matches(el)? {
                        matched = true;
                        walk(el, rest, strict, path)?;
                    }
                }
                if !matched {
                    return absent(path, strict, "no element matched the filter");
                }
                Ok(())
            }
            _ => absent(path, strict, "cannot filter a non-sequence"),
        },
        // Rejected before the walk starts.
        Token::Transform(_) => Ok(()),
    }
}

fn terminal(cursor: &mut Value, token: &Token, strict: bool, path: &str) -> Result<(), Error> {
    match token {
        Token::RootKey(k) | Token::Key(k) => {
            if cursor.remove_key(k).is_none() {
                return absent(path, strict, format!("missing key '{k}'"));
            }
            Ok(())
        }
        Token::Index(i) => match cursor {
            Value::Array(items) => match normalize_index(*i, items.len()) {
                Some(idx) => {
                    items.remove(idx);
                    Ok(())
                }
                None => absent(path, strict, format!("index {i} out of range")),
            },
            _ => absent(path, strict, "cannot index a non-sequence"),
        },
        Token::Slice(bounds) => match cursor {
            Value::Array(items) => {
                let mut selected = bounds.indices(items.len());
                selected.sort_unstable();
                for idx in selected.into_iter().rev() {
                    items.remove(idx);
                }
                Ok(())
            }
            _ => absent(path, strict, "cannot slice a non-sequence"),
        },
        Token::Map => match cursor {
            Value::Array(items) => {
                trace!("unset {path:?}: clearing {} element(s)", items.len());
                items.clear();
                Ok(())
            }
            _ => absent(path, strict, "cannot map over a non-sequence"),
        },
        Token::Wildcard => match cursor {
            Value::Object(pairs) => {
                pairs.clear();
                Ok(())
            }
            Value::Array(items) => {
                items.clear();
                Ok(())
            }
            _ => absent(path, strict, "wildcard over a non-container"),
        },
        // Removing every descendant of a node empties its children.
        Token::DeepWildcard => match cursor {
            Value::Object(pairs) => {
                pairs.clear();
                Ok(())
            }
            Value::Array(items) => {
                items.clear();
                Ok(())
            }
            _ => absent(path, strict, "deep wildcard over a non-container"),
        },
        Token::Filter(matcher) => match cursor {
            Value::Array(items) => {
                let flags = items
                    .iter()
                    .map(|el| matcher.matches(el))
                    .collect::<Result<Vec<_>, _>>()?;
                let mut it = flags.into_iter();
                items.retain(|_| !it.next().unwrap_or(false));
                Ok(())
            }
            _ => absent(path, strict, "cannot filter a non-sequence"),
        },
        Token::Root | Token::Transform(_) => Ok(()),
    }
}
