/// Mutating interpreter for `set`: walks to the terminal token's target
/// container and applies the write, honoring the scaffolding flags.
use log::trace;

use crate::SetOptions;
use crate::error::Error;
use crate::filter::Pipeline;
use crate::path::predicate::Matcher;
use crate::path::{self, Token};
use crate::value::Value;

use super::{
    absent, after_last_root, container_positions, get, navigate_mut, normalize_index,
    reject_transform,
};

/// The resolved form of a `set` value argument. `$$root` expressions are
/// resolved against the tree once, before any mutation starts; pipelines
/// are applied per target to the pre-write value.
pub(crate) enum WriteValue {
    Literal(Value),
    Pipeline(Pipeline),
}

impl WriteValue {
    pub(crate) fn resolve(value: Value, data: &Value) -> Result<WriteValue, Error> {
        let Value::String(text) = &value else {
            return Ok(WriteValue::Literal(value));
        };
        if text.starts_with("$$root") {
            let tokens = path::parse(text)?;
            let resolved = get::resolve(data, &tokens, data)?;
            return Ok(WriteValue::Literal(match resolved {
                Value::Undefined => Value::Null,
                other => other,
            }));
        }
        if text.starts_with('$') || text.contains('|') {
            // A string that parses as a pipeline is one; anything else is a
            // plain string literal.
            if let Ok(p) = Pipeline::parse(text) {
                return Ok(WriteValue::Pipeline(p));
            }
        }
        Ok(WriteValue::Literal(value))
    }

    /// Produce the value to write at one target, given its pre-write value.
    fn produce(&self, pre: &Value) -> Result<Value, Error> {
        match self {
            WriteValue::Literal(v) => Ok(v.clone()),
            WriteValue::Pipeline(p) => {
                let input = if pre.is_undefined() { &Value::Null } else { pre };
                p.apply(input)
            }
        }
    }
}

pub(crate) fn execute(
    data: &mut Value,
    path: &str,
    tokens: &[Token],
    value: Value,
    opts: SetOptions,
) -> Result<(), Error> {
    reject_transform(path, tokens, "a set")?;
    let write = WriteValue::resolve(value, data)?;
    let tokens = after_last_root(tokens);
    if tokens.is_empty() {
        // The whole-document path replaces the root's value in place.
        let new = write.produce(data)?;
        *data = new;
        return Ok(());
    }
    walk(data, tokens, &write, &opts, path)
}

fn walk(
    cursor: &mut Value,
    tokens: &[Token],
    write: &WriteValue,
    opts: &SetOptions,
    path: &str,
) -> Result<(), Error> {
    let Some((token, rest)) = tokens.split_first() else {
        return Ok(());
    };
    if rest.is_empty() {
        return terminal(cursor, token, write, opts, path);
    }
    match token {
        Token::RootKey(k) | Token::Key(k) => descend_key(cursor, k, rest, write, opts, path),
        // Roots are stripped before the walk starts; a stray one is inert.
        Token::Root => walk(cursor, rest, write, opts, path),
        Token::Index(i) => match cursor {
            Value::Array(items) => match normalize_index(*i, items.len()) {
                Some(idx) => walk(&mut items[idx], rest, write, opts, path),
                None => absent(path, opts.strict, format!("index {i} out of range")),
            },
            _ => absent(path, opts.strict, "cannot index a non-sequence"),
        },
        Token::Slice(bounds) => match cursor {
            Value::Array(items) => {
                for idx in bounds.indices(items.len()) {
                    walk(&mut items[idx], rest, write, opts, path)?;
                }
                Ok(())
            }
            _ => absent(path, opts.strict, "cannot slice a non-sequence"),
        },
        Token::Map => match cursor {
            Value::Array(items) => {
                if items.is_empty() {
                    if opts.strict {
                        return Err(Error::resolution(path, "mapping over an empty sequence"));
                    }
                    if opts.create_missing {
                        trace!("set {path:?}: creating element for empty sequence map");
                        let mut element = Value::Null;
                        walk(&mut element, rest, write, opts, path)?;
                        items.push(element);
                    }
                    return Ok(());
                }
                for el in items.iter_mut() {
                    walk(el, rest, write, opts, path)?;
                }
                Ok(())
            }
            _ => absent(path, opts.strict, "cannot map over a non-sequence"),
        },
        Token::Wildcard => {
            match cursor {
                Value::Object(pairs) => {
                    for (_, v) in pairs.iter_mut() {
                        if v.is_container() {
                            walk(v, rest, write, opts, path)?;
                        }
                    }
                }
                Value::Array(items) => {
                    for el in items.iter_mut() {
                        if el.is_container() {
                            walk(el, rest, write, opts, path)?;
                        }
                    }
                }
                _ => return absent(path, opts.strict, "wildcard over a non-container"),
            }
            Ok(())
        }
        Token::DeepWildcard => {
            // Enumerate target positions up front so writes cannot
            // invalidate the iteration.
            let mut positions = Vec::new();
            container_positions(cursor, &mut Vec::new(), &mut positions);
            for pos in positions {
                if let Some(node) = navigate_mut(cursor, &pos) {
                    walk(node, rest, write, opts, path)?;
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
                        walk(el, rest, write, opts, path)?;
                    }
                }
                if !matched {
                    if opts.strict {
                        return Err(Error::resolution(path, "no element matched the filter"));
                    }
                    if opts.create_filter_match {
                        trace!("set {path:?}: appending filter-seeded element");
                        let mut element = seeded_element(matcher);
                        walk(&mut element, rest, write, opts, path)?;
                        items.push(element);
                    }
                }
                Ok(())
            }
            _ => absent(path, opts.strict, "cannot filter a non-sequence"),
        },
        // Rejected before the walk starts.
        Token::Transform(_) => Ok(()),
    }
}

/// Non-terminal `Key` traversal with scaffolding. Null is replaceable ground
/// governed by `create_missing`; other non-mappings are incompatible and
/// governed by `overwrite_incompatible`.
fn descend_key(
    cursor: &mut Value,
    k: &str,
    rest: &[Token],
    write: &WriteValue,
    opts: &SetOptions,
    path: &str,
) -> Result<(), Error> {
    match cursor {
        Value::Object(_) => {
            if cursor.key(k).is_none() {
                if opts.strict {
                    return Err(Error::resolution(path, format!("missing key '{k}'")));
                }
                if !opts.create_missing {
                    return Ok(());
                }
                let scaffold = scaffold_for(rest.first());
                trace!("set {path:?}: creating {} for missing key '{k}'", scaffold.type_name());
                cursor.insert_key(k, scaffold);
            }
            match cursor.key_mut(k) {
                Some(child) => walk(child, rest, write, opts, path),
                None => Ok(()),
            }
        }
        Value::Null => {
            if opts.strict {
                return Err(Error::resolution(path, format!("cannot traverse null at '{k}'")));
            }
            if !opts.create_missing {
                return Ok(());
            }
            *cursor = Value::Object(vec![(k.to_string(), scaffold_for(rest.first()))]);
            match cursor.key_mut(k) {
                Some(child) => walk(child, rest, write, opts, path),
                None => Ok(()),
            }
        }
        _ => {
            if opts.strict {
                return Err(Error::resolution(
                    path,
                    format!("key '{k}' traverses a {}", cursor.type_name()),
                ));
            }
            if !opts.overwrite_incompatible || !opts.create_missing {
                return Ok(());
            }
            trace!("set {path:?}: overwriting {} with a mapping at '{k}'", cursor.type_name());
            *cursor = Value::Object(vec![(k.to_string(), scaffold_for(rest.first()))]);
            match cursor.key_mut(k) {
                Some(child) => walk(child, rest, write, opts, path),
                None => Ok(()),
            }
        }
    }
}

/// Container created for a missing key: a sequence when the next token wants
/// one, a mapping otherwise.
fn scaffold_for(next: Option<&Token>) -> Value {
    match next {
        Some(Token::Index(_) | Token::Slice(_) | Token::Map) => Value::Array(vec![]),
        _ => Value::Object(vec![]),
    }
}

fn terminal(
    cursor: &mut Value,
    token: &Token,
    write: &WriteValue,
    opts: &SetOptions,
    path: &str,
) -> Result<(), Error> {
    match token {
        Token::RootKey(k) | Token::Key(k) => match cursor {
            Value::Object(_) => {
                let pre = cursor.key(k).cloned().unwrap_or(Value::Undefined);
                let new = write.produce(&pre)?;
                cursor.insert_key(k, new);
                Ok(())
            }
            Value::Null => {
                if opts.strict {
                    return Err(Error::resolution(path, format!("cannot write key '{k}' into null")));
                }
                if !opts.create_missing {
                    return Ok(());
                }
                let new = write.produce(&Value::Undefined)?;
                *cursor = Value::Object(vec![(k.to_string(), new)]);
                Ok(())
            }
            _ => {
                if opts.strict {
                    return Err(Error::resolution(
                        path,
                        format!("cannot write key '{k}' into a {}", cursor.type_name()),
                    ));
                }
                if !opts.overwrite_incompatible {
                    return Ok(());
                }
                trace!("set {path:?}: overwriting {} with a mapping at terminal '{k}'", cursor.type_name());
                let new = write.produce(&Value::Undefined)?;
                *cursor = Value::Object(vec![(k.to_string(), new)]);
                Ok(())
            }
        },
        Token::Index(i) => match cursor {
            Value::Array(items) => match normalize_index(*i, items.len()) {
                Some(idx) => {
                    let new = write.produce(&items[idx])?;
                    items[idx] = new;
                    Ok(())
                }
                None => {
                    if opts.strict {
                        return Err(Error::resolution(path, format!("index {i} out of range")));
                    }
                    // Terminal-only extension: pad with nulls up to the index.
                    if opts.create_missing && *i >= 0 {
                        let idx = *i as usize;
                        trace!("set {path:?}: extending sequence to index {idx}");
                        while items.len() < idx {
                            items.push(Value::Null);
                        }
                        let new = write.produce(&Value::Undefined)?;
                        items.push(new);
                    }
                    Ok(())
                }
            },
            _ => absent(path, opts.strict, "cannot index a non-sequence"),
        },
        Token::Slice(bounds) => match cursor {
            Value::Array(items) => {
                for idx in bounds.indices(items.len()) {
                    let new = write.produce(&items[idx])?;
                    items[idx] = new;
                }
                Ok(())
            }
            _ => absent(path, opts.strict, "cannot slice a non-sequence"),
        },
        Token::Map => match cursor {
            Value::Array(items) => {
                if items.is_empty() {
                    if opts.create_missing {
                        let new = write.produce(&Value::Undefined)?;
                        items.push(new);
                    }
                    return Ok(());
                }
                for el in items.iter_mut() {
                    let new = write.produce(el)?;
                    *el = new;
                }
                Ok(())
            }
            _ => absent(path, opts.strict, "cannot map over a non-sequence"),
        },
        Token::Wildcard => match cursor {
            Value::Object(pairs) => {
                for (_, v) in pairs.iter_mut() {
                    let new = write.produce(v)?;
                    *v = new;
                }
                Ok(())
            }
            Value::Array(items) => {
                for el in items.iter_mut() {
                    let new = write.produce(el)?;
                    *el = new;
                }
                Ok(())
            }
            _ => absent(path, opts.strict, "wildcard over a non-container"),
        },
        Token::DeepWildcard => {
            deep_write(cursor, write)?;
            Ok(())
        }
        Token::Filter(matcher) => match cursor {
            Value::Array(items) => {
                let mut matched = false;
                for el in items.iter_mut() {
                    if matcher.matches(el)? {
                        matched = true;
                        let new = write.produce(el)?;
                        *el = new;
                    }
                }
                if !matched {
                    if opts.strict {
                        return Err(Error::resolution(path, "no element matched the filter"));
                    }
                    if opts.create_filter_match {
                        trace!("set {path:?}: appending filter-seeded element");
                        let seeded = seeded_element(matcher);
                        let mut new = write.produce(&seeded)?;
                        merge_seeds(&mut new, matcher);
                        items.push(new);
                    }
                }
                Ok(())
            }
            _ => absent(path, opts.strict, "cannot filter a non-sequence"),
        },
        Token::Root | Token::Transform(_) => Ok(()),
    }
}

/// Post-order write over every descendant, the starting node included.
/// Children are written before their parent so the parent's replacement
/// value is never re-visited.
fn deep_write(node: &mut Value, write: &WriteValue) -> Result<(), Error> {
    match node {
        Value::Object(pairs) => {
            for (_, v) in pairs.iter_mut() {
                deep_write(v, write)?;
            }
        }
        Value::Array(items) => {
            for el in items.iter_mut() {
                deep_write(el, write)?;
            }
        }
        _ => {}
    }
    let new = write.produce(node)?;
    *node = new;
    Ok(())
}

/// A fresh element for `create_filter_match`: a mapping seeded from the
/// filter's `keypath == literal` atoms so it satisfies the filter it is
/// appended for.
fn seeded_element(matcher: &Matcher) -> Value {
    let mut element = Value::Object(vec![]);
    for (steps, v) in matcher.seed_pairs() {
        insert_nested(&mut element, steps, v.clone());
    }
    element
}

/// Re-apply seed equalities onto a written element, so a literal write to a
/// freshly created element still matches the filter that created it.
fn merge_seeds(element: &mut Value, matcher: &Matcher) {
    if !matches!(element, Value::Object(_)) {
        return;
    }
    for (steps, v) in matcher.seed_pairs() {
        let mut cursor: &Value = element;
        let mut missing = false;
        for k in steps {
            match cursor.key(k) {
                Some(child) => cursor = child,
                None => {
                    missing = true;
                    break;
                }
            }
        }
        if missing {
            insert_nested(element, steps, v.clone());
        }
    }
}

fn insert_nested(target: &mut Value, steps: &[String], value: Value) {
    let Some((last, parents)) = steps.split_last() else {
        return;
    };
    let mut cursor = target;
    for k in parents {
        if cursor.key(k).is_none() {
            cursor.insert_key(k, Value::Object(vec![]));
        }
        match cursor.key_mut(k) {
            Some(child) => cursor = child,
            None => return,
        }
    }
    cursor.insert_key(last, value);
}
