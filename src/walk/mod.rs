/// Traversal engine: the interpreter that walks a compiled token sequence
/// against a tree. `get`/`exists` read through `get::resolve`; `set` and
/// `unset` mutate in place, enumerating concrete positions before touching
/// wildcard targets so structural changes cannot invalidate the iteration.
pub mod get;
pub mod set;
pub mod unset;

use crate::error::Error;
use crate::path::Token;
use crate::value::Value;

/// Normalize a possibly-negative index against a sequence length.
pub(crate) fn normalize_index(i: i64, len: usize) -> Option<usize> {
    let len = len as i64;
    let idx = if i < 0 { i + len } else { i };
    (0..len).contains(&idx).then_some(idx as usize)
}

/// One concrete step of an enumerated target position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Step {
    Key(String),
    Index(usize),
}

/// Re-navigate from a node to a previously enumerated position. Returns
/// `None` when an earlier mutation removed part of the path.
pub(crate) fn navigate_mut<'a>(node: &'a mut Value, steps: &[Step]) -> Option<&'a mut Value> {
    let mut cursor = node;
    for step in steps {
        cursor = match step {
            Step::Key(k) => cursor.key_mut(k)?,
            Step::Index(i) => match cursor {
                Value::Array(items) => items.get_mut(*i)?,
                _ => return None,
            },
        };
    }
    Some(cursor)
}

/// Pre-order positions of every container node under (and including) the
/// given node. Scalars are excluded: deep-wildcard mutation targets are the
/// containers the terminal write applies inside.
pub(crate) fn container_positions(node: &Value, base: &mut Vec<Step>, out: &mut Vec<Vec<Step>>) {
    if !node.is_container() {
        return;
    }
    out.push(base.clone());
    match node {
        Value::Object(pairs) => {
            for (k, v) in pairs {
                base.push(Step::Key(k.clone()));
                container_positions(v, base, out);
                base.pop();
            }
        }
        Value::Array(items) => {
            for (i, v) in items.iter().enumerate() {
                base.push(Step::Index(i));
                container_positions(v, base, out);
                base.pop();
            }
        }
        _ => {}
    }
}

/// Everything before the last `$$root` token is irrelevant to a mutation:
/// the cursor resets to the root there anyway.
pub(crate) fn after_last_root(tokens: &[Token]) -> &[Token] {
    match tokens.iter().rposition(|t| matches!(t, Token::Root)) {
        Some(pos) => &tokens[pos + 1..],
        None => tokens,
    }
}

pub(crate) fn reject_transform(path: &str, tokens: &[Token], op: &str) -> Result<(), Error> {
    if tokens.iter().any(|t| matches!(t, Token::Transform(_))) {
        return Err(Error::parse(
            path,
            format!("transform pipeline not allowed in {op} path"),
        ));
    }
    Ok(())
}

/// The non-strict outcome for a target that failed to resolve.
pub(crate) fn absent(path: &str, strict: bool, msg: impl Into<String>) -> Result<(), Error> {
    if strict {
        Err(Error::resolution(path, msg))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_negative_indices() {
        assert_eq!(normalize_index(-1, 3), Some(2));
        assert_eq!(normalize_index(-3, 3), Some(0));
        assert_eq!(normalize_index(-4, 3), None);
        assert_eq!(normalize_index(2, 3), Some(2));
        assert_eq!(normalize_index(3, 3), None);
    }

    #[test]
    fn container_positions_are_preorder() {
        let v = Value::from(serde_json::json!({
            "a": {"b": [1, {"c": 2}]},
            "d": 3,
        }));
        let mut out = Vec::new();
        container_positions(&v, &mut Vec::new(), &mut out);
        assert_eq!(
            out,
            vec![
                vec![],
                vec![Step::Key("a".into())],
                vec![Step::Key("a".into()), Step::Key("b".into())],
                vec![
                    Step::Key("a".into()),
                    Step::Key("b".into()),
                    Step::Index(1),
                ],
            ]
        );
    }

    #[test]
    fn navigate_mut_follows_steps() {
        let mut v = Value::from(serde_json::json!({"a": [10, 20]}));
        let steps = vec![Step::Key("a".into()), Step::Index(1)];
        *navigate_mut(&mut v, &steps).unwrap() = Value::Int(99);
        assert_eq!(v, Value::from(serde_json::json!({"a": [10, 99]})));
        assert!(navigate_mut(&mut v, &[Step::Key("zz".into())]).is_none());
    }
}
