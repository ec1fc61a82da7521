/// Predicate compiler and evaluator for `[? ... ]` filter brackets.
///
/// A predicate is compiled once per token into a `Matcher` AST and evaluated
/// per element without re-parsing. Grammar, lowest to highest precedence:
/// `||`, `&&`, prefix `!`, parentheses, then comparison atoms
/// `<lhs> <op> <rhs>`.
use crate::error::Error;
use crate::filter::Pipeline;
use crate::value::{Value, values_equal, values_order};

use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

/// Compiled predicate expression over a subject element.
#[derive(Debug, Clone, PartialEq)]
pub enum Matcher {
    Cmp {
        lhs: KeyRef,
        op: CmpOp,
        rhs: Operand,
    },
    And(Box<Matcher>, Box<Matcher>),
    Or(Box<Matcher>, Box<Matcher>),
    Not(Box<Matcher>),
}

/// Left-hand side of an atom: a key path relative to the subject (empty for
/// `.`, the subject itself), optionally piped through a transform before
/// comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyRef {
    pub path: Vec<String>,
    pub pipeline: Option<Pipeline>,
}

/// Right-hand side of an atom: a literal, or a pipeline applied to the
/// subject (optionally negated with a leading `!`).
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Literal(Value),
    Pipeline { pipeline: Pipeline, negate: bool },
}

impl Matcher {
    /// Evaluate against a subject element. Pipeline failures (unknown filter
    /// names, bad arguments) propagate; shape mismatches compare false.
    pub fn matches(&self, subject: &Value) -> Result<bool, Error> {
        match self {
            Matcher::And(a, b) => Ok(a.matches(subject)? && b.matches(subject)?),
            Matcher::Or(a, b) => Ok(a.matches(subject)? || b.matches(subject)?),
            Matcher::Not(inner) => Ok(!inner.matches(subject)?),
            Matcher::Cmp { lhs, op, rhs } => {
                let left = lhs.resolve(subject)?;
                let right = match rhs {
                    Operand::Literal(v) => v.clone(),
                    Operand::Pipeline { pipeline, negate } => {
                        let v = pipeline.apply(subject)?;
                        if *negate { Value::Bool(!v.is_truthy()) } else { v }
                    }
                };
                Ok(compare(&left, *op, &right))
            }
        }
    }

    /// Collect `keypath == literal` pairs used to seed a newly constructed
    /// element when a filter write matches nothing. Negated subtrees are
    /// skipped: their equalities describe what the element must NOT be.
    pub fn seed_pairs(&self) -> Vec<(&[String], &Value)> {
        let mut out = Vec::new();
        self.collect_seeds(&mut out);
        out
    }

    fn collect_seeds<'a>(&'a self, out: &mut Vec<(&'a [String], &'a Value)>) {
        match self {
            Matcher::Cmp {
                lhs,
                op: CmpOp::Eq,
                rhs: Operand::Literal(v),
            } if !lhs.path.is_empty() && lhs.pipeline.is_none() => {
                out.push((&lhs.path, v));
            }
            Matcher::And(a, b) | Matcher::Or(a, b) => {
                a.collect_seeds(out);
                b.collect_seeds(out);
            }
            _ => {}
        }
    }
}

impl KeyRef {
    fn resolve(&self, subject: &Value) -> Result<Value, Error> {
        let mut cursor = subject;
        for k in &self.path {
            match cursor.key(k) {
                Some(v) => cursor = v,
                None => return Ok(Value::Undefined),
            }
        }
        match &self.pipeline {
            Some(p) => p.apply(cursor),
            None => Ok(cursor.clone()),
        }
    }
}

/// Comparison with the undefined rule: any comparison against `Undefined` is
/// false, except `!=` against a concrete value, which is true.
pub(crate) fn compare(a: &Value, op: CmpOp, b: &Value) -> bool {
    if a.is_undefined() || b.is_undefined() {
        return op == CmpOp::Ne && !(a.is_undefined() && b.is_undefined());
    }
    match op {
        CmpOp::Eq => values_equal(a, b),
        CmpOp::Ne => !values_equal(a, b),
        CmpOp::Lt => matches!(values_order(a, b), Some(Ordering::Less)),
        CmpOp::Le => matches!(values_order(a, b), Some(Ordering::Less | Ordering::Equal)),
        CmpOp::Gt => matches!(values_order(a, b), Some(Ordering::Greater)),
        CmpOp::Ge => matches!(values_order(a, b), Some(Ordering::Greater | Ordering::Equal)),
    }
}

/// Compile predicate text (the bracket content after `?`).
pub fn compile(path: &str, text: &str) -> Result<Matcher, Error> {
    let mut cur = Cursor {
        path,
        text,
        bytes: text.as_bytes(),
        pos: 0,
    };
    let matcher = parse_or(&mut cur)?;
    cur.skip_ws();
    if cur.pos < cur.bytes.len() {
        return Err(cur.error(format!(
            "unexpected trailing text in predicate: {:?}",
            &cur.text[cur.pos..]
        )));
    }
    Ok(matcher)
}

struct Cursor<'a> {
    /// Full path string, for error messages.
    path: &'a str,
    text: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl Cursor<'_> {
    fn skip_ws(&mut self) {
        while self.pos < self.bytes.len() && self.bytes[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }

    fn starts_with(&self, s: &str) -> bool {
        self.text[self.pos..].starts_with(s)
    }

    fn error(&self, msg: impl Into<String>) -> Error {
        Error::parse(self.path, msg)
    }
}

fn parse_or(cur: &mut Cursor) -> Result<Matcher, Error> {
    let mut left = parse_and(cur)?;
    loop {
        cur.skip_ws();
        if cur.starts_with("||") {
            cur.pos += 2;
            let right = parse_and(cur)?;
            left = Matcher::Or(Box::new(left), Box::new(right));
        } else {
            return Ok(left);
        }
    }
}

fn parse_and(cur: &mut Cursor) -> Result<Matcher, Error> {
    let mut left = parse_not(cur)?;
    loop {
        cur.skip_ws();
        if cur.starts_with("&&") {
            cur.pos += 2;
            let right = parse_not(cur)?;
            left = Matcher::And(Box::new(left), Box::new(right));
        } else {
            return Ok(left);
        }
    }
}

fn parse_not(cur: &mut Cursor) -> Result<Matcher, Error> {
    cur.skip_ws();
    if cur.starts_with("!") && !cur.starts_with("!=") {
        cur.pos += 1;
        return Ok(Matcher::Not(Box::new(parse_not(cur)?)));
    }
    parse_primary(cur)
}

fn parse_primary(cur: &mut Cursor) -> Result<Matcher, Error> {
    cur.skip_ws();
    if cur.starts_with("(") {
        cur.pos += 1;
        let inner = parse_or(cur)?;
        cur.skip_ws();
        if !cur.starts_with(")") {
            return Err(cur.error("missing ')' in predicate"));
        }
        cur.pos += 1;
        return Ok(inner);
    }
    parse_atom(cur)
}

fn parse_atom(cur: &mut Cursor) -> Result<Matcher, Error> {
    cur.skip_ws();
    let start = cur.pos;
    let (op_start, op, op_len) = find_cmp_op(cur, start)?;
    let lhs = parse_keyref(cur, &cur.text[start..op_start])?;
    let rhs_start = op_start + op_len;
    let rhs_end = scan_operand_end(cur, rhs_start);
    let rhs = parse_operand(cur, &cur.text[rhs_start..rhs_end])?;
    cur.pos = rhs_end;
    Ok(Matcher::Cmp { lhs, op, rhs })
}

/// Find the comparison operator of the current atom: the first `==`, `!=`,
/// `>=`, `<=`, `>`, or `<` outside quotes, parentheses, and brackets.
fn find_cmp_op(cur: &Cursor, start: usize) -> Result<(usize, CmpOp, usize), Error> {
    let bytes = cur.bytes;
    let mut depth = 0i32;
    let mut i = start;
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
                    return Err(cur.error("unterminated quote in predicate"));
                }
            }
            b'(' | b'[' => depth += 1,
            b')' | b']' => {
                if depth == 0 {
                    break;
                }
                depth -= 1;
            }
            _ if depth == 0 => {
                let rest = &cur.text[i..];
                for (pat, op) in [
                    ("==", CmpOp::Eq),
                    ("!=", CmpOp::Ne),
                    (">=", CmpOp::Ge),
                    ("<=", CmpOp::Le),
                    (">", CmpOp::Gt),
                    ("<", CmpOp::Lt),
                ] {
                    if rest.starts_with(pat) {
                        return Ok((i, op, pat.len()));
                    }
                }
                if rest.starts_with("&&") || rest.starts_with("||") {
                    break;
                }
            }
            _ => {}
        }
        i += 1;
    }
    Err(cur.error(format!(
        "expected comparison in predicate near {:?}",
        &cur.text[start..i.min(cur.text.len())]
    )))
}

/// Find where the right-hand operand ends: the first top-level `&&`, `||`,
/// or `)`.
fn scan_operand_end(cur: &Cursor, start: usize) -> usize {
    let bytes = cur.bytes;
    let mut depth = 0i32;
    let mut i = start;
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
            b'(' | b'[' => depth += 1,
            b')' if depth == 0 => return i,
            b')' | b']' => depth -= 1,
            b'&' | b'|' if depth == 0 => {
                let rest = &cur.text[i..];
                if rest.starts_with("&&") || rest.starts_with("||") {
                    return i;
                }
            }
            _ => {}
        }
        i += 1;
    }
    bytes.len()
}

fn parse_keyref(cur: &Cursor, text: &str) -> Result<KeyRef, Error> {
    let text = text.trim();
    if text.is_empty() {
        return Err(cur.error("missing left-hand side in predicate"));
    }
    let (base, pipe_text) = match split_once_top_level(text, b'|') {
        Some((b, p)) => (b.trim(), Some(p.trim())),
        None => (text, None),
    };
    let pipeline = pipe_text.map(Pipeline::parse).transpose()?;
    let path = if base == "." {
        Vec::new()
    } else {
        let base = base.strip_prefix('.').unwrap_or(base);
        if base.is_empty() {
            return Err(cur.error("missing key path in predicate"));
        }
        let mut segs = Vec::new();
        for seg in base.split('.') {
            if seg.is_empty() {
                return Err(cur.error(format!("empty key in predicate path {base:?}")));
            }
            segs.push(seg.to_string());
        }
        segs
    };
    Ok(KeyRef { path, pipeline })
}

fn parse_operand(cur: &Cursor, text: &str) -> Result<Operand, Error> {
    let text = text.trim();
    if text.is_empty() {
        return Err(cur.error("missing right-hand side in predicate"));
    }
    let (negate, body) = match text.strip_prefix('!') {
        Some(rest) => (true, rest.trim_start()),
        None => (false, text),
    };
    if body.starts_with('$') {
        return Ok(Operand::Pipeline {
            pipeline: Pipeline::parse(body)?,
            negate,
        });
    }
    if negate {
        return Err(cur.error("'!' in an operand may only prefix a filter pipeline"));
    }
    let value = crate::filter::parse_literal(body, cur.path)?;
    // Bare identifiers are allowed as filter arguments but a predicate
    // operand must be a real literal.
    if matches!(value, Value::String(_)) && !body.starts_with('\'') && !body.starts_with('"') {
        return Err(cur.error(format!("invalid literal {body:?} in predicate")));
    }
    Ok(Operand::Literal(value))
}

/// Split on the first `sep` outside quotes, parentheses, and brackets.
fn split_once_top_level(text: &str, sep: u8) -> Option<(&str, &str)> {
    let bytes = text.as_bytes();
    let mut depth = 0i32;
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
            b'(' | b'[' => depth += 1,
            b')' | b']' => depth -= 1,
            c if c == sep && depth == 0 => {
                return Some((&text[..i], &text[i + 1..]));
            }
            _ => {}
        }
        i += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile_ok(text: &str) -> Matcher {
        compile(text, text).unwrap()
    }

    fn subject(json: serde_json::Value) -> Value {
        Value::from(json)
    }

    fn matches(pred: &str, subj: serde_json::Value) -> bool {
        compile_ok(pred)
            .matches(&subject(subj))
            .unwrap()
    }

    #[test]
    fn simple_equality() {
        assert!(matches("id==2", serde_json::json!({"id": 2})));
        assert!(!matches("id==2", serde_json::json!({"id": 3})));
    }

    #[test]
    fn missing_key_is_false_except_ne() {
        assert!(!matches("id==2", serde_json::json!({})));
        assert!(!matches("id>2", serde_json::json!({})));
        assert!(matches("id!=2", serde_json::json!({})));
    }

    #[test]
    fn dotted_lhs_path() {
        assert!(matches(
            "user.name=='Ada'",
            serde_json::json!({"user": {"name": "Ada"}})
        ));
    }

    #[test]
    fn subject_atom() {
        assert!(matches(".>2", serde_json::json!(3)));
        assert!(!matches(".>2", serde_json::json!(1)));
    }

    #[test]
    fn subject_with_pipeline() {
        assert!(matches(".|$len>2", serde_json::json!("hello")));
        assert!(!matches(".|$len>2", serde_json::json!("hi")));
    }

    #[test]
    fn rhs_pipeline_applies_to_subject() {
        // Element where `n` equals its own doubled `m`.
        assert!(matches(
            "n==$pick(m)|$len|$inc",
            serde_json::json!({"n": 2, "m": 1})
        ));
    }

    #[test]
    fn negated_rhs_pipeline() {
        assert!(matches(".==!$even", serde_json::json!(true)));
    }

    #[test]
    fn boolean_composition() {
        let subj = serde_json::json!({"a": 1, "b": 2});
        assert!(matches("a==1&&b==2", subj.clone()));
        assert!(matches("a==9 || b==2", subj.clone()));
        assert!(matches("!(a==9) && b==2", subj.clone()));
        assert!(!matches("a==1 && b==9", subj));
    }

    #[test]
    fn precedence_and_binds_tighter_than_or() {
        // false && false || true
        let subj = serde_json::json!({"a": 1});
        assert!(matches("a==9 && a==8 || a==1", subj));
    }

    #[test]
    fn type_mismatch_compares_false() {
        assert!(!matches("id=='2'", serde_json::json!({"id": 2})));
        assert!(!matches("id>'2'", serde_json::json!({"id": 2})));
    }

    #[test]
    fn quoted_strings_may_contain_operators() {
        assert!(matches("s=='a>b'", serde_json::json!({"s": "a>b"})));
        assert!(matches("s=='x&&y'", serde_json::json!({"s": "x&&y"})));
    }

    #[test]
    fn seed_pairs_from_equalities() {
        let m = compile_ok("id==2&&name=='Lin'");
        let seeds = m.seed_pairs();
        assert_eq!(seeds.len(), 2);
        assert_eq!(seeds[0].0, &["id".to_string()][..]);
        assert_eq!(seeds[0].1, &Value::Int(2));
    }

    #[test]
    fn seed_pairs_skip_negations_and_non_equalities() {
        let m = compile_ok("!(id==2)&&n>3");
        assert!(m.seed_pairs().is_empty());
    }

    #[test]
    fn parse_errors() {
        assert!(compile("p", "id==").is_err());
        assert!(compile("p", "==2").is_err());
        assert!(compile("p", "id").is_err());
        assert!(compile("p", "(id==2").is_err());
        assert!(compile("p", "id=='unterminated").is_err());
        assert!(compile("p", "id==bare").is_err());
    }

    #[test]
    fn unknown_filter_in_predicate_is_operator_error() {
        let m = compile_ok(".|$wat==2");
        let err = m.matches(&Value::Int(1)).unwrap_err();
        assert!(matches!(err, Error::Operator { .. }));
    }
}
