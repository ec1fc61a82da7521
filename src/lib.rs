//! `treepath` is a path-expression engine over nested JSON-like trees.
//!
//! A compact path language compiles into a token stream which is interpreted
//! against a caller-owned [`Value`] to read (`get`, `exists`) or mutate in
//! place (`set`, `unset`). Paths combine dotted keys, indexing, slicing,
//! mapping (`[]`), predicate filters (`[?...]`), wildcards (`*`, `**`), root
//! back-references (`$$root`), and `|`-chained value transforms.
//!
//! ```
//! use treepath::{SetOptions, Value, get, set};
//!
//! let mut data = Value::from(serde_json::json!({"a": {"nums": [1, 2, 3]}}));
//! set(
//!     &mut data,
//!     "a.nums[]",
//!     Value::String("$double".into()),
//!     SetOptions::default(),
//! )
//! .unwrap();
//! assert_eq!(
//!     get(&data, "a.nums", Value::Null, false).unwrap(),
//!     Value::from(serde_json::json!([2, 4, 6])),
//! );
//! ```
pub mod error;
pub mod filter;
pub mod path;
pub mod value;
mod walk;

pub use error::Error;
pub use value::Value;

/// Behavior flags for [`set`]. The defaults scaffold freely: missing
/// mappings/sequences are created, unmatched filters append a seeded
/// element, and incompatible scalars on the path are overwritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetOptions {
    /// Raise [`Error::Resolution`] instead of scaffolding or skipping when
    /// the parent path does not already resolve.
    pub strict: bool,
    /// Create missing intermediate containers (and null-pad a terminal
    /// out-of-range index).
    pub create_missing: bool,
    /// Append a new element seeded from the filter's `==` atoms when a
    /// terminal-path filter matches nothing.
    pub create_filter_match: bool,
    /// Replace a scalar encountered mid-path with a fresh mapping.
    pub overwrite_incompatible: bool,
}

impl Default for SetOptions {
    fn default() -> Self {
        SetOptions {
            strict: false,
            create_missing: true,
            create_filter_match: true,
            overwrite_incompatible: true,
        }
    }
}

/// Resolve `path` against `data` and return the value (or projection) it
/// names. An unresolved path returns `default`, or raises
/// [`Error::Resolution`] when `strict` is set.
pub fn get(data: &Value, path: &str, default: Value, strict: bool) -> Result<Value, Error> {
    let tokens = path::parse(path)?;
    let result = walk::get::resolve(data, &tokens, data)?;
    if result.is_undefined() {
        if strict {
            return Err(Error::resolution(path, "no value at path"));
        }
        return Ok(default);
    }
    Ok(result)
}

/// True when `path` resolves to a value — and, for aggregating paths
/// (map/wildcard/filter), to a non-empty projection.
pub fn exists(data: &Value, path: &str, strict: bool) -> Result<bool, Error> {
    let tokens = path::parse(path)?;
    let result = walk::get::resolve(data, &tokens, data)?;
    if result.is_undefined() {
        if strict {
            return Err(Error::resolution(path, "no value at path"));
        }
        return Ok(false);
    }
    if walk::get::aggregates(&tokens)
        && let Value::Array(items) = &result
    {
        return Ok(!items.is_empty());
    }
    Ok(true)
}

/// Write `value` at `path`, mutating `data` in place.
///
/// `value` is interpreted the way the path language expects: a string
/// starting with `$$root` resolves against the tree before writing; a string
/// that parses as a filter pipeline (`$double`, `$add(3)|$clamp(0,10)`, ...)
/// is applied to each target's pre-write value; anything else is written
/// as-is.
pub fn set(data: &mut Value, path: &str, value: Value, opts: SetOptions) -> Result<(), Error> {
    let tokens = path::parse(path)?;
    walk::set::execute(data, path, &tokens, value, opts)
}

/// Remove the value(s) at `path`, mutating `data` in place. Missing targets
/// are skipped unless `strict` is set.
pub fn unset(data: &mut Value, path: &str, strict: bool) -> Result<(), Error> {
    let tokens = path::parse(path)?;
    walk::unset::execute(data, path, &tokens, strict)
}

/// Run a single built-in filter function by name against a value.
/// Unknown names raise [`Error::Operator`].
pub fn run_filter_function(name: &str, value: &Value, args: &[Value]) -> Result<Value, Error> {
    filter::run(name, value, args)
}
