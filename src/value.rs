/// Tree value representation.
///
/// Uses `Int(i64)` for integers (not `f64`) to preserve precision on large
/// IDs. `Object` uses `Vec<(String, Value)>` to preserve key insertion order,
/// which wildcard enumeration and mapping iteration rely on.
use jiff::Timestamp;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Double(f64),
    String(String),
    DateTime(Timestamp),
    Array(Vec<Value>),
    Object(Vec<(String, Value)>),
    /// Internal "no value" sentinel produced during resolution. Never stored
    /// in a container and never returned from the public API.
    Undefined,
}

impl Value {
    /// Returns the type name string.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Int(_) | Value::Double(_) => "number",
            Value::String(_) => "string",
            Value::DateTime(_) => "datetime",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Undefined => "undefined",
        }
    }

    /// Case-insensitive type-name test used by the `type_is` filter. Accepts
    /// the aliases hosts tend to reach for (`list`, `dict`, `str`, ...).
    pub fn matches_type_name(&self, name: &str) -> bool {
        let name = name.to_ascii_lowercase();
        let accepted: &[&str] = match self {
            Value::Null => &["null", "none", "nil"],
            Value::Bool(_) => &["bool", "boolean"],
            Value::Int(_) => &["int", "integer", "number"],
            Value::Double(_) => &["float", "double", "number"],
            Value::String(_) => &["str", "string"],
            Value::DateTime(_) => &["datetime", "timestamp", "date"],
            Value::Array(_) => &["array", "list", "sequence", "seq"],
            Value::Object(_) => &["object", "dict", "mapping", "map"],
            Value::Undefined => return false,
        };
        accepted.contains(&name.as_str())
    }

    /// Returns true if the value is truthy. Only `null`, `false`, and the
    /// internal undefined sentinel are falsy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Null | Value::Bool(false) | Value::Undefined)
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    pub fn is_container(&self) -> bool {
        matches!(self, Value::Array(_) | Value::Object(_))
    }

    /// Emptiness as the `is_empty`/`non_empty` filters see it: null, `""`,
    /// `[]`, and `{}` are empty; every other value is not.
    pub fn is_empty_value(&self) -> bool {
        match self {
            Value::Null => true,
            Value::String(s) => s.is_empty(),
            Value::Array(a) => a.is_empty(),
            Value::Object(o) => o.is_empty(),
            _ => false,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(*n as f64),
            Value::Double(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Coerce to a timestamp: datetimes as-is, strings via ISO 8601 (with a
    /// civil-datetime fallback interpreted as UTC), numbers as epoch seconds.
    pub fn as_timestamp(&self) -> Option<Timestamp> {
        match self {
            Value::DateTime(ts) => Some(*ts),
            Value::String(s) => parse_timestamp(s),
            Value::Int(n) => Timestamp::from_second(*n).ok(),
            Value::Double(f) => Timestamp::from_nanosecond((f * 1_000_000_000.0) as i128).ok(),
            _ => None,
        }
    }

    /// Child lookup by key. `None` for non-mappings and missing keys.
    pub fn key(&self, k: &str) -> Option<&Value> {
        match self {
            Value::Object(pairs) => pairs.iter().find(|(ek, _)| ek == k).map(|(_, v)| v),
            _ => None,
        }
    }

    pub fn key_mut(&mut self, k: &str) -> Option<&mut Value> {
        match self {
            Value::Object(pairs) => pairs.iter_mut().find(|(ek, _)| ek == k).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Insert or replace a mapping entry, appending new keys at the end to
    /// keep insertion order stable. No-op on non-mappings.
    pub fn insert_key(&mut self, k: &str, v: Value) {
        if let Value::Object(pairs) = self {
            if let Some(existing) = pairs.iter_mut().find(|(ek, _)| ek == k) {
                existing.1 = v;
            } else {
                pairs.push((k.to_string(), v));
            }
        }
    }

    pub fn remove_key(&mut self, k: &str) -> Option<Value> {
        if let Value::Object(pairs) = self
            && let Some(pos) = pairs.iter().position(|(ek, _)| ek == k)
        {
            return Some(pairs.remove(pos).1);
        }
        None
    }
}

fn parse_timestamp(s: &str) -> Option<Timestamp> {
    if let Ok(ts) = s.parse::<Timestamp>() {
        return Some(ts);
    }
    // Civil datetime or bare date without an offset: assume UTC.
    if let Ok(dt) = s.parse::<jiff::civil::DateTime>() {
        return dt
            .to_zoned(jiff::tz::TimeZone::UTC)
            .ok()
            .map(|z| z.timestamp());
    }
    if let Ok(d) = s.parse::<jiff::civil::Date>() {
        return d
            .to_zoned(jiff::tz::TimeZone::UTC)
            .ok()
            .map(|z| z.timestamp());
    }
    None
}

/// Equality used by `==`/`!=` and membership filters. Strict on type with two
/// exceptions: `Int`/`Double` compare numerically, and a datetime compared
/// with a string coerces the string through ISO parsing. Mappings compare
/// order-insensitively.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Int(x), Value::Double(y)) | (Value::Double(y), Value::Int(x)) => *x as f64 == *y,
        (Value::DateTime(_), Value::String(_)) | (Value::String(_), Value::DateTime(_)) => {
            match (a.as_timestamp(), b.as_timestamp()) {
                (Some(x), Some(y)) => x == y,
                _ => false,
            }
        }
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y.iter()).all(|(a, b)| values_equal(a, b))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x.iter()
                    .all(|(k, v)| y.iter().any(|(ek, ev)| ek == k && values_equal(v, ev)))
        }
        _ => a == b,
    }
}

/// Ordering used by `<`/`>`/`<=`/`>=`. Defined only within a type family
/// (numbers, strings, booleans, datetimes — the latter coercing strings);
/// mismatched families return `None` and the comparison is false.
pub fn values_order(a: &Value, b: &Value) -> Option<std::cmp::Ordering> {
    use std::cmp::Ordering;
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Some(x.cmp(y)),
        (Value::Int(_) | Value::Double(_), Value::Int(_) | Value::Double(_)) => {
            a.as_f64()?.partial_cmp(&b.as_f64()?)
        }
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::DateTime(_), _) | (_, Value::DateTime(_)) => {
            match (a.as_timestamp(), b.as_timestamp()) {
                (Some(x), Some(y)) => Some(x.cmp(&y)),
                _ => None,
            }
        }
        _ => {
            if values_equal(a, b) {
                Some(Ordering::Equal)
            } else {
                None
            }
        }
    }
}

/// Cross-type total order for `sorted`:
/// null < bool < number < datetime < string < array < object.
pub fn total_order(a: &Value, b: &Value) -> std::cmp::Ordering {
    use std::cmp::Ordering;
    let rank = |v: &Value| match v {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Int(_) | Value::Double(_) => 2,
        Value::DateTime(_) => 3,
        Value::String(_) => 4,
        Value::Array(_) => 5,
        Value::Object(_) => 6,
        Value::Undefined => 7,
    };
    match rank(a).cmp(&rank(b)) {
        Ordering::Equal => {}
        other => return other,
    }
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Int(_) | Value::Double(_), Value::Int(_) | Value::Double(_)) => {
            match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
                _ => Ordering::Equal,
            }
        }
        (Value::DateTime(x), Value::DateTime(y)) => x.cmp(y),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Array(x), Value::Array(y)) => {
            for (ea, eb) in x.iter().zip(y.iter()) {
                match total_order(ea, eb) {
                    Ordering::Equal => {}
                    other => return other,
                }
            }
            x.len().cmp(&y.len())
        }
        (Value::Object(x), Value::Object(y)) => {
            for ((ka, va), (kb, vb)) in x.iter().zip(y.iter()) {
                match ka.cmp(kb) {
                    Ordering::Equal => {}
                    other => return other,
                }
                match total_order(va, vb) {
                    Ordering::Equal => {}
                    other => return other,
                }
            }
            x.len().cmp(&y.len())
        }
        _ => Ordering::Equal,
    }
}

// ---------------------------------------------------------------------------
// serde_json interop
// ---------------------------------------------------------------------------

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else {
                    Value::Double(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                Value::Object(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<Value> for serde_json::Value {
    fn from(v: Value) -> Self {
        match v {
            Value::Null | Value::Undefined => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(b),
            Value::Int(n) => serde_json::Value::Number(n.into()),
            Value::Double(f) => serde_json::Number::from_f64(f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s),
            Value::DateTime(ts) => serde_json::Value::String(ts.to_string()),
            Value::Array(items) => {
                serde_json::Value::Array(items.into_iter().map(Into::into).collect())
            }
            Value::Object(pairs) => {
                serde_json::Value::Object(pairs.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_names() {
        assert_eq!(Value::Null.type_name(), "null");
        assert_eq!(Value::Bool(true).type_name(), "boolean");
        assert_eq!(Value::Int(42).type_name(), "number");
        assert_eq!(Value::Double(3.14).type_name(), "number");
        assert_eq!(Value::String("hi".into()).type_name(), "string");
        assert_eq!(Value::Array(vec![]).type_name(), "array");
        assert_eq!(Value::Object(vec![]).type_name(), "object");
    }

    #[test]
    fn type_name_aliases() {
        assert!(Value::Array(vec![]).matches_type_name("LIST"));
        assert!(Value::Object(vec![]).matches_type_name("dict"));
        assert!(Value::Int(1).matches_type_name("number"));
        assert!(Value::Double(1.0).matches_type_name("number"));
        assert!(!Value::Int(1).matches_type_name("string"));
    }

    #[test]
    fn truthiness() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::Bool(false).is_truthy());
        assert!(!Value::Undefined.is_truthy());
        assert!(Value::Bool(true).is_truthy());
        assert!(Value::Int(0).is_truthy());
        assert!(Value::String("".into()).is_truthy());
        assert!(Value::Array(vec![]).is_truthy());
    }

    #[test]
    fn key_insert_preserves_order() {
        let mut v = Value::Object(vec![]);
        v.insert_key("b", Value::Int(1));
        v.insert_key("a", Value::Int(2));
        v.insert_key("b", Value::Int(3));
        assert_eq!(
            v,
            Value::Object(vec![
                ("b".to_string(), Value::Int(3)),
                ("a".to_string(), Value::Int(2)),
            ])
        );
    }

    #[test]
    fn equality_is_numeric_across_int_and_double() {
        assert!(values_equal(&Value::Int(1), &Value::Double(1.0)));
        assert!(!values_equal(&Value::Int(1), &Value::Double(1.5)));
    }

    #[test]
    fn equality_does_not_coerce_strings() {
        assert!(!values_equal(&Value::String("1".into()), &Value::Int(1)));
    }

    #[test]
    fn equality_on_objects_ignores_key_order() {
        let a = Value::Object(vec![
            ("x".to_string(), Value::Int(1)),
            ("y".to_string(), Value::Int(2)),
        ]);
        let b = Value::Object(vec![
            ("y".to_string(), Value::Int(2)),
            ("x".to_string(), Value::Int(1)),
        ]);
        assert!(values_equal(&a, &b));
    }

    #[test]
    fn ordering_mismatched_types_is_none() {
        assert_eq!(
            values_order(&Value::String("1".into()), &Value::Int(1)),
            None
        );
    }

    #[test]
    fn datetime_compares_against_iso_string() {
        let ts: Timestamp = "2024-01-15T11:30:45Z".parse().unwrap();
        let dt = Value::DateTime(ts);
        assert!(values_equal(
            &dt,
            &Value::String("2024-01-15T11:30:45Z".into())
        ));
        assert_eq!(
            values_order(&dt, &Value::String("2024-01-16T00:00:00Z".into())),
            Some(std::cmp::Ordering::Less)
        );
    }

    #[test]
    fn total_order_cross_type() {
        let mut vals = vec![
            Value::Int(3),
            Value::String("a".into()),
            Value::Null,
            Value::Bool(true),
            Value::Bool(false),
            Value::Int(1),
        ];
        vals.sort_by(total_order);
        assert_eq!(
            vals,
            vec![
                Value::Null,
                Value::Bool(false),
                Value::Bool(true),
                Value::Int(1),
                Value::Int(3),
                Value::String("a".into()),
            ]
        );
    }

    #[test]
    fn serde_round_trip_preserves_order() {
        let json = serde_json::json!({"b": 1, "a": [1, 2.5, null, true, "x"]});
        let v = Value::from(json.clone());
        assert_eq!(v.key("b"), Some(&Value::Int(1)));
        let back: serde_json::Value = v.into();
        assert_eq!(back, json);
    }
}
