/// Datetime operations (jiff). Strings coerce through ISO 8601 on the fly;
/// unparseable inputs produce null.
use crate::error::Error;
use crate::value::Value;

use super::str_arg;
use jiff::Timestamp;
use jiff::tz::TimeZone;

pub(super) fn apply(name: &str, input: &Value, args: &[Value]) -> Result<Value, Error> {
    match name {
        "to_datetime" => {
            let fmt = match args.first() {
                None | Some(Value::Null) => None,
                Some(_) => Some(str_arg(name, args, 0)?),
            };
            Ok(match to_datetime(input, fmt) {
                Some(ts) => Value::DateTime(ts),
                None => Value::Null,
            })
        }
        "timestamp" => Ok(match input.as_timestamp() {
            Some(ts) => Value::Double(
                ts.as_second() as f64 + ts.subsec_nanosecond() as f64 / 1_000_000_000.0,
            ),
            None => Value::Null,
        }),
        "age_seconds" => Ok(match input.as_timestamp() {
            Some(ts) => {
                let now = Timestamp::now();
                Value::Double(
                    (now.as_nanosecond() - ts.as_nanosecond()) as f64 / 1_000_000_000.0,
                )
            }
            None => Value::Null,
        }),
        "before" | "after" => {
            super::require_args(name, args, 1)?;
            let (Some(lhs), Some(rhs)) = (input.as_timestamp(), args[0].as_timestamp()) else {
                return Ok(Value::Bool(false));
            };
            Ok(Value::Bool(if name == "before" {
                lhs < rhs
            } else {
                lhs > rhs
            }))
        }
        _ => Err(Error::operator(name, "unknown filter function")),
    }
}

fn to_datetime(input: &Value, fmt: Option<&str>) -> Option<Timestamp> {
    match (input, fmt) {
        (Value::DateTime(ts), _) => Some(*ts),
        (Value::String(s), Some(fmt)) => {
            let tm = jiff::fmt::strtime::parse(fmt, s).ok()?;
            // A parsed offset pins the instant; otherwise assume UTC.
            tm.to_timestamp().ok().or_else(|| {
                tm.to_datetime()
                    .ok()?
                    .to_zoned(TimeZone::UTC)
                    .ok()
                    .map(|z| z.timestamp())
            })
        }
        (_, _) => input.as_timestamp(),
    }
}
