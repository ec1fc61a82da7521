use thiserror::Error;

/// Errors surfaced at the `treepath` API boundary.
///
/// `Parse` and `Operator` indicate programmer intent errors and are always
/// raised. `Resolution` is raised only in strict mode; without it a failed
/// resolution becomes the operation's absent outcome (default value, `false`,
/// or no-op).
#[derive(Error, Debug)]
pub enum Error {
    #[error("parse error in {path:?}: {msg}")]
    Parse { path: String, msg: String },

    #[error("filter function '{name}': {msg}")]
    Operator { name: String, msg: String },

    #[error("path {path:?} did not resolve: {msg}")]
    Resolution { path: String, msg: String },
}

impl Error {
    pub(crate) fn parse(path: impl Into<String>, msg: impl Into<String>) -> Self {
        Error::Parse {
            path: path.into(),
            msg: msg.into(),
        }
    }

    pub(crate) fn operator(name: impl Into<String>, msg: impl Into<String>) -> Self {
        Error::Operator {
            name: name.into(),
            msg: msg.into(),
        }
    }

    pub(crate) fn resolution(path: impl Into<String>, msg: impl Into<String>) -> Self {
        Error::Resolution {
            path: path.into(),
            msg: msg.into(),
        }
    }

    /// True for strict-mode resolution failures, the only kind that is
    /// downgraded to an absent outcome when `strict` is off.
    pub fn is_resolution(&self) -> bool {
        matches!(self, Error::Resolution { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_are_distinguishable() {
        assert!(Error::resolution("a.b", "missing").is_resolution());
        assert!(!Error::parse("a..b", "empty key").is_resolution());
        assert!(!Error::operator("nope", "unknown filter function").is_resolution());
    }

    #[test]
    fn messages_carry_offender() {
        let e = Error::parse("a.[", "unterminated bracket");
        assert!(e.to_string().contains("a.["));
        let e = Error::operator("frobnicate", "unknown filter function");
        assert!(e.to_string().contains("frobnicate"));
    }
}
