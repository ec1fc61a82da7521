/// Path expression compiler: a path string becomes an ordered token
/// sequence, with bracket predicates and transform pipelines compiled once
/// into reusable matcher/pipeline objects.
pub mod lexer;
pub mod parser;
pub mod predicate;

use crate::error::Error;
use crate::filter::Pipeline;
use predicate::Matcher;

/// One unit of a compiled path.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// First-segment key access.
    RootKey(String),
    /// Child mapping access by name.
    Key(String),
    /// Reset the resolution cursor to the original root (`$$root`).
    Root,
    /// Sequence index; negative values count from the end.
    Index(i64),
    /// Sequence slice; absent bounds default to the full range.
    Slice(SliceBounds),
    /// `[]` — apply the remaining path to every element of a sequence.
    Map,
    /// `*` — one level: mapping values or sequence elements.
    Wildcard,
    /// `**` — every descendant, pre-order, including the starting node.
    DeepWildcard,
    /// `[?...]` — retain sequence elements matching a compiled predicate.
    Filter(Matcher),
    /// Trailing `| $name | ...` transform pipeline.
    Transform(Pipeline),
}

/// Slice bounds with Python semantics: negative indices count from the end,
/// out-of-range bounds clamp, and the step may be negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliceBounds {
    pub start: Option<i64>,
    pub stop: Option<i64>,
    pub step: i64,
}

impl SliceBounds {
    /// Resolve to the concrete element indices selected from a sequence of
    /// `len` elements, in traversal order.
    pub fn indices(&self, len: usize) -> Vec<usize> {
        let len = len as i64;
        let norm = |i: i64| if i < 0 { i + len } else { i };
        let (start, stop) = if self.step > 0 {
            (
                norm(self.start.unwrap_or(0)).clamp(0, len),
                norm(self.stop.unwrap_or(len)).clamp(0, len),
            )
        } else {
            (
                norm(self.start.unwrap_or(len - 1)).clamp(-1, len - 1),
                self.stop.map(|s| norm(s).clamp(-1, len - 1)).unwrap_or(-1),
            )
        };
        let mut out = Vec::new();
        let mut i = start;
        while (self.step > 0 && i < stop) || (self.step < 0 && i > stop) {
            out.push(i as usize);
            i += self.step;
        }
        out
    }
}

/// Parse a path string into its token sequence. Deterministic and purely
/// syntactic; the traversal engine interprets the result.
pub fn parse(path: &str) -> Result<Vec<Token>, Error> {
    let lexed = lexer::lex(path)?;
    let tokens = parser::compile(path, lexed)?;
    log::debug!("parsed {path:?} into {} token(s)", tokens.len());
    Ok(tokens)
}
