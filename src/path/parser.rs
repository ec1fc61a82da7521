/// Turns lexed raw segments into the compiled token sequence, classifying
/// bracket contents (map / index / slice / predicate) and compiling the
/// trailing transform pipeline.
use crate::error::Error;
use crate::filter::Pipeline;

use super::lexer::{Lexed, RawToken};
use super::predicate;
use super::{SliceBounds, Token};

pub fn compile(path: &str, lexed: Lexed) -> Result<Vec<Token>, Error> {
    let mut tokens = Vec::with_capacity(lexed.tokens.len() + 1);
    for raw in lexed.tokens {
        let token = match raw {
            RawToken::Name(name) => {
                if tokens.is_empty() {
                    Token::RootKey(name)
                } else {
                    Token::Key(name)
                }
            }
            RawToken::Star => Token::Wildcard,
            RawToken::DoubleStar => Token::DeepWildcard,
            RawToken::Root => Token::Root,
            RawToken::Bracket(content) => compile_bracket(path, &content)?,
        };
        tokens.push(token);
    }
    if let Some(text) = lexed.pipeline {
        tokens.push(Token::Transform(Pipeline::parse(&text)?));
    }
    Ok(tokens)
}

fn compile_bracket(path: &str, content: &str) -> Result<Token, Error> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Ok(Token::Map);
    }
    if let Some(pred) = trimmed.strip_prefix('?') {
        return Ok(Token::Filter(predicate::compile(path, pred)?));
    }
    if trimmed.contains(':') {
        return compile_slice(path, trimmed);
    }
    trimmed
        .parse::<i64>()
        .map(Token::Index)
        .map_err(|_| Error::parse(path, format!("invalid bracket content {trimmed:?}")))
}

fn compile_slice(path: &str, text: &str) -> Result<Token, Error> {
    let parts: Vec<&str> = text.split(':').collect();
    if parts.len() > 3 {
        return Err(Error::parse(path, format!("invalid slice {text:?}")));
    }
    let bound = |s: &str| -> Result<Option<i64>, Error> {
        let s = s.trim();
        if s.is_empty() {
            return Ok(None);
        }
        s.parse::<i64>()
            .map(Some)
            .map_err(|_| Error::parse(path, format!("invalid slice bound {s:?}")))
    };
    let start = bound(parts[0])?;
    let stop = bound(parts[1])?;
    let step = match parts.get(2) {
        Some(s) => bound(s)?.unwrap_or(1),
        None => 1,
    };
    if step == 0 {
        return Err(Error::parse(path, "slice step cannot be zero"));
    }
    Ok(Token::Slice(SliceBounds { start, stop, step }))
}
