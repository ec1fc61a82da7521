/// Path tokenizer: splits a path string into raw segments before any bracket
/// or pipeline content is compiled. Dots separate segments outside brackets;
/// `[...]` suffixes are captured verbatim (quotes and nesting respected); a
/// `|` outside brackets hands the rest of the string to the pipeline parser.
use crate::error::Error;

#[derive(Debug, Clone, PartialEq)]
pub enum RawToken {
    /// A bare key segment.
    Name(String),
    /// The unparsed contents between `[` and `]`.
    Bracket(String),
    /// `*`
    Star,
    /// `**`
    DoubleStar,
    /// `$$root`
    Root,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Lexed {
    pub tokens: Vec<RawToken>,
    /// Raw text after a top-level `|`, if any.
    pub pipeline: Option<String>,
}

pub fn lex(path: &str) -> Result<Lexed, Error> {
    let bytes = path.as_bytes();
    let mut out = Lexed::default();
    let mut i = 0;

    // A lone dot is the root identity: no tokens at all.
    if path == "." {
        return Ok(out);
    }
    if path.is_empty() {
        return Err(Error::parse(path, "empty path"));
    }

    let mut expect_segment = true;
    // `.|...` is the identity with a trailing transform.
    if bytes[0] == b'.' && bytes.get(1) == Some(&b'|') {
        i = 1;
        expect_segment = false;
    }
    while i < bytes.len() {
        match bytes[i] {
            b'.' => {
                if expect_segment {
                    return Err(Error::parse(path, "empty key between dots"));
                }
                expect_segment = true;
                i += 1;
            }
            b'|' => {
                if expect_segment {
                    return Err(Error::parse(path, "empty key before '|'"));
                }
                let rest = path[i + 1..].trim();
                if rest.is_empty() {
                    return Err(Error::parse(path, "empty transform pipeline after '|'"));
                }
                out.pipeline = Some(rest.to_string());
                return Ok(out);
            }
            b'[' => {
                let (content, consumed) = scan_bracket(path, i)?;
                out.tokens.push(RawToken::Bracket(content));
                expect_segment = false;
                i += consumed;
            }
            _ => {
                if !expect_segment {
                    return Err(Error::parse(
                        path,
                        format!("unexpected character '{}' after segment", bytes[i] as char),
                    ));
                }
                let start = i;
                while i < bytes.len() && !matches!(bytes[i], b'.' | b'[' | b'|') {
                    i += 1;
                }
                let name = &path[start..i];
                out.tokens.push(match name {
                    "*" => RawToken::Star,
                    "**" => RawToken::DoubleStar,
                    "$$root" => RawToken::Root,
                    _ => RawToken::Name(name.to_string()),
                });
                expect_segment = false;
            }
        }
    }
    if expect_segment {
        return Err(Error::parse(path, "trailing dot"));
    }
    Ok(out)
}

/// Scan a `[...]` group starting at `open`. Returns the inner content and
/// the number of bytes consumed including both brackets. Nested brackets and
/// quoted strings (which may contain `]`) are respected.
fn scan_bracket(path: &str, open: usize) -> Result<(String, usize), Error> {
    let bytes = path.as_bytes();
    debug_assert_eq!(bytes[open], b'[');
    let mut depth = 1i32;
    let mut i = open + 1;
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
                    return Err(Error::parse(path, "unterminated quote in bracket"));
                }
            }
            b'[' => depth += 1,
            b']' => {
                depth -= 1;
                if depth == 0 {
                    return Ok((path[open + 1..i].to_string(), i + 1 - open));
                }
            }
            _ => {}
        }
        i += 1;
    }
    Err(Error::parse(path, "unterminated bracket"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(path: &str) -> Vec<RawToken> {
        lex(path).unwrap().tokens
    }

    #[test]
    fn lex_dotted_keys() {
        assert_eq!(
            names("a.b.c"),
            vec![
                RawToken::Name("a".into()),
                RawToken::Name("b".into()),
                RawToken::Name("c".into()),
            ]
        );
    }

    #[test]
    fn lex_identity() {
        let l = lex(".").unwrap();
        assert!(l.tokens.is_empty());
        assert!(l.pipeline.is_none());
    }

    #[test]
    fn lex_bracket_suffixes() {
        assert_eq!(
            names("users[0][]"),
            vec![
                RawToken::Name("users".into()),
                RawToken::Bracket("0".into()),
                RawToken::Bracket("".into()),
            ]
        );
    }

    #[test]
    fn lex_wildcards_and_root() {
        assert_eq!(
            names("a.*.**"),
            vec![
                RawToken::Name("a".into()),
                RawToken::Star,
                RawToken::DoubleStar,
            ]
        );
        assert_eq!(
            names("$$root.a"),
            vec![RawToken::Root, RawToken::Name("a".into())]
        );
    }

    #[test]
    fn lex_pipeline_split() {
        let l = lex("a.b|$double|$inc").unwrap();
        assert_eq!(l.tokens, vec![
            RawToken::Name("a".into()),
            RawToken::Name("b".into()),
        ]);
        assert_eq!(l.pipeline.as_deref(), Some("$double|$inc"));
    }

    #[test]
    fn lex_predicate_bracket_keeps_inner_pipes() {
        let l = lex("items[?.|$len>2]").unwrap();
        assert_eq!(l.tokens, vec![
            RawToken::Name("items".into()),
            RawToken::Bracket("?.|$len>2".into()),
        ]);
        assert!(l.pipeline.is_none());
    }

    #[test]
    fn lex_nested_brackets_in_predicate() {
        let l = lex("xs[?tags==$split(',')[]]").unwrap();
        assert_eq!(
            l.tokens[1],
            RawToken::Bracket("?tags==$split(',')[]".into())
        );
    }

    #[test]
    fn lex_quoted_bracket_content() {
        let l = lex("xs[?name=='a]b']").unwrap();
        assert_eq!(l.tokens[1], RawToken::Bracket("?name=='a]b'".into()));
    }

    #[test]
    fn lex_empty_key_is_error() {
        assert!(lex("a..b").is_err());
        assert!(lex(".a").is_err());
        assert!(lex("a.").is_err());
        assert!(lex("").is_err());
    }

    #[test]
    fn lex_unterminated_bracket_is_error() {
        assert!(lex("a[0").is_err());
        assert!(lex("a[?x=='y]").is_err());
    }

    #[test]
    fn lex_identity_with_pipeline() {
        let l = lex(".|$len").unwrap();
        assert!(l.tokens.is_empty());
        assert_eq!(l.pipeline.as_deref(), Some("$len"));
    }

    #[test]
    fn lex_empty_pipeline_is_error() {
        assert!(lex("a|").is_err());
        assert!(lex("a.|$len").is_err());
    }
}
